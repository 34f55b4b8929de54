//! Server-side rendering: markers, records, the renderer, and the
//! document cache.

mod cache;
pub mod markers;
mod record;
mod renderer;

pub use cache::RenderCache;
pub use markers::HydrationStrategy;
pub use record::{
	HMR_CONFIG_VAR, HydrationRecord, INITIAL_DATA_SCRIPT_ID, INITIAL_DATA_VAR, InitialData,
	InitialDataError, ROOT_CONTAINER_ID, SSR_FLAG_VAR,
};
pub use renderer::{RenderError, SsrOptions, SsrRenderer};
