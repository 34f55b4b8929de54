//! Client-side hydration.

mod runtime;

pub use runtime::{HydrationError, HydrationReport, Hydrator};
