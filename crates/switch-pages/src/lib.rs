//! Switch Pages - component rendering, hydration, and event delegation.
//!
//! The client/server core of the Switch framework: components render to
//! markup strings on the server, the document embeds a serialized
//! description of the tree, and the client reconnects behavior by
//! walking the existing DOM; there is no virtual DOM and no diffing. Updates
//! replace a component's whole subtree and re-resolve the anchors
//! underneath it.
//!
//! ## Architecture
//!
//! - [`component`]: definitions, live instances, and the injected
//!   registry
//! - [`dom`]: the in-memory DOM the runtime walks and mutates
//! - [`ssr`]: the server renderer, hydration markers, and the document
//!   cache
//! - [`hydration`]: client-side hydration with eager/visible/interactive
//!   strategies
//! - [`events`]: container-level event delegation over `data-event` /
//!   `data-action` attributes
//! - [`hmr`]: the hot-replacement poller (feature `hmr`)
//! - [`router`]: path-string route resolution
//!
//! ## Example
//!
//! ```
//! use switch_pages::{ComponentDef, ComponentInstance, ComponentRegistry};
//! use switch_pages::{SsrOptions, SsrRenderer};
//! use serde_json::json;
//!
//! let registry = ComponentRegistry::new();
//! registry.register_definition(
//! 	ComponentDef::builder("Hello")
//! 		.default_props(json!({ "name": "world" }))
//! 		.render(|props, _| format!("<p>Hello, {}!</p>", props["name"].as_str().unwrap_or("")))
//! 		.build(),
//! );
//!
//! let def = registry.definition("Hello").unwrap();
//! let root = ComponentInstance::create(def, json!({})).into_shared();
//! let renderer = SsrRenderer::new(registry);
//! let html = renderer.render_document(&root, &SsrOptions::new().title("Demo")).unwrap();
//! assert!(html.contains("Hello, world!"));
//! ```

#![warn(missing_docs)]

pub mod component;
pub mod dom;
pub mod events;
#[cfg(feature = "hmr")]
pub mod hmr;
pub mod hydration;
pub mod logging;
pub mod router;
pub mod ssr;

pub use component::{
	ActionHandler, ComponentDef, ComponentDefBuilder, ComponentInstance, ComponentRegistry,
	LifecycleHook, RenderFn, SharedInstance,
};
pub use dom::{Document, DomError, DomEvent, Element, Node, WeakElement};
pub use events::{Action, EventDelegate};
#[cfg(feature = "hmr")]
pub use hmr::{HmrConfig, HmrError, HmrPoller, HmrTransport, PollerPhase};
pub use hydration::{HydrationError, HydrationReport, Hydrator};
pub use router::{PathPattern, RouteMatch, Router};
pub use ssr::{
	HydrationRecord, HydrationStrategy, InitialData, RenderCache, RenderError, SsrOptions,
	SsrRenderer,
};
