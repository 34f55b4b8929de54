//! # Switch
//!
//! A server-rendered component framework: components render to HTML
//! strings on the server, the document carries a serialized description
//! of the tree, and the client hydrates behavior back onto the existing
//! markup through attribute-driven event delegation. State lives in a
//! single store with named mutations and async actions.
//!
//! This crate is the facade; the work happens in the member crates:
//!
//! - `switch-pages`: components, SSR, hydration, event delegation, HMR
//! - `switch-store`: the mutation/action/getter store
//!
//! ## Feature Flags
//!
//! - `hmr` - the hot-replacement poller (pulls in tokio)
//! - `persistence` - the storage-backed store mirror
//! - `full` (default) - everything above
//!
//! ## Quick Example
//!
//! ```
//! use switch::{ComponentDef, ComponentInstance, ComponentRegistry};
//! use switch::{Document, EventDelegate, Hydrator, SsrOptions, SsrRenderer};
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! // Server: register a component and render the document.
//! let registry = ComponentRegistry::new();
//! registry.register_definition(
//! 	ComponentDef::builder("Counter")
//! 		.initial_state(json!({ "count": 0 }))
//! 		.render(|_, state| {
//! 			format!(
//! 				"<button data-event=\"click\" data-action=\"inc\">{}</button>",
//! 				state.and_then(|s| s["count"].as_i64()).unwrap_or(0)
//! 			)
//! 		})
//! 		.on("click", "inc", |instance, _action, _event| {
//! 			let next = instance.state().and_then(|s| s["count"].as_i64()).unwrap_or(0) + 1;
//! 			instance.update(json!({ "count": next }));
//! 		})
//! 		.build(),
//! );
//! let def = registry.definition("Counter").unwrap();
//! let root = ComponentInstance::create(def, json!({})).into_shared();
//! let renderer = SsrRenderer::new(Rc::clone(&registry));
//! let html = renderer.render_document(&root, &SsrOptions::new().title("Demo")).unwrap();
//!
//! // Client: parse, hydrate, dispatch.
//! let document = Document::parse(&html).unwrap();
//! let delegate = EventDelegate::new(Rc::clone(&registry));
//! let hydrator = Hydrator::new(registry, Rc::clone(&delegate));
//! let report = hydrator.hydrate_document(&document).unwrap();
//! assert_eq!(report.hydrated, 1);
//! ```

#![warn(missing_docs)]

pub use switch_pages as pages;
pub use switch_store as store;

pub use switch_pages::{
	Action, ActionHandler, ComponentDef, ComponentDefBuilder, ComponentInstance,
	ComponentRegistry, Document, DomError, DomEvent, Element, EventDelegate, HydrationError,
	HydrationRecord, HydrationReport, HydrationStrategy, Hydrator, InitialData, LifecycleHook,
	Node, PathPattern, RenderCache, RenderError, RenderFn, RouteMatch, Router, SharedInstance,
	SsrOptions, SsrRenderer, WeakElement,
};

#[cfg(feature = "hmr")]
pub use switch_pages::{HmrConfig, HmrError, HmrPoller, HmrTransport, PollerPhase};

pub use switch_store::{
	ActionContext, Getters, ModuleBuilder, ModuleDefinition, MutationRecord, Store, StoreBuilder,
	StoreError, SubscriberHandle,
};

#[cfg(feature = "persistence")]
pub use switch_store::persistence;
