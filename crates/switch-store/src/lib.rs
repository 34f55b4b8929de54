//! Switch Store - application state for the Switch framework.
//!
//! A single mutable state tree with named synchronous mutations, async
//! actions, lazy getters, namespaced modules, and ordered subscriber
//! notification. The discipline is the classic one: state is only ever
//! mutated inside a mutation function, `commit` applies one mutation
//! synchronously, `dispatch` runs an action that may commit any number
//! of them.
//!
//! ## Example
//!
//! ```
//! use switch_store::Store;
//! use serde_json::json;
//!
//! let store = Store::builder()
//! 	.state(json!({ "count": 0 }))
//! 	.mutation("INCREMENT", |state, _| {
//! 		state["count"] = json!(state["count"].as_i64().unwrap_or(0) + 1);
//! 	})
//! 	.build();
//!
//! store.commit("INCREMENT", serde_json::Value::Null);
//! assert_eq!(store.state()["count"], json!(1));
//! ```

#![warn(missing_docs)]

mod error;
mod module;
#[cfg(feature = "persistence")]
pub mod persistence;
mod store;

pub use error::StoreError;
pub use module::{ModuleBuilder, ModuleDefinition};
pub use store::{
	ActionContext, ActionFn, GetterFn, Getters, MutationFn, MutationRecord, Store, StoreBuilder,
	SubscriberFn, SubscriberHandle,
};
