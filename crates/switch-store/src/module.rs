//! Namespaced store modules.
//!
//! A module carries its own state slice plus mutation/action/getter
//! tables. Registering it under a namespace mounts the slice at
//! `state[namespace]` and prefixes every table key with `namespace/`.
//! Registration and unregistration are legal at any point in the store's
//! lifetime; no restart is involved.

use std::collections::HashMap;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;
use crate::store::{ActionContext, ActionFn, GetterFn, Getters, MutationFn, Store};

/// A detachable slice of store behavior. Build with
/// [`ModuleDefinition::builder`].
pub struct ModuleDefinition {
	pub(crate) state: Value,
	pub(crate) mutations: HashMap<String, MutationFn>,
	pub(crate) actions: HashMap<String, ActionFn>,
	pub(crate) getters: HashMap<String, GetterFn>,
}

impl std::fmt::Debug for ModuleDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ModuleDefinition")
			.field("mutations", &self.mutations.len())
			.field("actions", &self.actions.len())
			.field("getters", &self.getters.len())
			.finish()
	}
}

impl ModuleDefinition {
	/// Starts a new [`ModuleBuilder`].
	pub fn builder() -> ModuleBuilder {
		ModuleBuilder::default()
	}
}

/// Builder for [`ModuleDefinition`].
#[derive(Default)]
pub struct ModuleBuilder {
	state: Option<Value>,
	mutations: HashMap<String, MutationFn>,
	actions: HashMap<String, ActionFn>,
	getters: HashMap<String, GetterFn>,
}

impl std::fmt::Debug for ModuleBuilder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ModuleBuilder")
			.field("mutations", &self.mutations.len())
			.finish()
	}
}

impl ModuleBuilder {
	/// Sets the module's state slice. Defaults to an empty object.
	pub fn state(mut self, state: Value) -> Self {
		self.state = Some(state);
		self
	}

	/// Registers a mutation scoped to the module's state slice.
	pub fn mutation<F>(mut self, name: impl Into<String>, mutation: F) -> Self
	where
		F: Fn(&mut Value, Value) + 'static,
	{
		self.mutations.insert(name.into(), Rc::new(mutation));
		self
	}

	/// Registers an async action. Module actions receive the store-wide
	/// context; their commits use fully prefixed mutation types.
	pub fn action<F>(mut self, name: impl Into<String>, action: F) -> Self
	where
		F: Fn(ActionContext, Value) -> LocalBoxFuture<'static, Result<Value, StoreError>> + 'static,
	{
		self.actions.insert(name.into(), Rc::new(action));
		self
	}

	/// Registers a synchronous action.
	pub fn sync_action<F>(self, name: impl Into<String>, action: F) -> Self
	where
		F: Fn(ActionContext, Value) -> Result<Value, StoreError> + 'static,
	{
		use futures::FutureExt;
		self.action(name, move |context, payload| {
			futures::future::ready(action(context, payload)).boxed_local()
		})
	}

	/// Registers a getter scoped to the module's state slice.
	pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
	where
		F: Fn(&Value, &Getters<'_>) -> Value + 'static,
	{
		self.getters.insert(name.into(), Rc::new(getter));
		self
	}

	/// Builds the module definition.
	pub fn build(self) -> ModuleDefinition {
		ModuleDefinition {
			state: self.state.unwrap_or_else(|| Value::Object(Default::default())),
			mutations: self.mutations,
			actions: self.actions,
			getters: self.getters,
		}
	}
}

impl Store {
	/// Mounts a module under `namespace`.
	///
	/// The module's state lands at `state[namespace]`; its mutations and
	/// getters are re-keyed as `namespace/name` and wrapped so they see
	/// only the slice. Registering over an existing namespace replaces
	/// it.
	pub fn register_module(&self, namespace: &str, module: ModuleDefinition) {
		if let Value::Object(map) = &mut *self.state.borrow_mut() {
			map.insert(namespace.to_string(), module.state);
		}

		let mut mutations = self.mutations.borrow_mut();
		for (name, mutation) in module.mutations {
			let ns = namespace.to_string();
			let scoped: MutationFn = Rc::new(move |root: &mut Value, payload: Value| {
				if let Some(slice) = root.get_mut(&ns) {
					mutation(slice, payload);
				}
			});
			mutations.insert(format!("{}/{}", namespace, name), scoped);
		}
		drop(mutations);

		let mut actions = self.actions.borrow_mut();
		for (name, action) in module.actions {
			actions.insert(format!("{}/{}", namespace, name), action);
		}
		drop(actions);

		let mut getters = self.getters.borrow_mut();
		for (name, getter) in module.getters {
			let ns = namespace.to_string();
			let scoped: GetterFn = Rc::new(move |root: &Value, proxy: &Getters<'_>| {
				match root.get(&ns) {
					Some(slice) => getter(slice, proxy),
					None => Value::Null,
				}
			});
			getters.insert(format!("{}/{}", namespace, name), scoped);
		}
		drop(getters);

		debug!(namespace, "store module registered");
	}

	/// Unmounts a module: removes the `namespace/` entries from all three
	/// tables and drops the state slice. Unknown namespaces are a no-op.
	pub fn unregister_module(&self, namespace: &str) {
		let prefix = format!("{}/", namespace);
		self.mutations
			.borrow_mut()
			.retain(|name, _| !name.starts_with(&prefix));
		self.actions
			.borrow_mut()
			.retain(|name, _| !name.starts_with(&prefix));
		self.getters
			.borrow_mut()
			.retain(|name, _| !name.starts_with(&prefix));
		if let Value::Object(map) = &mut *self.state.borrow_mut() {
			map.remove(namespace);
		}
		debug!(namespace, "store module unregistered");
	}
}
