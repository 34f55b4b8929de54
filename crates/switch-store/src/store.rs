//! The Switch store: a single state tree with named mutations, async
//! actions, and lazy getters.
//!
//! State is mutated only inside registered mutation functions. `commit`
//! applies one mutation synchronously and notifies subscribers in
//! registration order; `dispatch` runs an action that may commit any
//! number of mutations and resolves to the action's return value.
//!
//! The store is single-threaded by design, mirroring the event-loop
//! execution model of the client runtime. Hold it behind `Rc<Store>`;
//! actions receive a context that clones that handle.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::StoreError;

/// Mutation function: receives the live state tree and the commit payload.
pub type MutationFn = Rc<dyn Fn(&mut Value, Value)>;

/// Action function: receives a context handle and the dispatch payload,
/// returns a future resolving to the action's result.
pub type ActionFn = Rc<dyn Fn(ActionContext, Value) -> LocalBoxFuture<'static, Result<Value, StoreError>>>;

/// Getter function: receives a state snapshot and a proxy for reading
/// other getters.
pub type GetterFn = Rc<dyn Fn(&Value, &Getters<'_>) -> Value>;

/// Subscriber callback: `(mutation, new_state, previous_state)`.
pub type SubscriberFn = Rc<dyn Fn(&MutationRecord, &Value, &Value)>;

/// Describes one committed mutation, passed to every subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct MutationRecord {
	/// The mutation type as committed (namespace prefix included).
	pub mutation_type: String,
	/// The payload the caller passed to `commit`.
	pub payload: Value,
}

/// Handle returned by [`Store::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberHandle(u64);

/// Read proxy handed to getter functions so they can compose.
pub struct Getters<'a> {
	store: &'a Store,
}

impl Getters<'_> {
	/// Evaluates another getter by name. Unknown names yield `Null`.
	pub fn get(&self, name: &str) -> Value {
		self.store.getter(name)
	}
}

/// Context handed to action functions.
///
/// Exposes the same commit/dispatch surface as the store itself plus a
/// state snapshot, so actions never touch state directly.
#[derive(Clone)]
pub struct ActionContext {
	pub(crate) store: Rc<Store>,
}

impl ActionContext {
	/// Returns a snapshot of the current state tree.
	pub fn state(&self) -> Value {
		self.store.state()
	}

	/// Evaluates a getter by name.
	pub fn getter(&self, name: &str) -> Value {
		self.store.getter(name)
	}

	/// Commits a mutation through the owning store.
	pub fn commit(&self, mutation_type: &str, payload: Value) {
		self.store.commit(mutation_type, payload);
	}

	/// Dispatches another action through the owning store.
	pub fn dispatch(&self, action_type: &str, payload: Value) -> LocalBoxFuture<'static, Result<Value, StoreError>> {
		self.store.dispatch(action_type, payload)
	}
}

impl std::fmt::Debug for ActionContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ActionContext").finish_non_exhaustive()
	}
}

/// The store. Construct with [`Store::builder`].
pub struct Store {
	pub(crate) state: RefCell<Value>,
	pub(crate) mutations: RefCell<HashMap<String, MutationFn>>,
	pub(crate) actions: RefCell<HashMap<String, ActionFn>>,
	pub(crate) getters: RefCell<HashMap<String, GetterFn>>,
	subscribers: RefCell<Vec<(u64, SubscriberFn)>>,
	next_subscriber: Cell<u64>,
}

impl std::fmt::Debug for Store {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Store")
			.field("mutations", &self.mutations.borrow().len())
			.field("actions", &self.actions.borrow().len())
			.field("getters", &self.getters.borrow().len())
			.field("subscribers", &self.subscribers.borrow().len())
			.finish()
	}
}

impl Store {
	/// Starts a new [`StoreBuilder`].
	pub fn builder() -> StoreBuilder {
		StoreBuilder::default()
	}

	/// Returns a snapshot of the whole state tree.
	pub fn state(&self) -> Value {
		self.state.borrow().clone()
	}

	/// Applies one named mutation synchronously.
	///
	/// Unknown types are reported and ignored; state stays untouched and
	/// subscribers are not notified. On success every subscriber is
	/// invoked, in registration order, with the mutation record, the new
	/// state, and a snapshot taken before the mutation ran.
	pub fn commit(&self, mutation_type: &str, payload: Value) {
		let mutation = self.mutations.borrow().get(mutation_type).cloned();
		let Some(mutation) = mutation else {
			error!(mutation_type, "commit of unknown mutation type ignored");
			return;
		};

		let previous = self.state.borrow().clone();
		mutation(&mut self.state.borrow_mut(), payload.clone());

		let record = MutationRecord {
			mutation_type: mutation_type.to_string(),
			payload,
		};
		let new_state = self.state.borrow().clone();
		// Snapshot the subscriber list so callbacks may subscribe or
		// unsubscribe re-entrantly.
		let subscribers: Vec<SubscriberFn> = self
			.subscribers
			.borrow()
			.iter()
			.map(|(_, callback)| Rc::clone(callback))
			.collect();
		for callback in subscribers {
			callback(&record, &new_state, &previous);
		}
	}

	/// Runs one named action and returns its future.
	///
	/// Unknown types resolve immediately to
	/// [`StoreError::UnknownAction`]; the rejection is the returned
	/// future, nothing is thrown.
	pub fn dispatch(self: &Rc<Self>, action_type: &str, payload: Value) -> LocalBoxFuture<'static, Result<Value, StoreError>> {
		let action = self.actions.borrow().get(action_type).cloned();
		match action {
			Some(action) => {
				let context = ActionContext {
					store: Rc::clone(self),
				};
				action(context, payload)
			}
			None => {
				error!(action_type, "dispatch of unknown action type rejected");
				let err = StoreError::UnknownAction(action_type.to_string());
				futures::future::ready(Err(err)).boxed_local()
			}
		}
	}

	/// Evaluates a getter by name.
	///
	/// Getters are recomputed on every read against a fresh state
	/// snapshot; there is no memoization. Unknown names yield `Null`.
	pub fn getter(&self, name: &str) -> Value {
		let getter = self.getters.borrow().get(name).cloned();
		match getter {
			Some(getter) => {
				let state = self.state.borrow().clone();
				getter(&state, &Getters { store: self })
			}
			None => {
				error!(getter = name, "read of unknown getter");
				Value::Null
			}
		}
	}

	/// Registers a subscriber invoked after every committed mutation.
	pub fn subscribe<F>(&self, callback: F) -> SubscriberHandle
	where
		F: Fn(&MutationRecord, &Value, &Value) + 'static,
	{
		let id = self.next_subscriber.get();
		self.next_subscriber.set(id + 1);
		self.subscribers.borrow_mut().push((id, Rc::new(callback)));
		debug!(subscriber = id, "store subscriber registered");
		SubscriberHandle(id)
	}

	/// Removes a previously registered subscriber. Unknown handles are a
	/// no-op.
	pub fn unsubscribe(&self, handle: SubscriberHandle) {
		self.subscribers
			.borrow_mut()
			.retain(|(id, _)| *id != handle.0);
	}

	/// Number of registered subscribers.
	pub fn subscriber_count(&self) -> usize {
		self.subscribers.borrow().len()
	}
}

/// Builder for [`Store`].
#[derive(Default)]
pub struct StoreBuilder {
	state: Option<Value>,
	mutations: HashMap<String, MutationFn>,
	actions: HashMap<String, ActionFn>,
	getters: HashMap<String, GetterFn>,
}

impl std::fmt::Debug for StoreBuilder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StoreBuilder")
			.field("mutations", &self.mutations.len())
			.field("actions", &self.actions.len())
			.field("getters", &self.getters.len())
			.finish()
	}
}

impl StoreBuilder {
	/// Sets the initial state tree. Defaults to an empty object.
	pub fn state(mut self, state: Value) -> Self {
		self.state = Some(state);
		self
	}

	/// Registers a mutation.
	pub fn mutation<F>(mut self, name: impl Into<String>, mutation: F) -> Self
	where
		F: Fn(&mut Value, Value) + 'static,
	{
		self.mutations.insert(name.into(), Rc::new(mutation));
		self
	}

	/// Registers an async action.
	pub fn action<F>(mut self, name: impl Into<String>, action: F) -> Self
	where
		F: Fn(ActionContext, Value) -> LocalBoxFuture<'static, Result<Value, StoreError>> + 'static,
	{
		self.actions.insert(name.into(), Rc::new(action));
		self
	}

	/// Registers a synchronous action; the return value is wrapped in a
	/// resolved (or rejected) future, the same shape async actions have.
	pub fn sync_action<F>(self, name: impl Into<String>, action: F) -> Self
	where
		F: Fn(ActionContext, Value) -> Result<Value, StoreError> + 'static,
	{
		self.action(name, move |context, payload| {
			futures::future::ready(action(context, payload)).boxed_local()
		})
	}

	/// Registers a getter.
	pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
	where
		F: Fn(&Value, &Getters<'_>) -> Value + 'static,
	{
		self.getters.insert(name.into(), Rc::new(getter));
		self
	}

	/// Builds the store.
	pub fn build(self) -> Rc<Store> {
		Rc::new(Store {
			state: RefCell::new(self.state.unwrap_or_else(|| Value::Object(Default::default()))),
			mutations: RefCell::new(self.mutations),
			actions: RefCell::new(self.actions),
			getters: RefCell::new(self.getters),
			subscribers: RefCell::new(Vec::new()),
			next_subscriber: Cell::new(0),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::executor::block_on;
	use rstest::rstest;
	use serde_json::json;
	use std::cell::RefCell;

	fn counter_store() -> Rc<Store> {
		Store::builder()
			.state(json!({ "count": 0 }))
			.mutation("INCREMENT", |state, _| {
				state["count"] = json!(state["count"].as_i64().unwrap_or(0) + 1);
			})
			.mutation("SET", |state, payload| {
				state["count"] = payload;
			})
			.build()
	}

	#[test]
	fn test_commit_applies_mutation() {
		let store = counter_store();
		store.commit("INCREMENT", Value::Null);
		assert_eq!(store.state()["count"], json!(1));
	}

	#[rstest]
	#[case("NO_SUCH_MUTATION")]
	#[case("increment")]
	#[case("cart/INCREMENT")]
	fn test_commit_unknown_mutation_is_noop(#[case] mutation_type: &str) {
		let store = counter_store();
		store.commit(mutation_type, json!(99));
		assert_eq!(store.state()["count"], json!(0));
	}

	#[test]
	fn test_subscribers_see_previous_and_new_state() {
		let store = counter_store();
		let seen: Rc<RefCell<Vec<(Value, Value)>>> = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&seen);
		store.subscribe(move |record, new_state, previous| {
			assert_eq!(record.mutation_type, "INCREMENT");
			sink.borrow_mut()
				.push((previous["count"].clone(), new_state["count"].clone()));
		});

		store.commit("INCREMENT", Value::Null);

		let seen = seen.borrow();
		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0], (json!(0), json!(1)));
	}

	#[test]
	fn test_subscribers_invoked_in_registration_order() {
		let store = counter_store();
		let order: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
		for tag in 0u8..3 {
			let order = Rc::clone(&order);
			store.subscribe(move |_, _, _| order.borrow_mut().push(tag));
		}
		store.commit("INCREMENT", Value::Null);
		assert_eq!(*order.borrow(), vec![0, 1, 2]);
	}

	#[test]
	fn test_unsubscribe_stops_notifications() {
		let store = counter_store();
		let calls = Rc::new(Cell::new(0));
		let counter = Rc::clone(&calls);
		let handle = store.subscribe(move |_, _, _| counter.set(counter.get() + 1));

		store.commit("INCREMENT", Value::Null);
		store.unsubscribe(handle);
		store.commit("INCREMENT", Value::Null);

		assert_eq!(calls.get(), 1);
		assert_eq!(store.subscriber_count(), 0);
	}

	#[test]
	fn test_dispatch_runs_action_and_resolves() {
		let store = Store::builder()
			.state(json!({ "count": 0 }))
			.mutation("SET", |state, payload| state["count"] = payload)
			.sync_action("setAndReport", |context, payload| {
				context.commit("SET", payload.clone());
				Ok(json!({ "set": payload }))
			})
			.build();

		let result = block_on(store.dispatch("setAndReport", json!(7)));
		assert_eq!(result, Ok(json!({ "set": 7 })));
		assert_eq!(store.state()["count"], json!(7));
	}

	#[test]
	fn test_dispatch_unknown_action_rejects() {
		let store = counter_store();
		let result = block_on(store.dispatch("unknownAction", Value::Null));
		assert_eq!(
			result,
			Err(StoreError::UnknownAction("unknownAction".to_string()))
		);
	}

	#[test]
	fn test_dispatch_chains_through_context() {
		let store = Store::builder()
			.state(json!({ "count": 0 }))
			.mutation("INCREMENT", |state, _| {
				state["count"] = json!(state["count"].as_i64().unwrap_or(0) + 1);
			})
			.sync_action("bump", |context, _| {
				context.commit("INCREMENT", Value::Null);
				Ok(context.state()["count"].clone())
			})
			.action("bumpTwice", |context, _| {
				async move {
					context.dispatch("bump", Value::Null).await?;
					context.dispatch("bump", Value::Null).await
				}
				.boxed_local()
			})
			.build();

		let result = block_on(store.dispatch("bumpTwice", Value::Null));
		assert_eq!(result, Ok(json!(2)));
	}

	#[test]
	fn test_getters_recompute_on_every_read() {
		let store = Store::builder()
			.state(json!({ "count": 2 }))
			.mutation("SET", |state, payload| state["count"] = payload)
			.getter("doubled", |state, _| {
				json!(state["count"].as_i64().unwrap_or(0) * 2)
			})
			.getter("quadrupled", |_, getters| {
				json!(getters.get("doubled").as_i64().unwrap_or(0) * 2)
			})
			.build();

		assert_eq!(store.getter("doubled"), json!(4));
		assert_eq!(store.getter("quadrupled"), json!(8));
		store.commit("SET", json!(5));
		assert_eq!(store.getter("doubled"), json!(10));
		assert_eq!(store.getter("quadrupled"), json!(20));
	}

	#[test]
	fn test_unknown_getter_reads_null() {
		let store = counter_store();
		assert_eq!(store.getter("nope"), Value::Null);
	}
}
