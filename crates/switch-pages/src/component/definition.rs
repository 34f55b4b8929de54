//! Component definitions.
//!
//! A definition is the immutable bundle a component is stamped from:
//! default props, optional initial state, a render function producing
//! markup from `(props, state)`, and action handlers reached through the
//! event delegation layer. Build one with [`ComponentDef::builder`] and
//! share it as `Arc<ComponentDef>`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde_json::Value;

use super::instance::ComponentInstance;
use crate::dom::DomEvent;
use crate::events::Action;
use crate::ssr::markers::HydrationStrategy;

/// Render function: `(props, state) -> markup`.
pub type RenderFn = Arc<dyn Fn(&Value, Option<&Value>) -> String>;

/// Action handler. Receives the owning instance explicitly, the parsed
/// action, and the raw event.
pub type ActionHandler = Arc<dyn Fn(&mut ComponentInstance, &Action, &DomEvent)>;

/// Lifecycle hook, fired at mount and unmount only (never on update).
pub type LifecycleHook = Arc<dyn Fn(&ComponentInstance)>;

/// An immutable component definition.
pub struct ComponentDef {
	name: String,
	default_props: Value,
	initial_state: Option<Value>,
	render: RenderFn,
	handlers: HashMap<String, ActionHandler>,
	event_types: BTreeSet<String>,
	strategy: HydrationStrategy,
	mounted: Option<LifecycleHook>,
	unmounted: Option<LifecycleHook>,
}

impl std::fmt::Debug for ComponentDef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ComponentDef")
			.field("name", &self.name)
			.field("handlers", &self.handlers.len())
			.field("event_types", &self.event_types)
			.field("strategy", &self.strategy)
			.finish()
	}
}

impl ComponentDef {
	/// Starts a builder for a definition named `name`.
	pub fn builder(name: impl Into<String>) -> ComponentDefBuilder {
		ComponentDefBuilder {
			name: name.into(),
			default_props: Value::Object(Default::default()),
			initial_state: None,
			render: None,
			handlers: HashMap::new(),
			event_types: BTreeSet::new(),
			strategy: HydrationStrategy::default(),
			mounted: None,
			unmounted: None,
		}
	}

	/// The definition name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The default props object.
	pub fn default_props(&self) -> &Value {
		&self.default_props
	}

	/// The initial state, if the component is stateful.
	pub fn initial_state(&self) -> Option<&Value> {
		self.initial_state.as_ref()
	}

	/// The component's hydration strategy.
	pub fn strategy(&self) -> HydrationStrategy {
		self.strategy
	}

	/// Invokes the render function.
	pub fn render(&self, props: &Value, state: Option<&Value>) -> String {
		(self.render)(props, state)
	}

	/// Looks up the handler registered for an action name.
	pub fn handler(&self, action: &str) -> Option<ActionHandler> {
		self.handlers.get(action).cloned()
	}

	/// The DOM event types this component's markup listens for.
	pub fn event_types(&self) -> &BTreeSet<String> {
		&self.event_types
	}

	pub(crate) fn mounted_hook(&self) -> Option<LifecycleHook> {
		self.mounted.clone()
	}

	pub(crate) fn unmounted_hook(&self) -> Option<LifecycleHook> {
		self.unmounted.clone()
	}
}

/// Builder for [`ComponentDef`].
pub struct ComponentDefBuilder {
	name: String,
	default_props: Value,
	initial_state: Option<Value>,
	render: Option<RenderFn>,
	handlers: HashMap<String, ActionHandler>,
	event_types: BTreeSet<String>,
	strategy: HydrationStrategy,
	mounted: Option<LifecycleHook>,
	unmounted: Option<LifecycleHook>,
}

impl std::fmt::Debug for ComponentDefBuilder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ComponentDefBuilder")
			.field("name", &self.name)
			.finish()
	}
}

impl ComponentDefBuilder {
	/// Sets the default props object.
	pub fn default_props(mut self, props: Value) -> Self {
		self.default_props = props;
		self
	}

	/// Sets the initial state, making the component stateful.
	pub fn initial_state(mut self, state: Value) -> Self {
		self.initial_state = Some(state);
		self
	}

	/// Sets the render function.
	pub fn render<F>(mut self, render: F) -> Self
	where
		F: Fn(&Value, Option<&Value>) -> String + 'static,
	{
		self.render = Some(Arc::new(render));
		self
	}

	/// Registers a handler for `action` and declares that the markup
	/// uses the delegated `event_type` to reach it.
	pub fn on<F>(mut self, event_type: impl Into<String>, action: impl Into<String>, handler: F) -> Self
	where
		F: Fn(&mut ComponentInstance, &Action, &DomEvent) + 'static,
	{
		self.event_types.insert(event_type.into());
		self.handlers.insert(action.into(), Arc::new(handler));
		self
	}

	/// Sets the hydration strategy (default: eager).
	pub fn strategy(mut self, strategy: HydrationStrategy) -> Self {
		self.strategy = strategy;
		self
	}

	/// Sets the mount hook.
	pub fn mounted<F>(mut self, hook: F) -> Self
	where
		F: Fn(&ComponentInstance) + 'static,
	{
		self.mounted = Some(Arc::new(hook));
		self
	}

	/// Sets the unmount hook.
	pub fn unmounted<F>(mut self, hook: F) -> Self
	where
		F: Fn(&ComponentInstance) + 'static,
	{
		self.unmounted = Some(Arc::new(hook));
		self
	}

	/// Builds the definition.
	pub fn build(self) -> Arc<ComponentDef> {
		Arc::new(ComponentDef {
			name: self.name,
			default_props: self.default_props,
			initial_state: self.initial_state,
			render: self.render.unwrap_or_else(|| Arc::new(|_, _| String::new())),
			handlers: self.handlers,
			event_types: self.event_types,
			strategy: self.strategy,
			mounted: self.mounted,
			unmounted: self.unmounted,
		})
	}
}
