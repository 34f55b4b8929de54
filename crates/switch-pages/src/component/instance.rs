//! Live component instances.
//!
//! An instance owns its merged props, its mutable state, and an ordered
//! list of child instances. On the client it additionally holds a weak
//! anchor to the DOM element its markup lives under; `update` re-renders
//! the whole subtree into that anchor (full replace, no diffing) and
//! re-resolves the anchors of nested components.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use super::definition::ComponentDef;
use crate::dom::{Element, WeakElement};
use crate::dom::escape_attr;
use crate::ssr::markers::{ATTR_CHILDREN, ATTR_COMPONENT, ATTR_ID, ATTR_STRATEGY, next_hydration_id};

/// Shared handle to an instance, as stored in trees and the registry.
pub type SharedInstance = Rc<RefCell<ComponentInstance>>;

static INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_instance_id() -> String {
	format!("c-{}", INSTANCE_COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// A live component.
pub struct ComponentInstance {
	id: String,
	def: Arc<ComponentDef>,
	props: Value,
	state: Option<Value>,
	hydration_id: Option<String>,
	children: Vec<SharedInstance>,
	anchor: Option<WeakElement>,
}

impl std::fmt::Debug for ComponentInstance {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ComponentInstance")
			.field("id", &self.id)
			.field("component", &self.def.name())
			.field("hydration_id", &self.hydration_id)
			.field("children", &self.children.len())
			.field("mounted", &self.anchor.is_some())
			.finish()
	}
}

impl ComponentInstance {
	/// Creates an instance from a definition.
	///
	/// Props are the definition's defaults shallow-merged with
	/// `props`, caller values winning on key collisions. State starts as
	/// a clone of the definition's initial state.
	pub fn create(def: Arc<ComponentDef>, props: Value) -> Self {
		let merged = merge_props(def.default_props(), props);
		let state = def.initial_state().cloned();
		Self {
			id: next_instance_id(),
			def,
			props: merged,
			state,
			hydration_id: None,
			children: Vec::new(),
			anchor: None,
		}
	}

	/// Rebuilds an instance from hydration data, restoring props and
	/// state verbatim.
	pub(crate) fn restore(
		def: Arc<ComponentDef>,
		component_id: String,
		hydration_id: String,
		props: Value,
		state: Option<Value>,
	) -> Self {
		Self {
			id: component_id,
			def,
			props,
			state,
			hydration_id: Some(hydration_id),
			children: Vec::new(),
			anchor: None,
		}
	}

	/// Wraps the instance in the shared handle used by trees and the
	/// registry.
	pub fn into_shared(self) -> SharedInstance {
		Rc::new(RefCell::new(self))
	}

	/// The instance's component id.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// The definition this instance was stamped from.
	pub fn definition(&self) -> Arc<ComponentDef> {
		Arc::clone(&self.def)
	}

	/// The merged props.
	pub fn props(&self) -> &Value {
		&self.props
	}

	/// The current state, if stateful.
	pub fn state(&self) -> Option<&Value> {
		self.state.as_ref()
	}

	/// The hydration id assigned at render or hydration time.
	pub fn hydration_id(&self) -> Option<&str> {
		self.hydration_id.as_deref()
	}

	pub(crate) fn set_hydration_id(&mut self, id: String) {
		self.hydration_id = Some(id);
	}

	/// Ordered child instances.
	pub fn children(&self) -> &[SharedInstance] {
		&self.children
	}

	/// Appends a child instance.
	pub fn add_child(&mut self, child: SharedInstance) {
		self.children.push(child);
	}

	/// The anchored DOM element, if mounted and still alive.
	pub fn anchor(&self) -> Option<Element> {
		self.anchor.as_ref().and_then(WeakElement::upgrade)
	}

	/// Renders the component's own markup from current props and state.
	pub fn render(&self) -> String {
		self.def.render(&self.props, self.state.as_ref())
	}

	/// Anchors the instance to a DOM element and fires the `mounted`
	/// hook. Mounting an already-mounted instance only moves the anchor.
	pub fn mount(&mut self, element: &Element) {
		let was_mounted = self.anchor.is_some();
		self.anchor = Some(element.downgrade());
		if !was_mounted {
			if let Some(hook) = self.def.mounted_hook() {
				hook(self);
			}
		}
	}

	/// Fires `unmounted` hooks down the subtree, clears anchors, and
	/// drops the children.
	pub fn unmount(&mut self) {
		for child in std::mem::take(&mut self.children) {
			child.borrow_mut().unmount();
		}
		if self.anchor.take().is_some() {
			if let Some(hook) = self.def.unmounted_hook() {
				hook(self);
			}
		}
	}

	/// Shallow-merges `patch` into state and re-renders the subtree.
	///
	/// Before mount (no live anchor) the state still changes but the DOM
	/// is untouched; that asymmetry is part of the component contract.
	pub fn update(&mut self, patch: Value) {
		match &mut self.state {
			Some(state) => shallow_merge(state, patch),
			None => self.state = Some(patch),
		}
		let Some(anchor) = self.anchor() else {
			return;
		};
		self.ensure_child_hydration_ids();
		let html = self.inner_subtree_html();
		if let Err(err) = anchor.set_inner_html(&html) {
			crate::error_log!("re-render of {} produced unparsable markup: {}", self.id, err);
			return;
		}
		for child in &self.children {
			resolve_anchors(child, &anchor);
		}
	}

	/// Gives ids to children added after the last render, so a client
	/// re-render can wrap them.
	fn ensure_child_hydration_ids(&mut self) {
		for child in &self.children {
			let mut child = child.borrow_mut();
			if child.hydration_id.is_none() {
				child.hydration_id = Some(next_hydration_id());
			}
			child.ensure_child_hydration_ids();
		}
	}

	/// The subtree markup inside this component's wrapper: own render
	/// output, then the marked child container.
	pub(crate) fn inner_subtree_html(&self) -> String {
		let mut html = self.render();
		if !self.children.is_empty() {
			html.push_str(&format!("<div {}=\"\">", ATTR_CHILDREN));
			for child in &self.children {
				html.push_str(&child.borrow().wrapped_subtree_html());
			}
			html.push_str("</div>");
		}
		html
	}

	/// The subtree markup including this component's own wrapper.
	pub(crate) fn wrapped_subtree_html(&self) -> String {
		let id = self.hydration_id.as_deref().unwrap_or_default();
		format!(
			"<div {}=\"{}\" {}=\"{}\" {}=\"{}\">{}</div>",
			ATTR_ID,
			escape_attr(id),
			ATTR_COMPONENT,
			escape_attr(self.def.name()),
			ATTR_STRATEGY,
			self.def.strategy().as_str(),
			self.inner_subtree_html()
		)
	}
}

/// Re-resolves the anchors of `instance` and its descendants inside
/// `root` after a subtree replace. Hooks do not re-fire.
pub(crate) fn resolve_anchors(instance: &SharedInstance, root: &Element) {
	let mut inst = instance.borrow_mut();
	let Some(id) = inst.hydration_id.clone() else {
		return;
	};
	let Some(element) = root.find_by_attr(ATTR_ID, &id) else {
		crate::warn_log!("anchor for {} not found after re-render", id);
		return;
	};
	inst.anchor = Some(element.downgrade());
	let children: Vec<SharedInstance> = inst.children.to_vec();
	drop(inst);
	for child in &children {
		resolve_anchors(child, &element);
	}
}

fn merge_props(defaults: &Value, props: Value) -> Value {
	let mut merged = defaults.clone();
	shallow_merge(&mut merged, props);
	merged
}

/// Shallow merge: top-level keys of `patch` replace those of `target`.
fn shallow_merge(target: &mut Value, patch: Value) {
	match (target, patch) {
		(Value::Object(target_map), Value::Object(patch_map)) => {
			for (key, value) in patch_map {
				target_map.insert(key, value);
			}
		}
		(_, Value::Null) => {}
		(slot, patch) => *slot = patch,
	}
}
