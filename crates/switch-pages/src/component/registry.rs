//! Component registry.
//!
//! The registry is plain injected state: the renderer, hydrator, event
//! delegate, and HMR poller all receive an `Rc<ComponentRegistry>`
//! handle at construction. There is no process-wide component table.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use super::definition::ComponentDef;
use super::instance::SharedInstance;

/// Definitions by name plus live instances by hydration id.
#[derive(Default)]
pub struct ComponentRegistry {
	definitions: RefCell<HashMap<String, Arc<ComponentDef>>>,
	instances: RefCell<HashMap<String, SharedInstance>>,
	by_component: RefCell<HashMap<String, String>>,
}

impl std::fmt::Debug for ComponentRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ComponentRegistry")
			.field("definitions", &self.definitions.borrow().len())
			.field("instances", &self.instances.borrow().len())
			.finish()
	}
}

impl ComponentRegistry {
	/// Creates an empty registry behind the shared handle everything
	/// consumes.
	pub fn new() -> Rc<Self> {
		Rc::new(Self::default())
	}

	/// Registers a definition under its name. Re-registering replaces.
	pub fn register_definition(&self, def: Arc<ComponentDef>) {
		self.definitions
			.borrow_mut()
			.insert(def.name().to_string(), def);
	}

	/// Looks up a definition by name.
	pub fn definition(&self, name: &str) -> Option<Arc<ComponentDef>> {
		self.definitions.borrow().get(name).cloned()
	}

	/// Tracks a live instance. The instance must already carry a
	/// hydration id; instances without one are ignored.
	pub fn insert(&self, instance: SharedInstance) {
		let (hydration_id, component_id) = {
			let inst = instance.borrow();
			match inst.hydration_id() {
				Some(id) => (id.to_string(), inst.id().to_string()),
				None => return,
			}
		};
		self.by_component
			.borrow_mut()
			.insert(component_id, hydration_id.clone());
		self.instances.borrow_mut().insert(hydration_id, instance);
	}

	/// Looks up an instance by hydration id.
	pub fn get(&self, hydration_id: &str) -> Option<SharedInstance> {
		self.instances.borrow().get(hydration_id).cloned()
	}

	/// Looks up an instance by component id.
	pub fn get_by_component(&self, component_id: &str) -> Option<SharedInstance> {
		let hydration_id = self.by_component.borrow().get(component_id).cloned()?;
		self.get(&hydration_id)
	}

	/// Whether a hydration id has a live instance.
	pub fn contains(&self, hydration_id: &str) -> bool {
		self.instances.borrow().contains_key(hydration_id)
	}

	/// Removes an instance and its whole subtree, firing `unmounted`
	/// hooks top-down. Unknown ids are a no-op.
	pub fn remove(&self, hydration_id: &str) {
		let Some(instance) = self.instances.borrow_mut().remove(hydration_id) else {
			return;
		};
		// Collect descendant ids before unmount clears the child lists.
		let mut ids = Vec::new();
		collect_ids(&instance, &mut ids);
		instance.borrow_mut().unmount();
		let mut instances = self.instances.borrow_mut();
		let mut by_component = self.by_component.borrow_mut();
		for (hid, cid) in ids {
			if let Some(hid) = hid {
				instances.remove(&hid);
			}
			by_component.remove(&cid);
		}
	}

	/// Number of live instances.
	pub fn instance_count(&self) -> usize {
		self.instances.borrow().len()
	}
}

fn collect_ids(instance: &SharedInstance, out: &mut Vec<(Option<String>, String)>) {
	let inst = instance.borrow();
	out.push((
		inst.hydration_id().map(str::to_string),
		inst.id().to_string(),
	));
	for child in inst.children() {
		collect_ids(child, out);
	}
}
