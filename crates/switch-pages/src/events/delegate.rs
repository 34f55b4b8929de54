//! Container-level event delegation.
//!
//! One logical listener per DOM event type, attached at the mount
//! container. Dispatch walks from the event target up to the container
//! looking for the nearest element whose `data-event` names the fired
//! type; only that element's owning component handles the event
//! (single-owner dispatch, not bubbling). Because listening happens at
//! the container, full-subtree DOM replacement never detaches handlers.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use super::action::Action;
use crate::component::ComponentRegistry;
use crate::dom::{DomEvent, Element};
use crate::ssr::markers::{ATTR_EVENT, ATTR_ID};

/// Callback run when an interactive-strategy subtree sees its first
/// gesture.
pub(crate) type TrapCallback = Box<dyn FnOnce(&EventDelegate)>;

struct InteractiveTrap {
	element: Element,
	trigger: TrapCallback,
}

/// The delegation layer. Shared (`Rc`) between the hydrator and the
/// host environment feeding it events.
pub struct EventDelegate {
	registry: Rc<ComponentRegistry>,
	container: RefCell<Option<Element>>,
	bound: RefCell<BTreeSet<String>>,
	traps: RefCell<Vec<InteractiveTrap>>,
}

impl std::fmt::Debug for EventDelegate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventDelegate")
			.field("bound", &*self.bound.borrow())
			.field("traps", &self.traps.borrow().len())
			.finish()
	}
}

impl EventDelegate {
	/// Creates a delegate over the given registry.
	pub fn new(registry: Rc<ComponentRegistry>) -> Rc<Self> {
		Rc::new(Self {
			registry,
			container: RefCell::new(None),
			bound: RefCell::new(BTreeSet::new()),
			traps: RefCell::new(Vec::new()),
		})
	}

	/// Attaches the delegate to its mount container.
	pub fn attach(&self, container: &Element) {
		*self.container.borrow_mut() = Some(container.clone());
	}

	/// The attached container, if any.
	pub fn container(&self) -> Option<Element> {
		self.container.borrow().clone()
	}

	/// Ensures a listener exists for `event_type`.
	///
	/// Binding is set-idempotent: hydrating the same markup twice never
	/// yields a second listener, so a single gesture dispatches once.
	/// Returns whether the type was newly bound.
	pub fn bind(&self, event_type: &str) -> bool {
		self.bound.borrow_mut().insert(event_type.to_string())
	}

	/// Whether a listener exists for `event_type`.
	pub fn is_bound(&self, event_type: &str) -> bool {
		self.bound.borrow().contains(event_type)
	}

	/// The bound event types, sorted.
	pub fn bound_types(&self) -> Vec<String> {
		self.bound.borrow().iter().cloned().collect()
	}

	/// Parks a one-shot trap over `element`; the first dispatched event
	/// targeting the subtree removes the trap and runs `trigger` before
	/// normal dispatch continues.
	pub(crate) fn install_trap(&self, element: Element, trigger: TrapCallback) {
		self.traps.borrow_mut().push(InteractiveTrap { element, trigger });
	}

	/// Number of parked interactive traps.
	pub fn pending_traps(&self) -> usize {
		self.traps.borrow().len()
	}

	/// Routes one event.
	///
	/// Events with no bound listener, no matching `data-event` ancestor,
	/// no owning component, or no registered handler are swallowed; the
	/// missing-owner case is logged because it usually means hydration
	/// failed for that subtree.
	pub fn dispatch(&self, event: &DomEvent) {
		self.spring_traps(event);

		if !self.is_bound(event.event_type()) {
			return;
		}
		let Some(container) = self.container() else {
			return;
		};
		if !container.contains(event.target()) {
			return;
		}

		let Some(matched) = nearest_with_event(event, &container) else {
			return;
		};
		let Some(action) = Action::from_element(&matched) else {
			crate::debug_log!(
				"element with data-event=\"{}\" has no data-action; ignored",
				event.event_type()
			);
			return;
		};

		let Some(owner) = self.find_owner(&matched, &container) else {
			crate::warn_log!(
				"no component owns the subtree for action \"{}\"; event swallowed",
				action.name()
			);
			return;
		};

		let handler = {
			let inst = owner.borrow();
			inst.definition().handler(action.name())
		};
		match handler {
			Some(handler) => handler(&mut owner.borrow_mut(), &action, event),
			None => {
				crate::warn_log!(
					"component has no handler for action \"{}\"; event swallowed",
					action.name()
				);
			}
		}
	}

	/// Runs at most one interactive trap whose subtree contains the
	/// event target. Mirrors a one-shot capturing listener: it fires
	/// before delegation proper and removes itself.
	fn spring_traps(&self, event: &DomEvent) {
		let index = self
			.traps
			.borrow()
			.iter()
			.position(|trap| trap.element.contains(event.target()));
		if let Some(index) = index {
			let trap = self.traps.borrow_mut().remove(index);
			(trap.trigger)(self);
		}
	}

	/// Finds the owning component instance: the nearest ancestor-or-self
	/// of `from` carrying a hydration id with a live registry entry.
	fn find_owner(&self, from: &Element, container: &Element) -> Option<crate::component::SharedInstance> {
		let mut cursor = Some(from.clone());
		while let Some(element) = cursor {
			if let Some(id) = element.attr(ATTR_ID) {
				if let Some(instance) = self.registry.get(&id) {
					return Some(instance);
				}
			}
			if element == *container {
				return None;
			}
			cursor = element.parent();
		}
		None
	}
}

/// Walks from the target to the container looking for the nearest
/// element whose `data-event` equals the fired type.
fn nearest_with_event(event: &DomEvent, container: &Element) -> Option<Element> {
	let mut cursor = Some(event.target().clone());
	while let Some(element) = cursor {
		if element.attr(ATTR_EVENT).as_deref() == Some(event.event_type()) {
			return Some(element);
		}
		if element == *container {
			return None;
		}
		cursor = element.parent();
	}
	None
}
