//! DOM event values passed through the delegation layer.

use std::cell::Cell;

use super::Element;

/// A dispatched DOM event.
///
/// Carries the event type and the target element it was fired on.
/// Handlers receive the event by reference and may record
/// `prevent_default` / `stop_propagation`; dispatch itself is
/// single-owner (nearest match only), so the flags exist for the
/// handler's host environment, not for re-routing.
#[derive(Debug)]
pub struct DomEvent {
	event_type: String,
	target: Element,
	default_prevented: Cell<bool>,
	propagation_stopped: Cell<bool>,
}

impl DomEvent {
	/// Creates an event of `event_type` targeted at `target`.
	pub fn new(event_type: impl Into<String>, target: Element) -> Self {
		Self {
			event_type: event_type.into(),
			target,
			default_prevented: Cell::new(false),
			propagation_stopped: Cell::new(false),
		}
	}

	/// The event type, e.g. `"click"`.
	pub fn event_type(&self) -> &str {
		&self.event_type
	}

	/// The element the event fired on.
	pub fn target(&self) -> &Element {
		&self.target
	}

	/// Marks the default action suppressed.
	pub fn prevent_default(&self) {
		self.default_prevented.set(true);
	}

	/// Whether a handler called [`DomEvent::prevent_default`].
	pub fn default_prevented(&self) -> bool {
		self.default_prevented.get()
	}

	/// Marks propagation stopped.
	pub fn stop_propagation(&self) {
		self.propagation_stopped.set(true);
	}

	/// Whether a handler called [`DomEvent::stop_propagation`].
	pub fn propagation_stopped(&self) -> bool {
		self.propagation_stopped.get()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_event_flags() {
		let event = DomEvent::new("click", Element::new("button"));
		assert_eq!(event.event_type(), "click");
		assert!(!event.default_prevented());
		event.prevent_default();
		event.stop_propagation();
		assert!(event.default_prevented());
		assert!(event.propagation_stopped());
	}
}
