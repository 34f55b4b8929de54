//! Typed actions parsed from element attributes.
//!
//! Elements declare behavior with `data-event` (which DOM event type
//! triggers them) and `data-action` (which handler runs), plus arbitrary
//! `data-*` parameters. The delegation layer parses those attributes
//! once per dispatch into an [`Action`] so handlers work with a typed
//! value instead of re-reading the DOM.

use std::collections::HashMap;

use crate::dom::Element;
use crate::ssr::markers::{ATTR_ACTION, ATTR_EVENT};

/// A parsed element action: the handler name plus its `data-*`
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
	name: String,
	params: HashMap<String, String>,
}

impl Action {
	/// Builds an action directly (mainly for tests and programmatic
	/// dispatch).
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			params: HashMap::new(),
		}
	}

	/// Adds a parameter.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(key.into(), value.into());
		self
	}

	/// Parses the action declared on `element`.
	///
	/// Returns `None` when the element carries no `data-action`. Every
	/// other `data-*` attribute becomes a parameter keyed without its
	/// `data-` prefix; the framework's own markers (`data-event`,
	/// `data-sw-*`) are excluded.
	pub fn from_element(element: &Element) -> Option<Self> {
		let name = element.attr(ATTR_ACTION)?;
		let mut params = HashMap::new();
		for (attr, value) in element.attributes() {
			if attr == ATTR_ACTION || attr == ATTR_EVENT {
				continue;
			}
			if let Some(key) = attr.strip_prefix("data-") {
				if key.starts_with("sw-") {
					continue;
				}
				params.insert(key.to_string(), value);
			}
		}
		Some(Self { name, params })
	}

	/// The action name (the `data-action` value).
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Reads a parameter by key (without the `data-` prefix).
	pub fn get(&self, key: &str) -> Option<&str> {
		self.params.get(key).map(String::as_str)
	}

	/// All parameters.
	pub fn params(&self) -> &HashMap<String, String> {
		&self.params
	}
}
