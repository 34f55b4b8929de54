//! Hydration markers embedded in rendered markup.
//!
//! The renderer tags every component wrapper with these attributes; the
//! hydrator and the event delegation layer read them back to reconnect
//! live instances with server-produced DOM.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Attribute carrying a component wrapper's hydration id.
pub const ATTR_ID: &str = "data-sw-id";

/// Attribute carrying the component definition name.
pub const ATTR_COMPONENT: &str = "data-sw-component";

/// Attribute carrying the wrapper's hydration strategy.
pub const ATTR_STRATEGY: &str = "data-sw-strategy";

/// Attribute marking a wrapper's child-component container.
pub const ATTR_CHILDREN: &str = "data-sw-children";

/// Attribute naming the delegated DOM event type an element listens for.
pub const ATTR_EVENT: &str = "data-event";

/// Attribute naming the action an element triggers.
pub const ATTR_ACTION: &str = "data-action";

static HYDRATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh hydration id (`sw-{n}`).
///
/// Ids are unique within a process, not across requests; hydration
/// correlates them through the initial-data payload produced by the same
/// render pass.
pub fn next_hydration_id() -> String {
	let id = HYDRATION_COUNTER.fetch_add(1, Ordering::SeqCst);
	format!("sw-{}", id)
}

/// When a component subtree becomes interactive on the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HydrationStrategy {
	/// Hydrate as soon as the record is processed.
	#[default]
	Eager,
	/// Hydrate when the subtree is reported visible.
	Visible,
	/// Hydrate on the first user gesture inside the subtree.
	Interactive,
}

impl HydrationStrategy {
	/// The attribute value for this strategy.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Eager => "eager",
			Self::Visible => "visible",
			Self::Interactive => "interactive",
		}
	}

	/// Parses an attribute value. Unknown values read as `None`.
	pub fn from_attr(value: &str) -> Option<Self> {
		match value {
			"eager" => Some(Self::Eager),
			"visible" => Some(Self::Visible),
			"interactive" => Some(Self::Interactive),
			_ => None,
		}
	}
}

impl fmt::Display for HydrationStrategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
