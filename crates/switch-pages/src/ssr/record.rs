//! Hydration records and the serialized initial-data payload.
//!
//! The renderer describes the whole component tree (ids, props, state,
//! child order) in one JSON blob embedded in the document. The client
//! consumes it exactly once: after hydration the live instances are the
//! source of truth and the records are discarded.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::markers::HydrationStrategy;

/// Global holding the serialized component tree.
pub const INITIAL_DATA_VAR: &str = "SWITCH_INITIAL_DATA";

/// Global holding the HMR configuration, when HMR is enabled.
pub const HMR_CONFIG_VAR: &str = "SWITCH_HMR_CONFIG";

/// Global flagging that the document was server-rendered.
pub const SSR_FLAG_VAR: &str = "SWITCH_SSR";

/// DOM id of the script element carrying the initial data.
pub const INITIAL_DATA_SCRIPT_ID: &str = "switch-initial-data";

/// DOM id of the mount container the renderer emits.
pub const ROOT_CONTAINER_ID: &str = "switch-root";

/// Errors while reading an initial-data payload back.
#[derive(Debug, Error)]
pub enum InitialDataError {
	/// The script text did not have the `window.X = ...;` shape.
	#[error("initial data script has unexpected shape")]
	UnexpectedShape,
	/// The JSON payload failed to parse.
	#[error("initial data payload unparsable: {0}")]
	Parse(#[from] serde_json::Error),
}

/// One component's slice of the serialized tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrationRecord {
	/// Matches the `data-sw-id` of the wrapper emitted for this
	/// component.
	pub hydration_id: String,
	/// The component definition name.
	pub component: String,
	/// The server-side instance id.
	pub component_id: String,
	/// Merged props, verbatim.
	pub props: Value,
	/// State at render time, verbatim.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<Value>,
	/// When this subtree hydrates.
	#[serde(default)]
	pub strategy: HydrationStrategy,
	/// Child records, in render order.
	#[serde(default)]
	pub children: Vec<HydrationRecord>,
}

/// The whole payload: the root component's record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialData {
	/// The root of the rendered tree.
	pub root: HydrationRecord,
}

impl InitialData {
	/// Serializes into the embedded script tag.
	///
	/// `</` is escaped as `<\/` so payload strings can never close the
	/// script element; the sequence is a legal JSON escape and parses
	/// back to the same text.
	pub fn to_script_tag(&self) -> Result<String, serde_json::Error> {
		let json = serde_json::to_string(self)?;
		let safe = json.replace("</", "<\\/");
		Ok(format!(
			r#"<script id="{}" type="application/json">window.{} = {};</script>"#,
			INITIAL_DATA_SCRIPT_ID, INITIAL_DATA_VAR, safe
		))
	}

	/// Parses the text content of the initial-data script element.
	pub fn from_script_text(text: &str) -> Result<Self, InitialDataError> {
		let text = text.trim();
		let prefix = format!("window.{} = ", INITIAL_DATA_VAR);
		let json = text
			.strip_prefix(&prefix)
			.and_then(|rest| rest.strip_suffix(';'))
			.ok_or(InitialDataError::UnexpectedShape)?;
		Ok(serde_json::from_str(json)?)
	}
}
