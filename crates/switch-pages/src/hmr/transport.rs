//! HMR wire types.
//!
//! The poller consumes two server endpoints; it never defines them. A
//! [`HmrTransport`] implementation carries the requests: over HTTP in a
//! real client, in memory in tests.

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Endpoint polled with the registered component ids.
pub const HMR_POLL_ENDPOINT: &str = "/api/switch/hmr";

/// Endpoint serving a fresh render of one component.
pub const HMR_COMPONENT_ENDPOINT: &str = "/api/switch/component";

/// Errors surfaced by a transport.
#[derive(Debug, Error)]
pub enum HmrError {
	/// The request could not be carried or the server answered badly.
	#[error("hmr transport error: {0}")]
	Transport(String),
	/// A response body failed to decode.
	#[error("hmr payload unreadable: {0}")]
	Payload(#[from] serde_json::Error),
}

/// Body POSTed to [`HMR_POLL_ENDPOINT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HmrPollRequest {
	/// Ids of the components registered for hot replacement.
	pub component_ids: Vec<String>,
}

/// One changed component in a poll response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmrUpdate {
	/// The component id.
	pub id: String,
	/// Content hash of the component's current source.
	pub hash: String,
}

/// Body answered from [`HMR_POLL_ENDPOINT`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmrPollResponse {
	/// Components whose source changed since the last poll.
	pub updates: Vec<HmrUpdate>,
}

/// Body POSTed to [`HMR_COMPONENT_ENDPOINT`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFetchRequest {
	/// The component to re-render.
	pub component_id: String,
	/// The props the live instance currently holds.
	pub props: Value,
}

/// Body answered from [`HMR_COMPONENT_ENDPOINT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentFetchResponse {
	/// The component's fresh markup.
	pub html: String,
}

/// Carries HMR requests to the dev server.
pub trait HmrTransport {
	/// Asks which of the given components changed.
	fn poll(&self, request: HmrPollRequest) -> LocalBoxFuture<'_, Result<HmrPollResponse, HmrError>>;

	/// Fetches a fresh render of one component.
	fn fetch_component(
		&self,
		request: ComponentFetchRequest,
	) -> LocalBoxFuture<'_, Result<ComponentFetchResponse, HmrError>>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_poll_request_wire_shape() {
		let request = HmrPollRequest {
			component_ids: vec!["c-1".to_string(), "c-2".to_string()],
		};
		let json = serde_json::to_value(&request).expect("serialize");
		assert_eq!(json, json!({ "componentIds": ["c-1", "c-2"] }));
	}

	#[test]
	fn test_fetch_request_wire_shape() {
		let request = ComponentFetchRequest {
			component_id: "c-1".to_string(),
			props: json!({ "label": "x" }),
		};
		let json = serde_json::to_value(&request).expect("serialize");
		assert_eq!(
			json,
			json!({ "componentId": "c-1", "props": { "label": "x" } })
		);
	}

	#[test]
	fn test_poll_response_parses() {
		let response: HmrPollResponse =
			serde_json::from_str(r#"{"updates":[{"id":"c-1","hash":"abc"}]}"#).expect("parse");
		assert_eq!(response.updates.len(), 1);
		assert_eq!(response.updates[0].hash, "abc");
	}
}
