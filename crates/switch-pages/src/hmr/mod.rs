//! Hot module replacement: wire types and the interval poller.

mod poller;
mod transport;

pub use poller::{HmrConfig, HmrPoller, PollerPhase};
pub use transport::{
	ComponentFetchRequest, ComponentFetchResponse, HMR_COMPONENT_ENDPOINT, HMR_POLL_ENDPOINT,
	HmrError, HmrPollRequest, HmrPollResponse, HmrTransport, HmrUpdate,
};
