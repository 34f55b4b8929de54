//! The HMR poller.
//!
//! A fixed-interval loop: POST the registered component ids, and for
//! every reported change fetch the component's fresh markup, replace its
//! DOM subtree in place, and keep the instance's in-memory state. Poll
//! and fetch failures are logged and retried on the next tick, with no
//! backoff and no attempt cap. Overlapping passes are
//! tolerated; replacement is idempotent.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use serde_json::{Value, json};

use super::transport::{ComponentFetchRequest, HMR_POLL_ENDPOINT, HmrPollRequest, HmrTransport};
use crate::component::{ComponentRegistry, SharedInstance, resolve_anchors};
use crate::ssr::markers::ATTR_CHILDREN;

/// Poller configuration. Serialized into the `SWITCH_HMR_CONFIG` global
/// by the renderer so the client picks the same settings up.
#[derive(Debug, Clone)]
pub struct HmrConfig {
	interval: Duration,
	endpoint: String,
	enabled: bool,
}

impl Default for HmrConfig {
	fn default() -> Self {
		Self {
			interval: Duration::from_secs(2),
			endpoint: HMR_POLL_ENDPOINT.to_string(),
			enabled: true,
		}
	}
}

impl HmrConfig {
	/// Creates the default configuration.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the poll interval.
	pub fn interval(mut self, interval: Duration) -> Self {
		self.interval = interval;
		self
	}

	/// Sets the poll endpoint path.
	pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = endpoint.into();
		self
	}

	/// Enables or disables polling.
	pub fn enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	/// The poll interval.
	pub fn poll_interval(&self) -> Duration {
		self.interval
	}

	/// Whether polling is on.
	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// The value embedded as the `SWITCH_HMR_CONFIG` global.
	pub fn to_global_value(&self) -> Value {
		json!({
			"intervalMs": self.interval.as_millis() as u64,
			"endpoint": self.endpoint,
			"enabled": self.enabled,
		})
	}
}

/// Where the poller currently is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerPhase {
	/// Between ticks.
	Idle,
	/// A poll request is in flight.
	Polling,
	/// A changed component is being fetched and swapped in.
	ApplyingUpdate,
}

/// The interval-driven update poller.
pub struct HmrPoller {
	registry: Rc<ComponentRegistry>,
	transport: Rc<dyn HmrTransport>,
	config: HmrConfig,
	registered: RefCell<Vec<String>>,
	hashes: RefCell<HashMap<String, String>>,
	phase: Cell<PollerPhase>,
}

impl std::fmt::Debug for HmrPoller {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HmrPoller")
			.field("registered", &self.registered.borrow().len())
			.field("phase", &self.phase.get())
			.finish()
	}
}

impl HmrPoller {
	/// Creates a poller over the injected registry and transport.
	pub fn new(registry: Rc<ComponentRegistry>, transport: Rc<dyn HmrTransport>, config: HmrConfig) -> Self {
		Self {
			registry,
			transport,
			config,
			registered: RefCell::new(Vec::new()),
			hashes: RefCell::new(HashMap::new()),
			phase: Cell::new(PollerPhase::Idle),
		}
	}

	/// Registers a component id for hot replacement.
	pub fn register(&self, component_id: impl Into<String>) {
		let id = component_id.into();
		let mut registered = self.registered.borrow_mut();
		if !registered.contains(&id) {
			registered.push(id);
		}
	}

	/// The registered component ids.
	pub fn registered(&self) -> Vec<String> {
		self.registered.borrow().clone()
	}

	/// The poller's current phase.
	pub fn phase(&self) -> PollerPhase {
		self.phase.get()
	}

	/// Runs one poll-and-apply pass; returns how many components were
	/// replaced.
	pub async fn tick(&self) -> usize {
		if !self.config.enabled {
			return 0;
		}
		let ids = self.registered.borrow().clone();
		if ids.is_empty() {
			return 0;
		}

		self.phase.set(PollerPhase::Polling);
		let response = match self.transport.poll(HmrPollRequest { component_ids: ids }).await {
			Ok(response) => response,
			Err(err) => {
				crate::warn_log!("hmr poll failed: {}; retrying next tick", err);
				self.phase.set(PollerPhase::Idle);
				return 0;
			}
		};

		let mut applied = 0;
		for update in response.updates {
			let already_applied = self
				.hashes
				.borrow()
				.get(&update.id)
				.is_some_and(|hash| *hash == update.hash);
			if already_applied {
				continue;
			}
			let Some(instance) = self.registry.get_by_component(&update.id) else {
				crate::warn_log!("hmr update for unknown component {}; skipped", update.id);
				continue;
			};

			self.phase.set(PollerPhase::ApplyingUpdate);
			let props = instance.borrow().props().clone();
			let request = ComponentFetchRequest {
				component_id: update.id.clone(),
				props,
			};
			match self.transport.fetch_component(request).await {
				Ok(response) => {
					if apply_update(&instance, &response.html) {
						self.hashes.borrow_mut().insert(update.id, update.hash);
						applied += 1;
					}
				}
				Err(err) => {
					crate::warn_log!(
						"hmr fetch for {} failed: {}; retrying next tick",
						update.id,
						err
					);
				}
			}
		}

		self.phase.set(PollerPhase::Idle);
		applied
	}

	/// Drives [`HmrPoller::tick`] on the configured interval, forever.
	pub async fn run(&self) {
		if !self.config.enabled {
			return;
		}
		let mut interval = tokio::time::interval(self.config.interval);
		interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
		loop {
			interval.tick().await;
			self.tick().await;
		}
	}
}

/// Swaps a component's markup in place, keeping its in-memory state and
/// child instances. Returns `false` when the instance has no live
/// anchor (nothing to replace).
fn apply_update(instance: &SharedInstance, html: &str) -> bool {
	let (anchor, children) = {
		let inst = instance.borrow();
		let Some(anchor) = inst.anchor() else {
			crate::warn_log!(
				"hmr update for {} dropped: instance is not mounted",
				inst.id()
			);
			return false;
		};
		(anchor, inst.children().to_vec())
	};

	let mut markup = html.to_string();
	if !children.is_empty() {
		markup.push_str(&format!("<div {}=\"\">", ATTR_CHILDREN));
		for child in &children {
			markup.push_str(&child.borrow().wrapped_subtree_html());
		}
		markup.push_str("</div>");
	}

	if let Err(err) = anchor.set_inner_html(&markup) {
		crate::error_log!("hmr update produced unparsable markup: {}", err);
		return false;
	}
	for child in &children {
		resolve_anchors(child, &anchor);
	}
	true
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::component::{ComponentDef, ComponentInstance};
	use crate::dom::Element;
	use crate::hmr::transport::{ComponentFetchResponse, HmrError, HmrPollResponse, HmrUpdate};
	use crate::ssr::markers::{ATTR_ID, next_hydration_id};
	use futures::FutureExt;
	use futures::executor::block_on;
	use futures::future::LocalBoxFuture;
	use serde_json::json;
	use std::collections::VecDeque;
	use std::sync::Arc;

	#[derive(Default)]
	struct FakeTransport {
		poll_responses: RefCell<VecDeque<Result<HmrPollResponse, HmrError>>>,
		html: RefCell<HashMap<String, String>>,
		polls: Cell<u32>,
		fetches: Cell<u32>,
	}

	impl HmrTransport for FakeTransport {
		fn poll(&self, _request: HmrPollRequest) -> LocalBoxFuture<'_, Result<HmrPollResponse, HmrError>> {
			self.polls.set(self.polls.get() + 1);
			let next = self
				.poll_responses
				.borrow_mut()
				.pop_front()
				.unwrap_or_else(|| Ok(HmrPollResponse::default()));
			futures::future::ready(next).boxed_local()
		}

		fn fetch_component(
			&self,
			request: ComponentFetchRequest,
		) -> LocalBoxFuture<'_, Result<ComponentFetchResponse, HmrError>> {
			self.fetches.set(self.fetches.get() + 1);
			let html = self
				.html
				.borrow()
				.get(&request.component_id)
				.cloned()
				.unwrap_or_default();
			futures::future::ready(Ok(ComponentFetchResponse { html })).boxed_local()
		}
	}

	struct Fixture {
		poller: HmrPoller,
		transport: Rc<FakeTransport>,
		instance: SharedInstance,
		anchor: Element,
		component_id: String,
	}

	fn fixture() -> Fixture {
		let registry = ComponentRegistry::new();
		let def = ComponentDef::builder("Widget")
			.initial_state(json!({ "note": "kept" }))
			.render(|_, _| "<p>v1</p>".to_string())
			.build();
		registry.register_definition(Arc::clone(&def));

		let mut instance = ComponentInstance::create(def, json!({}));
		instance.set_hydration_id(next_hydration_id());
		let component_id = instance.id().to_string();

		let anchor = Element::new("div");
		anchor.set_attr(ATTR_ID, instance.hydration_id().expect("id"));
		anchor.set_inner_html(&instance.inner_subtree_html()).expect("parse");
		instance.mount(&anchor);

		let instance = instance.into_shared();
		registry.insert(Rc::clone(&instance));

		let transport = Rc::new(FakeTransport::default());
		let poller = HmrPoller::new(
			registry,
			Rc::clone(&transport) as Rc<dyn HmrTransport>,
			HmrConfig::new(),
		);
		poller.register(component_id.clone());

		Fixture {
			poller,
			transport,
			instance,
			anchor,
			component_id,
		}
	}

	#[test]
	fn test_tick_without_registrations_skips_poll() {
		let registry = ComponentRegistry::new();
		let transport = Rc::new(FakeTransport::default());
		let poller = HmrPoller::new(
			registry,
			Rc::clone(&transport) as Rc<dyn HmrTransport>,
			HmrConfig::new(),
		);

		assert_eq!(block_on(poller.tick()), 0);
		assert_eq!(transport.polls.get(), 0);
		assert_eq!(poller.phase(), PollerPhase::Idle);
	}

	#[test]
	fn test_tick_applies_update_and_keeps_state() {
		let fx = fixture();
		fx.transport.html.borrow_mut().insert(fx.component_id.clone(), "<p>v2</p>".to_string());
		fx.transport.poll_responses.borrow_mut().push_back(Ok(HmrPollResponse {
			updates: vec![HmrUpdate {
				id: fx.component_id.clone(),
				hash: "h1".to_string(),
			}],
		}));

		assert_eq!(block_on(fx.poller.tick()), 1);

		assert!(fx.anchor.inner_html().contains("<p>v2</p>"));
		assert_eq!(fx.instance.borrow().state(), Some(&json!({ "note": "kept" })));
		assert_eq!(fx.poller.phase(), PollerPhase::Idle);
	}

	#[test]
	fn test_same_hash_not_reapplied() {
		let fx = fixture();
		fx.transport.html.borrow_mut().insert(fx.component_id.clone(), "<p>v2</p>".to_string());
		let update = HmrUpdate {
			id: fx.component_id.clone(),
			hash: "h1".to_string(),
		};
		fx.transport.poll_responses.borrow_mut().push_back(Ok(HmrPollResponse {
			updates: vec![update.clone()],
		}));
		fx.transport.poll_responses.borrow_mut().push_back(Ok(HmrPollResponse {
			updates: vec![update],
		}));

		assert_eq!(block_on(fx.poller.tick()), 1);
		assert_eq!(block_on(fx.poller.tick()), 0);
		assert_eq!(fx.transport.fetches.get(), 1);
	}

	#[test]
	fn test_poll_failure_is_retried_next_tick() {
		let fx = fixture();
		fx.transport.html.borrow_mut().insert(fx.component_id.clone(), "<p>v2</p>".to_string());
		fx.transport
			.poll_responses
			.borrow_mut()
			.push_back(Err(HmrError::Transport("connection refused".to_string())));
		fx.transport.poll_responses.borrow_mut().push_back(Ok(HmrPollResponse {
			updates: vec![HmrUpdate {
				id: fx.component_id.clone(),
				hash: "h1".to_string(),
			}],
		}));

		assert_eq!(block_on(fx.poller.tick()), 0);
		assert_eq!(fx.poller.phase(), PollerPhase::Idle);
		assert_eq!(block_on(fx.poller.tick()), 1);
	}

	#[test]
	fn test_unmounted_instance_not_counted() {
		let fx = fixture();
		fx.instance.borrow_mut().unmount();
		fx.transport.poll_responses.borrow_mut().push_back(Ok(HmrPollResponse {
			updates: vec![HmrUpdate {
				id: fx.component_id.clone(),
				hash: "h1".to_string(),
			}],
		}));

		assert_eq!(block_on(fx.poller.tick()), 0);
	}

	#[test]
	fn test_disabled_config_never_polls() {
		let registry = ComponentRegistry::new();
		let transport = Rc::new(FakeTransport::default());
		let poller = HmrPoller::new(
			registry,
			Rc::clone(&transport) as Rc<dyn HmrTransport>,
			HmrConfig::new().enabled(false),
		);
		poller.register("c-1");

		assert_eq!(block_on(poller.tick()), 0);
		assert_eq!(transport.polls.get(), 0);
	}

	#[tokio::test]
	async fn test_run_returns_immediately_when_disabled() {
		let registry = ComponentRegistry::new();
		let transport = Rc::new(FakeTransport::default());
		let poller = HmrPoller::new(
			Rc::clone(&registry),
			Rc::clone(&transport) as Rc<dyn HmrTransport>,
			HmrConfig::new().enabled(false),
		);
		poller.run().await;
		assert_eq!(transport.polls.get(), 0);
	}

	#[test]
	fn test_config_global_value() {
		let config = HmrConfig::new().interval(Duration::from_millis(1500));
		let value = config.to_global_value();
		assert_eq!(value["intervalMs"], json!(1500));
		assert_eq!(value["enabled"], json!(true));
		assert_eq!(value["endpoint"], json!("/api/switch/hmr"));
	}

	#[test]
	fn test_register_dedupes() {
		let registry = ComponentRegistry::new();
		let transport = Rc::new(FakeTransport::default());
		let poller = HmrPoller::new(
			registry,
			transport as Rc<dyn HmrTransport>,
			HmrConfig::new(),
		);
		poller.register("c-1");
		poller.register("c-1");
		poller.register("c-2");
		assert_eq!(poller.registered(), vec!["c-1", "c-2"]);
	}
}
