//! Server-side renderer.
//!
//! Walks a component tree depth-first (pre-order, first-to-last child),
//! wraps each component's markup in a hydration-tagged container, and
//! assembles the full document shell: script tags in caller order, then
//! stylesheet links, then the `#switch-root` container, then the
//! serialized initial-data payload.
//!
//! Traversal order is the hydration contract: ids are generated fresh on
//! every render, so the client matches records to DOM purely through the
//! payload produced by the same pass.

use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use super::cache::RenderCache;
use super::markers::next_hydration_id;
use super::record::{HMR_CONFIG_VAR, HydrationRecord, InitialData, ROOT_CONTAINER_ID, SSR_FLAG_VAR};
use crate::component::{ComponentInstance, ComponentRegistry, SharedInstance};
use crate::dom::{escape_attr, escape_text};

/// Errors produced while rendering a document.
#[derive(Debug, Error)]
pub enum RenderError {
	/// The initial-data payload failed to serialize.
	#[error("initial data serialization failed: {0}")]
	Serialize(#[from] serde_json::Error),
	/// A component name had no registered definition.
	#[error("unknown component: {0}")]
	UnknownComponent(String),
}

/// Options for document rendering.
#[derive(Debug, Clone)]
pub struct SsrOptions {
	title: String,
	scripts: Vec<String>,
	styles: Vec<String>,
	lang: String,
	include_initial_data: bool,
	ssr_flag: bool,
	hmr_config: Option<Value>,
}

impl Default for SsrOptions {
	fn default() -> Self {
		Self {
			title: String::new(),
			scripts: Vec::new(),
			styles: Vec::new(),
			lang: "en".to_string(),
			include_initial_data: true,
			ssr_flag: true,
			hmr_config: None,
		}
	}
}

impl SsrOptions {
	/// Creates default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the document title.
	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = title.into();
		self
	}

	/// Appends a script URL. Scripts are embedded in the order given.
	pub fn script(mut self, src: impl Into<String>) -> Self {
		self.scripts.push(src.into());
		self
	}

	/// Appends a stylesheet URL.
	pub fn style(mut self, href: impl Into<String>) -> Self {
		self.styles.push(href.into());
		self
	}

	/// Sets the `lang` attribute on the html element.
	pub fn lang(mut self, lang: impl Into<String>) -> Self {
		self.lang = lang.into();
		self
	}

	/// Drops the initial-data script (markup-only output).
	pub fn no_initial_data(mut self) -> Self {
		self.include_initial_data = false;
		self
	}

	/// Drops the `SWITCH_SSR` flag global.
	pub fn no_ssr_flag(mut self) -> Self {
		self.ssr_flag = false;
		self
	}

	/// Embeds an HMR configuration global (already serialized).
	pub fn hmr_config(mut self, config: Value) -> Self {
		self.hmr_config = Some(config);
		self
	}
}

/// The server-side renderer.
pub struct SsrRenderer {
	registry: Rc<ComponentRegistry>,
	cache: Option<RenderCache>,
}

impl std::fmt::Debug for SsrRenderer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SsrRenderer")
			.field("cached", &self.cache.is_some())
			.finish()
	}
}

impl SsrRenderer {
	/// Creates a renderer over the given registry.
	pub fn new(registry: Rc<ComponentRegistry>) -> Self {
		Self {
			registry,
			cache: None,
		}
	}

	/// Enables document caching.
	pub fn with_cache(mut self, cache: RenderCache) -> Self {
		self.cache = Some(cache);
		self
	}

	/// The attached cache, if any.
	pub fn cache(&self) -> Option<&RenderCache> {
		self.cache.as_ref()
	}

	/// Renders a component tree to markup plus its hydration record.
	///
	/// Every wrapper gets a fresh hydration id; the record mirrors the
	/// traversal so positions and ids agree with the markup.
	pub fn render_tree(&self, root: &SharedInstance) -> (String, HydrationRecord) {
		assign_fresh_ids(root);
		let record = build_record(root);
		let html = root.borrow().wrapped_subtree_html();
		(html, record)
	}

	/// Renders a complete document.
	pub fn render_document(&self, root: &SharedInstance, options: &SsrOptions) -> Result<String, RenderError> {
		Ok(self.render_document_chunks(root, options)?.concat())
	}

	/// Renders a complete document through the cache.
	///
	/// A live entry under `cache_key` is served verbatim with no
	/// traversal. Without an attached cache this is a plain render.
	pub fn render_document_cached(
		&self,
		root: &SharedInstance,
		options: &SsrOptions,
		cache_key: &str,
	) -> Result<String, RenderError> {
		let Some(cache) = &self.cache else {
			return self.render_document(root, options);
		};
		if let Some(html) = cache.get(cache_key) {
			return Ok(html);
		}
		let html = self.render_document(root, options)?;
		cache.put(cache_key, html.clone());
		Ok(html)
	}

	/// Renders a document as transport chunks: shell head, body content,
	/// shell tail. Concatenated they are byte-identical to
	/// [`SsrRenderer::render_document`]; streaming changes delivery
	/// only, never the hydration contract.
	pub fn render_document_chunks(
		&self,
		root: &SharedInstance,
		options: &SsrOptions,
	) -> Result<Vec<String>, RenderError> {
		let (content, record) = self.render_tree(root);

		let mut head = String::with_capacity(512);
		head.push_str("<!DOCTYPE html>\n");
		head.push_str(&format!("<html lang=\"{}\">\n", escape_attr(&options.lang)));
		head.push_str("<head>\n<meta charset=\"UTF-8\">\n");
		head.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
		if !options.title.is_empty() {
			head.push_str(&format!("<title>{}</title>\n", escape_text(&options.title)));
		}
		head.push_str("</head>\n<body>\n");
		for src in &options.scripts {
			head.push_str(&format!("<script src=\"{}\"></script>\n", escape_attr(src)));
		}
		for href in &options.styles {
			head.push_str(&format!(
				"<link rel=\"stylesheet\" href=\"{}\">\n",
				escape_attr(href)
			));
		}
		head.push_str(&format!("<div id=\"{}\">", ROOT_CONTAINER_ID));

		let mut tail = String::with_capacity(256);
		tail.push_str("</div>\n");
		if options.include_initial_data {
			let data = InitialData { root: record };
			tail.push_str(&data.to_script_tag()?);
			tail.push('\n');
		}
		if let Some(config) = &options.hmr_config {
			let json = serde_json::to_string(config)?.replace("</", "<\\/");
			tail.push_str(&format!(
				r#"<script id="switch-hmr-config" type="application/json">window.{} = {};</script>"#,
				HMR_CONFIG_VAR, json
			));
			tail.push('\n');
		}
		if options.ssr_flag {
			tail.push_str(&format!("<script>window.{} = true;</script>\n", SSR_FLAG_VAR));
		}
		tail.push_str("</body>\n</html>");

		Ok(vec![head, content, tail])
	}

	/// Renders one component's own markup by definition name, the shape
	/// the HMR component endpoint serves.
	pub fn render_component(&self, name: &str, props: Value) -> Result<String, RenderError> {
		let def = self
			.registry
			.definition(name)
			.ok_or_else(|| RenderError::UnknownComponent(name.to_string()))?;
		let instance = ComponentInstance::create(def, props);
		Ok(instance.render())
	}
}

/// Pre-order fresh id assignment; ids ascend in traversal order.
fn assign_fresh_ids(instance: &SharedInstance) {
	let children: Vec<SharedInstance> = {
		let mut inst = instance.borrow_mut();
		inst.set_hydration_id(next_hydration_id());
		inst.children().to_vec()
	};
	for child in &children {
		assign_fresh_ids(child);
	}
}

fn build_record(instance: &SharedInstance) -> HydrationRecord {
	let inst = instance.borrow();
	HydrationRecord {
		hydration_id: inst.hydration_id().unwrap_or_default().to_string(),
		component: inst.definition().name().to_string(),
		component_id: inst.id().to_string(),
		props: inst.props().clone(),
		state: inst.state().cloned(),
		strategy: inst.definition().strategy(),
		children: inst.children().iter().map(build_record).collect(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::component::ComponentDef;
	use crate::dom::Document;
	use crate::ssr::markers::{ATTR_CHILDREN, ATTR_ID};
	use serde_json::json;

	fn registry_with_defs() -> Rc<ComponentRegistry> {
		let registry = ComponentRegistry::new();
		registry.register_definition(
			ComponentDef::builder("Panel")
				.render(|props, _| {
					format!("<h2>{}</h2>", props["title"].as_str().unwrap_or("?"))
				})
				.build(),
		);
		registry.register_definition(
			ComponentDef::builder("Counter")
				.initial_state(json!({ "count": 0 }))
				.render(|_, state| {
					format!(
						"<button data-event=\"click\" data-action=\"inc\">{}</button>",
						state.and_then(|s| s["count"].as_i64()).unwrap_or(0)
					)
				})
				.build(),
		);
		registry
	}

	fn sample_tree(registry: &Rc<ComponentRegistry>) -> SharedInstance {
		let panel = registry.definition("Panel").expect("def");
		let counter = registry.definition("Counter").expect("def");
		let mut root = ComponentInstance::create(panel, json!({ "title": "Stats" }));
		root.add_child(ComponentInstance::create(std::sync::Arc::clone(&counter), json!({})).into_shared());
		root.add_child(ComponentInstance::create(counter, json!({})).into_shared());
		root.into_shared()
	}

	#[test]
	fn test_render_tree_wraps_and_records() {
		let registry = registry_with_defs();
		let root = sample_tree(&registry);
		let renderer = SsrRenderer::new(Rc::clone(&registry));

		let (html, record) = renderer.render_tree(&root);

		let doc = Document::parse(&html).expect("parse");
		let wrapper = doc
			.root()
			.find_by_attr(ATTR_ID, &record.hydration_id)
			.expect("root wrapper");
		assert!(wrapper.inner_html().contains("<h2>Stats</h2>"));

		// Children live inside the marked container, in record order.
		let container = wrapper.find_all_with_attr(ATTR_CHILDREN);
		assert_eq!(container.len(), 1);
		let child_wrappers = container[0].children();
		assert_eq!(child_wrappers.len(), 2);
		for (wrapper, child_record) in child_wrappers.iter().zip(&record.children) {
			assert_eq!(wrapper.attr(ATTR_ID).as_deref(), Some(child_record.hydration_id.as_str()));
		}
	}

	#[test]
	fn test_render_tree_ids_follow_preorder() {
		let registry = registry_with_defs();
		let root = sample_tree(&registry);
		let renderer = SsrRenderer::new(Rc::clone(&registry));

		let (_, record) = renderer.render_tree(&root);

		let root_n = id_number(&record.hydration_id);
		let first = id_number(&record.children[0].hydration_id);
		let second = id_number(&record.children[1].hydration_id);
		assert!(root_n < first && first < second);
	}

	fn id_number(id: &str) -> u64 {
		id.strip_prefix("sw-").expect("prefix").parse().expect("number")
	}

	#[test]
	fn test_document_shell_ordering() {
		let registry = registry_with_defs();
		let root = sample_tree(&registry);
		let renderer = SsrRenderer::new(Rc::clone(&registry));
		let options = SsrOptions::new()
			.title("Home")
			.script("/app.js")
			.script("/vendor.js")
			.style("/main.css");

		let html = renderer.render_document(&root, &options).expect("render");

		let app = html.find("/app.js").expect("app script");
		let vendor = html.find("/vendor.js").expect("vendor script");
		let css = html.find("/main.css").expect("stylesheet");
		let root_div = html.find("<div id=\"switch-root\">").expect("root container");
		let data = html.find("switch-initial-data").expect("data script");
		assert!(app < vendor && vendor < css && css < root_div && root_div < data);
		assert!(html.contains("<title>Home</title>"));
		assert!(html.contains("window.SWITCH_SSR = true;"));
	}

	#[test]
	fn test_chunks_concatenate_to_document() {
		let registry = registry_with_defs();
		let root = sample_tree(&registry);
		let renderer = SsrRenderer::new(Rc::clone(&registry));
		let options = SsrOptions::new().title("Stream");

		let chunks = renderer.render_document_chunks(&root, &options).expect("chunks");
		assert_eq!(chunks.len(), 3);
		// Head and tail carry the shell; the middle chunk is the tree.
		assert!(chunks[0].starts_with("<!DOCTYPE html>"));
		assert!(chunks[0].ends_with("<div id=\"switch-root\">"));
		assert!(chunks[1].contains("<h2>Stats</h2>"));
		assert!(chunks[2].starts_with("</div>"));
		assert!(chunks[2].ends_with("</html>"));
		let whole = chunks.concat();
		assert!(whole.contains("switch-initial-data"));
	}

	#[test]
	fn test_cached_render_skips_traversal() {
		let registry = registry_with_defs();
		let root = sample_tree(&registry);
		let renderer = SsrRenderer::new(Rc::clone(&registry))
			.with_cache(RenderCache::with_ttl_seconds(60));
		let options = SsrOptions::new();

		let first = renderer
			.render_document_cached(&root, &options, "/stats")
			.expect("render");
		// A second render would mint fresh hydration ids; the cache hit
		// must serve the original bytes instead.
		let second = renderer
			.render_document_cached(&root, &options, "/stats")
			.expect("render");
		assert_eq!(first, second);

		renderer.cache().expect("cache").purge("/stats");
		let third = renderer
			.render_document_cached(&root, &options, "/stats")
			.expect("render");
		assert_ne!(first, third);
	}

	#[test]
	fn test_render_component_by_name() {
		let registry = registry_with_defs();
		let renderer = SsrRenderer::new(Rc::clone(&registry));

		let html = renderer
			.render_component("Panel", json!({ "title": "Solo" }))
			.expect("render");
		assert_eq!(html, "<h2>Solo</h2>");

		assert!(matches!(
			renderer.render_component("Nope", json!({})),
			Err(RenderError::UnknownComponent(_))
		));
	}

	#[test]
	fn test_hmr_config_embedded() {
		let registry = registry_with_defs();
		let root = sample_tree(&registry);
		let renderer = SsrRenderer::new(Rc::clone(&registry));
		let options = SsrOptions::new().hmr_config(json!({ "intervalMs": 2000 }));

		let html = renderer.render_document(&root, &options).expect("render");
		assert!(html.contains("window.SWITCH_HMR_CONFIG = {\"intervalMs\":2000};"));
	}
}
