//! End-to-end exercises of the render → hydrate → dispatch pipeline,
//! wired through the store the way an application would be.

use std::rc::Rc;

use serde_json::json;
use switch::pages::ssr::markers::{ATTR_COMPONENT, ATTR_ID};
use switch::{
	ComponentDef, ComponentInstance, ComponentRegistry, Document, DomEvent, EventDelegate,
	Hydrator, SsrOptions, SsrRenderer, Store,
};

fn app_def() -> std::sync::Arc<ComponentDef> {
	ComponentDef::builder("App")
		.default_props(json!({ "title": "Demo" }))
		.render(|props, _| format!("<header>{}</header>", props["title"].as_str().unwrap_or("")))
		.build()
}

fn display_def() -> std::sync::Arc<ComponentDef> {
	ComponentDef::builder("CounterDisplay")
		.initial_state(json!({ "count": 0 }))
		.render(|_, state| {
			format!(
				"<output>{}</output>",
				state.and_then(|s| s["count"].as_i64()).unwrap_or(0)
			)
		})
		.build()
}

fn button_def(store: &Rc<Store>) -> std::sync::Arc<ComponentDef> {
	let store = Rc::clone(store);
	ComponentDef::builder("IncrementButton")
		.render(|_, _| {
			"<button data-event=\"click\" data-action=\"increment\">+1</button>".to_string()
		})
		.on("click", "increment", move |_instance, _action, _event| {
			store.commit("INCREMENT", serde_json::Value::Null);
		})
		.build()
}

fn counter_store() -> Rc<Store> {
	Store::builder()
		.state(json!({ "count": 0 }))
		.mutation("INCREMENT", |state, _| {
			state["count"] = json!(state["count"].as_i64().unwrap_or(0) + 1);
		})
		.build()
}

/// Store mutation → subscriber → component update → DOM replace, all
/// riding on markup that went through an actual server render.
#[test]
fn test_store_driven_update_after_hydration() {
	let store = counter_store();

	// Server side.
	let server_registry = ComponentRegistry::new();
	server_registry.register_definition(app_def());
	server_registry.register_definition(display_def());
	server_registry.register_definition(button_def(&store));

	let app = server_registry.definition("App").expect("def");
	let display = server_registry.definition("CounterDisplay").expect("def");
	let button = server_registry.definition("IncrementButton").expect("def");
	let mut root = ComponentInstance::create(app, json!({}));
	root.add_child(ComponentInstance::create(display, json!({})).into_shared());
	root.add_child(ComponentInstance::create(button, json!({})).into_shared());
	let root = root.into_shared();

	let renderer = SsrRenderer::new(Rc::clone(&server_registry));
	let html = renderer
		.render_document(&root, &SsrOptions::new().title("Counter"))
		.expect("render");

	// Client side: fresh registry, same definitions.
	let registry = ComponentRegistry::new();
	registry.register_definition(app_def());
	registry.register_definition(display_def());
	registry.register_definition(button_def(&store));

	let document = Document::parse(&html).expect("parse");
	let delegate = EventDelegate::new(Rc::clone(&registry));
	let hydrator = Hydrator::new(Rc::clone(&registry), Rc::clone(&delegate));
	let report = hydrator.hydrate_document(&document).expect("hydrate");
	assert_eq!(report.hydrated, 3);

	// Wire the store to the display component.
	let display_wrapper = document
		.root()
		.find_by_attr(ATTR_COMPONENT, "CounterDisplay")
		.expect("display wrapper");
	let display_instance = registry
		.get(&display_wrapper.attr(ATTR_ID).expect("id"))
		.expect("display instance");
	{
		let display_instance = Rc::clone(&display_instance);
		store.subscribe(move |_, new_state, _| {
			display_instance
				.borrow_mut()
				.update(json!({ "count": new_state["count"].clone() }));
		});
	}

	// A click on the button commits, the subscriber re-renders.
	let button_el = document
		.root()
		.find_by_attr("data-action", "increment")
		.expect("button");
	delegate.dispatch(&DomEvent::new("click", button_el.clone()));
	delegate.dispatch(&DomEvent::new("click", button_el));

	assert_eq!(store.state()["count"], json!(2));
	assert!(display_wrapper.inner_html().contains("<output>2</output>"));
}

/// Hydrated instances carry props and state byte-for-byte equal to what
/// the server rendered from.
#[test]
fn test_round_trip_preserves_props_and_state() {
	let store = counter_store();

	let server_registry = ComponentRegistry::new();
	server_registry.register_definition(app_def());
	server_registry.register_definition(display_def());
	server_registry.register_definition(button_def(&store));

	let app = server_registry.definition("App").expect("def");
	let display = server_registry.definition("CounterDisplay").expect("def");
	let mut root = ComponentInstance::create(app, json!({ "title": "Stats", "nav": ["a", "b"] }));
	root.add_child(
		ComponentInstance::create(display, json!({ "unit": "ms" })).into_shared(),
	);
	let root = root.into_shared();
	// State diverges from the definition's initial state before render.
	root.borrow().children()[0]
		.borrow_mut()
		.update(json!({ "count": 41 }));

	let renderer = SsrRenderer::new(Rc::clone(&server_registry));
	let html = renderer
		.render_document(&root, &SsrOptions::new())
		.expect("render");

	let registry = ComponentRegistry::new();
	registry.register_definition(app_def());
	registry.register_definition(display_def());
	let document = Document::parse(&html).expect("parse");
	let delegate = EventDelegate::new(Rc::clone(&registry));
	let hydrator = Hydrator::new(Rc::clone(&registry), delegate);
	hydrator.hydrate_document(&document).expect("hydrate");

	let app_wrapper = document
		.root()
		.find_by_attr(ATTR_COMPONENT, "App")
		.expect("app wrapper");
	let hydrated_root = registry
		.get(&app_wrapper.attr(ATTR_ID).expect("id"))
		.expect("instance");

	assert_eq!(hydrated_root.borrow().props(), root.borrow().props());
	let hydrated_child = Rc::clone(&hydrated_root.borrow().children()[0]);
	let original_child = Rc::clone(&root.borrow().children()[0]);
	assert_eq!(hydrated_child.borrow().props(), original_child.borrow().props());
	assert_eq!(
		hydrated_child.borrow().state(),
		Some(&json!({ "count": 41 }))
	);
}

/// The persistence plugin mirrors committed state and restores it into
/// a fresh store.
#[test]
fn test_persisted_state_survives_restart() {
	use switch::persistence::{self, MemoryStorage, PersistenceOptions};

	let storage = Rc::new(MemoryStorage::new());
	let options = PersistenceOptions::new("switch:app");

	let store = counter_store();
	persistence::attach(&store, Rc::clone(&storage) as Rc<dyn persistence::StateStorage>, options.clone());
	store.commit("INCREMENT", serde_json::Value::Null);
	store.commit("INCREMENT", serde_json::Value::Null);

	let revived = counter_store();
	let restored = persistence::restore(
		&revived,
		storage.as_ref(),
		&PersistenceOptions::new("switch:app"),
	);
	assert!(restored);
	assert_eq!(revived.state()["count"], json!(2));
}
