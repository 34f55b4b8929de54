//! Client-side hydration runtime.
//!
//! Hydration reconnects server-rendered DOM with live component
//! instances: for every hydration record it locates the matching
//! wrapper, rebuilds the instance with props and state restored
//! verbatim, registers it, and binds the delegation listeners its
//! definition needs. A record whose element is missing degrades that
//! subtree to inert markup; it is logged and counted, and the rest of the tree
//! still hydrates.
//!
//! Strategies gate when a subtree activates: `eager` immediately,
//! `visible` when the host reports the subtree visible
//! ([`Hydrator::notify_visible`], the intersection-observer signal), and
//! `interactive` on the first gesture inside the subtree, via a one-shot
//! trap on the event delegate.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::component::{ComponentInstance, ComponentRegistry, SharedInstance};
use crate::dom::{Document, Element};
use crate::events::EventDelegate;
use crate::ssr::markers::{ATTR_CHILDREN, ATTR_ID};
use crate::ssr::{
	HydrationRecord, HydrationStrategy, INITIAL_DATA_SCRIPT_ID, InitialData, InitialDataError,
	ROOT_CONTAINER_ID,
};

/// Document-level hydration failures.
///
/// Subtree-level mismatches are not errors; they are counted in the
/// [`HydrationReport`] and hydration continues.
#[derive(Debug, Error)]
pub enum HydrationError {
	/// The `#switch-root` container is missing from the document.
	#[error("hydration root #{ROOT_CONTAINER_ID} not found")]
	RootNotFound,
	/// The initial-data script element is missing.
	#[error("initial data script not found in document")]
	MissingInitialData,
	/// The initial-data payload was unreadable.
	#[error(transparent)]
	InitialData(#[from] InitialDataError),
}

/// Counts from one hydration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationReport {
	/// Subtrees now live.
	pub hydrated: usize,
	/// Subtrees whose wrapper was missing; left inert.
	pub mismatched: usize,
	/// Subtrees parked behind a visibility or interaction gate.
	pub deferred: usize,
}

type VisibleMap = Rc<RefCell<HashMap<String, (HydrationRecord, Element)>>>;

/// The hydrator. Construct once per mount container with the injected
/// registry and delegate.
pub struct Hydrator {
	registry: Rc<ComponentRegistry>,
	delegate: Rc<EventDelegate>,
	visible: VisibleMap,
}

impl std::fmt::Debug for Hydrator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Hydrator")
			.field("pending_visible", &self.visible.borrow().len())
			.finish()
	}
}

struct HydrateCtx<'a> {
	registry: &'a Rc<ComponentRegistry>,
	delegate: &'a EventDelegate,
	visible: &'a VisibleMap,
}

impl Hydrator {
	/// Creates a hydrator over the injected registry and delegate.
	pub fn new(registry: Rc<ComponentRegistry>, delegate: Rc<EventDelegate>) -> Self {
		Self {
			registry,
			delegate,
			visible: Rc::new(RefCell::new(HashMap::new())),
		}
	}

	/// Hydrates a parsed server-rendered document: reads the
	/// initial-data payload and hydrates under `#switch-root`.
	pub fn hydrate_document(&self, document: &Document) -> Result<HydrationReport, HydrationError> {
		let root = document
			.get_element_by_id(ROOT_CONTAINER_ID)
			.ok_or(HydrationError::RootNotFound)?;
		let script = document
			.get_element_by_id(INITIAL_DATA_SCRIPT_ID)
			.ok_or(HydrationError::MissingInitialData)?;
		let data = InitialData::from_script_text(&script.text_content())?;
		Ok(self.hydrate(&data.root, &root))
	}

	/// Hydrates one record tree against a container element.
	///
	/// Safe to call again over the same markup: already-live subtrees
	/// are skipped, so listeners never double up.
	pub fn hydrate(&self, record: &HydrationRecord, container: &Element) -> HydrationReport {
		if self.delegate.container().is_none() {
			self.delegate.attach(container);
		}
		let mut report = HydrationReport::default();
		let ctx = HydrateCtx {
			registry: &self.registry,
			delegate: &self.delegate,
			visible: &self.visible,
		};
		hydrate_subtree(&ctx, record, container, &mut report);
		report
	}

	/// Activates a subtree parked behind the `visible` strategy.
	///
	/// Returns whether a pending subtree with that hydration id existed.
	pub fn notify_visible(&self, hydration_id: &str) -> bool {
		let Some((record, element)) = self.visible.borrow_mut().remove(hydration_id) else {
			return false;
		};
		let ctx = HydrateCtx {
			registry: &self.registry,
			delegate: &self.delegate,
			visible: &self.visible,
		};
		let mut report = HydrationReport::default();
		activate(&ctx, &record, &element, &mut report);
		true
	}

	/// Number of subtrees waiting on a visibility signal.
	pub fn pending_visible(&self) -> usize {
		self.visible.borrow().len()
	}
}

fn hydrate_subtree(
	ctx: &HydrateCtx<'_>,
	record: &HydrationRecord,
	container: &Element,
	report: &mut HydrationReport,
) -> Option<SharedInstance> {
	// Idempotence: a live subtree is left alone.
	if ctx.registry.contains(&record.hydration_id) {
		return ctx.registry.get(&record.hydration_id);
	}

	let Some(element) = container.find_by_attr(ATTR_ID, &record.hydration_id) else {
		crate::error_log!(
			"hydration mismatch: no element for {} ({}); subtree left inert",
			record.hydration_id,
			record.component
		);
		report.mismatched += 1;
		return None;
	};

	match record.strategy {
		HydrationStrategy::Eager => activate(ctx, record, &element, report),
		HydrationStrategy::Visible => {
			ctx.visible
				.borrow_mut()
				.insert(record.hydration_id.clone(), (record.clone(), element));
			report.deferred += 1;
			None
		}
		HydrationStrategy::Interactive => {
			let registry = Rc::clone(ctx.registry);
			let visible = Rc::clone(ctx.visible);
			let record = record.clone();
			let target = element.clone();
			ctx.delegate.install_trap(
				element,
				Box::new(move |delegate| {
					let ctx = HydrateCtx {
						registry: &registry,
						delegate,
						visible: &visible,
					};
					let mut report = HydrationReport::default();
					activate(&ctx, &record, &target, &mut report);
				}),
			);
			report.deferred += 1;
			None
		}
	}
}

/// Builds the live instance for a located wrapper and recurses into the
/// marked child container.
fn activate(
	ctx: &HydrateCtx<'_>,
	record: &HydrationRecord,
	element: &Element,
	report: &mut HydrationReport,
) -> Option<SharedInstance> {
	let Some(def) = ctx.registry.definition(&record.component) else {
		crate::error_log!(
			"hydration mismatch: no definition registered for component {}",
			record.component
		);
		report.mismatched += 1;
		return None;
	};

	for event_type in def.event_types() {
		ctx.delegate.bind(event_type);
	}

	let instance = ComponentInstance::restore(
		def,
		record.component_id.clone(),
		record.hydration_id.clone(),
		record.props.clone(),
		record.state.clone(),
	);
	let shared = instance.into_shared();
	shared.borrow_mut().mount(element);
	ctx.registry.insert(Rc::clone(&shared));
	report.hydrated += 1;

	if !record.children.is_empty() {
		let child_container = element
			.children()
			.into_iter()
			.find(|child| child.attr(ATTR_CHILDREN).is_some());
		match child_container {
			Some(container) => {
				for child_record in &record.children {
					if let Some(child) = hydrate_subtree(ctx, child_record, &container, report) {
						shared.borrow_mut().add_child(child);
					}
				}
			}
			None => {
				crate::error_log!(
					"hydration mismatch: {} has child records but no child container",
					record.hydration_id
				);
				report.mismatched += record.children.len();
			}
		}
	}

	Some(shared)
}
