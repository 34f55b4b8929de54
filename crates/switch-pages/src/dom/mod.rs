//! In-memory DOM abstraction.
//!
//! The renderer produces HTML strings; the hydrator, event delegation
//! layer, and HMR apply step all need to walk and mutate the resulting
//! tree. This module provides that tree: a reference-counted element
//! graph parsed from the framework's own rendered markup, with the small
//! set of operations the runtime relies on (attribute lookup, subtree
//! search, ancestor walking, inner-HTML replacement).
//!
//! Elements are cheap handles (`Rc` inside); [`WeakElement`] is the
//! non-owning form used for component anchors so a dropped subtree is
//! collected even while an instance still points at it.

mod event;
mod parser;

pub use event::DomEvent;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use thiserror::Error;

/// Errors produced while parsing markup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomError {
	/// Input ended in the middle of a tag or raw-text section.
	#[error("unexpected end of input at offset {0}")]
	UnexpectedEof(usize),
	/// A closing tag did not match the open element.
	#[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
	MismatchedClosingTag {
		/// Tag that was open.
		expected: String,
		/// Tag the closing marker named.
		found: String,
	},
	/// A closing tag appeared with nothing open.
	#[error("closing tag </{0}> with no open element")]
	UnexpectedClosingTag(String),
	/// A tag could not be tokenized.
	#[error("malformed tag at offset {0}")]
	MalformedTag(usize),
}

/// Elements whose content model is nothing (no closing tag emitted).
const VOID_TAGS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
	"track", "wbr",
];

/// Elements whose text content is raw (no entity escaping either way).
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

pub(crate) fn is_void_tag(tag: &str) -> bool {
	VOID_TAGS.contains(&tag)
}

pub(crate) fn is_raw_text_tag(tag: &str) -> bool {
	RAW_TEXT_TAGS.contains(&tag)
}

struct ElementData {
	tag: String,
	attributes: RefCell<Vec<(String, String)>>,
	children: RefCell<Vec<Node>>,
	parent: RefCell<Weak<ElementData>>,
}

/// A node in the tree: an element or a run of text.
#[derive(Clone, Debug)]
pub enum Node {
	/// An element node.
	Element(Element),
	/// A text node. Raw (unescaped) content.
	Text(String),
}

/// A handle to an element. Clones are cheap and refer to the same node.
#[derive(Clone)]
pub struct Element {
	data: Rc<ElementData>,
}

impl PartialEq for Element {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.data, &other.data)
	}
}

impl Eq for Element {}

impl std::fmt::Debug for Element {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Element")
			.field("tag", &self.data.tag)
			.field("attributes", &*self.data.attributes.borrow())
			.field("children", &self.data.children.borrow().len())
			.finish()
	}
}

impl Element {
	/// Creates a detached element.
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			data: Rc::new(ElementData {
				tag: tag.into(),
				attributes: RefCell::new(Vec::new()),
				children: RefCell::new(Vec::new()),
				parent: RefCell::new(Weak::new()),
			}),
		}
	}

	/// The element's tag name.
	pub fn tag_name(&self) -> String {
		self.data.tag.clone()
	}

	/// Reads an attribute value.
	pub fn attr(&self, name: &str) -> Option<String> {
		self.data
			.attributes
			.borrow()
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v.clone())
	}

	/// Sets an attribute, replacing any existing value.
	pub fn set_attr(&self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();
		let mut attributes = self.data.attributes.borrow_mut();
		match attributes.iter_mut().find(|(n, _)| *n == name) {
			Some(slot) => slot.1 = value,
			None => attributes.push((name, value)),
		}
	}

	/// All attributes in document order.
	pub fn attributes(&self) -> Vec<(String, String)> {
		self.data.attributes.borrow().clone()
	}

	/// Appends a child node, reparenting element children to `self`.
	pub fn append_child(&self, node: Node) {
		if let Node::Element(child) = &node {
			*child.data.parent.borrow_mut() = Rc::downgrade(&self.data);
		}
		self.data.children.borrow_mut().push(node);
	}

	/// Element children, in order (text nodes skipped).
	pub fn children(&self) -> Vec<Element> {
		self.data
			.children
			.borrow()
			.iter()
			.filter_map(|node| match node {
				Node::Element(el) => Some(el.clone()),
				Node::Text(_) => None,
			})
			.collect()
	}

	/// All child nodes, in order.
	pub fn child_nodes(&self) -> Vec<Node> {
		self.data.children.borrow().clone()
	}

	/// The parent element, if attached.
	pub fn parent(&self) -> Option<Element> {
		self.data.parent.borrow().upgrade().map(|data| Element { data })
	}

	/// Whether `other` is `self` or a descendant of `self`.
	pub fn contains(&self, other: &Element) -> bool {
		let mut cursor = Some(other.clone());
		while let Some(current) = cursor {
			if current == *self {
				return true;
			}
			cursor = current.parent();
		}
		false
	}

	/// Depth-first search (self included) for the first element whose
	/// attribute `name` equals `value`.
	pub fn find_by_attr(&self, name: &str, value: &str) -> Option<Element> {
		if self.attr(name).as_deref() == Some(value) {
			return Some(self.clone());
		}
		for child in self.children() {
			if let Some(found) = child.find_by_attr(name, value) {
				return Some(found);
			}
		}
		None
	}

	/// Depth-first collection (self included) of elements carrying the
	/// attribute `name`, whatever its value.
	pub fn find_all_with_attr(&self, name: &str) -> Vec<Element> {
		let mut out = Vec::new();
		self.collect_with_attr(name, &mut out);
		out
	}

	fn collect_with_attr(&self, name: &str, out: &mut Vec<Element>) {
		if self.attr(name).is_some() {
			out.push(self.clone());
		}
		for child in self.children() {
			child.collect_with_attr(name, out);
		}
	}

	/// Removes all child nodes.
	pub fn clear_children(&self) {
		self.data.children.borrow_mut().clear();
	}

	/// Replaces the element's content by parsing `html`.
	pub fn set_inner_html(&self, html: &str) -> Result<(), DomError> {
		let nodes = parser::parse_fragment(html)?;
		self.clear_children();
		for node in nodes {
			self.append_child(node);
		}
		Ok(())
	}

	/// Serializes the element's content.
	pub fn inner_html(&self) -> String {
		let mut out = String::new();
		let raw = is_raw_text_tag(&self.data.tag);
		for node in self.data.children.borrow().iter() {
			write_node(node, raw, &mut out);
		}
		out
	}

	/// Serializes the element including its own tag.
	pub fn outer_html(&self) -> String {
		let mut out = String::new();
		write_node(&Node::Element(self.clone()), false, &mut out);
		out
	}

	/// Concatenated raw text of the subtree.
	pub fn text_content(&self) -> String {
		let mut out = String::new();
		self.collect_text(&mut out);
		out
	}

	fn collect_text(&self, out: &mut String) {
		for node in self.data.children.borrow().iter() {
			match node {
				Node::Text(text) => out.push_str(text),
				Node::Element(el) => el.collect_text(out),
			}
		}
	}

	/// Creates a non-owning handle to this element.
	pub fn downgrade(&self) -> WeakElement {
		WeakElement {
			data: Rc::downgrade(&self.data),
		}
	}
}

/// A non-owning element handle.
#[derive(Clone, Debug, Default)]
pub struct WeakElement {
	data: Weak<ElementData>,
}

impl std::fmt::Debug for ElementData {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ElementData").field("tag", &self.tag).finish()
	}
}

impl WeakElement {
	/// Recovers the element if its tree is still alive.
	pub fn upgrade(&self) -> Option<Element> {
		self.data.upgrade().map(|data| Element { data })
	}
}

/// A parsed document: a synthetic root above the markup's top-level
/// nodes.
#[derive(Debug)]
pub struct Document {
	root: Element,
}

impl Document {
	/// Parses a full document or fragment.
	pub fn parse(html: &str) -> Result<Self, DomError> {
		let root = Element::new("#document");
		let nodes = parser::parse_fragment(html)?;
		for node in nodes {
			root.append_child(node);
		}
		Ok(Self { root })
	}

	/// The synthetic root element.
	pub fn root(&self) -> &Element {
		&self.root
	}

	/// Finds an element by its `id` attribute.
	pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
		self.root.find_by_attr("id", id)
	}
}

/// Escapes text-node content.
pub(crate) fn escape_text(text: &str) -> String {
	text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Escapes an attribute value for double-quoted serialization.
pub(crate) fn escape_attr(value: &str) -> String {
	value
		.replace('&', "&amp;")
		.replace('"', "&quot;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

fn write_node(node: &Node, raw_text: bool, out: &mut String) {
	match node {
		Node::Text(text) => {
			if raw_text {
				out.push_str(text);
			} else {
				out.push_str(&escape_text(text));
			}
		}
		Node::Element(el) => {
			out.push('<');
			out.push_str(&el.data.tag);
			for (name, value) in el.data.attributes.borrow().iter() {
				out.push(' ');
				out.push_str(name);
				out.push_str("=\"");
				out.push_str(&escape_attr(value));
				out.push('"');
			}
			out.push('>');
			if is_void_tag(&el.data.tag) {
				return;
			}
			let raw = is_raw_text_tag(&el.data.tag);
			for child in el.data.children.borrow().iter() {
				write_node(child, raw, out);
			}
			out.push_str("</");
			out.push_str(&el.data.tag);
			out.push('>');
		}
	}
}
