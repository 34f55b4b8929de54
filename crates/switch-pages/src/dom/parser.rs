//! Markup parser for the framework's rendered output.
//!
//! This is not a general-purpose HTML parser. It handles the subset the
//! renderer and component render functions emit: elements with quoted or
//! bare attributes, text with the standard entities, comments, a
//! doctype, void elements, self-closing syntax, and raw-text
//! `<script>`/`<style>` contents.

use super::{DomError, Element, Node, is_raw_text_tag, is_void_tag};

/// Parses a markup fragment into a node list.
pub(super) fn parse_fragment(input: &str) -> Result<Vec<Node>, DomError> {
	Parser::new(input).run()
}

struct Parser {
	chars: Vec<char>,
	pos: usize,
}

impl Parser {
	fn new(input: &str) -> Self {
		Self {
			chars: input.chars().collect(),
			pos: 0,
		}
	}

	fn run(mut self) -> Result<Vec<Node>, DomError> {
		let mut roots: Vec<Node> = Vec::new();
		// Open-element stack; children accumulate on the top entry.
		let mut stack: Vec<Element> = Vec::new();

		while self.pos < self.chars.len() {
			if self.peek() == Some('<') {
				if self.starts_with("<!--") {
					self.skip_comment()?;
					continue;
				}
				if self.starts_with("<!") {
					self.skip_until('>')?;
					continue;
				}
				if self.starts_with("</") {
					let tag = self.read_closing_tag()?;
					match stack.pop() {
						Some(open) if open.tag_name() == tag => {
							Self::emit(Node::Element(open), &stack, &mut roots);
						}
						Some(open) => {
							return Err(DomError::MismatchedClosingTag {
								expected: open.tag_name(),
								found: tag,
							});
						}
						None => return Err(DomError::UnexpectedClosingTag(tag)),
					}
					continue;
				}
				let (element, self_closed) = self.read_open_tag()?;
				let tag = element.tag_name();
				if self_closed || is_void_tag(&tag) {
					Self::emit(Node::Element(element), &stack, &mut roots);
				} else if is_raw_text_tag(&tag) {
					let text = self.read_raw_text(&tag)?;
					if !text.is_empty() {
						element.append_child(Node::Text(text));
					}
					Self::emit(Node::Element(element), &stack, &mut roots);
				} else {
					stack.push(element);
				}
			} else {
				let text = self.read_text();
				if !text.is_empty() {
					Self::emit(Node::Text(text), &stack, &mut roots);
				}
			}
		}

		if let Some(open) = stack.pop() {
			return Err(DomError::MismatchedClosingTag {
				expected: open.tag_name(),
				found: String::new(),
			});
		}
		Ok(roots)
	}

	fn emit(node: Node, stack: &[Element], roots: &mut Vec<Node>) {
		match stack.last() {
			Some(parent) => parent.append_child(node),
			None => roots.push(node),
		}
	}

	fn peek(&self) -> Option<char> {
		self.chars.get(self.pos).copied()
	}

	fn starts_with(&self, needle: &str) -> bool {
		needle
			.chars()
			.enumerate()
			.all(|(i, c)| self.chars.get(self.pos + i) == Some(&c))
	}

	fn skip_comment(&mut self) -> Result<(), DomError> {
		let start = self.pos;
		self.pos += 4;
		while self.pos < self.chars.len() {
			if self.starts_with("-->") {
				self.pos += 3;
				return Ok(());
			}
			self.pos += 1;
		}
		Err(DomError::UnexpectedEof(start))
	}

	fn skip_until(&mut self, terminator: char) -> Result<(), DomError> {
		let start = self.pos;
		while self.pos < self.chars.len() {
			if self.chars[self.pos] == terminator {
				self.pos += 1;
				return Ok(());
			}
			self.pos += 1;
		}
		Err(DomError::UnexpectedEof(start))
	}

	fn read_text(&mut self) -> String {
		let mut out = String::new();
		while let Some(c) = self.peek() {
			if c == '<' {
				break;
			}
			if c == '&' {
				out.push(self.read_entity());
			} else {
				out.push(c);
				self.pos += 1;
			}
		}
		out
	}

	/// Raw text runs to the matching closing tag without entity decoding.
	fn read_raw_text(&mut self, tag: &str) -> Result<String, DomError> {
		let start = self.pos;
		let closing = format!("</{}>", tag);
		let mut out = String::new();
		while self.pos < self.chars.len() {
			if self.starts_with(&closing) {
				self.pos += closing.chars().count();
				return Ok(out);
			}
			out.push(self.chars[self.pos]);
			self.pos += 1;
		}
		Err(DomError::UnexpectedEof(start))
	}

	fn read_entity(&mut self) -> char {
		const ENTITIES: &[(&str, char)] = &[
			("&amp;", '&'),
			("&lt;", '<'),
			("&gt;", '>'),
			("&quot;", '"'),
			("&#x27;", '\''),
			("&#39;", '\''),
		];
		for (entity, ch) in ENTITIES {
			if self.starts_with(entity) {
				self.pos += entity.chars().count();
				return *ch;
			}
		}
		// Lone ampersand; take it literally.
		self.pos += 1;
		'&'
	}

	fn read_closing_tag(&mut self) -> Result<String, DomError> {
		let start = self.pos;
		self.pos += 2;
		let tag = self.read_name();
		if tag.is_empty() {
			return Err(DomError::MalformedTag(start));
		}
		self.skip_whitespace();
		if self.peek() != Some('>') {
			return Err(DomError::MalformedTag(start));
		}
		self.pos += 1;
		Ok(tag)
	}

	fn read_open_tag(&mut self) -> Result<(Element, bool), DomError> {
		let start = self.pos;
		self.pos += 1;
		let tag = self.read_name();
		if tag.is_empty() {
			return Err(DomError::MalformedTag(start));
		}
		let element = Element::new(tag);

		loop {
			self.skip_whitespace();
			match self.peek() {
				Some('>') => {
					self.pos += 1;
					return Ok((element, false));
				}
				Some('/') => {
					self.pos += 1;
					self.skip_whitespace();
					if self.peek() != Some('>') {
						return Err(DomError::MalformedTag(start));
					}
					self.pos += 1;
					return Ok((element, true));
				}
				Some(_) => {
					let name = self.read_name();
					if name.is_empty() {
						return Err(DomError::MalformedTag(start));
					}
					let value = if self.peek() == Some('=') {
						self.pos += 1;
						self.read_attr_value(start)?
					} else {
						String::new()
					};
					element.set_attr(name, value);
				}
				None => return Err(DomError::UnexpectedEof(start)),
			}
		}
	}

	fn read_attr_value(&mut self, tag_start: usize) -> Result<String, DomError> {
		match self.peek() {
			Some(quote @ ('"' | '\'')) => {
				self.pos += 1;
				let mut out = String::new();
				loop {
					match self.peek() {
						Some(c) if c == quote => {
							self.pos += 1;
							return Ok(decode_entities(&out));
						}
						Some(c) => {
							out.push(c);
							self.pos += 1;
						}
						None => return Err(DomError::UnexpectedEof(tag_start)),
					}
				}
			}
			Some(_) => {
				let mut out = String::new();
				while let Some(c) = self.peek() {
					if c.is_whitespace() || c == '>' || c == '/' {
						break;
					}
					out.push(c);
					self.pos += 1;
				}
				if out.is_empty() {
					return Err(DomError::MalformedTag(tag_start));
				}
				Ok(decode_entities(&out))
			}
			None => Err(DomError::UnexpectedEof(tag_start)),
		}
	}

	fn read_name(&mut self) -> String {
		let mut out = String::new();
		while let Some(c) = self.peek() {
			if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' {
				out.push(c);
				self.pos += 1;
			} else {
				break;
			}
		}
		out
	}

	fn skip_whitespace(&mut self) {
		while self.peek().is_some_and(char::is_whitespace) {
			self.pos += 1;
		}
	}
}

fn decode_entities(value: &str) -> String {
	if !value.contains('&') {
		return value.to_string();
	}
	value
		.replace("&quot;", "\"")
		.replace("&#x27;", "'")
		.replace("&#39;", "'")
		.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&amp;", "&")
}
