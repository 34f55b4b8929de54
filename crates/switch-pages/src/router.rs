//! Path-string routing.
//!
//! Matches request paths against literal/`{param}` segment patterns and
//! resolves them to component names, in registration order. This is the
//! whole surface: no history integration, no guards, no reverse lookup.

use std::collections::HashMap;

/// One segment of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Param(String),
}

/// A parsed path pattern, e.g. `/users/{id}/posts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
	raw: String,
	segments: Vec<Segment>,
}

impl PathPattern {
	/// Parses a pattern. Segments wrapped in `{}` capture; everything
	/// else matches literally. Trailing slashes are insignificant.
	pub fn new(pattern: &str) -> Self {
		let segments = split_path(pattern)
			.into_iter()
			.map(|segment| {
				segment
					.strip_prefix('{')
					.and_then(|rest| rest.strip_suffix('}'))
					.map(|name| Segment::Param(name.to_string()))
					.unwrap_or_else(|| Segment::Literal(segment.to_string()))
			})
			.collect();
		Self {
			raw: pattern.to_string(),
			segments,
		}
	}

	/// The pattern as written.
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Matches a path, returning captured parameters on success.
	pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
		let parts = split_path(path);
		if parts.len() != self.segments.len() {
			return None;
		}
		let mut params = HashMap::new();
		for (segment, part) in self.segments.iter().zip(parts) {
			match segment {
				Segment::Literal(literal) => {
					if literal != part {
						return None;
					}
				}
				Segment::Param(name) => {
					params.insert(name.clone(), part.to_string());
				}
			}
		}
		Some(params)
	}
}

fn split_path(path: &str) -> Vec<&str> {
	path.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// A successful route resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
	/// The component the route maps to.
	pub component: String,
	/// Captured path parameters.
	pub params: HashMap<String, String>,
}

struct Route {
	pattern: PathPattern,
	component: String,
}

/// Maps path patterns to component names, first match wins.
#[derive(Default)]
pub struct Router {
	routes: Vec<Route>,
	not_found: Option<String>,
}

impl std::fmt::Debug for Router {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Router")
			.field("routes", &self.routes.len())
			.finish()
	}
}

impl Router {
	/// Creates an empty router.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a route. Routes are tried in registration order.
	pub fn route(mut self, pattern: &str, component: impl Into<String>) -> Self {
		self.routes.push(Route {
			pattern: PathPattern::new(pattern),
			component: component.into(),
		});
		self
	}

	/// Sets the component served when nothing matches.
	pub fn not_found(mut self, component: impl Into<String>) -> Self {
		self.not_found = Some(component.into());
		self
	}

	/// Resolves a path.
	pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
		for route in &self.routes {
			if let Some(params) = route.pattern.match_path(path) {
				return Some(RouteMatch {
					component: route.component.clone(),
					params,
				});
			}
		}
		self.not_found.as_ref().map(|component| RouteMatch {
			component: component.clone(),
			params: HashMap::new(),
		})
	}
}
