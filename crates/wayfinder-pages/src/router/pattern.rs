//! Path pattern compilation and matching.
//!
//! Patterns are split into `/`-separated segments. Each segment is either
//! literal text or exactly one parameter:
//!
//! - `/blog` - literal segment
//! - `/blog/{slug}` - named parameter (one segment)
//! - `/blog/{slug:[a-z-]+}` - constrained parameter, the regex must match the
//!   whole decoded segment
//! - `/docs/{path:*}` - rest parameter, captures one or more remaining
//!   segments joined with `/`
//!
//! Incoming paths are percent-decoded one segment at a time before they are
//! compared, so `/f%C3%BCnke` and `/fünke` are the same path.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use super::error::{PatternError, RouterError};
use super::Params;

/// Maximum allowed length for a route pattern string in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of path segments in a route pattern.
const MAX_PATH_SEGMENTS: usize = 32;

/// Maximum allowed size for a compiled constraint regex (in bytes).
const MAX_CONSTRAINT_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// One compiled segment of a [`PathPattern`].
#[derive(Debug, Clone)]
pub enum Segment {
	/// Matches the decoded segment text exactly.
	Literal(String),
	/// Captures any single segment.
	Param {
		/// Parameter name.
		name: String,
	},
	/// Captures a single segment accepted by `regex`.
	Constrained {
		/// Parameter name.
		name: String,
		/// Anchored constraint.
		regex: regex::Regex,
	},
	/// Captures the remainder of the path.
	Rest {
		/// Parameter name.
		name: String,
	},
}

impl Segment {
	/// Ordering rank used for specificity; lower is more specific.
	fn rank(&self) -> u8 {
		match self {
			Self::Literal(_) => 0,
			Self::Constrained { .. } => 1,
			Self::Param { .. } => 2,
			Self::Rest { .. } => 3,
		}
	}

	/// Returns the parameter name, if this segment captures one.
	pub fn param_name(&self) -> Option<&str> {
		match self {
			Self::Literal(_) => None,
			Self::Param { name } | Self::Constrained { name, .. } | Self::Rest { name } => {
				Some(name)
			}
		}
	}
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
	pattern: String,
	segments: Vec<Segment>,
	param_names: Vec<String>,
	ranks: Vec<u8>,
}

impl PathPattern {
	/// Compiles a pattern string.
	///
	/// # Errors
	///
	/// Returns [`PatternError`] if:
	/// - the pattern exceeds 1024 bytes
	/// - the pattern has more than 32 segments
	/// - a rest parameter is not the last segment
	/// - a parameter name is repeated
	/// - a parameter segment is malformed or its constraint does not compile
	pub fn new(pattern: &str) -> Result<Self, PatternError> {
		// Reject patterns exceeding the maximum length to prevent ReDoS
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(PatternError::TooLong {
				length: pattern.len(),
				max: MAX_PATTERN_LENGTH,
			});
		}

		let raw_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
		if raw_segments.len() > MAX_PATH_SEGMENTS {
			return Err(PatternError::TooManySegments {
				count: raw_segments.len(),
				max: MAX_PATH_SEGMENTS,
			});
		}

		let mut segments = Vec::with_capacity(raw_segments.len());
		let mut param_names: Vec<String> = Vec::new();
		for (index, raw) in raw_segments.iter().enumerate() {
			let segment = Self::parse_segment(raw)?;
			if let Some(name) = segment.param_name() {
				if param_names.iter().any(|existing| existing == name) {
					return Err(PatternError::DuplicateParam(name.to_string()));
				}
				if matches!(segment, Segment::Rest { .. }) && index + 1 != raw_segments.len() {
					return Err(PatternError::RestNotLast(name.to_string()));
				}
				param_names.push(name.to_string());
			}
			segments.push(segment);
		}

		let ranks = segments.iter().map(Segment::rank).collect();
		Ok(Self {
			pattern: pattern.to_string(),
			segments,
			param_names,
			ranks,
		})
	}

	fn parse_segment(raw: &str) -> Result<Segment, PatternError> {
		let Some(inner) = raw.strip_prefix('{') else {
			if raw.contains(['{', '}']) {
				return Err(PatternError::MalformedParam(raw.to_string()));
			}
			let literal = urlencoding::decode(raw)
				.map(Cow::into_owned)
				.unwrap_or_else(|_| raw.to_string());
			return Ok(Segment::Literal(literal));
		};

		let inner = inner
			.strip_suffix('}')
			.ok_or_else(|| PatternError::MalformedParam(raw.to_string()))?;
		let (name, constraint) = match inner.split_once(':') {
			Some((name, constraint)) => (name, Some(constraint)),
			None => (inner, None),
		};
		if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
			return Err(PatternError::MalformedParam(raw.to_string()));
		}

		let name = name.to_string();
		match constraint {
			None => Ok(Segment::Param { name }),
			Some("*") => Ok(Segment::Rest { name }),
			Some("") => Err(PatternError::MalformedParam(raw.to_string())),
			Some(constraint) => {
				// Use RegexBuilder with size limits to prevent memory exhaustion
				let regex = regex::RegexBuilder::new(&format!("^(?:{constraint})$"))
					.size_limit(MAX_CONSTRAINT_REGEX_SIZE)
					.build()
					.map_err(|e| PatternError::InvalidConstraint {
						name: name.clone(),
						message: e.to_string(),
					})?;
				Ok(Segment::Constrained { name, regex })
			}
		}
	}

	/// Returns the original pattern string.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Returns the compiled segments.
	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	/// Returns the parameter names in declaration order.
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Returns whether this pattern has no parameters.
	pub fn is_exact(&self) -> bool {
		self.param_names.is_empty()
	}

	/// Attempts to match a path, returning decoded parameters.
	///
	/// The path may be raw or percent-encoded. Trailing and repeated slashes
	/// are insignificant.
	pub fn matches(&self, path: &str) -> Option<Params> {
		let decoded = decode_segments(path)?;
		let mut params = Params::new();

		for (index, segment) in self.segments.iter().enumerate() {
			match segment {
				Segment::Literal(literal) => {
					if decoded.get(index)? != literal {
						return None;
					}
				}
				Segment::Param { name } => {
					params.insert(name.clone(), decoded.get(index)?.clone());
				}
				Segment::Constrained { name, regex } => {
					let value = decoded.get(index)?;
					if !regex.is_match(value) {
						return None;
					}
					params.insert(name.clone(), value.clone());
				}
				Segment::Rest { name } => {
					let rest = decoded.get(index..).filter(|rest| !rest.is_empty())?;
					params.insert(name.clone(), rest.join("/"));
					return Some(params);
				}
			}
		}

		(decoded.len() == self.segments.len()).then_some(params)
	}

	/// Compares two patterns by specificity.
	///
	/// Segments are compared pairwise (literal before constrained before
	/// plain before rest); when one rank list is a prefix of the other the
	/// pattern with fewer segments wins.
	pub fn specificity_cmp(&self, other: &Self) -> Ordering {
		self.ranks.cmp(&other.ranks)
	}

	/// Generates a path from this pattern, percent-encoding parameter values.
	pub fn reverse(&self, params: &Params) -> Result<String, RouterError> {
		if self.segments.is_empty() {
			return Ok("/".to_string());
		}

		let mut path = String::new();
		for segment in &self.segments {
			path.push('/');
			match segment {
				Segment::Literal(literal) => path.push_str(&urlencoding::encode(literal)),
				Segment::Param { name } | Segment::Constrained { name, .. } => {
					let value = params
						.get(name)
						.ok_or_else(|| RouterError::MissingParameter(name.clone()))?;
					path.push_str(&urlencoding::encode(value));
				}
				Segment::Rest { name } => {
					let value = params
						.get(name)
						.ok_or_else(|| RouterError::MissingParameter(name.clone()))?;
					let encoded: Vec<Cow<'_, str>> =
						value.split('/').map(urlencoding::encode).collect();
					path.push_str(&encoded.join("/"));
				}
			}
		}
		Ok(path)
	}
}

/// Splits a path into percent-decoded segments.
///
/// Returns `None` if any segment does not decode to valid UTF-8.
pub(crate) fn decode_segments(path: &str) -> Option<Vec<String>> {
	path.split('/')
		.filter(|segment| !segment.is_empty())
		.map(|segment| urlencoding::decode(segment).ok().map(Cow::into_owned))
		.collect()
}

impl PartialEq for PathPattern {
	fn eq(&self, other: &Self) -> bool {
		self.pattern == other.pattern
	}
}

impl Eq for PathPattern {}

impl fmt::Display for PathPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.pattern)
	}
}
