// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// A token span in the original search string.
///
/// Lines and columns are 1-based, offsets are 0-based byte offsets. The
/// default span points at line 1, column 1, offset 0 — consumers of a
/// malformed tree get a usable position instead of a missing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
	pub start_line: u32,
	pub start_column: u32,
	pub start_offset: usize,
	pub end_line: u32,
	pub end_column: u32,
	pub end_offset: usize,
}

impl SourceLocation {
	pub fn new(
		start_line: u32,
		start_column: u32,
		start_offset: usize,
		end_line: u32,
		end_column: u32,
		end_offset: usize,
	) -> Self {
		Self {
			start_line,
			start_column,
			start_offset,
			end_line,
			end_column,
			end_offset,
		}
	}

	/// Span covering both locations.
	pub fn merge(self, other: Self) -> Self {
		let (start_line, start_column, start_offset) = if self.start_offset <= other.start_offset {
			(self.start_line, self.start_column, self.start_offset)
		} else {
			(other.start_line, other.start_column, other.start_offset)
		};
		let (end_line, end_column, end_offset) = if self.end_offset >= other.end_offset {
			(self.end_line, self.end_column, self.end_offset)
		} else {
			(other.end_line, other.end_column, other.end_offset)
		};
		Self {
			start_line,
			start_column,
			start_offset,
			end_line,
			end_column,
			end_offset,
		}
	}
}

impl Default for SourceLocation {
	fn default() -> Self {
		Self {
			start_line: 1,
			start_column: 1,
			start_offset: 0,
			end_line: 1,
			end_column: 1,
			end_offset: 0,
		}
	}
}

impl Display for SourceLocation {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if self.start_line == self.end_line {
			write!(f, "{}:{}-{}", self.start_line, self.start_column, self.end_column)
		} else {
			write!(f, "{}:{}-{}:{}", self.start_line, self.start_column, self.end_line, self.end_column)
		}
	}
}

/// A piece of source text together with its location, carried by diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fragment {
	/// No fragment information available
	None,

	/// Fragment from a search statement with position information
	Statement {
		text: String,
		location: SourceLocation,
	},

	/// Fragment from internal/runtime code
	Internal {
		text: String,
	},
}

impl Fragment {
	pub fn statement(text: impl Into<String>, location: SourceLocation) -> Self {
		Fragment::Statement {
			text: text.into(),
			location,
		}
	}

	pub fn internal(text: impl Into<String>) -> Self {
		Fragment::Internal {
			text: text.into(),
		}
	}

	/// Get the text value of the fragment
	pub fn text(&self) -> &str {
		match self {
			Fragment::None => "",
			Fragment::Statement {
				text,
				..
			}
			| Fragment::Internal {
				text,
			} => text,
		}
	}

	/// Get the location, defaulting when none was recorded
	pub fn location(&self) -> SourceLocation {
		match self {
			Fragment::Statement {
				location,
				..
			} => *location,
			_ => SourceLocation::default(),
		}
	}
}

impl Default for Fragment {
	fn default() -> Self {
		Fragment::None
	}
}

#[cfg(test)]
pub mod tests {
	use super::*;

	#[test]
	fn test_default_location_points_at_start() {
		let loc = SourceLocation::default();
		assert_eq!(loc.start_line, 1);
		assert_eq!(loc.start_column, 1);
		assert_eq!(loc.start_offset, 0);
		assert_eq!(loc.end_line, 1);
	}

	#[test]
	fn test_merge_takes_outermost_bounds() {
		let a = SourceLocation::new(1, 5, 4, 1, 10, 9);
		let b = SourceLocation::new(1, 12, 11, 2, 3, 20);
		let merged = a.merge(b);
		assert_eq!(merged.start_offset, 4);
		assert_eq!(merged.end_offset, 20);
		assert_eq!(merged.end_line, 2);
	}

	#[test]
	fn test_fragment_text() {
		assert_eq!(Fragment::None.text(), "");
		assert_eq!(Fragment::internal("count").text(), "count");
		let frag = Fragment::statement("host", SourceLocation::default());
		assert_eq!(frag.text(), "host");
	}

	#[test]
	fn test_display_single_line() {
		let loc = SourceLocation::new(3, 7, 20, 3, 12, 25);
		assert_eq!(loc.to_string(), "3:7-12");
	}

	#[test]
	fn test_location_serializes_camel_case() {
		let json = serde_json::to_value(SourceLocation::default()).unwrap();
		assert!(json.get("startLine").is_some());
		assert!(json.get("endOffset").is_some());
	}
}
