// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use fieldline_type::SourceLocation;

use crate::cst::{CstElement, CstNode, CstToken};

/// Compute the span of a whole CST subtree.
///
/// Scans every leaf token below `node` and takes the earliest start and the
/// latest end. Start and end are selected independently, so a tree whose
/// tokens only carry one usable bound still yields a span with the other
/// bound defaulted. No tokens at all yields the default span (line 1,
/// column 1, offset 0) — never an error.
pub fn aggregate(node: &CstNode) -> SourceLocation {
	let mut first: Option<&CstToken> = None;
	let mut last: Option<&CstToken> = None;
	scan(node, &mut first, &mut last);

	let mut location = SourceLocation::default();
	if let Some(token) = first {
		location.start_line = token.start_line;
		location.start_column = token.start_column;
		location.start_offset = token.start_offset;
	}
	if let Some(token) = last {
		location.end_line = token.end_line;
		location.end_column = token.end_column;
		location.end_offset = token.end_offset;
	}
	location
}

fn scan<'a>(node: &'a CstNode, first: &mut Option<&'a CstToken>, last: &mut Option<&'a CstToken>) {
	for elements in node.children.values() {
		for element in elements {
			match element {
				CstElement::Token(token) => {
					if first.map_or(true, |t| token.start_offset < t.start_offset) {
						*first = Some(token);
					}
					if last.map_or(true, |t| token.end_offset > t.end_offset) {
						*last = Some(token);
					}
				}
				CstElement::Node(child) => scan(child, first, last),
			}
		}
	}
}
