// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::cst::CstNode;

/// Text of the first token under `key`, `""` when absent.
///
/// The grammar guarantees singleton token arrays in the contexts where this
/// is used; later array entries are ignored.
pub fn token_image(node: &CstNode, key: &str) -> String {
	node.token(key).map(|token| token.image.clone()).unwrap_or_default()
}

/// Strip exactly one layer of matching `"…"` or `'…'` quoting.
///
/// Interior escape sequences are left untouched; SPL string semantics do not
/// unescape beyond the quote layer.
pub fn string_value(text: &str) -> &str {
	let bytes = text.as_bytes();
	if bytes.len() >= 2 {
		let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
		if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
			return &text[1..text.len() - 1];
		}
	}
	text
}

/// Parse a numeric literal. `None` for anything that is not a finite number.
pub fn parse_number(text: &str) -> Option<f64> {
	let value: f64 = text.trim().parse().ok()?;
	value.is_finite().then_some(value)
}

/// Extract named capture groups from a regex pattern, in source order.
///
/// Tries the regex crate first (`capture_names` reports groups for both
/// `(?<name>…)` and `(?P<name>…)`). Patterns the crate rejects — duplicate
/// group names, PCRE-only constructs — fall back to a literal scan so that a
/// `rex` against an exotic pattern still reports its extracted fields.
pub fn extract_named_groups(pattern: &str) -> Vec<String> {
	if let Ok(compiled) = regex::Regex::new(pattern) {
		return compiled.capture_names().flatten().map(String::from).collect();
	}
	scan_named_groups(pattern)
}

fn scan_named_groups(pattern: &str) -> Vec<String> {
	let mut names = Vec::new();
	let bytes = pattern.as_bytes();
	let mut i = 0;
	while i + 2 < bytes.len() {
		if bytes[i] == b'(' && bytes[i + 1] == b'?' {
			let mut j = i + 2;
			if j < bytes.len() && bytes[j] == b'P' {
				j += 1;
			}
			// `(?<=` / `(?<!` are lookbehinds, not captures
			if j < bytes.len() && bytes[j] == b'<' && bytes.get(j + 1) != Some(&b'=') && bytes.get(j + 1) != Some(&b'!') {
				let start = j + 1;
				let mut end = start;
				while end < bytes.len() && bytes[end] != b'>' {
					end += 1;
				}
				if end < bytes.len() && end > start {
					names.push(pattern[start..end].to_string());
					i = end;
				}
			}
		}
		i += 1;
	}
	names
}
