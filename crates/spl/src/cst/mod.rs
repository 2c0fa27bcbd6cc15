// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub mod location;
pub mod normalize;

use std::collections::BTreeMap;

use fieldline_type::SourceLocation;
use serde::Deserialize;

/// A concrete syntax tree node as produced by the external grammar.
///
/// The grammar runs outside this crate (in the editor) and ships its parse
/// tree as JSON: every node is a map from grammar-rule or token-type name to
/// an array of child elements. The shapes here are deliberately permissive —
/// every field except a token's `image` may be missing, and lookups on absent
/// keys return nothing rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CstNode {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub children: BTreeMap<String, Vec<CstElement>>,
}

/// A child of a [`CstNode`]: either a leaf token or a nested rule node.
///
/// Tokens carry an `image`, nodes carry `children`; serde resolves the
/// untagged union on that basis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CstElement {
	Token(CstToken),
	Node(CstNode),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CstToken {
	pub image: String,
	#[serde(default = "one")]
	pub start_line: u32,
	#[serde(default = "one")]
	pub start_column: u32,
	#[serde(default)]
	pub start_offset: usize,
	#[serde(default = "one")]
	pub end_line: u32,
	#[serde(default = "one")]
	pub end_column: u32,
	#[serde(default)]
	pub end_offset: usize,
	#[serde(default)]
	pub token_type: TokenType,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenType {
	#[serde(default)]
	pub name: String,
}

fn one() -> u32 {
	1
}

impl CstToken {
	pub fn new(image: impl Into<String>) -> Self {
		Self {
			image: image.into(),
			start_line: 1,
			start_column: 1,
			start_offset: 0,
			end_line: 1,
			end_column: 1,
			end_offset: 0,
			token_type: TokenType::default(),
		}
	}

	pub fn with_type(image: impl Into<String>, type_name: impl Into<String>) -> Self {
		let mut token = Self::new(image);
		token.token_type = TokenType {
			name: type_name.into(),
		};
		token
	}

	pub fn at(mut self, location: SourceLocation) -> Self {
		self.start_line = location.start_line;
		self.start_column = location.start_column;
		self.start_offset = location.start_offset;
		self.end_line = location.end_line;
		self.end_column = location.end_column;
		self.end_offset = location.end_offset;
		self
	}

	/// Name of the lexer token type, `""` when the grammar omitted it.
	pub fn kind(&self) -> &str {
		&self.token_type.name
	}

	pub fn location(&self) -> SourceLocation {
		SourceLocation {
			start_line: self.start_line,
			start_column: self.start_column,
			start_offset: self.start_offset,
			end_line: self.end_line,
			end_column: self.end_column,
			end_offset: self.end_offset,
		}
	}
}

impl CstElement {
	pub fn as_token(&self) -> Option<&CstToken> {
		match self {
			CstElement::Token(token) => Some(token),
			CstElement::Node(_) => None,
		}
	}

	pub fn as_node(&self) -> Option<&CstNode> {
		match self {
			CstElement::Node(node) => Some(node),
			CstElement::Token(_) => None,
		}
	}
}

impl CstNode {
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			children: BTreeMap::new(),
		}
	}

	pub fn with(mut self, key: impl Into<String>, elements: Vec<CstElement>) -> Self {
		self.children.insert(key.into(), elements);
		self
	}

	pub fn has(&self, key: &str) -> bool {
		self.children.get(key).is_some_and(|elements| !elements.is_empty())
	}

	pub fn elements(&self, key: &str) -> &[CstElement] {
		self.children.get(key).map(Vec::as_slice).unwrap_or_default()
	}

	/// First nested rule node under `key`, if any.
	pub fn node(&self, key: &str) -> Option<&CstNode> {
		self.elements(key).iter().find_map(CstElement::as_node)
	}

	/// All nested rule nodes under `key`, in encounter order.
	pub fn nodes(&self, key: &str) -> Vec<&CstNode> {
		self.elements(key).iter().filter_map(CstElement::as_node).collect()
	}

	/// First token under `key`, if any.
	pub fn token(&self, key: &str) -> Option<&CstToken> {
		self.elements(key).iter().find_map(CstElement::as_token)
	}

	/// All tokens under `key`, in encounter order.
	pub fn tokens(&self, key: &str) -> Vec<&CstToken> {
		self.elements(key).iter().filter_map(CstElement::as_token).collect()
	}

	/// First token found under any of the given keys, tried in order.
	pub fn token_of<'k>(&self, keys: &[&'k str]) -> Option<(&'k str, &CstToken)> {
		for key in keys {
			if let Some(token) = self.token(key) {
				return Some((key, token));
			}
		}
		None
	}
}

#[cfg(test)]
pub mod tests {
	use super::*;

	#[test]
	fn test_token_deserializes_from_chevrotain_shape() {
		let token: CstToken = serde_json::from_str(
			r#"{"image":"sourcetype","startLine":1,"startColumn":1,"startOffset":0,
			    "endLine":1,"endColumn":10,"endOffset":9,"tokenType":{"name":"Identifier"}}"#,
		)
		.unwrap();
		assert_eq!(token.image, "sourcetype");
		assert_eq!(token.kind(), "Identifier");
		assert_eq!(token.end_column, 10);
	}

	#[test]
	fn test_token_tolerates_missing_positions() {
		let token: CstToken = serde_json::from_str(r#"{"image":"*"}"#).unwrap();
		assert_eq!(token.start_line, 1);
		assert_eq!(token.start_column, 1);
		assert_eq!(token.start_offset, 0);
		assert_eq!(token.kind(), "");
	}

	#[test]
	fn test_element_union_resolves_on_image() {
		let elements: Vec<CstElement> = serde_json::from_str(
			r#"[{"image":"host"},{"name":"fieldName","children":{}}]"#,
		)
		.unwrap();
		assert!(elements[0].as_token().is_some());
		assert!(elements[1].as_node().is_some());
	}

	#[test]
	fn test_lookups_on_absent_keys_are_empty() {
		let node = CstNode::default();
		assert!(!node.has("fieldName"));
		assert!(node.node("fieldName").is_none());
		assert!(node.tokens("Identifier").is_empty());
	}

	#[test]
	fn test_mixed_children_filtered_by_shape() {
		let node = CstNode::named("aggregation").with(
			"x",
			vec![
				CstElement::Token(CstToken::new("count")),
				CstElement::Node(CstNode::named("fieldName")),
			],
		);
		assert_eq!(node.tokens("x").len(), 1);
		assert_eq!(node.nodes("x").len(), 1);
	}
}
