// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::ast::FieldReference;
use crate::build::Builder;
use crate::cst::{CstNode, CstToken, location, normalize};
use crate::error::WarningKind;

/// Keywords that double as legal field names. SPL permits `eval count=1`
/// and `table count, type, index` even though these are grammar keywords;
/// the lexer hands them over under their keyword token type and the
/// resolver reads them back as ordinary fields.
pub(crate) const RESERVED_FIELD_KEYS: &[&str] = &[
	"Value",
	"Field",
	"Output",
	"OutputNew",
	"Max",
	"Mode",
	"Type",
	"Count",
	"Index",
	"Span",
	"Limit",
	"Source",
	"Sourcetype",
	"Host",
	"Delim",
	"Start",
	"End",
];

impl Builder {
	/// Convert a `fieldName` CST node into a normalized reference.
	///
	/// Tried in order, first match wins: wildcard token, plain identifier,
	/// reserved keyword, quoted string literal. Nothing matching yields an
	/// empty reference, never an error.
	pub(crate) fn resolve_field(&mut self, node: &CstNode) -> FieldReference {
		if let Some(token) = node.token("Wildcard").or_else(|| node.token("WildcardField")) {
			return FieldReference::wildcard(token.image.clone(), token.location());
		}
		if let Some(token) = node.token("Identifier") {
			return FieldReference::new(token.image.clone(), token.location());
		}
		if let Some((_, token)) = node.token_of(RESERVED_FIELD_KEYS) {
			return FieldReference::new(token.image.clone(), token.location());
		}
		if let Some(token) = node.token("StringLiteral") {
			return self.quoted_field(token);
		}
		let location = location::aggregate(node);
		self.warn(WarningKind::EmptyField, location);
		FieldReference::empty(location)
	}

	/// Field named by a raw string literal (`field="xmldata"`). The span is
	/// tightened by one column per side so it underlines the field text,
	/// not the quotes.
	pub(crate) fn quoted_field(&mut self, token: &CstToken) -> FieldReference {
		let name = normalize::string_value(&token.image);
		let mut location = token.location();
		if name.len() != token.image.len() {
			location.start_column += 1;
			location.start_offset += 1;
			location.end_column = location.end_column.saturating_sub(1);
			location.end_offset = location.end_offset.saturating_sub(1);
		}
		FieldReference::new(name, location)
	}

	/// All `fieldName` children of `node`, resolved in order.
	pub(crate) fn field_list(&mut self, node: &CstNode) -> Vec<FieldReference> {
		let mut fields = Vec::new();
		for child in node.nodes("fieldName") {
			fields.push(self.resolve_field(child));
		}
		fields
	}

	/// First `fieldName` child resolved, or an empty reference when the
	/// child is absent.
	pub(crate) fn field_or_empty(&mut self, node: &CstNode) -> FieldReference {
		match node.node("fieldName") {
			Some(child) => self.resolve_field(child),
			None => FieldReference::empty(location::aggregate(node)),
		}
	}

	/// Optional `fieldName` under a dedicated key (e.g. an AS alias).
	pub(crate) fn field_under(&mut self, node: &CstNode, key: &str) -> Option<FieldReference> {
		let child = node.node(key)?;
		match child.node("fieldName") {
			Some(inner) => Some(self.resolve_field(inner)),
			None => Some(self.resolve_field(child)),
		}
	}
}
