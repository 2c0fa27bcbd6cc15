// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use fieldline_type::SourceLocation;
use serde::Serialize;

use crate::ast::{BinaryOperator, FieldReference, Pipeline};

/// The bare keyword search syntax before the first pipe (and inside
/// subsearches).
///
/// Deliberately a flat ordered term list, not a boolean tree: the bare
/// search syntax has no unambiguous operator precedence at the lexical
/// level, so interpretation is left to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchExpression {
	pub terms: Vec<SearchTerm>,
	pub referenced_fields: Vec<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SearchTerm {
	Comparison(SearchComparison),
	Keyword(SearchKeyword),
	LogicalOperator(SearchLogical),
	Subsearch(SearchSubsearch),
	MacroCall(MacroCall),
	Wildcard(SearchWildcard),
}

/// `field=value`, `field!=value`, `field<value`, `field>value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchComparison {
	pub field: FieldReference,
	pub operator: BinaryOperator,
	pub value: SearchValue,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchValue {
	String(String),
	Number(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchKeyword {
	pub text: String,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalKeyword {
	#[serde(rename = "AND")]
	And,
	#[serde(rename = "OR")]
	Or,
	#[serde(rename = "NOT")]
	Not,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchLogical {
	pub operator: LogicalKeyword,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSubsearch {
	pub pipeline: Pipeline,
	pub location: SourceLocation,
}

/// A macro invocation, kept as opaque raw text (`` `macroname(arg)` ``).
/// No expansion and no field-dependency awareness.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroCall {
	pub raw_text: String,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchWildcard {
	pub pattern: String,
	pub location: SourceLocation,
}

impl SearchExpression {
	/// Non-wildcard field names referenced by the comparison terms, in
	/// first-appearance order.
	pub fn collect_referenced_fields(terms: &[SearchTerm]) -> Vec<String> {
		let mut fields = Vec::new();
		for term in terms {
			if let SearchTerm::Comparison(comparison) = term {
				let field = &comparison.field;
				if !field.is_wildcard
					&& !field.field_name.is_empty()
					&& !fields.contains(&field.field_name)
				{
					fields.push(field.field_name.clone());
				}
			}
		}
		fields
	}
}

#[cfg(test)]
pub mod tests {
	use super::*;

	fn comparison(field: &str) -> SearchTerm {
		SearchTerm::Comparison(SearchComparison {
			field: FieldReference::new(field, SourceLocation::default()),
			operator: BinaryOperator::Equals,
			value: SearchValue::String("x".to_string()),
			location: SourceLocation::default(),
		})
	}

	#[test]
	fn test_referenced_fields_skip_wildcards() {
		let terms = vec![
			comparison("index"),
			SearchTerm::Comparison(SearchComparison {
				field: FieldReference::wildcard("host*", SourceLocation::default()),
				operator: BinaryOperator::Equals,
				value: SearchValue::String("web".to_string()),
				location: SourceLocation::default(),
			}),
			comparison("sourcetype"),
			comparison("index"),
		];
		assert_eq!(SearchExpression::collect_referenced_fields(&terms), vec!["index", "sourcetype"]);
	}

	#[test]
	fn test_keyword_terms_reference_nothing() {
		let terms = vec![SearchTerm::Keyword(SearchKeyword {
			text: "error".to_string(),
			location: SourceLocation::default(),
		})];
		assert!(SearchExpression::collect_referenced_fields(&terms).is_empty());
	}
}
