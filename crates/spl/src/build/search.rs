// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::ast::{
	BinaryOperator, LogicalKeyword, MacroCall, SearchComparison, SearchExpression, SearchKeyword,
	SearchLogical, SearchSubsearch, SearchTerm, SearchValue, SearchWildcard,
};
use crate::build::Builder;
use crate::cst::{CstNode, location, normalize};
use crate::error::WarningKind;

const COMPARISON_KEYS: &[&str] = &[
	"Equals",
	"NotEquals",
	"LessThanEqual",
	"GreaterThanEqual",
	"LessThan",
	"GreaterThan",
];

/// The bare search grammar has no operator precedence, so this builder
/// produces a flat ordered term list. Per-term dispatch, first match wins:
/// logical keyword, subsearch, macro, field comparison, wildcard, free text.
impl Builder {
	pub(crate) fn build_search_expression(&mut self, node: &CstNode) -> SearchExpression {
		let mut terms = Vec::new();
		for term in node.nodes("searchTerm") {
			terms.push(self.build_search_term(term));
		}
		let referenced_fields = SearchExpression::collect_referenced_fields(&terms);
		SearchExpression {
			terms,
			referenced_fields,
			location: location::aggregate(node),
		}
	}

	fn build_search_term(&mut self, node: &CstNode) -> SearchTerm {
		let term_location = location::aggregate(node);

		for (key, operator) in [
			("And", LogicalKeyword::And),
			("Or", LogicalKeyword::Or),
			("Not", LogicalKeyword::Not),
		] {
			if node.has(key) {
				return SearchTerm::LogicalOperator(SearchLogical {
					operator,
					location: term_location,
				});
			}
		}

		if let Some(sub) = node.node("subsearch") {
			return SearchTerm::Subsearch(SearchSubsearch {
				pipeline: self.build_subsearch(sub),
				location: term_location,
			});
		}

		if let Some(invocation) = node.node("macroCall") {
			return SearchTerm::MacroCall(MacroCall {
				raw_text: normalize::token_image(invocation, "Macro"),
				location: term_location,
			});
		}

		if let Some(comparison) = node.node("fieldComparison") {
			return SearchTerm::Comparison(self.build_field_comparison(comparison));
		}

		if let Some(token) = node.token("Wildcard").or_else(|| node.token("WildcardField")) {
			return SearchTerm::Wildcard(SearchWildcard {
				pattern: token.image.clone(),
				location: token.location(),
			});
		}

		// fallback: free-text keyword
		let text = node
			.children
			.values()
			.flatten()
			.find_map(|element| element.as_token())
			.map(|token| token.image.clone())
			.unwrap_or_default();
		SearchTerm::Keyword(SearchKeyword {
			text,
			location: term_location,
		})
	}

	fn build_field_comparison(&mut self, node: &CstNode) -> SearchComparison {
		let field = self.field_or_empty(node);
		let operator = node
			.token_of(COMPARISON_KEYS)
			.map(|(key, token)| {
				BinaryOperator::from_image(&token.image).unwrap_or_else(|| operator_for_key(key))
			})
			.unwrap_or(BinaryOperator::Equals);
		let value = match node.node("value").and_then(|v| {
			v.children.values().flatten().find_map(|element| element.as_token())
		}) {
			Some(token) if token.kind() == "NumberLiteral" => {
				match normalize::parse_number(&token.image) {
					Some(number) => SearchValue::Number(number),
					None => {
						self.warn(
							WarningKind::InvalidNumber {
								text: token.image.clone(),
							},
							token.location(),
						);
						SearchValue::String(token.image.clone())
					}
				}
			}
			Some(token) => {
				SearchValue::String(normalize::string_value(&token.image).to_string())
			}
			None => SearchValue::String(String::new()),
		};
		SearchComparison {
			field,
			operator,
			value,
			location: location::aggregate(node),
		}
	}
}

fn operator_for_key(key: &str) -> BinaryOperator {
	match key {
		"NotEquals" => BinaryOperator::NotEquals,
		"LessThan" => BinaryOperator::LessThan,
		"LessThanEqual" => BinaryOperator::LessThanOrEqual,
		"GreaterThan" => BinaryOperator::GreaterThan,
		"GreaterThanEqual" => BinaryOperator::GreaterThanOrEqual,
		_ => BinaryOperator::Equals,
	}
}

#[cfg(test)]
pub mod tests {
	use crate::ast::{BinaryOperator, SearchTerm, SearchValue};
	use crate::build::Builder;
	use crate::build::support::*;
	use crate::cst::CstNode;

	pub fn comparison(field: &str, op_key: &str, op_image: &str, value: Vec<crate::cst::CstElement>) -> CstNode {
		let inner = CstNode::named("fieldComparison")
			.with("fieldName", vec![n(field_name(field))])
			.with(op_key, vec![tok(op_image)])
			.with("value", vec![n(CstNode::named("value").with("v", value))]);
		CstNode::named("searchTerm").with("fieldComparison", vec![n(inner)])
	}

	pub fn keyword(text: &str) -> CstNode {
		CstNode::named("searchTerm").with("Identifier", vec![tok(text)])
	}

	pub fn search_expression(terms: Vec<CstNode>) -> CstNode {
		CstNode::named("searchExpression").with("searchTerm", terms.into_iter().map(n).collect())
	}

	#[test]
	fn test_flat_term_list_in_order() {
		let node = search_expression(vec![
			comparison("index", "Equals", "=", vec![tok("main")]),
			keyword("error"),
			CstNode::named("searchTerm").with("Or", vec![tok("OR")]),
			keyword("failure"),
		]);
		let mut builder = Builder::new();
		let search = builder.build_search_expression(&node);
		assert_eq!(search.terms.len(), 4);
		assert!(matches!(search.terms[0], SearchTerm::Comparison(_)));
		assert!(matches!(search.terms[1], SearchTerm::Keyword(_)));
		assert!(matches!(search.terms[2], SearchTerm::LogicalOperator(_)));
		assert_eq!(search.referenced_fields, vec!["index"]);
	}

	#[test]
	fn test_comparison_operators() {
		let cases = [
			("Equals", "=", BinaryOperator::Equals),
			("NotEquals", "!=", BinaryOperator::NotEquals),
			("LessThan", "<", BinaryOperator::LessThan),
			("GreaterThan", ">", BinaryOperator::GreaterThan),
		];
		for (key, image, expected) in cases {
			let node = search_expression(vec![comparison("bytes", key, image, vec![tok_typed("100", "NumberLiteral")])]);
			let mut builder = Builder::new();
			let search = builder.build_search_expression(&node);
			let SearchTerm::Comparison(built) = &search.terms[0] else {
				panic!("expected comparison");
			};
			assert_eq!(built.operator, expected);
			assert_eq!(built.value, SearchValue::Number(100.0));
		}
	}

	#[test]
	fn test_quoted_value_stripped() {
		let node = search_expression(vec![comparison(
			"sourcetype",
			"Equals",
			"=",
			vec![tok_typed("\"access_combined\"", "StringLiteral")],
		)]);
		let mut builder = Builder::new();
		let search = builder.build_search_expression(&node);
		let SearchTerm::Comparison(built) = &search.terms[0] else {
			panic!("expected comparison");
		};
		assert_eq!(built.value, SearchValue::String("access_combined".to_string()));
	}

	#[test]
	fn test_macro_kept_verbatim() {
		let invocation = CstNode::named("macroCall").with("Macro", vec![tok("`summariesonly`")]);
		let term = CstNode::named("searchTerm").with("macroCall", vec![n(invocation)]);
		let mut builder = Builder::new();
		let search = builder.build_search_expression(&search_expression_from(term));
		let SearchTerm::MacroCall(built) = &search.terms[0] else {
			panic!("expected macro call");
		};
		assert_eq!(built.raw_text, "`summariesonly`");
	}

	fn search_expression_from(term: CstNode) -> CstNode {
		CstNode::named("searchExpression").with("searchTerm", vec![n(term)])
	}

	#[test]
	fn test_bare_wildcard_term() {
		let term = CstNode::named("searchTerm").with("WildcardField", vec![tok("fail*")]);
		let mut builder = Builder::new();
		let search = builder.build_search_expression(&search_expression_from(term));
		let SearchTerm::Wildcard(built) = &search.terms[0] else {
			panic!("expected wildcard");
		};
		assert_eq!(built.pattern, "fail*");
	}

	#[test]
	fn test_subsearch_term_recurses() {
		let inner_pipeline = CstNode::named("pipeline").with(
			"searchExpression",
			vec![n(search_expression(vec![keyword("error")]))],
		);
		let term = CstNode::named("searchTerm").with("subsearch", vec![n(subsearch(inner_pipeline))]);
		let mut builder = Builder::new();
		let search = builder.build_search_expression(&search_expression_from(term));
		let SearchTerm::Subsearch(built) = &search.terms[0] else {
			panic!("expected subsearch");
		};
		assert_eq!(built.pipeline.len(), 1);
	}

	#[test]
	fn test_wildcard_comparison_not_referenced() {
		let inner = CstNode::named("fieldComparison")
			.with("fieldName", vec![n(wildcard_field("host*"))])
			.with("Equals", vec![tok("=")])
			.with("value", vec![n(CstNode::named("value").with("v", vec![tok("web")]))]);
		let term = CstNode::named("searchTerm").with("fieldComparison", vec![n(inner)]);
		let mut builder = Builder::new();
		let search = builder.build_search_expression(&search_expression_from(term));
		assert!(search.referenced_fields.is_empty());
	}

	#[test]
	fn test_empty_term_degrades_to_keyword() {
		let mut builder = Builder::new();
		let search = builder.build_search_expression(&search_expression_from(CstNode::named("searchTerm")));
		assert!(matches!(&search.terms[0], SearchTerm::Keyword(k) if k.text.is_empty()));
	}
}
