// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::ast::{
	DedupCommand, Expression, FieldsCommand, FieldsMode, HeadCommand, RegexCommand, ReverseCommand,
	SearchCommand, SortCommand, SortDirection, SortField, TableCommand, TailCommand, UniqCommand,
	WhereCommand,
};
use crate::cst::{CstNode, location, normalize};
use crate::lineage;

use super::Builder;

impl Builder {
	pub(crate) fn build_where(&mut self, node: &CstNode) -> WhereCommand {
		let command_location = location::aggregate(node);
		let condition = match node.node("expression") {
			Some(child) => self.build_expression(child),
			None => Expression::FieldReference(crate::ast::FieldReference::unknown(command_location)),
		};
		let referenced_fields = lineage::expression_dependencies(&condition);
		WhereCommand {
			condition,
			referenced_fields,
			location: command_location,
		}
	}

	/// The post-pipe `search` command reuses the bare search-term grammar.
	pub(crate) fn build_search_command(&mut self, node: &CstNode) -> SearchCommand {
		let expression = match node.node("searchExpression") {
			Some(child) => self.build_search_expression(child),
			None => self.build_search_expression(node),
		};
		SearchCommand {
			expression,
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_regex(&mut self, node: &CstNode) -> RegexCommand {
		let field = node.node("fieldName").map(|child| self.resolve_field(child));
		let negated = node.has("NotEquals");
		let pattern = node
			.token("StringLiteral")
			.map(|token| normalize::string_value(&token.image).to_string())
			.unwrap_or_default();
		RegexCommand {
			field,
			negated,
			pattern,
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_dedup(&mut self, node: &CstNode) -> DedupCommand {
		let sort_by = match node.node("sortByClause") {
			Some(clause) => self.sort_fields(clause),
			None => Vec::new(),
		};
		DedupCommand {
			count: self.leading_count(node),
			fields: self.field_list(node),
			options: self.build_options(node),
			sort_by,
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_fields(&mut self, node: &CstNode) -> FieldsCommand {
		let mode = if node.has("Minus") {
			FieldsMode::Remove
		} else {
			FieldsMode::Keep
		};
		FieldsCommand {
			mode,
			fields: self.field_list(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_table(&mut self, node: &CstNode) -> TableCommand {
		TableCommand {
			fields: self.field_list(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_sort(&mut self, node: &CstNode) -> SortCommand {
		SortCommand {
			limit: self.leading_count(node),
			fields: self.sort_fields(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn sort_fields(&mut self, node: &CstNode) -> Vec<SortField> {
		let mut fields = Vec::new();
		for sort_field in node.nodes("sortField") {
			let direction = if sort_field.has("Minus") {
				SortDirection::Descending
			} else {
				SortDirection::Ascending
			};
			fields.push(SortField {
				field: self.field_or_empty(sort_field),
				direction,
				location: location::aggregate(sort_field),
			});
		}
		fields
	}

	pub(crate) fn build_head(&mut self, node: &CstNode) -> HeadCommand {
		// `head 10` or `head (x > 5)` — a boolean expression limit
		let condition = node.node("expression").map(|child| self.build_expression(child));
		HeadCommand {
			count: self.leading_count(node),
			condition,
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_tail(&mut self, node: &CstNode) -> TailCommand {
		TailCommand {
			count: self.leading_count(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_uniq(&mut self, node: &CstNode) -> UniqCommand {
		UniqCommand {
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_reverse(&mut self, node: &CstNode) -> ReverseCommand {
		ReverseCommand {
			location: location::aggregate(node),
		}
	}
}

#[cfg(test)]
pub mod tests {
	use crate::ast::{Command, FieldsMode, SortDirection};
	use crate::build::Builder;
	use crate::build::support::*;
	use crate::cst::CstNode;

	#[test]
	fn test_where_referenced_fields() {
		let cmp = CstNode::named("comparisonExpression")
			.with(
				"additiveExpression",
				vec![
					n(additive_chain(primary_field("status"))),
					n(additive_chain(primary_number("500"))),
				],
			)
			.with("ComparisonOperator", vec![tok(">=")]);
		let node = CstNode::named("whereCommand").with(
			"expression",
			vec![n(CstNode::named("expression").with(
				"orExpression",
				vec![n(CstNode::named("orExpression").with(
					"andExpression",
					vec![n(CstNode::named("andExpression").with("comparisonExpression", vec![n(cmp)]))],
				))],
			))],
		);
		let mut builder = Builder::new();
		let built = builder.build_where(&node);
		assert_eq!(built.referenced_fields, vec!["status"]);
	}

	#[test]
	fn test_table_keyword_fields() {
		// table count, type, index
		let node = CstNode::named("tableCommand").with(
			"fieldName",
			vec![
				n(keyword_field("Count", "count")),
				n(keyword_field("Type", "type")),
				n(keyword_field("Index", "index")),
			],
		);
		let mut builder = Builder::new();
		let table = builder.build_table(&node);
		let names: Vec<_> = table.fields.iter().map(|f| f.field_name.as_str()).collect();
		assert_eq!(names, vec!["count", "type", "index"]);
		assert!(table.fields.iter().all(|f| !f.is_wildcard));
		assert!(builder.warnings.is_empty());
	}

	#[test]
	fn test_fields_remove_mode() {
		let node = CstNode::named("fieldsCommand")
			.with("Minus", vec![tok("-")])
			.with("fieldName", vec![n(field_name("_raw")), n(wildcard_field("tmp*"))]);
		let mut builder = Builder::new();
		let fields = builder.build_fields(&node);
		assert_eq!(fields.mode, FieldsMode::Remove);
		assert!(fields.fields[1].is_wildcard);
	}

	#[test]
	fn test_sort_directions_and_limit() {
		let ascending = CstNode::named("sortField")
			.with("Plus", vec![tok("+")])
			.with("fieldName", vec![n(field_name("host"))]);
		let descending = CstNode::named("sortField")
			.with("Minus", vec![tok("-")])
			.with("fieldName", vec![n(field_name("count"))]);
		let node = CstNode::named("sortCommand")
			.with("NumberLiteral", vec![tok_typed("100", "NumberLiteral")])
			.with("sortField", vec![n(ascending), n(descending)]);
		let mut builder = Builder::new();
		let sort = builder.build_sort(&node);
		assert_eq!(sort.limit, Some(100.0));
		assert_eq!(sort.fields[0].direction, SortDirection::Ascending);
		assert_eq!(sort.fields[1].direction, SortDirection::Descending);
	}

	#[test]
	fn test_dedup_with_sortby() {
		let sort_field = CstNode::named("sortField")
			.with("Minus", vec![tok("-")])
			.with("fieldName", vec![n(field_name("_time"))]);
		let node = CstNode::named("dedupCommand")
			.with("NumberLiteral", vec![tok_typed("3", "NumberLiteral")])
			.with("fieldName", vec![n(field_name("host"))])
			.with("sortByClause", vec![n(CstNode::named("sortByClause").with("sortField", vec![n(sort_field)]))]);
		let mut builder = Builder::new();
		let dedup = builder.build_dedup(&node);
		assert_eq!(dedup.count, Some(3.0));
		assert_eq!(dedup.fields[0].field_name, "host");
		assert_eq!(dedup.sort_by[0].field.field_name, "_time");
	}

	#[test]
	fn test_regex_negated() {
		let node = CstNode::named("regexCommand")
			.with("fieldName", vec![n(field_name("_raw"))])
			.with("NotEquals", vec![tok("!=")])
			.with("StringLiteral", vec![tok_typed("\"DEBUG\"", "StringLiteral")]);
		let mut builder = Builder::new();
		let built = builder.build_regex(&node);
		assert!(built.negated);
		assert_eq!(built.pattern, "DEBUG");
		assert_eq!(built.field.unwrap().field_name, "_raw");
	}

	#[test]
	fn test_head_boolean_condition() {
		let node = CstNode::named("headCommand").with("expression", vec![n(expr_field("keep_going"))]);
		let mut builder = Builder::new();
		let head = builder.build_head(&node);
		assert!(head.count.is_none());
		assert!(head.condition.is_some());
		let command = Command::Head(head);
		assert_eq!(command.consumed_fields(), vec!["keep_going"]);
	}

	#[test]
	fn test_search_command_terms() {
		let term = CstNode::named("searchTerm").with("Identifier", vec![tok("error")]);
		let node = CstNode::named("searchCommand").with(
			"searchExpression",
			vec![n(CstNode::named("searchExpression").with("searchTerm", vec![n(term)]))],
		);
		let mut builder = Builder::new();
		let search = builder.build_search_command(&node);
		assert_eq!(search.expression.terms.len(), 1);
	}
}
