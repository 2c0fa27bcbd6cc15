// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::ast::{
	AppendCommand, AppendcolsCommand, AppendpipeCommand, ForeachCommand, FormatCommand,
	JoinCommand, LocalizeCommand, MapCommand, MultisearchCommand, Pipeline, ReturnCommand,
	UnionCommand,
};
use crate::cst::{CstNode, location, normalize};

use super::Builder;

/// Pass-through commands resolve their nested pipelines by re-entering the
/// assembler; each subsearch gets an independent `Pipeline` value.
impl Builder {
	pub(crate) fn build_append(&mut self, node: &CstNode) -> AppendCommand {
		AppendCommand {
			options: self.build_options(node),
			subsearch: self.single_subsearch(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_appendcols(&mut self, node: &CstNode) -> AppendcolsCommand {
		AppendcolsCommand {
			options: self.build_options(node),
			subsearch: self.single_subsearch(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_appendpipe(&mut self, node: &CstNode) -> AppendpipeCommand {
		AppendpipeCommand {
			options: self.build_options(node),
			subsearch: self.single_subsearch(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_join(&mut self, node: &CstNode) -> JoinCommand {
		let options = self.build_options(node);
		JoinCommand {
			join_type: options.get_str("type").map(String::from),
			fields: self.field_list(node),
			options,
			subsearch: self.single_subsearch(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_union(&mut self, node: &CstNode) -> UnionCommand {
		UnionCommand {
			options: self.build_options(node),
			subsearches: self.all_subsearches(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_multisearch(&mut self, node: &CstNode) -> MultisearchCommand {
		MultisearchCommand {
			subsearches: self.all_subsearches(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_map(&mut self, node: &CstNode) -> MapCommand {
		let options = self.build_options(node);
		let search = node
			.token("StringLiteral")
			.map(|token| normalize::string_value(&token.image).to_string());
		let subsearch = node.node("subsearch").map(|child| self.build_subsearch(child));
		MapCommand {
			search,
			subsearch,
			max_searches: options.get_number("maxsearches"),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_foreach(&mut self, node: &CstNode) -> ForeachCommand {
		ForeachCommand {
			fields: self.field_list(node),
			template: node.node("subsearch").map(|child| self.build_subsearch(child)),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_return(&mut self, node: &CstNode) -> ReturnCommand {
		ReturnCommand {
			count: self.leading_count(node),
			fields: self.field_list(node),
			aliases: self.rename_pairs(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_format(&mut self, node: &CstNode) -> FormatCommand {
		let delimiters = node
			.tokens("StringLiteral")
			.iter()
			.map(|token| normalize::string_value(&token.image).to_string())
			.collect();
		FormatCommand {
			options: self.build_options(node),
			delimiters,
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_localize(&mut self, node: &CstNode) -> LocalizeCommand {
		LocalizeCommand {
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	fn single_subsearch(&mut self, node: &CstNode) -> Pipeline {
		match node.node("subsearch") {
			Some(child) => self.build_subsearch(child),
			None => Pipeline::empty(location::aggregate(node)),
		}
	}

	fn all_subsearches(&mut self, node: &CstNode) -> Vec<Pipeline> {
		let mut pipelines = Vec::new();
		for child in node.nodes("subsearch") {
			pipelines.push(self.build_subsearch(child));
		}
		pipelines
	}
}

#[cfg(test)]
pub mod tests {
	use crate::ast::PipelineStage;
	use crate::build::Builder;
	use crate::build::support::*;
	use crate::cst::CstNode;

	fn stats_count_pipeline() -> CstNode {
		let agg = CstNode::named("aggregation").with("function", vec![tok("count")]);
		let stats = CstNode::named("statsCommand").with("aggregation", vec![n(agg)]);
		CstNode::named("pipeline").with("command", vec![n(command("statsCommand", stats))])
	}

	fn search_pipeline(terms: Vec<CstNode>) -> CstNode {
		CstNode::named("pipeline").with(
			"searchExpression",
			vec![n(CstNode::named("searchExpression").with("searchTerm", terms.into_iter().map(n).collect()))],
		)
	}

	#[test]
	fn test_join_fields_and_subsearch() {
		let (names, values) = options(&[("type", "left", "Identifier")]);
		let node = CstNode::named("joinCommand")
			.with("fieldName", vec![n(field_name("host"))])
			.with("optionName", names)
			.with("optionValue", values)
			.with("subsearch", vec![n(subsearch(stats_count_pipeline()))]);
		let mut builder = Builder::new();
		let join = builder.build_join(&node);
		assert_eq!(join.join_type.as_deref(), Some("left"));
		assert_eq!(join.fields[0].field_name, "host");
		assert_eq!(join.subsearch.len(), 1);
	}

	#[test]
	fn test_join_missing_subsearch_degrades_empty() {
		let mut builder = Builder::new();
		let join = builder.build_join(&CstNode::named("joinCommand"));
		assert!(join.subsearch.is_empty());
	}

	#[test]
	fn test_union_multiple_subsearches() {
		let node = CstNode::named("unionCommand").with(
			"subsearch",
			vec![
				n(subsearch(stats_count_pipeline())),
				n(subsearch(search_pipeline(vec![
					CstNode::named("searchTerm").with("Identifier", vec![tok("error")]),
				]))),
			],
		);
		let mut builder = Builder::new();
		let union = builder.build_union(&node);
		assert_eq!(union.subsearches.len(), 2);
		assert!(matches!(union.subsearches[1].stages[0], PipelineStage::Search(_)));
	}

	#[test]
	fn test_subsearches_are_independent_values() {
		let node = CstNode::named("unionCommand").with(
			"subsearch",
			vec![n(subsearch(stats_count_pipeline())), n(subsearch(stats_count_pipeline()))],
		);
		let mut builder = Builder::new();
		let union = builder.build_union(&node);
		// equal content, distinct values: mutating one clone never touches
		// the other
		assert_eq!(union.subsearches[0], union.subsearches[1]);
		let mut first = union.subsearches[0].clone();
		first.stages.clear();
		assert_ne!(first, union.subsearches[1]);
	}

	#[test]
	fn test_map_quoted_search() {
		let node = CstNode::named("mapCommand")
			.with("StringLiteral", vec![tok_typed("\"search index=$idx$\"", "StringLiteral")]);
		let mut builder = Builder::new();
		let map = builder.build_map(&node);
		assert_eq!(map.search.as_deref(), Some("search index=$idx$"));
		assert!(map.subsearch.is_none());
	}

	#[test]
	fn test_foreach_wildcard_templates() {
		let node = CstNode::named("foreachCommand")
			.with("fieldName", vec![n(wildcard_field("count_*"))])
			.with("subsearch", vec![n(subsearch(stats_count_pipeline()))]);
		let mut builder = Builder::new();
		let foreach = builder.build_foreach(&node);
		assert!(foreach.fields[0].is_wildcard);
		assert!(foreach.template.is_some());
	}

	#[test]
	fn test_format_delimiters() {
		let node = CstNode::named("formatCommand").with(
			"StringLiteral",
			vec![tok_typed("\"(\"", "StringLiteral"), tok_typed("\")\"", "StringLiteral")],
		);
		let mut builder = Builder::new();
		let format = builder.build_format(&node);
		assert_eq!(format.delimiters, vec!["(", ")"]);
	}
}
