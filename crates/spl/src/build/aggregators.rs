// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::ast::{
	Aggregation, FieldReference, GeostatsCommand, MstatsCommand, RareCommand, SichartCommand,
	SistatsCommand, SitimechartCommand, StatsCommand, StatsVariant, TimewrapCommand, TopCommand,
	TstatsCommand, UntableCommand, XyseriesCommand,
};
use crate::cst::{CstNode, location, normalize};
use crate::error::WarningKind;

use super::Builder;

impl Builder {
	/// One builder covers the whole stats family; the variants differ only
	/// in their tag.
	pub(crate) fn build_stats(&mut self, node: &CstNode, variant: StatsVariant) -> StatsCommand {
		StatsCommand {
			variant,
			aggregations: self.build_aggregations(node),
			by_fields: self.build_by_fields(node),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_tstats(&mut self, node: &CstNode) -> TstatsCommand {
		TstatsCommand {
			aggregations: self.build_aggregations(node),
			by_fields: self.build_by_fields(node),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_mstats(&mut self, node: &CstNode) -> MstatsCommand {
		MstatsCommand {
			aggregations: self.build_aggregations(node),
			by_fields: self.build_by_fields(node),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_geostats(&mut self, node: &CstNode) -> GeostatsCommand {
		GeostatsCommand {
			aggregations: self.build_aggregations(node),
			by_fields: self.build_by_fields(node),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_sistats(&mut self, node: &CstNode) -> SistatsCommand {
		SistatsCommand {
			aggregations: self.build_aggregations(node),
			by_fields: self.build_by_fields(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_sichart(&mut self, node: &CstNode) -> SichartCommand {
		SichartCommand {
			aggregations: self.build_aggregations(node),
			by_fields: self.build_by_fields(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_sitimechart(&mut self, node: &CstNode) -> SitimechartCommand {
		SitimechartCommand {
			aggregations: self.build_aggregations(node),
			by_fields: self.build_by_fields(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_top(&mut self, node: &CstNode) -> TopCommand {
		TopCommand {
			limit: self.leading_count(node),
			fields: self.field_list(node),
			by_fields: self.build_by_fields(node),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_rare(&mut self, node: &CstNode) -> RareCommand {
		RareCommand {
			limit: self.leading_count(node),
			fields: self.field_list(node),
			by_fields: self.build_by_fields(node),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_timewrap(&mut self, node: &CstNode) -> TimewrapCommand {
		TimewrapCommand {
			span: node.token("span").map(|token| token.image.clone()),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_untable(&mut self, node: &CstNode) -> UntableCommand {
		let (x_field, y_field, value_field) = self.three_fields(node);
		UntableCommand {
			x_field,
			y_field,
			value_field,
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_xyseries(&mut self, node: &CstNode) -> XyseriesCommand {
		let (x_field, y_field, value_field) = self.three_fields(node);
		XyseriesCommand {
			x_field,
			y_field,
			value_field,
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_aggregations(&mut self, node: &CstNode) -> Vec<Aggregation> {
		let mut aggregations = Vec::new();
		for aggregation in node.nodes("aggregation") {
			aggregations.push(self.build_aggregation(aggregation));
		}
		aggregations
	}

	fn build_aggregation(&mut self, node: &CstNode) -> Aggregation {
		let function = normalize::token_image(node, "function");
		let field = node.node("fieldName").map(|child| self.resolve_field(child));
		let alias = self.field_under(node, "alias").map(|alias| alias.field_name);
		Aggregation::new(function, field, alias, location::aggregate(node))
	}

	pub(crate) fn build_by_fields(&mut self, node: &CstNode) -> Vec<FieldReference> {
		match node.node("byClause") {
			Some(clause) => self.field_list(clause),
			None => Vec::new(),
		}
	}

	/// A bare leading count (`top 5 host`). An unparsable count degrades to
	/// absent with a warning.
	pub(crate) fn leading_count(&mut self, node: &CstNode) -> Option<f64> {
		let token = node.token("NumberLiteral")?;
		match normalize::parse_number(&token.image) {
			Some(value) => Some(value),
			None => {
				self.warn(
					WarningKind::InvalidNumber {
						text: token.image.clone(),
					},
					token.location(),
				);
				None
			}
		}
	}

	fn three_fields(
		&mut self,
		node: &CstNode,
	) -> (Option<FieldReference>, Option<FieldReference>, Option<FieldReference>) {
		let mut fields = self.field_list(node).into_iter();
		(fields.next(), fields.next(), fields.next())
	}
}

#[cfg(test)]
pub mod tests {
	use crate::ast::{Command, StatsVariant};
	use crate::build::Builder;
	use crate::build::support::*;
	use crate::cst::CstNode;

	pub fn aggregation(function: &str, field: Option<&str>, alias: Option<&str>) -> CstNode {
		let mut node = CstNode::named("aggregation").with("function", vec![tok(function)]);
		if let Some(field) = field {
			node = node.with("fieldName", vec![n(field_name(field))]);
		}
		if let Some(alias) = alias {
			node = node.with(
				"alias",
				vec![n(CstNode::named("alias").with("fieldName", vec![n(field_name(alias))]))],
			);
		}
		node
	}

	pub fn by_clause(fields: &[&str]) -> CstNode {
		CstNode::named("byClause").with("fieldName", fields.iter().map(|f| n(field_name(f))).collect())
	}

	#[test]
	fn test_stats_count_output_field() {
		let node = CstNode::named("statsCommand").with("aggregation", vec![n(aggregation("count", None, None))]);
		let mut builder = Builder::new();
		let stats = builder.build_stats(&node, StatsVariant::Stats);
		assert_eq!(stats.aggregations[0].output_field, "count");
	}

	#[test]
	fn test_stats_sum_output_field() {
		let node = CstNode::named("statsCommand")
			.with("aggregation", vec![n(aggregation("sum", Some("bytes"), None))]);
		let mut builder = Builder::new();
		let stats = builder.build_stats(&node, StatsVariant::Stats);
		assert_eq!(stats.aggregations[0].output_field, "sum(bytes)");
	}

	#[test]
	fn test_stats_alias_output_field() {
		let node = CstNode::named("statsCommand")
			.with("aggregation", vec![n(aggregation("sum", Some("bytes"), Some("total")))]);
		let mut builder = Builder::new();
		let stats = builder.build_stats(&node, StatsVariant::Stats);
		assert_eq!(stats.aggregations[0].output_field, "total");
		assert_eq!(stats.aggregations[0].alias.as_deref(), Some("total"));
	}

	#[test]
	fn test_stats_by_fields() {
		let node = CstNode::named("statsCommand")
			.with("aggregation", vec![n(aggregation("count", None, None))])
			.with("byClause", vec![n(by_clause(&["host", "sourcetype"]))]);
		let mut builder = Builder::new();
		let stats = builder.build_stats(&node, StatsVariant::Timechart);
		assert_eq!(stats.variant, StatsVariant::Timechart);
		assert_eq!(stats.by_fields.len(), 2);
		assert_eq!(stats.by_fields[1].field_name, "sourcetype");
	}

	#[test]
	fn test_tstats_same_shape() {
		let node = CstNode::named("tstatsCommand")
			.with("aggregation", vec![n(aggregation("count", None, None))])
			.with("byClause", vec![n(by_clause(&["index"]))]);
		let mut builder = Builder::new();
		let tstats = builder.build_tstats(&node);
		assert_eq!(tstats.aggregations.len(), 1);
		assert_eq!(tstats.by_fields[0].field_name, "index");
	}

	#[test]
	fn test_top_limit_and_created_fields() {
		let node = CstNode::named("topCommand")
			.with("NumberLiteral", vec![tok_typed("5", "NumberLiteral")])
			.with("fieldName", vec![n(field_name("host"))]);
		let mut builder = Builder::new();
		let top = builder.build_top(&node);
		assert_eq!(top.limit, Some(5.0));
		let command = Command::Top(top);
		assert_eq!(command.created_fields(), vec!["count", "percent"]);
	}

	#[test]
	fn test_untable_positional_fields() {
		let node = CstNode::named("untableCommand").with(
			"fieldName",
			vec![n(field_name("_time")), n(field_name("series")), n(field_name("value"))],
		);
		let mut builder = Builder::new();
		let untable = builder.build_untable(&node);
		assert_eq!(untable.x_field.unwrap().field_name, "_time");
		assert_eq!(untable.y_field.unwrap().field_name, "series");
		assert_eq!(untable.value_field.unwrap().field_name, "value");
	}

	#[test]
	fn test_aggregation_wildcard_field() {
		let agg = CstNode::named("aggregation")
			.with("function", vec![tok("avg")])
			.with("fieldName", vec![n(wildcard_field("resp_*"))]);
		let node = CstNode::named("sistatsCommand").with("aggregation", vec![n(agg)]);
		let mut builder = Builder::new();
		let sistats = builder.build_sistats(&node);
		assert!(sistats.aggregations[0].field.as_ref().unwrap().is_wildcard);
		// wildcard aggregations are not concrete dependencies
		let command = Command::Sistats(sistats);
		assert!(command.consumed_fields().is_empty());
	}
}
