// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod aggregators;
mod creators;
mod expression;
mod extraction;
mod field;
mod filters;
mod options;
mod search;
mod structural;

use fieldline_type::SourceLocation;
use once_cell::sync::Lazy;
use tracing::instrument;

use crate::ast::{Command, GenericCommand, Pipeline, PipelineStage};
use crate::cst::{CstElement, CstNode, location, normalize};
use crate::error::{ParseWarning, WarningKind};

/// Hard limit on expression and subsearch nesting. Past this the builder
/// emits a warning and degrades instead of risking stack exhaustion.
pub const MAX_DEPTH: usize = 128;

/// The result of one build: the AST plus every spot where the transformer
/// degraded.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutput {
	pub pipeline: Pipeline,
	pub warnings: Vec<ParseWarning>,
}

/// Build the AST for a top-level `pipeline` CST node.
#[instrument(level = "debug", skip_all)]
pub fn build_pipeline(root: &CstNode) -> BuildOutput {
	let mut builder = Builder::new();
	let pipeline = builder.build_pipeline_node(root);
	BuildOutput {
		pipeline,
		warnings: builder.warnings,
	}
}

/// Deserialize a CST shipped as JSON by the external grammar and build it.
///
/// Malformed JSON is the only hard failure; a structurally odd but
/// deserializable CST still degrades per the usual policy.
#[instrument(level = "debug", skip_all)]
pub fn parse_json(input: &str) -> Result<BuildOutput, serde_json::Error> {
	let root: CstNode = serde_json::from_str(input)?;
	Ok(build_pipeline(&root))
}

/// Which command grammar rule is present on a `command` node, computed once
/// per node so the per-command builders can be dispatched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandRule {
	Eval,
	Fieldformat,
	Strcat,
	Accum,
	Delta,
	Addtotals,
	Fillnull,
	Filldown,
	Makemv,
	Mvcombine,
	Mvexpand,
	Nomv,
	Convert,
	Replace,
	Rangemap,
	Iplocation,
	Addinfo,
	Transaction,
	Makeresults,
	Gentimes,
	Typer,
	Reltime,
	Concurrency,
	Stats,
	Eventstats,
	Streamstats,
	Chart,
	Timechart,
	Tstats,
	Mstats,
	Geostats,
	Sistats,
	Sichart,
	Sitimechart,
	Top,
	Rare,
	Timewrap,
	Untable,
	Xyseries,
	Where,
	Search,
	Regex,
	Dedup,
	Fields,
	Table,
	Sort,
	Head,
	Tail,
	Uniq,
	Reverse,
	Append,
	Appendcols,
	Appendpipe,
	Join,
	Union,
	Multisearch,
	Map,
	Foreach,
	Return,
	Format,
	Localize,
	Lookup,
	Inputlookup,
	Outputlookup,
	Inputcsv,
	Outputcsv,
	Collect,
	Rex,
	Erex,
	Extract,
	Multikv,
	Xmlkv,
	Spath,
	Bin,
	Rename,
}

/// Every dispatchable CST child key, aliases included.
pub(crate) const COMMAND_KEYS: &[&str] = &[
	"evalCommand",
	"fieldformatCommand",
	"strcatCommand",
	"accumCommand",
	"deltaCommand",
	"addtotalsCommand",
	"fillnullCommand",
	"filldownCommand",
	"makemvCommand",
	"mvcombineCommand",
	"mvexpandCommand",
	"nomvCommand",
	"convertCommand",
	"replaceCommand",
	"rangemapCommand",
	"iplocationCommand",
	"addinfoCommand",
	"transactionCommand",
	"makeresultsCommand",
	"gentimesCommand",
	"typerCommand",
	"reltimeCommand",
	"concurrencyCommand",
	"statsCommand",
	"eventstatsCommand",
	"streamstatsCommand",
	"chartCommand",
	"timechartCommand",
	"tstatsCommand",
	"mstatsCommand",
	"geostatsCommand",
	"sistatsCommand",
	"sichartCommand",
	"sitimechartCommand",
	"topCommand",
	"rareCommand",
	"timewrapCommand",
	"untableCommand",
	"xyseriesCommand",
	"whereCommand",
	"searchCommand",
	"regexCommand",
	"dedupCommand",
	"fieldsCommand",
	"tableCommand",
	"sortCommand",
	"headCommand",
	"tailCommand",
	"uniqCommand",
	"reverseCommand",
	"appendCommand",
	"appendcolsCommand",
	"appendpipeCommand",
	"joinCommand",
	"unionCommand",
	"multisearchCommand",
	"mapCommand",
	"foreachCommand",
	"returnCommand",
	"formatCommand",
	"localizeCommand",
	"lookupCommand",
	"inputlookupCommand",
	"outputlookupCommand",
	"inputcsvCommand",
	"outputcsvCommand",
	"collectCommand",
	"rexCommand",
	"erexCommand",
	"extractCommand",
	"kvCommand",
	"multikvCommand",
	"xmlkvCommand",
	"spathCommand",
	"binCommand",
	"bucketCommand",
	"renameCommand",
];

impl CommandRule {
	pub(crate) fn from_key(key: &str) -> Option<Self> {
		use CommandRule::*;
		match key {
			"evalCommand" => Some(Eval),
			"fieldformatCommand" => Some(Fieldformat),
			"strcatCommand" => Some(Strcat),
			"accumCommand" => Some(Accum),
			"deltaCommand" => Some(Delta),
			"addtotalsCommand" => Some(Addtotals),
			"fillnullCommand" => Some(Fillnull),
			"filldownCommand" => Some(Filldown),
			"makemvCommand" => Some(Makemv),
			"mvcombineCommand" => Some(Mvcombine),
			"mvexpandCommand" => Some(Mvexpand),
			"nomvCommand" => Some(Nomv),
			"convertCommand" => Some(Convert),
			"replaceCommand" => Some(Replace),
			"rangemapCommand" => Some(Rangemap),
			"iplocationCommand" => Some(Iplocation),
			"addinfoCommand" => Some(Addinfo),
			"transactionCommand" => Some(Transaction),
			"makeresultsCommand" => Some(Makeresults),
			"gentimesCommand" => Some(Gentimes),
			"typerCommand" => Some(Typer),
			"reltimeCommand" => Some(Reltime),
			"concurrencyCommand" => Some(Concurrency),
			"statsCommand" => Some(Stats),
			"eventstatsCommand" => Some(Eventstats),
			"streamstatsCommand" => Some(Streamstats),
			"chartCommand" => Some(Chart),
			"timechartCommand" => Some(Timechart),
			"tstatsCommand" => Some(Tstats),
			"mstatsCommand" => Some(Mstats),
			"geostatsCommand" => Some(Geostats),
			"sistatsCommand" => Some(Sistats),
			"sichartCommand" => Some(Sichart),
			"sitimechartCommand" => Some(Sitimechart),
			"topCommand" => Some(Top),
			"rareCommand" => Some(Rare),
			"timewrapCommand" => Some(Timewrap),
			"untableCommand" => Some(Untable),
			"xyseriesCommand" => Some(Xyseries),
			"whereCommand" => Some(Where),
			"searchCommand" => Some(Search),
			"regexCommand" => Some(Regex),
			"dedupCommand" => Some(Dedup),
			"fieldsCommand" => Some(Fields),
			"tableCommand" => Some(Table),
			"sortCommand" => Some(Sort),
			"headCommand" => Some(Head),
			"tailCommand" => Some(Tail),
			"uniqCommand" => Some(Uniq),
			"reverseCommand" => Some(Reverse),
			"appendCommand" => Some(Append),
			"appendcolsCommand" => Some(Appendcols),
			"appendpipeCommand" => Some(Appendpipe),
			"joinCommand" => Some(Join),
			"unionCommand" => Some(Union),
			"multisearchCommand" => Some(Multisearch),
			"mapCommand" => Some(Map),
			"foreachCommand" => Some(Foreach),
			"returnCommand" => Some(Return),
			"formatCommand" => Some(Format),
			"localizeCommand" => Some(Localize),
			"lookupCommand" => Some(Lookup),
			"inputlookupCommand" => Some(Inputlookup),
			"outputlookupCommand" => Some(Outputlookup),
			"inputcsvCommand" => Some(Inputcsv),
			"outputcsvCommand" => Some(Outputcsv),
			"collectCommand" => Some(Collect),
			"rexCommand" => Some(Rex),
			"erexCommand" => Some(Erex),
			"extractCommand" | "kvCommand" => Some(Extract),
			"multikvCommand" => Some(Multikv),
			"xmlkvCommand" => Some(Xmlkv),
			"spathCommand" => Some(Spath),
			"binCommand" | "bucketCommand" => Some(Bin),
			"renameCommand" => Some(Rename),
			_ => None,
		}
	}

	/// Find the command rule present on a `command` node. First matching
	/// key wins; a key whose rule node is missing still dispatches, against
	/// an empty node.
	pub(crate) fn detect(node: &CstNode) -> Option<(Self, &CstNode)> {
		static EMPTY: Lazy<CstNode> = Lazy::new(CstNode::default);
		for key in node.children.keys() {
			if let Some(rule) = Self::from_key(key) {
				return Some((rule, node.node(key).unwrap_or(&EMPTY)));
			}
		}
		None
	}
}

/// Walks the CST and accumulates warnings; one instance per build.
pub(crate) struct Builder {
	pub(crate) warnings: Vec<ParseWarning>,
	pub(crate) depth: usize,
}

impl Builder {
	pub(crate) fn new() -> Self {
		Self {
			warnings: Vec::new(),
			depth: 0,
		}
	}

	pub(crate) fn warn(&mut self, kind: WarningKind, location: SourceLocation) {
		tracing::debug!(warning = %kind, %location, "degraded while building AST");
		self.warnings.push(ParseWarning::new(kind, location));
	}

	pub(crate) fn build_pipeline_node(&mut self, node: &CstNode) -> Pipeline {
		let mut stages = Vec::new();
		if let Some(search) = node.node("searchExpression") {
			stages.push(PipelineStage::Search(self.build_search_expression(search)));
		}
		for command in node.nodes("command") {
			stages.push(PipelineStage::Command(self.build_command(command)));
		}
		Pipeline {
			stages,
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_command(&mut self, node: &CstNode) -> Command {
		match CommandRule::detect(node) {
			Some((rule, inner)) => self.dispatch(rule, inner),
			None => self.build_generic(node),
		}
	}

	fn dispatch(&mut self, rule: CommandRule, node: &CstNode) -> Command {
		use crate::ast::StatsVariant;

		match rule {
			CommandRule::Eval => Command::Eval(self.build_eval(node)),
			CommandRule::Fieldformat => Command::Fieldformat(self.build_fieldformat(node)),
			CommandRule::Strcat => Command::Strcat(self.build_strcat(node)),
			CommandRule::Accum => Command::Accum(self.build_accum(node)),
			CommandRule::Delta => Command::Delta(self.build_delta(node)),
			CommandRule::Addtotals => Command::Addtotals(self.build_addtotals(node)),
			CommandRule::Fillnull => Command::Fillnull(self.build_fillnull(node)),
			CommandRule::Filldown => Command::Filldown(self.build_filldown(node)),
			CommandRule::Makemv => Command::Makemv(self.build_makemv(node)),
			CommandRule::Mvcombine => Command::Mvcombine(self.build_mvcombine(node)),
			CommandRule::Mvexpand => Command::Mvexpand(self.build_mvexpand(node)),
			CommandRule::Nomv => Command::Nomv(self.build_nomv(node)),
			CommandRule::Convert => Command::Convert(self.build_convert(node)),
			CommandRule::Replace => Command::Replace(self.build_replace(node)),
			CommandRule::Rangemap => Command::Rangemap(self.build_rangemap(node)),
			CommandRule::Iplocation => Command::Iplocation(self.build_iplocation(node)),
			CommandRule::Addinfo => Command::Addinfo(self.build_addinfo(node)),
			CommandRule::Transaction => Command::Transaction(self.build_transaction(node)),
			CommandRule::Makeresults => Command::Makeresults(self.build_makeresults(node)),
			CommandRule::Gentimes => Command::Gentimes(self.build_gentimes(node)),
			CommandRule::Typer => Command::Typer(self.build_typer(node)),
			CommandRule::Reltime => Command::Reltime(self.build_reltime(node)),
			CommandRule::Concurrency => Command::Concurrency(self.build_concurrency(node)),
			CommandRule::Stats => Command::Stats(self.build_stats(node, StatsVariant::Stats)),
			CommandRule::Eventstats => {
				Command::Stats(self.build_stats(node, StatsVariant::Eventstats))
			}
			CommandRule::Streamstats => {
				Command::Stats(self.build_stats(node, StatsVariant::Streamstats))
			}
			CommandRule::Chart => Command::Stats(self.build_stats(node, StatsVariant::Chart)),
			CommandRule::Timechart => {
				Command::Stats(self.build_stats(node, StatsVariant::Timechart))
			}
			CommandRule::Tstats => Command::Tstats(self.build_tstats(node)),
			CommandRule::Mstats => Command::Mstats(self.build_mstats(node)),
			CommandRule::Geostats => Command::Geostats(self.build_geostats(node)),
			CommandRule::Sistats => Command::Sistats(self.build_sistats(node)),
			CommandRule::Sichart => Command::Sichart(self.build_sichart(node)),
			CommandRule::Sitimechart => Command::Sitimechart(self.build_sitimechart(node)),
			CommandRule::Top => Command::Top(self.build_top(node)),
			CommandRule::Rare => Command::Rare(self.build_rare(node)),
			CommandRule::Timewrap => Command::Timewrap(self.build_timewrap(node)),
			CommandRule::Untable => Command::Untable(self.build_untable(node)),
			CommandRule::Xyseries => Command::Xyseries(self.build_xyseries(node)),
			CommandRule::Where => Command::Where(self.build_where(node)),
			CommandRule::Search => Command::Search(self.build_search_command(node)),
			CommandRule::Regex => Command::Regex(self.build_regex(node)),
			CommandRule::Dedup => Command::Dedup(self.build_dedup(node)),
			CommandRule::Fields => Command::Fields(self.build_fields(node)),
			CommandRule::Table => Command::Table(self.build_table(node)),
			CommandRule::Sort => Command::Sort(self.build_sort(node)),
			CommandRule::Head => Command::Head(self.build_head(node)),
			CommandRule::Tail => Command::Tail(self.build_tail(node)),
			CommandRule::Uniq => Command::Uniq(self.build_uniq(node)),
			CommandRule::Reverse => Command::Reverse(self.build_reverse(node)),
			CommandRule::Append => Command::Append(self.build_append(node)),
			CommandRule::Appendcols => Command::Appendcols(self.build_appendcols(node)),
			CommandRule::Appendpipe => Command::Appendpipe(self.build_appendpipe(node)),
			CommandRule::Join => Command::Join(self.build_join(node)),
			CommandRule::Union => Command::Union(self.build_union(node)),
			CommandRule::Multisearch => Command::Multisearch(self.build_multisearch(node)),
			CommandRule::Map => Command::Map(self.build_map(node)),
			CommandRule::Foreach => Command::Foreach(self.build_foreach(node)),
			CommandRule::Return => Command::Return(self.build_return(node)),
			CommandRule::Format => Command::Format(self.build_format(node)),
			CommandRule::Localize => Command::Localize(self.build_localize(node)),
			CommandRule::Lookup => Command::Lookup(self.build_lookup(node)),
			CommandRule::Inputlookup => Command::Inputlookup(self.build_inputlookup(node)),
			CommandRule::Outputlookup => Command::Outputlookup(self.build_outputlookup(node)),
			CommandRule::Inputcsv => Command::Inputcsv(self.build_inputcsv(node)),
			CommandRule::Outputcsv => Command::Outputcsv(self.build_outputcsv(node)),
			CommandRule::Collect => Command::Collect(self.build_collect(node)),
			CommandRule::Rex => Command::Rex(self.build_rex(node)),
			CommandRule::Erex => Command::Erex(self.build_erex(node)),
			CommandRule::Extract => Command::Extract(self.build_extract(node)),
			CommandRule::Multikv => Command::Multikv(self.build_multikv(node)),
			CommandRule::Xmlkv => Command::Xmlkv(self.build_xmlkv(node)),
			CommandRule::Spath => Command::Spath(self.build_spath(node)),
			CommandRule::Bin => Command::Bin(self.build_bin(node)),
			CommandRule::Rename => Command::Rename(self.build_rename(node)),
		}
	}

	/// A subsearch node wraps an `inner` pipeline; each subsearch gets its
	/// own independent `Pipeline` value.
	pub(crate) fn build_subsearch(&mut self, node: &CstNode) -> Pipeline {
		let location = location::aggregate(node);
		if self.depth >= MAX_DEPTH {
			self.warn(
				WarningKind::SubsearchTooDeep {
					limit: MAX_DEPTH,
				},
				location,
			);
			return Pipeline::empty(location);
		}
		self.depth += 1;
		let pipeline = match node.node("inner") {
			Some(inner) => self.build_pipeline_node(inner),
			None => Pipeline::empty(location),
		};
		self.depth -= 1;
		pipeline
	}

	fn build_generic(&mut self, node: &CstNode) -> Command {
		let location = location::aggregate(node);
		let (name, scope) = match node.node("genericCommand") {
			Some(inner) => (normalize::token_image(inner, "commandName"), inner),
			None => {
				let name = node
					.children
					.keys()
					.find(|key| key.ends_with("Command"))
					.map(|key| key.trim_end_matches("Command").to_string())
					.unwrap_or_default();
				(name, node)
			}
		};
		self.warn(
			WarningKind::UnknownCommand {
				name: name.clone(),
			},
			location,
		);
		let mut subsearches = Vec::new();
		self.collect_subsearches(scope, &mut subsearches);
		Command::Generic(GenericCommand {
			name,
			subsearches,
			location,
		})
	}

	fn collect_subsearches(&mut self, node: &CstNode, out: &mut Vec<Pipeline>) {
		for (key, elements) in &node.children {
			for element in elements {
				if let CstElement::Node(child) = element {
					if key == "subsearch" {
						out.push(self.build_subsearch(child));
					} else {
						self.collect_subsearches(child, out);
					}
				}
			}
		}
	}
}


#[cfg(test)]
pub mod tests {
	use super::support::*;
	use super::*;

	#[test]
	fn test_dispatch_covers_every_command_key() {
		for key in COMMAND_KEYS {
			assert!(
				CommandRule::from_key(key).is_some(),
				"key '{}' must dispatch",
				key
			);
		}
	}

	#[test]
	fn test_every_command_key_builds_without_falling_through() {
		// An empty rule node must still produce the correctly-tagged
		// variant, never the generic fallback and never a panic.
		for key in COMMAND_KEYS {
			let node = command(key, CstNode::default());
			let mut builder = Builder::new();
			let built = builder.build_command(&node);
			assert!(
				!built.is_generic(),
				"key '{}' fell through to GenericCommand",
				key
			);
		}
	}

	#[test]
	fn test_unknown_command_falls_back_to_generic() {
		let node = command("frobnicateCommand", CstNode::default());
		let mut builder = Builder::new();
		let built = builder.build_command(&node);
		assert!(built.is_generic());
		assert_eq!(built.as_generic().name, "frobnicate");
		assert!(matches!(builder.warnings[0].kind, WarningKind::UnknownCommand { .. }));
	}

	#[test]
	fn test_generic_command_rule_carries_name_and_subsearch() {
		let generic = CstNode::named("genericCommand")
			.with("commandName", vec![tok("sendemail")])
			.with("subsearch", vec![n(subsearch(CstNode::named("pipeline")))]);
		let node = CstNode::named("command").with("genericCommand", vec![n(generic)]);
		let mut builder = Builder::new();
		let built = builder.build_command(&node);
		let generic = built.as_generic();
		assert_eq!(generic.name, "sendemail");
		assert_eq!(generic.subsearches.len(), 1);
	}

	#[test]
	fn test_empty_pipeline_is_legal() {
		let output = build_pipeline(&CstNode::named("pipeline"));
		assert!(output.pipeline.is_empty());
		assert!(output.warnings.is_empty());
	}

	#[test]
	fn test_subsearch_missing_inner_degrades() {
		let mut builder = Builder::new();
		let pipeline = builder.build_subsearch(&CstNode::named("subsearch"));
		assert!(pipeline.is_empty());
	}

	#[test]
	fn test_subsearch_depth_guard() {
		// Build a chain deeper than the limit: subsearch > pipeline >
		// command > append > subsearch > ...
		let mut node = subsearch(CstNode::named("pipeline"));
		for _ in 0..(MAX_DEPTH + 8) {
			let append = CstNode::named("appendCommand").with("subsearch", vec![n(node)]);
			let pipeline = CstNode::named("pipeline")
				.with("command", vec![n(CstNode::named("command").with("appendCommand", vec![n(append)]))]);
			node = subsearch(pipeline);
		}
		let mut builder = Builder::new();
		let _ = builder.build_subsearch(&node);
		assert!(builder
			.warnings
			.iter()
			.any(|w| matches!(w.kind, WarningKind::SubsearchTooDeep { .. })));
	}

	#[test]
	fn test_parse_json_round_trip() {
		let input = r#"{
			"name": "pipeline",
			"children": {
				"command": [{
					"name": "command",
					"children": {
						"tableCommand": [{
							"name": "tableCommand",
							"children": {
								"fieldName": [{
									"name": "fieldName",
									"children": {
										"Identifier": [{"image": "host"}]
									}
								}]
							}
						}]
					}
				}]
			}
		}"#;
		let output = parse_json(input).unwrap();
		assert_eq!(output.pipeline.len(), 1);
	}
}
