// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use fieldline_type::SourceLocation;
use serde::Serialize;

use crate::ast::{Aggregation, Expression, FieldReference, SearchExpression};
use crate::lineage;

/// An SPL pipeline: the ordered stages of one search statement.
///
/// Subsearch-bearing commands own nested pipelines exclusively; ownership is
/// a tree, never shared, and dropping the root drops the whole AST.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
	pub stages: Vec<PipelineStage>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PipelineStage {
	Search(SearchExpression),
	Command(Command),
}

impl Pipeline {
	pub fn empty(location: SourceLocation) -> Self {
		Self {
			stages: Vec::new(),
			location,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.stages.is_empty()
	}

	pub fn len(&self) -> usize {
		self.stages.len()
	}

	/// Every concrete field name any stage consumes, in first-appearance
	/// order across the pipeline (subsearches excluded — they have their
	/// own field namespace).
	pub fn referenced_fields(&self) -> Vec<String> {
		let mut fields = Vec::new();
		for stage in &self.stages {
			let stage_fields = match stage {
				PipelineStage::Search(search) => search.referenced_fields.clone(),
				PipelineStage::Command(command) => command.consumed_fields(),
			};
			for field in stage_fields {
				if !fields.contains(&field) {
					fields.push(field);
				}
			}
		}
		fields
	}
}

/// The value of a command option, classified from the lexer token type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
	String(String),
	Number(f64),
	Boolean(bool),
}

impl OptionValue {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			OptionValue::String(value) => Some(value),
			_ => None,
		}
	}

	pub fn as_number(&self) -> Option<f64> {
		match self {
			OptionValue::Number(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			OptionValue::Boolean(value) => Some(*value),
			_ => None,
		}
	}
}

impl Display for OptionValue {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			OptionValue::String(value) => f.write_str(value),
			OptionValue::Number(value) => write!(f, "{}", value),
			OptionValue::Boolean(value) => write!(f, "{}", value),
		}
	}
}

/// Name→value map of a command's `key=value` options. Names are stored
/// lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CommandOptions {
	values: BTreeMap<String, OptionValue>,
}

impl CommandOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, name: impl Into<String>, value: OptionValue) {
		self.values.insert(name.into().to_lowercase(), value);
	}

	pub fn get(&self, name: &str) -> Option<&OptionValue> {
		self.values.get(name)
	}

	pub fn get_str(&self, name: &str) -> Option<&str> {
		self.values.get(name).and_then(OptionValue::as_str)
	}

	pub fn get_number(&self, name: &str) -> Option<f64> {
		self.values.get(name).and_then(OptionValue::as_number)
	}

	pub fn get_bool(&self, name: &str) -> Option<bool> {
		self.values.get(name).and_then(OptionValue::as_bool)
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
		self.values.iter()
	}
}

// === field creators ===

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalAssignment {
	pub field: FieldReference,
	pub expression: Expression,
	pub depends_on: Vec<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalCommand {
	pub assignments: Vec<EvalAssignment>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldformatCommand {
	pub field: FieldReference,
	pub expression: Expression,
	pub depends_on: Vec<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum StrcatPart {
	Field(FieldReference),
	Literal(StrcatLiteral),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrcatLiteral {
	pub value: String,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrcatCommand {
	pub parts: Vec<StrcatPart>,
	pub dest_field: Option<FieldReference>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumCommand {
	pub field: FieldReference,
	pub alias: Option<FieldReference>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaCommand {
	pub field: FieldReference,
	pub alias: Option<FieldReference>,
	pub p: Option<f64>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddtotalsCommand {
	pub fields: Vec<FieldReference>,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillnullCommand {
	pub value: Option<String>,
	pub fields: Vec<FieldReference>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilldownCommand {
	pub fields: Vec<FieldReference>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MakemvCommand {
	pub field: FieldReference,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MvcombineCommand {
	pub field: FieldReference,
	pub delim: Option<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MvexpandCommand {
	pub field: FieldReference,
	pub limit: Option<f64>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NomvCommand {
	pub field: FieldReference,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
	pub function: String,
	pub field: FieldReference,
	pub alias: Option<FieldReference>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertCommand {
	pub conversions: Vec<Conversion>,
	pub timeformat: Option<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Replacement {
	pub from: String,
	pub to: String,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceCommand {
	pub replacements: Vec<Replacement>,
	pub fields: Vec<FieldReference>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangemapCommand {
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IplocationCommand {
	pub field: FieldReference,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

// === implicit-field commands ===
//
// These create fields the syntax never names; the created list is static
// knowledge recorded per command at build time.

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddinfoCommand {
	pub created_fields: Vec<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCommand {
	pub fields: Vec<FieldReference>,
	pub options: CommandOptions,
	pub created_fields: Vec<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeresultsCommand {
	pub options: CommandOptions,
	pub created_fields: Vec<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GentimesCommand {
	pub options: CommandOptions,
	pub created_fields: Vec<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TyperCommand {
	pub created_fields: Vec<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReltimeCommand {
	pub created_fields: Vec<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcurrencyCommand {
	pub options: CommandOptions,
	pub created_fields: Vec<String>,
	pub location: SourceLocation,
}

// === aggregators and rankers ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsVariant {
	Stats,
	Eventstats,
	Streamstats,
	Chart,
	Timechart,
}

impl StatsVariant {
	pub fn name(&self) -> &'static str {
		match self {
			StatsVariant::Stats => "stats",
			StatsVariant::Eventstats => "eventstats",
			StatsVariant::Streamstats => "streamstats",
			StatsVariant::Chart => "chart",
			StatsVariant::Timechart => "timechart",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsCommand {
	pub variant: StatsVariant,
	pub aggregations: Vec<Aggregation>,
	pub by_fields: Vec<FieldReference>,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TstatsCommand {
	pub aggregations: Vec<Aggregation>,
	pub by_fields: Vec<FieldReference>,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MstatsCommand {
	pub aggregations: Vec<Aggregation>,
	pub by_fields: Vec<FieldReference>,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeostatsCommand {
	pub aggregations: Vec<Aggregation>,
	pub by_fields: Vec<FieldReference>,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SistatsCommand {
	pub aggregations: Vec<Aggregation>,
	pub by_fields: Vec<FieldReference>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SichartCommand {
	pub aggregations: Vec<Aggregation>,
	pub by_fields: Vec<FieldReference>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitimechartCommand {
	pub aggregations: Vec<Aggregation>,
	pub by_fields: Vec<FieldReference>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCommand {
	pub limit: Option<f64>,
	pub fields: Vec<FieldReference>,
	pub by_fields: Vec<FieldReference>,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RareCommand {
	pub limit: Option<f64>,
	pub fields: Vec<FieldReference>,
	pub by_fields: Vec<FieldReference>,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimewrapCommand {
	pub span: Option<String>,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UntableCommand {
	pub x_field: Option<FieldReference>,
	pub y_field: Option<FieldReference>,
	pub value_field: Option<FieldReference>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XyseriesCommand {
	pub x_field: Option<FieldReference>,
	pub y_field: Option<FieldReference>,
	pub value_field: Option<FieldReference>,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

// === filters and ordering ===

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereCommand {
	pub condition: Expression,
	pub referenced_fields: Vec<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCommand {
	pub expression: SearchExpression,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexCommand {
	pub field: Option<FieldReference>,
	pub negated: bool,
	pub pattern: String,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupCommand {
	pub count: Option<f64>,
	pub fields: Vec<FieldReference>,
	pub options: CommandOptions,
	pub sort_by: Vec<SortField>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldsMode {
	Keep,
	Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldsCommand {
	pub mode: FieldsMode,
	pub fields: Vec<FieldReference>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCommand {
	pub fields: Vec<FieldReference>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
	Ascending,
	Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortField {
	pub field: FieldReference,
	pub direction: SortDirection,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortCommand {
	pub limit: Option<f64>,
	pub fields: Vec<SortField>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadCommand {
	pub count: Option<f64>,
	pub condition: Option<Expression>,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TailCommand {
	pub count: Option<f64>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqCommand {
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseCommand {
	pub location: SourceLocation,
}

// === structural / splitters ===

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendCommand {
	pub options: CommandOptions,
	pub subsearch: Pipeline,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendcolsCommand {
	pub options: CommandOptions,
	pub subsearch: Pipeline,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendpipeCommand {
	pub options: CommandOptions,
	pub subsearch: Pipeline,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCommand {
	pub join_type: Option<String>,
	pub fields: Vec<FieldReference>,
	pub options: CommandOptions,
	pub subsearch: Pipeline,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionCommand {
	pub options: CommandOptions,
	pub subsearches: Vec<Pipeline>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultisearchCommand {
	pub subsearches: Vec<Pipeline>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapCommand {
	pub search: Option<String>,
	pub subsearch: Option<Pipeline>,
	pub max_searches: Option<f64>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeachCommand {
	pub fields: Vec<FieldReference>,
	pub template: Option<Pipeline>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnCommand {
	pub count: Option<f64>,
	pub fields: Vec<FieldReference>,
	pub aliases: Vec<RenamePair>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatCommand {
	pub options: CommandOptions,
	pub delimiters: Vec<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizeCommand {
	pub options: CommandOptions,
	pub location: SourceLocation,
}

// === lookups, IO, extraction ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LookupOutputMode {
	Output,
	OutputNew,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupField {
	pub field: FieldReference,
	pub alias: Option<FieldReference>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupCommand {
	pub table: String,
	pub input_fields: Vec<LookupField>,
	pub output_mode: Option<LookupOutputMode>,
	pub output_fields: Vec<LookupField>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputlookupCommand {
	pub table: String,
	pub options: CommandOptions,
	pub where_condition: Option<Expression>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputlookupCommand {
	pub table: String,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputcsvCommand {
	pub filename: String,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputcsvCommand {
	pub filename: String,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectCommand {
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RexCommand {
	pub field: FieldReference,
	pub pattern: String,
	pub mode: Option<String>,
	pub max_match: Option<f64>,
	pub extracted_fields: Vec<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErexCommand {
	pub output_field: FieldReference,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractCommand {
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultikvCommand {
	pub fields: Vec<FieldReference>,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XmlkvCommand {
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpathCommand {
	pub input: Option<String>,
	pub output: Option<String>,
	pub path: Option<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinCommand {
	pub field: FieldReference,
	pub alias: Option<FieldReference>,
	pub options: CommandOptions,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamePair {
	pub source: FieldReference,
	pub target: FieldReference,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameCommand {
	pub renames: Vec<RenamePair>,
	pub location: SourceLocation,
}

/// Fallback for command names this layer does not recognize. The name and
/// any embedded subsearches are preserved so lineage traversal does not
/// dead-end in unknown commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericCommand {
	pub name: String,
	pub subsearches: Vec<Pipeline>,
	pub location: SourceLocation,
}

/// The closed union of recognized pipeline commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Command {
	Eval(EvalCommand),
	Fieldformat(FieldformatCommand),
	Strcat(StrcatCommand),
	Accum(AccumCommand),
	Delta(DeltaCommand),
	Addtotals(AddtotalsCommand),
	Fillnull(FillnullCommand),
	Filldown(FilldownCommand),
	Makemv(MakemvCommand),
	Mvcombine(MvcombineCommand),
	Mvexpand(MvexpandCommand),
	Nomv(NomvCommand),
	Convert(ConvertCommand),
	Replace(ReplaceCommand),
	Rangemap(RangemapCommand),
	Iplocation(IplocationCommand),
	Addinfo(AddinfoCommand),
	Transaction(TransactionCommand),
	Makeresults(MakeresultsCommand),
	Gentimes(GentimesCommand),
	Typer(TyperCommand),
	Reltime(ReltimeCommand),
	Concurrency(ConcurrencyCommand),
	Stats(StatsCommand),
	Tstats(TstatsCommand),
	Mstats(MstatsCommand),
	Geostats(GeostatsCommand),
	Sistats(SistatsCommand),
	Sichart(SichartCommand),
	Sitimechart(SitimechartCommand),
	Top(TopCommand),
	Rare(RareCommand),
	Timewrap(TimewrapCommand),
	Untable(UntableCommand),
	Xyseries(XyseriesCommand),
	Where(WhereCommand),
	Search(SearchCommand),
	Regex(RegexCommand),
	Dedup(DedupCommand),
	Fields(FieldsCommand),
	Table(TableCommand),
	Sort(SortCommand),
	Head(HeadCommand),
	Tail(TailCommand),
	Uniq(UniqCommand),
	Reverse(ReverseCommand),
	Append(AppendCommand),
	Appendcols(AppendcolsCommand),
	Appendpipe(AppendpipeCommand),
	Join(JoinCommand),
	Union(UnionCommand),
	Multisearch(MultisearchCommand),
	Map(MapCommand),
	Foreach(ForeachCommand),
	Return(ReturnCommand),
	Format(FormatCommand),
	Localize(LocalizeCommand),
	Lookup(LookupCommand),
	Inputlookup(InputlookupCommand),
	Outputlookup(OutputlookupCommand),
	Inputcsv(InputcsvCommand),
	Outputcsv(OutputcsvCommand),
	Collect(CollectCommand),
	Rex(RexCommand),
	Erex(ErexCommand),
	Extract(ExtractCommand),
	Multikv(MultikvCommand),
	Xmlkv(XmlkvCommand),
	Spath(SpathCommand),
	Bin(BinCommand),
	Rename(RenameCommand),
	Generic(GenericCommand),
}

impl Command {
	pub fn location(&self) -> SourceLocation {
		use Command::*;
		match self {
			Eval(node) => node.location,
			Fieldformat(node) => node.location,
			Strcat(node) => node.location,
			Accum(node) => node.location,
			Delta(node) => node.location,
			Addtotals(node) => node.location,
			Fillnull(node) => node.location,
			Filldown(node) => node.location,
			Makemv(node) => node.location,
			Mvcombine(node) => node.location,
			Mvexpand(node) => node.location,
			Nomv(node) => node.location,
			Convert(node) => node.location,
			Replace(node) => node.location,
			Rangemap(node) => node.location,
			Iplocation(node) => node.location,
			Addinfo(node) => node.location,
			Transaction(node) => node.location,
			Makeresults(node) => node.location,
			Gentimes(node) => node.location,
			Typer(node) => node.location,
			Reltime(node) => node.location,
			Concurrency(node) => node.location,
			Stats(node) => node.location,
			Tstats(node) => node.location,
			Mstats(node) => node.location,
			Geostats(node) => node.location,
			Sistats(node) => node.location,
			Sichart(node) => node.location,
			Sitimechart(node) => node.location,
			Top(node) => node.location,
			Rare(node) => node.location,
			Timewrap(node) => node.location,
			Untable(node) => node.location,
			Xyseries(node) => node.location,
			Where(node) => node.location,
			Search(node) => node.location,
			Regex(node) => node.location,
			Dedup(node) => node.location,
			Fields(node) => node.location,
			Table(node) => node.location,
			Sort(node) => node.location,
			Head(node) => node.location,
			Tail(node) => node.location,
			Uniq(node) => node.location,
			Reverse(node) => node.location,
			Append(node) => node.location,
			Appendcols(node) => node.location,
			Appendpipe(node) => node.location,
			Join(node) => node.location,
			Union(node) => node.location,
			Multisearch(node) => node.location,
			Map(node) => node.location,
			Foreach(node) => node.location,
			Return(node) => node.location,
			Format(node) => node.location,
			Localize(node) => node.location,
			Lookup(node) => node.location,
			Inputlookup(node) => node.location,
			Outputlookup(node) => node.location,
			Inputcsv(node) => node.location,
			Outputcsv(node) => node.location,
			Collect(node) => node.location,
			Rex(node) => node.location,
			Erex(node) => node.location,
			Extract(node) => node.location,
			Multikv(node) => node.location,
			Xmlkv(node) => node.location,
			Spath(node) => node.location,
			Bin(node) => node.location,
			Rename(node) => node.location,
			Generic(node) => node.location,
		}
	}

	/// The SPL command name.
	pub fn name(&self) -> &str {
		use Command::*;
		match self {
			Eval(_) => "eval",
			Fieldformat(_) => "fieldformat",
			Strcat(_) => "strcat",
			Accum(_) => "accum",
			Delta(_) => "delta",
			Addtotals(_) => "addtotals",
			Fillnull(_) => "fillnull",
			Filldown(_) => "filldown",
			Makemv(_) => "makemv",
			Mvcombine(_) => "mvcombine",
			Mvexpand(_) => "mvexpand",
			Nomv(_) => "nomv",
			Convert(_) => "convert",
			Replace(_) => "replace",
			Rangemap(_) => "rangemap",
			Iplocation(_) => "iplocation",
			Addinfo(_) => "addinfo",
			Transaction(_) => "transaction",
			Makeresults(_) => "makeresults",
			Gentimes(_) => "gentimes",
			Typer(_) => "typer",
			Reltime(_) => "reltime",
			Concurrency(_) => "concurrency",
			Stats(node) => node.variant.name(),
			Tstats(_) => "tstats",
			Mstats(_) => "mstats",
			Geostats(_) => "geostats",
			Sistats(_) => "sistats",
			Sichart(_) => "sichart",
			Sitimechart(_) => "sitimechart",
			Top(_) => "top",
			Rare(_) => "rare",
			Timewrap(_) => "timewrap",
			Untable(_) => "untable",
			Xyseries(_) => "xyseries",
			Where(_) => "where",
			Search(_) => "search",
			Regex(_) => "regex",
			Dedup(_) => "dedup",
			Fields(_) => "fields",
			Table(_) => "table",
			Sort(_) => "sort",
			Head(_) => "head",
			Tail(_) => "tail",
			Uniq(_) => "uniq",
			Reverse(_) => "reverse",
			Append(_) => "append",
			Appendcols(_) => "appendcols",
			Appendpipe(_) => "appendpipe",
			Join(_) => "join",
			Union(_) => "union",
			Multisearch(_) => "multisearch",
			Map(_) => "map",
			Foreach(_) => "foreach",
			Return(_) => "return",
			Format(_) => "format",
			Localize(_) => "localize",
			Lookup(_) => "lookup",
			Inputlookup(_) => "inputlookup",
			Outputlookup(_) => "outputlookup",
			Inputcsv(_) => "inputcsv",
			Outputcsv(_) => "outputcsv",
			Collect(_) => "collect",
			Rex(_) => "rex",
			Erex(_) => "erex",
			Extract(_) => "extract",
			Multikv(_) => "multikv",
			Xmlkv(_) => "xmlkv",
			Spath(_) => "spath",
			Bin(_) => "bin",
			Rename(_) => "rename",
			Generic(node) => &node.name,
		}
	}

	/// Concrete field names this command introduces into the result set.
	pub fn created_fields(&self) -> Vec<String> {
		use Command::*;
		match self {
			Eval(node) => node
				.assignments
				.iter()
				.filter(|a| !a.field.is_wildcard)
				.map(|a| a.field.field_name.clone())
				.collect(),
			Fieldformat(node) => concrete_names(std::slice::from_ref(&node.field)),
			Strcat(node) => node.dest_field.as_ref().map(|f| vec![f.field_name.clone()]).unwrap_or_default(),
			Accum(node) => {
				vec![node.alias.as_ref().unwrap_or(&node.field).field_name.clone()]
			}
			Delta(node) => match &node.alias {
				Some(alias) => vec![alias.field_name.clone()],
				None => vec![format!("delta({})", node.field.field_name)],
			},
			Addtotals(node) => {
				vec![node.options.get_str("fieldname").unwrap_or("Total").to_string()]
			}
			Convert(node) => node
				.conversions
				.iter()
				.map(|c| {
					c.alias.as_ref().unwrap_or(&c.field).field_name.clone()
				})
				.collect(),
			Rangemap(_) => vec!["range".to_string()],
			Iplocation(node) => {
				let prefix = node.options.get_str("prefix").unwrap_or("");
				["City", "Country", "Region", "lat", "lon"]
					.iter()
					.map(|name| format!("{}{}", prefix, name))
					.collect()
			}
			Addinfo(node) => node.created_fields.clone(),
			Transaction(node) => node.created_fields.clone(),
			Makeresults(node) => node.created_fields.clone(),
			Gentimes(node) => node.created_fields.clone(),
			Typer(node) => node.created_fields.clone(),
			Reltime(node) => node.created_fields.clone(),
			Concurrency(node) => node.created_fields.clone(),
			Stats(node) => node.aggregations.iter().map(|a| a.output_field.clone()).collect(),
			Tstats(node) => node.aggregations.iter().map(|a| a.output_field.clone()).collect(),
			Mstats(node) => node.aggregations.iter().map(|a| a.output_field.clone()).collect(),
			Geostats(node) => node.aggregations.iter().map(|a| a.output_field.clone()).collect(),
			Sistats(node) => node.aggregations.iter().map(|a| a.output_field.clone()).collect(),
			Sichart(node) => node.aggregations.iter().map(|a| a.output_field.clone()).collect(),
			Sitimechart(node) => node.aggregations.iter().map(|a| a.output_field.clone()).collect(),
			Top(node) => ranker_created(&node.options),
			Rare(node) => ranker_created(&node.options),
			Lookup(node) => node
				.output_fields
				.iter()
				.map(|f| f.alias.as_ref().unwrap_or(&f.field).field_name.clone())
				.collect(),
			Rex(node) => node.extracted_fields.clone(),
			Erex(node) => concrete_names(std::slice::from_ref(&node.output_field)),
			Spath(node) => node.output.clone().or_else(|| node.path.clone()).map(|f| vec![f]).unwrap_or_default(),
			Bin(node) => {
				vec![node.alias.as_ref().unwrap_or(&node.field).field_name.clone()]
			}
			Rename(node) => node
				.renames
				.iter()
				.filter(|pair| !pair.target.is_wildcard)
				.map(|pair| pair.target.field_name.clone())
				.collect(),
			_ => Vec::new(),
		}
	}

	/// Concrete field names this command reads from its input.
	pub fn consumed_fields(&self) -> Vec<String> {
		use Command::*;
		match self {
			Eval(node) => {
				let mut fields = Vec::new();
				for assignment in &node.assignments {
					for name in &assignment.depends_on {
						if !fields.contains(name) {
							fields.push(name.clone());
						}
					}
				}
				fields
			}
			Fieldformat(node) => node.depends_on.clone(),
			Strcat(node) => node
				.parts
				.iter()
				.filter_map(|part| match part {
					StrcatPart::Field(field) if !field.is_wildcard => {
						Some(field.field_name.clone())
					}
					_ => None,
				})
				.collect(),
			Accum(node) => concrete_names(std::slice::from_ref(&node.field)),
			Delta(node) => concrete_names(std::slice::from_ref(&node.field)),
			Addtotals(node) => concrete_names(&node.fields),
			Fillnull(node) => concrete_names(&node.fields),
			Filldown(node) => concrete_names(&node.fields),
			Makemv(node) => concrete_names(std::slice::from_ref(&node.field)),
			Mvcombine(node) => concrete_names(std::slice::from_ref(&node.field)),
			Mvexpand(node) => concrete_names(std::slice::from_ref(&node.field)),
			Nomv(node) => concrete_names(std::slice::from_ref(&node.field)),
			Convert(node) => {
				concrete_names(&node.conversions.iter().map(|c| c.field.clone()).collect::<Vec<_>>())
			}
			Replace(node) => concrete_names(&node.fields),
			Rangemap(node) => {
				node.options.get_str("field").map(|f| vec![f.to_string()]).unwrap_or_default()
			}
			Iplocation(node) => concrete_names(std::slice::from_ref(&node.field)),
			Transaction(node) => concrete_names(&node.fields),
			Concurrency(node) => {
				let mut fields = Vec::new();
				for key in ["duration", "start"] {
					if let Some(value) = node.options.get_str(key) {
						fields.push(value.to_string());
					}
				}
				fields
			}
			Stats(node) => aggregation_consumed(&node.aggregations, &node.by_fields),
			Tstats(node) => aggregation_consumed(&node.aggregations, &node.by_fields),
			Mstats(node) => aggregation_consumed(&node.aggregations, &node.by_fields),
			Geostats(node) => aggregation_consumed(&node.aggregations, &node.by_fields),
			Sistats(node) => aggregation_consumed(&node.aggregations, &node.by_fields),
			Sichart(node) => aggregation_consumed(&node.aggregations, &node.by_fields),
			Sitimechart(node) => aggregation_consumed(&node.aggregations, &node.by_fields),
			Top(node) => {
				let mut fields = concrete_names(&node.fields);
				for name in concrete_names(&node.by_fields) {
					if !fields.contains(&name) {
						fields.push(name);
					}
				}
				fields
			}
			Rare(node) => {
				let mut fields = concrete_names(&node.fields);
				for name in concrete_names(&node.by_fields) {
					if !fields.contains(&name) {
						fields.push(name);
					}
				}
				fields
			}
			Untable(node) => {
				concrete_names(&[&node.x_field, &node.y_field, &node.value_field]
					.iter()
					.filter_map(|f| (*f).clone())
					.collect::<Vec<_>>())
			}
			Xyseries(node) => {
				concrete_names(&[&node.x_field, &node.y_field, &node.value_field]
					.iter()
					.filter_map(|f| (*f).clone())
					.collect::<Vec<_>>())
			}
			Where(node) => node.referenced_fields.clone(),
			Search(node) => node.expression.referenced_fields.clone(),
			Regex(node) => {
				node.field.as_ref().map(|f| concrete_names(std::slice::from_ref(f))).unwrap_or_default()
			}
			Dedup(node) => concrete_names(&node.fields),
			Fields(node) => concrete_names(&node.fields),
			Table(node) => concrete_names(&node.fields),
			Sort(node) => {
				concrete_names(&node.fields.iter().map(|s| s.field.clone()).collect::<Vec<_>>())
			}
			Head(node) => node
				.condition
				.as_ref()
				.map(lineage::expression_dependencies)
				.unwrap_or_default(),
			Join(node) => concrete_names(&node.fields),
			Foreach(node) => concrete_names(&node.fields),
			Return(node) => {
				let mut fields = concrete_names(&node.fields);
				for pair in &node.aliases {
					if !pair.source.is_wildcard && !fields.contains(&pair.source.field_name) {
						fields.push(pair.source.field_name.clone());
					}
				}
				fields
			}
			Lookup(node) => {
				concrete_names(&node.input_fields.iter().map(|f| f.field.clone()).collect::<Vec<_>>())
			}
			Inputlookup(node) => node
				.where_condition
				.as_ref()
				.map(lineage::expression_dependencies)
				.unwrap_or_default(),
			Rex(node) => concrete_names(std::slice::from_ref(&node.field)),
			Erex(node) => {
				node.options.get_str("fromfield").map(|f| vec![f.to_string()]).unwrap_or_default()
			}
			Multikv(node) => concrete_names(&node.fields),
			Spath(node) => node.input.clone().map(|f| vec![f]).unwrap_or_default(),
			Bin(node) => concrete_names(std::slice::from_ref(&node.field)),
			Rename(node) => node
				.renames
				.iter()
				.filter(|pair| !pair.source.is_wildcard)
				.map(|pair| pair.source.field_name.clone())
				.collect(),
			_ => Vec::new(),
		}
	}

	pub fn is_generic(&self) -> bool {
		matches!(self, Command::Generic(_))
	}
	pub fn as_generic(&self) -> &GenericCommand {
		if let Command::Generic(result) = self {
			result
		} else {
			panic!("not generic")
		}
	}

	pub fn is_eval(&self) -> bool {
		matches!(self, Command::Eval(_))
	}
	pub fn as_eval(&self) -> &EvalCommand {
		if let Command::Eval(result) = self {
			result
		} else {
			panic!("not eval")
		}
	}

	pub fn is_where(&self) -> bool {
		matches!(self, Command::Where(_))
	}
	pub fn as_where(&self) -> &WhereCommand {
		if let Command::Where(result) = self {
			result
		} else {
			panic!("not where")
		}
	}

	pub fn is_stats(&self) -> bool {
		matches!(self, Command::Stats(_))
	}
	pub fn as_stats(&self) -> &StatsCommand {
		if let Command::Stats(result) = self {
			result
		} else {
			panic!("not stats")
		}
	}

	pub fn is_join(&self) -> bool {
		matches!(self, Command::Join(_))
	}
	pub fn as_join(&self) -> &JoinCommand {
		if let Command::Join(result) = self {
			result
		} else {
			panic!("not join")
		}
	}

	pub fn is_table(&self) -> bool {
		matches!(self, Command::Table(_))
	}
	pub fn as_table(&self) -> &TableCommand {
		if let Command::Table(result) = self {
			result
		} else {
			panic!("not table")
		}
	}

	pub fn is_rename(&self) -> bool {
		matches!(self, Command::Rename(_))
	}
	pub fn as_rename(&self) -> &RenameCommand {
		if let Command::Rename(result) = self {
			result
		} else {
			panic!("not rename")
		}
	}

	pub fn is_rex(&self) -> bool {
		matches!(self, Command::Rex(_))
	}
	pub fn as_rex(&self) -> &RexCommand {
		if let Command::Rex(result) = self {
			result
		} else {
			panic!("not rex")
		}
	}

	pub fn is_lookup(&self) -> bool {
		matches!(self, Command::Lookup(_))
	}
	pub fn as_lookup(&self) -> &LookupCommand {
		if let Command::Lookup(result) = self {
			result
		} else {
			panic!("not lookup")
		}
	}

	pub fn is_append(&self) -> bool {
		matches!(self, Command::Append(_))
	}
	pub fn as_append(&self) -> &AppendCommand {
		if let Command::Append(result) = self {
			result
		} else {
			panic!("not append")
		}
	}

	pub fn is_union(&self) -> bool {
		matches!(self, Command::Union(_))
	}
	pub fn as_union(&self) -> &UnionCommand {
		if let Command::Union(result) = self {
			result
		} else {
			panic!("not union")
		}
	}

	pub fn is_foreach(&self) -> bool {
		matches!(self, Command::Foreach(_))
	}
	pub fn as_foreach(&self) -> &ForeachCommand {
		if let Command::Foreach(result) = self {
			result
		} else {
			panic!("not foreach")
		}
	}

	pub fn is_sort(&self) -> bool {
		matches!(self, Command::Sort(_))
	}
	pub fn as_sort(&self) -> &SortCommand {
		if let Command::Sort(result) = self {
			result
		} else {
			panic!("not sort")
		}
	}

	pub fn is_dedup(&self) -> bool {
		matches!(self, Command::Dedup(_))
	}
	pub fn as_dedup(&self) -> &DedupCommand {
		if let Command::Dedup(result) = self {
			result
		} else {
			panic!("not dedup")
		}
	}

	pub fn is_fields(&self) -> bool {
		matches!(self, Command::Fields(_))
	}
	pub fn as_fields(&self) -> &FieldsCommand {
		if let Command::Fields(result) = self {
			result
		} else {
			panic!("not fields")
		}
	}

	pub fn is_bin(&self) -> bool {
		matches!(self, Command::Bin(_))
	}
	pub fn as_bin(&self) -> &BinCommand {
		if let Command::Bin(result) = self {
			result
		} else {
			panic!("not bin")
		}
	}

	pub fn is_top(&self) -> bool {
		matches!(self, Command::Top(_))
	}
	pub fn as_top(&self) -> &TopCommand {
		if let Command::Top(result) = self {
			result
		} else {
			panic!("not top")
		}
	}
}

fn concrete_names(fields: &[FieldReference]) -> Vec<String> {
	let mut names = Vec::new();
	for field in fields {
		if !field.is_wildcard && !field.field_name.is_empty() && !names.contains(&field.field_name) {
			names.push(field.field_name.clone());
		}
	}
	names
}

fn ranker_created(options: &CommandOptions) -> Vec<String> {
	vec![
		options.get_str("countfield").unwrap_or("count").to_string(),
		options.get_str("percentfield").unwrap_or("percent").to_string(),
	]
}

fn aggregation_consumed(aggregations: &[Aggregation], by_fields: &[FieldReference]) -> Vec<String> {
	let mut fields = Vec::new();
	for aggregation in aggregations {
		if let Some(field) = &aggregation.field {
			if !field.is_wildcard && !field.field_name.is_empty() && !fields.contains(&field.field_name) {
				fields.push(field.field_name.clone());
			}
		}
	}
	for name in concrete_names(by_fields) {
		if !fields.contains(&name) {
			fields.push(name);
		}
	}
	fields
}
