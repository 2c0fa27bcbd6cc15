// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::ast::{
	AccumCommand, AddinfoCommand, AddtotalsCommand, ConcurrencyCommand, Conversion, ConvertCommand,
	DeltaCommand, EvalAssignment, EvalCommand, Expression, FieldReference, FieldformatCommand,
	FilldownCommand, FillnullCommand, GentimesCommand, IplocationCommand, MakemvCommand,
	MakeresultsCommand, MvcombineCommand, MvexpandCommand, NomvCommand, RangemapCommand,
	ReltimeCommand, ReplaceCommand, Replacement, StrcatCommand, StrcatLiteral, StrcatPart,
	TransactionCommand, TyperCommand,
};
use crate::cst::{CstNode, location, normalize};
use crate::lineage;

use super::Builder;

// Side-effect fields that cannot be derived from syntax, encoded as static
// knowledge per command.
const ADDINFO_FIELDS: &[&str] = &["info_min_time", "info_max_time", "info_sid", "info_search_time"];
const TRANSACTION_FIELDS: &[&str] = &["duration", "eventcount"];
const MAKERESULTS_FIELDS: &[&str] = &["_time"];
const GENTIMES_FIELDS: &[&str] = &["starttime", "endtime", "starthuman", "endhuman"];
const TYPER_FIELDS: &[&str] = &["eventtype"];
const RELTIME_FIELDS: &[&str] = &["reltime"];

fn owned(fields: &[&str]) -> Vec<String> {
	fields.iter().map(|f| f.to_string()).collect()
}

impl Builder {
	pub(crate) fn build_eval(&mut self, node: &CstNode) -> EvalCommand {
		let mut assignments = Vec::new();
		for assignment in node.nodes("assignment") {
			assignments.push(self.build_assignment(assignment));
		}
		EvalCommand {
			assignments,
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_assignment(&mut self, node: &CstNode) -> EvalAssignment {
		let assignment_location = location::aggregate(node);
		let field = self.field_or_empty(node);
		let expression = match node.node("expression") {
			Some(child) => self.build_expression(child),
			None => Expression::FieldReference(FieldReference::unknown(assignment_location)),
		};
		let depends_on = lineage::expression_dependencies(&expression);
		EvalAssignment {
			field,
			expression,
			depends_on,
			location: assignment_location,
		}
	}

	pub(crate) fn build_fieldformat(&mut self, node: &CstNode) -> FieldformatCommand {
		let command_location = location::aggregate(node);
		match node.node("assignment") {
			Some(child) => {
				let assignment = self.build_assignment(child);
				FieldformatCommand {
					field: assignment.field,
					expression: assignment.expression,
					depends_on: assignment.depends_on,
					location: command_location,
				}
			}
			None => FieldformatCommand {
				field: FieldReference::empty(command_location),
				expression: Expression::FieldReference(FieldReference::unknown(command_location)),
				depends_on: Vec::new(),
				location: command_location,
			},
		}
	}

	pub(crate) fn build_strcat(&mut self, node: &CstNode) -> StrcatCommand {
		let mut parts = Vec::new();
		for term in node.nodes("term") {
			if let Some(field) = term.node("fieldName") {
				parts.push(StrcatPart::Field(self.resolve_field(field)));
			} else if let Some(token) = term.token("StringLiteral") {
				parts.push(StrcatPart::Literal(StrcatLiteral {
					value: normalize::string_value(&token.image).to_string(),
					location: token.location(),
				}));
			}
		}
		StrcatCommand {
			parts,
			dest_field: self.field_under(node, "destField"),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_accum(&mut self, node: &CstNode) -> AccumCommand {
		AccumCommand {
			field: self.field_or_empty(node),
			alias: self.field_under(node, "asClause"),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_delta(&mut self, node: &CstNode) -> DeltaCommand {
		let options = self.build_options(node);
		DeltaCommand {
			field: self.field_or_empty(node),
			alias: self.field_under(node, "asClause"),
			p: options.get_number("p"),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_addtotals(&mut self, node: &CstNode) -> AddtotalsCommand {
		AddtotalsCommand {
			fields: self.field_list(node),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_fillnull(&mut self, node: &CstNode) -> FillnullCommand {
		let options = self.build_options(node);
		FillnullCommand {
			value: options.get("value").map(|value| value.to_string()),
			fields: self.field_list(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_filldown(&mut self, node: &CstNode) -> FilldownCommand {
		FilldownCommand {
			fields: self.field_list(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_makemv(&mut self, node: &CstNode) -> MakemvCommand {
		MakemvCommand {
			field: self.field_or_empty(node),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_mvcombine(&mut self, node: &CstNode) -> MvcombineCommand {
		let options = self.build_options(node);
		MvcombineCommand {
			field: self.field_or_empty(node),
			delim: options.get_str("delim").map(String::from),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_mvexpand(&mut self, node: &CstNode) -> MvexpandCommand {
		let options = self.build_options(node);
		MvexpandCommand {
			field: self.field_or_empty(node),
			limit: options.get_number("limit"),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_nomv(&mut self, node: &CstNode) -> NomvCommand {
		NomvCommand {
			field: self.field_or_empty(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_convert(&mut self, node: &CstNode) -> ConvertCommand {
		let options = self.build_options(node);
		let mut conversions = Vec::new();
		for conversion in node.nodes("conversion") {
			conversions.push(Conversion {
				function: normalize::token_image(conversion, "function"),
				field: self.field_or_empty(conversion),
				alias: self.field_under(conversion, "asClause"),
				location: location::aggregate(conversion),
			});
		}
		ConvertCommand {
			conversions,
			timeformat: options.get_str("timeformat").map(String::from),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_replace(&mut self, node: &CstNode) -> ReplaceCommand {
		let mut replacements = Vec::new();
		for replacement in node.nodes("replacement") {
			replacements.push(Replacement {
				from: normalize::string_value(&normalize::token_image(replacement, "from")).to_string(),
				to: normalize::string_value(&normalize::token_image(replacement, "to")).to_string(),
				location: location::aggregate(replacement),
			});
		}
		let fields = match node.node("inClause") {
			Some(clause) => self.field_list(clause),
			None => Vec::new(),
		};
		ReplaceCommand {
			replacements,
			fields,
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_rangemap(&mut self, node: &CstNode) -> RangemapCommand {
		RangemapCommand {
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_iplocation(&mut self, node: &CstNode) -> IplocationCommand {
		IplocationCommand {
			field: self.field_or_empty(node),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_addinfo(&mut self, node: &CstNode) -> AddinfoCommand {
		AddinfoCommand {
			created_fields: owned(ADDINFO_FIELDS),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_transaction(&mut self, node: &CstNode) -> TransactionCommand {
		TransactionCommand {
			fields: self.field_list(node),
			options: self.build_options(node),
			created_fields: owned(TRANSACTION_FIELDS),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_makeresults(&mut self, node: &CstNode) -> MakeresultsCommand {
		MakeresultsCommand {
			options: self.build_options(node),
			created_fields: owned(MAKERESULTS_FIELDS),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_gentimes(&mut self, node: &CstNode) -> GentimesCommand {
		GentimesCommand {
			options: self.build_options(node),
			created_fields: owned(GENTIMES_FIELDS),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_typer(&mut self, node: &CstNode) -> TyperCommand {
		TyperCommand {
			created_fields: owned(TYPER_FIELDS),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_reltime(&mut self, node: &CstNode) -> ReltimeCommand {
		ReltimeCommand {
			created_fields: owned(RELTIME_FIELDS),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_concurrency(&mut self, node: &CstNode) -> ConcurrencyCommand {
		let options = self.build_options(node);
		let output = options.get_str("output").unwrap_or("concurrency").to_string();
		ConcurrencyCommand {
			options,
			created_fields: vec![output],
			location: location::aggregate(node),
		}
	}
}
