// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use fieldline_type::SourceLocation;

use crate::ast::{
	BinCommand, CollectCommand, ErexCommand, ExtractCommand, FieldReference, InputcsvCommand,
	InputlookupCommand, LookupCommand, LookupField, LookupOutputMode, MultikvCommand,
	OutputcsvCommand, OutputlookupCommand, RenameCommand, RenamePair, RexCommand, SpathCommand,
	XmlkvCommand,
};
use crate::cst::{CstNode, location, normalize};

use super::Builder;

impl Builder {
	pub(crate) fn build_lookup(&mut self, node: &CstNode) -> LookupCommand {
		let output_mode = if node.has("OutputNew") {
			Some(LookupOutputMode::OutputNew)
		} else if node.has("Output") {
			Some(LookupOutputMode::Output)
		} else {
			None
		};
		LookupCommand {
			table: normalize::token_image(node, "lookupTable"),
			input_fields: self.lookup_fields(node, "inputField"),
			output_mode,
			output_fields: self.lookup_fields(node, "outputField"),
			location: location::aggregate(node),
		}
	}

	fn lookup_fields(&mut self, node: &CstNode, key: &str) -> Vec<LookupField> {
		let mut fields = Vec::new();
		for child in node.nodes(key) {
			fields.push(LookupField {
				field: self.field_or_empty(child),
				alias: self.field_under(child, "asClause"),
				location: location::aggregate(child),
			});
		}
		fields
	}

	pub(crate) fn build_inputlookup(&mut self, node: &CstNode) -> InputlookupCommand {
		let where_condition = node
			.node("whereClause")
			.and_then(|clause| clause.node("expression"))
			.map(|child| self.build_expression(child));
		InputlookupCommand {
			table: normalize::token_image(node, "lookupTable"),
			options: self.build_options(node),
			where_condition,
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_outputlookup(&mut self, node: &CstNode) -> OutputlookupCommand {
		OutputlookupCommand {
			table: normalize::token_image(node, "lookupTable"),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_inputcsv(&mut self, node: &CstNode) -> InputcsvCommand {
		InputcsvCommand {
			filename: self.filename(node),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_outputcsv(&mut self, node: &CstNode) -> OutputcsvCommand {
		OutputcsvCommand {
			filename: self.filename(node),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	fn filename(&mut self, node: &CstNode) -> String {
		node.token("filename")
			.or_else(|| node.token("Identifier"))
			.map(|token| normalize::string_value(&token.image).to_string())
			.unwrap_or_default()
	}

	pub(crate) fn build_collect(&mut self, node: &CstNode) -> CollectCommand {
		CollectCommand {
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	/// `rex` supplies its input field as an option (`field=clientip`), and
	/// its extracted fields come from the pattern's named capture groups.
	/// In `mode=sed` the pattern rewrites instead of extracting.
	pub(crate) fn build_rex(&mut self, node: &CstNode) -> RexCommand {
		let command_location = location::aggregate(node);
		let field = self.rex_input_field(node, command_location);
		let options = self.build_options(node);
		let pattern = node
			.token("StringLiteral")
			.map(|token| normalize::string_value(&token.image).to_string())
			.unwrap_or_default();
		let mode = options.get_str("mode").map(String::from);
		let extracted_fields = if mode.as_deref() == Some("sed") {
			Vec::new()
		} else {
			normalize::extract_named_groups(&pattern)
		};
		RexCommand {
			field,
			pattern,
			mode,
			max_match: options.get_number("max_match"),
			extracted_fields,
			location: command_location,
		}
	}

	/// The `field=` option names the input field; when quoted, the span is
	/// tightened past the quotes. Absent means `_raw`.
	fn rex_input_field(&mut self, node: &CstNode, fallback: SourceLocation) -> FieldReference {
		let names = node.tokens("optionName");
		let values = node.tokens("optionValue");
		for (name, value) in names.iter().zip(values.iter()) {
			if name.image.eq_ignore_ascii_case("field") {
				return self.quoted_field(value);
			}
		}
		FieldReference::new("_raw", fallback)
	}

	pub(crate) fn build_erex(&mut self, node: &CstNode) -> ErexCommand {
		ErexCommand {
			output_field: self.field_or_empty(node),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_extract(&mut self, node: &CstNode) -> ExtractCommand {
		ExtractCommand {
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_multikv(&mut self, node: &CstNode) -> MultikvCommand {
		let fields = match node.node("fieldsClause") {
			Some(clause) => self.field_list(clause),
			None => Vec::new(),
		};
		MultikvCommand {
			fields,
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_xmlkv(&mut self, node: &CstNode) -> XmlkvCommand {
		XmlkvCommand {
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_spath(&mut self, node: &CstNode) -> SpathCommand {
		let options = self.build_options(node);
		SpathCommand {
			input: options.get_str("input").map(String::from),
			output: options.get_str("output").map(String::from),
			path: options
				.get_str("path")
				.map(String::from)
				.or_else(|| node.token("Identifier").map(|token| token.image.clone())),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_bin(&mut self, node: &CstNode) -> BinCommand {
		BinCommand {
			field: self.field_or_empty(node),
			alias: self.field_under(node, "asClause"),
			options: self.build_options(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn build_rename(&mut self, node: &CstNode) -> RenameCommand {
		RenameCommand {
			renames: self.rename_pairs(node),
			location: location::aggregate(node),
		}
	}

	pub(crate) fn rename_pairs(&mut self, node: &CstNode) -> Vec<RenamePair> {
		let mut pairs = Vec::new();
		for pair in node.nodes("renamePair") {
			let source = match pair.node("source").and_then(|s| s.node("fieldName")) {
				Some(field) => self.resolve_field(field),
				None => FieldReference::empty(location::aggregate(pair)),
			};
			let target = match pair.node("target").and_then(|t| t.node("fieldName")) {
				Some(field) => self.resolve_field(field),
				None => FieldReference::empty(location::aggregate(pair)),
			};
			pairs.push(RenamePair {
				source,
				target,
				location: location::aggregate(pair),
			});
		}
		pairs
	}
}
