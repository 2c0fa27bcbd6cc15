// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::ast::{CommandOptions, OptionValue};
use crate::build::Builder;
use crate::cst::{CstNode, CstToken, normalize};
use crate::error::WarningKind;

impl Builder {
	/// Collect a command's `key=value` options from the parallel
	/// `optionName`/`optionValue` child arrays. Names are lower-cased;
	/// values are classified by lexer token type. A length mismatch
	/// between the arrays drops the tail instead of failing.
	pub(crate) fn build_options(&mut self, node: &CstNode) -> CommandOptions {
		let mut options = CommandOptions::new();
		let names = node.tokens("optionName");
		let values = node.tokens("optionValue");
		for (name, value) in names.iter().zip(values.iter()) {
			let classified = self.classify_option(value);
			options.insert(name.image.clone(), classified);
		}
		options
	}

	pub(crate) fn classify_option(&mut self, token: &CstToken) -> OptionValue {
		match token.kind() {
			"True" => OptionValue::Boolean(true),
			"False" => OptionValue::Boolean(false),
			"NumberLiteral" => match normalize::parse_number(&token.image) {
				Some(value) => OptionValue::Number(value),
				None => {
					self.warn(
						WarningKind::InvalidNumber {
							text: token.image.clone(),
						},
						token.location(),
					);
					OptionValue::String(token.image.clone())
				}
			},
			_ => OptionValue::String(normalize::string_value(&token.image).to_string()),
		}
	}
}
