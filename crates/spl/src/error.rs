// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use fieldline_type::{Diagnostic, Fragment, IntoDiagnostic, SourceLocation};

/// A problem found while building the AST.
///
/// Warnings never stop the build; each one marks a spot where the
/// transformer degraded to a fallback instead of failing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WarningKind {
	#[error("invalid numeric literal '{text}'")]
	InvalidNumber {
		text: String,
	},

	#[error("expression nesting exceeds {limit} levels")]
	ExpressionTooDeep {
		limit: usize,
	},

	#[error("subsearch nesting exceeds {limit} levels")]
	SubsearchTooDeep {
		limit: usize,
	},

	#[error("unrecognized command '{name}'")]
	UnknownCommand {
		name: String,
	},

	#[error("expression node with no recognizable content")]
	EmptyExpression,

	#[error("field node with no recognizable content")]
	EmptyField,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseWarning {
	pub kind: WarningKind,
	pub location: SourceLocation,
}

impl ParseWarning {
	pub fn new(kind: WarningKind, location: SourceLocation) -> Self {
		Self {
			kind,
			location,
		}
	}
}

impl IntoDiagnostic for ParseWarning {
	fn into_diagnostic(self) -> Diagnostic {
		let location = self.location;
		match self.kind {
			WarningKind::InvalidNumber {
				text,
			} => Diagnostic {
				code: "NUMBER_001".to_string(),
				message: format!("invalid numeric literal '{}'", text),
				fragment: Fragment::statement(text, location),
				label: Some("not a finite number".to_string()),
				help: Some("the value was kept as a string".to_string()),
				notes: vec![],
			},
			WarningKind::ExpressionTooDeep {
				limit,
			} => Diagnostic {
				code: "DEPTH_001".to_string(),
				message: format!("expression nesting exceeds {} levels", limit),
				fragment: Fragment::None,
				label: Some("expression truncated here".to_string()),
				help: Some("simplify the expression or split it across eval stages".to_string()),
				notes: vec![],
			},
			WarningKind::SubsearchTooDeep {
				limit,
			} => Diagnostic {
				code: "DEPTH_002".to_string(),
				message: format!("subsearch nesting exceeds {} levels", limit),
				fragment: Fragment::None,
				label: Some("subsearch left empty".to_string()),
				help: None,
				notes: vec![],
			},
			WarningKind::UnknownCommand {
				name,
			} => Diagnostic {
				code: "COMMAND_001".to_string(),
				message: format!("unrecognized command '{}'", name),
				fragment: Fragment::statement(name, location),
				label: Some("field effects of this command are unknown".to_string()),
				help: Some("lineage still traverses any subsearches it contains".to_string()),
				notes: vec![],
			},
			WarningKind::EmptyExpression => Diagnostic {
				code: "EXPR_001".to_string(),
				message: "expression node with no recognizable content".to_string(),
				fragment: Fragment::None,
				label: Some("replaced by the diagnostic field 'unknown'".to_string()),
				help: None,
				notes: vec![],
			},
			WarningKind::EmptyField => Diagnostic {
				code: "FIELD_001".to_string(),
				message: "field node with no recognizable content".to_string(),
				fragment: Fragment::None,
				label: Some("replaced by an empty field reference".to_string()),
				help: None,
				notes: vec![],
			},
		}
	}
}

#[cfg(test)]
pub mod tests {
	use super::*;

	#[test]
	fn test_warning_display() {
		let warning = WarningKind::UnknownCommand {
			name: "frobnicate".to_string(),
		};
		assert_eq!(warning.to_string(), "unrecognized command 'frobnicate'");
	}

	#[test]
	fn test_invalid_number_diagnostic_keeps_text() {
		let warning = ParseWarning::new(
			WarningKind::InvalidNumber {
				text: "12abc".to_string(),
			},
			SourceLocation::default(),
		);
		let diagnostic = warning.into_diagnostic();
		assert_eq!(diagnostic.code, "NUMBER_001");
		assert_eq!(diagnostic.fragment.text(), "12abc");
	}
}
