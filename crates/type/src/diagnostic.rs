// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::fragment::Fragment;

/// A coded, user-facing description of a problem found while building the AST.
///
/// Diagnostics are advisory: the builder always produces a tree, and each
/// degraded spot is reported through one of these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
	pub code: String,
	pub message: String,
	pub fragment: Fragment,
	pub label: Option<String>,
	pub help: Option<String>,
	pub notes: Vec<String>,
}

impl Display for Diagnostic {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "[{}] {}", self.code, self.message)
	}
}

pub trait IntoDiagnostic {
	fn into_diagnostic(self) -> Diagnostic;
}
