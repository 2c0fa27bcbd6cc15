// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub mod diagnostic;
pub mod fragment;

pub use diagnostic::{Diagnostic, IntoDiagnostic};
pub use fragment::{Fragment, SourceLocation};
