// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Field dependency extraction over built expression trees.

use crate::ast::Expression;

/// Collect every concrete field name an expression reads, in
/// first-appearance order.
///
/// Wildcard references are pattern text, not concrete dependencies, and are
/// excluded. Expression trees are shallow in practice, so a plain recursive
/// walk with no memoization is sufficient.
pub fn expression_dependencies(expression: &Expression) -> Vec<String> {
	let mut fields = Vec::new();
	collect(expression, &mut fields);
	fields
}

fn collect(expression: &Expression, fields: &mut Vec<String>) {
	match expression {
		Expression::FieldReference(field) => {
			if !field.is_wildcard
				&& !field.field_name.is_empty()
				&& !fields.contains(&field.field_name)
			{
				fields.push(field.field_name.clone());
			}
		}
		Expression::BinaryExpression(binary) => {
			collect(&binary.left, fields);
			collect(&binary.right, fields);
		}
		Expression::UnaryExpression(unary) => collect(&unary.operand, fields),
		Expression::FunctionCall(call) => {
			for argument in &call.arguments {
				collect(argument, fields);
			}
		}
		Expression::Literal(_) => {}
	}
}
