// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use fieldline_type::SourceLocation;

use crate::ast::{
	BinaryOperator, Expression, FieldReference, FunctionCall, Literal, UnaryExpression, UnaryOperator,
};
use crate::build::{Builder, MAX_DEPTH};
use crate::cst::{CstNode, location, normalize};
use crate::error::WarningKind;

/// The post-pipe expression grammar is layered one CST rule per precedence
/// tier, so the builder mirrors it: each level folds its operands
/// left-associatively and delegates straight down when it holds no operator
/// of its own — no wrapper nodes for the common case of a bare primary.
impl Builder {
	pub(crate) fn build_expression(&mut self, node: &CstNode) -> Expression {
		let location = location::aggregate(node);
		if self.depth >= MAX_DEPTH {
			self.warn(
				WarningKind::ExpressionTooDeep {
					limit: MAX_DEPTH,
				},
				location,
			);
			return Expression::FieldReference(FieldReference::unknown(location));
		}
		self.depth += 1;
		let expression = match node.node("orExpression") {
			Some(or) => self.build_or(or),
			None => self.fallback_expression(node),
		};
		self.depth -= 1;
		expression
	}

	fn build_or(&mut self, node: &CstNode) -> Expression {
		self.fold_keyword_operator(node, "andExpression", BinaryOperator::Or, Self::build_and)
	}

	fn build_and(&mut self, node: &CstNode) -> Expression {
		self.fold_keyword_operator(node, "comparisonExpression", BinaryOperator::And, Self::build_comparison)
	}

	/// Comparison does not chain: at most one operator per level.
	fn build_comparison(&mut self, node: &CstNode) -> Expression {
		let operands = node.nodes("additiveExpression");
		match operands.as_slice() {
			[] => self.fallback_expression(node),
			[single] => self.build_additive(single),
			[left, right, ..] => {
				let operator = node
					.token("ComparisonOperator")
					.and_then(|token| BinaryOperator::from_image(&token.image))
					.unwrap_or(BinaryOperator::Equals);
				let left = self.build_additive(left);
				let right = self.build_additive(right);
				Expression::binary(operator, left, right)
			}
		}
	}

	fn build_additive(&mut self, node: &CstNode) -> Expression {
		self.fold_operator_tokens(
			node,
			"multiplicativeExpression",
			"AdditiveOperator",
			BinaryOperator::Add,
			Self::build_multiplicative,
		)
	}

	fn build_multiplicative(&mut self, node: &CstNode) -> Expression {
		self.fold_operator_tokens(
			node,
			"unaryExpression",
			"MultiplicativeOperator",
			BinaryOperator::Multiply,
			Self::build_unary,
		)
	}

	fn build_unary(&mut self, node: &CstNode) -> Expression {
		let location = location::aggregate(node);
		if self.depth >= MAX_DEPTH {
			self.warn(
				WarningKind::ExpressionTooDeep {
					limit: MAX_DEPTH,
				},
				location,
			);
			return Expression::FieldReference(FieldReference::unknown(location));
		}
		let operator = if node.has("Not") {
			Some(UnaryOperator::Not)
		} else if node.has("Minus") {
			Some(UnaryOperator::Minus)
		} else {
			None
		};
		match operator {
			Some(operator) => {
				self.depth += 1;
				// `- -x` and `NOT NOT x` re-enter here
				let operand = match node.node("unaryExpression") {
					Some(inner) => self.build_unary(inner),
					None => match node.node("primaryExpression") {
						Some(primary) => self.build_primary(primary),
						None => self.fallback_expression(node),
					},
				};
				self.depth -= 1;
				Expression::UnaryExpression(UnaryExpression {
					operator,
					operand: Box::new(operand),
					location,
				})
			}
			None => match node.node("primaryExpression") {
				Some(primary) => self.build_primary(primary),
				None => self.fallback_expression(node),
			},
		}
	}

	fn build_primary(&mut self, node: &CstNode) -> Expression {
		if let Some(paren) = node.node("expression") {
			return self.build_expression(paren);
		}
		if let Some(call) = node.node("functionCall") {
			return self.build_function_call(call);
		}
		if let Some(field) = node.node("fieldName") {
			return Expression::FieldReference(self.resolve_field(field));
		}
		if let Some(token) = node.token("StringLiteral") {
			let value = normalize::string_value(&token.image).to_string();
			return Expression::literal(Literal::String(value), token.location());
		}
		if let Some(token) = node.token("NumberLiteral") {
			return self.number_literal(&token.image, token.location());
		}
		if let Some(token) = node.token("True") {
			return Expression::literal(Literal::Boolean(true), token.location());
		}
		if let Some(token) = node.token("False") {
			return Expression::literal(Literal::Boolean(false), token.location());
		}
		if let Some(token) = node.token("Null") {
			return Expression::literal(Literal::Null, token.location());
		}
		self.fallback_expression(node)
	}

	fn build_function_call(&mut self, node: &CstNode) -> Expression {
		let location = location::aggregate(node);
		let name = normalize::token_image(node, "function");
		let mut arguments = Vec::new();
		for argument in node.nodes("expression") {
			arguments.push(self.build_expression(argument));
		}
		// keyword-literal functions
		if arguments.is_empty() {
			match name.as_str() {
				"true" => return Expression::literal(Literal::Boolean(true), location),
				"false" => return Expression::literal(Literal::Boolean(false), location),
				"null" => return Expression::literal(Literal::Null, location),
				_ => {}
			}
		}
		Expression::FunctionCall(FunctionCall {
			name,
			arguments,
			location,
		})
	}

	pub(crate) fn number_literal(&mut self, text: &str, location: SourceLocation) -> Expression {
		match normalize::parse_number(text) {
			Some(value) => Expression::literal(Literal::Number(value), location),
			None => {
				self.warn(
					WarningKind::InvalidNumber {
						text: text.to_string(),
					},
					location,
				);
				Expression::literal(Literal::String(text.to_string()), location)
			}
		}
	}

	fn fallback_expression(&mut self, node: &CstNode) -> Expression {
		let location = location::aggregate(node);
		self.warn(WarningKind::EmptyExpression, location);
		Expression::FieldReference(FieldReference::unknown(location))
	}

	/// Left fold over operand siblings joined by a single keyword operator
	/// (OR, AND): `a OR b OR c` becomes `Or(Or(a, b), c)`.
	fn fold_keyword_operator(
		&mut self,
		node: &CstNode,
		child_key: &str,
		operator: BinaryOperator,
		build_child: fn(&mut Self, &CstNode) -> Expression,
	) -> Expression {
		let operands = node.nodes(child_key);
		match operands.split_first() {
			None => self.fallback_expression(node),
			Some((first, rest)) => {
				let mut expression = build_child(self, first);
				for operand in rest {
					let right = build_child(self, operand);
					expression = Expression::binary(operator, expression, right);
				}
				expression
			}
		}
	}

	/// Left fold where each joint has its own operator token (`+`/`-`/`.`,
	/// `*`/`/`/`%`). A missing or unreadable operator token degrades to the
	/// tier's default.
	fn fold_operator_tokens(
		&mut self,
		node: &CstNode,
		child_key: &str,
		operator_key: &str,
		default_operator: BinaryOperator,
		build_child: fn(&mut Self, &CstNode) -> Expression,
	) -> Expression {
		let operands = node.nodes(child_key);
		let operators = node.tokens(operator_key);
		match operands.split_first() {
			None => self.fallback_expression(node),
			Some((first, rest)) => {
				let mut expression = build_child(self, first);
				for (index, operand) in rest.iter().enumerate() {
					let operator = operators
						.get(index)
						.and_then(|token| BinaryOperator::from_image(&token.image))
						.unwrap_or(default_operator);
					let right = build_child(self, operand);
					expression = Expression::binary(operator, expression, right);
				}
				expression
			}
		}
	}
}
