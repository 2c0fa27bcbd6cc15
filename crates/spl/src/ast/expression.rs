// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{self, Display, Formatter};

use fieldline_type::SourceLocation;
use serde::Serialize;

/// A normalized reference to a field.
///
/// When `is_wildcard` is set, `field_name` holds the literal pattern (`*`,
/// `foo*`, `*bar`) and must not be treated as a concrete field by lineage
/// consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
	pub field_name: String,
	pub is_wildcard: bool,
	pub location: SourceLocation,
}

impl FieldReference {
	pub fn new(field_name: impl Into<String>, location: SourceLocation) -> Self {
		Self {
			field_name: field_name.into(),
			is_wildcard: false,
			location,
		}
	}

	pub fn wildcard(pattern: impl Into<String>, location: SourceLocation) -> Self {
		Self {
			field_name: pattern.into(),
			is_wildcard: true,
			location,
		}
	}

	/// Fallback for a field node the resolver could not interpret.
	pub fn empty(location: SourceLocation) -> Self {
		Self::new("", location)
	}

	/// Diagnostic fallback for an expression primary with no recognizable
	/// content.
	pub fn unknown(location: SourceLocation) -> Self {
		Self::new("unknown", location)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOperator {
	#[serde(rename = "OR")]
	Or,
	#[serde(rename = "AND")]
	And,
	#[serde(rename = "=")]
	Equals,
	#[serde(rename = "==")]
	DoubleEquals,
	#[serde(rename = "!=")]
	NotEquals,
	#[serde(rename = "<")]
	LessThan,
	#[serde(rename = "<=")]
	LessThanOrEqual,
	#[serde(rename = ">")]
	GreaterThan,
	#[serde(rename = ">=")]
	GreaterThanOrEqual,
	#[serde(rename = "LIKE")]
	Like,
	#[serde(rename = "+")]
	Add,
	#[serde(rename = "-")]
	Subtract,
	#[serde(rename = ".")]
	Concat,
	#[serde(rename = "*")]
	Multiply,
	#[serde(rename = "/")]
	Divide,
	#[serde(rename = "%")]
	Modulo,
}

impl BinaryOperator {
	pub fn from_image(image: &str) -> Option<Self> {
		use BinaryOperator::*;
		match image {
			"OR" | "or" => Some(Or),
			"AND" | "and" => Some(And),
			"=" => Some(Equals),
			"==" => Some(DoubleEquals),
			"!=" => Some(NotEquals),
			"<" => Some(LessThan),
			"<=" => Some(LessThanOrEqual),
			">" => Some(GreaterThan),
			">=" => Some(GreaterThanOrEqual),
			"LIKE" | "like" => Some(Like),
			"+" => Some(Add),
			"-" => Some(Subtract),
			"." => Some(Concat),
			"*" => Some(Multiply),
			"/" => Some(Divide),
			"%" => Some(Modulo),
			_ => None,
		}
	}

	pub fn as_str(&self) -> &'static str {
		use BinaryOperator::*;
		match self {
			Or => "OR",
			And => "AND",
			Equals => "=",
			DoubleEquals => "==",
			NotEquals => "!=",
			LessThan => "<",
			LessThanOrEqual => "<=",
			GreaterThan => ">",
			GreaterThanOrEqual => ">=",
			Like => "LIKE",
			Add => "+",
			Subtract => "-",
			Concat => ".",
			Multiply => "*",
			Divide => "/",
			Modulo => "%",
		}
	}
}

impl Display for BinaryOperator {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOperator {
	#[serde(rename = "NOT")]
	Not,
	#[serde(rename = "-")]
	Minus,
}

impl Display for UnaryOperator {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			UnaryOperator::Not => f.write_str("NOT"),
			UnaryOperator::Minus => f.write_str("-"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
	String(String),
	Number(f64),
	Boolean(bool),
	Null,
}

/// A typed expression tree, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Expression {
	BinaryExpression(BinaryExpression),
	UnaryExpression(UnaryExpression),
	FunctionCall(FunctionCall),
	FieldReference(FieldReference),
	Literal(LiteralExpression),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryExpression {
	pub operator: BinaryOperator,
	pub left: Box<Expression>,
	pub right: Box<Expression>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnaryExpression {
	pub operator: UnaryOperator,
	pub operand: Box<Expression>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
	pub name: String,
	pub arguments: Vec<Expression>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiteralExpression {
	pub value: Literal,
	pub location: SourceLocation,
}

impl Expression {
	pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Self {
		let location = left.location().merge(right.location());
		Expression::BinaryExpression(BinaryExpression {
			operator,
			left: Box::new(left),
			right: Box::new(right),
			location,
		})
	}

	pub fn literal(value: Literal, location: SourceLocation) -> Self {
		Expression::Literal(LiteralExpression {
			value,
			location,
		})
	}

	pub fn location(&self) -> SourceLocation {
		match self {
			Expression::BinaryExpression(node) => node.location,
			Expression::UnaryExpression(node) => node.location,
			Expression::FunctionCall(node) => node.location,
			Expression::FieldReference(node) => node.location,
			Expression::Literal(node) => node.location,
		}
	}

	pub fn is_binary(&self) -> bool {
		matches!(self, Expression::BinaryExpression(_))
	}
	pub fn as_binary(&self) -> &BinaryExpression {
		if let Expression::BinaryExpression(result) = self {
			result
		} else {
			panic!("not a binary expression")
		}
	}

	pub fn is_unary(&self) -> bool {
		matches!(self, Expression::UnaryExpression(_))
	}
	pub fn as_unary(&self) -> &UnaryExpression {
		if let Expression::UnaryExpression(result) = self {
			result
		} else {
			panic!("not a unary expression")
		}
	}

	pub fn is_function_call(&self) -> bool {
		matches!(self, Expression::FunctionCall(_))
	}
	pub fn as_function_call(&self) -> &FunctionCall {
		if let Expression::FunctionCall(result) = self {
			result
		} else {
			panic!("not a function call")
		}
	}

	pub fn is_field(&self) -> bool {
		matches!(self, Expression::FieldReference(_))
	}
	pub fn as_field(&self) -> &FieldReference {
		if let Expression::FieldReference(result) = self {
			result
		} else {
			panic!("not a field reference")
		}
	}

	pub fn is_literal(&self) -> bool {
		matches!(self, Expression::Literal(_))
	}
	pub fn as_literal(&self) -> &LiteralExpression {
		if let Expression::Literal(result) = self {
			result
		} else {
			panic!("not a literal")
		}
	}
}

/// One aggregation inside a stats-family command, e.g. `sum(bytes) AS total`.
///
/// `output_field` is always populated: the alias when present, else
/// `function(field)` when a concrete field is present, else the bare
/// function name (`count` with no argument).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
	pub function: String,
	pub field: Option<FieldReference>,
	pub alias: Option<String>,
	pub output_field: String,
	pub location: SourceLocation,
}

impl Aggregation {
	pub fn new(
		function: impl Into<String>,
		field: Option<FieldReference>,
		alias: Option<String>,
		location: SourceLocation,
	) -> Self {
		let function = function.into();
		let output_field = match (&alias, &field) {
			(Some(alias), _) => alias.clone(),
			(None, Some(field)) => format!("{}({})", function, field.field_name),
			(None, None) => function.clone(),
		};
		Self {
			function,
			field,
			alias,
			output_field,
			location,
		}
	}
}

#[cfg(test)]
pub mod tests {
	use super::*;

	#[test]
	fn test_output_field_alias_wins() {
		let agg = Aggregation::new(
			"sum",
			Some(FieldReference::new("bytes", SourceLocation::default())),
			Some("total".to_string()),
			SourceLocation::default(),
		);
		assert_eq!(agg.output_field, "total");
	}

	#[test]
	fn test_output_field_function_of_field() {
		let agg = Aggregation::new(
			"sum",
			Some(FieldReference::new("bytes", SourceLocation::default())),
			None,
			SourceLocation::default(),
		);
		assert_eq!(agg.output_field, "sum(bytes)");
	}

	#[test]
	fn test_output_field_bare_function() {
		let agg = Aggregation::new("count", None, None, SourceLocation::default());
		assert_eq!(agg.output_field, "count");
	}

	#[test]
	fn test_operator_round_trip() {
		for op in [
			BinaryOperator::Or,
			BinaryOperator::NotEquals,
			BinaryOperator::Concat,
			BinaryOperator::Modulo,
		] {
			assert_eq!(BinaryOperator::from_image(op.as_str()), Some(op));
		}
	}

	#[test]
	fn test_expression_serializes_tagged() {
		let expr = Expression::literal(Literal::Number(7.0), SourceLocation::default());
		let json = serde_json::to_value(&expr).unwrap();
		assert_eq!(json["type"], "Literal");
		assert_eq!(json["value"], 7.0);
	}

	#[test]
	fn test_binary_location_spans_operands() {
		let left = Expression::FieldReference(FieldReference::new(
			"a",
			SourceLocation::new(1, 1, 0, 1, 2, 1),
		));
		let right = Expression::FieldReference(FieldReference::new(
			"b",
			SourceLocation::new(1, 5, 4, 1, 6, 5),
		));
		let expr = Expression::binary(BinaryOperator::Add, left, right);
		assert_eq!(expr.location().start_offset, 0);
		assert_eq!(expr.location().end_offset, 5);
	}
}
