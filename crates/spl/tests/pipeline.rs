// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! End-to-end tests: chevrotain-shaped CST JSON in, lineage AST out.

use fieldline_spl::ast::{PipelineStage, SearchTerm, SearchValue, StatsVariant};
use fieldline_spl::{build_pipeline, parse_json};
use serde_json::{Value, json};

fn token(image: &str) -> Value {
	json!({ "image": image })
}

fn typed(image: &str, type_name: &str) -> Value {
	json!({ "image": image, "tokenType": { "name": type_name } })
}

fn node(name: &str, children: Value) -> Value {
	json!({ "name": name, "children": children })
}

fn field_name(name: &str) -> Value {
	node("fieldName", json!({ "Identifier": [token(name)] }))
}

fn comparison(field: &str, value: Value) -> Value {
	node(
		"searchTerm",
		json!({
			"fieldComparison": [node(
				"fieldComparison",
				json!({
					"fieldName": [field_name(field)],
					"Equals": [token("=")],
					"value": [node("value", json!({ "v": [value] }))]
				}),
			)]
		}),
	)
}

fn search_expression(terms: Vec<Value>) -> Value {
	node("searchExpression", json!({ "searchTerm": terms }))
}

fn command(key: &str, inner: Value) -> Value {
	node("command", json!({ key: [inner] }))
}

fn stats_count() -> Value {
	command(
		"statsCommand",
		node(
			"statsCommand",
			json!({ "aggregation": [node("aggregation", json!({ "function": [token("count")] }))] }),
		),
	)
}

fn pipeline(search: Option<Value>, commands: Vec<Value>) -> Value {
	let mut children = serde_json::Map::new();
	if let Some(search) = search {
		children.insert("searchExpression".to_string(), json!([search]));
	}
	children.insert("command".to_string(), Value::Array(commands));
	node("pipeline", Value::Object(children))
}

#[test]
fn test_keyword_fields_round_trip() {
	// index=main | table count, type, index
	let table = command(
		"tableCommand",
		node(
			"tableCommand",
			json!({
				"fieldName": [
					node("fieldName", json!({ "Count": [token("count")] })),
					node("fieldName", json!({ "Type": [token("type")] })),
					node("fieldName", json!({ "Index": [token("index")] })),
				]
			}),
		),
	);
	let cst = pipeline(
		Some(search_expression(vec![comparison("index", token("main"))])),
		vec![table],
	);

	let output = parse_json(&cst.to_string()).unwrap();
	assert!(output.warnings.is_empty());
	assert_eq!(output.pipeline.len(), 2);

	let PipelineStage::Search(search) = &output.pipeline.stages[0] else {
		panic!("expected search stage first");
	};
	assert_eq!(search.referenced_fields, vec!["index"]);

	let PipelineStage::Command(table) = &output.pipeline.stages[1] else {
		panic!("expected command stage");
	};
	let names: Vec<_> = table.as_table().fields.iter().map(|f| f.field_name.as_str()).collect();
	assert_eq!(names, vec!["count", "type", "index"]);
	assert!(table.as_table().fields.iter().all(|f| !f.is_wildcard));
}

#[test]
fn test_subsearch_isolation() {
	// index=main | join host [search index=other | stats count]
	let inner = pipeline(
		Some(search_expression(vec![comparison("index", token("other"))])),
		vec![stats_count()],
	);
	let join = command(
		"joinCommand",
		node(
			"joinCommand",
			json!({
				"fieldName": [field_name("host")],
				"subsearch": [node("subsearch", json!({ "inner": [inner] }))]
			}),
		),
	);
	let cst = pipeline(
		Some(search_expression(vec![comparison("index", token("main"))])),
		vec![join],
	);

	let output = parse_json(&cst.to_string()).unwrap();
	assert_eq!(output.pipeline.len(), 2);

	let PipelineStage::Command(join) = &output.pipeline.stages[1] else {
		panic!("expected join stage");
	};
	let join = join.as_join();
	assert_eq!(join.fields[0].field_name, "host");

	// the subsearch is an independent two-stage pipeline
	assert_eq!(join.subsearch.len(), 2);
	let PipelineStage::Search(inner_search) = &join.subsearch.stages[0] else {
		panic!("expected inner search stage");
	};
	assert_eq!(inner_search.referenced_fields, vec!["index"]);
	let PipelineStage::Command(stats) = &join.subsearch.stages[1] else {
		panic!("expected inner stats stage");
	};
	assert_eq!(stats.as_stats().aggregations[0].output_field, "count");
}

#[test]
fn test_stats_aggregation_output_fields() {
	// stats count, sum(bytes), sum(bytes) AS total BY host
	let aggregations = json!({
		"aggregation": [
			node("aggregation", json!({ "function": [token("count")] })),
			node("aggregation", json!({ "function": [token("sum")], "fieldName": [field_name("bytes")] })),
			node("aggregation", json!({
				"function": [token("sum")],
				"fieldName": [field_name("bytes")],
				"alias": [node("alias", json!({ "fieldName": [field_name("total")] }))]
			})),
		],
		"byClause": [node("byClause", json!({ "fieldName": [field_name("host")] }))]
	});
	let cst = pipeline(None, vec![command("statsCommand", node("statsCommand", aggregations))]);

	let output = parse_json(&cst.to_string()).unwrap();
	let PipelineStage::Command(stats) = &output.pipeline.stages[0] else {
		panic!("expected stats");
	};
	let stats = stats.as_stats();
	assert_eq!(stats.variant, StatsVariant::Stats);
	let outputs: Vec<_> = stats.aggregations.iter().map(|a| a.output_field.as_str()).collect();
	assert_eq!(outputs, vec!["count", "sum(bytes)", "total"]);
	assert_eq!(stats.by_fields[0].field_name, "host");
}

#[test]
fn test_eval_lineage_through_rename() {
	// eval kb = bytes / 1024 | rename kb AS kilobytes
	let divide = node(
		"multiplicativeExpression",
		json!({
			"unaryExpression": [
				node("unaryExpression", json!({ "primaryExpression": [node("primaryExpression", json!({ "fieldName": [field_name("bytes")] }))] })),
				node("unaryExpression", json!({ "primaryExpression": [node("primaryExpression", json!({ "NumberLiteral": [typed("1024", "NumberLiteral")] }))] })),
			],
			"MultiplicativeOperator": [token("/")]
		}),
	);
	let expression = node(
		"expression",
		json!({
			"orExpression": [node("orExpression", json!({
				"andExpression": [node("andExpression", json!({
					"comparisonExpression": [node("comparisonExpression", json!({
						"additiveExpression": [node("additiveExpression", json!({
							"multiplicativeExpression": [divide]
						}))]
					}))]
				}))]
			}))]
		}),
	);
	let eval = command(
		"evalCommand",
		node(
			"evalCommand",
			json!({
				"assignment": [node("assignment", json!({
					"fieldName": [field_name("kb")],
					"expression": [expression]
				}))]
			}),
		),
	);
	let rename = command(
		"renameCommand",
		node(
			"renameCommand",
			json!({
				"renamePair": [node("renamePair", json!({
					"source": [node("source", json!({ "fieldName": [field_name("kb")] }))],
					"target": [node("target", json!({ "fieldName": [field_name("kilobytes")] }))]
				}))]
			}),
		),
	);
	let cst = pipeline(None, vec![eval, rename]);

	let output = parse_json(&cst.to_string()).unwrap();
	assert!(output.warnings.is_empty());

	let PipelineStage::Command(eval) = &output.pipeline.stages[0] else {
		panic!("expected eval");
	};
	assert_eq!(eval.as_eval().assignments[0].depends_on, vec!["bytes"]);
	assert_eq!(eval.created_fields(), vec!["kb"]);

	let PipelineStage::Command(rename) = &output.pipeline.stages[1] else {
		panic!("expected rename");
	};
	assert_eq!(rename.consumed_fields(), vec!["kb"]);
	assert_eq!(rename.created_fields(), vec!["kilobytes"]);
}

#[test]
fn test_generic_command_still_traversed() {
	// unknown command with an embedded subsearch keeps lineage flowing
	let inner = pipeline(None, vec![stats_count()]);
	let unknown = node(
		"command",
		json!({
			"frobnicateCommand": [node("frobnicateCommand", json!({
				"subsearch": [node("subsearch", json!({ "inner": [inner] }))]
			}))]
		}),
	);
	let cst = pipeline(None, vec![unknown]);

	let output = parse_json(&cst.to_string()).unwrap();
	let PipelineStage::Command(generic) = &output.pipeline.stages[0] else {
		panic!("expected generic");
	};
	let generic = generic.as_generic();
	assert_eq!(generic.name, "frobnicate");
	assert_eq!(generic.subsearches.len(), 1);
	assert_eq!(generic.subsearches[0].len(), 1);
	assert_eq!(output.warnings.len(), 1);
}

#[test]
fn test_serialized_ast_shape() {
	let cst = pipeline(None, vec![stats_count()]);
	let output = parse_json(&cst.to_string()).unwrap();

	let serialized = serde_json::to_value(&output.pipeline).unwrap();
	assert_eq!(serialized["stages"][0]["type"], "Stats");
	assert_eq!(serialized["stages"][0]["variant"], "stats");
	assert_eq!(serialized["stages"][0]["aggregations"][0]["outputField"], "count");
	// locations serialize camelCase for the editor
	assert!(serialized["location"].get("startLine").is_some());
}

#[test]
fn test_location_aggregation_spans_pipeline() {
	let early = json!({
		"image": "index", "startLine": 1, "startColumn": 1, "startOffset": 0,
		"endLine": 1, "endColumn": 6, "endOffset": 5
	});
	let late = json!({
		"image": "count", "startLine": 1, "startColumn": 20, "startOffset": 19,
		"endLine": 1, "endColumn": 25, "endOffset": 24
	});
	let search = search_expression(vec![comparison_with("index", early)]);
	let stats = command(
		"statsCommand",
		node("statsCommand", json!({ "aggregation": [node("aggregation", json!({ "function": [late] }))] })),
	);
	let cst = pipeline(Some(search), vec![stats]);

	let first = parse_json(&cst.to_string()).unwrap();
	let second = parse_json(&cst.to_string()).unwrap();
	assert_eq!(first.pipeline.location, second.pipeline.location);
	assert_eq!(first.pipeline.location.start_offset, 0);
	assert_eq!(first.pipeline.location.end_offset, 24);
	assert_eq!(first.pipeline.location.end_column, 25);
}

fn comparison_with(field: &str, field_token: Value) -> Value {
	node(
		"searchTerm",
		json!({
			"fieldComparison": [node(
				"fieldComparison",
				json!({
					"fieldName": [node("fieldName", json!({ "Identifier": [field_token] }))],
					"Equals": [token("=")],
					"value": [node("value", json!({ "v": [token(field)] }))]
				}),
			)]
		}),
	)
}

#[test]
fn test_search_values_typed() {
	let numeric = node(
		"searchTerm",
		json!({
			"fieldComparison": [node(
				"fieldComparison",
				json!({
					"fieldName": [field_name("bytes")],
					"GreaterThan": [token(">")],
					"value": [node("value", json!({ "v": [typed("1024", "NumberLiteral")] }))]
				}),
			)]
		}),
	);
	let cst = pipeline(Some(search_expression(vec![numeric])), vec![]);
	let output = parse_json(&cst.to_string()).unwrap();
	let PipelineStage::Search(search) = &output.pipeline.stages[0] else {
		panic!("expected search");
	};
	let SearchTerm::Comparison(built) = &search.terms[0] else {
		panic!("expected comparison");
	};
	assert_eq!(built.value, SearchValue::Number(1024.0));
}

#[test]
fn test_empty_pipeline_degenerate_but_legal() {
	let output = build_pipeline(&serde_json::from_str("{}").unwrap());
	assert!(output.pipeline.is_empty());
	assert!(output.warnings.is_empty());
}

#[test]
fn test_rex_pipeline_extracts_fields() {
	let rex = command(
		"rexCommand",
		node(
			"rexCommand",
			json!({
				"optionName": [token("field")],
				"optionValue": [typed("\"message\"", "StringLiteral")],
				"StringLiteral": [typed("\"(?<ip>\\d+):(?<port>\\d+)\"", "StringLiteral")]
			}),
		),
	);
	let cst = pipeline(None, vec![rex]);
	let output = parse_json(&cst.to_string()).unwrap();
	let PipelineStage::Command(rex) = &output.pipeline.stages[0] else {
		panic!("expected rex");
	};
	assert_eq!(rex.as_rex().extracted_fields, vec!["ip", "port"]);
	assert_eq!(rex.created_fields(), vec!["ip", "port"]);
	assert_eq!(rex.consumed_fields(), vec!["message"]);
}

#[test]
fn test_pipeline_referenced_fields_across_stages() {
	// index=main | stats count BY host | table host
	let stats = command(
		"statsCommand",
		node(
			"statsCommand",
			json!({
				"aggregation": [node("aggregation", json!({ "function": [token("count")] }))],
				"byClause": [node("byClause", json!({ "fieldName": [field_name("host")] }))]
			}),
		),
	);
	let table = command("tableCommand", node("tableCommand", json!({ "fieldName": [field_name("host")] })));
	let cst = pipeline(
		Some(search_expression(vec![comparison("index", token("main"))])),
		vec![stats, table],
	);
	let output = parse_json(&cst.to_string()).unwrap();
	assert_eq!(output.pipeline.referenced_fields(), vec!["index", "host"]);
}
