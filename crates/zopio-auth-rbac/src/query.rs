// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! MongoDB-style condition queries.
//!
//! A query is a JSON object whose keys are dotted field paths (or `$and`,
//! `$or`, `$nor`) and whose values are either literals, compared for
//! equality, or operator objects:
//!
//! ```text
//! { "userId": "42", "status": { "$in": ["draft", "review"] }, "age": { "$gte": 18 } }
//! ```
//!
//! Matching never fails: malformed or unknown operators evaluate to `false`.
//! Use [`validate_query`] at load time to reject them up front.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use crate::error::QueryError;

const KNOWN_OPERATORS: &[&str] = &[
	"$eq", "$ne", "$in", "$nin", "$gt", "$gte", "$lt", "$lte", "$exists",
];

/// Matches `query` against an arbitrary JSON document.
pub fn matches(query: &Value, doc: &Value) -> bool {
	matches_object(query, doc.as_object())
}

/// Matches `query` against an object, or against nothing when `doc` is `None`.
pub fn matches_object(query: &Value, doc: Option<&Map<String, Value>>) -> bool {
	let Value::Object(clauses) = query else {
		return false;
	};

	clauses.iter().all(|(key, cond)| match key.as_str() {
		"$and" => subqueries(cond).is_some_and(|mut qs| qs.all(|q| matches_object(q, doc))),
		"$or" => subqueries(cond).is_some_and(|mut qs| qs.any(|q| matches_object(q, doc))),
		"$nor" => subqueries(cond).is_some_and(|mut qs| !qs.any(|q| matches_object(q, doc))),
		path => field_matches(resolve_path(doc, path), cond),
	})
}

fn subqueries(cond: &Value) -> Option<std::slice::Iter<'_, Value>> {
	cond.as_array().map(|items| items.iter())
}

fn resolve_path<'a>(doc: Option<&'a Map<String, Value>>, path: &str) -> Option<&'a Value> {
	let mut segments = path.split('.');
	let first = doc?.get(segments.next()?)?;

	segments.try_fold(first, |current, segment| match current {
		Value::Object(map) => map.get(segment),
		Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
		_ => None,
	})
}

fn is_operator_object(map: &Map<String, Value>) -> bool {
	!map.is_empty() && map.keys().all(|k| k.starts_with('$'))
}

fn field_matches(value: Option<&Value>, cond: &Value) -> bool {
	match cond {
		Value::Object(ops) if is_operator_object(ops) => ops
			.iter()
			.all(|(op, operand)| apply_operator(op, value, operand)),
		_ => equals(value, cond),
	}
}

fn apply_operator(op: &str, value: Option<&Value>, operand: &Value) -> bool {
	match op {
		"$eq" => equals(value, operand),
		"$ne" => !equals(value, operand),
		"$in" => operand
			.as_array()
			.is_some_and(|items| items.iter().any(|item| equals(value, item))),
		"$nin" => operand
			.as_array()
			.is_some_and(|items| !items.iter().any(|item| equals(value, item))),
		"$gt" => compare(value, operand) == Some(Ordering::Greater),
		"$gte" => matches!(
			compare(value, operand),
			Some(Ordering::Greater | Ordering::Equal)
		),
		"$lt" => compare(value, operand) == Some(Ordering::Less),
		"$lte" => matches!(
			compare(value, operand),
			Some(Ordering::Less | Ordering::Equal)
		),
		"$exists" => operand
			.as_bool()
			.is_some_and(|expected| expected == value.is_some()),
		_ => false,
	}
}

/// Equality with array-contains semantics: an array field matches a scalar
/// when any element equals it.
fn equals(value: Option<&Value>, expected: &Value) -> bool {
	match value {
		None => expected.is_null(),
		Some(Value::Array(items)) if !expected.is_array() => {
			items.iter().any(|item| json_eq(item, expected))
		}
		Some(v) => json_eq(v, expected),
	}
}

fn json_eq(a: &Value, b: &Value) -> bool {
	match (a, b) {
		(Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
		_ => a == b,
	}
}

/// Integers compare exactly; floats only when either side is one.
fn compare_numbers(x: &Number, y: &Number) -> Option<Ordering> {
	match (x.as_i64(), y.as_i64(), x.as_u64(), y.as_u64()) {
		(Some(a), Some(b), _, _) => Some(a.cmp(&b)),
		(_, _, Some(a), Some(b)) => Some(a.cmp(&b)),
		// Mixed signs beyond i64: the u64 side is the larger.
		(Some(_), None, _, Some(_)) => Some(Ordering::Less),
		(None, Some(_), Some(_), _) => Some(Ordering::Greater),
		_ => x.as_f64()?.partial_cmp(&y.as_f64()?),
	}
}

fn compare(value: Option<&Value>, operand: &Value) -> Option<Ordering> {
	match (value?, operand) {
		(Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
		(Value::String(x), Value::String(y)) => Some(x.cmp(y)),
		_ => None,
	}
}

/// Checks that a query is an object built only from known operators with
/// well-formed operands.
pub fn validate_query(query: &Value) -> Result<(), QueryError> {
	let Value::Object(clauses) = query else {
		return Err(QueryError::NotAnObject);
	};

	for (key, cond) in clauses {
		match key.as_str() {
			"$and" | "$or" | "$nor" => {
				let items = cond.as_array().ok_or_else(|| QueryError::InvalidOperand {
					op: key.clone(),
					expected: "an array of queries",
				})?;
				for item in items {
					validate_query(item)?;
				}
			}
			k if k.starts_with('$') => return Err(QueryError::UnknownOperator(k.to_string())),
			field => validate_condition(field, cond)?,
		}
	}

	Ok(())
}

fn validate_condition(field: &str, cond: &Value) -> Result<(), QueryError> {
	let Value::Object(ops) = cond else {
		return Ok(());
	};

	let operator_keys = ops.keys().filter(|k| k.starts_with('$')).count();
	if operator_keys == 0 {
		return Ok(());
	}
	if operator_keys != ops.len() {
		return Err(QueryError::MixedOperators(field.to_string()));
	}

	for (op, operand) in ops {
		if !KNOWN_OPERATORS.contains(&op.as_str()) {
			return Err(QueryError::UnknownOperator(op.clone()));
		}
		let expected = match op.as_str() {
			"$in" | "$nin" if !operand.is_array() => Some("an array"),
			"$exists" if !operand.is_boolean() => Some("a boolean"),
			_ => None,
		};
		if let Some(expected) = expected {
			return Err(QueryError::InvalidOperand {
				op: op.clone(),
				expected,
			});
		}
	}

	Ok(())
}
