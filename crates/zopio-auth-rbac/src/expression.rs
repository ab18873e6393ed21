// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Declarative rule conditions.
//!
//! An [`Expression`] is the serializable alternative to a native predicate.
//! Queries inside it may reference the user through `${user.<path>}`
//! placeholders, which are resolved per evaluation.
//!
//! ```text
//! { "all": [ { "role": "user" }, { "record": { "userId": "${user.id}" } } ] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::QueryError;
use crate::query::{matches, matches_object, validate_query};
use crate::substitution::{substitute, try_substitute};
use crate::types::{EvaluationOptions, Record, UserContext};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
	/// Query over the record being checked. An absent record matches only
	/// queries that hold for an empty document.
	Record(Value),
	/// Query over the user context view.
	Context(Value),
	/// The context's role equals the given name.
	Role(String),
	All(Vec<Expression>),
	Any(Vec<Expression>),
	Not(Box<Expression>),
}

impl Expression {
	pub fn record(query: Value) -> Self {
		Expression::Record(query)
	}

	pub fn context(query: Value) -> Self {
		Expression::Context(query)
	}

	pub fn role(name: impl Into<String>) -> Self {
		Expression::Role(name.into())
	}

	pub fn negate(self) -> Self {
		Expression::Not(Box::new(self))
	}

	/// Evaluates the expression. Unresolved placeholders under
	/// `strict_placeholders` make the whole expression false.
	pub fn evaluate(
		&self,
		context: &UserContext,
		record: Option<&Record>,
		options: &EvaluationOptions,
	) -> bool {
		self.eval(context, record, options).unwrap_or(false)
	}

	// `None` means a placeholder did not resolve under strict mode. It
	// propagates through `not` so negation cannot turn a miss into a grant.
	fn eval(
		&self,
		context: &UserContext,
		record: Option<&Record>,
		options: &EvaluationOptions,
	) -> Option<bool> {
		match self {
			Expression::Record(query) => {
				let query = resolve(query, context, options)?;
				Some(matches_object(&query, record))
			}
			Expression::Context(query) => {
				let query = resolve(query, context, options)?;
				Some(matches(&query, &context.view()))
			}
			Expression::Role(role) => Some(context.role == *role),
			Expression::All(exprs) => {
				let mut unresolved = false;
				for expr in exprs {
					match expr.eval(context, record, options) {
						Some(false) => return Some(false),
						None => unresolved = true,
						Some(true) => {}
					}
				}
				(!unresolved).then_some(true)
			}
			Expression::Any(exprs) => {
				let mut unresolved = false;
				for expr in exprs {
					match expr.eval(context, record, options) {
						Some(true) => return Some(true),
						None => unresolved = true,
						Some(false) => {}
					}
				}
				(!unresolved).then_some(false)
			}
			Expression::Not(expr) => expr.eval(context, record, options).map(|b| !b),
		}
	}

	/// Validates every embedded query.
	pub fn validate(&self) -> Result<(), QueryError> {
		match self {
			Expression::Record(query) | Expression::Context(query) => validate_query(query),
			Expression::Role(_) => Ok(()),
			Expression::All(exprs) | Expression::Any(exprs) => {
				exprs.iter().try_for_each(Expression::validate)
			}
			Expression::Not(expr) => expr.validate(),
		}
	}
}

fn resolve(query: &Value, context: &UserContext, options: &EvaluationOptions) -> Option<Value> {
	if !options.strict_placeholders {
		return Some(substitute(query, context));
	}

	match try_substitute(query, context) {
		Ok(query) => Some(query),
		Err(e) => {
			debug!(user_id = %context.id, error = %e, "condition failed closed");
			None
		}
	}
}
