// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating rule data.
///
/// These surface at registry load time. A check against a role that was never
/// loaded is not an error: it yields no rules and therefore denies.
#[derive(Error, Debug)]
pub enum RbacError {
	#[error("unknown action '{0}'")]
	UnknownAction(String),

	#[error("invalid rule template {index} for role '{role}': {message}")]
	InvalidTemplate {
		role: String,
		index: usize,
		message: String,
	},

	#[error("failed to read roles file {}: {source}", path.display())]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse roles file: {0}")]
	TomlParse(#[from] toml::de::Error),
}

/// Structural problems in a declarative condition query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
	#[error("query must be a JSON object")]
	NotAnObject,

	#[error("unknown operator '{0}'")]
	UnknownOperator(String),

	#[error("operator '{op}' expects {expected}")]
	InvalidOperand { op: String, expected: &'static str },

	#[error("field '{0}' mixes operators with literal keys")]
	MixedOperators(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubstitutionError {
	#[error("placeholder '${{user.{0}}}' did not resolve against the user context")]
	Unresolved(String),

	#[error("malformed placeholder in '{0}'")]
	MalformedPlaceholder(String),

	#[error("conditions are not JSON-serializable: {0}")]
	NotSerializable(String),
}
