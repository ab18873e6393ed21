// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use thiserror::Error;

pub type AuditResult<T> = Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
	#[error("enqueue timed out after {0:?}")]
	Timeout(Duration),

	#[error("sink '{sink}' error: {source}")]
	SinkError {
		sink: String,
		#[source]
		source: AuditSinkError,
	},

	#[error("service is shutting down")]
	Shutdown,
}

#[derive(Error, Debug)]
pub enum AuditSinkError {
	#[error("transient error: {0}")]
	Transient(String),

	#[error("permanent error: {0}")]
	Permanent(String),
}
