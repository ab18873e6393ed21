// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decision audit for zopio access control.
//!
//! - [`AuditRecord`]: one access decision with its input and outcome
//! - [`AuditSink`]: pluggable destination; tracing, JSON-lines file and
//!   in-memory sinks are built in
//! - [`AuditService`]: bounded queue delivering records to sinks off the
//!   request path
//! - [`AuditedEvaluator`]: `evaluate` that emits exactly one record per call

pub mod audited;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod sink;

pub use audited::AuditedEvaluator;
pub use error::{AuditError, AuditResult, AuditSinkError};
pub use pipeline::AuditService;
pub use record::AuditRecord;
pub use sink::memory::MemoryAuditSink;
pub use sink::{sinks_from_config, AuditSink};

pub use zopio_auth_config::{AuditConfig, FileSinkConfig, OutcomeFilter, QueueOverflowPolicy};

#[cfg(feature = "sink-file")]
pub use sink::file::FileAuditSink;

#[cfg(feature = "sink-tracing")]
pub use sink::tracing::TracingAuditSink;
