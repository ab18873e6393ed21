// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod audit;
mod logging;
mod policy;

pub use audit::{
	AuditConfig, AuditConfigLayer, FileSinkConfig, FileSinkConfigLayer, OutcomeFilter,
	QueueOverflowPolicy,
};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use policy::{PolicyConfig, PolicyConfigLayer};
