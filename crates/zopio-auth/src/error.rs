// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;
use zopio_auth_audit::AuditError;
use zopio_auth_config::ConfigError;
use zopio_auth_rbac::RbacError;

pub type Result<T> = std::result::Result<T, AccessControlError>;

/// Errors raised while assembling an [`AccessControl`](crate::AccessControl).
///
/// Evaluation itself never fails; a miss is a denied result.
#[derive(Error, Debug)]
pub enum AccessControlError {
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("role tables error: {0}")]
	Rbac(#[from] RbacError),

	#[error("audit setup error: {0}")]
	Audit(#[from] AuditError),
}
