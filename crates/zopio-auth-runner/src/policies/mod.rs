// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Built-in attribute-based policies.
//!
//! Each module contributes rules for one concern:
//!
//! - [`organization`]: membership checks against `organizationId`
//! - [`document`]: ownership and organization sharing of documents
//! - [`profile`]: self-service profile access with sensitive fields hidden

pub mod document;
pub mod organization;
pub mod profile;

use zopio_auth_rbac::Rule;

/// All built-in ABAC rules in evaluation order.
pub fn abac_rules() -> Vec<Rule> {
	let mut rules = organization::rules();
	rules.extend(document::rules());
	rules.extend(profile::rules());
	rules
}
