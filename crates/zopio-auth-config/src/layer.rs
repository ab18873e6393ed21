// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by a single source.

use serde::{Deserialize, Serialize};

use crate::sections::{AuditConfigLayer, LoggingConfigLayer, PolicyConfigLayer};

/// One source's view of the configuration. Every field is optional so layers
/// can be merged in precedence order before defaults are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccessConfigLayer {
	pub audit: Option<AuditConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
	pub policy: Option<PolicyConfigLayer>,
}

impl AccessConfigLayer {
	/// Overlays `other` onto `self`, section by section.
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.audit, other.audit, AuditConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_section(&mut self.policy, other.policy, PolicyConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, overlay: Option<T>, merge: fn(&mut T, T)) {
	let Some(overlay) = overlay else {
		return;
	};
	match base {
		Some(base) => merge(base, overlay),
		None => *base = Some(overlay),
	}
}
