// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy loading configuration section.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfigLayer {
	pub roles_file: Option<PathBuf>,
	pub strict_placeholders: Option<bool>,
}

impl PolicyConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.roles_file.is_some() {
			self.roles_file = other.roles_file;
		}
		if other.strict_placeholders.is_some() {
			self.strict_placeholders = other.strict_placeholders;
		}
	}

	pub fn finalize(self) -> PolicyConfig {
		PolicyConfig {
			roles_file: self.roles_file,
			strict_placeholders: self.strict_placeholders.unwrap_or(false),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
	/// TOML role tables replacing the built-in roles when set.
	pub roles_file: Option<PathBuf>,
	/// Fail conditions whose `${user.*}` placeholders do not resolve.
	pub strict_placeholders: bool,
}
