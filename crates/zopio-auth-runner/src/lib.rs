// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access evaluation for zopio.
//!
//! - [`evaluate`]: first-match scan of a rule list returning an
//!   [`EvaluationResult`] with a stable deny reason
//! - [`combine`] / [`combined_rules`]: RBAC rules followed by ABAC rules
//! - [`policies`]: the built-in ABAC rules
//! - [`authorize`]: request guard over `http::Request`

pub mod combine;
pub mod engine;
pub mod guard;
pub mod policies;
pub mod types;

pub use combine::{combine, combined_rules, rbac_rules};
pub use engine::evaluate;
pub use guard::{authorize, authorize_with, authorize_with_options, Authorization};
pub use policies::abac_rules;
pub use types::{DenyReason, EvaluationInput, EvaluationResult};
