// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role-based rule model for zopio access control.
//!
//! This crate owns the data that every access check reads:
//!
//! - [`Rule`]: a resource/action match key with an optional [`Condition`],
//!   field permissions and an inversion flag
//! - [`RoleRegistry`]: static `role -> [RuleTemplate]` tables with
//!   `${user.<path>}` placeholders, validated when loaded
//! - [`substitute`]: resolution of placeholders against a [`UserContext`]
//! - [`Ability`]: the CASL-style `can(action, subject, record?)` facade built
//!   from a role's expanded templates
//!
//! Evaluation of raw rule lists lives in `zopio-auth-runner`.

pub mod ability;
pub mod error;
pub mod expression;
pub mod query;
pub mod roles;
pub mod substitution;
pub mod types;

pub use ability::{create_ability_for, Ability, AbilityRule};
pub use error::{QueryError, RbacError, SubstitutionError};
pub use expression::Expression;
pub use roles::{RoleRegistry, RuleTemplate, ADMIN_ROLE, ALL_SUBJECTS, USER_ROLE, VIEWER_ROLE};
pub use substitution::{
	substitute, substitute_conditions, try_substitute, try_substitute_conditions,
};
pub use types::{
	Action, Condition, EvaluationOptions, FieldAccess, Predicate, Record, Rule, UserContext,
};
