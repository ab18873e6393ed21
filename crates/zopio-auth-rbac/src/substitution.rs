// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolution of `${user.<path>}` placeholders in rule conditions.
//!
//! Substitution walks the condition tree and rewrites string leaves:
//!
//! - a string that is exactly one placeholder takes the resolved value with
//!   its JSON type, so `"${user.attributes.level}"` can become `3`
//! - placeholders embedded in longer strings are rendered as text
//! - everything else is copied unchanged
//!
//! An unresolved path becomes the empty string. This keeps compatibility with
//! existing role tables but means `{ "userId": "${user.missing}" }` matches
//! records whose `userId` is `""`. [`try_substitute`] reports the miss instead.

use std::convert::Infallible;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SubstitutionError;
use crate::types::UserContext;

const PLACEHOLDER_PREFIX: &str = "${user.";

static PLACEHOLDER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\$\{user\.([^}]*)\}").unwrap());

/// Replaces placeholders, substituting `""` for unresolved paths.
pub fn substitute(conditions: &Value, context: &UserContext) -> Value {
	let lenient = |path: &str| -> Result<Value, Infallible> {
		Ok(context
			.lookup(path)
			.unwrap_or_else(|| Value::String(String::new())))
	};

	match walk(conditions, &lenient) {
		Ok(value) => value,
		Err(never) => match never {},
	}
}

/// Replaces placeholders, failing on the first path that does not resolve.
pub fn try_substitute(conditions: &Value, context: &UserContext) -> Result<Value, SubstitutionError> {
	let strict = |path: &str| {
		context
			.lookup(path)
			.ok_or_else(|| SubstitutionError::Unresolved(path.to_string()))
	};

	walk(conditions, &strict)
}

/// Serializes `conditions` and substitutes placeholders.
///
/// # Panics
///
/// Panics if `conditions` cannot be represented as JSON (for example a map
/// with non-string keys). Condition data is authored in code, so this is a
/// programming error rather than a runtime condition.
pub fn substitute_conditions<T: Serialize + ?Sized>(conditions: &T, context: &UserContext) -> Value {
	match try_substitute_conditions(conditions, context) {
		Ok(value) => value,
		Err(e) => panic!("invalid rule conditions: {e}"),
	}
}

/// Fallible form of [`substitute_conditions`].
pub fn try_substitute_conditions<T: Serialize + ?Sized>(
	conditions: &T,
	context: &UserContext,
) -> Result<Value, SubstitutionError> {
	let value = serde_json::to_value(conditions)
		.map_err(|e| SubstitutionError::NotSerializable(e.to_string()))?;
	Ok(substitute(&value, context))
}

/// Rejects strings with an empty placeholder path or an unterminated
/// `${user.` token.
pub fn validate_placeholders(conditions: &Value) -> Result<(), SubstitutionError> {
	match conditions {
		Value::String(s) => validate_str(s),
		Value::Array(items) => items.iter().try_for_each(validate_placeholders),
		Value::Object(map) => map.values().try_for_each(validate_placeholders),
		_ => Ok(()),
	}
}

fn validate_str(s: &str) -> Result<(), SubstitutionError> {
	let tokens = s.matches(PLACEHOLDER_PREFIX).count();
	let mut well_formed = 0;
	for caps in PLACEHOLDER.captures_iter(s) {
		if caps[1].is_empty() || caps[1].split('.').any(str::is_empty) {
			return Err(SubstitutionError::MalformedPlaceholder(s.to_string()));
		}
		well_formed += 1;
	}
	if tokens != well_formed {
		return Err(SubstitutionError::MalformedPlaceholder(s.to_string()));
	}
	Ok(())
}

fn walk<F, E>(value: &Value, resolve: &F) -> Result<Value, E>
where
	F: Fn(&str) -> Result<Value, E>,
{
	match value {
		Value::String(s) => substitute_str(s, resolve),
		Value::Array(items) => items
			.iter()
			.map(|item| walk(item, resolve))
			.collect::<Result<Vec<_>, _>>()
			.map(Value::Array),
		Value::Object(map) => map
			.iter()
			.map(|(k, v)| Ok((k.clone(), walk(v, resolve)?)))
			.collect::<Result<Map<_, _>, _>>()
			.map(Value::Object),
		other => Ok(other.clone()),
	}
}

fn substitute_str<F, E>(s: &str, resolve: &F) -> Result<Value, E>
where
	F: Fn(&str) -> Result<Value, E>,
{
	if !s.contains(PLACEHOLDER_PREFIX) {
		return Ok(Value::String(s.to_string()));
	}

	if let Some(caps) = PLACEHOLDER.captures(s) {
		if let Some(whole) = caps.get(0) {
			if whole.start() == 0 && whole.end() == s.len() {
				return resolve(&caps[1]);
			}
		}
	}

	let mut out = String::with_capacity(s.len());
	let mut last = 0;
	for caps in PLACEHOLDER.captures_iter(s) {
		let Some(token) = caps.get(0) else {
			continue;
		};
		out.push_str(&s[last..token.start()]);
		out.push_str(&render(resolve(&caps[1])?));
		last = token.end();
	}
	out.push_str(&s[last..]);

	Ok(Value::String(out))
}

fn render(value: Value) -> String {
	match value {
		Value::String(s) => s,
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::json;
	use std::collections::HashMap;

	fn ctx() -> UserContext {
		UserContext::new("u1", "user")
			.with_organization("org-7")
			.with_attribute("level", 3)
			.with_attribute("team", json!({"name": "core"}))
	}

	#[test]
	fn resolves_user_id() {
		let out = substitute(&json!({"userId": "${user.id}"}), &ctx());
		assert_eq!(out, json!({"userId": "u1"}));
	}

	#[test]
	fn resolves_nested_structures() {
		let conditions = json!({
			"$or": [
				{"ownerId": "${user.id}"},
				{"organizationId": {"$in": ["${user.organizationId}", "public"]}}
			]
		});
		let out = substitute(&conditions, &ctx());
		assert_eq!(
			out,
			json!({
				"$or": [
					{"ownerId": "u1"},
					{"organizationId": {"$in": ["org-7", "public"]}}
				]
			})
		);
	}

	#[test]
	fn whole_placeholder_keeps_json_type() {
		let out = substitute(&json!({"level": {"$lte": "${user.level}"}}), &ctx());
		assert_eq!(out, json!({"level": {"$lte": 3}}));
	}

	#[test]
	fn embedded_placeholders_render_as_text() {
		let out = substitute(
			&json!({"path": "orgs/${user.organizationId}/teams/${user.team.name}/${user.level}"}),
			&ctx(),
		);
		assert_eq!(out, json!({"path": "orgs/org-7/teams/core/3"}));
	}

	#[test]
	fn unresolved_path_becomes_empty_string() {
		let out = substitute(&json!({"userId": "${user.missing}"}), &ctx());
		assert_eq!(out, json!({"userId": ""}));

		let out = substitute(&json!({"key": "a-${user.missing}-b"}), &ctx());
		assert_eq!(out, json!({"key": "a--b"}));
	}

	#[test]
	fn strict_mode_reports_unresolved_path() {
		let err = try_substitute(&json!({"userId": "${user.missing}"}), &ctx()).unwrap_err();
		assert_eq!(err, SubstitutionError::Unresolved("missing".to_string()));
	}

	#[test]
	fn strict_mode_resolves_known_paths() {
		let out = try_substitute(&json!({"userId": "${user.id}"}), &ctx()).unwrap();
		assert_eq!(out, json!({"userId": "u1"}));
	}

	#[test]
	fn other_placeholder_namespaces_pass_through() {
		let conditions = json!({"env": "${env.HOME}", "plain": "$5"});
		assert_eq!(substitute(&conditions, &ctx()), conditions);
	}

	#[test]
	fn substitute_conditions_accepts_serializable_structs() {
		#[derive(Serialize)]
		struct Owned {
			#[serde(rename = "userId")]
			user_id: &'static str,
		}
		let out = substitute_conditions(&Owned { user_id: "${user.id}" }, &ctx());
		assert_eq!(out, json!({"userId": "u1"}));
	}

	#[test]
	fn non_serializable_conditions_are_rejected() {
		let mut bad: HashMap<Vec<u8>, &str> = HashMap::new();
		bad.insert(vec![1], "${user.id}");
		let err = try_substitute_conditions(&bad, &ctx()).unwrap_err();
		assert!(matches!(err, SubstitutionError::NotSerializable(_)));
	}

	#[test]
	#[should_panic(expected = "invalid rule conditions")]
	fn substitute_conditions_panics_on_non_serializable_input() {
		let mut bad: HashMap<Vec<u8>, &str> = HashMap::new();
		bad.insert(vec![1], "${user.id}");
		substitute_conditions(&bad, &ctx());
	}

	mod validation {
		use super::*;

		#[test]
		fn accepts_well_formed_placeholders() {
			let q = json!({"a": "${user.id}", "b": ["x-${user.attributes.team}"]});
			assert_eq!(validate_placeholders(&q), Ok(()));
		}

		#[test]
		fn rejects_empty_path() {
			assert!(validate_placeholders(&json!({"a": "${user.}"})).is_err());
			assert!(validate_placeholders(&json!({"a": "${user.a..b}"})).is_err());
		}

		#[test]
		fn rejects_unterminated_token() {
			assert!(validate_placeholders(&json!({"a": "${user.id"})).is_err());
		}
	}

	fn arb_plain_json() -> impl Strategy<Value = Value> {
		let leaf = prop_oneof![
			Just(Value::Null),
			any::<bool>().prop_map(Value::Bool),
			any::<i64>().prop_map(Value::from),
			"[a-zA-Z0-9 _.$}{-]{0,12}".prop_map(Value::String),
		];
		leaf.prop_recursive(3, 24, 4, |inner| {
			prop_oneof![
				prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
				prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
					.prop_map(|m| Value::Object(m.into_iter().collect())),
			]
		})
	}

	proptest! {
		#[test]
		fn substitution_is_identity_without_placeholders(value in arb_plain_json()) {
			prop_assume!(!value.to_string().contains(PLACEHOLDER_PREFIX));
			prop_assert_eq!(substitute(&value, &ctx()), value);
		}

		#[test]
		fn strict_and_lenient_agree_when_all_paths_resolve(id in "[a-z0-9]{1,8}") {
			let ctx = UserContext::new(id.clone(), "user");
			let conditions = json!({"userId": "${user.id}", "tag": "t-${user.role}"});
			prop_assert_eq!(try_substitute(&conditions, &ctx).unwrap(), substitute(&conditions, &ctx));
		}
	}
}
