// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request guard for HTTP handlers.
//!
//! The guard does not authenticate. It expects the authentication layer to
//! have inserted a [`UserContext`] into the request extensions and answers:
//!
//! ```text
//! Request ─→ UserContext in extensions? ─no──→ Rejected(401)
//!                      │ yes
//!                      ↓
//!            decide(ctx), by default evaluate(rules, ctx, action, resource)
//!                      │
//!                      ├── can   ─→ Authorized(request)
//!                      └── !can  ─→ Rejected(403, { reason })
//! ```

use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Request, Response, StatusCode};
use serde_json::json;
use tracing::{debug, instrument};
use zopio_auth_rbac::{Action, EvaluationOptions, Rule, UserContext};

use crate::engine::evaluate;
use crate::types::{EvaluationInput, EvaluationResult};

/// Outcome of [`authorize`]: either the request to hand to the next handler,
/// or the response to send instead.
#[derive(Debug)]
pub enum Authorization<B> {
	Authorized(Request<B>),
	Rejected(Response<String>),
}

impl<B> Authorization<B> {
	pub fn is_authorized(&self) -> bool {
		matches!(self, Authorization::Authorized(_))
	}
}

pub fn authorize<B>(
	request: Request<B>,
	rules: &[Rule],
	action: Action,
	resource: &str,
) -> Authorization<B> {
	authorize_with_options(request, rules, action, resource, EvaluationOptions::default())
}

pub fn authorize_with_options<B>(
	request: Request<B>,
	rules: &[Rule],
	action: Action,
	resource: &str,
	options: EvaluationOptions,
) -> Authorization<B> {
	authorize_with(request, |context| {
		evaluate(&EvaluationInput::new(rules, context, action, resource).with_options(options))
	})
}

/// Runs `decide` against the request's [`UserContext`]. Lets callers route
/// the decision through their own evaluator, such as an audited one.
#[instrument(level = "debug", skip(request, decide), fields(method = %request.method(), uri = %request.uri()))]
pub fn authorize_with<B, F>(request: Request<B>, decide: F) -> Authorization<B>
where
	F: FnOnce(&UserContext) -> EvaluationResult,
{
	let Some(context) = request.extensions().get::<UserContext>() else {
		debug!("no user context on request");
		return Authorization::Rejected(json_response(
			StatusCode::UNAUTHORIZED,
			"unauthorized",
			"authentication required",
		));
	};

	let result = decide(context);
	if result.can {
		return Authorization::Authorized(request);
	}

	let reason = result
		.reason
		.map(|reason| reason.to_string())
		.unwrap_or_default();
	Authorization::Rejected(json_response(StatusCode::FORBIDDEN, "forbidden", &reason))
}

fn json_response(status: StatusCode, error: &str, reason: &str) -> Response<String> {
	let body = json!({ "error": error, "reason": reason }).to_string();
	let mut response = Response::new(body);
	*response.status_mut() = status;
	response
		.headers_mut()
		.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
	response
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::Value;

	fn request_with(ctx: Option<UserContext>) -> Request<()> {
		let mut request = Request::builder()
			.uri("/dashboard")
			.body(())
			.unwrap();
		if let Some(ctx) = ctx {
			request.extensions_mut().insert(ctx);
		}
		request
	}

	fn body(response: &Response<String>) -> Value {
		serde_json::from_str(response.body()).unwrap()
	}

	#[test]
	fn missing_context_is_unauthorized() {
		let rules = vec![Rule::can(Action::Read, "Dashboard")];
		match authorize(request_with(None), &rules, Action::Read, "Dashboard") {
			Authorization::Rejected(response) => {
				assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
				assert_eq!(body(&response)["error"], "unauthorized");
			}
			Authorization::Authorized(_) => panic!("expected rejection"),
		}
	}

	#[test]
	fn denial_is_forbidden_with_reason() {
		let rules = vec![Rule::can(Action::Read, "Dashboard")];
		let request = request_with(Some(UserContext::new("1", "viewer")));
		match authorize(request, &rules, Action::Delete, "Dashboard") {
			Authorization::Rejected(response) => {
				assert_eq!(response.status(), StatusCode::FORBIDDEN);
				assert_eq!(
					response.headers().get(CONTENT_TYPE).unwrap(),
					"application/json"
				);
				assert_eq!(body(&response)["reason"], "No matching rule found");
			}
			Authorization::Authorized(_) => panic!("expected rejection"),
		}
	}

	#[test]
	fn allowed_request_is_passed_through() {
		let rules = vec![Rule::can(Action::Read, "Dashboard")];
		let request = request_with(Some(UserContext::new("1", "viewer")));
		match authorize(request, &rules, Action::Read, "Dashboard") {
			Authorization::Authorized(request) => {
				assert_eq!(request.uri(), "/dashboard");
				assert!(request.extensions().get::<UserContext>().is_some());
			}
			Authorization::Rejected(response) => panic!("unexpected rejection: {}", response.body()),
		}
	}

	#[test]
	fn custom_decision_sees_context() {
		let request = request_with(Some(UserContext::new("7", "viewer")));
		let authorization = authorize_with(request, |ctx| {
			assert_eq!(ctx.id, "7");
			EvaluationResult::allowed()
		});
		assert!(authorization.is_authorized());
	}

	#[test]
	fn role_gated_rules_apply_to_request_context() {
		let rules = crate::combine::combined_rules();
		let viewer = request_with(Some(UserContext::new("1", "viewer")));
		let stranger = request_with(Some(UserContext::new("2", "contractor")));
		assert!(authorize(viewer, rules, Action::Read, "Dashboard").is_authorized());
		assert!(!authorize(stranger, rules, Action::Read, "Dashboard").is_authorized());
	}
}
