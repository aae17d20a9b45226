//! Optional observability helpers for Authentication API requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `auth0_authentication.request` with the
//!   `kind` (verb), `auth_method`, and `url` fields.
//! - Enable `metrics` to increment the `auth0_authentication_request_total` counter for every
//!   attempt/success/failure, labeled by `kind`, `auth_method`, and `outcome`, and to record
//!   `auth0_authentication_request_duration_seconds` once the request settles.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// std
use std::time::Instant;
// self
use crate::{_prelude::*, client_auth::ClientAuthMethod};

/// Request kinds issued by the authentication base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
	/// Plain `GET`.
	Get,
	/// Plain `POST`.
	Post,
	/// `POST` with client credentials attached.
	AuthenticatedPost,
}
impl RequestKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestKind::Get => "get",
			RequestKind::Post => "post",
			RequestKind::AuthenticatedPost => "authenticated_post",
		}
	}
}
impl Display for RequestKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to a verb helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::Failure => "failure",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a request span, recording attempt, outcome, and latency around it.
pub async fn observe<T, Fut>(
	kind: RequestKind,
	auth_method: ClientAuthMethod,
	url: &str,
	fut: Fut,
) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = RequestSpan::new(kind, auth_method, url);
	let started = Instant::now();

	record_request_outcome(kind, auth_method, RequestOutcome::Attempt);

	let result = span.instrument(fut).await;
	let outcome = if result.is_ok() { RequestOutcome::Success } else { RequestOutcome::Failure };

	record_request_outcome(kind, auth_method, outcome);
	record_request_duration(kind, outcome, started.elapsed());

	result
}
