// std
use std::time::Duration as StdDuration;
// self
use crate::{
	client_auth::ClientAuthMethod,
	obs::{RequestKind, RequestOutcome},
};

/// Counter incremented once per attempt, success, and failure.
pub const REQUEST_TOTAL_METRIC: &str = "auth0_authentication_request_total";
/// Histogram of wall-clock request latency in seconds, recorded on completion.
pub const REQUEST_DURATION_METRIC: &str = "auth0_authentication_request_duration_seconds";

/// Records a request outcome via the global metrics recorder (when enabled).
///
/// `auth_method` is the credential style attached to the body; plain verbs pass
/// [`ClientAuthMethod::None`].
pub fn record_request_outcome(
	kind: RequestKind,
	auth_method: ClientAuthMethod,
	outcome: RequestOutcome,
) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			REQUEST_TOTAL_METRIC,
			"kind" => kind.as_str(),
			"auth_method" => auth_method.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, auth_method, outcome);
	}
}

/// Records how long a finished request took, labeled by its terminal outcome.
pub fn record_request_duration(kind: RequestKind, outcome: RequestOutcome, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!(
			REQUEST_DURATION_METRIC,
			"kind" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.record(elapsed.as_secs_f64());
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome, elapsed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_is_a_noop_without_recorder() {
		record_request_outcome(
			RequestKind::AuthenticatedPost,
			ClientAuthMethod::PrivateKeyJwt,
			RequestOutcome::Failure,
		);
		record_request_duration(
			RequestKind::Get,
			RequestOutcome::Success,
			StdDuration::from_millis(12),
		);
	}
}
