//! Error taxonomy shared by the REST client, client authentication, and the authentication base.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error code reported when a failed response carries no recognizable code.
pub const UNKNOWN_ERROR: &str = "a0.sdk.internal.unknown";

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Authentication API answered with a non-success status.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Authentication API throttled the request (HTTP 429).
	#[error(transparent)]
	RateLimit(#[from] RateLimitError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Client credentials could not be attached to the payload.
	#[error(transparent)]
	ClientAuth(#[from] ClientAuthError),
}
impl Error {
	/// HTTP status associated with the failure, when the server produced one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api(e) => Some(e.status),
			Self::RateLimit(_) => Some(RateLimitError::STATUS),
			_ => None,
		}
	}

	/// Server-supplied error code, when the server produced one.
	pub fn error_code(&self) -> Option<&str> {
		match self {
			Self::Api(e) => Some(&e.error_code),
			Self::RateLimit(e) => Some(&e.error_code),
			_ => None,
		}
	}
}

/// Non-success response returned by the Authentication API.
#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("{status}: {message}")]
pub struct ApiError {
	/// HTTP status code.
	pub status: u16,
	/// Server error code (`error`, `errorCode`, or `code` field).
	pub error_code: String,
	/// Human-readable message.
	pub message: String,
	/// Full response body, retained for errors that need follow-up data (`mfa_required`).
	pub content: Option<Value>,
}

/// Throttled response returned by the Authentication API.
#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("429: {message}")]
pub struct RateLimitError {
	/// Server error code.
	pub error_code: String,
	/// Human-readable message.
	pub message: String,
	/// Instant the rate-limit window resets, from `x-ratelimit-reset`.
	pub reset_at: Option<OffsetDateTime>,
}
impl RateLimitError {
	/// HTTP status used by rate-limited responses.
	pub const STATUS: u16 = 429;

	/// Remaining time until the window resets, or `None` once it has passed.
	pub fn retry_after(&self, now: OffsetDateTime) -> Option<Duration> {
		let delta = self.reset_at? - now;

		delta.is_positive().then_some(delta)
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Required configuration field is empty.
	#[error("The `{field}` setting cannot be empty.")]
	EmptyField {
		/// Field name.
		field: &'static str,
	},
	/// Field must not contain whitespace.
	#[error("The `{field}` setting contains whitespace.")]
	ContainsWhitespace {
		/// Field name.
		field: &'static str,
	},
	/// Timeout is not a finite positive number of seconds.
	#[error("Timeout must be a finite positive number of seconds, got {seconds}.")]
	InvalidTimeout {
		/// Offending value in seconds.
		seconds: f64,
	},
	/// URL cannot be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Raw URL string.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Header name or value cannot be sent over HTTP.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Header name as supplied.
		name: String,
	},
	/// Payload could not be encoded as JSON.
	#[error("Request payload could not be encoded.")]
	PayloadEncode(#[from] serde_json::Error),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Client assertion algorithm is not recognized.
	#[error("Client assertion signing algorithm `{alg}` is not supported.")]
	UnsupportedSigningAlgorithm {
		/// Algorithm name as supplied.
		alg: String,
	},
	/// Client assertion key cannot be used with the selected algorithm.
	#[error("Client assertion signing key is not valid for {alg:?}.")]
	InvalidSigningKey {
		/// Algorithm the key was loaded for.
		alg: jsonwebtoken::Algorithm,
		/// Underlying key parsing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the Authentication API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Connect or read timeout elapsed.
	#[error("Request timed out while calling the Authentication API.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Failures raised while attaching client credentials to a payload.
#[derive(Debug, ThisError)]
pub enum ClientAuthError {
	/// Client assertion JWT could not be signed.
	#[error("Client assertion could not be signed.")]
	Signing {
		/// Underlying signing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
}
