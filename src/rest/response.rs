//! Classifies raw HTTP responses into content or typed API errors.

// self
use crate::{
	_prelude::*,
	error::{ApiError, RateLimitError, UNKNOWN_ERROR},
};

/// Header carrying the epoch second at which the rate-limit window resets.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

const MFA_REQUIRED: &str = "mfa_required";

/// Parsed response body.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
	/// Zero-length body.
	Empty,
	/// Body parsed as JSON.
	Json(Value),
	/// Body that is not valid JSON.
	Plain(String),
}
impl ResponseBody {
	/// Parses raw bytes, falling back to text when they are not JSON.
	pub fn parse(bytes: &[u8]) -> Self {
		if bytes.is_empty() {
			return Self::Empty;
		}

		match serde_json::from_slice(bytes) {
			Ok(value) => Self::Json(value),
			Err(_) => Self::Plain(String::from_utf8_lossy(bytes).into_owned()),
		}
	}

	/// Error code reported by the body (`errorCode`, then `error`, then `code`).
	pub fn error_code(&self) -> String {
		let Self::Json(Value::Object(map)) = self else {
			return UNKNOWN_ERROR.into();
		};

		["errorCode", "error", "code"]
			.into_iter()
			.find_map(|key| map.get(key))
			.map(value_text)
			.unwrap_or_else(|| UNKNOWN_ERROR.into())
	}

	/// Error message reported by the body (`error_description`, then a non-empty `message`,
	/// then `error`).
	pub fn error_message(&self) -> String {
		match self {
			Self::Empty => String::new(),
			Self::Plain(text) => text.clone(),
			Self::Json(Value::Object(map)) => {
				if let Some(description) = map.get("error_description") {
					return value_text(description);
				}
				if let Some(message) = map.get("message").map(value_text).filter(|m| !m.is_empty())
				{
					return message;
				}

				map.get("error").map(value_text).unwrap_or_default()
			},
			Self::Json(_) => String::new(),
		}
	}

	/// Converts the body into the value returned to callers.
	pub fn into_content(self) -> Value {
		match self {
			Self::Empty => Value::Null,
			Self::Json(value) => value,
			Self::Plain(text) => Value::String(text),
		}
	}
}

/// Turns a status, the rate-limit reset header, and the body into content or an error.
///
/// Any status `>= 400` is an error: `429` becomes [`RateLimitError`], everything else
/// [`ApiError`].
pub fn classify(status: u16, rate_limit_reset: Option<&str>, body: &[u8]) -> Result<Value> {
	let body = ResponseBody::parse(body);

	if status < 400 {
		return Ok(body.into_content());
	}

	let error_code = body.error_code();
	let message = body.error_message();

	if status == RateLimitError::STATUS {
		return Err(RateLimitError {
			error_code,
			message,
			reset_at: rate_limit_reset.and_then(parse_reset),
		}
		.into());
	}

	let content = (error_code == MFA_REQUIRED).then(|| body.into_content());

	Err(ApiError { status, error_code, message, content }.into())
}

fn parse_reset(raw: &str) -> Option<OffsetDateTime> {
	let secs = raw.trim().parse::<i64>().ok()?;

	if secs < 0 {
		return None;
	}

	OffsetDateTime::from_unix_timestamp(secs).ok()
}

fn value_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}
