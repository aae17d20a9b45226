//! Generic REST client used by the authentication base.
//!
//! [`RestClient`] is the only dependency the base has on an HTTP stack. The bundled
//! [`ReqwestRestClient`] sends JSON bodies, merges caller headers over the telemetry base
//! headers, and turns non-success responses into [`ApiError`](crate::error::ApiError) or
//! [`RateLimitError`](crate::error::RateLimitError) through [`response::classify`].

pub mod response;
pub mod telemetry;

// std
use std::time::Duration as StdDuration;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	Method,
	header::{HeaderMap, HeaderName, HeaderValue},
};
// self
use crate::{_prelude::*, config::Timeout};
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, RateLimitError, TransportError};

/// JSON object sent as a request body or flattened into query parameters.
pub type Payload = serde_json::Map<String, Value>;
/// Header name to value mapping; caller entries override base headers.
pub type Headers = BTreeMap<String, String>;
/// Boxed future returned by [`RestClient`] verbs.
pub type RestFuture<'a> = Pin<Box<dyn Future<Output = Result<Value>> + 'a + Send>>;

/// Upper bound on automatic 429 retries.
pub const MAX_REQUEST_RETRIES: u8 = 10;
/// Shortest wait between retries.
pub const MIN_REQUEST_RETRY_DELAY: StdDuration = StdDuration::from_millis(100);
/// Longest wait between retries.
pub const MAX_REQUEST_RETRY_DELAY: StdDuration = StdDuration::from_millis(1000);
/// Upper bound of the random jitter added to each retry wait, in milliseconds.
pub const MAX_REQUEST_RETRY_JITTER_MS: u64 = 100;

/// Minimal verb surface the authentication base delegates to.
///
/// Implementations return the deserialized response body on success and surface
/// non-success responses as [`Error::Api`] or [`Error::RateLimit`] without further
/// interpretation.
pub trait RestClient
where
	Self: 'static + Send + Sync,
{
	/// Issues a `GET` with `params` encoded as the query string.
	fn get<'a>(
		&'a self,
		url: &'a str,
		params: Option<&'a Payload>,
		headers: Option<&'a Headers>,
	) -> RestFuture<'a>;

	/// Issues a `POST` with `data` encoded as the JSON body.
	fn post<'a>(
		&'a self,
		url: &'a str,
		data: Option<&'a Payload>,
		headers: Option<&'a Headers>,
	) -> RestFuture<'a>;
}

/// Telemetry, timeout, and retry policy for a REST client.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RestClientOptions {
	/// Sends `User-Agent` and client-info headers when true.
	pub telemetry: bool,
	/// Connect and read timeouts.
	pub timeout: Timeout,
	/// Number of times a 429 response is retried (capped at [`MAX_REQUEST_RETRIES`]).
	pub retries: u8,
}
impl RestClientOptions {
	/// Effective retry count after capping.
	pub fn max_retries(&self) -> u8 {
		self.retries.min(MAX_REQUEST_RETRIES)
	}
}
impl Default for RestClientOptions {
	fn default() -> Self {
		Self { telemetry: true, timeout: Timeout::default(), retries: 3 }
	}
}

/// Wait before retry number `attempt` (1-based): `100ms * 2^(attempt - 1)` plus jitter,
/// clamped to [`MIN_REQUEST_RETRY_DELAY`]..=[`MAX_REQUEST_RETRY_DELAY`].
pub fn retry_delay(attempt: u8, jitter_ms: u64) -> StdDuration {
	let exponent = u32::from(attempt.saturating_sub(1));
	let base_ms = 100_u64.saturating_mul(2_u64.saturating_pow(exponent));
	let wait = StdDuration::from_millis(base_ms.saturating_add(jitter_ms));

	wait.clamp(MIN_REQUEST_RETRY_DELAY, MAX_REQUEST_RETRY_DELAY)
}

/// Flattens a payload into query pairs; `null` entries are dropped and strings are sent raw.
pub fn query_pairs(params: &Payload) -> Vec<(String, String)> {
	params
		.iter()
		.filter_map(|(key, value)| match value {
			Value::Null => None,
			Value::String(text) => Some((key.clone(), text.clone())),
			other => Some((key.clone(), other.to_string())),
		})
		.collect()
}

/// [`RestClient`] backed by reqwest.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestRestClient {
	client: ReqwestClient,
	options: RestClientOptions,
	base_headers: HeaderMap,
}
#[cfg(feature = "reqwest")]
impl ReqwestRestClient {
	/// Builds a reqwest client honoring the timeouts in `options`.
	pub fn new(options: RestClientOptions) -> Result<Self> {
		let client = ReqwestClient::builder()
			.connect_timeout(options.timeout.connect()?)
			.read_timeout(options.timeout.read()?)
			.build()
			.map_err(ConfigError::http_client_build)?;

		Self::with_client(client, options)
	}

	/// Wraps an existing reqwest client; its own timeout settings are left untouched.
	pub fn with_client(client: ReqwestClient, options: RestClientOptions) -> Result<Self> {
		let base_headers = header_map(&telemetry::base_headers(options.telemetry))?;

		Ok(Self { client, options, base_headers })
	}

	/// Policy this client was built with.
	pub fn options(&self) -> &RestClientOptions {
		&self.options
	}

	async fn send(
		&self,
		method: Method,
		url: &str,
		query: Option<Vec<(String, String)>>,
		body: Option<Vec<u8>>,
		headers: Option<&Headers>,
	) -> Result<Value> {
		let url = Url::parse(url)
			.map_err(|source| ConfigError::InvalidUrl { url: url.to_owned(), source })?;
		let mut request_headers = self.base_headers.clone();

		if let Some(headers) = headers {
			request_headers.extend(header_map(headers)?);
		}

		let max_retries = self.options.max_retries();
		let mut attempt = 0;

		loop {
			let mut request =
				self.client.request(method.clone(), url.clone()).headers(request_headers.clone());

			if let Some(query) = &query {
				request = request.query(query);
			}
			if let Some(body) = &body {
				request = request.body(body.clone());
			}

			let reply = request.send().await.map_err(TransportError::from)?;
			let status = reply.status().as_u16();

			if status == RateLimitError::STATUS && attempt < max_retries {
				attempt += 1;

				let jitter_ms = rand::random_range(1..=MAX_REQUEST_RETRY_JITTER_MS);
				let wait = retry_delay(attempt, jitter_ms);

				#[cfg(feature = "tracing")]
				tracing::debug!(
					%url,
					attempt,
					wait_ms = wait.as_millis() as u64,
					"rate limited, retrying"
				);

				tokio::time::sleep(wait).await;

				continue;
			}

			let reset = reply
				.headers()
				.get(response::RATE_LIMIT_RESET_HEADER)
				.and_then(|value| value.to_str().ok())
				.map(ToOwned::to_owned);
			let bytes = reply.bytes().await.map_err(TransportError::from)?;

			return response::classify(status, reset.as_deref(), &bytes);
		}
	}
}
#[cfg(feature = "reqwest")]
impl RestClient for ReqwestRestClient {
	fn get<'a>(
		&'a self,
		url: &'a str,
		params: Option<&'a Payload>,
		headers: Option<&'a Headers>,
	) -> RestFuture<'a> {
		Box::pin(async move {
			let query = params.map(query_pairs);

			self.send(Method::GET, url, query, None, headers).await
		})
	}

	fn post<'a>(
		&'a self,
		url: &'a str,
		data: Option<&'a Payload>,
		headers: Option<&'a Headers>,
	) -> RestFuture<'a> {
		Box::pin(async move {
			let body = data.map(serde_json::to_vec).transpose().map_err(ConfigError::from)?;

			self.send(Method::POST, url, None, body, headers).await
		})
	}
}

#[cfg(feature = "reqwest")]
fn header_map(headers: &Headers) -> Result<HeaderMap, ConfigError> {
	let mut map = HeaderMap::with_capacity(headers.len());

	for (name, value) in headers {
		let invalid = || ConfigError::InvalidHeader { name: name.clone() };
		let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
		let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

		map.insert(header_name, header_value);
	}

	Ok(map)
}
