//! Authentication API base client.
//!
//! [`AuthenticationBase`] owns the tenant configuration, one [`RestClient`], and the
//! [`ClientAuthenticator`] selected from the configured credentials. Endpoint-specific
//! clients (token, passwordless, user info, ...) build on its three verbs:
//!
//! - [`AuthenticationBase::get`] and [`AuthenticationBase::post`] forward their arguments
//!   untouched.
//! - [`AuthenticationBase::authenticated_post`] runs the authenticator over the payload first,
//!   then posts the augmented copy.
//!
//! Errors from the REST client are returned as is. The REST client is built with retries
//! disabled, so callers decide how to react to [`Error::RateLimit`].

// self
use crate::{
	_prelude::*,
	client_auth::{self, ClientAuthMethod, ClientAuthenticator, ClientContext},
	config::AuthenticationConfig,
	obs::{self, RequestKind},
	rest::{Headers, Payload, RestClient},
};
#[cfg(feature = "reqwest")]
use crate::rest::{ReqwestRestClient, RestClientOptions};

#[cfg(feature = "reqwest")]
/// Authentication base specialized for the crate's default reqwest transport.
pub type ReqwestAuthenticationBase = AuthenticationBase<ReqwestRestClient>;

/// Base Authentication API client providing `get`, `post`, and `authenticated_post`.
pub struct AuthenticationBase<C>
where
	C: ?Sized + RestClient,
{
	config: AuthenticationConfig,
	client: Arc<C>,
	authenticator: Arc<dyn ClientAuthenticator>,
}
impl<C> AuthenticationBase<C>
where
	C: ?Sized + RestClient,
{
	/// Creates a base around a caller-provided REST client.
	///
	/// The configuration is validated and the client authenticator is selected up front;
	/// no request is sent.
	pub fn with_rest_client(
		config: AuthenticationConfig,
		client: impl Into<Arc<C>>,
	) -> Result<Self> {
		config.validate()?;

		let authenticator = client_auth::select_authenticator(&config)?;

		Ok(Self { config, client: client.into(), authenticator })
	}

	/// Replaces the client authenticator chosen from the configuration.
	pub fn with_authenticator(mut self, authenticator: Arc<dyn ClientAuthenticator>) -> Self {
		self.authenticator = authenticator;

		self
	}

	/// Configuration this base was built with.
	pub fn config(&self) -> &AuthenticationConfig {
		&self.config
	}

	/// Tenant domain.
	pub fn domain(&self) -> &str {
		&self.config.domain
	}

	/// Client identifier.
	pub fn client_id(&self) -> &str {
		&self.config.client_id
	}

	/// URL scheme used by [`AuthenticationBase::endpoint`].
	pub fn protocol(&self) -> &str {
		&self.config.protocol
	}

	/// Underlying REST client.
	pub fn rest_client(&self) -> &Arc<C> {
		&self.client
	}

	/// Active client authenticator.
	pub fn authenticator(&self) -> &Arc<dyn ClientAuthenticator> {
		&self.authenticator
	}

	/// Builds `{protocol}://{domain}{path}` for this tenant.
	pub fn endpoint(&self, path: &str) -> Result<Url> {
		Ok(self.config.endpoint(path)?)
	}

	/// Returns `payload` (or an empty object) with client credentials attached.
	pub fn add_client_authentication(&self, payload: Option<&Payload>) -> Result<Payload> {
		let payload = payload.cloned().unwrap_or_default();

		self.authenticator.augment(payload, ClientContext::from_config(&self.config))
	}

	/// Issues a `GET` and returns the response body.
	pub async fn get(
		&self,
		url: &str,
		params: Option<&Payload>,
		headers: Option<&Headers>,
	) -> Result<Value> {
		obs::observe(
			RequestKind::Get,
			ClientAuthMethod::None,
			url,
			self.client.get(url, params, headers),
		)
		.await
	}

	/// Issues a `POST` with `data` as the JSON body and returns the response body.
	pub async fn post(
		&self,
		url: &str,
		data: Option<&Payload>,
		headers: Option<&Headers>,
	) -> Result<Value> {
		obs::observe(
			RequestKind::Post,
			ClientAuthMethod::None,
			url,
			self.client.post(url, data, headers),
		)
		.await
	}

	/// Attaches client credentials to `data`, then issues a `POST` with the augmented body.
	pub async fn authenticated_post(
		&self,
		url: &str,
		data: Option<&Payload>,
		headers: Option<&Headers>,
	) -> Result<Value> {
		let auth_method = self.authenticator.method();

		obs::observe(RequestKind::AuthenticatedPost, auth_method, url, async move {
			let data = self.add_client_authentication(data)?;

			self.client.post(url, Some(&data), headers).await
		})
		.await
	}
}
#[cfg(feature = "reqwest")]
impl AuthenticationBase<ReqwestRestClient> {
	/// Creates a base with its own reqwest transport.
	///
	/// The transport carries the configured telemetry flag and timeouts, and never retries.
	pub fn new(config: AuthenticationConfig) -> Result<Self> {
		config.validate()?;

		let options =
			RestClientOptions { telemetry: config.telemetry, timeout: config.timeout, retries: 0 };
		let client = ReqwestRestClient::new(options)?;

		Self::with_rest_client(config, client)
	}
}
impl<C> Clone for AuthenticationBase<C>
where
	C: ?Sized + RestClient,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			client: Arc::clone(&self.client),
			authenticator: Arc::clone(&self.authenticator),
		}
	}
}
impl<C> Debug for AuthenticationBase<C>
where
	C: ?Sized + RestClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticationBase")
			.field("domain", &self.config.domain)
			.field("client_id", &self.config.client_id)
			.field("client_auth_method", &self.authenticator.method())
			.field("protocol", &self.config.protocol)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::*,
		client_auth::{CLIENT_ASSERTION_TYPE, ClientAuthMethod},
		error::{ApiError, RateLimitError},
	};

	const URL: &str = "https://example.auth0.com/oauth/token";

	struct CountingAuthenticator {
		calls: parking_lot::Mutex<usize>,
	}
	impl ClientAuthenticator for CountingAuthenticator {
		fn method(&self) -> ClientAuthMethod {
			ClientAuthMethod::None
		}

		fn augment(&self, mut payload: Payload, ctx: ClientContext<'_>) -> Result<Payload> {
			*self.calls.lock() += 1;

			payload.insert("augmented_for".into(), ctx.client_id.into());

			Ok(payload)
		}
	}

	fn payload() -> Payload {
		let mut payload = Payload::new();

		payload.insert("grant_type".into(), "client_credentials".into());
		payload.insert("audience".into(), "https://api.example.com".into());

		payload
	}

	fn headers() -> Headers {
		let mut headers = Headers::new();

		headers.insert("X-Request-Id".into(), "req-1".into());

		headers
	}

	fn build_base(
		config: AuthenticationConfig,
		client: Arc<RecordingRestClient>,
	) -> AuthenticationBase<RecordingRestClient> {
		AuthenticationBase::with_rest_client(config, client).expect("Base should build.")
	}

	#[test]
	fn construction_sends_nothing() {
		let client = Arc::new(RecordingRestClient::replying(Value::Null));
		let base = build_base(
			AuthenticationConfig::new("example.auth0.com", "abc").with_client_secret("shh"),
			client.clone(),
		);

		assert!(client.calls().is_empty());
		assert_eq!(base.domain(), "example.auth0.com");
		assert_eq!(base.client_id(), "abc");
		assert_eq!(base.protocol(), "https");
		assert_eq!(base.authenticator().method(), ClientAuthMethod::ClientSecretPost);
		assert!(!format!("{base:?}").contains("shh"));
	}

	#[test]
	fn construction_rejects_invalid_config() {
		let client = Arc::new(RecordingRestClient::replying(Value::Null));
		let err = AuthenticationBase::<RecordingRestClient>::with_rest_client(
			AuthenticationConfig::new("", "abc"),
			client,
		)
		.expect_err("Empty domain should fail.");

		assert!(matches!(err, Error::Config(_)));
	}

	#[tokio::test]
	async fn get_and_post_pass_arguments_through() {
		let client = Arc::new(RecordingRestClient::replying(serde_json::json!({ "ok": true })));
		let base = build_base(
			AuthenticationConfig::new("example.auth0.com", "abc").with_client_secret("shh"),
			client.clone(),
		);
		let got = base.get(URL, Some(&payload()), Some(&headers())).await.expect("GET succeeds.");
		let posted =
			base.post(URL, Some(&payload()), Some(&headers())).await.expect("POST succeeds.");

		assert_eq!(got, serde_json::json!({ "ok": true }));
		assert_eq!(posted, got);

		let calls = client.calls();

		assert_eq!(calls.len(), 2);
		assert_eq!(calls[0].method, RecordedMethod::Get);
		assert_eq!(calls[1].method, RecordedMethod::Post);

		for call in calls {
			assert_eq!(call.url, URL);
			assert_eq!(call.body, Some(payload()));
			assert_eq!(call.headers, Some(headers()));
		}
	}

	#[tokio::test]
	async fn authenticated_post_sends_augmented_secret() {
		let client = Arc::new(RecordingRestClient::replying(Value::Null));
		let base = build_base(
			AuthenticationConfig::new("example.auth0.com", "abc").with_client_secret("shh"),
			client.clone(),
		);
		let original = payload();

		base.authenticated_post(URL, Some(&original), None).await.expect("POST succeeds.");

		let body = client.calls()[0].body.clone().expect("Body should be sent.");

		assert_eq!(body.get("client_secret"), Some(&Value::from("shh")));
		assert_eq!(body.get("grant_type"), Some(&Value::from("client_credentials")));
		assert!(!original.contains_key("client_secret"));
	}

	#[tokio::test]
	async fn authenticated_post_sends_signed_assertion() {
		let client = Arc::new(RecordingRestClient::replying(Value::Null));
		let base = build_base(
			AuthenticationConfig::new("example.auth0.com", "abc")
				.with_client_secret("shh")
				.with_client_assertion_signing_key("hmac-signing-key-for-unit-tests")
				.with_client_assertion_signing_alg("HS256"),
			client.clone(),
		);

		base.authenticated_post(URL, None, None).await.expect("POST succeeds.");

		let body = client.calls()[0].body.clone().expect("Body should be sent.");

		assert!(body.get("client_assertion").and_then(Value::as_str).is_some());
		assert_eq!(body.get("client_assertion_type"), Some(&Value::from(CLIENT_ASSERTION_TYPE)));
		assert!(!body.contains_key("client_secret"));
	}

	#[tokio::test]
	async fn authenticated_post_always_runs_authenticator() {
		let client = Arc::new(RecordingRestClient::replying(Value::Null));
		let authenticator = Arc::new(CountingAuthenticator { calls: Default::default() });
		let base = build_base(AuthenticationConfig::new("example.auth0.com", "abc"), client.clone())
			.with_authenticator(authenticator.clone());

		base.authenticated_post(URL, Some(&payload()), None).await.expect("POST succeeds.");
		base.post(URL, Some(&payload()), None).await.expect("POST succeeds.");

		assert_eq!(*authenticator.calls.lock(), 1);

		let calls = client.calls();
		let mut expected = payload();

		expected.insert("augmented_for".into(), "abc".into());

		assert_eq!(calls[0].body, Some(expected));
		assert_eq!(calls[1].body, Some(payload()));
	}

	#[tokio::test]
	async fn authenticated_post_without_credentials_sends_payload_as_is() {
		let client = Arc::new(RecordingRestClient::replying(Value::Null));
		let base = build_base(AuthenticationConfig::new("example.auth0.com", "abc"), client.clone());

		base.authenticated_post(URL, Some(&payload()), None).await.expect("POST succeeds.");

		assert_eq!(base.authenticator().method(), ClientAuthMethod::None);
		assert_eq!(client.calls()[0].body, Some(payload()));
	}

	#[tokio::test]
	async fn errors_propagate_unchanged() {
		let client = Arc::new(RecordingRestClient::with_responder(|| {
			Err(RateLimitError {
				error_code: "too_many_requests".into(),
				message: "Global limit has been reached".into(),
				reset_at: None,
			}
			.into())
		}));
		let base = build_base(AuthenticationConfig::new("example.auth0.com", "abc"), client.clone());
		let err = base.authenticated_post(URL, None, None).await.expect_err("429 propagates.");

		assert!(matches!(
			err,
			Error::RateLimit(RateLimitError { ref error_code, .. }) if error_code == "too_many_requests"
		));
		assert_eq!(client.calls().len(), 1);

		let client = Arc::new(RecordingRestClient::with_responder(|| {
			Err(ApiError {
				status: 401,
				error_code: "invalid_client".into(),
				message: "Client authentication failed".into(),
				content: None,
			}
			.into())
		}));
		let base = build_base(AuthenticationConfig::new("example.auth0.com", "abc"), client);
		let err = base.get(URL, None, None).await.expect_err("401 propagates.");

		match err {
			Error::Api(err) => {
				assert_eq!(err.status, 401);
				assert_eq!(err.error_code, "invalid_client");
				assert_eq!(err.message, "Client authentication failed");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn endpoint_uses_configured_protocol() {
		let client = Arc::new(RecordingRestClient::replying(Value::Null));
		let base = build_base(
			AuthenticationConfig::new("localhost:8080", "abc").with_protocol("http"),
			client,
		);

		assert_eq!(
			base.endpoint("/oauth/token").expect("Endpoint should build.").as_str(),
			"http://localhost:8080/oauth/token"
		);
	}
}
