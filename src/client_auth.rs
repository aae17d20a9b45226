//! Client authentication strategies that decorate outgoing payloads.
//!
//! [`ClientAuthenticator`] is the seam [`AuthenticationBase`](crate::base::AuthenticationBase)
//! calls before every authenticated request. [`select_authenticator`] picks the variant from
//! the configured credentials: a signing key wins over a secret, and with neither the payload
//! passes through untouched.

// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
// self
use crate::{
	_prelude::*,
	config::{AuthenticationConfig, ClientSecret, SigningKey},
	error::{ClientAuthError, ConfigError},
	rest::Payload,
};

/// `client_assertion_type` value sent alongside signed assertions.
pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";
/// Validity window of a freshly signed client assertion.
pub const CLIENT_ASSERTION_LIFETIME: Duration = Duration::seconds(180);

/// Tenant and client identity passed to authenticators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientContext<'a> {
	/// Tenant domain.
	pub domain: &'a str,
	/// Client identifier.
	pub client_id: &'a str,
}
impl<'a> ClientContext<'a> {
	/// Creates a context from raw parts.
	pub fn new(domain: &'a str, client_id: &'a str) -> Self {
		Self { domain, client_id }
	}

	/// Borrows the identity from a configuration.
	pub fn from_config(config: &'a AuthenticationConfig) -> Self {
		Self::new(&config.domain, &config.client_id)
	}
}

/// Client authentication methods understood by the Authentication API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientAuthMethod {
	/// No client credentials are attached.
	None,
	/// `client_secret` is sent in the request body.
	ClientSecretPost,
	/// A signed JWT is sent as `client_assertion`.
	PrivateKeyJwt,
}
impl ClientAuthMethod {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ClientAuthMethod::None => "none",
			ClientAuthMethod::ClientSecretPost => "client_secret_post",
			ClientAuthMethod::PrivateKeyJwt => "private_key_jwt",
		}
	}
}
impl Display for ClientAuthMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Strategy that adds client credentials to an outgoing payload.
///
/// Implementations receive the payload by value and return the augmented copy, so the
/// caller's original map is never mutated.
pub trait ClientAuthenticator: Send + Sync {
	/// Method implemented by this authenticator.
	fn method(&self) -> ClientAuthMethod;

	/// Returns `payload` with client credentials attached.
	fn augment(&self, payload: Payload, ctx: ClientContext<'_>) -> Result<Payload>;
}

/// Authenticator used when no credentials are configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoClientAuthentication;
impl ClientAuthenticator for NoClientAuthentication {
	fn method(&self) -> ClientAuthMethod {
		ClientAuthMethod::None
	}

	fn augment(&self, payload: Payload, _ctx: ClientContext<'_>) -> Result<Payload> {
		Ok(payload)
	}
}

/// Shared-secret authentication (`client_secret` body field).
#[derive(Clone, Debug)]
pub struct SharedSecret(ClientSecret);
impl SharedSecret {
	/// Wraps the secret to send.
	pub fn new(secret: ClientSecret) -> Self {
		Self(secret)
	}
}
impl ClientAuthenticator for SharedSecret {
	fn method(&self) -> ClientAuthMethod {
		ClientAuthMethod::ClientSecretPost
	}

	fn augment(&self, mut payload: Payload, _ctx: ClientContext<'_>) -> Result<Payload> {
		payload.insert("client_secret".into(), self.0.expose().into());

		Ok(payload)
	}
}

/// Signed-assertion authentication (`private_key_jwt`).
#[derive(Clone)]
pub struct SignedAssertion {
	algorithm: Algorithm,
	key: EncodingKey,
}
impl SignedAssertion {
	/// Loads `key` for the named algorithm.
	///
	/// RSA (`RS*`, `PS*`), EC (`ES*`), and Ed25519 (`EdDSA`) keys are read from PEM; HMAC
	/// (`HS*`) keys use the raw bytes.
	pub fn new(key: &SigningKey, alg: &str) -> Result<Self, ConfigError> {
		let algorithm = Algorithm::from_str(alg)
			.map_err(|_| ConfigError::UnsupportedSigningAlgorithm { alg: alg.to_owned() })?;
		let material = key.expose().as_bytes();
		let key = match algorithm {
			Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 =>
				Ok(EncodingKey::from_secret(material)),
			Algorithm::RS256
			| Algorithm::RS384
			| Algorithm::RS512
			| Algorithm::PS256
			| Algorithm::PS384
			| Algorithm::PS512 => EncodingKey::from_rsa_pem(material),
			Algorithm::ES256 | Algorithm::ES384 => EncodingKey::from_ec_pem(material),
			Algorithm::EdDSA => EncodingKey::from_ed_pem(material),
		}
		.map_err(|source| ConfigError::InvalidSigningKey { alg: algorithm, source })?;

		Ok(Self { algorithm, key })
	}

	/// Algorithm used to sign assertions.
	pub fn algorithm(&self) -> Algorithm {
		self.algorithm
	}

	/// Signs a fresh assertion for the client, issued now.
	pub fn create_assertion(&self, ctx: ClientContext<'_>) -> Result<String> {
		self.create_assertion_at(ctx, OffsetDateTime::now_utc())
	}

	/// Signs an assertion issued at `now`.
	pub fn create_assertion_at(&self, ctx: ClientContext<'_>, now: OffsetDateTime) -> Result<String> {
		let claims = AssertionClaims {
			iss: ctx.client_id,
			sub: ctx.client_id,
			aud: format!("https://{}/", ctx.domain),
			iat: now.unix_timestamp(),
			exp: (now + CLIENT_ASSERTION_LIFETIME).unix_timestamp(),
			jti: assertion_id(),
		};

		jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.key)
			.map_err(|source| ClientAuthError::Signing { source }.into())
	}
}
impl Debug for SignedAssertion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignedAssertion")
			.field("algorithm", &self.algorithm)
			.field("key", &"<redacted>")
			.finish()
	}
}
impl ClientAuthenticator for SignedAssertion {
	fn method(&self) -> ClientAuthMethod {
		ClientAuthMethod::PrivateKeyJwt
	}

	fn augment(&self, mut payload: Payload, ctx: ClientContext<'_>) -> Result<Payload> {
		let assertion = self.create_assertion(ctx)?;

		payload.insert("client_assertion".into(), assertion.into());
		payload.insert("client_assertion_type".into(), CLIENT_ASSERTION_TYPE.into());

		Ok(payload)
	}
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
	iss: &'a str,
	sub: &'a str,
	aud: String,
	iat: i64,
	exp: i64,
	jti: String,
}

/// Picks the authenticator implied by the configured credentials.
pub fn select_authenticator(
	config: &AuthenticationConfig,
) -> Result<Arc<dyn ClientAuthenticator>, ConfigError> {
	let authenticator: Arc<dyn ClientAuthenticator> =
		if let Some(key) = config.client_assertion_signing_key() {
			Arc::new(SignedAssertion::new(key, config.client_assertion_signing_alg())?)
		} else if let Some(secret) = config.client_secret() {
			Arc::new(SharedSecret::new(secret.clone()))
		} else {
			Arc::new(NoClientAuthentication)
		};

	#[cfg(feature = "tracing")]
	tracing::debug!(
		client_id = %config.client_id,
		method = authenticator.method().as_str(),
		"selected client authentication method"
	);

	Ok(authenticator)
}

/// Returns a copy of `payload` carrying the client credentials implied by the arguments.
///
/// A signing key produces a signed assertion (`signing_alg` defaults to `RS256`); otherwise a
/// secret adds `client_secret`; with neither the payload is returned as is.
pub fn add_client_authentication(
	payload: Payload,
	domain: &str,
	client_id: &str,
	client_secret: Option<&str>,
	signing_key: Option<&str>,
	signing_alg: Option<&str>,
) -> Result<Payload> {
	let mut config = AuthenticationConfig::new(domain, client_id);

	config.client_secret = client_secret.map(ClientSecret::from);
	config.client_assertion_signing_key = signing_key.map(SigningKey::from);
	config.client_assertion_signing_alg = signing_alg.map(ToOwned::to_owned);

	select_authenticator(&config)?.augment(payload, ClientContext::new(domain, client_id))
}

fn assertion_id() -> String {
	format!("{:032x}", rand::random::<u128>())
}
