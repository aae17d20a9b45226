//! Client telemetry headers.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, rest::Headers};

/// Header carrying base64-encoded client metadata.
pub const CLIENT_INFO_HEADER: &str = "Auth0-Client";

/// `User-Agent` value identifying this crate.
pub fn user_agent() -> String {
	format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Base64-encoded JSON describing the client library and platform.
pub fn client_info() -> String {
	let info = serde_json::json!({
		"name": env!("CARGO_PKG_NAME"),
		"version": env!("CARGO_PKG_VERSION"),
		"env": {
			"os": std::env::consts::OS,
			"arch": std::env::consts::ARCH,
		},
	});

	STANDARD.encode(info.to_string())
}

/// Headers attached to every request before caller overrides.
pub fn base_headers(telemetry: bool) -> Headers {
	let mut headers = BTreeMap::new();

	headers.insert("Content-Type".into(), "application/json".into());

	if telemetry {
		headers.insert("User-Agent".into(), user_agent());
		headers.insert(CLIENT_INFO_HEADER.into(), client_info());
	}

	headers
}
