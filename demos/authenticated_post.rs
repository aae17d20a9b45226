//! Demonstrates the authentication base posting a client-credentials grant with a shared
//! secret against a local mock of the tenant's token endpoint.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use auth0_authentication::{base::AuthenticationBase, config::AuthenticationConfig};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token").json_body(json!({
				"grant_type": "client_credentials",
				"client_id": "demo-client",
				"client_secret": "super-secret",
				"audience": "https://api.example.com/",
			}));
			then.status(200).header("content-type", "application/json").json_body(json!({
				"access_token": "demo-access",
				"token_type": "Bearer",
				"expires_in": 86400,
			}));
		})
		.await;
	let config = AuthenticationConfig::new(server.address().to_string(), "demo-client")
		.with_client_secret("super-secret")
		.with_protocol("http");
	let base = AuthenticationBase::new(config)?;
	let Value::Object(payload) = json!({
		"grant_type": "client_credentials",
		"client_id": base.client_id(),
		"audience": "https://api.example.com/",
	}) else {
		unreachable!()
	};
	let url = base.endpoint("/oauth/token")?;
	let response = base.authenticated_post(url.as_str(), Some(&payload), None).await?;

	println!("Access token: {}.", response["access_token"]);

	token_mock.assert_async().await;

	Ok(())
}
