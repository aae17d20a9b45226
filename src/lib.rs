//! Authentication API base client for Auth0 tenants: typed tenant configuration, client secret
//! or signed-assertion client authentication, and thin async `GET`/`POST` verbs over a
//! pluggable REST client.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod base;
pub mod client_auth;
pub mod config;
pub mod error;
pub mod obs;
pub mod rest;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
