//! HTTP client middleware for a remote API.
//!
//! [`ApiClient`] injects the stored access token as a bearer credential,
//! cancels superseded identical requests, and recovers from an expired access
//! token by exchanging the refresh token once and replaying the request.

mod client;
mod infra;
mod shared;

pub use client::exclusion::ExclusionPolicy;
pub use client::identity::RequestIdentity;
pub use client::request::{ApiRequest, ApiResponse};
pub use client::session::{LogOnlySessionHandler, LogoutRedirect, SessionExpiredHandler};
pub use client::transport::{ReqwestTransport, Transport};
pub use client::{ApiClient, ApiClientBuilder};
pub use infra::config::{self as config, ClientConfig};
pub use infra::credential_store::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
pub use infra::logging::{self as logging, LoggingOptions};
pub use shared::error::{ClientError, ClientResult};

pub use async_trait::async_trait;
pub use reqwest::header;
pub use reqwest::{Method, StatusCode};
