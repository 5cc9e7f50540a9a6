//! Reqwest-backed identity service adapter.
//!
//! Owns transport details only: the introspection form post, the reset-link
//! request, timeouts, and status mapping into [`IdentityProviderError`].

mod dto;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use self::dto::{IntrospectionDto, PasswordResetReplyDto, PasswordResetRequestDto};
use crate::domain::ports::{IdentityProvider, IdentityProviderError};
use crate::domain::{BearerToken, IdentityClaim};

const USER_AGENT: &str = "library-backend-identity-client/0.1";
const PREVIEW_CHAR_LIMIT: usize = 160;

/// Where the identity service lives and how to authenticate to it.
#[derive(Debug, Clone)]
pub struct IdentityEndpoints {
    pub introspection: Url,
    pub password_reset: Option<Url>,
    /// Sent as a bearer credential on every call when set.
    pub api_key: Option<String>,
}

/// Identity provider speaking OAuth 2.0 token introspection.
pub struct HttpIdentityProvider {
    client: Client,
    endpoints: IdentityEndpoints,
}

impl HttpIdentityProvider {
    /// Build an adapter whose requests give up after `timeout`.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoints: IdentityEndpoints, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, endpoints })
    }

    fn authorised(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.endpoints.api_key.as_deref() {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn introspect(
        &self,
        token: &BearerToken,
    ) -> Result<IdentityClaim, IdentityProviderError> {
        let request = self
            .client
            .post(self.endpoints.introspection.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("token", token.expose())]);
        let response = self
            .authorised(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        let reply: IntrospectionDto = serde_json::from_slice(body.as_ref()).map_err(|err| {
            IdentityProviderError::invalid_response(format!("invalid introspection JSON: {err}"))
        })?;
        if !reply.active {
            return Err(IdentityProviderError::rejected("token is not active"));
        }
        reply
            .into_claim()
            .map_err(IdentityProviderError::invalid_response)
    }

    async fn password_reset_link(&self, email: &str) -> Result<String, IdentityProviderError> {
        let Some(endpoint) = self.endpoints.password_reset.clone() else {
            return Err(IdentityProviderError::unavailable(
                "password reset endpoint is not configured",
            ));
        };
        let request = self
            .client
            .post(endpoint)
            .json(&PasswordResetRequestDto { email });
        let response = self
            .authorised(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if status == StatusCode::NOT_FOUND {
            return Err(IdentityProviderError::unknown_account(email));
        }
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        let reply: PasswordResetReplyDto = serde_json::from_slice(body.as_ref()).map_err(|err| {
            IdentityProviderError::invalid_response(format!("invalid reset-link JSON: {err}"))
        })?;
        Ok(reply.link)
    }
}

fn map_transport_error(error: reqwest::Error) -> IdentityProviderError {
    if error.is_timeout() {
        IdentityProviderError::timeout(error.to_string())
    } else {
        IdentityProviderError::unavailable(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> IdentityProviderError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            IdentityProviderError::timeout(message)
        }
        _ if status.is_client_error() => IdentityProviderError::rejected(message),
        _ => IdentityProviderError::unavailable(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
