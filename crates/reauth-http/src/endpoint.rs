//! OAuth2 token endpoint: password login and refresh-token exchange.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use reauth_core::error::{AuthError, Error, TransportError};
use reauth_core::traits::RefreshInvoker;
use reauth_core::{AccessToken, ApiUrl, Credential, LoginCredentials, RefreshToken, Result};

use crate::USER_AGENT;
use crate::error::{map_reqwest, parse_error_response};

/// Grant type for username/password login.
const GRANT_PASSWORD: &str = "password";

/// Grant type for exchanging a refresh token.
const GRANT_REFRESH_TOKEN: &str = "refresh_token";

/// Default timeout for token endpoint calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Token endpoint location and the pre-shared client secret.
///
/// The client identifies itself with HTTP Basic authentication on every
/// token request; users authenticate through the grant parameters.
#[derive(Clone)]
pub struct TokenEndpointConfig {
    pub token_url: ApiUrl,
    pub client_id: String,
    pub client_secret: String,
    /// Timeout for a single token request.
    pub timeout: Duration,
}

impl TokenEndpointConfig {
    pub fn new(
        token_url: ApiUrl,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// Hide the client secret in Debug output
impl fmt::Debug for TokenEndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEndpointConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Successful token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Client for an OAuth2 token endpoint.
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    config: TokenEndpointConfig,
    client: reqwest::Client,
}

impl TokenEndpoint {
    pub fn new(config: TokenEndpointConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(map_reqwest)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &TokenEndpointConfig {
        &self.config
    }

    /// Authenticate with username and password (password grant).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the server rejects the
    /// username or password.
    #[instrument(skip(self, credentials), fields(token_url = %self.config.token_url, username = %credentials.username()))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Credential> {
        info!("Logging in");

        let form = [
            ("grant_type", GRANT_PASSWORD),
            ("username", credentials.username()),
            ("password", credentials.password()),
        ];

        let response = match self.request_token(&form).await {
            Err(e) if is_rejection(&e) => return Err(AuthError::InvalidCredentials.into()),
            other => other?,
        };

        let refresh_token = response.refresh_token.ok_or_else(|| TransportError::Body {
            message: "token response has no refresh_token".to_string(),
        })?;

        debug!("Login succeeded");
        Ok(Credential::new(
            AccessToken::new(response.access_token),
            RefreshToken::new(refresh_token),
        ))
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .client
            .post(self.config.token_url.as_url().clone())
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(form)
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(response).await.into());
        }

        let body: TokenResponse = response.json().await.map_err(map_reqwest)?;
        debug!(
            token_type = body.token_type.as_deref().unwrap_or("bearer"),
            expires_in = body.expires_in,
            "Token issued"
        );
        Ok(body)
    }
}

#[async_trait]
impl RefreshInvoker for TokenEndpoint {
    /// Exchange `refresh_token` for a new credential.
    ///
    /// Servers that do not rotate refresh tokens may omit `refresh_token`
    /// from the response; the presented token is kept in that case.
    #[instrument(skip_all, fields(token_url = %self.config.token_url))]
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<Credential> {
        let form = [
            ("grant_type", GRANT_REFRESH_TOKEN),
            ("refresh_token", refresh_token.as_str()),
        ];

        let response = match self.request_token(&form).await {
            Err(e) if is_rejection(&e) => return Err(AuthError::RefreshTokenInvalid.into()),
            other => other?,
        };

        let refresh_token = response
            .refresh_token
            .map(RefreshToken::new)
            .unwrap_or_else(|| refresh_token.clone());

        Ok(Credential::new(
            AccessToken::new(response.access_token),
            refresh_token,
        ))
    }
}

/// Token endpoints answer a bad grant with 400 (`invalid_grant`) or 401.
fn is_rejection(error: &Error) -> bool {
    matches!(error.status(), Some(400) | Some(401))
}
