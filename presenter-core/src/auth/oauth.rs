//! OAuth authorization-code flow (spec §4.4). Grounded on the `oauth2`
//! crate choice used for the same purpose in
//! `other_examples/manifests/zijiren233-synctv` — the teacher has no OAuth
//! client of its own.

use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use url::Url;

use crate::error::{AppError, AppResult};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

type ConfiguredClient = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

/// One configured provider ("google") wrapping an `oauth2` client. `None`
/// when credentials aren't set, in which case every call returns
/// [`AppError::OAuthNotConfigured`] (spec §4.4).
pub struct OAuthModule {
    client: Option<ConfiguredClient>,
    http: reqwest::Client,
}

impl std::fmt::Debug for OAuthModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthModule").field("configured", &self.client.is_some()).finish()
    }
}

impl OAuthModule {
    pub fn new(client_id: Option<String>, client_secret: Option<String>, public_base_url: &str) -> Self {
        let client = match (client_id, client_secret) {
            (Some(id), Some(secret)) => {
                let redirect = format!("{public_base_url}/auth/google/callback");
                Some(
                    BasicClient::new(ClientId::new(id))
                        .set_client_secret(ClientSecret::new(secret))
                        .set_auth_uri(AuthUrl::new(GOOGLE_AUTH_URL.to_string()).expect("static auth url"))
                        .set_token_uri(TokenUrl::new(GOOGLE_TOKEN_URL.to_string()).expect("static token url"))
                        .set_redirect_uri(RedirectUrl::new(redirect).expect("valid redirect url")),
                )
            }
            _ => None,
        };

        Self { client, http: reqwest::Client::new() }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Builds the provider consent URL and the CSRF token that must be
    /// echoed back (and checked) on callback (spec §4.4).
    pub fn authorize_url(&self, provider: &str) -> AppResult<(Url, CsrfToken)> {
        let client = self.client.as_ref().ok_or_else(|| AppError::oauth_not_configured(provider))?;
        let (url, csrf_token) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .url();
        Ok((url, csrf_token))
    }

    /// Exchanges the authorization code for an access token and fetches the
    /// user's email/name/picture.
    pub async fn exchange_code(&self, provider: &str, code: String) -> AppResult<OAuthProfile> {
        let client = self.client.as_ref().ok_or_else(|| AppError::oauth_not_configured(provider))?;

        let token = client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&self.http)
            .await
            .map_err(|err| AppError::upstream_unavailable(format!("oauth code exchange failed: {err}")))?;

        let info: GoogleUserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .map_err(|err| AppError::upstream_unavailable(format!("oauth userinfo request failed: {err}")))?
            .json()
            .await
            .map_err(|err| AppError::upstream_unavailable(format!("oauth userinfo response malformed: {err}")))?;

        Ok(OAuthProfile { email: info.email, name: info.name, picture: info.picture })
    }
}
