//! `/auth/*` (spec §4.4, §4.8). OAuth login/callback, session introspection,
//! logout, and the unauthenticated config-status probe the login page
//! needs.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::PrivateCookieJar;
use presenter_core::auth::AuthContext;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::middleware::auth_guard::SESSION_COOKIE_NAME;
use crate::state::AppState;

const CSRF_COOKIE_NAME: &str = "oauth_csrf";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusBody {
    google_o_auth: bool,
    allowed_user_count: usize,
}

pub async fn status(State(state): State<AppState>) -> Json<AuthStatusBody> {
    Json(AuthStatusBody { google_o_auth: state.oauth.is_configured(), allowed_user_count: state.stores.users.count() })
}

fn session_cookie(state: &AppState, value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.serves_https())
        .path("/")
        .build()
}

/// `GET /auth/<provider>`: redirects to the provider consent screen. 503
/// with a hint if OAuth isn't configured (spec §4.4).
pub async fn start(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Response), AppError> {
    let (url, csrf_token) = state.oauth.authorize_url(&provider)?;
    let jar = jar.add(Cookie::build((CSRF_COOKIE_NAME, csrf_token.secret().clone())).http_only(true).path("/").build());
    Ok((jar, Redirect::to(url.as_str()).into_response()))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// `GET /auth/<provider>/callback`: exchanges the code, checks the
/// allow-list, and either sets a session cookie or redirects with
/// `?error=access_denied` and no session at all (spec §4.4, §8 scenario 2).
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Response) {
    if params.error.is_some() {
        return (jar, Redirect::to("/?error=access_denied").into_response());
    }

    let expected_csrf = jar.get(CSRF_COOKIE_NAME).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::from(CSRF_COOKIE_NAME));

    let csrf_ok = match (&params.state, &expected_csrf) {
        (Some(got), Some(want)) => constant_time_eq::constant_time_eq(got.as_bytes(), want.as_bytes()),
        _ => false,
    };
    let Some(code) = params.code.filter(|_| csrf_ok) else {
        return (jar, Redirect::to("/?error=access_denied").into_response());
    };

    let profile = match state.oauth.exchange_code(&provider, code).await {
        Ok(profile) => profile,
        Err(_) => return (jar, Redirect::to("/?error=access_denied").into_response()),
    };

    let identity = presenter_core::model::UserIdentity { email: profile.email, name: profile.name, picture: profile.picture };
    match state.sessions.complete_oauth_login(identity) {
        Ok(session) => {
            let jar = jar.add(session_cookie(&state, session.id));
            (jar, Redirect::to("/").into_response())
        }
        Err(_) => (jar, Redirect::to("/?error=access_denied").into_response()),
    }
}

#[derive(Debug, Serialize)]
pub struct MeBody {
    authenticated: bool,
    method: String,
    email: String,
}

pub async fn me(Extension(ctx): Extension<AuthContext>) -> Json<MeBody> {
    let method = match ctx.method {
        presenter_core::stores::session_store::AuthMethod::Oauth => "oauth",
        presenter_core::stores::session_store::AuthMethod::Bearer => "bearer",
    };
    Json(MeBody { authenticated: true, method: method.to_string(), email: ctx.identity.email })
}

#[derive(Debug, Serialize)]
pub struct LogoutBody {
    success: bool,
}

pub async fn logout(State(state): State<AppState>, jar: PrivateCookieJar) -> AppResult<(PrivateCookieJar, Json<LogoutBody>)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        state.sessions.logout(cookie.value()).map_err(AppError::from)?;
    }
    let jar = jar.remove(Cookie::from(SESSION_COOKIE_NAME));
    Ok((jar, Json(LogoutBody { success: true })))
}
