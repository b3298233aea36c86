//! Session-guard extractor.
//!
//! Protected handlers take a [`CurrentAccount`] argument instead of reading
//! any ambient logged-in-user state: the extractor resolves the session
//! cookie to an account row or rejects the request before the handler runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;
use visage_api::ApiResponse;
use visage_core::Account;

use crate::config::SESSION_COOKIE;
use crate::state::AppState;

/// The account bound to the request's session cookie.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

/// Rejection for requests without a valid session: 401 plus a redirect hint.
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = ApiResponse::error("Authentication required").with_redirect("/login");
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).ok_or(AuthRejection)?;

        match state.db.validate_session(token.value()).await {
            Ok(account) => Ok(Self(account)),
            Err(err) => {
                debug!(error = %err, "session cookie did not resolve to an account");
                Err(AuthRejection)
            }
        }
    }
}
