//! Request orchestration for registration and login.
//!
//! Registration: validate fields, check the username is free, decode and
//! validate the image, then create account + credential as one atomic unit.
//! Login: validate fields, resolve the identity, decode the probe, stage it,
//! verify, then issue a session or reject. The staged probe is released on
//! every exit path; a dropped guard covers the early returns.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{info, warn};
use uuid::Uuid;
use visage_api::{ApiResponse, LoginRequest, RegisterRequest};
use visage_core::{
    decode_face_image, ensure_decodable_image, CoreError, VerificationResult,
};

use crate::config::SESSION_COOKIE;
use crate::error::{ServerError, ServerResult};
use crate::sessions::CurrentAccount;
use crate::state::AppState;

/// `POST /api/register`
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ServerResult<Json<ApiResponse>> {
    let Json(req) = payload.map_err(|_| ServerError::validation("Invalid JSON format"))?;

    // ValidateFields
    let (username, password, confirm_password, face_image) = match (
        nonempty(req.username),
        nonempty(req.password),
        nonempty(req.confirm_password),
        nonempty(req.face_image),
    ) {
        (Some(u), Some(p), Some(c), Some(f)) => (u, p, c, f),
        _ => return Err(ServerError::validation("All fields are required")),
    };
    if password != confirm_password {
        return Err(ServerError::validation("Passwords do not match"));
    }

    // CheckUsernameFree (the store's UNIQUE constraint backstops races)
    if state.db.username_exists(&username).await? {
        return Err(CoreError::duplicate_username(&username).into());
    }

    // DecodeImage
    let reference = decode_face_image(&face_image).map_err(CoreError::from)?;
    ensure_decodable_image(&reference).map_err(CoreError::from)?;

    // CreateAccountAndCredential (atomic)
    let password_hash = hash_password(&password)?;
    let account = state
        .db
        .register_account(&username, &password_hash, &reference, &state.config.media_dir)
        .await?;

    info!(username = %account.username, "user registered");
    Ok(Json(ApiResponse::success("Registration successful")))
}

/// `POST /api/login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ServerResult<(CookieJar, Json<ApiResponse>)> {
    let Json(req) = payload.map_err(|_| ServerError::validation("Invalid JSON format"))?;

    // ValidateFields
    let (username, face_image) = match (nonempty(req.username), nonempty(req.face_image)) {
        (Some(u), Some(f)) => (u, f),
        _ => {
            return Err(ServerError::validation(
                "Username and face image are required",
            ));
        }
    };

    // ResolveIdentity: unknown or unenrolled users never reach the verifier
    let enrollment = state.db.lookup_enrollment(&username).await?;

    // DecodeProbeImage
    let probe = decode_face_image(&face_image).map_err(CoreError::from)?;

    // StageArtifact, keyed by request id so concurrent attempts for the same
    // user cannot collide
    let request_id = Uuid::new_v4();
    let reference = state.db.ensure_reference_file(&enrollment.credential).await?;
    let artifact = state.artifacts.stage(&probe, request_id).await?;

    // Verify: no store lock is held across this suspension point
    let outcome = state.verifier.verify(artifact.path(), &reference).await;

    // IssueSession | Reject; any `?` below still releases via the guard's drop
    let response = match outcome {
        VerificationResult::Matched { score } => {
            info!(username = %enrollment.account.username, score, "face verified");
            let session = state.db.issue_session(&enrollment.account).await?;
            let cookie = Cookie::build((SESSION_COOKIE, session.token))
                .path("/")
                .http_only(true)
                .build();
            (
                jar.add(cookie),
                Json(
                    ApiResponse::success("Login successful").with_redirect("/profile"),
                ),
            )
        }
        VerificationResult::NotMatched { score } => {
            warn!(username = %enrollment.account.username, score, "face did not match");
            (jar, Json(ApiResponse::error("Face verification failed")))
        }
        VerificationResult::ComparisonFailed { reason } => {
            // No decision was reached; publicly indistinguishable from a
            // non-match so callers cannot probe the pipeline stage.
            warn!(
                username = %enrollment.account.username,
                reason,
                "face comparison failed to produce a decision"
            );
            (jar, Json(ApiResponse::error("Face verification failed")))
        }
    };

    // ReleaseArtifact
    artifact.release().await;
    Ok(response)
}

/// `POST /api/logout`
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ServerResult<(CookieJar, Json<ApiResponse>)> {
    let token = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_owned());
    let jar = if let Some(token) = token {
        state.db.revoke_session(&token).await?;
        jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build())
    } else {
        jar
    };
    Ok((jar, Json(ApiResponse::success("Logged out"))))
}

/// `GET /profile` - requires an active session.
pub async fn profile(CurrentAccount(account): CurrentAccount) -> Json<ApiResponse> {
    Json(ApiResponse::success("Authenticated").with_username(account.username))
}

/// `GET /healthz`
pub async fn healthz(State(state): State<AppState>) -> ServerResult<Json<ApiResponse>> {
    state.db.health_check().await?;
    Ok(Json(ApiResponse::success("ok")))
}

/// Treat absent and empty strings the same way at the boundary.
fn nonempty(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}

fn hash_password(password: &str) -> ServerResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServerError::PasswordHash(err.to_string()))
}
