//! Visage API - wire types shared by the gateway server and its clients.
//!
//! Every endpoint speaks JSON in both directions, and every response body is
//! an [`ApiResponse`] regardless of outcome. Handlers never emit anything
//! else, so clients can always parse the body even on a rejected request.

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/register`.
///
/// All fields are required; they are modeled as `Option` so that a missing
/// field deserializes cleanly and can be rejected with a typed validation
/// error instead of a deserializer rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    /// Base64-encoded reference image, optionally with a data-URI prefix.
    pub face_image: Option<String>,
}

/// Request body for `POST /api/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    /// Base64-encoded probe image, optionally with a data-URI prefix.
    pub face_image: Option<String>,
}

/// Outcome marker carried by every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Uniform response envelope for all gateway endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: ResponseStatus,
    pub message: String,
    /// Present on successful login; tells the client where to navigate next.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// Present on a successful profile fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl ApiResponse {
    /// Successful outcome with a human-readable message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            redirect_url: None,
            username: None,
        }
    }

    /// Rejected outcome with a human-readable message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            redirect_url: None,
            username: None,
        }
    }

    /// Attach a redirect target (login success).
    pub fn with_redirect(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    /// Attach the authenticated username (profile fetch).
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn response_status_serializes_lowercase() {
        let body = serde_json::to_value(ApiResponse::success("Login successful")).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Login successful");
        // Optional fields stay off the wire when unset.
        assert!(body.get("redirect_url").is_none());
        assert!(body.get("username").is_none());
    }

    #[test]
    fn login_success_carries_redirect() {
        let body =
            serde_json::to_value(ApiResponse::success("Login successful").with_redirect("/profile"))
                .unwrap();
        assert_eq!(body["redirect_url"], "/profile");
    }

    #[test]
    fn missing_fields_deserialize_as_none() {
        let req: RegisterRequest = serde_json::from_str(r#"{"username": "alice"}"#).unwrap();
        assert_eq!(req.username.as_deref(), Some("alice"));
        assert!(req.password.is_none());
        assert!(req.face_image.is_none());
    }

    #[test]
    fn error_round_trips() {
        let resp = ApiResponse::error("Passwords do not match");
        let parsed: ApiResponse =
            serde_json::from_str(&serde_json::to_string(&resp).unwrap()).unwrap();
        assert_eq!(parsed.status, ResponseStatus::Error);
        assert_eq!(parsed.message, "Passwords do not match");
    }
}
