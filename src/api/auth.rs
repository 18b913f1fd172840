use super::{ApiClient, ApiError, ApiResult};
use crate::models::{AuthUser, Session};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct PasswordGrantRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct SignupRequest {
    pub email: String,
    pub password: String,
    /// User metadata; the profile username is seeded from it.
    pub data: SignupMetadata,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct SignupMetadata {
    pub username: String,
}

/// Signup answers with a full session when email confirmation is off, and
/// with just the user otherwise.
pub(crate) fn parse_signup_response(data: serde_json::Value) -> ApiResult<Option<Session>> {
    if data.get("access_token").is_some() {
        serde_json::from_value(data).map(Some).map_err(ApiError::parse)
    } else {
        Ok(None)
    }
}

impl ApiClient {
    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::validation("Email and password are required"));
        }

        let req = self
            .builder(reqwest::Method::POST, "/auth/v1/token")
            .query(&[("grant_type", "password")])
            .json(&PasswordGrantRequest {
                email: email.to_string(),
                password: password.to_string(),
            });
        Self::json(req).await
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> ApiResult<Option<Session>> {
        let email = email.trim();
        let username = username.trim();
        if email.is_empty() || password.is_empty() || username.is_empty() {
            return Err(ApiError::validation("All fields are required"));
        }

        let req = self
            .builder(reqwest::Method::POST, "/auth/v1/signup")
            .json(&SignupRequest {
                email: email.to_string(),
                password: password.to_string(),
                data: SignupMetadata {
                    username: username.to_string(),
                },
            });
        let data: serde_json::Value = Self::json(req).await?;
        parse_signup_response(data)
    }

    pub async fn get_user(&self) -> ApiResult<AuthUser> {
        Self::json(self.builder(reqwest::Method::GET, "/auth/v1/user")).await
    }

    /// Revoke the session server-side. Callers still clear local state.
    pub async fn sign_out(&self) -> ApiResult<()> {
        if !self.is_authenticated() {
            return Ok(());
        }
        Self::execute(self.builder(reqwest::Method::POST, "/auth/v1/logout"))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_with_session() {
        let data = serde_json::json!({
            "access_token": "jwt",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": {"id": "u1", "email": "w@example.com"}
        });
        let session = parse_signup_response(data).unwrap().expect("session");
        assert_eq!(session.user.id, "u1");
    }

    #[test]
    fn test_signup_pending_confirmation() {
        let data = serde_json::json!({"id": "u1", "email": "w@example.com", "confirmation_sent_at": "now"});
        assert!(parse_signup_response(data).unwrap().is_none());
    }

    #[test]
    fn test_signup_request_carries_username_metadata() {
        let req = SignupRequest {
            email: "w@example.com".to_string(),
            password: "pw".to_string(),
            data: SignupMetadata {
                username: "writer".to_string(),
            },
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["data"]["username"], "writer");
    }
}
