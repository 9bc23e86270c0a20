use serde::{Deserialize, Serialize};

use crate::model::ids::UserId;

/// Authenticated user identity as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_carries_user() {
        let json = r#"{ "message": "ok", "user": { "id": 7, "username": "lan", "email": "lan@example.com" } }"#;
        let resp: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.user.unwrap().id, UserId::new(7));
    }

    #[test]
    fn register_response_may_only_have_id() {
        let resp: AuthResponse =
            serde_json::from_str(r#"{ "message": "created", "userId": 9 }"#).unwrap();
        assert_eq!(resp.user_id, Some(UserId::new(9)));
        assert!(resp.user.is_none());
    }
}
