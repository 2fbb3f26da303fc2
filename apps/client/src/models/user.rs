use serde::{Deserialize, Serialize};

/// The identity persisted under the `user` storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
}

/// Authenticated identity plus bearer token held by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub email: String,
    pub token: String,
}

impl Session {
    pub fn user(&self) -> User {
        User {
            id: self.user_id,
            email: self.email.clone(),
        }
    }
}

/// Body for `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: i64,
    pub email: String,
    pub token: String,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Session {
            user_id: response.user_id,
            email: response.email,
            token: response.token,
        }
    }
}
