//! Sign-in, registration and sign-out.
//!
//! Form rules are checked before anything goes on the wire. A successful
//! answer becomes the current session; failures from the auth endpoints are
//! reported as `ClientError::Auth` with the server's message.

use tracing::info;

use crate::api_client::ApiClient;
use crate::errors::ClientError;
use crate::models::{AuthRequest, Session};
use crate::validation::{validate_email, validate_full_name, validate_password};

pub async fn login(api: &ApiClient, email: &str, password: &str) -> Result<Session, ClientError> {
    let email = email.trim();
    validate_email(email)?;
    validate_password(password)?;

    let request = AuthRequest {
        email: email.to_string(),
        password: password.to_string(),
        full_name: None,
    };
    let response = api.login(&request).await.map_err(auth_failure)?;
    establish(api, response.into())
}

pub async fn register(
    api: &ApiClient,
    email: &str,
    password: &str,
    full_name: Option<&str>,
) -> Result<Session, ClientError> {
    let email = email.trim();
    validate_email(email)?;
    validate_password(password)?;
    let full_name = full_name.map(str::trim).filter(|n| !n.is_empty());
    if let Some(name) = full_name {
        validate_full_name(name)?;
    }

    let request = AuthRequest {
        email: email.to_string(),
        password: password.to_string(),
        full_name: full_name.map(str::to_string),
    };
    let response = api.register(&request).await.map_err(auth_failure)?;
    establish(api, response.into())
}

/// Forgets the session locally. The backend keeps no server-side session.
pub fn logout(api: &ApiClient) {
    if let Some(session) = api.session().current() {
        info!("Signing out {}", session.email);
    }
    api.session().clear();
}

fn establish(api: &ApiClient, session: Session) -> Result<Session, ClientError> {
    api.session().save(session.clone())?;
    info!("Signed in as {} (user {})", session.email, session.user_id);
    Ok(session)
}

/// Rejections from the auth endpoints are credential problems, not server faults.
fn auth_failure(e: ClientError) -> ClientError {
    match e {
        ClientError::Unauthorized => ClientError::Auth("Invalid email or password".to_string()),
        ClientError::Api { status, message } if (400..500).contains(&status) => {
            ClientError::Auth(message)
        }
        other => other,
    }
}
