//! Client-side checks run before any request leaves the process.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::ClientError;

/// Upload ceiling enforced by the backend, 5 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MIN_FULL_NAME_CHARS: usize = 2;
/// Shortest pasted resume the backend accepts.
pub const MIN_RESUME_TEXT_CHARS: usize = 50;

const UPLOAD_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

pub fn validate_email(email: &str) -> Result<(), ClientError> {
    if email_regex().is_match(email) {
        Ok(())
    } else {
        Err(ClientError::Validation(
            "Please enter a valid email address".to_string(),
        ))
    }
}

pub fn validate_password(password: &str) -> Result<(), ClientError> {
    if password.chars().count() >= MIN_PASSWORD_CHARS {
        Ok(())
    } else {
        Err(ClientError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )))
    }
}

pub fn validate_full_name(name: &str) -> Result<(), ClientError> {
    if name.trim().chars().count() >= MIN_FULL_NAME_CHARS {
        Ok(())
    } else {
        Err(ClientError::Validation(format!(
            "Full name must be at least {MIN_FULL_NAME_CHARS} characters"
        )))
    }
}

pub fn validate_resume_text(text: &str) -> Result<(), ClientError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Validation(
            "Resume text cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() < MIN_RESUME_TEXT_CHARS {
        return Err(ClientError::Validation(format!(
            "Resume text must be at least {MIN_RESUME_TEXT_CHARS} characters"
        )));
    }
    Ok(())
}

/// Checks name and size of a file before it is read into memory and sent.
pub fn validate_upload(file_name: &str, size_bytes: u64) -> Result<(), ClientError> {
    if size_bytes == 0 {
        return Err(ClientError::Validation("File cannot be empty".to_string()));
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(ClientError::Validation(
            "File size exceeds 5MB limit".to_string(),
        ));
    }
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension {
        Some(ext) if UPLOAD_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ClientError::Validation(
            "Only PDF, TXT and MD files are allowed".to_string(),
        )),
    }
}

/// MIME type sent with the multipart `file` part.
pub fn upload_mime(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("md") => "text/markdown",
        _ => "text/plain",
    }
}
