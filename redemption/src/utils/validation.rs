use crate::error::{AppError, TOKEN_INVALID, TOKEN_REQUIRED};
use regex::Regex;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/\\\p{Cc}]{1,256}$").unwrap());

/// A token must be usable as a single object key segment.
pub fn is_valid_token(token: &str) -> bool {
    token.len() <= 256 && token != "." && token != ".." && TOKEN_RE.is_match(token)
}

pub fn validate_token(token: Option<&str>) -> Result<&str, AppError> {
    match token {
        None | Some("") => Err(AppError::InvalidRequest(TOKEN_REQUIRED)),
        Some(t) if !is_valid_token(t) => Err(AppError::InvalidRequest(TOKEN_INVALID)),
        Some(t) => Ok(t),
    }
}
