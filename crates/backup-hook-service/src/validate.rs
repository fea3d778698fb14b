//! Request validation for the backup hook.
//!
//! Order matters: the method is checked first, then the signature is
//! verified over the raw body, and only then is the body decoded.

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, Method};

use backup_hook_core::{signature, BackupRequest, Secret};

use crate::error::{ApiError, AuthError};

/// Lowercase form of [`backup_hook_core::SIGNATURE_HEADER`].
pub static SIGNATURE: HeaderName = HeaderName::from_static("x-signature");

/// A request that passed every check.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    /// Script arguments in caller order.
    pub args: Vec<String>,
    /// The exact bytes the signature was verified against.
    pub raw_body: Bytes,
}

/// Reject anything but `POST`.
pub fn check_method(method: &Method) -> Result<(), ApiError> {
    if *method == Method::POST {
        Ok(())
    } else {
        Err(ApiError::MethodNotAllowed(method.clone()))
    }
}

/// Authenticate `body` against the `X-Signature` header.
pub fn authenticate(headers: &HeaderMap, body: &[u8], secret: &Secret) -> Result<(), AuthError> {
    let value = headers
        .get(&SIGNATURE)
        .ok_or(AuthError::MissingSignature)?;
    if value.is_empty() {
        return Err(AuthError::MissingSignature);
    }

    let value = value.to_str().map_err(|_| AuthError::InvalidSignature)?;
    if signature::verify(body, value, secret) {
        Ok(())
    } else {
        Err(AuthError::InvalidSignature)
    }
}

/// Decode the script arguments from an already-authenticated body.
///
/// An empty body means no arguments.
pub fn parse_args(body: &[u8]) -> Result<Vec<String>, ApiError> {
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let request: BackupRequest =
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))?;

    if let Some(index) = request.args.iter().position(|arg| arg.contains('\0')) {
        return Err(ApiError::InvalidArgument { index });
    }

    Ok(request.args)
}

/// Run every check on a buffered request.
pub fn validate(
    method: &Method,
    headers: &HeaderMap,
    body: Bytes,
    secret: &Secret,
) -> Result<ValidatedRequest, ApiError> {
    check_method(method)?;
    authenticate(headers, &body, secret)?;
    let args = parse_args(&body)?;

    Ok(ValidatedRequest {
        args,
        raw_body: body,
    })
}
