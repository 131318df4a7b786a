//! Signed bearer tokens and the middleware that turns them into an identity.
//!
//! A token is `<user_id>.<epoch>.<expires_at>.<hex hmac-sha256 of the first three>`.
//! The epoch is the issuing user store's [`crate::users::UserStore::epoch`]; a token carried
//! over from an earlier store instance no longer names the same user and is
//! rejected even though its signature still checks out.
use crate::app::AppState;
use crate::error::ApiError;
use crate::users::UserId;
use axum::{extract::Request, extract::State, middleware::Next, response::Response};
use axum_extra::TypedHeader;
use chrono::Utc;
use constant_time_eq::constant_time_eq;
use headers::{authorization::Bearer, Authorization};
use hmac::{Hmac, Mac};
use sha2::Sha256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("malformed token")]
    Malformed,
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token was issued by a previous user store")]
    StaleEpoch,
    #[error("token expiry out of range")]
    ExpiryOutOfRange,
    #[error("invalid signing key")]
    Key,
}

/// Identity attached to a request by [`require_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

pub struct SessionKeys {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl_secs: ttl_hours.saturating_mul(3600),
        }
    }

    pub fn issue(&self, user: UserId, epoch: u64) -> Result<String, SessionError> {
        self.issue_at(user, epoch, Utc::now().timestamp())
    }

    pub fn verify(&self, token: &str, epoch: u64) -> Result<UserId, SessionError> {
        self.verify_at(token, epoch, Utc::now().timestamp())
    }

    fn issue_at(&self, user: UserId, epoch: u64, now: i64) -> Result<String, SessionError> {
        let expires_at = now
            .checked_add(self.ttl_secs)
            .ok_or(SessionError::ExpiryOutOfRange)?;
        let payload = format!("{}.{}.{}", user, epoch, expires_at);
        let sig = self.sign(&payload)?;
        Ok(format!("{}.{}", payload, hex::encode(sig)))
    }

    fn verify_at(&self, token: &str, epoch: u64, now: i64) -> Result<UserId, SessionError> {
        let (payload, sig_hex) = token.rsplit_once('.').ok_or(SessionError::Malformed)?;
        let mut parts = payload.splitn(3, '.');
        let (Some(user), Some(issued_epoch), Some(expires_at)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(SessionError::Malformed);
        };
        let user: UserId = user.parse().map_err(|_| SessionError::Malformed)?;
        let issued_epoch: u64 = issued_epoch.parse().map_err(|_| SessionError::Malformed)?;
        let expires_at: i64 = expires_at.parse().map_err(|_| SessionError::Malformed)?;
        let expected = hex::decode(sig_hex).map_err(|_| SessionError::Malformed)?;

        let computed = self.sign(payload)?;
        if expected.len() != computed.len() || !constant_time_eq(&computed, &expected) {
            return Err(SessionError::BadSignature);
        }
        if issued_epoch != epoch {
            return Err(SessionError::StaleEpoch);
        }
        if now >= expires_at {
            return Err(SessionError::Expired);
        }
        Ok(user)
    }

    fn sign(&self, payload: &str) -> Result<Vec<u8>, SessionError> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(&self.secret).map_err(|_| SessionError::Key)?;
        mac.update(payload.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Rejects the request with 401 unless it carries a valid bearer token.
pub async fn require_session(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(ApiError::Unauthorized("Authentication required"));
    };
    let user = state.sessions.verify(bearer.token(), state.users.epoch())?;
    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}
