use crate::data_store::UserId;
use base64::Engine;
use ring::hmac;
use std::fmt::{Display, Formatter};

/// Identity of a client, carried in the `X-SESSION-TOKEN` header of each request.
///
/// The token holds the id of the authenticated user and the time it has been issued. It is
/// serialized as `{base64(payload)}.{base64(signature)}`, where the signature is an HMAC-SHA256 of
/// the payload, keyed with the server's secret. Only the server can create valid tokens, so the
/// client cannot tamper with the user id.
///
/// The user roles are not part of the token. They are looked up from the database for each
/// request via [crate::data_store::LittleLemonStoreFacade::get_auth_token_for_session].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    user_id: UserId,
    issued_at: i64,
}

impl SessionToken {
    pub fn new(user_id: UserId) -> Self {
        SessionToken {
            user_id,
            issued_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Parse and verify a session token string.
    ///
    /// Tokens older than `max_age` are rejected with [SessionError::ExpiredToken].
    pub fn from_string(
        data: &str,
        secret: &str,
        max_age: std::time::Duration,
    ) -> Result<Self, SessionError> {
        let (payload_b64, signature_b64) = data
            .trim()
            .split_once('.')
            .ok_or(SessionError::InvalidTokenFormat)?;
        let payload = BASE64
            .decode(payload_b64)
            .map_err(|_| SessionError::InvalidTokenFormat)?;
        let signature = BASE64
            .decode(signature_b64)
            .map_err(|_| SessionError::InvalidTokenFormat)?;
        hmac::verify(&signing_key(secret), &payload, &signature)
            .map_err(|_| SessionError::SignatureVerificationFailed)?;

        let payload = String::from_utf8(payload).map_err(|_| SessionError::InvalidTokenFormat)?;
        let (user_id, issued_at) = payload
            .split_once(':')
            .ok_or(SessionError::InvalidTokenFormat)?;
        let token = SessionToken {
            user_id: user_id
                .parse()
                .map_err(|_| SessionError::InvalidTokenFormat)?,
            issued_at: issued_at
                .parse()
                .map_err(|_| SessionError::InvalidTokenFormat)?,
        };

        let age = chrono::Utc::now().timestamp() - token.issued_at;
        if age > max_age.as_secs() as i64 {
            return Err(SessionError::ExpiredToken);
        }
        Ok(token)
    }

    pub fn as_string(&self, secret: &str) -> String {
        let payload = format!("{}:{}", self.user_id, self.issued_at);
        let signature = hmac::sign(&signing_key(secret), payload.as_bytes());
        format!(
            "{}.{}",
            BASE64.encode(payload.as_bytes()),
            BASE64.encode(signature.as_ref())
        )
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::URL_SAFE_NO_PAD;

fn signing_key(secret: &str) -> hmac::Key {
    hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes())
}

#[derive(Debug, PartialEq, Eq)]
pub enum SessionError {
    InvalidTokenFormat,
    SignatureVerificationFailed,
    ExpiredToken,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidTokenFormat => f.write_str("Invalid session token format"),
            SessionError::SignatureVerificationFailed => {
                f.write_str("Session token signature is invalid")
            }
            SessionError::ExpiredToken => f.write_str("Session token is expired"),
        }
    }
}

impl std::error::Error for SessionError {}
