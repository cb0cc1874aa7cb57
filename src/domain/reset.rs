//! Password reset token lifecycle.
//!
//! An account is either without a reset request or holds exactly one pending
//! `(token, expiry)` pair. Issuing a new ticket overwrites the old pair, so the
//! previous token stops matching anything. Consuming a pending token either
//! changes the password (expiry still ahead) or just clears the pair (expiry
//! reached).

use chrono::{DateTime, Duration, Utc};

use crate::constants::reset::TOKEN_BYTES;

/// Source of the current instant. Swapped out in tests to pin the expiry
/// boundary.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Reset state of one account, read from its token/expiry columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetState {
    NoRequest,
    Pending {
        token: String,
        expires_at: DateTime<Utc>,
    },
}

impl ResetState {
    /// Half-set columns are treated as no request at all.
    #[must_use]
    pub fn from_columns(token: Option<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        match (token, expires_at) {
            (Some(token), Some(expires_at)) => Self::Pending { token, expires_at },
            _ => Self::NoRequest,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// A freshly issued token together with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTicket {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetTicket {
    #[must_use]
    pub fn issue(now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token: generate_reset_token(),
            expires_at: now + ttl,
        }
    }
}

/// What a consume attempt does with a pending token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeDecision {
    /// Expiry still ahead: set the new password and clear the token.
    Apply,
    /// Expiry reached: clear the token, keep the password.
    Expired,
}

/// The token is only good while its expiry is strictly in the future.
#[must_use]
pub fn decide(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> ConsumeDecision {
    if expires_at > now {
        ConsumeDecision::Apply
    } else {
        ConsumeDecision::Expired
    }
}

/// Random reset token, lowercase hex of [`TOKEN_BYTES`] bytes.
#[must_use]
pub fn generate_reset_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; TOKEN_BYTES] = rng.random();

    bytes
        .iter()
        .fold(String::with_capacity(TOKEN_BYTES * 2), |mut acc, b| {
            use std::fmt::Write;
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

/// Cheap shape check so garbage tokens never reach the database.
#[must_use]
pub fn looks_like_token(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2 && token.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn token_is_thirty_hex_chars() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 30);
        assert!(looks_like_token(&token));
        assert!(token.chars().all(|c| !c.is_ascii_uppercase()));
    }

    #[test]
    fn tokens_differ() {
        assert_ne!(generate_reset_token(), generate_reset_token());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert!(!looks_like_token(""));
        assert!(!looks_like_token("abc"));
        assert!(!looks_like_token(&"z".repeat(30)));
        assert!(!looks_like_token(&"a".repeat(31)));
    }

    #[test]
    fn uppercase_hex_is_not_a_token() {
        assert!(!looks_like_token(&"AB".repeat(15)));
        assert!(!looks_like_token(&format!("{}F", "0".repeat(29))));
        assert!(looks_like_token(&"0a".repeat(15)));
    }

    #[test]
    fn ticket_expires_after_ttl() {
        let ticket = ResetTicket::issue(at(1_000), Duration::minutes(10));
        assert_eq!(ticket.expires_at, at(1_600));
    }

    #[test]
    fn expiry_boundary() {
        let expires = at(1_600);
        assert_eq!(decide(expires, at(1_599)), ConsumeDecision::Apply);
        assert_eq!(decide(expires, at(1_600)), ConsumeDecision::Expired);
        assert_eq!(decide(expires, at(1_601)), ConsumeDecision::Expired);
    }

    #[test]
    fn state_requires_both_columns() {
        assert_eq!(ResetState::from_columns(None, None), ResetState::NoRequest);
        assert_eq!(
            ResetState::from_columns(Some("t".to_string()), None),
            ResetState::NoRequest
        );
        assert_eq!(ResetState::from_columns(None, Some(at(5))), ResetState::NoRequest);

        let pending = ResetState::from_columns(Some("t".to_string()), Some(at(5)));
        assert!(pending.is_pending());
    }
}
