//! Cached token set and the provider's token endpoint wire model

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Seconds of validity required before a cached token counts as usable.
const EXPIRY_BUFFER_SECS: u64 = 60;

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

/// Token material cached between refreshes.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: u64,
}

impl TokenSet {
    /// True while the access token has more than the expiry buffer left.
    pub fn is_valid(&self) -> bool {
        self.expires_at.saturating_sub(EXPIRY_BUFFER_SECS) > unix_now()
    }

    /// Build a set from a token endpoint response. `None` when the
    /// response carried no access token.
    pub fn from_response(response: TokenResponse) -> Option<TokenSet> {
        let access_token = response.access_token?;
        Some(TokenSet {
            access_token,
            refresh_token: response.refresh_token,
            expires_at: unix_now() + response.expires_in.unwrap_or(0),
        })
    }
}

/// Token endpoint response.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(expires_in: i64) -> TokenSet {
        TokenSet {
            access_token: "tok".to_string(),
            refresh_token: None,
            expires_at: (unix_now() as i64 + expires_in) as u64,
        }
    }

    #[test]
    fn validity_uses_expiry_buffer() {
        assert!(set(120).is_valid());
        assert!(!set(30).is_valid());
        assert!(!set(-3600).is_valid());
    }

    #[test]
    fn from_response_requires_access_token() {
        let response = TokenResponse {
            access_token: None,
            refresh_token: None,
            token_type: None,
            expires_in: Some(3600),
            scope: None,
            error: Some("invalid_grant".to_string()),
        };
        assert!(TokenSet::from_response(response).is_none());
    }
}
