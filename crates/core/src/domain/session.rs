use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::tenant::TenantId;

const TOKEN_LENGTH: usize = 40;

/// Authenticated API session. Sessions are minted out-of-band (seed
/// tooling, an external identity provider); the API only validates them.
/// Only the SHA-256 hash of the opaque token is ever stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token_hash: String,
    pub user_id: String,
    pub tenant_id: TenantId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

pub fn generate_token() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(TOKEN_LENGTH).map(char::from).collect()
}

pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut encoded = String::with_capacity(digest.len() * 2);
    for byte in digest {
        encoded.push_str(&format!("{byte:02x}"));
    }
    encoded
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::domain::tenant::TenantId;

    use super::{generate_token, hash_token, Session};

    #[test]
    fn generated_tokens_are_distinct_and_sized() {
        let first = generate_token();
        let second = generate_token();
        assert_eq!(first.len(), 40);
        assert_ne!(first, second);
    }

    #[test]
    fn hashing_is_stable_and_hex_encoded() {
        let hash = hash_token("session-token");
        assert_eq!(hash, hash_token("session-token"));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let now = Utc::now();
        let session = Session {
            token_hash: hash_token("t"),
            user_id: "u-ops".to_string(),
            tenant_id: TenantId("tn-acme".to_string()),
            expires_at: now,
            created_at: now - Duration::hours(8),
        };

        assert!(session.is_expired(now));
        assert!(!session.is_expired(now - Duration::seconds(1)));
    }
}
