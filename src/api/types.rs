//! Shared types for the API layer.

use std::sync::Arc;

use rusqlite::Connection;
use uuid::Uuid;

use crate::config::Config;
use crate::db::sqlite::open_database;
use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::pipeline::ai::{ChatClient, OpenAiChatClient};
use crate::pipeline::catalog::AnalyteCatalog;

/// PBKDF2 rounds for password hashing.
const PBKDF2_ITERATIONS: u32 = 600_000;
const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<Config>,
    pub catalog: Arc<AnalyteCatalog>,
    ai: Option<Arc<dyn ChatClient>>,
}

impl ApiContext {
    /// Build the context, constructing the AI client only when a credential
    /// is configured. Call before entering the async runtime — the blocking
    /// HTTP client must not be created inside it.
    pub fn new(config: Config) -> Self {
        let ai: Option<Arc<dyn ChatClient>> = config.ai_api_key.as_deref().map(|key| {
            Arc::new(OpenAiChatClient::new(
                &config.ai_base_url,
                key,
                &config.ai_model,
                config.ai_timeout_secs,
            )) as Arc<dyn ChatClient>
        });

        Self {
            config: Arc::new(config),
            catalog: Arc::new(AnalyteCatalog::bundled()),
            ai,
        }
    }

    /// Context without an AI client regardless of configuration (tests).
    pub fn without_ai(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::new(AnalyteCatalog::bundled()),
            ai: None,
        }
    }

    pub fn ai_client(&self) -> Option<&dyn ChatClient> {
        self.ai.as_deref()
    }

    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        open_database(&self.config.db_path())
    }
}

/// Authenticated user context, injected into request extensions by the auth
/// middleware after token validation.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

/// Hash a bearer token with SHA-256 for storage and lookup.
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a password with PBKDF2-SHA256 and a fresh random salt.
/// Format: pbkdf2_sha256$<iterations>$<salt b64>$<hash b64>
pub fn hash_password(password: &str) -> String {
    use base64::Engine;
    use rand::RngCore;

    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    let hash = derive_hash(password, &salt, PBKDF2_ITERATIONS);

    let b64 = base64::engine::general_purpose::STANDARD_NO_PAD;
    format!(
        "pbkdf2_sha256${PBKDF2_ITERATIONS}${}${}",
        b64.encode(salt),
        b64.encode(hash)
    )
}

/// Verify a password against a stored hash. Unknown formats verify false.
pub fn verify_password(password: &str, stored: &str) -> bool {
    use base64::Engine;

    let parts: Vec<&str> = stored.split('$').collect();
    if parts.len() != 4 || parts[0] != "pbkdf2_sha256" {
        return false;
    }
    let Ok(iterations) = parts[1].parse::<u32>() else {
        return false;
    };
    let b64 = base64::engine::general_purpose::STANDARD_NO_PAD;
    let (Ok(salt), Ok(expected)) = (b64.decode(parts[2]), b64.decode(parts[3])) else {
        return false;
    };

    if expected.len() != HASH_LENGTH {
        return false;
    }
    let actual = derive_hash(password, &salt, iterations);
    use subtle::ConstantTimeEq;
    actual.ct_eq(&expected).into()
}

fn derive_hash(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    use pbkdf2::pbkdf2_hmac;
    use sha2::Sha256;

    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut hash);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_hex_and_stable() {
        let a = hash_token("token");
        let b = hash_token("token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(hash_token("other"), a);
    }

    #[test]
    fn generated_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn password_round_trip() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn malformed_stored_hash_verifies_false() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "plaintext"));
        assert!(!verify_password("x", "pbkdf2_sha256$notanumber$a$b"));
    }
}
