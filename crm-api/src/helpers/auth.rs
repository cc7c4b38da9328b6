use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use base64::Engine;
use futures::future::LocalBoxFuture;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use shared_types::{User, UserRole};
use std::sync::Arc;

use crate::database::{sessions, Database};
use crate::error::ApiError;

pub const TOKEN_BYTES: usize = 32;
pub const SALT_BYTES: usize = 16;

/// Session lifetime: 7 days.
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7;

/// URL-safe random token from the OS RNG.
pub fn generate_token() -> String {
    random_base64(TOKEN_BYTES)
}

pub fn generate_salt() -> String {
    random_base64(SALT_BYTES)
}

fn random_base64(nbytes: usize) -> String {
    let mut buf = vec![0u8; nbytes];
    OsRng.fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&buf)
}

/// SHA-256 of the raw token. Only this is stored.
pub fn hash_token(token: &str) -> Vec<u8> {
    Sha256::digest(token.as_bytes()).to_vec()
}

/// PBKDF2-HMAC-SHA256 rounds for new password hashes.
pub const PASSWORD_ITERATIONS: u32 = 200_000;

const PASSWORD_SCHEME: &str = "pbkdf2-sha256";
const PASSWORD_KEY_BYTES: usize = 32;

fn derive_password_key(salt: &str, password: &str, iterations: u32) -> [u8; PASSWORD_KEY_BYTES] {
    let mut key = [0u8; PASSWORD_KEY_BYTES];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    key
}

/// Hash stored as `pbkdf2-sha256$<iterations>$<base64 key>`, so the work
/// factor can be raised without invalidating existing passwords.
pub fn hash_password(salt: &str, password: &str) -> String {
    hash_password_with(salt, password, PASSWORD_ITERATIONS)
}

pub fn hash_password_with(salt: &str, password: &str, iterations: u32) -> String {
    let key = derive_password_key(salt, password, iterations.max(1));
    format!(
        "{PASSWORD_SCHEME}${}${}",
        iterations.max(1),
        base64::engine::general_purpose::STANDARD_NO_PAD.encode(key)
    )
}

/// Re-derives the key with the iteration count recorded in `stored_hash`.
/// Anything that is not a well-formed hash never verifies.
pub fn verify_password(salt: &str, password: &str, stored_hash: &str) -> bool {
    let mut parts = stored_hash.splitn(3, '$');
    let (Some(PASSWORD_SCHEME), Some(iterations), Some(encoded)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let Ok(expected) = base64::engine::general_purpose::STANDARD_NO_PAD.decode(encoded) else {
        return false;
    };
    if iterations == 0 || password.is_empty() {
        return false;
    }

    derive_password_key(salt, password, iterations).as_slice() == expected.as_slice()
}

pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// User resolved from the request's bearer token. Extraction fails with 401
/// (`requiresAuth`) when the token is missing, unknown, revoked or expired.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: String,
}

impl AuthenticatedUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.user.role == UserRole::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Only administrators can perform this action".to_string(),
            ))
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let db = req.app_data::<web::Data<Arc<Database>>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let db = db.ok_or_else(|| ApiError::Internal("Database is not configured".to_string()))?;
            let token = token.ok_or(ApiError::Unauthorized)?;
            let now = chrono::Utc::now().timestamp();

            let user = sessions::load_user_from_session(db.async_connection.clone(), &token, now)
                .await?
                .ok_or(ApiError::Unauthorized)?;

            Ok(AuthenticatedUser { user, token })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_url_safe_no_pad() {
        let token = generate_token();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert!(token.len() >= 40);
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_hash_token_is_deterministic() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_eq!(hash_token("abc").len(), 32);
    }

    #[test]
    fn test_password_verification() {
        let salt = generate_salt();
        let hash = hash_password(&salt, "hunter2");
        assert!(verify_password(&salt, "hunter2", &hash));
        assert!(!verify_password(&salt, "hunter3", &hash));
        assert!(!verify_password(&generate_salt(), "hunter2", &hash));
    }

    #[test]
    fn test_password_hash_is_a_slow_kdf() {
        let hash = hash_password("s", "pw");
        assert!(hash.starts_with("pbkdf2-sha256$200000$"), "{hash}");

        let single_digest = {
            let mut hasher = Sha256::new();
            hasher.update(b"s:pw");
            base64::engine::general_purpose::STANDARD_NO_PAD.encode(hasher.finalize())
        };
        assert!(!hash.contains(&single_digest));
        assert!(!verify_password("s", "pw", &single_digest));
    }

    #[test]
    fn test_password_hash_records_its_iterations() {
        let hash = hash_password_with("salt", "secret", 1_000);
        assert!(hash.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("salt", "secret", &hash));

        let tampered = hash.replacen("$1000$", "$1001$", 1);
        assert!(!verify_password("salt", "secret", &tampered));
        assert!(!verify_password("salt", "secret", ""));
        assert!(!verify_password("salt", "", &hash_password_with("salt", "", 1_000)));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let req = actix_web::test::TestRequest::default()
            .insert_header(("Authorization", "Bearer abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc123".to_string()));

        let req = actix_web::test::TestRequest::default()
            .insert_header(("Authorization", "Basic abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = actix_web::test::TestRequest::default().to_http_request();
        assert_eq!(bearer_token(&req), None);
    }
}
