use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use super::model::{AuthenticatedUser, Claims};
use crate::core::error::AppError;
use crate::features::users::models::UserRole;

/// Validates HS256 bearer tokens and resolves them to a live user record
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    pool: PgPool,
}

impl JwtValidator {
    pub fn new(secret: &str, leeway: Duration, pool: PgPool) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway.as_secs();
        validation.validate_nbf = true;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            pool,
        }
    }

    /// Verify signature and expiry, returning the raw claims
    pub fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Auth(format!("Not authorized, token invalid: {}", e)))
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let claims = self.decode_claims(token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Auth("Token subject is not a valid user id".to_string()))?;

        let (role, is_active) = sqlx::query_as::<_, (UserRole, bool)>(
            "SELECT role, is_active FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load user for token: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        if !is_active {
            return Err(AppError::Unauthorized("Account deactivated".to_string()));
        }

        Ok(AuthenticatedUser { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use sqlx::postgres::PgPoolOptions;

    const SECRET: &str = "test-secret";

    fn validator() -> JwtValidator {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/greencycle_test")
            .unwrap();
        JwtValidator::new(SECRET, Duration::from_secs(0), pool)
    }

    fn token(secret: &str, sub: &str, exp: u64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp,
            iat: None,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[tokio::test]
    async fn test_decode_valid_token() {
        let user_id = Uuid::new_v4().to_string();
        let claims = validator()
            .decode_claims(&token(SECRET, &user_id, in_one_hour()))
            .unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[tokio::test]
    async fn test_decode_rejects_wrong_secret() {
        let result = validator().decode_claims(&token("other-secret", "x", in_one_hour()));
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_decode_rejects_expired_token() {
        let expired = (chrono::Utc::now().timestamp() - 3600) as u64;
        let result = validator().decode_claims(&token(SECRET, "x", expired));
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_validate_rejects_non_uuid_subject() {
        let result = validator()
            .validate_token(&token(SECRET, "not-a-uuid", in_one_hour()))
            .await;
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[test]
    fn test_legacy_id_claim_is_accepted() {
        let claims: Claims =
            serde_json::from_str(r#"{"id":"abc","iat":1,"exp":2}"#).unwrap();
        assert_eq!(claims.sub, "abc");
    }
}
