//! Authentication service: password sign-in with a second factor, session
//! tokens and password recovery

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::{validate_reset_password, Role, SessionUser};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::templates;
use super::totp::TotpSecret;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::Mailer;

/// Lifetime of an emailed sign-in code
const VERIFICATION_CODE_TTL_MINUTES: i64 = 10;
/// Lifetime of a password reset link
const RESET_TOKEN_TTL_HOURS: i64 = 20;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    mailer: Arc<dyn Mailer>,
    jwt_secret: String,
    access_token_expiry: i64,
    app_url: String,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// How the second factor is expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecondFactor {
    Email,
    Totp,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// First sign-in step: the password was right, a code is now required
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginChallenge {
    pub message: String,
    pub needs_verification: bool,
    pub user_id: i32,
    pub method: SecondFactor,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyInput {
    pub user_id: i32,
    pub code: String,
}

/// Completed sign-in
#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
    pub method: SecondFactor,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordInput {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    pub new_password: String,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    role: String,
    password_hash: String,
    totp_secret: Option<String>,
    verification_code_hash: Option<String>,
    verification_code_expires_at: Option<DateTime<Utc>>,
}

const USER_ROW_COLUMNS: &str = "id, name, email, role, password_hash, totp_secret, \
     verification_code_hash, verification_code_expires_at";

/// Sign an access token for a user
pub fn issue_access_token(
    user_id: i32,
    role: Role,
    secret: &str,
    expiry_secs: i64,
) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp: (now + Duration::seconds(expiry_secs)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate an access token and return its claims
pub fn decode_access_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::unauthorized(format!("Invalid token: {}", e)))
}

/// Hash a one-time secret for storage
pub fn hash_secret(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}

fn generate_verification_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

impl AuthService {
    pub fn new(db: PgPool, mailer: Arc<dyn Mailer>, config: &Config) -> Self {
        Self {
            db,
            mailer,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            app_url: config.mail.app_url.trim_end_matches('/').to_string(),
        }
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRow>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_ROW_COLUMNS);
        let user = sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    /// Check the password and start the second factor.
    ///
    /// A code is emailed; if delivery fails the user is told to use their
    /// authenticator app instead.
    pub async fn login(&self, input: &LoginInput) -> AppResult<LoginChallenge> {
        let user = self
            .find_by_email(input.email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let code = generate_verification_code();
        let expires_at = Utc::now() + Duration::minutes(VERIFICATION_CODE_TTL_MINUTES);
        sqlx::query(
            r#"
            UPDATE users
            SET verification_code_hash = $2, verification_code_expires_at = $3
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(hash_secret(&code))
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        let mail = templates::verification_code(&user.email, &user.name, &code);
        let method = match self.mailer.send(&mail).await {
            Ok(()) => SecondFactor::Email,
            Err(e) => {
                tracing::warn!(user_id = user.id, "Verification email failed, falling back to TOTP: {}", e);
                SecondFactor::Totp
            }
        };

        let message = match method {
            SecondFactor::Email => "A verification code was sent to your email",
            SecondFactor::Totp => "Enter the code from your authenticator app",
        };

        Ok(LoginChallenge {
            message: message.to_string(),
            needs_verification: true,
            user_id: user.id,
            method,
        })
    }

    /// Check the second factor and open a session
    pub async fn verify_two_factor(&self, input: &VerifyInput) -> AppResult<Session> {
        let code = input.code.trim();
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::validation("code", "The code must have 6 digits"));
        }

        let query = format!("SELECT {} FROM users WHERE id = $1", USER_ROW_COLUMNS);
        let user = sqlx::query_as::<_, UserRow>(&query)
            .bind(input.user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let email_code_valid = match (&user.verification_code_hash, user.verification_code_expires_at) {
            (Some(stored), Some(expires_at)) => {
                expires_at > Utc::now() && *stored == hash_secret(code)
            }
            _ => false,
        };

        let method = if email_code_valid {
            SecondFactor::Email
        } else if let Some(secret) = &user.totp_secret {
            if TotpSecret::from_base32(secret.as_str()).verify(code, &user.email)? {
                SecondFactor::Totp
            } else {
                return Err(AppError::unauthorized("Invalid or expired verification code"));
            }
        } else {
            return Err(AppError::unauthorized("Invalid or expired verification code"));
        };

        sqlx::query(
            r#"
            UPDATE users
            SET is_logged_in = TRUE,
                verification_code_hash = CASE WHEN $2 THEN NULL ELSE verification_code_hash END,
                verification_code_expires_at = CASE WHEN $2 THEN NULL ELSE verification_code_expires_at END
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(method == SecondFactor::Email)
        .execute(&self.db)
        .await?;

        let role: Role = user
            .role
            .parse()
            .map_err(|e: &str| AppError::Internal(format!("Stored role is invalid: {}", e)))?;
        let token = issue_access_token(user.id, role, &self.jwt_secret, self.access_token_expiry)?;

        tracing::info!(user_id = user.id, method = ?method, "User signed in");

        Ok(Session {
            token,
            user: SessionUser {
                id: user.id,
                name: user.name,
                email: user.email,
                role: user.role,
            },
            method,
            message: "Signed in successfully".to_string(),
        })
    }

    pub async fn logout(&self, user_id: i32) -> AppResult<()> {
        sqlx::query("UPDATE users SET is_logged_in = FALSE WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        tracing::info!(user_id, "User signed out");
        Ok(())
    }

    /// Email a reset link. Returns the id of the account it was sent for.
    pub async fn forgot_password(&self, input: &ForgotPasswordInput) -> AppResult<i32> {
        let user = self
            .find_by_email(input.email.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

        sqlx::query(
            r#"
            UPDATE users
            SET reset_token_hash = $2, reset_token_expires_at = $3
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(hash_secret(&token))
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        let link = format!("{}/reset-password/{}", self.app_url, token);
        let mail = templates::password_reset_link(&user.email, &user.name, &link);
        self.mailer.send(&mail).await?;

        tracing::info!(user_id = user.id, "Password reset link sent");
        Ok(user.id)
    }

    /// Set a new password using a reset token. Returns the user id.
    pub async fn reset_password(&self, token: &str, input: &ResetPasswordInput) -> AppResult<i32> {
        validate_reset_password(&input.new_password)
            .map_err(|msg| AppError::validation("newPassword", msg))?;

        let password_hash = hash(&input.new_password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user = sqlx::query_as::<_, (i32, String, String)>(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token_hash = NULL, reset_token_expires_at = NULL
            WHERE reset_token_hash = $1 AND reset_token_expires_at > NOW()
            RETURNING id, name, email
            "#,
        )
        .bind(hash_secret(token))
        .bind(&password_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::validation("token", "The reset link is invalid or has expired"))?;

        let (user_id, name, email) = user;
        tracing::info!(user_id, "Password reset");

        let mail = templates::password_changed(&email, &name);
        if let Err(e) = self.mailer.send(&mail).await {
            tracing::warn!(user_id, "Password change confirmation not sent: {}", e);
        }

        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let token = issue_access_token(42, Role::Editor, "test-secret", 3600).unwrap();
        let claims = decode_access_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, "editor");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let token = issue_access_token(42, Role::Admin, "test-secret", 3600).unwrap();
        assert!(decode_access_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_access_token(42, Role::Admin, "test-secret", -3600).unwrap();
        assert!(decode_access_token(&token, "test-secret").is_err());
    }

    #[test]
    fn test_verification_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_hash_secret_is_stable_hex() {
        let hashed = hash_secret("123456");
        assert_eq!(hashed.len(), 64);
        assert_eq!(hashed, hash_secret("123456"));
        assert_ne!(hashed, hash_secret("123457"));
    }
}
