//! User administration

use bcrypt::{hash, DEFAULT_COST};
use serde::{Deserialize, Serialize};
use shared::{
    validate_account_email, validate_account_password, validate_user_name, Role, User,
};
use sqlx::PgPool;

use super::totp::TotpSecret;
use crate::error::{AppError, AppResult};

const USER_COLUMNS: &str = "id, name, email, role, created_at";

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserInput {
    pub id: i32,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Authenticator enrollment data, shown once at account creation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpEnrollment {
    pub otpauth_url: String,
    pub qr_code_base64: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub user: User,
    pub totp: TotpEnrollment,
}

fn parse_role(role: &str) -> AppResult<Role> {
    role.parse().map_err(|msg: &str| AppError::validation("role", msg))
}

fn duplicate_email(err: sqlx::Error) -> AppError {
    match AppError::from_db(err) {
        AppError::Conflict { .. } => {
            AppError::conflict("email", "A user with this email already exists")
        }
        other => other,
    }
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let query = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&query).fetch_all(&self.db).await?;
        Ok(users)
    }

    /// Create an account with a bcrypt password hash and a fresh TOTP secret
    pub async fn create_user(&self, input: &CreateUserInput) -> AppResult<CreatedUser> {
        let name = input.name.trim();
        let email = input.email.trim();
        validate_user_name(name).map_err(|msg| AppError::validation("name", msg))?;
        validate_account_email(email).map_err(|msg| AppError::validation("email", msg))?;
        validate_account_password(&input.password)
            .map_err(|msg| AppError::validation("password", msg))?;
        let role = parse_role(&input.role)?;

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
        let secret = TotpSecret::generate();
        let totp = TotpEnrollment {
            otpauth_url: secret.otpauth_url(email)?,
            qr_code_base64: secret.qr_code_base64(email)?,
        };

        let query = format!(
            r#"
            INSERT INTO users (name, email, password_hash, role, totp_secret)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(name)
            .bind(email)
            .bind(&password_hash)
            .bind(role.as_str())
            .bind(secret.as_base32())
            .fetch_one(&self.db)
            .await
            .map_err(duplicate_email)?;

        tracing::info!(user_id = user.id, role = %role, "User created");
        Ok(CreatedUser { user, totp })
    }

    pub async fn update_user(&self, input: &UpdateUserInput) -> AppResult<User> {
        let name = input.name.as_deref().map(str::trim);
        let email = input.email.as_deref().map(str::trim);
        if let Some(name) = name {
            validate_user_name(name).map_err(|msg| AppError::validation("name", msg))?;
        }
        if let Some(email) = email {
            validate_account_email(email).map_err(|msg| AppError::validation("email", msg))?;
        }
        let role = input.role.as_deref().map(parse_role).transpose()?;

        if name.is_none() && email.is_none() && role.is_none() {
            return Err(AppError::validation(
                "id",
                "Provide the user id and at least one field to update",
            ));
        }

        let query = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(input.id)
            .bind(name)
            .bind(email)
            .bind(role.map(|r| r.as_str()))
            .fetch_optional(&self.db)
            .await
            .map_err(duplicate_email)?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| match AppError::from_db(e) {
                AppError::ReferenceViolation(_) => AppError::conflict(
                    "id",
                    "The user has registered movements and cannot be deleted",
                ),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }
}
