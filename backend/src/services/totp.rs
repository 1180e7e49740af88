//! TOTP secrets for authenticator-app sign-in
//!
//! Google Authenticator compatible: SHA1, 6 digits, 30 second steps, one
//! step of clock skew accepted on either side.

use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::{AppError, AppResult};

const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;
const TOTP_SKEW: u8 = 1;
const TOTP_ISSUER: &str = "Inventario";

/// Base32 encoded TOTP secret as stored on the user row
#[derive(Debug, Clone)]
pub struct TotpSecret {
    secret_base32: String,
}

impl TotpSecret {
    pub fn generate() -> Self {
        Self {
            secret_base32: Secret::generate_secret().to_encoded().to_string(),
        }
    }

    pub fn from_base32(secret: impl Into<String>) -> Self {
        Self {
            secret_base32: secret.into(),
        }
    }

    pub fn as_base32(&self) -> &str {
        &self.secret_base32
    }

    fn to_totp(&self, account_name: &str) -> AppResult<TOTP> {
        let bytes = Secret::Encoded(self.secret_base32.clone())
            .to_bytes()
            .map_err(|e| AppError::Internal(format!("Invalid TOTP secret: {}", e)))?;

        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP,
            bytes,
            Some(TOTP_ISSUER.to_string()),
            account_name.to_string(),
        )
        .map_err(|e| AppError::Internal(format!("Failed to create TOTP: {}", e)))
    }

    pub fn verify(&self, code: &str, account_name: &str) -> AppResult<bool> {
        let totp = self.to_totp(account_name)?;
        Ok(totp.check_current(code).unwrap_or(false))
    }

    /// otpauth:// URL for manual entry
    pub fn otpauth_url(&self, account_name: &str) -> AppResult<String> {
        Ok(self.to_totp(account_name)?.get_url())
    }

    /// QR code as a base64 encoded PNG
    pub fn qr_code_base64(&self, account_name: &str) -> AppResult<String> {
        self.to_totp(account_name)?
            .get_qr_base64()
            .map_err(|e| AppError::Internal(format!("Failed to generate QR code: {}", e)))
    }

    #[cfg(test)]
    fn current_code(&self, account_name: &str) -> String {
        self.to_totp(account_name).unwrap().generate_current().unwrap()
    }
}
