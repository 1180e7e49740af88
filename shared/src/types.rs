//! Common types used across the platform

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a stock movement.
///
/// The variant names are the persisted and wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "movement_type"))]
pub enum MovementType {
    /// Goods received from a supplier
    Entrada,
    /// Goods shipped to a client
    Salida,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entrada => "Entrada",
            MovementType::Salida => "Salida",
        }
    }

    /// Name of the counterparty field this movement type requires
    pub fn required_counterparty(&self) -> &'static str {
        match self {
            MovementType::Entrada => "supplierId",
            MovementType::Salida => "clientId",
        }
    }

    /// Name of the counterparty field this movement type forbids
    pub fn forbidden_counterparty(&self) -> &'static str {
        match self {
            MovementType::Entrada => "clientId",
            MovementType::Salida => "supplierId",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Entrada" => Ok(MovementType::Entrada),
            "Salida" => Ok(MovementType::Salida),
            _ => Err("type must be \"Entrada\" or \"Salida\""),
        }
    }
}

/// Access role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Lector,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Lector => "lector",
        }
    }

    /// Whether this role may change inventory and catalog data
    pub fn can_write(&self) -> bool {
        matches!(self, Role::Admin | Role::Editor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "lector" => Ok(Role::Lector),
            _ => Err("role must be one of admin, editor, lector"),
        }
    }
}

/// Audited user actions that carry a geolocation record.
///
/// Each variant matches a row of the actions catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationAction {
    Login,
    ForgotPasswordRequest,
    PasswordReset,
}

impl LocationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationAction::Login => "login",
            LocationAction::ForgotPasswordRequest => "forgot_password_request",
            LocationAction::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for LocationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_type_round_trips_through_wire_names() {
        for kind in [MovementType::Entrada, MovementType::Salida] {
            assert_eq!(kind.as_str().parse::<MovementType>(), Ok(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!("entrada".parse::<MovementType>().is_err());
    }

    #[test]
    fn test_counterparty_fields_are_mirrored() {
        assert_eq!(MovementType::Entrada.required_counterparty(), "supplierId");
        assert_eq!(MovementType::Entrada.forbidden_counterparty(), "clientId");
        assert_eq!(MovementType::Salida.required_counterparty(), "clientId");
        assert_eq!(MovementType::Salida.forbidden_counterparty(), "supplierId");
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.can_write());
        assert!(Role::Editor.can_write());
        assert!(!Role::Lector.can_write());
        assert_eq!("lector".parse::<Role>(), Ok(Role::Lector));
        assert!("owner".parse::<Role>().is_err());
    }
}
