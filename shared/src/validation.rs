//! Request validation for the inventory platform
//!
//! Movement, product and counterparty payloads arrive as loosely typed JSON so
//! that every violation can be reported against the field that caused it, in
//! a fixed field order. Simple string rules return `&'static str` messages.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{NewMovement, NewParty, NewProduct, PartyChanges, ProductChanges};
use crate::types::MovementType;

/// Spanish accented letters accepted in person and product names
const ACCENTED_LETTERS: &str = "ÁÉÍÓÚáéíóúüÜñÑ";

pub const REFERENCE_MAX_LEN: usize = 50;
pub const RESPONSIBLE_NAME_MAX_LEN: usize = 80;
pub const PRODUCT_CODE_MAX_LEN: usize = 20;
pub const NAME_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 255;
pub const CATEGORY_MAX_LEN: usize = 50;
pub const CONTACT_MAX_LEN: usize = 100;

/// A single invalid field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// JSON field readers
// ============================================================================

/// Read an integral JSON value. Integral floats and numeric strings are
/// accepted the same way a lenient form parser would.
fn read_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn integer_field(value: &Value, field: &str) -> Result<i32, FieldViolation> {
    let n = read_integer(value)
        .ok_or_else(|| FieldViolation::new(field, format!("{} must be an integer", field)))?;
    i32::try_from(n)
        .map_err(|_| FieldViolation::new(field, format!("{} is out of range", field)))
}

pub fn required_positive_id(value: Option<&Value>, field: &str) -> Result<i32, FieldViolation> {
    let value =
        present(value).ok_or_else(|| FieldViolation::new(field, format!("{} is required", field)))?;
    positive(integer_field(value, field)?, field)
}

pub fn optional_positive_id(
    value: Option<&Value>,
    field: &str,
) -> Result<Option<i32>, FieldViolation> {
    match present(value) {
        None => Ok(None),
        Some(v) => positive(integer_field(v, field)?, field).map(Some),
    }
}

fn positive(n: i32, field: &str) -> Result<i32, FieldViolation> {
    if n <= 0 {
        return Err(FieldViolation::new(
            field,
            format!("{} must be a positive integer", field),
        ));
    }
    Ok(n)
}

fn non_negative(value: &Value, field: &str) -> Result<i32, FieldViolation> {
    let n = integer_field(value, field)?;
    if n < 0 {
        return Err(FieldViolation::new(field, format!("{} cannot be negative", field)));
    }
    Ok(n)
}

fn string_field(value: &Value, field: &str, max_len: usize) -> Result<String, FieldViolation> {
    let s = value
        .as_str()
        .ok_or_else(|| FieldViolation::new(field, format!("{} must be a string", field)))?;
    if s.chars().count() > max_len {
        return Err(FieldViolation::new(
            field,
            format!("{} must not exceed {} characters", field, max_len),
        ));
    }
    Ok(s.to_string())
}

fn required_string(
    value: Option<&Value>,
    field: &str,
    max_len: usize,
) -> Result<String, FieldViolation> {
    let value =
        present(value).ok_or_else(|| FieldViolation::new(field, format!("{} is required", field)))?;
    let s = string_field(value, field, max_len)?;
    if s.trim().is_empty() {
        return Err(FieldViolation::new(field, format!("{} must not be empty", field)));
    }
    Ok(s)
}

/// Optional free text; an empty string counts as absent
fn optional_text(
    value: Option<&Value>,
    field: &str,
    max_len: usize,
) -> Result<Option<String>, FieldViolation> {
    match present(value) {
        None => Ok(None),
        Some(v) => {
            let s = string_field(v, field, max_len)?;
            Ok(if s.is_empty() { None } else { Some(s) })
        }
    }
}

// ============================================================================
// String rules
// ============================================================================

/// Letters (including Spanish accented letters) and whitespace only
pub fn is_letters_and_spaces(s: &str) -> bool {
    !s.trim().is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || ACCENTED_LETTERS.contains(c))
}

/// Validate a person, product or counterparty name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if !is_letters_and_spaces(name) {
        return Err("Name may only contain letters and spaces");
    }
    Ok(())
}

/// Validate a product code (ASCII alphanumeric, at most 20 characters)
pub fn validate_product_code(code: &str) -> Result<(), &'static str> {
    if code.is_empty() {
        return Err("Product code is required");
    }
    if code.chars().count() > PRODUCT_CODE_MAX_LEN {
        return Err("Product code must not exceed 20 characters");
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("Product code must be alphanumeric");
    }
    Ok(())
}

/// Validate a phone number (8 to 15 digits, no separators)
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err("Phone number may only contain digits");
    }
    if phone.len() < 8 {
        return Err("Phone number must have at least 8 digits");
    }
    if phone.len() > 15 {
        return Err("Phone number must not exceed 15 digits");
    }
    Ok(())
}

/// Validate a user's display name: 2 to 100 letters and spaces, rejecting
/// placeholder values
pub fn validate_user_name(name: &str) -> Result<(), &'static str> {
    let len = name.chars().count();
    if len < 2 {
        return Err("Name must have at least 2 characters");
    }
    if len > NAME_MAX_LEN {
        return Err("Name must not exceed 100 characters");
    }
    if name.eq_ignore_ascii_case("null") || matches!(name, "string" | "String" | "STRING") {
        return Err("Name cannot be a placeholder value");
    }
    validate_name(name)
}

/// Validate an account email: a well-formed gmail.com address
pub fn validate_account_email(email: &str) -> Result<(), &'static str> {
    if !validator::validate_email(email) {
        return Err("Invalid email format");
    }
    let (local, domain) = email.rsplit_once('@').ok_or("Invalid email format")?;
    if domain != "gmail.com" {
        return Err("Email must be a gmail.com address");
    }
    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c))
    {
        return Err("Invalid email format");
    }
    Ok(())
}

/// Password policy for new accounts: 8 to 255 characters with lowercase,
/// uppercase, digit and symbol
pub fn validate_account_password(password: &str) -> Result<(), &'static str> {
    let len = password.chars().count();
    if !(8..=255).contains(&len) {
        return Err("Password must be between 8 and 255 characters");
    }
    if !has_mixed_case_and_digit(password) {
        return Err("Password must contain an uppercase letter, a lowercase letter and a digit");
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("Password must contain a symbol");
    }
    Ok(())
}

/// Password policy for resets: 8 to 30 characters with lowercase,
/// uppercase and digit
pub fn validate_reset_password(password: &str) -> Result<(), &'static str> {
    let len = password.chars().count();
    if !(8..=30).contains(&len) {
        return Err("Password must be between 8 and 30 characters");
    }
    if !has_mixed_case_and_digit(password) {
        return Err("Password must contain an uppercase letter, a lowercase letter and a digit");
    }
    Ok(())
}

fn has_mixed_case_and_digit(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

fn named(value: Option<&Value>, field: &str, max_len: usize) -> Result<String, FieldViolation> {
    let name = required_string(value, field, max_len)?;
    validate_name(&name).map_err(|msg| FieldViolation::new(field, msg))?;
    Ok(name)
}

// ============================================================================
// Movement requests
// ============================================================================

/// Raw movement registration payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMovementInput {
    pub product_id: Option<Value>,
    #[serde(rename = "type")]
    pub movement_type: Option<Value>,
    pub quantity: Option<Value>,
    pub reference: Option<Value>,
    pub responsible_name: Option<Value>,
    pub supplier_id: Option<Value>,
    pub client_id: Option<Value>,
    pub user_id: Option<Value>,
}

/// Why a movement request was rejected before touching the ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MovementViolation {
    #[error("{0}")]
    Field(FieldViolation),

    #[error("userId is required: every movement must identify its operator")]
    OperatorRequired,

    #[error("{message}")]
    Trazability { field: String, message: String },
}

impl From<FieldViolation> for MovementViolation {
    fn from(v: FieldViolation) -> Self {
        MovementViolation::Field(v)
    }
}

/// Validate a movement request.
///
/// Fields are checked in a fixed order and the first violation is returned.
/// The operator check and the counterparty pairing run after the structural
/// checks.
pub fn validate_movement(raw: &RawMovementInput) -> Result<NewMovement, MovementViolation> {
    let product_id = required_positive_id(raw.product_id.as_ref(), "productId")?;

    let movement_type = match present(raw.movement_type.as_ref()) {
        None => return Err(FieldViolation::new("type", "type is required").into()),
        Some(Value::String(s)) => s
            .parse::<MovementType>()
            .map_err(|msg| FieldViolation::new("type", msg))?,
        Some(_) => return Err(FieldViolation::new("type", "type must be a string").into()),
    };

    let quantity = required_positive_id(raw.quantity.as_ref(), "quantity")?;
    let reference = optional_text(raw.reference.as_ref(), "reference", REFERENCE_MAX_LEN)?;
    let responsible_name = named(
        raw.responsible_name.as_ref(),
        "responsibleName",
        RESPONSIBLE_NAME_MAX_LEN,
    )?;
    let supplier_id = optional_positive_id(raw.supplier_id.as_ref(), "supplierId")?;
    let client_id = optional_positive_id(raw.client_id.as_ref(), "clientId")?;

    if present(raw.user_id.as_ref()).is_none() {
        return Err(MovementViolation::OperatorRequired);
    }
    let user_id = required_positive_id(raw.user_id.as_ref(), "userId")?;

    let (required, forbidden) = match movement_type {
        MovementType::Entrada => (supplier_id, client_id),
        MovementType::Salida => (client_id, supplier_id),
    };
    if required.is_none() {
        let field = movement_type.required_counterparty();
        return Err(MovementViolation::Trazability {
            field: field.to_string(),
            message: format!("{} is required for an {} movement", field, movement_type),
        });
    }
    if forbidden.is_some() {
        let field = movement_type.forbidden_counterparty();
        return Err(MovementViolation::Trazability {
            field: field.to_string(),
            message: format!("{} must not be provided for an {} movement", field, movement_type),
        });
    }

    Ok(NewMovement {
        movement_type,
        product_id,
        quantity,
        reference,
        responsible_name,
        supplier_id,
        client_id,
        user_id,
    })
}

// ============================================================================
// Product requests
// ============================================================================

/// Raw product payload used by create and update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProductInput {
    pub id: Option<Value>,
    pub code: Option<Value>,
    pub name: Option<Value>,
    pub description: Option<Value>,
    pub category: Option<Value>,
    pub unit: Option<Value>,
    pub min_stock: Option<Value>,
    pub current_stock: Option<Value>,
}

fn product_code(value: Option<&Value>) -> Result<String, FieldViolation> {
    let code = required_string(value, "code", PRODUCT_CODE_MAX_LEN)?;
    validate_product_code(&code).map_err(|msg| FieldViolation::new("code", msg))?;
    Ok(code)
}

pub fn validate_new_product(raw: &RawProductInput) -> Result<NewProduct, FieldViolation> {
    let code = product_code(raw.code.as_ref())?;
    let name = named(raw.name.as_ref(), "name", NAME_MAX_LEN)?;
    let description = optional_text(raw.description.as_ref(), "description", DESCRIPTION_MAX_LEN)?;
    let category = required_string(raw.category.as_ref(), "category", CATEGORY_MAX_LEN)?;
    let unit = required_string(raw.unit.as_ref(), "unit", CATEGORY_MAX_LEN)?;
    let min_stock = match present(raw.min_stock.as_ref()) {
        Some(v) => non_negative(v, "minStock")?,
        None => return Err(FieldViolation::new("minStock", "minStock is required")),
    };
    let initial_stock = match present(raw.current_stock.as_ref()) {
        Some(v) => non_negative(v, "currentStock")?,
        None => 0,
    };

    Ok(NewProduct {
        code,
        name,
        description,
        category,
        unit,
        min_stock,
        initial_stock,
    })
}

/// Validate a partial product update. Stock levels are not editable here.
pub fn validate_product_changes(
    raw: &RawProductInput,
) -> Result<(i32, ProductChanges), FieldViolation> {
    let id = required_positive_id(raw.id.as_ref(), "id")?;

    if raw.current_stock.is_some() {
        return Err(FieldViolation::new(
            "currentStock",
            "currentStock is managed through inventory movements",
        ));
    }

    let mut changes = ProductChanges::default();
    if present(raw.code.as_ref()).is_some() {
        changes.code = Some(product_code(raw.code.as_ref())?);
    }
    if present(raw.name.as_ref()).is_some() {
        changes.name = Some(named(raw.name.as_ref(), "name", NAME_MAX_LEN)?);
    }
    if let Some(v) = present(raw.description.as_ref()) {
        changes.description = Some(string_field(v, "description", DESCRIPTION_MAX_LEN)?);
    }
    if present(raw.category.as_ref()).is_some() {
        changes.category = Some(required_string(
            raw.category.as_ref(),
            "category",
            CATEGORY_MAX_LEN,
        )?);
    }
    if present(raw.unit.as_ref()).is_some() {
        changes.unit = Some(required_string(raw.unit.as_ref(), "unit", CATEGORY_MAX_LEN)?);
    }
    if let Some(v) = present(raw.min_stock.as_ref()) {
        changes.min_stock = Some(non_negative(v, "minStock")?);
    }

    if changes.is_empty() {
        return Err(FieldViolation::new(
            "id",
            "provide the product id and at least one field to update",
        ));
    }
    Ok((id, changes))
}

// ============================================================================
// Supplier and client requests
// ============================================================================

/// Raw supplier or client payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPartyInput {
    pub id: Option<Value>,
    pub name: Option<Value>,
    pub phone: Option<Value>,
    pub contact: Option<Value>,
}

fn phone(value: Option<&Value>) -> Result<String, FieldViolation> {
    let phone = required_string(value, "phone", 15)?;
    validate_phone(&phone).map_err(|msg| FieldViolation::new("phone", msg))?;
    Ok(phone)
}

pub fn validate_new_party(raw: &RawPartyInput) -> Result<NewParty, FieldViolation> {
    Ok(NewParty {
        name: named(raw.name.as_ref(), "name", NAME_MAX_LEN)?,
        phone: phone(raw.phone.as_ref())?,
        contact: optional_text(raw.contact.as_ref(), "contact", CONTACT_MAX_LEN)?,
    })
}

pub fn validate_party_changes(raw: &RawPartyInput) -> Result<(i32, PartyChanges), FieldViolation> {
    let id = required_positive_id(raw.id.as_ref(), "id")?;

    let mut changes = PartyChanges::default();
    if present(raw.name.as_ref()).is_some() {
        changes.name = Some(named(raw.name.as_ref(), "name", NAME_MAX_LEN)?);
    }
    if present(raw.phone.as_ref()).is_some() {
        changes.phone = Some(phone(raw.phone.as_ref())?);
    }
    if let Some(v) = present(raw.contact.as_ref()) {
        changes.contact = Some(string_field(v, "contact", CONTACT_MAX_LEN)?);
    }

    if changes.is_empty() {
        return Err(FieldViolation::new(
            "id",
            "provide the id and at least one field to update",
        ));
    }
    Ok((id, changes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn movement(value: Value) -> RawMovementInput {
        serde_json::from_value(value).unwrap()
    }

    fn entrada() -> Value {
        json!({
            "productId": 1,
            "type": "Entrada",
            "quantity": 5,
            "responsibleName": "María Núñez",
            "supplierId": 3,
            "userId": 7
        })
    }

    fn field_of(err: MovementViolation) -> String {
        match err {
            MovementViolation::Field(v) => v.field,
            MovementViolation::Trazability { field, .. } => field,
            MovementViolation::OperatorRequired => "userId".to_string(),
        }
    }

    #[test]
    fn test_valid_entrada() {
        let parsed = validate_movement(&movement(entrada())).unwrap();
        assert_eq!(parsed.movement_type, MovementType::Entrada);
        assert_eq!(parsed.supplier_id, Some(3));
        assert_eq!(parsed.client_id, None);
        assert_eq!(parsed.responsible_name, "María Núñez");
    }

    #[test]
    fn test_first_violation_wins_in_field_order() {
        let mut body = entrada();
        body["productId"] = json!(0);
        body["quantity"] = json!(-1);
        let err = validate_movement(&movement(body)).unwrap_err();
        assert_eq!(field_of(err), "productId");
    }

    #[test]
    fn test_quantity_must_be_a_positive_integer() {
        for bad in [json!(0), json!(-3), json!(1.5), json!("many"), json!(true)] {
            let mut body = entrada();
            body["quantity"] = bad;
            let err = validate_movement(&movement(body)).unwrap_err();
            assert_eq!(field_of(err), "quantity");
        }
    }

    #[test]
    fn test_integral_float_and_numeric_string_accepted() {
        let mut body = entrada();
        body["quantity"] = json!(4.0);
        body["productId"] = json!("12");
        let parsed = validate_movement(&movement(body)).unwrap();
        assert_eq!(parsed.quantity, 4);
        assert_eq!(parsed.product_id, 12);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut body = entrada();
        body["type"] = json!("Ajuste");
        let err = validate_movement(&movement(body)).unwrap_err();
        assert_eq!(field_of(err), "type");
    }

    #[test]
    fn test_reference_limits() {
        let mut body = entrada();
        body["reference"] = json!("");
        assert_eq!(validate_movement(&movement(body)).unwrap().reference, None);

        let mut body = entrada();
        body["reference"] = json!("x".repeat(51));
        let err = validate_movement(&movement(body)).unwrap_err();
        assert_eq!(field_of(err), "reference");
    }

    #[test]
    fn test_responsible_name_rules() {
        for bad in [json!("R2D2"), json!(""), json!("a".repeat(81)), Value::Null] {
            let mut body = entrada();
            body["responsibleName"] = bad;
            let err = validate_movement(&movement(body)).unwrap_err();
            assert_eq!(field_of(err), "responsibleName");
        }
    }

    #[test]
    fn test_missing_operator_is_distinct() {
        let mut body = entrada();
        body.as_object_mut().unwrap().remove("userId");
        assert_eq!(
            validate_movement(&movement(body)).unwrap_err(),
            MovementViolation::OperatorRequired
        );

        let mut body = entrada();
        body["userId"] = json!(-2);
        assert!(matches!(
            validate_movement(&movement(body)).unwrap_err(),
            MovementViolation::Field(_)
        ));
    }

    #[test]
    fn test_entrada_requires_supplier_and_forbids_client() {
        let mut body = entrada();
        body.as_object_mut().unwrap().remove("supplierId");
        let err = validate_movement(&movement(body)).unwrap_err();
        assert!(matches!(err, MovementViolation::Trazability { ref field, .. } if field == "supplierId"));

        let mut body = entrada();
        body["clientId"] = json!(4);
        let err = validate_movement(&movement(body)).unwrap_err();
        assert!(matches!(err, MovementViolation::Trazability { ref field, .. } if field == "clientId"));
    }

    #[test]
    fn test_salida_requires_client_and_forbids_supplier() {
        let body = json!({
            "productId": 1,
            "type": "Salida",
            "quantity": 2,
            "responsibleName": "Luis",
            "supplierId": 3,
            "clientId": 8,
            "userId": 7
        });
        let err = validate_movement(&movement(body)).unwrap_err();
        assert!(matches!(err, MovementViolation::Trazability { ref field, .. } if field == "supplierId"));

        let body = json!({
            "productId": 1,
            "type": "Salida",
            "quantity": 2,
            "responsibleName": "Luis",
            "supplierId": null,
            "clientId": 8,
            "userId": 7
        });
        let parsed = validate_movement(&movement(body)).unwrap();
        assert_eq!(parsed.client_id, Some(8));
        assert_eq!(parsed.supplier_id, None);
    }

    #[test]
    fn test_new_product_defaults_initial_stock() {
        let raw: RawProductInput = serde_json::from_value(json!({
            "code": "TOR10",
            "name": "Tornillo",
            "category": "Ferretería",
            "unit": "pieza",
            "minStock": 10
        }))
        .unwrap();
        let product = validate_new_product(&raw).unwrap();
        assert_eq!(product.initial_stock, 0);
        assert_eq!(product.description, None);
    }

    #[test]
    fn test_product_code_must_be_alphanumeric() {
        assert!(validate_product_code("AB-12").is_err());
        assert!(validate_product_code(&"A".repeat(21)).is_err());
        assert!(validate_product_code("AB12").is_ok());
    }

    #[test]
    fn test_product_update_rejects_stock_and_empty_changes() {
        let raw: RawProductInput =
            serde_json::from_value(json!({ "id": 1, "currentStock": 50 })).unwrap();
        assert_eq!(validate_product_changes(&raw).unwrap_err().field, "currentStock");

        let raw: RawProductInput = serde_json::from_value(json!({ "id": 1 })).unwrap();
        assert!(validate_product_changes(&raw).is_err());

        let raw: RawProductInput =
            serde_json::from_value(json!({ "id": 1, "minStock": 3 })).unwrap();
        let (id, changes) = validate_product_changes(&raw).unwrap();
        assert_eq!(id, 1);
        assert_eq!(changes.min_stock, Some(3));
    }

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone("5512345678").is_ok());
        assert!(validate_phone("1234567").is_err());
        assert!(validate_phone("1234567890123456").is_err());
        assert!(validate_phone("55-1234-5678").is_err());
    }

    #[test]
    fn test_party_update_needs_a_field() {
        let raw: RawPartyInput = serde_json::from_value(json!({ "id": 2 })).unwrap();
        assert!(validate_party_changes(&raw).is_err());
        let raw: RawPartyInput =
            serde_json::from_value(json!({ "id": 2, "contact": "Pedro" })).unwrap();
        assert_eq!(validate_party_changes(&raw).unwrap().1.contact.as_deref(), Some("Pedro"));
    }

    #[test]
    fn test_user_rules() {
        assert!(validate_user_name("null").is_err());
        assert!(validate_user_name("string").is_err());
        assert!(validate_user_name("A").is_err());
        assert!(validate_user_name("José Pérez").is_ok());

        assert!(validate_account_email("ana.lopez@gmail.com").is_ok());
        assert!(validate_account_email("ana@example.com").is_err());
        assert!(validate_account_email("not-an-email").is_err());

        assert!(validate_account_password("Secret1!").is_ok());
        assert!(validate_account_password("Secret12").is_err());
        assert!(validate_reset_password("Secret12").is_ok());
        assert!(validate_reset_password("secret12").is_err());
        assert!(validate_reset_password(&format!("Aa1{}", "x".repeat(28))).is_err());
    }
}
