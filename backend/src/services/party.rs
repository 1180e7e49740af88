//! Supplier and client administration
//!
//! Both counterparties share one contract, so a single service is generic
//! over the record type and its table.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    optional_positive_id, required_positive_id, validate_new_party, validate_party_changes,
    Client, RawPartyInput, Supplier,
};
use sqlx::{postgres::PgRow, FromRow, PgPool};
use std::marker::PhantomData;

use crate::error::{AppError, AppResult};

const PARTY_COLUMNS: &str = "id, name, phone, contact, created_at";

/// Escape `LIKE` wildcards so the search text matches literally
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// A counterparty table
pub trait PartyRecord: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin + 'static {
    const TABLE: &'static str;
    const LABEL: &'static str;
}

impl PartyRecord for Supplier {
    const TABLE: &'static str = "suppliers";
    const LABEL: &'static str = "Supplier";
}

impl PartyRecord for Client {
    const TABLE: &'static str = "clients";
    const LABEL: &'static str = "Client";
}

/// Search by id and/or a case-insensitive name fragment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartySearchInput {
    pub id: Option<Value>,
    pub name: Option<String>,
}

pub struct PartyService<T> {
    db: PgPool,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for PartyService<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _record: PhantomData,
        }
    }
}

pub type SupplierService = PartyService<Supplier>;
pub type ClientService = PartyService<Client>;

impl<T: PartyRecord> PartyService<T> {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }

    /// Map unique and foreign key violations to this table's conflicts
    fn classify(err: sqlx::Error) -> AppError {
        match AppError::from_db(err) {
            AppError::Conflict { resource, .. } if resource.ends_with("_phone_key") => {
                AppError::conflict(
                    "phone",
                    format!("A {} with this phone already exists", T::LABEL.to_lowercase()),
                )
            }
            AppError::Conflict { .. } => AppError::conflict(
                "name",
                format!("A {} with this name already exists", T::LABEL.to_lowercase()),
            ),
            AppError::ReferenceViolation(_) => AppError::conflict(
                "id",
                format!(
                    "The {} is referenced by registered movements",
                    T::LABEL.to_lowercase()
                ),
            ),
            other => other,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<T>> {
        let query = format!(
            "SELECT {} FROM {} ORDER BY name",
            PARTY_COLUMNS,
            T::TABLE
        );
        let records = sqlx::query_as::<_, T>(&query).fetch_all(&self.db).await?;
        Ok(records)
    }

    pub async fn create(&self, raw: &RawPartyInput) -> AppResult<T> {
        let input = validate_new_party(raw)?;

        let query = format!(
            "INSERT INTO {} (name, phone, contact) VALUES ($1, $2, $3) RETURNING {}",
            T::TABLE,
            PARTY_COLUMNS
        );

        let record = sqlx::query_as::<_, T>(&query)
            .bind(&input.name)
            .bind(&input.phone)
            .bind(&input.contact)
            .fetch_one(&self.db)
            .await
            .map_err(Self::classify)?;

        tracing::info!(table = T::TABLE, name = %input.name, "Counterparty created");
        Ok(record)
    }

    pub async fn search(&self, input: &PartySearchInput) -> AppResult<Vec<T>> {
        let id = optional_positive_id(input.id.as_ref(), "id")?;
        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(escape_like);

        if id.is_none() && name.is_none() {
            return Err(AppError::validation(
                "id",
                "Provide an id or a name to search for",
            ));
        }

        let query = format!(
            r#"
            SELECT {}
            FROM {}
            WHERE id = $1 OR name ILIKE '%' || $2 || '%' ESCAPE '\'
            ORDER BY name
            "#,
            PARTY_COLUMNS,
            T::TABLE
        );

        let records = sqlx::query_as::<_, T>(&query)
            .bind(id)
            .bind(name)
            .fetch_all(&self.db)
            .await?;

        if records.is_empty() {
            return Err(AppError::NotFound(T::LABEL.to_string()));
        }
        Ok(records)
    }

    pub async fn update(&self, raw: &RawPartyInput) -> AppResult<T> {
        let (id, changes) = validate_party_changes(raw)?;

        let query = format!(
            r#"
            UPDATE {}
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                contact = COALESCE($4, contact)
            WHERE id = $1
            RETURNING {}
            "#,
            T::TABLE,
            PARTY_COLUMNS
        );

        sqlx::query_as::<_, T>(&query)
            .bind(id)
            .bind(&changes.name)
            .bind(&changes.phone)
            .bind(&changes.contact)
            .fetch_optional(&self.db)
            .await
            .map_err(Self::classify)?
            .ok_or_else(|| AppError::NotFound(T::LABEL.to_string()))
    }

    pub async fn delete(&self, id: Option<&Value>) -> AppResult<()> {
        let id = required_positive_id(id, "id")?;

        let query = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&query)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(Self::classify)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(T::LABEL.to_string()));
        }

        tracing::info!(table = T::TABLE, id, "Counterparty deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("_"), "\\_");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("Ferreteria Sol"), "Ferreteria Sol");
    }
}
