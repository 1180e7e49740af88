//! Product catalog service
//!
//! Stock levels are never written here; they change only through movements.

use serde::Deserialize;
use serde_json::Value;
use shared::{
    optional_positive_id, required_positive_id, validate_new_product, validate_product_changes,
    Product, RawProductInput,
};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

const PRODUCT_COLUMNS: &str = "id, code, name, description, category, unit, min_stock, \
     current_stock, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Activation request, matching products by id or by exact name
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductStatusInput {
    pub id: Option<Value>,
    pub name: Option<String>,
    pub active: Option<Value>,
}

/// Parse the activation flag: `1`/`0` or a JSON boolean
fn parse_active(value: Option<&Value>) -> AppResult<bool> {
    match value {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) if n.as_i64() == Some(1) => Ok(true),
        Some(Value::Number(n)) if n.as_i64() == Some(0) => Ok(false),
        _ => Err(AppError::validation(
            "active",
            "active must be 1 (enabled) or 0 (disabled)",
        )),
    }
}

fn duplicate_code(err: sqlx::Error) -> AppError {
    match AppError::from_db(err) {
        AppError::Conflict { .. } => {
            AppError::conflict("code", "A product with this code already exists")
        }
        other => other,
    }
}

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_products(&self) -> AppResult<Vec<Product>> {
        let query = format!("SELECT {} FROM products ORDER BY id", PRODUCT_COLUMNS);
        let products = sqlx::query_as::<_, Product>(&query)
            .fetch_all(&self.db)
            .await?;

        Ok(products)
    }

    pub async fn create_product(&self, raw: &RawProductInput) -> AppResult<Product> {
        let input = validate_new_product(raw)?;

        let query = format!(
            r#"
            INSERT INTO products (code, name, description, category, unit, min_stock, current_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );

        let product = sqlx::query_as::<_, Product>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.unit)
            .bind(input.min_stock)
            .bind(input.initial_stock)
            .fetch_one(&self.db)
            .await
            .map_err(duplicate_code)?;

        tracing::info!(product_id = product.id, code = %product.code, "Product created");
        Ok(product)
    }

    pub async fn update_product(&self, raw: &RawProductInput) -> AppResult<Product> {
        let (id, changes) = validate_product_changes(raw)?;

        let query = format!(
            r#"
            UPDATE products
            SET code = COALESCE($2, code),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                category = COALESCE($5, category),
                unit = COALESCE($6, unit),
                min_stock = COALESCE($7, min_stock),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );

        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(&changes.code)
            .bind(&changes.name)
            .bind(&changes.description)
            .bind(&changes.category)
            .bind(&changes.unit)
            .bind(changes.min_stock)
            .fetch_optional(&self.db)
            .await
            .map_err(duplicate_code)?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Delete a product that has no movements
    pub async fn delete_product(&self, id: Option<&Value>) -> AppResult<()> {
        let id = required_positive_id(id, "id")?;

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| match AppError::from_db(e) {
                AppError::ReferenceViolation(_) => AppError::conflict(
                    "id",
                    "The product has registered movements; deactivate it instead",
                ),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        tracing::info!(product_id = id, "Product deleted");
        Ok(())
    }

    /// Enable or disable products matched by id or by name
    pub async fn set_status(&self, input: &ProductStatusInput) -> AppResult<Vec<Product>> {
        let active = parse_active(input.active.as_ref())?;
        let id = optional_positive_id(input.id.as_ref(), "id")?;
        let name = input.name.as_deref().filter(|n| !n.trim().is_empty());

        if id.is_none() && name.is_none() {
            return Err(AppError::validation(
                "id",
                "Provide the product id or name to identify the product",
            ));
        }

        let query = format!(
            r#"
            UPDATE products
            SET is_active = $1, updated_at = NOW()
            WHERE id = $2 OR name = $3
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&query)
            .bind(active)
            .bind(id)
            .bind(name)
            .fetch_all(&self.db)
            .await?;

        if products.is_empty() {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_active() {
        assert!(parse_active(Some(&json!(1))).unwrap());
        assert!(!parse_active(Some(&json!(0))).unwrap());
        assert!(parse_active(Some(&json!(true))).unwrap());
        assert!(parse_active(Some(&json!(2))).is_err());
        assert!(parse_active(Some(&json!("1"))).is_err());
        assert!(parse_active(None).is_err());
    }
}
