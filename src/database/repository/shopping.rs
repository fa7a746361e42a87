//! Shopping-list persistence

use super::Repository;
use crate::database::models::ShoppingItem;
use crate::error::{AppError, Result};
use chrono::Utc;
use uuid::Uuid;

impl Repository {
    /// Create a shopping-list item
    pub async fn create_shopping_item(
        &self,
        user_id: &str,
        name: &str,
        quantity: i64,
    ) -> Result<ShoppingItem> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Item name cannot be empty".to_string()));
        }
        if quantity < 1 {
            return Err(AppError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let item = sqlx::query_as::<_, ShoppingItem>(
            r#"
            INSERT INTO shopping_items (id, user_id, name, quantity, purchased, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(name.trim())
        .bind(quantity)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created shopping item: {}", id);
        Ok(item)
    }

    /// List a user's shopping items, unpurchased first
    pub async fn list_shopping_items(&self, user_id: &str) -> Result<Vec<ShoppingItem>> {
        let items = sqlx::query_as::<_, ShoppingItem>(
            "SELECT * FROM shopping_items WHERE user_id = ? ORDER BY purchased ASC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Mark an item purchased or not
    pub async fn set_item_purchased(&self, id: &str, purchased: bool) -> Result<()> {
        let rows = sqlx::query("UPDATE shopping_items SET purchased = ? WHERE id = ?")
            .bind(purchased)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::Generic(format!("Shopping item not found: {}", id)));
        }

        Ok(())
    }

    /// Delete a shopping item
    pub async fn delete_shopping_item(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM shopping_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
