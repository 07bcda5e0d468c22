use std::collections::HashSet;

use tokio_postgres::Transaction;

use crate::pg::PgPool;
use crate::types::Ingredient;
use crate::{Result, StorageError};

pub async fn insert_user(pool: &PgPool, username: &str) -> Result<i64> {
    let client = pool.get().await?;

    let row = client
        .query_opt(
            "INSERT INTO users (username, created_at) VALUES ($1, NOW())
             ON CONFLICT (username) DO NOTHING
             RETURNING user_id",
            &[&username],
        )
        .await?
        .ok_or_else(|| StorageError::InvalidState(format!("user '{}' already exists", username)))?;

    Ok(row.get(0))
}

pub async fn insert_ingredient(pool: &PgPool, name: &str) -> Result<Ingredient> {
    let client = pool.get().await?;

    let row = client
        .query_opt(
            "INSERT INTO ingredients (name) VALUES ($1)
             ON CONFLICT (name) DO NOTHING
             RETURNING ingredient_id, name",
            &[&name],
        )
        .await?
        .ok_or_else(|| {
            StorageError::InvalidState(format!("ingredient '{}' already exists", name))
        })?;

    Ok(Ingredient {
        ingredient_id: row.get("ingredient_id"),
        name: row.get("name"),
    })
}

pub async fn list_ingredients(pool: &PgPool) -> Result<Vec<Ingredient>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT ingredient_id, name FROM ingredients ORDER BY name ASC",
            &[],
        )
        .await?;

    Ok(rows
        .iter()
        .map(|r| Ingredient {
            ingredient_id: r.get(0),
            name: r.get(1),
        })
        .collect())
}

pub(crate) async fn ensure_user(tx: &Transaction<'_>, user_id: i64) -> Result<()> {
    tx.query_opt("SELECT 1 FROM users WHERE user_id = $1", &[&user_id])
        .await?
        .map(|_| ())
        .ok_or_else(|| StorageError::NotFound(format!("user {}", user_id)))
}

/// Fails with the first id in `ingredient_ids` that has no row.
pub(crate) async fn ensure_ingredients(tx: &Transaction<'_>, ingredient_ids: &[i64]) -> Result<()> {
    let ids = ingredient_ids.to_vec();
    let rows = tx
        .query(
            "SELECT ingredient_id FROM ingredients WHERE ingredient_id = ANY($1)",
            &[&ids],
        )
        .await?;

    let found: HashSet<i64> = rows.iter().map(|r| r.get(0)).collect();
    match ingredient_ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(StorageError::NotFound(format!("ingredient {}", missing))),
        None => Ok(()),
    }
}
