use tokio_postgres::{Row, Transaction};
use tracing::debug;

use super::catalog::ensure_user;
use crate::pg::PgPool;
use crate::types::{
    Challenge, ChallengeFilter, ChallengeStatus, Difficulty, Ingredient, StatusChange,
};
use crate::{Result, StorageError};

const CHALLENGE_COLUMNS: &str =
    "challenge_id, request_id, description, approved_by, difficulty, status, claimed_by, created_at";

fn challenge_from_row(row: &Row) -> Result<Challenge> {
    let status: String = row.get("status");
    let difficulty: Option<String> = row.get("difficulty");
    Ok(Challenge {
        challenge_id: row.get("challenge_id"),
        request_id: row.get("request_id"),
        description: row.get("description"),
        approved_by_id: row.get("approved_by"),
        difficulty: difficulty.map(|d| d.parse()).transpose()?,
        status: status.parse()?,
        claimed_by_id: row.get("claimed_by"),
        created_at: row.get("created_at"),
    })
}

/// Reads the challenge row and holds its lock until the transaction ends.
async fn lock_challenge(tx: &Transaction<'_>, challenge_id: i64) -> Result<Challenge> {
    let sql = format!(
        "SELECT {} FROM challenges WHERE challenge_id = $1 FOR UPDATE",
        CHALLENGE_COLUMNS
    );
    let row = tx
        .query_opt(sql.as_str(), &[&challenge_id])
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("challenge {}", challenge_id)))?;

    challenge_from_row(&row)
}

pub async fn get_challenge(pool: &PgPool, challenge_id: i64) -> Result<Option<Challenge>> {
    let client = pool.get().await?;
    let sql = format!(
        "SELECT {} FROM challenges WHERE challenge_id = $1",
        CHALLENGE_COLUMNS
    );
    let row = client.query_opt(sql.as_str(), &[&challenge_id]).await?;

    row.as_ref().map(challenge_from_row).transpose()
}

pub async fn list_challenges(pool: &PgPool, filter: &ChallengeFilter) -> Result<Vec<Challenge>> {
    let client = pool.get().await?;
    let status = filter.status.map(|s| s.as_str());
    let difficulty = filter.difficulty.map(|d| d.as_str());

    let sql = format!(
        "SELECT {} FROM challenges
         WHERE ($1::TEXT IS NULL OR status = $1)
           AND ($2::TEXT IS NULL OR difficulty = $2)
           AND ($3::BIGINT IS NULL OR claimed_by = $3)
         ORDER BY created_at DESC, challenge_id DESC",
        CHALLENGE_COLUMNS
    );
    let rows = client
        .query(
            sql.as_str(),
            &[&status, &difficulty, &filter.claimed_by_id],
        )
        .await?;

    rows.iter().map(challenge_from_row).collect()
}

pub async fn list_challenge_ingredients(
    pool: &PgPool,
    challenge_id: i64,
) -> Result<Vec<Ingredient>> {
    let client = pool.get().await?;

    client
        .query_opt(
            "SELECT 1 FROM challenges WHERE challenge_id = $1",
            &[&challenge_id],
        )
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("challenge {}", challenge_id)))?;

    let rows = client
        .query(
            "SELECT i.ingredient_id, i.name
             FROM challenge_ingredients ci
             JOIN ingredients i ON i.ingredient_id = ci.ingredient_id
             WHERE ci.challenge_id = $1
             ORDER BY i.name ASC",
            &[&challenge_id],
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

pub async fn claim_challenge(pool: &PgPool, challenge_id: i64, user_id: i64) -> Result<Challenge> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let current = lock_challenge(&tx, challenge_id).await?;
    if current.status != ChallengeStatus::Unclaimed {
        return Err(StorageError::InvalidState(format!(
            "challenge {} is {} and cannot be claimed",
            challenge_id, current.status
        )));
    }

    ensure_user(&tx, user_id).await?;

    let sql = format!(
        "UPDATE challenges SET claimed_by = $2, status = 'IN_PROGRESS'
         WHERE challenge_id = $1 AND status = 'UNCLAIMED'
         RETURNING {}",
        CHALLENGE_COLUMNS
    );
    let row = tx
        .query_opt(sql.as_str(), &[&challenge_id, &user_id])
        .await?
        .ok_or_else(|| {
            StorageError::InvalidState(format!("challenge {} was claimed concurrently", challenge_id))
        })?;
    let claimed = challenge_from_row(&row)?;

    tx.commit().await?;

    debug!("Challenge {} claimed by {}", challenge_id, user_id);
    Ok(claimed)
}

pub async fn update_challenge_status(
    pool: &PgPool,
    challenge_id: i64,
    status: ChallengeStatus,
) -> Result<Challenge> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let current = lock_challenge(&tx, challenge_id).await?;
    let change = current
        .status
        .transition_to(status)
        .map_err(StorageError::InvalidState)?;

    let sql = match change {
        StatusChange::Unchanged => return Ok(current),
        StatusChange::Advance => format!(
            "UPDATE challenges SET status = $2 WHERE challenge_id = $1 RETURNING {}",
            CHALLENGE_COLUMNS
        ),
        StatusChange::Release => format!(
            "UPDATE challenges SET status = $2, claimed_by = NULL
             WHERE challenge_id = $1 RETURNING {}",
            CHALLENGE_COLUMNS
        ),
    };
    let row = tx
        .query_one(sql.as_str(), &[&challenge_id, &status.as_str()])
        .await?;
    let updated = challenge_from_row(&row)?;

    tx.commit().await?;

    debug!(
        "Challenge {} moved {} -> {} ({:?})",
        challenge_id, current.status, status, change
    );
    Ok(updated)
}

pub async fn update_challenge_difficulty(
    pool: &PgPool,
    challenge_id: i64,
    difficulty: Difficulty,
) -> Result<Challenge> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let current = lock_challenge(&tx, challenge_id).await?;
    if current.status == ChallengeStatus::Completed {
        return Err(StorageError::InvalidState(format!(
            "challenge {} is COMPLETED; its difficulty is frozen",
            challenge_id
        )));
    }

    let sql = format!(
        "UPDATE challenges SET difficulty = $2 WHERE challenge_id = $1 RETURNING {}",
        CHALLENGE_COLUMNS
    );
    let row = tx
        .query_one(sql.as_str(), &[&challenge_id, &difficulty.as_str()])
        .await?;
    let updated = challenge_from_row(&row)?;

    tx.commit().await?;

    debug!("Challenge {} difficulty set to {}", challenge_id, difficulty);
    Ok(updated)
}
