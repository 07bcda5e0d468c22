use tokio_postgres::{Row, Transaction};
use tracing::debug;

use super::catalog::{ensure_ingredients, ensure_user};
use crate::pg::PgPool;
use crate::types::{ChallengeRequest, Ingredient, NewChallengeRequest, RequestFilter, RequestStatus};
use crate::{Result, StorageError};

const REQUEST_COLUMNS: &str =
    "request_id, requested_by, description, status, reviewed_by, date_submitted";

fn request_from_row(row: &Row) -> Result<ChallengeRequest> {
    let status: String = row.get("status");
    Ok(ChallengeRequest {
        request_id: row.get("request_id"),
        requested_by_id: row.get("requested_by"),
        description: row.get("description"),
        status: status.parse()?,
        reviewed_by_id: row.get("reviewed_by"),
        date_submitted: row.get("date_submitted"),
    })
}

pub async fn insert_request(pool: &PgPool, request: &NewChallengeRequest) -> Result<i64> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    ensure_user(&tx, request.requested_by_id).await?;
    ensure_ingredients(&tx, &request.ingredient_ids).await?;

    let row = tx
        .query_one(
            "INSERT INTO challenge_requests (requested_by, description, status, date_submitted)
             VALUES ($1, $2, 'NOT_REVIEWED', NOW())
             RETURNING request_id",
            &[&request.requested_by_id, &request.description],
        )
        .await?;
    let request_id: i64 = row.get(0);

    for ingredient_id in &request.ingredient_ids {
        tx.execute(
            "INSERT INTO request_ingredients (request_id, ingredient_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
            &[&request_id, ingredient_id],
        )
        .await?;
    }

    tx.commit().await?;

    debug!(
        "Stored request {} from user {} with {} ingredients",
        request_id,
        request.requested_by_id,
        request.ingredient_ids.len()
    );
    Ok(request_id)
}

pub async fn get_request(pool: &PgPool, request_id: i64) -> Result<Option<ChallengeRequest>> {
    let client = pool.get().await?;
    let sql = format!(
        "SELECT {} FROM challenge_requests WHERE request_id = $1",
        REQUEST_COLUMNS
    );
    let row = client.query_opt(sql.as_str(), &[&request_id]).await?;

    row.as_ref().map(request_from_row).transpose()
}

pub async fn list_requests(pool: &PgPool, filter: &RequestFilter) -> Result<Vec<ChallengeRequest>> {
    let client = pool.get().await?;
    let status = filter.status.map(|s| s.as_str());

    let sql = format!(
        "SELECT {} FROM challenge_requests
         WHERE ($1::TEXT IS NULL OR status = $1)
           AND ($2::BIGINT IS NULL OR requested_by = $2)
         ORDER BY date_submitted DESC, request_id DESC",
        REQUEST_COLUMNS
    );
    let rows = client
        .query(sql.as_str(), &[&status, &filter.requested_by_id])
        .await?;

    rows.iter().map(request_from_row).collect()
}

pub async fn list_request_ingredients(pool: &PgPool, request_id: i64) -> Result<Vec<Ingredient>> {
    let client = pool.get().await?;

    client
        .query_opt(
            "SELECT 1 FROM challenge_requests WHERE request_id = $1",
            &[&request_id],
        )
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("request {}", request_id)))?;

    let rows = client
        .query(
            "SELECT i.ingredient_id, i.name
             FROM request_ingredients ri
             JOIN ingredients i ON i.ingredient_id = ri.ingredient_id
             WHERE ri.request_id = $1
             ORDER BY i.name ASC",
            &[&request_id],
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

/// Locks the request row and flips it out of `NOT_REVIEWED`. Returns the
/// request description.
async fn mark_reviewed(
    tx: &Transaction<'_>,
    request_id: i64,
    reviewer_id: i64,
    outcome: RequestStatus,
) -> Result<String> {
    let row = tx
        .query_opt(
            "SELECT status FROM challenge_requests WHERE request_id = $1 FOR UPDATE",
            &[&request_id],
        )
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("request {}", request_id)))?;

    let current: RequestStatus = row.get::<_, String>(0).parse()?;
    if current.is_terminal() {
        return Err(StorageError::InvalidState(format!(
            "request {} was already reviewed ({})",
            request_id, current
        )));
    }

    ensure_user(tx, reviewer_id).await?;

    let row = tx
        .query_opt(
            "UPDATE challenge_requests SET status = $3, reviewed_by = $2
             WHERE request_id = $1 AND status = 'NOT_REVIEWED'
             RETURNING description",
            &[&request_id, &reviewer_id, &outcome.as_str()],
        )
        .await?
        .ok_or_else(|| {
            StorageError::InvalidState(format!("request {} was already reviewed", request_id))
        })?;

    Ok(row.get(0))
}

pub async fn approve_request(pool: &PgPool, request_id: i64, reviewer_id: i64) -> Result<i64> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let description = mark_reviewed(&tx, request_id, reviewer_id, RequestStatus::Approved).await?;

    let row = tx
        .query_one(
            "INSERT INTO challenges (request_id, description, approved_by, status, created_at)
             VALUES ($1, $2, $3, 'UNCLAIMED', NOW())
             RETURNING challenge_id",
            &[&request_id, &description, &reviewer_id],
        )
        .await?;
    let challenge_id: i64 = row.get(0);

    let copied = tx
        .execute(
            "INSERT INTO challenge_ingredients (challenge_id, ingredient_id)
             SELECT $1::BIGINT, ingredient_id FROM request_ingredients WHERE request_id = $2",
            &[&challenge_id, &request_id],
        )
        .await?;

    tx.commit().await?;

    debug!(
        "Request {} approved by {} as challenge {} ({} ingredients)",
        request_id, reviewer_id, challenge_id, copied
    );
    Ok(challenge_id)
}

pub async fn deny_request(pool: &PgPool, request_id: i64, reviewer_id: i64) -> Result<()> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    mark_reviewed(&tx, request_id, reviewer_id, RequestStatus::Denied).await?;

    tx.commit().await?;

    debug!("Request {} denied by {}", request_id, reviewer_id);
    Ok(())
}
