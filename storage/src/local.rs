use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

use crate::schema::SQLITE_SCHEMA;
use crate::traits::ChallengeStore;
use crate::types::{
    Challenge, ChallengeFilter, ChallengeRequest, ChallengeStatus, Difficulty, Ingredient,
    NewChallengeRequest, RequestFilter, RequestStatus, StatusChange, UnknownVariant,
};
use crate::{Result, StorageError};

const REQUEST_COLUMNS: &str =
    "request_id, requested_by, description, status, reviewed_by, date_submitted";

const CHALLENGE_COLUMNS: &str =
    "challenge_id, request_id, description, approved_by, difficulty, status, claimed_by, created_at";

/// SQLite-backed store for local runs and tests.
///
/// rusqlite is synchronous, so every call runs on tokio's blocking pool with
/// the connection locked. Writes open a `BEGIN IMMEDIATE` transaction, which
/// also serializes them against other processes sharing the file.
pub struct LocalStore {
    conn: Arc<Mutex<Connection>>,
}

impl LocalStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA busy_timeout=5000;",
        )?;

        let store = Self::with_connection(conn)?;
        info!("Opened local store at {:?}", path);
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SQLITE_SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the locked connection on the blocking pool.
    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            f(&mut *conn)
        })
        .await?
    }
}

// ============================================================================
// ROW HELPERS
// ============================================================================

fn enum_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_enum_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = UnknownVariant>,
{
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => enum_column(row, idx).map(Some),
        None => Ok(None),
    }
}

fn read_request(row: &Row<'_>) -> rusqlite::Result<ChallengeRequest> {
    Ok(ChallengeRequest {
        request_id: row.get(0)?,
        requested_by_id: row.get(1)?,
        description: row.get(2)?,
        status: enum_column(row, 3)?,
        reviewed_by_id: row.get(4)?,
        date_submitted: row.get(5)?,
    })
}

fn read_challenge(row: &Row<'_>) -> rusqlite::Result<Challenge> {
    Ok(Challenge {
        challenge_id: row.get(0)?,
        request_id: row.get(1)?,
        description: row.get(2)?,
        approved_by_id: row.get(3)?,
        difficulty: optional_enum_column(row, 4)?,
        status: enum_column(row, 5)?,
        claimed_by_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn read_ingredient(row: &Row<'_>) -> rusqlite::Result<Ingredient> {
    Ok(Ingredient {
        ingredient_id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn ensure_user(conn: &Connection, user_id: i64) -> Result<()> {
    conn.query_row(
        "SELECT 1 FROM users WHERE user_id = ?1",
        params![user_id],
        |_| Ok(()),
    )
    .optional()?
    .ok_or_else(|| StorageError::NotFound(format!("user {}", user_id)))
}

fn ensure_ingredient(conn: &Connection, ingredient_id: i64) -> Result<()> {
    conn.query_row(
        "SELECT 1 FROM ingredients WHERE ingredient_id = ?1",
        params![ingredient_id],
        |_| Ok(()),
    )
    .optional()?
    .ok_or_else(|| StorageError::NotFound(format!("ingredient {}", ingredient_id)))
}

fn find_challenge(conn: &Connection, challenge_id: i64) -> Result<Option<Challenge>> {
    let sql = format!(
        "SELECT {} FROM challenges WHERE challenge_id = ?1",
        CHALLENGE_COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![challenge_id], read_challenge)
        .optional()?)
}

fn require_challenge(conn: &Connection, challenge_id: i64) -> Result<Challenge> {
    find_challenge(conn, challenge_id)?
        .ok_or_else(|| StorageError::NotFound(format!("challenge {}", challenge_id)))
}

/// Flips a request out of `NOT_REVIEWED` and returns its description.
fn mark_reviewed(
    conn: &Connection,
    request_id: i64,
    reviewer_id: i64,
    outcome: RequestStatus,
) -> Result<String> {
    let current: RequestStatus = conn
        .query_row(
            "SELECT status FROM challenge_requests WHERE request_id = ?1",
            params![request_id],
            |row| enum_column(row, 0),
        )
        .optional()?
        .ok_or_else(|| StorageError::NotFound(format!("request {}", request_id)))?;

    if current.is_terminal() {
        return Err(StorageError::InvalidState(format!(
            "request {} was already reviewed ({})",
            request_id, current
        )));
    }

    ensure_user(conn, reviewer_id)?;

    let description = conn
        .query_row(
            "UPDATE challenge_requests SET status = ?3, reviewed_by = ?2
             WHERE request_id = ?1 AND status = 'NOT_REVIEWED'
             RETURNING description",
            params![request_id, reviewer_id, outcome.as_str()],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .ok_or_else(|| {
            StorageError::InvalidState(format!("request {} was already reviewed", request_id))
        })?;

    Ok(description)
}

#[async_trait]
impl ChallengeStore for LocalStore {
    // ==================== Catalogue ====================

    async fn create_user(&self, username: &str) -> Result<i64> {
        let username = username.to_string();
        self.run(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO users (username, created_at) VALUES (?1, ?2)",
                params![username, Utc::now()],
            )?;
            if inserted == 0 {
                return Err(StorageError::InvalidState(format!(
                    "user '{}' already exists",
                    username
                )));
            }
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn create_ingredient(&self, name: &str) -> Result<Ingredient> {
        let name = name.to_string();
        self.run(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO ingredients (name) VALUES (?1)",
                params![name],
            )?;
            if inserted == 0 {
                return Err(StorageError::InvalidState(format!(
                    "ingredient '{}' already exists",
                    name
                )));
            }
            Ok(Ingredient {
                ingredient_id: conn.last_insert_rowid(),
                name,
            })
        })
        .await
    }

    async fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        self.run(|conn| {
            let mut stmt =
                conn.prepare("SELECT ingredient_id, name FROM ingredients ORDER BY name ASC")?;
            let ingredients = stmt
                .query_map([], read_ingredient)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ingredients)
        })
        .await
    }

    // ==================== Challenge Requests ====================

    async fn submit_request(&self, request: &NewChallengeRequest) -> Result<i64> {
        let request = request.clone();
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            ensure_user(&tx, request.requested_by_id)?;
            for ingredient_id in &request.ingredient_ids {
                ensure_ingredient(&tx, *ingredient_id)?;
            }

            tx.execute(
                "INSERT INTO challenge_requests (requested_by, description, status, date_submitted)
                 VALUES (?1, ?2, 'NOT_REVIEWED', ?3)",
                params![request.requested_by_id, request.description, Utc::now()],
            )?;
            let request_id = tx.last_insert_rowid();

            for ingredient_id in &request.ingredient_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO request_ingredients (request_id, ingredient_id)
                     VALUES (?1, ?2)",
                    params![request_id, ingredient_id],
                )?;
            }

            tx.commit()?;

            debug!(
                "Stored request {} from user {} with {} ingredients",
                request_id,
                request.requested_by_id,
                request.ingredient_ids.len()
            );
            Ok(request_id)
        })
        .await
    }

    async fn get_request(&self, request_id: i64) -> Result<Option<ChallengeRequest>> {
        self.run(move |conn| {
            let sql = format!(
                "SELECT {} FROM challenge_requests WHERE request_id = ?1",
                REQUEST_COLUMNS
            );
            Ok(conn
                .query_row(&sql, params![request_id], read_request)
                .optional()?)
        })
        .await
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<ChallengeRequest>> {
        let filter = filter.clone();
        self.run(move |conn| {
            let sql = format!(
                "SELECT {} FROM challenge_requests
                 WHERE (?1 IS NULL OR status = ?1)
                   AND (?2 IS NULL OR requested_by = ?2)
                 ORDER BY date_submitted DESC, request_id DESC",
                REQUEST_COLUMNS
            );

            let mut stmt = conn.prepare(&sql)?;
            let requests = stmt
                .query_map(
                    params![filter.status.map(|s| s.as_str()), filter.requested_by_id],
                    read_request,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(requests)
        })
        .await
    }

    async fn request_ingredients(&self, request_id: i64) -> Result<Vec<Ingredient>> {
        self.run(move |conn| {
            conn.query_row(
                "SELECT 1 FROM challenge_requests WHERE request_id = ?1",
                params![request_id],
                |_| Ok(()),
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("request {}", request_id)))?;

            let mut stmt = conn.prepare(
                "SELECT i.ingredient_id, i.name
                 FROM request_ingredients ri
                 JOIN ingredients i ON i.ingredient_id = ri.ingredient_id
                 WHERE ri.request_id = ?1
                 ORDER BY i.name ASC",
            )?;
            let ingredients = stmt
                .query_map(params![request_id], read_ingredient)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(ingredients)
        })
        .await
    }

    async fn approve_request(&self, request_id: i64, reviewer_id: i64) -> Result<i64> {
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let description =
                mark_reviewed(&tx, request_id, reviewer_id, RequestStatus::Approved)?;

            tx.execute(
                "INSERT INTO challenges (request_id, description, approved_by, status, created_at)
                 VALUES (?1, ?2, ?3, 'UNCLAIMED', ?4)",
                params![request_id, description, reviewer_id, Utc::now()],
            )?;
            let challenge_id = tx.last_insert_rowid();

            let copied = tx.execute(
                "INSERT INTO challenge_ingredients (challenge_id, ingredient_id)
                 SELECT ?1, ingredient_id FROM request_ingredients WHERE request_id = ?2",
                params![challenge_id, request_id],
            )?;

            tx.commit()?;

            debug!(
                "Request {} approved by {} as challenge {} ({} ingredients)",
                request_id, reviewer_id, challenge_id, copied
            );
            Ok(challenge_id)
        })
        .await
    }

    async fn deny_request(&self, request_id: i64, reviewer_id: i64) -> Result<()> {
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            mark_reviewed(&tx, request_id, reviewer_id, RequestStatus::Denied)?;

            tx.commit()?;

            debug!("Request {} denied by {}", request_id, reviewer_id);
            Ok(())
        })
        .await
    }

    // ==================== Challenges ====================

    async fn get_challenge(&self, challenge_id: i64) -> Result<Option<Challenge>> {
        self.run(move |conn| find_challenge(conn, challenge_id)).await
    }

    async fn list_challenges(&self, filter: &ChallengeFilter) -> Result<Vec<Challenge>> {
        let filter = filter.clone();
        self.run(move |conn| {
            let sql = format!(
                "SELECT {} FROM challenges
                 WHERE (?1 IS NULL OR status = ?1)
                   AND (?2 IS NULL OR difficulty = ?2)
                   AND (?3 IS NULL OR claimed_by = ?3)
                 ORDER BY created_at DESC, challenge_id DESC",
                CHALLENGE_COLUMNS
            );

            let mut stmt = conn.prepare(&sql)?;
            let challenges = stmt
                .query_map(
                    params![
                        filter.status.map(|s| s.as_str()),
                        filter.difficulty.map(|d| d.as_str()),
                        filter.claimed_by_id
                    ],
                    read_challenge,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(challenges)
        })
        .await
    }

    async fn challenge_ingredients(&self, challenge_id: i64) -> Result<Vec<Ingredient>> {
        self.run(move |conn| {
            require_challenge(conn, challenge_id)?;

            let mut stmt = conn.prepare(
                "SELECT i.ingredient_id, i.name
                 FROM challenge_ingredients ci
                 JOIN ingredients i ON i.ingredient_id = ci.ingredient_id
                 WHERE ci.challenge_id = ?1
                 ORDER BY i.name ASC",
            )?;
            let ingredients = stmt
                .query_map(params![challenge_id], read_ingredient)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(ingredients)
        })
        .await
    }

    async fn claim_challenge(&self, challenge_id: i64, user_id: i64) -> Result<Challenge> {
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current = require_challenge(&tx, challenge_id)?;
            if current.status != ChallengeStatus::Unclaimed {
                return Err(StorageError::InvalidState(format!(
                    "challenge {} is {} and cannot be claimed",
                    challenge_id, current.status
                )));
            }

            ensure_user(&tx, user_id)?;

            tx.execute(
                "UPDATE challenges SET claimed_by = ?2, status = 'IN_PROGRESS'
                 WHERE challenge_id = ?1 AND status = 'UNCLAIMED'",
                params![challenge_id, user_id],
            )?;
            let claimed = require_challenge(&tx, challenge_id)?;

            tx.commit()?;

            debug!("Challenge {} claimed by {}", challenge_id, user_id);
            Ok(claimed)
        })
        .await
    }

    async fn set_challenge_status(
        &self,
        challenge_id: i64,
        status: ChallengeStatus,
    ) -> Result<Challenge> {
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current = require_challenge(&tx, challenge_id)?;
            let change = current
                .status
                .transition_to(status)
                .map_err(StorageError::InvalidState)?;

            match change {
                StatusChange::Unchanged => return Ok(current),
                StatusChange::Advance => {
                    tx.execute(
                        "UPDATE challenges SET status = ?2 WHERE challenge_id = ?1",
                        params![challenge_id, status.as_str()],
                    )?;
                }
                StatusChange::Release => {
                    tx.execute(
                        "UPDATE challenges SET status = ?2, claimed_by = NULL
                         WHERE challenge_id = ?1",
                        params![challenge_id, status.as_str()],
                    )?;
                }
            }
            let updated = require_challenge(&tx, challenge_id)?;

            tx.commit()?;

            debug!(
                "Challenge {} moved {} -> {} ({:?})",
                challenge_id, current.status, status, change
            );
            Ok(updated)
        })
        .await
    }

    async fn set_challenge_difficulty(
        &self,
        challenge_id: i64,
        difficulty: Difficulty,
    ) -> Result<Challenge> {
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current = require_challenge(&tx, challenge_id)?;
            if current.status == ChallengeStatus::Completed {
                return Err(StorageError::InvalidState(format!(
                    "challenge {} is COMPLETED; its difficulty is frozen",
                    challenge_id
                )));
            }

            tx.execute(
                "UPDATE challenges SET difficulty = ?2 WHERE challenge_id = ?1",
                params![challenge_id, difficulty.as_str()],
            )?;
            let updated = require_challenge(&tx, challenge_id)?;

            tx.commit()?;

            debug!("Challenge {} difficulty set to {}", challenge_id, difficulty);
            Ok(updated)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    struct Fixture {
        store: LocalStore,
        submitter: i64,
        reviewer: i64,
        rice: i64,
        egg: i64,
    }

    async fn make_fixture() -> Fixture {
        let store = LocalStore::open_in_memory().unwrap();
        let submitter = store.create_user("homecook").await.unwrap();
        let reviewer = store.create_user("admin").await.unwrap();
        let rice = store.create_ingredient("rice").await.unwrap().ingredient_id;
        let egg = store.create_ingredient("egg").await.unwrap().ingredient_id;
        Fixture {
            store,
            submitter,
            reviewer,
            rice,
            egg,
        }
    }

    async fn submit(f: &Fixture, description: &str) -> i64 {
        f.store
            .submit_request(&NewChallengeRequest {
                requested_by_id: f.submitter,
                description: description.to_string(),
                ingredient_ids: vec![f.rice, f.egg],
            })
            .await
            .unwrap()
    }

    fn count(store: &LocalStore, table: &str) -> i64 {
        let conn = store.conn.lock();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_and_get_request() {
        let f = make_fixture().await;
        let id = submit(&f, "fried rice night").await;

        let request = f.store.get_request(id).await.unwrap().unwrap();
        assert_eq!(request.requested_by_id, f.submitter);
        assert_eq!(request.description, "fried rice night");
        assert_eq!(request.status, RequestStatus::NotReviewed);
        assert!(request.reviewed_by_id.is_none());

        let names: Vec<String> = f
            .store
            .request_ingredients(id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["egg".to_string(), "rice".to_string()]);
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_ingredient_without_writing() {
        let f = make_fixture().await;
        let err = f
            .store
            .submit_request(&NewChallengeRequest {
                requested_by_id: f.submitter,
                description: "mystery".to_string(),
                ingredient_ids: vec![f.rice, 999],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::NotFound(ref m) if m == "ingredient 999"));
        assert_eq!(count(&f.store, "challenge_requests"), 0);
        assert_eq!(count(&f.store, "request_ingredients"), 0);
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_user() {
        let f = make_fixture().await;
        let err = f
            .store
            .submit_request(&NewChallengeRequest {
                requested_by_id: 404,
                description: "ghost".to_string(),
                ingredient_ids: vec![f.rice],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_approve_copies_ingredient_set() {
        let f = make_fixture().await;
        let request_id = submit(&f, "use leftover rice").await;

        let challenge_id = f.store.approve_request(request_id, f.reviewer).await.unwrap();

        let challenge = f.store.get_challenge(challenge_id).await.unwrap().unwrap();
        assert_eq!(challenge.request_id, request_id);
        assert_eq!(challenge.description, "use leftover rice");
        assert_eq!(challenge.approved_by_id, f.reviewer);
        assert_eq!(challenge.status, ChallengeStatus::Unclaimed);
        assert!(challenge.difficulty.is_none());
        assert!(challenge.claimed_by_id.is_none());

        let request_set: BTreeSet<i64> = f
            .store
            .request_ingredients(request_id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.ingredient_id)
            .collect();
        let challenge_set: BTreeSet<i64> = f
            .store
            .challenge_ingredients(challenge_id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.ingredient_id)
            .collect();
        assert_eq!(request_set, challenge_set);

        let request = f.store.get_request(request_id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Approved);
        assert_eq!(request.reviewed_by_id, Some(f.reviewer));
    }

    #[tokio::test]
    async fn test_second_review_is_rejected_without_side_effects() {
        let f = make_fixture().await;
        let request_id = submit(&f, "once only").await;
        f.store.approve_request(request_id, f.reviewer).await.unwrap();

        let err = f
            .store
            .approve_request(request_id, f.reviewer)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidState(_)));

        let err = f.store.deny_request(request_id, f.reviewer).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidState(_)));

        assert_eq!(count(&f.store, "challenges"), 1);
        assert_eq!(count(&f.store, "challenge_ingredients"), 2);
        let request = f.store.get_request(request_id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn test_approve_with_unknown_reviewer_rolls_back() {
        let f = make_fixture().await;
        let request_id = submit(&f, "nobody reviews").await;

        let err = f.store.approve_request(request_id, 12345).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));

        let request = f.store.get_request(request_id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::NotReviewed);
        assert_eq!(count(&f.store, "challenges"), 0);
    }

    #[tokio::test]
    async fn test_failed_ingredient_copy_rolls_back_approval() {
        let f = make_fixture().await;
        let request_id = submit(&f, "half approved").await;

        // Fails the last write of the approval, after the status flip and the
        // challenge insert have already run.
        f.store
            .conn
            .lock()
            .execute_batch(
                "CREATE TRIGGER fail_copy BEFORE INSERT ON challenge_ingredients
                 BEGIN SELECT RAISE(ABORT, 'copy failed'); END;",
            )
            .unwrap();

        let err = f
            .store
            .approve_request(request_id, f.reviewer)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Sqlite(_)));
        assert!(err.to_string().contains("copy failed"));

        let request = f.store.get_request(request_id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::NotReviewed);
        assert!(request.reviewed_by_id.is_none());
        assert_eq!(count(&f.store, "challenges"), 0);
        assert_eq!(count(&f.store, "challenge_ingredients"), 0);

        f.store
            .conn
            .lock()
            .execute_batch("DROP TRIGGER fail_copy;")
            .unwrap();
        f.store.approve_request(request_id, f.reviewer).await.unwrap();
        assert_eq!(count(&f.store, "challenge_ingredients"), 2);
    }

    #[tokio::test]
    async fn test_deny_creates_no_challenge() {
        let f = make_fixture().await;
        let request_id = submit(&f, "too spicy").await;

        f.store.deny_request(request_id, f.reviewer).await.unwrap();

        let request = f.store.get_request(request_id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Denied);
        assert_eq!(request.reviewed_by_id, Some(f.reviewer));
        assert_eq!(count(&f.store, "challenges"), 0);
    }

    #[tokio::test]
    async fn test_list_requests_filters() {
        let f = make_fixture().await;
        let other = f.store.create_user("other").await.unwrap();
        let first = submit(&f, "first").await;
        let second = submit(&f, "second").await;
        f.store
            .submit_request(&NewChallengeRequest {
                requested_by_id: other,
                description: "third".to_string(),
                ingredient_ids: vec![f.egg],
            })
            .await
            .unwrap();
        f.store.deny_request(first, f.reviewer).await.unwrap();

        let pending = f
            .store
            .list_requests(&RequestFilter {
                status: Some(RequestStatus::NotReviewed),
                requested_by_id: None,
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);

        let mine = f
            .store
            .list_requests(&RequestFilter {
                status: Some(RequestStatus::NotReviewed),
                requested_by_id: Some(f.submitter),
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].request_id, second);

        let all = f.store.list_requests(&RequestFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_claim_and_status_flow() {
        let f = make_fixture().await;
        let request_id = submit(&f, "claim me").await;
        let challenge_id = f.store.approve_request(request_id, f.reviewer).await.unwrap();

        let claimed = f
            .store
            .claim_challenge(challenge_id, f.submitter)
            .await
            .unwrap();
        assert_eq!(claimed.status, ChallengeStatus::InProgress);
        assert_eq!(claimed.claimed_by_id, Some(f.submitter));

        let err = f
            .store
            .claim_challenge(challenge_id, f.reviewer)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidState(_)));

        let released = f
            .store
            .set_challenge_status(challenge_id, ChallengeStatus::Unclaimed)
            .await
            .unwrap();
        assert_eq!(released.status, ChallengeStatus::Unclaimed);
        assert!(released.claimed_by_id.is_none());

        f.store
            .claim_challenge(challenge_id, f.reviewer)
            .await
            .unwrap();
        let done = f
            .store
            .set_challenge_status(challenge_id, ChallengeStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.status, ChallengeStatus::Completed);
        assert_eq!(done.claimed_by_id, Some(f.reviewer));

        let err = f
            .store
            .set_challenge_status(challenge_id, ChallengeStatus::InProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_difficulty_and_filters() {
        let f = make_fixture().await;
        let a = f
            .store
            .approve_request(submit(&f, "a").await, f.reviewer)
            .await
            .unwrap();
        let b = f
            .store
            .approve_request(submit(&f, "b").await, f.reviewer)
            .await
            .unwrap();

        let updated = f
            .store
            .set_challenge_difficulty(a, Difficulty::Hard)
            .await
            .unwrap();
        assert_eq!(updated.difficulty, Some(Difficulty::Hard));

        let hard = f
            .store
            .list_challenges(&ChallengeFilter {
                difficulty: Some(Difficulty::Hard),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hard.len(), 1);
        assert_eq!(hard[0].challenge_id, a);

        f.store.claim_challenge(b, f.submitter).await.unwrap();
        let claimed = f
            .store
            .list_challenges(&ChallengeFilter {
                claimed_by_id: Some(f.submitter),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].challenge_id, b);

        let unclaimed = f
            .store
            .list_challenges(&ChallengeFilter {
                status: Some(ChallengeStatus::Unclaimed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(unclaimed.len(), 1);
        assert_eq!(unclaimed[0].challenge_id, a);
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let f = make_fixture().await;
        assert!(f.store.get_request(77).await.unwrap().is_none());
        assert!(f.store.get_challenge(77).await.unwrap().is_none());
        assert!(matches!(
            f.store.request_ingredients(77).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            f.store.challenge_ingredients(77).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            f.store.approve_request(77, f.reviewer).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            f.store.claim_challenge(77, f.submitter).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_catalogue_entries() {
        let f = make_fixture().await;
        assert!(matches!(
            f.store.create_ingredient("rice").await,
            Err(StorageError::InvalidState(_))
        ));
        assert!(matches!(
            f.store.create_user("admin").await,
            Err(StorageError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_data_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pantrypal.db");

        let request_id = {
            let store = LocalStore::open(&path).unwrap();
            let user = store.create_user("persistent").await.unwrap();
            let salt = store.create_ingredient("salt").await.unwrap();
            store
                .submit_request(&NewChallengeRequest {
                    requested_by_id: user,
                    description: "salted caramel".to_string(),
                    ingredient_ids: vec![salt.ingredient_id],
                })
                .await
                .unwrap()
        };

        let store = LocalStore::open(&path).unwrap();
        let request = store.get_request(request_id).await.unwrap().unwrap();
        assert_eq!(request.description, "salted caramel");
        let ingredients = store.request_ingredients(request_id).await.unwrap();
        assert_eq!(ingredients.len(), 1);
        assert_eq!(ingredients[0].name, "salt");
    }
}
