//! Review races against a live PostgreSQL server.
//!
//! Run with `PANTRYPAL_TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.

use std::sync::Arc;

use chrono::Utc;
use pantrypal_storage::{
    ChallengeFilter, ChallengeStore, NewChallengeRequest, PgConfig, PgStore, RequestStatus,
    StorageError,
};
use tokio::sync::Barrier;

async fn connect() -> PgStore {
    let url = std::env::var("PANTRYPAL_TEST_DATABASE_URL")
        .expect("PANTRYPAL_TEST_DATABASE_URL must point at a scratch database");
    PgStore::connect(&PgConfig::from_url(url)).await.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "needs PANTRYPAL_TEST_DATABASE_URL"]
async fn test_concurrent_reviews_have_one_winner() {
    let store = Arc::new(connect().await);
    let tag = Utc::now().timestamp_nanos_opt().unwrap_or_default();

    let submitter = store
        .create_user(&format!("cook-{}", tag))
        .await
        .unwrap();
    let mut reviewers = Vec::new();
    for i in 0..8 {
        reviewers.push(
            store
                .create_user(&format!("admin{}-{}", i, tag))
                .await
                .unwrap(),
        );
    }
    let flour = store
        .create_ingredient(&format!("flour-{}", tag))
        .await
        .unwrap();
    let request_id = store
        .submit_request(&NewChallengeRequest {
            requested_by_id: submitter,
            description: "contested bread".to_string(),
            ingredient_ids: vec![flour.ingredient_id],
        })
        .await
        .unwrap();

    let barrier = Arc::new(Barrier::new(reviewers.len()));
    let mut handles = Vec::new();
    for (n, reviewer) in reviewers.into_iter().enumerate() {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            if n % 2 == 0 {
                store.approve_request(request_id, reviewer).await.map(|_| ())
            } else {
                store.deny_request(request_id, reviewer).await
            }
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => succeeded += 1,
            Err(StorageError::InvalidState(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(succeeded, 1);

    let request = store.get_request(request_id).await.unwrap().unwrap();
    let from_request = store
        .list_challenges(&ChallengeFilter::default())
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.request_id == request_id)
        .count();
    match request.status {
        RequestStatus::Approved => assert_eq!(from_request, 1),
        RequestStatus::Denied => assert_eq!(from_request, 0),
        RequestStatus::NotReviewed => panic!("request was never reviewed"),
    }
}
