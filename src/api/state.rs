//! Shared state handed to every handler.

use std::sync::Arc;

use pantrypal_storage::ChallengeStore;

use crate::lifecycle::ChallengeService;

pub struct ApiState {
    pub service: ChallengeService,
}

impl ApiState {
    pub fn new(store: Arc<dyn ChallengeStore>) -> Self {
        Self {
            service: ChallengeService::new(store),
        }
    }
}
