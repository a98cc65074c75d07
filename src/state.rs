use crate::engine::PointsEngine;
use std::{collections::HashSet, sync::Arc};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PointsEngine>,
    pub admin_ids: Arc<HashSet<String>>,
}

impl AppState {
    pub fn new(engine: PointsEngine, admin_ids: HashSet<String>) -> Self {
        Self {
            engine: Arc::new(engine),
            admin_ids: Arc::new(admin_ids),
        }
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_ids.contains(user_id)
    }
}
