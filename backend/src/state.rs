use std::sync::Arc;

use crate::{
    config::Config,
    db::connection::DbPool,
    repositories::{RequestRepository, RequestRepositoryTrait},
    services::{NotificationDispatcher, RequestLifecycleService, RequestQueryService},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub notifier: Option<NotificationDispatcher>,
    requests: Arc<dyn RequestRepositoryTrait>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config, notifier: Option<NotificationDispatcher>) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            notifier,
            requests: Arc::new(RequestRepository::new()),
        }
    }

    pub fn lifecycle(&self) -> RequestLifecycleService {
        RequestLifecycleService::new(
            self.pool.clone(),
            self.requests.clone(),
            self.notifier.clone(),
            &self.config,
        )
    }

    pub fn queries(&self) -> RequestQueryService {
        RequestQueryService::new(self.pool.clone(), self.requests.clone())
    }
}
