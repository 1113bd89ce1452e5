//! Business logic services

pub mod auth;
pub mod check_in;
pub mod policy;
pub mod redis;
pub mod stats;
pub mod visitors;

use std::sync::Arc;

use crate::{
    config::AuthConfig,
    repository::{Repository, VisitorStore},
};

use self::redis::TokenStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub visitors: visitors::VisitorService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig, tokens: Arc<dyn TokenStore>) -> Self {
        let auth = auth::AuthService::new(repository.users.clone(), auth_config, tokens);
        Self::with_store(auth, Arc::new(repository.visitors))
    }

    /// Wire the visitor services over any store
    pub fn with_store(auth: auth::AuthService, store: Arc<dyn VisitorStore>) -> Self {
        Self {
            auth,
            visitors: visitors::VisitorService::new(store.clone()),
            stats: stats::StatsService::new(store),
        }
    }
}
