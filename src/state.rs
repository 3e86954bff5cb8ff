use std::sync::Arc;

use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, PooledConnection},
};

use crate::{
    auth::jwt::JwtService,
    config::AppConfig,
    db::PgPool,
    error::{AppError, AppResult},
    revalidate::Revalidator,
};

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
    pub revalidator: Revalidator,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig, jwt: JwtService) -> Self {
        let revalidator = Revalidator::new(config.revalidate_endpoint.clone());
        Self {
            pool,
            config: Arc::new(config),
            jwt,
            revalidator,
        }
    }

    pub fn db(&self) -> AppResult<PgPooledConnection> {
        self.pool
            .get()
            .map_err(|err| AppError::internal(format!("database pool error: {err}")))
    }
}
