use sqlx::postgres::{PgPool, PgPoolOptions};
use std::ops::Deref;
use std::sync::Arc;

use crate::store::Store;

pub async fn create_pool(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .min_connections(1)
        .max_connections(max_connections)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect(url)
        .await
}

/// Store handle bound to the row-level-security role. Ordinary handlers only
/// ever see this one.
#[derive(Clone)]
pub struct AnonDb(Arc<dyn Store>);

/// Store handle bound to the service role. Reserved for server-initiated work:
/// registration bootstrap, notification fan-out, admin listings and curation.
#[derive(Clone)]
pub struct ServiceDb(Arc<dyn Store>);

impl AnonDb {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self(store)
    }

    /// Borrows the underlying store for helpers that take `&dyn Store`.
    pub fn store(&self) -> &dyn Store {
        self.0.as_ref()
    }
}

impl ServiceDb {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self(store)
    }

    pub fn store(&self) -> &dyn Store {
        self.0.as_ref()
    }
}

impl Deref for AnonDb {
    type Target = dyn Store;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl Deref for ServiceDb {
    type Target = dyn Store;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
