// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod identity;
pub mod store;

use crate::config::StoreConfig;
use crate::db::{self, SharedConnection};
use anyhow::Result;
use identity::{IdentityProvider, LocalIdentity};
use std::sync::Arc;
use store::{DocumentStore, SqliteStore};
use tracing::info;

/// The collaborators behind authenticated mode.
#[derive(Clone)]
pub struct Backend {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Backend {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    pub fn sqlite(conn: SharedConnection) -> Result<Self> {
        let store = SqliteStore::new(Arc::clone(&conn))?;
        Ok(Self::new(Arc::new(store), Arc::new(LocalIdentity::new(conn))))
    }

    pub fn connect(cfg: &StoreConfig) -> Result<Self> {
        let path = match &cfg.database_path {
            Some(p) => p.clone(),
            None => db::db_path()?,
        };
        let conn = db::open_at(&path)?;
        info!(path = %path.display(), "document store connected");
        Self::sqlite(conn)
    }
}
