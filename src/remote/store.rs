// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-user document collections with live snapshot subscriptions.

use crate::db::{self, SharedConnection};
use rusqlite::{Connection, params};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Accounts,
    Transactions,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Accounts => "accounts",
            Collection::Transactions => "transactions",
        }
    }
}

/// `users/{uid}/{collection}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    pub uid: String,
    pub collection: Collection,
}

impl CollectionPath {
    pub fn new(uid: impl Into<String>, collection: Collection) -> Self {
        Self {
            uid: uid.into(),
            collection,
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "users/{}/{}", self.uid, self.collection.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("document encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("document body must be a JSON object")]
    NotAnObject,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Receives the full contents of a collection every time it changes.
pub trait DocumentListener: Send + Sync {
    fn snapshot(&self, docs: Vec<Document>);
}

impl<F> DocumentListener for F
where
    F: Fn(Vec<Document>) + Send + Sync,
{
    fn snapshot(&self, docs: Vec<Document>) {
        self(docs)
    }
}

pub trait DocumentStore: Send + Sync {
    /// Stores `body` under a freshly generated id and returns that id.
    fn insert(&self, path: &CollectionPath, body: Value) -> Result<String, StoreError>;

    fn delete(&self, path: &CollectionPath, id: &str) -> Result<(), StoreError>;

    /// Registers `listener` and delivers the current snapshot before returning.
    /// The listener stays registered until the returned handle is dropped.
    fn subscribe(
        &self,
        path: &CollectionPath,
        listener: Arc<dyn DocumentListener>,
    ) -> Result<Subscription, StoreError>;

    /// Re-delivers snapshots if another writer changed the data.
    fn refresh(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

type Entry = (u64, CollectionPath, Arc<dyn DocumentListener>);

/// Listener bookkeeping shared by store implementations.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<Entry>>,
}

impl ListenerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(
        self: &Arc<Self>,
        path: &CollectionPath,
        listener: Arc<dyn DocumentListener>,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, path.clone(), listener));
        debug!(subscription = id, %path, "listener registered");
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    pub fn listeners_for(&self, path: &CollectionPath) -> Vec<Arc<dyn DocumentListener>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, p, _)| p == path)
            .map(|(_, _, l)| Arc::clone(l))
            .collect()
    }

    pub fn paths(&self) -> Vec<CollectionPath> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<CollectionPath> = Vec::new();
        for (_, p, _) in entries.iter() {
            if !out.contains(p) {
                out.push(p.clone());
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: u64) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(eid, _, _)| *eid != id);
        debug!(subscription = id, "listener removed");
    }
}

/// Live subscription handle. Dropping it unregisters the listener.
pub struct Subscription {
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

/// Document store backed by a `documents` table, one JSON body per row.
pub struct SqliteStore {
    conn: SharedConnection,
    registry: Arc<ListenerRegistry>,
    data_version: Mutex<i64>,
}

impl SqliteStore {
    pub fn new(conn: SharedConnection) -> Result<Self, StoreError> {
        let version = data_version(&db::lock(&conn))?;
        Ok(Self {
            conn,
            registry: ListenerRegistry::new(),
            data_version: Mutex::new(version),
        })
    }

    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    fn snapshot(&self, path: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let conn = db::lock(&self.conn);
        let mut stmt = conn.prepare(
            "SELECT id, body FROM documents WHERE uid=?1 AND collection=?2 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![path.uid, path.collection.as_str()], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        let mut docs = Vec::new();
        for row in rows {
            let (id, body) = row?;
            match serde_json::from_str::<Value>(&body) {
                Ok(body) => docs.push(Document { id, body }),
                Err(err) => warn!(%path, %id, error = %err, "skipping unreadable document"),
            }
        }
        Ok(docs)
    }

    fn notify(&self, path: &CollectionPath) -> Result<(), StoreError> {
        let listeners = self.registry.listeners_for(path);
        if listeners.is_empty() {
            return Ok(());
        }
        let docs = self.snapshot(path)?;
        for listener in listeners {
            listener.snapshot(docs.clone());
        }
        Ok(())
    }

    /// The write is already committed; a failed re-read only delays listeners.
    fn notify_after_write(&self, path: &CollectionPath) {
        if let Err(err) = self.notify(path) {
            warn!(%path, error = %err, "write committed but listeners were not notified");
        }
    }
}

fn data_version(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("PRAGMA data_version", [], |r| r.get(0))?)
}

impl DocumentStore for SqliteStore {
    fn insert(&self, path: &CollectionPath, body: Value) -> Result<String, StoreError> {
        let Value::Object(mut map) = body else {
            return Err(StoreError::NotAnObject);
        };
        map.remove("id");
        let id = uuid::Uuid::new_v4().simple().to_string();
        let encoded = serde_json::to_string(&Value::Object(map))?;
        db::lock(&self.conn).execute(
            "INSERT INTO documents(uid, collection, id, body) VALUES (?1, ?2, ?3, ?4)",
            params![path.uid, path.collection.as_str(), id, encoded],
        )?;
        debug!(%path, %id, "document inserted");
        self.notify_after_write(path);
        Ok(id)
    }

    fn delete(&self, path: &CollectionPath, id: &str) -> Result<(), StoreError> {
        let n = db::lock(&self.conn).execute(
            "DELETE FROM documents WHERE uid=?1 AND collection=?2 AND id=?3",
            params![path.uid, path.collection.as_str(), id],
        )?;
        debug!(%path, id, removed = n, "document delete");
        self.notify_after_write(path);
        Ok(())
    }

    fn subscribe(
        &self,
        path: &CollectionPath,
        listener: Arc<dyn DocumentListener>,
    ) -> Result<Subscription, StoreError> {
        let docs = self.snapshot(path)?;
        let sub = self.registry.register(path, Arc::clone(&listener));
        listener.snapshot(docs);
        Ok(sub)
    }

    /// The version is only recorded once every path was re-delivered, so a
    /// failed pass is retried on the next call.
    fn refresh(&self) -> Result<(), StoreError> {
        let current = data_version(&db::lock(&self.conn))?;
        let mut seen = self
            .data_version
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *seen == current {
            return Ok(());
        }
        debug!(version = current, "external change detected");
        let mut first_err = None;
        for path in self.registry.paths() {
            if let Err(err) = self.notify(&path) {
                warn!(%path, error = %err, "refresh could not re-deliver snapshot");
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => {
                *seen = current;
                Ok(())
            }
        }
    }
}
