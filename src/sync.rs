// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Session context and the demo/authenticated data-access facade.
//!
//! A [`Session`] owns the two local collections (accounts and transactions).
//! In demo mode they are seeded from fixtures and mutated in place. In
//! authenticated mode they mirror the user's remote collections: every store
//! notification replaces a collection wholesale, and mutations go to the store
//! only, never to the local copy.

use crate::fixtures;
use crate::models::{Account, Category, NewAccount, NewTransaction, Transaction, UserProfile};
use crate::remote::Backend;
use crate::remote::identity::AuthError;
use crate::remote::store::{
    Collection, CollectionPath, Document, DocumentListener, StoreError, Subscription,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Notified with the complete new contents of a collection.
pub trait CollectionListener<T>: Send + Sync {
    fn collection_replaced(&self, items: Vec<T>);
}

/// In-memory collection shared between the session and its store listener.
#[derive(Debug)]
pub struct LocalCollection<T> {
    items: Arc<RwLock<Vec<T>>>,
}

impl<T> Clone for LocalCollection<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for LocalCollection<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<T: Clone> LocalCollection<T> {
    pub fn snapshot(&self) -> Vec<T> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn replace(&self, items: Vec<T>) {
        *self.items.write().unwrap_or_else(PoisonError::into_inner) = items;
    }

    fn update<F: FnOnce(&mut Vec<T>)>(&self, f: F) {
        f(&mut self.items.write().unwrap_or_else(PoisonError::into_inner));
    }
}

impl<T: Clone + Send + Sync> CollectionListener<T> for LocalCollection<T> {
    fn collection_replaced(&self, items: Vec<T>) {
        self.replace(items);
    }
}

/// Turns a raw document back into a record, restoring the id from the document key.
pub fn decode_document<T: DeserializeOwned>(doc: Document) -> Result<T, serde_json::Error> {
    let mut body = doc.body;
    if let Value::Object(map) = &mut body {
        map.insert("id".to_string(), Value::String(doc.id));
    }
    serde_json::from_value(body)
}

/// Adapts a typed [`CollectionListener`] to the store's raw document feed.
pub struct DecodingListener<T> {
    path: CollectionPath,
    target: Arc<dyn CollectionListener<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DecodingListener<T> {
    pub fn new(path: CollectionPath, target: Arc<dyn CollectionListener<T>>) -> Self {
        Self {
            path,
            target,
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> DocumentListener for DecodingListener<T> {
    fn snapshot(&self, docs: Vec<Document>) {
        let mut items = Vec::with_capacity(docs.len());
        for doc in docs {
            let id = doc.id.clone();
            match decode_document::<T>(doc) {
                Ok(item) => items.push(item),
                Err(err) => warn!(path = %self.path, %id, error = %err, "dropping malformed document"),
            }
        }
        debug!(path = %self.path, count = items.len(), "collection replaced");
        self.target.collection_replaced(items);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Demo,
    Authenticated(UserProfile),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("signed in with a real account; sign out before switching to demo mode")]
    SignOutRequired,
    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote write failed: {0}")]
    Write(#[from] StoreError),
    #[error("could not encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

pub struct Session {
    backend: Option<Backend>,
    mode: Mode,
    accounts: LocalCollection<Account>,
    transactions: LocalCollection<Transaction>,
    subscriptions: Vec<Subscription>,
}

fn demo_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(9);
    id
}

impl Session {
    /// Picks the starting mode: authenticated when the backend reports a
    /// signed-in user, demo otherwise.
    pub fn start(backend: Option<Backend>) -> Self {
        let mut session = Self {
            backend,
            mode: Mode::Demo,
            accounts: LocalCollection::default(),
            transactions: LocalCollection::default(),
            subscriptions: Vec::new(),
        };
        session.load_fixtures();
        let current = session
            .backend
            .as_ref()
            .and_then(|b| b.identity.current_user());
        if let Some(user) = current {
            session.enter_authenticated(user);
        }
        session
    }

    pub fn demo() -> Self {
        Self::start(None)
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_demo(&self) -> bool {
        matches!(self.mode, Mode::Demo)
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match &self.mode {
            Mode::Authenticated(user) => Some(user),
            Mode::Demo => None,
        }
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.snapshot()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions.snapshot()
    }

    pub fn categories(&self) -> &'static [Category] {
        fixtures::categories()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    /// Switches to demo mode and reloads the fixtures. Rejected while a real
    /// account is signed in.
    pub fn enter_demo(&mut self) -> Result<(), SessionError> {
        if let Mode::Authenticated(user) = &self.mode {
            warn!(uid = %user.uid, "demo mode requested while signed in");
            return Err(SessionError::SignOutRequired);
        }
        self.load_fixtures();
        Ok(())
    }

    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<UserProfile, SessionError> {
        let backend = self.backend.as_ref().ok_or(AuthError::NotConfigured)?;
        let user = backend.identity.sign_in(email, password)?;
        self.enter_authenticated(user.clone());
        Ok(user)
    }

    pub fn register(
        &mut self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<UserProfile, SessionError> {
        let backend = self.backend.as_ref().ok_or(AuthError::NotConfigured)?;
        let user = backend.identity.register(email, password, display_name)?;
        self.enter_authenticated(user.clone());
        Ok(user)
    }

    pub fn sign_out(&mut self) -> Result<(), SessionError> {
        if let Some(backend) = &self.backend {
            backend.identity.sign_out()?;
        }
        self.teardown();
        self.load_fixtures();
        Ok(())
    }

    /// Follows the identity provider when its signed-in user changed behind
    /// this session's back.
    pub fn refresh_identity(&mut self) {
        let Some(backend) = &self.backend else {
            return;
        };
        let current = backend.identity.current_user();
        let active = self.user().map(|u| u.uid.clone());
        match (current, active) {
            (Some(user), Some(uid)) if user.uid == uid => {}
            (Some(user), _) => {
                info!(uid = %user.uid, "identity changed");
                self.enter_authenticated(user);
            }
            (None, Some(_)) => {
                info!("identity provider reports no user");
                self.teardown();
                self.load_fixtures();
            }
            (None, None) => {}
        }
    }

    /// Picks up changes made through other writers.
    pub fn refresh(&self) -> Result<(), SyncError> {
        if let Some((backend, _)) = self.remote() {
            backend.store.refresh()?;
        }
        Ok(())
    }

    pub fn add_account(&mut self, new: NewAccount) -> Result<String, SyncError> {
        if new.name.trim().is_empty() || new.bank_name.trim().is_empty() {
            return Err(SyncError::Invalid(
                "account name and bank name are required".into(),
            ));
        }
        match self.remote() {
            None => {
                let id = demo_id();
                let account = new.with_id(id.clone());
                self.accounts.update(|v| v.push(account));
                debug!(%id, "demo account added");
                Ok(id)
            }
            Some((backend, user)) => {
                let path = CollectionPath::new(&user.uid, Collection::Accounts);
                let body = serde_json::to_value(&new)?;
                backend.store.insert(&path, body).map_err(|err| {
                    error!(%path, error = %err, "account insert failed");
                    SyncError::Write(err)
                })
            }
        }
    }

    pub fn delete_account(&mut self, id: &str) -> Result<(), SyncError> {
        match self.remote() {
            None => {
                self.accounts.update(|v| v.retain(|a| a.id != id));
                debug!(id, "demo account removed");
                Ok(())
            }
            Some((backend, user)) => {
                let path = CollectionPath::new(&user.uid, Collection::Accounts);
                backend.store.delete(&path, id).map_err(|err| {
                    error!(%path, id, error = %err, "account delete failed");
                    SyncError::Write(err)
                })
            }
        }
    }

    pub fn add_transaction(&mut self, new: NewTransaction) -> Result<String, SyncError> {
        if new.amount < Decimal::ZERO {
            return Err(SyncError::Invalid(format!(
                "amount must not be negative (got {})",
                new.amount
            )));
        }
        match self.remote() {
            None => {
                let id = demo_id();
                let tx = new.with_id(id.clone());
                self.transactions.update(|v| v.insert(0, tx));
                debug!(%id, "demo transaction added");
                Ok(id)
            }
            Some((backend, user)) => {
                let path = CollectionPath::new(&user.uid, Collection::Transactions);
                let body = serde_json::to_value(&new)?;
                backend.store.insert(&path, body).map_err(|err| {
                    error!(%path, error = %err, "transaction insert failed");
                    SyncError::Write(err)
                })
            }
        }
    }

    fn remote(&self) -> Option<(&Backend, &UserProfile)> {
        match (&self.backend, &self.mode) {
            (Some(backend), Mode::Authenticated(user)) => Some((backend, user)),
            _ => None,
        }
    }

    fn load_fixtures(&mut self) {
        self.mode = Mode::Demo;
        self.accounts.replace(fixtures::demo_accounts());
        self.transactions.replace(fixtures::demo_transactions());
    }

    /// Drops the feeds and detaches the collections they wrote into, so a
    /// callback already in flight lands in an orphaned copy.
    fn teardown(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        debug!(count = self.subscriptions.len(), "closing subscriptions");
        self.subscriptions.clear();
        self.accounts = LocalCollection::default();
        self.transactions = LocalCollection::default();
    }

    fn enter_authenticated(&mut self, user: UserProfile) {
        self.teardown();
        let accounts = LocalCollection::default();
        let transactions = LocalCollection::default();
        match self.open_feeds(&user, &accounts, &transactions) {
            Ok(subs) => {
                self.accounts = accounts;
                self.transactions = transactions;
                self.subscriptions = subs;
                info!(uid = %user.uid, "authenticated mode");
                self.mode = Mode::Authenticated(user);
            }
            Err(err) => {
                error!(uid = %user.uid, error = %err, "store unavailable, falling back to demo mode");
                self.load_fixtures();
            }
        }
    }

    fn open_feeds(
        &self,
        user: &UserProfile,
        accounts: &LocalCollection<Account>,
        transactions: &LocalCollection<Transaction>,
    ) -> Result<Vec<Subscription>, StoreError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("no backend configured".into()))?;
        let accounts_path = CollectionPath::new(&user.uid, Collection::Accounts);
        let tx_path = CollectionPath::new(&user.uid, Collection::Transactions);

        let accounts: Arc<dyn CollectionListener<Account>> = Arc::new(accounts.clone());
        let transactions: Arc<dyn CollectionListener<Transaction>> =
            Arc::new(transactions.clone());

        let accounts_sub = backend.store.subscribe(
            &accounts_path,
            Arc::new(DecodingListener::new(accounts_path.clone(), accounts)),
        )?;
        let tx_sub = backend.store.subscribe(
            &tx_path,
            Arc::new(DecodingListener::new(tx_path.clone(), transactions)),
        )?;
        Ok(vec![accounts_sub, tx_sub])
    }
}
