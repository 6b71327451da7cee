//! Use cases on top of the repositories.
//!
//! [`Market`] owns the shared resources; each workflow service borrows it for
//! the duration of a call.

pub mod broadcast;
pub mod crud;
pub mod favorite;
pub mod files;
pub mod messaging;
pub mod offer;
pub mod order;
pub mod profile;
pub mod review;
pub mod verification;

use crate::common::error::{MarketError, Result};
use crate::criteria::{Criteria, Filter, Target};
use crate::storage::{Database, Entity, ObjectStore};
use rusqlite::types::Value;
use std::sync::Arc;

pub use broadcast::ConversationBroadcaster;
pub use crud::CrudService;
pub use favorite::{FavoriteOfferView, FavoriteService};
pub use files::{FileService, Upload};
pub use messaging::{ChatMessageEvent, ConversationSummary, MessagingService};
pub use offer::{MediaLink, OfferCreate, OfferService, OfferShort, OfferUpdate};
pub use order::OrderService;
pub use profile::{ProfileCreation, ProfileEdit, ProfileService};
pub use review::{ReviewCreate, ReviewService};
pub use verification::VerificationService;

pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
pub const SYSTEM_ACCOUNT: &str = "system";

/// The caller of an operation, as asserted by the upstream gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    login: Option<String>,
    roles: Vec<String>,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(login: Option<String>, roles: Vec<String>) -> Self {
        Self {
            login: login.filter(|l| !l.trim().is_empty()),
            roles,
        }
    }

    pub fn user(login: impl Into<String>) -> Self {
        Self::new(Some(login.into()), vec!["ROLE_USER".to_string()])
    }

    pub fn admin(login: impl Into<String>) -> Self {
        Self::new(
            Some(login.into()),
            vec!["ROLE_USER".to_string(), ROLE_ADMIN.to_string()],
        )
    }

    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    pub fn require_login(&self) -> Result<&str> {
        self.login()
            .ok_or_else(|| MarketError::Unauthorized("no authenticated user".to_string()))
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ROLE_ADMIN)
    }

    pub fn require_admin(&self) -> Result<()> {
        self.require_login()?;
        if self.is_admin() {
            Ok(())
        } else {
            Err(MarketError::forbidden("user", "adminRequired", "Administrator role required"))
        }
    }

    /// Name written to audit columns.
    pub fn audit_name(&self) -> &str {
        self.login().unwrap_or(SYSTEM_ACCOUNT)
    }
}

/// Shared handles needed by every service.
#[derive(Clone)]
pub struct Market {
    db: Database,
    store: Arc<dyn ObjectStore>,
    broadcaster: Arc<ConversationBroadcaster>,
    bucket: String,
}

impl Market {
    pub fn new(db: Database, store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            db,
            store,
            broadcaster: Arc::new(ConversationBroadcaster::default()),
            bucket: bucket.into(),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn broadcaster(&self) -> &Arc<ConversationBroadcaster> {
        &self.broadcaster
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn crud<E: Entity>(&self) -> CrudService<E> {
        CrudService::new(self.db.repo())
    }

    pub fn files(&self) -> FileService<'_> {
        FileService::new(self)
    }

    pub fn profiles(&self) -> ProfileService<'_> {
        ProfileService::new(self)
    }

    pub fn verification(&self) -> VerificationService<'_> {
        VerificationService::new(self)
    }

    pub fn offers(&self) -> OfferService<'_> {
        OfferService::new(self)
    }

    pub fn reviews(&self) -> ReviewService<'_> {
        ReviewService::new(self)
    }

    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(self)
    }

    pub fn favorites(&self) -> FavoriteService<'_> {
        FavoriteService::new(self)
    }

    pub fn messaging(&self) -> MessagingService<'_> {
        MessagingService::new(self)
    }

    /// The subset of `ids` that exist in `E`'s table, ascending.
    pub(crate) async fn existing_ids<E: Entity>(&self, ids: &[i64]) -> Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let criteria = Criteria::new().and(
            Target::Column("id"),
            Filter::In(ids.iter().copied().map(Value::Integer).collect()),
        );
        let found = self.db.repo::<E>().find_by_criteria(&criteria, None).await?;
        Ok(found.iter().filter_map(|e| e.id()).collect())
    }
}
