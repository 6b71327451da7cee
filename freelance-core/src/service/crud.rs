use super::Actor;
use crate::common::error::{MarketError, Result};
use crate::criteria::Criteria;
use crate::domain::Audit;
use crate::storage::schema::AUDIT_COLUMNS;
use crate::storage::{Entity, Page, Pageable, SqlRepository};
use chrono::Utc;
use serde_json::Value as Json;
use tracing::debug;

/// Standard create / update / patch / read / delete for any entity.
pub struct CrudService<E> {
    repo: SqlRepository<E>,
}

impl<E: Entity> CrudService<E> {
    pub fn new(repo: SqlRepository<E>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &SqlRepository<E> {
        &self.repo
    }

    fn name() -> &'static str {
        E::TABLE.entity
    }

    pub async fn create(&self, actor: &Actor, mut entity: E) -> Result<E> {
        debug!(entity = Self::name(), "request to save");
        if entity.id().is_some() {
            return Err(MarketError::bad_request(
                Self::name(),
                "idexists",
                format!("A new {} cannot already have an ID", Self::name()),
            ));
        }
        *entity.audit_mut() = Audit::created(actor.audit_name(), Utc::now());
        entity.validate()?;
        self.repo.insert(entity).await
    }

    pub async fn update(&self, actor: &Actor, id: i64, mut entity: E) -> Result<E> {
        debug!(entity = Self::name(), id, "request to update");
        self.check_ids(id, entity.id())?;
        let existing = self.existing(id).await?;
        *entity.audit_mut() = existing.audit().clone();
        entity.audit_mut().touch(actor.audit_name(), Utc::now());
        entity.validate()?;
        self.repo.update(entity).await
    }

    /// Applies the non-null members of a JSON object on top of the stored
    /// entity. Identity and audit members are ignored.
    pub async fn partial_update(&self, actor: &Actor, id: i64, patch: Json) -> Result<E> {
        debug!(entity = Self::name(), id, "request to partially update");
        let Json::Object(members) = patch else {
            return Err(MarketError::bad_request(
                Self::name(),
                "invalidPatch",
                "Patch body must be a JSON object",
            ));
        };
        self.check_ids(id, members.get("id").and_then(Json::as_i64))?;
        let existing = self.existing(id).await?;

        let mut merged = serde_json::to_value(&existing)?;
        if let Json::Object(target) = &mut merged {
            for (key, value) in members {
                let protected = key == "id" || AUDIT_COLUMNS.iter().any(|c| c.field == key);
                if !protected && !value.is_null() {
                    target.insert(key, value);
                }
            }
        }

        let mut entity: E = serde_json::from_value(merged).map_err(|e| {
            MarketError::bad_request(Self::name(), "invalidPatch", format!("Invalid patch: {e}"))
        })?;
        *entity.audit_mut() = existing.audit().clone();
        entity.audit_mut().touch(actor.audit_name(), Utc::now());
        entity.validate()?;
        self.repo.update(entity).await
    }

    pub async fn find_page(&self, criteria: &Criteria, page: &Pageable) -> Result<Page<E>> {
        debug!(entity = Self::name(), ?criteria, "request to list by criteria");
        self.repo.find_page(criteria, page).await
    }

    pub async fn count(&self, criteria: &Criteria) -> Result<u64> {
        self.repo.count_by_criteria(criteria).await
    }

    pub async fn find_one(&self, id: i64) -> Result<E> {
        self.repo.find_by_id(id).await?.ok_or_else(|| {
            MarketError::not_found(Self::name(), "idnotfound", format!("{} {id} not found", Self::name()))
        })
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        debug!(entity = Self::name(), id, "request to delete");
        if self.repo.delete_by_id(id).await? {
            Ok(())
        } else {
            Err(MarketError::not_found(
                Self::name(),
                "idnotfound",
                format!("{} {id} not found", Self::name()),
            ))
        }
    }

    fn check_ids(&self, path_id: i64, body_id: Option<i64>) -> Result<()> {
        match body_id {
            None => Err(MarketError::bad_request(Self::name(), "idnull", "Invalid id")),
            Some(body_id) if body_id != path_id => {
                Err(MarketError::bad_request(Self::name(), "idinvalid", "Invalid ID"))
            }
            Some(_) => Ok(()),
        }
    }

    async fn existing(&self, id: i64) -> Result<E> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| MarketError::bad_request(Self::name(), "idnotfound", "Entity not found"))
    }
}
