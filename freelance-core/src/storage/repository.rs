use crate::common::error::{MarketError, Result};
use crate::criteria::Criteria;
use crate::storage::database::Database;
use crate::storage::entity::Entity;
use crate::storage::page::{Page, Pageable};
use crate::storage::schema::LinkTable;
use crate::storage::sql;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::marker::PhantomData;
use tracing::debug;

/// Generic SQLite repository for one entity type.
pub struct SqlRepository<E> {
    db: Database,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for SqlRepository<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> SqlRepository<E> {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    pub async fn find_by_criteria(&self, criteria: &Criteria, page: Option<&Pageable>) -> Result<Vec<E>> {
        let (sql, params) = sql::select_query(&E::TABLE, criteria, page);
        self.db.with_conn(|conn| query_entities(conn, &sql, &params))
    }

    pub async fn find_page(&self, criteria: &Criteria, page: &Pageable) -> Result<Page<E>> {
        let content = self.find_by_criteria(criteria, Some(page)).await?;
        let total = self.count_by_criteria(criteria).await?;
        Ok(Page {
            content,
            total,
            page: page.page,
            size: page.size,
        })
    }

    pub async fn count_by_criteria(&self, criteria: &Criteria) -> Result<u64> {
        let (sql, params) = sql::count_query(&E::TABLE, criteria);
        let count: i64 = self.db.with_conn(|conn| {
            Ok(conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?)
        })?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<E>> {
        let criteria = Criteria::new().column_equals("id", id);
        Ok(self.find_by_criteria(&criteria, None).await?.into_iter().next())
    }

    pub async fn exists_by_id(&self, id: i64) -> Result<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?1", E::TABLE.name);
        self.db.with_conn(|conn| {
            Ok(conn
                .query_row(&sql, params![id], |_| Ok(()))
                .optional()?
                .is_some())
        })
    }

    /// Rows matching a raw condition over alias `e`, e.g. `e.owner_id = ?`.
    pub async fn find_where(&self, condition: &str, params: Vec<Value>, order_by: Option<&str>) -> Result<Vec<E>> {
        let sql = sql::select_where(&E::TABLE, condition, order_by);
        self.db.with_conn(|conn| query_entities(conn, &sql, &params))
    }

    /// Inserts the row and its link rows; returns the entity with its new id.
    pub async fn insert(&self, mut entity: E) -> Result<E> {
        let sql = sql::insert_statement(&E::TABLE);
        let id = self.db.transaction(|tx| {
            tx.execute(&sql, params_from_iter(row_values(&entity)))?;
            let id = tx.last_insert_rowid();
            write_links(tx, &entity, id)?;
            Ok(id)
        })?;
        debug!(entity = E::TABLE.entity, id, "inserted");
        entity.set_id(Some(id));
        Ok(entity)
    }

    pub async fn update(&self, entity: E) -> Result<E> {
        self.db.transaction(|tx| Self::update_in(tx, &entity))?;
        Ok(entity)
    }

    /// Rewrites the row and its links on a connection the caller already
    /// holds, so several updates can share one transaction.
    pub fn update_in(conn: &Connection, entity: &E) -> Result<()> {
        let id = entity.id().ok_or_else(|| {
            MarketError::bad_request(E::TABLE.entity, "idnull", "Cannot update an entity without id")
        })?;
        let mut values = row_values(entity);
        values.push(Value::Integer(id));
        let changed = conn.execute(&sql::update_statement(&E::TABLE), params_from_iter(values))?;
        if changed == 0 {
            return Err(MarketError::not_found(E::TABLE.entity, "idnotfound", "Entity not found"));
        }
        write_links(conn, entity, id)?;
        debug!(entity = E::TABLE.entity, id, "updated");
        Ok(())
    }

    /// Deletes link rows, then the row. `false` when nothing was deleted.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", E::TABLE.name);
        let deleted = self.db.transaction(|tx| {
            for link in E::TABLE.links {
                tx.execute(
                    &format!("DELETE FROM {} WHERE {} = ?1", link.table, link.owner_column),
                    params![id],
                )?;
            }
            Ok(tx.execute(&sql, params![id])?)
        })?;
        debug!(entity = E::TABLE.entity, id, deleted, "delete");
        Ok(deleted > 0)
    }
}

fn row_values<E: Entity>(entity: &E) -> Vec<Value> {
    let mut values = entity.values();
    values.extend(entity.audit().values());
    values
}

fn query_entities<E: Entity>(conn: &Connection, sql: &str, params: &[Value]) -> Result<Vec<E>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut entities = Vec::new();
    while let Some(row) = rows.next()? {
        entities.push(E::from_row(row)?);
    }

    for link in E::TABLE.links {
        for entity in entities.iter_mut() {
            if let Some(id) = entity.id() {
                let ids = link_ids(conn, link, id)?;
                entity.set_link_ids(link, ids);
            }
        }
    }
    Ok(entities)
}

fn link_ids(conn: &Connection, link: &LinkTable, owner_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {target} FROM {table} WHERE {owner} = ?1 ORDER BY {target}",
        target = link.target_column,
        table = link.table,
        owner = link.owner_column,
    ))?;
    let ids = stmt
        .query_map(params![owner_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}

fn write_links<E: Entity>(conn: &Connection, entity: &E, id: i64) -> Result<()> {
    for link in E::TABLE.links {
        conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", link.table, link.owner_column),
            params![id],
        )?;
        let insert = format!(
            "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
            link.table, link.owner_column, link.target_column
        );
        for target in entity.link_ids(link) {
            conn.execute(&insert, params![id, target])?;
        }
    }
    Ok(())
}
