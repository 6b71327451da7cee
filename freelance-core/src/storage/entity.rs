use crate::common::error::Result;
use crate::domain::Audit;
use crate::storage::schema::{LinkTable, Table};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::Validate;

/// A persisted domain type: one row of `TABLE` plus its link-table ids.
///
/// Implementations are generated by the `entity!` macro in [`crate::domain`].
pub trait Entity: Serialize + DeserializeOwned + Validate + Clone + Send + Sync + 'static {
    const TABLE: Table;

    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: Option<i64>);

    fn audit(&self) -> &Audit;
    fn audit_mut(&mut self) -> &mut Audit;

    /// Maps a row selected with [`crate::storage::sql::select_list`]. Link ids are left empty.
    fn from_row(row: &Row<'_>) -> Result<Self>;

    /// Column values in `TABLE.columns` order.
    fn values(&self) -> Vec<Value>;

    fn link_ids(&self, link: &LinkTable) -> &[i64];
    fn set_link_ids(&mut self, link: &LinkTable, ids: Vec<i64>);
}
