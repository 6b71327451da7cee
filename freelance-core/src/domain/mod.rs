//! Marketplace entities.
//!
//! Every entity carries a surrogate `id`, the audit columns in [`Audit`] and
//! its own scalar attributes. Foreign keys are plain `<relation>Id` fields and
//! many-to-many relations are `<relation>Ids` arrays backed by a link table.

use crate::common::error::Result;
use crate::storage::codec::{self, SqlColumn};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Declares an entity struct and its [`crate::storage::Entity`] implementation.
///
/// Each field lists `(json name, column name, filter kind)`; links list the
/// JSON array name and the [`crate::storage::schema::LinkTable`] backing it.
macro_rules! entity {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            table: $table:literal,
            entity: $entity:literal,
            resource: $resource:literal,
            fields: {
                $( $(#[$fmeta:meta])* $field:ident : $ty:ty => ($json:literal, $col:literal, $kind:expr) ),* $(,)?
            },
            links: {
                $( $lfield:ident : $ljson:literal => $link:expr ),* $(,)?
            } $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize, ::validator::Validate)]
        pub struct $name {
            #[serde(default)]
            pub id: Option<i64>,
            $(
                $(#[$fmeta])*
                #[serde(rename = $json)]
                pub $field: $ty,
            )*
            $(
                #[serde(rename = $ljson, default)]
                pub $lfield: Vec<i64>,
            )*
            #[serde(flatten)]
            #[validate(nested)]
            pub audit: $crate::domain::Audit,
        }

        impl $crate::storage::Entity for $name {
            const TABLE: $crate::storage::schema::Table = $crate::storage::schema::Table {
                name: $table,
                entity: $entity,
                resource: $resource,
                columns: &[
                    $( $crate::storage::schema::ColumnDef { field: $json, name: $col, kind: $kind }, )*
                ],
                links: &[ $( $link, )* ],
            };

            fn id(&self) -> Option<i64> {
                self.id
            }

            fn set_id(&mut self, id: Option<i64>) {
                self.id = id;
            }

            fn audit(&self) -> &$crate::domain::Audit {
                &self.audit
            }

            fn audit_mut(&mut self) -> &mut $crate::domain::Audit {
                &mut self.audit
            }

            fn from_row(row: &::rusqlite::Row<'_>) -> $crate::Result<Self> {
                Ok(Self {
                    id: Some($crate::storage::codec::read(row, "id")?),
                    $( $field: $crate::storage::codec::read(row, $col)?, )*
                    $( $lfield: Vec::new(), )*
                    audit: $crate::domain::Audit::from_row(row)?,
                })
            }

            fn values(&self) -> Vec<::rusqlite::types::Value> {
                #[allow(unused_imports)]
                use $crate::storage::codec::SqlColumn;
                vec![ $( self.$field.encode(), )* ]
            }

            fn link_ids(&self, link: &$crate::storage::schema::LinkTable) -> &[i64] {
                $( if link.table == $link.table { return &self.$lfield; } )*
                let _ = link;
                &[]
            }

            fn set_link_ids(&mut self, link: &$crate::storage::schema::LinkTable, ids: Vec<i64>) {
                $( if link.table == $link.table { self.$lfield = ids; return; } )*
                let _ = (link, ids);
            }
        }
    };
}

mod enums;
mod file;
mod messaging;
mod offer;
mod order;
mod profile;
mod taxonomy;

pub use enums::*;
pub use file::FileObject;
pub use messaging::{Conversation, Message};
pub use offer::{FavoriteOffer, Offer, OfferMedia, OfferPackage, OfferReview, OFFER_TAG_LINK};
pub use order::{Delivery, Dispute, Order, Requirement};
pub use profile::{Profile, ProfileReview, VerificationRequest, PROFILE_SKILL_LINK};
pub use taxonomy::{Category, Country, OfferType, Skill, Subcategory, Tag};

/// Server-managed auditing columns shared by every entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Audit {
    #[validate(length(max = 50))]
    pub created_by: Option<String>,
    pub created_date: Option<DateTime<Utc>>,
    #[validate(length(max = 50))]
    pub last_modified_by: Option<String>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl Audit {
    pub fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            created_by: codec::read(row, "created_by")?,
            created_date: codec::read(row, "created_date")?,
            last_modified_by: codec::read(row, "last_modified_by")?,
            last_modified_date: codec::read(row, "last_modified_date")?,
        })
    }

    /// Values in `AUDIT_COLUMNS` order.
    pub fn values(&self) -> Vec<Value> {
        vec![
            self.created_by.encode(),
            self.created_date.encode(),
            self.last_modified_by.encode(),
            self.last_modified_date.encode(),
        ]
    }

    pub fn created(by: &str, at: DateTime<Utc>) -> Self {
        Self {
            created_by: Some(by.to_string()),
            created_date: Some(at),
            last_modified_by: Some(by.to_string()),
            last_modified_date: Some(at),
        }
    }

    pub fn touch(&mut self, by: &str, at: DateTime<Utc>) {
        self.last_modified_by = Some(by.to_string());
        self.last_modified_date = Some(at);
    }
}
