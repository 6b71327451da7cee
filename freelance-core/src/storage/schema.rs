//! Static table descriptors shared by the SQL builder, the criteria parser and
//! the repository.

/// How a column is filtered and how query-string values are parsed for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Long,
    Integer,
    Double,
    Boolean,
    Text,
    Instant,
    Enum(&'static [&'static str]),
}

impl FieldKind {
    /// Range operators (`greaterThan` and friends) apply to these kinds only.
    pub fn supports_range(&self) -> bool {
        matches!(
            self,
            FieldKind::Long | FieldKind::Integer | FieldKind::Double | FieldKind::Instant
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Long => "long",
            FieldKind::Integer => "integer",
            FieldKind::Double => "double",
            FieldKind::Boolean => "boolean",
            FieldKind::Text => "string",
            FieldKind::Instant => "instant",
            FieldKind::Enum(_) => "enum",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// JSON / query-string name.
    pub field: &'static str,
    /// SQL column name.
    pub name: &'static str,
    pub kind: FieldKind,
}

/// A many-to-many join table owned by an entity (e.g. `rel_offer__tag`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTable {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub target_column: &'static str,
    /// Criteria field filtering on the target id, e.g. `tagId`.
    pub filter_field: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    /// Entity name used in alert headers and error bodies.
    pub entity: &'static str,
    /// REST resource path segment.
    pub resource: &'static str,
    pub columns: &'static [ColumnDef],
    pub links: &'static [LinkTable],
}

pub const ID_COLUMN: ColumnDef = ColumnDef {
    field: "id",
    name: "id",
    kind: FieldKind::Long,
};

pub const AUDIT_COLUMNS: &[ColumnDef] = &[
    ColumnDef {
        field: "createdBy",
        name: "created_by",
        kind: FieldKind::Text,
    },
    ColumnDef {
        field: "createdDate",
        name: "created_date",
        kind: FieldKind::Instant,
    },
    ColumnDef {
        field: "lastModifiedBy",
        name: "last_modified_by",
        kind: FieldKind::Text,
    },
    ColumnDef {
        field: "lastModifiedDate",
        name: "last_modified_date",
        kind: FieldKind::Instant,
    },
];

impl Table {
    /// Looks up a filterable/sortable column by its JSON field name.
    pub fn column(&self, field: &str) -> Option<ColumnDef> {
        self.select_columns().find(|c| c.field == field)
    }

    pub fn link(&self, field: &str) -> Option<LinkTable> {
        self.links.iter().copied().find(|l| l.filter_field == field)
    }

    /// Columns written on insert/update, in `Entity::values` order followed by audit columns.
    pub fn write_columns(&self) -> impl Iterator<Item = ColumnDef> + '_ {
        self.columns.iter().copied().chain(AUDIT_COLUMNS.iter().copied())
    }

    pub fn select_columns(&self) -> impl Iterator<Item = ColumnDef> + '_ {
        std::iter::once(ID_COLUMN).chain(self.write_columns())
    }
}
