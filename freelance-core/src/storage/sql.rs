//! SELECT / INSERT / UPDATE text for a [`Table`].

use crate::criteria::Criteria;
use crate::storage::page::Pageable;
use crate::storage::schema::Table;
use rusqlite::types::Value;

pub const ALIAS: &str = "e";

/// `e.col AS col, …` so row mappers can read columns by name.
pub fn select_list(table: &Table, alias: &str) -> String {
    table
        .select_columns()
        .map(|c| format!("{alias}.{0} AS {0}", c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn select_query(table: &Table, criteria: &Criteria, page: Option<&Pageable>) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let mut sql = format!("SELECT {} FROM {} {ALIAS}", select_list(table, ALIAS), table.name);
    if let Some(clause) = criteria.render(ALIAS, &mut params) {
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
    match page {
        Some(page) => {
            sql.push_str(&format!(" ORDER BY {} LIMIT ? OFFSET ?", page.order_by(ALIAS)));
            params.push(Value::Integer(clamp(page.size)));
            params.push(Value::Integer(clamp(page.offset())));
        }
        None => sql.push_str(&format!(" ORDER BY {ALIAS}.id ASC")),
    }
    (sql, params)
}

/// SELECT with a caller-supplied condition over alias `e`.
pub fn select_where(table: &Table, condition: &str, order_by: Option<&str>) -> String {
    format!(
        "SELECT {} FROM {} {ALIAS} WHERE {condition} ORDER BY {}",
        select_list(table, ALIAS),
        table.name,
        order_by.unwrap_or("e.id ASC"),
    )
}

pub fn count_query(table: &Table, criteria: &Criteria) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let mut sql = format!("SELECT COUNT(*) FROM {} {ALIAS}", table.name);
    if let Some(clause) = criteria.render(ALIAS, &mut params) {
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
    (sql, params)
}

pub fn insert_statement(table: &Table) -> String {
    let columns: Vec<&str> = table.write_columns().map(|c| c.name).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        table.name,
        columns.join(", ")
    )
}

/// UPDATE of every writable column; the id is the last parameter.
pub fn update_statement(table: &Table) -> String {
    let assignments: Vec<String> = table.write_columns().map(|c| format!("{} = ?", c.name)).collect();
    format!("UPDATE {} SET {} WHERE id = ?", table.name, assignments.join(", "))
}

fn clamp(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tag;
    use crate::storage::Entity;

    #[test]
    fn select_aliases_every_column() {
        assert_eq!(
            select_list(&Tag::TABLE, "e"),
            "e.id AS id, e.name AS name, e.created_by AS created_by, e.created_date AS created_date, \
             e.last_modified_by AS last_modified_by, e.last_modified_date AS last_modified_date"
        );
    }

    #[test]
    fn paged_select_binds_limit_and_offset_last() {
        let criteria = Criteria::new().column_equals("name", "rust".to_string());
        let page = Pageable::new(2, 10);
        let (sql, params) = select_query(&Tag::TABLE, &criteria, Some(&page));
        assert!(sql.ends_with("FROM tag e WHERE e.name = ? ORDER BY e.id ASC LIMIT ? OFFSET ?"));
        assert_eq!(
            params,
            vec![Value::Text("rust".into()), Value::Integer(10), Value::Integer(20)]
        );
    }

    #[test]
    fn write_statements_cover_audit_columns() {
        assert_eq!(
            insert_statement(&Tag::TABLE),
            "INSERT INTO tag (name, created_by, created_date, last_modified_by, last_modified_date) \
             VALUES (?, ?, ?, ?, ?)"
        );
        assert_eq!(
            update_statement(&Tag::TABLE),
            "UPDATE tag SET name = ?, created_by = ?, created_date = ?, last_modified_by = ?, \
             last_modified_date = ? WHERE id = ?"
        );
        let (count, params) = count_query(&Tag::TABLE, &Criteria::new());
        assert_eq!(count, "SELECT COUNT(*) FROM tag e");
        assert!(params.is_empty());
    }
}
