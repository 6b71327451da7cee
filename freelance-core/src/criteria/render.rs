use super::{Condition, Criteria, Filter, Target};
use rusqlite::types::Value;

impl Criteria {
    /// Renders the WHERE body for rows aliased `alias`, appending positional
    /// parameters to `params` in placeholder order. `None` when unconstrained.
    pub fn render(&self, alias: &str, params: &mut Vec<Value>) -> Option<String> {
        if self.conditions.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .conditions
            .iter()
            .map(|c| c.render(alias, params))
            .collect();
        Some(parts.join(" AND "))
    }
}

impl Condition {
    fn render(&self, alias: &str, params: &mut Vec<Value>) -> String {
        match self.target {
            Target::Column(column) => render_filter(&format!("{alias}.{column}"), &self.filter, params),
            Target::Link(link) => {
                let owner = format!("{alias}.id");
                match &self.filter {
                    Filter::Specified(true) => {
                        format!("{owner} IN (SELECT {} FROM {})", link.owner_column, link.table)
                    }
                    Filter::Specified(false) => {
                        format!("{owner} NOT IN (SELECT {} FROM {})", link.owner_column, link.table)
                    }
                    filter => {
                        let inner = render_filter(&format!("l.{}", link.target_column), filter, params);
                        format!(
                            "{owner} IN (SELECT l.{} FROM {} l WHERE {inner})",
                            link.owner_column, link.table
                        )
                    }
                }
            }
        }
    }
}

fn render_filter(expr: &str, filter: &Filter, params: &mut Vec<Value>) -> String {
    let mut bind = |op: &str, value: &Value| {
        params.push(value.clone());
        format!("{expr} {op} ?")
    };

    match filter {
        Filter::Equals(v) => bind("=", v),
        Filter::NotEquals(v) => bind("<>", v),
        Filter::GreaterThan(v) => bind(">", v),
        Filter::LessThan(v) => bind("<", v),
        Filter::GreaterThanOrEqual(v) => bind(">=", v),
        Filter::LessThanOrEqual(v) => bind("<=", v),
        Filter::Contains(s) => bind("LIKE", &like_pattern(s)) + " ESCAPE '\\'",
        Filter::DoesNotContain(s) => bind("NOT LIKE", &like_pattern(s)) + " ESCAPE '\\'",
        Filter::Specified(true) => format!("{expr} IS NOT NULL"),
        Filter::Specified(false) => format!("{expr} IS NULL"),
        Filter::In(values) if values.is_empty() => "1 = 0".to_string(),
        Filter::NotIn(values) if values.is_empty() => "1 = 1".to_string(),
        Filter::In(values) | Filter::NotIn(values) => {
            let placeholders = vec!["?"; values.len()].join(", ");
            params.extend(values.iter().cloned());
            let op = if matches!(filter, Filter::In(_)) { "IN" } else { "NOT IN" };
            format!("{expr} {op} ({placeholders})")
        }
    }
}

/// `%text%` with LIKE wildcards escaped by backslash.
fn like_pattern(text: &str) -> Value {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    Value::Text(escaped)
}
