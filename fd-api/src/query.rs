//! Row query builder.
//!
//! Mirrors the `from(table).select(cols).eq(col, v).limit(n)` chain of the
//! hosted backend's client libraries and renders it as a REST path:
//! `/rest/v1/invoices?select=id%2Camount&user_id=eq.u1&limit=50`.

use reqwest::Url;
use fd_core::constants::REST_PATH;

/// A filtered query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    select: Vec<String>,
    filters: Vec<(String, String)>,
    order: Option<(String, bool)>,
    limit: Option<u32>,
}

impl Query {
    /// Start a query on `table`.
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            select: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Columns to return. Without a select every column comes back.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.select = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Keep rows where `column` equals `value`.
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    /// Keep rows where `column` is strictly less than `value`.
    pub fn lt(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push((column.to_string(), format!("lt.{}", value.to_string())));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Render as a path relative to the backend origin.
    pub fn to_path(&self) -> String {
        // Any absolute base works; only path and query are kept.
        let mut url = match Url::parse("http://backend.invalid") {
            Ok(url) => url,
            Err(_) => return format!("{REST_PATH}/{}", self.table),
        };
        url.set_path(&format!("{REST_PATH}/{}", self.table));
        {
            let mut pairs = url.query_pairs_mut();
            if !self.select.is_empty() {
                pairs.append_pair("select", &self.select.join(","));
            }
            for (column, filter) in &self.filters {
                pairs.append_pair(column, filter);
            }
            if let Some((column, ascending)) = &self.order {
                let dir = if *ascending { "asc" } else { "desc" };
                pairs.append_pair("order", &format!("{column}.{dir}"));
            }
            if let Some(limit) = self.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        match url.query() {
            Some(q) if !q.is_empty() => format!("{}?{q}", url.path()),
            _ => url.path().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_table() {
        assert_eq!(Query::table("clients").to_path(), "/rest/v1/clients");
    }

    #[test]
    fn test_candidate_query() {
        let path = Query::table("invoices")
            .select(&["id", "invoice_number", "amount"])
            .eq("user_id", "u1")
            .order("created_at", false)
            .limit(50)
            .to_path();
        assert_eq!(
            path,
            "/rest/v1/invoices?select=id%2Cinvoice_number%2Camount&user_id=eq.u1&order=created_at.desc&limit=50"
        );
    }

    #[test]
    fn test_values_are_encoded() {
        let path = Query::table("clients").eq("name", "A&B Co").to_path();
        assert_eq!(path, "/rest/v1/clients?name=eq.A%26B+Co");
    }

    #[test]
    fn test_lt_filter() {
        let q = Query::table("invoices").eq("status", "sent").lt("due_date", "2024-02-01");
        assert_eq!(q.table_name(), "invoices");
        assert!(q.to_path().ends_with("status=eq.sent&due_date=lt.2024-02-01"));
    }
}
