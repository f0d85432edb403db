//! Projection and aggregate queries.
//!
//! Projections read a caller-chosen column list from one entity table and
//! return each row as a JSON object keyed by column name, the same shape the
//! hosted backend returns for `?select=a,b,c`. Table and column names cannot
//! be bound as parameters, so they are checked against the schema before
//! being spliced into SQL.
//!
//! Aggregates back the dashboard: every query is scoped to one account.

use std::collections::BTreeMap;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Row};
use serde_json::{Map, Number, Value};
use fd_core::error::{FdError, FdResult};

use crate::models::db_err;
use crate::schema::ENTITY_TABLES;

/// One projected row: column name to JSON value.
pub type RowMap = Map<String, Value>;

fn check_identifiers(table: &str, columns: &[&str]) -> FdResult<()> {
    if !ENTITY_TABLES.contains(&table) {
        return Err(FdError::Validation(format!("unknown table \"{table}\"")));
    }
    if columns.is_empty() {
        return Err(FdError::Validation("projection needs at least one column".into()));
    }
    for column in columns {
        let valid = !column.is_empty()
            && column.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(FdError::Validation(format!("invalid column name \"{column}\"")));
        }
    }
    Ok(())
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        // No entity column stores blobs.
        ValueRef::Blob(_) => Value::Null,
    }
}

fn row_to_map(row: &Row<'_>, columns: &[&str]) -> rusqlite::Result<RowMap> {
    let mut map = Map::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        map.insert((*column).to_string(), to_json(row.get_ref(idx)?));
    }
    Ok(map)
}

/// Up to `limit` rows of `table` owned by `user_id`, newest first,
/// projected onto `columns`.
pub fn select_projection(
    conn: &Connection,
    table: &str,
    columns: &[&str],
    user_id: &str,
    limit: u32,
) -> FdResult<Vec<RowMap>> {
    check_identifiers(table, columns)?;
    let sql = format!(
        "SELECT {} FROM {table} WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        columns.join(", ")
    );
    let mut stmt = conn.prepare(&sql).map_err(db_err)?;
    let rows = stmt
        .query_map(params![user_id, limit], |row| row_to_map(row, columns))
        .map_err(db_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(db_err)?;
    Ok(rows)
}

/// One row of `table` by id, owned by `user_id`, projected onto `columns`.
pub fn find_projection(
    conn: &Connection,
    table: &str,
    columns: &[&str],
    user_id: &str,
    id: &str,
) -> FdResult<Option<RowMap>> {
    check_identifiers(table, columns)?;
    let sql = format!(
        "SELECT {} FROM {table} WHERE id = ?1 AND user_id = ?2",
        columns.join(", ")
    );
    crate::models::optional(conn.query_row(&sql, [id, user_id], |row| row_to_map(row, columns)))
}

/// Full id of the account's row in `table` matching `id` exactly or by
/// unique prefix, so the shortened ids printed in listings can be typed back.
pub fn resolve_id(conn: &Connection, table: &str, user_id: &str, id: &str) -> FdResult<String> {
    check_identifiers(table, &["id"])?;
    let entity = table.trim_end_matches('s');
    if id.is_empty() {
        return Err(FdError::Validation(format!("empty {entity} id")));
    }

    // substr rather than LIKE: ids may not contain wildcards, typed input may.
    let sql = format!(
        "SELECT id FROM {table}
         WHERE user_id = ?1 AND substr(id, 1, length(?2)) = ?2
         ORDER BY id = ?2 DESC, id
         LIMIT 2"
    );
    let mut stmt = conn.prepare(&sql).map_err(db_err)?;
    let matches = stmt
        .query_map([user_id, id], |row| row.get::<_, String>(0))
        .map_err(db_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(db_err)?;

    match matches.as_slice() {
        [] => Err(FdError::not_found(entity, id)),
        [exact, ..] if exact == id => Ok(exact.clone()),
        [only] => Ok(only.clone()),
        [first, second] => Err(FdError::Validation(format!(
            "{entity} id \"{id}\" is ambiguous ({first}, {second}, ...)"
        ))),
        _ => Err(FdError::Validation(format!("{entity} id \"{id}\" is ambiguous"))),
    }
}

// ─── Dashboard aggregates ───────────────────────────────────────────────────

/// Number of rows of `table` owned by the account, optionally restricted to
/// one `status` value.
pub fn count_for_user(conn: &Connection, table: &str, user_id: &str, status: Option<&str>) -> FdResult<i64> {
    check_identifiers(table, &["id"])?;
    let result = match status {
        Some(status) => conn.query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE user_id = ?1 AND status = ?2"),
            [user_id, status],
            |row| row.get(0),
        ),
        None => conn.query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE user_id = ?1"),
            [user_id],
            |row| row.get(0),
        ),
    };
    result.map_err(db_err)
}

/// Invoice totals of the account keyed by status.
pub fn invoice_totals_by_status(conn: &Connection, user_id: &str) -> FdResult<BTreeMap<String, (i64, f64)>> {
    let mut stmt = conn
        .prepare(
            "SELECT status, COUNT(*), COALESCE(SUM(amount), 0)
             FROM invoices WHERE user_id = ?1 GROUP BY status",
        )
        .map_err(db_err)?;
    let rows = stmt
        .query_map([user_id], |row| Ok((row.get::<_, String>(0)?, (row.get(1)?, row.get(2)?))))
        .map_err(db_err)?
        .collect::<rusqlite::Result<BTreeMap<_, _>>>()
        .map_err(db_err)?;
    Ok(rows)
}

/// `(paid_at, amount)` of every paid invoice of the account.
pub fn paid_invoice_amounts(conn: &Connection, user_id: &str) -> FdResult<Vec<(Option<String>, f64)>> {
    let mut stmt = conn
        .prepare("SELECT paid_at, amount FROM invoices WHERE user_id = ?1 AND status = 'paid'")
        .map_err(db_err)?;
    let rows = stmt
        .query_map([user_id], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(db_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(db_err)?;
    Ok(rows)
}

/// `(active automations, total executions)` of the account.
pub fn automation_totals(conn: &Connection, user_id: &str) -> FdResult<(i64, i64)> {
    conn.query_row(
        "SELECT COALESCE(SUM(is_active), 0), COALESCE(SUM(execution_count), 0)
         FROM automations WHERE user_id = ?1",
        [user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .map_err(db_err)
}

/// `(done, total)` task counts of one project.
pub fn task_progress(conn: &Connection, user_id: &str, project_id: &str) -> FdResult<(i64, i64)> {
    conn.query_row(
        "SELECT COALESCE(SUM(status = 'done'), 0), COUNT(*)
         FROM tasks WHERE user_id = ?1 AND project_id = ?2",
        [user_id, project_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .map_err(db_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client::Client;
    use crate::models::invoice::Invoice;
    use crate::models::test_support::conn_with_user;
    use serde_json::json;

    const INVOICE_COLUMNS: &[&str] = &["id", "invoice_number", "amount", "due_date", "client_id"];

    #[test]
    fn test_projection_shapes_rows() {
        let conn = conn_with_user("u1");
        let mut invoice = Invoice::new("u1", "F-5", 120.0);
        invoice.due_date = Some("2024-02-01".into());
        invoice.insert(&conn).unwrap();

        let rows = select_projection(&conn, "invoices", INVOICE_COLUMNS, "u1", 50).unwrap();
        assert_eq!(rows.len(), 1);
        let row = Value::Object(rows[0].clone());
        assert_eq!(row["invoice_number"], json!("F-5"));
        assert_eq!(row["amount"], json!(120.0));
        assert_eq!(row["client_id"], Value::Null);
        assert_eq!(rows[0].len(), INVOICE_COLUMNS.len());
    }

    #[test]
    fn test_projection_limit_and_scope() {
        let conn = conn_with_user("u1");
        conn.execute("INSERT INTO users (id, email, created_at) VALUES ('u2', 'x@y.z', 't')", [])
            .unwrap();
        for i in 0..5 {
            Client::new("u1", &format!("Client {i}")).insert(&conn).unwrap();
        }
        Client::new("u2", "Other").insert(&conn).unwrap();

        assert_eq!(select_projection(&conn, "clients", &["id", "name"], "u1", 3).unwrap().len(), 3);
        assert_eq!(select_projection(&conn, "clients", &["id", "name"], "u2", 50).unwrap().len(), 1);
    }

    #[test]
    fn test_find_projection() {
        let conn = conn_with_user("u1");
        let mut client = Client::new("u1", "Acme");
        client.email = Some("a@acme.com".into());
        client.insert(&conn).unwrap();

        let row = find_projection(&conn, "clients", &["name", "email"], "u1", &client.id)
            .unwrap()
            .unwrap();
        assert_eq!(row["email"], json!("a@acme.com"));
        assert!(find_projection(&conn, "clients", &["name"], "u2", &client.id).unwrap().is_none());
    }

    #[test]
    fn test_identifiers_rejected() {
        let conn = conn_with_user("u1");
        assert!(select_projection(&conn, "users", &["id"], "u1", 1).is_err());
        assert!(select_projection(&conn, "clients", &["id; DROP TABLE clients"], "u1", 1).is_err());
        assert!(select_projection(&conn, "clients", &[], "u1", 1).is_err());
    }

    #[test]
    fn test_resolve_id_by_prefix() {
        let conn = conn_with_user("u1");
        let client = Client::new("u1", "Acme");
        client.insert(&conn).unwrap();

        let short: String = client.id.chars().take(8).collect();
        assert_eq!(resolve_id(&conn, "clients", "u1", &short).unwrap(), client.id);
        assert_eq!(resolve_id(&conn, "clients", "u1", &client.id).unwrap(), client.id);
        assert!(resolve_id(&conn, "clients", "u2", &short).unwrap_err().is_not_found());
        assert!(resolve_id(&conn, "clients", "u1", "%").unwrap_err().is_not_found());
        assert!(resolve_id(&conn, "clients", "u1", "").is_err());
    }

    #[test]
    fn test_resolve_id_ambiguous_prefix() {
        let conn = conn_with_user("u1");
        for id in ["ab12-one", "ab12-two", "ab"] {
            let mut client = Client::new("u1", id);
            client.id = id.to_string();
            client.insert(&conn).unwrap();
        }

        let err = resolve_id(&conn, "clients", "u1", "ab1").unwrap_err();
        assert!(matches!(err, FdError::Validation(_)));
        assert_eq!(resolve_id(&conn, "clients", "u1", "ab12-t").unwrap(), "ab12-two");
        // An exact id wins over longer ids sharing it as a prefix.
        assert_eq!(resolve_id(&conn, "clients", "u1", "ab").unwrap(), "ab");
    }

    #[test]
    fn test_invoice_totals() {
        let conn = conn_with_user("u1");
        let mut a = Invoice::new("u1", "F-1", 100.0);
        a.status = "paid".into();
        a.paid_at = Some("2024-03-01T00:00:00Z".into());
        a.insert(&conn).unwrap();
        let mut b = Invoice::new("u1", "F-2", 50.5);
        b.status = "paid".into();
        b.insert(&conn).unwrap();
        Invoice::new("u1", "F-3", 10.0).insert(&conn).unwrap();

        let totals = invoice_totals_by_status(&conn, "u1").unwrap();
        assert_eq!(totals["paid"], (2, 150.5));
        assert_eq!(totals["draft"], (1, 10.0));
        assert_eq!(paid_invoice_amounts(&conn, "u1").unwrap().len(), 2);
        assert_eq!(count_for_user(&conn, "invoices", "u1", Some("paid")).unwrap(), 2);
    }
}
