//! DuckDB helpers for reading CSV exports as text tables.

use duckdb::Connection;
use std::path::Path;

use crate::error::{DataError, Result};

/// Encoding used when none is configured; exports come from a Windows tool.
pub const DEFAULT_ENCODING: &str = "latin-1";

/// Single-quoted SQL string literal.
pub(crate) fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Double-quoted SQL identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `read_csv(...)` table expression with every column typed as VARCHAR.
pub(crate) fn read_csv_all_varchar(path: &Path, encoding: &str) -> String {
    format!(
        "read_csv({}, header = true, all_varchar = true, encoding = {})",
        sql_literal(&path.to_string_lossy()),
        sql_literal(encoding)
    )
}

/// Fail with `NotFound` unless `path` is a regular file.
pub(crate) fn require_file(path: &Path, artifact: &'static str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DataError::NotFound {
            artifact,
            path: path.to_path_buf(),
        })
    }
}

pub(crate) fn open() -> Result<Connection> {
    Ok(Connection::open_in_memory()?)
}

/// Column names of a table expression, in order.
pub(crate) fn column_names(conn: &Connection, relation: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("DESCRIBE SELECT * FROM {relation}"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting() {
        assert_eq!(sql_literal("O'Brien.csv"), "'O''Brien.csv'");
        assert_eq!(quote_ident("PU City"), "\"PU City\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_read_csv_expression() {
        let expr = read_csv_all_varchar(Path::new("data/data.csv"), DEFAULT_ENCODING);
        assert_eq!(
            expr,
            "read_csv('data/data.csv', header = true, all_varchar = true, encoding = 'latin-1')"
        );
    }
}
