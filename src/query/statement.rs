//! Statement classification from SQL text.

use crate::transport::StatementType;

/// Kind of SQL statement, detected from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT, WITH or VALUES query
    Select,
    /// INSERT statement
    Insert,
    /// UPDATE statement
    Update,
    /// DELETE statement
    Delete,
    /// MERGE statement
    Merge,
    /// UNLOAD statement
    Unload,
    /// DDL statement (CREATE, ALTER, DROP, MSCK)
    Ddl,
    /// Administrative statement (SHOW, DESCRIBE, EXPLAIN)
    Utility,
    /// Unknown or other statement type
    Other,
}

impl StatementKind {
    /// Detect statement kind from SQL text.
    ///
    /// Leading whitespace, opening parentheses and `--` line comments are skipped.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = skip_prelude(sql).to_uppercase();
        let keyword = trimmed
            .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .next()
            .unwrap_or("");

        match keyword {
            "SELECT" | "WITH" | "VALUES" | "TABLE" => Self::Select,
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            "MERGE" => Self::Merge,
            "UNLOAD" => Self::Unload,
            "CREATE" | "ALTER" | "DROP" | "MSCK" | "TRUNCATE" => Self::Ddl,
            "SHOW" | "DESCRIBE" | "DESC" | "EXPLAIN" => Self::Utility,
            _ => Self::Other,
        }
    }

    /// Check if this statement kind returns a result set with a header echo.
    pub fn returns_result_set(&self) -> bool {
        matches!(self, Self::Select)
    }

    /// Whether the statement only reads data.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Select | Self::Utility)
    }

    /// The statement type the service assigns to this kind.
    pub fn statement_type(&self) -> StatementType {
        match self {
            Self::Select
            | Self::Insert
            | Self::Update
            | Self::Delete
            | Self::Merge
            | Self::Unload => StatementType::Dml,
            Self::Ddl => StatementType::Ddl,
            Self::Utility => StatementType::Utility,
            Self::Other => StatementType::Unknown,
        }
    }
}

fn skip_prelude(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        match rest.strip_prefix("--") {
            Some(comment) => rest = comment.split_once('\n').map_or("", |(_, tail)| tail),
            None => return rest,
        }
    }
}
