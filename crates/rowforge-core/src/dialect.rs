//! SQL dialect policy: identifier quoting and identity-read expressions.
//!
//! The engine never sniffs the database flavour from a driver object; the
//! caller's environment resolves it once and passes an explicit
//! [`DatabaseKind`] into the engine configuration.

/// The database flavour a batch is executed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseKind {
    /// Microsoft SQL Server (the default kind)
    #[default]
    SqlServer,
    /// SQL Server Compact Edition
    SqlCe,
    /// MySQL / MariaDB
    MySql,
    /// Oracle Database
    Oracle,
    /// PostgreSQL
    PostgreSql,
    /// SQLite
    SQLite,
    /// Firebird
    Firebird,
}

impl DatabaseKind {
    /// Quote a SQL identifier using this kind's escaping rules.
    ///
    /// Bracket escaping for the SQL Server family, backticks for MySQL,
    /// ANSI double quotes for everything else.
    pub fn quote(&self, ident: &str) -> String {
        match self {
            DatabaseKind::SqlServer | DatabaseKind::SqlCe => quote_ident_brackets(ident),
            DatabaseKind::MySql => quote_ident_mysql(ident),
            _ => quote_ident(ident),
        }
    }

    /// The expression selecting the identity value generated by the most
    /// recent insert on this connection.
    pub const fn identity_select_sql(&self) -> &'static str {
        match self {
            DatabaseKind::SqlCe => "@@IDENTITY",
            DatabaseKind::MySql => "LAST_INSERT_ID()",
            DatabaseKind::SQLite => "last_insert_rowid()",
            DatabaseKind::PostgreSql => "LASTVAL()",
            _ => "SCOPE_IDENTITY()",
        }
    }
}

/// Quote a SQL identifier using ANSI double-quoting.
///
/// Embedded double-quotes are escaped by doubling them (`"` → `""`).
/// This function is safe against SQL injection for any input string.
///
/// # Examples
///
/// ```
/// use rowforge_core::quote_ident;
///
/// assert_eq!(quote_ident("Orders"), "\"Orders\"");
/// assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
/// ```
#[inline]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a SQL identifier using MySQL backtick quoting.
///
/// Embedded backticks are escaped by doubling them.
///
/// # Examples
///
/// ```
/// use rowforge_core::quote_ident_mysql;
///
/// assert_eq!(quote_ident_mysql("Orders"), "`Orders`");
/// assert_eq!(quote_ident_mysql("odd`name"), "`odd``name`");
/// ```
#[inline]
pub fn quote_ident_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a SQL identifier using SQL Server bracket quoting.
///
/// Embedded closing brackets are escaped by doubling them (`]` → `]]`).
///
/// # Examples
///
/// ```
/// use rowforge_core::quote_ident_brackets;
///
/// assert_eq!(quote_ident_brackets("Orders"), "[Orders]");
/// assert_eq!(quote_ident_brackets("odd]name"), "[odd]]name]");
/// ```
#[inline]
pub fn quote_ident_brackets(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brackets_simple() {
        assert_eq!(quote_ident_brackets("Orders"), "[Orders]");
    }

    #[test]
    fn test_brackets_embedded_close() {
        assert_eq!(quote_ident_brackets("a]b"), "[a]]b]");
    }

    #[test]
    fn test_brackets_sql_keyword() {
        assert_eq!(quote_ident_brackets("select"), "[select]");
    }

    #[test]
    fn test_ansi_embedded_quote() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_mysql_embedded_backtick() {
        assert_eq!(quote_ident_mysql("a`b"), "`a``b`");
    }

    #[test]
    fn test_quote_injection_attempt() {
        let malicious = "t]; DROP TABLE secrets; --";
        assert_eq!(
            quote_ident_brackets(malicious),
            "[t]]; DROP TABLE secrets; --]"
        );
    }

    #[test]
    fn test_kind_selects_escaping_style() {
        assert_eq!(DatabaseKind::SqlServer.quote("t"), "[t]");
        assert_eq!(DatabaseKind::SqlCe.quote("t"), "[t]");
        assert_eq!(DatabaseKind::MySql.quote("t"), "`t`");
        assert_eq!(DatabaseKind::PostgreSql.quote("t"), "\"t\"");
        assert_eq!(DatabaseKind::Oracle.quote("t"), "\"t\"");
    }

    #[test]
    fn test_identity_select_per_kind() {
        assert_eq!(DatabaseKind::SqlServer.identity_select_sql(), "SCOPE_IDENTITY()");
        assert_eq!(DatabaseKind::SqlCe.identity_select_sql(), "@@IDENTITY");
        assert_eq!(DatabaseKind::MySql.identity_select_sql(), "LAST_INSERT_ID()");
        assert_eq!(DatabaseKind::SQLite.identity_select_sql(), "last_insert_rowid()");
        assert_eq!(DatabaseKind::PostgreSql.identity_select_sql(), "LASTVAL()");
        assert_eq!(DatabaseKind::Firebird.identity_select_sql(), "SCOPE_IDENTITY()");
    }

    #[test]
    fn test_default_kind() {
        assert_eq!(DatabaseKind::default(), DatabaseKind::SqlServer);
    }
}
