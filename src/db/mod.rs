//! SQLite connection setup for the device registry.

use std::env;

use rusqlite::Connection;

/// Resolve the database path: `DATABASE_URL` wins over the CLI flag, and a
/// `sqlite://` scheme prefix is tolerated on either.
pub fn resolve_database_path(cli_path: &str) -> String {
    let raw = env::var("DATABASE_URL").unwrap_or_else(|_| cli_path.to_string());
    strip_sqlite_scheme(&raw).to_string()
}

fn strip_sqlite_scheme(raw: &str) -> &str {
    raw.strip_prefix("sqlite://").unwrap_or(raw)
}

pub fn open_connection(path: &str) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path).map_err(|e| {
        log::error!("Failed to open database at '{}': {}", path, e);
        e
    })?;

    // Registry writes are single-row and serialized behind a mutex, so a
    // short busy timeout is enough.
    let _ = conn.execute("PRAGMA busy_timeout = 5000;", []);

    // Try to enable WAL mode (only needs to succeed once per database)
    let _ = conn.execute("PRAGMA journal_mode = WAL;", []);

    // NORMAL sync is safe with WAL mode
    let _ = conn.execute("PRAGMA synchronous = NORMAL;", []);

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_sqlite_scheme() {
        assert_eq!(strip_sqlite_scheme("sqlite://devices.db"), "devices.db");
        assert_eq!(strip_sqlite_scheme("devices.db"), "devices.db");
        assert_eq!(
            strip_sqlite_scheme("/var/lib/wol/devices.db"),
            "/var/lib/wol/devices.db"
        );
    }
}
