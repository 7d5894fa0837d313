use anyhow::Context;
use once_cell::sync::OnceCell;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Schema bootstrap. Every statement is idempotent so it runs on each start.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS sys_users (
        id TEXT PRIMARY KEY NOT NULL,
        username TEXT NOT NULL UNIQUE,
        email TEXT,
        password_hash TEXT NOT NULL,
        full_name TEXT,
        role TEXT NOT NULL DEFAULT 'VENDEDOR',
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        last_login_at TEXT,
        created_by TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sys_refresh_tokens (
        id TEXT PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL,
        token_hash TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        created_at TEXT NOT NULL,
        revoked_at TEXT,
        FOREIGN KEY (user_id) REFERENCES sys_users(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sys_settings (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a001_client (
        id TEXT PRIMARY KEY NOT NULL,
        tax_id TEXT NOT NULL UNIQUE,
        legal_name TEXT NOT NULL,
        municipality TEXT NOT NULL DEFAULT '',
        credit_status TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a002_service_task (
        id TEXT PRIMARY KEY NOT NULL,
        client_id TEXT NOT NULL,
        salesperson_id TEXT NOT NULL,
        revenue REAL NOT NULL DEFAULT 0,
        comparison_flag TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'PENDING',
        created_at TEXT NOT NULL,
        responded_at TEXT,
        FOREIGN KEY (client_id) REFERENCES a001_client(id),
        FOREIGN KEY (salesperson_id) REFERENCES sys_users(id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_a002_salesperson_status ON a002_service_task (salesperson_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_sys_refresh_tokens_hash ON sys_refresh_tokens (token_hash)",
];

fn build_sqlite_url(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    format!("sqlite://{}{}?mode=rwc", prefix, normalized)
}

/// Open a connection and bring the schema up to date.
///
/// Also used by tests with `sqlite::memory:`.
pub async fn connect(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(db_url.to_string());
    options.sqlx_logging(false);
    if is_in_memory(db_url) {
        // each pooled connection would open its own empty database
        options.max_connections(1);
    }
    let conn = Database::connect(options)
        .await
        .with_context(|| format!("Failed to open database {}", db_url))?;

    bootstrap_schema(&conn).await?;
    Ok(conn)
}

fn is_in_memory(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}

pub async fn bootstrap_schema<C: ConnectionTrait>(conn: &C) -> anyhow::Result<()> {
    for (idx, sql) in SCHEMA.iter().enumerate() {
        conn.execute(Statement::from_string(
            conn.get_database_backend(),
            sql.trim().to_string(),
        ))
        .await
        .with_context(|| format!("Failed to execute schema statement #{}", idx))?;
    }
    Ok(())
}

pub async fn initialize_database(db_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    let db_url = build_sqlite_url(&absolute_path);
    tracing::info!("Opening database at {}", absolute_path.display());

    let conn = connect(&db_url).await?;
    set_connection(conn)
}

/// Install the process-wide connection
pub fn set_connection(conn: DatabaseConnection) -> anyhow::Result<()> {
    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Database already initialized"))
}

/// Process-wide connection set up by [`initialize_database`].
///
/// Panics when called before initialization, which only happens on a startup bug.
pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseBackend;

    #[test]
    fn test_build_sqlite_url() {
        assert_eq!(
            build_sqlite_url(Path::new("/tmp/app.db")),
            "sqlite:///tmp/app.db?mode=rwc"
        );
        assert_eq!(
            build_sqlite_url(Path::new("C:\\data\\app.db")),
            "sqlite:///C:/data/app.db?mode=rwc"
        );
    }

    #[test]
    fn test_only_memory_databases_are_single_connection() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:app?mode=memory&cache=shared"));
        assert!(!is_in_memory(&build_sqlite_url(Path::new("/tmp/app.db"))));
    }

    #[tokio::test]
    async fn test_schema_bootstrap_is_idempotent() {
        let conn = connect("sqlite::memory:").await.unwrap();
        bootstrap_schema(&conn).await.unwrap();

        let tables = conn
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name".to_string(),
            ))
            .await
            .unwrap();
        let names: Vec<String> = tables
            .iter()
            .map(|r| r.try_get::<String>("", "name").unwrap())
            .collect();
        assert!(names.contains(&"a001_client".to_string()));
        assert!(names.contains(&"a002_service_task".to_string()));
        assert!(names.contains(&"sys_users".to_string()));
    }
}
