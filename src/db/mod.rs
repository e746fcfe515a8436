//! Database module for PostgreSQL persistence

pub mod models;
pub mod repository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;

// Environment variable names
const ENV_POSTGRES_HOST: &str = "DLM_POSTGRES_HOST";
const ENV_POSTGRES_PORT: &str = "DLM_POSTGRES_PORT";
const ENV_POSTGRES_USER: &str = "DLM_POSTGRES_USER";
const ENV_POSTGRES_PASSWORD: &str = "DLM_POSTGRES_PASSWORD";
const ENV_POSTGRES_DB: &str = "DLM_POSTGRES_DB";
const ENV_POSTGRES_MAX_CONNECTIONS: &str = "DLM_POSTGRES_MAX_CONNECTIONS";

// Default values
const DEFAULT_POSTGRES_HOST: &str = "127.0.0.1";
const DEFAULT_POSTGRES_PORT: &str = "5432";
const DEFAULT_POSTGRES_USER: &str = "dlm";
const DEFAULT_POSTGRES_PASSWORD: &str = "dlm";
const DEFAULT_POSTGRES_DB: &str = "dlm";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A foreign key pointed at a missing row
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// A check constraint rejected the write
    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let detail = db_err
                .constraint()
                .map(|c| format!("{} ({})", db_err.message(), c))
                .unwrap_or_else(|| db_err.message().to_string());
            if db_err.is_unique_violation() {
                return DbError::Conflict(detail);
            }
            if db_err.is_foreign_key_violation() {
                return DbError::InvalidReference(detail);
            }
            if db_err.is_check_violation() {
                return DbError::Constraint(detail);
            }
        }
        DbError::Connection(err)
    }
}

/// Create a new database connection pool
pub async fn create_pool() -> Result<PgPool, DbError> {
    let host = env::var(ENV_POSTGRES_HOST).unwrap_or_else(|_| DEFAULT_POSTGRES_HOST.to_string());
    let port = env::var(ENV_POSTGRES_PORT).unwrap_or_else(|_| DEFAULT_POSTGRES_PORT.to_string());
    let user = env::var(ENV_POSTGRES_USER).unwrap_or_else(|_| DEFAULT_POSTGRES_USER.to_string());
    let password =
        env::var(ENV_POSTGRES_PASSWORD).unwrap_or_else(|_| DEFAULT_POSTGRES_PASSWORD.to_string());
    let database = env::var(ENV_POSTGRES_DB).unwrap_or_else(|_| DEFAULT_POSTGRES_DB.to_string());
    let max_connections = env::var(ENV_POSTGRES_MAX_CONNECTIONS)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CONNECTIONS);

    let database_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, database
    );

    tracing::debug!(host = %host, port = %port, database = %database, "Connecting to PostgreSQL");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await?;

    tracing::info!(host = %host, port = %port, "PostgreSQL connection established");

    Ok(pool)
}

/// Tables are created parents first so foreign keys resolve
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS manufacturers (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS platforms (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        manufacturer_id UUID REFERENCES manufacturers(id) ON DELETE SET NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS device_types (
        id UUID PRIMARY KEY,
        manufacturer_id UUID NOT NULL REFERENCES manufacturers(id) ON DELETE CASCADE,
        model TEXT NOT NULL,
        part_number TEXT,
        UNIQUE (manufacturer_id, model)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS devices (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        device_type_id UUID NOT NULL REFERENCES device_types(id) ON DELETE CASCADE,
        platform_id UUID REFERENCES platforms(id) ON DELETE SET NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inventory_items (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        device_id UUID NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
        manufacturer_id UUID REFERENCES manufacturers(id) ON DELETE SET NULL,
        part_id TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS hardware_lcm (
        id UUID PRIMARY KEY,
        device_type_id UUID UNIQUE REFERENCES device_types(id) ON DELETE CASCADE,
        inventory_item TEXT UNIQUE,
        release_date DATE,
        end_of_sale DATE,
        end_of_support DATE,
        end_of_sw_releases DATE,
        end_of_security_patches DATE,
        documentation_url TEXT,
        CHECK ((device_type_id IS NULL) <> (inventory_item IS NULL))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS software_lcm (
        id UUID PRIMARY KEY,
        platform_id UUID NOT NULL REFERENCES platforms(id) ON DELETE CASCADE,
        version TEXT NOT NULL,
        alias TEXT,
        release_date DATE,
        end_of_support DATE,
        documentation_url TEXT,
        download_url TEXT,
        image_file_name TEXT,
        image_file_checksum TEXT,
        long_term_support BOOLEAN NOT NULL DEFAULT FALSE,
        pre_release BOOLEAN NOT NULL DEFAULT FALSE,
        tags TEXT[] NOT NULL DEFAULT '{}',
        UNIQUE (platform_id, version)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS validated_software_lcm (
        id UUID PRIMARY KEY,
        software_id UUID NOT NULL REFERENCES software_lcm(id) ON DELETE CASCADE,
        assigned_to_content_type TEXT NOT NULL,
        assigned_to_object_id UUID NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE,
        preferred BOOLEAN NOT NULL DEFAULT FALSE,
        tags TEXT[] NOT NULL DEFAULT '{}',
        CHECK (end_date IS NULL OR end_date >= start_date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS provider_lcm (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        physical_address TEXT,
        contact_name TEXT,
        contact_phone TEXT,
        contact_email TEXT,
        comments TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contract_lcm (
        id UUID PRIMARY KEY,
        provider_id UUID NOT NULL REFERENCES provider_lcm(id) ON DELETE CASCADE,
        name TEXT NOT NULL UNIQUE,
        start_date DATE,
        end_date DATE,
        cost DOUBLE PRECISION,
        support_level TEXT,
        contract_type TEXT,
        CHECK (end_date IS NULL OR start_date IS NULL OR end_date >= start_date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contact_lcm (
        id UUID PRIMARY KEY,
        contract_id UUID NOT NULL REFERENCES contract_lcm(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        address TEXT,
        phone TEXT,
        email TEXT,
        comments TEXT,
        priority INTEGER NOT NULL DEFAULT 100,
        contact_type TEXT NOT NULL DEFAULT 'Unassigned'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS device_software_validation_results (
        id UUID PRIMARY KEY,
        device_id UUID NOT NULL UNIQUE REFERENCES devices(id) ON DELETE CASCADE,
        software_id UUID REFERENCES software_lcm(id) ON DELETE CASCADE,
        is_validated BOOLEAN NOT NULL DEFAULT FALSE,
        last_run TIMESTAMPTZ NOT NULL,
        run_type TEXT NOT NULL CHECK (run_type IN ('full-report-run', 'single-object-run')),
        last_updated TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CHECK (NOT is_validated OR software_id IS NOT NULL)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inventory_item_software_validation_results (
        id UUID PRIMARY KEY,
        inventory_item_id UUID NOT NULL UNIQUE REFERENCES inventory_items(id) ON DELETE CASCADE,
        software_id UUID REFERENCES software_lcm(id) ON DELETE CASCADE,
        is_validated BOOLEAN NOT NULL DEFAULT FALSE,
        last_run TIMESTAMPTZ NOT NULL,
        run_type TEXT NOT NULL CHECK (run_type IN ('full-report-run', 'single-object-run')),
        last_updated TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CHECK (NOT is_validated OR software_id IS NOT NULL)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_validated_software_target ON validated_software_lcm(assigned_to_content_type, assigned_to_object_id)",
    "CREATE INDEX IF NOT EXISTS idx_device_results_run ON device_software_validation_results(run_type, last_updated)",
    "CREATE INDEX IF NOT EXISTS idx_inventory_results_run ON inventory_item_software_validation_results(run_type, last_updated)",
];

/// Initialize database schema
pub async fn init_schema(pool: &PgPool) -> Result<(), DbError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!(statements = SCHEMA.len(), "Database schema initialized");

    Ok(())
}
