/// Database layer
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: embedded sqlx migration runner
///
/// Models live in the `models` module at the crate root.

pub mod migrations;
pub mod pool;
