/// Database access layer
///
/// - `pool`: PostgreSQL connection pool management
/// - `migrations`: forward-only schema migration runner

pub mod migrations;
pub mod pool;
