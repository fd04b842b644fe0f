//! PostgreSQL backends.

pub mod connection;
pub mod migration;
pub mod queue;
pub mod table;

pub use connection::DatabasePool;
pub use migration::run_migrations;
pub use queue::PgQueue;
pub use table::PgTableStore;
