pub(crate) mod sqlite;

pub use sqlite::SqliteStateStore;
