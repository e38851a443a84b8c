/// SQLite statistics store for lifetime player aggregates.
pub mod stats_store;
/// Storage error types shared by the data layer.
pub mod storage;
