//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_request_record_store;
mod in_memory_window_store;
mod postgres_request_record_store;
mod redis_window_store;
mod system_clock;
mod window_sweeper;

pub use in_memory_request_record_store::InMemoryRequestRecordStore;
pub use in_memory_window_store::InMemoryWindowStore;
pub use postgres_request_record_store::PostgresRequestRecordStore;
pub use redis_window_store::RedisWindowStore;
pub use system_clock::SystemClock;
pub use window_sweeper::WindowSweeper;
