pub mod queue;
pub mod redis;
pub mod storage;
pub mod store;
