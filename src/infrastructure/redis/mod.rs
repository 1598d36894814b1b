pub mod client;
pub mod index_store;
