pub mod config;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod notify;
pub mod persist;
pub mod pipeline;
pub mod scrape;
pub mod validate;
