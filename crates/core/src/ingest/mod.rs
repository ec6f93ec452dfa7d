pub mod fx;
pub mod history;
pub mod metals_dev;
pub mod provider;
pub mod types;
