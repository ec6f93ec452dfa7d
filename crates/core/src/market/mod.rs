pub mod fx;
pub mod quotes;
pub mod recommendations;
pub mod service;
