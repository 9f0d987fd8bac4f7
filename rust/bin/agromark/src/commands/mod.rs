pub mod config;
pub mod lotes;
