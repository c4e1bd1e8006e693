pub mod config;
pub mod export;
pub mod pages;
pub mod records;
pub mod usage;
