pub mod config;
pub mod data_models;
pub mod datafold;
pub mod db;
pub mod filter;
pub mod task;
