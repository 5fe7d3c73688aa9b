pub mod api;
pub mod config;
pub mod control;
pub mod coordinator;
pub mod db;
pub mod detector;
pub mod models;
pub mod notify;
pub mod process;
pub mod stats;
pub mod timer;
pub mod workers;
