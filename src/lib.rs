pub mod config;
pub mod controller;
pub mod error;
pub mod exchanges;
pub mod logic;
pub mod models;
pub mod routes;
pub mod sources;
pub mod store;
pub mod utils;
