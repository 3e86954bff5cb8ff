pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod models;
pub mod pay;
pub mod revalidate;
pub mod routes;
pub mod schema;
pub mod state;
