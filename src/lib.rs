pub mod app;
pub mod config;
pub mod details;
pub mod error;
pub mod routes;
pub mod session;
pub mod tmdb;
pub mod users;
