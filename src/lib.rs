pub mod auth;
pub mod business;
pub mod config;
pub mod confirmation;
pub mod database;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod role;
pub mod routes;
pub mod session;
pub mod sources;
pub mod state;
