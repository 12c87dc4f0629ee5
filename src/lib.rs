pub mod auth;
pub mod config;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

#[cfg(test)]
pub mod testing;
