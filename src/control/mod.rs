//! HTTP control surface over the scheduler.
//!
//! Minimal HTTP/1.1: one request per connection, JSON answers,
//! `Connection: close`.
mod http;
mod routes;
mod server;


pub use server::{bind_control_listener, serve_control};
