//! Multipart upload echo server.
//!
//! Accepts `multipart/form-data` posts on `/upload`, logs a line per part,
//! answers with a JSON acknowledgment of that log, and serves static files
//! for everything else.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
