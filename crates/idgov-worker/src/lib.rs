//! idgov worker: hosts the IDENTITY and ACCOUNT engines, runs the startup
//! recovery sweep and accepts workflow callbacks over HTTP.

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod workflow;
