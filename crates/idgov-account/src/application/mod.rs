//! Application layer for the ACCOUNT context.

pub mod command_handlers;
pub mod processors;
pub mod query_handlers;
