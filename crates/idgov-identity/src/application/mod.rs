//! Application layer for the IDENTITY context.

pub mod command_handlers;
pub mod processors;
pub mod query_handlers;
