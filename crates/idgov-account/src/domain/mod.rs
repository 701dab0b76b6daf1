//! Domain layer for the ACCOUNT context.

pub mod account;
pub mod commands;
pub mod connector;
pub mod event_type;
