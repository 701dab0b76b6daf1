//! Domain layer for the IDENTITY context.

pub mod commands;
pub mod event_type;
pub mod identity;
pub mod repository;
