//! Route modules of the worker's HTTP surface.

pub mod callbacks;
pub mod events;
pub mod health;
