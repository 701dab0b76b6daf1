//! idgov ACCOUNT bounded context.
//!
//! Accounts are the identities' footprints on target systems. Every account
//! mutation is an `ACCOUNT.*` event: validated, optionally approved through
//! the workflow engine and finally provisioned through a
//! [`ProvisioningConnector`](domain::connector::ProvisioningConnector).

pub mod application;
pub mod domain;
