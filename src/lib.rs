//! Points and rewards service
//!
//! Users trigger weighted random draws from a reward catalog. Every draw credits the reward's
//! points to the user's account and appends a transaction to an append-only log.
//!
//! The crate follows a ports and adapters layout:
//! * [`domain`] holds the catalog, the draw engine and the ledger rules.
//! * [`ports`] describes the storage and user directory the domain relies on.
//! * [`adapters`] provides in-memory implementations of those ports.
//! * [`commands`] exposes every operation as a `tower::Service` on [`commands::DomainLogic`].

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
