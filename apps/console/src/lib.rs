//! casedesk console
//!
//! Terminal administration console for the clinical case-management backend.
//! The crate is organised the way a request flows through it:
//!
//! - [`config`] and [`logging`]: layered settings and tracing setup
//! - [`login`]: the two-factor login sequencer
//! - [`account`]: password reset/change and profile edits
//! - [`screens`] and [`filters`]: list screens built on `casedesk-listing`
//! - [`dashboard`]: record counts and recent activity
//! - [`actions`]: record mutations with in-flight guarding and feedback banners
//! - [`preferences`] and [`format`]: per-user display preferences
//! - [`cli`] and [`commands`]: the `casedesk` binary's commands

pub mod account;
pub mod actions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filters;
pub mod format;
pub mod logging;
pub mod login;
pub mod preferences;
pub mod screens;
pub mod session;

pub use error::{Error, Result};
