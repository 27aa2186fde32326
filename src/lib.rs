//! Fee computation and financial validation engine for a clinic back office.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
