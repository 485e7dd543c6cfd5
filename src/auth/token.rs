//! Token value wrappers.

pub mod access;
pub mod secret;
