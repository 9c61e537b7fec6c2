//! Source composition.

pub mod service;
