//! HTTP handlers

pub mod health;
pub mod store;
pub mod data;
