// src/lib.rs

//! Catalog Monitor Library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
