//! HTTP request handlers.

pub mod basket;
pub mod descriptor;
