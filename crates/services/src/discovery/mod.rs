//! Discovery rules and their persistence-aware wrapper.

mod application;
pub mod domain;

pub use application::{DiscoveryApplication, DiscoverySettings};
