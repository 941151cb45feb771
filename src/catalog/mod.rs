//! Upstream card catalog search.
//!
//! - [`query`]: turns user text plus a structured filter into the upstream query string
//! - [`pricing`]: projects upstream card records and picks a representative market price
//! - [`client`]: the HTTP client with its retry policy
//! - [`seed`]: an offline catalog searched from a bundled JSON file

pub mod client;
pub mod pricing;
pub mod query;
pub mod seed;

pub use client::{CatalogClient, CatalogConfig};
pub use pricing::pick_price;
pub use seed::SeedCatalog;
