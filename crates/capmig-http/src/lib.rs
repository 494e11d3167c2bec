//! REST clients for the Okapi (legacy) and Eureka (target) platforms.
//!
//! The clients only load data and replay migration calls; every
//! decision lives in `capmig-core`. Requests are single-shot and
//! sequential: resilience and parallel paging are deliberately not this
//! tool's concern.

pub mod client;
pub mod error;
pub mod eureka;
pub mod okapi;

pub use client::{HttpClient, HttpConfig};
pub use error::{HttpError, Result};
pub use eureka::{Capability, CapabilityDirectory, EntityEndpoint, EurekaClient, Role};
pub use okapi::OkapiClient;
