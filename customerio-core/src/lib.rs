//! # customerio-core
//!
//! Client library for the Customer.io Track API.
//!
//! This library provides:
//! - [`CustomerIo`], a client for identifying customers, deleting them and tracking events
//! - Attribute and event types with native date handling
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use customerio_core::{Attributes, CustomerIo};
//!
//! # async fn run() -> customerio_core::Result<()> {
//! let client = CustomerIo::new("site-id", "api-key");
//!
//! client
//!     .identify(
//!         Attributes::new()
//!             .with("id", "123")
//!             .with("email", "ada@example.com")
//!             .with("created_at", chrono::Utc::now()),
//!     )
//!     .await?;
//!
//! client
//!     .track("123", "purchased", Attributes::new().with("item", "shoe"), None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use client::CustomerIo;
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;
