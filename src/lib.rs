//! LokiStack Controller Library
//!
//! This library keeps the status conditions of `LokiStack` resources in sync
//! with the health of their components.
//!
//! ## Quick Start
//!
//! ```rust
//! use lokistack_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod runtime;
