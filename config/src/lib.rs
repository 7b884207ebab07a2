//! # Config Crate
//!
//! Centralized configuration constants for the OpenSCAD parser.
//! All magic numbers and tunable parameters are defined here to ensure
//! consistency across crates and easy configuration management.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{ParserConfig, MAX_MISSING_TOKENS, MAX_SKIPPED_TOKENS};
//!
//! let config = ParserConfig::default();
//! assert_eq!(config.max_skipped_tokens(), MAX_SKIPPED_TOKENS);
//! assert_eq!(config.max_missing_tokens(), MAX_MISSING_TOKENS);
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **Browser-Safe**: No platform-specific values
//! - **Bounded**: Every search the parser performs has a limit defined here

pub mod constants;
