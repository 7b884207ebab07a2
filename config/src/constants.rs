//! # Configuration Constants
//!
//! Centralized constants for the OpenSCAD parser. Error-recovery bounds,
//! input limits and recursion guards are defined here.
//!
//! ## Categories
//!
//! - **Recovery**: Bounds on the parser's error-recovery search
//! - **Limits**: Maximum values for safety bounds
//! - **Recursion**: Stack growth parameters for recursive tree walks

use std::fmt;

// =============================================================================
// RECOVERY CONSTANTS
// =============================================================================

/// Maximum number of upcoming tokens the parser may discard while looking for
/// a token that lets it resynchronize after a syntax error.
///
/// Larger values let recovery skip longer stretches of garbage in one error
/// node, at the cost of a wider search per error.
///
/// # Example
///
/// ```rust
/// use config::constants::MAX_SKIPPED_TOKENS;
/// assert!(MAX_SKIPPED_TOKENS >= 1);
/// ```
pub const MAX_SKIPPED_TOKENS: usize = 8;

/// Maximum length of a sequence of zero-width tokens the parser may insert
/// to repair an unterminated construct (for example `cube(10` gets a missing
/// `)` and a missing `;`).
///
/// # Example
///
/// ```rust
/// use config::constants::MAX_MISSING_TOKENS;
/// assert!(MAX_MISSING_TOKENS <= 4);
/// ```
pub const MAX_MISSING_TOKENS: usize = 3;

/// Upper bound accepted by [`ParserConfig::new`] for either search bound.
pub const MAX_RECOVERY_BOUND: usize = 32;

// =============================================================================
// LIMIT CONSTANTS
// =============================================================================

/// Maximum source length in bytes.
///
/// Tree offsets are stored as 32-bit sizes, so a single source unit must fit
/// in `u32`.
///
/// # Example
///
/// ```rust
/// use config::constants::MAX_SOURCE_LEN;
/// assert_eq!(MAX_SOURCE_LEN, u32::MAX as usize);
/// ```
pub const MAX_SOURCE_LEN: usize = u32::MAX as usize;

// =============================================================================
// RECURSION CONSTANTS
// =============================================================================

/// Remaining stack below which recursive tree walks grow the stack.
///
/// # Example
///
/// ```rust
/// use config::constants::{STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};
/// assert!(STACKER_RED_ZONE_BYTES < STACKER_STACK_SIZE_BYTES);
/// ```
pub const STACKER_RED_ZONE_BYTES: usize = 64 * 1024;

/// Bytes of stack space allocated each time a recursive walk grows the stack
/// using the `stacker` crate.
pub const STACKER_STACK_SIZE_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// PARSER CONFIG
// =============================================================================

/// Immutable snapshot of the parser's tunable bounds.
///
/// Only obtainable through [`ParserConfig::new`] or [`Default`], so the
/// bounds are always within [`MAX_RECOVERY_BOUND`].
///
/// # Examples
/// ```
/// use config::constants::ParserConfig;
/// let config = ParserConfig::default();
/// assert!(config.max_skipped_tokens() > 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    max_skipped_tokens: usize,
    max_missing_tokens: usize,
}

impl ParserConfig {
    /// Builds a configuration, rejecting bounds that would disable recovery
    /// or make its search unreasonably wide.
    ///
    /// # Examples
    /// ```
    /// use config::constants::ParserConfig;
    /// let config = ParserConfig::new(4, 2).expect("valid config");
    /// assert_eq!(config.max_missing_tokens(), 2);
    /// assert!(ParserConfig::new(0, 2).is_err());
    /// ```
    pub fn new(max_skipped_tokens: usize, max_missing_tokens: usize) -> Result<Self, ConfigError> {
        if max_skipped_tokens == 0 || max_skipped_tokens > MAX_RECOVERY_BOUND {
            return Err(ConfigError::InvalidSkippedTokens(max_skipped_tokens));
        }
        if max_missing_tokens > MAX_RECOVERY_BOUND {
            return Err(ConfigError::InvalidMissingTokens(max_missing_tokens));
        }
        Ok(Self {
            max_skipped_tokens,
            max_missing_tokens,
        })
    }

    /// Upcoming tokens recovery may discard before giving up on a position.
    pub fn max_skipped_tokens(&self) -> usize {
        self.max_skipped_tokens
    }

    /// Longest run of zero-width tokens recovery may insert.
    pub fn max_missing_tokens(&self) -> usize {
        self.max_missing_tokens
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_skipped_tokens: MAX_SKIPPED_TOKENS,
            max_missing_tokens: MAX_MISSING_TOKENS,
        }
    }
}

/// Error returned when invalid configuration values are provided.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Raised when the skip bound is zero or above [`MAX_RECOVERY_BOUND`].
    InvalidSkippedTokens(usize),
    /// Raised when the insertion bound is above [`MAX_RECOVERY_BOUND`].
    InvalidMissingTokens(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSkippedTokens(value) => {
                write!(f, "max_skipped_tokens must be in 1..={MAX_RECOVERY_BOUND}: {value}")
            }
            ConfigError::InvalidMissingTokens(value) => {
                write!(f, "max_missing_tokens must be <= {MAX_RECOVERY_BOUND}: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
