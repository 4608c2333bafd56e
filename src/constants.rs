//! # Constants
//!
//! Shared constants used throughout the registry.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default database URL (in-memory SQLite, suitable for development and tests)
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

/// Default maximum number of pooled database connections
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default minimum number of pooled database connections
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;

/// Default timeout for establishing a database connection (seconds)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 8;

/// Default timeout for acquiring a pooled connection (seconds)
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 8;

/// Page size used when a list request asks for 0 results
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Largest page a list request may return
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Longest filter expression accepted, in bytes
pub const MAX_FILTER_LENGTH: usize = 8192;

/// Deepest nesting of parentheses, negations, calls and member accesses in a filter
pub const MAX_FILTER_DEPTH: usize = 64;

/// Version stamped into every page token
pub const PAGE_TOKEN_VERSION: u8 = 1;

/// Length of generated revision ids
pub const REVISION_ID_LENGTH: usize = 8;

/// How many random revision ids to try before giving up on finding an unused one
pub const MAX_REVISION_ID_ATTEMPTS: usize = 5;

/// How many times an allow-missing update retries after losing a create race
pub const MAX_UPSERT_ATTEMPTS: usize = 3;

/// MIME type suffix declaring gzip-compressed contents
pub const GZIP_MIME_SUFFIX: &str = "+gzip";

/// Leading bytes of every gzip stream
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
