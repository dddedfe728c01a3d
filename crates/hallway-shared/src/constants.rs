/// Minimum institution name length (after trimming)
pub const NAME_MIN: usize = 3;

/// Maximum institution name length
pub const NAME_MAX: usize = 39;

/// Minimum city name length (after trimming)
pub const CITY_MIN: usize = 3;

/// Maximum city name length
pub const CITY_MAX: usize = 14;

/// Minimum thread content length (after trimming)
pub const CONTENT_MIN: usize = 10;

/// Maximum thread content length
pub const CONTENT_MAX: usize = 10_000;

/// Minimum suggestion length (after trimming)
pub const SUGGESTION_MIN: usize = 10;

/// Maximum suggestion length
pub const SUGGESTION_MAX: usize = 500;

/// Maximum announcement length
pub const ANNOUNCEMENT_MAX: usize = 200;

/// Maximum number of threads returned per listing request
pub const THREAD_PAGE_LIMIT: u32 = 50;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default admin session lifetime in seconds (12 hours)
pub const DEFAULT_SESSION_TTL_SECS: u64 = 12 * 60 * 60;
