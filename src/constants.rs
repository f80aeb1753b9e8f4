//! Protocol constants for the REST resource endpoints.

/// Number of records pulled from a producer into the cache per fill.
pub const CHUNK_SIZE: usize = 100;

/// Fallback base URL when no environment configuration is present.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8001/api/";

/// Fallback timezone for datetime field parsing.
pub const DEFAULT_TIME_ZONE: &str = "Europe/London";

/// Authorization header scheme prefix for bearer-style tokens.
pub const AUTH_SCHEME: &str = "JWT";

/// Accepted status codes per mutating verb.
pub mod status {
    pub const CREATE: &[u16] = &[201];
    pub const PATCH: &[u16] = &[200, 201, 202];
    pub const DELETE: &[u16] = &[200, 202, 204];
}

/// Standard headers for mutation requests.
pub mod headers {
    pub const CONTENT_TYPE_JSON: &str = "application/json";
    pub const ACCEPT_PLAIN: &str = "text/plain";
}

/// Query parameter names for server-side slice bounds.
pub mod params {
    pub const LIMIT_START: &str = "limit_start";
    pub const LIMIT_STOP: &str = "limit_stop";
}

/// Keys of the paginated list envelope.
pub mod envelope {
    pub const OBJECTS: &str = "objects";
    pub const META: &str = "meta";
}
