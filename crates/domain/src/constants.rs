//! Wire constants and process-wide defaults
//!
//! MARC21 binary separators (ISO 2709) and the small set of response
//! markers the Metadata API is known to return for transient and fatal
//! conditions.

/// Group separator: terminates one MARC21 record in a `.mrc` stream.
pub const GROUP_SEPARATOR: u8 = 0x1D;

/// Record separator: terminates each variable field inside a record.
/// Its presence in a response body is the success marker for flows that
/// receive a record back.
pub const FIELD_TERMINATOR: u8 = 0x1E;

/// Unit separator: introduces a subfield code.
pub const SUBFIELD_DELIMITER: u8 = 0x1F;

/// Fatal marker: the API quota is exhausted for every consumer sharing the
/// key. The whole run stops, not just the current unit.
pub const RATE_LIMIT_MARKER: &str = "API rate limit exceeded";

/// Transient markers: the request reached the service but the credential
/// was missing or stale, or a gateway answered instead of the API. A token
/// refresh and another attempt is the correct response to all three.
pub const AUTH_REQUIRED_MARKER: &str = "API Key or Authorization header is required";
pub const HTML_BODY_MARKER: &str = "<!DOCTYPE html>";
pub const BAD_GATEWAY_MARKER: &str = "502 Bad Gateway";

/// Default per-request timeout, seconds. Matches the API's own default.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 50;

/// Default token-endpoint timeout, seconds.
pub const DEFAULT_TOKEN_TIMEOUT_SECS: u64 = 50;

/// Default attempt budget per work unit (initial try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default fixed delay between timeout retries, seconds.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 3;

/// Background token refresh interval, minutes. Tokens live 20 minutes;
/// refreshing at 18 keeps a valid credential available at every dispatch.
pub const TOKEN_REFRESH_INTERVAL_MINS: u64 = 18;

/// Control numbers per lookup request.
pub const LOOKUP_BATCH_SIZE: usize = 100;

/// Default API endpoints.
pub const DEFAULT_SERVICE_URL: &str = "https://metadata.api.oclc.org/worldcat";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth.oclc.org/token";
