//! Shared constants for end-to-end tests
//!
//! The stub tools in `fixtures.rs` react to these markers, so tests and
//! stubs agree on outcomes by construction.

// ============================================================================
// Stub tool behavior
// ============================================================================

/// Title every successful stub conversion reports.
pub const STUB_TITLE: &str = "Test Song";

/// Duration every successful stub conversion reports.
pub const STUB_DURATION: &str = "3:45";

/// Bytes written into every artifact the stub produces.
pub const STUB_AUDIO_BYTES: &[u8] = b"ID3 stub audio";

/// Version line printed by the stub fetch tool.
pub const STUB_FETCH_TOOL_VERSION: &str = "2024.12.13";

/// Version reported by the stub ffmpeg.
pub const STUB_FFMPEG_VERSION: &str = "6.1.1-stub";

/// Inputs containing this marker make the stub fetch tool exit with an error.
pub const FAIL_MARKER: &str = "fail";

/// Inputs containing this marker make the stub fetch tool hang.
pub const HANG_MARKER: &str = "hang";

/// Stderr line printed by the stub fetch tool when it fails.
pub const STUB_ERROR_LINE: &str = "ERROR: Video unavailable";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Wall-clock limit applied to stub conversions (milliseconds)
pub const CONVERSION_TIMEOUT_MS: u64 = 1500;

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Lifetime of converted files in the test server (hours)
pub const TEST_FILE_TTL_HOURS: u64 = 6;

/// Per-request item limit of the test server
pub const TEST_MAX_BATCH_ITEMS: usize = 5;
