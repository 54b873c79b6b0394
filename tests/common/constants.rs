//! Shared constants for end-to-end tests
//!
//! When the test site changes (pages, secrets, MCP identity),
//! update only this file.

// ============================================================================
// Credentials
// ============================================================================

/// Primary session cookie name
pub const SESSION_COOKIE: &str = "session_token";

/// Primary session secret
pub const SESSION_SECRET: &str = "e2e-primary-session-secret";

/// Base64 HMAC key of the test runtime (32 bytes 0..=31)
pub const TEST_LLM_KEY: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";

// ============================================================================
// Test Site
// ============================================================================

pub const SITE_TITLE: &str = "Test Docs";

/// Public page with a "Setup" title
pub const PUBLIC_PAGE: &str = "/guides/setup";

/// Page under the first protected group
pub const PROTECTED_PAGE: &str = "/internal/runbook";

/// Page under the second protected group
pub const PARTNER_PAGE: &str = "/partners/pricing";

/// Text only found in PROTECTED_PAGE
pub const PROTECTED_TEXT: &str = "Restart the ingest workers";

/// Text only found in PARTNER_PAGE
pub const PARTNER_TEXT: &str = "Volume discounts";

/// MCP server id, the tool is `query_docs_test_docs`
pub const MCP_ID: &str = "test-docs";
pub const MCP_TOOL: &str = "query_docs_test_docs";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
