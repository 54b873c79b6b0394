//! Stateless LLM access tokens
//!
//! Lets LLM agents read protected `.md` routes without a server-side session.
//! A token is 18 bytes, URL-safe base64 encoded to 24 characters:
//!
//! ```text
//! [version:1][expiry_hours:3 BE][group_bits:1][entry_bits:3 BE][hmac:10]
//! ```
//!
//! - `expiry_hours` counts hours since the runtime epoch (2025-01-01 UTC).
//! - `group_bits` selects configured permission groups (max 8).
//! - `entry_bits` selects path-prefix entries inside every enabled group (max 24).
//! - `hmac` is HMAC-SHA256 over the first 8 bytes, truncated to 80 bits.
//!
//! Verification only needs the key and the clock.

mod access;
mod codec;
mod key;
mod messages;
mod runtime;

pub use access::{can_access_route, is_protected_route, resolve_all_permissions, Permissions};
pub use codec::{
    create_token, create_token_at, verify_active_token, verify_active_token_at, verify_token,
    verify_token_at, TokenData, TokenRejection, HMAC_BYTES, PAYLOAD_BYTES, TOKEN_BYTES,
    TOKEN_CHARS, TOKEN_VERSION,
};
pub use key::{HmacSha256Key, MacKey};
pub use messages::{llm_401_response, llm_footer};
pub use runtime::{
    GroupEntry, LlmConfigError, LlmTokenError, LlmTokenRuntime, PermissionGroup, PrimaryAuth,
    DEFAULT_EXPIRES_IN_HOURS, MAX_ENTRIES_PER_GROUP, MAX_GROUPS,
};
