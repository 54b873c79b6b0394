use serde::Serialize;

use super::{LlmTokenRuntime, TokenData, MAX_ENTRIES_PER_GROUP, MAX_GROUPS};

/// A `(group_bits, entry_bits)` grant, ready to be passed to [`super::create_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Permissions {
    pub group_bits: u8,
    pub entry_bits: u32,
}

/// Canonical route path: a single trailing `.md` is ignored.
fn route_path(path: &str) -> &str {
    path.strip_suffix(".md").unwrap_or(path)
}

fn bit_set_u8(bits: u8, index: usize) -> bool {
    index < 8 && bits & (1u8 << index) != 0
}

fn bit_set_u24(bits: u32, index: usize) -> bool {
    index < 24 && bits & (1u32 << index) != 0
}

/// Whether the token grants `path`: any enabled entry of any enabled group
/// whose prefix the path starts with.
pub fn can_access_route(rt: &LlmTokenRuntime, data: &TokenData, path: &str) -> bool {
    let path = route_path(path);
    rt.groups()
        .iter()
        .enumerate()
        .filter(|(g, _)| bit_set_u8(data.group_bits, *g))
        .any(|(_, group)| {
            group
                .iter()
                .enumerate()
                .filter(|(e, _)| bit_set_u24(data.entry_bits, *e))
                .any(|(_, entry)| path.starts_with(&entry.prefix))
        })
}

/// Whether `path` falls under any configured prefix, regardless of token bits.
pub fn is_protected_route(rt: &LlmTokenRuntime, path: &str) -> bool {
    let path = route_path(path);
    rt.groups()
        .iter()
        .flatten()
        .any(|entry| path.starts_with(&entry.prefix))
}

/// Full-access grant: every configured group and every entry index in use.
pub fn resolve_all_permissions(rt: &LlmTokenRuntime) -> Permissions {
    let mut permissions = Permissions::default();
    for (g, group) in rt.groups().iter().enumerate().take(MAX_GROUPS) {
        permissions.group_bits |= 1u8 << g;
        for e in 0..group.len().min(MAX_ENTRIES_PER_GROUP) {
            permissions.entry_bits |= 1u32 << e;
        }
    }
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_tokens::{
        create_token, verify_token, GroupEntry, HmacSha256Key, MacKey, PermissionGroup,
        TOKEN_VERSION,
    };
    use std::sync::Arc;

    fn runtime(groups: &[&[&str]]) -> LlmTokenRuntime {
        let groups: Vec<PermissionGroup> = groups
            .iter()
            .map(|g| g.iter().map(|p| GroupEntry::new(*p)).collect())
            .collect();
        let key = Arc::new(HmacSha256Key::generate()) as Arc<dyn MacKey>;
        LlmTokenRuntime::new(groups, key, None, None).unwrap()
    }

    fn token_data(group_bits: u8, entry_bits: u32) -> TokenData {
        TokenData {
            version: TOKEN_VERSION,
            expiry_hours: 100_000,
            group_bits,
            entry_bits,
            expired: false,
        }
    }

    #[test]
    fn test_grants_enabled_prefixes() {
        let rt = runtime(&[&["/docs", "/api"]]);
        let data = token_data(0b1, 0b11);

        assert!(can_access_route(&rt, &data, "/docs/page"));
        assert!(can_access_route(&rt, &data, "/docs/page.md"));
        assert!(can_access_route(&rt, &data, "/api/endpoint"));
        assert!(!can_access_route(&rt, &data, "/other"));
    }

    #[test]
    fn test_respects_entry_bits() {
        let rt = runtime(&[&["/docs", "/api"]]);
        let data = token_data(0b1, 0b01);

        assert!(can_access_route(&rt, &data, "/docs/page"));
        assert!(!can_access_route(&rt, &data, "/api/endpoint"));
    }

    #[test]
    fn test_empty_masks_deny_everything() {
        let rt = runtime(&[&["/docs", "/api"]]);

        for path in ["/docs/page", "/api/endpoint", "/", "/docs.md"] {
            assert!(!can_access_route(&rt, &token_data(0, 0b11), path));
            assert!(!can_access_route(&rt, &token_data(0b1, 0), path));
        }
    }

    #[test]
    fn test_entry_bits_are_scoped_per_group() {
        let rt = runtime(&[&["/guides", "/ops"], &["/internal", "/billing"]]);

        // Entry 1 in both groups.
        let data = token_data(0b11, 0b10);
        assert!(can_access_route(&rt, &data, "/ops/runbook"));
        assert!(can_access_route(&rt, &data, "/billing/invoices"));
        assert!(!can_access_route(&rt, &data, "/guides/start"));
        assert!(!can_access_route(&rt, &data, "/internal/x"));

        // Only the second group.
        let data = token_data(0b10, 0b11);
        assert!(can_access_route(&rt, &data, "/internal/x"));
        assert!(!can_access_route(&rt, &data, "/guides/start"));
    }

    #[test]
    fn test_bits_beyond_configured_groups_grant_nothing() {
        let rt = runtime(&[&["/docs"]]);
        let data = token_data(0b1111_1110, 0xFF_FFFF);
        assert!(!can_access_route(&rt, &data, "/docs/page"));
    }

    #[test]
    fn test_root_prefix_matches_everything() {
        let rt = runtime(&[&["/"]]);
        let data = token_data(0b1, 0b1);

        for path in ["/", "/a", "/a/b/c", "/a/b/c.md", "/index.md"] {
            assert!(can_access_route(&rt, &data, path), "denied {}", path);
        }
    }

    #[test]
    fn test_only_one_md_suffix_is_stripped() {
        let rt = runtime(&[&["/notes.md"]]);
        let data = token_data(0b1, 0b1);
        assert!(can_access_route(&rt, &data, "/notes.md.md"));
        assert!(!can_access_route(&rt, &data, "/notes.md"));
    }

    #[test]
    fn test_protection_ignores_bitmasks() {
        let rt = runtime(&[&["/docs", "/api"], &["/private"]]);

        assert!(is_protected_route(&rt, "/docs/page"));
        assert!(is_protected_route(&rt, "/api/endpoint.md"));
        assert!(is_protected_route(&rt, "/private"));
        assert!(!is_protected_route(&rt, "/public/page.md"));
        assert!(!is_protected_route(&rt, "/"));

        // A token that grants nothing does not change protection status.
        let nothing = token_data(0, 0);
        assert!(!can_access_route(&rt, &nothing, "/docs/page"));
        assert!(is_protected_route(&rt, "/docs/page"));
    }

    #[test]
    fn test_no_groups_protects_nothing() {
        let rt = runtime(&[]);
        assert!(!is_protected_route(&rt, "/docs"));
        assert_eq!(resolve_all_permissions(&rt), Permissions::default());
    }

    #[test]
    fn test_resolves_full_masks() {
        let rt = runtime(&[&["/a", "/b", "/c"], &["/d"]]);
        let all = resolve_all_permissions(&rt);
        assert_eq!(all.group_bits, 0b11);
        assert_eq!(all.entry_bits, 0b111);

        let groups: Vec<Vec<String>> = (0..8)
            .map(|g| (0..24).map(|e| format!("/g{}/e{}", g, e)).collect())
            .collect();
        let refs: Vec<Vec<&str>> = groups
            .iter()
            .map(|g| g.iter().map(String::as_str).collect())
            .collect();
        let slices: Vec<&[&str]> = refs.iter().map(Vec::as_slice).collect();
        let rt = runtime(&slices);
        let all = resolve_all_permissions(&rt);
        assert_eq!(all.group_bits, 0xFF);
        assert_eq!(all.entry_bits, 0xFF_FFFF);
    }

    #[tokio::test]
    async fn test_full_grant_token_reaches_every_prefix() {
        let rt = runtime(&[&["/docs", "/api"], &["/internal"], &["/a", "/b", "/c", "/d"]]);
        let all = resolve_all_permissions(&rt);
        let token = create_token(&rt, all.group_bits, all.entry_bits)
            .await
            .unwrap();
        let data = verify_token(&rt, &token).await.unwrap();

        for group in rt.groups() {
            for entry in group {
                let page = format!("{}/page.md", entry.prefix);
                assert!(can_access_route(&rt, &data, &page), "denied {}", page);
            }
        }
    }
}
