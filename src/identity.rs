//! Host identity and unique token generation.
//!
//! The protocol only needs two opaque strings per entry: the node it was
//! created on and a token no other entry will ever carry. Both come through
//! the [`Identity`] trait so callers (and tests) can supply their own.

use crate::entry::sanitize_field;
use uuid::Uuid;

/// Source of the `node` and `id` fields of new entries.
///
/// Implementations must never return values containing the `__` field
/// separator; [`sanitize_field`] is the usual way to guarantee that.
pub trait Identity {
    /// Identifier of the host (or process) creating entries.
    fn node(&self) -> String;

    /// A fresh, globally unique token.
    fn token(&self) -> String;
}

/// Identity backed by the local host name and random v4 UUIDs.
#[derive(Debug, Clone)]
pub struct SystemIdentity {
    node: String,
}

impl SystemIdentity {
    /// Resolve the local host name once.
    ///
    /// The domain part is dropped (`build01.example.org` becomes `build01`).
    pub fn new() -> Self {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            node: short_host(&host),
        }
    }
}

impl Default for SystemIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl Identity for SystemIdentity {
    fn node(&self) -> String {
        self.node.clone()
    }

    fn token(&self) -> String {
        // simple() is 32 hex digits without dashes
        Uuid::new_v4().simple().to_string()
    }
}

fn short_host(host: &str) -> String {
    let short = host.split('.').next().unwrap_or(host);
    let node = sanitize_field(short);
    if node.is_empty() {
        "unknown".to_string()
    } else {
        node
    }
}

/// Get the owner string (`user@host`) written into entry metadata.
pub fn owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_host_drops_domain() {
        assert_eq!(short_host("build01.example.org"), "build01");
        assert_eq!(short_host("laptop"), "laptop");
    }

    #[test]
    fn short_host_never_empty() {
        assert_eq!(short_host(""), "unknown");
        assert_eq!(short_host("__"), "unknown");
    }

    #[test]
    fn short_host_removes_separator_runs() {
        assert_eq!(short_host("a__b"), "a_b");
    }

    #[test]
    fn tokens_are_unique_and_dashless() {
        let identity = SystemIdentity::new();
        let a = identity.token();
        let b = identity.token();

        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(!a.contains('-'));
        assert!(!a.contains('_'));
    }

    #[test]
    fn system_node_is_a_valid_field() {
        let node = SystemIdentity::new().node();
        assert!(!node.is_empty());
        assert_eq!(sanitize_field(&node), node);
    }

    #[test]
    fn owner_string_has_user_and_host() {
        let owner = owner_string();
        assert!(owner.contains('@'));
    }
}
