//! # Canonical worker identity.
//!
//! Workers are addressed by `node@host`. A raw name is canonicalized in two steps:
//!
//! 1. **Default node name**: a name without `@` is a host and gets the node
//!    name [`DEFAULT_NODE_NAME`]; an empty node part becomes the default too;
//!    an empty host part becomes the machine hostname.
//! 2. **Host expansion**: `%h` → machine hostname, `%n` → its first label,
//!    `%d` → its domain, `%%` → `%`. Other `%x` sequences are kept verbatim.
//!
//! ```text
//! "w1"        → "celery@w1"
//! "w1@%h"     → "w1@box.example.com"
//! "w1@%n"     → "w1@box"
//! "@host"     → "celery@host"
//! "w1@"       → "w1@box.example.com"
//! ```
//!
//! The control API matches workers by this exact string, so every lookup in
//! the registry goes through [`Hostname::canonical`].

use std::fmt;
use std::sync::OnceLock;

/// Node name used when a raw name has none.
pub const DEFAULT_NODE_NAME: &str = "celery";

/// Separator between node name and host.
pub const NODE_SEP: char = '@';

/// Canonical `node@host` identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hostname {
    full: String,
    split: usize,
}

impl Hostname {
    /// Canonicalizes `raw` against the local machine hostname.
    pub fn canonical(raw: &str) -> Self {
        Self::canonical_on(raw, machine_hostname())
    }

    /// Canonicalizes `raw` against an explicit machine hostname.
    pub fn canonical_on(raw: &str, machine: &str) -> Self {
        let (node, host) = match raw.split_once(NODE_SEP) {
            Some((node, host)) => (node, host),
            None => ("", raw),
        };
        let node = if node.is_empty() { DEFAULT_NODE_NAME } else { node };
        let host = if host.is_empty() { machine } else { host };

        let full = expand(&format!("{node}{NODE_SEP}{host}"), machine);
        let split = full.find(NODE_SEP).unwrap_or(full.len());
        Self { full, split }
    }

    /// Full `node@host` string.
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// Node name (before `@`).
    pub fn node(&self) -> &str {
        &self.full[..self.split]
    }

    /// Host part (after `@`).
    pub fn host(&self) -> &str {
        self.full
            .get(self.split + NODE_SEP.len_utf8()..)
            .unwrap_or("")
    }

    /// Consumes the identity and returns the full string.
    pub fn into_string(self) -> String {
        self.full
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.full
    }
}

/// Hostname of the machine running the control plane (cached).
pub fn machine_hostname() -> &'static str {
    static MACHINE: OnceLock<String> = OnceLock::new();
    MACHINE.get_or_init(|| {
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "localhost".to_string())
    })
}

fn expand(template: &str, machine: &str) -> String {
    let (short, domain) = machine.split_once('.').unwrap_or((machine, ""));
    let mut out = String::with_capacity(template.len() + machine.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let replacement = match chars.peek() {
            Some('h') => machine,
            Some('n') => short,
            Some('d') => domain,
            Some('%') => "%",
            _ => {
                out.push('%');
                continue;
            }
        };
        out.push_str(replacement);
        chars.next();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOX: &str = "box.example.com";

    #[test]
    fn bare_name_is_a_host_with_default_node() {
        let h = Hostname::canonical_on("w1", BOX);
        assert_eq!(h.as_str(), "celery@w1");
        assert_eq!(h.node(), "celery");
        assert_eq!(h.host(), "w1");
    }

    #[test]
    fn host_placeholders_expand() {
        assert_eq!(Hostname::canonical_on("w1@%h", BOX).as_str(), "w1@box.example.com");
        assert_eq!(Hostname::canonical_on("w1@%n", BOX).as_str(), "w1@box");
        assert_eq!(Hostname::canonical_on("w1@%n.%d", BOX).as_str(), "w1@box.example.com");
        assert_eq!(Hostname::canonical_on("w1@100%%", BOX).as_str(), "w1@100%");
        assert_eq!(Hostname::canonical_on("w1@%i", BOX).as_str(), "w1@%i");
    }

    #[test]
    fn empty_parts_take_defaults() {
        assert_eq!(Hostname::canonical_on("@host", BOX).as_str(), "celery@host");
        assert_eq!(Hostname::canonical_on("w1@", BOX).as_str(), "w1@box.example.com");
        assert_eq!(Hostname::canonical_on("", BOX).as_str(), "celery@box.example.com");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        for raw in ["w1", "w1@%h", "a@b@c", "%n", "@"] {
            let once = Hostname::canonical_on(raw, BOX);
            let twice = Hostname::canonical_on(once.as_str(), BOX);
            assert_eq!(once, twice, "raw={raw}");
        }
    }

    #[test]
    fn only_first_separator_splits() {
        let h = Hostname::canonical_on("a@b@c", BOX);
        assert_eq!(h.node(), "a");
        assert_eq!(h.host(), "b@c");
    }

    #[test]
    fn machine_without_domain() {
        assert_eq!(Hostname::canonical_on("w@%n-%d", "solo").as_str(), "w@solo-");
    }
}
