//! Node properties file rendering and parsing.
//!
//! The external node program reads a flat `key=value` file, one pair per
//! line, no quoting, no comments. The `boostrap_server_ip` and
//! `boostrap_server_port` keys are spelled exactly as the node program's
//! parser expects them; the missing `t` is part of the wire format and must
//! not be corrected here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::BootstrapAddress;
use crate::error::{FleetError, Result};

const KEY_CACHE_DIR: &str = "cache_dir";
const KEY_LOCAL_DIR: &str = "local_dir";
const KEY_CACHE_SIZE: &str = "cache_size";
const KEY_PORT: &str = "port";
const KEY_BOOTSTRAP_IP: &str = "boostrap_server_ip";
const KEY_BOOTSTRAP_PORT: &str = "boostrap_server_port";

/// The values written into one node's `.properties` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeProperties {
    pub cache_dir: PathBuf,
    pub local_dir: PathBuf,
    pub cache_size: u64,
    pub port: u16,
    pub bootstrap: BootstrapAddress,
}

impl NodeProperties {
    /// Render to the flat `key=value` format, every line newline-terminated.
    pub fn render(&self) -> String {
        format!(
            "{}={}\n{}={}\n{}={}\n{}={}\n{}={}\n{}={}\n",
            KEY_CACHE_DIR,
            self.cache_dir.display(),
            KEY_LOCAL_DIR,
            self.local_dir.display(),
            KEY_CACHE_SIZE,
            self.cache_size,
            KEY_PORT,
            self.port,
            KEY_BOOTSTRAP_IP,
            self.bootstrap.host,
            KEY_BOOTSTRAP_PORT,
            self.bootstrap.port,
        )
    }

    /// Parse a rendered properties file back into its values.
    ///
    /// Line order is not significant; every key must be present.
    pub fn parse(text: &str) -> Result<Self> {
        let mut pairs = HashMap::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                FleetError::properties(format!("line {}: expected key=value, got {:?}", lineno + 1, line))
            })?;
            pairs.insert(key.to_string(), value.to_string());
        }

        let take = |key: &str| -> Result<String> {
            pairs
                .get(key)
                .cloned()
                .ok_or_else(|| FleetError::properties(format!("missing key {:?}", key)))
        };
        let numeric = |key: &str, value: &str| {
            FleetError::properties(format!("key {:?} is not numeric: {:?}", key, value))
        };

        let cache_size = take(KEY_CACHE_SIZE)?;
        let cache_size = cache_size
            .parse::<u64>()
            .map_err(|_| numeric(KEY_CACHE_SIZE, &cache_size))?;
        let port = take(KEY_PORT)?;
        let port = port
            .parse::<u16>()
            .map_err(|_| numeric(KEY_PORT, &port))?;
        let bootstrap_port = take(KEY_BOOTSTRAP_PORT)?;
        let bootstrap_port = bootstrap_port
            .parse::<u16>()
            .map_err(|_| numeric(KEY_BOOTSTRAP_PORT, &bootstrap_port))?;

        Ok(Self {
            cache_dir: PathBuf::from(take(KEY_CACHE_DIR)?),
            local_dir: PathBuf::from(take(KEY_LOCAL_DIR)?),
            cache_size,
            port,
            bootstrap: BootstrapAddress {
                host: take(KEY_BOOTSTRAP_IP)?,
                port: bootstrap_port,
            },
        })
    }

    /// Parse the properties file at `path`.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NodeProperties {
        NodeProperties {
            cache_dir: PathBuf::from("/tmp/fleet/node3/cache_storage"),
            local_dir: PathBuf::from("/tmp/fleet/node3/local_storage"),
            cache_size: 10_000_000,
            port: 1238,
            bootstrap: BootstrapAddress {
                host: "127.0.0.1".to_string(),
                port: 55555,
            },
        }
    }

    #[test]
    fn test_render_preserves_wire_spelling() {
        let rendered = sample().render();
        assert!(rendered.contains("boostrap_server_ip=127.0.0.1\n"));
        assert!(rendered.contains("boostrap_server_port=55555\n"));
        assert!(!rendered.contains("bootstrap_server"));
        assert!(rendered.ends_with('\n'));
    }

    #[test]
    fn test_render_parse_roundtrip() {
        let props = sample();
        let parsed = NodeProperties::parse(&props.render()).unwrap();
        assert_eq!(parsed, props);
    }

    #[test]
    fn test_parse_accepts_any_line_order() {
        let text = "port=2000\nboostrap_server_port=55555\ncache_size=42\n\
                    local_dir=/l\ncache_dir=/c\nboostrap_server_ip=10.0.0.1\n";
        let parsed = NodeProperties::parse(text).unwrap();
        assert_eq!(parsed.port, 2000);
        assert_eq!(parsed.cache_dir, PathBuf::from("/c"));
        assert_eq!(parsed.bootstrap.host, "10.0.0.1");
    }

    #[test]
    fn test_parse_rejects_missing_bootstrap_ip() {
        // Numeric keys all present, so the ip key is the first one missing
        let text = "cache_dir=/c\nlocal_dir=/l\ncache_size=1\nport=1236\n\
                    boostrap_server_port=55555\n";
        let err = NodeProperties::parse(text).unwrap_err();
        assert!(err.to_string().contains("boostrap_server_ip"));
    }

    #[test]
    fn test_parse_rejects_missing_bootstrap_port() {
        let text = "cache_dir=/c\nlocal_dir=/l\ncache_size=1\nport=1236\n\
                    boostrap_server_ip=127.0.0.1\n";
        let err = NodeProperties::parse(text).unwrap_err();
        assert!(err.to_string().contains("boostrap_server_port"));
    }

    #[test]
    fn test_parse_rejects_garbage_line() {
        let err = NodeProperties::parse("not a pair\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_rejects_non_numeric_port() {
        let text = "cache_dir=/c\nlocal_dir=/l\ncache_size=1\nport=high\n\
                    boostrap_server_ip=h\nboostrap_server_port=1\n";
        let err = NodeProperties::parse(text).unwrap_err();
        assert!(err.to_string().contains("port"));
    }
}
