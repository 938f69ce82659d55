use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of the document root. Every snapshot shares it.
pub const ROOT_KEY: &str = "root";

/// Opaque node identifier, stable across snapshots of the same logical node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn root() -> Self {
        Self(ROOT_KEY.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_KEY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Generate a document seed from its name using CRC32
pub fn get_document_seed(name: &str) -> String {
    let mut buff = String::from(name);
    if !name.starts_with("doc://") {
        buff = format!("doc://{}", buff);
    }

    let mut hasher = Hasher::new();
    hasher.update(buff.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential key generator for the nodes of one editing session
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    seed: String,
    count: u64,
}

impl KeyGenerator {
    pub fn new(document_name: &str) -> Self {
        Self {
            seed: get_document_seed(document_name),
            count: 0,
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    /// Generate next sequential key
    pub fn next_key(&mut self) -> NodeKey {
        self.count += 1;
        NodeKey(format!("{}-{}", self.seed, self.count))
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Number of keys handed out so far
    pub fn issued(&self) -> u64 {
        self.count
    }
}
