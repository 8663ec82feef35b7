//! Query cache keys.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of a cached query result, e.g. `settings:pathao` or `sale:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(String);

impl QueryKey {
    /// Key of a settings category read.
    pub fn settings(category: &str) -> Self {
        Self(format!("settings:{}", category))
    }

    /// Key of the sales list.
    pub fn sales() -> Self {
        Self("sales".to_string())
    }

    /// Key of a single sale.
    pub fn sale(sale_id: Uuid) -> Self {
        Self(format!("sale:{}", sale_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formats() {
        let id = Uuid::parse_str("0b6e7c52-1a6f-4bb1-9d3e-6f1f62b1c0aa").unwrap();
        assert_eq!(QueryKey::settings("pathao").as_str(), "settings:pathao");
        assert_eq!(QueryKey::sales().as_str(), "sales");
        assert_eq!(
            QueryKey::sale(id).to_string(),
            "sale:0b6e7c52-1a6f-4bb1-9d3e-6f1f62b1c0aa"
        );
    }

    #[test]
    fn test_key_serializes_as_string() {
        let json = serde_json::to_string(&QueryKey::sales()).unwrap();
        assert_eq!(json, "\"sales\"");
    }
}
