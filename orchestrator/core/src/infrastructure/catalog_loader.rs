// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent Catalog YAML Loader
//!
//! Parses marketplace catalog files into [`Agent`] values and builds the
//! read-only [`InMemoryAgentCatalog`].
//!
//! # Catalog Format
//!
//! ```yaml
//! agents:
//!   - id: code-reviewer
//!     name: Code Reviewer
//!     icon: "🧑‍💻"
//!     category: Development
//!     vendor: DevTools Inc.
//!     description: Reviews pull requests.
//!     rating: 4.8
//!     reviews: 1243
//!     price: 0
//! ```

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::domain::agent::Agent;
use crate::infrastructure::repositories::InMemoryAgentCatalog;

const BUILTIN_CATALOG: &str = include_str!("../../catalog/default-catalog.yaml");

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    agents: Vec<Agent>,
}

pub struct CatalogLoader;

impl CatalogLoader {
    /// Parse a catalog from YAML and validate every entry
    pub fn parse_yaml(yaml: &str) -> Result<Vec<Agent>> {
        let document: CatalogDocument =
            serde_yaml::from_str(yaml).context("Failed to parse catalog YAML")?;

        for (index, agent) in document.agents.iter().enumerate() {
            Self::validate(agent).map_err(|e| anyhow!("Catalog entry #{} is invalid: {}", index, e))?;
        }
        Ok(document.agents)
    }

    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<Agent>> {
        let yaml = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read catalog file: {}", path.as_ref().display()))?;
        Self::parse_yaml(&yaml)
    }

    /// The catalog shipped with the crate
    pub fn builtin() -> Result<Vec<Agent>> {
        Self::parse_yaml(BUILTIN_CATALOG)
    }

    /// Catalog from `path` when given, otherwise the built-in one
    pub fn load(path: Option<&Path>) -> Result<InMemoryAgentCatalog> {
        let agents = match path {
            Some(path) => {
                tracing::info!("Loading agent catalog from {}", path.display());
                Self::parse_file(path)?
            }
            None => Self::builtin()?,
        };
        tracing::info!("Agent catalog loaded with {} agents", agents.len());
        Ok(InMemoryAgentCatalog::new(agents))
    }

    fn validate(agent: &Agent) -> Result<()> {
        if agent.id.as_str().trim().is_empty() {
            return Err(anyhow!("id cannot be empty"));
        }
        if agent.name.trim().is_empty() {
            return Err(anyhow!("name cannot be empty"));
        }
        if agent.category.trim().is_empty() {
            return Err(anyhow!("category cannot be empty"));
        }
        if !(0.0..=5.0).contains(&agent.rating) {
            return Err(anyhow!("rating must be between 0 and 5"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentId, CatalogFilter};
    use crate::domain::repository::AgentCatalog;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog_covers_marketplace_categories() {
        let agents = CatalogLoader::builtin().unwrap();
        for category in ["Development", "Data", "Creative", "Security", "Productivity", "Communication"] {
            assert!(
                agents.iter().any(|a| a.category == category),
                "missing category {}",
                category
            );
        }
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let yaml = r#"
agents:
  - id: ""
    name: Nameless
    icon: "?"
    category: Data
"#;
        assert!(CatalogLoader::parse_yaml(yaml).is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "agents:\n  - id: solo\n    name: Solo\n    icon: \"🤖\"\n    category: Data\n    price: 5"
        )
        .unwrap();

        let catalog = CatalogLoader::load(Some(file.path())).unwrap();
        assert_eq!(catalog.len(), 1);
        let solo = catalog.find_by_id(&AgentId::from("solo")).await.unwrap().unwrap();
        assert_eq!(solo.price, 5);
        assert!(catalog
            .list(&CatalogFilter::default().category("Creative"))
            .await
            .unwrap()
            .is_empty());
    }
}
