// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Catalog Agent
//!
//! An [`Agent`] is a marketplace entry supplied by the external catalog. The
//! orchestration core only ever reads agents: it keys deployments by
//! [`AgentId`] and copies `name`/`icon` onto workflow nodes at attach time.

use serde::{Deserialize, Serialize};

/// Category sentinel meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";

/// Stable catalog identifier (e.g. `code-assistant`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marketplace agent definition. Immutable to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub icon: String,
    pub category: String,

    /// Monthly price in whole currency units; `0` is free.
    #[serde(default)]
    pub price: u32,

    #[serde(default)]
    pub vendor: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub rating: f32,

    #[serde(default)]
    pub reviews: u32,
}

impl Agent {
    pub fn is_free(&self) -> bool {
        self.price == 0
    }
}

/// Catalog query: exact category plus case-insensitive free-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub search: Option<String>,
}

impl CatalogFilter {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Whether `agent` passes both the category and the search clause.
    pub fn matches(&self, agent: &Agent) -> bool {
        let category_ok = match self.category.as_deref().map(str::trim) {
            None | Some("") | Some(ALL_CATEGORIES) => true,
            Some(category) => agent.category.eq_ignore_ascii_case(category),
        };
        if !category_ok {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [&agent.name, &agent.description, &agent.vendor, &agent.category]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, name: &str, category: &str) -> Agent {
        Agent {
            id: AgentId::from(id),
            name: name.to_string(),
            icon: "🤖".to_string(),
            category: category.to_string(),
            price: 0,
            vendor: "Acme AI".to_string(),
            description: format!("{} helper", name),
            rating: 4.5,
            reviews: 10,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = CatalogFilter::default();
        assert!(filter.matches(&agent("a", "CodeBot", "Development")));
    }

    #[test]
    fn all_category_is_not_a_filter() {
        let filter = CatalogFilter::default().category(ALL_CATEGORIES);
        assert!(filter.matches(&agent("a", "CodeBot", "Development")));
        assert!(filter.matches(&agent("b", "Painter", "Creative")));
    }

    #[test]
    fn category_filter_is_exact() {
        let filter = CatalogFilter::default().category("Data");
        assert!(filter.matches(&agent("a", "Analyst", "Data")));
        assert!(!filter.matches(&agent("b", "Data Painter", "Creative")));
    }

    #[test]
    fn search_is_case_insensitive_over_text_fields() {
        let filter = CatalogFilter::default().search("acme");
        assert!(filter.matches(&agent("a", "CodeBot", "Development")));

        let filter = CatalogFilter::default().search("CODEBOT");
        assert!(filter.matches(&agent("a", "CodeBot", "Development")));

        let filter = CatalogFilter::default().search("nothing-like-this");
        assert!(!filter.matches(&agent("a", "CodeBot", "Development")));
    }

    #[test]
    fn agent_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&AgentId::from("code-assistant")).unwrap();
        assert_eq!(json, "\"code-assistant\"");
    }
}
