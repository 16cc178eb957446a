//! Owned-tree listing and lookup by name.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::GedcomError;
use crate::json::string_or_number;
use crate::session::SiteSession;

/// One tree as reported by the owned-trees API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub owner_user_id: String,
    #[serde(default)]
    pub date_modified: String,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub total_invited_count: i64,
}

#[derive(Debug, Deserialize)]
struct TreeList {
    trees: Vec<TreeInfo>,
    #[serde(default)]
    count: u64,
}

/// Trees keyed by lower-cased name.
///
/// Names that collide case-insensitively keep the last tree seen.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    by_name: HashMap<String, TreeInfo>,
}

impl TreeIndex {
    #[must_use]
    pub fn from_trees(trees: impl IntoIterator<Item = TreeInfo>) -> Self {
        let by_name = trees
            .into_iter()
            .map(|tree| (tree.name.to_lowercase(), tree))
            .collect();
        Self { by_name }
    }

    /// Number of distinct (case-insensitive) names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Looks up a tree by name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::TreeNotFound`] when no tree has that name.
    pub fn find(&self, name: &str) -> Result<&TreeInfo, GedcomError> {
        self.by_name
            .get(&name.to_lowercase())
            .ok_or_else(|| GedcomError::tree_not_found(name))
    }
}

/// Fetches the trees owned by the logged-in account.
///
/// # Errors
///
/// Returns [`GedcomError::HttpStatus`], a transport error, or
/// [`GedcomError::Decode`] for an unexpected payload.
#[instrument(skip(session))]
pub async fn list_trees(session: &SiteSession) -> Result<TreeIndex, GedcomError> {
    let url = session.endpoints().trees();
    let list: TreeList = session.get_json(&url, &[("rights", "own")]).await?;
    debug!(reported = list.count, received = list.trees.len(), "owned trees listed");

    let index = TreeIndex::from_trees(list.trees);
    info!("Found {} trees for Ancestry.com account.", index.len());
    Ok(index)
}
