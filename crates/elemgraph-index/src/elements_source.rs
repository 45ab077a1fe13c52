//! Read access to the full current element set.

use async_trait::async_trait;

use elemgraph_core::{Change, Element, ElementGraph};

use crate::error::IndexResult;

/// Source of every element currently in the workspace.
#[async_trait]
pub trait ElementsSource: Send + Sync {
    async fn get_all(&self) -> IndexResult<Vec<Element>>;
}

#[async_trait]
impl ElementsSource for ElementGraph {
    async fn get_all(&self) -> IndexResult<Vec<Element>> {
        Ok(self.elements.clone())
    }
}

#[async_trait]
impl ElementsSource for Vec<Element> {
    async fn get_all(&self) -> IndexResult<Vec<Element>> {
        Ok(self.clone())
    }
}

/// One addition per element of `source`, used to rebuild an index from scratch.
pub async fn all_elements_changes(source: &dyn ElementsSource) -> IndexResult<Vec<Change>> {
    Ok(source
        .get_all()
        .await?
        .into_iter()
        .map(Change::addition)
        .collect())
}
