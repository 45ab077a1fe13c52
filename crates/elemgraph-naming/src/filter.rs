//! Fetch-pipeline filters.

use tracing::debug;

use elemgraph_core::Element;

use crate::config::NamingConfig;
use crate::error::NamingResult;
use crate::resolver::{NameResolver, NamingReport};

/// A step run over the fetched elements before they are persisted.
///
/// Filters mutate the batch in place. They never add or remove elements.
pub trait FetchFilter: Send + Sync {
    /// Unique name for this filter.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str {
        ""
    }

    /// Process the fetched elements.
    fn on_fetch(&self, elements: &mut [Element]) -> NamingResult<()>;
}

/// Renames instances from their referenced instances' names.
#[derive(Debug, Clone)]
pub struct ReferencedInstanceNames {
    config: NamingConfig,
}

impl ReferencedInstanceNames {
    pub fn new(config: NamingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NamingConfig {
        &self.config
    }

    /// Like [`FetchFilter::on_fetch`], but returns the run's report.
    pub fn run(&self, elements: &mut [Element]) -> NamingResult<NamingReport> {
        NameResolver::new(&self.config).resolve(elements)
    }
}

impl FetchFilter for ReferencedInstanceNames {
    fn name(&self) -> &str {
        "referenced_instance_names"
    }

    fn description(&self) -> &str {
        "Name instances after the instances they reference"
    }

    fn on_fetch(&self, elements: &mut [Element]) -> NamingResult<()> {
        let report = self.run(elements)?;
        debug!(filter = self.name(), renamed = report.renamed.len(), "Filter finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypeNamingConfig;
    use elemgraph_core::{InstanceElement, Value, ValueMap};

    #[test]
    fn test_filter_renames_in_place() {
        let mut value = ValueMap::new();
        value.insert("name".into(), Value::from("Desktop"));
        let mut elements: Vec<Element> = vec![
            InstanceElement::new("a", "folder", "f", value).into(),
        ];

        let config = NamingConfig::default()
            .with_type("folder", TypeNamingConfig::new(["&owner", "name"]));
        let filter = ReferencedInstanceNames::new(config);
        filter.on_fetch(&mut elements).unwrap();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].elem_id().name(), "_Desktop");
    }

    #[test]
    fn test_invalid_config_fails_the_filter() {
        let config = NamingConfig::default().with_type("t", TypeNamingConfig::default());
        let filter = ReferencedInstanceNames::new(config);
        let mut elements: Vec<Element> = Vec::new();
        assert!(filter.on_fetch(&mut elements).is_err());
    }
}
