use crate::config::EngineConfig;
use crate::label::LabelSet;
use crate::schema::ElementCatalog;
use crate::standard::ConceptMapper;

/// Read-only inputs shared by every resolution step of one filing.
#[derive(Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub elements: &'a ElementCatalog,
    pub labels: &'a LabelSet,
    pub mapper: &'a ConceptMapper,
    pub config: &'a EngineConfig,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(
        elements: &'a ElementCatalog,
        labels: &'a LabelSet,
        mapper: &'a ConceptMapper,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            elements,
            labels,
            mapper,
            config,
        }
    }
}
