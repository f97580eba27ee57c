// Filing orchestration: sources in, resolved networks and statements out
use crate::calculation::build_calculation_trees;
use crate::config::EngineConfig;
use crate::context::ResolutionContext;
use crate::diagnostics::{Diagnostics, Inconsistency, UnmappedConcept};
use crate::instance::{parse_instance, FactIndex};
use crate::label::LabelSet;
use crate::linkbase::LinkbaseProcessor;
use crate::model::{Context, Instance, Period, PeriodKey};
use crate::network::{collect_roles, Network};
use crate::presentation::build_presentation_trees;
use crate::relationship::{EffectiveRelationships, LinkKind};
use crate::schema::{parse_schema, ElementCatalog, RoleType};
use crate::standard::{ConceptMapper, StatementType};
use crate::statement::{assemble_columns, FilingMeta, Statement};
use crate::tree::Tree;
use crate::validator::{self, CalculationValidator, ValidationReport};
use crate::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Durations within this many days of the newest column count as the same length.
const DURATION_SLACK_DAYS: i64 = 45;

/// Already-loaded documents of one filing. Nothing here touches the disk.
#[derive(Debug, Clone, Default)]
pub struct FilingSources<'a> {
    pub instance: &'a [u8],
    pub schemas: Vec<&'a [u8]>,
    pub linkbases: Vec<&'a [u8]>,
    /// Element metadata supplied by the caller, merged under the schemas'.
    pub elements: Option<ElementCatalog>,
    pub meta: FilingMeta,
}

impl<'a> FilingSources<'a> {
    pub fn new(instance: &'a [u8]) -> Self {
        Self {
            instance,
            ..Self::default()
        }
    }

    pub fn with_schema(mut self, schema: &'a [u8]) -> Self {
        self.schemas.push(schema);
        self
    }

    pub fn with_linkbase(mut self, linkbase: &'a [u8]) -> Self {
        self.linkbases.push(linkbase);
        self
    }

    pub fn with_elements(mut self, elements: ElementCatalog) -> Self {
        self.elements = Some(elements);
        self
    }

    pub fn with_meta(mut self, meta: FilingMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// Parses filings into [`Filing`]s. One parser, and so one concept mapper,
/// is meant to be shared by every filing of a run.
pub struct FilingParser {
    config: EngineConfig,
    mapper: Arc<ConceptMapper>,
}

impl Default for FilingParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FilingParser {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let mapper = Arc::new(ConceptMapper::with_overrides(&config.concept_overrides));
        Self { config, mapper }
    }

    pub fn with_mapper(mut self, mapper: Arc<ConceptMapper>) -> Self {
        for o in &self.config.concept_overrides {
            mapper.learn(o.statement_type, &o.concept, o.standard);
        }
        self.mapper = mapper;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mapper(&self) -> &Arc<ConceptMapper> {
        &self.mapper
    }

    /// Parses one filing. Structural errors in any document abort the whole
    /// filing; everything recoverable lands in the filing's diagnostics.
    pub fn parse(&self, sources: &FilingSources<'_>) -> Result<Filing> {
        let mut diagnostics = Diagnostics::new();
        let instance = parse_instance(sources.instance, &mut diagnostics)?;

        let mut elements = sources.elements.clone().unwrap_or_default();
        let mut declared = Vec::new();
        for schema in &sources.schemas {
            let info = parse_schema(schema)?;
            elements.merge(info.elements);
            declared.extend(info.role_types);
        }

        let mut linkbases = LinkbaseProcessor::with_language(&self.config.label_language);
        for linkbase in &sources.linkbases {
            linkbases.parse_linkbase(linkbase)?;
        }
        let roles = collect_roles(&declared, linkbases.role_refs());
        let (presentation, calculation, labels) = linkbases.into_parts();

        // Grouping needs the full relationship list before any tree is built
        let presentation = EffectiveRelationships::resolve(&presentation, &mut diagnostics);
        let calculation = EffectiveRelationships::resolve(&calculation, &mut diagnostics);

        let ctx = ResolutionContext::new(&elements, &labels, &self.mapper, &self.config);
        let presentation = Network::new(
            LinkKind::Presentation,
            build_presentation_trees(&presentation, &roles, &ctx),
        );
        let calculation = Network::new(
            LinkKind::Calculation,
            build_calculation_trees(&calculation, &roles, &ctx, &mut diagnostics),
        );

        {
            let facts = FactIndex::new(&instance.facts);
            let tolerance = self.config.tolerance;
            for tree in calculation.ordered() {
                for found in validator::check(tree, &facts, &instance.contexts, tolerance) {
                    diagnostics.inconsistency(found);
                }
            }
        }

        tracing::debug!(
            facts = instance.facts.len(),
            contexts = instance.contexts.len(),
            presentation_roles = presentation.len(),
            calculation_roles = calculation.len(),
            diagnostics = diagnostics.len(),
            "filing parsed"
        );

        Ok(Filing {
            meta: sources.meta.clone(),
            instance,
            elements,
            labels,
            roles,
            presentation,
            calculation,
            diagnostics,
            mapper: Arc::clone(&self.mapper),
            config: self.config.clone(),
        })
    }

    /// Parses independent filings, in parallel with the `parallel` feature.
    /// Results come back in input order.
    pub fn parse_many(&self, sources: &[FilingSources<'_>]) -> Vec<Result<Filing>> {
        #[cfg(feature = "parallel")]
        if self.config.parallel {
            use rayon::prelude::*;
            return sources.par_iter().map(|s| self.parse(s)).collect();
        }
        sources.iter().map(|s| self.parse(s)).collect()
    }
}

/// One parsed filing with its resolved networks.
pub struct Filing {
    pub meta: FilingMeta,
    pub instance: Instance,
    pub elements: ElementCatalog,
    pub labels: LabelSet,
    pub roles: Vec<RoleType>,
    pub presentation: Network,
    pub calculation: Network,
    pub diagnostics: Diagnostics,
    mapper: Arc<ConceptMapper>,
    config: EngineConfig,
}

impl Filing {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> ResolutionContext<'_> {
        ResolutionContext::new(&self.elements, &self.labels, &self.mapper, &self.config)
    }

    /// Presentation tree of the lowest-ordered role classified as `statement_type`.
    pub fn statement_role(&self, statement_type: StatementType) -> Option<&Tree> {
        self.presentation
            .ordered()
            .into_iter()
            .find(|tree| {
                let definition = tree.role.definition.as_deref();
                StatementType::classify_role(&tree.role.uri, definition) == Some(statement_type)
            })
    }

    /// Statement types this filing has a presentation role for.
    pub fn statement_types(&self) -> Vec<StatementType> {
        StatementType::ALL
            .into_iter()
            .filter(|&st| self.statement_role(st).is_some())
            .collect()
    }

    /// Assembles one multi-period statement, or `None` when the filing has
    /// no role of that type.
    pub fn statement(&self, statement_type: StatementType) -> Option<Statement> {
        let tree = self.statement_role(statement_type)?;
        let facts = FactIndex::new(&self.instance.facts);
        let columns = self.select_columns(tree, &facts, statement_type);

        let entity = self
            .instance
            .entity_info
            .central_index_key
            .as_deref()
            .or(self.instance.entity_info.identifier.as_deref())
            .unwrap_or_default();
        let mapping = self.mapper.pass(entity, statement_type);
        let rows = assemble_columns(tree, &facts, &columns, &mapping);

        let mut diagnostics = self.diagnostics.clone();
        for row in rows.iter().filter(|row| !row.is_abstract && row.standard.is_none()) {
            diagnostics.unmapped_concept(UnmappedConcept {
                concept: row.concept.clone(),
                statement_type,
            });
        }

        let entity = self
            .instance
            .entity_info
            .registrant_name
            .clone()
            .or_else(|| self.instance.entity_info.identifier.as_ref().map(|id| id.to_string()));

        tracing::debug!(
            statement = ?statement_type,
            role = %tree.role.uri,
            rows = rows.len(),
            periods = columns.len(),
            "statement assembled"
        );

        Some(Statement {
            statement_type,
            role: Some(tree.role.uri.clone()),
            entity,
            filing: self.meta.clone(),
            periods: columns.iter().map(|c| PeriodKey(c.period.clone())).collect(),
            rows,
            diagnostics,
        })
    }

    /// Every statement type the filing carries, in [`StatementType::ALL`] order.
    pub fn statements(&self) -> Vec<Statement> {
        StatementType::ALL
            .into_iter()
            .filter_map(|st| self.statement(st))
            .collect()
    }

    pub fn check_calculations(&self) -> Vec<Inconsistency> {
        let facts = FactIndex::new(&self.instance.facts);
        let tolerance = self.config.tolerance;
        self.calculation
            .ordered()
            .into_iter()
            .flat_map(|tree| validator::check(tree, &facts, &self.instance.contexts, tolerance))
            .collect()
    }

    /// Full calculation report; with `strict` configured, inconsistencies are an error.
    pub fn validate(&self) -> Result<ValidationReport> {
        let mut validator = CalculationValidator::new().with_tolerance(self.config.tolerance);
        if self.config.strict {
            validator = validator.strict();
        }
        let facts = FactIndex::new(&self.instance.facts);
        validator.validate(
            self.calculation.ordered(),
            &facts,
            &self.instance.contexts,
            &self.diagnostics.weight_mismatches,
        )
    }

    /// One context per column: non-dimensional, of the statement's period
    /// kind, reporting at least one tree concept. Newest first, capped at
    /// `max_periods`. Where several contexts share a period the one with the
    /// most relevant facts wins, then the lowest id.
    fn select_columns(
        &self,
        tree: &Tree,
        facts: &FactIndex<'_>,
        statement_type: StatementType,
    ) -> Vec<&Context> {
        let wants_instant = statement_type.prefers_instants();
        let concepts: Vec<&str> = tree.concepts().map(|c| c.as_str()).collect();

        let mut by_period: BTreeMap<PeriodKey, (&Context, usize)> = BTreeMap::new();
        for context in self.instance.contexts.values() {
            if context.is_dimensional() || matches!(context.period, Period::Forever) {
                continue;
            }
            if context.period.is_instant() != wants_instant {
                continue;
            }
            let reported = concepts
                .iter()
                .filter(|concept| facts.has_fact(concept, &context.id))
                .count();
            if reported == 0 {
                continue;
            }
            let key = PeriodKey(context.period.clone());
            match by_period.get(&key) {
                Some(&(_, best)) if best >= reported => {}
                _ => {
                    by_period.insert(key, (context, reported));
                }
            }
        }

        let mut columns: Vec<&Context> =
            by_period.into_values().map(|(context, _)| context).collect();
        if !wants_instant {
            if let Some(length) = columns.first().and_then(|c| c.period.duration_days()) {
                columns.retain(|c| {
                    c.period
                        .duration_days()
                        .is_some_and(|days| (days - length).abs() <= DURATION_SLACK_DAYS)
                });
            }
        }
        columns.truncate(self.config.max_periods);
        columns
    }
}
