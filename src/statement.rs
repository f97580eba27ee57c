// Statement assembly from presentation trees and facts
use crate::diagnostics::Diagnostics;
use crate::instance::FactIndex;
use crate::label;
use crate::model::{ConceptId, Context, Decimals, PeriodKey};
use crate::standard::{MappingPass, StandardConcept, StatementType};
use crate::tree::Tree;
use chrono::NaiveDate;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One reported value in a statement column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    /// `None` for text facts and numeric facts that failed coercion.
    pub value: Option<f64>,
    pub raw: String,
    pub decimals: Option<Decimals>,
    pub context_id: CompactString,
}

/// A value displaced by a more recent filing for the same row and period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorValue {
    pub value: Option<f64>,
    pub raw: String,
    pub filing_date: Option<NaiveDate>,
    pub accession: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub concept: ConceptId,
    pub label: String,
    pub standard: Option<StandardConcept>,
    pub standard_label: Option<&'static str>,
    pub depth: usize,
    pub is_abstract: bool,
    /// Abstract with no value anywhere below it; renderers may hide it.
    pub elidable: bool,
    pub values: BTreeMap<PeriodKey, Cell>,
    pub prior_values: BTreeMap<PeriodKey, Vec<PriorValue>>,
}

impl Row {
    pub fn value(&self, period: &PeriodKey) -> Option<f64> {
        self.values.get(period).and_then(|cell| cell.value)
    }

    pub fn decimals(&self, period: &PeriodKey) -> Option<Decimals> {
        self.values.get(period).and_then(|cell| cell.decimals)
    }

    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }

    /// Label used for display: the standard one when mapped.
    pub fn display_label(&self) -> &str {
        self.standard_label.unwrap_or(&self.label)
    }
}

/// Where a statement came from; drives recency when stitching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilingMeta {
    pub accession: Option<String>,
    pub form: Option<String>,
    pub filing_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub statement_type: StatementType,
    pub role: Option<CompactString>,
    pub entity: Option<String>,
    pub filing: FilingMeta,
    /// Column order: newest end date first.
    pub periods: Vec<PeriodKey>,
    pub rows: Vec<Row>,
    pub diagnostics: Diagnostics,
}

impl Statement {
    pub fn row(&self, concept: &str) -> Option<&Row> {
        self.rows.iter().find(|row| row.concept.as_str() == concept)
    }

    pub fn row_by_standard(&self, standard: StandardConcept) -> Option<&Row> {
        self.rows.iter().find(|row| row.standard == Some(standard))
    }

    /// Latest period end covered by the statement.
    pub fn latest_period_end(&self) -> Option<NaiveDate> {
        self.periods.iter().filter_map(|p| p.period().end_date()).max()
    }

    /// Ordering key for "most recently filed": filing date, then latest period.
    pub fn recency(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        (self.filing.filing_date, self.latest_period_end())
    }
}

/// Rows for one context: one per tree node in depth-first order, none
/// dropped. The synthetic wrapper of a multi-root tree is not a row.
pub fn assemble(
    tree: &Tree,
    facts: &FactIndex<'_>,
    context: &Context,
    mapping: &MappingPass<'_>,
) -> Vec<Row> {
    build_rows(tree, facts, Some(context), mapping)
}

/// Assembles the same tree once per context and merges the columns. Rows
/// line up by position since every pass walks the same tree.
pub fn assemble_columns(
    tree: &Tree,
    facts: &FactIndex<'_>,
    contexts: &[&Context],
    mapping: &MappingPass<'_>,
) -> Vec<Row> {
    let mut columns = contexts.iter().map(|context| assemble(tree, facts, context, mapping));
    let Some(mut merged) = columns.next() else {
        return build_rows(tree, facts, None, mapping);
    };
    for column in columns {
        for (row, other) in merged.iter_mut().zip(column) {
            row.values.extend(other.values);
            row.elidable &= other.elidable;
        }
    }
    merged
}

fn build_rows(
    tree: &Tree,
    facts: &FactIndex<'_>,
    context: Option<&Context>,
    mapping: &MappingPass<'_>,
) -> Vec<Row> {
    let order = tree.depth_first();
    let fact_for = |concept: &str| {
        context
            .and_then(|context| facts.get(concept, &context.id))
            .filter(|fact| !fact.nil)
    };

    // Bottom-up: does anything at or below each node carry a value?
    let mut has_value = vec![false; tree.len()];
    for &id in order.iter().rev() {
        let node = tree.node(id);
        has_value[id] = fact_for(&node.concept).is_some()
            || node.children.iter().any(|&child| has_value[child]);
    }

    order
        .into_iter()
        .map(|id| {
            let node = tree.node(id);
            let label = node
                .label
                .clone()
                .unwrap_or_else(|| label::humanize(&node.concept));
            let standard = if node.is_abstract {
                None
            } else {
                mapping.map(&node.concept, &label)
            };

            let mut values = BTreeMap::new();
            if let (Some(fact), Some(context)) = (fact_for(&node.concept), context) {
                values.insert(
                    PeriodKey(context.period.clone()),
                    Cell {
                        value: fact.numeric_value,
                        raw: fact.raw_value.clone(),
                        decimals: fact.decimals,
                        context_id: context.id.clone(),
                    },
                );
            }

            Row {
                concept: node.concept.clone(),
                label,
                standard,
                standard_label: standard.map(StandardConcept::label),
                depth: node.depth,
                is_abstract: node.is_abstract,
                elidable: node.is_abstract && !has_value[id],
                values,
                prior_values: BTreeMap::new(),
            }
        })
        .collect()
}
