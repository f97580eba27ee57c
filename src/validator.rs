// Calculation consistency validation
use crate::diagnostics::{Contribution, Inconsistency, WeightMismatch};
use crate::instance::FactIndex;
use crate::model::Context;
use crate::tree::{NodeId, Tree};
use crate::{Error, Result};
use ahash::AHashSet;
use compact_str::CompactString;
use serde::Serialize;
use std::collections::BTreeMap;

/// Checks one calculation tree against reported facts.
///
/// Every context is checked on its own, by exact id, so dimensional and
/// non-dimensional facts of the same concept never mix. A node is checked
/// when it has a reported value and at least one child that resolved to a
/// value; children without a value of their own or below them are left out
/// of the sum rather than counted as zero. A parent without a reported value
/// passes its computed sum up to its own parent. A concept placed under
/// several parents is reported at most once per context.
pub fn check(
    tree: &Tree,
    facts: &FactIndex<'_>,
    contexts: &BTreeMap<CompactString, Context>,
    tolerance: f64,
) -> Vec<Inconsistency> {
    let mut found = Vec::new();
    for context_id in contexts.keys() {
        let mut pass = ContextPass {
            tree,
            facts,
            context_id,
            tolerance,
            reported: AHashSet::new(),
        };
        pass.evaluate(tree.root_id(), &mut found);
    }
    found
}

struct ContextPass<'a, 'f> {
    tree: &'a Tree,
    facts: &'a FactIndex<'f>,
    context_id: &'a CompactString,
    tolerance: f64,
    reported: AHashSet<&'a str>,
}

impl<'a> ContextPass<'a, '_> {
    fn evaluate(&mut self, id: NodeId, found: &mut Vec<Inconsistency>) -> Option<f64> {
        let tree = self.tree;
        let node = tree.node(id);
        let reported = if node.synthetic {
            None
        } else {
            self.facts.value(&node.concept, self.context_id)
        };

        let mut calculated = 0.0;
        let mut contributors = Vec::new();
        for &child_id in &node.children {
            if let Some(value) = self.evaluate(child_id, found) {
                let child = tree.node(child_id);
                let weight = child.weight.unwrap_or(1.0);
                calculated += value * weight;
                contributors.push(Contribution {
                    concept: child.concept.clone(),
                    value,
                    weight,
                });
            }
        }

        if contributors.is_empty() {
            return reported;
        }
        let Some(reported) = reported else {
            return Some(calculated);
        };

        let difference = (reported - calculated).abs();
        if difference > self.tolerance && self.reported.insert(node.concept.as_str()) {
            found.push(Inconsistency {
                role: tree.role.uri.clone(),
                parent: node.concept.clone(),
                context_id: self.context_id.clone(),
                reported,
                calculated,
                difference,
                contributors,
            });
        }
        Some(reported)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationStats {
    pub trees_checked: usize,
    pub contexts_checked: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub inconsistencies: Vec<Inconsistency>,
    pub weight_mismatches: Vec<WeightMismatch>,
    pub stats: ValidationStats,
}

pub struct CalculationValidator {
    strict_mode: bool,
    tolerance: f64,
}

impl Default for CalculationValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculationValidator {
    pub fn new() -> Self {
        Self {
            strict_mode: false,
            tolerance: 0.01,
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict_mode = true;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Checks every tree. Weight mismatches found while resolving the network
    /// are carried into the report; only inconsistencies affect validity.
    pub fn validate<'t>(
        &self,
        trees: impl IntoIterator<Item = &'t Tree>,
        facts: &FactIndex<'_>,
        contexts: &BTreeMap<CompactString, Context>,
        weight_mismatches: &[WeightMismatch],
    ) -> Result<ValidationReport> {
        let start = std::time::Instant::now();

        let mut inconsistencies = Vec::new();
        let mut trees_checked = 0;
        for tree in trees {
            inconsistencies.extend(check(tree, facts, contexts, self.tolerance));
            trees_checked += 1;
        }
        tracing::debug!(
            trees = trees_checked,
            inconsistencies = inconsistencies.len(),
            "calculations checked"
        );

        if self.strict_mode && !inconsistencies.is_empty() {
            return Err(Error::Validation(format!(
                "Validation failed with {} calculation inconsistencies",
                inconsistencies.len()
            )));
        }

        Ok(ValidationReport {
            is_valid: inconsistencies.is_empty(),
            inconsistencies,
            weight_mismatches: weight_mismatches.to_vec(),
            stats: ValidationStats {
                trees_checked,
                contexts_checked: contexts.len(),
                duration_ms: start.elapsed().as_millis() as u64,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entity, Fact, Period};
    use crate::relationship::{LinkKind, Relationship};
    use crate::schema::{ElementCatalog, RoleType};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const ROLE: &str = "http://acme.example/role/IncomeStatement";

    fn fact(concept: &str, context: &str, value: f64) -> Fact {
        Fact {
            id: None,
            concept: concept.into(),
            context_ref: context.into(),
            unit_ref: Some("usd".into()),
            raw_value: value.to_string(),
            numeric_value: Some(value),
            decimals: None,
            precision: None,
            nil: false,
            footnote_refs: Vec::new(),
        }
    }

    fn contexts(ids: &[&str]) -> BTreeMap<CompactString, Context> {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        ids.iter()
            .map(|&id| {
                let context = Context {
                    id: id.into(),
                    entity: Entity {
                        identifier: "0000000001".into(),
                        scheme: "http://www.sec.gov/CIK".into(),
                    },
                    period: Period::Instant(date),
                    dimensions: Vec::new(),
                };
                (CompactString::from(id), context)
            })
            .collect()
    }

    fn tree(rels: &[Relationship]) -> Tree {
        let role = RoleType::new(ROLE, None);
        Tree::build(LinkKind::Calculation, role, rels, &ElementCatalog::new()).unwrap()
    }

    fn total_tree() -> Tree {
        tree(&[
            Relationship::calculation(ROLE, "Total", "A", 1.0, 1.0),
            Relationship::calculation(ROLE, "Total", "B", 2.0, 1.0),
        ])
    }

    #[test]
    fn test_within_tolerance_is_consistent() {
        let facts = vec![
            fact("Total", "c1", 100.0),
            fact("A", "c1", 60.0),
            fact("B", "c1", 39.999),
        ];
        let index = FactIndex::new(&facts);
        assert!(check(&total_tree(), &index, &contexts(&["c1"]), 0.01).is_empty());
    }

    #[test]
    fn test_reports_difference() {
        let facts = vec![
            fact("Total", "c1", 100.0),
            fact("A", "c1", 60.0),
            fact("B", "c1", 30.0),
        ];
        let index = FactIndex::new(&facts);
        let found = check(&total_tree(), &index, &contexts(&["c1"]), 0.01);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].difference, 10.0);
        assert_eq!(found[0].parent, "Total");
        assert_eq!(found[0].contributors.len(), 2);
    }

    #[test]
    fn test_contexts_checked_independently() {
        // c2 has only the total; c1 sums correctly. Nothing may be mixed across them.
        let facts = vec![
            fact("Total", "c1", 100.0),
            fact("A", "c1", 60.0),
            fact("B", "c1", 40.0),
            fact("Total", "c2", 5.0),
            fact("A", "c3", 1.0),
        ];
        let index = FactIndex::new(&facts);
        let found = check(&total_tree(), &index, &contexts(&["c1", "c2", "c3"]), 0.01);
        assert!(found.is_empty());
    }

    #[test]
    fn test_negative_weight_and_derived_subtotal() {
        // NetIncome = GrossProfit - Tax, GrossProfit = Revenue - Cost (GrossProfit not reported)
        let t = tree(&[
            Relationship::calculation(ROLE, "NetIncome", "GrossProfit", 1.0, 1.0),
            Relationship::calculation(ROLE, "NetIncome", "Tax", 2.0, -1.0),
            Relationship::calculation(ROLE, "GrossProfit", "Revenue", 1.0, 1.0),
            Relationship::calculation(ROLE, "GrossProfit", "Cost", 2.0, -1.0),
        ]);
        let facts = vec![
            fact("NetIncome", "c1", 25.0),
            fact("Tax", "c1", 5.0),
            fact("Revenue", "c1", 100.0),
            fact("Cost", "c1", 60.0),
        ];
        let index = FactIndex::new(&facts);
        let found = check(&t, &index, &contexts(&["c1"]), 0.01);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].reported, 25.0);
        assert_eq!(found[0].calculated, 35.0);
    }

    #[test]
    fn test_children_without_values_excluded() {
        let facts = vec![fact("Total", "c1", 60.0), fact("A", "c1", 60.0)];
        let index = FactIndex::new(&facts);
        assert!(check(&total_tree(), &index, &contexts(&["c1"]), 0.01).is_empty());
    }

    #[test]
    fn test_strict_validator_fails_on_inconsistency() {
        let facts = vec![
            fact("Total", "c1", 100.0),
            fact("A", "c1", 60.0),
            fact("B", "c1", 30.0),
        ];
        let index = FactIndex::new(&facts);
        let tree = total_tree();
        let ctx = contexts(&["c1"]);

        let report = CalculationValidator::new().validate([&tree], &index, &ctx, &[]).unwrap();
        assert!(!report.is_valid);
        assert_eq!(report.stats.trees_checked, 1);

        let strict = CalculationValidator::new().strict().validate([&tree], &index, &ctx, &[]);
        assert!(matches!(strict, Err(Error::Validation(_))));

        let loose = CalculationValidator::new()
            .with_tolerance(10.0)
            .validate([&tree], &index, &ctx, &[])
            .unwrap();
        assert!(loose.is_valid);
    }

    #[test]
    fn test_shared_subtotal_reported_once() {
        let t = tree(&[
            Relationship::calculation(ROLE, "Top", "P1", 1.0, 1.0),
            Relationship::calculation(ROLE, "Top", "P2", 2.0, 1.0),
            Relationship::calculation(ROLE, "P1", "Shared", 1.0, 1.0),
            Relationship::calculation(ROLE, "P2", "Shared", 1.0, 1.0),
            Relationship::calculation(ROLE, "Shared", "A", 1.0, 1.0),
            Relationship::calculation(ROLE, "Shared", "B", 2.0, 1.0),
        ]);
        let facts = vec![
            fact("Shared", "c1", 100.0),
            fact("A", "c1", 60.0),
            fact("B", "c1", 30.0),
        ];
        let index = FactIndex::new(&facts);
        let found = check(&t, &index, &contexts(&["c1"]), 0.01);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].parent, "Shared");
        assert_eq!(found[0].context_id, "c1");
        assert_eq!(found[0].difference, 10.0);
    }
}
