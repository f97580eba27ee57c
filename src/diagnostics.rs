// Non-fatal findings accumulated while parsing, resolving and assembling
use crate::model::{ConceptId, PeriodKey};
use crate::schema::Balance;
use crate::standard::StatementType;
use compact_str::CompactString;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightMismatch {
    pub role: CompactString,
    pub parent: ConceptId,
    pub child: ConceptId,
    pub weight: f64,
    pub parent_balance: Balance,
    pub child_balance: Balance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub concept: ConceptId,
    pub value: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inconsistency {
    pub role: CompactString,
    pub parent: ConceptId,
    pub context_id: CompactString,
    pub reported: f64,
    pub calculated: f64,
    pub difference: f64,
    pub contributors: Vec<Contribution>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleDetected {
    pub role: CompactString,
    /// Every concept on at least one cycle, sorted.
    pub concepts: Vec<ConceptId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumericCoercionFailure {
    pub concept: ConceptId,
    pub context_id: CompactString,
    pub raw_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateFact {
    pub concept: ConceptId,
    pub context_id: CompactString,
    pub kept: String,
    pub ignored: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelfReference {
    pub role: CompactString,
    pub concept: ConceptId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmappedConcept {
    pub concept: ConceptId,
    pub statement_type: StatementType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Restatement {
    pub row: String,
    pub period: PeriodKey,
    pub value: Option<f64>,
    pub displaced: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub weight_mismatches: Vec<WeightMismatch>,
    pub inconsistencies: Vec<Inconsistency>,
    pub cycles: Vec<CycleDetected>,
    pub numeric_coercion_failures: Vec<NumericCoercionFailure>,
    pub duplicate_facts: Vec<DuplicateFact>,
    pub self_references: Vec<SelfReference>,
    pub unmapped_concepts: Vec<UnmappedConcept>,
    pub restatements: Vec<Restatement>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weight_mismatch(&mut self, mismatch: WeightMismatch) {
        tracing::warn!(
            role = %mismatch.role,
            parent = %mismatch.parent,
            child = %mismatch.child,
            weight = mismatch.weight,
            "calculation weight disagrees with balance types"
        );
        self.weight_mismatches.push(mismatch);
    }

    pub fn inconsistency(&mut self, inconsistency: Inconsistency) {
        tracing::warn!(
            role = %inconsistency.role,
            parent = %inconsistency.parent,
            context = %inconsistency.context_id,
            difference = inconsistency.difference,
            "calculation inconsistency"
        );
        self.inconsistencies.push(inconsistency);
    }

    pub fn cycle(&mut self, cycle: CycleDetected) {
        tracing::warn!(
            role = %cycle.role,
            concepts = ?cycle.concepts,
            "cyclic relationships excluded"
        );
        self.cycles.push(cycle);
    }

    pub fn numeric_coercion_failure(&mut self, failure: NumericCoercionFailure) {
        tracing::warn!(
            concept = %failure.concept,
            context = %failure.context_id,
            raw = %failure.raw_value,
            "numeric value could not be coerced"
        );
        self.numeric_coercion_failures.push(failure);
    }

    pub fn duplicate_fact(&mut self, duplicate: DuplicateFact) {
        tracing::warn!(
            concept = %duplicate.concept,
            context = %duplicate.context_id,
            "duplicate fact with a different value"
        );
        self.duplicate_facts.push(duplicate);
    }

    pub fn self_reference(&mut self, reference: SelfReference) {
        tracing::debug!(
            role = %reference.role,
            concept = %reference.concept,
            "self-referencing arc dropped"
        );
        self.self_references.push(reference);
    }

    pub fn unmapped_concept(&mut self, unmapped: UnmappedConcept) {
        tracing::debug!(
            concept = %unmapped.concept,
            statement = ?unmapped.statement_type,
            "no standard concept"
        );
        self.unmapped_concepts.push(unmapped);
    }

    pub fn restatement(&mut self, restatement: Restatement) {
        tracing::info!(
            row = %restatement.row,
            period = %restatement.period,
            "restated value replaces an earlier filing"
        );
        self.restatements.push(restatement);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.weight_mismatches.extend(other.weight_mismatches);
        self.inconsistencies.extend(other.inconsistencies);
        self.cycles.extend(other.cycles);
        self.numeric_coercion_failures.extend(other.numeric_coercion_failures);
        self.duplicate_facts.extend(other.duplicate_facts);
        self.self_references.extend(other.self_references);
        self.unmapped_concepts.extend(other.unmapped_concepts);
        self.restatements.extend(other.restatements);
    }

    pub fn len(&self) -> usize {
        self.weight_mismatches.len()
            + self.inconsistencies.len()
            + self.cycles.len()
            + self.numeric_coercion_failures.len()
            + self.duplicate_facts.len()
            + self.self_references.len()
            + self.unmapped_concepts.len()
            + self.restatements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
