// Multi-filing statement stitching
use crate::diagnostics::{Diagnostics, Restatement};
use crate::model::{ConceptId, PeriodKey};
use crate::standard::{StandardConcept, StatementType};
use crate::statement::{Cell, FilingMeta, PriorValue, Row, Statement};
use crate::{Error, Result};
use ahash::{AHashMap, AHashSet};
use chrono::NaiveDate;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchState {
    Empty,
    Accumulating,
    Finalized,
}

/// Rows align on their standard concept, or on concept plus label when unmapped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RowKey {
    Standard(StandardConcept),
    Raw(ConceptId, String),
}

type Recency = (Option<NaiveDate>, Option<NaiveDate>);

/// Combines one statement type across several filings into a single
/// multi-period statement.
///
/// Row order follows the first statement added, which [`stitch`] arranges to
/// be the most recent filing. When two filings report the same row and
/// period, the more recently filed value wins and the other is kept on the
/// row as a [`PriorValue`] if it differs.
pub struct StatementStitcher {
    statement_type: StatementType,
    max_periods: usize,
    state: StitchState,
    rows: Vec<Row>,
    index: AHashMap<RowKey, usize>,
    sources: AHashMap<(usize, PeriodKey), (Recency, FilingMeta)>,
    periods: BTreeSet<PeriodKey>,
    entity: Option<String>,
    newest: Option<(Recency, FilingMeta)>,
    diagnostics: Diagnostics,
}

impl StatementStitcher {
    pub fn new(statement_type: StatementType, max_periods: usize) -> Self {
        Self {
            statement_type,
            max_periods,
            state: StitchState::Empty,
            rows: Vec::new(),
            index: AHashMap::new(),
            sources: AHashMap::new(),
            periods: BTreeSet::new(),
            entity: None,
            newest: None,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn state(&self) -> StitchState {
        self.state
    }

    /// Adds one filing's statement. Statements of another type are skipped
    /// and `Ok(false)` is returned.
    pub fn add(&mut self, statement: &Statement) -> Result<bool> {
        if self.state == StitchState::Finalized {
            return Err(Error::StitcherFinalized);
        }
        if statement.statement_type != self.statement_type {
            tracing::debug!(
                expected = ?self.statement_type,
                found = ?statement.statement_type,
                "statement of another type skipped"
            );
            return Ok(false);
        }

        let recency = statement.recency();
        if self.newest.as_ref().map_or(true, |(newest, _)| recency > *newest) {
            self.newest = Some((recency, statement.filing.clone()));
        }
        if self.entity.is_none() {
            self.entity = statement.entity.clone();
        }

        let mut used: AHashSet<StandardConcept> = AHashSet::new();
        let mut cursor: Option<usize> = None;
        for row in &statement.rows {
            let key = match row.standard {
                // A second row mapping to the same concept keeps its own identity
                Some(standard) if used.insert(standard) => RowKey::Standard(standard),
                _ => RowKey::Raw(row.concept.clone(), row.label.clone()),
            };

            let slot = match self.index.get(&key) {
                Some(&slot) => slot,
                None => {
                    let slot = cursor.map_or(self.rows.len(), |c| c + 1);
                    self.insert_row(slot, key, row);
                    slot
                }
            };
            cursor = Some(slot);

            for (period, cell) in &row.values {
                self.merge_cell(slot, period, cell, recency, &statement.filing);
            }
        }
        self.periods.extend(statement.periods.iter().cloned());
        self.state = StitchState::Accumulating;
        Ok(true)
    }

    /// Produces the stitched statement. Periods newest first, capped at
    /// `max_periods`; no statement may be added afterwards.
    pub fn finalize(&mut self) -> Result<Statement> {
        match self.state {
            StitchState::Finalized => return Err(Error::StitcherFinalized),
            StitchState::Empty => {
                self.state = StitchState::Finalized;
                return Err(Error::NoOverlappingStatementType(self.statement_type));
            }
            StitchState::Accumulating => {}
        }
        self.state = StitchState::Finalized;

        let periods: Vec<PeriodKey> = self.periods.iter().take(self.max_periods).cloned().collect();
        let mut rows = std::mem::take(&mut self.rows);
        for row in &mut rows {
            row.values.retain(|period, _| periods.contains(period));
            row.prior_values.retain(|period, _| periods.contains(period));
            row.elidable = row.is_abstract && !row.has_values();
        }
        let diagnostics = std::mem::take(&mut self.diagnostics);
        let filing = self.newest.take().map(|(_, meta)| meta).unwrap_or_default();

        tracing::debug!(
            statement = ?self.statement_type,
            rows = rows.len(),
            periods = periods.len(),
            restatements = diagnostics.restatements.len(),
            "statements stitched"
        );

        Ok(Statement {
            statement_type: self.statement_type,
            role: None,
            entity: self.entity.take(),
            filing,
            periods,
            rows,
            diagnostics,
        })
    }

    fn insert_row(&mut self, slot: usize, key: RowKey, row: &Row) {
        let mut fresh = row.clone();
        fresh.values.clear();
        fresh.prior_values.clear();
        self.rows.insert(slot, fresh);

        // Everything at or after the slot shifted by one
        for index in self.index.values_mut() {
            if *index >= slot {
                *index += 1;
            }
        }
        if slot + 1 < self.rows.len() {
            let shifted: Vec<((usize, PeriodKey), (Recency, FilingMeta))> = self
                .sources
                .drain()
                .map(|((index, period), source)| {
                    let index = if index >= slot { index + 1 } else { index };
                    ((index, period), source)
                })
                .collect();
            self.sources.extend(shifted);
        }
        self.index.insert(key, slot);
    }

    fn merge_cell(
        &mut self,
        slot: usize,
        period: &PeriodKey,
        cell: &Cell,
        recency: Recency,
        filing: &FilingMeta,
    ) {
        let source_key = (slot, period.clone());
        let row = &mut self.rows[slot];

        let Some(existing) = row.values.get(period).cloned() else {
            row.values.insert(period.clone(), cell.clone());
            self.sources.insert(source_key, (recency, filing.clone()));
            return;
        };
        let Some((existing_recency, existing_filing)) = self.sources.get(&source_key).cloned()
        else {
            return;
        };

        let incoming_wins = recency > existing_recency;
        let (winner, loser, loser_filing) = if incoming_wins {
            (cell.clone(), existing, existing_filing)
        } else {
            (existing, cell.clone(), filing.clone())
        };

        if winner.value != loser.value || (winner.value.is_none() && winner.raw != loser.raw) {
            row.prior_values.entry(period.clone()).or_default().push(PriorValue {
                value: loser.value,
                raw: loser.raw.clone(),
                filing_date: loser_filing.filing_date,
                accession: loser_filing.accession.clone(),
            });
            self.diagnostics.restatement(Restatement {
                row: row.display_label().to_string(),
                period: period.clone(),
                value: winner.value,
                displaced: loser.value,
            });
        }

        if incoming_wins {
            row.values.insert(period.clone(), winner);
            self.sources.insert(source_key, (recency, filing.clone()));
        }
    }
}

/// Stitches the statements of one type, most recent filing first.
pub fn stitch(
    statements: &[Statement],
    statement_type: StatementType,
    max_periods: usize,
) -> Result<Statement> {
    let mut ordered: Vec<&Statement> = statements
        .iter()
        .filter(|s| s.statement_type == statement_type)
        .collect();
    ordered.sort_by(|a, b| b.recency().cmp(&a.recency()));

    let mut stitcher = StatementStitcher::new(statement_type, max_periods);
    for statement in ordered {
        stitcher.add(statement)?;
    }
    stitcher.finalize()
}
