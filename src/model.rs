use chrono::NaiveDate;
use compact_str::CompactString;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Core XBRL instance structures
// ============================================================================

/// Namespace-qualified concept name as written in the filing (`us-gaap:Assets`).
pub type ConceptId = CompactString;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Period {
    Instant(NaiveDate),
    Duration { start: NaiveDate, end: NaiveDate },
    Forever,
}

impl Period {
    pub fn end_date(&self) -> Option<NaiveDate> {
        match self {
            Period::Instant(date) => Some(*date),
            Period::Duration { end, .. } => Some(*end),
            Period::Forever => None,
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        match self {
            Period::Duration { start, .. } => Some(*start),
            _ => None,
        }
    }

    pub fn is_instant(&self) -> bool {
        matches!(self, Period::Instant(_))
    }

    pub fn duration_days(&self) -> Option<i64> {
        match self {
            Period::Duration { start, end } => Some(end.signed_duration_since(*start).num_days()),
            _ => None,
        }
    }
}

/// Stable column key for statement values: `instant_YYYY-MM-DD`,
/// `duration_YYYY-MM-DD_YYYY-MM-DD` or `forever`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeriodKey(pub Period);

impl PeriodKey {
    pub fn period(&self) -> &Period {
        &self.0
    }
}

impl From<Period> for PeriodKey {
    fn from(period: Period) -> Self {
        Self(period)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Period::Instant(date) => write!(f, "instant_{}", date.format("%Y-%m-%d")),
            Period::Duration { start, end } => write!(
                f,
                "duration_{}_{}",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            ),
            Period::Forever => f.write_str("forever"),
        }
    }
}

// Newest end date first, then longest duration, so maps iterate in column order
impl Ord for PeriodKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .0
            .end_date()
            .cmp(&self.0.end_date())
            .then_with(|| self.0.start_date().cmp(&other.0.start_date()))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for PeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub identifier: CompactString,
    pub scheme: CompactString,
}

/// Explicit members resolve to a member concept, typed members carry their
/// XML text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DimensionValue {
    Explicit(ConceptId),
    Typed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Context {
    pub id: CompactString,
    pub entity: Entity,
    pub period: Period,
    /// Segment members first, then scenario members, in document order.
    pub dimensions: Vec<(ConceptId, DimensionValue)>,
}

impl Context {
    pub fn is_dimensional(&self) -> bool {
        !self.dimensions.is_empty()
    }

    pub fn dimension(&self, axis: &str) -> Option<&DimensionValue> {
        self.dimensions
            .iter()
            .find(|(dimension, _)| dimension.as_str() == axis)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Measure {
    pub namespace: Option<CompactString>,
    pub name: CompactString,
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UnitKind {
    Simple(Measure),
    Product(Vec<Measure>),
    Divide {
        numerator: Vec<Measure>,
        denominator: Vec<Measure>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unit {
    pub id: CompactString,
    pub kind: UnitKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decimals {
    Finite(i32),
    Infinite,
}

impl Decimals {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "INF" => Some(Decimals::Infinite),
            other => other.parse().ok().map(Decimals::Finite),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fact {
    pub id: Option<CompactString>,
    pub concept: ConceptId,
    pub context_ref: CompactString,
    pub unit_ref: Option<CompactString>,
    /// Value exactly as it appeared in the document.
    pub raw_value: String,
    /// Coerced and rounded value; `None` for non-numeric, nil or uncoercible facts.
    pub numeric_value: Option<f64>,
    pub decimals: Option<Decimals>,
    pub precision: Option<Decimals>,
    pub nil: bool,
    pub footnote_refs: Vec<CompactString>,
}

impl Fact {
    pub fn is_numeric(&self) -> bool {
        self.unit_ref.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footnote {
    pub id: CompactString,
    pub role: Option<String>,
    pub lang: Option<CompactString>,
    pub content: String,
}

/// Document and entity information gathered from contexts and `dei` facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityInfo {
    pub identifier: Option<CompactString>,
    pub scheme: Option<CompactString>,
    pub registrant_name: Option<String>,
    pub central_index_key: Option<String>,
    pub document_type: Option<String>,
    pub period_end_date: Option<NaiveDate>,
    pub fiscal_year_focus: Option<i32>,
    pub fiscal_period_focus: Option<String>,
}

/// Everything parsed out of one instance document. Immutable after parse.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Instance {
    pub entity_info: EntityInfo,
    pub contexts: BTreeMap<CompactString, Context>,
    pub units: BTreeMap<CompactString, Unit>,
    pub facts: Vec<Fact>,
    pub footnotes: Vec<Footnote>,
}

impl Instance {
    pub fn context(&self, id: &str) -> Option<&Context> {
        self.contexts.get(id)
    }

    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn facts_for<'a>(&'a self, concept: &'a str) -> impl Iterator<Item = &'a Fact> + 'a {
        self.facts.iter().filter(move |f| f.concept.as_str() == concept)
    }
}
