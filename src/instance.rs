// Instance document parsing: contexts, units, facts and footnotes
use crate::diagnostics::{Diagnostics, DuplicateFact, NumericCoercionFailure};
use crate::model::*;
use crate::xml::{local_name, ns, Element, XmlDocument};
use crate::{Error, Result};
use ahash::AHashMap;
use chrono::NaiveDate;
use compact_str::CompactString;
use std::collections::BTreeMap;

/// Parses one instance document.
///
/// Structural problems (malformed XML, a missing `xbrli:xbrl` root, a fact
/// pointing at an unknown context or unit) abort the whole parse. Numeric
/// coercion failures and conflicting duplicate facts are appended to
/// `diagnostics` and the facts are kept.
pub fn parse_instance(data: &[u8], diagnostics: &mut Diagnostics) -> Result<Instance> {
    let doc = XmlDocument::parse(data)?;
    let root = &doc.root;
    if !root.is(ns::XBRLI, "xbrl") {
        return Err(Error::MissingRootElement {
            expected: "xbrli:xbrl",
            found: root.qualified_name().to_string(),
        });
    }

    // Collected locally so a fatal error never leaves half-filled diagnostics behind
    let mut local = Diagnostics::new();

    let mut contexts = BTreeMap::new();
    let mut first_context: Option<CompactString> = None;
    for element in root.children_named(ns::XBRLI, "context") {
        let context = parse_context(element)?;
        first_context.get_or_insert_with(|| context.id.clone());
        contexts.insert(context.id.clone(), context);
    }

    let mut units = BTreeMap::new();
    for element in root.children_named(ns::XBRLI, "unit") {
        let unit = parse_unit(element)?;
        units.insert(unit.id.clone(), unit);
    }

    let footnote_map = parse_footnote_links(root);

    let mut facts = Vec::new();
    collect_facts(root, &contexts, &units, &footnote_map.refs, &mut facts, &mut local)?;
    detect_duplicates(&facts, &mut local);

    let mut entity_info = EntityInfo::default();
    if let Some(context) = first_context.as_deref().and_then(|id| contexts.get(id)) {
        entity_info.identifier = Some(context.entity.identifier.clone());
        entity_info.scheme = Some(context.entity.scheme.clone());
    }
    fill_document_info(&mut entity_info, &facts);

    tracing::debug!(
        contexts = contexts.len(),
        units = units.len(),
        facts = facts.len(),
        "parsed instance"
    );

    diagnostics.extend(local);
    Ok(Instance {
        entity_info,
        contexts,
        units,
        facts,
        footnotes: footnote_map.footnotes,
    })
}

fn parse_context(element: &Element) -> Result<Context> {
    let id = element
        .attr("id")
        .map(CompactString::from)
        .ok_or_else(|| Error::MalformedXml("context missing id".to_string()))?;

    let entity_el = element
        .child(ns::XBRLI, "entity")
        .ok_or_else(|| Error::MalformedXml(format!("context {} has no entity", id)))?;
    let identifier = entity_el.child(ns::XBRLI, "identifier");
    let entity = Entity {
        identifier: identifier.map(|i| CompactString::from(i.text())).unwrap_or_default(),
        scheme: identifier
            .and_then(|i| i.attr("scheme"))
            .map(CompactString::from)
            .unwrap_or_default(),
    };

    let period_el = element
        .child(ns::XBRLI, "period")
        .ok_or_else(|| Error::MalformedXml(format!("context {} has no period", id)))?;
    let period = parse_period(&id, period_el)?;

    let mut dimensions = Vec::new();
    if let Some(segment) = entity_el.child(ns::XBRLI, "segment") {
        parse_members(segment, &mut dimensions);
    }
    if let Some(scenario) = element.child(ns::XBRLI, "scenario") {
        parse_members(scenario, &mut dimensions);
    }

    Ok(Context {
        id,
        entity,
        period,
        dimensions,
    })
}

fn parse_period(context_id: &str, period: &Element) -> Result<Period> {
    if period.child(ns::XBRLI, "forever").is_some() {
        return Ok(Period::Forever);
    }
    if let Some(instant) = period.child(ns::XBRLI, "instant") {
        return Ok(Period::Instant(parse_date(context_id, instant.text())?));
    }

    let start = period.child(ns::XBRLI, "startDate");
    let end = period.child(ns::XBRLI, "endDate");
    match (start, end) {
        (Some(start), Some(end)) => {
            let start = parse_date(context_id, start.text())?;
            let end = parse_date(context_id, end.text())?;
            if start > end {
                return Err(Error::InvalidPeriod {
                    context_id: context_id.to_string(),
                    reason: format!("start {} is after end {}", start, end),
                });
            }
            Ok(Period::Duration { start, end })
        }
        _ => Err(Error::InvalidPeriod {
            context_id: context_id.to_string(),
            reason: "period has neither instant, duration nor forever".to_string(),
        }),
    }
}

fn parse_date(context_id: &str, raw: &str) -> Result<NaiveDate> {
    // xs:dateTime values keep only the date part
    let date = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| Error::InvalidPeriod {
        context_id: context_id.to_string(),
        reason: format!("invalid date {:?}: {}", raw, e),
    })
}

fn parse_members(container: &Element, dimensions: &mut Vec<(ConceptId, DimensionValue)>) {
    for member in &container.children {
        let Some(dimension) = member.attr("dimension") else {
            continue;
        };
        let value = if member.is(ns::XBRLDI, "explicitMember") {
            DimensionValue::Explicit(CompactString::from(member.text()))
        } else if member.is(ns::XBRLDI, "typedMember") {
            DimensionValue::Typed(member.deep_text())
        } else {
            continue;
        };
        dimensions.push((CompactString::from(dimension), value));
    }
}

fn parse_unit(element: &Element) -> Result<Unit> {
    let id = element
        .attr("id")
        .map(CompactString::from)
        .ok_or_else(|| Error::MalformedXml("unit missing id".to_string()))?;

    let kind = if let Some(divide) = element.child(ns::XBRLI, "divide") {
        let side = |name| {
            divide
                .child(ns::XBRLI, name)
                .map(measures)
                .unwrap_or_default()
        };
        UnitKind::Divide {
            numerator: side("unitNumerator"),
            denominator: side("unitDenominator"),
        }
    } else {
        let mut all = measures(element);
        match all.len() {
            0 => return Err(Error::MalformedXml(format!("unit {} has no measure", id))),
            1 => UnitKind::Simple(all.remove(0)),
            _ => UnitKind::Product(all),
        }
    };

    Ok(Unit { id, kind })
}

fn measures(parent: &Element) -> Vec<Measure> {
    parent
        .children_named(ns::XBRLI, "measure")
        .map(|measure| {
            let (namespace, name) = measure.resolve_qname(measure.text());
            Measure {
                namespace: namespace.map(CompactString::from),
                name: CompactString::from(name),
            }
        })
        .collect()
}

/// Facts are any non-structural element carrying a contextRef. Tuples are
/// flattened: their child facts are collected in document order.
fn collect_facts(
    parent: &Element,
    contexts: &BTreeMap<CompactString, Context>,
    units: &BTreeMap<CompactString, Unit>,
    footnote_refs: &AHashMap<CompactString, Vec<CompactString>>,
    facts: &mut Vec<Fact>,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    for element in &parent.children {
        if is_structural(element) {
            continue;
        }
        let Some(context_ref) = element.attr("contextRef") else {
            if !element.children.is_empty() {
                collect_facts(element, contexts, units, footnote_refs, facts, diagnostics)?;
            }
            continue;
        };

        let concept = element.qualified_name();
        if !contexts.contains_key(context_ref) {
            return Err(Error::MissingContextRef {
                concept: concept.to_string(),
                context_ref: context_ref.to_string(),
            });
        }
        let unit_ref = element.attr("unitRef").map(CompactString::from);
        if let Some(unit_ref) = &unit_ref {
            if !units.contains_key(unit_ref) {
                return Err(Error::MissingUnitRef {
                    concept: concept.to_string(),
                    unit_ref: unit_ref.to_string(),
                });
            }
        }

        let id = element.attr("id").map(CompactString::from);
        let nil = element.attr_ns(ns::XSI, "nil") == Some("true");
        let decimals = element.attr("decimals").and_then(Decimals::parse);
        let precision = element.attr("precision").and_then(Decimals::parse);
        let raw_value = if element.children.is_empty() {
            element.text().to_string()
        } else {
            element.deep_text()
        };

        let mut numeric_value = None;
        if unit_ref.is_some() && !nil {
            match coerce_numeric(&raw_value) {
                Some(value) => numeric_value = Some(normalize(value, decimals, precision)),
                None => diagnostics.numeric_coercion_failure(NumericCoercionFailure {
                    concept: concept.clone(),
                    context_id: CompactString::from(context_ref),
                    raw_value: raw_value.clone(),
                }),
            }
        }

        let footnote_refs = id
            .as_ref()
            .and_then(|id| footnote_refs.get(id))
            .cloned()
            .unwrap_or_default();

        facts.push(Fact {
            id,
            concept,
            context_ref: CompactString::from(context_ref),
            unit_ref,
            raw_value,
            numeric_value,
            decimals,
            precision,
            nil,
            footnote_refs,
        });
    }
    Ok(())
}

fn is_structural(element: &Element) -> bool {
    matches!(
        element.namespace.as_deref(),
        Some(ns::XBRLI) | Some(ns::LINK) | Some(ns::XBRLDI) | Some(ns::XLINK)
    )
}

fn detect_duplicates(facts: &[Fact], diagnostics: &mut Diagnostics) {
    let mut seen: AHashMap<(&str, &str), usize> = AHashMap::with_capacity(facts.len());
    for (index, fact) in facts.iter().enumerate() {
        match seen.get(&(fact.concept.as_str(), fact.context_ref.as_str())) {
            Some(&first) => {
                let kept = &facts[first];
                let differs = match (kept.numeric_value, fact.numeric_value) {
                    (Some(a), Some(b)) => a != b,
                    _ => kept.raw_value.trim() != fact.raw_value.trim(),
                };
                if differs {
                    diagnostics.duplicate_fact(DuplicateFact {
                        concept: fact.concept.clone(),
                        context_id: fact.context_ref.clone(),
                        kept: kept.raw_value.clone(),
                        ignored: fact.raw_value.clone(),
                    });
                }
            }
            None => {
                seen.insert((fact.concept.as_str(), fact.context_ref.as_str()), index);
            }
        }
    }
}

fn fill_document_info(info: &mut EntityInfo, facts: &[Fact]) {
    for fact in facts {
        if !fact.concept.starts_with("dei:") {
            continue;
        }
        let value = fact.raw_value.trim();
        match local_name(&fact.concept) {
            "EntityRegistrantName" if info.registrant_name.is_none() => {
                info.registrant_name = Some(value.to_string());
            }
            "EntityCentralIndexKey" if info.central_index_key.is_none() => {
                info.central_index_key = Some(value.to_string());
            }
            "DocumentType" if info.document_type.is_none() => {
                info.document_type = Some(value.to_string());
            }
            "DocumentPeriodEndDate" if info.period_end_date.is_none() => {
                info.period_end_date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok();
            }
            "DocumentFiscalYearFocus" if info.fiscal_year_focus.is_none() => {
                info.fiscal_year_focus = value.parse().ok();
            }
            "DocumentFiscalPeriodFocus" if info.fiscal_period_focus.is_none() => {
                info.fiscal_period_focus = Some(value.to_string());
            }
            _ => {}
        }
    }
}

struct FootnoteMap {
    footnotes: Vec<Footnote>,
    refs: AHashMap<CompactString, Vec<CompactString>>,
}

fn parse_footnote_links(root: &Element) -> FootnoteMap {
    let mut footnotes = Vec::new();
    let mut refs: AHashMap<CompactString, Vec<CompactString>> = AHashMap::new();

    for link in root.children_named(ns::LINK, "footnoteLink") {
        // xlink:label -> fact ids / footnote ids
        let mut fact_labels: AHashMap<&str, Vec<CompactString>> = AHashMap::new();
        let mut note_labels: AHashMap<&str, Vec<CompactString>> = AHashMap::new();

        for child in &link.children {
            let Some(label) = child.xlink("label") else {
                continue;
            };
            if child.is(ns::LINK, "loc") {
                if let Some(fact_id) = child.xlink("href").and_then(|h| h.rsplit_once('#')) {
                    fact_labels.entry(label).or_default().push(CompactString::from(fact_id.1));
                }
            } else if child.is(ns::LINK, "footnote") {
                let id = child
                    .attr("id")
                    .map(CompactString::from)
                    .unwrap_or_else(|| CompactString::from(label));
                note_labels.entry(label).or_default().push(id.clone());
                footnotes.push(Footnote {
                    id,
                    role: child.xlink("role").map(str::to_string),
                    lang: child.attr_ns(ns::XML, "lang").map(CompactString::from),
                    content: child.deep_text(),
                });
            }
        }

        for arc in link.children_named(ns::LINK, "footnoteArc") {
            let (Some(from), Some(to)) = (arc.xlink("from"), arc.xlink("to")) else {
                continue;
            };
            let (Some(facts), Some(notes)) = (fact_labels.get(from), note_labels.get(to)) else {
                continue;
            };
            for fact_id in facts {
                refs.entry(fact_id.clone()).or_default().extend(notes.iter().cloned());
            }
        }
    }

    FootnoteMap { footnotes, refs }
}

/// Strips thousands separators, currency symbols and accounting parentheses.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '€' | '£' | '¥' | ' ' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Round-half-to-even at `decimals` places; negative values round to tens,
/// hundreds and so on.
pub fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    // Beyond f64 resolution there is nothing left to round
    if decimals > 15 || decimals < -300 {
        return value;
    }
    if decimals >= 0 {
        let factor = 10f64.powi(decimals);
        (value * factor).round_ties_even() / factor
    } else {
        let factor = 10f64.powi(-decimals);
        (value / factor).round_ties_even() * factor
    }
}

fn normalize(value: f64, decimals: Option<Decimals>, precision: Option<Decimals>) -> f64 {
    match (decimals, precision) {
        (Some(Decimals::Finite(d)), _) => round_to_decimals(value, d),
        (Some(Decimals::Infinite), _) => value,
        (None, Some(Decimals::Finite(p))) if value != 0.0 && p > 0 => {
            let magnitude = value.abs().log10().floor() as i32;
            round_to_decimals(value, p - 1 - magnitude)
        }
        _ => value,
    }
}

/// `(concept, context)` lookup over an instance; the first fact in document
/// order wins for duplicated pairs.
#[derive(Debug, Default)]
pub struct FactIndex<'a> {
    by_key: AHashMap<(&'a str, &'a str), &'a Fact>,
}

impl<'a> FactIndex<'a> {
    pub fn new(facts: &'a [Fact]) -> Self {
        let mut by_key = AHashMap::with_capacity(facts.len());
        for fact in facts {
            by_key
                .entry((fact.concept.as_str(), fact.context_ref.as_str()))
                .or_insert(fact);
        }
        Self { by_key }
    }

    pub fn get(&self, concept: &str, context_id: &str) -> Option<&'a Fact> {
        self.by_key.get(&(concept, context_id)).copied()
    }

    pub fn value(&self, concept: &str, context_id: &str) -> Option<f64> {
        self.get(concept, context_id).and_then(|f| f.numeric_value)
    }

    pub fn has_fact(&self, concept: &str, context_id: &str) -> bool {
        self.by_key.contains_key(&(concept, context_id))
    }
}
