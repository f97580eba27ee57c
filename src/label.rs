// Label linkbase resources and display-label resolution
use crate::model::ConceptId;
use crate::xml::local_name;
use ahash::AHashMap;
use compact_str::CompactString;
use serde::Serialize;

pub mod roles {
    pub const STANDARD: &str = "http://www.xbrl.org/2003/role/label";
    pub const TERSE: &str = "http://www.xbrl.org/2003/role/terseLabel";
    pub const VERBOSE: &str = "http://www.xbrl.org/2003/role/verboseLabel";
    pub const TOTAL: &str = "http://www.xbrl.org/2003/role/totalLabel";
    pub const PERIOD_START: &str = "http://www.xbrl.org/2003/role/periodStartLabel";
    pub const PERIOD_END: &str = "http://www.xbrl.org/2003/role/periodEndLabel";
    pub const DOCUMENTATION: &str = "http://www.xbrl.org/2003/role/documentation";
    pub const NEGATED: &str = "http://www.xbrl.org/2009/role/negatedLabel";
    pub const NEGATED_TOTAL: &str = "http://www.xbrl.org/2009/role/negatedTotalLabel";
    pub const NEGATED_TERSE: &str = "http://www.xbrl.org/2009/role/negatedTerseLabel";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub role: CompactString,
    pub lang: CompactString,
    pub text: String,
}

/// Labels per concept, with a preferred language used when several exist.
#[derive(Debug, Clone)]
pub struct LabelSet {
    labels: AHashMap<ConceptId, Vec<Label>>,
    language: CompactString,
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::with_language("en-US")
    }
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(language: impl Into<CompactString>) -> Self {
        Self {
            labels: AHashMap::new(),
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: impl Into<CompactString>) {
        self.language = language.into();
    }

    pub fn insert(
        &mut self,
        concept: impl Into<ConceptId>,
        role: impl Into<CompactString>,
        lang: impl Into<CompactString>,
        text: impl Into<String>,
    ) {
        let text = text.into();
        if text.trim().is_empty() {
            return;
        }
        self.labels.entry(concept.into()).or_default().push(Label {
            role: role.into(),
            lang: lang.into(),
            text,
        });
    }

    /// Label text for a role: exact language first, then the same primary
    /// language (`en` for `en-US`), then whichever was loaded first.
    pub fn get(&self, concept: &str, role: &str) -> Option<&str> {
        let candidates: Vec<&Label> = self
            .labels
            .get(concept)?
            .iter()
            .filter(|label| label.role.as_str() == role)
            .collect();

        let primary = primary_language(&self.language);
        candidates
            .iter()
            .find(|label| label.lang.eq_ignore_ascii_case(&self.language))
            .or_else(|| {
                candidates
                    .iter()
                    .find(|label| primary_language(&label.lang).eq_ignore_ascii_case(primary))
            })
            .or_else(|| candidates.first())
            .map(|label| label.text.as_str())
    }

    pub fn has(&self, concept: &str, role: &str) -> bool {
        self.get(concept, role).is_some()
    }

    pub fn labels_for(&self, concept: &str) -> &[Label] {
        self.labels.get(concept).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn merge(&mut self, other: LabelSet) {
        for (concept, labels) in other.labels {
            self.labels.entry(concept).or_default().extend(labels);
        }
    }

    pub fn len(&self) -> usize {
        self.labels.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn primary_language(lang: &str) -> &str {
    lang.split(['-', '_']).next().unwrap_or(lang)
}

/// Display label for a concept. Tries the preferred role, then the standard
/// role, then derives one from the concept's local name. Never empty.
pub fn resolve(concept: &str, preferred_role: Option<&str>, labels: &LabelSet) -> String {
    preferred_role
        .and_then(|role| labels.get(concept, role))
        .or_else(|| labels.get(concept, roles::STANDARD))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| humanize(concept))
}

/// `us-gaap:NetIncomeLoss` becomes `Net Income Loss`.
pub fn humanize(concept: &str) -> String {
    let name = local_name(concept);
    let mut out = String::with_capacity(name.len() + 8);
    let chars: Vec<char> = name.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
            continue;
        }
        if i > 0 && !out.ends_with(' ') {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = (c.is_uppercase() && (prev.is_lowercase() || prev.is_ascii_digit()))
                || (c.is_uppercase() && prev.is_uppercase() && next_lower)
                || (c.is_ascii_digit() && prev.is_alphabetic());
            if boundary {
                out.push(' ');
            }
        }
        out.push(c);
    }

    let out = out.trim().to_string();
    if out.is_empty() {
        concept.to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> LabelSet {
        let mut labels = LabelSet::new();
        labels.insert("us-gaap:Revenues", roles::STANDARD, "en-US", "Revenues");
        labels.insert("us-gaap:Revenues", roles::TOTAL, "en-US", "Total revenues");
        labels.insert("us-gaap:Revenues", roles::STANDARD, "de", "Umsatzerlöse");
        labels.insert("us-gaap:Assets", roles::STANDARD, "en", "Assets");
        labels
    }

    #[test]
    fn test_preferred_role_wins() {
        let labels = sample();
        assert_eq!(resolve("us-gaap:Revenues", Some(roles::TOTAL), &labels), "Total revenues");
        assert_eq!(resolve("us-gaap:Revenues", Some(roles::TERSE), &labels), "Revenues");
        assert_eq!(resolve("us-gaap:Revenues", None, &labels), "Revenues");
    }

    #[test]
    fn test_language_preference() {
        let mut labels = sample();
        assert_eq!(labels.get("us-gaap:Assets", roles::STANDARD), Some("Assets"));

        labels.set_language("de");
        assert_eq!(labels.get("us-gaap:Revenues", roles::STANDARD), Some("Umsatzerlöse"));
        // No German label: first loaded
        assert_eq!(labels.get("us-gaap:Assets", roles::STANDARD), Some("Assets"));
    }

    #[test]
    fn test_missing_label_humanizes_concept() {
        let labels = LabelSet::new();
        assert_eq!(resolve("us-gaap:NetIncomeLoss", None, &labels), "Net Income Loss");
        assert_eq!(humanize("acme:EBITDAMargin"), "EBITDA Margin");
        assert_eq!(humanize("Revenue2023"), "Revenue 2023");
        assert_eq!(humanize("custom_widget_sales"), "custom widget sales");
    }

    #[test]
    fn test_blank_labels_ignored() {
        let mut labels = LabelSet::new();
        labels.insert("acme:Blank", roles::STANDARD, "en-US", "   ");
        assert!(labels.is_empty());
        assert_eq!(resolve("acme:Blank", None, &labels), "Blank");
    }
}
