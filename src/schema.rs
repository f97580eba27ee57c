// Taxonomy schema metadata: balance/period types and role definitions
use crate::model::ConceptId;
use crate::xml::{element_id_to_concept, ns, XmlDocument};
use crate::Result;
use ahash::AHashMap;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Balance {
    Debit,
    Credit,
}

impl Balance {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "debit" => Some(Balance::Debit),
            "credit" => Some(Balance::Credit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Instant,
    Duration,
}

impl PeriodType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "instant" => Some(PeriodType::Instant),
            "duration" => Some(PeriodType::Duration),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub balance: Option<Balance>,
    pub period_type: Option<PeriodType>,
    pub is_abstract: bool,
    pub substitution_group: Option<CompactString>,
    pub element_type: Option<CompactString>,
}

/// Schema-derived element metadata keyed by concept id.
#[derive(Debug, Clone, Default)]
pub struct ElementCatalog {
    elements: AHashMap<ConceptId, ElementInfo>,
}

impl ElementCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, concept: impl Into<ConceptId>, info: ElementInfo) {
        self.elements.insert(concept.into(), info);
    }

    pub fn get(&self, concept: &str) -> Option<&ElementInfo> {
        self.elements.get(concept)
    }

    pub fn balance(&self, concept: &str) -> Option<Balance> {
        self.get(concept).and_then(|info| info.balance)
    }

    /// Later catalogs win for concepts defined twice.
    pub fn merge(&mut self, other: ElementCatalog) {
        self.elements.extend(other.elements);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl FromIterator<(ConceptId, ElementInfo)> for ElementCatalog {
    fn from_iter<I: IntoIterator<Item = (ConceptId, ElementInfo)>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

/// An extended link role (one statement or disclosure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleType {
    pub uri: CompactString,
    pub definition: Option<String>,
    pub order: Option<u32>,
}

impl RoleType {
    pub fn new(uri: impl Into<CompactString>, definition: Option<String>) -> Self {
        let order = definition.as_deref().and_then(order_hint);
        Self {
            uri: uri.into(),
            definition,
            order,
        }
    }

    /// Definition text, or the last path segment of the URI.
    pub fn title(&self) -> &str {
        match &self.definition {
            Some(definition) => definition.as_str(),
            None => self.uri.rsplit('/').next().unwrap_or(self.uri.as_str()),
        }
    }
}

/// `"0002 - Statement - Balance Sheet"` sorts as 2.
fn order_hint(definition: &str) -> Option<u32> {
    let digits: String = definition
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[derive(Debug, Clone, Default)]
pub struct SchemaInfo {
    pub target_namespace: Option<CompactString>,
    pub elements: ElementCatalog,
    pub role_types: Vec<RoleType>,
}

pub fn parse_schema(data: &[u8]) -> Result<SchemaInfo> {
    let doc = XmlDocument::parse(data)?;
    let root = &doc.root;
    let target_namespace = root.attr("targetNamespace").map(CompactString::from);

    // Prefix bound to the target namespace, for elements without an id
    let target_prefix = target_namespace
        .as_deref()
        .and_then(|target| root.prefix_for(target))
        .map(CompactString::from);

    let mut elements = ElementCatalog::new();
    for element in root.children_named(ns::XSD, "element") {
        let Some(name) = element.attr("name") else {
            continue;
        };
        let concept = match (element.attr("id"), &target_prefix) {
            (Some(id), _) => element_id_to_concept(id),
            (None, Some(prefix)) => compact_str::format_compact!("{}:{}", prefix, name),
            (None, None) => CompactString::from(name),
        };
        let info = ElementInfo {
            balance: element.attr_ns(ns::XBRLI, "balance").and_then(Balance::parse),
            period_type: element.attr_ns(ns::XBRLI, "periodType").and_then(PeriodType::parse),
            is_abstract: element.attr("abstract") == Some("true"),
            substitution_group: element.attr("substitutionGroup").map(CompactString::from),
            element_type: element.attr("type").map(CompactString::from),
        };
        elements.insert(concept, info);
    }

    let role_types = root
        .descendants(ns::LINK, "roleType")
        .into_iter()
        .filter_map(|role| {
            let uri = role.attr("roleURI")?;
            let definition = role
                .child(ns::LINK, "definition")
                .map(|d| d.text().to_string())
                .filter(|d| !d.is_empty());
            Some(RoleType::new(uri, definition))
        })
        .collect();

    Ok(SchemaInfo {
        target_namespace,
        elements,
        role_types,
    })
}
