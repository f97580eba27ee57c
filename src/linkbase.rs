// Linkbase processing for XBRL
use crate::label::{roles, LabelSet};
use crate::model::ConceptId;
use crate::relationship::{LinkKind, Relationship};
use crate::xml::{href_to_concept, ns, Element, XmlDocument};
use crate::{Error, Result};
use ahash::AHashMap;
use compact_str::CompactString;

const DEFAULT_LINK_ROLE: &str = "http://www.xbrl.org/2003/role/link";
const PARENT_CHILD: &str = "http://www.xbrl.org/2003/arcrole/parent-child";
const SUMMATION_ITEM: &str = "http://www.xbrl.org/2003/arcrole/summation-item";
const CONCEPT_LABEL: &str = "http://www.xbrl.org/2003/arcrole/concept-label";

/// Accumulates arcs and labels across all linkbase documents of one filing.
/// Every arc gets a global document-order index in the order documents are
/// fed in, which is what conflict resolution and sibling ordering rely on.
#[derive(Debug, Default)]
pub struct LinkbaseProcessor {
    presentation: Vec<Relationship>,
    calculation: Vec<Relationship>,
    labels: LabelSet,
    role_refs: Vec<CompactString>,
    next_order: usize,
}

impl LinkbaseProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(language: &str) -> Self {
        Self {
            labels: LabelSet::with_language(language),
            ..Self::default()
        }
    }

    pub fn parse_linkbase(&mut self, data: &[u8]) -> Result<()> {
        let doc = XmlDocument::parse(data)?;
        let root = &doc.root;

        // Linkbases may also be embedded in a schema's appinfo
        let linkbases = if root.is(ns::LINK, "linkbase") {
            vec![root]
        } else {
            root.descendants(ns::LINK, "linkbase")
        };
        if linkbases.is_empty() {
            return Err(Error::MissingRootElement {
                expected: "link:linkbase",
                found: root.qualified_name().to_string(),
            });
        }

        for linkbase in linkbases {
            for child in &linkbase.children {
                if child.namespace.as_deref() != Some(ns::LINK) {
                    continue;
                }
                match child.local.as_str() {
                    "presentationLink" => self.parse_extended_link(child, LinkKind::Presentation),
                    "calculationLink" => self.parse_extended_link(child, LinkKind::Calculation),
                    "labelLink" => self.parse_label_link(child),
                    "roleRef" => {
                        if let Some(uri) = child.attr("roleURI") {
                            self.note_role(uri);
                        }
                    }
                    _ => {}
                }
            }
        }

        tracing::debug!(
            presentation = self.presentation.len(),
            calculation = self.calculation.len(),
            labels = self.labels.len(),
            "linkbase parsed"
        );
        Ok(())
    }

    pub fn presentation(&self) -> &[Relationship] {
        &self.presentation
    }

    pub fn calculation(&self) -> &[Relationship] {
        &self.calculation
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Role URIs referenced or used by any extended link, in first-seen order.
    pub fn role_refs(&self) -> &[CompactString] {
        &self.role_refs
    }

    pub fn into_parts(self) -> (Vec<Relationship>, Vec<Relationship>, LabelSet) {
        (self.presentation, self.calculation, self.labels)
    }

    fn note_role(&mut self, uri: &str) {
        if !self.role_refs.iter().any(|r| r.as_str() == uri) {
            self.role_refs.push(CompactString::from(uri));
        }
    }

    fn parse_extended_link(&mut self, link: &Element, kind: LinkKind) {
        let role = CompactString::from(link.xlink("role").unwrap_or(DEFAULT_LINK_ROLE));
        self.note_role(&role);
        let locators = locators(link);

        let (arc_name, arcrole) = match kind {
            LinkKind::Presentation => ("presentationArc", PARENT_CHILD),
            LinkKind::Calculation => ("calculationArc", SUMMATION_ITEM),
        };

        for arc in link.children_named(ns::LINK, arc_name) {
            if arc.xlink("arcrole") != Some(arcrole) {
                continue;
            }
            let (Some(from), Some(to)) = (arc.xlink("from"), arc.xlink("to")) else {
                continue;
            };
            let (Some(parents), Some(children)) = (locators.get(from), locators.get(to)) else {
                tracing::debug!(from, to, role = %role, "arc references unknown locator");
                continue;
            };

            let order = arc.attr("order").and_then(|o| o.trim().parse().ok()).unwrap_or(1.0);
            let priority = arc.attr("priority").and_then(|p| p.trim().parse().ok()).unwrap_or(0);
            let prohibited = arc.attr("use") == Some("prohibited");
            let weight = match kind {
                LinkKind::Calculation => {
                    Some(arc.attr("weight").and_then(|w| w.trim().parse().ok()).unwrap_or(1.0))
                }
                LinkKind::Presentation => None,
            };
            let preferred_label = arc.attr("preferredLabel").map(CompactString::from);

            // A locator label may stand for several concepts; every pairing is an arc
            for parent in parents {
                for child in children {
                    self.next_order += 1;
                    let target = match kind {
                        LinkKind::Presentation => &mut self.presentation,
                        LinkKind::Calculation => &mut self.calculation,
                    };
                    target.push(Relationship {
                        kind,
                        from: parent.clone(),
                        to: child.clone(),
                        role: role.clone(),
                        order,
                        weight,
                        preferred_label: preferred_label.clone(),
                        priority,
                        prohibited,
                        document_order: self.next_order,
                    });
                }
            }
        }
    }

    fn parse_label_link(&mut self, link: &Element) {
        let locators = locators(link);

        let mut resources: AHashMap<&str, Vec<&Element>> = AHashMap::new();
        for label in link.children_named(ns::LINK, "label") {
            if let Some(key) = label.xlink("label") {
                resources.entry(key).or_default().push(label);
            }
        }

        for arc in link.children_named(ns::LINK, "labelArc") {
            if arc.xlink("arcrole").is_some_and(|a| a != CONCEPT_LABEL) {
                continue;
            }
            let (Some(from), Some(to)) = (arc.xlink("from"), arc.xlink("to")) else {
                continue;
            };
            let (Some(concepts), Some(labels)) = (locators.get(from), resources.get(to)) else {
                continue;
            };
            for concept in concepts {
                for label in labels {
                    let role = label.xlink("role").unwrap_or(roles::STANDARD);
                    let lang = label.attr_ns(ns::XML, "lang").unwrap_or("en");
                    self.labels.insert(concept.clone(), role, lang, label.deep_text());
                }
            }
        }
    }
}

/// Locator label to the concepts it points at.
fn locators(link: &Element) -> AHashMap<&str, Vec<ConceptId>> {
    let mut map: AHashMap<&str, Vec<ConceptId>> = AHashMap::new();
    for loc in link.children_named(ns::LINK, "loc") {
        let (Some(label), Some(href)) = (loc.xlink("label"), loc.xlink("href")) else {
            continue;
        };
        match href_to_concept(href) {
            Some(concept) => map.entry(label).or_default().push(concept),
            None => tracing::debug!(href, "locator href without a concept fragment"),
        }
    }
    map
}
