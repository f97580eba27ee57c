// Arc value objects plus the priority/prohibition and cycle resolution shared
// by presentation and calculation networks
use crate::diagnostics::{CycleDetected, Diagnostics, SelfReference};
use crate::model::ConceptId;
use ahash::{AHashMap, AHashSet};
use compact_str::CompactString;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LinkKind {
    Presentation,
    Calculation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    pub kind: LinkKind,
    pub from: ConceptId,
    pub to: ConceptId,
    pub role: CompactString,
    pub order: f64,
    /// Calculation arcs only.
    pub weight: Option<f64>,
    /// Presentation arcs only.
    pub preferred_label: Option<CompactString>,
    pub priority: i32,
    pub prohibited: bool,
    /// Position among all arcs of the filing, used as the ordering tie-break.
    pub document_order: usize,
}

impl Relationship {
    pub fn presentation(
        role: impl Into<CompactString>,
        from: impl Into<ConceptId>,
        to: impl Into<ConceptId>,
        order: f64,
    ) -> Self {
        Self {
            kind: LinkKind::Presentation,
            from: from.into(),
            to: to.into(),
            role: role.into(),
            order,
            weight: None,
            preferred_label: None,
            priority: 0,
            prohibited: false,
            document_order: 0,
        }
    }

    pub fn calculation(
        role: impl Into<CompactString>,
        from: impl Into<ConceptId>,
        to: impl Into<ConceptId>,
        order: f64,
        weight: f64,
    ) -> Self {
        Self {
            kind: LinkKind::Calculation,
            weight: Some(weight),
            ..Self::presentation(role, from, to, order)
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn prohibit(mut self) -> Self {
        self.prohibited = true;
        self
    }

    pub fn with_preferred_label(mut self, role: impl Into<CompactString>) -> Self {
        self.preferred_label = Some(role.into());
        self
    }

    pub fn at(mut self, document_order: usize) -> Self {
        self.document_order = document_order;
        self
    }

    /// Summation weight, 1.0 when the arc carries none.
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

/// Reduces a relationship list to its effective set.
///
/// Arcs are grouped by `(from, to, role)`. Within a group the highest priority
/// decides: if any arc at that priority is prohibited the relationship is
/// dropped altogether, lower priorities are never consulted. Otherwise the
/// first arc in document order at that priority is kept. Self-referencing
/// arcs are dropped before grouping. Groups keep first-appearance order.
pub fn resolve_effective(
    relationships: &[Relationship],
    diagnostics: &mut Diagnostics,
) -> Vec<Relationship> {
    let mut groups: Vec<Vec<&Relationship>> = Vec::new();
    let mut index: AHashMap<(&str, &str, &str), usize> = AHashMap::new();

    for rel in relationships {
        if rel.from == rel.to {
            diagnostics.self_reference(SelfReference {
                role: rel.role.clone(),
                concept: rel.from.clone(),
            });
            continue;
        }
        let key = (rel.from.as_str(), rel.to.as_str(), rel.role.as_str());
        match index.get(&key) {
            Some(&slot) => groups[slot].push(rel),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![rel]);
            }
        }
    }

    groups
        .into_iter()
        .filter_map(|mut group| {
            // Stable sort keeps document order among equal priorities
            group.sort_by(|a, b| b.priority.cmp(&a.priority));
            let top = group[0].priority;
            let overridden = group
                .iter()
                .take_while(|r| r.priority == top)
                .any(|r| r.prohibited);
            (!overridden).then(|| group[0].clone())
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Back edges found by depth-first search; removing them leaves a DAG.
    pub back_edges: AHashSet<(ConceptId, ConceptId)>,
    /// Concepts inside a strongly connected component of size > 1, sorted.
    pub concepts: Vec<ConceptId>,
}

impl CycleReport {
    pub fn is_acyclic(&self) -> bool {
        self.back_edges.is_empty()
    }
}

/// Finds cycles among the relationships of one role. Traversal starts from
/// concepts in first-appearance order so the result is deterministic.
pub fn detect_cycles(relationships: &[Relationship]) -> CycleReport {
    let mut graph = Graph::default();
    for rel in relationships {
        let from = graph.node(&rel.from);
        let to = graph.node(&rel.to);
        graph.edges[from].push(to);
    }

    let mut back_edges = AHashSet::new();
    let mut state = vec![Visit::New; graph.names.len()];
    for start in 0..graph.names.len() {
        if state[start] == Visit::New {
            find_back_edges(&graph, start, &mut state, &mut back_edges);
        }
    }

    let concepts = if back_edges.is_empty() {
        Vec::new()
    } else {
        cyclic_components(&graph)
            .into_iter()
            .map(|i| graph.names[i].clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };

    CycleReport {
        back_edges: back_edges
            .into_iter()
            .map(|(from, to)| (graph.names[from].clone(), graph.names[to].clone()))
            .collect(),
        concepts,
    }
}

/// Full resolution for one role: conflict resolution, then cycle exclusion.
/// Cyclic edges are reported and left out, never followed.
pub fn resolve_role(
    role: &str,
    relationships: &[Relationship],
    diagnostics: &mut Diagnostics,
) -> Vec<Relationship> {
    let effective = resolve_effective(relationships, diagnostics);
    let report = detect_cycles(&effective);
    if report.is_acyclic() {
        return effective;
    }

    diagnostics.cycle(CycleDetected {
        role: CompactString::from(role),
        concepts: report.concepts.clone(),
    });
    effective
        .into_iter()
        .filter(|rel| !report.back_edges.contains(&(rel.from.clone(), rel.to.clone())))
        .collect()
}

/// Effective, acyclic relationships of one linkbase type, grouped by role in
/// first-appearance order. Built once per filing before any tree.
#[derive(Debug, Clone, Default)]
pub struct EffectiveRelationships {
    pub by_role: Vec<(CompactString, Vec<Relationship>)>,
}

impl EffectiveRelationships {
    pub fn resolve(relationships: &[Relationship], diagnostics: &mut Diagnostics) -> Self {
        let mut roles: Vec<(CompactString, Vec<Relationship>)> = Vec::new();
        let mut slots: AHashMap<&str, usize> = AHashMap::new();
        for rel in relationships {
            let slot = *slots.entry(rel.role.as_str()).or_insert_with(|| {
                roles.push((rel.role.clone(), Vec::new()));
                roles.len() - 1
            });
            roles[slot].1.push(rel.clone());
        }

        let by_role = roles
            .into_iter()
            .map(|(role, rels)| {
                let resolved = resolve_role(&role, &rels, diagnostics);
                (role, resolved)
            })
            .filter(|(_, rels)| !rels.is_empty())
            .collect();
        Self { by_role }
    }

    pub fn role(&self, uri: &str) -> Option<&[Relationship]> {
        self.by_role
            .iter()
            .find(|(role, _)| role.as_str() == uri)
            .map(|(_, rels)| rels.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.by_role.iter().flat_map(|(_, rels)| rels.iter())
    }
}

#[derive(Default)]
struct Graph<'a> {
    names: Vec<ConceptId>,
    ids: AHashMap<&'a str, usize>,
    edges: Vec<Vec<usize>>,
}

impl<'a> Graph<'a> {
    fn node(&mut self, concept: &'a ConceptId) -> usize {
        if let Some(&id) = self.ids.get(concept.as_str()) {
            return id;
        }
        let id = self.names.len();
        self.names.push(concept.clone());
        self.edges.push(Vec::new());
        self.ids.insert(concept.as_str(), id);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnPath,
    Done,
}

fn find_back_edges(
    graph: &Graph<'_>,
    node: usize,
    state: &mut [Visit],
    back_edges: &mut AHashSet<(usize, usize)>,
) {
    state[node] = Visit::OnPath;
    for &child in &graph.edges[node] {
        match state[child] {
            Visit::New => find_back_edges(graph, child, state, back_edges),
            Visit::OnPath => {
                back_edges.insert((node, child));
            }
            Visit::Done => {}
        }
    }
    state[node] = Visit::Done;
}

/// Tarjan's algorithm; returns members of every component with more than one node.
fn cyclic_components(graph: &Graph<'_>) -> Vec<usize> {
    struct Tarjan<'g, 'a> {
        graph: &'g Graph<'a>,
        index: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        next: usize,
        cyclic: Vec<usize>,
    }

    impl Tarjan<'_, '_> {
        fn connect(&mut self, v: usize) {
            self.index[v] = Some(self.next);
            self.lowlink[v] = self.next;
            self.next += 1;
            self.stack.push(v);
            self.on_stack[v] = true;

            let graph = self.graph;
            for &w in &graph.edges[v] {
                match self.index[w] {
                    None => {
                        self.connect(w);
                        self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                    }
                    Some(w_index) if self.on_stack[w] => {
                        self.lowlink[v] = self.lowlink[v].min(w_index);
                    }
                    Some(_) => {}
                }
            }

            if Some(self.lowlink[v]) == self.index[v] {
                let mut component = Vec::new();
                while let Some(w) = self.stack.pop() {
                    self.on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                if component.len() > 1 {
                    self.cyclic.extend(component);
                }
            }
        }
    }

    let n = graph.names.len();
    let mut tarjan = Tarjan {
        graph,
        index: vec![None; n],
        lowlink: vec![0; n],
        on_stack: vec![false; n],
        stack: Vec::new(),
        next: 0,
        cyclic: Vec::new(),
    };
    for v in 0..n {
        if tarjan.index[v].is_none() {
            tarjan.connect(v);
        }
    }
    tarjan.cyclic
}
