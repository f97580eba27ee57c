// Arena trees shared by presentation and calculation networks
use crate::model::ConceptId;
use crate::relationship::{LinkKind, Relationship};
use crate::schema::{Balance, ElementCatalog, PeriodType, RoleType};
use ahash::{AHashMap, AHashSet};
use compact_str::CompactString;
use serde::Serialize;

pub type NodeId = usize;

/// Concept of the wrapper node placed above several real roots.
pub const SYNTHETIC_ROOT: &str = "__root__";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub concept: ConceptId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub depth: usize,
    pub order: f64,
    /// Calculation weight of the arc into this node.
    pub weight: Option<f64>,
    /// Label role requested by the arc into this node.
    pub preferred_label: Option<CompactString>,
    /// Display label, filled in for presentation trees.
    pub label: Option<String>,
    pub balance: Option<Balance>,
    pub period_type: Option<PeriodType>,
    pub is_abstract: bool,
    pub synthetic: bool,
}

impl Node {
    fn new(concept: ConceptId, parent: Option<NodeId>, depth: usize) -> Self {
        Self {
            concept,
            parent,
            children: Vec::new(),
            depth,
            order: 0.0,
            weight: None,
            preferred_label: None,
            label: None,
            balance: None,
            period_type: None,
            is_abstract: false,
            synthetic: false,
        }
    }
}

/// A rooted, acyclic tree for one role. Nodes live in an arena and refer to
/// each other by index; a concept reachable through several parents appears
/// once per path and the index points at its first occurrence.
#[derive(Debug, Clone, Serialize)]
pub struct Tree {
    pub kind: LinkKind,
    pub role: RoleType,
    nodes: Vec<Node>,
    root: NodeId,
    roots: Vec<NodeId>,
    #[serde(skip)]
    index: AHashMap<ConceptId, NodeId>,
}

impl Tree {
    /// Builds the tree for one role from its effective, acyclic relationships.
    /// Returns `None` when there is nothing to build.
    pub fn build(
        kind: LinkKind,
        role: RoleType,
        relationships: &[Relationship],
        elements: &ElementCatalog,
    ) -> Option<Self> {
        if relationships.is_empty() {
            return None;
        }

        let mut children_of: AHashMap<&str, Vec<&Relationship>> = AHashMap::new();
        let mut parents: Vec<&ConceptId> = Vec::new();
        let mut targets: AHashSet<&str> = AHashSet::new();
        for rel in relationships {
            let siblings = children_of.entry(rel.from.as_str()).or_default();
            if siblings.is_empty() {
                parents.push(&rel.from);
            }
            siblings.push(rel);
            targets.insert(rel.to.as_str());
        }
        for siblings in children_of.values_mut() {
            siblings.sort_by(|a, b| {
                a.order
                    .total_cmp(&b.order)
                    .then(a.document_order.cmp(&b.document_order))
            });
        }

        let mut top: Vec<&ConceptId> = parents
            .iter()
            .copied()
            .filter(|concept| !targets.contains(concept.as_str()))
            .collect();
        if top.is_empty() {
            top = parents;
        }

        let mut tree = Tree {
            kind,
            role,
            nodes: Vec::new(),
            root: 0,
            roots: Vec::new(),
            index: AHashMap::new(),
        };
        let mut builder = Builder {
            children_of: &children_of,
            elements,
            path: Vec::new(),
        };

        if let [single] = top.as_slice() {
            let root = builder.attach(&mut tree, *single, None, 0, None);
            tree.root = root;
            tree.roots.push(root);
        } else {
            let mut wrapper = Node::new(CompactString::from(SYNTHETIC_ROOT), None, 0);
            wrapper.synthetic = true;
            tree.nodes.push(wrapper);
            for concept in top {
                let id = builder.attach(&mut tree, concept, Some(0), 0, None);
                tree.nodes[0].children.push(id);
                tree.roots.push(id);
            }
        }

        Some(tree)
    }

    pub fn root(&self) -> &Node {
        &self.nodes[self.root]
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Real roots in document order; a single entry unless the root is synthetic.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    pub fn get(&self, concept: &str) -> Option<&Node> {
        self.index.get(concept).map(|&id| &self.nodes[id])
    }

    pub fn node_id(&self, concept: &str) -> Option<NodeId> {
        self.index.get(concept).copied()
    }

    pub fn contains(&self, concept: &str) -> bool {
        self.index.contains_key(concept)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        self.nodes[id].children.iter().map(|&child| &self.nodes[child])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order traversal in sibling order, skipping the synthetic wrapper.
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if !node.synthetic {
                order.push(id);
            }
            stack.extend(node.children.iter().rev());
        }
        order
    }

    /// Distinct concepts of the tree.
    pub fn concepts(&self) -> impl Iterator<Item = &ConceptId> {
        self.index.keys()
    }
}

struct Builder<'r, 'e> {
    children_of: &'r AHashMap<&'r str, Vec<&'r Relationship>>,
    elements: &'e ElementCatalog,
    path: Vec<&'r str>,
}

impl<'r> Builder<'r, '_> {
    fn attach(
        &mut self,
        tree: &mut Tree,
        concept: &'r ConceptId,
        parent: Option<NodeId>,
        depth: usize,
        via: Option<&Relationship>,
    ) -> NodeId {
        let mut node = Node::new(concept.clone(), parent, depth);
        if let Some(info) = self.elements.get(concept) {
            node.balance = info.balance;
            node.period_type = info.period_type;
            node.is_abstract = info.is_abstract;
        }
        if let Some(rel) = via {
            node.order = rel.order;
            node.preferred_label = rel.preferred_label.clone();
            if tree.kind == LinkKind::Calculation {
                node.weight = Some(rel.weight());
            }
        }

        let id = tree.nodes.len();
        tree.nodes.push(node);
        tree.index.entry(concept.clone()).or_insert(id);

        self.path.push(concept.as_str());
        let children_of = self.children_of;
        if let Some(children) = children_of.get(concept.as_str()) {
            for rel in children {
                // Inputs are acyclic; the path check keeps a bad input from recursing forever
                if self.path.contains(&rel.to.as_str()) {
                    continue;
                }
                let child = self.attach(tree, &rel.to, Some(id), depth + 1, Some(*rel));
                tree.nodes[id].children.push(child);
            }
        }
        self.path.pop();
        id
    }
}

/// Role metadata for a URI, falling back to a bare role when no schema defines it.
pub fn role_for(uri: &str, roles: &[RoleType]) -> RoleType {
    roles
        .iter()
        .find(|role| role.uri.as_str() == uri)
        .cloned()
        .unwrap_or_else(|| RoleType::new(uri, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ElementInfo;
    use pretty_assertions::assert_eq;

    const ROLE: &str = "http://acme.example/role/BalanceSheet";

    fn build(rels: &[Relationship]) -> Tree {
        let role = RoleType::new(ROLE, None);
        Tree::build(LinkKind::Presentation, role, rels, &ElementCatalog::new()).unwrap()
    }

    fn concepts(tree: &Tree) -> Vec<&str> {
        tree.depth_first()
            .into_iter()
            .map(|id| tree.node(id).concept.as_str())
            .collect()
    }

    #[test]
    fn test_children_sorted_by_order_then_document_order() {
        let rels = vec![
            Relationship::presentation(ROLE, "Assets", "Cash", 2.0).at(0),
            Relationship::presentation(ROLE, "Assets", "Receivables", 1.0).at(1),
            Relationship::presentation(ROLE, "Assets", "Inventory", 2.0).at(2),
        ];
        let tree = build(&rels);
        assert_eq!(concepts(&tree), vec!["Assets", "Receivables", "Cash", "Inventory"]);
        assert_eq!(tree.root().concept, "Assets");
        assert_eq!(tree.get("Cash").map(|n| n.depth), Some(1));
    }

    #[test]
    fn test_multiple_roots_get_synthetic_wrapper() {
        let rels = vec![
            Relationship::presentation(ROLE, "Assets", "Cash", 1.0),
            Relationship::presentation(ROLE, "Liabilities", "Payables", 1.0),
        ];
        let tree = build(&rels);

        assert!(tree.root().synthetic);
        assert_eq!(tree.roots().len(), 2);
        assert_eq!(tree.get("Assets").map(|n| n.depth), Some(0));
        assert_eq!(concepts(&tree), vec!["Assets", "Cash", "Liabilities", "Payables"]);
    }

    #[test]
    fn test_shared_child_appears_under_each_parent() {
        let rels = vec![
            Relationship::presentation(ROLE, "Root", "A", 1.0),
            Relationship::presentation(ROLE, "Root", "B", 2.0),
            Relationship::presentation(ROLE, "A", "Shared", 1.0),
            Relationship::presentation(ROLE, "B", "Shared", 1.0),
        ];
        let tree = build(&rels);

        assert_eq!(concepts(&tree), vec!["Root", "A", "Shared", "B", "Shared"]);
        let first = tree.node_id("Shared").unwrap();
        assert_eq!(tree.node(first).parent, tree.node_id("A"));
    }

    #[test]
    fn test_every_node_reachable_exactly_once() {
        let rels = vec![
            Relationship::presentation(ROLE, "R", "A", 1.0),
            Relationship::presentation(ROLE, "A", "B", 1.0),
            Relationship::presentation(ROLE, "B", "C", 1.0),
            Relationship::presentation(ROLE, "R", "D", 2.0),
        ];
        let tree = build(&rels);
        let visited = tree.depth_first();
        assert_eq!(visited.len(), tree.len());
        let distinct: AHashSet<_> = visited.iter().collect();
        assert_eq!(distinct.len(), visited.len());
        for &id in &visited {
            if let Some(parent) = tree.node(id).parent {
                assert!(tree.node(parent).children.contains(&id));
                assert_eq!(tree.node(id).depth, tree.node(parent).depth + 1);
            }
        }
    }

    #[test]
    fn test_calculation_nodes_carry_weight_and_metadata() {
        let mut elements = ElementCatalog::new();
        elements.insert(
            "us-gaap:CostOfRevenue",
            ElementInfo {
                balance: Some(Balance::Debit),
                period_type: Some(PeriodType::Duration),
                ..ElementInfo::default()
            },
        );
        let rels = vec![Relationship::calculation(
            "r",
            "us-gaap:GrossProfit",
            "us-gaap:CostOfRevenue",
            2.0,
            -1.0,
        )];
        let role = RoleType::new("r", None);
        let tree = Tree::build(LinkKind::Calculation, role, &rels, &elements).unwrap();

        let cost = tree.get("us-gaap:CostOfRevenue").unwrap();
        assert_eq!(cost.weight, Some(-1.0));
        assert_eq!(cost.balance, Some(Balance::Debit));
        assert_eq!(tree.root().weight, None);
    }

    #[test]
    fn test_empty_input_builds_nothing() {
        let role = RoleType::new(ROLE, None);
        let tree = Tree::build(LinkKind::Presentation, role, &[], &ElementCatalog::new());
        assert!(tree.is_none());
    }
}
