// Per-role tree collections for one linkbase type
use crate::relationship::{EffectiveRelationships, LinkKind, Relationship};
use crate::schema::RoleType;
use crate::tree::Tree;
use compact_str::CompactString;
use serde::Serialize;
use std::collections::BTreeMap;

/// All trees of one linkbase type, keyed by role URI.
#[derive(Debug, Clone, Serialize)]
pub struct Network {
    pub kind: LinkKind,
    pub trees: BTreeMap<CompactString, Tree>,
}

impl Network {
    pub fn new(kind: LinkKind, trees: BTreeMap<CompactString, Tree>) -> Self {
        Self { kind, trees }
    }

    pub fn get(&self, role: &str) -> Option<&Tree> {
        self.trees.get(role)
    }

    /// Trees in filing order: role order hint first, then URI.
    pub fn ordered(&self) -> Vec<&Tree> {
        let mut trees: Vec<&Tree> = self.trees.values().collect();
        trees.sort_by(|a, b| {
            let key = |t: &Tree| t.role.order.unwrap_or(u32::MAX);
            key(a).cmp(&key(b)).then_with(|| a.role.uri.cmp(&b.role.uri))
        });
        trees
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

/// Builds one tree per role. Roles are independent once the effective
/// relationships exist, so with the `parallel` feature they build on rayon.
#[cfg(feature = "parallel")]
pub(crate) fn build_trees<F>(
    effective: &EffectiveRelationships,
    parallel: bool,
    build: F,
) -> BTreeMap<CompactString, Tree>
where
    F: Fn(&str, &[Relationship]) -> Option<Tree> + Sync + Send,
{
    use rayon::prelude::*;

    if parallel {
        effective
            .by_role
            .par_iter()
            .filter_map(|(role, rels)| {
                build(role.as_str(), rels.as_slice()).map(|tree| (role.clone(), tree))
            })
            .collect()
    } else {
        build_sequential(effective, build)
    }
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn build_trees<F>(
    effective: &EffectiveRelationships,
    _parallel: bool,
    build: F,
) -> BTreeMap<CompactString, Tree>
where
    F: Fn(&str, &[Relationship]) -> Option<Tree>,
{
    build_sequential(effective, build)
}

fn build_sequential<F>(
    effective: &EffectiveRelationships,
    build: F,
) -> BTreeMap<CompactString, Tree>
where
    F: Fn(&str, &[Relationship]) -> Option<Tree>,
{
    effective
        .by_role
        .iter()
        .filter_map(|(role, rels)| {
            build(role.as_str(), rels.as_slice()).map(|tree| (role.clone(), tree))
        })
        .collect()
}

/// Roles declared by schemas plus any used only in linkbases, in filing order.
pub fn collect_roles(declared: &[RoleType], used: &[CompactString]) -> Vec<RoleType> {
    let mut roles: Vec<RoleType> = Vec::with_capacity(declared.len() + used.len());
    for role in declared {
        if !roles.iter().any(|r| r.uri == role.uri) {
            roles.push(role.clone());
        }
    }
    for uri in used {
        if !roles.iter().any(|r| r.uri == *uri) {
            roles.push(RoleType::new(uri.clone(), None));
        }
    }
    roles.sort_by(|a, b| {
        a.order
            .unwrap_or(u32::MAX)
            .cmp(&b.order.unwrap_or(u32::MAX))
            .then_with(|| a.uri.cmp(&b.uri))
    });
    roles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_roles_orders_and_dedups() {
        let declared = vec![
            RoleType::new("http://acme.example/role/B", Some("0003 - Statement - B".to_string())),
            RoleType::new("http://acme.example/role/A", Some("0002 - Statement - A".to_string())),
        ];
        let used = vec![
            CompactString::from("http://acme.example/role/A"),
            CompactString::from("http://www.xbrl.org/2003/role/link"),
        ];
        let roles = collect_roles(&declared, &used);
        let uris: Vec<&str> = roles.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(
            uris,
            vec![
                "http://acme.example/role/A",
                "http://acme.example/role/B",
                "http://www.xbrl.org/2003/role/link"
            ]
        );
    }
}
