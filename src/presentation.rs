// Presentation linkbase resolution
use crate::context::ResolutionContext;
use crate::label;
use crate::network::build_trees;
use crate::relationship::{EffectiveRelationships, LinkKind};
use crate::schema::RoleType;
use crate::tree::{role_for, Tree};
use compact_str::CompactString;
use std::collections::BTreeMap;

/// One presentation tree per role. Each node's label role is the one its
/// incoming arc asked for when the label set has it, the standard role
/// otherwise, and its display label is resolved against that role.
pub fn build_presentation_trees(
    effective: &EffectiveRelationships,
    roles: &[RoleType],
    ctx: &ResolutionContext<'_>,
) -> BTreeMap<CompactString, Tree> {
    build_trees(effective, ctx.config.parallel, |uri, rels| {
        let role_type = role_for(uri, roles);
        let mut tree = Tree::build(LinkKind::Presentation, role_type, rels, ctx.elements)?;
        for node in tree.nodes_mut() {
            if node.synthetic {
                continue;
            }
            let role = node
                .preferred_label
                .take()
                .filter(|role| ctx.labels.has(&node.concept, role))
                .unwrap_or_else(|| CompactString::from(label::roles::STANDARD));
            node.label = Some(label::resolve(&node.concept, Some(role.as_str()), ctx.labels));
            node.preferred_label = Some(role);
        }
        Some(tree)
    })
}
