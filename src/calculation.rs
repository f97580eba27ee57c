// Calculation linkbase resolution and weight validation
use crate::context::ResolutionContext;
use crate::diagnostics::{Diagnostics, WeightMismatch};
use crate::network::build_trees;
use crate::relationship::{EffectiveRelationships, LinkKind, Relationship};
use crate::schema::{ElementCatalog, RoleType};
use crate::tree::{role_for, Tree};
use compact_str::CompactString;
use std::collections::BTreeMap;

/// Checks a summation weight against the balance types of both ends: equal
/// balances need `+1`, opposite balances `-1`. Unknown balances always pass.
pub fn validate_weight(rel: &Relationship, elements: &ElementCatalog) -> bool {
    match (elements.balance(&rel.from), elements.balance(&rel.to)) {
        (Some(parent), Some(child)) => {
            let expected = if parent == child { 1.0 } else { -1.0 };
            rel.weight() == expected
        }
        _ => true,
    }
}

/// One calculation tree per role. Weights that disagree with balance types
/// stay in the tree as published and are reported.
pub fn build_calculation_trees(
    effective: &EffectiveRelationships,
    roles: &[RoleType],
    ctx: &ResolutionContext<'_>,
    diagnostics: &mut Diagnostics,
) -> BTreeMap<CompactString, Tree> {
    for rel in effective.iter() {
        if validate_weight(rel, ctx.elements) {
            continue;
        }
        if let (Some(parent_balance), Some(child_balance)) =
            (ctx.elements.balance(&rel.from), ctx.elements.balance(&rel.to))
        {
            diagnostics.weight_mismatch(WeightMismatch {
                role: rel.role.clone(),
                parent: rel.from.clone(),
                child: rel.to.clone(),
                weight: rel.weight(),
                parent_balance,
                child_balance,
            });
        }
    }

    build_trees(effective, ctx.config.parallel, |uri, rels| {
        Tree::build(LinkKind::Calculation, role_for(uri, roles), rels, ctx.elements)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::label::LabelSet;
    use crate::schema::{Balance, ElementInfo};
    use crate::standard::ConceptMapper;
    use pretty_assertions::assert_eq;

    const ROLE: &str = "http://acme.example/role/IncomeStatement";

    fn catalog() -> ElementCatalog {
        let mut elements = ElementCatalog::new();
        for (concept, balance) in [
            ("us-gaap:GrossProfit", Balance::Credit),
            ("us-gaap:Revenues", Balance::Credit),
            ("us-gaap:CostOfRevenue", Balance::Debit),
        ] {
            elements.insert(
                concept,
                ElementInfo {
                    balance: Some(balance),
                    ..ElementInfo::default()
                },
            );
        }
        elements
    }

    #[test]
    fn test_weight_rule() {
        let elements = catalog();
        let calc = |to: &str, weight: f64| {
            Relationship::calculation(ROLE, "us-gaap:GrossProfit", to, 1.0, weight)
        };

        // Same balance
        assert!(validate_weight(&calc("us-gaap:Revenues", 1.0), &elements));
        assert!(!validate_weight(&calc("us-gaap:Revenues", -1.0), &elements));
        assert!(!validate_weight(&calc("us-gaap:Revenues", 0.5), &elements));
        // Opposite balance
        assert!(validate_weight(&calc("us-gaap:CostOfRevenue", -1.0), &elements));
        assert!(!validate_weight(&calc("us-gaap:CostOfRevenue", 1.0), &elements));
        // Unknown balance
        assert!(validate_weight(&calc("acme:Other", 1.0), &elements));
        assert!(validate_weight(&calc("acme:Other", -7.0), &elements));
    }

    #[test]
    fn test_mismatched_weight_kept_and_reported() {
        let elements = catalog();
        let labels = LabelSet::new();
        let mapper = ConceptMapper::new();
        let config = EngineConfig::default();
        let ctx = ResolutionContext::new(&elements, &labels, &mapper, &config);

        let rels = vec![
            Relationship::calculation(ROLE, "us-gaap:GrossProfit", "us-gaap:Revenues", 1.0, 1.0),
            Relationship::calculation(
                ROLE,
                "us-gaap:GrossProfit",
                "us-gaap:CostOfRevenue",
                2.0,
                1.0,
            ),
        ];
        let mut diagnostics = Diagnostics::new();
        let effective = EffectiveRelationships::resolve(&rels, &mut diagnostics);
        let trees = build_calculation_trees(&effective, &[], &ctx, &mut diagnostics);

        assert_eq!(diagnostics.weight_mismatches.len(), 1);
        let mismatch = &diagnostics.weight_mismatches[0];
        assert_eq!(mismatch.child, "us-gaap:CostOfRevenue");
        assert_eq!(mismatch.parent_balance, Balance::Credit);

        let cost = trees[ROLE].get("us-gaap:CostOfRevenue").unwrap();
        assert_eq!(cost.weight, Some(1.0));
    }
}
