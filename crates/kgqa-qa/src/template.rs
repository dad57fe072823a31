//! Category-driven query templates.

use kgqa_store::EdgeQuery;

use crate::category::Category;

/// Row cap for the generic template.
pub const GENERIC_LIMIT: usize = 5;

/// Build the read query for a question.
///
/// Uses the first two entities; any further ones are ignored. Returns `None`
/// when fewer than two entities were extracted. Specific categories look for
/// whitelisted edges between the two entities in either direction. `Other`
/// and unrecognized labels look for any edge touching either entity, capped
/// at [`GENERIC_LIMIT`] rows.
pub fn generate_query(entities: &[String], category: &Category) -> Option<EdgeQuery> {
    let [e1, e2, ..] = entities else {
        return None;
    };
    let [src, rel, dst] = category.columns();

    let query = match category.relation_types() {
        Some(types) => EdgeQuery::between(e1.clone(), e2.clone()).with_relations(types.iter().copied()),
        None => EdgeQuery::touching(vec![e1.clone(), e2.clone()]).with_limit(GENERIC_LIMIT),
    };
    Some(query.with_columns(src, rel, dst))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgqa_store::{Endpoints, RelationFilter};
    use proptest::prelude::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn fewer_than_two_entities_gives_no_query() {
        assert!(generate_query(&[], &Category::Causal).is_none());
        assert!(generate_query(&names(&["Aspirin"]), &Category::Other).is_none());
    }

    #[test]
    fn specific_category_uses_whitelist_in_both_directions() {
        let q = generate_query(&names(&["Smoking", "Lung Cancer", "Ignored"]), &Category::Causal)
            .unwrap();
        assert_eq!(
            q.endpoints,
            Endpoints::Between {
                first: "Smoking".into(),
                second: "Lung Cancer".into()
            }
        );
        let RelationFilter::OneOf(types) = &q.relations else {
            panic!("causal query must carry a whitelist");
        };
        assert!(types.iter().any(|t| t == "CAUSES"));
        assert!(!types.iter().any(|t| t == "IS_BETTER_THAN"));
        assert_eq!(q.limit, None);
        assert_eq!(q.columns, ["cause", "relation", "effect"].map(String::from));

        let cypher = q.to_cypher().text;
        assert!(cypher.contains("$e1})-[r]->(b:Node {name: $e2})"));
        assert!(cypher.contains("$e2})-[r]->(b:Node {name: $e1})"));
    }

    #[test]
    fn other_and_unrecognized_use_the_generic_template() {
        for cat in [Category::Other, Category::Unrecognized("diagnostic".into())] {
            let q = generate_query(&names(&["A", "B"]), &cat).unwrap();
            assert_eq!(q.relations, RelationFilter::Any);
            assert_eq!(q.limit, Some(GENERIC_LIMIT));
            assert!(matches!(q.endpoints, Endpoints::Touching { ref names } if names.len() == 2));
        }
    }

    #[test]
    fn duplicate_entities_are_not_collapsed() {
        let q = generate_query(&names(&["Stress", "Stress"]), &Category::Association).unwrap();
        assert_eq!(
            q.endpoints,
            Endpoints::Between {
                first: "Stress".into(),
                second: "Stress".into()
            }
        );
    }

    fn any_category() -> impl Strategy<Value = Category> {
        prop_oneof![
            Just(Category::Comparison),
            Just(Category::Causal),
            Just(Category::Effectiveness),
            Just(Category::Association),
            Just(Category::Other),
            "[a-z]{1,12}".prop_map(Category::Unrecognized),
        ]
    }

    proptest! {
        #[test]
        fn query_exists_iff_two_entities(
            entities in prop::collection::vec("[A-Za-z ]{1,10}", 0..5),
            cat in any_category(),
        ) {
            let q = generate_query(&entities, &cat);
            prop_assert_eq!(q.is_some(), entities.len() >= 2);
        }

        #[test]
        fn specific_queries_only_follow_whitelisted_types(cat in any_category()) {
            let q = generate_query(&names(&["X", "Y"]), &cat).unwrap();
            match (cat.relation_types(), &q.relations) {
                (Some(allowed), RelationFilter::OneOf(types)) => {
                    prop_assert!(types.iter().all(|t| allowed.contains(&t.as_str())));
                    prop_assert_eq!(q.limit, None);
                }
                (None, RelationFilter::Any) => {
                    prop_assert_eq!(q.limit, Some(GENERIC_LIMIT));
                }
                other => {
                    prop_assert!(false, "unexpected filter {:?}", other);
                }
            }
        }
    }
}
