//! Association-rule recommendations.
//!
//! A rule fires only when its antecedent set equals the selected product set
//! exactly; a rule on {A} says nothing about a basket holding {A, B}. Each
//! consequent of a firing rule gains that rule's confidence. Products already
//! selected are never recommended.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use db::{
    Store,
    models::association_rule::{RuleAntecedent, RuleConsequent},
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use super::error::CommerceError;

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;
pub const MAX_RECOMMENDATION_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub product_ids: Vec<Uuid>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ScoredProduct {
    pub product_id: Uuid,
    /// Σ confidence over the matching rules recommending this product
    pub score: f64,
    pub rule_count: usize,
    pub avg_lift: f64,
    pub max_lift: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Recommendation {
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub score: f64,
    pub rule_count: usize,
    pub avg_lift: f64,
    pub max_lift: f64,
}

#[derive(Default)]
struct Accumulator {
    score: f64,
    rule_count: usize,
    lift_sum: f64,
    max_lift: f64,
}

/// Rank consequents of the rules whose antecedent set equals `selected`.
///
/// `antecedents` must hold the full antecedent sets of every candidate rule.
/// Ties on score are broken by product id ascending.
pub fn score(
    selected: &BTreeSet<Uuid>,
    antecedents: &[RuleAntecedent],
    consequents: &[RuleConsequent],
) -> Vec<ScoredProduct> {
    if selected.is_empty() {
        return Vec::new();
    }

    let mut sets: HashMap<i64, BTreeSet<Uuid>> = HashMap::new();
    for a in antecedents {
        sets.entry(a.rule_id).or_default().insert(a.product_id);
    }

    let mut scores: BTreeMap<Uuid, Accumulator> = BTreeMap::new();
    for c in consequents {
        let fires = sets.get(&c.rule_id).is_some_and(|set| set == selected);
        if !fires || selected.contains(&c.product_id) {
            continue;
        }
        let acc = scores.entry(c.product_id).or_default();
        acc.score += c.confidence;
        acc.rule_count += 1;
        acc.lift_sum += c.lift;
        acc.max_lift = if acc.rule_count == 1 {
            c.lift
        } else {
            acc.max_lift.max(c.lift)
        };
    }

    let mut ranked: Vec<ScoredProduct> = scores
        .into_iter()
        .map(|(product_id, acc)| ScoredProduct {
            product_id,
            score: acc.score,
            rule_count: acc.rule_count,
            avg_lift: acc.lift_sum / acc.rule_count as f64,
            max_lift: acc.max_lift,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    ranked
}

#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn Store>,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<Recommendation>, CommerceError> {
        let selected: BTreeSet<Uuid> = request.product_ids.iter().copied().collect();
        if selected.is_empty() {
            return Ok(Vec::new());
        }
        let limit = request
            .limit
            .unwrap_or(DEFAULT_RECOMMENDATION_LIMIT)
            .clamp(1, MAX_RECOMMENDATION_LIMIT);

        let ids: Vec<Uuid> = selected.iter().copied().collect();
        let candidates = self.store.rules_with_any_antecedent(&ids).await?;
        if candidates.is_empty() {
            debug!(selected = ids.len(), "No candidate rules");
            return Ok(Vec::new());
        }
        let antecedents = self.store.rule_antecedents(&candidates).await?;
        let consequents = self.store.rule_consequents(&candidates).await?;

        let mut ranked = score(&selected, &antecedents, &consequents);
        ranked.truncate(limit);
        debug!(
            selected = ids.len(),
            candidates = candidates.len(),
            recommended = ranked.len(),
            "Scored association rules"
        );

        let product_ids: Vec<Uuid> = ranked.iter().map(|r| r.product_id).collect();
        let products: HashMap<Uuid, _> = self
            .store
            .find_products(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(ranked
            .into_iter()
            .filter_map(|r| {
                products.get(&r.product_id).map(|p| Recommendation {
                    product_id: r.product_id,
                    name: p.name.clone(),
                    category: p.category.clone(),
                    score: r.score,
                    rule_count: r.rule_count,
                    avg_lift: r.avg_lift,
                    max_lift: r.max_lift,
                })
            })
            .collect())
    }
}
