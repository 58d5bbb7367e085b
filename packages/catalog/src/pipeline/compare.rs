//! Pricing comparison engine.
//!
//! [`compare`] is a pure function over already-loaded offerings; it never
//! touches the store and never fails. [`compare_models`] is the store-backed
//! entry point used by the HTTP layer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::traits::store::CatalogStore;
use crate::types::modality::Modality;
use crate::types::offering::OfferingView;

/// Added to the total before inverting, so free offerings stay finite.
const EFFICIENCY_EPSILON: f64 = 1e-6;

/// Rough characters per token, used for cost-per-character.
const CHARS_PER_TOKEN: f64 = 4.0;

fn default_mode() -> String {
    "sync".to_string()
}

fn default_tokens() -> u64 {
    1000
}

/// Token volumes a comparison is priced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageScenario {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Default for UsageScenario {
    fn default() -> Self {
        Self {
            input_tokens: default_tokens(),
            output_tokens: default_tokens(),
        }
    }
}

impl UsageScenario {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Cost per character divides by the total token count, so it must be non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.total_tokens() == 0 {
            return Err(CatalogError::InvalidUsage(
                "input_tokens and output_tokens cannot both be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Saturates at `u64::MAX` instead of overflowing.
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// A comparison request as received from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    /// Api model names to compare
    pub models: Vec<String>,

    /// Echoed back in the summary
    #[serde(default = "default_mode")]
    pub mode: String,

    #[serde(default = "default_tokens")]
    pub input_tokens: u64,

    #[serde(default = "default_tokens")]
    pub output_tokens: u64,
}

impl ComparisonRequest {
    pub fn new(models: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            models: models.into_iter().map(Into::into).collect(),
            mode: default_mode(),
            input_tokens: default_tokens(),
            output_tokens: default_tokens(),
        }
    }

    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.input_tokens = input_tokens;
        self.output_tokens = output_tokens;
        self
    }

    pub fn usage(&self) -> UsageScenario {
        UsageScenario::new(self.input_tokens, self.output_tokens)
    }
}

/// Per-token prices of one offering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferingPricing {
    /// Api model name
    pub model: String,
    pub provider: String,
    pub input_token_price: f64,
    pub output_token_price: f64,
    pub modality: Modality,
}

impl From<&OfferingView> for OfferingPricing {
    fn from(view: &OfferingView) -> Self {
        Self {
            model: view.offering.api_model_name.clone(),
            provider: view.provider_name.clone(),
            input_token_price: view.offering.input_price_per_token(),
            output_token_price: view.offering.output_price_per_token(),
            modality: view.offering.modalities.primary(),
        }
    }
}

/// One offering's costs under a usage scenario, with its ranks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelComparison {
    pub model: String,
    pub provider: String,
    pub input_token_price: f64,
    pub output_token_price: f64,
    pub modality: Modality,
    pub context_window: i32,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    pub input_cost_rank: usize,
    pub output_cost_rank: usize,
    pub total_cost_rank: usize,
    pub cost_per_character: f64,
    pub efficiency_score: f64,
}

impl ModelComparison {
    fn price(view: &OfferingView, usage: UsageScenario) -> Self {
        let pricing = OfferingPricing::from(view);
        let input_cost = pricing.input_token_price * usage.input_tokens as f64;
        let output_cost = pricing.output_token_price * usage.output_tokens as f64;
        let total_cost = input_cost + output_cost;

        let total_tokens = usage.total_tokens();
        let cost_per_character = if total_tokens == 0 {
            0.0
        } else {
            total_cost / total_tokens as f64 / CHARS_PER_TOKEN
        };

        Self {
            model: pricing.model,
            provider: pricing.provider,
            input_token_price: pricing.input_token_price,
            output_token_price: pricing.output_token_price,
            modality: pricing.modality,
            context_window: view.offering.context_window,
            input_cost,
            output_cost,
            total_cost,
            input_cost_rank: 0,
            output_cost_rank: 0,
            total_cost_rank: 0,
            cost_per_character,
            efficiency_score: 1.0 / (total_cost + EFFICIENCY_EPSILON),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

impl PriceRange {
    fn of(values: impl Iterator<Item = f64> + Clone) -> Option<Self> {
        let min = values.clone().reduce(f64::min)?;
        let max = values.reduce(f64::max)?;
        Some(Self {
            min,
            max,
            range: max - min,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceRanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_token_price: Option<PriceRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_token_price: Option<PriceRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheapestPick {
    pub model: String,
    pub provider: String,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficientPick {
    pub model: String,
    pub provider: String,
    pub efficiency_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostSavings {
    /// Most expensive total minus the cheapest total
    pub vs_most_expensive: f64,
    /// Average total minus the cheapest total
    pub vs_average: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recommendations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheapest_overall: Option<CheapestPick>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_efficient: Option<EfficientPick>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_input_cost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_output_cost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_savings: Option<CostSavings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TotalCostRange {
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub spread: f64,
}

/// The cheapest and most expensive quarter of the offerings by total cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostDistribution {
    pub cheapest_25_percent: Vec<ModelComparison>,
    pub most_expensive_25_percent: Vec<ModelComparison>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost_range: Option<TotalCostRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_distribution: Option<CostDistribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderAverage {
    pub name: String,
    pub average_cost: f64,
}

/// Provider maps keep the order in which providers first appear.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderInsights {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub provider_distribution: IndexMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheapest_provider: Option<ProviderAverage>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub provider_cost_comparison: IndexMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub total_models: usize,
    pub mode: String,
    pub scenario: UsageScenario,
    pub price_ranges: PriceRanges,
    pub recommendations: Recommendations,
    pub cost_analysis: CostAnalysis,
    pub provider_insights: ProviderInsights,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// Per-offering breakdown, in input order
    pub models: Vec<ModelComparison>,
    pub comparison_summary: ComparisonSummary,
}

/// Price every offering under `usage`, rank them, and summarize.
///
/// An empty input yields `total_models = 0` and empty summary sections.
pub fn compare(offerings: &[OfferingView], usage: UsageScenario, mode: &str) -> ComparisonReport {
    let mut models: Vec<ModelComparison> = offerings
        .iter()
        .map(|view| ModelComparison::price(view, usage))
        .collect();

    let by_input = rank_by(&models, |m| m.input_cost);
    let by_output = rank_by(&models, |m| m.output_cost);
    let by_total = rank_by(&models, |m| m.total_cost);
    for (rank, &i) in by_input.iter().enumerate() {
        models[i].input_cost_rank = rank + 1;
    }
    for (rank, &i) in by_output.iter().enumerate() {
        models[i].output_cost_rank = rank + 1;
    }
    for (rank, &i) in by_total.iter().enumerate() {
        models[i].total_cost_rank = rank + 1;
    }

    let comparison_summary = ComparisonSummary {
        total_models: models.len(),
        mode: mode.to_string(),
        scenario: usage,
        price_ranges: price_ranges(&models),
        recommendations: recommendations(&models),
        cost_analysis: cost_analysis(&models, &by_total),
        provider_insights: provider_insights(&models),
    };

    ComparisonReport {
        models,
        comparison_summary,
    }
}

/// Load the requested active offerings and compare them.
///
/// Fails with [`CatalogError::ModelsNotFound`] when no name resolves.
pub async fn compare_models(
    store: &dyn CatalogStore,
    request: &ComparisonRequest,
) -> Result<ComparisonReport> {
    let usage = request.usage();
    usage.validate()?;

    let offerings = store.find_offerings_by_api_names(&request.models).await?;
    if offerings.is_empty() {
        return Err(CatalogError::ModelsNotFound {
            requested: request.models.clone(),
        });
    }

    debug!(
        requested = request.models.len(),
        matched = offerings.len(),
        "Comparing offerings"
    );
    Ok(compare(&offerings, usage, &request.mode))
}

/// Indices of `items` sorted ascending by `key`; equal keys keep input order.
fn rank_by<T>(items: &[T], key: impl Fn(&T) -> f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| key(&items[a]).total_cmp(&key(&items[b])));
    order
}

/// First element with the smallest key.
fn first_min_by<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<&T> {
    items.iter().reduce(|best, item| {
        if key(item).total_cmp(&key(best)) == Ordering::Less {
            item
        } else {
            best
        }
    })
}

/// First element with the largest key. `Iterator::max_by` would return the last.
fn first_max_by<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<&T> {
    items.iter().reduce(|best, item| {
        if key(item).total_cmp(&key(best)) == Ordering::Greater {
            item
        } else {
            best
        }
    })
}

fn price_ranges(models: &[ModelComparison]) -> PriceRanges {
    PriceRanges {
        input_token_price: PriceRange::of(models.iter().map(|m| m.input_token_price)),
        output_token_price: PriceRange::of(models.iter().map(|m| m.output_token_price)),
    }
}

fn average_total(models: &[ModelComparison]) -> Option<f64> {
    if models.is_empty() {
        return None;
    }
    Some(models.iter().map(|m| m.total_cost).sum::<f64>() / models.len() as f64)
}

fn recommendations(models: &[ModelComparison]) -> Recommendations {
    let (Some(cheapest), Some(priciest), Some(efficient), Some(average)) = (
        first_min_by(models, |m| m.total_cost),
        first_max_by(models, |m| m.total_cost),
        first_max_by(models, |m| m.efficiency_score),
        average_total(models),
    ) else {
        return Recommendations::default();
    };

    Recommendations {
        cheapest_overall: Some(CheapestPick {
            model: cheapest.model.clone(),
            provider: cheapest.provider.clone(),
            total_cost: cheapest.total_cost,
        }),
        most_efficient: Some(EfficientPick {
            model: efficient.model.clone(),
            provider: efficient.provider.clone(),
            efficiency_score: efficient.efficiency_score,
        }),
        best_input_cost: first_min_by(models, |m| m.input_cost).map(|m| m.model.clone()),
        best_output_cost: first_min_by(models, |m| m.output_cost).map(|m| m.model.clone()),
        cost_savings: Some(CostSavings {
            vs_most_expensive: priciest.total_cost - cheapest.total_cost,
            vs_average: average - cheapest.total_cost,
        }),
    }
}

fn cost_analysis(models: &[ModelComparison], by_total: &[usize]) -> CostAnalysis {
    let Some(range) = PriceRange::of(models.iter().map(|m| m.total_cost)) else {
        return CostAnalysis::default();
    };
    let average = average_total(models).unwrap_or_default();

    let sorted: Vec<ModelComparison> = by_total.iter().map(|&i| models[i].clone()).collect();
    let (cheapest, expensive) = quartiles(&sorted);

    CostAnalysis {
        total_cost_range: Some(TotalCostRange {
            min: range.min,
            max: range.max,
            average,
            spread: range.range,
        }),
        cost_distribution: Some(CostDistribution {
            cheapest_25_percent: cheapest.to_vec(),
            most_expensive_25_percent: expensive.to_vec(),
        }),
    }
}

/// Cheapest and most expensive quarter of `sorted` (ascending by total cost).
///
/// The cheap end takes `n / 4` rounded down, the expensive end `n / 4`
/// rounded up. Fewer than four entries yields the whole slice for both.
fn quartiles<T>(sorted: &[T]) -> (&[T], &[T]) {
    let n = sorted.len();
    if n < 4 {
        return (sorted, sorted);
    }
    let cheap = n / 4;
    let expensive = n.div_ceil(4);
    (&sorted[..cheap], &sorted[n - expensive..])
}

fn provider_insights(models: &[ModelComparison]) -> ProviderInsights {
    let mut totals: IndexMap<String, (usize, f64)> = IndexMap::new();
    for m in models {
        let entry = totals.entry(m.provider.clone()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += m.total_cost;
    }

    let provider_distribution: IndexMap<String, usize> = totals
        .iter()
        .map(|(name, (count, _))| (name.clone(), *count))
        .collect();
    let provider_cost_comparison: IndexMap<String, f64> = totals
        .iter()
        .map(|(name, (count, sum))| (name.clone(), sum / *count as f64))
        .collect();

    let averages: Vec<(&String, &f64)> = provider_cost_comparison.iter().collect();
    let cheapest_provider = first_min_by(&averages, |(_, avg)| **avg).map(|(name, avg)| ProviderAverage {
        name: (*name).clone(),
        average_cost: **avg,
    });

    ProviderInsights {
        provider_distribution,
        cheapest_provider,
        provider_cost_comparison,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::id::{ModelId, OfferingId, ProviderId};
    use crate::types::modality::ModalitySet;
    use crate::types::offering::{DiscountWindow, Offering};

    fn view(id: i64, provider: &str, api: &str, input: f64, output: f64) -> OfferingView {
        OfferingView {
            offering: Offering {
                id: OfferingId::new(id),
                provider_id: ProviderId::new(1),
                model_id: ModelId::new(id),
                api_model_name: api.to_string(),
                context_window: 8000,
                max_output_tokens: None,
                input_cost_per_mtok: input,
                output_cost_per_mtok: output,
                cached_input_cost_per_mtok: None,
                tokens_per_second: None,
                modalities: ModalitySet::new(),
                supports_tools: false,
                discount: DiscountWindow::default(),
                is_active: true,
            },
            provider_name: provider.to_string(),
            model_name: api.to_string(),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_costs_per_offering() {
        let report = compare(&[view(1, "P", "a", 3.0, 15.0)], UsageScenario::new(1000, 500), "sync");
        let m = &report.models[0];
        assert!(close(m.input_token_price, 3e-6));
        assert!(close(m.input_cost, 0.003));
        assert!(close(m.output_cost, 0.0075));
        assert!(close(m.total_cost, 0.0105));
        assert!(close(m.cost_per_character, 0.0105 / 1500.0 / 4.0));
        assert!(close(m.efficiency_score, 1.0 / (0.0105 + 1e-6)));
        assert_eq!(m.modality, Modality::Text);
    }

    #[test]
    fn test_ranks_are_a_permutation() {
        let offerings = vec![
            view(1, "P1", "mid", 2.0, 2.0),
            view(2, "P1", "cheap", 1.0, 1.0),
            view(3, "P2", "dear", 5.0, 5.0),
        ];
        let report = compare(&offerings, UsageScenario::default(), "sync");
        let ranks: Vec<usize> = report.models.iter().map(|m| m.total_cost_rank).collect();
        assert_eq!(ranks, vec![2, 1, 3]);
        assert_eq!(report.models[1].input_cost_rank, 1);
        assert_eq!(report.models[2].output_cost_rank, 3);
    }

    #[test]
    fn test_ties_rank_in_input_order() {
        let offerings = vec![view(1, "P", "first", 1.0, 1.0), view(2, "P", "second", 1.0, 1.0)];
        let report = compare(&offerings, UsageScenario::default(), "sync");
        assert_eq!(report.models[0].total_cost_rank, 1);
        assert_eq!(report.models[1].total_cost_rank, 2);

        let recs = &report.comparison_summary.recommendations;
        assert_eq!(recs.cheapest_overall.as_ref().unwrap().model, "first");
        assert_eq!(recs.most_efficient.as_ref().unwrap().model, "first");
    }

    #[test]
    fn test_summary_sections() {
        let offerings = vec![
            view(1, "P1", "a", 1.0, 3.0),
            view(2, "P2", "b", 2.0, 2.0),
            view(3, "P1", "c", 4.0, 8.0),
        ];
        let summary = compare(&offerings, UsageScenario::default(), "batch").comparison_summary;

        assert_eq!(summary.total_models, 3);
        assert_eq!(summary.mode, "batch");

        let input = summary.price_ranges.input_token_price.unwrap();
        assert!(close(input.min, 1e-6));
        assert!(close(input.range, 3e-6));

        let total = summary.cost_analysis.total_cost_range.unwrap();
        assert!(close(total.min, 0.004));
        assert!(close(total.max, 0.012));
        assert!(close(total.average, 0.02 / 3.0));

        // Fewer than four offerings: both quartiles are the whole set.
        let dist = summary.cost_analysis.cost_distribution.unwrap();
        assert_eq!(dist.cheapest_25_percent.len(), 3);
        assert_eq!(dist.most_expensive_25_percent.len(), 3);

        let insights = summary.provider_insights;
        assert_eq!(insights.provider_distribution["P1"], 2);
        assert!(close(insights.provider_cost_comparison["P1"], 0.008));
        let cheapest = insights.cheapest_provider.unwrap();
        assert_eq!(cheapest.name, "P2");

        let savings = summary.recommendations.cost_savings.unwrap();
        assert!(close(savings.vs_most_expensive, 0.008));
    }

    #[test]
    fn test_quartiles() {
        let five = [1, 2, 3, 4, 5];
        assert_eq!(quartiles(&five), (&five[..1], &five[3..]));
        let eight = [1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(quartiles(&eight), (&eight[..2], &eight[6..]));
        let two = [1, 2];
        assert_eq!(quartiles(&two), (&two[..], &two[..]));
    }

    #[test]
    fn test_empty_input_serializes_empty_sections() {
        let report = compare(&[], UsageScenario::default(), "sync");
        let json = serde_json::to_value(&report).unwrap();
        let summary = &json["comparison_summary"];
        assert_eq!(summary["total_models"], 0);
        for section in ["price_ranges", "recommendations", "cost_analysis", "provider_insights"] {
            assert_eq!(summary[section], serde_json::json!({}), "{section}");
        }
        assert_eq!(json["models"], serde_json::json!([]));
    }

    #[test]
    fn test_zero_usage_is_rejected() {
        assert!(UsageScenario::new(0, 0).validate().is_err());
        assert!(UsageScenario::new(0, 1).validate().is_ok());
    }

    #[test]
    fn test_huge_usage_saturates() {
        let usage = UsageScenario::new(u64::MAX, 1);
        assert_eq!(usage.total_tokens(), u64::MAX);
        assert!(usage.validate().is_ok());

        let report = compare(&[view(1, "P", "a", 1.0, 1.0)], usage, "sync");
        let m = &report.models[0];
        assert!(m.total_cost.is_finite());
        assert!(m.cost_per_character.is_finite() && m.cost_per_character > 0.0);
    }
}
