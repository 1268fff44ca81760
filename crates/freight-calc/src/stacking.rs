//! 堆疊組合
//!
//! 同一供應商的底層桶與上層桶，依堆疊比貪婪配對：
//! 每次消耗 `ratio` 個底層與 1 個上層，直到任一方不足。

use std::collections::{BTreeMap, HashMap};

use freight_core::numeric::opt_div;
use freight_core::{
    BucketKey, PipelineConfig, SaturationBucket, StackingAllocation, StackingCombination,
};
use rayon::prelude::*;
use rust_decimal::Decimal;

use crate::catalog::CatalogIndex;
use crate::StageOutput;

/// 候選組合：底層桶、上層桶與實際堆疊比
struct StackingCandidate<'a> {
    base: &'a SaturationBucket,
    overlay: &'a SaturationBucket,
    ratio: u32,
}

/// 堆疊組合計算器
pub struct StackingCalculator;

impl StackingCalculator {
    /// 計算全部堆疊組合
    pub fn combine(
        buckets: &[SaturationBucket],
        index: &CatalogIndex,
        config: &PipelineConfig,
    ) -> StageOutput<StackingCombination> {
        let candidates = Self::candidates(buckets, index, config);
        tracing::debug!("堆疊候選組合: {}", candidates.len());

        let combinations = match config.stacking_allocation {
            StackingAllocation::PerPair => candidates
                .par_iter()
                .map(|candidate| {
                    let (base_total, overlay_total) =
                        (candidate.base.total_boxes, candidate.overlay.total_boxes);
                    Self::record(candidate, base_total, overlay_total)
                })
                .collect(),
            StackingAllocation::ConsumeOnce => Self::combine_consuming(&candidates),
        };

        StageOutput::new(combinations)
    }

    /// 依供應商建立底層 / 上層的索引後配對，只保留有規則的組合
    fn candidates<'a>(
        buckets: &'a [SaturationBucket],
        index: &CatalogIndex,
        config: &PipelineConfig,
    ) -> Vec<StackingCandidate<'a>> {
        let mut by_supplier: BTreeMap<&str, (Vec<&SaturationBucket>, Vec<&SaturationBucket>)> =
            BTreeMap::new();
        for bucket in buckets {
            if !bucket.is_stacking_base && !bucket.is_stacking_overlay {
                continue;
            }
            let (bases, overlays) = by_supplier
                .entry(bucket.key.supplier_code.as_str())
                .or_default();
            if bucket.is_stacking_base {
                bases.push(bucket);
            }
            if bucket.is_stacking_overlay {
                overlays.push(bucket);
            }
        }

        let mut candidates = Vec::new();
        for (supplier, (bases, overlays)) in by_supplier {
            for &base in &bases {
                for &overlay in &overlays {
                    let rule_ratio = index.stacking_ratio(
                        supplier,
                        &base.key.packaging_code,
                        &overlay.key.packaging_code,
                    );
                    if let Some(rule_ratio) = rule_ratio {
                        candidates.push(StackingCandidate {
                            base,
                            overlay,
                            ratio: config.stacking_ratio(rule_ratio),
                        });
                    }
                }
            }
        }
        candidates
    }

    /// 全域消耗模式：依序配對，同一桶的箱數只能使用一次
    fn combine_consuming(candidates: &[StackingCandidate<'_>]) -> Vec<StackingCombination> {
        let mut remaining: HashMap<&BucketKey, Decimal> = HashMap::new();
        let mut combinations = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let base_key = &candidate.base.key;
            let overlay_key = &candidate.overlay.key;
            let base_total = *remaining
                .entry(base_key)
                .or_insert(candidate.base.total_boxes);
            let overlay_total = *remaining
                .entry(overlay_key)
                .or_insert(candidate.overlay.total_boxes);

            let combination = if base_key == overlay_key {
                // 同一桶同時作為底層與上層：每次需 ratio + 1 箱
                let ratio = Decimal::from(candidate.ratio);
                let iterations = whole_units(base_total / (ratio + Decimal::ONE));
                let (base_used, overlay_used) = (iterations * ratio, iterations);
                Self::build(candidate, base_total, overlay_total, base_used, overlay_used)
            } else {
                Self::record(candidate, base_total, overlay_total)
            };

            if let Some(left) = remaining.get_mut(base_key) {
                *left -= combination.base_used;
            }
            if let Some(left) = remaining.get_mut(overlay_key) {
                *left -= combination.overlay_used;
            }
            combinations.push(combination);
        }

        combinations
    }

    fn record(
        candidate: &StackingCandidate<'_>,
        base_total: Decimal,
        overlay_total: Decimal,
    ) -> StackingCombination {
        let (base_used, overlay_used) = stack_greedy(base_total, overlay_total, candidate.ratio);
        Self::build(candidate, base_total, overlay_total, base_used, overlay_used)
    }

    fn build(
        candidate: &StackingCandidate<'_>,
        base_total: Decimal,
        overlay_total: Decimal,
        base_used: Decimal,
        overlay_used: Decimal,
    ) -> StackingCombination {
        let stacked_units = base_used + overlay_used;
        StackingCombination {
            supplier_code: candidate.base.key.supplier_code.clone(),
            base_packaging: candidate.base.key.packaging_code.clone(),
            overlay_packaging: candidate.overlay.key.packaging_code.clone(),
            capacity: candidate.base.capacity,
            base_total,
            overlay_total,
            base_used,
            overlay_used,
            base_leftover: base_total - base_used,
            overlay_leftover: overlay_total - overlay_used,
            stacked_units,
            saturation: opt_div(Some(stacked_units), candidate.base.capacity),
            ratio: candidate.ratio,
        }
    }
}

/// 貪婪堆疊：回傳 (已用底層, 已用上層)
///
/// 等同於反覆「底層 ≥ ratio 且上層 ≥ 1 時各扣 ratio 與 1」，
/// 迭代次數為 min(⌊底層 / ratio⌋, ⌊上層⌋)。
pub fn stack_greedy(
    base_total: Decimal,
    overlay_total: Decimal,
    ratio: u32,
) -> (Decimal, Decimal) {
    if ratio == 0 {
        return (Decimal::ZERO, Decimal::ZERO);
    }
    let ratio = Decimal::from(ratio);
    let iterations = whole_units(base_total / ratio).min(whole_units(overlay_total));
    (iterations * ratio, iterations)
}

fn whole_units(value: Decimal) -> Decimal {
    value.floor().max(Decimal::ZERO)
}
