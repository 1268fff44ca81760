//! 飽和度整合
//!
//! 桶飽和度 = (棧板當量 / 容量 + 以此桶為底層的組合飽和度) × 長度效率係數，
//! 再依箱數攤回每一筆需求行。箱數全數缺值的桶不計算飽和度。

use std::collections::HashMap;

use freight_core::numeric::{opt_div, opt_mul, round_dp, sum_present};
use freight_core::{BucketKey, DemandLine, SaturationBucket, StackingCombination};
use rayon::prelude::*;
use rust_decimal::Decimal;

use crate::CoverageReport;

/// 飽和度整合計算器
pub struct IntegrationCalculator;

impl IntegrationCalculator {
    /// 計算每個桶的最終飽和度與每箱分攤
    pub fn integrate(
        buckets: &mut [SaturationBucket],
        combinations: &[StackingCombination],
    ) -> CoverageReport {
        let mut stacked: HashMap<BucketKey, Vec<Option<Decimal>>> = HashMap::new();
        for combination in combinations {
            stacked
                .entry(combination.base_key())
                .or_default()
                .push(combination.saturation);
        }

        let skipped: usize = buckets
            .par_iter_mut()
            .map(|bucket| {
                let (stacked_saturation, absent) = stacked
                    .get(&bucket.key)
                    .map(|values| sum_present(values.iter().copied()))
                    .unwrap_or((Decimal::ZERO, 0));

                let proportion = if bucket.boxes_resolved {
                    opt_div(Some(bucket.pallet_equivalent_total), bucket.capacity)
                } else {
                    None
                };
                let efficiency = bucket.efficiency_factor;
                bucket.final_saturation =
                    proportion.map(|proportion| (proportion + stacked_saturation) * efficiency);
                bucket.saturation_per_box =
                    Self::per_box(bucket.final_saturation, bucket.total_boxes);
                absent
            })
            .sum();

        let overflowing = buckets.iter().filter(|bucket| bucket.is_overflowing()).count();
        if overflowing > 0 {
            tracing::debug!("{} 個桶的飽和度超過一車", overflowing);
        }

        CoverageReport {
            skipped_in_aggregation: skipped,
            ..Default::default()
        }
    }

    /// 箱數為零時分攤為零
    fn per_box(final_saturation: Option<Decimal>, total_boxes: Decimal) -> Option<Decimal> {
        let saturation = final_saturation?;
        if total_boxes.is_zero() {
            return Some(Decimal::ZERO);
        }
        Some(saturation / total_boxes)
    }

    /// 將每箱分攤回填到需求行的體積飽和度（%，兩位小數）
    pub fn apply_to_lines(
        lines: &mut [DemandLine],
        buckets: &[SaturationBucket],
    ) -> CoverageReport {
        let shares: HashMap<&BucketKey, Option<Decimal>> = buckets
            .iter()
            .map(|bucket| (&bucket.key, bucket.saturation_per_box))
            .collect();

        let mut coverage = CoverageReport::default();
        for line in lines.iter_mut() {
            let share = line.packaging_code.as_ref().and_then(|packaging_code| {
                shares
                    .get(&BucketKey::new(line.supplier_code.clone(), packaging_code.clone()))
                    .copied()
                    .flatten()
            });

            line.volume_saturation_pct = opt_mul(line.package_count, share)
                .map(|ratio| round_dp(ratio * Decimal::ONE_HUNDRED, 2));
            if line.volume_saturation_pct.is_none() {
                coverage.unresolved_volume_saturation += 1;
            }
        }
        coverage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn combination(base: &str, overlay: &str, saturation: Option<Decimal>) -> StackingCombination {
        StackingCombination {
            supplier_code: "100".to_string(),
            base_packaging: base.to_string(),
            overlay_packaging: overlay.to_string(),
            capacity: Some(Decimal::from(20)),
            base_total: Decimal::ZERO,
            overlay_total: Decimal::ZERO,
            base_used: Decimal::ZERO,
            overlay_used: Decimal::ZERO,
            base_leftover: Decimal::ZERO,
            overlay_leftover: Decimal::ZERO,
            stacked_units: Decimal::ZERO,
            saturation,
            ratio: 2,
        }
    }

    fn line(packaging: &str, boxes: i64) -> DemandLine {
        DemandLine {
            supplier_code: "100".to_string(),
            supplier_name: None,
            destination_code: "1080".to_string(),
            part_code: "PN-001".to_string(),
            quantity: Decimal::from(boxes),
            part_description: None,
            packaging_code: Some(packaging.to_string()),
            packaging_description: None,
            units_per_package: Some(Decimal::ONE),
            package_count: Some(Decimal::from(boxes)),
            saturation_basis: None,
            vehicle_class: Some(4),
            volume: None,
            material_weight: None,
            packaging_weight: None,
            total_weight: None,
            max_payload: None,
            volume_saturation_pct: None,
            weight_saturation_pct: None,
        }
    }

    #[test]
    fn test_bucket_without_combination() {
        let mut buckets = vec![
            SaturationBucket::new(BucketKey::new("100", "A"), Decimal::from(10), Decimal::ONE)
                .with_capacity(Decimal::from(40)),
        ];
        buckets[0].efficiency_factor = dec("0.8");

        IntegrationCalculator::integrate(&mut buckets, &[]);

        // 10 / 40 × 0.8
        assert_eq!(buckets[0].final_saturation, Some(dec("0.2")));
        assert_eq!(buckets[0].saturation_per_box, Some(dec("0.02")));
    }

    #[test]
    fn test_combination_added_to_base_only() {
        let mut buckets = vec![
            SaturationBucket::new(BucketKey::new("100", "A"), Decimal::from(10), Decimal::ONE)
                .with_capacity(Decimal::from(20)),
            SaturationBucket::new(BucketKey::new("100", "B"), Decimal::from(7), Decimal::ONE)
                .with_capacity(Decimal::from(10)),
        ];
        let combinations = vec![combination("A", "B", Some(dec("0.75")))];

        IntegrationCalculator::integrate(&mut buckets, &combinations);

        // 10 / 20 + 0.75
        assert_eq!(buckets[0].final_saturation, Some(dec("1.25")));
        assert!(buckets[0].is_overflowing());
        assert_eq!(buckets[1].final_saturation, Some(dec("0.7")));
    }

    #[test]
    fn test_efficiency_scales_stacked_saturation() {
        let mut buckets = vec![
            SaturationBucket::new(BucketKey::new("100", "A"), Decimal::from(10), Decimal::ONE)
                .with_capacity(Decimal::from(20)),
        ];
        buckets[0].efficiency_factor = dec("0.8");
        let combinations = vec![combination("A", "B", Some(dec("0.75")))];

        IntegrationCalculator::integrate(&mut buckets, &combinations);

        // (10 / 20 + 0.75) × 0.8，而非 10 / 20 × 0.8 + 0.75
        assert_eq!(buckets[0].final_saturation, Some(dec("1.0")));
        assert_eq!(buckets[0].saturation_per_box, Some(dec("0.1")));
    }

    #[test]
    fn test_unresolved_boxes_leave_saturation_absent() {
        let mut buckets = vec![
            SaturationBucket::new(BucketKey::new("100", "A"), Decimal::ZERO, Decimal::ONE)
                .with_capacity(Decimal::from(20)),
        ];
        buckets[0].boxes_resolved = false;
        let combinations = vec![combination("A", "B", Some(dec("0.5")))];

        IntegrationCalculator::integrate(&mut buckets, &combinations);

        assert_eq!(buckets[0].final_saturation, None);
        assert_eq!(buckets[0].saturation_per_box, None);
    }

    #[test]
    fn test_absent_capacity_and_zero_boxes() {
        let mut buckets = vec![
            SaturationBucket::new(BucketKey::new("100", "A"), Decimal::from(10), Decimal::ONE),
            SaturationBucket::new(BucketKey::new("100", "B"), Decimal::ZERO, Decimal::ONE)
                .with_capacity(Decimal::from(10)),
        ];

        IntegrationCalculator::integrate(&mut buckets, &[]);

        assert_eq!(buckets[0].final_saturation, None);
        assert_eq!(buckets[0].saturation_per_box, None);
        assert_eq!(buckets[1].final_saturation, Some(Decimal::ZERO));
        assert_eq!(buckets[1].saturation_per_box, Some(Decimal::ZERO));
    }

    #[test]
    fn test_apply_to_lines() {
        let mut buckets = vec![
            SaturationBucket::new(BucketKey::new("100", "A"), Decimal::from(3), Decimal::ONE)
                .with_capacity(Decimal::from(20)),
        ];
        IntegrationCalculator::integrate(&mut buckets, &[]);
        let mut lines = vec![line("A", 1), line("A", 2), line("Z", 5)];

        let coverage = IntegrationCalculator::apply_to_lines(&mut lines, &buckets);

        assert_eq!(lines[0].volume_saturation_pct, Some(dec("5.00")));
        assert_eq!(lines[1].volume_saturation_pct, Some(dec("10.00")));
        assert_eq!(lines[2].volume_saturation_pct, None);
        assert_eq!(coverage.unresolved_volume_saturation, 1);
    }
}
