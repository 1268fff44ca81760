//! 飽和度分桶
//!
//! 依 (供應商, 包材) 彙總箱數，並逐桶查出容量、降級容量與堆疊角色。

use std::collections::BTreeMap;

use freight_core::numeric::{opt_mul, opt_percent, sum_present};
use freight_core::{downgrade_vehicle_class, BucketKey, DemandLine, SaturationBucket};
use rayon::prelude::*;
use rust_decimal::Decimal;

use crate::catalog::CatalogIndex;
use crate::{CoverageReport, PipelineWarning, StageOutput};

/// 分桶前的單一桶彙總
#[derive(Debug, Default)]
struct BucketAccumulator {
    package_counts: Vec<Option<Decimal>>,
    vehicle_class: Option<u32>,
}

/// 飽和度分桶計算器
pub struct BucketingCalculator;

impl BucketingCalculator {
    /// 建立飽和度桶
    ///
    /// 沒有包材代碼的需求行不進入任何桶。桶的車型取桶內第一筆有車型的需求行。
    /// 輸出依桶鍵排序。
    pub fn build(lines: &[DemandLine], index: &CatalogIndex) -> StageOutput<SaturationBucket> {
        let mut groups: BTreeMap<BucketKey, BucketAccumulator> = BTreeMap::new();
        let mut unbucketed = 0;

        for line in lines {
            let Some(packaging_code) = line.packaging_code.as_ref() else {
                unbucketed += 1;
                continue;
            };

            let group = groups
                .entry(BucketKey::new(line.supplier_code.clone(), packaging_code.clone()))
                .or_default();
            group.package_counts.push(line.package_count);
            if group.vehicle_class.is_none() {
                group.vehicle_class = line.vehicle_class;
            }
        }

        if unbucketed > 0 {
            tracing::debug!("{} 筆需求行缺少包材，未列入飽和度桶", unbucketed);
        }

        let resolved: Vec<(SaturationBucket, Vec<PipelineWarning>, CoverageReport)> = groups
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(key, group)| Self::resolve_bucket(key, group, index))
            .collect();

        let mut stage = StageOutput::new(Vec::with_capacity(resolved.len()));
        for (bucket, warnings, coverage) in resolved {
            stage.items.push(bucket);
            stage.warnings.extend(warnings);
            stage.coverage.merge(&coverage);
        }

        tracing::debug!("飽和度桶數量: {}", stage.items.len());
        stage
    }

    fn resolve_bucket(
        key: BucketKey,
        group: BucketAccumulator,
        index: &CatalogIndex,
    ) -> (SaturationBucket, Vec<PipelineWarning>, CoverageReport) {
        let mut warnings = Vec::new();
        let mut coverage = CoverageReport::default();

        let line_count = group.package_counts.len();
        let (total_boxes, absent) = sum_present(group.package_counts);
        coverage.skipped_in_aggregation += absent;

        let packaging = index.packaging(&key.packaging_code);
        let pallet_factor = packaging.map_or(Decimal::ONE, |p| p.pallet_factor());

        let mut bucket = SaturationBucket::new(key, total_boxes, pallet_factor);
        bucket.boxes_resolved = absent < line_count;
        bucket.palletizable = packaging.map_or(false, |p| p.palletizable);
        bucket.supplier_name = index
            .supplier_name(&bucket.key.supplier_code)
            .map(str::to_string);
        bucket.vehicle_class = group.vehicle_class;
        bucket.pallet_volume = opt_mul(
            opt_mul(packaging.and_then(|p| p.unit_volume), Some(pallet_factor)),
            Some(bucket.pallet_equivalent_total),
        );
        let supplier_code = bucket.key.supplier_code.as_str();
        let packaging_code = bucket.key.packaging_code.as_str();
        bucket.is_stacking_base = index.is_stacking_base(supplier_code, packaging_code);
        bucket.is_stacking_overlay = index.is_stacking_overlay(supplier_code, packaging_code);

        // 箱數全數缺值時，由箱數推得的欄位一律缺值
        if !bucket.boxes_resolved {
            tracing::warn!("桶 {} 的需求行皆無法換算箱數", bucket.key);
            warnings.push(PipelineWarning::warning(
                bucket.key.to_string(),
                "桶內需求行皆無法換算箱數，飽和度無法計算".to_string(),
            ));
            bucket.pallet_volume = None;
        }

        if let Some(vehicle_class) = bucket.vehicle_class {
            bucket.capacity = Self::lookup_capacity(index, vehicle_class, packaging_code);
            bucket.efficiency_factor = index
                .efficiency_factor(supplier_code, packaging_code, vehicle_class)
                .unwrap_or(Decimal::ONE);

            bucket.downgrade_vehicle_class = downgrade_vehicle_class(vehicle_class);
            if let Some(downgrade) = bucket.downgrade_vehicle_class {
                bucket.downgrade_capacity =
                    Self::lookup_capacity(index, downgrade, packaging_code);
                if bucket.downgrade_capacity.is_none() {
                    coverage.unresolved_downgrade_capacity += 1;
                }
            }
        }

        if bucket.capacity.is_none() {
            tracing::warn!(
                "桶 {} 無法取得容量（車型 {:?}）",
                bucket.key,
                bucket.vehicle_class
            );
            warnings.push(PipelineWarning::warning(
                bucket.key.to_string(),
                match bucket.vehicle_class {
                    Some(vehicle_class) => {
                        format!("車型 {} 未定義此包材的容量", vehicle_class)
                    }
                    None => "桶內需求行皆未指定車型".to_string(),
                },
            ));
            coverage.unresolved_capacity += 1;
        }

        let pallets = Some(bucket.pallet_equivalent_total).filter(|_| bucket.boxes_resolved);
        bucket.downgrade_saturation_pct = opt_percent(pallets, bucket.downgrade_capacity, 2);

        (bucket, warnings, coverage)
    }

    /// 容量為零視同未定義
    fn lookup_capacity(
        index: &CatalogIndex,
        vehicle_class: u32,
        packaging_code: &str,
    ) -> Option<Decimal> {
        index
            .capacity(vehicle_class, packaging_code)
            .filter(|capacity| !capacity.is_zero())
    }
}
