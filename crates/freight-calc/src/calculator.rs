//! 飽和度主計算器

use freight_core::numeric::{required_loads, round_dp, sum_present};
use freight_core::{CatalogTables, DemandLine, PipelineConfig, RawDemandLine};

use crate::bucketing::BucketingCalculator;
use crate::catalog::CatalogIndex;
use crate::consolidation::ConsolidationCalculator;
use crate::enrichment::EnrichmentCalculator;
use crate::integration::IntegrationCalculator;
use crate::stacking::StackingCalculator;
use crate::{CoverageReport, PipelineResult, RunSummary};

/// 飽和度計算器
pub struct FreightCalculator {
    /// 基礎資料索引（建立後唯讀）
    index: CatalogIndex,

    /// 計算配置
    config: PipelineConfig,
}

impl FreightCalculator {
    /// 以已建立的索引創建計算器
    pub fn new(index: CatalogIndex, config: PipelineConfig) -> Self {
        Self { index, config }
    }

    /// 由基礎資料表建立索引並創建計算器
    pub fn from_tables(
        tables: &CatalogTables,
        config: PipelineConfig,
    ) -> freight_core::Result<Self> {
        config.validate()?;
        let index = CatalogIndex::build(tables)?;
        Ok(Self::new(index, config))
    }

    /// 主計算入口
    pub fn calculate(&self, raw_lines: &[RawDemandLine]) -> freight_core::Result<PipelineResult> {
        self.config.validate()?;

        tracing::info!(
            "開始飽和度計算：需求 {} 筆，路線 {} 條",
            raw_lines.len(),
            self.index.route_flows().len()
        );

        let start_time = std::time::Instant::now();
        let mut result = PipelineResult::empty();
        result.warnings.extend(self.index.build_warnings().iter().cloned());

        // Step 1: 需求補齊
        tracing::debug!("Step 1: 需求補齊");
        let enrichment = EnrichmentCalculator::enrich(raw_lines, &self.index, &self.config);
        let dropped_lines = enrichment.dropped;
        let mut lines = enrichment.stage.items;
        result.warnings.extend(enrichment.stage.warnings);
        result.coverage.merge(&enrichment.stage.coverage);
        tracing::debug!("有效需求行: {}", lines.len());

        if lines.is_empty() {
            tracing::info!("沒有有效的需求行，回傳空結果");
        }

        // Step 2: 飽和度分桶
        tracing::debug!("Step 2: 飽和度分桶");
        let bucketing = BucketingCalculator::build(&lines, &self.index);
        let mut buckets = bucketing.items;
        result.warnings.extend(bucketing.warnings);
        result.coverage.merge(&bucketing.coverage);

        // Step 3: 堆疊組合
        tracing::debug!(
            "Step 3: 堆疊組合（{:?} / {:?}）",
            self.config.stacking_mode,
            self.config.stacking_allocation
        );
        let stacking = StackingCalculator::combine(&buckets, &self.index, &self.config);
        let combinations = stacking.items;
        tracing::debug!("堆疊組合數量: {}", combinations.len());

        // Step 4: 飽和度整合
        tracing::debug!("Step 4: 飽和度整合");
        let integration = IntegrationCalculator::integrate(&mut buckets, &combinations);
        result.coverage.merge(&integration);
        let applied = IntegrationCalculator::apply_to_lines(&mut lines, &buckets);
        result.coverage.merge(&applied);

        // Step 5: 路線整併
        tracing::debug!("Step 5: 路線整併");
        let consolidation = ConsolidationCalculator::consolidate(&lines, &self.index);
        result.warnings.extend(consolidation.warnings);
        result.coverage.merge(&consolidation.coverage);

        result.summary = Self::summarize(&lines, dropped_lines, &mut result.coverage);
        result.lines = lines;
        result.buckets = buckets;
        result.combinations = combinations;
        result.routes = consolidation.items;
        result.calculation_time_ms = Some(start_time.elapsed().as_millis());

        tracing::info!("飽和度計算完成，耗時 {:?}", start_time.elapsed());
        tracing::info!(
            "飽和度桶 {} 個，堆疊組合 {} 筆，路線整併 {} 筆，所需車數 {}",
            result.buckets.len(),
            result.combinations.len(),
            result.routes.len(),
            result.summary.required_vehicles
        );
        if !result.coverage.is_complete() {
            tracing::info!("缺值欄位共 {} 個", result.coverage.total_absent());
        }

        Ok(result)
    }

    /// 整批彙總（飽和度以體積飽和度計）
    fn summarize(
        lines: &[DemandLine],
        dropped_lines: usize,
        coverage: &mut CoverageReport,
    ) -> RunSummary {
        let (total_volume, absent_volume) = sum_present(lines.iter().map(|line| line.volume));
        let (total_weight, absent_weight) =
            sum_present(lines.iter().map(|line| line.total_weight));
        let (total_packages, absent_packages) =
            sum_present(lines.iter().map(|line| line.package_count));
        let (total_saturation, absent_saturation) =
            sum_present(lines.iter().map(|line| line.volume_saturation_pct));
        coverage.skipped_in_aggregation +=
            absent_volume + absent_weight + absent_packages + absent_saturation;

        let total_saturation_pct = round_dp(total_saturation, 2);

        RunSummary {
            total_volume: round_dp(total_volume, 1),
            total_weight: round_dp(total_weight, 1),
            total_packages,
            total_saturation_pct,
            required_vehicles: required_loads(total_saturation_pct),
            valid_lines: lines.len(),
            lines_with_units_per_package: lines
                .iter()
                .filter(|line| line.units_per_package.is_some())
                .count(),
            dropped_lines,
        }
    }
}
