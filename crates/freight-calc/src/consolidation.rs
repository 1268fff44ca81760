//! 路線整併
//!
//! 依目的地將需求行對應到路線，彙總體積、重量、箱數與飽和度，
//! 並依最後一車的剩餘飽和度給出整併建議。

use std::collections::HashSet;

use freight_core::numeric::{required_loads, round_dp, sum_present};
use freight_core::{
    split_codes, ConsolidationSuggestion, DemandLine, RouteConsolidationResult, RouteFlow,
    SaturationBasis,
};
use rayon::prelude::*;
use rust_decimal::Decimal;

use crate::catalog::CatalogIndex;
use crate::{CoverageReport, PipelineWarning, StageOutput};

/// 單一目的地的整併結果、無路線時的提示與缺值統計
type DestinationOutput = (Vec<RouteConsolidationResult>, Option<PipelineWarning>, CoverageReport);

/// 路線整併計算器
pub struct ConsolidationCalculator;

impl ConsolidationCalculator {
    /// 逐目的地整併
    ///
    /// 目的地依在需求中首次出現的順序處理；同一目的地內依路線定義順序輸出。
    pub fn consolidate(
        lines: &[DemandLine],
        index: &CatalogIndex,
    ) -> StageOutput<RouteConsolidationResult> {
        let mut destinations: Vec<&str> = Vec::new();
        for line in lines {
            if !destinations.contains(&line.destination_code.as_str()) {
                destinations.push(line.destination_code.as_str());
            }
        }

        let per_destination: Vec<DestinationOutput> = destinations
            .par_iter()
            .map(|destination| Self::consolidate_destination(destination, lines, index))
            .collect();

        let mut stage = StageOutput::new(Vec::new());
        for (results, warning, coverage) in per_destination {
            stage.items.extend(results);
            stage.warnings.extend(warning);
            stage.coverage.merge(&coverage);
        }

        tracing::debug!(
            "目的地 {} 個，整併結果 {} 筆",
            destinations.len(),
            stage.items.len()
        );
        stage
    }

    fn consolidate_destination(
        destination: &str,
        lines: &[DemandLine],
        index: &CatalogIndex,
    ) -> DestinationOutput {
        let destination_lines: Vec<&DemandLine> = lines
            .iter()
            .filter(|line| line.destination_code == destination)
            .collect();
        let present_suppliers: HashSet<String> = destination_lines
            .iter()
            .flat_map(|line| split_codes(&line.supplier_code))
            .collect();

        let mut results = Vec::new();
        let mut coverage = CoverageReport::default();

        let flows = index
            .route_flows()
            .iter()
            .filter(|flow| flow.serves_destination(destination));
        for flow in flows {
            let common: Vec<String> = flow
                .suppliers()
                .into_iter()
                .filter(|code| present_suppliers.contains(code))
                .collect();
            if common.is_empty() {
                continue;
            }

            let matched: Vec<&DemandLine> = destination_lines
                .iter()
                .copied()
                .filter(|line| line.has_supplier_in(&common))
                .collect();

            let result = Self::aggregate(flow, destination, common, &matched, index, &mut coverage);
            results.push(result);
        }

        let warning = if results.is_empty() {
            tracing::debug!("目的地 {} 沒有匹配的路線", destination);
            Some(PipelineWarning::info(
                destination.to_string(),
                "沒有路線涵蓋此目的地的供應商".to_string(),
            ))
        } else {
            None
        };

        (results, warning, coverage)
    }

    fn aggregate(
        flow: &RouteFlow,
        destination: &str,
        supplier_codes: Vec<String>,
        matched: &[&DemandLine],
        index: &CatalogIndex,
        coverage: &mut CoverageReport,
    ) -> RouteConsolidationResult {
        let basis = flow.basis();

        let (total_volume, absent_volume) = sum_present(matched.iter().map(|line| line.volume));
        let (total_weight, absent_weight) =
            sum_present(matched.iter().map(|line| line.total_weight));
        let (total_packages, absent_packages) =
            sum_present(matched.iter().map(|line| line.package_count));
        let (total_saturation, absent_saturation) =
            sum_present(matched.iter().map(|line| line.saturation_pct(basis)));
        coverage.skipped_in_aggregation +=
            absent_volume + absent_weight + absent_packages + absent_saturation;

        let total_saturation_pct = round_dp(total_saturation, 2);

        let supplier_names = supplier_codes
            .iter()
            .filter_map(|code| index.supplier_name(code).map(str::to_string))
            .collect();

        RouteConsolidationResult {
            route_code: flow.route_code.clone(),
            destination_code: destination.to_string(),
            destination_name: flow.destination_name.clone(),
            supplier_codes,
            supplier_names,
            vehicle: flow.vehicle.clone(),
            technology: flow.technology.clone(),
            mode_of_transport: flow.mode_of_transport.clone(),
            carrier: flow.carrier.clone(),
            saturation_basis: basis,
            total_volume: round_dp(total_volume, 1),
            total_weight: round_dp(total_weight, 1),
            total_packages,
            total_saturation_pct,
            required_loads: required_loads(total_saturation_pct),
            suggestion: ConsolidationSuggestion::from_total_saturation(total_saturation_pct),
            coverage_pct: Self::coverage_pct(matched, basis),
        }
    }

    /// 飽和度大於零的料號數 / 料號數 × 100（一位小數）
    fn coverage_pct(matched: &[&DemandLine], basis: SaturationBasis) -> Decimal {
        let parts: HashSet<&str> = matched.iter().map(|line| line.part_code.as_str()).collect();
        if parts.is_empty() {
            return Decimal::ZERO;
        }

        let saturated: HashSet<&str> = matched
            .iter()
            .filter(|line| line.saturation_pct(basis).map_or(false, |pct| pct > Decimal::ZERO))
            .map(|line| line.part_code.as_str())
            .collect();

        round_dp(
            Decimal::from(saturated.len()) / Decimal::from(parts.len()) * Decimal::ONE_HUNDRED,
            1,
        )
    }
}
