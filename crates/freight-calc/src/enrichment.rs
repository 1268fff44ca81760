//! 需求補齊
//!
//! 將原始需求行與基礎資料關聯，計算箱數、體積、重量與重量飽和度。
//! 查找失敗的欄位以 `None` 繼續傳遞，需求行不會被丟棄。

use freight_core::numeric::{opt_add, opt_div, opt_mul, opt_percent, round_dp};
use freight_core::{DemandLine, PipelineConfig, RawDemandLine, SaturationBasis};
use rust_decimal::Decimal;

use crate::catalog::{normalize_packaging, CatalogIndex};
use crate::{CoverageReport, PipelineWarning, StageOutput, WarningSeverity};

/// 需求補齊結果
#[derive(Debug, Clone)]
pub struct EnrichmentOutput {
    pub stage: StageOutput<DemandLine>,

    /// 數量非正而被捨棄的行數
    pub dropped: usize,
}

/// 需求補齊計算器
pub struct EnrichmentCalculator;

impl EnrichmentCalculator {
    /// 補齊全部需求行
    pub fn enrich(
        raw_lines: &[RawDemandLine],
        index: &CatalogIndex,
        config: &PipelineConfig,
    ) -> EnrichmentOutput {
        let mut lines = Vec::with_capacity(raw_lines.len());
        let mut warnings = Vec::new();
        let mut coverage = CoverageReport::default();
        let mut dropped = 0;

        for raw in raw_lines {
            if !raw.is_valid() {
                tracing::debug!(
                    "捨棄數量無效的需求行：供應商 {}，料號 {}，數量 {}",
                    raw.supplier_code,
                    raw.part_code,
                    raw.quantity
                );
                dropped += 1;
                continue;
            }

            let (vehicle, basis) = Self::assign_vehicle(raw, index, config, &mut warnings);
            let line =
                Self::enrich_line(raw, vehicle, basis, index, &mut warnings, &mut coverage);
            lines.push(line);
        }

        if dropped > 0 {
            tracing::info!("已捨棄 {} 筆數量無效的需求行", dropped);
        }

        let mut stage = StageOutput::new(lines);
        stage.warnings = warnings;
        stage.coverage = coverage;
        EnrichmentOutput { stage, dropped }
    }

    /// 決定需求行的車型與飽和度基準
    ///
    /// 需求行已指定者優先；否則取第一條供應商與目的地都相符的路線。
    /// 路線車型不在車型主檔中屬於主檔錯誤，每條路線只回報一次。
    fn assign_vehicle(
        raw: &RawDemandLine,
        index: &CatalogIndex,
        config: &PipelineConfig,
        warnings: &mut Vec<PipelineWarning>,
    ) -> (Option<u32>, Option<SaturationBasis>) {
        let mut vehicle = raw.vehicle_class;
        let mut basis = raw.saturation_basis;

        if config.assign_vehicles_from_routes && (vehicle.is_none() || basis.is_none()) {
            let supplier = raw.supplier_code.trim();
            let flow = index.route_flows().iter().find(|flow| {
                flow.matches_destination_exactly(&raw.destination_code)
                    && flow.suppliers().iter().any(|code| code == supplier)
            });

            if let Some(flow) = flow {
                if vehicle.is_none() {
                    vehicle = index.vehicle_code_by_name(&flow.vehicle);
                    let reported = warnings.iter().any(|warning| {
                        warning.severity == WarningSeverity::Error
                            && warning.subject == flow.route_code
                    });
                    if vehicle.is_none() && !reported {
                        tracing::warn!(
                            "路線 {} 的車型 {} 不在車型主檔中",
                            flow.route_code,
                            flow.vehicle
                        );
                        warnings.push(PipelineWarning::error(
                            flow.route_code.clone(),
                            format!("路線車型 {} 不在車型主檔中", flow.vehicle),
                        ));
                    }
                }
                basis = basis.or_else(|| Some(flow.basis()));
            }
        }

        (config.effective_vehicle(vehicle), basis)
    }

    fn enrich_line(
        raw: &RawDemandLine,
        vehicle_class: Option<u32>,
        saturation_basis: Option<SaturationBasis>,
        index: &CatalogIndex,
        warnings: &mut Vec<PipelineWarning>,
        coverage: &mut CoverageReport,
    ) -> DemandLine {
        let quantity = Decimal::from(raw.quantity);
        let part = index.part(&raw.part_code);

        if part.is_none() {
            tracing::warn!("找不到料號 {}（供應商 {}）", raw.part_code, raw.supplier_code);
            warnings.push(PipelineWarning::warning(
                raw.part_code.clone(),
                format!("料號不在物料主檔中（供應商 {}）", raw.supplier_code),
            ));
            coverage.unresolved_parts += 1;
        }

        let packaging_code = part
            .and_then(|p| p.packaging_code.as_deref())
            .map(normalize_packaging);
        let packaging = packaging_code.as_deref().and_then(|code| index.packaging(code));

        if part.is_some() && packaging.is_none() {
            let subject = packaging_code.clone().unwrap_or_else(|| raw.part_code.clone());
            tracing::warn!("料號 {} 的包材 {} 無法解析", raw.part_code, subject);
            warnings.push(PipelineWarning::warning(
                subject,
                format!("料號 {} 的包材不在包材主檔中", raw.part_code),
            ));
            coverage.unresolved_packaging += 1;
        }

        let units_per_package = part
            .and_then(|p| p.units_per_package)
            .filter(|units| *units > Decimal::ZERO);
        if part.is_some() && units_per_package.is_none() {
            coverage.unresolved_units_per_package += 1;
        }

        let package_count =
            opt_div(Some(quantity), units_per_package).map(|count| round_dp(count, 0));
        let volume =
            opt_mul(package_count, packaging.and_then(|p| p.unit_volume)).map(|v| round_dp(v, 1));
        let material_weight =
            opt_mul(Some(quantity), part.and_then(|p| p.unit_weight)).map(|w| round_dp(w, 1));
        let packaging_weight =
            opt_mul(package_count, packaging.and_then(|p| p.unit_weight)).map(|w| round_dp(w, 1));
        let total_weight = opt_add(material_weight, packaging_weight);

        if vehicle_class.is_none() {
            coverage.unresolved_vehicles += 1;
        }
        let max_payload = vehicle_class.and_then(|code| index.max_payload(code));
        if vehicle_class.is_some() && max_payload.is_none() {
            coverage.unresolved_payload += 1;
        }

        let weight_saturation_pct = opt_percent(total_weight, max_payload, 2);
        if weight_saturation_pct.is_none() {
            coverage.unresolved_weight_saturation += 1;
        }

        DemandLine {
            supplier_code: raw.supplier_code.trim().to_string(),
            supplier_name: index.supplier_name(&raw.supplier_code).map(str::to_string),
            destination_code: raw.destination_code.trim().to_string(),
            part_code: raw.part_code.trim().to_string(),
            quantity,
            part_description: part.and_then(|p| p.description.clone()),
            packaging_code,
            packaging_description: packaging.and_then(|p| p.description.clone()),
            units_per_package,
            package_count,
            saturation_basis,
            vehicle_class,
            volume,
            material_weight,
            packaging_weight,
            total_weight,
            max_payload,
            volume_saturation_pct: None,
            weight_saturation_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freight_core::{
        CatalogTables, PackagingCatalogEntry, PartCatalogEntry, RouteFlow, VehicleCatalogEntry,
    };
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn index() -> CatalogIndex {
        let tables = CatalogTables {
            parts: vec![
                PartCatalogEntry::new("PN-001", "100")
                    .with_supplier_name("ACME")
                    .with_description("支架")
                    .with_packaging("cx01", Decimal::from(25))
                    .with_unit_weight(dec("0.35")),
                PartCatalogEntry::new("PN-002", "100").with_packaging("ZZ99", Decimal::from(10)),
                PartCatalogEntry::new("PN-003", "100").with_packaging("CX01", Decimal::ZERO),
            ],
            packaging: vec![PackagingCatalogEntry::new("CX01")
                .with_description("塑膠箱")
                .with_unit_volume(dec("0.5"))
                .with_unit_weight(dec("1.2"))],
            vehicles: vec![
                VehicleCatalogEntry::new(4, "CARRETA", "CARRETA")
                    .with_max_payload(Decimal::from(1000)),
                VehicleCatalogEntry::new(3, "TRUCK 3M", "TRUCK 3M")
                    .with_max_payload(Decimal::from(500)),
            ],
            route_flows: vec![
                RouteFlow::new("R-01", "1080", "Carreta", "volume", "100/200"),
                RouteFlow::new("R-02", "1080/1046", "TRUCK 3M", "WEIGHT", "300"),
                RouteFlow::new("R-03", "2000", "BITREM", "VOLUME", "100"),
            ],
            ..Default::default()
        };
        CatalogIndex::build(&tables).unwrap()
    }

    #[test]
    fn test_enrich_package_count_and_volume() {
        let raw = vec![RawDemandLine::new("100", "PN-001", 100, "1080").with_vehicle_class(4)];

        let output = EnrichmentCalculator::enrich(&raw, &index(), &PipelineConfig::new());
        let line = &output.stage.items[0];

        assert_eq!(line.supplier_name.as_deref(), Some("ACME"));
        assert_eq!(line.packaging_code.as_deref(), Some("CX01"));
        assert_eq!(line.package_count, Some(Decimal::from(4)));
        assert_eq!(line.volume, Some(dec("2.0")));
        // 100 × 0.35 = 35.0；4 × 1.2 = 4.8
        assert_eq!(line.material_weight, Some(dec("35.0")));
        assert_eq!(line.packaging_weight, Some(dec("4.8")));
        assert_eq!(line.total_weight, Some(dec("39.8")));
        // 39.8 / 1000 × 100
        assert_eq!(line.weight_saturation_pct, Some(dec("3.98")));
        assert_eq!(line.volume_saturation_pct, None);
        assert!(output.stage.coverage.is_complete());
    }

    #[test]
    fn test_package_count_rounded() {
        let raw = vec![
            RawDemandLine::new("100", "PN-001", 38, "1080").with_vehicle_class(4),
            RawDemandLine::new("100", "PN-001", 62, "1080").with_vehicle_class(4),
        ];

        let output = EnrichmentCalculator::enrich(&raw, &index(), &PipelineConfig::new());

        // 38 / 25 = 1.52 → 2；62 / 25 = 2.48 → 2
        assert_eq!(output.stage.items[0].package_count, Some(Decimal::from(2)));
        assert_eq!(output.stage.items[1].package_count, Some(Decimal::from(2)));
    }

    #[test]
    fn test_non_positive_quantity_dropped() {
        let raw = vec![
            RawDemandLine::new("100", "PN-001", 0, "1080"),
            RawDemandLine::new("100", "PN-001", -3, "1080"),
            RawDemandLine::new("100", "PN-001", 25, "1080"),
        ];

        let output = EnrichmentCalculator::enrich(&raw, &index(), &PipelineConfig::new());

        assert_eq!(output.dropped, 2);
        assert_eq!(output.stage.items.len(), 1);
    }

    #[test]
    fn test_unresolved_part_carries_nulls() {
        let raw = vec![RawDemandLine::new("100", "UNKNOWN", 10, "1080").with_vehicle_class(4)];

        let output = EnrichmentCalculator::enrich(&raw, &index(), &PipelineConfig::new());
        let line = &output.stage.items[0];

        assert_eq!(line.packaging_code, None);
        assert_eq!(line.package_count, None);
        assert_eq!(line.volume, None);
        assert_eq!(line.total_weight, None);
        assert_eq!(line.weight_saturation_pct, None);
        assert_eq!(output.stage.coverage.unresolved_parts, 1);
        assert_eq!(output.stage.warnings.len(), 1);
    }

    #[test]
    fn test_unresolved_packaging_keeps_package_count() {
        let raw = vec![RawDemandLine::new("100", "PN-002", 30, "1080").with_vehicle_class(4)];

        let output = EnrichmentCalculator::enrich(&raw, &index(), &PipelineConfig::new());
        let line = &output.stage.items[0];

        assert_eq!(line.packaging_code.as_deref(), Some("ZZ99"));
        assert_eq!(line.package_count, Some(Decimal::from(3)));
        assert_eq!(line.volume, None);
        assert_eq!(line.packaging_weight, None);
        assert_eq!(output.stage.coverage.unresolved_packaging, 1);
    }

    #[test]
    fn test_zero_units_per_package_is_unresolved() {
        let raw = vec![RawDemandLine::new("100", "PN-003", 30, "1080").with_vehicle_class(4)];

        let output = EnrichmentCalculator::enrich(&raw, &index(), &PipelineConfig::new());

        assert_eq!(output.stage.items[0].package_count, None);
        assert_eq!(output.stage.coverage.unresolved_units_per_package, 1);
    }

    #[test]
    fn test_vehicle_assigned_from_route() {
        let raw = vec![
            RawDemandLine::new("200", "PN-001", 25, "1080"),
            RawDemandLine::new("300", "PN-001", 25, "1080"),
            RawDemandLine::new("300", "PN-001", 25, "1080/1046"),
            RawDemandLine::new("999", "PN-001", 25, "1080"),
        ];

        let output = EnrichmentCalculator::enrich(&raw, &index(), &PipelineConfig::new());
        let lines = &output.stage.items;

        // 名稱不分大小寫比對 "Carreta"
        assert_eq!(lines[0].vehicle_class, Some(4));
        assert_eq!(lines[0].saturation_basis, Some(SaturationBasis::Volume));
        // 目的地需完全相同
        assert_eq!(lines[1].vehicle_class, None);
        assert_eq!(lines[2].vehicle_class, Some(3));
        assert_eq!(lines[2].saturation_basis, Some(SaturationBasis::Weight));
        assert_eq!(lines[3].vehicle_class, None);
        assert_eq!(output.stage.coverage.unresolved_vehicles, 2);
    }

    #[test]
    fn test_route_assignment_disabled() {
        let raw = vec![RawDemandLine::new("200", "PN-001", 25, "1080")];
        let config = PipelineConfig::new().with_route_vehicle_assignment(false);

        let output = EnrichmentCalculator::enrich(&raw, &index(), &config);
        let line = &output.stage.items[0];

        assert_eq!(line.vehicle_class, None);
        assert_eq!(line.saturation_basis, None);
        assert_eq!(line.max_payload, None);
        assert_eq!(output.stage.coverage.unresolved_vehicles, 1);
    }

    #[test]
    fn test_unknown_route_vehicle_reported_as_error() {
        let raw = vec![
            RawDemandLine::new("100", "PN-001", 25, "2000"),
            RawDemandLine::new("100", "PN-001", 50, "2000"),
        ];

        let output = EnrichmentCalculator::enrich(&raw, &index(), &PipelineConfig::new());
        let lines = &output.stage.items;

        assert_eq!(lines[0].vehicle_class, None);
        // 基準仍取自路線
        assert_eq!(lines[0].saturation_basis, Some(SaturationBasis::Volume));
        assert_eq!(output.stage.warnings.len(), 1);
        assert_eq!(output.stage.warnings[0].subject, "R-03");
        assert_eq!(output.stage.warnings[0].severity, WarningSeverity::Error);
    }

    #[test]
    fn test_vehicle_override_applies_to_payload() {
        let raw = vec![RawDemandLine::new("100", "PN-001", 100, "1080").with_vehicle_class(4)];
        let config = PipelineConfig::new().with_vehicle_override(3);

        let output = EnrichmentCalculator::enrich(&raw, &index(), &config);
        let line = &output.stage.items[0];

        assert_eq!(line.vehicle_class, Some(3));
        assert_eq!(line.max_payload, Some(Decimal::from(500)));
        // 39.8 / 500 × 100
        assert_eq!(line.weight_saturation_pct, Some(dec("7.96")));
    }
}
