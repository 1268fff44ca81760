//! 路線整併示例

use freight::freight_core::{
    LengthEfficiencyFactor, PackagingCatalogEntry, PartCatalogEntry, RouteFlow, StackingRule,
    VehicleCatalogEntry,
};
use freight::{CatalogTables, FreightCalculator, PipelineConfig, RawDemandLine};
use rust_decimal::Decimal;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== 路線整併示例 ===\n");

    let tables = CatalogTables {
        parts: vec![
            PartCatalogEntry::new("PN-100", "100")
                .with_supplier_name("ACME")
                .with_description("支架")
                .with_packaging("A", Decimal::from(25))
                .with_unit_weight(Decimal::new(4, 1)),
            PartCatalogEntry::new("PN-101", "100")
                .with_supplier_name("ACME")
                .with_packaging("B", Decimal::from(10))
                .with_unit_weight(Decimal::ONE),
            PartCatalogEntry::new("PN-200", "200")
                .with_supplier_name("Globex")
                .with_packaging("A", Decimal::from(25))
                .with_unit_weight(Decimal::new(4, 1)),
        ],
        packaging: vec![
            PackagingCatalogEntry::new("A")
                .with_description("大箱")
                .with_unit_volume(Decimal::new(5, 1))
                .with_unit_weight(Decimal::new(15, 1))
                .with_capacity("CARRETA", Decimal::from(20))
                .with_capacity("TRUCK", Decimal::from(10)),
            PackagingCatalogEntry::new("B")
                .with_description("小箱")
                .with_unit_volume(Decimal::new(25, 2))
                .with_unit_weight(Decimal::new(5, 1))
                .with_capacity("CARRETA", Decimal::from(40))
                .with_capacity("TRUCK", Decimal::from(20)),
        ],
        vehicles: vec![
            VehicleCatalogEntry::new(4, "CARRETA", "CARRETA")
                .with_max_payload(Decimal::from(25000)),
            VehicleCatalogEntry::new(3, "TRUCK", "TRUCK").with_max_payload(Decimal::from(8000)),
        ],
        stacking_rules: vec![StackingRule::new("100", "A", "B", 2)],
        efficiency_factors: vec![LengthEfficiencyFactor::new("200", "A", 4, Decimal::new(8, 1))],
        route_flows: vec![RouteFlow::new("R-01", "1080", "CARRETA", "VOLUME", "100/200")
            .with_destination_name("Betim")
            .with_carrier("Trans")],
    };

    let demand = vec![
        RawDemandLine::new("100", "PN-100", 250, "1080"),
        RawDemandLine::new("100", "PN-101", 70, "1080"),
        RawDemandLine::new("200", "PN-200", 100, "1080"),
    ];

    let calculator = FreightCalculator::from_tables(&tables, PipelineConfig::new())?;
    let result = calculator.calculate(&demand)?;

    println!("\n飽和度桶:");
    for bucket in &result.buckets {
        println!(
            "  - {}: 箱數 {}, 容量 {:?}, 飽和度 {:?}",
            bucket.key, bucket.total_boxes, bucket.capacity, bucket.final_saturation
        );
    }

    println!("\n堆疊組合:");
    for combination in &result.combinations {
        println!(
            "  - {}: 底層 {} / 上層 {}, 剩餘 {} / {}, 飽和度 {:?}",
            combination.key(),
            combination.base_used,
            combination.overlay_used,
            combination.base_leftover,
            combination.overlay_leftover,
            combination.saturation
        );
    }

    println!("\n路線整併:");
    for route in &result.routes {
        println!(
            "  - {} ({}): 飽和度 {}%, 車次 {}, 建議: {}",
            route.route_code,
            route.supplier_codes.join("/"),
            route.total_saturation_pct,
            route.required_loads,
            route.suggestion
        );
    }

    println!(
        "\n總飽和度 {}%，所需車數 {}",
        result.summary.total_saturation_pct, result.summary.required_vehicles
    );

    Ok(())
}
