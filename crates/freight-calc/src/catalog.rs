//! 基礎資料索引
//!
//! 在計算開始前一次建立，之後各階段只讀取。

use std::collections::{BTreeMap, HashMap, HashSet};

use freight_core::{
    CatalogTables, LengthEfficiencyFactor, PackagingCatalogEntry, PartCatalogEntry, RouteFlow,
    VehicleCatalogEntry,
};
use rust_decimal::Decimal;

use crate::PipelineWarning;

type StackingKey = (String, String, String);

/// 基礎資料查找表
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    /// 供應商代碼 → 名稱
    suppliers: HashMap<String, String>,

    /// 料號 → 物料主檔（重複時取最新）
    parts: HashMap<String, PartCatalogEntry>,

    /// 包材代碼（大寫）→ 包材主檔
    packaging: HashMap<String, PackagingCatalogEntry>,

    /// 車型代碼 → 車型主檔
    vehicles: BTreeMap<u32, VehicleCatalogEntry>,

    /// 車型名稱 → 代碼
    vehicle_names: HashMap<String, u32>,

    /// (供應商, 底層, 上層) → 底層比例
    stacking: HashMap<StackingKey, u32>,

    /// 可作為底層的 (供應商, 包材)
    stacking_bases: HashSet<(String, String)>,

    /// 可作為上層的 (供應商, 包材)
    stacking_overlays: HashSet<(String, String)>,

    /// (供應商, 包材, 車型) → 長度效率係數
    efficiency: HashMap<(String, String, u32), Decimal>,

    /// 路線定義
    route_flows: Vec<RouteFlow>,

    /// 建立索引時略過的資料
    build_warnings: Vec<PipelineWarning>,
}

impl CatalogIndex {
    /// 建立索引
    ///
    /// 物料、包材、車型任一表為空時整批失敗。
    pub fn build(tables: &CatalogTables) -> freight_core::Result<Self> {
        tables.validate()?;

        let mut build_warnings = Vec::new();

        let parts = Self::index_parts(&tables.parts);
        let suppliers = Self::index_suppliers(&tables.parts);

        let mut packaging = HashMap::new();
        for entry in &tables.packaging {
            let code = normalize_packaging(&entry.packaging_code);
            packaging.entry(code.clone()).or_insert_with(|| {
                let mut entry = entry.clone();
                entry.packaging_code = code;
                entry
            });
        }

        let mut vehicles = BTreeMap::new();
        let mut vehicle_names = HashMap::new();
        for vehicle in &tables.vehicles {
            vehicles.entry(vehicle.code).or_insert_with(|| vehicle.clone());
            vehicle_names
                .entry(vehicle.name.trim().to_uppercase())
                .or_insert(vehicle.code);
        }

        let mut stacking = HashMap::new();
        let mut stacking_bases = HashSet::new();
        let mut stacking_overlays = HashSet::new();
        for rule in &tables.stacking_rules {
            let supplier = rule.supplier_code.trim().to_string();
            let base = normalize_packaging(&rule.base_packaging);
            let overlay = normalize_packaging(&rule.overlay_packaging);

            if rule.base_per_overlay == 0 {
                tracing::warn!("堆疊規則 {}-{}-{} 的底層比例為 0，略過", supplier, base, overlay);
                build_warnings.push(PipelineWarning::warning(
                    format!("{}-{}-{}", supplier, base, overlay),
                    "堆疊規則的底層比例為 0，已略過".to_string(),
                ));
                continue;
            }

            stacking_bases.insert((supplier.clone(), base.clone()));
            stacking_overlays.insert((supplier.clone(), overlay.clone()));
            stacking
                .entry((supplier, base, overlay))
                .or_insert(rule.base_per_overlay);
        }

        let efficiency = Self::index_efficiency(&tables.efficiency_factors, &mut build_warnings);

        tracing::debug!(
            "基礎資料索引完成：物料 {} 筆，包材 {} 筆，車型 {} 筆，堆疊規則 {} 筆，路線 {} 筆",
            parts.len(),
            packaging.len(),
            vehicles.len(),
            stacking.len(),
            tables.route_flows.len()
        );

        Ok(Self {
            suppliers,
            parts,
            packaging,
            vehicles,
            vehicle_names,
            stacking,
            stacking_bases,
            stacking_overlays,
            efficiency,
            route_flows: tables.route_flows.clone(),
            build_warnings,
        })
    }

    /// 同料號取最新更新的一筆；時間相同或皆無時間時保留先出現者
    fn index_parts(entries: &[PartCatalogEntry]) -> HashMap<String, PartCatalogEntry> {
        let mut parts: HashMap<String, PartCatalogEntry> = HashMap::new();
        for entry in entries {
            let code = entry.part_code.trim().to_string();
            let replace = parts
                .get(&code)
                .map_or(true, |existing| entry.is_newer_than(existing));
            if replace {
                parts.insert(code, entry.clone());
            }
        }
        parts
    }

    /// 供應商名稱同樣取最新物料主檔上的名稱
    fn index_suppliers(entries: &[PartCatalogEntry]) -> HashMap<String, String> {
        let mut newest: HashMap<String, &PartCatalogEntry> = HashMap::new();
        for entry in entries.iter().filter(|e| e.supplier_name.is_some()) {
            let code = entry.supplier_code.trim().to_string();
            let replace = newest
                .get(&code)
                .map_or(true, |existing| entry.is_newer_than(existing));
            if replace {
                newest.insert(code, entry);
            }
        }
        newest
            .into_iter()
            .filter_map(|(code, entry)| entry.supplier_name.clone().map(|name| (code, name)))
            .collect()
    }

    fn index_efficiency(
        factors: &[LengthEfficiencyFactor],
        warnings: &mut Vec<PipelineWarning>,
    ) -> HashMap<(String, String, u32), Decimal> {
        let mut efficiency = HashMap::new();
        for factor in factors {
            let key = (
                factor.supplier_code.trim().to_string(),
                normalize_packaging(&factor.packaging_code),
                factor.vehicle_class,
            );
            if !factor.is_valid() {
                tracing::warn!(
                    "長度效率係數 {}-{} (車型 {}) = {} 超出 (0, 1]，略過",
                    key.0,
                    key.1,
                    key.2,
                    factor.factor
                );
                warnings.push(PipelineWarning::warning(
                    format!("{}-{}", key.0, key.1),
                    format!("車型 {} 的長度效率係數 {} 超出 (0, 1]，已略過", key.2, factor.factor),
                ));
                continue;
            }
            efficiency.entry(key).or_insert(factor.factor);
        }
        efficiency
    }

    /// 供應商名稱
    pub fn supplier_name(&self, supplier_code: &str) -> Option<&str> {
        self.suppliers.get(supplier_code.trim()).map(String::as_str)
    }

    /// 物料主檔
    pub fn part(&self, part_code: &str) -> Option<&PartCatalogEntry> {
        self.parts.get(part_code.trim())
    }

    /// 包材主檔（不分大小寫）
    pub fn packaging(&self, packaging_code: &str) -> Option<&PackagingCatalogEntry> {
        self.packaging.get(&normalize_packaging(packaging_code))
    }

    /// 車型主檔
    pub fn vehicle(&self, code: u32) -> Option<&VehicleCatalogEntry> {
        self.vehicles.get(&code)
    }

    /// 依顯示名稱查車型代碼（先精確比對，再去空白後不分大小寫比對）
    pub fn vehicle_code_by_name(&self, name: &str) -> Option<u32> {
        self.vehicles
            .values()
            .find(|vehicle| vehicle.name == name)
            .map(|vehicle| vehicle.code)
            .or_else(|| self.vehicle_names.get(&name.trim().to_uppercase()).copied())
    }

    /// 車型最大載重
    pub fn max_payload(&self, vehicle_class: u32) -> Option<Decimal> {
        self.vehicle(vehicle_class)?.max_payload
    }

    /// 車型 × 包材的每車容量
    ///
    /// 經由車型的容量欄位查詢包材容量表；任一環節缺失回傳 `None`。
    pub fn capacity(&self, vehicle_class: u32, packaging_code: &str) -> Option<Decimal> {
        let column = &self.vehicle(vehicle_class)?.capacity_column;
        self.packaging(packaging_code)?.capacity_for(column)
    }

    /// 堆疊規則比例
    pub fn stacking_ratio(&self, supplier_code: &str, base: &str, overlay: &str) -> Option<u32> {
        self.stacking
            .get(&(
                supplier_code.trim().to_string(),
                normalize_packaging(base),
                normalize_packaging(overlay),
            ))
            .copied()
    }

    /// 此 (供應商, 包材) 是否可作為堆疊底層
    pub fn is_stacking_base(&self, supplier_code: &str, packaging_code: &str) -> bool {
        self.stacking_bases.contains(&(
            supplier_code.trim().to_string(),
            normalize_packaging(packaging_code),
        ))
    }

    /// 此 (供應商, 包材) 是否可作為堆疊上層
    pub fn is_stacking_overlay(&self, supplier_code: &str, packaging_code: &str) -> bool {
        self.stacking_overlays.contains(&(
            supplier_code.trim().to_string(),
            normalize_packaging(packaging_code),
        ))
    }

    /// 長度效率係數（未定義回傳 `None`，呼叫端預設為 1）
    pub fn efficiency_factor(
        &self,
        supplier_code: &str,
        packaging_code: &str,
        vehicle_class: u32,
    ) -> Option<Decimal> {
        self.efficiency
            .get(&(
                supplier_code.trim().to_string(),
                normalize_packaging(packaging_code),
                vehicle_class,
            ))
            .copied()
    }

    /// 路線定義
    pub fn route_flows(&self) -> &[RouteFlow] {
        &self.route_flows
    }

    /// 建立索引時產生的警告
    pub fn build_warnings(&self) -> &[PipelineWarning] {
        &self.build_warnings
    }
}

/// 包材代碼統一為去空白的大寫
pub fn normalize_packaging(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use freight_core::{FreightError, StackingRule};

    fn at(day: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn base_tables() -> CatalogTables {
        CatalogTables {
            parts: vec![PartCatalogEntry::new("PN-001", "100")
                .with_supplier_name("ACME")
                .with_packaging("cx01", Decimal::from(25))],
            packaging: vec![PackagingCatalogEntry::new("cx01")
                .with_unit_volume(Decimal::new(5, 1))
                .with_capacity("CARRETA", Decimal::from(52))],
            vehicles: vec![
                VehicleCatalogEntry::new(4, "CARRETA", "CARRETA")
                    .with_max_payload(Decimal::from(27000)),
                VehicleCatalogEntry::new(3, "TRUCK 3M", "TRUCK"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_newest_part_wins() {
        let mut tables = base_tables();
        tables.parts = vec![
            PartCatalogEntry::new("PN-001", "100")
                .with_description("舊版")
                .with_updated_at(at(1)),
            PartCatalogEntry::new("PN-001", "100")
                .with_description("新版")
                .with_updated_at(at(3)),
            PartCatalogEntry::new("PN-001", "100")
                .with_description("中間版")
                .with_updated_at(at(2)),
        ];

        let index = CatalogIndex::build(&tables).unwrap();
        assert_eq!(index.part("PN-001").unwrap().description.as_deref(), Some("新版"));
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let mut tables = base_tables();
        tables.parts = vec![
            PartCatalogEntry::new("PN-001", "100")
                .with_description("第一筆")
                .with_updated_at(at(2)),
            PartCatalogEntry::new("PN-001", "100")
                .with_description("第二筆")
                .with_updated_at(at(2)),
            PartCatalogEntry::new("PN-001", "100").with_description("無時間"),
        ];

        let index = CatalogIndex::build(&tables).unwrap();
        assert_eq!(index.part("PN-001").unwrap().description.as_deref(), Some("第一筆"));
    }

    #[test]
    fn test_packaging_lookup_is_case_insensitive() {
        let index = CatalogIndex::build(&base_tables()).unwrap();

        assert!(index.packaging("CX01").is_some());
        assert!(index.packaging(" cx01 ").is_some());
        assert_eq!(index.packaging("CX01").unwrap().packaging_code, "CX01");
    }

    #[test]
    fn test_capacity_lookup() {
        let index = CatalogIndex::build(&base_tables()).unwrap();

        assert_eq!(index.capacity(4, "CX01"), Some(Decimal::from(52)));
        // 車型 3 的容量欄位沒有定義
        assert_eq!(index.capacity(3, "CX01"), None);
        // 未知車型
        assert_eq!(index.capacity(99, "CX01"), None);
        // 未知包材
        assert_eq!(index.capacity(4, "ZZ99"), None);
    }

    #[test]
    fn test_unknown_keys_are_absent() {
        let index = CatalogIndex::build(&base_tables()).unwrap();

        assert!(index.part("NOPE").is_none());
        assert!(index.supplier_name("999").is_none());
        assert!(index.max_payload(3).is_none());
        assert_eq!(index.max_payload(4), Some(Decimal::from(27000)));
        assert_eq!(index.supplier_name("100"), Some("ACME"));
    }

    #[test]
    fn test_vehicle_by_name() {
        let index = CatalogIndex::build(&base_tables()).unwrap();

        assert_eq!(index.vehicle_code_by_name("CARRETA"), Some(4));
        assert_eq!(index.vehicle_code_by_name(" truck 3m "), Some(3));
        assert_eq!(index.vehicle_code_by_name("BITREM"), None);
    }

    #[test]
    fn test_stacking_roles() {
        let mut tables = base_tables();
        tables.stacking_rules = vec![
            StackingRule::new("100", "A", "B", 2),
            StackingRule::new("100", "B", "C", 1),
            StackingRule::new("100", "C", "D", 0),
        ];

        let index = CatalogIndex::build(&tables).unwrap();

        assert!(index.is_stacking_base("100", "A"));
        assert!(!index.is_stacking_overlay("100", "A"));
        // B 同時是底層與上層
        assert!(index.is_stacking_base("100", "B"));
        assert!(index.is_stacking_overlay("100", "B"));
        assert_eq!(index.stacking_ratio("100", "a", "b"), Some(2));
        assert_eq!(index.stacking_ratio("200", "A", "B"), None);

        // 比例為 0 的規則被略過
        assert!(!index.is_stacking_base("100", "D") && !index.is_stacking_overlay("100", "D"));
        assert_eq!(index.stacking_ratio("100", "C", "D"), None);
        assert_eq!(index.build_warnings().len(), 1);
    }

    #[test]
    fn test_invalid_efficiency_skipped() {
        let mut tables = base_tables();
        tables.efficiency_factors = vec![
            LengthEfficiencyFactor::new("100", "CX01", 4, Decimal::new(9, 1)),
            LengthEfficiencyFactor::new("100", "CX01", 3, Decimal::from(2)),
        ];

        let index = CatalogIndex::build(&tables).unwrap();

        assert_eq!(index.efficiency_factor("100", "cx01", 4), Some(Decimal::new(9, 1)));
        assert_eq!(index.efficiency_factor("100", "CX01", 3), None);
        assert_eq!(index.build_warnings().len(), 1);
    }

    #[test]
    fn test_empty_vehicle_catalog_is_fatal() {
        let mut tables = base_tables();
        tables.vehicles.clear();

        assert!(matches!(
            CatalogIndex::build(&tables),
            Err(FreightError::MissingCatalog(_))
        ));
    }
}
