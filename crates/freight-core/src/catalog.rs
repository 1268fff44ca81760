//! 基礎資料模型（物料、包材、車型、堆疊規則、長度效率）

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::route::RouteFlow;

/// 物料主檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartCatalogEntry {
    /// 料號
    pub part_code: String,

    /// 物料描述
    #[serde(default)]
    pub description: Option<String>,

    /// 所屬供應商代碼
    pub supplier_code: String,

    /// 供應商名稱
    #[serde(default)]
    pub supplier_name: Option<String>,

    /// 包材代碼
    #[serde(default)]
    pub packaging_code: Option<String>,

    /// 每箱裝量
    #[serde(default)]
    pub units_per_package: Option<Decimal>,

    /// 單件重量（kg）
    #[serde(default)]
    pub unit_weight: Option<Decimal>,

    /// 最後更新時間（同料號重複時取最新一筆）
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl PartCatalogEntry {
    /// 創建新的物料主檔
    pub fn new(part_code: impl Into<String>, supplier_code: impl Into<String>) -> Self {
        Self {
            part_code: part_code.into(),
            description: None,
            supplier_code: supplier_code.into(),
            supplier_name: None,
            packaging_code: None,
            units_per_package: None,
            unit_weight: None,
            updated_at: None,
        }
    }

    /// 建構器模式：設置描述
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 建構器模式：設置供應商名稱
    pub fn with_supplier_name(mut self, name: impl Into<String>) -> Self {
        self.supplier_name = Some(name.into());
        self
    }

    /// 建構器模式：設置包材與每箱裝量
    pub fn with_packaging(
        mut self,
        packaging_code: impl Into<String>,
        units_per_package: Decimal,
    ) -> Self {
        self.packaging_code = Some(packaging_code.into());
        self.units_per_package = Some(units_per_package);
        self
    }

    /// 建構器模式：設置單件重量
    pub fn with_unit_weight(mut self, weight: Decimal) -> Self {
        self.unit_weight = Some(weight);
        self
    }

    /// 建構器模式：設置更新時間
    pub fn with_updated_at(mut self, updated_at: NaiveDateTime) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// 判斷此筆是否比 `other` 更新
    ///
    /// 有時間戳優先於無時間戳；時間相同時不算更新（保留先出現者）。
    pub fn is_newer_than(&self, other: &PartCatalogEntry) -> bool {
        match (self.updated_at, other.updated_at) {
            (Some(mine), Some(theirs)) => mine > theirs,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

/// 包材主檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingCatalogEntry {
    /// 包材代碼（索引時統一轉大寫）
    pub packaging_code: String,

    /// 包材描述
    #[serde(default)]
    pub description: Option<String>,

    /// 單箱體積（m³）
    #[serde(default)]
    pub unit_volume: Option<Decimal>,

    /// 單箱空重（kg）
    #[serde(default)]
    pub unit_weight: Option<Decimal>,

    /// 是否可上棧板
    #[serde(default)]
    pub palletizable: bool,

    /// 每棧板箱數
    #[serde(default)]
    pub boxes_per_pallet: Option<Decimal>,

    /// 車型容量欄位 → 每車可裝單位數（稀疏）
    #[serde(default)]
    pub capacities: BTreeMap<String, Decimal>,
}

impl PackagingCatalogEntry {
    /// 創建新的包材主檔
    pub fn new(packaging_code: impl Into<String>) -> Self {
        Self {
            packaging_code: packaging_code.into(),
            description: None,
            unit_volume: None,
            unit_weight: None,
            palletizable: false,
            boxes_per_pallet: None,
            capacities: BTreeMap::new(),
        }
    }

    /// 建構器模式：設置描述
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 建構器模式：設置單箱體積
    pub fn with_unit_volume(mut self, volume: Decimal) -> Self {
        self.unit_volume = Some(volume);
        self
    }

    /// 建構器模式：設置單箱空重
    pub fn with_unit_weight(mut self, weight: Decimal) -> Self {
        self.unit_weight = Some(weight);
        self
    }

    /// 建構器模式：設置為可上棧板
    pub fn with_pallet(mut self, boxes_per_pallet: Decimal) -> Self {
        self.palletizable = true;
        self.boxes_per_pallet = Some(boxes_per_pallet);
        self
    }

    /// 建構器模式：設置某車型容量欄位的容量
    pub fn with_capacity(mut self, column: impl Into<String>, units: Decimal) -> Self {
        self.capacities.insert(column.into(), units);
        self
    }

    /// 棧板換算係數
    ///
    /// 不可上棧板為 1；可上棧板取每棧板箱數，未設定或為 0 時退回 1。
    pub fn pallet_factor(&self) -> Decimal {
        if !self.palletizable {
            return Decimal::ONE;
        }
        self.boxes_per_pallet
            .filter(|boxes| *boxes > Decimal::ZERO)
            .unwrap_or(Decimal::ONE)
    }

    /// 依容量欄位取得每車容量
    pub fn capacity_for(&self, column: &str) -> Option<Decimal> {
        self.capacities.get(column).copied()
    }
}

/// 車型主檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleCatalogEntry {
    /// 車型代碼
    pub code: u32,

    /// 顯示名稱
    pub name: String,

    /// 容量欄位（對應包材主檔的 capacities 鍵）
    pub capacity_column: String,

    /// 最大載重（kg）
    #[serde(default)]
    pub max_payload: Option<Decimal>,
}

impl VehicleCatalogEntry {
    /// 創建新的車型主檔
    pub fn new(code: u32, name: impl Into<String>, capacity_column: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            capacity_column: capacity_column.into(),
            max_payload: None,
        }
    }

    /// 建構器模式：設置最大載重
    pub fn with_max_payload(mut self, payload: Decimal) -> Self {
        self.max_payload = Some(payload);
        self
    }
}

/// 降級車型對照（僅供試算較小車型的飽和度，不改變實際派車）
pub fn downgrade_vehicle_class(code: u32) -> Option<u32> {
    match code {
        4..=9 | 14 => Some(3),
        2 | 3 | 12 | 13 | 15..=18 => Some(1),
        1 => Some(10),
        10 | 11 => Some(11),
        _ => None,
    }
}

/// 堆疊規則：同一供應商的底層包材可承載上層包材
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackingRule {
    /// 供應商代碼
    pub supplier_code: String,

    /// 底層包材
    pub base_packaging: String,

    /// 上層包材
    pub overlay_packaging: String,

    /// 每一個上層單位需要的底層單位數
    pub base_per_overlay: u32,
}

impl StackingRule {
    pub fn new(
        supplier_code: impl Into<String>,
        base_packaging: impl Into<String>,
        overlay_packaging: impl Into<String>,
        base_per_overlay: u32,
    ) -> Self {
        Self {
            supplier_code: supplier_code.into(),
            base_packaging: base_packaging.into(),
            overlay_packaging: overlay_packaging.into(),
            base_per_overlay,
        }
    }
}

/// 長度效率係數：車廂長度方向的裝載損耗，範圍 (0, 1]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LengthEfficiencyFactor {
    pub supplier_code: String,
    pub packaging_code: String,
    pub vehicle_class: u32,
    pub factor: Decimal,
}

impl LengthEfficiencyFactor {
    pub fn new(
        supplier_code: impl Into<String>,
        packaging_code: impl Into<String>,
        vehicle_class: u32,
        factor: Decimal,
    ) -> Self {
        Self {
            supplier_code: supplier_code.into(),
            packaging_code: packaging_code.into(),
            vehicle_class,
            factor,
        }
    }

    /// 係數是否落在 (0, 1]
    pub fn is_valid(&self) -> bool {
        self.factor > Decimal::ZERO && self.factor <= Decimal::ONE
    }
}

/// 一次計算所需的全部基礎資料表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogTables {
    pub parts: Vec<PartCatalogEntry>,
    pub packaging: Vec<PackagingCatalogEntry>,
    pub vehicles: Vec<VehicleCatalogEntry>,
    #[serde(default)]
    pub stacking_rules: Vec<StackingRule>,
    #[serde(default)]
    pub efficiency_factors: Vec<LengthEfficiencyFactor>,
    #[serde(default)]
    pub route_flows: Vec<RouteFlow>,
}

impl CatalogTables {
    /// 從 JSON 載入基礎資料
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 檢查每個計算階段都需要的資料表
    pub fn validate(&self) -> crate::Result<()> {
        if self.parts.is_empty() {
            return Err(crate::FreightError::MissingCatalog("物料主檔".to_string()));
        }
        if self.packaging.is_empty() {
            return Err(crate::FreightError::MissingCatalog("包材主檔".to_string()));
        }
        if self.vehicles.is_empty() {
            return Err(crate::FreightError::MissingCatalog("車型主檔".to_string()));
        }
        Ok(())
    }
}
