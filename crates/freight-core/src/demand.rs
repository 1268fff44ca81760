//! 需求模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::route::SaturationBasis;

/// 原始需求行（由外部讀檔程式產生）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDemandLine {
    /// 供應商代碼
    pub supplier_code: String,

    /// 料號
    pub part_code: String,

    /// 需求數量（僅正整數有效）
    pub quantity: i64,

    /// 目的地代碼
    pub destination_code: String,

    /// 指定車型（未指定時可由路線定義帶入）
    #[serde(default)]
    pub vehicle_class: Option<u32>,

    /// 飽和度基準
    #[serde(default)]
    pub saturation_basis: Option<SaturationBasis>,
}

impl RawDemandLine {
    /// 創建新的原始需求行
    pub fn new(
        supplier_code: impl Into<String>,
        part_code: impl Into<String>,
        quantity: i64,
        destination_code: impl Into<String>,
    ) -> Self {
        Self {
            supplier_code: supplier_code.into(),
            part_code: part_code.into(),
            quantity,
            destination_code: destination_code.into(),
            vehicle_class: None,
            saturation_basis: None,
        }
    }

    /// 建構器模式：設置車型
    pub fn with_vehicle_class(mut self, vehicle_class: u32) -> Self {
        self.vehicle_class = Some(vehicle_class);
        self
    }

    /// 建構器模式：設置飽和度基準
    pub fn with_saturation_basis(mut self, basis: SaturationBasis) -> Self {
        self.saturation_basis = Some(basis);
        self
    }

    /// 數量是否為正
    pub fn is_valid(&self) -> bool {
        self.quantity > 0
    }
}

/// 補齊屬性後的需求行
///
/// 任何查找失敗的欄位保留為 `None`，不會被靜默補零。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandLine {
    pub supplier_code: String,
    pub supplier_name: Option<String>,
    pub destination_code: String,
    pub part_code: String,
    pub quantity: Decimal,
    pub part_description: Option<String>,

    /// 包材代碼（大寫）
    pub packaging_code: Option<String>,
    pub packaging_description: Option<String>,
    pub units_per_package: Option<Decimal>,

    /// 箱數 = round(數量 / 每箱裝量)
    pub package_count: Option<Decimal>,

    pub saturation_basis: Option<SaturationBasis>,

    /// 套用覆寫後的車型
    pub vehicle_class: Option<u32>,

    /// 體積（m³，一位小數）
    pub volume: Option<Decimal>,

    /// 物料重量（kg，一位小數）
    pub material_weight: Option<Decimal>,

    /// 包材重量（kg，一位小數）
    pub packaging_weight: Option<Decimal>,

    /// 總重量 = 物料重量 + 包材重量
    pub total_weight: Option<Decimal>,

    /// 車型最大載重
    pub max_payload: Option<Decimal>,

    /// 體積飽和度（%，兩位小數）
    pub volume_saturation_pct: Option<Decimal>,

    /// 重量飽和度（%，兩位小數）
    pub weight_saturation_pct: Option<Decimal>,
}

impl DemandLine {
    /// 依基準取得飽和度百分比
    pub fn saturation_pct(&self, basis: SaturationBasis) -> Option<Decimal> {
        match basis {
            SaturationBasis::Volume => self.volume_saturation_pct,
            SaturationBasis::Weight => self.weight_saturation_pct,
        }
    }

    /// 需求行的供應商代碼是否屬於給定集合（複合代碼任一符合即可）
    pub fn has_supplier_in(&self, suppliers: &[String]) -> bool {
        crate::route::split_codes(&self.supplier_code)
            .iter()
            .any(|code| suppliers.contains(code))
    }
}
