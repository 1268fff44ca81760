//! 飽和度桶與堆疊組合模型

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 飽和度桶鍵：(供應商代碼, 包材代碼)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketKey {
    pub supplier_code: String,
    pub packaging_code: String,
}

impl BucketKey {
    pub fn new(supplier_code: impl Into<String>, packaging_code: impl Into<String>) -> Self {
        Self {
            supplier_code: supplier_code.into(),
            packaging_code: packaging_code.into(),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.supplier_code, self.packaging_code)
    }
}

/// 飽和度桶：一個 (供應商, 包材) 組合的唯一彙總點
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaturationBucket {
    pub key: BucketKey,

    /// 供應商名稱
    pub supplier_name: Option<String>,

    /// 總箱數
    pub total_boxes: Decimal,

    /// 桶內是否至少有一筆已知箱數；全部缺值時總箱數不可信
    pub boxes_resolved: bool,

    /// 派車車型（套用覆寫後）
    pub vehicle_class: Option<u32>,

    /// 是否可上棧板
    pub palletizable: bool,

    /// 棧板換算係數
    pub pallet_factor: Decimal,

    /// 棧板當量 = 總箱數 / 棧板換算係數
    pub pallet_equivalent_total: Decimal,

    /// 每車容量單位
    pub capacity: Option<Decimal>,

    /// 降級車型
    pub downgrade_vehicle_class: Option<u32>,

    /// 降級車型的每車容量單位
    pub downgrade_capacity: Option<Decimal>,

    /// 改用降級車型時的飽和度（%，兩位小數，僅供參考）
    pub downgrade_saturation_pct: Option<Decimal>,

    /// 棧板體積 = 單箱體積 × 棧板換算係數 × 棧板當量
    pub pallet_volume: Option<Decimal>,

    /// 可作為堆疊底層
    pub is_stacking_base: bool,

    /// 可作為堆疊上層
    pub is_stacking_overlay: bool,

    /// 長度效率係數（預設 1）
    pub efficiency_factor: Decimal,

    /// 最終飽和度（比例，不設上限）
    pub final_saturation: Option<Decimal>,

    /// 每箱分攤的飽和度
    pub saturation_per_box: Option<Decimal>,
}

impl SaturationBucket {
    /// 創建新的飽和度桶（容量與飽和度欄位待後續階段填入）
    pub fn new(key: BucketKey, total_boxes: Decimal, pallet_factor: Decimal) -> Self {
        let pallet_equivalent_total = if pallet_factor.is_zero() {
            total_boxes
        } else {
            total_boxes / pallet_factor
        };

        Self {
            key,
            supplier_name: None,
            total_boxes,
            boxes_resolved: true,
            vehicle_class: None,
            palletizable: false,
            pallet_factor,
            pallet_equivalent_total,
            capacity: None,
            downgrade_vehicle_class: None,
            downgrade_capacity: None,
            downgrade_saturation_pct: None,
            pallet_volume: None,
            is_stacking_base: false,
            is_stacking_overlay: false,
            efficiency_factor: Decimal::ONE,
            final_saturation: None,
            saturation_per_box: None,
        }
    }

    /// 建構器模式：標記為可上棧板
    pub fn palletized(mut self) -> Self {
        self.palletizable = true;
        self
    }

    /// 建構器模式：設置容量
    pub fn with_capacity(mut self, capacity: Decimal) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// 建構器模式：設置車型
    pub fn with_vehicle_class(mut self, vehicle_class: u32) -> Self {
        self.vehicle_class = Some(vehicle_class);
        self
    }

    /// 建構器模式：設置堆疊角色
    pub fn with_stacking_roles(mut self, base: bool, overlay: bool) -> Self {
        self.is_stacking_base = base;
        self.is_stacking_overlay = overlay;
        self
    }

    /// 飽和度是否超過一車
    pub fn is_overflowing(&self) -> bool {
        self.final_saturation
            .map(|saturation| saturation > Decimal::ONE)
            .unwrap_or(false)
    }
}

/// 堆疊組合：同一供應商的一組底層 / 上層包材
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingCombination {
    pub supplier_code: String,
    pub base_packaging: String,
    pub overlay_packaging: String,

    /// 底層桶的每車容量
    pub capacity: Option<Decimal>,

    /// 組合前底層箱數
    pub base_total: Decimal,

    /// 組合前上層箱數
    pub overlay_total: Decimal,

    /// 已使用底層箱數
    pub base_used: Decimal,

    /// 已使用上層箱數
    pub overlay_used: Decimal,

    pub base_leftover: Decimal,
    pub overlay_leftover: Decimal,

    /// 堆疊總單位 = 已使用底層 + 已使用上層
    pub stacked_units: Decimal,

    /// 組合飽和度 = 堆疊總單位 / 容量
    pub saturation: Option<Decimal>,

    /// 實際套用的堆疊比（底層 : 1）
    pub ratio: u32,
}

impl StackingCombination {
    /// 組合鍵，例如 "100-A-B"
    pub fn key(&self) -> String {
        format!(
            "{}-{}-{}",
            self.supplier_code, self.base_packaging, self.overlay_packaging
        )
    }

    /// 底層桶鍵
    pub fn base_key(&self) -> BucketKey {
        BucketKey::new(self.supplier_code.clone(), self.base_packaging.clone())
    }
}
