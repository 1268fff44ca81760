//! 計算配置模型

use serde::{Deserialize, Serialize};

use crate::{FreightError, Result};

/// 堆疊計算模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StackingMode {
    /// 依堆疊規則的底層比例
    #[default]
    Ratio,

    /// 幹線模式：固定 1 底層 : 1 上層，忽略規則比例
    LineHaul,
}

/// 堆疊時桶內箱數的分配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StackingAllocation {
    /// 每組底層 / 上層各自從桶的原始箱數計算（同一桶可被多組重複計入）
    #[default]
    PerPair,

    /// 同一桶的箱數在所有組合間只能被使用一次
    ConsumeOnce,
}

/// 飽和度計算配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 操作員選定的車型；僅在 `apply_selected_vehicle_to_all` 為真時生效
    #[serde(default)]
    pub selected_vehicle: Option<u32>,

    /// 是否將選定車型套用到所有需求行
    #[serde(default)]
    pub apply_selected_vehicle_to_all: bool,

    /// 堆疊計算模式
    #[serde(default)]
    pub stacking_mode: StackingMode,

    /// 堆疊箱數分配方式
    #[serde(default)]
    pub stacking_allocation: StackingAllocation,

    /// 未指定車型的需求行是否依路線定義帶入車型與飽和度基準
    #[serde(default = "default_true")]
    pub assign_vehicles_from_routes: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            selected_vehicle: None,
            apply_selected_vehicle_to_all: false,
            stacking_mode: StackingMode::Ratio,
            stacking_allocation: StackingAllocation::PerPair,
            assign_vehicles_from_routes: true,
        }
    }
}

impl PipelineConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 JSON 載入配置
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置選定車型
    ///
    /// 只記錄選擇，不改變任何需求行的車型；要套用請改用
    /// [`with_vehicle_override`](Self::with_vehicle_override)。
    pub fn with_selected_vehicle(mut self, vehicle_class: u32) -> Self {
        self.selected_vehicle = Some(vehicle_class);
        self
    }

    /// 建構器模式：選定車型套用到所有需求行
    pub fn with_vehicle_override(mut self, vehicle_class: u32) -> Self {
        self.selected_vehicle = Some(vehicle_class);
        self.apply_selected_vehicle_to_all = true;
        self
    }

    /// 建構器模式：設置堆疊模式
    pub fn with_stacking_mode(mut self, mode: StackingMode) -> Self {
        self.stacking_mode = mode;
        self
    }

    /// 建構器模式：設置堆疊分配方式
    pub fn with_stacking_allocation(mut self, allocation: StackingAllocation) -> Self {
        self.stacking_allocation = allocation;
        self
    }

    /// 建構器模式：設置是否依路線帶入車型
    pub fn with_route_vehicle_assignment(mut self, enabled: bool) -> Self {
        self.assign_vehicles_from_routes = enabled;
        self
    }

    /// 檢查配置
    pub fn validate(&self) -> Result<()> {
        if self.apply_selected_vehicle_to_all && self.selected_vehicle.is_none() {
            return Err(FreightError::InvalidConfig(
                "啟用全部套用選定車型，但未選定車型".to_string(),
            ));
        }
        Ok(())
    }

    /// 套用覆寫後的實際車型
    ///
    /// 覆寫模式下一律使用選定車型；否則沿用需求行的車型。
    pub fn effective_vehicle(&self, line_vehicle: Option<u32>) -> Option<u32> {
        if self.apply_selected_vehicle_to_all {
            self.selected_vehicle.or(line_vehicle)
        } else {
            line_vehicle
        }
    }

    /// 實際套用的堆疊比
    pub fn stacking_ratio(&self, rule_ratio: u32) -> u32 {
        match self.stacking_mode {
            StackingMode::Ratio => rule_ratio,
            StackingMode::LineHaul => 1,
        }
    }
}
