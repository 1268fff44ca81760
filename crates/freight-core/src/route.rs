//! 路線（Flow）與路線整併結果模型

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 飽和度計算基準
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaturationBasis {
    /// 以體積（容量單位）計算
    Volume,
    /// 以重量計算
    Weight,
}

impl SaturationBasis {
    /// 解析基準文字（不分大小寫）
    ///
    /// 只有 "VOLUME" 視為體積基準，其餘一律視為重量基準。
    pub fn parse(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("VOLUME") {
            SaturationBasis::Volume
        } else {
            SaturationBasis::Weight
        }
    }
}

impl fmt::Display for SaturationBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaturationBasis::Volume => write!(f, "VOLUME"),
            SaturationBasis::Weight => write!(f, "WEIGHT"),
        }
    }
}

/// 拆分複合代碼（以 `/` 或 `,` 分隔），去除空白與空字串
pub fn split_codes(raw: &str) -> Vec<String> {
    raw.split(['/', ','])
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

/// 路線定義
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteFlow {
    /// 路線代碼
    pub route_code: String,

    /// 目的地代碼欄位（可能包含多個目的地）
    pub destination_code: String,

    /// 目的地名稱
    #[serde(default)]
    pub destination_name: Option<String>,

    /// 主要車型（顯示名稱）
    pub vehicle: String,

    /// 技術類別
    #[serde(default)]
    pub technology: Option<String>,

    /// 運輸模式
    #[serde(default)]
    pub mode_of_transport: Option<String>,

    /// 承運商
    #[serde(default)]
    pub carrier: Option<String>,

    /// 飽和度基準原始文字（"VOLUME" 或 "WEIGHT"）
    pub saturation_basis: String,

    /// 供應商代碼欄位（例如 "100/200"）
    pub supplier_codes: String,
}

impl RouteFlow {
    /// 創建新的路線
    pub fn new(
        route_code: impl Into<String>,
        destination_code: impl Into<String>,
        vehicle: impl Into<String>,
        saturation_basis: impl Into<String>,
        supplier_codes: impl Into<String>,
    ) -> Self {
        Self {
            route_code: route_code.into(),
            destination_code: destination_code.into(),
            destination_name: None,
            vehicle: vehicle.into(),
            technology: None,
            mode_of_transport: None,
            carrier: None,
            saturation_basis: saturation_basis.into(),
            supplier_codes: supplier_codes.into(),
        }
    }

    /// 建構器模式：設置目的地名稱
    pub fn with_destination_name(mut self, name: impl Into<String>) -> Self {
        self.destination_name = Some(name.into());
        self
    }

    /// 建構器模式：設置承運商
    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = Some(carrier.into());
        self
    }

    /// 建構器模式：設置技術類別與運輸模式
    pub fn with_technology(
        mut self,
        technology: impl Into<String>,
        mode: impl Into<String>,
    ) -> Self {
        self.technology = Some(technology.into());
        self.mode_of_transport = Some(mode.into());
        self
    }

    /// 解析後的飽和度基準
    pub fn basis(&self) -> SaturationBasis {
        SaturationBasis::parse(&self.saturation_basis)
    }

    /// 拆分後的供應商代碼
    pub fn suppliers(&self) -> Vec<String> {
        split_codes(&self.supplier_codes)
    }

    /// 目的地欄位是否包含此目的地代碼（文字包含比對）
    pub fn serves_destination(&self, destination_code: &str) -> bool {
        self.destination_code.contains(destination_code)
    }

    /// 目的地欄位是否與目的地代碼完全相同
    pub fn matches_destination_exactly(&self, destination_code: &str) -> bool {
        self.destination_code.trim() == destination_code.trim()
    }
}

/// 整併建議
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsolidationSuggestion {
    /// 取消最後一車的取貨
    CutLastVehicle,
    /// 最後一車改用較小車型
    DowngradeLastVehicle,
    /// 維持原計劃
    KeepAsPlanned,
}

impl ConsolidationSuggestion {
    /// 依最後一車的剩餘飽和度（總飽和度 mod 100）決定建議
    pub fn from_residual(residual: Decimal) -> Self {
        if residual <= Decimal::TWO {
            ConsolidationSuggestion::CutLastVehicle
        } else if residual <= Decimal::from(50) {
            ConsolidationSuggestion::DowngradeLastVehicle
        } else {
            ConsolidationSuggestion::KeepAsPlanned
        }
    }

    /// 依總飽和度百分比決定建議
    pub fn from_total_saturation(total_pct: Decimal) -> Self {
        Self::from_residual(total_pct % Decimal::ONE_HUNDRED)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConsolidationSuggestion::CutLastVehicle => "cut the collection of the last vehicle",
            ConsolidationSuggestion::DowngradeLastVehicle => {
                "downgrade the last vehicle to a smaller class"
            }
            ConsolidationSuggestion::KeepAsPlanned => "keep the collection as planned",
        }
    }
}

impl fmt::Display for ConsolidationSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// 路線整併結果（每條路線 × 匹配供應商集合一筆）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConsolidationResult {
    /// 路線代碼
    pub route_code: String,

    /// 需求端目的地代碼
    pub destination_code: String,

    /// 目的地名稱
    pub destination_name: Option<String>,

    /// 匹配的供應商代碼（依路線定義順序）
    pub supplier_codes: Vec<String>,

    /// 匹配的供應商名稱（與代碼同序，未知名稱略過）
    pub supplier_names: Vec<String>,

    pub vehicle: String,
    pub technology: Option<String>,
    pub mode_of_transport: Option<String>,
    pub carrier: Option<String>,

    /// 飽和度基準
    pub saturation_basis: SaturationBasis,

    /// 總體積（m³，一位小數）
    pub total_volume: Decimal,

    /// 總重量（kg，一位小數）
    pub total_weight: Decimal,

    /// 總箱數
    pub total_packages: Decimal,

    /// 總飽和度（%，兩位小數）
    pub total_saturation_pct: Decimal,

    /// 所需車次
    pub required_loads: u32,

    /// 整併建議
    pub suggestion: ConsolidationSuggestion,

    /// 已計算飽和度的料號比例（%，一位小數）
    pub coverage_pct: Decimal,
}
