//! # Freight Calculation Engine
//!
//! 需求補齊 → 飽和度分桶 → 堆疊組合 → 飽和度整合 → 路線整併

pub mod bucketing;
pub mod calculator;
pub mod catalog;
pub mod consolidation;
pub mod enrichment;
pub mod integration;
pub mod stacking;

// Re-export 主要類型
pub use calculator::FreightCalculator;
pub use catalog::CatalogIndex;

use freight_core::{DemandLine, RouteConsolidationResult, SaturationBucket, StackingCombination};
use rust_decimal::Decimal;
use serde::Serialize;

/// 飽和度計算結果
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// 補齊後的需求行
    pub lines: Vec<DemandLine>,

    /// 飽和度桶
    pub buckets: Vec<SaturationBucket>,

    /// 堆疊組合
    pub combinations: Vec<StackingCombination>,

    /// 路線整併結果
    pub routes: Vec<RouteConsolidationResult>,

    /// 整批彙總
    pub summary: RunSummary,

    /// 警告信息
    pub warnings: Vec<PipelineWarning>,

    /// 缺值統計
    pub coverage: CoverageReport,

    /// 計算耗時（毫秒）
    #[serde(skip)]
    pub calculation_time_ms: Option<u128>,
}

impl PipelineResult {
    /// 創建空的計算結果
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            buckets: Vec::new(),
            combinations: Vec::new(),
            routes: Vec::new(),
            summary: RunSummary::default(),
            warnings: Vec::new(),
            coverage: CoverageReport::default(),
            calculation_time_ms: None,
        }
    }

    /// 輸出表格為 JSON（不含耗時）
    pub fn to_json(&self) -> freight_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// 整批彙總數值
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// 總體積（m³）
    pub total_volume: Decimal,

    /// 總重量（kg）
    pub total_weight: Decimal,

    /// 總箱數
    pub total_packages: Decimal,

    /// 總體積飽和度（%）
    pub total_saturation_pct: Decimal,

    /// 所需車數 = ceil(總飽和度 / 100)
    pub required_vehicles: u32,

    /// 有效需求行數
    pub valid_lines: usize,

    /// 每箱裝量已知的需求行數
    pub lines_with_units_per_package: usize,

    /// 因數量無效而捨棄的行數
    pub dropped_lines: usize,
}

/// 計算警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineWarning {
    /// 相關對象（料號、包材、桶鍵、路線等）
    pub subject: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl PipelineWarning {
    pub fn new(subject: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            subject,
            message,
            severity,
        }
    }

    pub fn info(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Info)
    }

    pub fn warning(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Warning)
    }

    pub fn error(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}

/// 缺值統計：各類查找失敗最終造成多少欄位缺值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    /// 找不到料號
    pub unresolved_parts: usize,

    /// 找不到包材（含料號未設定包材）
    pub unresolved_packaging: usize,

    /// 每箱裝量缺值或為零
    pub unresolved_units_per_package: usize,

    /// 無法決定車型
    pub unresolved_vehicles: usize,

    /// 找不到最大載重
    pub unresolved_payload: usize,

    /// 桶容量缺值
    pub unresolved_capacity: usize,

    /// 降級車型容量缺值
    pub unresolved_downgrade_capacity: usize,

    /// 需求行的體積飽和度缺值
    pub unresolved_volume_saturation: usize,

    /// 需求行的重量飽和度缺值
    pub unresolved_weight_saturation: usize,

    /// 彙總時略過的缺值
    pub skipped_in_aggregation: usize,
}

impl CoverageReport {
    /// 缺值欄位總數
    pub fn total_absent(&self) -> usize {
        self.unresolved_parts
            + self.unresolved_packaging
            + self.unresolved_units_per_package
            + self.unresolved_vehicles
            + self.unresolved_payload
            + self.unresolved_capacity
            + self.unresolved_downgrade_capacity
            + self.unresolved_volume_saturation
            + self.unresolved_weight_saturation
            + self.skipped_in_aggregation
    }

    /// 合併另一份統計
    pub fn merge(&mut self, other: &CoverageReport) {
        self.unresolved_parts += other.unresolved_parts;
        self.unresolved_packaging += other.unresolved_packaging;
        self.unresolved_units_per_package += other.unresolved_units_per_package;
        self.unresolved_vehicles += other.unresolved_vehicles;
        self.unresolved_payload += other.unresolved_payload;
        self.unresolved_capacity += other.unresolved_capacity;
        self.unresolved_downgrade_capacity += other.unresolved_downgrade_capacity;
        self.unresolved_volume_saturation += other.unresolved_volume_saturation;
        self.unresolved_weight_saturation += other.unresolved_weight_saturation;
        self.skipped_in_aggregation += other.skipped_in_aggregation;
    }

    /// 是否完全沒有缺值
    pub fn is_complete(&self) -> bool {
        self.total_absent() == 0
    }
}

/// 單一計算階段的輸出與診斷
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub items: Vec<T>,
    pub warnings: Vec<PipelineWarning>,
    pub coverage: CoverageReport,
}

impl<T> StageOutput<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            warnings: Vec::new(),
            coverage: CoverageReport::default(),
        }
    }
}
