//! # Freight Core
//!
//! 運輸裝載飽和度計算的核心資料模型與類型定義

pub mod catalog;
pub mod config;
pub mod demand;
pub mod numeric;
pub mod route;
pub mod saturation;

// Re-export 主要類型
pub use catalog::{
    downgrade_vehicle_class, CatalogTables, LengthEfficiencyFactor, PackagingCatalogEntry,
    PartCatalogEntry, StackingRule, VehicleCatalogEntry,
};
pub use config::{PipelineConfig, StackingAllocation, StackingMode};
pub use demand::{DemandLine, RawDemandLine};
pub use route::{
    split_codes, ConsolidationSuggestion, RouteConsolidationResult, RouteFlow, SaturationBasis,
};
pub use saturation::{BucketKey, SaturationBucket, StackingCombination};

/// 運輸計算錯誤類型
///
/// 只有整批計算無法進行時才會回傳錯誤；單筆查找失敗以 `None` 傳遞，不會中斷計算。
#[derive(Debug, thiserror::Error)]
pub enum FreightError {
    #[error("基礎資料表缺失或為空: {0}")]
    MissingCatalog(String),

    #[error("無效的計算配置: {0}")]
    InvalidConfig(String),

    #[error("資料序列化錯誤: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FreightError>;
