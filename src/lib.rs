//! # Freight
//!
//! 貨運飽和度計算：需求補齊、飽和度分桶、堆疊組合、飽和度整合與路線整併。

pub use freight_calc;
pub use freight_core;

pub use freight_calc::{
    CoverageReport, FreightCalculator, PipelineResult, PipelineWarning, RunSummary, WarningSeverity,
};
pub use freight_core::{
    CatalogTables, ConsolidationSuggestion, FreightError, PipelineConfig, RawDemandLine, Result,
    StackingAllocation, StackingMode,
};
