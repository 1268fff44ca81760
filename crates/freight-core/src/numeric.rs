//! 可缺值數值運算
//!
//! 查找失敗的欄位以 `None` 表示，任何一個運算元缺值，結果即為缺值。

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// 四捨六入五成雙，保留 `dp` 位小數
pub fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
}

/// 缺值傳遞的加法
pub fn opt_add(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    Some(a? + b?)
}

/// 缺值傳遞的乘法
pub fn opt_mul(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    a?.checked_mul(b?)
}

/// 缺值傳遞的除法；除數為零時視為缺值
pub fn opt_div(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    let divisor = b?;
    if divisor.is_zero() {
        return None;
    }
    a?.checked_div(divisor)
}

/// 百分比 = 分子 / 分母 × 100，保留 `dp` 位小數
pub fn opt_percent(a: Option<Decimal>, b: Option<Decimal>, dp: u32) -> Option<Decimal> {
    opt_div(a, b).map(|ratio| round_dp(ratio * Decimal::ONE_HUNDRED, dp))
}

/// 加總現有值，略過缺值
///
/// 回傳 (總和, 缺值筆數)
pub fn sum_present<I>(values: I) -> (Decimal, usize)
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    values
        .into_iter()
        .fold((Decimal::ZERO, 0), |(sum, absent), value| match value {
            Some(v) => (sum + v, absent),
            None => (sum, absent + 1),
        })
}

/// 所需車次 = ceil(總飽和度百分比 / 100)
pub fn required_loads(total_saturation_pct: Decimal) -> u32 {
    (total_saturation_pct / Decimal::ONE_HUNDRED)
        .ceil()
        .to_u32()
        .unwrap_or(0)
}
