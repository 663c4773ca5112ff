//! 简单统计工具.

use crate::{Error, Result};
use ordered_float::OrderedFloat;

/// 计算 `data` 中所有有限值的第 `p` 百分位数 (`0 <= p <= 100`),
/// 在相邻两个次序统计量之间线性插值. NaN 与无穷值被忽略.
///
/// 若没有有限值则返回 `Err`.
pub fn percentile<I: IntoIterator<Item = f32>>(data: I, p: f64) -> Result<f32> {
    let [v] = percentiles(data, [p])?;
    Ok(v)
}

/// 同 [`percentile`], 但一次排序求出多个百分位数.
pub fn percentiles<I: IntoIterator<Item = f32>, const N: usize>(
    data: I,
    ps: [f64; N],
) -> Result<[f32; N]> {
    let mut buf: Vec<OrderedFloat<f32>> = data
        .into_iter()
        .filter(|v| v.is_finite())
        .map(OrderedFloat)
        .collect();
    if buf.is_empty() {
        return Err(Error::EmptyData);
    }
    buf.sort_unstable();

    let last = (buf.len() - 1) as f64;
    let mut ans = [0.0; N];
    for (slot, p) in ans.iter_mut().zip(ps) {
        if !(0.0..=100.0).contains(&p) {
            return Err(Error::InvalidArgument(format!("percentile {p} not in [0, 100]")));
        }
        let pos = p / 100.0 * last;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        let frac = (pos - lo as f64) as f32;
        let (a, b) = (buf[lo].0, buf[hi].0);
        *slot = a + (b - a) * frac;
    }
    Ok(ans)
}

/// 求有限值的 (最小值, 最大值). 没有有限值时返回 `None`.
pub fn finite_min_max<I: IntoIterator<Item = f32>>(data: I) -> Option<(f32, f32)> {
    data.into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// 在 `[start, end]` 之间生成 `n` 个等距点, 含两端. `n == 1` 时仅返回 `start`.
///
/// 最后一个点恰好等于 `end`, 不受累积舍入误差影响.
pub fn linspace(start: f64, end: f64, n: usize) -> impl ExactSizeIterator<Item = f64> {
    let step = if n > 1 {
        (end - start) / (n - 1) as f64
    } else {
        0.0
    };
    (0..n).map(move |i| {
        if n > 1 && i == n - 1 {
            end
        } else {
            start + step * i as f64
        }
    })
}
