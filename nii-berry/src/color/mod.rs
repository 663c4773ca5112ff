//! 颜色映射.
//!
//! 标量切片先经 [`Norm`] 归一化到 `[0, 1]`, 再由 [`ColorMap`] 查表得到 RGB.

mod maps;
mod norm;

pub use norm::Norm;

use crate::consts::{rgb, Rgb};
use crate::{Error, Result, RgbSlice, ScalarSlice};
use maps::{Stop, MAPS};
use std::fmt;
use std::str::FromStr;

/// 分段线性色表.
///
/// 通过名字构造, 见 [`ColorMap::names`]. 名字带 `_r` 后缀时得到反转的色表.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorMap {
    name: String,
    stops: &'static [Stop],
    reversed: bool,
}

impl ColorMap {
    /// 按名字查找色表. 未知名字返回 `Err`.
    pub fn new(name: &str) -> Result<Self> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (name, false),
        };
        let stops = MAPS
            .get(base)
            .ok_or_else(|| Error::UnknownColorMap(name.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            stops: stops.as_slice(),
            reversed,
        })
    }

    /// 灰度色表.
    pub fn gray() -> Self {
        Self {
            name: "gray".to_string(),
            stops: MAPS["gray"].as_slice(),
            reversed: false,
        }
    }

    /// 全部内置色表的名字 (不含 `_r` 变体), 按字典序.
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<_> = MAPS.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// 色表名字, 含 `_r` 后缀.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 反转后的色表.
    pub fn reversed(&self) -> Self {
        let name = match self.name.strip_suffix("_r") {
            Some(base) => base.to_string(),
            None => format!("{}_r", self.name),
        };
        Self {
            name,
            stops: self.stops,
            reversed: !self.reversed,
        }
    }

    /// 求 `v` 处的颜色. `v` 被截断到 `[0, 1]`; NaN 映射为黑色.
    pub fn eval(&self, v: f32) -> Rgb {
        if v.is_nan() {
            return rgb::BLACK;
        }
        let v = v.clamp(0.0, 1.0);
        let v = if self.reversed { 1.0 - v } else { v };

        // 第一个位置 >= v 的控制点.
        let hi = self.stops.partition_point(|(p, _)| *p < v);
        if hi == 0 {
            return self.stops[0].1;
        }
        if hi == self.stops.len() {
            return self.stops[hi - 1].1;
        }
        let (p0, c0) = self.stops[hi - 1];
        let (p1, c1) = self.stops[hi];
        let t = (v - p0) / (p1 - p0);
        [0, 1, 2].map(|i| c0[i] + (c1[i] - c0[i]) * t)
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::gray()
    }
}

impl FromStr for ColorMap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.trim())
    }
}

impl fmt::Display for ColorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// 用色表为标量切片着色.
///
/// `clim` 为显示范围, 按 [`Norm::from_clim`] 选择归一化方式; 为 `None` 时使用切片自身的
/// 最小/最大值. NaN 像素为黑色.
pub fn colorize(slice: &ScalarSlice, cmap: &ColorMap, clim: Option<(f32, f32)>) -> RgbSlice {
    let norm = Norm::from_clim(clim).resolve(slice);
    RgbSlice::from_fn(slice.shape(), |pos| cmap.eval(norm.apply(slice[pos])))
}
