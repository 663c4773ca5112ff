//! 世界坐标系下的轴对齐包围盒.

use crate::stats::linspace;
use crate::{Error, NiiVolume, Point3, Result};
use std::fmt;

/// 轴对齐包围盒. 保证 `start <= end` (逐分量).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BBox {
    start: Point3,
    end: Point3,
}

impl BBox {
    /// 由两个对角点构造. 两点顺序任意, 内部会逐分量取 min/max.
    pub fn from_corners(a: Point3, b: Point3) -> Self {
        let mut start = [0.0; 3];
        let mut end = [0.0; 3];
        for i in 0..3 {
            start[i] = a[i].min(b[i]);
            end[i] = a[i].max(b[i]);
        }
        Self { start, end }
    }

    /// 由中心与各轴尺寸构造.
    pub fn from_center_size(center: Point3, size: Point3) -> Self {
        let a = [0, 1, 2].map(|i| center[i] - size[i] / 2.0);
        let b = [0, 1, 2].map(|i| center[i] + size[i] / 2.0);
        Self::from_corners(a, b)
    }

    /// 覆盖整个图像的包围盒: 体素角点 `(0, 0, 0)` 与 `shape` 经仿射变换后的 min/max.
    pub fn from_volume(vol: &NiiVolume) -> Self {
        let [x, y, z] = vol.shape_array().map(|v| v as f64);
        Self::from_corners(
            vol.voxel_to_world([0.0, 0.0, 0.0]),
            vol.voxel_to_world([x, y, z]),
        )
    }

    /// 包含掩膜所有非零体素的包围盒, 各方向额外扩展 `padding` (世界坐标单位).
    ///
    /// 掩膜全零时返回 `Err`.
    pub fn from_mask(mask: &NiiVolume, padding: f64) -> Result<Self> {
        let [(x0, x1), (y0, y1), (z0, z1)] = mask.nonzero_extent().ok_or(Error::EmptyMask)?;
        let a = mask.voxel_to_world([x0 as f64, y0 as f64, z0 as f64]);
        let b = mask.voxel_to_world([x1 as f64, y1 as f64, z1 as f64]);
        let Self { start, end } = Self::from_corners(a, b);
        Ok(Self {
            start: start.map(|v| v - padding),
            end: end.map(|v| v + padding),
        })
    }

    /// 起点角.
    #[inline]
    pub fn start(&self) -> Point3 {
        self.start
    }

    /// 终点角 (与起点相对).
    #[inline]
    pub fn end(&self) -> Point3 {
        self.end
    }

    /// 对角向量 `end - start`.
    #[inline]
    pub fn diag(&self) -> Point3 {
        [0, 1, 2].map(|i| self.end[i] - self.start[i])
    }

    /// 几何中心.
    #[inline]
    pub fn center(&self) -> Point3 {
        [0, 1, 2].map(|i| (self.start[i] + self.end[i]) / 2.0)
    }

    /// 判断世界坐标点是否在包围盒内 (含边界).
    #[inline]
    pub fn contains(&self, p: Point3) -> bool {
        (0..3).all(|i| self.start[i] <= p[i] && p[i] <= self.end[i])
    }

    /// 沿对角线在 `[lo, hi]` (比例) 之间均匀取 `n` 个点: `start + diag * t`.
    pub fn slice_positions(&self, n: usize, lo: f64, hi: f64) -> Vec<Point3> {
        let diag = self.diag();
        linspace(lo, hi, n)
            .map(|t| [0, 1, 2].map(|i| self.start[i] + diag[i] * t))
            .collect()
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Box Start: {:?} End: {:?}", self.start, self.end)
    }
}
