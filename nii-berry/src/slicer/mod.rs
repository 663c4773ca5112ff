//! 沿解剖平面对体数据重采样.
//!
//! [`Slicer`] 在世界坐标系中铺设一张规则的采样网格, 再借助图像仿射矩阵的逆
//! 把网格映射到体素坐标, 逐点插值得到 [`ScalarSlice`].

mod interp;

pub use interp::Interp;

use crate::affine::{self, Affine};
use crate::stats::linspace;
use crate::{BBox, Error, Idx2d, NiiVolume, Point3, Result, ScalarSlice};
use itertools::iproduct;
use ndarray::Array2;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use ndarray::Axis as NdAxis;
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 切片的法向轴.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// 矢状面 (sagittal).
    X,
    /// 冠状面 (coronal).
    Y,
    /// 横断面 (axial).
    Z,
}

impl Axis {
    /// 全部三个轴, 按 x, y, z 顺序.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// 轴在 `[x, y, z]` 中的下标.
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" | "0" => Ok(Axis::X),
            "y" | "1" => Ok(Axis::Y),
            "z" | "2" => Ok(Axis::Z),
            other => Err(Error::InvalidArgument(format!("unknown axis `{other}`"))),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(["x", "y", "z"][self.index()])
    }
}

/// 显示朝向约定.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orient {
    /// 临床约定, 切片第 0 行显示在底部.
    #[default]
    Clinical,
    /// 临床前 (动物) 约定, 切片第 0 行显示在顶部.
    Preclinical,
}

impl Orient {
    /// 给定法向轴, 返回切片 (右, 上) 方向对应的世界坐标轴下标.
    pub fn axis_indices(&self, axis: Axis) -> Idx2d {
        match (self, axis) {
            (Orient::Clinical, Axis::X) => (1, 2),
            (Orient::Clinical, Axis::Y) => (0, 2),
            (Orient::Clinical, Axis::Z) => (0, 1),
            (Orient::Preclinical, Axis::X) => (2, 1),
            (Orient::Preclinical, Axis::Y) => (2, 0),
            (Orient::Preclinical, Axis::Z) => (0, 1),
        }
    }

    /// 写出图片时是否需要上下翻转?
    #[inline]
    pub fn flips_rows(&self) -> bool {
        matches!(self, Orient::Clinical)
    }
}

impl FromStr for Orient {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clin" | "clinical" => Ok(Orient::Clinical),
            "preclin" | "preclinical" => Ok(Orient::Preclinical),
            other => Err(Error::InvalidArgument(format!("unknown orientation `{other}`"))),
        }
    }
}

impl fmt::Display for Orient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orient::Clinical => "clin",
            Orient::Preclinical => "preclin",
        })
    }
}

/// 体素坐标缓存: 生成它的仿射矩阵 (世界 → 体素) 与坐标网格.
type VoxelCache = Option<(Affine, Arc<Vec<Point3>>)>;

/// 穿过包围盒的一个平面采样网格.
///
/// 网格有 `rows * cols` 个点, 按行优先存储. 行沿 "上" 方向, 列沿 "右" 方向.
#[derive(Debug)]
pub struct Slicer {
    axis: Axis,
    orient: Orient,
    pos: f64,
    dims: Idx2d,
    extent: (f64, f64, f64, f64),
    world: Vec<Point3>,
    cache: Mutex<VoxelCache>,
}

impl Slicer {
    /// 在 `bbox` 内构建垂直于 `axis`、位于世界坐标 `pos` 处的切片.
    ///
    /// 水平方向有 `samples` 个采样点, 竖直方向按包围盒宽高比取
    /// `max(1, round(samples * |up| / |right|))` 个.
    ///
    /// `samples == 0` 或包围盒在 "右" 方向上退化时返回 `Err`.
    pub fn new(bbox: &BBox, pos: f64, axis: Axis, samples: usize, orient: Orient) -> Result<Self> {
        if samples == 0 {
            return Err(Error::InvalidArgument("samples must be positive".into()));
        }
        let (rt, up) = orient.axis_indices(axis);
        let diag = bbox.diag();
        if diag[rt] <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "bounding box has zero extent along axis {rt}"
            )));
        }
        let aspect = diag[up].abs() / diag[rt].abs();
        let rows = ((samples as f64 * aspect).round() as usize).max(1);
        let cols = samples;

        let mut start = bbox.start();
        start[axis.index()] = pos;

        let us: Vec<f64> = linspace(0.0, 1.0, cols).collect();
        let world: Vec<Point3> = iproduct!(linspace(0.0, 1.0, rows), us)
            .map(|(v, u)| {
                let mut p = start;
                p[rt] += diag[rt] * u;
                p[up] += diag[up] * v;
                p
            })
            .collect();

        let (s, e) = (bbox.start(), bbox.end());
        Ok(Self {
            axis,
            orient,
            pos,
            dims: (rows, cols),
            extent: (s[rt], e[rt], s[up], e[up]),
            world,
            cache: Mutex::new(None),
        })
    }

    /// 法向轴.
    #[inline]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// 朝向约定.
    #[inline]
    pub fn orient(&self) -> Orient {
        self.orient
    }

    /// 切片沿法向轴的世界坐标.
    #[inline]
    pub fn pos(&self) -> f64 {
        self.pos
    }

    /// 切片的 (行, 列) 数.
    #[inline]
    pub fn dims(&self) -> Idx2d {
        self.dims
    }

    /// `(右起点, 右终点, 上起点, 上终点)`, 世界坐标.
    #[inline]
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        self.extent
    }

    /// 第 `row` 行第 `col` 列采样点的世界坐标. 越界时返回 `None`.
    #[inline]
    pub fn world_point(&self, (row, col): Idx2d) -> Option<Point3> {
        let (rows, cols) = self.dims;
        (row < rows && col < cols).then(|| self.world[row * cols + col])
    }

    /// 把世界坐标点投影到切片网格上, 返回 (行, 列) 的小数坐标.
    ///
    /// 结果可能落在网格之外. 用于在切片上定位十字准线等标记.
    pub fn project(&self, p: Point3) -> (f64, f64) {
        let (x0, x1, y0, y1) = self.extent;
        let (rows, cols) = self.dims;
        let (rt, up) = self.orient.axis_indices(self.axis);
        let frac = |v: f64, a: f64, b: f64| if b == a { 0.0 } else { (v - a) / (b - a) };
        let row = frac(p[up], y0, y1) * rows.saturating_sub(1) as f64;
        let col = frac(p[rt], x0, x1) * cols.saturating_sub(1) as f64;
        (row, col)
    }

    /// 网格在 `inverse` (世界 → 体素) 下的体素坐标.
    ///
    /// 结果会被缓存; 只有传入不同的矩阵时才重新计算.
    pub fn voxel_coords(&self, inverse: &Affine) -> Arc<Vec<Point3>> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((cached, coords)) = cache.as_ref() {
            if cached == inverse {
                return Arc::clone(coords);
            }
        }
        let coords: Arc<Vec<Point3>> = Arc::new(
            self.world
                .iter()
                .map(|p| affine::transform_point(inverse, *p))
                .collect(),
        );
        log::trace!("Voxel coordinates recomputed for {} points", coords.len());
        *cache = Some((*inverse, Arc::clone(&coords)));
        coords
    }

    /// 对 `vol` 的第 `t` 个体积重采样, 所有值乘以 `scale`.
    ///
    /// 结果形状为 [`Slicer::dims`]. `t` 越界时返回 `Err`.
    pub fn sample(&self, vol: &NiiVolume, interp: Interp, scale: f32, t: usize) -> Result<ScalarSlice> {
        let data = vol.volume(t)?;
        let coords = self.voxel_coords(vol.inverse_affine());
        let (rows, cols) = self.dims;
        let mut out = Array2::<f32>::zeros((rows, cols));

        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                out.axis_iter_mut(NdAxis(0))
                    .into_par_iter()
                    .enumerate()
                    .for_each(|(r, mut row)| {
                        for (c, v) in row.iter_mut().enumerate() {
                            *v = interp.sample(&data, coords[r * cols + c]);
                        }
                    });
            } else {
                for ((r, c), v) in out.indexed_iter_mut() {
                    *v = interp.sample(&data, coords[r * cols + c]);
                }
            }
        }

        Ok(ScalarSlice::new(out).scaled(scale))
    }
}

/// 在世界坐标 `world` 处对 `vol` 的第 `t` 个体积取值.
pub fn sample_point(vol: &NiiVolume, world: Point3, interp: Interp, t: usize) -> Result<f32> {
    let data = vol.volume(t)?;
    Ok(interp.sample(&data, vol.world_to_voxel(world)))
}

/// 体数据 "质量最集中" 的位置, 见 [`NiiVolume::center_of_mass`].
#[inline]
pub fn center_of_mass(vol: &NiiVolume) -> Point3 {
    vol.center_of_mass()
}
