use std::path::Path;

use ndarray::{Array3, Array4, ArrayD, ArrayView3, ArrayView4, Axis, Ix4};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::{Error, Idx3d, Point3, Result};

pub mod affine;
pub mod bbox;
pub mod slice;
pub mod window;

use affine::Affine;

pub use bbox::BBox;
pub use slice::{ImgWriteRaw, ImgWriteVis, MaskSlice, RgbSlice, ScalarSlice};
pub use window::Window;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// nii 格式 3D/4D 神经影像, 包括 header、体素值与仿射变换. 体素值以 `f32` 保存.
///
/// 数据按 `[x, y, z, t]` 组织, 3D 图像的 `t` 维长度为 1.
/// 非有限值 (NaN, inf) 在构造时已被替换为 0.
#[derive(Debug, Clone)]
pub struct NiiVolume {
    header: BoxedHeader,
    affine: Affine,
    inverse: Affine,
    data: Array4<f32>,
}

/// nii 文件 header 的共用属性和部分通用操作.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取 header 中记录的空间形状 (x, y, z).
    #[inline]
    fn header_shape(&self) -> Idx3d {
        let [_, x, y, z, ..] = self.header().dim;
        (x as usize, y as usize, z as usize)
    }

    /// 获取单个体素分辨率 (x, y, z), 以毫米为单位.
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, x, y, z, ..] = self.header().pixdim;
        [x as f64, y as f64, z as f64]
    }

    /// 体素分辨率在三个维度上是否是各向同的?
    #[inline]
    fn is_isotropic(&self) -> bool {
        let [x, y, z] = self.pix_dim();
        x == y && x == z
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.pix_dim().iter().map(|v| v.abs()).product()
    }
}

impl NiftiHeaderAttr for NiiVolume {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

/// 3D 数据补上长度为 1 的 `t` 维, 4D 数据原样返回.
fn into_array4(data: ArrayD<f32>) -> Result<Array4<f32>> {
    let ndim = data.ndim();
    let data = match ndim {
        3 => data.insert_axis(Axis(3)),
        4 => data,
        _ => return Err(Error::UnsupportedDims(ndim)),
    };
    data.into_dimensionality::<Ix4>()
        .map_err(|_| Error::UnsupportedDims(ndim))
}

impl NiiVolume {
    /// 打开 nii / nii.gz 格式的 3D 或 4D 图像. `path` 为文件的本地路径.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let obj = ReaderOptions::new().read_file(path)?;
        let header = Box::new(obj.header().clone());
        let data = into_array4(obj.into_volume().into_ndarray::<f32>()?)?;
        let affine = affine::from_header(&header);

        let ans = Self::assemble(header, affine, data)?;
        log::debug!(
            "Loaded {}: shape {:?}, {} volume(s)",
            path.display(),
            ans.shape(),
            ans.n_volumes()
        );
        Ok(ans)
    }

    /// 根据 3D 数据 (按 `[x, y, z]` 组织) 和仿射矩阵直接创建图像.
    #[inline]
    pub fn from_array(data: Array3<f32>, affine: Affine) -> Result<Self> {
        Self::from_array4(data.insert_axis(Axis(3)), affine)
    }

    /// 根据 4D 数据 (按 `[x, y, z, t]` 组织) 和仿射矩阵直接创建图像.
    ///
    /// header 由 `affine` 与数据形状合成, 并以 `intent_name = "fake"` 标记.
    pub fn from_array4(data: Array4<f32>, affine: Affine) -> Result<Self> {
        let mut header = Box::<NiftiHeader>::default();
        let (x, y, z, t) = data.dim();
        let mut dim = [1u16; 8];
        dim[0] = if t > 1 { 4 } else { 3 };
        for (slot, len) in dim[1..5].iter_mut().zip([x, y, z, t]) {
            *slot = u16::try_from(len)
                .map_err(|_| Error::InvalidArgument(format!("axis length {len} too large")))?;
        }
        header.dim = dim;

        let [sx, sy, sz] = affine::voxel_sizes(&affine);
        header.pixdim = [1.0, sx as f32, sy as f32, sz as f32, 1.0, 1.0, 1.0, 1.0];
        header.sform_code = 2;
        let row = |r: usize| [0, 1, 2, 3].map(|c| affine[(r, c)] as f32);
        (header.srow_x, header.srow_y, header.srow_z) = (row(0), row(1), row(2));
        header.intent_name[..4].copy_from_slice(b"fake");

        Self::assemble(header, affine, data)
    }

    fn assemble(header: BoxedHeader, affine: Affine, mut data: Array4<f32>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::EmptyData);
        }
        data.mapv_inplace(|v| if v.is_finite() { v } else { 0.0 });
        let inverse = affine::invert(&affine)?;
        Ok(Self {
            header,
            affine,
            inverse,
            data,
        })
    }

    /// 判断该结构是否是由 `from_array*` 方法手动拼接的.
    pub fn is_faked(&self) -> bool {
        self.header.intent_name.starts_with(b"fake")
    }

    /// 空间形状 (x, y, z).
    #[inline]
    pub fn shape(&self) -> Idx3d {
        let (x, y, z, _) = self.data.dim();
        (x, y, z)
    }

    /// 空间形状, 以数组形式给出.
    #[inline]
    pub fn shape_array(&self) -> [usize; 3] {
        let (x, y, z) = self.shape();
        [x, y, z]
    }

    /// 时间序列中的体积个数. 3D 图像返回 1.
    #[inline]
    pub fn n_volumes(&self) -> usize {
        self.data.dim().3
    }

    /// 获取第 `t` 个体积的 3D 视图. 越界时返回 `Err`.
    pub fn volume(&self, t: usize) -> Result<ArrayView3<'_, f32>> {
        if t >= self.n_volumes() {
            return Err(Error::VolumeOutOfRange(t, self.n_volumes()));
        }
        Ok(self.data.index_axis(Axis(3), t))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// 获取体素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, (x, y, z): Idx3d, t: usize) -> Option<f32> {
        self.data.get((x, y, z, t)).copied()
    }

    /// 体素到世界坐标的仿射矩阵.
    #[inline]
    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    /// 世界到体素坐标的仿射矩阵.
    #[inline]
    pub fn inverse_affine(&self) -> &Affine {
        &self.inverse
    }

    /// 体素坐标 (可为小数) 到世界坐标.
    #[inline]
    pub fn voxel_to_world(&self, voxel: Point3) -> Point3 {
        affine::transform_point(&self.affine, voxel)
    }

    /// 世界坐标到体素坐标 (可为小数).
    #[inline]
    pub fn world_to_voxel(&self, world: Point3) -> Point3 {
        affine::transform_point(&self.inverse, world)
    }

    /// 沿每个空间轴, 求含有非零体素 (任一时间点) 的第一个与最后一个索引.
    /// 全零时返回 `None`.
    pub fn nonzero_extent(&self) -> Option<[(usize, usize); 3]> {
        let mut lo = [usize::MAX; 3];
        let mut hi = [0usize; 3];
        for ((x, y, z, _), _) in self.data.indexed_iter().filter(|(_, v)| **v != 0.0) {
            for (i, p) in [x, y, z].into_iter().enumerate() {
                lo[i] = lo[i].min(p);
                hi[i] = hi[i].max(p);
            }
        }
        (lo[0] != usize::MAX).then(|| [(lo[0], hi[0]), (lo[1], hi[1]), (lo[2], hi[2])])
    }

    /// 收集第 `t` 个体积的体素值. 若给出 `mask`, 则只保留掩膜 (第 0 个体积) 非零处的体素.
    ///
    /// `mask` 与 `self` 空间形状不一致时返回 `Err`.
    pub fn masked_values(&self, t: usize, mask: Option<&NiiVolume>) -> Result<Vec<f32>> {
        let vol = self.volume(t)?;
        let Some(mask) = mask else {
            return Ok(vol.iter().copied().collect());
        };
        if mask.shape() != self.shape() {
            return Err(Error::VolumeShapeMismatch(self.shape(), mask.shape()));
        }
        let m = mask.volume(0)?;
        Ok(vol
            .iter()
            .zip(m.iter())
            .filter_map(|(v, m)| (*m != 0.0).then_some(*v))
            .collect())
    }

    /// 沿每个空间轴对体素值求边缘和, 取最大者所在索引, 并转换为世界坐标.
    ///
    /// 该位置是图像 "质量最集中" 切面的交点, 常用作三视图的默认中心.
    pub fn center_of_mass(&self) -> Point3 {
        let vol = self.data.index_axis(Axis(3), 0);
        let argmax = |axis: usize| -> f64 {
            let mut sums = vec![0.0f64; vol.len_of(Axis(axis))];
            for (idx, v) in vol.indexed_iter() {
                let i = [idx.0, idx.1, idx.2][axis];
                sums[i] += *v as f64;
            }
            let mut best = 0;
            for (i, s) in sums.iter().enumerate() {
                if *s > sums[best] {
                    best = i;
                }
            }
            best as f64
        };
        self.voxel_to_world([argmax(0), argmax(1), argmax(2)])
    }
}
