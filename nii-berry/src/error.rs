//! 运行时错误.

use crate::{Idx2d, Idx3d};

/// 本 crate 所有可失败操作的错误类型.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 读取 NIfTI 文件错误.
    #[error("nifti error: {0}")]
    Nifti(#[from] nifti::error::NiftiError),

    /// 编码或写出图片错误.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// 其他底层 I/O 错误.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 体数据维度不受支持. 仅支持 3D 与 4D.
    #[error("unsupported number of dimensions: {0} (expected 3 or 4)")]
    UnsupportedDims(usize),

    /// 时间序列索引越界. 参数依次为请求的索引和总体积数.
    #[error("volume {0} out of range, image has {1} volume(s)")]
    VolumeOutOfRange(usize, usize),

    /// 仿射矩阵不可逆.
    #[error("affine transform is singular")]
    SingularAffine,

    /// 掩膜中没有非零体素, 无法求包围盒.
    #[error("mask contains no non-zero voxels")]
    EmptyMask,

    /// 没有可用于统计的数据.
    #[error("no data to compute statistics from")]
    EmptyData,

    /// 未知颜色映射名.
    #[error("unknown colormap `{0}`")]
    UnknownColorMap(String),

    /// 不支持的插值阶数. 仅支持 0 (最近邻) 与 1 (线性).
    #[error("unsupported interpolation order {0}, expected 0 or 1")]
    InterpOrder(u32),

    /// 两幅图像形状不一致. 参数依次为两者的 (高, 宽).
    #[error("image shapes do not match: {0:?} vs {1:?}")]
    ShapeMismatch(Idx2d, Idx2d),

    /// 两个体数据的空间形状不一致. 参数依次为两者的 (x, y, z).
    #[error("volume shapes do not match: {0:?} vs {1:?}")]
    VolumeShapeMismatch(Idx3d, Idx3d),

    /// 其他非法参数.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// 本 crate 的 `Result` 别名.
pub type Result<T> = std::result::Result<T, Error>;
