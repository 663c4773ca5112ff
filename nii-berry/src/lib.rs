#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 读取 NIfTI 格式的 3D/4D 神经影像, 沿任意解剖平面重采样得到 2D 切片,
//! 将结构像底图与统计图叠加层按常规或 "双编码" (dual-coding, 颜色 + 透明度)
//! 方式合成为 RGB 图像, 并渲染为静态拼图或动图.
//!
//! # 注意
//!
//! 1. 体数据统一以 `[x, y, z, t]` 体素索引访问, 3D 文件的 `t` 维长度为 1.
//! 2. 切片的行方向为 "上", 列方向为 "右", 第 0 行位于世界坐标起点一侧.
//!   写出图片时才根据 [`Orient`] 决定是否上下翻转.
//!
//! # 开发计划
//!
//! ### 仿射变换与包围盒 ✅
//!
//! sform 优先, 其次 qform, 最后退化为 pixdim 对角缩放.
//!
//! 实现位于 `nii-berry/src/data/{affine, bbox}.rs`.
//!
//! ### 任意平面切片重采样 ✅
//!
//! 最近邻与三线性插值, 越界体素取 0. 体素坐标网格按仿射矩阵缓存.
//!
//! 实现位于 `nii-berry/src/slicer`.
//!
//! ### 颜色映射与归一化 ✅
//!
//! 分段线性色表, 支持 `_r` 反转与负值双斜率归一化.
//!
//! 实现位于 `nii-berry/src/color`.
//!
//! ### 图层合成 (dual-coding) 与等值线 ✅
//!
//! 实现位于 `nii-berry/src/compose`.
//!
//! ### 拼图、色条与 GIF 动图 ✅
//!
//! 实现位于 `nii-berry/src/render`.

/// 二维索引 (行, 列).
pub type Idx2d = (usize, usize);

/// 三维体素索引 (x, y, z).
pub type Idx3d = (usize, usize, usize);

/// 世界坐标系下的三维点/向量, 单位通常为毫米.
pub type Point3 = [f64; 3];

mod error;

pub use error::{Error, Result};

/// NIfTI 体数据、仿射变换、包围盒与切片对象.
mod data;

pub use data::{
    BBox, ImgWriteRaw, ImgWriteVis, MaskSlice, NiftiHeaderAttr, NiiVolume, RgbSlice,
    ScalarSlice, Window,
};

pub use data::affine;

pub mod color;
pub mod compose;
pub mod consts;
pub mod prelude;
pub mod render;
pub mod slicer;
pub mod stats;

pub use color::ColorMap;
pub use compose::{blend_layers, Layer};
pub use slicer::{Axis, Interp, Orient, Slicer};
