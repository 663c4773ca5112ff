//! 图层合成.
//!
//! 底图与叠加层按常规方式 (不透明覆盖) 或 "双编码" 方式
//! (颜色表示效应大小, 透明度表示统计显著性) 合成为一张 RGB 切片.

pub mod contour;
mod func;
mod layer;

pub use func::{blend, blur, blur_rgb, checkerboard, mask, scale_clip, Background};
pub use layer::{blend_layers, Alpha, Backdrop, Layer, LayerBuilder, LayerOptions};
