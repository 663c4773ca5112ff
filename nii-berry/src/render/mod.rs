//! 渲染: 色条、拼图与 GIF 动图.
//!
//! 只生成像素, 不绘制文字. 标签与标题仅写入日志.

mod colorbar;
mod figure;
mod movie;

pub use colorbar::{alphabar, colorbar, tick_labels, BarOrient};
pub use figure::{BarPos, Figure, FigureOptions, Filter, Tile};
pub use movie::Movie;
