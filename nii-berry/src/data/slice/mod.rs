//! 2D 切片对象的操作.

mod core;
mod save;

pub use core::{MaskSlice, RgbSlice, ScalarSlice};

pub use save::{ImgWriteRaw, ImgWriteVis};
