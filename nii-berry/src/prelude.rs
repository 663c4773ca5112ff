//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Error, Idx2d, Idx3d, Point3, Result};

pub use crate::data::{
    BBox, ImgWriteRaw, ImgWriteVis, MaskSlice, NiftiHeaderAttr, NiiVolume, RgbSlice,
    ScalarSlice, Window,
};

pub use crate::color::{colorize, ColorMap, Norm};
pub use crate::compose::{blend_layers, Alpha, Backdrop, Layer, LayerOptions};
pub use crate::consts::{rgb, Rgb};
pub use crate::render::{BarOrient, BarPos, Figure, FigureOptions, Filter, Movie, Tile};
pub use crate::slicer::{Axis, Interp, Orient, Slicer};
