//! 拼图: 把多张切片按网格排列成一张静态图.

use crate::consts::{rgb, Rgb};
use crate::slicer::{Orient, Slicer};
use crate::{Error, Point3, Result, RgbSlice};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// 切片缩放到显示尺寸时使用的插值滤波器.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Filter {
    /// 最近邻.
    Nearest,
    /// 双线性.
    Linear,
    /// 双三次 (Catmull-Rom).
    Cubic,
    /// 高斯.
    Gaussian,
    /// Lanczos (窗口 3).
    #[default]
    Lanczos,
}

impl From<Filter> for FilterType {
    fn from(f: Filter) -> Self {
        match f {
            Filter::Nearest => FilterType::Nearest,
            Filter::Linear => FilterType::Triangle,
            Filter::Cubic => FilterType::CatmullRom,
            Filter::Gaussian => FilterType::Gaussian,
            Filter::Lanczos => FilterType::Lanczos3,
        }
    }
}

impl FromStr for Filter {
    type Err = Error;

    /// 也接受常见的同义名, 窗函数类 (`hanning`, `hamming`, `sinc`) 统一视为 Lanczos.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "nearest" => Ok(Self::Nearest),
            "linear" | "bilinear" | "triangle" => Ok(Self::Linear),
            "cubic" | "bicubic" | "catmullrom" => Ok(Self::Cubic),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos" | "hanning" | "hamming" | "sinc" => Ok(Self::Lanczos),
            other => Err(Error::InvalidArgument(format!("unknown display filter `{other}`"))),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::Cubic => "cubic",
            Self::Gaussian => "gaussian",
            Self::Lanczos => "lanczos",
        })
    }
}

/// 色条在拼图中的位置.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BarPos {
    /// 底部, 水平放置.
    #[default]
    Bottom,
    /// 右侧, 竖直放置.
    Right,
}

impl FromStr for BarPos {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bottom" => Ok(Self::Bottom),
            "right" => Ok(Self::Right),
            other => Err(Error::InvalidArgument(format!("unknown bar position `{other}`"))),
        }
    }
}

impl BarPos {
    /// 该位置对应的色条方向.
    #[inline]
    pub fn bar_orient(&self) -> super::BarOrient {
        match self {
            Self::Bottom => super::BarOrient::Horizontal,
            Self::Right => super::BarOrient::Vertical,
        }
    }
}

/// 拼图布局参数.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FigureOptions {
    /// 行数.
    pub rows: usize,
    /// 列数.
    pub cols: usize,
    /// 为 `true` 时先填满一列再换列, 否则先填满一行.
    pub transpose: bool,
    /// 每个格子的边长 (像素). 切片长边缩放到该尺寸.
    pub tile_size: u32,
    /// 缩放滤波器.
    pub filter: Filter,
    /// 色条位置.
    pub bar_pos: BarPos,
    /// 画布底色.
    pub background: Rgb,
    /// 十字准线颜色.
    pub crosshair_color: Rgb,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            rows: 4,
            cols: 5,
            transpose: false,
            tile_size: 256,
            filter: Filter::Lanczos,
            bar_pos: BarPos::Bottom,
            background: rgb::BLACK,
            crosshair_color: rgb::GREEN,
        }
    }
}

/// 拼图中的一格: 一张合成好的切片.
#[derive(Clone, Debug)]
pub struct Tile {
    image: RgbSlice,
    orient: Orient,
    crosshair: Option<(f64, f64)>,
}

impl Tile {
    /// 以朝向 `orient` 显示 `image`.
    pub fn new(image: RgbSlice, orient: Orient) -> Self {
        Self {
            image,
            orient,
            crosshair: None,
        }
    }

    /// 在世界坐标 `point` 处添加十字准线. `slicer` 必须是生成该切片的那个.
    pub fn with_crosshair(mut self, point: Point3, slicer: &Slicer) -> Self {
        self.crosshair = Some(slicer.project(point));
        self
    }

    /// 缩放到长边为 `size` 像素的 8-bit 图像, 并绘制十字准线.
    pub fn render(&self, size: u32, filter: Filter, crosshair_color: Rgb) -> RgbImage {
        let flip = self.orient.flips_rows();
        let img = self.image.to_rgb8(flip);
        let (w, h) = img.dimensions();
        let scale = size as f64 / w.max(h) as f64;
        let tw = ((w as f64 * scale).round() as u32).max(1);
        let th = ((h as f64 * scale).round() as u32).max(1);
        let mut out = imageops::resize(&img, tw, th, filter.into());

        if let Some((row, col)) = self.crosshair {
            let color = image::Rgb(crosshair_color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8));
            let y_img = if flip { h as f64 - 1.0 - row } else { row };
            let px = ((col + 0.5) / w as f64 * tw as f64).floor();
            let py = ((y_img + 0.5) / h as f64 * th as f64).floor();
            if (0.0..tw as f64).contains(&px) {
                for y in 0..th {
                    out.put_pixel(px as u32, y, color);
                }
            }
            if (0.0..th as f64).contains(&py) {
                for x in 0..tw {
                    out.put_pixel(x, py as u32, color);
                }
            }
        }
        out
    }
}

/// 网格拼图, 可附带一个色条.
#[derive(Clone, Debug)]
pub struct Figure {
    opts: FigureOptions,
    tiles: Vec<Tile>,
    bar: Option<RgbSlice>,
}

impl Figure {
    /// 创建空拼图. 行数、列数或格子尺寸为 0 时返回 `Err`.
    pub fn new(opts: FigureOptions) -> Result<Self> {
        if opts.rows == 0 || opts.cols == 0 || opts.tile_size == 0 {
            return Err(Error::InvalidArgument(format!(
                "figure needs positive rows, cols and tile size, got {}x{} @ {}",
                opts.rows, opts.cols, opts.tile_size
            )));
        }
        Ok(Self {
            opts,
            tiles: Vec::new(),
            bar: None,
        })
    }

    /// 布局参数.
    #[inline]
    pub fn options(&self) -> &FigureOptions {
        &self.opts
    }

    /// 可容纳的格子数.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.opts.rows * self.opts.cols
    }

    /// 已放入的格子数.
    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// 是否还没有放入任何格子?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// 第 `idx` 个格子所在的 (行, 列).
    pub fn cell_of(&self, idx: usize) -> (usize, usize) {
        if self.opts.transpose {
            (idx % self.opts.rows, idx / self.opts.rows)
        } else {
            (idx / self.opts.cols, idx % self.opts.cols)
        }
    }

    /// 放入下一个格子. 已满时返回 `Err`.
    pub fn push(&mut self, tile: Tile) -> Result<()> {
        if self.tiles.len() >= self.capacity() {
            return Err(Error::InvalidArgument(format!(
                "figure is full ({} tiles)",
                self.capacity()
            )));
        }
        self.tiles.push(tile);
        Ok(())
    }

    /// 设置色条. 色条第 0 行对应数值下限, 绘制时位于底部 (竖直) 或由透明度 0 起 (双轴).
    pub fn set_bar(&mut self, bar: RgbSlice) {
        self.bar = Some(bar);
    }

    /// 色条区域的厚度 (含上下留白), 没有色条时为 0.
    fn bar_band(&self) -> u32 {
        if self.bar.is_some() {
            (self.opts.tile_size / 4).max(4) * 2
        } else {
            0
        }
    }

    /// 画布尺寸 (宽, 高).
    pub fn dimensions(&self) -> (u32, u32) {
        let size = self.opts.tile_size;
        let w = size * self.opts.cols as u32;
        let h = size * self.opts.rows as u32;
        match self.opts.bar_pos {
            BarPos::Bottom => (w, h + self.bar_band()),
            BarPos::Right => (w + self.bar_band(), h),
        }
    }

    /// 渲染整张拼图.
    pub fn render(&self) -> RgbImage {
        let (width, height) = self.dimensions();
        let back = self.opts.background.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        let mut canvas = RgbImage::from_pixel(width, height, image::Rgb(back));
        let size = self.opts.tile_size;

        for (idx, tile) in self.tiles.iter().enumerate() {
            let (row, col) = self.cell_of(idx);
            let img = tile.render(size, self.opts.filter, self.opts.crosshair_color);
            let x = col as u32 * size + (size - img.width()) / 2;
            let y = row as u32 * size + (size - img.height()) / 2;
            imageops::replace(&mut canvas, &img, x as i64, y as i64);
        }

        if let Some(bar) = &self.bar {
            let band = self.bar_band();
            let thick = band / 2;
            let grid_w = size * self.opts.cols as u32;
            let grid_h = size * self.opts.rows as u32;
            let img = bar.to_rgb8(true);
            let (bw, bh, x, y) = match self.opts.bar_pos {
                BarPos::Bottom => {
                    let len = (grid_w as f64 * 0.84).round().max(1.0) as u32;
                    (len, thick, (grid_w - len) / 2, grid_h + thick / 2)
                }
                BarPos::Right => {
                    let len = (grid_h as f64 * 0.84).round().max(1.0) as u32;
                    (thick, len, grid_w + thick / 2, (grid_h - len) / 2)
                }
            };
            let img = imageops::resize(&img, bw, bh, self.opts.filter.into());
            imageops::replace(&mut canvas, &img, x as i64, y as i64);
        }
        canvas
    }

    /// 渲染并保存为图片, 格式由扩展名决定 (通常为 PNG).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let img = self.render();
        log::info!(
            "Writing {} ({}x{}, {} tiles)",
            path.display(),
            img.width(),
            img.height(),
            self.tiles.len()
        );
        img.save(path)?;
        Ok(())
    }
}
