//! 图像的持久化存储.

use crate::slicer::Orient;
use crate::{MaskSlice, Result, RgbSlice, ScalarSlice, Window};
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// `ImgWriteVis` trait 的意图是, 图像将以 "可视化友好" 的方式保存, 而不是 "as is" 的方式.
/// 这意味着, 对于 `MaskSlice` 会映射为黑白图像; 对于 `ScalarSlice` 会以其自身的
/// 最小/最大值规范化为灰度; `RgbSlice` 则直接量化为 8-bit.
///
/// 行方向由 `orient` 决定: 临床约定下第 0 行 (世界坐标起点) 位于图像底部.
pub trait ImgWriteVis {
    /// 转为 8-bit RGB 图像.
    fn to_image(&self, orient: Orient) -> image::RgbImage;

    /// 按照一定的可视化规则将图片保存到 `path` 路径. 格式由扩展名决定.
    fn save<P: AsRef<Path>>(&self, path: P, orient: Orient) -> Result<()> {
        self.to_image(orient).save(path)?;
        Ok(())
    }
}

/// 表明一个可以通过 **按原样** 模式持久化存储的图像对象.
///
/// 单通道切片按原样量化为 8-bit 灰度: `ScalarSlice` 假定像素已位于 `[0, 1]`,
/// `MaskSlice` 存为 0/1. 行顺序不翻转.
pub trait ImgWriteRaw {
    /// 转为 8-bit 灰度图像.
    fn to_gray(&self) -> image::GrayImage;

    /// 按原样将图片保存到 `path` 路径.
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_gray().save(path)?;
        Ok(())
    }
}

impl ImgWriteVis for RgbSlice {
    fn to_image(&self, orient: Orient) -> image::RgbImage {
        self.to_rgb8(orient.flips_rows())
    }
}

/// 以自身有限值的最小/最大值为窗口.
impl ImgWriteVis for ScalarSlice {
    fn to_image(&self, orient: Orient) -> image::RgbImage {
        let window = self
            .min_max()
            .map(Window::from)
            .unwrap_or_else(Window::unit);
        gray_to_rgb(self, window, orient.flips_rows())
    }
}

/// 前景为白色, 背景为黑色.
impl ImgWriteVis for MaskSlice {
    fn to_image(&self, orient: Orient) -> image::RgbImage {
        gray_to_rgb(&self.to_scalar(), Window::unit(), orient.flips_rows())
    }
}

impl ImgWriteRaw for ScalarSlice {
    fn to_gray(&self) -> image::GrayImage {
        let (height, width) = self.shape();
        let window = Window::unit();
        image::GrayImage::from_fn(width as u32, height as u32, |w, h| {
            let v = self[(h as usize, w as usize)];
            image::Luma([window.eval(v).unwrap_or(0)])
        })
    }
}

impl ImgWriteRaw for MaskSlice {
    fn to_gray(&self) -> image::GrayImage {
        let (height, width) = self.shape();
        image::GrayImage::from_fn(width as u32, height as u32, |w, h| {
            image::Luma([self[(h as usize, w as usize)] as u8])
        })
    }
}

fn gray_to_rgb(slice: &ScalarSlice, window: Window, flip: bool) -> image::RgbImage {
    let (height, width) = slice.shape();
    let mut buf = image::RgbImage::new(width as u32, height as u32);
    for ((h, w), &v) in slice.data().indexed_iter() {
        let y = if flip { height - 1 - h } else { h };
        let g = window.eval(v).unwrap_or(0);
        buf.put_pixel(w as u32, y as u32, image::Rgb([g, g, g]));
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scalar_vis_auto_window() {
        let s = ScalarSlice::new(array![[10.0, 20.0], [30.0, 30.0]]);
        let img = s.to_image(Orient::Preclinical);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(0, 1).0, [255, 255, 255]);

        // 临床约定下第 0 行写到底部.
        let img = s.to_image(Orient::Clinical);
        assert_eq!(img.get_pixel(0, 1).0, [0, 0, 0]);
    }

    #[test]
    fn test_mask_raw() {
        let m = MaskSlice::new(array![[true, false, true]]);
        let img = m.to_gray();
        assert_eq!(img.dimensions(), (3, 1));
        assert_eq!(img.get_pixel(0, 0).0, [1]);
        assert_eq!(img.get_pixel(1, 0).0, [0]);
        assert_eq!(m.to_image(Orient::Clinical).get_pixel(2, 0).0, [255; 3]);
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.png");
        let s = RgbSlice::filled((4, 6), [1.0, 0.0, 0.0]);
        s.save(&path, Orient::Clinical).unwrap();
        let back = image::open(&path).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (6, 4));
        assert_eq!(back.get_pixel(5, 3).0, [255, 0, 0]);

        let raw = dir.path().join("alpha.png");
        ScalarSlice::filled((2, 2), 1.0).save_raw(&raw).unwrap();
        assert_eq!(image::open(&raw).unwrap().to_luma8().get_pixel(1, 1).0, [255]);
    }
}
