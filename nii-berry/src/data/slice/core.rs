use crate::consts::Rgb;
use crate::{Error, Idx2d, Result, Window};
use ndarray::iter::Iter;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut3, Axis, Ix2, Zip};
use std::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 拥有所有权的二维标量切片.
///
/// 第 0 维为 "上" 方向 (行), 第 1 维为 "右" 方向 (列), 第 0 行位于世界坐标起点一侧.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarSlice {
    data: Array2<f32>,
}

/// 拥有所有权的二维布尔掩膜切片. 行列约定同 [`ScalarSlice`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MaskSlice {
    data: Array2<bool>,
}

/// 拥有所有权的 RGB 切片, 形状为 `(高, 宽, 3)`, 通道值位于 `[0, 1]`.
/// 行列约定同 [`ScalarSlice`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RgbSlice {
    data: Array3<f32>,
}

/// 三种切片共用的形状方法.
macro_rules! impl_slice_shape {
    ($($slice: ty),+) => {
        $(
            impl $slice {
                /// 图像的分辨率 (高, 宽).
                #[inline]
                pub fn shape(&self) -> Idx2d {
                    let sh = self.data.shape();
                    (sh[0], sh[1])
                }

                /// 图像的像素个数.
                #[inline]
                pub fn size(&self) -> usize {
                    let (h, w) = self.shape();
                    h * w
                }

                /// 获得图像的高.
                #[inline]
                pub fn height(&self) -> usize {
                    self.shape().0
                }

                /// 获得图像的宽.
                #[inline]
                pub fn width(&self) -> usize {
                    self.shape().1
                }

                /// 判断一个索引是否合法 (未越界).
                #[inline]
                pub fn check(&self, (h, w): Idx2d) -> bool {
                    let (h_len, w_len) = self.shape();
                    h < h_len && w < w_len
                }

                /// 检查 `other` 与 `self` 形状一致, 否则返回 `Err`.
                #[inline]
                pub(crate) fn ensure_shape(&self, other: Idx2d) -> Result<()> {
                    if self.shape() == other {
                        Ok(())
                    } else {
                        Err(Error::ShapeMismatch(self.shape(), other))
                    }
                }
            }
        )+
    };
}

impl_slice_shape!(ScalarSlice, MaskSlice, RgbSlice);

impl Index<Idx2d> for ScalarSlice {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for ScalarSlice {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl ScalarSlice {
    /// 直接初始化.
    #[inline]
    pub fn new(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// 所有像素都为 `v` 的切片.
    #[inline]
    pub fn filled(shape: Idx2d, v: f32) -> Self {
        Self::new(Array2::from_elem(shape, v))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<f32> {
        self.data
    }

    /// 获取可以迭代图像像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, f32, Ix2> {
        self.data.iter()
    }

    /// 获取给定位置 (行, 列) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<f32> {
        self.data.get(pos).copied()
    }

    /// 有限值的 (最小值, 最大值). 没有有限值时返回 `None`.
    #[inline]
    pub fn min_max(&self) -> Option<(f32, f32)> {
        crate::stats::finite_min_max(self.data.iter().copied())
    }

    /// 对每个像素施加 `f`, 得到新切片.
    #[inline]
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(self.data.mapv(f))
    }

    /// 所有像素乘以 `k`.
    #[inline]
    pub fn scaled(mut self, k: f32) -> Self {
        if k != 1.0 {
            self.data.mapv_inplace(|v| v * k);
        }
        self
    }

    /// 阈值化: 严格大于 `threshold` 的像素为 `true`.
    #[inline]
    pub fn gt(&self, threshold: f32) -> MaskSlice {
        MaskSlice::new(self.data.mapv(|v| v > threshold))
    }

    /// 掩膜为 `false` 处置 0. 形状不一致时返回 `Err`.
    pub fn masked(&self, mask: &MaskSlice) -> Result<Self> {
        self.ensure_shape(mask.shape())?;
        let mut data = self.data.clone();
        Zip::from(&mut data).and(&mask.data).for_each(|v, &m| {
            if !m {
                *v = 0.0;
            }
        });
        Ok(Self::new(data))
    }

    /// 用窗口把每个像素缩放并截断到 `[0, 1]`.
    #[inline]
    pub fn scale_clip(&self, window: Window) -> Self {
        self.map(|v| window.scale_clip(v))
    }

    /// 沿行方向翻转 (上下颠倒).
    pub fn flipped(&self) -> Self {
        let mut data = self.data.clone();
        data.invert_axis(Axis(0));
        Self::new(data.as_standard_layout().to_owned())
    }
}

impl Index<Idx2d> for MaskSlice {
    type Output = bool;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl MaskSlice {
    /// 直接初始化.
    #[inline]
    pub fn new(data: Array2<bool>) -> Self {
        Self { data }
    }

    /// 所有像素都为 `v` 的掩膜.
    #[inline]
    pub fn filled(shape: Idx2d, v: bool) -> Self {
        Self::new(Array2::from_elem(shape, v))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, bool> {
        self.data.view()
    }

    /// 获取给定位置 (行, 列) 的值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<bool> {
        self.data.get(pos).copied()
    }

    /// 统计为 `true` 的像素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|v| **v).count()
    }

    /// 逐像素与. 形状不一致时返回 `Err`.
    pub fn and(&self, other: &MaskSlice) -> Result<MaskSlice> {
        self.ensure_shape(other.shape())?;
        let mut data = self.data.clone();
        Zip::from(&mut data).and(&other.data).for_each(|a, b| *a &= *b);
        Ok(Self::new(data))
    }

    /// 转为 0/1 标量切片, 可直接用作透明度.
    #[inline]
    pub fn to_scalar(&self) -> ScalarSlice {
        ScalarSlice::new(self.data.mapv(|v| if v { 1.0 } else { 0.0 }))
    }
}

impl RgbSlice {
    /// 直接初始化. `data` 的最后一维长度必须为 3, 否则返回 `Err`.
    pub fn new(data: Array3<f32>) -> Result<Self> {
        match data.shape() {
            [_, _, 3] => Ok(Self { data }),
            sh => Err(Error::InvalidArgument(format!(
                "rgb slice must have shape (h, w, 3), got {sh:?}"
            ))),
        }
    }

    /// 所有像素都为 `color` 的切片.
    pub fn filled((h, w): Idx2d, color: Rgb) -> Self {
        Self {
            data: Array3::from_shape_fn((h, w, 3), |(_, _, c)| color[c]),
        }
    }

    /// 由逐像素函数构造.
    pub fn from_fn((h, w): Idx2d, f: impl Fn(Idx2d) -> Rgb) -> Self {
        let mut data = Array3::zeros((h, w, 3));
        for r in 0..h {
            for c in 0..w {
                let v = f((r, c));
                data.slice_mut(ndarray::s![r, c, ..])
                    .assign(&ndarray::aview1(&v));
            }
        }
        Self { data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut3<'_, f32> {
        self.data.view_mut()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<f32> {
        self.data
    }

    /// 获取给定位置 (行, 列) 的颜色. 越界时返回 `None`.
    #[inline]
    pub fn pixel(&self, (h, w): Idx2d) -> Option<Rgb> {
        if !self.check((h, w)) {
            return None;
        }
        Some([0, 1, 2].map(|c| self.data[(h, w, c)]))
    }

    /// 设置给定位置的颜色. 越界时静默忽略.
    #[inline]
    pub fn set_pixel(&mut self, (h, w): Idx2d, color: Rgb) {
        if self.check((h, w)) {
            for (c, v) in color.into_iter().enumerate() {
                self.data[(h, w, c)] = v;
            }
        }
    }

    /// 沿行方向翻转 (上下颠倒).
    pub fn flipped(&self) -> Self {
        let mut data = self.data.clone();
        data.invert_axis(Axis(0));
        Self {
            data: data.as_standard_layout().to_owned(),
        }
    }

    /// 转为 8-bit RGB 图像. `flip` 为 `true` 时第 0 行写到图像底部.
    pub fn to_rgb8(&self, flip: bool) -> image::RgbImage {
        let (height, width) = self.shape();
        let mut buf = image::RgbImage::new(width as u32, height as u32);
        for (h, row) in self.data.outer_iter().enumerate() {
            let y = if flip { height - 1 - h } else { h };
            for (w, px) in row.outer_iter().enumerate() {
                let rgb = [0, 1, 2].map(|c| (px[c].clamp(0.0, 1.0) * 255.0).round() as u8);
                buf.put_pixel(w as u32, y as u32, image::Rgb(rgb));
            }
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scalar_basics() {
        let s = ScalarSlice::new(array![[1.0, 2.0, 3.0], [4.0, f32::NAN, 6.0]]);
        assert_eq!(s.shape(), (2, 3));
        assert_eq!(s.size(), 6);
        assert!(s.check((1, 2)));
        assert!(!s.check((2, 0)));
        assert_eq!(s.min_max(), Some((1.0, 6.0)));
        assert_eq!(s.get((0, 2)), Some(3.0));
        assert_eq!(s.get((5, 5)), None);
        assert_eq!(s.gt(3.0).count(), 2);
        assert_eq!(s.clone().scaled(2.0)[(1, 2)], 12.0);
    }

    #[test]
    fn test_flipped() {
        let s = ScalarSlice::new(array![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(s.flipped().into_raw(), array![[3.0, 4.0], [1.0, 2.0]]);
    }

    #[test]
    fn test_mask_and() {
        let a = MaskSlice::new(array![[true, true], [false, true]]);
        let b = MaskSlice::new(array![[true, false], [true, true]]);
        let c = a.and(&b).unwrap();
        assert_eq!(c.count(), 2);
        assert_eq!(c.to_scalar().into_raw(), array![[1.0, 0.0], [0.0, 1.0]]);

        let s = ScalarSlice::new(array![[0.5, 0.5], [0.5, 0.5]]);
        assert_eq!(s.masked(&a).unwrap().into_raw(), array![[0.5, 0.5], [0.0, 0.5]]);

        let d = MaskSlice::filled((3, 2), true);
        assert!(matches!(a.and(&d), Err(Error::ShapeMismatch((2, 2), (3, 2)))));
    }

    #[test]
    fn test_rgb_new_checks_channels() {
        assert!(RgbSlice::new(Array3::zeros((2, 2, 3))).is_ok());
        assert!(RgbSlice::new(Array3::zeros((2, 2, 4))).is_err());
    }

    #[test]
    fn test_rgb_pixels_and_image() {
        let mut s = RgbSlice::filled((2, 3), [0.0, 0.0, 0.0]);
        s.set_pixel((0, 1), [1.0, 0.5, 0.0]);
        s.set_pixel((9, 9), [1.0, 1.0, 1.0]);
        assert_eq!(s.pixel((0, 1)), Some([1.0, 0.5, 0.0]));
        assert_eq!(s.pixel((2, 0)), None);

        let img = s.to_rgb8(false);
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(1, 0).0, [255, 128, 0]);
        let flipped = s.to_rgb8(true);
        assert_eq!(flipped.get_pixel(1, 1).0, [255, 128, 0]);
    }

    #[test]
    fn test_rgb_from_fn() {
        let s = RgbSlice::from_fn((2, 3), |(r, c)| [r as f32, c as f32, 0.5]);
        assert_eq!(s.pixel((1, 2)), Some([1.0, 2.0, 0.5]));
        assert_eq!(s.pixel((0, 1)), Some([0.0, 1.0, 0.5]));
    }
}
