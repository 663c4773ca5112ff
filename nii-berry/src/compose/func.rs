//! 切片级别的图像运算: 缩放、混合、掩膜、模糊与棋盘格.

use crate::consts::{Rgb, GAUSSIAN_TRUNCATE};
use crate::{Error, MaskSlice, Result, RgbSlice, ScalarSlice, Window};
use ndarray::{ArrayViewMut2, Axis, Zip};

/// 掩膜之外像素的取值来源.
#[derive(Copy, Clone, Debug)]
pub enum Background<'a> {
    /// 固定颜色.
    Color(Rgb),
    /// 另一张同形状的 RGB 图像.
    Image(&'a RgbSlice),
}

/// 用窗口把切片缩放并截断到 `[0, 1]`.
#[inline]
pub fn scale_clip(slice: &ScalarSlice, window: Window) -> ScalarSlice {
    slice.scale_clip(window)
}

/// 逐像素混合: `under * (1 - a) + over * a`.
///
/// 三者形状必须一致, 否则返回 `Err`.
pub fn blend(under: &RgbSlice, over: &RgbSlice, alpha: &ScalarSlice) -> Result<RgbSlice> {
    under.ensure_shape(over.shape())?;
    under.ensure_shape(alpha.shape())?;
    let mut ans = under.clone();
    Zip::from(ans.data_mut().lanes_mut(Axis(2)))
        .and(over.data().lanes(Axis(2)))
        .and(alpha.data())
        .for_each(|mut u, o, &a| {
            for (u, o) in u.iter_mut().zip(o) {
                *u = *u * (1.0 - a) + *o * a;
            }
        });
    Ok(ans)
}

/// 掩膜为 `true` 处取 `img`, 否则取背景. `mask` 为 `None` 时原样返回 `img`.
///
/// 掩膜或背景图像与 `img` 形状不一致时返回 `Err`.
pub fn mask(img: &RgbSlice, mask: Option<&MaskSlice>, back: Background<'_>) -> Result<RgbSlice> {
    let Some(mask) = mask else {
        return Ok(img.clone());
    };
    img.ensure_shape(mask.shape())?;
    let mut ans = img.clone();
    match back {
        Background::Color(color) => {
            Zip::from(ans.data_mut().lanes_mut(Axis(2)))
                .and(mask.data())
                .for_each(|mut px, &m| {
                    if !m {
                        px.iter_mut().zip(color).for_each(|(p, c)| *p = c);
                    }
                });
        }
        Background::Image(back) => {
            img.ensure_shape(back.shape())?;
            Zip::from(ans.data_mut().lanes_mut(Axis(2)))
                .and(back.data().lanes(Axis(2)))
                .and(mask.data())
                .for_each(|mut px, b, &m| {
                    if !m {
                        px.assign(&b);
                    }
                });
        }
    }
    Ok(ans)
}

/// 高斯模糊. `sigma` 以像素为单位, 非正时原样返回.
///
/// 边界按反射方式延拓 (`d c b a | a b c d | d c b a`), 核在 4σ 处截断.
pub fn blur(slice: &ScalarSlice, sigma: f64) -> ScalarSlice {
    let mut data = slice.data().to_owned();
    if let Some(kernel) = gaussian_kernel(sigma) {
        blur_2d(data.view_mut(), &kernel);
    }
    ScalarSlice::new(data)
}

/// 对 RGB 图像的每个通道分别做高斯模糊, 见 [`blur`].
pub fn blur_rgb(img: &RgbSlice, sigma: f64) -> RgbSlice {
    let mut ans = img.clone();
    if let Some(kernel) = gaussian_kernel(sigma) {
        let mut data = ans.data_mut();
        for c in 0..3 {
            blur_2d(data.index_axis_mut(Axis(2), c), &kernel);
        }
    }
    ans
}

fn gaussian_kernel(sigma: f64) -> Option<Vec<f32>> {
    if !(sigma > 0.0) {
        return None;
    }
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|i| (-0.5 * (i as f64 / sigma).powi(2)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    Some(weights.into_iter().map(|w| (w / total) as f32).collect())
}

/// 周期为 `2n` 的反射下标.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let m = i.rem_euclid(2 * n);
    (if m < n { m } else { 2 * n - 1 - m }) as usize
}

fn blur_2d(mut data: ArrayViewMut2<'_, f32>, kernel: &[f32]) {
    let radius = (kernel.len() / 2) as isize;
    for axis in [Axis(0), Axis(1)] {
        let mut buf = Vec::new();
        for mut lane in data.lanes_mut(axis) {
            let n = lane.len();
            buf.clear();
            buf.extend(lane.iter().copied());
            for (i, v) in lane.iter_mut().enumerate() {
                *v = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * buf[reflect(i as isize + k as isize - radius, n)])
                    .sum();
            }
        }
    }
}

/// 以边长 `square` 像素的方格交替拼合两张同形状图像, 左上角方格取自 `a`.
///
/// 常用于检查配准质量. 形状不一致或 `square == 0` 时返回 `Err`.
pub fn checkerboard(a: &RgbSlice, b: &RgbSlice, square: usize) -> Result<RgbSlice> {
    a.ensure_shape(b.shape())?;
    if square == 0 {
        return Err(Error::InvalidArgument("checkerboard square must be positive".into()));
    }
    let mut ans = a.clone();
    Zip::indexed(ans.data_mut().lanes_mut(Axis(2)))
        .and(b.data().lanes(Axis(2)))
        .for_each(|(r, c), mut px, other| {
            if (r / square + c / square) % 2 == 1 {
                px.assign(&other);
            }
        });
    Ok(ans)
}
