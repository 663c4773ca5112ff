//! 色条与双轴 (颜色/透明度) 色条.
//!
//! 色条以 [`RgbSlice`] 形式生成, 第 0 行对应数值下限, 与切片一样在写出时翻转到底部.

use crate::color::{colorize, ColorMap};
use crate::compose::{blend, contour::draw_segment};
use crate::consts::rgb;
use crate::stats::linspace;
use crate::{Result, RgbSlice, ScalarSlice, Window};
use ndarray::Array2;
use std::str::FromStr;

/// 色条方向.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BarOrient {
    /// 水平, 颜色沿列变化.
    #[default]
    Horizontal,
    /// 竖直, 颜色沿行变化.
    Vertical,
}

impl FromStr for BarOrient {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Ok(Self::Horizontal),
            "v" | "vertical" => Ok(Self::Vertical),
            other => Err(crate::Error::InvalidArgument(format!("unknown bar orientation `{other}`"))),
        }
    }
}

/// 沿颜色轴铺开 `clim` 的 `steps x steps` 标量网格.
fn color_ramp(clim: Window, orient: BarOrient, steps: usize) -> ScalarSlice {
    let ramp: Vec<f32> = linspace(clim.lower_bound() as f64, clim.upper_bound() as f64, steps)
        .map(|v| v as f32)
        .collect();
    ScalarSlice::new(Array2::from_shape_fn((steps, steps), |(r, c)| match orient {
        BarOrient::Horizontal => ramp[c],
        BarOrient::Vertical => ramp[r],
    }))
}

/// 生成 `steps x steps` 的色条.
pub fn colorbar(cmap: &ColorMap, clim: Window, orient: BarOrient, steps: usize) -> RgbSlice {
    let data = color_ramp(clim, orient, steps);
    colorize(&data, cmap, Some((clim.lower_bound(), clim.upper_bound())))
}

/// 生成 `steps x steps` 的双轴色条: 颜色沿一个轴, 透明度 (0 → 1) 沿另一个轴, 叠加在白色背景上.
///
/// `alim` 为透明度轴的数值范围, `lines` 中的每个数值会在透明度轴对应位置画一条黑线
/// (例如标出 p < 0.05 的位置). 落在 `alim` 之外的数值被忽略.
pub fn alphabar(
    cmap: &ColorMap,
    clim: Window,
    alim: Window,
    lines: &[f32],
    orient: BarOrient,
    steps: usize,
) -> Result<RgbSlice> {
    let color = colorbar(cmap, clim, orient, steps);
    let ramp: Vec<f32> = linspace(0.0, 1.0, steps).map(|v| v as f32).collect();
    let alpha = ScalarSlice::new(Array2::from_shape_fn((steps, steps), |(r, c)| match orient {
        BarOrient::Horizontal => ramp[r],
        BarOrient::Vertical => ramp[c],
    }));
    let backg = RgbSlice::filled((steps, steps), rgb::WHITE);
    let mut bar = blend(&backg, &color, &alpha)?;

    let last = steps.saturating_sub(1) as f64;
    for &v in lines {
        if v < alim.lower_bound() || v > alim.upper_bound() {
            continue;
        }
        let pos = alim.scale_clip(v) as f64 * last;
        let seg = match orient {
            BarOrient::Horizontal => [(pos, 0.0), (pos, last)],
            BarOrient::Vertical => [(0.0, pos), (last, pos)],
        };
        draw_segment(&mut bar, seg, rgb::BLACK);
    }
    Ok(bar)
}

/// 色条两端与中点的刻度文本: `(下限, 标签, 上限)`.
///
/// 不绘制文字, 只用于日志输出.
pub fn tick_labels(clim: Window, label: &str) -> (String, String, String) {
    (
        format!("{:.3}", clim.lower_bound()),
        label.to_string(),
        format!("{:.3}", clim.upper_bound()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::Rgb;

    fn color_eq(a: Rgb, b: Rgb) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn test_colorbar_direction() {
        let clim = Window::new(0.0, 10.0).unwrap();
        let h = colorbar(&ColorMap::gray(), clim, BarOrient::Horizontal, 32);
        assert_eq!(h.shape(), (32, 32));
        assert!(color_eq(h.pixel((5, 0)).unwrap(), rgb::BLACK));
        assert!(color_eq(h.pixel((5, 31)).unwrap(), rgb::WHITE));

        let v = colorbar(&ColorMap::gray(), clim, BarOrient::Vertical, 16);
        assert!(color_eq(v.pixel((0, 7)).unwrap(), rgb::BLACK));
        assert!(color_eq(v.pixel((15, 7)).unwrap(), rgb::WHITE));
    }

    #[test]
    fn test_alphabar_fades_to_white() {
        let clim = Window::new(0.0, 1.0).unwrap();
        let alim = Window::new(0.5, 1.0).unwrap();
        let bar = alphabar(&ColorMap::gray(), clim, alim, &[], BarOrient::Horizontal, 32).unwrap();
        // 透明度为 0 的一行是纯白.
        assert!(color_eq(bar.pixel((0, 0)).unwrap(), rgb::WHITE));
        // 透明度为 1 的一行是色表本身.
        assert!(color_eq(bar.pixel((31, 0)).unwrap(), rgb::BLACK));
    }

    #[test]
    fn test_alphabar_lines() {
        let clim = Window::new(0.0, 1.0).unwrap();
        let alim = Window::new(0.0, 1.0).unwrap();
        let bar = alphabar(
            &ColorMap::new("hot").unwrap(),
            clim,
            alim,
            &[0.5, 3.0],
            BarOrient::Vertical,
            11,
        )
        .unwrap();
        for r in 0..11 {
            assert_eq!(bar.pixel((r, 5)), Some(rgb::BLACK));
        }
        assert_ne!(bar.pixel((0, 4)), Some(rgb::BLACK));
    }

    #[test]
    fn test_tick_labels() {
        let (lo, mid, hi) = tick_labels(Window::new(-1.0, 2.5).unwrap(), "1-p");
        assert_eq!((lo.as_str(), mid.as_str(), hi.as_str()), ("-1.000", "1-p", "2.500"));
        assert_eq!("v".parse::<BarOrient>().unwrap(), BarOrient::Vertical);
    }
}
