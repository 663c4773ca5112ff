//! 等值线 (marching squares).
//!
//! 坐标均为切片网格上的 (行, 列) 小数坐标.

use crate::consts::Rgb;
use crate::{RgbSlice, ScalarSlice, Window};

/// 一条线段的两个端点, (行, 列).
pub type Segment = [(f64, f64); 2];

/// 单元格的四条边: 上、右、下、左.
#[derive(Copy, Clone)]
enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// 求 `slice` 在 `level` 处的等值线段.
///
/// 严格大于 `level` 的像素视为 "内部". 鞍点单元格按中心值 (四角均值) 消歧.
pub fn contour_segments(slice: &ScalarSlice, level: f32) -> Vec<Segment> {
    let (rows, cols) = slice.shape();
    let mut ans = Vec::new();
    if rows < 2 || cols < 2 {
        return ans;
    }
    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            // 左上, 右上, 右下, 左下
            let v = [
                slice[(r, c)],
                slice[(r, c + 1)],
                slice[(r + 1, c + 1)],
                slice[(r + 1, c)],
            ];
            let inside = v.map(|x| x > level);
            let n_inside = inside.iter().filter(|b| **b).count();
            if n_inside == 0 || n_inside == 4 {
                continue;
            }

            let point = |e: Edge| -> (f64, f64) {
                let (a, b, from, to) = match e {
                    Edge::Top => (v[0], v[1], (r, c), (r, c + 1)),
                    Edge::Right => (v[1], v[2], (r, c + 1), (r + 1, c + 1)),
                    Edge::Bottom => (v[3], v[2], (r + 1, c), (r + 1, c + 1)),
                    Edge::Left => (v[0], v[3], (r, c), (r + 1, c)),
                };
                let t = if b == a { 0.5 } else { ((level - a) / (b - a)) as f64 };
                (
                    from.0 as f64 + (to.0 as f64 - from.0 as f64) * t,
                    from.1 as f64 + (to.1 as f64 - from.1 as f64) * t,
                )
            };

            let saddle = inside[0] == inside[2] && inside[1] == inside[3] && inside[0] != inside[1];
            if saddle {
                // 切掉与中心状态不同的两个角.
                let center = v.iter().sum::<f32>() / 4.0 > level;
                let corners: [(Edge, Edge); 4] = [
                    (Edge::Top, Edge::Left),
                    (Edge::Top, Edge::Right),
                    (Edge::Right, Edge::Bottom),
                    (Edge::Bottom, Edge::Left),
                ];
                for (k, (e0, e1)) in corners.into_iter().enumerate() {
                    if inside[k] != center {
                        ans.push([point(e0), point(e1)]);
                    }
                }
                continue;
            }

            let crossed: Vec<Edge> = [
                (Edge::Top, 0, 1),
                (Edge::Right, 1, 2),
                (Edge::Bottom, 3, 2),
                (Edge::Left, 0, 3),
            ]
            .into_iter()
            .filter(|(_, i, j)| inside[*i] != inside[*j])
            .map(|(e, _, _)| e)
            .collect();
            if let [e0, e1] = crossed[..] {
                ans.push([point(e0), point(e1)]);
            }
        }
    }
    ans
}

/// 把原始等值线水平经 `window` 映射到 `[0, 1]`, 只保留严格落在 `slice` (最小值, 最大值)
/// 之间的水平, 避免绘制出虚假的轮廓.
pub fn valid_levels(slice: &ScalarSlice, levels: &[f32], window: Window) -> Vec<f32> {
    let Some((lo, hi)) = slice.min_max() else {
        return Vec::new();
    };
    levels
        .iter()
        .map(|l| window.scale_clip(*l))
        .filter(|l| lo < *l && *l < hi)
        .collect()
}

/// 在 `img` 上以 `colors` (循环使用) 绘制 `alpha` 在各 `levels` 处的等值线.
///
/// 返回绘制的线段总数. `colors` 为空时不绘制.
pub fn draw_contours(img: &mut RgbSlice, alpha: &ScalarSlice, levels: &[f32], colors: &[Rgb]) -> usize {
    if colors.is_empty() {
        return 0;
    }
    let mut total = 0;
    for (level, color) in levels.iter().zip(colors.iter().cycle()) {
        let segments = contour_segments(alpha, *level);
        for seg in &segments {
            draw_segment(img, *seg, *color);
        }
        total += segments.len();
    }
    total
}

/// 沿线段以不超过半像素的步长取点, 写到最近的像素上.
pub(crate) fn draw_segment(img: &mut RgbSlice, [(r0, c0), (r1, c1)]: Segment, color: Rgb) {
    let len = (r1 - r0).abs().max((c1 - c0).abs());
    let steps = (len * 2.0).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let r = (r0 + (r1 - r0) * t).round();
        let c = (c0 + (c1 - c0) * t).round();
        if r >= 0.0 && c >= 0.0 {
            img.set_pixel((r as usize, c as usize), color);
        }
    }
}
