//! 内置色表的控制点.

use crate::consts::{rgb, Rgb};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// 控制点: (位置, 颜色). 位置单调递增, 首尾分别为 0 与 1.
pub(crate) type Stop = (f32, Rgb);

/// 以十六进制给出的等距色表.
const RDYLBU: &[&str] = &[
    "#a50026", "#d73027", "#f46d43", "#fdae61", "#fee090", "#ffffbf", "#e0f3f8", "#abd9e9",
    "#74add1", "#4575b4", "#313695",
];

const RDBU: &[&str] = &[
    "#67001f", "#b2182b", "#d6604d", "#f4a582", "#fddbc7", "#f7f7f7", "#d1e5f0", "#92c5de",
    "#4393c3", "#2166ac", "#053061",
];

// 循环色轮, 首尾同色.
const PHASE: &[&str] = &["#ff0000", "#ffff00", "#00ff00", "#00ffff", "#0000ff", "#ff00ff", "#ff0000"];

/// 表中颜色均为常量, 测试中逐一检查可解析.
fn hex(s: &str) -> Rgb {
    rgb::parse(s).unwrap_or(rgb::BLACK)
}

/// 把等距的十六进制颜色展开为控制点.
fn even(colors: &[&str]) -> Vec<Stop> {
    let last = (colors.len() - 1) as f32;
    colors
        .iter()
        .enumerate()
        .map(|(i, c)| (i as f32 / last, hex(c)))
        .collect()
}

pub(crate) static MAPS: Lazy<HashMap<&'static str, Vec<Stop>>> = Lazy::new(|| {
    let gray = vec![(0.0, rgb::BLACK), (1.0, rgb::WHITE)];
    let mut m = HashMap::new();
    m.insert("gray", gray.clone());
    m.insert("grey", gray.clone());
    m.insert("gist_gray", gray);
    m.insert(
        "hot",
        vec![
            (0.0, [0.0416, 0.0, 0.0]),
            (0.365079, [1.0, 0.0, 0.0]),
            (0.746032, [1.0, 1.0, 0.0]),
            (1.0, [1.0, 1.0, 1.0]),
        ],
    );
    m.insert(
        "viridis",
        vec![
            (0.0, [0.267004, 0.004874, 0.329415]),
            (0.125, [0.282623, 0.140926, 0.457517]),
            (0.25, [0.253935, 0.265254, 0.529983]),
            (0.375, [0.206756, 0.371758, 0.553117]),
            (0.5, [0.163625, 0.471133, 0.558148]),
            (0.625, [0.127568, 0.566949, 0.550556]),
            (0.75, [0.134692, 0.658636, 0.517649]),
            (0.875, [0.369214, 0.788888, 0.382914]),
            (0.9375, [0.626579, 0.854645, 0.223353]),
            (1.0, [0.993248, 0.906157, 0.143936]),
        ],
    );
    m.insert(
        "jet",
        vec![
            (0.0, [0.0, 0.0, 0.5]),
            (0.125, [0.0, 0.0, 1.0]),
            (0.375, [0.0, 1.0, 1.0]),
            (0.625, [1.0, 1.0, 0.0]),
            (0.875, [1.0, 0.0, 0.0]),
            (1.0, [0.5, 0.0, 0.0]),
        ],
    );
    m.insert("RdYlBu", even(RDYLBU));
    m.insert("RdBu", even(RDBU));
    m.insert(
        "coolwarm",
        vec![
            (0.0, [0.230, 0.299, 0.754]),
            (0.25, [0.552, 0.690, 0.996]),
            (0.5, [0.865, 0.865, 0.865]),
            (0.75, [0.956, 0.604, 0.486]),
            (1.0, [0.706, 0.016, 0.150]),
        ],
    );
    m.insert("phase", even(PHASE));
    // 负半边由亮蓝渐暗到黑, 正半边由黑经红、橙到黄.
    m.insert(
        "twoway",
        vec![
            (0.0, [0.45, 0.75, 1.0]),
            (0.25, [0.1, 0.3, 0.8]),
            (0.5, [0.0, 0.0, 0.0]),
            (0.7, [0.75, 0.1, 0.0]),
            (0.85, [1.0, 0.55, 0.0]),
            (1.0, [1.0, 1.0, 0.2]),
        ],
    );
    m
});
