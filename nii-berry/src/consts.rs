//! 通用常量.

/// RGB 颜色, 每个通道取值 `[0.0, 1.0]`.
pub type Rgb = [f32; 3];

/// 三通道颜色.
pub mod rgb {
    use super::Rgb;

    /// 黑色.
    pub const BLACK: Rgb = [0.0, 0.0, 0.0];

    /// 白色.
    pub const WHITE: Rgb = [1.0, 1.0, 1.0];

    /// 红色.
    pub const RED: Rgb = [1.0, 0.0, 0.0];

    /// 绿色. 十字准线默认颜色.
    pub const GREEN: Rgb = [0.0, 0.5, 0.0];

    /// 蓝色.
    pub const BLUE: Rgb = [0.0, 0.0, 1.0];

    /// 青色.
    pub const CYAN: Rgb = [0.0, 0.75, 0.75];

    /// 品红色.
    pub const MAGENTA: Rgb = [0.75, 0.0, 0.75];

    /// 黄色.
    pub const YELLOW: Rgb = [0.75, 0.75, 0.0];

    /// 按名字或 `#rrggbb` 解析颜色. 名字支持单字母缩写 (`k`, `w`, `r`, ...).
    pub fn parse(name: &str) -> Option<Rgb> {
        let name = name.trim();
        if let Some(hex) = name.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return None;
            }
            let mut ans = [0.0; 3];
            for (i, slot) in ans.iter_mut().enumerate() {
                let byte = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16).ok()?;
                *slot = byte as f32 / 255.0;
            }
            return Some(ans);
        }
        match name.to_ascii_lowercase().as_str() {
            "k" | "black" => Some(BLACK),
            "w" | "white" => Some(WHITE),
            "r" | "red" => Some(RED),
            "g" | "green" => Some(GREEN),
            "b" | "blue" => Some(BLUE),
            "c" | "cyan" => Some(CYAN),
            "m" | "magenta" => Some(MAGENTA),
            "y" | "yellow" => Some(YELLOW),
            _ => None,
        }
    }
}

/// 切片默认采样点数 (水平方向).
pub const DEFAULT_SAMPLES: usize = 128;

/// 未给出显示范围时, 默认使用的百分位数 (低, 高).
pub const DEFAULT_CLIM_PERCENTILES: (f64, f64) = (2.0, 98.0);

/// 色条/透明度条的默认采样步数.
pub const BAR_STEPS: usize = 32;

/// 高斯核截断半径 (以 sigma 为单位).
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;
