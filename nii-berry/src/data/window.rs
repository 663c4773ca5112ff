/// 强度窗口, 包含下限与上限. 用于把任意标量映射到 `[0, 1]`.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    lower: f32,
    upper: f32,
}

impl Window {
    /// 构建窗口.
    ///
    /// `lower` 和 `upper` 必须有限且 `lower <= upper`, 否则返回 `None`.
    pub fn new(lower: f32, upper: f32) -> Option<Window> {
        if lower.is_finite() && upper.is_finite() && lower <= upper {
            Some(Self { lower, upper })
        } else {
            None
        }
    }

    /// 以窗位 (level) 和窗宽 (width) 构建窗口. 窗宽必须非负.
    pub fn from_level_width(level: f32, width: f32) -> Option<Window> {
        if width < 0.0 {
            return None;
        }
        Self::new(level - width / 2.0, level + width / 2.0)
    }

    /// `[0, 1]` 单位窗口.
    #[inline]
    pub const fn unit() -> Window {
        Self {
            lower: 0.0,
            upper: 1.0,
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.lower
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.upper
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        (self.lower + self.upper) / 2.0
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.upper - self.lower
    }

    /// 窗口是否退化 (上下限相等)?
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0
    }

    /// 把 `v` 线性缩放到 `[0, 1]` 并截断: `clamp((v - lower) / width, 0, 1)`.
    ///
    /// 窗口退化时结果是一个阶跃: `v > lower` 为 1, 否则为 0. NaN 映射为 0.
    pub fn scale_clip(&self, v: f32) -> f32 {
        if v.is_nan() {
            return 0.0;
        }
        if self.is_degenerate() {
            return if v > self.lower { 1.0 } else { 0.0 };
        }
        ((v - self.lower) / self.width()).clamp(0.0, 1.0)
    }

    /// 求在当前窗口设置下, `v` 对应的灰度图像素整数值 (0 <= value <= 255).
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, v: f32) -> Option<u8> {
        if !v.is_finite() {
            return None;
        }
        // 255, not 256.
        Some((self.scale_clip(v) * 255.0) as u8)
    }
}

impl From<(f32, f32)> for Window {
    /// 自动调整顺序, 保证 `lower <= upper`.
    fn from((a, b): (f32, f32)) -> Self {
        Self {
            lower: a.min(b),
            upper: a.max(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Window;

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_window_invalid_input() {
        assert!(Window::new(1.0, 0.0).is_none());
        assert!(Window::new(f32::NAN, 1.0).is_none());
        assert!(Window::new(0.0, f32::INFINITY).is_none());
        assert!(Window::from_level_width(0.0, -1.0).is_none());
        assert!(Window::new(1.0, 1.0).is_some());
    }

    #[test]
    fn test_window_generic() {
        // [60, 100]
        let w = Window::from_level_width(80.0, 40.0).unwrap();
        assert!(float_eq(w.lower_bound(), 60.0));
        assert!(float_eq(w.upper_bound(), 100.0));
        assert_eq!(w.eval(f32::NAN), None);
        assert_eq!(w.eval(f32::MIN), Some(0));
        assert_eq!(w.eval(f32::MAX), Some(255));

        assert!(float_eq(w.scale_clip(50.0), 0.0));
        assert!(float_eq(w.scale_clip(70.0), 0.25));
        assert!(float_eq(w.scale_clip(80.0), 0.5));
        assert!(float_eq(w.scale_clip(90.0), 0.75));
        assert!(float_eq(w.scale_clip(120.0), 1.0));
        assert_eq!(w.eval(80.0).unwrap(), (255.0 * 0.5) as u8);

        // boundary
        assert_eq!(w.eval(99.999), Some(254));
        assert_eq!(w.eval(100.0), Some(255));
    }

    #[test]
    fn test_degenerate_window_is_step() {
        let w = Window::new(0.5, 0.5).unwrap();
        assert!(w.is_degenerate());
        assert_eq!(w.scale_clip(0.5), 0.0);
        assert_eq!(w.scale_clip(0.6), 1.0);
        assert_eq!(w.scale_clip(f32::NAN), 0.0);
    }

    #[test]
    fn test_from_tuple_orders_bounds() {
        let w = Window::from((1.0, -1.0));
        assert_eq!(w.lower_bound(), -1.0);
        assert_eq!(w.upper_bound(), 1.0);
        assert_eq!(Window::unit().width(), 1.0);
    }
}
