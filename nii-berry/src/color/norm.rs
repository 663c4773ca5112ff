use crate::ScalarSlice;

/// 标量到 `[0, 1]` 的归一化方式.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Norm {
    /// 使用数据自身的有限最小/最大值, 在 [`Norm::resolve`] 时确定.
    Auto,

    /// `(v - vmin) / (vmax - vmin)`.
    Linear {
        /// 下限.
        vmin: f32,
        /// 上限.
        vmax: f32,
    },

    /// 以 0 为中心的双斜率: `[vmin, 0] → [0, 0.5]`, `[0, vmax] → [0.5, 1]`.
    TwoSlope {
        /// 下限, 小于 0.
        vmin: f32,
        /// 上限, 大于 0.
        vmax: f32,
    },
}

impl Norm {
    /// 由显示范围选择归一化方式. 范围跨越 0 时使用双斜率.
    pub fn from_clim(clim: Option<(f32, f32)>) -> Self {
        match clim {
            None => Self::Auto,
            Some((vmin, vmax)) if vmin < 0.0 && vmax > 0.0 => Self::TwoSlope { vmin, vmax },
            Some((vmin, vmax)) => Self::Linear { vmin, vmax },
        }
    }

    /// 把 `Auto` 落实为基于 `slice` 最小/最大值的线性归一化. 其他方式原样返回.
    pub fn resolve(self, slice: &ScalarSlice) -> Self {
        match self {
            Self::Auto => {
                let (vmin, vmax) = slice.min_max().unwrap_or((0.0, 0.0));
                Self::Linear { vmin, vmax }
            }
            other => other,
        }
    }

    /// 归一化单个值. 结果不截断; 退化范围返回 0, NaN 保持 NaN.
    ///
    /// 对 `Auto` 调用时视为恒等映射.
    pub fn apply(&self, v: f32) -> f32 {
        match *self {
            Self::Auto => v,
            Self::Linear { vmin, vmax } => {
                if vmax == vmin {
                    if v.is_nan() {
                        v
                    } else {
                        0.0
                    }
                } else {
                    (v - vmin) / (vmax - vmin)
                }
            }
            Self::TwoSlope { vmin, vmax } => {
                if v < 0.0 {
                    0.5 * (v - vmin) / -vmin
                } else {
                    0.5 + 0.5 * v / vmax
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_clim() {
        assert_eq!(Norm::from_clim(None), Norm::Auto);
        assert_eq!(
            Norm::from_clim(Some((-2.0, 3.0))),
            Norm::TwoSlope { vmin: -2.0, vmax: 3.0 }
        );
        // 上限非正时双斜率无意义, 退回线性.
        assert_eq!(
            Norm::from_clim(Some((-2.0, -1.0))),
            Norm::Linear { vmin: -2.0, vmax: -1.0 }
        );
        assert_eq!(
            Norm::from_clim(Some((0.0, 1.0))),
            Norm::Linear { vmin: 0.0, vmax: 1.0 }
        );
    }

    #[test]
    fn test_linear_and_degenerate() {
        let n = Norm::Linear { vmin: 2.0, vmax: 4.0 };
        assert_eq!(n.apply(3.0), 0.5);
        assert_eq!(n.apply(6.0), 2.0);
        let d = Norm::Linear { vmin: 1.0, vmax: 1.0 };
        assert_eq!(d.apply(5.0), 0.0);
        assert!(d.apply(f32::NAN).is_nan());
    }

    #[test]
    fn test_two_slope() {
        let n = Norm::TwoSlope { vmin: -4.0, vmax: 2.0 };
        assert_eq!(n.apply(-4.0), 0.0);
        assert_eq!(n.apply(-2.0), 0.25);
        assert_eq!(n.apply(0.0), 0.5);
        assert_eq!(n.apply(1.0), 0.75);
        assert_eq!(n.apply(2.0), 1.0);
    }

    #[test]
    fn test_resolve_auto() {
        let s = ScalarSlice::new(array![[1.0, f32::NAN, 5.0]]);
        assert_eq!(Norm::Auto.resolve(&s), Norm::Linear { vmin: 1.0, vmax: 5.0 });
        let fixed = Norm::Linear { vmin: 0.0, vmax: 1.0 };
        assert_eq!(fixed.resolve(&s), fixed);
    }
}
