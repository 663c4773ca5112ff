use crate::{Error, Point3, Result};
use ndarray::ArrayView3;
use std::fmt;
use std::str::FromStr;

/// 重采样插值方式.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interp {
    /// 最近邻 (0 阶).
    Nearest,

    /// 三线性 (1 阶).
    #[default]
    Linear,
}

impl Interp {
    /// 由样条阶数构造. 只支持 0 阶与 1 阶.
    pub fn from_order(order: u32) -> Result<Self> {
        match order {
            0 => Ok(Self::Nearest),
            1 => Ok(Self::Linear),
            n => Err(Error::InterpOrder(n)),
        }
    }

    /// 对应的样条阶数.
    #[inline]
    pub fn order(&self) -> u32 {
        match self {
            Self::Nearest => 0,
            Self::Linear => 1,
        }
    }

    /// 在体素坐标 `p` (可为小数) 处对 `vol` 取值.
    ///
    /// 任一轴上 `p` 落在 `[0, n - 1]` 之外时返回 0.
    pub fn sample(&self, vol: &ArrayView3<'_, f32>, p: Point3) -> f32 {
        let (nx, ny, nz) = vol.dim();
        let inside = p
            .iter()
            .zip([nx, ny, nz])
            .all(|(&c, n)| c >= 0.0 && c <= (n - 1) as f64);
        if !inside {
            return 0.0;
        }
        match self {
            Self::Nearest => {
                let [x, y, z] = p.map(|c| c.round() as usize);
                vol[(x, y, z)]
            }
            Self::Linear => trilinear(vol, p),
        }
    }
}

/// 调用方保证 `p` 在体内.
fn trilinear(vol: &ArrayView3<'_, f32>, p: Point3) -> f32 {
    let (nx, ny, nz) = vol.dim();
    let lo = |c: f64, n: usize| (c.floor() as usize).min(n - 1);
    let (x0, y0, z0) = (lo(p[0], nx), lo(p[1], ny), lo(p[2], nz));
    let (x1, y1, z1) = ((x0 + 1).min(nx - 1), (y0 + 1).min(ny - 1), (z0 + 1).min(nz - 1));
    let (fx, fy, fz) = (
        (p[0] - x0 as f64) as f32,
        (p[1] - y0 as f64) as f32,
        (p[2] - z0 as f64) as f32,
    );

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let c00 = lerp(vol[(x0, y0, z0)], vol[(x1, y0, z0)], fx);
    let c10 = lerp(vol[(x0, y1, z0)], vol[(x1, y1, z0)], fx);
    let c01 = lerp(vol[(x0, y0, z1)], vol[(x1, y0, z1)], fx);
    let c11 = lerp(vol[(x0, y1, z1)], vol[(x1, y1, z1)], fx);
    let c0 = lerp(c00, c10, fy);
    let c1 = lerp(c01, c11, fy);
    lerp(c0, c1, fz)
}

impl FromStr for Interp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" | "0" => Ok(Self::Nearest),
            "linear" | "1" => Ok(Self::Linear),
            other => Err(Error::InvalidArgument(format!("unknown interpolation `{other}`"))),
        }
    }
}

impl fmt::Display for Interp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
        };
        f.write_str(s)
    }
}
