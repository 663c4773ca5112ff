//! 体素坐标与世界坐标之间的仿射变换.
//!
//! 矩阵作用于齐次列向量 `[i, j, k, 1]`, 输出世界坐标 (通常为毫米).

use crate::{Error, Point3, Result};
use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};
use nifti::NiftiHeader;

/// 4x4 仿射矩阵.
pub type Affine = Matrix4<f64>;

/// 从 NIfTI header 解析体素到世界坐标的仿射矩阵.
///
/// 1. `sform_code > 0` 时使用 `srow_{x,y,z}`;
/// 2. 否则 `qform_code > 0` 时使用四元数与偏移量;
/// 3. 否则退化为以 `pixdim` 为对角的缩放矩阵.
pub fn from_header(h: &NiftiHeader) -> Affine {
    if h.sform_code > 0 {
        sform(h)
    } else if h.qform_code > 0 {
        qform(h)
    } else {
        let [_, dx, dy, dz, ..] = h.pixdim;
        diagonal(
            [dx as f64, dy as f64, dz as f64].map(non_zero_spacing),
            [0.0; 3],
        )
    }
}

/// 体素间距为 0 的 header 并不少见, 此时按 1 处理.
///
/// 负的间距取绝对值: 方向只由 sform, qform 四元数与 `qfac` 决定.
#[inline]
fn non_zero_spacing(v: f64) -> f64 {
    if v == 0.0 || !v.is_finite() {
        1.0
    } else {
        v.abs()
    }
}

fn sform(h: &NiftiHeader) -> Affine {
    let row = |r: &[f32; 4]| Vector4::new(r[0] as f64, r[1] as f64, r[2] as f64, r[3] as f64);
    Matrix4::from_rows(&[
        row(&h.srow_x).transpose(),
        row(&h.srow_y).transpose(),
        row(&h.srow_z).transpose(),
        Vector4::new(0.0, 0.0, 0.0, 1.0).transpose(),
    ])
}

fn qform(h: &NiftiHeader) -> Affine {
    let (b, c, d) = (h.quatern_b as f64, h.quatern_c as f64, h.quatern_d as f64);
    let a2 = 1.0 - (b * b + c * c + d * d);
    let (a, b, c, d) = if a2 < 1e-7 {
        // 数值误差导致 a 无意义, 重新归一化 (b, c, d).
        let n = (b * b + c * c + d * d).sqrt();
        (0.0, b / n, c / n, d / n)
    } else {
        (a2.sqrt(), b, c, d)
    };

    let rot = Matrix3::new(
        a * a + b * b - c * c - d * d,
        2.0 * (b * c - a * d),
        2.0 * (b * d + a * c),
        2.0 * (b * c + a * d),
        a * a + c * c - b * b - d * d,
        2.0 * (c * d - a * b),
        2.0 * (b * d - a * c),
        2.0 * (c * d + a * b),
        a * a + d * d - c * c - b * b,
    );
    let qfac = if h.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
    let [_, dx, dy, dz, ..] = h.pixdim;
    let zoom = Matrix3::from_diagonal(&Vector3::new(
        non_zero_spacing(dx as f64),
        non_zero_spacing(dy as f64),
        qfac * non_zero_spacing(dz as f64),
    ));

    let mut ans = Affine::identity();
    ans.fixed_view_mut::<3, 3>(0, 0).copy_from(&(rot * zoom));
    ans[(0, 3)] = h.quatern_x as f64;
    ans[(1, 3)] = h.quatern_y as f64;
    ans[(2, 3)] = h.quatern_z as f64;
    ans
}

/// 构造一个只有缩放与平移的仿射矩阵.
pub fn diagonal(spacing: [f64; 3], origin: Point3) -> Affine {
    let mut ans = Affine::identity();
    for i in 0..3 {
        ans[(i, i)] = spacing[i];
        ans[(i, 3)] = origin[i];
    }
    ans
}

/// 求逆. 若矩阵奇异则返回 `Err`.
pub fn invert(a: &Affine) -> Result<Affine> {
    a.try_inverse().ok_or(Error::SingularAffine)
}

/// 用 `a` 变换点 `p`.
#[inline]
pub fn transform_point(a: &Affine, p: Point3) -> Point3 {
    let v = a * Vector4::new(p[0], p[1], p[2], 1.0);
    [v[0], v[1], v[2]]
}

/// 矩阵的 3x3 线性部分各列的长度, 即各体素轴在世界空间中的间距.
pub fn voxel_sizes(a: &Affine) -> [f64; 3] {
    [0, 1, 2].map(|c| a.fixed_view::<3, 1>(0, c).norm())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn near(a: Point3, b: Point3) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn test_pixdim_fallback() {
        let mut h = NiftiHeader::default();
        h.sform_code = 0;
        h.qform_code = 0;
        h.pixdim = [1.0, 2.0, 3.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let a = from_header(&h);
        assert!(near(transform_point(&a, [1.0, 1.0, 1.0]), [2.0, 3.0, 1.0]));
    }

    #[test]
    fn test_negative_pixdim_taken_as_abs() {
        let mut h = NiftiHeader::default();
        h.sform_code = 0;
        h.qform_code = 0;
        h.pixdim = [1.0, -2.0, 3.0, -0.5, 1.0, 1.0, 1.0, 1.0];
        let a = from_header(&h);
        assert!(near(voxel_sizes(&a), [2.0, 3.0, 0.5]));
        assert!(near(transform_point(&a, [1.0, 1.0, 2.0]), [2.0, 3.0, 1.0]));

        // qform 中 z 方向仍由 qfac 翻转, 与 pixdim[3] 的符号无关.
        h.qform_code = 1;
        h.pixdim = [-1.0, 1.0, 1.0, -2.0, 1.0, 1.0, 1.0, 1.0];
        let a = from_header(&h);
        assert!(near(transform_point(&a, [0.0, 0.0, 1.0]), [0.0, 0.0, -2.0]));
    }

    #[test]
    fn test_sform_preferred() {
        let mut h = NiftiHeader::default();
        h.sform_code = 1;
        h.qform_code = 1;
        h.srow_x = [-2.0, 0.0, 0.0, 90.0];
        h.srow_y = [0.0, 2.0, 0.0, -126.0];
        h.srow_z = [0.0, 0.0, 2.0, -72.0];
        let a = from_header(&h);
        assert!(near(transform_point(&a, [0.0, 0.0, 0.0]), [90.0, -126.0, -72.0]));
        assert!(near(transform_point(&a, [1.0, 1.0, 1.0]), [88.0, -124.0, -70.0]));
        assert!(near(voxel_sizes(&a), [2.0, 2.0, 2.0]));
    }

    #[test]
    fn test_qform_identity_rotation() {
        let mut h = NiftiHeader::default();
        h.sform_code = 0;
        h.qform_code = 1;
        h.quatern_b = 0.0;
        h.quatern_c = 0.0;
        h.quatern_d = 0.0;
        h.quatern_x = 10.0;
        h.quatern_y = 20.0;
        h.quatern_z = 30.0;
        h.pixdim = [-1.0, 1.0, 2.0, 3.0, 1.0, 1.0, 1.0, 1.0];
        let a = from_header(&h);
        // qfac = -1 翻转 z 方向.
        assert!(near(transform_point(&a, [1.0, 1.0, 1.0]), [11.0, 22.0, 27.0]));
    }

    #[test]
    fn test_qform_rotation_about_z() {
        // 绕 z 轴旋转 180 度: (b, c, d) = (0, 0, 1).
        let mut h = NiftiHeader::default();
        h.sform_code = 0;
        h.qform_code = 1;
        h.quatern_b = 0.0;
        h.quatern_c = 0.0;
        h.quatern_d = 1.0;
        h.quatern_x = 0.0;
        h.quatern_y = 0.0;
        h.quatern_z = 0.0;
        h.pixdim = [1.0; 8];
        let a = from_header(&h);
        assert!(near(transform_point(&a, [1.0, 2.0, 3.0]), [-1.0, -2.0, 3.0]));
    }

    #[test]
    fn test_invert() {
        let a = diagonal([2.0, 2.0, 4.0], [1.0, 2.0, 3.0]);
        let inv = invert(&a).unwrap();
        let p = [5.0, -3.0, 7.0];
        assert!(near(transform_point(&inv, transform_point(&a, p)), p));

        let singular = diagonal([0.0, 1.0, 1.0], [0.0; 3]);
        assert!(matches!(invert(&singular), Err(Error::SingularAffine)));
    }
}
