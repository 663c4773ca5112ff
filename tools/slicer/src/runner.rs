//! 程序运行函数.

use crate::Args;
use nii_berry::compose::contour::{draw_contours, valid_levels};
use nii_berry::consts::BAR_STEPS;
use nii_berry::render::{alphabar, colorbar, tick_labels, Figure, FigureOptions, Tile};
use nii_berry::{blend_layers, Axis, BBox, Layer, Result, RgbSlice, Slicer, Window};

/// 一个格子对应的切片: 法向轴、世界坐标位置、底图体积下标.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Cut {
    pub axis: Axis,
    pub pos: f64,
    pub volume: usize,
}

/// 计算布局 `(行, 列)` 以及每个格子的切片.
pub(crate) fn plan(args: &Args, bbox: &BBox, n_volumes: usize) -> (usize, usize, Vec<Cut>) {
    let center = bbox.center();
    if args.three_axis {
        let cuts = Axis::ALL
            .iter()
            .map(|&axis| Cut {
                axis,
                pos: center[axis.index()],
                volume: args.volume,
            })
            .collect();
        return (1, 3, cuts);
    }

    let axis = args.slice_axis;
    if args.timeseries {
        let rows = args.slice_rows.clamp(1, n_volumes.max(1));
        let cols = n_volumes.div_ceil(rows).max(1);
        let cuts = (0..n_volumes)
            .map(|volume| Cut {
                axis,
                pos: center[axis.index()],
                volume,
            })
            .collect();
        return (rows, cols, cuts);
    }

    let (lo, hi) = utils::pair(&Some(args.slice_lims.clone())).unwrap_or((0.1, 0.9));
    let total = args.slice_rows * args.slice_cols;
    let cuts = bbox
        .slice_positions(total, lo, hi)
        .into_iter()
        .map(|p| Cut {
            axis,
            pos: p[axis.index()],
            volume: args.volume,
        })
        .collect();
    (args.slice_rows, args.slice_cols, cuts)
}

/// 在叠加层透明度上绘制等值线. 没有叠加层或透明度时不绘制.
fn overlay_contours(args: &Args, layers: &[Layer], slicer: &Slicer, img: &mut RgbSlice) -> Result<()> {
    let Some(overlay) = layers.get(1) else {
        return Ok(());
    };
    let Some(alpha) = overlay.get_alpha(slicer)? else {
        return Ok(());
    };
    let window = overlay.alpha_lim().unwrap_or(Window::unit());
    let levels = valid_levels(&alpha, &args.contour, window);
    let n = draw_contours(img, &alpha, &levels, &args.contour_color);
    log::debug!("{} contour segments at {levels:?}", n);
    Ok(())
}

fn log_ticks(name: &str, clim: Window, label: &str) {
    let (lo, mid, hi) = tick_labels(clim, label);
    log::info!("{name}: {lo} [{mid}] {hi}");
}

/// 生成色条. 没有任何标签时返回 `None`.
///
/// 叠加层有透明度图像时生成双轴色条, 等值线水平画在透明度轴上;
/// 否则给出底图色表时为底图色条, 再否则为叠加层色条.
pub(crate) fn make_bar(args: &Args, layers: &[Layer]) -> Result<Option<RgbSlice>> {
    let common = &args.common;
    if common.base_label.is_none() && common.overlay_label.is_none() {
        return Ok(None);
    }
    let orient = args.bar_pos.bar_orient();
    let overlay = layers.get(1);

    if let Some((layer, alim)) = overlay.and_then(|l| l.alpha_lim().map(|a| (l, a))) {
        log_ticks("Color axis", layer.clim(), layer.label());
        log_ticks("Alpha axis", alim, layer.alpha_label());
        let bar = alphabar(layer.cmap(), layer.clim(), alim, &args.contour, orient, BAR_STEPS)?;
        return Ok(Some(bar));
    }

    let layer = match overlay {
        Some(l) if common.base_map.is_none() => l,
        _ => &layers[0],
    };
    log_ticks("Color bar", layer.clim(), layer.label());
    Ok(Some(colorbar(layer.cmap(), layer.clim(), orient, BAR_STEPS)))
}

/// 实际运行.
pub fn run(args: &Args) -> Result<()> {
    let common = &args.common;
    utils::sep();
    let mut layers = common.build_layers(args.volume)?;
    let bbox = layers[0].bbox();
    log::info!("{bbox}");

    let (rows, cols, cuts) = plan(args, &bbox, layers[0].image().n_volumes());
    log::info!("{} slices in {rows} rows and {cols} columns", cuts.len());
    let mut figure = Figure::new(FigureOptions {
        rows,
        cols,
        transpose: args.transpose,
        tile_size: args.tile_size,
        filter: common.interp,
        bar_pos: args.bar_pos,
        ..Default::default()
    })?;

    utils::sep();
    log::info!("Slicing");
    let crosshair = args.crosshair_point();
    for cut in &cuts {
        layers[0].set_volume(cut.volume)?;
        let slicer = Slicer::new(&bbox, cut.pos, cut.axis, common.samples, common.orient)?;
        log::debug!("{} = {:.2}, volume {}", cut.axis, cut.pos, cut.volume);
        let mut img = blend_layers(&layers, &slicer)?;
        if !args.contour.is_empty() {
            overlay_contours(args, &layers, &slicer, &mut img)?;
        }
        let mut tile = Tile::new(img, common.orient);
        if let Some(p) = crosshair {
            tile = tile.with_crosshair(p, &slicer);
        }
        figure.push(tile)?;
    }

    if let Some(bar) = make_bar(args, &layers)? {
        figure.set_bar(bar);
    }
    if let Some(title) = &args.title {
        log::info!("Title: {title}");
    }

    utils::sep();
    figure.save(&args.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use nii_berry::compose::{Alpha, LayerOptions};
    use nii_berry::{affine, NiiVolume};
    use ndarray::{Array3, Array4};
    use nifti::writer::WriterOptions;
    use std::path::Path;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["nii-slicer", "base.nii.gz", "out.png"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn cube() -> BBox {
        BBox::from_corners([0.0; 3], [10.0; 3])
    }

    fn ramp() -> NiiVolume {
        let data = Array3::from_shape_fn((8, 8, 8), |(x, _, _)| x as f32);
        NiiVolume::from_array(data, affine::diagonal([1.0; 3], [0.0; 3])).unwrap()
    }

    #[test]
    fn test_plan_montage() {
        let a = args(&["--slice-rows", "2", "--slice-cols", "3", "--slice-axis", "y"]);
        let (rows, cols, cuts) = plan(&a, &cube(), 1);
        assert_eq!((rows, cols), (2, 3));
        assert_eq!(cuts.len(), 6);
        assert!(cuts.iter().all(|c| c.axis == Axis::Y && c.volume == 0));
        assert!((cuts[0].pos - 1.0).abs() < 1e-9);
        assert!((cuts[5].pos - 9.0).abs() < 1e-9);
        assert!(cuts.windows(2).all(|w| w[0].pos < w[1].pos));
    }

    #[test]
    fn test_plan_three_axis() {
        let a = args(&["--three-axis", "--volume", "2"]);
        let (rows, cols, cuts) = plan(&a, &cube(), 4);
        assert_eq!((rows, cols), (1, 3));
        let axes: Vec<_> = cuts.iter().map(|c| c.axis).collect();
        assert_eq!(axes, Axis::ALL.to_vec());
        assert!(cuts.iter().all(|c| c.pos == 5.0 && c.volume == 2));
    }

    #[test]
    fn test_plan_timeseries() {
        let a = args(&["--timeseries"]);
        let (rows, cols, cuts) = plan(&a, &cube(), 7);
        assert_eq!((rows, cols), (4, 2));
        assert_eq!(cuts.iter().map(|c| c.volume).collect::<Vec<_>>(), (0..7).collect::<Vec<_>>());
        assert!(cuts.iter().all(|c| c.pos == 5.0 && c.axis == Axis::Z));

        let (rows, cols, _) = plan(&a, &cube(), 2);
        assert_eq!((rows, cols), (2, 1));
    }

    #[test]
    fn test_args_parse() {
        let a = args(&[
            "--contour",
            "0.5",
            "--contour",
            "0.9",
            "--contour-color",
            "r",
            "--crosshairs",
            "1",
            "-2",
            "3",
            "--bar-pos",
            "right",
        ]);
        assert_eq!(a.contour, vec![0.5, 0.9]);
        assert_eq!(a.contour_color, vec![[1.0, 0.0, 0.0]]);
        assert_eq!(a.crosshair_point(), Some([1.0, -2.0, 3.0]));
        assert_eq!(a.bar_pos, nii_berry::render::BarPos::Right);

        let d = args(&[]);
        assert_eq!(d.contour_color, vec![[0.0, 0.0, 0.0]]);
        assert_eq!(d.slice_lims, vec![0.1, 0.9]);
        assert!(Args::try_parse_from(["nii-slicer", "b.nii", "o.png", "--three-axis", "--timeseries"]).is_err());
    }

    #[test]
    fn test_bar_selection() {
        let base = Layer::builder(ramp()).build().unwrap();

        // 没有标签时没有色条
        assert!(make_bar(&args(&[]), &[base.clone()]).unwrap().is_none());

        let bar = make_bar(&args(&["--base-label", "T1"]), &[base.clone()])
            .unwrap()
            .unwrap();
        assert_eq!(bar.shape(), (BAR_STEPS, BAR_STEPS));

        let alpha = NiiVolume::from_array4(
            Array4::from_shape_fn((8, 8, 8, 1), |(x, _, _, _)| x as f32),
            affine::diagonal([1.0; 3], [0.0; 3]),
        )
        .unwrap();
        let overlay = Layer::builder(ramp())
            .options(LayerOptions {
                cmap: "RdYlBu_r".into(),
                alpha_lim: Some((0.0, 7.0)),
                ..Default::default()
            })
            .alpha(Alpha::Volume(alpha))
            .build()
            .unwrap();
        let a = args(&["--overlay-label", "beta"]);
        let bar = make_bar(&a, &[base.clone(), overlay]).unwrap().unwrap();
        // 双轴色条: 透明度为 0 的一行是白色
        assert_eq!(bar.pixel((0, 0)), Some([1.0, 1.0, 1.0]));

        let constant = Layer::builder(ramp()).alpha(Alpha::Constant(0.5)).build().unwrap();
        let bar = make_bar(&a, &[base, constant]).unwrap().unwrap();
        assert_ne!(bar.pixel((0, 0)), Some([1.0, 1.0, 1.0]));
    }

    /// 把 3D 数据写成 nii 文件, 返回路径文本.
    fn write_nii(dir: &Path, name: &str, data: &Array3<f32>) -> String {
        let path = dir.join(name);
        WriterOptions::new(&path).write_nifti(data).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn run_with(argv: &[&str]) -> image::RgbImage {
        let a = Args::try_parse_from(argv.iter().copied()).unwrap();
        run(&a).unwrap();
        image::open(&a.output).unwrap().into_rgb8()
    }

    fn count(img: &image::RgbImage, x_end: u32, color: [u8; 3]) -> usize {
        img.enumerate_pixels()
            .filter(|(x, _, p)| *x < x_end && p.0 == color)
            .count()
    }

    #[test]
    fn test_run_montage_with_bar() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_nii(dir.path(), "base.nii", &Array3::from_shape_fn((8, 8, 8), |(x, _, _)| x as f32));
        let out = dir.path().join("montage.png");
        let img = run_with(&[
            "nii-slicer",
            base.as_str(),
            out.to_str().unwrap(),
            "--slice-rows",
            "2",
            "--slice-cols",
            "3",
            "--tile-size",
            "32",
            "--base-label",
            "T1",
        ]);
        // 色条区域厚度为 max(32 / 4, 4) * 2
        assert_eq!(img.dimensions(), (96, 64 + 16));
    }

    #[test]
    fn test_run_three_axis_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path();
        let base = write_nii(p, "base.nii", &Array3::from_elem((8, 8, 8), 1.0));
        let overlay = write_nii(p, "beta.nii", &Array3::from_elem((8, 8, 8), 1.0));
        let alpha = write_nii(p, "alpha.nii", &Array3::from_shape_fn((8, 8, 8), |(x, _, _)| x as f32));
        let out = p.join("three.png");
        let mut argv: Vec<&str> = vec![
            "nii-slicer",
            base.as_str(),
            out.to_str().unwrap(),
            "--three-axis",
            "--base-lims",
            "0",
            "2",
            "--overlay",
            overlay.as_str(),
            "--overlay-map",
            "gray",
            "--overlay-lim",
            "0",
            "2",
            "--overlay-alpha",
            alpha.as_str(),
            "--overlay-label",
            "beta",
            "--samples",
            "8",
            "--tile-size",
            "32",
            "--interp",
            "nearest",
            "--bar-pos",
            "right",
        ];
        let plain = run_with(&argv);
        assert_eq!(plain.dimensions(), (96 + 16, 32));
        assert_eq!(count(&plain, 96, [255, 0, 0]), 0);
        assert_eq!(count(&plain, 96, [0, 128, 0]), 0);

        argv.extend_from_slice(&["--contour", "3.5", "--contour-color", "r", "--crosshairs", "4", "4", "4"]);
        let marked = run_with(&argv);
        assert_eq!(marked.dimensions(), (96 + 16, 32));
        // 等值线只出现在 y, z 两个切片上 (x 切片的透明度为常数), 每条至少纵贯一个格子
        assert!(count(&marked, 96, [255, 0, 0]) >= 2 * 32 - 4);
        // 每个格子都有一横一竖两条十字准线
        assert!(count(&marked, 96, [0, 128, 0]) >= 3 * 32);
    }

    #[test]
    fn test_run_timeseries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.nii");
        let data = Array4::from_shape_fn((8, 8, 8, 3), |(_, _, _, t)| t as f32);
        WriterOptions::new(&path).write_nifti(&data).unwrap();
        let out = dir.path().join("series.png");
        let img = run_with(&[
            "nii-slicer",
            path.to_str().unwrap(),
            out.to_str().unwrap(),
            "--timeseries",
            "--base-lims",
            "0",
            "2",
            "--samples",
            "8",
            "--tile-size",
            "8",
            "--interp",
            "nearest",
        ]);
        // 3 个体积, 默认 4 行, 收缩为 3 行 1 列
        assert_eq!(img.dimensions(), (8, 24));
        for t in 0..3u32 {
            let v = img.get_pixel(4, 8 * t + 4).0[0] as f32;
            assert!((v - t as f32 * 127.5).abs() <= 1.0, "volume {t}: {v}");
        }
    }
}
