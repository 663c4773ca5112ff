//! 沿一个轴逐层切片, 生成循环播放的 GIF.

use clap::Parser;
use nii_berry::render::{Figure, FigureOptions, Movie, Tile};
use nii_berry::{blend_layers, Axis, Error, Result, Slicer};
use std::path::PathBuf;
use std::process::ExitCode;
use utils::args::CommonArgs;
use utils::parse;

/// 命令行参数.
#[derive(Parser, Debug)]
#[command(version, about = "Scroll through a NIfTI image (and overlay) as an animated GIF")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// 输出 GIF 路径
    output: PathBuf,

    /// 帧数. -1 表示沿法向轴的体素数
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    slices: i64,

    /// 切片法向轴
    #[arg(long, default_value = "z", value_parser = parse::<Axis>)]
    slice_axis: Axis,

    /// 沿法向轴取切片的比例范围
    #[arg(long, num_args = 2, value_names = ["LO", "HI"], default_values_t = [0.01, 0.99])]
    slice_lims: Vec<f64>,

    /// 使用时间序列中的第几个体积
    #[arg(long, default_value_t = 0)]
    volume: usize,

    /// 帧率
    #[arg(long, default_value_t = 8)]
    fps: u32,

    /// 帧的长边 (像素)
    #[arg(long, default_value_t = 256)]
    tile_size: u32,
}

/// 帧数: 非负时即为 `slices`, 否则取 `shape` 沿 `axis` 的长度.
fn frame_count(slices: i64, shape: [usize; 3], axis: Axis) -> Result<usize> {
    let n = if slices < 0 {
        shape[axis.index()]
    } else {
        slices as usize
    };
    if n == 0 {
        return Err(Error::InvalidArgument("need at least one slice".into()));
    }
    Ok(n)
}

fn run(args: &Args) -> Result<()> {
    let common = &args.common;
    utils::sep();
    let layers = common.build_layers(args.volume)?;
    let bbox = layers[0].bbox();
    log::info!("{bbox}");

    let n = frame_count(args.slices, layers[0].image().shape_array(), args.slice_axis)?;
    let (lo, hi) = utils::pair(&Some(args.slice_lims.clone())).unwrap_or((0.01, 0.99));
    let positions = bbox.slice_positions(n, lo, hi);
    log::info!("{n} frames along {}", args.slice_axis);

    let opts = FigureOptions {
        rows: 1,
        cols: 1,
        tile_size: args.tile_size,
        filter: common.interp,
        ..Default::default()
    };
    let mut movie = Movie::new(args.fps)?;
    utils::sep();
    for p in positions {
        let pos = p[args.slice_axis.index()];
        log::debug!("Slice pos {pos:.2}");
        let slicer = Slicer::new(&bbox, pos, args.slice_axis, common.samples, common.orient)?;
        let mut frame = Figure::new(opts.clone())?;
        frame.push(Tile::new(blend_layers(&layers, &slicer)?, common.orient))?;
        movie.push(frame.render())?;
    }

    utils::sep();
    movie.save(&args.output)
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = utils::init_logger() {
        eprintln!("{e}");
    }
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifDecoder;
    use image::AnimationDecoder;
    use ndarray::Array3;
    use nifti::writer::WriterOptions;

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(-1, [4, 5, 6], Axis::Y).unwrap(), 5);
        assert_eq!(frame_count(12, [4, 5, 6], Axis::Y).unwrap(), 12);
        assert!(frame_count(0, [4, 5, 6], Axis::Z).is_err());
    }

    #[test]
    fn test_args_defaults() {
        let a = Args::try_parse_from(["nii-scroll", "base.nii", "out.gif"]).unwrap();
        assert_eq!(a.slices, -1);
        assert_eq!(a.slice_axis, Axis::Z);
        assert_eq!(a.slice_lims, vec![0.01, 0.99]);
        assert_eq!(a.fps, 8);

        let a = Args::try_parse_from(["nii-scroll", "base.nii", "out.gif", "--slices", "10", "--slice-axis", "x"])
            .unwrap();
        assert_eq!(a.slices, 10);
        assert_eq!(a.slice_axis, Axis::X);
    }

    #[test]
    fn test_run_writes_frames() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.nii");
        let data = Array3::from_shape_fn((8, 8, 6), |(x, _, z)| (x + z) as f32);
        WriterOptions::new(&base).write_nifti(&data).unwrap();
        let out = dir.path().join("scroll.gif");

        let a = Args::try_parse_from([
            "nii-scroll",
            base.to_str().unwrap(),
            out.to_str().unwrap(),
            "--tile-size",
            "16",
            "--fps",
            "4",
        ])
        .unwrap();
        run(&a).unwrap();

        let file = std::io::BufReader::new(std::fs::File::open(&out).unwrap());
        let frames = GifDecoder::new(file).unwrap().into_frames().collect_frames().unwrap();
        // 默认帧数为 z 方向的体素数
        assert_eq!(frames.len(), 6);
        assert!(frames.iter().all(|f| f.buffer().dimensions() == (16, 16)));
        let (num, den) = frames[0].delay().numer_denom_ms();
        assert_eq!(num as f64 / den as f64, 250.0);

        let a = Args::try_parse_from([
            "nii-scroll",
            base.to_str().unwrap(),
            out.to_str().unwrap(),
            "--slices",
            "3",
            "--slice-axis",
            "x",
            "--tile-size",
            "16",
        ])
        .unwrap();
        run(&a).unwrap();
        let file = std::io::BufReader::new(std::fs::File::open(&out).unwrap());
        let frames = GifDecoder::new(file).unwrap().into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 3);
        // x 切片为 y-z 平面, 宽 8 高 6, 长边缩放到 16
        assert_eq!(frames[0].buffer().dimensions(), (16, 16));
    }
}
