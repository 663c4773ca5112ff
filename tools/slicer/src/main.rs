//! 把底图与可选的叠加层切片, 拼成一张 PNG 图.

mod runner;

use clap::Parser;
use nii_berry::consts::{rgb, Rgb};
use nii_berry::render::BarPos;
use nii_berry::{Axis, Point3};
use std::path::PathBuf;
use std::process::ExitCode;
use utils::args::CommonArgs;
use utils::parse;

/// 命令行参数.
#[derive(Parser, Debug)]
#[command(version, about = "Slice a NIfTI image (and overlay) into a montage")]
pub struct Args {
    #[command(flatten)]
    pub common: CommonArgs,

    /// 输出图片路径
    pub output: PathBuf,

    /// 行数
    #[arg(long, default_value_t = 4)]
    pub slice_rows: usize,

    /// 列数
    #[arg(long, default_value_t = 5)]
    pub slice_cols: usize,

    /// 切片法向轴
    #[arg(long, default_value = "z", value_parser = parse::<Axis>)]
    pub slice_axis: Axis,

    /// 沿法向轴取切片的比例范围
    #[arg(long, num_args = 2, value_names = ["LO", "HI"], default_values_t = [0.1, 0.9])]
    pub slice_lims: Vec<f64>,

    /// 过包围盒中心的 x, y, z 三个切片
    #[arg(long, conflicts_with = "timeseries")]
    pub three_axis: bool,

    /// 同一切片穿过时间序列的每个体积
    #[arg(long)]
    pub timeseries: bool,

    /// 使用时间序列中的第几个体积
    #[arg(long, default_value_t = 0)]
    pub volume: usize,

    /// 先填满一列再换列
    #[arg(long)]
    pub transpose: bool,

    /// 色条位置 (bottom / right)
    #[arg(long, default_value = "bottom", value_parser = parse::<BarPos>)]
    pub bar_pos: BarPos,

    /// 在叠加层透明度的这些取值处画等值线, 可重复
    #[arg(long, allow_negative_numbers = true)]
    pub contour: Vec<f32>,

    /// 等值线颜色, 可重复, 按等值线循环使用
    #[arg(long, default_value = "black", value_parser = parse_color)]
    pub contour_color: Vec<Rgb>,

    /// 每个格子的边长 (像素)
    #[arg(long, default_value_t = 256)]
    pub tile_size: u32,

    /// 在该世界坐标处画十字准线
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    pub crosshairs: Option<Vec<f64>>,

    /// 标题, 只写入日志
    #[arg(long)]
    pub title: Option<String>,
}

impl Args {
    /// 十字准线位置.
    pub fn crosshair_point(&self) -> Option<Point3> {
        match self.crosshairs.as_deref() {
            Some(&[x, y, z]) => Some([x, y, z]),
            _ => None,
        }
    }
}

fn parse_color(s: &str) -> Result<Rgb, String> {
    rgb::parse(s).ok_or_else(|| format!("unknown color `{s}`"))
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = utils::init_logger() {
        eprintln!("{e}");
    }
    match runner::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
