//! 各工具共用的命令行参数, 以及由参数构建图层.

use crate::{pair, parse};
use clap::Args;
use nii_berry::compose::{Alpha, Layer, LayerOptions};
use nii_berry::consts::{DEFAULT_CLIM_PERCENTILES, DEFAULT_SAMPLES};
use nii_berry::render::Filter;
use nii_berry::{Interp, NiiVolume, Orient};
use std::path::{Path, PathBuf};

/// 底图、叠加层与采样相关的公共参数.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// 底图 (结构像) 路径
    pub base_image: PathBuf,

    /// 底图掩膜, 同时决定包围盒
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// 底图色表
    #[arg(long)]
    pub base_map: Option<String>,

    /// 底图显示范围
    #[arg(long, num_args = 2, value_names = ["LO", "HI"], allow_negative_numbers = true)]
    pub base_lims: Option<Vec<f32>>,

    /// 未给出显示范围时使用的百分位数
    #[arg(long, num_args = 2, value_names = ["LO", "HI"], default_values_t = [DEFAULT_CLIM_PERCENTILES.0, DEFAULT_CLIM_PERCENTILES.1])]
    pub base_lims_p: Vec<f64>,

    /// 底图体素值缩放系数
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub base_scale: f32,

    /// 底图色条标签
    #[arg(long)]
    pub base_label: Option<String>,

    /// 叠加层图像
    #[arg(long)]
    pub overlay: Option<PathBuf>,

    /// 叠加层体素值缩放系数
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub overlay_scale: f32,

    /// 叠加层色表
    #[arg(long, default_value = "RdYlBu_r")]
    pub overlay_map: String,

    /// 叠加层显示范围
    #[arg(long, num_args = 2, value_names = ["LO", "HI"], allow_negative_numbers = true)]
    pub overlay_lim: Option<Vec<f32>>,

    /// 叠加层掩膜
    #[arg(long)]
    pub overlay_mask: Option<PathBuf>,

    /// 叠加层掩膜阈值
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub overlay_mask_thresh: f32,

    /// 叠加层透明度: 图像路径, 或 [0, 1] 内的常数
    #[arg(long)]
    pub overlay_alpha: Option<String>,

    /// 透明度图像缩放系数
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub overlay_alpha_scale: f32,

    /// 透明度窗口
    #[arg(long, num_args = 2, value_names = ["LO", "HI"], allow_negative_numbers = true)]
    pub overlay_alpha_lim: Option<Vec<f32>>,

    /// 叠加层色条标签
    #[arg(long)]
    pub overlay_label: Option<String>,

    /// 透明度轴标签
    #[arg(long)]
    pub overlay_alpha_label: Option<String>,

    /// 切片水平方向的采样点数
    #[arg(long, default_value_t = DEFAULT_SAMPLES)]
    pub samples: usize,

    /// 显示缩放滤波器 (nearest / linear / cubic / gaussian / lanczos)
    #[arg(long, default_value = "lanczos", value_parser = parse::<Filter>)]
    pub interp: Filter,

    /// 重采样插值阶数 (0 或 1)
    #[arg(long, default_value_t = 1)]
    pub interp_order: u32,

    /// 朝向约定 (clin / preclin)
    #[arg(long, default_value = "clin", value_parser = parse::<Orient>)]
    pub orient: Orient,
}

/// `--overlay-alpha` 的解析: 已存在的文件视为透明度图像, 否则尝试解析为常数.
fn alpha_source(arg: &str) -> nii_berry::Result<Alpha> {
    let path = Path::new(arg);
    if path.is_file() {
        log::info!("Loading alpha image: {}", path.display());
        return Ok(Alpha::Volume(NiiVolume::open(path)?));
    }
    arg.trim()
        .parse::<f32>()
        .map(Alpha::Constant)
        .map_err(|_| nii_berry::Error::InvalidArgument(format!("`{arg}` is neither a file nor a number")))
}

fn open_optional(path: &Option<PathBuf>) -> nii_berry::Result<Option<NiiVolume>> {
    path.as_ref().map(NiiVolume::open).transpose()
}

impl CommonArgs {
    /// 插值方式.
    pub fn interp_kind(&self) -> nii_berry::Result<Interp> {
        Interp::from_order(self.interp_order)
    }

    /// 底图的显示参数.
    pub fn base_options(&self, volume: usize) -> nii_berry::Result<LayerOptions> {
        let (lo, hi) = pair(&Some(self.base_lims_p.clone())).unwrap_or(DEFAULT_CLIM_PERCENTILES);
        Ok(LayerOptions {
            scale: self.base_scale,
            volume,
            interp: self.interp_kind()?,
            cmap: self.base_map.clone().unwrap_or_else(|| "gist_gray".to_string()),
            clim: pair(&self.base_lims),
            climp: (lo, hi),
            label: self.base_label.clone().unwrap_or_default(),
            ..Default::default()
        })
    }

    /// 叠加层的显示参数.
    pub fn overlay_options(&self) -> nii_berry::Result<LayerOptions> {
        Ok(LayerOptions {
            scale: self.overlay_scale,
            interp: self.interp_kind()?,
            cmap: self.overlay_map.clone(),
            clim: pair(&self.overlay_lim),
            label: self.overlay_label.clone().unwrap_or_default(),
            mask_threshold: self.overlay_mask_thresh,
            alpha_lim: pair(&self.overlay_alpha_lim),
            alpha_scale: self.overlay_alpha_scale,
            alpha_label: self.overlay_alpha_label.clone().unwrap_or_default(),
            ..Default::default()
        })
    }

    /// 读取图像并构建图层: 第 0 层为底图, 有叠加层时为第 1 层.
    pub fn build_layers(&self, volume: usize) -> nii_berry::Result<Vec<Layer>> {
        log::info!("Loading base image: {}", self.base_image.display());
        let mut base = Layer::builder(NiiVolume::open(&self.base_image)?)
            .options(self.base_options(volume)?);
        if let Some(mask) = open_optional(&self.mask)? {
            base = base.mask(mask);
        }
        let base = base.build()?;
        log::info!(
            "Base limits: [{}, {}]",
            base.clim().lower_bound(),
            base.clim().upper_bound()
        );
        let mut layers = vec![base];

        if let Some(overlay) = &self.overlay {
            log::info!("Loading overlay: {}", overlay.display());
            let mut layer = Layer::builder(NiiVolume::open(overlay)?).options(self.overlay_options()?);
            if let Some(mask) = open_optional(&self.overlay_mask)? {
                layer = layer.mask(mask);
            }
            if let Some(alpha) = &self.overlay_alpha {
                layer = layer.alpha(alpha_source(alpha)?);
            }
            layers.push(layer.build()?);
        }
        Ok(layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        common: CommonArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["t", "base.nii.gz"]).unwrap();
        let c = cli.common;
        assert_eq!(c.base_image, PathBuf::from("base.nii.gz"));
        assert_eq!(c.samples, 128);
        assert_eq!(c.interp, Filter::Lanczos);
        assert_eq!(c.orient, Orient::Clinical);
        assert_eq!(c.base_lims_p, vec![2.0, 98.0]);
        assert_eq!(c.interp_kind().unwrap(), Interp::Linear);

        let opts = c.base_options(0).unwrap();
        assert_eq!(opts.cmap, "gist_gray");
        assert_eq!(opts.clim, None);
        assert_eq!(opts.climp, (2.0, 98.0));
    }

    #[test]
    fn test_overlay_flags() {
        let cli = Cli::try_parse_from([
            "t",
            "base.nii",
            "--overlay",
            "beta.nii",
            "--overlay-lim",
            "-2",
            "2",
            "--overlay-alpha",
            "0.4",
            "--interp",
            "hanning",
            "--interp-order",
            "0",
            "--orient",
            "preclin",
        ])
        .unwrap();
        let c = cli.common;
        assert_eq!(c.interp, Filter::Lanczos);
        assert_eq!(c.orient, Orient::Preclinical);
        let opts = c.overlay_options().unwrap();
        assert_eq!(opts.clim, Some((-2.0, 2.0)));
        assert_eq!(opts.interp, Interp::Nearest);
        assert_eq!(opts.cmap, "RdYlBu_r");
        assert!(matches!(alpha_source("0.4").unwrap(), Alpha::Constant(a) if a == 0.4));
        assert!(alpha_source("nonsense").is_err());

        assert!(Cli::try_parse_from(["t", "b.nii", "--orient", "upside"]).is_err());
    }
}
