use super::func::{blend, mask, Background};
use crate::color::{colorize, ColorMap};
use crate::consts::{rgb, Rgb, DEFAULT_CLIM_PERCENTILES};
use crate::stats::percentiles;
use crate::{BBox, Error, Interp, MaskSlice, NiiVolume, Result, RgbSlice, ScalarSlice, Slicer, Window};

/// 图层掩膜之外的底色.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Backdrop {
    /// 黑色.
    #[default]
    Black,
    /// 白色.
    White,
}

impl Backdrop {
    /// 对应的颜色.
    #[inline]
    pub fn rgb(&self) -> Rgb {
        match self {
            Backdrop::Black => rgb::BLACK,
            Backdrop::White => rgb::WHITE,
        }
    }
}

/// 图层的显示参数. 所有字段都有默认值, 见 [`Default`] 实现.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayerOptions {
    /// 图像体素值的缩放系数.
    pub scale: f32,
    /// 4D 图像中使用的体积下标.
    pub volume: usize,
    /// 重采样插值方式.
    pub interp: Interp,
    /// 色表名字.
    pub cmap: String,
    /// 显式显示范围. 为 `None` 时按 `climp` 百分位数自动确定.
    pub clim: Option<(f32, f32)>,
    /// 自动显示范围使用的百分位数.
    pub climp: (f64, f64),
    /// 色条标签.
    pub label: String,
    /// 掩膜阈值, 严格大于该值的像素保留.
    pub mask_threshold: f32,
    /// 透明度窗口. 为 `None` 时取透明度图像的 2 与 98 百分位数.
    pub alpha_lim: Option<(f32, f32)>,
    /// 透明度图像的缩放系数.
    pub alpha_scale: f32,
    /// 透明度轴标签.
    pub alpha_label: String,
    /// 掩膜之外的底色.
    pub background: Backdrop,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            volume: 0,
            interp: Interp::Linear,
            cmap: "gist_gray".to_string(),
            clim: None,
            climp: DEFAULT_CLIM_PERCENTILES,
            label: String::new(),
            mask_threshold: 0.0,
            alpha_lim: None,
            alpha_scale: 1.0,
            alpha_label: String::new(),
            background: Backdrop::Black,
        }
    }
}

/// 透明度的来源.
#[derive(Clone, Debug)]
pub enum Alpha {
    /// 透明度图像, 重采样后经窗口缩放到 `[0, 1]`.
    Volume(NiiVolume),
    /// 处处相同的透明度, 位于 `[0, 1]`.
    Constant(f32),
}

#[derive(Clone, Debug)]
enum AlphaSource {
    Volume { image: NiiVolume, lim: Window },
    Constant(f32),
}

/// 构造 [`Layer`]. 通过 [`Layer::builder`] 获得.
#[derive(Clone, Debug)]
pub struct LayerBuilder {
    image: NiiVolume,
    mask: Option<NiiVolume>,
    alpha: Option<Alpha>,
    opts: LayerOptions,
}

impl LayerBuilder {
    /// 设置显示参数.
    pub fn options(mut self, opts: LayerOptions) -> Self {
        self.opts = opts;
        self
    }

    /// 附加掩膜图像.
    pub fn mask(mut self, mask: NiiVolume) -> Self {
        self.mask = Some(mask);
        self
    }

    /// 附加透明度来源.
    pub fn alpha(mut self, alpha: Alpha) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// 完成构造, 必要时计算显示范围与透明度窗口.
    ///
    /// 以下情况返回 `Err`: 色表未知; `volume` 越界; 掩膜全零或与图像形状不一致;
    /// 常数透明度不在 `[0, 1]` 内.
    pub fn build(self) -> Result<Layer> {
        let Self {
            image,
            mask,
            alpha,
            opts,
        } = self;
        let cmap = ColorMap::new(&opts.cmap)?;
        if opts.volume >= image.n_volumes() {
            return Err(Error::VolumeOutOfRange(opts.volume, image.n_volumes()));
        }

        let bbox = match &mask {
            Some(m) => BBox::from_mask(m, 0.0)?,
            None => BBox::from_volume(&image),
        };

        let clim = match opts.clim {
            Some(clim) => Window::from(clim),
            None => {
                let values = image.masked_values(opts.volume, mask.as_ref())?;
                let (lo, hi) = opts.climp;
                let [lo, hi] = percentiles(values, [lo, hi])?;
                let clim = Window::from((lo * opts.scale, hi * opts.scale));
                log::info!(
                    "Auto limits for layer `{}`: [{}, {}]",
                    opts.label,
                    clim.lower_bound(),
                    clim.upper_bound()
                );
                clim
            }
        };

        let alpha = match alpha {
            None => None,
            Some(Alpha::Constant(a)) => {
                if !(0.0..=1.0).contains(&a) {
                    return Err(Error::InvalidArgument(format!("constant alpha {a} not in [0, 1]")));
                }
                Some(AlphaSource::Constant(a))
            }
            Some(Alpha::Volume(image)) => {
                let lim = match opts.alpha_lim {
                    Some(lim) => Window::from(lim),
                    None => {
                        let values = image.volume(0)?.iter().copied().collect::<Vec<_>>();
                        let [lo, hi] = percentiles(values, [2.0, 98.0])?;
                        Window::from((lo * opts.alpha_scale, hi * opts.alpha_scale))
                    }
                };
                Some(AlphaSource::Volume { image, lim })
            }
        };

        Ok(Layer {
            image,
            mask,
            alpha,
            cmap,
            clim,
            bbox,
            opts,
        })
    }
}

/// 图层: 一张图像, 及其可选的掩膜、透明度来源与显示参数.
#[derive(Clone, Debug)]
pub struct Layer {
    image: NiiVolume,
    mask: Option<NiiVolume>,
    alpha: Option<AlphaSource>,
    cmap: ColorMap,
    clim: Window,
    bbox: BBox,
    opts: LayerOptions,
}

impl Layer {
    /// 以 `image` 为底开始构造图层.
    pub fn builder(image: NiiVolume) -> LayerBuilder {
        LayerBuilder {
            image,
            mask: None,
            alpha: None,
            opts: LayerOptions::default(),
        }
    }

    /// 图层图像.
    #[inline]
    pub fn image(&self) -> &NiiVolume {
        &self.image
    }

    /// 显示参数.
    #[inline]
    pub fn options(&self) -> &LayerOptions {
        &self.opts
    }

    /// 色表.
    #[inline]
    pub fn cmap(&self) -> &ColorMap {
        &self.cmap
    }

    /// 显示范围.
    #[inline]
    pub fn clim(&self) -> Window {
        self.clim
    }

    /// 色条标签.
    #[inline]
    pub fn label(&self) -> &str {
        &self.opts.label
    }

    /// 透明度轴标签.
    #[inline]
    pub fn alpha_label(&self) -> &str {
        &self.opts.alpha_label
    }

    /// 有掩膜时为掩膜非零区域的包围盒, 否则为整个图像的包围盒.
    #[inline]
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// 是否有透明度来源 (图像或常数)?
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    /// 透明度图像的窗口. 没有透明度图像时返回 `None`.
    pub fn alpha_lim(&self) -> Option<Window> {
        match &self.alpha {
            Some(AlphaSource::Volume { lim, .. }) => Some(*lim),
            _ => None,
        }
    }

    /// 当前使用的体积下标.
    #[inline]
    pub fn volume(&self) -> usize {
        self.opts.volume
    }

    /// 切换到第 `t` 个体积, 显示范围不变. 越界时返回 `Err`.
    pub fn set_volume(&mut self, t: usize) -> Result<()> {
        if t >= self.image.n_volumes() {
            return Err(Error::VolumeOutOfRange(t, self.image.n_volumes()));
        }
        self.opts.volume = t;
        Ok(())
    }

    /// 图像的切片, 已乘以 `scale`.
    pub fn get_slice(&self, slicer: &Slicer) -> Result<ScalarSlice> {
        slicer.sample(&self.image, self.opts.interp, self.opts.scale, self.opts.volume)
    }

    /// 着色后的切片.
    pub fn get_color(&self, slicer: &Slicer) -> Result<RgbSlice> {
        let slice = self.get_slice(slicer)?;
        let clim = (self.clim.lower_bound(), self.clim.upper_bound());
        Ok(colorize(&slice, &self.cmap, Some(clim)))
    }

    /// 掩膜切片.
    ///
    /// 有掩膜图像时, 以最近邻重采样并与阈值比较; 否则阈值非零时比较图像切片本身;
    /// 都没有时返回 `None`.
    pub fn get_mask(&self, slicer: &Slicer) -> Result<Option<MaskSlice>> {
        let threshold = self.opts.mask_threshold;
        if let Some(m) = &self.mask {
            let slice = slicer.sample(m, Interp::Nearest, 1.0, 0)?;
            Ok(Some(slice.gt(threshold)))
        } else if threshold != 0.0 {
            Ok(Some(self.get_slice(slicer)?.gt(threshold)))
        } else {
            Ok(None)
        }
    }

    /// 透明度切片, 取值 `[0, 1]`. 没有透明度来源时返回 `None`.
    pub fn get_alpha(&self, slicer: &Slicer) -> Result<Option<ScalarSlice>> {
        match &self.alpha {
            None => Ok(None),
            Some(AlphaSource::Constant(a)) => Ok(Some(ScalarSlice::filled(slicer.dims(), *a))),
            Some(AlphaSource::Volume { image, lim }) => {
                let slice = slicer.sample(image, self.opts.interp, self.opts.alpha_scale, 0)?;
                Ok(Some(slice.scale_clip(*lim)))
            }
        }
    }

    /// 单独渲染该图层: 着色切片, 掩膜之外填充底色.
    pub fn render(&self, slicer: &Slicer) -> Result<RgbSlice> {
        let color = self.get_color(slicer)?;
        let m = self.get_mask(slicer)?;
        mask(&color, m.as_ref(), Background::Color(self.opts.background.rgb()))
    }
}

/// 把多个图层合成为一张 RGB 切片.
///
/// 第 0 层着色后对黑色做掩膜. 之后每层: 有透明度时按透明度 (再乘以该层掩膜) 混合到结果上;
/// 没有透明度时, 在掩膜为真处 (无掩膜则处处) 覆盖结果.
///
/// `layers` 为空时返回 `Err`.
pub fn blend_layers(layers: &[Layer], slicer: &Slicer) -> Result<RgbSlice> {
    let (first, rest) = layers
        .split_first()
        .ok_or_else(|| Error::InvalidArgument("no layers to blend".into()))?;
    let base_mask = first.get_mask(slicer)?;
    let mut slc = mask(&first.get_color(slicer)?, base_mask.as_ref(), Background::Color(rgb::BLACK))?;

    for layer in rest {
        let color = layer.get_color(slicer)?;
        let layer_mask = layer.get_mask(slicer)?;
        slc = match layer.get_alpha(slicer)? {
            Some(alpha) => {
                let alpha = match &layer_mask {
                    Some(m) => alpha.masked(m)?,
                    None => alpha,
                };
                blend(&slc, &color, &alpha)?
            }
            None => mask(&color, layer_mask.as_ref(), Background::Image(&slc))?,
        };
    }
    Ok(slc)
}
