//! 动图: 把逐帧渲染的切片编码为 GIF.

use crate::{Error, Result};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// 按固定帧率播放的帧序列.
#[derive(Clone, Debug)]
pub struct Movie {
    fps: u32,
    frames: Vec<RgbImage>,
}

impl Movie {
    /// 创建空动图. `fps` 为 0 时返回 `Err`.
    pub fn new(fps: u32) -> Result<Self> {
        if fps == 0 {
            return Err(Error::InvalidArgument("fps must be positive".into()));
        }
        Ok(Self {
            fps,
            frames: Vec::new(),
        })
    }

    /// 帧率.
    #[inline]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// 帧数.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// 是否没有帧?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 追加一帧. 所有帧必须同尺寸, 否则返回 `Err`.
    pub fn push(&mut self, frame: RgbImage) -> Result<()> {
        if let Some(first) = self.frames.first() {
            if first.dimensions() != frame.dimensions() {
                let (w0, h0) = first.dimensions();
                let (w1, h1) = frame.dimensions();
                return Err(Error::ShapeMismatch(
                    (h0 as usize, w0 as usize),
                    (h1 as usize, w1 as usize),
                ));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    /// 编码为循环播放的 GIF 并写入 `path`. 没有帧时返回 `Err`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if self.frames.is_empty() {
            return Err(Error::EmptyData);
        }
        let path = path.as_ref();
        log::info!(
            "Writing {} ({} frames @ {} fps)",
            path.display(),
            self.frames.len(),
            self.fps
        );
        let mut encoder = GifEncoder::new(BufWriter::new(File::create(path)?));
        encoder.set_repeat(Repeat::Infinite)?;
        for frame in &self.frames {
            let rgba = DynamicImage::ImageRgb8(frame.clone()).into_rgba8();
            let delay = Delay::from_numer_denom_ms(1000, self.fps);
            encoder.encode_frame(Frame::from_parts(rgba, 0, 0, delay))?;
        }
        Ok(())
    }
}
