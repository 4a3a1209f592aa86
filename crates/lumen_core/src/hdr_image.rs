//! High dynamic range images for environment lighting.
//!
//! Pixels are stored as linear RGB. Rows are ordered bottom-up: `y = 0` is
//! the bottom row of the picture, which for an equirectangular environment
//! map is the direction straight down (polar angle π).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::codecs::hdr::HdrDecoder;
use image::DynamicImage;
use lumen_math::Spectrum;

use crate::error::{Result, SceneError};

/// A linear RGB float image.
#[derive(Clone, Debug)]
pub struct HdrImage {
    width: u32,
    height: u32,
    pixels: Vec<Spectrum>,
}

impl HdrImage {
    /// Create an image from bottom-up, row-major pixel data.
    ///
    /// # Panics
    /// If `pixels.len() != width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<Spectrum>) -> Self {
        assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize),
            "pixel count does not match {width}x{height}"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Spectrum) -> Self {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self::new(width, height, pixels)
    }

    /// Load an image file.
    ///
    /// Float formats (Radiance HDR, OpenEXR) are taken as linear; 8/16-bit
    /// formats are assumed sRGB-encoded and converted to linear.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image_err = |source: image::ImageError| SceneError::Image {
            path: path.to_path_buf(),
            source,
        };

        let is_radiance = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("hdr"));

        let (width, height, top_down) = if is_radiance {
            // image::open hands back 8-bit data for Radiance files
            let file = File::open(path).map_err(|source| SceneError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let decoder = HdrDecoder::new(BufReader::new(file)).map_err(image_err)?;
            let meta = decoder.metadata();
            let pixels: Vec<Spectrum> = decoder
                .read_image_hdr()
                .map_err(image_err)?
                .into_iter()
                .map(|p| Spectrum::new(p[0], p[1], p[2]))
                .collect();
            (meta.width, meta.height, pixels)
        } else {
            let img = image::open(path).map_err(image_err)?;
            (img.width(), img.height(), decode_linear(&img))
        };

        // Files store the top row first
        let mut pixels = Vec::with_capacity(top_down.len());
        for row in top_down.chunks_exact(width.max(1) as usize).rev() {
            pixels.extend_from_slice(row);
        }

        log::debug!(
            "Loaded image: {} ({}x{}, {:.1} KB)",
            path.display(),
            width,
            height,
            (pixels.len() * std::mem::size_of::<Spectrum>()) as f32 / 1024.0
        );

        Ok(Self::new(width, height, pixels))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// (width, height)
    pub fn dimension(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel at integer coordinates, `y = 0` being the bottom row.
    #[inline]
    pub fn at(&self, x: u32, y: u32) -> Spectrum {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn pixels(&self) -> &[Spectrum] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Multiply every pixel by `factor`.
    pub fn scale(&mut self, factor: f32) {
        for p in &mut self.pixels {
            *p *= factor;
        }
    }
}

/// Float formats pass through; 8/16-bit data is sRGB-decoded.
fn decode_linear(img: &DynamicImage) -> Vec<Spectrum> {
    match img {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => img
            .to_rgb32f()
            .pixels()
            .map(|p| Spectrum::new(p[0], p[1], p[2]))
            .collect(),
        _ => img
            .to_rgb8()
            .pixels()
            .map(|p| {
                Spectrum::new(
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                )
            })
            .collect(),
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
