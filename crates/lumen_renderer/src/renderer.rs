//! Full-frame rendering and image output.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use image::{ImageResult, Rgb, Rgb32FImage, RgbImage};
use rayon::prelude::*;

use crate::bucket::{generate_buckets, render_bucket, BucketResult};
use crate::pathtracer::Pathtracer;
use lumen_math::Spectrum;

/// Display gamma for 8-bit output.
const GAMMA: f32 = 2.2;

/// Apply display gamma to a linear value.
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.powf(1.0 / GAMMA)
    } else {
        0.0
    }
}

/// Convert linear radiance to 8-bit RGBA with gamma and clamping.
pub fn color_to_rgba(color: Spectrum) -> [u8; 4] {
    let quantize = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)).round() as u8;
    [quantize(color.r), quantize(color.g), quantize(color.b), 255]
}

/// Linear radiance image, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Spectrum>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Spectrum::ZERO; (width * height) as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Spectrum {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Spectrum) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Copy a finished bucket into place.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        let bucket = &result.bucket;
        for (i, &color) in result.pixels.iter().enumerate() {
            let local_x = i as u32 % bucket.width;
            let local_y = i as u32 / bucket.width;
            self.set(bucket.x + local_x, bucket.y + local_y, color);
        }
    }

    /// Gamma-corrected RGBA bytes, e.g. for display.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|&c| color_to_rgba(c)).collect()
    }

    /// Write the image. `.hdr` and `.exr` keep linear float radiance; every
    /// other format gets gamma-corrected 8-bit RGB.
    pub fn save(&self, path: impl AsRef<Path>) -> ImageResult<()> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("hdr") => {
                let file = std::fs::File::create(path)?;
                let pixels: Vec<Rgb<f32>> =
                    self.pixels.iter().map(|c| Rgb([c.r, c.g, c.b])).collect();
                image::codecs::hdr::HdrEncoder::new(std::io::BufWriter::new(file)).encode(
                    &pixels,
                    self.width as usize,
                    self.height as usize,
                )
            }
            Some("exr") => {
                let data = self.pixels.iter().flat_map(|c| [c.r, c.g, c.b]).collect();
                let buffer = Rgb32FImage::from_raw(self.width, self.height, data)
                    .ok_or_else(size_mismatch)?;
                buffer.save(path)
            }
            _ => {
                let data = self
                    .pixels
                    .iter()
                    .flat_map(|&c| {
                        let [r, g, b, _] = color_to_rgba(c);
                        [r, g, b]
                    })
                    .collect();
                let buffer =
                    RgbImage::from_raw(self.width, self.height, data).ok_or_else(size_mismatch)?;
                buffer.save(path)
            }
        }
    }
}

fn size_mismatch() -> image::ImageError {
    image::ImageError::Parameter(image::error::ParameterError::from_kind(
        image::error::ParameterErrorKind::DimensionMismatch,
    ))
}

/// Render the whole frame, buckets in parallel.
///
/// Uses a dedicated pool when `threads` is set in the config, otherwise
/// rayon's global pool.
pub fn render(tracer: &Pathtracer) -> ImageBuffer {
    let config = tracer.config();
    let threads = config.threads;

    if threads > 0 {
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => return pool.install(|| render_buckets(tracer)),
            Err(err) => log::warn!("Could not start {threads} render threads ({err}); using the global pool"),
        }
    }
    render_buckets(tracer)
}

fn render_buckets(tracer: &Pathtracer) -> ImageBuffer {
    let config = tracer.config();
    let buckets = generate_buckets(config.width, config.height, config.bucket_size);
    let total = buckets.len();

    log::info!(
        "Rendering {}x{} at {} spp, max depth {}: {} buckets on {} threads",
        config.width,
        config.height,
        config.samples_per_pixel,
        config.max_depth,
        total,
        rayon::current_num_threads()
    );

    let start = Instant::now();
    let completed = AtomicUsize::new(0);

    let results: Vec<BucketResult> = buckets
        .par_iter()
        .map(|bucket| {
            let result = render_bucket(bucket, tracer);

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            // Report each 10% step once
            if done * 10 / total != (done - 1) * 10 / total {
                log::info!("Progress: {}/{} buckets ({}%)", done, total, done * 100 / total);
            }
            result
        })
        .collect();

    let mut image = ImageBuffer::new(config.width, config.height);
    for result in &results {
        image.write_bucket(result);
    }

    log::info!("Render finished in {:.2?}", start.elapsed());
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::Bucket;
    use crate::camera::Camera;
    use crate::light::{EnvHemisphere, EnvLight};
    use crate::scene::Scene;
    use lumen_core::{HdrImage, RenderConfig};
    use lumen_math::Vec3;

    fn sky_tracer(threads: usize) -> Pathtracer {
        // Upper hemisphere lit, camera looking straight ahead: top half bright
        let env = EnvLight::Hemisphere(EnvHemisphere {
            radiance: Spectrum::ONE,
        });
        let config = RenderConfig {
            width: 20,
            height: 10,
            samples_per_pixel: 1,
            bucket_size: 4,
            seed: 3,
            threads,
            ..RenderConfig::default()
        };
        let camera = Camera::new()
            .with_position(Vec3::ZERO, -Vec3::Z, Vec3::Y)
            .with_aspect_ratio(config.aspect_ratio());
        Pathtracer::new(
            Scene::new(vec![], vec![], vec![], Some(env), 4),
            camera,
            config,
        )
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-1.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 1e-6);
        assert!((linear_to_gamma(0.5) - 0.5f32.powf(1.0 / 2.2)).abs() < 1e-6);
    }

    #[test]
    fn test_color_to_rgba_clamps() {
        assert_eq!(color_to_rgba(Spectrum::ZERO), [0, 0, 0, 255]);
        assert_eq!(color_to_rgba(Spectrum::splat(4.0)), [255, 255, 255, 255]);
        assert_eq!(color_to_rgba(Spectrum::new(1.0, -1.0, 0.0)), [255, 0, 0, 255]);
    }

    #[test]
    fn test_write_bucket() {
        let mut image = ImageBuffer::new(4, 4);
        let bucket = Bucket::new(2, 1, 2, 2, 0);
        let result = BucketResult::new(bucket, vec![Spectrum::ONE; 4]);
        image.write_bucket(&result);

        assert_eq!(image.get(2, 1), Spectrum::ONE);
        assert_eq!(image.get(3, 2), Spectrum::ONE);
        assert_eq!(image.get(1, 1), Spectrum::ZERO);
        assert_eq!(image.get(2, 3), Spectrum::ZERO);
    }

    #[test]
    fn test_render_orientation() {
        let image = render(&sky_tracer(0));
        assert_eq!(image.pixels.len(), 200);
        // Sky on top, black ground below
        assert_eq!(image.get(10, 0), Spectrum::ONE);
        assert_eq!(image.get(10, 9), Spectrum::ZERO);
    }

    #[test]
    fn test_render_is_deterministic_across_thread_counts() {
        let a = render(&sky_tracer(1));
        let b = render(&sky_tracer(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_save_png_and_hdr() {
        let dir = std::env::temp_dir().join(format!("lumen_save_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut image = ImageBuffer::new(3, 2);
        image.set(0, 0, Spectrum::ONE);
        image.set(2, 1, Spectrum::new(2.0, 0.5, 0.0));

        let png = dir.join("out.png");
        image.save(&png).unwrap();
        let loaded = image::open(&png).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(loaded.get_pixel(1, 0).0, [0, 0, 0]);

        let hdr = dir.join("out.hdr");
        image.save(&hdr).unwrap();
        // HdrImage counts rows from the bottom
        let loaded = HdrImage::load(&hdr).unwrap();
        assert_eq!(loaded.dimension(), (3, 2));
        assert_eq!(loaded.at(0, 1), Spectrum::ONE);
        let bright = loaded.at(2, 0);
        assert!((bright.r - 2.0).abs() < 0.02, "{bright:?}");
        assert!((bright.g - 0.5).abs() < 0.01, "{bright:?}");
        assert_eq!(bright.b, 0.0);

        std::fs::remove_dir_all(&dir).ok();
    }
}
