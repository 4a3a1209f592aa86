//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that can be rendered
//! independently and in parallel using rayon. Each bucket carries its own
//! random number generator, seeded from the render seed and the bucket's
//! index, so a render is reproducible whatever the thread count.

use crate::pathtracer::Pathtracer;
use lumen_math::Spectrum;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner (row 0 is the top of the image)
    pub y: u32,
    /// Width of the bucket in pixels
    pub width: u32,
    /// Height of the bucket in pixels
    pub height: u32,
    /// Index of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    /// Get the total number of pixels in this bucket.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Generator for this bucket's samples.
    pub fn rng(&self, seed: u64) -> StdRng {
        // Spread consecutive indices across the seed space
        let stream = (self.index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        StdRng::seed_from_u64(seed ^ stream)
    }
}

/// Generate buckets for an image, sorted in spiral order from center.
///
/// Buckets closer to the centre come first, so the middle of the frame,
/// usually the subject, finishes early.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let bucket_size = bucket_size.max(1);
    let mut buckets = Vec::new();

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, buckets.len()));
            x += bucket_size;
        }
        y += bucket_size;
    }

    sort_spiral(&mut buckets, width, height);

    // Indices follow render order
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from image center.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    let distance = |b: &Bucket| {
        let dx = b.x as f32 + b.width as f32 / 2.0 - center_x;
        let dy = b.y as f32 + b.height as f32 / 2.0 - center_y;
        dx * dx + dy * dy
    };

    // Stable sort keeps row-major order between equidistant buckets
    buckets.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Render a single bucket.
///
/// Each pixel averages `samples_per_pixel` path samples. Samples that came
/// out non-finite are dropped from the sum.
pub fn render_bucket(bucket: &Bucket, tracer: &Pathtracer) -> BucketResult {
    let config = tracer.config();
    let spp = config.samples_per_pixel.max(1);
    let mut rng = bucket.rng(config.seed);

    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);
    for local_y in 0..bucket.height {
        // The tracer counts rows from the bottom
        let row = bucket.y + local_y;
        let y = config.height - 1 - row;

        for local_x in 0..bucket.width {
            let x = bucket.x + local_x;

            let mut sum = Spectrum::ZERO;
            for _ in 0..spp {
                let sample = tracer.trace_pixel(x, y, &mut rng);
                if sample.is_finite() {
                    sum += sample;
                }
            }
            pixels.push(sum / spp as f32);
        }
    }

    BucketResult::new(*bucket, pixels)
}

/// Result of rendering a bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    /// The bucket that was rendered
    pub bucket: Bucket,
    /// Linear radiance in row-major order, top row first
    pub pixels: Vec<Spectrum>,
}

impl BucketResult {
    pub fn new(bucket: Bucket, pixels: Vec<Spectrum>) -> Self {
        Self { bucket, pixels }
    }
}
