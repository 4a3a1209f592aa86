//! Path tracing integrator.
//!
//! Radiance is estimated recursively: direct lighting by sampling every light
//! at each non-delta vertex, indirect lighting by sampling the BSDF and
//! continuing the path until the depth limit or Russian roulette stops it.

use crate::camera::Camera;
use crate::light::LightSource;
use crate::random::gen_f32;
use crate::samplers::RectUniform;
use crate::scene::Scene;
use lumen_core::RenderConfig;
use lumen_math::{Frame, Ray, Spectrum, Vec2, EPS_F};
use rand::RngCore;

/// Estimates radiance for pixels of one camera view of a scene.
#[derive(Debug)]
pub struct Pathtracer {
    scene: Scene,
    camera: Camera,
    config: RenderConfig,
}

impl Pathtracer {
    pub fn new(scene: Scene, camera: Camera, config: RenderConfig) -> Self {
        Self {
            scene,
            camera,
            config,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// One radiance sample through a random point of pixel `(x, y)`.
    ///
    /// Pixel `(0, 0)` is the bottom-left corner of the image.
    pub fn trace_pixel(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Spectrum {
        let (jitter, _) = RectUniform::default().sample(rng);
        let size = Vec2::new(self.config.width as f32, self.config.height as f32);
        let screen = (Vec2::new(x as f32, y as f32) + jitter) / size;

        let ray = self.camera.generate_ray(screen, rng);
        self.trace_ray(&ray, rng)
    }

    /// Radiance arriving at the ray origin from along the ray.
    pub fn trace_ray(&self, ray: &Ray, rng: &mut dyn RngCore) -> Spectrum {
        let mut ray = *ray;
        let hit = self.scene.hit(&mut ray);
        if !hit.hit {
            return self
                .scene
                .environment()
                .map_or(Spectrum::ZERO, |env| env.sample_direction(ray.direction));
        }

        let Some(material) = hit.material else {
            return Spectrum::ZERO;
        };
        let bsdf = self.scene.material(material);

        // One-sided surfaces face the viewer
        let mut normal = hit.normal;
        if !bsdf.is_sided() && normal.dot(ray.direction) > 0.0 {
            normal = -normal;
        }

        let frame = Frame::from_normal(normal);
        let out_dir = frame.to_local(-ray.direction).normalize_or_zero();

        let mut radiance = Spectrum::ZERO;

        // Direct lighting
        if !bsdf.is_discrete() {
            let lights = self
                .scene
                .lights()
                .iter()
                .map(|light| light as &dyn LightSource)
                .chain(
                    self.scene
                        .environment()
                        .map(|env| env as &dyn LightSource),
                );

            for light in lights {
                let samples = if light.is_discrete() {
                    1
                } else {
                    self.config.area_light_samples.max(1)
                };

                for _ in 0..samples {
                    let sample = light.sample(hit.position, rng);
                    if sample.radiance.is_black() || sample.pdf <= 0.0 {
                        continue;
                    }

                    let in_dir = frame.to_local(sample.direction);
                    let cos_theta = in_dir.y;
                    if cos_theta <= 0.0 {
                        continue;
                    }

                    let attenuation = bsdf.evaluate(out_dir, in_dir);
                    if attenuation.luma() == 0.0 {
                        continue;
                    }

                    // Stop just short of the light so its own surface does not occlude
                    let mut shadow = Ray::new(hit.position, sample.direction)
                        .with_bounds(EPS_F, sample.distance - EPS_F);
                    if self.scene.hit(&mut shadow).hit {
                        continue;
                    }

                    radiance += cos_theta / (samples as f32 * sample.pdf)
                        * sample.radiance
                        * attenuation;
                }
            }
        }

        // Indirect lighting
        if ray.depth >= self.config.max_depth {
            return radiance;
        }

        let sample = bsdf.sample(out_dir, rng);
        radiance += sample.emissive;
        if sample.pdf <= 0.0 {
            return radiance;
        }

        let factor = sample.attenuation * sample.direction.y.abs() / sample.pdf;
        let throughput = ray.throughput * factor;

        // Russian roulette on the path's luminance
        let survival = throughput.luma().min(1.0);
        if survival <= 0.0 || gen_f32(rng) >= survival {
            return radiance;
        }

        let mut next = Ray::new(hit.position, frame.to_world(sample.direction))
            .with_bounds(EPS_F, f32::INFINITY);
        next.depth = ray.depth + 1;
        next.throughput = throughput;

        radiance + factor * self.trace_ray(&next, rng) / survival
    }
}
