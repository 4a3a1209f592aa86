//! Surface scattering models.
//!
//! All directions are in the local shading frame, where the surface normal is
//! +Y and `cos θ` is the `y` component. `out_dir` points from the surface
//! towards the viewer; sampled directions point towards where light arrives
//! from.

use std::f32::consts::PI;

use crate::random::coin_flip;
use crate::samplers::HemisphereCosine;
use lumen_core::MaterialDesc;
use lumen_math::{Spectrum, Vec3};
use rand::RngCore;

/// Result of sampling a BSDF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsdfSample {
    /// Incoming light direction (local frame)
    pub direction: Vec3,
    /// Density of `direction`; probability mass for delta lobes
    pub pdf: f32,
    /// Ratio of reflected to incoming radiance
    pub attenuation: Spectrum,
    /// Radiance emitted by the surface itself
    pub emissive: Spectrum,
}

/// Material response models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bsdf {
    Lambertian {
        albedo: Spectrum,
    },
    Mirror {
        reflectance: Spectrum,
    },
    Glass {
        reflectance: Spectrum,
        transmittance: Spectrum,
        ior: f32,
    },
    Refract {
        transmittance: Spectrum,
        ior: f32,
    },
    /// Emits `radiance`, reflects nothing
    Diffuse {
        radiance: Spectrum,
    },
}

impl Bsdf {
    pub fn from_desc(desc: &MaterialDesc) -> Self {
        match *desc {
            MaterialDesc::Lambertian { albedo } => Bsdf::Lambertian {
                albedo: albedo.into(),
            },
            MaterialDesc::Mirror { reflectance } => Bsdf::Mirror {
                reflectance: reflectance.into(),
            },
            MaterialDesc::Glass {
                reflectance,
                transmittance,
                ior,
            } => Bsdf::Glass {
                reflectance: reflectance.into(),
                transmittance: transmittance.into(),
                ior,
            },
            MaterialDesc::Refract { transmittance, ior } => Bsdf::Refract {
                transmittance: transmittance.into(),
                ior,
            },
            MaterialDesc::DiffuseLight { radiance } => Bsdf::Diffuse {
                radiance: radiance.into(),
            },
        }
    }

    /// Sample an incoming direction for light leaving along `out_dir`.
    pub fn sample(&self, out_dir: Vec3, rng: &mut dyn RngCore) -> BsdfSample {
        match *self {
            Bsdf::Lambertian { albedo } => {
                let (direction, pdf) = HemisphereCosine.sample(rng);
                BsdfSample {
                    direction,
                    pdf,
                    attenuation: albedo / PI,
                    emissive: Spectrum::ZERO,
                }
            }

            Bsdf::Mirror { reflectance } => {
                let direction = reflect(out_dir);
                BsdfSample {
                    direction,
                    pdf: 1.0,
                    attenuation: reflectance / direction.y.abs(),
                    emissive: Spectrum::ZERO,
                }
            }

            Bsdf::Glass {
                reflectance,
                transmittance,
                ior,
            } => {
                let Some(in_dir) = refract(out_dir, ior) else {
                    // Total internal reflection
                    let direction = reflect(out_dir);
                    return BsdfSample {
                        direction,
                        pdf: 1.0,
                        attenuation: transmittance / direction.y.abs(),
                        emissive: Spectrum::ZERO,
                    };
                };

                // Schlick, on the transmitted side
                let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
                let fresnel = r0 + (1.0 - r0) * (1.0 - in_dir.y.abs()).powi(5);

                if coin_flip(rng, fresnel) {
                    let direction = reflect(out_dir);
                    BsdfSample {
                        direction,
                        pdf: fresnel,
                        attenuation: fresnel * reflectance / direction.y.abs(),
                        emissive: Spectrum::ZERO,
                    }
                } else {
                    let pdf = 1.0 - fresnel;
                    BsdfSample {
                        direction: in_dir,
                        pdf,
                        attenuation: pdf * radiance_scale(out_dir, ior) * transmittance
                            / in_dir.y.abs(),
                        emissive: Spectrum::ZERO,
                    }
                }
            }

            Bsdf::Refract { transmittance, ior } => {
                let direction = refract(out_dir, ior).unwrap_or_else(|| reflect(out_dir));
                BsdfSample {
                    direction,
                    pdf: 1.0,
                    attenuation: transmittance / direction.y.abs(),
                    emissive: Spectrum::ZERO,
                }
            }

            Bsdf::Diffuse { radiance } => {
                let (direction, pdf) = HemisphereCosine.sample(rng);
                BsdfSample {
                    direction,
                    pdf,
                    attenuation: Spectrum::ZERO,
                    emissive: radiance,
                }
            }
        }
    }

    /// Attenuation for a given pair of directions.
    ///
    /// Delta lobes are never hit exactly by an independently chosen
    /// direction, so they evaluate to zero.
    pub fn evaluate(&self, _out_dir: Vec3, _in_dir: Vec3) -> Spectrum {
        match *self {
            Bsdf::Lambertian { albedo } => albedo / PI,
            _ => Spectrum::ZERO,
        }
    }

    /// Whether the response is a delta distribution. Light sampling is
    /// skipped for these.
    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            Bsdf::Mirror { .. } | Bsdf::Glass { .. } | Bsdf::Refract { .. }
        )
    }

    /// Whether the two sides of the surface differ. One-sided materials get
    /// their normal flipped towards the viewer.
    pub fn is_sided(&self) -> bool {
        matches!(self, Bsdf::Glass { .. } | Bsdf::Refract { .. })
    }
}

/// Reflect a direction about the local normal (0, 1, 0).
#[inline]
pub fn reflect(dir: Vec3) -> Vec3 {
    Vec3::new(-dir.x, dir.y, -dir.z).normalize_or_zero()
}

/// Refract `out_dir` through a surface with index `ior` on the -Y side.
///
/// Returns `None` on total internal reflection.
pub fn refract(out_dir: Vec3, ior: f32) -> Option<Vec3> {
    let out_dir = out_dir.normalize_or_zero();
    let cos2 = out_dir.y * out_dir.y;

    let (ratio, y) = if out_dir.y > 0.0 {
        // Viewer outside: light comes from inside the medium
        let ratio = 1.0 / ior;
        let sin2 = (1.0 - cos2) * ratio * ratio;
        (ratio, -(1.0 - sin2).max(0.0).sqrt())
    } else {
        let ratio = ior;
        let sin2 = (1.0 - cos2) * ratio * ratio;
        if sin2 >= 1.0 {
            return None;
        }
        (ratio, (1.0 - sin2).sqrt())
    };

    Some(Vec3::new(-out_dir.x * ratio, y, -out_dir.z * ratio).normalize_or_zero())
}

/// Radiance scale for crossing the interface towards the viewer.
#[inline]
fn radiance_scale(out_dir: Vec3, ior: f32) -> f32 {
    if out_dir.y >= 0.0 {
        1.0 / (ior * ior)
    } else {
        ior * ior
    }
}
