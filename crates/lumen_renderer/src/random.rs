//! Random number helpers over `&mut dyn RngCore`.
//!
//! Sampling code takes a trait object so one per-bucket generator can be
//! threaded through cameras, BSDFs and lights without generics everywhere.

use rand::{Rng, RngCore};

/// Uniform float in `[0, 1)`.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen()
}

/// `true` with probability `p`.
#[inline]
pub fn coin_flip(rng: &mut dyn RngCore, p: f32) -> bool {
    gen_f32(rng) < p
}
