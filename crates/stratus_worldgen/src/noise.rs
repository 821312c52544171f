//! # Gradient Noise
//!
//! Hash-permutation gradient noise with a seeded lattice, the sampler behind
//! every height and humidity map in the workspace.
//!
//! ## Determinism Guarantee
//!
//! The permutation table is shuffled from the seed with a fixed xorshift64
//! stream, so a given [`Seed`] reproduces the same lattice — and therefore
//! the same terrain — on any platform, any time.
//!
//! ## Range convention
//!
//! [`GradientNoise::sample`] returns values in `[0, 1]` (the raw gradient
//! range `[-1, 1]` is remapped before returning). Fractal sampling sums its
//! octave layers and divides by 2: with persistence below 1 the amplitude
//! sum stays under 2, so the result also stays inside `[0, 1]`, and a single
//! octave is already in range. Callers rely on this exact constant; the
//! tests document it rather than re-deriving a canonical normalization.

use serde::{Deserialize, Serialize};
use stratus_core::{Seed, SeededRng};

/// Smallest usable noise scale. Zero or negative scales clamp to this
/// instead of dividing by zero.
pub const MIN_NOISE_SCALE: f32 = 1e-4;

/// Fractal sampling parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FractalParams {
    /// Coordinate divisor; larger values zoom the pattern out.
    pub scale: f32,
    /// Number of layered octaves.
    pub octaves: u32,
    /// Amplitude multiplier per octave, expected in `(0, 1)`.
    pub persistence: f32,
    /// Frequency multiplier per octave, expected `>= 1`.
    pub lacunarity: f32,
}

impl FractalParams {
    /// Clamps out-of-range values to their closest sane setting
    /// (`octaves >= 1`, `lacunarity >= 1`).
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if self.octaves < 1 {
            self.octaves = 1;
        }
        if self.lacunarity < 1.0 {
            self.lacunarity = 1.0;
        }
        self
    }
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            scale: 75.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Seeded 2D gradient noise sampler.
pub struct GradientNoise {
    /// 512-entry permutation table (256 entries, doubled to skip index
    /// wrapping).
    perm: [u8; 512],
}

impl GradientNoise {
    /// Creates a sampler whose lattice is shuffled from `seed`.
    #[must_use]
    pub fn new(seed: Seed) -> Self {
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            {
                *slot = i as u8;
            }
        }

        // Fisher-Yates with a fixed xorshift64 stream
        let mut state = seed.value();
        if state == 0 {
            state = 0xA076_1D64_78BD_642F;
        }
        for i in (1..256).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;

            #[allow(clippy::cast_possible_truncation)]
            let j = (state as usize) % (i + 1);
            perm.swap(i, j);
        }

        for i in 0..256 {
            perm[256 + i] = perm[i];
        }

        Self { perm }
    }

    /// Samples noise at `(x, y)`.
    ///
    /// # Returns
    ///
    /// A value in `[0, 1]` with a continuous first derivative across the
    /// lattice.
    #[must_use]
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let xi = (x.floor() as i64).rem_euclid(256) as usize;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let yi = (y.floor() as i64).rem_euclid(256) as usize;
        let xf = x - x.floor();
        let yf = y - y.floor();

        let u = fade(xf);
        let v = fade(yf);

        let a = (self.perm[xi] as usize + yi) & 0xff;
        let b = (self.perm[xi + 1] as usize + yi) & 0xff;

        let noise = lerp(
            lerp(
                grad(self.perm[a], xf, yf),
                grad(self.perm[b], xf - 1.0, yf),
                u,
            ),
            lerp(
                grad(self.perm[a + 1], xf, yf - 1.0),
                grad(self.perm[b + 1], xf - 1.0, yf - 1.0),
                u,
            ),
            v,
        );

        // remap the theoretical [-1, 1] gradient range to [0, 1]
        (noise + 1.0) / 2.0
    }

    /// Fractal (multi-octave) sampling.
    ///
    /// Each octave samples at `(coord + offset[i]) / scale * frequency`,
    /// multiplying frequency by `lacunarity` and amplitude by `persistence`
    /// per layer; per-octave offsets decorrelate the layers. The summed
    /// result is divided by 2 (see the module docs for why that constant).
    ///
    /// A non-positive `scale` is clamped to [`MIN_NOISE_SCALE`].
    #[must_use]
    pub fn fractal_sample(
        &self,
        x: f32,
        y: f32,
        params: &FractalParams,
        offsets: &[(f32, f32)],
    ) -> f32 {
        let scale = if params.scale <= 0.0 {
            MIN_NOISE_SCALE
        } else {
            params.scale
        };

        let mut sum = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;

        for octave in 0..params.octaves as usize {
            let (off_x, off_y) = offsets.get(octave).copied().unwrap_or((0.0, 0.0));
            let nx = (x + off_x) / scale * frequency;
            let ny = (y + off_y) / scale * frequency;

            sum += amplitude * self.sample(nx, ny);
            amplitude *= params.persistence;
            frequency *= params.lacunarity;
        }

        sum / 2.0
    }
}

impl std::fmt::Debug for GradientNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradientNoise").finish_non_exhaustive()
    }
}

/// Draws one seeded `(x, y)` offset per octave, shifted by a caller offset.
///
/// Identical seeds reproduce identical offset sets, which is what makes
/// whole height maps reproducible; different seeds decorrelate them.
#[must_use]
pub fn octave_offsets(seed: Seed, octaves: u32, shift: (f32, f32)) -> Vec<(f32, f32)> {
    let mut rng = SeededRng::from_seed(seed);
    (0..octaves)
        .map(|_| {
            let x = rng.range_f32(0.0, 1_000_000.0) + shift.0;
            let y = rng.range_f32(0.0, 1_000_000.0) - shift.1;
            (x, y)
        })
        .collect()
}

/// Generates a `width * height` map of independent uniform values in
/// `[0, 1)`, row-major. Used as the humidity channel for decoration
/// placement.
#[must_use]
pub fn uniform_noise_map(width: usize, height: usize, seed: Seed) -> Vec<f32> {
    let mut rng = SeededRng::from_seed(seed);
    let mut map = vec![0.0; width * height];
    for row in 0..height {
        for col in 0..width {
            map[row * width + col] = rng.next_f32();
        }
    }
    map
}

/// Quintic fade, continuous in the first derivative across lattice edges.
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Gradient dot product for one lattice corner.
#[inline]
fn grad(hash: u8, x: f32, y: f32) -> f32 {
    let gx = if hash & 1 == 0 { x } else { -x };
    let gy = if hash & 2 == 0 { y } else { -y };
    gx + gy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let noise1 = GradientNoise::new(Seed::new(12345));
        let noise2 = GradientNoise::new(Seed::new(12345));

        for i in 0..100 {
            let x = i as f32 * 0.37;
            let y = i as f32 * 0.11;
            assert_eq!(noise1.sample(x, y), noise2.sample(x, y));
        }
    }

    #[test]
    fn test_different_seeds_decorrelate() {
        let noise1 = GradientNoise::new(Seed::new(1));
        let noise2 = GradientNoise::new(Seed::new(2));

        let mut diverged = false;
        for i in 0..64 {
            let x = 13.7 + i as f32 * 0.53;
            if (noise1.sample(x, x * 0.7) - noise2.sample(x, x * 0.7)).abs() > 1e-6 {
                diverged = true;
                break;
            }
        }
        assert!(diverged, "different seeds should produce different fields");
    }

    #[test]
    fn test_single_sample_range() {
        let noise = GradientNoise::new(Seed::new(42));
        for i in 0..10_000 {
            let x = i as f32 * 0.173;
            let y = i as f32 * 0.091;
            let value = noise.sample(x, y);
            assert!((0.0..=1.0).contains(&value), "value {value} out of range");
        }
    }

    #[test]
    fn test_continuity() {
        let noise = GradientNoise::new(Seed::new(42));
        let (x, y) = (100.0, 100.0);
        let delta = 0.001;

        let v1 = noise.sample(x, y);
        assert!((v1 - noise.sample(x + delta, y)).abs() < 0.01);
        assert!((v1 - noise.sample(x, y + delta)).abs() < 0.01);
    }

    /// Documents the /2 output scaling: one octave halves a [0, 1] sample,
    /// and with persistence in (0, 1) the amplitude sum stays below 2, so
    /// the scaled fractal sum never leaves [0, 1].
    #[test]
    fn test_fractal_scaling_keeps_unit_range() {
        let noise = GradientNoise::new(Seed::new(7));
        let params = FractalParams {
            scale: 30.0,
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
        };
        let offsets = octave_offsets(Seed::new(7), params.octaves, (0.0, 0.0));

        for i in 0..5_000 {
            let x = i as f32 * 0.41;
            let y = i as f32 * 0.29;
            let value = noise.fractal_sample(x, y, &params, &offsets);
            assert!((0.0..=1.0).contains(&value), "value {value} out of range");
        }

        let single = FractalParams {
            octaves: 1,
            ..params
        };
        let v = noise.fractal_sample(10.0, 20.0, &single, &offsets);
        assert!((0.0..=1.0).contains(&v));
        // one octave is exactly half a raw sample
        let raw = noise.sample((10.0 + offsets[0].0) / 30.0, (20.0 + offsets[0].1) / 30.0);
        assert!((v - raw / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_scale_clamps() {
        let noise = GradientNoise::new(Seed::new(3));
        let params = FractalParams {
            scale: 0.0,
            octaves: 2,
            persistence: 0.5,
            lacunarity: 2.0,
        };
        let offsets = octave_offsets(Seed::new(3), 2, (0.0, 0.0));
        let value = noise.fractal_sample(1.0, 1.0, &params, &offsets);
        assert!(value.is_finite());
    }

    #[test]
    fn test_octave_offsets_deterministic() {
        let a = octave_offsets(Seed::new(9), 5, (3.0, 4.0));
        let b = octave_offsets(Seed::new(9), 5, (3.0, 4.0));
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        for &(x, y) in &a {
            assert!((3.0..1_000_003.0).contains(&x));
            assert!((-4.0..999_996.0).contains(&y));
        }
    }

    #[test]
    fn test_uniform_map_bounds() {
        let map = uniform_noise_map(64, 32, Seed::new(5));
        assert_eq!(map.len(), 64 * 32);
        assert!(map.iter().all(|v| (0.0..1.0).contains(v)));
        assert_eq!(map, uniform_noise_map(64, 32, Seed::new(5)));
    }

    #[test]
    fn test_params_sanitized() {
        let p = FractalParams {
            scale: 10.0,
            octaves: 0,
            persistence: 0.5,
            lacunarity: 0.3,
        }
        .sanitized();
        assert_eq!(p.octaves, 1);
        assert!((p.lacunarity - 1.0).abs() < f32::EPSILON);
    }
}
