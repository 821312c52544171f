//! # Map Data
//!
//! The generated world as plain data: a height field, a land-type map, and a
//! per-cell color map, all flat row-major vectors addressed through a
//! [`GridLayout`]. Rendering, meshes, and materials live elsewhere; this
//! module only produces and mutates the data they would consume.
//!
//! ## Determinism Guarantee
//!
//! `MapData::generate` derives every random stream (octave offsets, water
//! seeding) from the world seed with fixed purpose tags, so a config plus a
//! seed always produces the same starting map.

use serde::{Deserialize, Serialize};
use stratus_core::{GridLayout, Seed, SeededRng};
use tracing::debug;

use crate::config::WorldConfig;
use crate::error::WorldGenResult;
use crate::noise::{octave_offsets, GradientNoise};

/// Seed purpose tags for the map's random streams.
const PURPOSE_OCTAVES: u64 = 0x4d41_5031;
const PURPOSE_WATER: u64 = 0x4d41_5032;

/// Terrain classification of one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LandType {
    /// High-altitude or frozen ground.
    Snow = 0,
    /// Bare rock, the default before simulation.
    Rock = 1,
    /// Vegetated ground.
    Plants = 2,
    /// Open water.
    Water = 3,
}

impl LandType {
    /// Converts a raw byte back to a land type.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Snow),
            1 => Some(Self::Rock),
            2 => Some(Self::Plants),
            3 => Some(Self::Water),
            _ => None,
        }
    }
}

/// An RGB color in linear `[0, 1]` components.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
}

impl Color {
    /// Creates a color.
    #[inline]
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// A world-space position.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// East-west axis.
    pub x: f32,
    /// Vertical axis.
    pub y: f32,
    /// North-south axis.
    pub z: f32,
}

impl Vec3 {
    /// Creates a position.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Piecewise-linear remapping curve over `[0, 1]` heights.
///
/// Keyframes are `(input, output)` pairs sorted by input. Evaluation clamps
/// outside the keyframe range and interpolates linearly between frames.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeightCurve {
    keys: Vec<(f32, f32)>,
}

impl HeightCurve {
    /// Creates a curve from keyframes, sorting them by input.
    #[must_use]
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    /// Identity curve.
    #[must_use]
    pub fn linear() -> Self {
        Self::new(vec![(0.0, 0.0), (1.0, 1.0)])
    }

    /// Evaluates the curve at `t`.
    #[must_use]
    pub fn evaluate(&self, t: f32) -> f32 {
        let Some(first) = self.keys.first() else {
            return t;
        };
        if t <= first.0 {
            return first.1;
        }
        let last = self.keys[self.keys.len() - 1];
        if t >= last.0 {
            return last.1;
        }

        for pair in self.keys.windows(2) {
            let (t0, v0) = pair[0];
            let (t1, v1) = pair[1];
            if t <= t1 {
                let span = t1 - t0;
                if span <= f32::EPSILON {
                    return v1;
                }
                return v0 + (v1 - v0) * ((t - t0) / span);
            }
        }
        last.1
    }
}

/// Uniform scale plus translation from mesh space into world space.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RegionTransform {
    /// Uniform scale factor.
    pub scale: f32,
    /// World-space offset applied after scaling.
    pub translation: Vec3,
}

impl RegionTransform {
    /// Maps a mesh-space point into world space.
    #[must_use]
    pub fn apply(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x * self.scale + self.translation.x,
            point.y * self.scale + self.translation.y,
            point.z * self.scale + self.translation.z,
        )
    }
}

impl Default for RegionTransform {
    fn default() -> Self {
        Self {
            scale: 5.0,
            translation: Vec3::default(),
        }
    }
}

/// The generated world: heights, land types, and colors over one grid.
#[derive(Clone, Debug)]
pub struct MapData {
    layout: GridLayout,
    heights: Vec<f32>,
    land: Vec<LandType>,
    colors: Vec<Color>,
}

impl MapData {
    /// Generates the starting map for a config and seed.
    ///
    /// Heights come from fractal noise; land defaults to [`LandType::Rock`]
    /// with a handful of water cells seeded into the low-lying band so the
    /// simulation has water to grow from.
    ///
    /// # Errors
    ///
    /// Returns an error if the config's grid layout is invalid.
    pub fn generate(config: &WorldConfig, seed: Seed) -> WorldGenResult<Self> {
        let layout = config.grid.layout()?;
        let params = config.noise.sanitized();

        let noise = GradientNoise::new(seed);
        let offsets = octave_offsets(
            seed.derive(PURPOSE_OCTAVES),
            params.octaves,
            config.noise_offset,
        );

        let mut heights = vec![0.0; layout.len()];
        for row in 0..layout.rows() {
            for col in 0..layout.cols() {
                #[allow(clippy::cast_precision_loss)]
                let value = noise.fractal_sample(col as f32, row as f32, &params, &offsets);
                heights[layout.index(row, col)] = value;
            }
        }

        let mut land = vec![LandType::Rock; layout.len()];
        let bands = &config.terrain.bands;
        let mut rng = SeededRng::from_seed(seed.derive(PURPOSE_WATER));
        let mut seeded = 0u32;
        for (index, height) in heights.iter().enumerate() {
            if seeded >= config.terrain.max_water_seeds {
                break;
            }
            if *height > bands.rock
                && *height <= bands.water
                && rng.next_f32() < config.terrain.water_seed_chance
            {
                land[index] = LandType::Water;
                seeded += 1;
            }
        }
        debug!(water_seeds = seeded, cells = layout.len(), "map generated");

        let mut map = Self {
            layout,
            heights,
            land,
            colors: vec![Color::new(0.0, 0.0, 0.0); layout.len()],
        };
        map.refresh_colors(config);
        Ok(map)
    }

    /// The grid layout this map is addressed through.
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> GridLayout {
        self.layout
    }

    /// The full height field, row-major.
    #[inline]
    #[must_use]
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// The full land map, row-major.
    #[inline]
    #[must_use]
    pub fn land(&self) -> &[LandType] {
        &self.land
    }

    /// The full color map, row-major.
    #[inline]
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Height of one cell.
    #[inline]
    #[must_use]
    pub fn height_at(&self, row: usize, col: usize) -> f32 {
        self.heights[self.layout.index(row, col)]
    }

    /// Land type of one cell.
    #[inline]
    #[must_use]
    pub fn land_at(&self, row: usize, col: usize) -> LandType {
        self.land[self.layout.index(row, col)]
    }

    /// Replaces the land map wholesale, e.g. with an automaton pass output.
    ///
    /// # Panics
    ///
    /// Panics if `land` does not match the grid's cell count.
    pub fn set_land(&mut self, land: Vec<LandType>) {
        assert_eq!(land.len(), self.layout.len(), "land map size mismatch");
        self.land = land;
    }

    /// Recomputes every cell color from the current land map.
    pub fn refresh_colors(&mut self, config: &WorldConfig) {
        for (color, land) in self.colors.iter_mut().zip(&self.land) {
            *color = config.terrain.colors.color_for(*land);
        }
    }

    /// World position of the terrain surface above a cell.
    ///
    /// The mesh frame puts cell (0, 0) at its top-left corner; the cell's
    /// height runs through the remapping curve and vertical multiplier, and
    /// the mesh-to-world transform maps the result into world space.
    #[must_use]
    pub fn surface_position(&self, config: &WorldConfig, row: usize, col: usize) -> Vec3 {
        #[allow(clippy::cast_precision_loss)]
        let top_left_x = (self.layout.cols() as f32 - 1.0) / -2.0;
        #[allow(clippy::cast_precision_loss)]
        let top_left_z = (self.layout.rows() as f32 - 1.0) / 2.0;

        #[allow(clippy::cast_precision_loss)]
        let mesh = Vec3::new(
            top_left_x + col as f32,
            config.height.curve.evaluate(self.height_at(row, col)) * config.height.multiplier,
            top_left_z - row as f32,
        );
        config.transform.apply(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;

    #[test]
    fn test_land_type_roundtrip() {
        for land in [LandType::Snow, LandType::Rock, LandType::Plants, LandType::Water] {
            assert_eq!(LandType::from_u8(land as u8), Some(land));
        }
        assert_eq!(LandType::from_u8(4), None);
    }

    #[test]
    fn test_height_curve_interpolates_and_clamps() {
        let curve = HeightCurve::new(vec![(0.0, 0.0), (0.5, 0.1), (1.0, 1.0)]);
        assert!((curve.evaluate(-1.0)).abs() < f32::EPSILON);
        assert!((curve.evaluate(2.0) - 1.0).abs() < f32::EPSILON);
        assert!((curve.evaluate(0.25) - 0.05).abs() < 1e-6);
        assert!((curve.evaluate(0.75) - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_region_transform_scales_then_translates() {
        let transform = RegionTransform {
            scale: 5.0,
            translation: Vec3::new(1.0, 2.0, 3.0),
        };
        let out = transform.apply(Vec3::new(1.0, 0.0, -1.0));
        assert_eq!(out, Vec3::new(6.0, 2.0, -2.0));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let config = WorldConfig::default();
        let a = MapData::generate(&config, Seed::new(77)).unwrap();
        let b = MapData::generate(&config, Seed::new(77)).unwrap();
        assert_eq!(a.heights(), b.heights());
        assert_eq!(a.land(), b.land());
    }

    #[test]
    fn test_generate_heights_in_unit_range() {
        let config = WorldConfig::default();
        let map = MapData::generate(&config, Seed::new(5)).unwrap();
        assert!(map.heights().iter().all(|h| (0.0..=1.0).contains(h)));
    }

    #[test]
    fn test_water_seeding_is_bounded_and_in_band() {
        let config = WorldConfig::default();
        let map = MapData::generate(&config, Seed::new(99)).unwrap();
        let bands = &config.terrain.bands;

        let water: Vec<usize> = map
            .land()
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == LandType::Water)
            .map(|(i, _)| i)
            .collect();

        assert!(water.len() <= config.terrain.max_water_seeds as usize);
        for index in water {
            let h = map.heights()[index];
            assert!(h > bands.rock && h <= bands.water);
        }
    }

    #[test]
    fn test_colors_follow_land() {
        let config = WorldConfig::default();
        let mut map = MapData::generate(&config, Seed::new(3)).unwrap();

        let mut land = map.land().to_vec();
        land[0] = LandType::Snow;
        land[1] = LandType::Plants;
        map.set_land(land);
        map.refresh_colors(&config);

        assert_eq!(map.colors()[0], config.terrain.colors.snow);
        assert_eq!(map.colors()[1], config.terrain.colors.plants);
    }
}
