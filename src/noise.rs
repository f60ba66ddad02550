//! Multi-octave value noise used by the geology and topography layers.
//!
//! The primitive is value noise on an integer lattice: each octave owns a
//! lattice of random heights drawn from the stage RNG, sampled with
//! smoothstep-faded bilinear interpolation. Octave contributions are summed
//! with persistence weighting and normalized to `[0, 1]`. The primitive is a
//! pure function of the RNG stream that filled the lattices, which keeps the
//! generated fields reproducible under re-seeding.

use std::path::Path;

use bitflags::bitflags;
use image::{GrayImage, ImageBuffer};
use rand::{Rng, rngs::StdRng};

use crate::grid::Size;

bitflags! {
    /// Flags controlling the behavior of a noise field.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct NoiseFlags: u8 {
        /// Inverts the sampled values, e.g. the original value is `value`,
        /// the new value is `1.0 - value`.
        const InvertHeights = 0b00000001;
        /// The closer to the rim of the map, the closer the value to 0.
        /// Used for fields that must fade out at the map edge.
        const EdgeFalloff = 0b00000010;
    }
}

/// The number of lattice cells across the map at the lowest octave.
const BASE_CELLS: u32 = 4;

/// Piecewise-linear mapping from the ruggedness parameter to octave count
/// and persistence.
///
/// Anchors: ruggedness 0.5 → 2 octaves / 0.40 persistence, 1.0 → 4 / 0.60,
/// 2.0 → 6 / 0.80. The mapping is monotonic and clamps outside the anchor
/// range.
pub fn octaves_for_ruggedness(ruggedness: f64) -> (u32, f64) {
    let clamped = ruggedness.clamp(0.5, 2.0);
    let (octaves, persistence) = if clamped <= 1.0 {
        let t = (clamped - 0.5) / 0.5;
        (2.0 + t * 2.0, 0.40 + t * 0.20)
    } else {
        let t = (clamped - 1.0) / 1.0;
        (4.0 + t * 2.0, 0.60 + t * 0.20)
    };
    (octaves.round() as u32, persistence)
}

/// One octave's lattice of random heights.
///
/// The lattice stores `(cells_x + 1) × (cells_y + 1)` corner values; the
/// last row and column only exist so interpolation of the rightmost and
/// topmost tiles has corners to read.
struct Lattice {
    cells_x: u32,
    cells_y: u32,
    values: Vec<f64>,
}

impl Lattice {
    fn fill(random: &mut StdRng, cells_x: u32, cells_y: u32) -> Self {
        let corner_count = ((cells_x + 1) * (cells_y + 1)) as usize;
        let values = (0..corner_count)
            .map(|_| random.random_range(0.0..1.0))
            .collect();
        Self {
            cells_x,
            cells_y,
            values,
        }
    }

    fn corner(&self, x: u32, y: u32) -> f64 {
        self.values[(x + y * (self.cells_x + 1)) as usize]
    }

    /// Samples the lattice at normalized coordinates `u, v ∈ [0, 1]`.
    fn sample(&self, u: f64, v: f64) -> f64 {
        let fx = (u * self.cells_x as f64).min(self.cells_x as f64 - 1e-9);
        let fy = (v * self.cells_y as f64).min(self.cells_y as f64 - 1e-9);
        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let tx = fade(fx - x0 as f64);
        let ty = fade(fy - y0 as f64);

        let bottom = lerp(self.corner(x0, y0), self.corner(x0 + 1, y0), tx);
        let top = lerp(self.corner(x0, y0 + 1), self.corner(x0 + 1, y0 + 1), tx);
        lerp(bottom, top, ty)
    }
}

/// A layered value-noise field over the map grid.
pub struct LayeredNoise {
    map_size: Size,
    flags: NoiseFlags,
    persistence: f64,
    lattices: Vec<Lattice>,
}

impl LayeredNoise {
    /// Creates a noise field with explicit octave count and persistence.
    ///
    /// # Arguments
    ///
    /// - `random`: The stage RNG; all lattice heights are drawn from it, in
    ///   octave order, so the field is a pure function of the stream state.
    /// - `map_size`: The map size in tiles; sampling coordinates are tile
    ///   coordinates within this size.
    /// - `octaves`: Number of octaves, each doubling the lattice frequency.
    /// - `persistence`: Amplitude ratio between consecutive octaves, in
    ///   `(0, 1]`.
    /// - `flags`: Bit flags controlling inversion and edge falloff.
    pub fn create(
        random: &mut StdRng,
        map_size: Size,
        octaves: u32,
        persistence: f64,
        flags: NoiseFlags,
    ) -> Self {
        debug_assert!(octaves >= 1, "noise needs at least one octave");
        debug_assert!(
            persistence > 0.0 && persistence <= 1.0,
            "persistence should be in (0, 1], but got {persistence}"
        );

        let lattices = (0..octaves)
            .map(|octave| {
                let cells = BASE_CELLS << octave;
                // Keep the lattice aspect close to the map aspect so cells
                // stay roughly square on non-square maps.
                let (cells_x, cells_y) = if map_size.width >= map_size.height {
                    let ratio = map_size.height as f64 / map_size.width as f64;
                    (cells, ((cells as f64 * ratio).round() as u32).max(1))
                } else {
                    let ratio = map_size.width as f64 / map_size.height as f64;
                    (((cells as f64 * ratio).round() as u32).max(1), cells)
                };
                Lattice::fill(random, cells_x, cells_y)
            })
            .collect();

        Self {
            map_size,
            flags,
            persistence,
            lattices,
        }
    }

    /// Creates a noise field whose octave count and persistence follow the
    /// ruggedness mapping of [`octaves_for_ruggedness`].
    pub fn with_ruggedness(
        random: &mut StdRng,
        map_size: Size,
        ruggedness: f64,
        flags: NoiseFlags,
    ) -> Self {
        let (octaves, persistence) = octaves_for_ruggedness(ruggedness);
        Self::create(random, map_size, octaves, persistence, flags)
    }

    /// Samples the field at a tile coordinate. Returns a value in `[0, 1]`.
    pub fn sample(&self, x: u32, y: u32) -> f64 {
        let u = x as f64 / (self.map_size.width.max(2) - 1) as f64;
        let v = y as f64 / (self.map_size.height.max(2) - 1) as f64;

        let mut amplitude = 1.0;
        let mut total = 0.0;
        let mut weight = 0.0;
        for lattice in &self.lattices {
            total += lattice.sample(u, v) * amplitude;
            weight += amplitude;
            amplitude *= self.persistence;
        }
        let mut value = total / weight;

        if self.flags.contains(NoiseFlags::InvertHeights) {
            value = 1.0 - value;
        }
        if self.flags.contains(NoiseFlags::EdgeFalloff) {
            // Distance to the nearest rim, normalized to the shorter half-axis.
            let rim = (u.min(1.0 - u)).min(v.min(1.0 - v)) * 2.0;
            value *= fade(rim.clamp(0.0, 1.0));
        }
        value
    }

    /// Writes the sampled field as a grayscale image, for eyeballing a
    /// generated elevation or moisture field during development.
    pub fn write_to_file(&self, path: &Path) {
        let width = self.map_size.width;
        let height = self.map_size.height;

        let pixels: Vec<u8> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (self.sample(x, y) * 255.0) as u8))
            .collect();

        let image: GrayImage = ImageBuffer::from_raw(width, height, pixels).unwrap();
        image.save(path).unwrap();
    }
}

fn fade(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::{LayeredNoise, NoiseFlags, octaves_for_ruggedness};
    use crate::grid::Size;

    #[test]
    fn ruggedness_mapping_hits_anchors_and_is_monotonic() {
        let check = |ruggedness: f64, octaves: u32, persistence: f64| {
            let (o, p) = octaves_for_ruggedness(ruggedness);
            assert_eq!(o, octaves);
            assert!((p - persistence).abs() < 1e-12);
        };
        check(0.5, 2, 0.40);
        check(1.0, 4, 0.60);
        check(2.0, 6, 0.80);
        // Clamped outside the anchors.
        check(0.1, 2, 0.40);
        check(5.0, 6, 0.80);

        let mut previous = octaves_for_ruggedness(0.5);
        for step in 1..=30 {
            let current = octaves_for_ruggedness(0.5 + step as f64 * 0.05);
            assert!(current.0 >= previous.0);
            assert!(current.1 >= previous.1);
            previous = current;
        }
    }

    #[test]
    fn sampling_is_deterministic_and_bounded() {
        let size = Size::new(50, 40);
        let mut random = StdRng::seed_from_u64(123456);
        let noise = LayeredNoise::create(&mut random, size, 4, 0.6, NoiseFlags::empty());

        let mut random_again = StdRng::seed_from_u64(123456);
        let noise_again =
            LayeredNoise::create(&mut random_again, size, 4, 0.6, NoiseFlags::empty());

        for y in 0..40 {
            for x in 0..50 {
                let value = noise.sample(x, y);
                assert!((0.0..=1.0).contains(&value));
                assert_eq!(value, noise_again.sample(x, y));
            }
        }
    }

    #[test]
    fn edge_falloff_pins_the_rim_to_zero() {
        let size = Size::new(32, 32);
        let mut random = StdRng::seed_from_u64(9);
        let noise = LayeredNoise::create(&mut random, size, 3, 0.5, NoiseFlags::EdgeFalloff);
        for x in 0..32 {
            assert_eq!(noise.sample(x, 0), 0.0);
            assert_eq!(noise.sample(x, 31), 0.0);
        }
    }

    #[test]
    fn create_noise_image() {
        let path = std::env::temp_dir().join("layered_noise.png");

        let mut random = StdRng::seed_from_u64(77777777);
        let noise = LayeredNoise::create(
            &mut random,
            Size::new(200, 120),
            5,
            0.65,
            NoiseFlags::empty(),
        );

        noise.write_to_file(&path);
    }
}
