//! Procedural altitude field
//!
//! Heights come from layered coherent noise evaluated on an integer grid of
//! vertices and interpolated across each tile's two triangles, so the surface
//! is seamless and infinite without a stored heightmap. Vertex heights are
//! memoized; the memo is stamped with the [`TerrainParams`] version it was
//! filled under and discarded when the parameters change.

use std::cell::RefCell;
use std::collections::HashMap;

use glam::Vec3;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Base noise frequency per world unit
const BASE_FREQUENCY: f64 = 0.00035;
/// Frequency multiplier per octave
const LACUNARITY: f64 = 2.1;
/// Amplitude multiplier per octave
const PERSISTENCE: f64 = 0.45;
/// Exponent applied to normalized noise (flattens valleys, sharpens peaks)
const PEAK_POWER: f64 = 1.6;
/// Height of the lowest possible ground (Y grows downward)
const FLOOR_HEIGHT: f64 = 320.0;
/// Vertical span between the lowest and highest ground
const RELIEF: f64 = 620.0;
/// Memo is dropped wholesale once it holds this many vertices
pub const ALTITUDE_CACHE_LIMIT: usize = 1 << 18;

/// Integer tile coordinate; also names the tile's minimum-corner vertex
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridCell {
    pub x: i32,
    pub z: i32,
}

impl GridCell {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Tile containing a world-space point
    #[inline]
    pub fn from_world(wx: f32, wz: f32, tile_size: f32) -> Self {
        Self {
            x: (wx / tile_size).floor() as i32,
            z: (wz / tile_size).floor() as i32,
        }
    }

    /// World coordinates of the tile's minimum corner
    #[inline]
    pub fn origin(self, tile_size: f32) -> (f32, f32) {
        (self.x as f32 * tile_size, self.z as f32 * tile_size)
    }

    #[inline]
    pub fn center(self, tile_size: f32) -> (f32, f32) {
        let (x, z) = self.origin(tile_size);
        (x + tile_size / 2.0, z + tile_size / 2.0)
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// Chessboard distance between two cells
    #[inline]
    pub fn chebyshev(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

/// Which noise stack produces vertex heights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseMode {
    /// Three octaves with a peak-sharpening power curve
    #[default]
    Layered,
    /// Single octave (cheap benchmark mode)
    Simple,
}

impl NoiseMode {
    fn octaves(self) -> u32 {
        match self {
            NoiseMode::Layered => 3,
            NoiseMode::Simple => 1,
        }
    }
}

/// Everything that affects terrain shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub tile_size: f32,
    pub noise_mode: NoiseMode,
    pub seed: u32,
    /// Bumped whenever any other field changes
    #[serde(skip)]
    pub version: u64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            noise_mode: NoiseMode::Layered,
            seed: 7,
            version: 0,
        }
    }
}

impl TerrainParams {
    fn same_shape(&self, other: &Self) -> bool {
        self.tile_size == other.tile_size
            && self.noise_mode == other.noise_mode
            && self.seed == other.seed
    }
}

/// Inclusive launchpad bounding-box test
#[inline]
pub fn is_launchpad(x: f32, z: f32) -> bool {
    (LAUNCH_MIN..=LAUNCH_MAX).contains(&x) && (LAUNCH_MIN..=LAUNCH_MAX).contains(&z)
}

/// True when a height sits at or past the sea threshold (water, not walkable)
#[inline]
pub fn is_above_sea(height: f32) -> bool {
    height >= SEA_LEVEL - 1.0
}

#[derive(Debug, Clone, Default)]
struct AltitudeCache {
    version: u64,
    samples: HashMap<GridCell, f32>,
}

/// Memoized procedural height function
#[derive(Debug, Clone)]
pub struct AltitudeField {
    params: TerrainParams,
    perlin: Perlin,
    cache: RefCell<AltitudeCache>,
}

impl Default for AltitudeField {
    fn default() -> Self {
        Self::new(TerrainParams::default())
    }
}

impl AltitudeField {
    pub fn new(params: TerrainParams) -> Self {
        Self {
            params,
            perlin: Perlin::new(params.seed),
            cache: RefCell::new(AltitudeCache {
                version: params.version,
                samples: HashMap::new(),
            }),
        }
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    #[inline]
    pub fn tile_size(&self) -> f32 {
        self.params.tile_size
    }

    /// Swap terrain parameters; a shape change bumps the version, which
    /// invalidates the memo on the next query
    pub fn set_params(&mut self, params: TerrainParams) {
        if self.params.same_shape(&params) {
            return;
        }
        let version = self.params.version + 1;
        self.params = TerrainParams { version, ..params };
        self.perlin = Perlin::new(params.seed);
        log::debug!(
            "Terrain params v{}: tile={} mode={:?} seed={}",
            version,
            params.tile_size,
            params.noise_mode,
            params.seed
        );
    }

    /// Number of memoized vertex heights
    pub fn cached_vertices(&self) -> usize {
        let cache = self.cache.borrow();
        if cache.version == self.params.version {
            cache.samples.len()
        } else {
            0
        }
    }

    /// Ground height at any world point
    pub fn altitude(&self, x: f32, z: f32) -> f32 {
        if is_launchpad(x, z) {
            return LAUNCH_ALT;
        }
        let tile = self.params.tile_size;
        let gx = x / tile;
        let gz = z / tile;
        let x0 = gx.floor();
        let z0 = gz.floor();
        let fx = gx - x0;
        let fz = gz - z0;
        let base = GridCell::new(x0 as i32, z0 as i32);

        let h10 = self.vertex_altitude(base.offset(1, 0));
        let h01 = self.vertex_altitude(base.offset(0, 1));
        // Split along the (1,0)-(0,1) diagonal
        if fx + fz <= 1.0 {
            let h00 = self.vertex_altitude(base);
            h00 + fx * (h10 - h00) + fz * (h01 - h00)
        } else {
            let h11 = self.vertex_altitude(base.offset(1, 1));
            h11 + (1.0 - fx) * (h01 - h11) + (1.0 - fz) * (h10 - h11)
        }
    }

    /// Height at a grid vertex (memoized)
    pub fn vertex_altitude(&self, vertex: GridCell) -> f32 {
        let (wx, wz) = vertex.origin(self.params.tile_size);
        if is_launchpad(wx, wz) {
            return LAUNCH_ALT;
        }

        let mut cache = self.cache.borrow_mut();
        if cache.version != self.params.version {
            cache.samples.clear();
            cache.version = self.params.version;
        }
        if let Some(&h) = cache.samples.get(&vertex) {
            return h;
        }
        if cache.samples.len() >= ALTITUDE_CACHE_LIMIT {
            log::debug!("Altitude cache full ({} vertices), clearing", cache.samples.len());
            cache.samples.clear();
        }
        let h = self.sample_noise(wx as f64, wz as f64);
        cache.samples.insert(vertex, h);
        h
    }

    /// A cell can host infection only off the pad and above water
    pub fn is_infectable(&self, cell: GridCell) -> bool {
        let (wx, wz) = cell.origin(self.params.tile_size);
        !is_launchpad(wx, wz) && !is_above_sea(self.vertex_altitude(cell))
    }

    /// Vertical distance from `pos` down to the ground or the sea surface,
    /// whichever is higher (negative when below it)
    #[inline]
    pub fn ground_clearance(&self, pos: Vec3) -> f32 {
        self.altitude(pos.x, pos.z).min(SEA_LEVEL) - pos.y
    }

    fn sample_noise(&self, x: f64, z: f64) -> f32 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = BASE_FREQUENCY;
        let mut max_value = 0.0;

        for _ in 0..self.params.noise_mode.octaves() {
            value += self.perlin.get([x * frequency, z * frequency]) * amplitude;
            max_value += amplitude;
            amplitude *= PERSISTENCE;
            frequency *= LACUNARITY;
        }

        let normalized = ((value / max_value + 1.0) * 0.5).clamp(0.0, 1.0);
        (FLOOR_HEIGHT - normalized.powf(PEAK_POWER) * RELIEF) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_altitude_is_deterministic() {
        let field = AltitudeField::default();
        let first: Vec<f32> = (0..50)
            .map(|i| field.altitude(-3000.0 + i as f32 * 137.3, 2200.0 - i as f32 * 91.7))
            .collect();
        let second: Vec<f32> = (0..50)
            .map(|i| field.altitude(-3000.0 + i as f32 * 137.3, 2200.0 - i as f32 * 91.7))
            .collect();
        assert_eq!(first, second);

        // A fresh field with identical params agrees with the memoized one
        let fresh = AltitudeField::default();
        assert_eq!(fresh.altitude(-3000.0, 2200.0), first[0]);
    }

    #[test]
    fn test_vertex_queries_hit_memo() {
        let field = AltitudeField::default();
        let cell = GridCell::new(-40, 17);
        let a = field.vertex_altitude(cell);
        let cached = field.cached_vertices();
        let b = field.vertex_altitude(cell);
        assert_eq!(a, b);
        assert_eq!(field.cached_vertices(), cached);
    }

    #[test]
    fn test_interpolation_matches_vertices() {
        let field = AltitudeField::default();
        let tile = field.tile_size();
        for cell in [GridCell::new(-20, -20), GridCell::new(30, -5), GridCell::new(-8, 44)] {
            let (wx, wz) = cell.origin(tile);
            assert_eq!(field.altitude(wx, wz), field.vertex_altitude(cell));
        }
    }

    #[test]
    fn test_surface_is_seamless_across_tile_edges() {
        let field = AltitudeField::default();
        let tile = field.tile_size();
        for i in -30..30 {
            let edge_x = i as f32 * tile;
            let z = -2000.0 + i as f32 * 53.0;
            let left = field.altitude(edge_x - 0.01, z);
            let right = field.altitude(edge_x + 0.01, z);
            assert!((left - right).abs() < 1.0, "step at x={edge_x}: {left} vs {right}");
        }
    }

    #[test]
    fn test_param_change_invalidates_memo() {
        let mut field = AltitudeField::default();
        let probe = (-5123.0, 7311.0);
        let before = field.altitude(probe.0, probe.1);
        assert!(field.cached_vertices() > 0);

        let mut params = *field.params();
        params.seed += 99;
        field.set_params(params);
        assert_eq!(field.params().version, 1);
        assert_eq!(field.cached_vertices(), 0);

        let after = field.altitude(probe.0, probe.1);
        assert_eq!(after, AltitudeField::new(params).altitude(probe.0, probe.1));
        assert_ne!(before, after);
    }

    #[test]
    fn test_memo_is_dropped_when_full() {
        let field = AltitudeField::default();
        // Far from the pad so every vertex goes through the memo
        let vertices = (0..ALTITUDE_CACHE_LIMIT as i32 + 10)
            .map(|i| GridCell::new(100 + i % 1024, 100 + i / 1024));
        for (n, vertex) in vertices.enumerate() {
            field.vertex_altitude(vertex);
            if n + 1 == ALTITUDE_CACHE_LIMIT {
                assert_eq!(field.cached_vertices(), ALTITUDE_CACHE_LIMIT);
            }
        }
        assert_eq!(field.cached_vertices(), 10);
    }

    #[test]
    fn test_ground_clearance_stops_at_sea() {
        let field = AltitudeField::default();
        assert_eq!(field.ground_clearance(Vec3::new(400.0, 80.0, 400.0)), 20.0);

        let (x, z) = (-200..200)
            .flat_map(|i| (-200..200).map(move |j| (i as f32 * 97.0, j as f32 * 97.0)))
            .find(|&(x, z)| field.altitude(x, z) > SEA_LEVEL)
            .expect("deep water somewhere");
        assert_eq!(field.ground_clearance(Vec3::new(x, 150.0, z)), SEA_LEVEL - 150.0);
    }

    #[test]
    fn test_identical_params_keep_version() {
        let mut field = AltitudeField::default();
        field.altitude(-900.0, -900.0);
        field.set_params(TerrainParams::default());
        assert_eq!(field.params().version, 0);
        assert!(field.cached_vertices() > 0);
    }

    #[test]
    fn test_simple_mode_differs_from_layered() {
        let layered = AltitudeField::default();
        let simple = AltitudeField::new(TerrainParams {
            noise_mode: NoiseMode::Simple,
            ..TerrainParams::default()
        });
        let differs = (0..20).any(|i| {
            let x = -4000.0 + i as f32 * 311.0;
            layered.altitude(x, -1234.0) != simple.altitude(x, -1234.0)
        });
        assert!(differs);
    }

    #[test]
    fn test_terrain_has_land_and_sea() {
        let field = AltitudeField::default();
        let mut land = 0;
        let mut sea = 0;
        for x in -100..100 {
            for z in -100..100 {
                if field.is_infectable(GridCell::new(x * 3, z * 3)) {
                    land += 1;
                } else {
                    sea += 1;
                }
            }
        }
        assert!(land > 0 && sea > 0, "land={land} sea={sea}");
    }

    #[test]
    fn test_sea_threshold() {
        assert!(is_above_sea(SEA_LEVEL));
        assert!(is_above_sea(SEA_LEVEL - 1.0));
        assert!(!is_above_sea(SEA_LEVEL - 1.5));
    }

    #[test]
    fn test_launchpad_edges_are_inclusive() {
        assert!(is_launchpad(LAUNCH_MIN, LAUNCH_MIN));
        assert!(is_launchpad(LAUNCH_MAX, LAUNCH_MAX));
        assert!(!is_launchpad(LAUNCH_MAX + 0.1, 400.0));
        assert!(!is_launchpad(400.0, LAUNCH_MIN - 0.1));
    }

    proptest! {
        #[test]
        fn launchpad_always_returns_pad_height(
            x in LAUNCH_MIN..=LAUNCH_MAX,
            z in LAUNCH_MIN..=LAUNCH_MAX,
        ) {
            let field = AltitudeField::default();
            prop_assert_eq!(field.altitude(x, z), LAUNCH_ALT);
        }

        #[test]
        fn altitude_stays_within_relief(x in -1.0e5f32..1.0e5, z in -1.0e5f32..1.0e5) {
            let field = AltitudeField::default();
            let h = field.altitude(x, z);
            prop_assert!(h.is_finite());
            prop_assert!(h <= FLOOR_HEIGHT as f32 + 0.01);
            prop_assert!(h >= (FLOOR_HEIGHT - RELIEF) as f32 - 0.01);
        }
    }
}
