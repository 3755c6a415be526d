//! Procedural heightmaps for the viewer.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use terrain_core::{HeightSampler, HeightmapError};

/// Parameters of the fractal noise heightmap.
pub struct FbmParams {
    pub octaves: usize,
    /// Noise cycles across the whole map
    pub frequency: f64,
    pub persistence: f64,
}

impl Default for FbmParams {
    fn default() -> Self {
        Self {
            octaves: 5,
            frequency: 3.0,
            persistence: 0.5,
        }
    }
}

/// Sample fractal Perlin noise into a `width x height` sampler, remapped to [0, 1].
pub fn fbm_heightmap(
    width: usize,
    height: usize,
    seed: u32,
    params: &FbmParams,
) -> Result<HeightSampler, HeightmapError> {
    let noise: Fbm<Perlin> = Fbm::new(seed)
        .set_octaves(params.octaves)
        .set_frequency(params.frequency)
        .set_persistence(params.persistence);

    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let u = x as f64 / width.max(1) as f64;
            let v = y as f64 / height.max(1) as f64;
            let value = noise.get([u, v]) * 0.5 + 0.5;
            data.push(value.clamp(0.0, 1.0) as f32);
        }
    }

    HeightSampler::from_f32(width, height, data)
}
