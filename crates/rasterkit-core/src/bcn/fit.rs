//! Delegates BC1/BC2/BC3 colour-block endpoint fitting to the `squish` crate, the same
//! role the original tool's bundled libsquish played. The hand-rolled pieces are only
//! BC4/BC5 (`bc45.rs`), whose endpoint search is a plain min/max over 16 samples and was
//! never part of libsquish to begin with.

use crate::colour::Colour;

/// `quality ∈ {lowest-range-fit, high-cluster-fit, highest-iterative-cluster-fit}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    Low,
    #[default]
    High,
    Highest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    #[default]
    Uniform,
    Perceptual,
}

impl Quality {
    fn algorithm(self) -> squish::Algorithm {
        match self {
            Quality::Low => squish::Algorithm::RangeFit,
            Quality::High => squish::Algorithm::ClusterFit,
            Quality::Highest => squish::Algorithm::IterativeClusterFit,
        }
    }
}

impl Metric {
    fn weights(self) -> [f32; 3] {
        match self {
            Metric::Uniform => squish::COLOUR_WEIGHTS_UNIFORM,
            Metric::Perceptual => squish::COLOUR_WEIGHTS_PERCEPTUAL,
        }
    }
}

pub(crate) fn squish_params(quality: Quality, metric: Metric, weigh_colour_by_alpha: bool) -> squish::Params {
    squish::Params {
        algorithm: quality.algorithm(),
        weights: metric.weights(),
        weigh_colour_by_alpha,
    }
}

pub(crate) fn block_to_rgba8(block: &[Colour<3, true>; 16]) -> [u8; 64] {
    let mut out = [0u8; 64];
    for (i, px) in block.iter().enumerate() {
        let c = px.colour();
        out[i * 4] = quantise(c[0]);
        out[i * 4 + 1] = quantise(c[1]);
        out[i * 4 + 2] = quantise(c[2]);
        out[i * 4 + 3] = quantise(px.alpha());
    }
    out
}

pub(crate) fn rgba8_to_block(rgba: &[u8; 64]) -> [Colour<3, true>; 16] {
    let mut out = [Colour::<3, true>::splat(0.0); 16];
    for i in 0..16 {
        out[i] = Colour::new(
            [
                rgba[i * 4] as f32 / 255.0,
                rgba[i * 4 + 1] as f32 / 255.0,
                rgba[i * 4 + 2] as f32 / 255.0,
            ],
            rgba[i * 4 + 3] as f32 / 255.0,
        );
    }
    out
}

fn quantise(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}
