use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

impl CurveKey {
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveInterp {
    #[default]
    Linear,
    /// Smoothstep between keys (flat tangents at every key).
    Smooth,
}

/// Remaps normalized noise to a height factor. Immutable, so workers share it freely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeightCurve {
    #[serde(default = "default_keys")]
    pub keys: Vec<CurveKey>,
    #[serde(default)]
    pub interp: CurveInterp,
}

fn default_keys() -> Vec<CurveKey> {
    vec![
        CurveKey::new(0.0, 0.0),
        CurveKey::new(0.4, 0.05),
        CurveKey::new(1.0, 1.0),
    ]
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self {
            keys: default_keys(),
            interp: CurveInterp::Linear,
        }
    }
}

impl HeightCurve {
    pub fn linear() -> Self {
        Self {
            keys: vec![CurveKey::new(0.0, 0.0), CurveKey::new(1.0, 1.0)],
            interp: CurveInterp::Linear,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.keys.is_empty() {
            return Err(TerrainError::invalid_parameter("height curve has no keys"));
        }
        for w in self.keys.windows(2) {
            if !(w[1].time > w[0].time) {
                return Err(TerrainError::invalid_parameter(format!(
                    "height curve key times must strictly ascend ({} then {})",
                    w[0].time, w[1].time
                )));
            }
        }
        if self
            .keys
            .iter()
            .any(|k| !k.time.is_finite() || !k.value.is_finite())
        {
            return Err(TerrainError::invalid_parameter("height curve keys must be finite"));
        }
        Ok(())
    }

    /// Value at `t`, held constant beyond the first and last key. NaN maps to
    /// the first key.
    pub fn evaluate(&self, t: f32) -> f32 {
        let keys = &self.keys;
        let (first, last) = match (keys.first(), keys.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return t,
        };
        if t.is_nan() || t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }
        let hi = keys.partition_point(|k| k.time <= t);
        let (a, b) = (keys[hi - 1], keys[hi]);
        let mut u = (t - a.time) / (b.time - a.time);
        if self.interp == CurveInterp::Smooth {
            u = u * u * (3.0 - 2.0 * u);
        }
        a.value + (b.value - a.value) * u
    }
}

/// Vertical shaping of a chunk plus its horizontal world scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainShape {
    #[serde(default = "default_uniform_scale")]
    pub uniform_scale: f32,
    #[serde(default = "default_height_multiplier")]
    pub height_multiplier: f32,
    #[serde(default)]
    pub height_curve: HeightCurve,
}

fn default_uniform_scale() -> f32 {
    1.0
}
fn default_height_multiplier() -> f32 {
    30.0
}

impl Default for TerrainShape {
    fn default() -> Self {
        Self {
            uniform_scale: default_uniform_scale(),
            height_multiplier: default_height_multiplier(),
            height_curve: HeightCurve::default(),
        }
    }
}

impl TerrainShape {
    pub fn validate(&self) -> Result<()> {
        if !(self.uniform_scale.is_finite() && self.uniform_scale > 0.0) {
            return Err(TerrainError::invalid_parameter(format!(
                "uniform_scale must be positive, got {}",
                self.uniform_scale
            )));
        }
        if !self.height_multiplier.is_finite() {
            return Err(TerrainError::invalid_parameter("height_multiplier must be finite"));
        }
        self.height_curve.validate()
    }

    /// Mesh-space height of a normalized sample.
    #[inline]
    pub fn height_of(&self, v: f32) -> f32 {
        self.height_curve.evaluate(v) * self.height_multiplier
    }

    /// Lowest world height; shaders use it to normalize blend heights.
    pub fn min_height(&self) -> f32 {
        self.uniform_scale * self.height_multiplier * self.height_curve.evaluate(0.0)
    }

    pub fn max_height(&self) -> f32 {
        self.uniform_scale * self.height_multiplier * self.height_curve.evaluate(1.0)
    }
}
