use crate::foundation::{
    core::FrameIndex,
    error::{MontageError, MontageResult},
};

/// Values that can be blended between two keyframes.
///
/// `t` is always within `[0, 1]`. Implementations must return `a` exactly at `t == 0`
/// and must stay within the span of `a` and `b`.
pub trait Lerp: Sized {
    /// Blend `a` toward `b` by `t`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let v = a + (b - a) * t;
        v.clamp(a.min(*b), a.max(*b))
    }
}

impl Lerp for i64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let v = (*a as f64 + (*b as f64 - *a as f64) * t).round() as i64;
        v.clamp(*a.min(b), *a.max(b))
    }
}

impl Lerp for bool {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        if t >= 1.0 { *b } else { *a }
    }
}

impl Lerp for String {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        if t >= 1.0 { b.clone() } else { a.clone() }
    }
}

/// Interpolation applied from a keyframe toward the next one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interp {
    /// Keep this key's value until the next key.
    Hold,
    /// Straight line to the next key.
    #[default]
    Linear,
    /// Cubic ease-in/ease-out to the next key.
    Smooth,
}

impl Interp {
    /// Map normalized segment time to blend weight.
    pub fn weight(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Hold => 0.0,
            Self::Linear => t,
            Self::Smooth => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }
}

/// One control point of a [`KeyframeCurve`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe<T> {
    /// Position of the key.
    pub frame: FrameIndex,
    /// Value held at `frame`.
    pub value: T,
    /// Interpolation toward the next key.
    #[serde(default)]
    pub interp: Interp,
}

impl<T> Keyframe<T> {
    /// Build a key.
    pub fn new(frame: u64, value: T, interp: Interp) -> Self {
        Self {
            frame: FrameIndex(frame),
            value,
            interp,
        }
    }
}

/// Time-to-value animation over strictly increasing keys.
///
/// Evaluation is a pure function of the key set: values clamp to the first/last key
/// outside the keyed span and a single key behaves as a constant.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeyframeCurve<T> {
    keys: Vec<Keyframe<T>>, // strictly increasing by frame
}

impl<T> Default for KeyframeCurve<T> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<T> KeyframeCurve<T>
where
    T: Lerp + Clone,
{
    /// Empty curve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from keys in any order; duplicate frames keep the last occurrence.
    pub fn from_keys(keys: impl IntoIterator<Item = Keyframe<T>>) -> Self {
        let mut curve = Self::new();
        for key in keys {
            curve.insert(key);
        }
        curve
    }

    /// Keys in frame order.
    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// `true` when the curve has no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Insert a key, replacing any key already at the same frame.
    ///
    /// Returns the replaced key.
    pub fn insert(&mut self, key: Keyframe<T>) -> Option<Keyframe<T>> {
        match self.keys.binary_search_by_key(&key.frame, |k| k.frame) {
            Ok(idx) => Some(std::mem::replace(&mut self.keys[idx], key)),
            Err(idx) => {
                self.keys.insert(idx, key);
                None
            }
        }
    }

    /// Remove the key at `frame`, if any.
    pub fn remove(&mut self, frame: FrameIndex) -> Option<Keyframe<T>> {
        let idx = self.keys.binary_search_by_key(&frame, |k| k.frame).ok()?;
        Some(self.keys.remove(idx))
    }

    /// Key stored exactly at `frame`.
    pub fn key_at(&self, frame: FrameIndex) -> Option<&Keyframe<T>> {
        let idx = self.keys.binary_search_by_key(&frame, |k| k.frame).ok()?;
        Some(&self.keys[idx])
    }

    /// Check the strict-ordering invariant (relevant for deserialized curves).
    pub fn validate(&self) -> MontageResult<()> {
        if !self.keys.windows(2).all(|w| w[0].frame < w[1].frame) {
            return Err(MontageError::validation(
                "keyframe frames must be strictly increasing",
            ));
        }
        Ok(())
    }

    /// Evaluate the curve; `None` only for an empty curve.
    pub fn value_at(&self, frame: FrameIndex) -> Option<T> {
        let first = self.keys.first()?;
        let idx = self.keys.partition_point(|k| k.frame <= frame);

        if idx == 0 {
            return Some(first.value.clone());
        }
        let a = &self.keys[idx - 1];
        let Some(b) = self.keys.get(idx) else {
            return Some(a.value.clone());
        };
        if a.frame == frame || a.interp == Interp::Hold {
            return Some(a.value.clone());
        }

        let span = b.frame.0 - a.frame.0;
        let t = ((frame.0 - a.frame.0) as f64) / (span as f64);
        Some(T::lerp(&a.value, &b.value, a.interp.weight(t)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/curve.rs"]
mod tests;
