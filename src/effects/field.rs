use crate::{
    animation::curve::{Keyframe, KeyframeCurve, Lerp},
    foundation::core::{Color, FrameIndex},
    foundation::error::{MontageError, MontageResult},
};

/// A concrete parameter value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Toggle.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Double(f64),
    /// Index into the field's option list.
    Enum(u32),
    /// Straight-alpha color.
    Color(Color),
    /// Font family name.
    Font(String),
    /// Free text.
    Text(String),
}

impl FieldValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::Enum(_) => "enum",
            Self::Color(_) => "color",
            Self::Font(_) => "font",
            Self::Text(_) => "text",
        }
    }

    /// Numeric view of `Double` and `Int` values.
    pub fn as_f64(&self) -> MontageResult<f64> {
        match self {
            Self::Double(v) => Ok(*v),
            Self::Int(v) => Ok(*v as f64),
            other => Err(mismatch("number", other)),
        }
    }

    /// Integer view.
    pub fn as_i64(&self) -> MontageResult<i64> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(mismatch("int", other)),
        }
    }

    /// Boolean view.
    pub fn as_bool(&self) -> MontageResult<bool> {
        match self {
            Self::Bool(v) => Ok(*v),
            other => Err(mismatch("bool", other)),
        }
    }

    /// Option index view.
    pub fn as_enum(&self) -> MontageResult<u32> {
        match self {
            Self::Enum(v) => Ok(*v),
            other => Err(mismatch("enum", other)),
        }
    }

    /// Color view.
    pub fn as_color(&self) -> MontageResult<Color> {
        match self {
            Self::Color(v) => Ok(*v),
            other => Err(mismatch("color", other)),
        }
    }

    /// String view of `Text` and `Font` values.
    pub fn as_str(&self) -> MontageResult<&str> {
        match self {
            Self::Text(v) | Self::Font(v) => Ok(v),
            other => Err(mismatch("text", other)),
        }
    }
}

fn mismatch(expected: &str, got: &FieldValue) -> MontageError {
    MontageError::effect(format!("expected {expected} value, got {}", got.type_name()))
}

impl Lerp for Color {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let c = |x: f32, y: f32| <f64 as Lerp>::lerp(&f64::from(x), &f64::from(y), t) as f32;
        Self {
            r: c(a.r, b.r),
            g: c(a.g, b.g),
            b: c(a.b, b.b),
            a: c(a.a, b.a),
        }
    }
}

impl Lerp for FieldValue {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        match (a, b) {
            (Self::Double(x), Self::Double(y)) => Self::Double(<f64 as Lerp>::lerp(x, y, t)),
            (Self::Int(x), Self::Int(y)) => Self::Int(<i64 as Lerp>::lerp(x, y, t)),
            (Self::Color(x), Self::Color(y)) => Self::Color(<Color as Lerp>::lerp(x, y, t)),
            // Discrete values step at the next key.
            _ => {
                if t >= 1.0 {
                    b.clone()
                } else {
                    a.clone()
                }
            }
        }
    }
}

/// The value domain of a field.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldDomain {
    /// Toggle.
    Bool,
    /// Integer clamped to `[min, max]`.
    Int {
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },
    /// Number clamped to `[min, max]`.
    Double {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// One of a fixed list of named options.
    Enum {
        /// Option labels, indexed by the stored value.
        options: Vec<String>,
    },
    /// Straight-alpha color.
    Color,
    /// Font family name.
    Font,
    /// Free text.
    Text,
}

impl FieldDomain {
    /// Enum domain from option labels.
    pub fn options(labels: &[&str]) -> Self {
        Self::Enum {
            options: labels.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// `true` when `value` has this domain's type.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (Self::Bool, FieldValue::Bool(_))
                | (Self::Int { .. }, FieldValue::Int(_))
                | (Self::Double { .. }, FieldValue::Double(_))
                | (Self::Enum { .. }, FieldValue::Enum(_))
                | (Self::Color, FieldValue::Color(_))
                | (Self::Font, FieldValue::Font(_))
                | (Self::Text, FieldValue::Text(_))
        )
    }

    /// Normalize `value` into the domain: numbers are clamped, non-finite numbers and
    /// unknown options are rejected.
    pub fn check(&self, value: &FieldValue) -> MontageResult<FieldValue> {
        if !self.accepts(value) {
            return Err(MontageError::effect(format!(
                "{} value does not fit field domain",
                value.type_name()
            )));
        }
        match (self, value) {
            (Self::Double { min, max }, FieldValue::Double(v)) => {
                if !v.is_finite() {
                    return Err(MontageError::effect("number must be finite"));
                }
                Ok(FieldValue::Double(v.clamp(*min, *max)))
            }
            (Self::Int { min, max }, FieldValue::Int(v)) => Ok(FieldValue::Int(*v.clamp(min, max))),
            (Self::Enum { options }, FieldValue::Enum(idx)) => {
                if (*idx as usize) >= options.len() {
                    return Err(MontageError::effect(format!(
                        "option {idx} is out of range ({} options)",
                        options.len()
                    )));
                }
                Ok(value.clone())
            }
            (Self::Color, FieldValue::Color(c)) => {
                if !c.is_finite() {
                    return Err(MontageError::effect("color components must be finite"));
                }
                Ok(value.clone())
            }
            _ => Ok(value.clone()),
        }
    }
}

/// A named, typed, animatable effect parameter.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EffectField {
    /// Stable field key, unique within its effect.
    pub id: String,
    /// Value domain.
    pub domain: FieldDomain,
    /// Value used while keyframing is disabled or the curve is empty.
    pub constant: FieldValue,
    /// When set, the curve drives the value.
    #[serde(default)]
    pub keyframing: bool,
    /// Keyed values, in clip source frames.
    #[serde(default)]
    pub curve: KeyframeCurve<FieldValue>,
}

impl EffectField {
    /// New constant field.
    pub fn new(id: &str, domain: FieldDomain, default: FieldValue) -> Self {
        Self {
            id: id.to_string(),
            domain,
            constant: default,
            keyframing: false,
            curve: KeyframeCurve::new(),
        }
    }

    /// Resolve the live value at `frame` (clip source frame).
    pub fn value_at(&self, frame: FrameIndex) -> MontageResult<FieldValue> {
        let raw = if self.keyframing {
            self.curve
                .value_at(frame)
                .unwrap_or_else(|| self.constant.clone())
        } else {
            self.constant.clone()
        };
        self.domain
            .check(&raw)
            .map_err(|e| MontageError::effect(format!("field '{}': {e}", self.id)))
    }

    /// Replace the constant value.
    pub fn set_constant(&mut self, value: FieldValue) -> MontageResult<()> {
        self.constant = self.checked_for_edit(&value)?;
        Ok(())
    }

    /// Insert or replace a key. Returns the replaced key.
    pub fn set_key(&mut self, key: Keyframe<FieldValue>) -> MontageResult<Option<Keyframe<FieldValue>>> {
        let value = self.checked_for_edit(&key.value)?;
        Ok(self.curve.insert(Keyframe { value, ..key }))
    }

    /// Structural check used when loading documents: value types must match the domain.
    pub fn validate(&self) -> MontageResult<()> {
        self.curve.validate()?;
        let all_typed = std::iter::once(&self.constant)
            .chain(self.curve.keys().iter().map(|k| &k.value))
            .all(|v| self.domain.accepts(v));
        if !all_typed {
            return Err(MontageError::validation(format!(
                "field '{}' holds a value outside its domain type",
                self.id
            )));
        }
        Ok(())
    }

    fn checked_for_edit(&self, value: &FieldValue) -> MontageResult<FieldValue> {
        self.domain
            .check(value)
            .map_err(|e| MontageError::validation(format!("field '{}': {e}", self.id)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/field.rs"]
mod tests;
