//! Small value enums shared across the parser and the compositor.
//!
//! Grounded on the teacher's `doc::layer::{LayerKind, BlendingMode}`: plain
//! `#[repr(u32)]`-ish enums with a `new(u32) -> Result<Self>` constructor
//! instead of a `TryFrom` impl, matching that crate's idiom.

use crate::error::{Error, Result, ValidationKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseType {
    Rgb = 0,
    Grayscale = 1,
    Indexed = 2,
}

impl BaseType {
    pub fn new(value: u32) -> Result<Self> {
        match value {
            0 => Ok(BaseType::Rgb),
            1 => Ok(BaseType::Grayscale),
            2 => Ok(BaseType::Indexed),
            other => Err(Error::validation(
                ValidationKind::BaseType,
                format!("base_type {other} is not one of {{0,1,2}}"),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precision {
    Gamma8 = 100,
    Linear8 = 150,
    Gamma16 = 200,
    Linear16 = 250,
    Gamma32 = 300,
    Linear32 = 350,
    GammaFloat16 = 500,
    LinearFloat16 = 550,
    GammaFloat32 = 600,
    LinearFloat32 = 650,
    GammaFloat64 = 700,
    LinearFloat64 = 750,
}

impl Precision {
    pub fn new(value: u32) -> Result<Self> {
        use Precision::*;

        Ok(match value {
            100 => Gamma8,
            150 => Linear8,
            200 => Gamma16,
            250 => Linear16,
            300 => Gamma32,
            350 => Linear32,
            500 => GammaFloat16,
            550 => LinearFloat16,
            600 => GammaFloat32,
            650 => LinearFloat32,
            700 => GammaFloat64,
            750 => LinearFloat64,
            other => {
                return Err(Error::validation(
                    ValidationKind::Precision,
                    format!("{other} is not a recognized precision"),
                ))
            }
        })
    }

    /// The legacy (pre-v11) implicit precision: 8-bit gamma.
    pub fn legacy() -> Self {
        Precision::Gamma8
    }

    pub fn bytes_per_channel(&self) -> u32 {
        use Precision::*;

        match self {
            Gamma8 | Linear8 => 1,
            Gamma16 | Linear16 | GammaFloat16 | LinearFloat16 => 2,
            Gamma32 | Linear32 | GammaFloat32 | LinearFloat32 => 4,
            GammaFloat64 | LinearFloat64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        use Precision::*;

        matches!(
            self,
            GammaFloat16 | LinearFloat16 | GammaFloat32 | LinearFloat32 | GammaFloat64 | LinearFloat64
        )
    }

    pub fn is_linear(&self) -> bool {
        use Precision::*;

        matches!(
            self,
            Linear8 | Linear16 | Linear32 | LinearFloat16 | LinearFloat32 | LinearFloat64
        )
    }
}

/// The ~20 blend modes a layer's `MODE` property can name, plus `Normal`.
///
/// Unknown ids fall back to `Normal` (§7): the caller can tell the two
/// apart by checking [`BlendMode::from_raw`]'s `Option` before unwrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Dissolve,
    Behind,
    Multiply,
    Screen,
    Overlay,
    Difference,
    Addition,
    Subtract,
    DarkenOnly,
    LightenOnly,
    Hue,
    Saturation,
    Color,
    Value,
    Divide,
    Dodge,
    Burn,
    HardLight,
    SoftLight,
    GrainExtract,
    GrainMerge,
}

impl BlendMode {
    /// `None` means the id is unrecognized; callers that don't care about
    /// the distinction can fall back to `Normal` via [`BlendMode::resolve`].
    pub fn from_raw(id: u32) -> Option<Self> {
        use BlendMode::*;

        Some(match id {
            0 => Normal,
            1 => Dissolve,
            2 => Behind,
            3 => Multiply,
            4 => Screen,
            5 => Overlay,
            6 => Difference,
            7 => Addition,
            8 => Subtract,
            9 => DarkenOnly,
            10 => LightenOnly,
            11 => Hue,
            12 => Saturation,
            13 => Color,
            14 => Value,
            15 => Divide,
            16 => Dodge,
            17 => Burn,
            18 => HardLight,
            19 => SoftLight,
            20 => GrainExtract,
            21 => GrainMerge,
            _ => return None,
        })
    }

    pub fn resolve(id: u32) -> Self {
        Self::from_raw(id).unwrap_or(BlendMode::Normal)
    }

    /// Modes whose math is `f(x1, x2)` applied per-channel before the
    /// destination-alpha-retaining blend (§4.6 "General blend"); everything
    /// else is handled by `Normal`, the HSV triple, `Behind`, or `Dissolve`.
    pub fn is_separable(self) -> bool {
        use BlendMode::*;

        matches!(
            self,
            Multiply
                | Screen
                | Overlay
                | Difference
                | Addition
                | Subtract
                | DarkenOnly
                | LightenOnly
                | Divide
                | Dodge
                | Burn
                | HardLight
                | SoftLight
                | GrainExtract
                | GrainMerge
        )
    }

    pub fn is_hsv(self) -> bool {
        matches!(self, BlendMode::Hue | BlendMode::Saturation | BlendMode::Color | BlendMode::Value)
    }
}
