//! Derived health metrics: body-mass-index and the weight-category verdict.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// BMI below this is underweight.
pub const UNDERWEIGHT_BELOW: f64 = 18.5;
/// BMI from here is no longer normal.
pub const OVERWEIGHT_FROM: f64 = 24.0;
/// Lower (exclusive) bound of the overweight branch under [`VerdictRule::Legacy`].
pub const LEGACY_OVERWEIGHT_ABOVE: f64 = 24.5;
/// BMI from here is obese.
pub const OBESE_FROM: f64 = 30.0;

/// Compute `round(weight / height^2, 2)`.
///
/// Rounding is half-even on the exact binary value of the quotient, so
/// `2.675` (stored as `2.67499..`) rounds down. Returns `0.0` when either
/// input is non-positive or non-finite, or when the quotient overflows.
pub fn bmi(height: f64, weight: f64) -> f64 {
    if !height.is_finite() || !weight.is_finite() || height <= 0.0 || weight <= 0.0 {
        return 0.0;
    }

    let raw = weight / (height * height);
    if !raw.is_finite() {
        return 0.0;
    }

    round_to_cents(raw)
}

fn round_to_cents(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        // Out of Decimal range: plain float rounding is as good as it gets
        .unwrap_or_else(|| (value * 100.0).round() / 100.0)
}

/// Weight category derived from BMI.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum Verdict {
    /// BMI under 18.5.
    #[serde(rename = "Underweight")]
    #[strum(serialize = "Underweight")]
    Underweight,
    /// BMI in [18.5, 24).
    #[serde(rename = "normal")]
    #[strum(serialize = "normal")]
    Normal,
    /// BMI in the overweight band (bounds depend on [`VerdictRule`]).
    #[serde(rename = "Overweight")]
    #[strum(serialize = "Overweight")]
    Overweight,
    /// Everything else.
    #[serde(rename = "Obese")]
    #[strum(serialize = "Obese")]
    Obese,
}

/// Which overweight band the classifier uses.
///
/// `Contiguous` treats `24 <= bmi < 30` as overweight. `Legacy` keeps the
/// historical `24.5 < bmi < 30` band, leaving `[24, 24.5]` classified obese.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VerdictRule {
    /// Contiguous overweight band.
    #[default]
    Contiguous,
    /// Historical band with a dead range at [24, 24.5].
    Legacy,
}

impl VerdictRule {
    /// Classify a BMI value. First matching threshold wins.
    pub fn classify(self, bmi: f64) -> Verdict {
        if bmi < UNDERWEIGHT_BELOW {
            return Verdict::Underweight;
        }
        if bmi < OVERWEIGHT_FROM {
            return Verdict::Normal;
        }

        let overweight = match self {
            VerdictRule::Contiguous => bmi < OBESE_FROM,
            VerdictRule::Legacy => bmi > LEGACY_OVERWEIGHT_ABOVE && bmi < OBESE_FROM,
        };

        if overweight {
            Verdict::Overweight
        } else {
            Verdict::Obese
        }
    }
}
