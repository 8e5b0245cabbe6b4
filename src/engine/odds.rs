//! Poisson tail probability and American-odds pricing for a threshold line.
//!
//! Pricing is a pure function of `(lambda, line)` and is applied on top of an
//! existing projection table, so a new line never requires re-projecting.

use super::projection::ProjectionResult;
use serde::Serialize;
use statrs::distribution::{DiscreteCDF, Poisson};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Rate substituted for non-positive or non-finite projections.
pub const LAMBDA_FLOOR: f64 = 0.01;
pub const PROB_MIN: f64 = 0.0001;
pub const PROB_MAX: f64 = 0.9999;

pub const LINE_MAX: f64 = 10.0;
pub const LINE_STEP: f64 = 0.5;
pub const DEFAULT_LINE: f64 = 3.5;

const STRONG_PROB: f64 = 0.70;
const MODERATE_PROB: f64 = 0.55;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    #[error("threshold line must be a finite number")]
    NotFinite,
    #[error("threshold line {0} outside 0 to 10")]
    OutOfRange(f64),
    #[error("threshold line {0} is not a multiple of 0.5")]
    OffGrid(f64),
    #[error("threshold line `{0}` is not a number")]
    Unparseable(String),
}

/// A validated bettor line: within `[0, 10]` on a 0.5 grid.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct ThresholdLine(f64);

impl ThresholdLine {
    pub fn new(line: f64) -> Result<Self, ThresholdError> {
        if !line.is_finite() {
            return Err(ThresholdError::NotFinite);
        }
        if !(0.0..=LINE_MAX).contains(&line) {
            return Err(ThresholdError::OutOfRange(line));
        }
        if (line / LINE_STEP).fract() != 0.0 {
            return Err(ThresholdError::OffGrid(line));
        }
        Ok(Self(line))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for ThresholdLine {
    fn default() -> Self {
        Self(DEFAULT_LINE)
    }
}

impl fmt::Display for ThresholdLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

impl FromStr for ThresholdLine {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v: f64 = s
            .trim()
            .parse()
            .map_err(|_| ThresholdError::Unparseable(s.to_string()))?;
        Self::new(v)
    }
}

/// `P(X >= line)` for `X ~ Poisson(lambda)`, i.e. `1 - CDF(floor(line - 1))`.
/// Not clipped.
pub fn prob_at_least(lambda: f64, line: f64) -> f64 {
    let rate = if lambda.is_finite() && lambda > 0.0 {
        lambda
    } else {
        LAMBDA_FLOOR
    };
    let k = (line - 1.0).floor();
    if k < 0.0 {
        return 1.0;
    }
    match Poisson::new(rate) {
        Ok(dist) => (1.0 - dist.cdf(k as u64)).max(0.0),
        // rate is positive and finite here
        Err(_) => 0.0,
    }
}

pub fn clip_probability(p: f64) -> f64 {
    if p.is_nan() {
        return PROB_MIN;
    }
    p.clamp(PROB_MIN, PROB_MAX)
}

/// Integer American odds. Favorites are negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AmericanOdds(i64);

impl AmericanOdds {
    /// `p` is clipped first, so the result is always finite.
    pub fn from_probability(p: f64) -> Self {
        let p = clip_probability(p);
        let raw = if p >= 0.5 {
            -100.0 * p / (1.0 - p)
        } else {
            100.0 * (1.0 - p) / p
        };
        Self(raw.round() as i64)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AmericanOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Signal {
    Weak,
    Moderate,
    Strong,
}

impl Signal {
    pub fn from_probability(p: f64) -> Self {
        if p >= STRONG_PROB {
            Signal::Strong
        } else if p >= MODERATE_PROB {
            Signal::Moderate
        } else {
            Signal::Weak
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Strong => "strong",
            Signal::Moderate => "moderate",
            Signal::Weak => "weak",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quote {
    pub line: ThresholdLine,
    /// Clipped to `[PROB_MIN, PROB_MAX]`.
    pub probability: f64,
    /// `probability * 100`, one decimal.
    pub probability_pct: f64,
    pub odds: AmericanOdds,
    pub signal: Signal,
}

impl Quote {
    pub fn price(lambda: f64, line: ThresholdLine) -> Self {
        let probability = clip_probability(prob_at_least(lambda, line.value()));
        Self {
            line,
            probability,
            probability_pct: (probability * 1000.0).round() / 10.0,
            odds: AmericanOdds::from_probability(probability),
            signal: Signal::from_probability(probability),
        }
    }
}

/// A projection row with a threshold applied.
#[derive(Debug, Clone, Copy)]
pub struct PricedProjection<'a> {
    pub projection: &'a ProjectionResult,
    pub quote: Quote,
}

/// Price every row against `line`. Input order is preserved.
pub fn apply_threshold<'a, I>(rows: I, line: ThresholdLine) -> Vec<PricedProjection<'a>>
where
    I: IntoIterator<Item = &'a ProjectionResult>,
{
    rows.into_iter()
        .map(|projection| PricedProjection {
            projection,
            quote: Quote::price(projection.final_projection, line),
        })
        .collect()
}

/// Strongest signal first, then highest probability, then name.
pub fn rank(priced: &mut [PricedProjection<'_>]) {
    priced.sort_by(|a, b| {
        b.quote
            .signal
            .cmp(&a.quote.signal)
            .then_with(|| {
                b.quote
                    .probability
                    .partial_cmp(&a.quote.probability)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.projection.player.cmp(&b.projection.player))
    });
}
