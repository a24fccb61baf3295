use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Comparison operators permitted in declarative configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "==")]
    Equal,
}

impl Comparison {
    /// Evaluate `value <op> threshold`.
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::LessOrEqual => value <= threshold,
            Comparison::GreaterOrEqual => value >= threshold,
            Comparison::Equal => (value - threshold).abs() < f64::EPSILON,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Comparison::LessOrEqual => "<=",
            Comparison::GreaterOrEqual => ">=",
            Comparison::Equal => "==",
        }
    }
}

impl Default for Comparison {
    fn default() -> Self {
        Comparison::GreaterOrEqual
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A contiguous value range mapped to a fixed score and label.
///
/// Intervals are half-open `[min, max)`; the final zone of a set is closed at
/// its upper bound so the theoretical maximum still resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub min: f64,
    pub max: f64,
    pub score: f64,
    pub label: String,
}

impl Zone {
    pub fn contains(&self, value: f64, is_last: bool) -> bool {
        if value < self.min {
            return false;
        }
        if is_last {
            value <= self.max
        } else {
            value < self.max
        }
    }
}

/// Named sub-metric of a composite algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub weight: f64,
    /// Key into the sample's field map supplying this component's raw value.
    pub field_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(flatten)]
    pub method: ComponentMethod,
}

/// Nested scoring rule applied to a single composite component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scoring_method", rename_all = "snake_case")]
pub enum ComponentMethod {
    Proportional {
        target: f64,
        #[serde(default = "super::full_credit")]
        maximum_cap: f64,
    },
    Zone {
        zones: Vec<Zone>,
    },
    Binary {
        threshold: f64,
        #[serde(default)]
        comparison: Comparison,
        #[serde(default = "super::full_credit")]
        success_value: f64,
        #[serde(default)]
        failure_value: f64,
    },
}

/// Matches a sample's categorical field against a set of category names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub category: String,
    pub category_values: BTreeSet<String>,
    pub threshold: f64,
    #[serde(default)]
    pub comparison: Comparison,
    #[serde(default = "super::full_credit")]
    pub success_value: f64,
    #[serde(default)]
    pub failure_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// One step of a variance-threshold lookup used by the sleep composite.
///
/// Bands are tested in ascending order; the first whose `variance <
/// max_variance` holds supplies the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceBand {
    pub max_variance: f64,
    pub score: f64,
}

/// One biomarker tier: a textual range spec paired with a score spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeTier {
    pub range: RangeBound,
    pub score: TierScore,
}

/// Parsed form of a biomarker range string: `"low-high"`, `"<X"`, or `">X"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeBound {
    /// Inclusive at both ends.
    Bounded { low: f64, high: f64 },
    /// Strictly below the bound.
    Below(f64),
    /// Strictly above the bound.
    Above(f64),
}

impl RangeBound {
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            RangeBound::Bounded { low, high } => value >= low && value <= high,
            RangeBound::Below(bound) => value < bound,
            RangeBound::Above(bound) => value > bound,
        }
    }
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RangeBound::Bounded { low, high } => write!(f, "{low}-{high}"),
            RangeBound::Below(bound) => write!(f, "<{bound}"),
            RangeBound::Above(bound) => write!(f, ">{bound}"),
        }
    }
}

impl std::str::FromStr for RangeBound {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if let Some(rest) = trimmed.strip_prefix('<') {
            let bound = parse_number(rest)?;
            return Ok(RangeBound::Below(bound));
        }
        if let Some(rest) = trimmed.strip_prefix('>') {
            let bound = parse_number(rest)?;
            return Ok(RangeBound::Above(bound));
        }
        let (low, high) = parse_pair(trimmed)?;
        Ok(RangeBound::Bounded { low, high })
    }
}

impl Serialize for RangeBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RangeBound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Score spec for a biomarker tier: a fixed number or `"linear:s1-s2"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TierScore {
    Fixed(f64),
    Linear { start: f64, end: f64 },
}

impl Serialize for TierScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            TierScore::Fixed(score) => serializer.serialize_f64(score),
            TierScore::Linear { start, end } => {
                serializer.serialize_str(&format!("linear:{start}-{end}"))
            }
        }
    }
}

impl<'de> Deserialize<'de> for TierScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(score) => Ok(TierScore::Fixed(score)),
            Repr::Text(raw) => {
                let spec = raw.trim();
                let rest = spec
                    .strip_prefix("linear:")
                    .ok_or_else(|| D::Error::custom(format!("unrecognized score spec '{raw}'")))?;
                let (start, end) = parse_pair(rest).map_err(D::Error::custom)?;
                Ok(TierScore::Linear { start, end })
            }
        }
    }
}

fn parse_number(raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| format!("'{raw}' is not a number"))
}

/// Split `"a-b"` into two numbers, tolerating a leading sign on `a`.
fn parse_pair(raw: &str) -> Result<(f64, f64), String> {
    let trimmed = raw.trim();
    let split_at = trimmed
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '-')
        .map(|(i, _)| i)
        .ok_or_else(|| format!("'{raw}' is not a low-high pair"))?;
    let low = parse_number(&trimmed[..split_at])?;
    let high = parse_number(&trimmed[split_at + 1..])?;
    Ok((low, high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_semantics_cover_all_operators() {
        assert!(Comparison::LessOrEqual.holds(1.0, 1.0));
        assert!(!Comparison::LessOrEqual.holds(1.1, 1.0));
        assert!(Comparison::GreaterOrEqual.holds(2.0, 1.0));
        assert!(Comparison::Equal.holds(3.0, 3.0));
        assert!(!Comparison::Equal.holds(3.0, 3.0001));
    }

    #[test]
    fn zone_boundary_belongs_to_upper_zone() {
        let lower = Zone {
            min: 0.0,
            max: 5.0,
            score: 25.0,
            label: "low".to_string(),
        };
        let upper = Zone {
            min: 5.0,
            max: 10.0,
            score: 100.0,
            label: "high".to_string(),
        };
        assert!(!lower.contains(5.0, false));
        assert!(upper.contains(5.0, false));
        assert!(upper.contains(10.0, true), "last zone closes its upper bound");
        assert!(!upper.contains(10.0, false));
    }

    #[test]
    fn range_bounds_parse_and_round_trip() {
        let bounded: RangeBound = "3.5-7.2".parse().expect("bounded range parses");
        assert_eq!(
            bounded,
            RangeBound::Bounded {
                low: 3.5,
                high: 7.2
            }
        );
        assert!(bounded.matches(3.5));
        assert!(bounded.matches(7.2));
        assert!(!bounded.matches(7.21));

        let below: RangeBound = "<0.4".parse().expect("below range parses");
        assert!(below.matches(0.39));
        assert!(!below.matches(0.4));

        let above: RangeBound = ">5".parse().expect("above range parses");
        assert!(above.matches(5.1));
        assert!(!above.matches(5.0));

        let json = serde_json::to_string(&bounded).expect("serializes");
        let back: RangeBound = serde_json::from_str(&json).expect("reparses");
        assert_eq!(bounded, back);
    }

    #[test]
    fn tier_scores_accept_numbers_and_linear_specs() {
        let fixed: TierScore = serde_json::from_str("85").expect("number parses");
        assert_eq!(fixed, TierScore::Fixed(85.0));

        let linear: TierScore = serde_json::from_str("\"linear:60-100\"").expect("spec parses");
        assert_eq!(
            linear,
            TierScore::Linear {
                start: 60.0,
                end: 100.0
            }
        );

        let bad: Result<TierScore, _> = serde_json::from_str("\"quadratic:1-2\"");
        assert!(bad.is_err(), "unknown score specs are rejected");
    }

    #[test]
    fn negative_lower_bounds_parse() {
        let bound: RangeBound = "-5-5".parse().expect("signed pair parses");
        assert_eq!(
            bound,
            RangeBound::Bounded {
                low: -5.0,
                high: 5.0
            }
        );
    }
}
