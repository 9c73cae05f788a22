//! Score computation types: inputs, parameters and results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Pollutant Readings ==
/// Pollutant concentrations for one district, in µg/m³.
///
/// Fetched from a remote provider; these are the external inputs of the
/// score calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantReadings {
    pub pm25: f64,
    pub pm10: f64,
    pub no2: f64,
    pub o3: f64,
    /// When the provider observed these values
    pub observed_at: DateTime<Utc>,
}

// == Exposure Profile ==
/// Population sensitivity band a score is tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    General,
    Sensitive,
    HighRisk,
}

impl Sensitivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Sensitivity::General => "general",
            Sensitivity::Sensitive => "sensitive",
            Sensitivity::HighRisk => "high-risk",
        }
    }
}

/// Parameters that influence the score besides the readings themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExposureProfile {
    pub sensitivity: Sensitivity,
    /// Averaging window the score is computed over
    pub window_hours: u32,
}

impl Default for ExposureProfile {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::General,
            window_hours: 24,
        }
    }
}

// == Score Request ==
/// Request for a computed score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub district_id: String,
    pub profile: ExposureProfile,
}

impl ScoreRequest {
    pub fn new(district_id: impl Into<String>, profile: ExposureProfile) -> Self {
        Self {
            district_id: district_id.into(),
            profile,
        }
    }

    /// Deterministic cache key covering every field that affects the result.
    ///
    /// Two requests with identical effective inputs always map to the same
    /// cache entry and the same in-flight computation.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}h",
            self.district_id,
            self.profile.sensitivity.as_str(),
            self.profile.window_hours
        )
    }
}

// == Score Category ==
/// Banded interpretation of a score value for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreCategory {
    Good,
    Moderate,
    Unhealthy,
    Hazardous,
}

impl ScoreCategory {
    /// Bands a raw score value.
    pub fn for_value(value: f64) -> Self {
        if value < 50.0 {
            ScoreCategory::Good
        } else if value < 100.0 {
            ScoreCategory::Moderate
        } else if value < 200.0 {
            ScoreCategory::Unhealthy
        } else {
            ScoreCategory::Hazardous
        }
    }
}

// == Air Quality Score ==
/// A computed air-quality score for one district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityScore {
    pub district_id: String,
    pub value: f64,
    pub category: ScoreCategory,
    pub computed_at: DateTime<Utc>,
}

// == Compute Source ==
/// How a score reached the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeSource {
    /// Fresh hit in the service's result cache
    Cached,
    /// Attached to another caller's in-flight computation
    Deduplicated,
    /// Computed by this call
    Computed,
}

/// A score plus how it was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreOutcome {
    pub score: AirQualityScore,
    pub source: ComputeSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = ScoreRequest::new("d-1", ExposureProfile::default());
        let b = ScoreRequest::new("d-1", ExposureProfile::default());
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_covers_every_parameter() {
        let base = ScoreRequest::new("d-1", ExposureProfile::default());

        let other_district = ScoreRequest::new("d-2", ExposureProfile::default());
        let other_sensitivity = ScoreRequest::new(
            "d-1",
            ExposureProfile {
                sensitivity: Sensitivity::Sensitive,
                ..ExposureProfile::default()
            },
        );
        let other_window = ScoreRequest::new(
            "d-1",
            ExposureProfile {
                window_hours: 8,
                ..ExposureProfile::default()
            },
        );

        assert_ne!(base.cache_key(), other_district.cache_key());
        assert_ne!(base.cache_key(), other_sensitivity.cache_key());
        assert_ne!(base.cache_key(), other_window.cache_key());
    }

    #[test]
    fn test_score_category_banding() {
        assert_eq!(ScoreCategory::for_value(0.0), ScoreCategory::Good);
        assert_eq!(ScoreCategory::for_value(49.9), ScoreCategory::Good);
        assert_eq!(ScoreCategory::for_value(50.0), ScoreCategory::Moderate);
        assert_eq!(ScoreCategory::for_value(150.0), ScoreCategory::Unhealthy);
        assert_eq!(ScoreCategory::for_value(250.0), ScoreCategory::Hazardous);
    }
}
