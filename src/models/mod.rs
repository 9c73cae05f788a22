//! Domain model for the tracker's data layer
//!
//! Plain serde records shared by the cache façade and the computation
//! service.

mod domain;
mod score;

pub use domain::{CacheSource, CachedResult, DistrictDetail, DistrictSummary};
pub use score::{
    AirQualityScore, ComputeSource, ExposureProfile, PollutantReadings, ScoreCategory,
    ScoreOutcome, ScoreRequest, Sensitivity,
};
