use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use greyguard_core::{
    format_rfc3339, Catalog, MatchError, MatchResult, Symptoms, TrialListing,
};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use ulid::Ulid;

pub const API_CONTRACT_VERSION: &str = "api.v1";
pub const DEFAULT_LOCATION: &str = "any";
pub const PATIENT_ID_PREFIX: &str = "patient_";
pub const MATCH_FAILED: &str = "Failed to match trials";
pub const TRIAL_NOT_FOUND: &str = "Trial not found";

/// Caller-supplied match request. Only `symptoms` is required; it is kept optional here so
/// a missing field reports the same validation error as a blank one. `age` and `patientId`
/// never fail the request: unusable values are dropped and defaulted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_age")]
    pub age: Option<NonZeroU32>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub patient_id: Option<String>,
}

fn lenient_age<'de, D>(deserializer: D) -> Result<Option<NonZeroU32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let age = raw.as_ref().and_then(age_from_value);
    if let Some(value) = raw.as_ref().filter(|value| !value.is_null() && age.is_none()) {
        tracing::debug!(%value, "ignoring age that is not a positive integer");
    }
    Ok(age)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn age_from_value(value: &Value) -> Option<NonZeroU32> {
    let whole = match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|age| age.fract() == 0.0 && *age > 0.0 && *age <= f64::from(u32::MAX))
                .map(|age| age as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    u32::try_from(whole).ok().and_then(NonZeroU32::new)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Null) | None => None,
        Some(other) => {
            tracing::debug!(value = %other, "ignoring patient id that is not a string or number");
            None
        }
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub symptoms: Symptoms,
    pub location: String,
    pub age: Option<NonZeroU32>,
    pub patient_id: String,
}

impl MatchRequest {
    /// Validate symptoms and fill defaults for every optional field.
    ///
    /// # Errors
    /// Returns [`MatchError::InvalidRequest`] when symptoms are missing or blank.
    pub fn normalize(self) -> Result<NormalizedRequest, MatchError> {
        let symptoms = Symptoms::parse(self.symptoms.as_deref().unwrap_or_default())?;
        Ok(NormalizedRequest {
            symptoms,
            location: non_blank(self.location).unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            age: self.age,
            patient_id: non_blank(self.patient_id).unwrap_or_else(generate_patient_id),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

#[must_use]
pub fn generate_patient_id() -> String {
    format!("{PATIENT_ID_PREFIX}{}", Ulid::new().to_string().to_lowercase())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    pub processed_at: String,
    pub patient_id: String,
    pub match_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub success: bool,
    pub matches: Vec<MatchResult>,
    pub metadata: MatchMetadata,
}

/// Error body shared by every failing operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self { error: error.into(), details }
    }
}

impl From<&MatchError> for ErrorBody {
    fn from(err: &MatchError) -> Self {
        match err {
            MatchError::InvalidRequest(message) => Self::new(message.clone(), None),
            MatchError::TrialNotFound(id) => Self::new(TRIAL_NOT_FOUND, Some(id.clone())),
            MatchError::CatalogInvalid(_) | MatchError::Internal(_) => {
                Self::new(MATCH_FAILED, Some(err.to_string()))
            }
        }
    }
}

/// Runtime settings shared by every front end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatcherConfig {
    /// Delay a front end waits before answering a match, simulating model latency.
    pub artificial_latency: Duration,
}

impl MatcherConfig {
    #[must_use]
    pub fn with_latency_ms(latency_ms: u64) -> Self {
        Self { artificial_latency: Duration::from_millis(latency_ms) }
    }
}

/// Matching service handed to every front end. Cloning is cheap; the catalog is shared.
#[derive(Debug, Clone)]
pub struct TrialMatcherApi {
    catalog: Arc<Catalog>,
    config: MatcherConfig,
}

impl TrialMatcherApi {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: MatcherConfig) -> Self {
        Self { catalog, config }
    }

    /// Build the service from a JSON catalog file, or the built-in catalog when no path is given.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read or the catalog is invalid.
    pub fn load(catalog_path: Option<&Path>, config: MatcherConfig) -> Result<Self> {
        let catalog = match catalog_path {
            Some(path) => {
                let body = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read catalog file {}", path.display()))?;
                Catalog::from_json(&body)
                    .with_context(|| format!("invalid catalog file {}", path.display()))?
            }
            None => Catalog::builtin()?,
        };
        tracing::debug!(trials = catalog.len(), "trial catalog loaded");
        Ok(Self::new(Arc::new(catalog), config))
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> MatcherConfig {
        self.config
    }

    /// Match symptoms against the catalog using thread-local randomness and the current time.
    ///
    /// # Errors
    /// Returns [`MatchError::InvalidRequest`] for blank symptoms and
    /// [`MatchError::Internal`] for unexpected failures.
    pub fn match_trials(&self, request: MatchRequest) -> Result<MatchResponse, MatchError> {
        self.match_trials_with(request, &mut rand::thread_rng(), OffsetDateTime::now_utc())
    }

    /// Same as [`Self::match_trials`] with an explicit random source and clock reading.
    ///
    /// # Errors
    /// See [`Self::match_trials`].
    pub fn match_trials_with<R>(
        &self,
        request: MatchRequest,
        rng: &mut R,
        now: OffsetDateTime,
    ) -> Result<MatchResponse, MatchError>
    where
        R: Rng + ?Sized,
    {
        let request = request.normalize().inspect_err(|err| {
            tracing::debug!(error = %err, "match request rejected");
        })?;

        let matches = greyguard_core::match_trials(&self.catalog, &request.symptoms, rng, now)?;
        let processed_at = format_rfc3339(now)?;

        tracing::info!(match_count = matches.len(), "trial match completed");
        tracing::debug!(
            patient_id = %request.patient_id,
            location = %request.location,
            age = ?request.age,
            "trial match request details"
        );

        Ok(MatchResponse {
            success: true,
            metadata: MatchMetadata {
                processed_at,
                patient_id: request.patient_id,
                match_count: matches.len(),
            },
            matches,
        })
    }

    #[must_use]
    pub fn list_trials(&self) -> Vec<TrialListing> {
        self.catalog.trials().iter().map(TrialListing::from).collect()
    }

    /// # Errors
    /// Returns [`MatchError::TrialNotFound`] when no trial has the given id.
    pub fn get_trial(&self, trial_id: &str) -> Result<TrialListing, MatchError> {
        self.catalog
            .get(trial_id)
            .map(TrialListing::from)
            .ok_or_else(|| MatchError::TrialNotFound(trial_id.to_string()))
    }
}
