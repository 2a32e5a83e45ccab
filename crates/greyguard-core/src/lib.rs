use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use rand::Rng;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

mod catalog;

pub const SYMPTOMS_REQUIRED: &str = "Symptoms are required";
pub const MATCH_THRESHOLD: u32 = 70;
pub const MAX_MATCHES: usize = 3;
pub const JITTER_RANGE: u32 = 10;
pub const MAX_SCORE: u32 = 100;
pub const REGISTRY_BASE_URL: &str = "https://clinicaltrials.gov/study";

pub const STAGE_PHRASES: [&str; 2] = ["stage 3", "stage iii"];
pub const STAGE_CRITERIA_MARKER: &str = "stage iii";
pub const STAGE_BOOST: u32 = 10;
pub const BIOMARKERS: [&str; 2] = ["egfr", "her2"];
pub const BIOMARKER_BOOST: u32 = 15;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum MatchError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("trial not found: {0}")]
    TrialNotFound(String),
    #[error("catalog error: {0}")]
    CatalogInvalid(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TrialPhase {
    #[serde(rename = "Phase 1")]
    Phase1,
    #[serde(rename = "Phase 2")]
    Phase2,
    #[serde(rename = "Phase 2/3")]
    Phase2Phase3,
    #[serde(rename = "Phase 3")]
    Phase3,
    #[serde(rename = "Phase 4")]
    Phase4,
}

impl TrialPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Phase1 => "Phase 1",
            Self::Phase2 => "Phase 2",
            Self::Phase2Phase3 => "Phase 2/3",
            Self::Phase3 => "Phase 3",
            Self::Phase4 => "Phase 4",
        }
    }
}

impl Display for TrialPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TrialStatus {
    Recruiting,
    #[serde(rename = "Active, not recruiting")]
    ActiveNotRecruiting,
    Completed,
    Terminated,
}

impl TrialStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recruiting => "Recruiting",
            Self::ActiveNotRecruiting => "Active, not recruiting",
            Self::Completed => "Completed",
            Self::Terminated => "Terminated",
        }
    }
}

impl Display for TrialStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the trial catalog, in wire shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub phase: TrialPhase,
    pub status: TrialStatus,
    pub sponsor: String,
    pub locations: Vec<String>,
    pub criteria: String,
    pub participants: u32,
    pub contact: String,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date")]
    pub end_date: Date,
}

impl TrialRecord {
    #[must_use]
    pub fn url(&self) -> String {
        format!("{REGISTRY_BASE_URL}/{}", self.id)
    }

    /// Lower-cased title, description and criteria, joined by newlines.
    #[must_use]
    pub fn searchable_text(&self) -> String {
        format!("{}\n{}\n{}", self.title, self.description, self.criteria).to_lowercase()
    }

    /// Validate the static invariants of a catalog entry.
    ///
    /// # Errors
    /// Returns [`MatchError::CatalogInvalid`] naming the offending trial and field.
    pub fn validate(&self) -> Result<(), MatchError> {
        let invalid = |reason: &str| {
            Err(MatchError::CatalogInvalid(format!("trial {:?}: {reason}", self.id)))
        };

        if self.id.trim().is_empty() {
            return invalid("id must not be empty");
        }
        if self.title.trim().is_empty() {
            return invalid("title must not be empty");
        }
        if self.participants == 0 {
            return invalid("participants must be positive");
        }
        if self.end_date < self.start_date {
            return invalid("endDate must not precede startDate");
        }
        if !self.contact.contains('@') {
            return invalid("contact must be an email address");
        }
        if self.locations.is_empty() {
            return invalid("at least one location is required");
        }
        Ok(())
    }
}

/// Immutable, validated set of trials. There is no mutation path after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    trials: Vec<TrialRecord>,
}

impl Catalog {
    /// Build a catalog after validating every record and id uniqueness.
    ///
    /// # Errors
    /// Returns [`MatchError::CatalogInvalid`] when a record fails validation or an id repeats.
    pub fn new(trials: Vec<TrialRecord>) -> Result<Self, MatchError> {
        let mut seen = BTreeSet::new();
        for trial in &trials {
            trial.validate()?;
            if !seen.insert(trial.id.as_str()) {
                return Err(MatchError::CatalogInvalid(format!("duplicate trial id {:?}", trial.id)));
            }
        }
        Ok(Self { trials })
    }

    /// The catalog compiled into the binary.
    ///
    /// # Errors
    /// Returns an error only if the built-in records violate catalog invariants.
    pub fn builtin() -> Result<Self, MatchError> {
        Self::new(catalog::builtin_records())
    }

    /// Parse a JSON array of trial records in wire shape.
    ///
    /// # Errors
    /// Returns [`MatchError::CatalogInvalid`] on malformed JSON or invalid records.
    pub fn from_json(input: &str) -> Result<Self, MatchError> {
        let trials: Vec<TrialRecord> = serde_json::from_str(input)
            .map_err(|err| MatchError::CatalogInvalid(format!("malformed catalog JSON: {err}")))?;
        Self::new(trials)
    }

    #[must_use]
    pub fn trials(&self) -> &[TrialRecord] {
        &self.trials
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TrialRecord> {
        self.trials.iter().find(|trial| trial.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionKeyword {
    pub term: &'static str,
    pub weight: u32,
}

/// Condition terms checked against trial titles. General `cancer` weighs less than the
/// site-specific terms.
pub const CONDITION_KEYWORDS: [ConditionKeyword; 5] = [
    ConditionKeyword { term: "breast", weight: 95 },
    ConditionKeyword { term: "lung", weight: 95 },
    ConditionKeyword { term: "alzheimer", weight: 90 },
    ConditionKeyword { term: "diabetes", weight: 90 },
    ConditionKeyword { term: "cancer", weight: 85 },
];

/// Trimmed, lower-cased symptom text. Construction rejects blank input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symptoms(String);

impl Symptoms {
    /// # Errors
    /// Returns [`MatchError::InvalidRequest`] when the text is empty after trimming.
    pub fn parse(raw: &str) -> Result<Self, MatchError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MatchError::InvalidRequest(SYMPTOMS_REQUIRED.to_string()));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Keyword score before jitter. Pure and deterministic.
#[must_use]
pub fn score_trial(symptoms: &Symptoms, trial: &TrialRecord) -> u32 {
    let symptoms = symptoms.as_str();
    let title = trial.title.to_lowercase();
    let criteria = trial.criteria.to_lowercase();
    let searchable = trial.searchable_text();

    let mut score = CONDITION_KEYWORDS
        .iter()
        .filter(|keyword| symptoms.contains(keyword.term) && title.contains(keyword.term))
        .map(|keyword| keyword.weight)
        .sum::<u32>();

    if STAGE_PHRASES.iter().any(|phrase| symptoms.contains(phrase))
        && criteria.contains(STAGE_CRITERIA_MARKER)
    {
        score += STAGE_BOOST;
    }

    for marker in BIOMARKERS {
        if symptoms.contains(marker) && searchable.contains(marker) {
            score += BIOMARKER_BOOST;
        }
    }

    score
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredTrial<'a> {
    pub trial: &'a TrialRecord,
    pub base_score: u32,
    pub match_score: u32,
}

/// Score every trial, keep those whose base score clears [`MATCH_THRESHOLD`], add jitter,
/// and return the best [`MAX_MATCHES`] in descending score order. Equal scores keep
/// catalog order.
pub fn rank_trials<'a, R>(
    catalog: &'a Catalog,
    symptoms: &Symptoms,
    rng: &mut R,
) -> Vec<ScoredTrial<'a>>
where
    R: Rng + ?Sized,
{
    let mut scored = catalog
        .trials()
        .iter()
        .filter_map(|trial| {
            let base_score = score_trial(symptoms, trial);
            if base_score <= MATCH_THRESHOLD {
                return None;
            }
            let jitter = rng.gen_range(0..JITTER_RANGE);
            Some(ScoredTrial {
                trial,
                base_score,
                match_score: base_score.saturating_add(jitter).min(MAX_SCORE),
            })
        })
        .collect::<Vec<_>>();

    scored.sort_by(|lhs, rhs| rhs.match_score.cmp(&lhs.match_score));
    scored.truncate(MAX_MATCHES);
    scored
}

/// Synthetic provenance attached to each match.
///
/// None of these fields carry cryptographic meaning: the identifier and the
/// transaction reference are random hex, and nothing is anchored or proven anywhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    pub proof_id: String,
    pub timestamp: String,
    pub transaction_reference: String,
}

impl ProofBundle {
    /// # Errors
    /// Returns [`MatchError::Internal`] when the timestamp cannot be formatted.
    pub fn simulated<R>(rng: &mut R, now: OffsetDateTime) -> Result<Self, MatchError>
    where
        R: Rng + ?Sized,
    {
        let proof_id = format!("zkp_{}", hex::encode(rng.gen::<[u8; 16]>()));
        let transaction_reference = hex::encode(rng.gen::<[u8; 32]>());
        Ok(Self { proof_id, timestamp: format_rfc3339(now)?, transaction_reference })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    #[serde(flatten)]
    pub trial: TrialRecord,
    pub match_score: u32,
    pub url: String,
    pub proof: ProofBundle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrialListing {
    #[serde(flatten)]
    pub trial: TrialRecord,
    pub url: String,
}

impl From<&TrialRecord> for TrialListing {
    fn from(trial: &TrialRecord) -> Self {
        Self { url: trial.url(), trial: trial.clone() }
    }
}

/// Rank the catalog for `symptoms` and attach a fresh proof bundle to each match.
///
/// # Errors
/// Returns [`MatchError::Internal`] when proof generation fails.
pub fn match_trials<R>(
    catalog: &Catalog,
    symptoms: &Symptoms,
    rng: &mut R,
    now: OffsetDateTime,
) -> Result<Vec<MatchResult>, MatchError>
where
    R: Rng + ?Sized,
{
    let ranked = rank_trials(catalog, symptoms, rng);
    ranked
        .into_iter()
        .map(|scored| {
            Ok(MatchResult {
                url: scored.trial.url(),
                trial: scored.trial.clone(),
                match_score: scored.match_score,
                proof: ProofBundle::simulated(rng, now)?,
            })
        })
        .collect()
}

/// # Errors
/// Returns [`MatchError::Internal`] when the value is outside the RFC 3339 range.
pub fn format_rfc3339(value: OffsetDateTime) -> Result<String, MatchError> {
    value
        .format(&Rfc3339)
        .map_err(|err| MatchError::Internal(format!("failed to format timestamp: {err}")))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use time::macros::date;

    use super::*;

    fn builtin() -> Catalog {
        match Catalog::builtin() {
            Ok(catalog) => catalog,
            Err(err) => panic!("built-in catalog should be valid: {err}"),
        }
    }

    fn symptoms(raw: &str) -> Symptoms {
        match Symptoms::parse(raw) {
            Ok(value) => value,
            Err(err) => panic!("fixture symptoms {raw:?} should parse: {err}"),
        }
    }

    fn fixture_time() -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(1_700_000_000)
    }

    fn mk_trial(id: &str, title: &str, criteria: &str) -> TrialRecord {
        TrialRecord {
            id: id.to_string(),
            title: title.to_string(),
            description: "fixture description".to_string(),
            phase: TrialPhase::Phase2,
            status: TrialStatus::Recruiting,
            sponsor: "Fixture Sponsor".to_string(),
            locations: vec!["Anywhere, USA".to_string()],
            criteria: criteria.to_string(),
            participants: 10,
            contact: "fixture@example.org".to_string(),
            start_date: date!(2024 - 01 - 01),
            end_date: date!(2024 - 12 - 31),
        }
    }

    fn base_score_of(catalog: &Catalog, id: &str, input: &str) -> u32 {
        let trial = catalog.get(id).unwrap_or_else(|| panic!("missing fixture trial {id}"));
        score_trial(&symptoms(input), trial)
    }

    fn ranked_ids(catalog: &Catalog, input: &str, seed: u64) -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(seed);
        rank_trials(catalog, &symptoms(input), &mut rng)
            .into_iter()
            .map(|scored| scored.trial.id.clone())
            .collect()
    }

    #[test]
    fn builtin_catalog_is_valid_and_ordered() {
        let catalog = builtin();
        let ids = catalog.trials().iter().map(|trial| trial.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["NCT04556747", "NCT03945682", "NCT04388982", "NCT04712344"]);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn symptoms_reject_blank_input() {
        for raw in ["", "   ", "\t\n "] {
            assert_eq!(
                Symptoms::parse(raw),
                Err(MatchError::InvalidRequest(SYMPTOMS_REQUIRED.to_string()))
            );
        }
    }

    #[test]
    fn symptoms_are_trimmed_and_lowercased() {
        assert_eq!(symptoms("  Stage 3 BREAST Cancer \n").as_str(), "stage 3 breast cancer");
    }

    #[test]
    fn breast_cancer_stage_three_scores_keyword_and_stage_boost() {
        let catalog = builtin();
        assert_eq!(base_score_of(&catalog, "NCT04556747", "Stage 3 breast cancer"), 95 + 85 + 10);
        assert_eq!(base_score_of(&catalog, "NCT03945682", "Stage 3 breast cancer"), 85 + 10);
        assert_eq!(base_score_of(&catalog, "NCT04388982", "Stage 3 breast cancer"), 0);
        assert_eq!(base_score_of(&catalog, "NCT04712344", "Stage 3 breast cancer"), 0);
    }

    #[test]
    fn roman_numeral_stage_phrase_also_boosts() {
        let catalog = builtin();
        assert_eq!(base_score_of(&catalog, "NCT04556747", "stage iii breast"), 95 + 10);
    }

    #[test]
    fn biomarkers_boost_independently() {
        let catalog = builtin();
        assert_eq!(base_score_of(&catalog, "NCT03945682", "EGFR positive lung cancer"), 95 + 85 + 15);
        assert_eq!(base_score_of(&catalog, "NCT04556747", "EGFR positive lung cancer"), 85);
        assert_eq!(base_score_of(&catalog, "NCT04556747", "her2 egfr breast"), 95 + 15);
    }

    #[test]
    fn stage_boost_requires_stage_three_in_criteria() {
        let catalog = builtin();
        assert_eq!(base_score_of(&catalog, "NCT04712344", "stage 3 diabetes"), 90);
    }

    #[test]
    fn keyword_must_appear_in_title_not_only_description() {
        let catalog = match Catalog::new(vec![TrialRecord {
            description: "Includes lung cancer survivors".to_string(),
            ..mk_trial("NCT00000001", "Cardiac Rehabilitation Study", "Adults 40+")
        }]) {
            Ok(catalog) => catalog,
            Err(err) => panic!("fixture catalog should be valid: {err}"),
        };
        assert_eq!(base_score_of(&catalog, "NCT00000001", "lung cancer"), 0);
    }

    #[test]
    fn breast_scenario_ranks_breast_trial_first_with_high_score() {
        let catalog = builtin();
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let ranked = rank_trials(&catalog, &symptoms("Stage 3 breast cancer"), &mut rng);
            let breast = ranked
                .iter()
                .find(|scored| scored.trial.id == "NCT04556747")
                .unwrap_or_else(|| panic!("breast trial missing for seed {seed}"));
            assert_eq!(breast.match_score, MAX_SCORE);
            assert_eq!(ranked.first().map(|scored| scored.trial.id.as_str()), Some("NCT04556747"));
        }
    }

    #[test]
    fn egfr_lung_scenario_includes_lung_trial() {
        let catalog = builtin();
        let ids = ranked_ids(&catalog, "EGFR positive lung cancer", 7);
        assert!(ids.contains(&"NCT03945682".to_string()));
    }

    #[test]
    fn headache_yields_no_matches() {
        let catalog = builtin();
        assert!(ranked_ids(&catalog, "headache", 1).is_empty());
    }

    #[test]
    fn diabetes_scenario_returns_only_diabetes_trial() {
        let catalog = builtin();
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let ranked = rank_trials(&catalog, &symptoms("diabetes management"), &mut rng);
            assert_eq!(ranked.len(), 1);
            assert_eq!(ranked[0].trial.id, "NCT04712344");
            assert_eq!(ranked[0].base_score, 90);
            assert!((90..100).contains(&ranked[0].match_score));
        }
    }

    #[test]
    fn boosts_alone_never_clear_threshold_regardless_of_jitter() {
        let catalog = match Catalog::new(vec![mk_trial(
            "NCT00000002",
            "Targeted Oncology Study",
            "Stage III disease, HER2 and EGFR testing required",
        )]) {
            Ok(catalog) => catalog,
            Err(err) => panic!("fixture catalog should be valid: {err}"),
        };
        assert_eq!(base_score_of(&catalog, "NCT00000002", "stage 3 her2 egfr"), 40);
        for seed in 0..64 {
            assert!(ranked_ids(&catalog, "stage 3 her2 egfr", seed).is_empty());
        }
    }

    #[test]
    fn equal_scores_keep_catalog_order() {
        let catalog = match Catalog::new(vec![
            mk_trial("NCT00000010", "Breast Cancer Study A", "Adults"),
            mk_trial("NCT00000011", "Breast Cancer Study B", "Adults"),
            mk_trial("NCT00000012", "Breast Cancer Study C", "Adults"),
            mk_trial("NCT00000013", "Breast Cancer Study D", "Adults"),
        ]) {
            Ok(catalog) => catalog,
            Err(err) => panic!("fixture catalog should be valid: {err}"),
        };
        for seed in 0..16 {
            assert_eq!(
                ranked_ids(&catalog, "breast cancer", seed),
                vec!["NCT00000010", "NCT00000011", "NCT00000012"]
            );
        }
    }

    #[test]
    fn catalog_rejects_invalid_records() {
        let cases = [
            (TrialRecord { participants: 0, ..mk_trial("NCT1", "T", "C") }, "participants"),
            (
                TrialRecord { end_date: date!(2023 - 12 - 31), ..mk_trial("NCT2", "T", "C") },
                "endDate",
            ),
            (TrialRecord { contact: "nobody".to_string(), ..mk_trial("NCT3", "T", "C") }, "contact"),
            (TrialRecord { locations: Vec::new(), ..mk_trial("NCT4", "T", "C") }, "location"),
            (mk_trial(" ", "T", "C"), "id"),
        ];
        for (record, expected) in cases {
            match Catalog::new(vec![record]) {
                Err(MatchError::CatalogInvalid(message)) => {
                    assert!(message.contains(expected), "{message} should mention {expected}");
                }
                other => panic!("expected CatalogInvalid mentioning {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn catalog_rejects_duplicate_ids() {
        let result = Catalog::new(vec![mk_trial("NCT9", "A", "C"), mk_trial("NCT9", "B", "C")]);
        assert!(matches!(result, Err(MatchError::CatalogInvalid(message)) if message.contains("duplicate")));
    }

    #[test]
    fn catalog_from_json_reads_wire_shape() {
        let input = serde_json::json!([{
            "id": "NCT05000001",
            "title": "Phase 2/3 Lung Cancer Screening",
            "description": "Low-dose CT screening",
            "phase": "Phase 2/3",
            "status": "Active, not recruiting",
            "sponsor": "Fixture Health",
            "locations": ["Denver, CO"],
            "criteria": "Adults 50-80",
            "participants": 200,
            "contact": "screening@example.org",
            "startDate": "2024-03-01",
            "endDate": "2025-03-01"
        }])
        .to_string();

        let catalog = match Catalog::from_json(&input) {
            Ok(catalog) => catalog,
            Err(err) => panic!("catalog JSON should parse: {err}"),
        };
        let trial = catalog.get("NCT05000001").unwrap_or_else(|| panic!("trial should be present"));
        assert_eq!(trial.phase, TrialPhase::Phase2Phase3);
        assert_eq!(trial.status, TrialStatus::ActiveNotRecruiting);
        assert_eq!(trial.start_date, date!(2024 - 03 - 01));
    }

    #[test]
    fn catalog_from_json_rejects_malformed_input() {
        assert!(matches!(
            Catalog::from_json("{\"not\": \"an array\"}"),
            Err(MatchError::CatalogInvalid(message)) if message.contains("malformed")
        ));
    }

    #[test]
    fn match_results_carry_url_and_simulated_proof() {
        let catalog = builtin();
        let mut rng = StdRng::seed_from_u64(11);
        let results =
            match match_trials(&catalog, &symptoms("EGFR lung cancer"), &mut rng, fixture_time()) {
                Ok(results) => results,
                Err(err) => panic!("matching should succeed: {err}"),
            };
        assert!(!results.is_empty());
        for result in &results {
            assert_eq!(result.url, format!("https://clinicaltrials.gov/study/{}", result.trial.id));
            assert!(result.proof.proof_id.starts_with("zkp_"));
            assert_eq!(result.proof.proof_id.len(), 4 + 32);
            assert_eq!(result.proof.transaction_reference.len(), 64);
            assert!(result.proof.transaction_reference.chars().all(|c| c.is_ascii_hexdigit()));
            assert_eq!(result.proof.timestamp, "2023-11-14T22:13:20Z");
        }
    }

    #[test]
    fn match_result_serializes_flat_camel_case_fields() {
        let catalog = builtin();
        let mut rng = StdRng::seed_from_u64(3);
        let results =
            match match_trials(&catalog, &symptoms("diabetes"), &mut rng, fixture_time()) {
                Ok(results) => results,
                Err(err) => panic!("matching should succeed: {err}"),
            };
        let value = match serde_json::to_value(&results[0]) {
            Ok(value) => value,
            Err(err) => panic!("match result should serialize: {err}"),
        };
        assert_eq!(value.get("id").and_then(serde_json::Value::as_str), Some("NCT04712344"));
        assert_eq!(value.get("phase").and_then(serde_json::Value::as_str), Some("Phase 4"));
        assert_eq!(value.get("startDate").and_then(serde_json::Value::as_str), Some("2024-02-01"));
        assert!(value.get("matchScore").and_then(serde_json::Value::as_u64).is_some());
        assert!(value.get("proof").and_then(|proof| proof.get("transactionReference")).is_some());
    }

    const VOCABULARY: [&str; 16] = [
        "breast", "lung", "alzheimer", "diabetes", "cancer", "stage 3", "stage iii", "egfr",
        "her2", "headache", "fatigue", "cough", "memory loss", "positive", "type 2", "pain",
    ];

    fn symptom_text() -> impl Strategy<Value = String> {
        prop::collection::vec(prop::sample::select(VOCABULARY.to_vec()), 1..6)
            .prop_map(|words| words.join(" "))
    }

    proptest! {
        #[test]
        fn property_ranking_respects_threshold_order_and_bounds(text in symptom_text(), seed in any::<u64>()) {
            let catalog = builtin();
            let parsed = symptoms(&text);
            let mut rng = StdRng::seed_from_u64(seed);
            let ranked = rank_trials(&catalog, &parsed, &mut rng);

            let qualifying = catalog
                .trials()
                .iter()
                .filter(|trial| score_trial(&parsed, trial) > MATCH_THRESHOLD)
                .count();
            prop_assert_eq!(ranked.len(), qualifying.min(MAX_MATCHES));

            for scored in &ranked {
                prop_assert!(scored.base_score > MATCH_THRESHOLD);
                prop_assert_eq!(scored.base_score, score_trial(&parsed, scored.trial));
                prop_assert!(scored.match_score <= MAX_SCORE);
                let floor = scored.base_score.min(MAX_SCORE);
                prop_assert!(scored.match_score >= floor);
                prop_assert!(scored.match_score - floor < JITTER_RANGE);
            }
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].match_score >= pair[1].match_score);
            }
        }

        #[test]
        fn property_membership_is_stable_when_at_most_three_qualify(text in symptom_text(), seed_a in any::<u64>(), seed_b in any::<u64>()) {
            let catalog = builtin();
            let parsed = symptoms(&text);
            let qualifying = catalog
                .trials()
                .iter()
                .filter(|trial| score_trial(&parsed, trial) > MATCH_THRESHOLD)
                .count();
            prop_assume!(qualifying <= MAX_MATCHES);

            let mut first = ranked_ids(&catalog, &text, seed_a);
            let mut second = ranked_ids(&catalog, &text, seed_b);
            first.sort();
            second.sort();
            prop_assert_eq!(first, second);
        }
    }
}
