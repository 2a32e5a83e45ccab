use time::macros::date;

use crate::{TrialPhase, TrialRecord, TrialStatus};

/// Records shipped with the service when no catalog file is configured.
pub(crate) fn builtin_records() -> Vec<TrialRecord> {
    vec![
        TrialRecord {
            id: "NCT04556747".to_string(),
            title: "Phase 3 Immunotherapy for Breast Cancer".to_string(),
            description: "Randomized study of pembrolizumab combined with neoadjuvant \
                          chemotherapy in patients with HER2-negative breast cancer."
                .to_string(),
            phase: TrialPhase::Phase3,
            status: TrialStatus::Recruiting,
            sponsor: "Memorial Sloan Kettering Cancer Center".to_string(),
            locations: vec![
                "New York, NY".to_string(),
                "Boston, MA".to_string(),
                "Houston, TX".to_string(),
            ],
            criteria: "Adults 18+ with Stage III HER2-negative breast cancer, ECOG 0-1, \
                       no prior immunotherapy"
                .to_string(),
            participants: 450,
            contact: "breast.trials@mskcc.org".to_string(),
            start_date: date!(2023 - 01 - 15),
            end_date: date!(2026 - 12 - 31),
        },
        TrialRecord {
            id: "NCT03945682".to_string(),
            title: "EGFR-Targeted Therapy for Non-Small Cell Lung Cancer".to_string(),
            description: "Osimertinib versus platinum-based chemotherapy in EGFR \
                          mutation-positive advanced non-small cell lung cancer."
                .to_string(),
            phase: TrialPhase::Phase2,
            status: TrialStatus::Recruiting,
            sponsor: "Dana-Farber Cancer Institute".to_string(),
            locations: vec![
                "Boston, MA".to_string(),
                "Chicago, IL".to_string(),
                "San Francisco, CA".to_string(),
            ],
            criteria: "EGFR exon 19 deletion or L858R mutation, Stage IIIB-IV NSCLC, \
                       measurable disease per RECIST 1.1"
                .to_string(),
            participants: 320,
            contact: "lung.research@dfci.harvard.edu".to_string(),
            start_date: date!(2022 - 09 - 01),
            end_date: date!(2025 - 08 - 31),
        },
        TrialRecord {
            id: "NCT04388982".to_string(),
            title: "Novel Alzheimer's Disease Prevention Study".to_string(),
            description: "Anti-amyloid antibody therapy for individuals with early-stage \
                          Alzheimer's disease and confirmed amyloid pathology."
                .to_string(),
            phase: TrialPhase::Phase2Phase3,
            status: TrialStatus::ActiveNotRecruiting,
            sponsor: "Mayo Clinic".to_string(),
            locations: vec![
                "Rochester, MN".to_string(),
                "Jacksonville, FL".to_string(),
                "Phoenix, AZ".to_string(),
            ],
            criteria: "Ages 55-85, mild cognitive impairment, positive amyloid PET scan, \
                       study partner available"
                .to_string(),
            participants: 1200,
            contact: "alzheimers.research@mayo.edu".to_string(),
            start_date: date!(2022 - 06 - 01),
            end_date: date!(2027 - 06 - 30),
        },
        TrialRecord {
            id: "NCT04712344".to_string(),
            title: "Type 2 Diabetes Digital Therapeutics Trial".to_string(),
            description: "Continuous glucose monitoring combined with a guided lifestyle \
                          coaching program for glycemic control."
                .to_string(),
            phase: TrialPhase::Phase4,
            status: TrialStatus::Recruiting,
            sponsor: "Joslin Diabetes Center".to_string(),
            locations: vec!["Boston, MA".to_string(), "Remote / Virtual".to_string()],
            criteria: "Adults 30-70 with type 2 diabetes, HbA1c 7.0-10.0%, smartphone access"
                .to_string(),
            participants: 800,
            contact: "diabetes.trials@joslin.harvard.edu".to_string(),
            start_date: date!(2024 - 02 - 01),
            end_date: date!(2026 - 01 - 31),
        },
    ]
}
