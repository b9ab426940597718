//! Query classification: admission verdicts before retrieval

mod formulator;
mod verdict;

pub use formulator::QueryClassifier;
pub use verdict::{
    parse_classifier_output, ClassifierOutput, QueryVerdict, GENERIC_CORRECTION_GUIDANCE,
    SUPPORTED_DOCUMENT_TYPES, TOO_SHORT_GUIDANCE,
};
