use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Broken mapping or key-definition tables. Fatal for the whole run.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("taxonomy is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("rule '{0}' is defined more than once")]
    DuplicateRule(String),
    #[error("rule '{0}' has no candidate tags")]
    EmptyCandidates(String),
    #[error("rule '{key}' lists tag '{tag}' twice for {standard}")]
    DuplicateCandidate {
        key: String,
        standard: String,
        tag: String,
    },
    #[error("rule '{key}' has an empty candidate tag")]
    BlankTag { key: String },
    #[error("fact key '{0}' is defined more than once")]
    DuplicateFactKey(String),
    #[error("fact key '{fact_key}' resolves from undefined rule '{source_key}'")]
    UnknownSource { fact_key: String, source_key: String },
    #[error("non-derived fact key '{0}' has no sources")]
    NoSources(String),
    #[error("balance-sheet anchor key '{0}' is not a BS rule")]
    InvalidAnchorKey(String),
    #[error("rule '{key}' references undefined profile '{profile}'")]
    UnknownProfile { key: String, profile: String },
    #[error("DEI field '{0}' has no tags")]
    MissingDeiField(&'static str),
    #[error("accounting standard alias '{alias}' maps to unknown standard '{target}'")]
    UnknownStandardAlias { alias: String, target: String },
    #[error("invalid period matching setting: {0}")]
    PeriodMatching(String),
}

/// The instance document could not be read as XBRL. Fatal for one filing only.
#[derive(Debug, Error)]
pub enum DocumentParseError {
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("root element '{0}' is not an XBRL instance")]
    NotAnInstance(String),
    #[error("context '{context_ref}' is malformed: {reason}")]
    MalformedContext { context_ref: String, reason: String },
    #[error("no reporting period could be anchored")]
    NoReportingPeriod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    MissingSecurityCode,
    InvalidSecurityCode(String),
    MissingFiscalYearEnd,
    InvalidFiscalYearEnd(String),
    UnknownAccountingStandard(Option<String>),
}

impl RejectionReason {
    /// The identifying field that could not be resolved.
    pub fn field(&self) -> &'static str {
        match self {
            RejectionReason::MissingSecurityCode | RejectionReason::InvalidSecurityCode(_) => {
                "security_code"
            }
            RejectionReason::MissingFiscalYearEnd | RejectionReason::InvalidFiscalYearEnd(_) => {
                "fiscal_year_end"
            }
            RejectionReason::UnknownAccountingStandard(_) => "accounting_standard",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::MissingSecurityCode => write!(f, "security code not disclosed"),
            RejectionReason::InvalidSecurityCode(raw) => {
                write!(f, "security code '{}' is not alphanumeric", raw)
            }
            RejectionReason::MissingFiscalYearEnd => write!(f, "fiscal year end not disclosed"),
            RejectionReason::InvalidFiscalYearEnd(raw) => {
                write!(f, "fiscal year end '{}' is not a date", raw)
            }
            RejectionReason::UnknownAccountingStandard(Some(raw)) => {
                write!(f, "accounting standard '{}' is not recognised", raw)
            }
            RejectionReason::UnknownAccountingStandard(None) => {
                write!(f, "accounting standard not disclosed")
            }
        }
    }
}

/// The filing lacks identifying metadata; no record is produced for it.
#[derive(Debug, Clone, Error)]
#[error("filing {doc_id} rejected ({}): {reason}", reason.field())]
pub struct FilingRejected {
    pub doc_id: String,
    pub reason: RejectionReason,
}

#[derive(Debug, Error)]
pub enum FilingError {
    #[error("filing {doc_id}: {source}")]
    Parse {
        doc_id: String,
        #[source]
        source: DocumentParseError,
    },
    #[error(transparent)]
    Rejected(#[from] FilingRejected),
}

impl FilingError {
    pub fn doc_id(&self) -> &str {
        match self {
            FilingError::Parse { doc_id, .. } => doc_id,
            FilingError::Rejected(rejected) => &rejected.doc_id,
        }
    }
}

/// Why one file of a batch produced no record.
#[derive(Debug, Error)]
pub enum BatchFailure {
    #[error(transparent)]
    Filing(#[from] FilingError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("worker for {0} did not finish")]
    Join(String),
}

/// A fact pointing at a context the document never defines. The fact is
/// dropped and processing continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedContext {
    pub tag_name: String,
    pub context_ref: String,
}

impl fmt::Display for UnresolvedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fact {} references undefined context '{}'",
            self.tag_name, self.context_ref
        )
    }
}
