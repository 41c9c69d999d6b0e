//! Role inference from credit strings and, failing that, from names.
//!
//! Two layers are tried in order and the first non-`unknown` answer wins:
//! an explicit role string is looked up in closed keyword sets, then the
//! artist name itself is scanned for ensemble/conductor vocabulary.

use std::fmt;

use crate::model::Role;

const ENSEMBLE_ROLES: &[&str] = &[
    "choir",
    "chorus",
    "orchestra",
    "ensemble",
    "vocal ensemble",
    "chamber choir",
    "kammerchor",
];

const CONDUCTOR_ROLES: &[&str] = &[
    "conductor",
    "chorus master",
    "chorusmaster",
    "director",
    "maestro",
];

const SOLOIST_ROLES: &[&str] = &["soloist", "vocalist", "singer", "performer", "instrumentalist"];

const CONDUCTOR_NAME_HINTS: &[&str] = &["conductor", "director"];

const ENSEMBLE_NAME_HINTS: &[&str] = &[
    "orchestra",
    "philharmonic",
    "symphony",
    "ensemble",
    "choir",
    "chorus",
    "kammerchor",
    "kammer",
    "quartet",
    "trio",
    "quintet",
    "sextet",
    "chamber",
    "band",
    "consort",
    "players",
];

/// How much an inferred role can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence {
    /// Pure default: nothing matched.
    Low,
    /// Derived from words inside the artist name.
    Medium,
    /// An explicit role keyword matched.
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// A role together with how it was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inference {
    pub role: Role,
    pub confidence: Confidence,
}

/// Layer 1: map an explicit role string onto the closed role set.
///
/// Returns [`Role::Unknown`] for anything outside the keyword sets.
pub fn role_from_credit(role: &str) -> Role {
    let key = role.trim().to_lowercase();
    if ENSEMBLE_ROLES.contains(&key.as_str()) {
        Role::Ensemble
    } else if CONDUCTOR_ROLES.contains(&key.as_str()) {
        Role::Conductor
    } else if SOLOIST_ROLES.contains(&key.as_str()) {
        Role::Soloist
    } else {
        Role::Unknown
    }
}

/// Layer 2: guess a role from the artist name alone.
pub fn infer_from_name(name: &str) -> Inference {
    let lower = name.to_lowercase();
    if CONDUCTOR_NAME_HINTS.iter().any(|h| lower.contains(h)) {
        Inference {
            role: Role::Conductor,
            confidence: Confidence::Medium,
        }
    } else if ENSEMBLE_NAME_HINTS.iter().any(|h| lower.contains(h)) {
        Inference {
            role: Role::Ensemble,
            confidence: Confidence::Medium,
        }
    } else {
        Inference {
            role: Role::Soloist,
            confidence: Confidence::Low,
        }
    }
}

/// Run both layers: an explicit role string first (when given), then the
/// name heuristic.
pub fn infer(credit: Option<&str>, name: &str) -> Inference {
    if let Some(credit) = credit {
        let role = role_from_credit(credit);
        if role != Role::Unknown {
            return Inference {
                role,
                confidence: Confidence::High,
            };
        }
    }
    infer_from_name(name)
}
