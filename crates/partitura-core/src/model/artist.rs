use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The role an artist plays on a track or album.
///
/// Serialized as the lowercase identifier, which is also the wire form
/// used by the canonical JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Composer,
    Soloist,
    Ensemble,
    Conductor,
    Arranger,
    Guest,
    Unknown,
}

impl Role {
    pub const ALL: [Self; 7] = [
        Self::Composer,
        Self::Soloist,
        Self::Ensemble,
        Self::Conductor,
        Self::Arranger,
        Self::Guest,
        Self::Unknown,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Composer => "composer",
            Self::Soloist => "soloist",
            Self::Ensemble => "ensemble",
            Self::Conductor => "conductor",
            Self::Arranger => "arranger",
            Self::Guest => "guest",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidData(format!("unknown role: {s}")))
    }
}

/// A named artist in a specific role.
///
/// Identity is the pair (name, role): the same person may appear as
/// composer and conductor on one disc, and those are two artists here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
    pub role: Role,
}

impl Artist {
    #[must_use]
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    #[must_use]
    pub fn composer(name: impl Into<String>) -> Self {
        Self::new(name, Role::Composer)
    }

    #[must_use]
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::new(name, Role::Unknown)
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub fn is_composer(&self) -> bool {
        self.role == Role::Composer
    }
}

impl fmt::Display for Artist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_strings() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("conductor".parse::<Role>().unwrap(), Role::Conductor);
        assert_eq!(" Ensemble ".parse::<Role>().unwrap(), Role::Ensemble);
        assert!("drummer".parse::<Role>().is_err());
    }

    #[test]
    fn test_artist_identity_includes_role() {
        let composer = Artist::composer("Leonard Bernstein");
        let conductor = Artist::new("Leonard Bernstein", Role::Conductor);
        assert_ne!(composer, conductor);
        assert_eq!(conductor, Artist::unknown("Leonard Bernstein").with_role(Role::Conductor));
    }
}
