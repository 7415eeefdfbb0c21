//! Versions (`major.minor.micro[.qualifier]`) and the requests feature entries make for them.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder qualifier meaning "whatever qualifier the build resolves to".
pub const QUALIFIER_TOKEN: &str = "qualifier";

/// A concrete version.
///
/// Ordering is numeric on the three parts, then byte-wise on the qualifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub micro: u64,
    pub qualifier: String,
}

impl Version {
    #[must_use]
    pub fn new(major: u64, minor: u64, micro: u64, qualifier: impl Into<String>) -> Self {
        Self { major, minor, micro, qualifier: qualifier.into() }
    }

    /// Same numeric parts, different qualifier.
    #[must_use]
    pub fn with_qualifier(&self, qualifier: impl Into<String>) -> Self {
        Self { qualifier: qualifier.into(), ..self.clone() }
    }

    /// Parses a version string.
    ///
    /// Missing numeric parts default to `0` and an empty string is `0.0.0`.
    ///
    /// # Errors
    /// Returns [`DomainError::MalformedVersion`] for non-numeric or empty numeric parts and
    /// for qualifiers containing characters outside `[A-Za-z0-9_-]`.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        let malformed = |reason: &'static str| DomainError::MalformedVersion {
            input: input.to_owned(),
            reason: reason.into(),
            context: None,
        };

        let mut parts = trimmed.splitn(4, '.');
        let mut numbers = [0_u64; 3];
        for slot in &mut numbers {
            let Some(part) = parts.next() else { break };
            if part.is_empty() {
                return Err(malformed("empty numeric component"));
            }
            *slot = part.parse().map_err(|_| malformed("numeric component expected"))?;
        }

        let qualifier = parts.next().unwrap_or_default();
        if trimmed.ends_with('.') && qualifier.is_empty() {
            return Err(malformed("trailing separator"));
        }
        if !qualifier.chars().all(is_qualifier_char) {
            return Err(malformed("invalid character in qualifier"));
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2], qualifier))
    }
}

const fn is_qualifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

/// What a feature entry asks the registry for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionSpec {
    /// Empty or `0.0.0`: the highest available version.
    Any,
    /// `x.y.z.qualifier`: the highest version with these numeric parts.
    Wildcard { major: u64, minor: u64, micro: u64 },
    /// An exact version.
    Exact(Version),
}

impl VersionSpec {
    /// Parses the version text of a feature entry.
    ///
    /// # Errors
    /// Returns [`DomainError::MalformedVersion`] when the text is not a version even after
    /// stripping the placeholder token.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::Any);
        }

        if let Some(base) = strip_qualifier_token(trimmed) {
            let version = Version::parse(base)?;
            return Ok(Self::Wildcard {
                major: version.major,
                minor: version.minor,
                micro: version.micro,
            });
        }

        let version = Version::parse(trimmed)?;
        if version == Version::default() {
            return Ok(Self::Any);
        }
        Ok(Self::Exact(version))
    }

    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::Wildcard { major, minor, micro } => {
                version.major == *major && version.minor == *minor && version.micro == *micro
            },
            Self::Exact(exact) => exact == version,
        }
    }

    /// The version to assume when nothing in the registry satisfies the request.
    #[must_use]
    pub fn fallback_version(&self) -> Version {
        match self {
            Self::Any => Version::default(),
            Self::Wildcard { major, minor, micro } => Version::new(*major, *minor, *micro, ""),
            Self::Exact(version) => version.clone(),
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("0.0.0"),
            Self::Wildcard { major, minor, micro } => {
                write!(f, "{major}.{minor}.{micro}.{QUALIFIER_TOKEN}")
            },
            Self::Exact(version) => version.fmt(f),
        }
    }
}

/// `1.0.0.qualifier` -> `1.0.0`, `1.0.0qualifier` -> `1.0.0`, anything else -> `None`.
fn strip_qualifier_token(input: &str) -> Option<&str> {
    let base = input.strip_suffix(QUALIFIER_TOKEN)?;
    Some(base.strip_suffix('.').unwrap_or(base))
}
