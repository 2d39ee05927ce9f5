use duckdb::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four serviced boroughs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Borough {
    Bronx,
    Brooklyn,
    Manhattan,
    Queens,
}

impl Borough {
    pub const ALL: [Self; 4] = [Self::Bronx, Self::Brooklyn, Self::Manhattan, Self::Queens];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bronx => "Bronx",
            Self::Brooklyn => "Brooklyn",
            Self::Manhattan => "Manhattan",
            Self::Queens => "Queens",
        }
    }
}

impl FromStr for Borough {
    type Err = ();

    /// Exact, case-sensitive match on the borough name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|b| b.as_str() == s).ok_or(())
    }
}

impl fmt::Display for Borough {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of entity a selection refers to, as spelled in the `type` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    Station,
    Borough,
    CommunityDistrict,
    CouncilDistrict,
}

impl SelectorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Station => "station",
            Self::Borough => "borough",
            Self::CommunityDistrict => "community-district",
            Self::CouncilDistrict => "council-district",
        }
    }
}

impl FromStr for SelectorKind {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "station" => Ok(Self::Station),
            "borough" => Ok(Self::Borough),
            "community-district" => Ok(Self::CommunityDistrict),
            "council-district" => Ok(Self::CouncilDistrict),
            other => Err(SelectionError::UnknownKind(other.to_string())),
        }
    }
}

/// A normalized filter over the station-day fact view. Exactly one variant is
/// active per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterPredicate {
    Station(i32),
    Borough(Borough),
    CommunityDistrict(i32),
    CouncilDistrict(i32),
}

impl FilterPredicate {
    /// Map a `(kind, specifier)` pair to a predicate.
    ///
    /// Station ids are not checked for existence: an unknown id simply
    /// matches zero rows downstream.
    pub fn resolve(kind: &str, specifier: &str) -> Result<Self, SelectionError> {
        let kind: SelectorKind = kind.parse()?;
        let invalid = || SelectionError::InvalidSpecifier {
            kind,
            specifier: specifier.to_string(),
        };
        let number = || specifier.parse::<i32>().map_err(|_| invalid());

        match kind {
            SelectorKind::Station => Ok(Self::Station(number()?)),
            SelectorKind::Borough => specifier
                .parse()
                .map(Self::Borough)
                .map_err(|()| invalid()),
            SelectorKind::CommunityDistrict => Ok(Self::CommunityDistrict(number()?)),
            SelectorKind::CouncilDistrict => Ok(Self::CouncilDistrict(number()?)),
        }
    }

    /// Resolve from optional query parameters; either one missing is an error.
    pub fn from_params(
        kind: Option<&str>,
        specifier: Option<&str>,
    ) -> Result<Self, SelectionError> {
        match (kind, specifier) {
            (Some(kind), Some(specifier)) if !kind.is_empty() && !specifier.is_empty() => {
                Self::resolve(kind, specifier)
            }
            _ => Err(SelectionError::Missing),
        }
    }

    pub const fn kind(&self) -> SelectorKind {
        match self {
            Self::Station(_) => SelectorKind::Station,
            Self::Borough(_) => SelectorKind::Borough,
            Self::CommunityDistrict(_) => SelectorKind::CommunityDistrict,
            Self::CouncilDistrict(_) => SelectorKind::CouncilDistrict,
        }
    }

    /// SQL boolean expression over `station_days_all` with exactly one `?`
    /// placeholder, bound to [`Self::bind_value`].
    pub(crate) const fn sql_condition(&self) -> &'static str {
        match self {
            Self::Station(_) => "station_id = ?",
            Self::Borough(_) => "station_id IN (SELECT id FROM stations_all WHERE borough = ?)",
            Self::CommunityDistrict(_) => {
                "station_id IN (SELECT id FROM stations_all WHERE community_district = ?)"
            }
            Self::CouncilDistrict(_) => {
                "station_id IN (SELECT id FROM stations_all WHERE council_district = ?)"
            }
        }
    }

    pub(crate) fn bind_value(&self) -> Value {
        match self {
            Self::Station(id) | Self::CommunityDistrict(id) | Self::CouncilDistrict(id) => {
                Value::Int(*id)
            }
            Self::Borough(borough) => Value::Text(borough.as_str().to_string()),
        }
    }

    /// Stable `kind:specifier` form, used in cache keys and as a revalidation tag.
    pub fn tag(&self) -> String {
        match self {
            Self::Station(id) | Self::CommunityDistrict(id) | Self::CouncilDistrict(id) => {
                format!("{}:{id}", self.kind().as_str())
            }
            Self::Borough(borough) => format!("{}:{borough}", self.kind().as_str()),
        }
    }
}

/// A malformed or unrecognized selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    Missing,
    UnknownKind(String),
    InvalidSpecifier { kind: SelectorKind, specifier: String },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "Missing type or specifier"),
            Self::UnknownKind(kind) => write!(
                f,
                "Invalid type: '{kind}'. Use 'station', 'borough', 'community-district' or 'council-district'."
            ),
            Self::InvalidSpecifier { kind, specifier } => {
                write!(f, "Invalid specifier '{specifier}' for type '{}'", kind.as_str())
            }
        }
    }
}

impl std::error::Error for SelectionError {}
