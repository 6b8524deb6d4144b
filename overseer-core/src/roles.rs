//! Role and team classification for players on the server
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Flat classification of a player's current role, as reported by the host.
///
/// Guards and NTF operatives share a team but are scored separately for
/// kill XP, so the classification keeps them distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    ClassD,
    Scientist,
    FacilityGuard,
    NtfOperative,
    ChaosInsurgent,
    Scp,
    Tutorial,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClassD => "class_d",
            Self::Scientist => "scientist",
            Self::FacilityGuard => "facility_guard",
            Self::NtfOperative => "ntf_operative",
            Self::ChaosInsurgent => "chaos_insurgent",
            Self::Scp => "scp",
            Self::Tutorial => "tutorial",
        }
    }

    /// Team the role fights for. Tutorial players belong to no team.
    #[must_use]
    pub const fn team(self) -> Option<Team> {
        match self {
            Self::ClassD => Some(Team::ClassD),
            Self::Scientist => Some(Team::Scientists),
            Self::FacilityGuard | Self::NtfOperative => Some(Team::FoundationForces),
            Self::ChaosInsurgent => Some(Team::ChaosInsurgency),
            Self::Scp => Some(Team::Scps),
            Self::Tutorial => None,
        }
    }

    /// Which side a round win is credited to for players of this role.
    #[must_use]
    pub const fn winning_side(self) -> Option<WinningSide> {
        match self {
            Self::Scientist | Self::FacilityGuard | Self::NtfOperative => {
                Some(WinningSide::FacilityForces)
            }
            Self::ClassD | Self::ChaosInsurgent | Self::Scp => Some(WinningSide::Anomalies),
            Self::Tutorial => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class_d" => Ok(Self::ClassD),
            "scientist" => Ok(Self::Scientist),
            "facility_guard" => Ok(Self::FacilityGuard),
            "ntf_operative" => Ok(Self::NtfOperative),
            "chaos_insurgent" => Ok(Self::ChaosInsurgent),
            "scp" => Ok(Self::Scp),
            "tutorial" => Ok(Self::Tutorial),
            _ => Err(()),
        }
    }
}

/// Team affiliation used by task objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    ClassD,
    Scientists,
    FoundationForces,
    ChaosInsurgency,
    Scps,
}

impl Team {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClassD => "class_d",
            Self::Scientists => "scientists",
            Self::FoundationForces => "foundation_forces",
            Self::ChaosInsurgency => "chaos_insurgency",
            Self::Scps => "scps",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a round as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinningSide {
    FacilityForces,
    Anomalies,
    Draw,
}

/// Items that task objectives can key on. Only the MicroHID is
/// semantically significant today; everything else folds into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    MicroHid,
    Firearm,
    Other,
}
