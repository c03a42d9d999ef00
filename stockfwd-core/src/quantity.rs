//! Quantities that a projection target can control.
//!
//! Each [`QuantityKind`] has a fixed relationship with the fishing mortality of the step it
//! is set on. That relationship decides whether the step's own F can always hit the target
//! ([`TimingClass::Direct`]) or whether that depends on when spawning happens within the
//! step ([`TimingClass::Spawning`] and [`TimingClass::Flash`]).

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A stock quantity that can be used as a projection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityKind {
    /// Mean fishing mortality over the stock's Fbar age range.
    #[serde(alias = "f")]
    Fbar,
    /// Total catch weight.
    Catch,
    /// Landed part of the catch weight.
    Landings,
    /// Discarded part of the catch weight.
    Discards,
    /// Spawning stock biomass after all of the step's mortality.
    SsbEnd,
    /// Spawning stock biomass at spawning time.
    SsbSpawn,
    /// Spawning stock biomass at the next spawning event reachable by this step's F.
    SsbFlash,
    /// Total biomass after all of the step's mortality.
    BiomassEnd,
    /// Total biomass at spawning time.
    BiomassSpawn,
    /// Total biomass at the next spawning event reachable by this step's F.
    BiomassFlash,
    /// Stock-recruitment potential: the spawning biomass fed to the recruitment model.
    Srp,
}

/// How a quantity responds to the fishing mortality of the step it is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingClass {
    /// Always a function of the step's own F.
    Direct,
    /// Measured at spawning time; only affected by the step's F if some fishing happens
    /// before spawning. Otherwise it is deferred to the next step.
    Spawning,
    /// Measured at spawning time if fishing happens before spawning,
    /// otherwise at the next step's spawning time.
    Flash,
}

/// Direction in which a quantity moves as fishing mortality increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Increasing,
    Decreasing,
}

impl QuantityKind {
    pub const ALL: [QuantityKind; 11] = [
        QuantityKind::Fbar,
        QuantityKind::Catch,
        QuantityKind::Landings,
        QuantityKind::Discards,
        QuantityKind::SsbEnd,
        QuantityKind::SsbSpawn,
        QuantityKind::SsbFlash,
        QuantityKind::BiomassEnd,
        QuantityKind::BiomassSpawn,
        QuantityKind::BiomassFlash,
        QuantityKind::Srp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            QuantityKind::Fbar => "fbar",
            QuantityKind::Catch => "catch",
            QuantityKind::Landings => "landings",
            QuantityKind::Discards => "discards",
            QuantityKind::SsbEnd => "ssb_end",
            QuantityKind::SsbSpawn => "ssb_spawn",
            QuantityKind::SsbFlash => "ssb_flash",
            QuantityKind::BiomassEnd => "biomass_end",
            QuantityKind::BiomassSpawn => "biomass_spawn",
            QuantityKind::BiomassFlash => "biomass_flash",
            QuantityKind::Srp => "srp",
        }
    }

    pub fn timing_class(&self) -> TimingClass {
        match self {
            QuantityKind::Fbar
            | QuantityKind::Catch
            | QuantityKind::Landings
            | QuantityKind::Discards
            | QuantityKind::SsbEnd
            | QuantityKind::BiomassEnd => TimingClass::Direct,
            QuantityKind::SsbSpawn | QuantityKind::BiomassSpawn | QuantityKind::Srp => {
                TimingClass::Spawning
            }
            QuantityKind::SsbFlash | QuantityKind::BiomassFlash => TimingClass::Flash,
        }
    }

    pub fn response(&self) -> Response {
        match self {
            QuantityKind::Fbar
            | QuantityKind::Catch
            | QuantityKind::Landings
            | QuantityKind::Discards => Response::Increasing,
            QuantityKind::SsbEnd
            | QuantityKind::SsbSpawn
            | QuantityKind::SsbFlash
            | QuantityKind::BiomassEnd
            | QuantityKind::BiomassSpawn
            | QuantityKind::BiomassFlash
            | QuantityKind::Srp => Response::Decreasing,
        }
    }
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for QuantityKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace(['.', '-'], "_");
        if normalised == "f" {
            return Ok(QuantityKind::Fbar);
        }
        QuantityKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalised)
            .ok_or_else(|| ConfigurationError::UnknownQuantity(s.to_string()))
    }
}
