//! Coating systems and how each one is priced.

use serde::{Deserialize, Serialize};

/// How a coating system's unit rate is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoatingBasis {
    /// No coating, zero cost
    NoCoating,
    /// $/lb of steel (hot-dip galvanizing)
    Weight,
    /// Rate quoted per gallon, applied per square foot of coverage
    AreaPerGallon,
    /// $/sf
    AreaPerSquareFoot,
    /// A system name the estimator typed that we don't know how to price
    Unrecognized,
}

/// Coating system selected on a line.
///
/// Serializes as its display name so project files stay readable and so an
/// unknown name typed elsewhere survives a load/save cycle as [`CoatingSystem::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CoatingSystem {
    #[default]
    None,
    StandardShopPrimer,
    ZincPrimer,
    Paint,
    PowderCoat,
    SpecialtyCoating,
    Galvanizing,
    Other(String),
}

impl CoatingSystem {
    /// Known systems for picker iteration
    pub const KNOWN: [CoatingSystem; 7] = [
        CoatingSystem::None,
        CoatingSystem::StandardShopPrimer,
        CoatingSystem::ZincPrimer,
        CoatingSystem::Paint,
        CoatingSystem::PowderCoat,
        CoatingSystem::SpecialtyCoating,
        CoatingSystem::Galvanizing,
    ];

    /// Parse from common string representations. Blank means no coating.
    pub fn parse(s: &str) -> Self {
        let key = s.trim().to_lowercase().replace(['-', '_'], " ");
        match key.as_str() {
            "" | "none" => CoatingSystem::None,
            "standard shop primer" | "shop primer" | "primer" => CoatingSystem::StandardShopPrimer,
            "zinc primer" | "zinc rich primer" => CoatingSystem::ZincPrimer,
            "paint" => CoatingSystem::Paint,
            "powder coat" | "powder coating" => CoatingSystem::PowderCoat,
            "specialty coating" | "specialty" => CoatingSystem::SpecialtyCoating,
            "galvanizing" | "galvanized" | "hot dip galvanizing" | "hdg" => CoatingSystem::Galvanizing,
            _ => CoatingSystem::Other(s.trim().to_string()),
        }
    }

    /// Get display name (also the key used in rate tables)
    pub fn name(&self) -> &str {
        match self {
            CoatingSystem::None => "None",
            CoatingSystem::StandardShopPrimer => "Standard Shop Primer",
            CoatingSystem::ZincPrimer => "Zinc Primer",
            CoatingSystem::Paint => "Paint",
            CoatingSystem::PowderCoat => "Powder Coat",
            CoatingSystem::SpecialtyCoating => "Specialty Coating",
            CoatingSystem::Galvanizing => "Galvanizing",
            CoatingSystem::Other(name) => name,
        }
    }

    pub fn basis(&self) -> CoatingBasis {
        match self {
            CoatingSystem::None => CoatingBasis::NoCoating,
            CoatingSystem::Galvanizing => CoatingBasis::Weight,
            CoatingSystem::Paint | CoatingSystem::PowderCoat | CoatingSystem::SpecialtyCoating => {
                CoatingBasis::AreaPerGallon
            }
            CoatingSystem::StandardShopPrimer | CoatingSystem::ZincPrimer => CoatingBasis::AreaPerSquareFoot,
            CoatingSystem::Other(_) => CoatingBasis::Unrecognized,
        }
    }
}

impl From<String> for CoatingSystem {
    fn from(s: String) -> Self {
        CoatingSystem::parse(&s)
    }
}

impl From<CoatingSystem> for String {
    fn from(system: CoatingSystem) -> Self {
        system.name().to_string()
    }
}

impl std::fmt::Display for CoatingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
