use std::fmt;

use serde::{Deserialize, Serialize};

use crate::services::MappingVariant;

/// CAD tool family a fabrication file was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginTag {
    Altium,
    KiCad,
    EasyEda,
    /// Origin detection found nothing, or failed.
    Unrecognized,
}

impl OriginTag {
    pub const SUPPORTED: [OriginTag; 3] = [OriginTag::Altium, OriginTag::KiCad, OriginTag::EasyEda];

    /// Whether files of this origin get the header/fingerprint chain and
    /// whether a batch led by this origin may be processed at all.
    pub fn is_supported(self) -> bool {
        match self {
            OriginTag::Altium | OriginTag::KiCad | OriginTag::EasyEda => true,
            OriginTag::Unrecognized => false,
        }
    }

    /// Filename-mapping variant used when this origin is the primary tool.
    ///
    /// EasyEDA exports follow the Altium layer-extension scheme, so they share
    /// the Altium-style mapping.
    pub fn mapping_variant(self) -> Option<MappingVariant> {
        match self {
            OriginTag::Altium | OriginTag::EasyEda => Some(MappingVariant::AltiumStyle),
            OriginTag::KiCad => Some(MappingVariant::KiCadStyle),
            OriginTag::Unrecognized => None,
        }
    }

    /// Flag passed to the code-normalization service: `true` selects the
    /// Altium aperture-code convention.
    pub fn uses_altium_codes(self) -> bool {
        match self {
            OriginTag::Altium => true,
            OriginTag::KiCad | OriginTag::EasyEda | OriginTag::Unrecognized => false,
        }
    }

    /// Two-letter code used in export archive names.
    pub fn archive_suffix(self) -> Option<&'static str> {
        match self {
            OriginTag::Altium => Some("AD"),
            OriginTag::KiCad => Some("KC"),
            OriginTag::EasyEda => Some("EE"),
            OriginTag::Unrecognized => None,
        }
    }
}

impl fmt::Display for OriginTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginTag::Altium => write!(f, "Altium"),
            OriginTag::KiCad => write!(f, "KiCad"),
            OriginTag::EasyEda => write!(f, "EasyEDA"),
            OriginTag::Unrecognized => write!(f, "Unrecognized"),
        }
    }
}

/// Classification state of a single source file. Moves from `Pending` to
/// `Classified` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "tag")]
pub enum Classification {
    Pending,
    Classified(OriginTag),
}

impl Classification {
    pub fn is_pending(&self) -> bool {
        matches!(self, Classification::Pending)
    }

    pub fn tag(&self) -> Option<OriginTag> {
        match self {
            Classification::Pending => None,
            Classification::Classified(tag) => Some(*tag),
        }
    }
}
