//! MARC dialects (national and institutional variants of MARC21).
//!
//! A [`Dialect`] selects which extensions the schema registry layers on top of the
//! MARC21 baseline. Extensions only ever *add* subfields or local fields.

use crate::error::{MarcError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named MARC21 variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Dialect {
    /// Library of Congress MARC21 baseline
    #[default]
    #[serde(rename = "MARC21")]
    Marc21,
    /// Deutsche Nationalbibliothek
    #[serde(rename = "DNB")]
    Dnb,
    /// OCLC WorldCat extensions
    #[serde(rename = "OCLC")]
    Oclc,
    /// Ghent University Library
    #[serde(rename = "GENT")]
    Gent,
    /// University of Szeged
    #[serde(rename = "SZTE")]
    Szte,
    /// National Library of Finland
    #[serde(rename = "FENNICA")]
    Fennica,
    /// National Library of the Czech Republic
    #[serde(rename = "NKCR")]
    Nkcr,
    /// British Library
    #[serde(rename = "BL")]
    Bl,
    /// Norwegian MARC21 variant
    #[serde(rename = "MARC21NO")]
    Marc21No,
    /// University of Virginia Library
    #[serde(rename = "UVA")]
    Uva,
    /// Bavarian library network
    #[serde(rename = "B3KAT")]
    B3Kat,
    /// Royal Library of Belgium
    #[serde(rename = "KBR")]
    Kbr,
    /// Zentralbibliothek Zürich
    #[serde(rename = "ZB")]
    Zb,
    /// National Széchényi Library
    #[serde(rename = "OGYK")]
    Ogyk,
    /// Biblioteca Nacional de España
    #[serde(rename = "BNE")]
    Bne,
}

impl Dialect {
    /// Every dialect, baseline first.
    pub const ALL: [Dialect; 15] = [
        Dialect::Marc21,
        Dialect::Dnb,
        Dialect::Oclc,
        Dialect::Gent,
        Dialect::Szte,
        Dialect::Fennica,
        Dialect::Nkcr,
        Dialect::Bl,
        Dialect::Marc21No,
        Dialect::Uva,
        Dialect::B3Kat,
        Dialect::Kbr,
        Dialect::Zb,
        Dialect::Ogyk,
        Dialect::Bne,
    ];

    /// Conventional short code, as used in configuration and schema tables.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Marc21 => "MARC21",
            Self::Dnb => "DNB",
            Self::Oclc => "OCLC",
            Self::Gent => "GENT",
            Self::Szte => "SZTE",
            Self::Fennica => "FENNICA",
            Self::Nkcr => "NKCR",
            Self::Bl => "BL",
            Self::Marc21No => "MARC21NO",
            Self::Uva => "UVA",
            Self::B3Kat => "B3KAT",
            Self::Kbr => "KBR",
            Self::Zb => "ZB",
            Self::Ogyk => "OGYK",
            Self::Bne => "BNE",
        }
    }

    /// Whether this is the MARC21 baseline itself.
    #[must_use]
    pub const fn is_baseline(&self) -> bool {
        matches!(self, Self::Marc21)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Dialect {
    type Err = MarcError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|dialect| dialect.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MarcError::InvalidConfig(format!("Unknown MARC dialect: '{s}'")))
    }
}
