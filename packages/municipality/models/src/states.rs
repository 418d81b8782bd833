//! Brazilian federative units (26 states + the Federal District).
//!
//! Provides the two-letter codes accepted by the selection UI, their IBGE
//! numeric codes, and full names.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Two-letter code of a Brazilian federative unit.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum StateCode {
    Ac,
    Al,
    Am,
    Ap,
    Ba,
    Ce,
    Df,
    Es,
    Go,
    Ma,
    Mg,
    Ms,
    Mt,
    Pa,
    Pb,
    Pe,
    Pi,
    Pr,
    Rj,
    Rn,
    Ro,
    Rr,
    Rs,
    Sc,
    Se,
    Sp,
    To,
}

impl StateCode {
    /// All 27 units, alphabetical by code.
    pub const ALL: &[Self] = &[
        Self::Ac,
        Self::Al,
        Self::Am,
        Self::Ap,
        Self::Ba,
        Self::Ce,
        Self::Df,
        Self::Es,
        Self::Go,
        Self::Ma,
        Self::Mg,
        Self::Ms,
        Self::Mt,
        Self::Pa,
        Self::Pb,
        Self::Pe,
        Self::Pi,
        Self::Pr,
        Self::Rj,
        Self::Rn,
        Self::Ro,
        Self::Rr,
        Self::Rs,
        Self::Sc,
        Self::Se,
        Self::Sp,
        Self::To,
    ];

    /// Parses a code, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for unrecognized codes.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        code.trim().parse().ok()
    }

    /// Two-digit IBGE code of this unit.
    #[must_use]
    pub const fn ibge_code(self) -> u8 {
        match self {
            Self::Ro => 11,
            Self::Ac => 12,
            Self::Am => 13,
            Self::Rr => 14,
            Self::Pa => 15,
            Self::Ap => 16,
            Self::To => 17,
            Self::Ma => 21,
            Self::Pi => 22,
            Self::Ce => 23,
            Self::Rn => 24,
            Self::Pb => 25,
            Self::Pe => 26,
            Self::Al => 27,
            Self::Se => 28,
            Self::Ba => 29,
            Self::Mg => 31,
            Self::Es => 32,
            Self::Rj => 33,
            Self::Sp => 35,
            Self::Pr => 41,
            Self::Sc => 42,
            Self::Rs => 43,
            Self::Ms => 50,
            Self::Mt => 51,
            Self::Go => 52,
            Self::Df => 53,
        }
    }

    /// Full name of this unit.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ac => "Acre",
            Self::Al => "Alagoas",
            Self::Am => "Amazonas",
            Self::Ap => "Amapá",
            Self::Ba => "Bahia",
            Self::Ce => "Ceará",
            Self::Df => "Distrito Federal",
            Self::Es => "Espírito Santo",
            Self::Go => "Goiás",
            Self::Ma => "Maranhão",
            Self::Mg => "Minas Gerais",
            Self::Ms => "Mato Grosso do Sul",
            Self::Mt => "Mato Grosso",
            Self::Pa => "Pará",
            Self::Pb => "Paraíba",
            Self::Pe => "Pernambuco",
            Self::Pi => "Piauí",
            Self::Pr => "Paraná",
            Self::Rj => "Rio de Janeiro",
            Self::Rn => "Rio Grande do Norte",
            Self::Ro => "Rondônia",
            Self::Rr => "Roraima",
            Self::Rs => "Rio Grande do Sul",
            Self::Sc => "Santa Catarina",
            Self::Se => "Sergipe",
            Self::Sp => "São Paulo",
            Self::To => "Tocantins",
        }
    }

    /// Whether a free-text state value (as found in a service table)
    /// refers to this unit.
    #[must_use]
    pub fn matches(self, raw: &str) -> bool {
        raw.trim().eq_ignore_ascii_case(self.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_count() {
        assert_eq!(StateCode::ALL.len(), 27);
    }

    #[test]
    fn codes_roundtrip() {
        for state in StateCode::ALL {
            assert_eq!(StateCode::parse(state.as_ref()), Some(*state));
        }
    }

    #[test]
    fn ibge_codes_are_unique() {
        let mut codes: Vec<u8> = StateCode::ALL.iter().map(|s| s.ibge_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 27);
    }

    #[test]
    fn case_insensitive_parse() {
        assert_eq!(StateCode::parse("sp"), Some(StateCode::Sp));
        assert_eq!(StateCode::parse(" Rj "), Some(StateCode::Rj));
        assert_eq!(StateCode::parse("XX"), None);
    }

    #[test]
    fn display_is_uppercase_code() {
        assert_eq!(StateCode::Df.to_string(), "DF");
        assert_eq!(StateCode::Sp.name(), "São Paulo");
    }

    #[test]
    fn matches_raw_state_values() {
        assert!(StateCode::Sp.matches(" sp"));
        assert!(!StateCode::Sp.matches("SC"));
    }
}
