//! Zodiac sign domain type.
//!
//! # Responsibility
//! - Define the closed set of twelve signs used for horoscope lookups.
//! - Convert between sign values and their stable lowercase identifiers.
//!
//! # Invariants
//! - Identifiers are lowercase ASCII and never change (they are persisted).
//! - Any string outside the twelve identifiers is rejected at parse time.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One of the twelve western zodiac signs.
///
/// Declaration order follows the zodiac year and is used for ordering.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ZodiacSign {
    #[default]
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    /// All signs in zodiac order.
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    /// Stable lowercase identifier used in storage and remote queries.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aries => "aries",
            Self::Taurus => "taurus",
            Self::Gemini => "gemini",
            Self::Cancer => "cancer",
            Self::Leo => "leo",
            Self::Virgo => "virgo",
            Self::Libra => "libra",
            Self::Scorpio => "scorpio",
            Self::Sagittarius => "sagittarius",
            Self::Capricorn => "capricorn",
            Self::Aquarius => "aquarius",
            Self::Pisces => "pisces",
        }
    }

    /// Capitalized display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Aries => "Aries",
            Self::Taurus => "Taurus",
            Self::Gemini => "Gemini",
            Self::Cancer => "Cancer",
            Self::Leo => "Leo",
            Self::Virgo => "Virgo",
            Self::Libra => "Libra",
            Self::Scorpio => "Scorpio",
            Self::Sagittarius => "Sagittarius",
            Self::Capricorn => "Capricorn",
            Self::Aquarius => "Aquarius",
            Self::Pisces => "Pisces",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Aries => "♈",
            Self::Taurus => "♉",
            Self::Gemini => "♊",
            Self::Cancer => "♋",
            Self::Leo => "♌",
            Self::Virgo => "♍",
            Self::Libra => "♎",
            Self::Scorpio => "♏",
            Self::Sagittarius => "♐",
            Self::Capricorn => "♑",
            Self::Aquarius => "♒",
            Self::Pisces => "♓",
        }
    }

    /// Human-readable birth date range, e.g. `Mar 21 - Apr 19`.
    pub fn date_range(self) -> &'static str {
        match self {
            Self::Aries => "Mar 21 - Apr 19",
            Self::Taurus => "Apr 20 - May 20",
            Self::Gemini => "May 21 - Jun 20",
            Self::Cancer => "Jun 21 - Jul 22",
            Self::Leo => "Jul 23 - Aug 22",
            Self::Virgo => "Aug 23 - Sep 22",
            Self::Libra => "Sep 23 - Oct 22",
            Self::Scorpio => "Oct 23 - Nov 21",
            Self::Sagittarius => "Nov 22 - Dec 21",
            Self::Capricorn => "Dec 22 - Jan 19",
            Self::Aquarius => "Jan 20 - Feb 18",
            Self::Pisces => "Feb 19 - Mar 20",
        }
    }
}

impl Display for ZodiacSign {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name one of the twelve signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseZodiacSignError {
    pub input: String,
}

impl Display for ParseZodiacSignError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown zodiac sign `{}`", self.input)
    }
}

impl Error for ParseZodiacSignError {}

impl FromStr for ZodiacSign {
    type Err = ParseZodiacSignError;

    /// Parses a sign identifier case-insensitively, ignoring surrounding
    /// whitespace.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|sign| sign.as_str() == normalized)
            .ok_or_else(|| ParseZodiacSignError {
                input: value.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::ZodiacSign;

    #[test]
    fn parse_accepts_mixed_case_and_whitespace() {
        assert_eq!(" Leo ".parse::<ZodiacSign>().unwrap(), ZodiacSign::Leo);
        assert_eq!(
            "SAGITTARIUS".parse::<ZodiacSign>().unwrap(),
            ZodiacSign::Sagittarius
        );
    }

    #[test]
    fn parse_rejects_unknown_sign() {
        let err = "ophiuchus".parse::<ZodiacSign>().unwrap_err();
        assert!(err.to_string().contains("ophiuchus"));
    }

    #[test]
    fn identifiers_roundtrip_for_every_sign() {
        for sign in ZodiacSign::ALL {
            assert_eq!(sign.as_str().parse::<ZodiacSign>().unwrap(), sign);
        }
    }

    #[test]
    fn default_sign_is_aries() {
        assert_eq!(ZodiacSign::default(), ZodiacSign::Aries);
    }

    #[test]
    fn serde_uses_lowercase_identifier() {
        let json = serde_json::to_string(&ZodiacSign::Capricorn).unwrap();
        assert_eq!(json, "\"capricorn\"");
    }
}
