use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// ISO currency codes supported by the reference-rate provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CurrencyCode {
    Aud,
    Bgn,
    Brl,
    Cad,
    Chf,
    Cny,
    Czk,
    Dkk,
    Eur,
    Gbp,
    Hkd,
    Huf,
    Idr,
    Ils,
    Inr,
    Isk,
    Jpy,
    Krw,
    Mxn,
    Myr,
    Nok,
    Nzd,
    Php,
    Pln,
    Ron,
    Sek,
    Sgd,
    Thb,
    Try,
    Usd,
    Zar,
}

impl CurrencyCode {
    pub const ALL: [Self; 31] = [
        Self::Aud,
        Self::Bgn,
        Self::Brl,
        Self::Cad,
        Self::Chf,
        Self::Cny,
        Self::Czk,
        Self::Dkk,
        Self::Eur,
        Self::Gbp,
        Self::Hkd,
        Self::Huf,
        Self::Idr,
        Self::Ils,
        Self::Inr,
        Self::Isk,
        Self::Jpy,
        Self::Krw,
        Self::Mxn,
        Self::Myr,
        Self::Nok,
        Self::Nzd,
        Self::Php,
        Self::Pln,
        Self::Ron,
        Self::Sek,
        Self::Sgd,
        Self::Thb,
        Self::Try,
        Self::Usd,
        Self::Zar,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aud => "AUD",
            Self::Bgn => "BGN",
            Self::Brl => "BRL",
            Self::Cad => "CAD",
            Self::Chf => "CHF",
            Self::Cny => "CNY",
            Self::Czk => "CZK",
            Self::Dkk => "DKK",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Hkd => "HKD",
            Self::Huf => "HUF",
            Self::Idr => "IDR",
            Self::Ils => "ILS",
            Self::Inr => "INR",
            Self::Isk => "ISK",
            Self::Jpy => "JPY",
            Self::Krw => "KRW",
            Self::Mxn => "MXN",
            Self::Myr => "MYR",
            Self::Nok => "NOK",
            Self::Nzd => "NZD",
            Self::Php => "PHP",
            Self::Pln => "PLN",
            Self::Ron => "RON",
            Self::Sek => "SEK",
            Self::Sgd => "SGD",
            Self::Thb => "THB",
            Self::Try => "TRY",
            Self::Usd => "USD",
            Self::Zar => "ZAR",
        }
    }

    /// Parse a comma separated list such as `usd, EUR,cad`.
    pub fn parse_list(input: &str) -> Result<Vec<Self>, ValidationError> {
        input
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == normalized)
            .ok_or(ValidationError::InvalidCurrency { value: normalized })
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(" usd ".parse::<CurrencyCode>(), Ok(CurrencyCode::Usd));
        assert_eq!("Eur".parse::<CurrencyCode>(), Ok(CurrencyCode::Eur));
    }

    #[test]
    fn rejects_unknown_codes() {
        let err = "XYZ".parse::<CurrencyCode>().expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidCurrency { .. }));
    }

    #[test]
    fn parses_lists_and_skips_blanks() {
        let codes = CurrencyCode::parse_list("usd, EUR,,cad").expect("list should parse");
        assert_eq!(
            codes,
            vec![CurrencyCode::Usd, CurrencyCode::Eur, CurrencyCode::Cad]
        );
    }
}
