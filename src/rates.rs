//! Normalized currency rates table
//!
//! The currency provider reports every rate as a decimal string relative to a
//! single base currency. The gateway re-emits the table with numeric rates and
//! an explicit `base`, which is what makes the client's cross-rate formula
//! well defined.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRates {
    pub date: String,
    pub base: String,
    #[serde(deserialize_with = "deserialize_rates")]
    pub rates: BTreeMap<String, f64>,
}

/// A rate as sent by the provider: either a JSON number or a decimal string
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRate {
    Number(f64),
    Text(String),
}

fn deserialize_rates<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, RawRate>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(code, rate)| {
            let value = match rate {
                RawRate::Number(n) => n,
                RawRate::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                    serde::de::Error::custom(format!("rate for {} is not a number: {}", code, s))
                })?,
            };
            if !value.is_finite() {
                return Err(serde::de::Error::custom(format!(
                    "rate for {} is not finite",
                    code
                )));
            }
            Ok((code, value))
        })
        .collect()
}

impl CurrencyRates {
    /// Rate of `code` against the base currency
    ///
    /// The base currency is implicitly 1 when the provider omits it.
    pub fn rate(&self, code: &str) -> Option<f64> {
        match self.rates.get(code) {
            Some(rate) => Some(*rate),
            None if code == self.base => Some(1.0),
            None => None,
        }
    }

    /// Cross-rate conversion through the base currency:
    /// `(amount / rates[from]) * rates[to]`
    ///
    /// Returns `None` when either rate is unknown or zero.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        let from_rate = self.rate(from).filter(|r| *r != 0.0)?;
        let to_rate = self.rate(to).filter(|r| *r != 0.0)?;
        Some((amount / from_rate) * to_rate)
    }
}
