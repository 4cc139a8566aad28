use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Ticker of the index or a listed company, e.g. `KSE-100` or `OGDC`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub const KSE_100: &'static str = "KSE-100";

    pub fn new(raw: &str) -> Result<Self> {
        let symbol = raw.trim().to_uppercase();

        if symbol.is_empty() {
            bail!("symbol must not be empty");
        }
        if let Some(invalid) = symbol
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '.'))
        {
            bail!("invalid character {invalid:?} in symbol {raw:?}");
        }

        Ok(Self(symbol))
    }

    pub fn kse_100() -> Self {
        Self(Self::KSE_100.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        Self::new(raw)
    }
}

impl TryFrom<String> for Symbol {
    type Error = anyhow::Error;

    fn try_from(raw: String) -> Result<Self> {
        Self::new(&raw)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self)
    }
}
