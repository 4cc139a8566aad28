use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    Synthetic,
    Fixed,
    Offline,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synthetic => write!(f, "synthetic"),
            Self::Fixed => write!(f, "fixed"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "synthetic" | "sim" => Ok(Self::Synthetic),
            "fixed" | "static" => Ok(Self::Fixed),
            "offline" | "none" => Ok(Self::Offline),
            other => Err(anyhow!("unknown price source kind: {other}")),
        }
    }
}
