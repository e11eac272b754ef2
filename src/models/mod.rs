pub mod batch;
pub mod trade;

pub use batch::{RawRecord, SourceBatch};
pub use trade::{format_usd, Trade};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
    Unknown,
}

impl Side {
    /// Lenient parse of the side labels the upstreams use ("BUY", "Buy", "0", ...).
    /// Anything unrecognised maps to `Unknown` rather than failing the record.
    pub fn from_api_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "0" => Side::Buy,
            "SELL" | "1" => Side::Sell,
            _ => Side::Unknown,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
            Side::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// SourceKind: which upstream produced a batch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Indexed query service (GraphQL subgraph).
    Subgraph,
    /// Raw event logs read from a Polygon node.
    ChainLog,
    /// Data API REST trade feed.
    Rest,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Subgraph => "subgraph",
            SourceKind::ChainLog => "chain",
            SourceKind::Rest => "rest",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "subgraph" | "graph" => Ok(SourceKind::Subgraph),
            "chain" | "rpc" | "chainlog" => Ok(SourceKind::ChainLog),
            "rest" | "data-api" => Ok(SourceKind::Rest),
            other => Err(format!("unknown source '{other}' (expected subgraph, chain or rest)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_from_api_str() {
        assert_eq!(Side::from_api_str("buy"), Side::Buy);
        assert_eq!(Side::from_api_str("Sell"), Side::Sell);
        assert_eq!(Side::from_api_str("1"), Side::Sell);
        assert_eq!(Side::from_api_str("Redeem"), Side::Unknown);
    }

    #[test]
    fn test_source_kind_parse() {
        assert_eq!("Chain".parse::<SourceKind>(), Ok(SourceKind::ChainLog));
        assert_eq!("rest".parse::<SourceKind>(), Ok(SourceKind::Rest));
        assert!("kafka".parse::<SourceKind>().is_err());
    }
}
