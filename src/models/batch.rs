use crate::polymarket::types::{ApiTrade, GraphInvestment, GraphTrade, InvestmentLog};

use super::SourceKind;

/// One raw upstream record, tagged with the shape it arrived in.
#[derive(Debug, Clone)]
pub enum RawRecord {
    /// Subgraph `fixedProductMarketMakers` row (raw 1e6 integer amount).
    Investment(GraphInvestment),
    /// Subgraph `trades` row (whole-dollar decimal amount).
    GraphTrade(GraphTrade),
    /// Decoded on-chain `LogInvestmentChanged` event.
    ChainLog(InvestmentLog),
    /// Data API trade (price × size).
    Rest(ApiTrade),
}

/// Records returned by one upstream for one poll cycle, in upstream order.
/// Created per cycle and consumed by the normalizer.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source: SourceKind,
    pub records: Vec<RawRecord>,
    pub ok: bool,
}

impl SourceBatch {
    pub fn new(source: SourceKind, records: Vec<RawRecord>) -> Self {
        Self {
            source,
            records,
            ok: true,
        }
    }

    /// Placeholder for a source that could not deliver anything this cycle.
    pub fn failed(source: SourceKind) -> Self {
        Self {
            source,
            records: Vec::new(),
            ok: false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
