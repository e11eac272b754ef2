use std::collections::HashMap;

use async_trait::async_trait;
use metrics::counter;
use rust_decimal::Decimal;

use crate::config::{AppConfig, SubgraphSchema};
use crate::errors::TrackerError;
use crate::ingestion::chain_decoder::{decode_investment_log, LOG_INVESTMENT_CHANGED_TOPIC, USDC_DECIMALS};
use crate::models::{RawRecord, SourceBatch, SourceKind};
use crate::polymarket::subgraph_client::{decode_investments, decode_trades};
use crate::polymarket::types::RpcLog;
use crate::polymarket::{DataClient, MarketSummary, RpcClient, SubgraphClient};

/// One upstream that can deliver a batch of raw trade records.
///
/// `since` is epoch seconds; `limit` bounds the number of records returned.
/// Implementations perform network I/O only and never touch shared state.
#[async_trait]
pub trait EventSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn fetch(&self, since: i64, limit: usize) -> Result<SourceBatch, TrackerError>;

    /// Best-effort list of capabilities (e.g. root query fields) for diagnostics.
    async fn probe(&self) -> Result<Vec<String>, TrackerError> {
        Ok(Vec::new())
    }

    /// Highest-volume markets, if the upstream can answer that.
    async fn top_markets(&self, _count: usize) -> Result<Vec<MarketSummary>, TrackerError> {
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Indexed query (subgraph)
// ---------------------------------------------------------------------------

pub struct SubgraphSource {
    client: SubgraphClient,
    schema: SubgraphSchema,
    min_amount_usd: Decimal,
}

impl SubgraphSource {
    pub fn new(client: SubgraphClient, schema: SubgraphSchema, min_amount_usd: Decimal) -> Self {
        Self {
            client,
            schema,
            min_amount_usd,
        }
    }

    fn unavailable(e: impl ToString) -> TrackerError {
        TrackerError::upstream(SourceKind::Subgraph, e)
    }
}

#[async_trait]
impl EventSource for SubgraphSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Subgraph
    }

    async fn fetch(&self, since: i64, limit: usize) -> Result<SourceBatch, TrackerError> {
        let records = match self.schema {
            SubgraphSchema::Investments => {
                let raw = raw_usdc_amount(self.min_amount_usd).ok_or_else(|| {
                    Self::unavailable(format!(
                        "minimum amount {} does not fit in raw USDC units",
                        self.min_amount_usd
                    ))
                })?;
                let rows = self
                    .client
                    .investments(since, &raw, limit)
                    .await
                    .map_err(Self::unavailable)?;
                decode_investments(rows)
                    .into_iter()
                    .map(RawRecord::Investment)
                    .collect()
            }
            SubgraphSchema::Trades => {
                let rows = self
                    .client
                    .trades(since, &self.min_amount_usd.to_string(), limit)
                    .await
                    .map_err(Self::unavailable)?;
                decode_trades(rows)
                    .into_iter()
                    .map(RawRecord::GraphTrade)
                    .collect()
            }
        };

        Ok(SourceBatch::new(SourceKind::Subgraph, records))
    }

    async fn probe(&self) -> Result<Vec<String>, TrackerError> {
        self.client.query_fields().await.map_err(Self::unavailable)
    }

    async fn top_markets(&self, count: usize) -> Result<Vec<MarketSummary>, TrackerError> {
        self.client.top_markets(count).await.map_err(Self::unavailable)
    }
}

/// `investmentAmount` is stored in raw USDC units; convert a dollar threshold
/// to that integer form. `None` when the scaled value does not fit.
pub fn raw_usdc_amount(usd: Decimal) -> Option<String> {
    usd.checked_mul(Decimal::from(10u64.pow(USDC_DECIMALS)))
        .map(|raw| raw.trunc().to_string())
}

// ---------------------------------------------------------------------------
// Chain logs (Polygon JSON-RPC)
// ---------------------------------------------------------------------------

/// Block number to block timestamp lookup used while walking chain logs.
#[async_trait]
pub trait BlockClock: Send + Sync {
    async fn block_timestamp(&self, number: u64) -> Result<i64, TrackerError>;
}

#[async_trait]
impl BlockClock for RpcClient {
    async fn block_timestamp(&self, number: u64) -> Result<i64, TrackerError> {
        RpcClient::block_timestamp(self, number)
            .await
            .map_err(|e| TrackerError::upstream(SourceKind::ChainLog, e))
    }
}

/// Decode `logs` (oldest-first, as `eth_getLogs` returns them) into at most
/// `limit` records, newest first, stopping at the first log older than `since`.
///
/// Undecodable logs and logs whose block timestamp cannot be fetched are
/// skipped. Each block's timestamp is looked up at most once.
pub async fn collect_investment_logs<C>(
    logs: &[RpcLog],
    clock: &C,
    since: i64,
    limit: usize,
) -> Vec<RawRecord>
where
    C: BlockClock + ?Sized,
{
    let mut block_times: HashMap<u64, i64> = HashMap::new();
    let mut records = Vec::new();

    for log in logs.iter().rev() {
        if records.len() >= limit {
            break;
        }

        let mut decoded = match decode_investment_log(log) {
            Ok(d) => d,
            Err(e) => {
                counter!("records_dropped_total", "stage" => "decode").increment(1);
                tracing::warn!(
                    error = %e,
                    tx = log.transaction_hash.as_deref().unwrap_or("?"),
                    "Chain source: skipping undecodable log"
                );
                continue;
            }
        };

        let timestamp = match block_times.get(&decoded.block_number) {
            Some(ts) => *ts,
            None => match clock.block_timestamp(decoded.block_number).await {
                Ok(ts) => {
                    block_times.insert(decoded.block_number, ts);
                    ts
                }
                Err(e) => {
                    counter!("records_dropped_total", "stage" => "decode").increment(1);
                    tracing::warn!(
                        error = %e,
                        block = decoded.block_number,
                        "Chain source: block timestamp unavailable, skipping log"
                    );
                    continue;
                }
            },
        };

        if timestamp < since {
            // Everything further back is older still.
            break;
        }

        decoded.timestamp = timestamp;
        records.push(RawRecord::ChainLog(decoded));
    }

    records
}

pub struct ChainLogSource {
    rpc: RpcClient,
    factory_address: String,
    block_range: u64,
}

impl ChainLogSource {
    pub fn new(rpc: RpcClient, factory_address: impl Into<String>, block_range: u64) -> Self {
        Self {
            rpc,
            factory_address: factory_address.into(),
            block_range,
        }
    }

    fn unavailable(e: impl ToString) -> TrackerError {
        TrackerError::upstream(SourceKind::ChainLog, e)
    }
}

#[async_trait]
impl EventSource for ChainLogSource {
    fn kind(&self) -> SourceKind {
        SourceKind::ChainLog
    }

    async fn fetch(&self, since: i64, limit: usize) -> Result<SourceBatch, TrackerError> {
        let latest = self.rpc.block_number().await.map_err(Self::unavailable)?;
        let from_block = latest.saturating_sub(self.block_range);

        let logs = self
            .rpc
            .get_logs(
                &self.factory_address,
                LOG_INVESTMENT_CHANGED_TOPIC,
                from_block,
                latest,
            )
            .await
            .map_err(Self::unavailable)?;

        tracing::debug!(
            from_block,
            to_block = latest,
            logs = logs.len(),
            "Chain source: scanned block range"
        );

        let records = collect_investment_logs(&logs, &self.rpc, since, limit).await;

        Ok(SourceBatch::new(SourceKind::ChainLog, records))
    }

    async fn probe(&self) -> Result<Vec<String>, TrackerError> {
        let latest = self.rpc.block_number().await.map_err(Self::unavailable)?;
        Ok(vec![format!("eth_blockNumber={latest}")])
    }
}

// ---------------------------------------------------------------------------
// REST poll (Data API)
// ---------------------------------------------------------------------------

pub struct RestSource {
    client: DataClient,
}

impl RestSource {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventSource for RestSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Rest
    }

    /// The trade feed has no server-side time filter, so `since` is ignored
    /// here and applied by the pipeline after normalization.
    async fn fetch(&self, _since: i64, limit: usize) -> Result<SourceBatch, TrackerError> {
        let trades = self
            .client
            .get_recent_trades(limit)
            .await
            .map_err(|e| TrackerError::upstream(SourceKind::Rest, e))?;

        Ok(SourceBatch::new(
            SourceKind::Rest,
            trades.into_iter().map(RawRecord::Rest).collect(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Source: the closed set of variants, chosen by configuration
// ---------------------------------------------------------------------------

pub enum Source {
    Subgraph(SubgraphSource),
    ChainLog(ChainLogSource),
    Rest(RestSource),
}

impl Source {
    pub fn from_config(kind: SourceKind, config: &AppConfig, http: reqwest::Client) -> Self {
        match kind {
            SourceKind::Subgraph => Source::Subgraph(SubgraphSource::new(
                SubgraphClient::new(http, config.subgraph_url.clone()),
                config.subgraph_schema,
                config.display.whale_threshold,
            )),
            SourceKind::ChainLog => Source::ChainLog(ChainLogSource::new(
                RpcClient::new(http, config.polygon_rpc_url.clone()),
                config.fpmm_factory_address.clone(),
                config.chain_block_range,
            )),
            SourceKind::Rest => Source::Rest(RestSource::new(DataClient::new(
                http,
                config.data_api_url.clone(),
            ))),
        }
    }
}

#[async_trait]
impl EventSource for Source {
    fn kind(&self) -> SourceKind {
        match self {
            Source::Subgraph(s) => s.kind(),
            Source::ChainLog(s) => s.kind(),
            Source::Rest(s) => s.kind(),
        }
    }

    async fn fetch(&self, since: i64, limit: usize) -> Result<SourceBatch, TrackerError> {
        match self {
            Source::Subgraph(s) => s.fetch(since, limit).await,
            Source::ChainLog(s) => s.fetch(since, limit).await,
            Source::Rest(s) => s.fetch(since, limit).await,
        }
    }

    async fn probe(&self) -> Result<Vec<String>, TrackerError> {
        match self {
            Source::Subgraph(s) => s.probe().await,
            Source::ChainLog(s) => s.probe().await,
            Source::Rest(s) => s.probe().await,
        }
    }

    async fn top_markets(&self, count: usize) -> Result<Vec<MarketSummary>, TrackerError> {
        match self {
            Source::Subgraph(s) => s.top_markets(count).await,
            Source::ChainLog(s) => s.top_markets(count).await,
            Source::Rest(s) => s.top_markets(count).await,
        }
    }
}
