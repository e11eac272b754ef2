pub mod data_client;
pub mod rpc_client;
pub mod subgraph_client;
pub mod types;

pub use data_client::DataClient;
pub use rpc_client::RpcClient;
pub use subgraph_client::SubgraphClient;
pub use types::{ApiTrade, GraphInvestment, GraphTrade, InvestmentLog, MarketSummary, RpcLog};
