//! 백그라운드 서비스 및 릴레이.

pub mod poller;
pub mod relay;

pub use poller::{start_market_poller, MarketPoller, POLL_INTERVAL_SECS};
pub use relay::{OrderSubmitRequest, RelayError, SignalRelay, TradeSignalRequest};
