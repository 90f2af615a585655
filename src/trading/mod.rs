pub mod filter;
pub mod ledger;
pub mod monitor;
pub mod price;
pub mod trader;

pub use filter::TokenFilterEngine;
pub use ledger::PositionLedger;
pub use monitor::MonitorController;
pub use trader::{AutoTrader, PumpPortalTrader, TradeExecutor};
