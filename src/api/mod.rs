pub mod pumpfun;
pub mod solanatracker;

pub use pumpfun::{HistoricalTokenSource, PumpFunClient};
pub use solanatracker::{HolderLookup, SolanaTrackerClient};
