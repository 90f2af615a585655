use thiserror::Error;

#[derive(Debug, Error)]
pub enum SniperError {
    #[error("Invalid bonding curve reserves: {0}")]
    InvalidReserve(String),

    #[error("Position already open for mint: {0}")]
    DuplicatePosition(String),

    #[error("No active position for mint: {0}")]
    NoSuchPosition(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Trade failed for {mint}: {reason}")]
    TradeFailed { mint: String, reason: String },
}
