pub mod position;
pub mod token;

// Re-export commonly used types
pub use position::{Position, PositionPatch};
pub use token::{NewToken, TokenCache, TokenSource};
