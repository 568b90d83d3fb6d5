mod sats;

pub mod op;
mod secret;

pub use sats::{Sats, SatsConversionError, SATS_PER_BTC};
pub use secret::Secret;
