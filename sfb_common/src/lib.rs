mod money;

pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, MONEY_SCALE};
pub use secret::Secret;
