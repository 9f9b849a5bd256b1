pub mod codec;
pub mod db;
pub mod public;

pub use db::{CityRollup, Database, EquityPoint, StrategyRollup};
pub use public::PublicFill;
