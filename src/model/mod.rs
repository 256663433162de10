//! Deterministic reserving model and residual extraction
//!
//! - **Chain ladder**: volume-weighted development factors, ultimates and
//!   reserves, back-filled fitted values
//! - **Fit**: one-off fit of the observed triangle producing fitted
//!   incrementals, Pearson residuals and the residual pool

mod chainladder;
mod fit;
mod residuals;

pub use chainladder::{ChainLadder, DevelopmentFactor};
pub use fit::OdpFit;
pub use residuals::{PoolEntry, ResidualOptions, ResidualPool, ZERO_RESIDUAL_TOLERANCE};
