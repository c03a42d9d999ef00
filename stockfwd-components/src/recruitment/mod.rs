//! Stock-recruitment relationships.
//!
//! Every model implements [`StockRecruitment`](stockfwd_core::recruitment::StockRecruitment)
//! and serialises with a `type` tag naming the model, so it can be chosen from a scenario
//! file. Spawning stock biomass below zero is treated as zero.

mod bevholt;
mod mean;
mod ricker;
mod segreg;

pub use bevholt::{BevertonHolt, BevertonHoltParameters};
pub use mean::{ConstantMean, GeometricMean};
pub use ricker::{Ricker, RickerParameters};
pub use segreg::{SegmentedRegression, SegmentedRegressionParameters};
