use serde::{Deserialize, Serialize};
use stockfwd_core::recruitment::StockRecruitment;
use stockfwd_core::timeline::FloatValue;

/// Parameters for segmented regression ("hockey stick") recruitment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentedRegressionParameters {
    /// Slope below the breakpoint
    /// unit: numbers / biomass
    pub a: FloatValue,
    /// Breakpoint above which recruitment is constant
    /// unit: biomass
    pub b: FloatValue,
}

/// Segmented regression recruitment
///
/// $$ R = a \min(S, b) $$
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentedRegression {
    parameters: SegmentedRegressionParameters,
}

impl SegmentedRegression {
    pub fn from_parameters(parameters: SegmentedRegressionParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &SegmentedRegressionParameters {
        &self.parameters
    }
}

#[typetag::serde]
impl StockRecruitment for SegmentedRegression {
    fn recruits(&self, ssb: FloatValue) -> FloatValue {
        self.parameters.a * ssb.max(0.0).min(self.parameters.b)
    }
}
