use serde::{Deserialize, Serialize};
use stockfwd_core::recruitment::StockRecruitment;
use stockfwd_core::timeline::FloatValue;

/// Parameters for the Beverton-Holt stock-recruitment relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BevertonHoltParameters {
    /// Maximum recruitment
    /// unit: numbers
    pub a: FloatValue,
    /// Spawning stock biomass giving half the maximum recruitment
    /// unit: biomass
    pub b: FloatValue,
}

/// Beverton-Holt recruitment
///
/// $$ R = \frac{a S}{b + S} $$
///
/// Where:
/// - $S$ is the spawning stock biomass
/// - $a$ is the asymptotic recruitment
/// - $b$ is the biomass at which recruitment reaches $a / 2$
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BevertonHolt {
    parameters: BevertonHoltParameters,
}

impl BevertonHolt {
    pub fn from_parameters(parameters: BevertonHoltParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &BevertonHoltParameters {
        &self.parameters
    }
}

#[typetag::serde]
impl StockRecruitment for BevertonHolt {
    fn recruits(&self, ssb: FloatValue) -> FloatValue {
        let ssb = ssb.max(0.0);
        let denominator = self.parameters.b + ssb;
        if denominator <= 0.0 {
            return 0.0;
        }
        self.parameters.a * ssb / denominator
    }
}
