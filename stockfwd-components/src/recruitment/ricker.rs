use serde::{Deserialize, Serialize};
use stockfwd_core::recruitment::StockRecruitment;
use stockfwd_core::timeline::FloatValue;

/// Parameters for the Ricker stock-recruitment relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RickerParameters {
    /// Recruits per unit of spawning biomass at low stock size
    /// unit: numbers / biomass
    pub a: FloatValue,
    /// Strength of density dependence
    /// unit: 1 / biomass
    pub b: FloatValue,
}

/// Ricker recruitment
///
/// $$ R = a S e^{-b S} $$
///
/// Recruitment peaks at $S = 1 / b$ and declines for larger stocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ricker {
    parameters: RickerParameters,
}

impl Ricker {
    pub fn from_parameters(parameters: RickerParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &RickerParameters {
        &self.parameters
    }
}

#[typetag::serde]
impl StockRecruitment for Ricker {
    fn recruits(&self, ssb: FloatValue) -> FloatValue {
        let ssb = ssb.max(0.0);
        self.parameters.a * ssb * (-self.parameters.b * ssb).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn peaks_at_inverse_b() {
        let model = Ricker::from_parameters(RickerParameters { a: 5.0, b: 0.01 });
        let peak = model.recruits(100.0);
        assert!(is_close!(peak, 5.0 * 100.0 * (-1.0f64).exp()));
        assert!(model.recruits(90.0) < peak);
        assert!(model.recruits(110.0) < peak);
    }

    #[test]
    fn round_trips_through_the_trait_object() {
        let model: Box<dyn StockRecruitment> =
            Box::new(Ricker::from_parameters(RickerParameters { a: 5.0, b: 0.01 }));
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#"{"type":"Ricker","parameters":{"a":5.0,"b":0.01}}"#);
        let restored: Box<dyn StockRecruitment> = serde_json::from_str(&json).unwrap();
        assert!(is_close!(restored.recruits(50.0), model.recruits(50.0)));
    }
}
