//! Projection scenarios read from TOML.
//!
//! A scenario names its targets by time-axis label rather than step index so that the same
//! file can be applied to any stock covering those years:
//!
//! ```toml
//! [solver]
//! max_fbar = 2.0
//!
//! [extension]
//! n_steps = 3
//! fbar_nyears = 3
//!
//! [recruitment.model]
//! type = "SegmentedRegression"
//! parameters = { a = 1.5, b = 500.0 }
//!
//! [recruitment.residuals]
//! log_residuals = [-0.2, 0.0, 0.3]
//! seed = 11
//!
//! [[targets]]
//! year = 2020
//! quantity = "fbar"
//! value = 0.3
//!
//! [[targets]]
//! year = 2021
//! quantity = "catch"
//! value = 0.9
//! relative_year = 2020
//!
//! [[targets]]
//! year = 2021
//! quantity = "ssb_end"
//! min = 300.0
//! ```

use serde::{Deserialize, Serialize};
use stockfwd_components::assumptions::MeanAssumptions;
use stockfwd_components::errors::ComponentError;
use stockfwd_components::residuals::ResidualSampler;
use stockfwd_core::control::{Column, ProjectionControl, TargetSpec};
use stockfwd_core::errors::{ConfigurationError, StockFwdError, TimelineError};
use stockfwd_core::quantity::QuantityKind;
use stockfwd_core::recruitment::{Recruitment, StockRecruitment};
use stockfwd_core::solver::{ForwardSolver, Projection, SolverConfig};
use stockfwd_core::timeline::{FloatValue, StockTimeline};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Could not parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Year {0} is not on the stock's time axis")]
    UnknownYear(i32),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Component(#[from] ComponentError),
    #[error(transparent)]
    Projection(#[from] StockFwdError),
}

/// Convenience type for `Result<T, ScenarioError>`.
pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// Steps appended to the stock before projecting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    pub n_steps: usize,
    #[serde(flatten)]
    pub assumptions: MeanAssumptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecruitmentConfig {
    pub model: Box<dyn StockRecruitment>,
    /// Residuals resampled over the projection steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residuals: Option<ResidualSampler>,
}

/// A target column given once for all iterations or once per iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnConfig {
    Shared(FloatValue),
    PerIteration(Vec<FloatValue>),
}

impl ColumnConfig {
    fn into_values(self) -> Vec<FloatValue> {
        match self {
            ColumnConfig::Shared(value) => vec![value],
            ColumnConfig::PerIteration(values) => values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub year: i32,
    pub quantity: QuantityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<ColumnConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ColumnConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<ColumnConfig>,
}

/// Everything needed to project a stock, apart from the stock itself.
#[derive(Debug, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<ExtensionConfig>,
    pub recruitment: RecruitmentConfig,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

impl Scenario {
    pub fn from_toml_str(toml_str: &str) -> ScenarioResult<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Target specifications with years resolved against `timeline`.
    pub fn control(&self, timeline: &StockTimeline) -> ScenarioResult<ProjectionControl> {
        let step_of = |year: i32| {
            timeline
                .time_axis()
                .index_of(year)
                .ok_or(ScenarioError::UnknownYear(year))
        };
        let mut specs = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let step = step_of(target.year)?;
            let mut spec = TargetSpec::new(step, target.quantity);
            for (column, values) in [
                (Column::Min, &target.min),
                (Column::Value, &target.value),
                (Column::Max, &target.max),
            ] {
                if let Some(values) = values {
                    spec = spec.with_column(column, values.clone().into_values());
                }
            }
            if let Some(relative_year) = target.relative_year {
                spec = spec.relative_to(step_of(relative_year)?);
            }
            specs.push(spec);
        }
        Ok(ProjectionControl::from_specs(specs)?)
    }

    /// Extends a copy of `timeline` if requested and projects it.
    pub fn run(self, timeline: &StockTimeline) -> ScenarioResult<Projection> {
        let mut timeline = timeline.clone();
        if let Some(extension) = &self.extension {
            timeline.extend(extension.n_steps, &extension.assumptions)?;
        }
        let control = self.control(&timeline)?;

        let mut recruitment = Recruitment::from_boxed(self.recruitment.model);
        if let Some(sampler) = &self.recruitment.residuals {
            recruitment = recruitment.with_residuals(sampler.sample_projection(&timeline)?);
        }

        info!(
            n_targets = control.len(),
            n_steps = timeline.n_steps(),
            extended = self.extension.is_some(),
            "Running scenario"
        );
        let solver = ForwardSolver::new(self.solver);
        Ok(solver.project(&timeline, &control, &recruitment)?)
    }
}
