//! TOML configuration of a pipeline run.

use std::path::{Path, PathBuf};

use factorfolio_backtest::{FormationConfig, InsufficientDataPolicy, TieBreak};
use factorfolio_optimizer::OptimizerConfig;
use factorfolio_primitives::{OptimizationMethod, PortfolioMode};
use factorfolio_utils::{FACTOR_SCORE, PanelColumns, PreparationConfig};
use serde::{Deserialize, Serialize};

use crate::PipelineError;

fn default_score_column() -> String {
    FACTOR_SCORE.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// `[data]`: where inputs live and how the panel is laid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Factor panel CSV.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel: Option<PathBuf>,
    /// Wide date × ticker return CSV for allocation runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<PathBuf>,
    /// Factor-score column of the panel.
    #[serde(default = "default_score_column")]
    pub score_column: String,
    /// Column used to partition the panel into groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_column: Option<String>,
    /// Name reported for the factor; defaults to the score column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor_name: Option<String>,
    /// Directory receiving result tables.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            panel: None,
            returns: None,
            score_column: default_score_column(),
            group_column: None,
            factor_name: None,
            output_dir: default_output_dir(),
        }
    }
}

impl DataConfig {
    /// Panel columns to read.
    #[must_use]
    pub fn panel_columns(&self) -> PanelColumns {
        let columns = PanelColumns::default().with_score(&self.score_column);
        match &self.group_column {
            Some(group) => columns.with_group(group),
            None => columns,
        }
    }

    /// Factor label used to tag backtest output.
    #[must_use]
    pub fn factor(&self) -> &str {
        self.factor_name.as_deref().unwrap_or(&self.score_column)
    }
}

fn default_modes() -> Vec<PortfolioMode> {
    vec![PortfolioMode::LongShort, PortfolioMode::LongOnly]
}

/// `[formation]`: quantile portfolio settings shared by every mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationSettings {
    /// Fraction of each partition selected per leg.
    #[serde(default = "FormationSettings::default_quantile")]
    pub quantile: f64,
    /// Minimum scored assets per partition.
    #[serde(default = "FormationSettings::default_min_partition_size")]
    pub min_partition_size: usize,
    /// Handling of thin partitions.
    #[serde(default)]
    pub on_insufficient_data: InsufficientDataPolicy,
    /// Ordering of equal scores.
    #[serde(default)]
    pub tie_break: TieBreak,
    /// Modes to backtest.
    #[serde(default = "default_modes")]
    pub modes: Vec<PortfolioMode>,
    /// Start every run on the first date this group is observed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_start_to: Option<String>,
}

impl FormationSettings {
    fn default_quantile() -> f64 {
        FormationConfig::default().quantile
    }

    fn default_min_partition_size() -> usize {
        FormationConfig::default().min_partition_size
    }

    /// Formation config for one mode.
    #[must_use]
    pub const fn for_mode(&self, mode: PortfolioMode) -> FormationConfig {
        FormationConfig {
            quantile: self.quantile,
            mode,
            min_partition_size: self.min_partition_size,
            on_insufficient_data: self.on_insufficient_data,
            tie_break: self.tie_break,
        }
    }
}

impl Default for FormationSettings {
    fn default() -> Self {
        Self {
            quantile: Self::default_quantile(),
            min_partition_size: Self::default_min_partition_size(),
            on_insufficient_data: InsufficientDataPolicy::default(),
            tie_break: TieBreak::default(),
            modes: default_modes(),
            align_start_to: None,
        }
    }
}

const fn default_frontier_points() -> usize {
    20
}

/// `[optimizer]`: allocation method plus the optimizer's own settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    /// Objective of allocation runs.
    #[serde(default)]
    pub method: OptimizationMethod,
    /// Points on the efficient frontier.
    #[serde(default = "default_frontier_points")]
    pub frontier_points: usize,
    /// Estimation, cleaning and bounds.
    #[serde(flatten)]
    pub config: OptimizerConfig,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            method: OptimizationMethod::default(),
            frontier_points: default_frontier_points(),
            config: OptimizerConfig::default(),
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Inputs and outputs.
    #[serde(default)]
    pub data: DataConfig,
    /// Portfolio formation.
    #[serde(default)]
    pub formation: FormationSettings,
    /// Allocation.
    #[serde(default)]
    pub optimizer: OptimizerSettings,
    /// Return preparation before allocation.
    #[serde(default)]
    pub preparation: PreparationConfig,
}

impl PipelineConfig {
    /// Parse a TOML document and validate it.
    ///
    /// # Errors
    /// Returns `PipelineError::ParseConfig` for malformed TOML and the
    /// errors of [`PipelineConfig::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self, PipelineError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    ///
    /// # Errors
    /// Returns `PipelineError::Io` if the file cannot be read, otherwise as
    /// [`PipelineConfig::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    ///
    /// # Errors
    /// Returns `PipelineError::RenderConfig` if serialisation fails.
    pub fn to_toml_string(&self) -> Result<String, PipelineError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every section.
    ///
    /// # Errors
    /// Returns `PipelineError::InvalidConfig` when no mode is configured, or
    /// the wrapped error of the first invalid section.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.formation.modes.is_empty() {
            return Err(PipelineError::InvalidConfig("formation.modes is empty".to_string()));
        }
        for &mode in &self.formation.modes {
            self.formation.for_mode(mode).validate()?;
        }
        self.optimizer.config.validate()?;
        self.preparation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.data.score_column, "factor_score");
        assert_eq!(config.formation.modes, default_modes());
        assert_eq!(config.optimizer.config, OptimizerConfig::default());
        assert_eq!(config.preparation.max_missing_pct, 0.5);
    }

    #[test]
    fn parses_every_section() {
        let text = r#"
            [data]
            panel = "panel.csv"
            score_column = "momentum"
            group_column = "asset_class"

            [formation]
            quantile = 0.1
            modes = ["long_only"]
            tie_break = "ticker_ascending"
            align_start_to = "Crypto"

            [optimizer]
            method = "min_volatility"
            risk_free_rate = 0.03
            frontier_points = 5

            [preparation]
            clip_upper = 0.5
        "#;
        let config = PipelineConfig::from_toml_str(text).unwrap();
        assert_eq!(config.data.panel, Some(PathBuf::from("panel.csv")));
        assert_eq!(config.data.factor(), "momentum");
        assert_eq!(config.data.panel_columns().group.as_deref(), Some("asset_class"));
        assert_eq!(config.formation.modes, vec![PortfolioMode::LongOnly]);
        assert_eq!(config.formation.tie_break, TieBreak::TickerAscending);
        assert_eq!(config.formation.for_mode(PortfolioMode::LongOnly).quantile, 0.1);
        assert_eq!(config.optimizer.method, OptimizationMethod::MinVolatility);
        assert_eq!(config.optimizer.config.risk_free_rate, 0.03);
        assert_eq!(config.optimizer.frontier_points, 5);
        assert_eq!(config.optimizer.config.min_observations, 252);
        assert_eq!(config.preparation.clip_upper, 0.5);
    }

    #[test]
    fn rendered_config_parses_back() {
        let mut config = PipelineConfig::default();
        config.data.group_column = Some("sector".to_string());
        config.formation.align_start_to = Some("Tech".to_string());
        let text = config.to_toml_string().unwrap();
        assert_eq!(PipelineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[rstest]
    #[case("[formation]\nquantile = 1.5")]
    #[case("[formation]\nmodes = []")]
    #[case("[preparation]\nmax_missing_pct = 0.0")]
    fn out_of_range_values_are_rejected(#[case] text: &str) {
        assert!(PipelineConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = PipelineConfig::from_toml_str("[data\npanel = 1").unwrap_err();
        assert!(matches!(err, PipelineError::ParseConfig(_)));
    }
}
