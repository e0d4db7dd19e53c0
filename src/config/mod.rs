pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use resolved::{CliConfig, ResolvedConfig};

#[cfg(feature = "cli")]
mod resolved {
    use crate::config::toml_config::TomlConfig;
    use crate::domain::model::Track;
    use crate::domain::ports::ConfigProvider;
    use crate::utils::error::{ReconError, Result};
    use crate::utils::validation::{
        validate_non_empty, validate_positive_number, validate_url, Validate,
    };
    use clap::Parser;
    use std::path::PathBuf;

    const DEFAULT_OUTPUT_PATH: &str = "./output";
    const DEFAULT_CONCURRENT_REQUESTS: usize = 5;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "roster-recon")]
    #[command(about = "Reconciles participant rosters against a GitLab user directory")]
    pub struct CliConfig {
        /// Optional TOML config file; command-line values take precedence.
        #[arg(long)]
        pub config: Option<PathBuf>,

        #[arg(long)]
        pub roster_url: Option<String>,

        #[arg(long)]
        pub lead_url: Option<String>,

        #[arg(long)]
        pub roster_token: Option<String>,

        #[arg(long)]
        pub directory_url: Option<String>,

        #[arg(long)]
        pub directory_token: Option<String>,

        #[arg(long, default_value = "cohort1")]
        pub cohort: String,

        /// Track whose summary is printed: contributor or lead.
        #[arg(long, default_value = "contributor")]
        pub track: String,

        #[arg(long)]
        pub output_path: Option<String>,

        #[arg(long)]
        pub concurrent_requests: Option<usize>,

        /// How many affiliations to show in the printed summary.
        #[arg(long, default_value = "5")]
        pub top: usize,

        /// Only show affiliations containing this text.
        #[arg(long)]
        pub affiliation: Option<String>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl CliConfig {
        /// Merges CLI arguments over the optional config file and applies
        /// defaults. Missing required values are a configuration error.
        pub fn resolve(self) -> Result<ResolvedConfig> {
            let file = match &self.config {
                Some(path) => TomlConfig::from_path(path)?,
                None => TomlConfig::default(),
            };

            let track: Track = self.track.parse()?;

            Ok(ResolvedConfig {
                roster_endpoint: required(
                    "roster_url",
                    self.roster_url.or_else(|| file.roster_url().map(String::from)),
                )?,
                lead_endpoint: required(
                    "lead_url",
                    self.lead_url.or_else(|| file.lead_url().map(String::from)),
                )?,
                roster_token: required(
                    "roster_token",
                    self.roster_token
                        .or_else(|| file.roster_token().map(String::from)),
                )?,
                directory_endpoint: required(
                    "directory_url",
                    self.directory_url
                        .or_else(|| file.directory_url().map(String::from)),
                )?,
                directory_token: required(
                    "directory_token",
                    self.directory_token
                        .or_else(|| file.directory_token().map(String::from)),
                )?,
                output_path: self
                    .output_path
                    .or_else(|| file.output_path().map(String::from))
                    .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
                concurrent_requests: self
                    .concurrent_requests
                    .or_else(|| file.concurrent_requests())
                    .unwrap_or(DEFAULT_CONCURRENT_REQUESTS),
                cohort: self.cohort,
                track,
                top: self.top,
                affiliation: self.affiliation,
                verbose: self.verbose,
            })
        }
    }

    fn required(field: &str, value: Option<String>) -> Result<String> {
        value.ok_or_else(|| ReconError::ConfigError {
            message: format!("Missing required setting: {}", field),
        })
    }

    /// Fully merged configuration the binary runs with.
    #[derive(Debug, Clone)]
    pub struct ResolvedConfig {
        pub roster_endpoint: String,
        pub lead_endpoint: String,
        pub roster_token: String,
        pub directory_endpoint: String,
        pub directory_token: String,
        pub output_path: String,
        pub concurrent_requests: usize,
        pub cohort: String,
        pub track: Track,
        pub top: usize,
        pub affiliation: Option<String>,
        pub verbose: bool,
    }

    impl ConfigProvider for ResolvedConfig {
        fn roster_endpoint(&self) -> &str {
            &self.roster_endpoint
        }

        fn lead_endpoint(&self) -> &str {
            &self.lead_endpoint
        }

        fn roster_token(&self) -> &str {
            &self.roster_token
        }

        fn directory_endpoint(&self) -> &str {
            &self.directory_endpoint
        }

        fn directory_token(&self) -> &str {
            &self.directory_token
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn concurrent_requests(&self) -> usize {
            self.concurrent_requests
        }
    }

    impl Validate for ResolvedConfig {
        fn validate(&self) -> Result<()> {
            validate_url("roster_url", &self.roster_endpoint)?;
            validate_url("lead_url", &self.lead_endpoint)?;
            validate_url("directory_url", &self.directory_endpoint)?;
            validate_non_empty("roster_token", &self.roster_token)?;
            validate_non_empty("directory_token", &self.directory_token)?;
            validate_positive_number("concurrent_requests", self.concurrent_requests, 1)?;
            validate_positive_number("top", self.top, 1)?;
            Ok(())
        }
    }

}
