//! `polyglot build` command implementation.

use std::path::PathBuf;

use clap::Args;
use polyglot_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover polyglot.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source page directory (overrides config).
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Template directory (overrides config).
    #[arg(long)]
    template_dir: Option<PathBuf>,

    /// Resource directory (overrides config).
    #[arg(long)]
    resource_dir: Option<PathBuf>,

    /// Output directory, recreated on every build (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output language; repeat for several (overrides config).
    #[arg(short, long = "language", value_name = "LANG")]
    languages: Vec<String>,

    /// Enable verbose output (log every parsed template and generated page).
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            template_dir: self.template_dir,
            resource_dir: self.resource_dir,
            output_dir: self.output_dir,
            languages: (!self.languages.is_empty()).then_some(self.languages),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let site = &config.site_resolved;
        tracing::debug!(config = ?config.config_path, "Configuration loaded");

        output.info(&format!("Source: {}", site.source_dir.display()));
        output.info(&format!("Templates: {}", site.template_dir.display()));
        output.info(&format!("Output: {}", site.output_dir.display()));
        output.info(&format!("Languages: {}", site.languages.join(", ")));

        let report = super::site_builder(&config).build()?;
        tracing::debug!(
            pages = report.pages,
            files = report.files_written.len(),
            diagnostics = report.diagnostics.len(),
            "Build finished"
        );

        output.diagnostics(&report.diagnostics);
        output.success(&format!(
            "Built {} pages ({} files, {} resources) to {}",
            report.pages,
            report.files_written.len(),
            report.resources_copied,
            site.output_dir.display()
        ));
        Ok(())
    }
}
