//! `polyglot render` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use polyglot_config::Config;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Source page to render.
    file: PathBuf,

    /// Path to configuration file (default: auto-discover polyglot.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Language to print (default: first configured language).
    #[arg(short, long = "language", value_name = "LANG")]
    language: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;

        let languages = &config.site_resolved.languages;
        let language = match self.language {
            Some(lang) if languages.contains(&lang) => lang,
            Some(lang) => {
                return Err(CliError::Validation(format!(
                    "'{lang}' is not a configured language (configured: {})",
                    languages.join(", ")
                )));
            }
            None => languages.first().cloned().ok_or_else(|| {
                CliError::Validation("no languages configured".to_owned())
            })?,
        };

        tracing::debug!(file = %self.file.display(), %language, "Rendering page");
        let mut rendered = super::site_builder(&config).render_source(&self.file)?;
        output.diagnostics(&rendered.diagnostics);

        let Some(page) = rendered.pages.remove(&language) else {
            return Err(CliError::Validation(format!(
                "nothing rendered for language '{language}'"
            )));
        };

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(page.html.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
