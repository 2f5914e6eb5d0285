//! Whole-site generation.
//!
//! A build runs these steps in order and stops at the first fatal error:
//!
//! 1. Create the source, template and resource directories if missing.
//! 2. Recreate the output directory empty.
//! 3. Canonicalize every template, so each is parsed exactly once.
//! 4. Render every source page and write one file per language.
//! 5. Copy the resource directory into the output directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use polyglot_template::{Diagnostic, Directives, TemplateEngine};

use crate::error::SiteError;
use crate::renderer::{PageRenderer, RenderedPage, SiteSettings};
use crate::scanner::Scanner;

/// Directories a site is built from and into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteLayout {
    /// Source pages.
    pub source_dir: PathBuf,
    /// Templates.
    pub template_dir: PathBuf,
    /// Static resources copied verbatim.
    pub resource_dir: PathBuf,
    /// Generated site. Deleted and recreated by every build.
    pub output_dir: PathBuf,
}

/// Summary of a finished build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Number of source pages rendered.
    pub pages: usize,
    /// Files written, relative to the output directory.
    pub files_written: Vec<PathBuf>,
    /// Number of resource files copied.
    pub resources_copied: usize,
    /// Advisory diagnostics raised during expansion.
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of rendering a single source file.
#[derive(Debug)]
pub struct RenderedSource {
    /// Rendered page per language.
    pub pages: BTreeMap<String, RenderedPage>,
    /// Advisory diagnostics raised during expansion.
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds a multi-language site from a [`SiteLayout`].
#[derive(Clone, Debug)]
pub struct SiteBuilder {
    layout: SiteLayout,
    directives: Directives,
    renderer: PageRenderer,
}

impl SiteBuilder {
    /// Create a builder with the default directive vocabulary.
    pub fn new(layout: SiteLayout, settings: SiteSettings) -> Self {
        let renderer = PageRenderer::new(&layout.source_dir, settings);
        Self {
            layout,
            directives: Directives::default(),
            renderer,
        }
    }

    /// Use a custom directive vocabulary.
    #[must_use]
    pub fn with_directives(mut self, directives: Directives) -> Self {
        self.directives = directives;
        self
    }

    /// Directories in use.
    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    /// Build the whole site.
    pub fn build(&self) -> Result<BuildReport, SiteError> {
        self.check_layout()?;
        self.create_input_dirs()?;
        self.reset_output_dir()?;

        let mut engine = self.engine();
        let mut report = BuildReport::default();

        for template in Scanner::new(&self.layout.template_dir).scan() {
            let location = self.layout.template_dir.join(template);
            engine.canonicalize(&location.to_string_lossy())?;
        }
        tracing::debug!(templates = engine.cached_len(), "Templates canonicalized");

        for relative in Scanner::new(&self.layout.source_dir).scan() {
            let pages = self.renderer.render_file(&mut engine, &relative)?;
            for page in pages.into_values() {
                self.write_page(&page)?;
                report.files_written.push(page.path);
            }
            report.pages += 1;
        }

        report.resources_copied = self.copy_resources()?;
        report.diagnostics = engine.take_diagnostics();

        tracing::info!(
            pages = report.pages,
            files = report.files_written.len(),
            resources = report.resources_copied,
            "Site built"
        );
        Ok(report)
    }

    /// Render one source file without writing anything.
    ///
    /// Templates are canonicalized on demand.
    pub fn render_source(&self, path: &Path) -> Result<RenderedSource, SiteError> {
        let relative = self.relative_to_source(path)?;
        let mut engine = self.engine();
        let pages = self.renderer.render_file(&mut engine, &relative)?;
        Ok(RenderedSource {
            pages,
            diagnostics: engine.take_diagnostics(),
        })
    }

    fn engine(&self) -> TemplateEngine {
        TemplateEngine::new(&self.layout.template_dir).with_directives(self.directives.clone())
    }

    fn relative_to_source(&self, path: &Path) -> Result<PathBuf, SiteError> {
        let source_dir = absolute(&self.layout.source_dir)?;
        let file = absolute(path)?;
        file.strip_prefix(&source_dir)
            .map(Path::to_path_buf)
            .map_err(|_| SiteError::OutsideSource {
                path: path.to_path_buf(),
                source_dir: self.layout.source_dir.clone(),
            })
    }

    /// Refuse layouts where recreating the output would delete inputs.
    fn check_layout(&self) -> Result<(), SiteError> {
        let output_dir = absolute(&self.layout.output_dir)?;

        for input in [
            &self.layout.source_dir,
            &self.layout.template_dir,
            &self.layout.resource_dir,
        ] {
            let input_abs = absolute(input)?;
            if input_abs.starts_with(&output_dir) || output_dir.starts_with(&input_abs) {
                return Err(SiteError::OutputOverlap {
                    output_dir: self.layout.output_dir.clone(),
                    input_dir: input.clone(),
                });
            }
        }
        Ok(())
    }

    fn create_input_dirs(&self) -> Result<(), SiteError> {
        for dir in [
            &self.layout.source_dir,
            &self.layout.template_dir,
            &self.layout.resource_dir,
        ] {
            if !dir.exists() {
                tracing::info!(path = %dir.display(), "Creating missing directory");
                fs::create_dir_all(dir).map_err(|e| SiteError::io(dir, e))?;
            }
        }
        Ok(())
    }

    fn reset_output_dir(&self) -> Result<(), SiteError> {
        let dir = &self.layout.output_dir;
        if dir.exists() {
            fs::remove_dir_all(dir).map_err(|e| SiteError::io(dir, e))?;
        }
        fs::create_dir_all(dir).map_err(|e| SiteError::io(dir, e))
    }

    fn write_page(&self, page: &RenderedPage) -> Result<(), SiteError> {
        let path = self.layout.output_dir.join(&page.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SiteError::io(parent, e))?;
        }
        fs::write(&path, &page.html).map_err(|e| SiteError::io(&path, e))?;
        tracing::info!(path = %path.display(), "Generated page");
        Ok(())
    }

    /// Copy the resource directory to `output_dir/<resource dir name>`.
    fn copy_resources(&self) -> Result<usize, SiteError> {
        let source = &self.layout.resource_dir;
        let name = absolute(source)?
            .file_name()
            .map(ToOwned::to_owned);
        let Some(name) = name else {
            return Ok(0);
        };
        copy_dir(source, &self.layout.output_dir.join(name))
    }
}

fn absolute(path: &Path) -> Result<PathBuf, SiteError> {
    std::path::absolute(path).map_err(|e| SiteError::io(path, e))
}

/// Recursively copy `from` into `to`, returning the number of files copied.
fn copy_dir(from: &Path, to: &Path) -> Result<usize, SiteError> {
    fs::create_dir_all(to).map_err(|e| SiteError::io(to, e))?;

    let mut copied = 0;
    for entry in fs::read_dir(from).map_err(|e| SiteError::io(from, e))? {
        let entry = entry.map_err(|e| SiteError::io(from, e))?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| SiteError::io(&source, e))?;
        if file_type.is_dir() {
            copied += copy_dir(&source, &target)?;
        } else {
            fs::copy(&source, &target).map_err(|e| SiteError::io(&source, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}
