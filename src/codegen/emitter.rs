//! Output file emission.
//!
//! Resolves where a (kind, table) pair is written, applies the
//! overwrite/skip policy and hands the render to the template collaborator.
//! Every step is recorded in an [`EmissionLog`].

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::codegen::context::RenderContext;
use crate::codegen::fs_utils;
use crate::codegen::template::TemplateRenderer;
use crate::error::GenError;
use crate::meta::Table;
use crate::options::{FileKind, FileMode, GeneratorOptions};

/// Human-readable record of a generation run plus the files it wrote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmissionLog {
    pub lines: Vec<String>,
    pub written: Vec<PathBuf>,
}

impl EmissionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn record_written(&mut self, path: PathBuf) {
        self.written.push(path);
    }

    /// Move everything from `other` to the end of this log.
    pub fn append(&mut self, mut other: EmissionLog) {
        self.lines.append(&mut other.lines);
        self.written.append(&mut other.written);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The log as text, one line per step.
    pub fn text(&self) -> String {
        self.lines.iter().map(|line| format!("{}\n", line)).collect()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Writes generated files according to the generator options.
pub struct FileEmitter<'a> {
    options: &'a GeneratorOptions,
    renderer: &'a dyn TemplateRenderer,
}

impl<'a> FileEmitter<'a> {
    pub fn new(options: &'a GeneratorOptions, renderer: &'a dyn TemplateRenderer) -> Self {
        Self { options, renderer }
    }

    /// `{template_root}/{framework}/{kind}.{language}.vm`
    pub fn template_path(&self, kind: FileKind) -> PathBuf {
        self.options
            .template_root
            .join(self.options.framework.dir_name())
            .join(format!("{}.{}.vm", kind.dir_name(), self.options.language.template_name()))
    }

    /// Template for `kind`, which must exist.
    pub fn resolve_template(&self, kind: FileKind) -> Result<PathBuf, GenError> {
        let path = self.template_path(kind);
        if !path.is_file() {
            return Err(GenError::TemplateMissing { kind, path });
        }
        Ok(path)
    }

    /// Output file name without extension.
    pub fn output_name(&self, kind: FileKind, class_name: &str) -> String {
        match kind {
            FileKind::Entity => class_name.to_string(),
            FileKind::Repository => format!("{}{}", class_name, self.options.framework.repository_suffix()),
            FileKind::Service => format!("{}Service", class_name),
        }
    }

    /// `{output_dir}/{package/path}/{kind}/{Name}.{ext}`, creating the directory.
    pub fn target_path(&self, kind: FileKind, class_name: &str) -> Result<PathBuf, GenError> {
        let dir = self
            .options
            .output_dir
            .join(self.options.package_path())
            .join(kind.dir_name());
        fs_utils::ensure_dir(&dir).map_err(|e| GenError::io(&dir, e))?;

        Ok(dir.join(format!(
            "{}.{}",
            self.output_name(kind, class_name),
            self.options.language.suffix()
        )))
    }

    /// Emit one file, appending every step to `log`.
    ///
    /// Under [`FileMode::Skip`] an existing file is left untouched; under
    /// [`FileMode::Overwrite`] it is deleted and rendered again.
    pub fn emit(
        &self,
        kind: FileKind,
        table: &Table,
        context: &RenderContext,
        template: &Path,
        log: &mut EmissionLog,
    ) -> Result<(), GenError> {
        let target = self.target_path(kind, &table.class_name)?;
        let name = file_name(&target);

        if target.exists() {
            match self.options.file_mode {
                FileMode::Overwrite => {
                    info!("Deleting existing file {}", target.display());
                    log.push(format!("Delete existing file [{}]", name));
                    fs::remove_file(&target).map_err(|e| GenError::io(&target, e))?;
                }
                FileMode::Skip => {
                    info!("Skipping existing file {}", target.display());
                    log.push(format!("Skip existing file [{}]", name));
                    return Ok(());
                }
            }
        }

        debug!("Rendering {} with {}", target.display(), template.display());
        log.push(format!("Ready to render template [{}]", file_name(template)));
        self.renderer.render(&target, template, context)?;

        info!("Generated {}", target.display());
        log.push(format!("Generated File => [{}]", target.display()));
        log.record_written(target);
        Ok(())
    }
}
