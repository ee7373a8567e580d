//! Generation run driver.
//!
//! A run validates the options, checks the template root, derives class and
//! property names, then emits every requested kind for every table. Fatal
//! preconditions (missing template root, missing template, a keyed kind on
//! a table without primary key) abort the run before the affected kind
//! touches any file. Files written earlier in the run are kept.

use tracing::{info, warn};

use crate::codegen::context::ContextBuilder;
use crate::codegen::emitter::{EmissionLog, FileEmitter};
use crate::codegen::plugins::GenerationHooks;
use crate::codegen::template::TemplateRenderer;
use crate::error::{GenError, RunError};
use crate::meta::Table;
use crate::naming::apply_naming;
use crate::options::GeneratorOptions;

/// Runs a complete generation for a set of tables.
pub struct Generator<'a> {
    options: &'a GeneratorOptions,
    renderer: &'a dyn TemplateRenderer,
    contexts: ContextBuilder,
    hooks: Option<&'a dyn GenerationHooks>,
}

impl<'a> Generator<'a> {
    pub fn new(options: &'a GeneratorOptions, renderer: &'a dyn TemplateRenderer) -> Self {
        Self {
            options,
            renderer,
            contexts: ContextBuilder::new(),
            hooks: None,
        }
    }

    /// Use a specific context builder (e.g. with a fixed date).
    pub fn with_context_builder(mut self, contexts: ContextBuilder) -> Self {
        self.contexts = contexts;
        self
    }

    /// Set post-processing hooks
    pub fn with_hooks(mut self, hooks: &'a dyn GenerationHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Generate every requested kind for `tables`.
    ///
    /// On failure the returned [`RunError`] carries the log up to the abort,
    /// with the error message as its last line.
    pub fn run(&self, tables: Vec<Table>) -> Result<EmissionLog, RunError> {
        let mut log = EmissionLog::new();
        match self.run_into(tables, &mut log) {
            Ok(()) => Ok(log),
            Err(error) => {
                warn!("Generation aborted: {}", error);
                log.push(error.to_string());
                Err(RunError { error, log })
            }
        }
    }

    fn run_into(&self, tables: Vec<Table>, log: &mut EmissionLog) -> Result<(), GenError> {
        self.options.validate()?;

        let root = &self.options.template_root;
        if !root.is_dir() {
            return Err(GenError::ResourceRootMissing(root.clone()));
        }

        let tables = apply_naming(tables, &self.options.naming_rules);
        let emitter = FileEmitter::new(self.options, self.renderer);
        info!(
            "Generating {} table(s) with {} templates from {}",
            tables.len(),
            self.options.framework.name(),
            root.display()
        );

        for kind in self.options.requested_kinds() {
            let template = emitter.resolve_template(kind)?;
            if kind.requires_primary_key() {
                if let Some(table) = tables.iter().find(|t| t.key_columns.is_empty()) {
                    return Err(GenError::MissingPrimaryKey {
                        table: table.name.clone(),
                    });
                }
            }

            let start = log.written.len();
            for table in &tables {
                let context = self.contexts.build(kind, table, self.options)?;
                emitter.emit(kind, table, &context, &template, log)?;
            }

            if let Some(hooks) = self.hooks {
                hooks.after_kind(kind, &log.written[start..]);
            }
        }

        if let Some(hooks) = self.hooks {
            hooks.finalize(&log.written);
        }
        info!("Generated {} file(s)", log.written.len());
        Ok(())
    }
}
