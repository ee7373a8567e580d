//! Hooks into the generation run.
//!
//! Callers that need to post-process generated sources (reformatting,
//! indexing, opening them in an editor) implement [`GenerationHooks`] and
//! pass it to the [`Generator`](crate::codegen::Generator).

use std::path::PathBuf;

use crate::options::FileKind;

/// Callback trait invoked by the generator.
///
/// # Example
///
/// ```ignore
/// struct Formatter;
///
/// impl GenerationHooks for Formatter {
///     fn finalize(&self, files: &[PathBuf]) {
///         for file in files {
///             run_formatter(file);
///         }
///     }
/// }
/// ```
pub trait GenerationHooks {
    /// Called after every table of `kind` has been emitted.
    ///
    /// `written` holds only the files rendered for this kind; skipped files
    /// are not included.
    fn after_kind(&self, kind: FileKind, written: &[PathBuf]) {
        // Default: no-op
        let _ = (kind, written);
    }

    /// Called once at the end of a successful run with every file written.
    fn finalize(&self, files: &[PathBuf]) {
        // Default: no-op
        let _ = files;
    }
}

/// No-op implementation of GenerationHooks
pub struct NoOpHooks;

impl GenerationHooks for NoOpHooks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_op_hooks() {
        let hooks = NoOpHooks;
        hooks.after_kind(FileKind::Entity, &[]);
        hooks.finalize(&[PathBuf::from("/tmp/User.java")]);
        // Test passes if no panics occur
    }
}
