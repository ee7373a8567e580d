//! # genx: table-to-code generator
//!
//! genx turns database table metadata into Java or Kotlin persistence
//! sources (entities, repositories, services) for the Jimmer and
//! MyBatis-Plus frameworks.
//!
//! ## Pipeline
//!
//! 1. A metadata snapshot ([`meta::RawTable`]) is resolved against the
//!    [`TypeRegistry`] into [`meta::Table`]s.
//! 2. Naming rules derive class and property names ([`naming`]).
//! 3. A [`codegen::ContextBuilder`] produces one rendering context per
//!    (kind, table) pair.
//! 4. The [`codegen::FileEmitter`] resolves the target file, applies the
//!    overwrite/skip policy and renders the template.
//!
//! ## Example project file
//!
//! ```yaml
//! author: huyaro
//! root_package: com.example.demo
//! output_dir: src/main/java
//! kinds: [entity, repository]
//! language: java
//! framework: jimmer
//! naming_rules:
//!   - operator: remove
//!     target: table
//!     position: prefix
//!     value: tb_
//! column_filter:
//!   exclude: "created_by updated_by"
//!   use_regex: false
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use genx::codegen::{Generator, PlaceholderRenderer};
//! use genx::meta::{build_tables, load_tables};
//! use genx::{GeneratorOptions, TypeRegistry};
//!
//! let options = GeneratorOptions::from_file("genx.yaml").unwrap();
//! let registry = TypeRegistry::load("genx-types.json").unwrap();
//! let raws = load_tables("tables.yaml").unwrap();
//! let tables = build_tables(&registry, &raws, &options.column_filter, options.language).unwrap();
//!
//! let renderer = PlaceholderRenderer::new();
//! let log = Generator::new(&options, &renderer).run(tables).unwrap();
//! print!("{}", log.text());
//! ```

pub mod error;
pub mod type_registry;
pub mod naming;
pub mod meta;
pub mod options;
pub mod sql_log;

// Code generation
pub mod codegen;

// Re-export key types
pub use error::{GenError, RegistryError, RunError};
pub use type_registry::{BuiltinType, Origin, TargetType, TypeMapping, TypeRegistry};
pub use naming::{apply_naming, derive_name, NamingRule, Operator, Position, RuleTarget};
pub use meta::{Column, ColumnFilter, Table};
pub use options::{FileKind, FileMode, Framework, GeneratorOptions, Language};
pub use sql_log::format_sql_log;
