//! Rendering context for one output file.
//!
//! Every kind gets `author`, `date` and `fullPackage`. Entity and Service
//! files additionally get `imports`, `table` and `superClass`; Repository
//! files get `imports`, `entityKeyType` and `entityName`.

use chrono::{Local, NaiveDate};
use indexmap::{IndexMap, IndexSet};
use serde_json::{json, Value};

use crate::error::GenError;
use crate::meta::Table;
use crate::options::{FileKind, GeneratorOptions, Language};

/// Flat key-value mapping handed to the template renderer.
pub type RenderContext = IndexMap<String, Value>;

const NULLABLE_ANNOTATION: &str = "org.jetbrains.annotations.Nullable";
const NOT_NULL_ANNOTATION: &str = "org.jetbrains.annotations.NotNull";

/// Builds the [`RenderContext`] for a (kind, table) pair.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    date: String,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    /// Builder stamped with today's local date.
    pub fn new() -> Self {
        Self::for_date(Local::now().date_naive())
    }

    /// Builder stamped with a fixed date.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn build(
        &self,
        kind: FileKind,
        table: &Table,
        options: &GeneratorOptions,
    ) -> Result<RenderContext, GenError> {
        let mut context = RenderContext::new();
        context.insert("author".to_string(), json!(options.author));
        context.insert("date".to_string(), json!(self.date));
        context.insert("fullPackage".to_string(), json!(options.full_package(kind)));

        let specific = match kind {
            FileKind::Repository => repository_context(table, options)?,
            FileKind::Entity | FileKind::Service => entity_context(kind, table, options)?,
        };
        context.extend(specific);
        Ok(context)
    }
}

fn entity_class(table: &Table, options: &GeneratorOptions) -> String {
    format!("{}.{}", options.full_package(FileKind::Entity), table.class_name)
}

fn entity_context(
    kind: FileKind,
    table: &Table,
    options: &GeneratorOptions,
) -> Result<RenderContext, GenError> {
    let mut imports: IndexSet<String> = table
        .columns
        .iter()
        .filter(|column| !column.jvm_type.is_implicit_import())
        .map(|column| column.jvm_type.qualified_name().to_string())
        .collect();

    if let Some(generator) = options.framework.uuid_generator() {
        if table.columns.iter().any(|c| c.primary_key && c.jvm_type.is_uuid()) {
            imports.insert(generator.to_string());
        }
    }

    if options.language.requires_nullability_annotations() {
        for column in &table.columns {
            let annotation = if column.nullable {
                NULLABLE_ANNOTATION
            } else {
                NOT_NULL_ANNOTATION
            };
            imports.insert(annotation.to_string());
        }
    }

    if !options.super_class.trim().is_empty() {
        imports.insert(options.super_class.clone());
    }

    if kind == FileKind::Service {
        imports.insert(entity_class(table, options));
    }

    let table_value = serde_json::to_value(table)
        .map_err(|e| GenError::Metadata(format!("Failed to serialize table [{}]: {}", table.name, e)))?;

    let mut context = RenderContext::new();
    context.insert("imports".to_string(), json!(imports));
    context.insert("table".to_string(), table_value);
    context.insert("superClass".to_string(), json!(options.super_class_name()));
    Ok(context)
}

fn repository_context(table: &Table, options: &GeneratorOptions) -> Result<RenderContext, GenError> {
    let key = table.primary_key().ok_or_else(|| GenError::MissingPrimaryKey {
        table: table.name.clone(),
    })?;

    let key_type = match options.language {
        Language::Java => key.jvm_type.java_name(false),
        Language::Kotlin => key.jvm_type.kotlin_name(),
    };

    let mut imports = vec![
        entity_class(table, options),
        options.framework.repository_base(options.language).to_string(),
    ];
    if let Some(marker) = options.framework.repository_marker() {
        imports.push(marker.to_string());
    }
    if key.jvm_type.is_uuid() {
        imports.push(key.jvm_type.qualified_name().to_string());
    }

    let mut context = RenderContext::new();
    context.insert("entityKeyType".to_string(), json!(key_type));
    context.insert("entityName".to_string(), json!(table.class_name));
    context.insert("imports".to_string(), json!(imports));
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{build_table, ColumnFilter, RawTable};
    use crate::naming::{NamingRule, Operator, Position, RuleTarget};
    use crate::options::Framework;
    use crate::type_registry::TypeRegistry;

    fn options() -> GeneratorOptions {
        GeneratorOptions {
            author: "huyaro".to_string(),
            root_package: "com.example.demo".to_string(),
            naming_rules: vec![NamingRule::new(Operator::Remove, RuleTarget::Table, Position::Prefix, "tb_")],
            ..Default::default()
        }
    }

    fn table(yaml: &str, options: &GeneratorOptions) -> Table {
        let raw: RawTable = serde_yaml::from_str(yaml).unwrap();
        let matcher = ColumnFilter::default().matcher().unwrap();
        build_table(&TypeRegistry::new(), &raw, &matcher, options.language)
            .unwrap()
            .renamed(&options.naming_rules)
    }

    const USER: &str = r#"
name: tb_user
columns:
  - name: id
    type: uuid
    nullable: false
    primary_key: true
  - name: user_name
    type: varchar
  - name: balance
    type: decimal
  - name: created_at
    type: datetime
    nullable: false
"#;

    const NO_KEY: &str = r#"
name: tb_audit
columns:
  - name: message
    type: varchar
"#;

    fn imports(context: &RenderContext) -> Vec<String> {
        serde_json::from_value(context["imports"].clone()).unwrap()
    }

    fn builder() -> ContextBuilder {
        ContextBuilder::for_date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
    }

    #[test]
    fn test_common_entries() {
        let options = options();
        let context = builder().build(FileKind::Entity, &table(USER, &options), &options).unwrap();
        assert_eq!(context["author"], "huyaro");
        assert_eq!(context["date"], "2024-03-09");
        assert_eq!(context["fullPackage"], "com.example.demo.entity");
        assert_eq!(context["table"]["className"], "User");
        assert_eq!(context["superClass"], "");
    }

    #[test]
    fn test_entity_imports_java() {
        let mut options = options();
        options.super_class = "com.example.base.BaseEntity".to_string();
        let context = builder().build(FileKind::Entity, &table(USER, &options), &options).unwrap();

        assert_eq!(
            imports(&context),
            vec![
                "java.util.UUID",
                "java.math.BigDecimal",
                "java.time.LocalDateTime",
                "org.babyfish.jimmer.sql.meta.UUIDIdGenerator",
                "org.jetbrains.annotations.NotNull",
                "org.jetbrains.annotations.Nullable",
                "com.example.base.BaseEntity",
            ]
        );
        assert_eq!(context["superClass"], "BaseEntity");
    }

    #[test]
    fn test_entity_imports_kotlin_mybatis() {
        let mut options = options();
        options.language = Language::Kotlin;
        options.framework = Framework::MybatisPlus;
        let context = builder().build(FileKind::Entity, &table(USER, &options), &options).unwrap();

        let imports = imports(&context);
        assert!(!imports.iter().any(|i| i.starts_with("org.jetbrains")));
        assert!(!imports.iter().any(|i| i.contains("UUIDIdGenerator")));
        assert!(!imports.iter().any(|i| i.starts_with("java.lang")));
    }

    #[test]
    fn test_service_imports_entity() {
        let options = options();
        let context = builder().build(FileKind::Service, &table(USER, &options), &options).unwrap();
        assert_eq!(context["fullPackage"], "com.example.demo.service");
        assert!(imports(&context).contains(&"com.example.demo.entity.User".to_string()));
    }

    #[test]
    fn test_repository_context_java() {
        let options = options();
        let context = builder().build(FileKind::Repository, &table(USER, &options), &options).unwrap();

        assert_eq!(context["entityKeyType"], "UUID");
        assert_eq!(context["entityName"], "User");
        assert!(context.get("table").is_none());
        assert_eq!(
            imports(&context),
            vec![
                "com.example.demo.entity.User",
                "org.babyfish.jimmer.spring.repository.JRepository",
                "org.springframework.stereotype.Repository",
                "java.util.UUID",
            ]
        );
    }

    #[test]
    fn test_repository_key_type_per_language() {
        let yaml = "name: orders\ncolumns:\n  - name: id\n    type: int\n    primary_key: true\n";

        let mut options = options();
        let context = builder().build(FileKind::Repository, &table(yaml, &options), &options).unwrap();
        assert_eq!(context["entityKeyType"], "Integer");

        options.language = Language::Kotlin;
        options.framework = Framework::MybatisPlus;
        let context = builder().build(FileKind::Repository, &table(yaml, &options), &options).unwrap();
        assert_eq!(context["entityKeyType"], "Int");
        assert_eq!(
            imports(&context),
            vec!["com.example.demo.entity.Orders", "com.baomidou.mybatisplus.core.mapper.BaseMapper"]
        );
    }

    #[test]
    fn test_repository_without_key_fails() {
        let options = options();
        let result = builder().build(FileKind::Repository, &table(NO_KEY, &options), &options);
        match result {
            Err(GenError::MissingPrimaryKey { table }) => assert_eq!(table, "tb_audit"),
            other => panic!("expected MissingPrimaryKey, got {:?}", other),
        }

        // entities do not need a key
        assert!(builder().build(FileKind::Entity, &table(NO_KEY, &options), &options).is_ok());
    }
}
