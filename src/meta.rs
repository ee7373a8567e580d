//! Table metadata model.
//!
//! [`RawTable`] is the read-only snapshot handed over by the metadata
//! source (one per table, taken once per run). [`build_table`] turns it
//! into a [`Table`] with resolved target types, key lists and the filtered
//! column list used for rendering.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::GenError;
use crate::naming::{derive_name, NamingRule, RuleTarget};
use crate::options::Language;
use crate::type_registry::{source_key, TargetType, TypeRegistry};

fn default_true() -> bool {
    true
}

/// Column row as supplied by the metadata source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawColumn {
    pub name: String,
    /// Type name, possibly with qualifiers (`tinyint unsigned`).
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_generated: bool,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default, rename = "default")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Index membership as supplied by the metadata source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawIndex {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTable {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub columns: Vec<RawColumn>,
    #[serde(default)]
    pub indices: Vec<RawIndex>,
}

#[derive(Debug, Deserialize)]
struct MetadataSnapshot {
    tables: Vec<RawTable>,
}

/// Load a metadata snapshot (`tables: [...]`) from YAML.
pub fn load_tables<P: AsRef<Path>>(path: P) -> Result<Vec<RawTable>, GenError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| GenError::io(path, e))?;
    let snapshot: MetadataSnapshot = serde_yaml::from_str(&contents)
        .map_err(|e| GenError::Metadata(format!("Failed to parse {}: {}", path.display(), e)))?;
    Ok(snapshot.tables)
}

/// A column ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub prop_name: String,
    /// Source type, first token of the raw type name.
    pub type_name: String,
    /// Resolved target type, fully qualified.
    pub jvm_type: TargetType,
    /// Target type as spelled in the output language.
    pub jvm_type_name: String,
    pub primary_key: bool,
    pub unique_key: bool,
    pub nullable: bool,
    pub auto_generated: bool,
    pub length: Option<u32>,
    pub scale: Option<u32>,
    pub default_value: Option<String>,
    pub comment: Option<String>,
}

/// A table ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    pub class_name: String,
    pub comment: Option<String>,
    /// Primary-key column names.
    pub key_columns: Vec<String>,
    /// Columns of the first unique index, a business key hint.
    pub ref_columns: Vec<String>,
    /// Columns left after exclusion rules.
    pub columns: Vec<Column>,
    pub all_columns: Vec<Column>,
}

impl Table {
    /// Copy of this table with class and property names derived from `rules`.
    pub fn renamed(self, rules: &[NamingRule]) -> Table {
        let rename = |columns: Vec<Column>| -> Vec<Column> {
            columns
                .into_iter()
                .map(|column| Column {
                    prop_name: derive_name(&column.name, rules, RuleTarget::Column),
                    ..column
                })
                .collect()
        };

        Table {
            class_name: derive_name(&self.name, rules, RuleTarget::Table),
            columns: rename(self.columns),
            all_columns: rename(self.all_columns),
            ..self
        }
    }

    /// First primary-key column, looked up in the full column list.
    pub fn primary_key(&self) -> Option<&Column> {
        let key = self.key_columns.first()?;
        self.all_columns.iter().find(|c| &c.name == key)
    }
}

/// Column exclusion configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColumnFilter {
    /// Whitespace-separated names or patterns.
    #[serde(default)]
    pub exclude: String,
    #[serde(default = "default_true")]
    pub use_regex: bool,
}

impl Default for ColumnFilter {
    fn default() -> Self {
        Self {
            exclude: String::new(),
            use_regex: true,
        }
    }
}

impl ColumnFilter {
    pub fn patterns(&self) -> Vec<&str> {
        self.exclude.split_whitespace().collect()
    }

    /// Compile the filter; invalid patterns are configuration errors.
    pub fn matcher(&self) -> Result<ColumnMatcher, GenError> {
        let patterns = self.patterns();
        if !self.use_regex {
            return Ok(ColumnMatcher::Names(patterns.iter().map(|p| p.to_lowercase()).collect()));
        }

        patterns
            .iter()
            .map(|p| {
                Regex::new(&format!("^(?:{})$", p))
                    .map_err(|e| GenError::Config(format!("Invalid column exclusion pattern [{}]: {}", p, e)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ColumnMatcher::Patterns)
    }
}

/// Compiled [`ColumnFilter`].
#[derive(Debug, Clone)]
pub enum ColumnMatcher {
    /// Case-insensitive exact names.
    Names(Vec<String>),
    /// Patterns that must match the whole column name.
    Patterns(Vec<Regex>),
}

impl ColumnMatcher {
    pub fn excludes(&self, column: &str) -> bool {
        match self {
            ColumnMatcher::Names(names) => {
                let lower = column.to_lowercase();
                names.iter().any(|n| *n == lower)
            }
            ColumnMatcher::Patterns(patterns) => patterns.iter().any(|re| re.is_match(column)),
        }
    }
}

/// Build a [`Table`] from a metadata snapshot.
///
/// Derived names are initialised to the raw names; run the naming step
/// afterwards to assign class and property names.
pub fn build_table(
    registry: &TypeRegistry,
    raw: &RawTable,
    matcher: &ColumnMatcher,
    language: Language,
) -> Result<Table, GenError> {
    let mut seen = HashSet::new();
    for column in &raw.columns {
        if !seen.insert(column.name.as_str()) {
            return Err(GenError::Metadata(format!(
                "Duplicate column [{}] in table [{}]",
                column.name, raw.name
            )));
        }
    }
    for index in &raw.indices {
        if let Some(missing) = index.columns.iter().find(|c| !seen.contains(c.as_str())) {
            return Err(GenError::Metadata(format!(
                "Index on table [{}] references unknown column [{}]",
                raw.name, missing
            )));
        }
    }

    // skip the primary-key index
    let key_names: HashSet<&str> = raw
        .columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name.as_str())
        .collect();
    let first_unique = raw
        .indices
        .iter()
        .find(|idx| idx.unique && idx.columns.iter().any(|c| !key_names.contains(c.as_str())));

    let mut table = Table {
        name: raw.name.clone(),
        class_name: raw.name.clone(),
        comment: raw.comment.clone(),
        key_columns: Vec::new(),
        ref_columns: Vec::new(),
        columns: Vec::new(),
        all_columns: Vec::new(),
    };

    for raw_column in &raw.columns {
        let type_name = source_key(&raw_column.type_name);
        let jvm_type = registry.resolve(&type_name);
        let jvm_type_name = match language {
            Language::Kotlin => jvm_type.kotlin_name().to_string(),
            Language::Java => jvm_type.java_name(raw_column.primary_key).to_string(),
        };
        let unique_key = !raw_column.primary_key
            && first_unique.is_some_and(|idx| idx.columns.contains(&raw_column.name));
        // postgres sequences show up as a default value rather than a flag
        let auto_generated = raw_column.auto_generated
            || raw_column
                .default_value
                .as_deref()
                .is_some_and(|d| d.starts_with("nextval("));

        let column = Column {
            name: raw_column.name.clone(),
            prop_name: raw_column.name.clone(),
            type_name,
            jvm_type,
            jvm_type_name,
            primary_key: raw_column.primary_key,
            unique_key,
            nullable: raw_column.nullable,
            auto_generated,
            length: raw_column.length,
            scale: raw_column.scale,
            default_value: raw_column.default_value.clone(),
            comment: raw_column.comment.clone(),
        };

        if column.primary_key {
            table.key_columns.push(column.name.clone());
        } else if column.unique_key {
            table.ref_columns.push(column.name.clone());
        }
        if !matcher.excludes(&column.name) {
            table.columns.push(column.clone());
        }
        table.all_columns.push(column);
    }

    Ok(table)
}

/// Build every table of a snapshot with one compiled filter.
pub fn build_tables(
    registry: &TypeRegistry,
    raws: &[RawTable],
    filter: &ColumnFilter,
    language: Language,
) -> Result<Vec<Table>, GenError> {
    let matcher = filter.matcher()?;
    raws.iter()
        .map(|raw| build_table(registry, raw, &matcher, language))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{Operator, Position};

    fn raw_user() -> RawTable {
        serde_yaml::from_str(
            r#"
name: tb_user
comment: users
columns:
  - name: id
    type: bigint unsigned
    nullable: false
    primary_key: true
  - name: user_name
    type: VARCHAR
    length: 64
  - name: email
    type: varchar
  - name: created_at
    type: datetime
  - name: version
    type: int
    default: "0"
indices:
  - name: uk_email
    columns: [email]
    unique: true
  - name: uk_name
    columns: [user_name]
    unique: true
"#,
        )
        .unwrap()
    }

    fn no_filter() -> ColumnMatcher {
        ColumnFilter::default().matcher().unwrap()
    }

    #[test]
    fn test_build_table_keys_and_types() {
        let registry = TypeRegistry::new();
        let table = build_table(&registry, &raw_user(), &no_filter(), Language::Java).unwrap();

        assert_eq!(table.key_columns, vec!["id"]);
        assert_eq!(table.ref_columns, vec!["email"]);
        assert_eq!(table.all_columns.len(), 5);
        assert_eq!(table.columns.len(), 5);

        let id = &table.all_columns[0];
        assert_eq!(id.type_name, "bigint");
        assert_eq!(id.jvm_type.qualified_name(), "java.lang.Long");
        assert_eq!(id.jvm_type_name, "long");
        assert!(!id.nullable);

        let version = &table.all_columns[4];
        assert_eq!(version.jvm_type_name, "Integer");
        assert!(version.nullable);
        assert!(!table.all_columns[1].unique_key);
        assert!(table.all_columns[2].unique_key);
    }

    #[test]
    fn test_primary_index_does_not_hide_unique_key() {
        let mut raw = raw_user();
        raw.indices.insert(
            0,
            RawIndex {
                name: Some("PRIMARY".to_string()),
                columns: vec!["id".to_string()],
                unique: true,
            },
        );
        let table = build_table(&TypeRegistry::new(), &raw, &no_filter(), Language::Java).unwrap();

        assert_eq!(table.key_columns, vec!["id"]);
        assert_eq!(table.ref_columns, vec!["email"]);
        assert!(table.all_columns[2].unique_key);
        assert!(!table.all_columns[0].unique_key);
    }

    #[test]
    fn test_build_table_kotlin_names() {
        let registry = TypeRegistry::new();
        let table = build_table(&registry, &raw_user(), &no_filter(), Language::Kotlin).unwrap();
        assert_eq!(table.all_columns[0].jvm_type_name, "Long");
        assert_eq!(table.all_columns[4].jvm_type_name, "Int");
        assert_eq!(table.all_columns[3].jvm_type_name, "LocalDateTime");
    }

    #[test]
    fn test_regex_exclusion() {
        let registry = TypeRegistry::new();
        let filter = ColumnFilter {
            exclude: "created_.*   version".to_string(),
            use_regex: true,
        };
        let tables = build_tables(&registry, &[raw_user()], &filter, Language::Java).unwrap();
        let names: Vec<_> = tables[0].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "user_name", "email"]);
        assert_eq!(tables[0].all_columns.len(), 5);
    }

    #[test]
    fn test_regex_must_match_whole_name() {
        let matcher = ColumnFilter {
            exclude: "name".to_string(),
            use_regex: true,
        }
        .matcher()
        .unwrap();
        assert!(matcher.excludes("name"));
        assert!(!matcher.excludes("user_name"));
    }

    #[test]
    fn test_plain_exclusion_ignores_case() {
        let matcher = ColumnFilter {
            exclude: "Version".to_string(),
            use_regex: false,
        }
        .matcher()
        .unwrap();
        assert!(matcher.excludes("VERSION"));
        assert!(!matcher.excludes("versions"));
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let filter = ColumnFilter {
            exclude: "created_(".to_string(),
            use_regex: true,
        };
        assert!(matches!(filter.matcher(), Err(GenError::Config(_))));
    }

    #[test]
    fn test_postgres_sequence_is_auto_generated() {
        let raw: RawTable = serde_yaml::from_str(
            r#"
name: orders
columns:
  - name: id
    type: integer
    primary_key: true
    default: "nextval('orders_id_seq'::regclass)"
"#,
        )
        .unwrap();
        let table = build_table(&TypeRegistry::new(), &raw, &no_filter(), Language::Java).unwrap();
        assert!(table.all_columns[0].auto_generated);
    }

    #[test]
    fn test_unknown_index_column_rejected() {
        let mut raw = raw_user();
        raw.indices.push(RawIndex {
            name: None,
            columns: vec!["missing".to_string()],
            unique: false,
        });
        let result = build_table(&TypeRegistry::new(), &raw, &no_filter(), Language::Java);
        assert!(matches!(result, Err(GenError::Metadata(_))));
    }

    #[test]
    fn test_renamed_is_pure() {
        let table = build_table(&TypeRegistry::new(), &raw_user(), &no_filter(), Language::Java).unwrap();
        let rules = vec![NamingRule::new(Operator::Remove, RuleTarget::Table, Position::Prefix, "tb_")];

        let renamed = table.clone().renamed(&rules);
        assert_eq!(table.class_name, "tb_user");
        assert_eq!(renamed.class_name, "User");
        assert_eq!(renamed.columns[1].prop_name, "userName");
        assert_eq!(renamed.all_columns[3].prop_name, "createdAt");
        assert_eq!(renamed.primary_key().map(|c| c.name.as_str()), Some("id"));
    }

    #[test]
    fn test_serialized_field_names() {
        let table = build_table(&TypeRegistry::new(), &raw_user(), &no_filter(), Language::Java).unwrap();
        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(value["className"], "tb_user");
        assert_eq!(value["keyColumns"][0], "id");
        assert_eq!(value["columns"][0]["jvmType"], "java.lang.Long");
        assert_eq!(value["columns"][0]["jvmTypeName"], "long");
        assert_eq!(value["columns"][1]["length"], 64);
    }
}
