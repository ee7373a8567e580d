//! Generator options loaded from `genx.yaml`.

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::GenError;
use crate::meta::ColumnFilter;
use crate::naming::{is_valid_rule_value, NamingRule};

/// Category of output artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Entity,
    Repository,
    Service,
}

impl FileKind {
    pub const ALL: [FileKind; 3] = [FileKind::Entity, FileKind::Repository, FileKind::Service];

    pub fn name(self) -> &'static str {
        match self {
            FileKind::Entity => "Entity",
            FileKind::Repository => "Repository",
            FileKind::Service => "Service",
        }
    }

    /// Package segment and template stem (`entity`, `repository`, `service`).
    pub fn dir_name(self) -> String {
        self.name().to_case(Case::Flat)
    }

    /// Repositories and services are keyed by the entity's primary key.
    pub fn requires_primary_key(self) -> bool {
        matches!(self, FileKind::Repository | FileKind::Service)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to do when the target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileMode {
    Overwrite,
    #[default]
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Java,
    Kotlin,
}

impl Language {
    pub fn name(self) -> &'static str {
        match self {
            Language::Java => "Java",
            Language::Kotlin => "Kotlin",
        }
    }

    /// Output file extension.
    pub fn suffix(self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Kotlin => "kt",
        }
    }

    /// Name used in template file names.
    pub fn template_name(self) -> String {
        self.name().to_case(Case::Flat)
    }

    /// Java sources carry explicit `@Nullable`/`@NotNull` markers.
    pub fn requires_nullability_annotations(self) -> bool {
        self == Language::Java
    }
}

/// Persistence framework targeted by the templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    #[default]
    Jimmer,
    #[serde(alias = "mybatis-plus", alias = "mybatis")]
    MybatisPlus,
}

impl Framework {
    pub fn name(self) -> &'static str {
        match self {
            Framework::Jimmer => "Jimmer",
            Framework::MybatisPlus => "MybatisPlus",
        }
    }

    /// Template sub-directory (`jimmer`, `mybatisplus`).
    pub fn dir_name(self) -> String {
        self.name().to_case(Case::Flat)
    }

    /// File name suffix of generated repositories.
    pub fn repository_suffix(self) -> &'static str {
        match self {
            Framework::Jimmer => "Repository",
            Framework::MybatisPlus => "Mapper",
        }
    }

    /// Base interface every generated repository extends.
    pub fn repository_base(self, language: Language) -> &'static str {
        match (self, language) {
            (Framework::Jimmer, Language::Java) => "org.babyfish.jimmer.spring.repository.JRepository",
            (Framework::Jimmer, Language::Kotlin) => "org.babyfish.jimmer.spring.repository.KRepository",
            (Framework::MybatisPlus, _) => "com.baomidou.mybatisplus.core.mapper.BaseMapper",
        }
    }

    /// Marker annotation placed on repositories.
    pub fn repository_marker(self) -> Option<&'static str> {
        match self {
            Framework::Jimmer => Some("org.springframework.stereotype.Repository"),
            Framework::MybatisPlus => None,
        }
    }

    /// Id generator referenced by entities with a UUID key. Only Jimmer ships one.
    pub fn uuid_generator(self) -> Option<&'static str> {
        match self {
            Framework::Jimmer => Some("org.babyfish.jimmer.sql.meta.UUIDIdGenerator"),
            Framework::MybatisPlus => None,
        }
    }
}

fn default_kinds() -> Vec<FileKind> {
    vec![FileKind::Entity]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("src/main/java")
}

fn default_template_root() -> PathBuf {
    PathBuf::from("templates")
}

/// Everything a generation run needs besides the tables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorOptions {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub root_package: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub file_mode: FileMode,
    #[serde(default = "default_kinds")]
    pub kinds: Vec<FileKind>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub framework: Framework,
    /// Fully qualified superclass for entities, may be blank.
    #[serde(default)]
    pub super_class: String,
    /// Directory holding `{framework}/{kind}.{language}.vm` templates.
    #[serde(default = "default_template_root")]
    pub template_root: PathBuf,
    #[serde(default)]
    pub naming_rules: Vec<NamingRule>,
    #[serde(default)]
    pub column_filter: ColumnFilter,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            author: String::new(),
            root_package: String::new(),
            output_dir: default_output_dir(),
            file_mode: FileMode::default(),
            kinds: default_kinds(),
            language: Language::default(),
            framework: Framework::default(),
            super_class: String::new(),
            template_root: default_template_root(),
            naming_rules: Vec::new(),
            column_filter: ColumnFilter::default(),
        }
    }
}

impl GeneratorOptions {
    /// Load options from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GenError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| GenError::io(path, e))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| GenError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Check the options before any file is touched.
    pub fn validate(&self) -> Result<(), GenError> {
        if self.author.trim().is_empty() {
            return Err(GenError::Config("Author can't be empty!".to_string()));
        }
        if self.root_package.trim().is_empty() {
            return Err(GenError::Config("Package can't be empty!".to_string()));
        }
        if self.kinds.is_empty() {
            return Err(GenError::Config("FileType can't be empty!".to_string()));
        }
        if !self.kinds.contains(&FileKind::Entity) {
            return Err(GenError::Config(format!(
                "{} generation requires Entity to be selected",
                self.kinds[0]
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(GenError::Config("Output directory can't be empty!".to_string()));
        }
        for rule in &self.naming_rules {
            if !rule.value.trim().is_empty() && !is_valid_rule_value(&rule.value) {
                return Err(GenError::Config(format!("Wrong naming [{}] !!", rule.value)));
            }
        }
        self.column_filter.matcher()?;
        Ok(())
    }

    /// Selected kinds, deduplicated, in generation order.
    pub fn requested_kinds(&self) -> Vec<FileKind> {
        FileKind::ALL
            .into_iter()
            .filter(|kind| self.kinds.contains(kind))
            .collect()
    }

    /// `{root_package}.{kind}`.
    pub fn full_package(&self, kind: FileKind) -> String {
        format!("{}.{}", self.root_package, kind.dir_name())
    }

    /// Root package as a relative directory.
    pub fn package_path(&self) -> PathBuf {
        self.root_package
            .split('.')
            .filter(|segment| !segment.is_empty())
            .collect()
    }

    /// Superclass without its package.
    pub fn super_class_name(&self) -> &str {
        self.super_class.rsplit('.').next().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GeneratorOptions {
        GeneratorOptions {
            author: "huyaro".to_string(),
            root_package: "com.example.demo".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_options() {
        let yaml = r#"
author: huyaro
root_package: com.example.demo
output_dir: out/src
file_mode: overwrite
kinds: [entity, repository, service]
language: kotlin
framework: mybatis-plus
super_class: com.example.base.BaseEntity
naming_rules:
  - operator: remove
    target: table
    position: prefix
    value: tb_
column_filter:
  exclude: "created_by updated_.*"
"#;
        let options: GeneratorOptions = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(options.file_mode, FileMode::Overwrite);
        assert_eq!(options.language, Language::Kotlin);
        assert_eq!(options.framework, Framework::MybatisPlus);
        assert_eq!(options.naming_rules.len(), 1);
        assert!(options.column_filter.use_regex);
        assert_eq!(options.template_root, PathBuf::from("templates"));
        assert_eq!(options.super_class_name(), "BaseEntity");
        options.validate().unwrap();
    }

    #[test]
    fn test_minimal_defaults() {
        let options: GeneratorOptions = serde_yaml::from_str("root_package: a.b").unwrap();
        assert_eq!(options.kinds, vec![FileKind::Entity]);
        assert_eq!(options.file_mode, FileMode::Skip);
        assert_eq!(options.language, Language::Java);
        assert_eq!(options.framework, Framework::Jimmer);
        assert_eq!(options.super_class_name(), "");
    }

    #[test]
    fn test_validate_required_fields() {
        let mut options = valid();
        options.author = " ".to_string();
        assert!(matches!(options.validate(), Err(GenError::Config(_))));

        let mut options = valid();
        options.root_package.clear();
        assert!(matches!(options.validate(), Err(GenError::Config(_))));

        let mut options = valid();
        options.kinds.clear();
        assert!(matches!(options.validate(), Err(GenError::Config(_))));
    }

    #[test]
    fn test_repository_requires_entity() {
        let mut options = valid();
        options.kinds = vec![FileKind::Repository, FileKind::Service];
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("requires Entity"));
    }

    #[test]
    fn test_invalid_rule_value_rejected() {
        let mut options = valid();
        options.naming_rules = vec![NamingRule::new(
            crate::naming::Operator::Add,
            crate::naming::RuleTarget::Table,
            crate::naming::Position::Prefix,
            "bad-value",
        )];
        assert!(matches!(options.validate(), Err(GenError::Config(_))));
    }

    #[test]
    fn test_whitespace_rule_value_ignored() {
        let mut options = valid();
        options.naming_rules = vec![NamingRule::new(
            crate::naming::Operator::Remove,
            crate::naming::RuleTarget::Column,
            crate::naming::Position::Suffix,
            "  ",
        )];
        options.validate().unwrap();
    }

    #[test]
    fn test_requested_kinds_ordered_and_deduplicated() {
        let mut options = valid();
        options.kinds = vec![FileKind::Service, FileKind::Entity, FileKind::Service];
        assert_eq!(options.requested_kinds(), vec![FileKind::Entity, FileKind::Service]);
    }

    #[test]
    fn test_package_helpers() {
        let options = valid();
        assert_eq!(options.full_package(FileKind::Repository), "com.example.demo.repository");
        assert_eq!(options.package_path(), PathBuf::from("com/example/demo"));
    }

    #[test]
    fn test_enum_path_names() {
        assert_eq!(FileKind::Entity.dir_name(), "entity");
        assert_eq!(Framework::MybatisPlus.dir_name(), "mybatisplus");
        assert_eq!(Language::Kotlin.template_name(), "kotlin");
        assert_eq!(Language::Kotlin.suffix(), "kt");
        assert_eq!(Framework::MybatisPlus.repository_suffix(), "Mapper");
    }
}
