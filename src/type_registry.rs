//! Source column type to target type registry.
//!
//! Maps database column type names (`varchar`, `bigint`, ...) to JVM target
//! types. A fixed set of built-in mappings is always present; custom
//! mappings registered by the user shadow them. The registry is an explicit
//! service object: callers load it from a store at start-up, pass it by
//! reference to whatever needs type resolution and save it after mutating.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::codegen::fs_utils;
use crate::error::RegistryError;

/// Target types known out of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Int,
    String,
    Uuid,
    Double,
    Boolean,
    Long,
    Byte,
    BigDecimal,
    LocalDate,
    LocalTime,
    LocalDateTime,
}

impl BuiltinType {
    pub const ALL: [BuiltinType; 11] = [
        BuiltinType::Int,
        BuiltinType::String,
        BuiltinType::Uuid,
        BuiltinType::Double,
        BuiltinType::Boolean,
        BuiltinType::Long,
        BuiltinType::Byte,
        BuiltinType::BigDecimal,
        BuiltinType::LocalDate,
        BuiltinType::LocalTime,
        BuiltinType::LocalDateTime,
    ];

    /// Fully qualified JVM class name (boxed for primitives).
    pub fn qualified_name(self) -> &'static str {
        match self {
            BuiltinType::Int => "java.lang.Integer",
            BuiltinType::String => "java.lang.String",
            BuiltinType::Uuid => "java.util.UUID",
            BuiltinType::Double => "java.lang.Double",
            BuiltinType::Boolean => "java.lang.Boolean",
            BuiltinType::Long => "java.lang.Long",
            BuiltinType::Byte => "java.lang.Byte",
            BuiltinType::BigDecimal => "java.math.BigDecimal",
            BuiltinType::LocalDate => "java.time.LocalDate",
            BuiltinType::LocalTime => "java.time.LocalTime",
            BuiltinType::LocalDateTime => "java.time.LocalDateTime",
        }
    }

    /// Java primitive counterpart, if the type has one.
    pub fn java_primitive(self) -> Option<&'static str> {
        match self {
            BuiltinType::Int => Some("int"),
            BuiltinType::Double => Some("double"),
            BuiltinType::Boolean => Some("boolean"),
            BuiltinType::Long => Some("long"),
            BuiltinType::Byte => Some("byte"),
            _ => None,
        }
    }

    /// Name used in Kotlin sources.
    pub fn kotlin_name(self) -> &'static str {
        match self {
            BuiltinType::Int => "Int",
            BuiltinType::String => "String",
            BuiltinType::Uuid => "UUID",
            BuiltinType::Double => "Double",
            BuiltinType::Boolean => "Boolean",
            BuiltinType::Long => "Long",
            BuiltinType::Byte => "Byte",
            BuiltinType::BigDecimal => "BigDecimal",
            BuiltinType::LocalDate => "LocalDate",
            BuiltinType::LocalTime => "LocalTime",
            BuiltinType::LocalDateTime => "LocalDateTime",
        }
    }

    /// Source type names mapped to this type by default.
    pub fn source_types(self) -> &'static [&'static str] {
        match self {
            BuiltinType::Int => &["int", "integer", "smallint", "mediumint", "tinyint"],
            BuiltinType::String => &["char", "nchar", "varchar", "nvarchar", "clob", "nclob"],
            BuiltinType::Uuid => &["uuid"],
            BuiltinType::Double => &["float", "real"],
            BuiltinType::Boolean => &["bool", "boolean"],
            BuiltinType::Long => &["bigint"],
            BuiltinType::Byte => &["bit"],
            BuiltinType::BigDecimal => &["decimal", "numeric"],
            BuiltinType::LocalDate => &["date"],
            BuiltinType::LocalTime => &["time"],
            BuiltinType::LocalDateTime => &["datetime", "timestamp"],
        }
    }

    pub fn from_qualified_name(name: &str) -> Option<BuiltinType> {
        BuiltinType::ALL
            .into_iter()
            .find(|t| t.qualified_name() == name)
    }
}

/// Opaque target type descriptor, identified by its qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetType(String);

impl TargetType {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        TargetType(qualified_name.into().trim().to_string())
    }

    /// Type used when nothing else matches.
    pub fn fallback() -> Self {
        BuiltinType::String.into()
    }

    pub fn qualified_name(&self) -> &str {
        &self.0
    }

    /// Last segment of the qualified name.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    pub fn builtin(&self) -> Option<BuiltinType> {
        BuiltinType::from_qualified_name(&self.0)
    }

    /// Java spelling: the primitive when asked for and available, the boxed simple name otherwise.
    pub fn java_name(&self, prefer_primitive: bool) -> &str {
        if prefer_primitive {
            if let Some(primitive) = self.builtin().and_then(BuiltinType::java_primitive) {
                return primitive;
            }
        }
        self.simple_name()
    }

    pub fn kotlin_name(&self) -> &str {
        match self.builtin() {
            Some(builtin) => builtin.kotlin_name(),
            None => self.simple_name(),
        }
    }

    /// Types from `java.lang` never need an import.
    pub fn is_implicit_import(&self) -> bool {
        self.0.starts_with("java.lang.")
    }

    pub fn is_uuid(&self) -> bool {
        self.simple_name() == "UUID"
    }
}

impl From<BuiltinType> for TargetType {
    fn from(builtin: BuiltinType) -> Self {
        TargetType::new(builtin.qualified_name())
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a mapping entry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    BuiltIn,
    Custom,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::BuiltIn => f.write_str("built-in"),
            Origin::Custom => f.write_str("custom"),
        }
    }
}

/// One effective entry of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    pub source_type: String,
    pub target: TargetType,
    pub origin: Origin,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    target: TargetType,
    origin: Origin,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredMapping {
    #[serde(default)]
    mapping: BTreeMap<String, StoredEntry>,
}

/// Lookup key for a source type: first whitespace-delimited token, lowercased.
///
/// `"TINYINT UNSIGNED"` becomes `"tinyint"`.
pub fn source_key(source_type: &str) -> String {
    source_type
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase()
}

/// Registry of source type to target type mappings.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRegistry {
    builtin: BTreeMap<String, TargetType>,
    custom: BTreeMap<String, TargetType>,
}

impl TypeRegistry {
    /// Registry holding only the built-in mappings.
    pub fn new() -> Self {
        let mut builtin = BTreeMap::new();
        for ty in BuiltinType::ALL {
            for source in ty.source_types() {
                builtin.entry(source.to_string()).or_insert_with(|| ty.into());
            }
        }
        Self {
            builtin,
            custom: BTreeMap::new(),
        }
    }

    /// Resolve a source type name. Never fails: unknown names map to `String`.
    pub fn resolve(&self, source_type: &str) -> TargetType {
        let key = source_key(source_type);
        self.custom
            .get(&key)
            .or_else(|| self.builtin.get(&key))
            .cloned()
            .unwrap_or_else(TargetType::fallback)
    }

    /// Insert or overwrite a custom mapping.
    pub fn register(&mut self, source_type: &str, target: TargetType) {
        let key = source_key(source_type);
        if key.is_empty() {
            tracing::warn!("Ignoring type registration with blank source type");
            return;
        }
        tracing::debug!("Registered type mapping [{}] => [{}]", key, target);
        self.custom.insert(key, target);
    }

    /// Remove a custom mapping.
    ///
    /// Returns the removed target, `None` when nothing was registered, or
    /// [`RegistryError::CannotRemoveBuiltIn`] when only a built-in mapping exists.
    pub fn unregister(&mut self, source_type: &str) -> Result<Option<TargetType>, RegistryError> {
        let key = source_key(source_type);
        if let Some(removed) = self.custom.remove(&key) {
            tracing::debug!("Unregistered type mapping [{}]", key);
            return Ok(Some(removed));
        }
        if self.builtin.contains_key(&key) {
            return Err(RegistryError::CannotRemoveBuiltIn(key));
        }
        Ok(None)
    }

    /// Drop every custom mapping.
    pub fn reset(&mut self) {
        tracing::debug!("Reset type mappings, dropped {} custom entries", self.custom.len());
        self.custom.clear();
    }

    /// Effective mappings, sorted by source type.
    pub fn mappings(&self) -> Vec<TypeMapping> {
        let mut merged: BTreeMap<&String, TypeMapping> = BTreeMap::new();
        for (key, target) in &self.builtin {
            merged.insert(key, mapping(key, target, Origin::BuiltIn));
        }
        for (key, target) in &self.custom {
            merged.insert(key, mapping(key, target, Origin::Custom));
        }
        merged.into_values().collect()
    }

    /// The documented default set.
    pub fn builtin_mappings() -> Vec<TypeMapping> {
        TypeRegistry::new().mappings()
    }

    pub fn custom_count(&self) -> usize {
        self.custom.len()
    }

    /// Load a registry saved with [`TypeRegistry::save`]. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let mut registry = TypeRegistry::new();
        if !path.exists() {
            return Ok(registry);
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| RegistryError::Persist(format!("Failed to read {}: {}", path.display(), e)))?;
        let stored: StoredMapping = serde_json::from_str(&contents)
            .map_err(|e| RegistryError::Persist(format!("Failed to parse {}: {}", path.display(), e)))?;

        for (key, entry) in stored.mapping {
            if entry.origin == Origin::Custom {
                registry.register(&key, entry.target);
            }
        }
        Ok(registry)
    }

    /// Persist the effective mapping as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RegistryError> {
        let path = path.as_ref();
        let stored = StoredMapping {
            mapping: self
                .mappings()
                .into_iter()
                .map(|m| {
                    (
                        m.source_type,
                        StoredEntry {
                            target: m.target,
                            origin: m.origin,
                        },
                    )
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| RegistryError::Persist(format!("Failed to serialize mappings: {}", e)))?;
        fs_utils::write_file(path, json)
            .map_err(|e| RegistryError::Persist(format!("Failed to write {}: {}", path.display(), e)))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn mapping(key: &str, target: &TargetType, origin: Origin) -> TypeMapping {
    TypeMapping {
        source_type: key.to_string(),
        target: target.clone(),
        origin,
    }
}
