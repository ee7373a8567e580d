//! Naming strategy: prefix/suffix rules followed by case conversion.
//!
//! Raw table and column identifiers go through the configured rules in
//! order, then the underscore-delimited result is turned into PascalCase
//! (tables) or camelCase (columns).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::meta::Table;

/// Whether a rule adds or strips its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Add,
    Remove,
}

/// Which identifiers a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleTarget {
    Table,
    Column,
}

impl fmt::Display for RuleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleTarget::Table => f.write_str("Table"),
            RuleTarget::Column => f.write_str("Column"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Prefix,
    Suffix,
}

/// A single rename rule. Rules with a blank value are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingRule {
    pub operator: Operator,
    pub target: RuleTarget,
    pub position: Position,
    #[serde(default)]
    pub value: String,
}

impl NamingRule {
    pub fn new(operator: Operator, target: RuleTarget, position: Position, value: impl Into<String>) -> Self {
        Self {
            operator,
            target,
            position,
            value: value.into(),
        }
    }

    fn apply(&self, current: &str) -> String {
        let value = self.value.as_str();
        match (self.operator, self.position) {
            (Operator::Add, Position::Prefix) => format!("{}_{}", value, current),
            (Operator::Add, Position::Suffix) => format!("{}_{}", current, value),
            (Operator::Remove, Position::Prefix) => {
                current.strip_prefix(value).unwrap_or(current).to_string()
            }
            (Operator::Remove, Position::Suffix) => {
                current.strip_suffix(value).unwrap_or(current).to_string()
            }
        }
    }
}

fn rule_value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[_a-zA-Z0-9]+$").expect("static pattern is valid"))
}

/// Accept only identifier-like rule values.
pub fn is_valid_rule_value(value: &str) -> bool {
    rule_value_pattern().is_match(value)
}

/// Convert an underscore-delimited identifier.
///
/// Each underscore is dropped and upper-cases the character after it; every
/// other character passes through. Afterwards only the first character is
/// re-cased according to `first_upper`.
pub fn camel_case(s: &str, first_upper: bool) -> String {
    let mut next_upper = false;
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '_' {
            next_upper = true;
        } else if next_upper {
            out.extend(c.to_uppercase());
            next_upper = false;
        } else {
            out.push(c);
        }
    }

    let mut chars = out.chars();
    match chars.next() {
        Some(first) if first_upper => first.to_uppercase().chain(chars).collect(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Apply the rules for `target` in order, then case-convert.
pub fn derive_name(raw: &str, rules: &[NamingRule], target: RuleTarget) -> String {
    let renamed = rules
        .iter()
        .filter(|rule| rule.target == target && !rule.value.trim().is_empty())
        .fold(raw.to_string(), |current, rule| rule.apply(&current));

    camel_case(&renamed, target == RuleTarget::Table)
}

/// Assign class and property names, producing new tables.
pub fn apply_naming(tables: Vec<Table>, rules: &[NamingRule]) -> Vec<Table> {
    tables
        .into_iter()
        .map(|table| table.renamed(rules))
        .collect()
}

/// Report how the rules rename one table and its generated columns.
pub fn preview(table: &Table, rules: &[NamingRule]) -> String {
    let mut lines = vec![format!(
        "[{}] ==> [{}]",
        table.name,
        derive_name(&table.name, rules, RuleTarget::Table)
    )];

    let width = table.columns.iter().map(|c| c.name.chars().count()).max().unwrap_or(0);
    for column in &table.columns {
        lines.push(format!(
            "    [{:<width$}]  ==>  [{}]",
            column.name,
            derive_name(&column.name, rules, RuleTarget::Column),
            width = width
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(operator: Operator, target: RuleTarget, position: Position, value: &str) -> NamingRule {
        NamingRule::new(operator, target, position, value)
    }

    #[test]
    fn test_remove_table_prefix() {
        let rules = vec![rule(Operator::Remove, RuleTarget::Table, Position::Prefix, "tb_")];
        assert_eq!(derive_name("tb_user", &rules, RuleTarget::Table), "User");
    }

    #[test]
    fn test_add_table_suffix() {
        let rules = vec![rule(Operator::Add, RuleTarget::Table, Position::Suffix, "log")];
        assert_eq!(derive_name("audit", &rules, RuleTarget::Table), "AuditLog");
    }

    #[test]
    fn test_add_prefix_and_remove_suffix() {
        let rules = vec![
            rule(Operator::Add, RuleTarget::Table, Position::Prefix, "sys"),
            rule(Operator::Remove, RuleTarget::Table, Position::Suffix, "_tmp"),
        ];
        assert_eq!(derive_name("user_role_tmp", &rules, RuleTarget::Table), "SysUserRole");
    }

    #[test]
    fn test_rules_filtered_by_target() {
        let rules = vec![
            rule(Operator::Remove, RuleTarget::Table, Position::Prefix, "t_"),
            rule(Operator::Remove, RuleTarget::Column, Position::Prefix, "f_"),
        ];
        assert_eq!(derive_name("t_order", &rules, RuleTarget::Table), "Order");
        assert_eq!(derive_name("t_order", &rules, RuleTarget::Column), "tOrder");
        assert_eq!(derive_name("f_created_at", &rules, RuleTarget::Column), "createdAt");
    }

    #[test]
    fn test_blank_rule_values_ignored() {
        let rules = vec![
            rule(Operator::Add, RuleTarget::Table, Position::Prefix, ""),
            rule(Operator::Add, RuleTarget::Table, Position::Suffix, "   "),
        ];
        assert_eq!(derive_name("order_item", &rules, RuleTarget::Table), "OrderItem");
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let rules = vec![rule(Operator::Remove, RuleTarget::Column, Position::Suffix, "_id")];
        assert_eq!(derive_name("name", &rules, RuleTarget::Column), "name");
    }

    #[test]
    fn test_no_underscore_only_first_char_recased() {
        assert_eq!(derive_name("userName", &[], RuleTarget::Table), "UserName");
        assert_eq!(derive_name("UserName", &[], RuleTarget::Column), "userName");
        assert_eq!(derive_name("", &[], RuleTarget::Table), "");
    }

    #[test]
    fn test_mixed_case_preserved_after_first_char() {
        assert_eq!(camel_case("HTTP_status", false), "hTTPStatus");
        assert_eq!(camel_case("__double", true), "Double");
        assert_eq!(camel_case("trailing_", true), "Trailing");
    }

    #[test]
    fn test_uppercase_add_value_kept() {
        let rules = vec![rule(Operator::Add, RuleTarget::Table, Position::Prefix, "ABC")];
        assert_eq!(derive_name("user", &rules, RuleTarget::Table), "ABCUser");
    }

    #[test]
    fn test_remove_rules_idempotent() {
        let rules = vec![
            rule(Operator::Remove, RuleTarget::Table, Position::Prefix, "tb_"),
            rule(Operator::Remove, RuleTarget::Table, Position::Suffix, "_bak"),
        ];
        let once = derive_name("tb_account_bak", &rules, RuleTarget::Table);
        let twice = derive_name(&once, &rules, RuleTarget::Table);
        assert_eq!(once, "Account");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_add_rules_not_idempotent() {
        let rules = vec![rule(Operator::Add, RuleTarget::Column, Position::Suffix, "val")];
        let once = derive_name("amount", &rules, RuleTarget::Column);
        let twice = derive_name(&once, &rules, RuleTarget::Column);
        assert_eq!(once, "amountVal");
        assert_eq!(twice, "amountValVal");
        assert_ne!(once, twice);
    }

    #[test]
    fn test_odd_rule_values_do_not_panic() {
        let rules = vec![
            rule(Operator::Remove, RuleTarget::Table, Position::Prefix, "ü-"),
            rule(Operator::Add, RuleTarget::Table, Position::Suffix, "$x"),
        ];
        assert_eq!(derive_name("ü-tab", &rules, RuleTarget::Table), "Tab$x");
    }

    #[test]
    fn test_rule_value_validation() {
        assert!(is_valid_rule_value("tb_"));
        assert!(is_valid_rule_value("Log2"));
        assert!(!is_valid_rule_value(""));
        assert!(!is_valid_rule_value("tb-"));
        assert!(!is_valid_rule_value("a b"));
    }

    #[test]
    fn test_rule_from_yaml() {
        let yaml = r#"
- operator: remove
  target: table
  position: prefix
  value: tb_
- operator: add
  target: column
  position: suffix
"#;
        let rules: Vec<NamingRule> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].operator, Operator::Remove);
        assert_eq!(rules[1].value, "");
    }

    #[test]
    fn test_preview_lists_filtered_columns() {
        use crate::meta::{build_table, ColumnFilter, RawTable};
        use crate::options::Language;
        use crate::type_registry::TypeRegistry;

        let raw: RawTable = serde_yaml::from_str(
            "name: tb_user\ncolumns:\n  - name: id\n    type: bigint\n    primary_key: true\n  - name: f_user_name\n    type: varchar\n  - name: created_by_admin\n    type: varchar\n",
        )
        .unwrap();
        let matcher = ColumnFilter {
            exclude: "created_by_admin".to_string(),
            use_regex: false,
        }
        .matcher()
        .unwrap();
        let table = build_table(&TypeRegistry::new(), &raw, &matcher, Language::Java).unwrap();
        let rules = vec![
            rule(Operator::Remove, RuleTarget::Table, Position::Prefix, "tb_"),
            rule(Operator::Remove, RuleTarget::Column, Position::Prefix, "f_"),
        ];

        let report = preview(&table, &rules);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                "[tb_user] ==> [User]",
                "    [id         ]  ==>  [id]",
                "    [f_user_name]  ==>  [userName]",
            ]
        );
        assert!(!report.contains("created_by_admin"));
    }
}
