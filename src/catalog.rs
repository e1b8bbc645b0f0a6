//! Constant lookup tables for the editor's rule, macro and option vocabularies.
//!
//! Validators never read these directly; they receive a [`RuleVocabulary`]
//! (or the relevant slice) so tests and `telint.toml` can swap them.

/// Built-in analyzer rules shipped with the editor: (id, category, description).
pub const BUILTIN_RULES: &[(&str, &str, &str)] = &[
    ("TE3_BUILT_IN_DATA_COLUMN_SOURCE", "Schema", "Data column source validation"),
    ("TE3_BUILT_IN_EXPRESSION_REQUIRED", "Schema", "Expression required for calculated objects"),
    ("TE3_BUILT_IN_AVOID_PROVIDER_PARTITIONS_STRUCTURED", "Data Sources", "Avoid provider partitions with structured sources"),
    ("TE3_BUILT_IN_SET_ISAVAILABLEINMDX_FALSE", "Performance", "Set IsAvailableInMdx to false for non-MDX columns"),
    ("TE3_BUILT_IN_DATE_TABLE_EXISTS", "Schema", "Date table should exist"),
    ("TE3_BUILT_IN_MANY_TO_MANY_SINGLE_DIRECTION", "Relationships", "Many-to-many should use single direction"),
    ("TE3_BUILT_IN_RELATIONSHIP_SAME_DATATYPE", "Relationships", "Relationship columns should have same data type"),
    ("TE3_BUILT_IN_AVOID_INVALID_CHARACTERS_NAMES", "Naming", "Avoid invalid characters in names"),
    ("TE3_BUILT_IN_AVOID_INVALID_CHARACTERS_DESCRIPTIONS", "Metadata", "Avoid invalid characters in descriptions"),
    ("TE3_BUILT_IN_SET_ISAVAILABLEINMDX_TRUE_NECESSARY", "Performance", "Set IsAvailableInMdx true only when necessary"),
    ("TE3_BUILT_IN_REMOVE_UNUSED_DATA_SOURCES", "Maintenance", "Remove unused data sources"),
    ("TE3_BUILT_IN_VISIBLE_TABLES_NO_DESCRIPTION", "Metadata", "Visible tables should have descriptions"),
    ("TE3_BUILT_IN_VISIBLE_COLUMNS_NO_DESCRIPTION", "Metadata", "Visible columns should have descriptions"),
    ("TE3_BUILT_IN_VISIBLE_MEASURES_NO_DESCRIPTION", "Metadata", "Visible measures should have descriptions"),
    ("TE3_BUILT_IN_VISIBLE_CALCULATION_GROUPS_NO_DESCRIPTION", "Metadata", "Visible calculation groups should have descriptions"),
    ("TE3_BUILT_IN_VISIBLE_UDF_NO_DESCRIPTION", "Metadata", "Visible UDFs should have descriptions"),
    ("TE3_BUILT_IN_PERSPECTIVES_NO_OBJECTS", "Schema", "Perspectives should contain objects"),
    ("TE3_BUILT_IN_CALCULATION_GROUPS_NO_ITEMS", "Schema", "Calculation groups should have items"),
    ("TE3_BUILT_IN_TRIM_OBJECT_NAMES", "Naming", "Object names should be trimmed"),
    ("TE3_BUILT_IN_FORMAT_STRING_COLUMNS", "Formatting", "Columns should have format strings"),
    ("TE3_BUILT_IN_TRANSLATE_DISPLAY_FOLDERS", "Translations", "Display folders should be translated"),
    ("TE3_BUILT_IN_TRANSLATE_DESCRIPTIONS", "Translations", "Descriptions should be translated"),
    ("TE3_BUILT_IN_TRANSLATE_VISIBLE_NAMES", "Translations", "Visible names should be translated"),
    ("TE3_BUILT_IN_TRANSLATE_HIERARCHY_LEVELS", "Translations", "Hierarchy levels should be translated"),
    ("TE3_BUILT_IN_TRANSLATE_PERSPECTIVES", "Translations", "Perspectives should be translated"),
    ("TE3_BUILT_IN_SPECIFY_APPLICATION_NAME", "Metadata", "Specify application name"),
    ("TE3_BUILT_IN_POWERBI_LATEST_COMPATIBILITY", "Compatibility", "Use latest Power BI compatibility level"),
];

pub const REQUIRED_RULE_FIELDS: &[&str] = &["ID", "Name", "Severity", "Scope", "Expression"];

pub const OPTIONAL_RULE_FIELDS: &[&str] = &[
    "Category",
    "Description",
    "FixExpression",
    "CompatibilityLevel",
    "Source",
    "Remarks",
];

/// Fields the editor adds at runtime; they must not appear in rule definitions.
pub const RUNTIME_RULE_FIELDS: &[&str] = &["ErrorMessage", "ObjectCount"];

pub const VALID_SEVERITIES: &[i64] = &[1, 2, 3];

pub const VALID_SCOPES: &[&str] = &[
    "Model",
    "Table",
    "Measure",
    "Hierarchy",
    "Level",
    "Relationship",
    "Perspective",
    "Culture",
    "Partition",
    "ProviderDataSource",
    "DataColumn",
    "CalculatedColumn",
    "CalculatedTable",
    "CalculatedTableColumn",
    "KPI",
    "StructuredDataSource",
    "Variation",
    "NamedExpression",
    "ModelRole",
    "TablePermission",
    "CalculationGroup",
    "CalculationItem",
    "ModelRoleMember",
    "Calendar",
    "UserDefinedFunction",
    // aliases still accepted by the editor
    "Column",
    "DataSource",
];

pub const STANDARD_CATEGORIES: &[&str] = &[
    "DAX Expressions",
    "Metadata",
    "Performance",
    "Naming Conventions",
    "Model Layout",
    "Formatting",
    "Governance",
    "Maintenance",
    "Error Prevention",
    "Data Quality",
];

pub const KNOWN_ID_PREFIXES: &[&str] = &[
    "DAX_", "META_", "PERF_", "NAME_", "LAYOUT_", "FORMAT_", "GOV_", "MAINT_", "ERR_", "PQ_",
];

pub const VALID_MACRO_CONTEXTS: &[&str] = &[
    "None",
    "Model",
    "Tables",
    "DataSources",
    "Perspectives",
    "Translations",
    "Roles",
    "Relationships",
    "PartitionCollection",
    "Expressions",
    "TablePermission",
    "Functions",
    "Table",
    "Measure",
    "Column",
    "Hierarchy",
    "Level",
    "Partition",
    "Relationship",
    "DataSource",
    "Role",
    "Perspective",
    "Translation",
    "KPI",
    "CalculatedColumn",
    "CalculationItem",
    "CalculatedTable",
    "CalculationGroup",
    "Expression",
    "RoleMember",
    "FolderOrSingularObject",
    "SingularObjects",
];

pub const VALID_IMPERSONATION_MODES: &[&str] = &[
    "Default",
    "ImpersonateAccount",
    "ImpersonateAnonymous",
    "ImpersonateCurrentUser",
    "ImpersonateServiceAccount",
    "ImpersonateUnattendedAccount",
];

pub const VALID_SERVER_TYPES: &[&str] = &[
    "Sql", "Oracle", "Odbc", "OleDb", "Snowflake", "Dataflow", "PostgreSql", "MySql", "MariaDb",
    "Db2", "Databricks", "OneLake",
];

/// Config kinds and the schema file that describes each.
pub const CONFIG_SCHEMAS: &[(&str, &str)] = &[
    ("preferences", "preferences-schema.json"),
    ("uipreferences", "uipreferences-schema.json"),
    ("layouts", "layouts-schema.json"),
    ("recentfiles", "recentfiles-schema.json"),
    ("recentservers", "recentservers-schema.json"),
    ("tmuo", "tmuo-schema.json"),
];

/// File-name suffixes used to detect a config kind.
pub const CONFIG_FILE_NAMES: &[(&str, &str)] = &[
    ("preferences.json", "preferences"),
    ("uipreferences.json", "uipreferences"),
    ("layouts.json", "layouts"),
    ("recentfiles.json", "recentfiles"),
    ("recentservers.json", "recentservers"),
];

pub const RULES_SCHEMA_FILE: &str = "bparules-schema.json";
pub const MACROS_SCHEMA_FILE: &str = "macros-schema.json";

/// Look up a built-in rule's (category, description).
pub fn builtin_rule(id: &str) -> Option<(&'static str, &'static str)> {
    BUILTIN_RULES
        .iter()
        .find(|(rid, _, _)| *rid == id)
        .map(|(_, cat, desc)| (*cat, *desc))
}

/// Allowed values the rule validators check against.
#[derive(Debug, Clone)]
pub struct RuleVocabulary {
    pub scopes: Vec<String>,
    pub categories: Vec<String>,
    pub prefixes: Vec<String>,
}

impl Default for RuleVocabulary {
    fn default() -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        Self {
            scopes: owned(VALID_SCOPES),
            categories: owned(STANDARD_CATEGORIES),
            prefixes: owned(KNOWN_ID_PREFIXES),
        }
    }
}

impl RuleVocabulary {
    pub fn is_valid_scope(&self, tag: &str) -> bool {
        self.scopes.iter().any(|s| s == tag)
    }

    pub fn is_standard_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn has_known_prefix(&self, id: &str) -> bool {
        self.prefixes.iter().any(|p| id.starts_with(p.as_str()))
    }
}
