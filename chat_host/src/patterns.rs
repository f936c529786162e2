//! Declarative utterance patterns that map chat messages onto tool calls.
//!
//! A [`PatternRule`] pairs a case-insensitive regex with the tool it
//! targets and an explicit table of named capture groups → tool
//! parameters. Rules live in a [`PatternRegistry`], which is built once at
//! startup, checked against the tool catalog, and shared read-only.

use crate::error::{PatternExtractionError, RegistryError};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use shared_protocol_objects::CatalogEntry;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Maps one named capture group onto one tool parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamCapture {
    pub group: String,
    pub param: String,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    pub id: String,
    pattern: Regex,
    pub tool: String,
    pub server: String,
    pub captures: Vec<ParamCapture>,
    /// Static parameters applied before captures; a capture overrides them.
    pub defaults: Vec<(String, String)>,
    pub confidence: f64,
    pub description: String,
    pub examples: Vec<String>,
}

impl PatternRule {
    pub fn new(
        id: &str,
        pattern: &str,
        server: &str,
        tool: &str,
        confidence: f64,
    ) -> Result<Self, RegistryError> {
        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RegistryError::InvalidPattern {
                rule_id: id.to_string(),
                source,
            })?;
        Ok(Self {
            id: id.to_string(),
            pattern: compiled,
            tool: tool.to_string(),
            server: server.to_string(),
            captures: Vec::new(),
            defaults: Vec::new(),
            confidence,
            description: String::new(),
            examples: Vec::new(),
        })
    }

    /// Required capture whose group name is also the parameter name.
    pub fn capture(self, group: &str) -> Self {
        self.capture_as(group, group, true)
    }

    /// Optional capture whose group name is also the parameter name.
    pub fn optional(self, group: &str) -> Self {
        self.capture_as(group, group, false)
    }

    pub fn capture_as(mut self, group: &str, param: &str, required: bool) -> Self {
        self.captures.push(ParamCapture {
            group: group.to_string(),
            param: param.to_string(),
            required,
        });
        self
    }

    pub fn default_param(mut self, param: &str, value: &str) -> Self {
        self.defaults.push((param.to_string(), value.to_string()));
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn example(mut self, example: &str) -> Self {
        self.examples.push(example.to_string());
        self
    }

    pub fn is_structural_match(&self, normalized: &str) -> bool {
        self.pattern.is_match(normalized)
    }

    /// Pull this rule's parameters out of `text`. Captures are trimmed, and a
    /// required capture that is absent or blank fails the extraction.
    pub fn extract(&self, text: &str) -> Result<BTreeMap<String, String>, PatternExtractionError> {
        let caps = self
            .pattern
            .captures(text)
            .ok_or_else(|| PatternExtractionError::NoCaptures {
                rule_id: self.id.clone(),
            })?;

        let mut params: BTreeMap<String, String> = self.defaults.iter().cloned().collect();
        for capture in &self.captures {
            let value = caps
                .name(&capture.group)
                .map(|m| m.as_str().trim())
                .filter(|v| !v.is_empty());
            match value {
                Some(v) => {
                    params.insert(capture.param.clone(), v.to_string());
                }
                None if capture.required => {
                    return Err(PatternExtractionError::MissingParameter {
                        rule_id: self.id.clone(),
                        param: capture.param.clone(),
                    });
                }
                None => {}
            }
        }
        Ok(params)
    }

    /// Parameters this rule is guaranteed to supply on a successful extraction.
    fn guaranteed_params(&self) -> HashSet<&str> {
        self.captures
            .iter()
            .filter(|c| c.required)
            .map(|c| c.param.as_str())
            .chain(self.defaults.iter().map(|(k, _)| k.as_str()))
            .collect()
    }

    fn all_params(&self) -> impl Iterator<Item = &str> {
        self.captures
            .iter()
            .map(|c| c.param.as_str())
            .chain(self.defaults.iter().map(|(k, _)| k.as_str()))
    }
}

/// One entry of the `/commands` listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandHelp {
    pub tool: String,
    pub server: String,
    pub description: String,
    pub examples: Vec<String>,
    pub required_parameters: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PatternRegistry {
    rules: Vec<PatternRule>,
}

impl PatternRegistry {
    /// Build a registry from an ordered rule list. Order is significant: it
    /// breaks confidence ties.
    pub fn new(rules: Vec<PatternRule>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(RegistryError::DuplicateRule(rule.id.clone()));
            }
            if !(0.0..=1.0).contains(&rule.confidence) {
                return Err(RegistryError::InvalidConfidence {
                    rule_id: rule.id.clone(),
                    confidence: rule.confidence,
                });
            }
            let groups: HashSet<&str> = rule.pattern.capture_names().flatten().collect();
            if let Some(missing) = rule
                .captures
                .iter()
                .find(|c| !groups.contains(c.group.as_str()))
            {
                return Err(RegistryError::UnknownGroup {
                    rule_id: rule.id.clone(),
                    group: missing.group.clone(),
                });
            }
        }
        Ok(Self { rules })
    }

    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(builtin_rules()?)
    }

    pub fn all_rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check every rule against the tool catalog: the target tool must exist,
    /// every parameter the rule can set must be declared, and every parameter
    /// the tool requires must be guaranteed by the rule.
    pub fn validate(&self, catalog: &[CatalogEntry]) -> Result<(), RegistryError> {
        let tools: HashMap<(&str, &str), &CatalogEntry> = catalog
            .iter()
            .map(|entry| ((entry.server.as_str(), entry.tool.name.as_str()), entry))
            .collect();

        for rule in &self.rules {
            let entry = tools
                .get(&(rule.server.as_str(), rule.tool.as_str()))
                .ok_or_else(|| RegistryError::UnknownTool {
                    rule_id: rule.id.clone(),
                    server: rule.server.clone(),
                    tool: rule.tool.clone(),
                })?;

            if let Some(param) = rule.all_params().find(|p| !entry.tool.declares(p)) {
                return Err(RegistryError::UndeclaredParameter {
                    rule_id: rule.id.clone(),
                    tool: rule.tool.clone(),
                    param: param.to_string(),
                });
            }

            let guaranteed = rule.guaranteed_params();
            if let Some(param) = entry
                .tool
                .required_params()
                .into_iter()
                .find(|p| !guaranteed.contains(p.as_str()))
            {
                return Err(RegistryError::UnsatisfiableParameter {
                    rule_id: rule.id.clone(),
                    tool: rule.tool.clone(),
                    param,
                });
            }
        }
        Ok(())
    }

    /// Supported commands grouped by tool, in registry order.
    pub fn commands(&self) -> Vec<CommandHelp> {
        let mut commands: Vec<CommandHelp> = Vec::new();
        for rule in &self.rules {
            let required: Vec<String> = rule
                .captures
                .iter()
                .filter(|c| c.required)
                .map(|c| c.param.clone())
                .collect();
            match commands
                .iter_mut()
                .find(|c| c.tool == rule.tool && c.server == rule.server)
            {
                Some(existing) => {
                    existing.examples.extend(rule.examples.iter().cloned());
                    for param in required {
                        if !existing.required_parameters.contains(&param) {
                            existing.required_parameters.push(param);
                        }
                    }
                }
                None => commands.push(CommandHelp {
                    tool: rule.tool.clone(),
                    server: rule.server.clone(),
                    description: rule.description.clone(),
                    examples: rule.examples.clone(),
                    required_parameters: required,
                }),
            }
        }
        commands
    }

    /// Up to three hints for tools whose name or description shares a word
    /// with the utterance.
    pub fn suggest(&self, utterance: &str) -> Vec<String> {
        let words: HashSet<String> = keywords(&crate::matcher::normalize(utterance)).collect();
        let mut suggestions = Vec::new();
        for command in self.commands() {
            let name = command.tool.replace('_', " ");
            let description = command.description.to_lowercase();
            if keywords(&name)
                .chain(keywords(&description))
                .any(|w| words.contains(&w))
            {
                suggestions.push(format!("Try: {}", command.description));
                if suggestions.len() == 3 {
                    break;
                }
            }
        }
        suggestions
    }
}

fn keywords(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4)
        .map(str::to_string)
}

const FILESYSTEM: &str = "filesystem";
const SQLITE: &str = "sqlite";
const MEMORY: &str = "memory";

pub fn builtin_rules() -> Result<Vec<PatternRule>, RegistryError> {
    Ok(vec![
        // filesystem
        PatternRule::new(
            "fs.read_file",
            r#"\b(?:read|open|view|display|cat)\s+(?:the\s+)?file\b(?:\s*:?\s*(?P<path>[^\s"?]+))?"#,
            FILESYSTEM,
            "read_file",
            0.9,
        )?
        .capture("path")
        .describe("Read contents of a file")
        .example("Read the file config.txt")
        .example("open file docs/data.json"),
        PatternRule::new(
            "fs.show_file_contents",
            r#"\b(?:show|display|print)\s+(?:me\s+)?(?:the\s+)?contents?\s+of\s+(?:the\s+)?(?:file\s+)?(?P<path>[^\s"?]+\.[a-z0-9]+)\b"#,
            FILESYSTEM,
            "read_file",
            0.85,
        )?
        .capture("path")
        .describe("Read contents of a file")
        .example("Show content of readme.md"),
        PatternRule::new(
            "fs.write_file_inline",
            r#"\b(?:write|create|save)\s+(?:a\s+|the\s+)?file\s+(?P<path>[^\s"]+)\s+(?:with\s+)?(?:content|text)\s*:?\s*(?P<content>.+)$"#,
            FILESYSTEM,
            "write_file",
            0.95,
        )?
        .capture("path")
        .capture("content")
        .describe("Write content to a file")
        .example("Create file notes.txt with content: buy milk"),
        PatternRule::new(
            "fs.write_file_quoted",
            r#"\b(?:write|save|put)\s+"(?P<content>[^"]+)"\s+(?:to|into|in)\s+(?:the\s+)?(?:file\s+)?(?P<path>[^\s"?]+)"#,
            FILESYSTEM,
            "write_file",
            0.9,
        )?
        .capture("content")
        .capture("path")
        .describe("Write content to a file")
        .example("Write \"Hello World\" to greeting.txt"),
        PatternRule::new(
            "fs.list_directory",
            r#"\b(?:(?:list|show)\s+(?:all\s+)?(?:the\s+)?files|what\s+files\s+are)\b(?:\s+(?:in|under|inside)\s+(?:the\s+)?(?:current\s+(?:directory|folder)|(?:directory\s+|folder\s+)?(?P<path>[^\s"?]+)))?"#,
            FILESYSTEM,
            "list_directory",
            0.85,
        )?
        .default_param("path", ".")
        .optional("path")
        .describe("List files in a directory")
        .example("List files in src")
        .example("What files are in the current directory?"),
        // sqlite
        PatternRule::new(
            "sqlite.list_tables",
            r"\b(?:list|show|display|what)\s+(?:are\s+)?(?:all\s+)?(?:the\s+)?(?:database\s+)?tables\b",
            SQLITE,
            "list_tables",
            0.9,
        )?
        .describe("List database tables")
        .example("List database tables")
        .example("List all tables in the database")
        .example("What tables are available?"),
        PatternRule::new(
            "sqlite.query_prefixed",
            r"^(?:query|sql|run\s+sql|execute\s+(?:sql|query))\s*:\s*(?P<query>.+)$",
            SQLITE,
            "query_database",
            0.95,
        )?
        .capture("query")
        .describe("Execute SQL queries")
        .example("Query: SELECT * FROM users")
        .example("Run SQL: SELECT COUNT(*) FROM orders"),
        PatternRule::new(
            "sqlite.query_run",
            r"^(?:run|execute)\s+(?:the\s+)?(?:sql|query)\s+(?P<query>(?:select|with|pragma|insert|update|delete|create|drop|alter)\b.+)$",
            SQLITE,
            "query_database",
            0.9,
        )?
        .capture("query")
        .describe("Execute SQL queries")
        .example("Execute query SELECT name FROM users"),
        PatternRule::new(
            "sqlite.query_bare_sql",
            r"^(?P<query>select\s.+\sfrom\s.+|pragma\s+\w.*)$",
            SQLITE,
            "query_database",
            0.85,
        )?
        .capture("query")
        .describe("Execute SQL queries")
        .example("SELECT * FROM users"),
        PatternRule::new(
            "sqlite.describe_table",
            r"\b(?:describe|desc)\s+(?:the\s+)?table\s+(?P<table_name>[a-z_][a-z0-9_]*)\b",
            SQLITE,
            "describe_table",
            0.9,
        )?
        .capture("table_name")
        .describe("Get table structure")
        .example("describe table orders"),
        PatternRule::new(
            "sqlite.describe_named_table",
            r"\b(?:describe|desc)\s+(?:the\s+)?(?P<table_name>[a-z_][a-z0-9_]*)\s+table\b",
            SQLITE,
            "describe_table",
            0.9,
        )?
        .capture("table_name")
        .describe("Get table structure")
        .example("Describe the users table"),
        PatternRule::new(
            "sqlite.table_schema",
            r"\b(?:show|get|display|what\s+is)\s+(?:me\s+)?(?:the\s+)?schema\s+(?:of|for)\s+(?:the\s+)?(?:table\s+)?(?P<table_name>[a-z_][a-z0-9_]*)",
            SQLITE,
            "describe_table",
            0.9,
        )?
        .capture("table_name")
        .describe("Get table structure")
        .example("get the schema for table users"),
        PatternRule::new(
            "sqlite.structure_of_table",
            r"\b(?:show|get|display|what\s+is|what\s+are)\s+(?:me\s+)?(?:the\s+)?(?:structure|columns)\s+(?:of|for)\s+(?:the\s+)?table\s+(?P<table_name>[a-z_][a-z0-9_]*)\b",
            SQLITE,
            "describe_table",
            0.9,
        )?
        .capture("table_name")
        .describe("Get table structure")
        .example("show the columns of table orders"),
        PatternRule::new(
            "sqlite.structure_of_named_table",
            r"\b(?:show|get|display|what\s+is|what\s+are)\s+(?:me\s+)?(?:the\s+)?(?:structure|columns)\s+(?:of|for)\s+(?:the\s+)?(?P<table_name>[a-z_][a-z0-9_]*)\s+table\b",
            SQLITE,
            "describe_table",
            0.9,
        )?
        .capture("table_name")
        .describe("Get table structure")
        .example("Show structure of products table"),
        PatternRule::new(
            "sqlite.table_columns",
            r"\bwhat\s+columns\s+(?:are\s+)?(?:in|does)\s+(?:the\s+)?(?:table\s+)?(?P<table_name>[a-z_][a-z0-9_]*)",
            SQLITE,
            "describe_table",
            0.9,
        )?
        .capture("table_name")
        .describe("Get table structure")
        .example("What columns are in the orders table?"),
        PatternRule::new(
            "sqlite.table_data",
            r"\b(?:show|get|fetch|display|find)\s+(?:me\s+)?(?:all\s+)?(?:the\s+)?(?:first\s+(?P<limit>\d+)\s+)?(?:rows|records|data)\s+(?:from|in|of)\s+(?:the\s+)?table\s+(?P<table_name>[a-z_][a-z0-9_]*)\b",
            SQLITE,
            "get_table_data",
            0.85,
        )?
        .capture("table_name")
        .optional("limit")
        .describe("Show rows from a table")
        .example("show rows from table users")
        .example("Get the first 5 rows from table orders"),
        PatternRule::new(
            "sqlite.named_table_data",
            r"\b(?:show|get|fetch|display|find)\s+(?:me\s+)?(?:all\s+)?(?:the\s+)?(?:first\s+(?P<limit>\d+)\s+)?(?:rows|records|data)\s+(?:from|in|of)\s+(?:the\s+)?(?P<table_name>[a-z_][a-z0-9_]*)\s+table\b",
            SQLITE,
            "get_table_data",
            0.85,
        )?
        .capture("table_name")
        .optional("limit")
        .describe("Show rows from a table")
        .example("Find all records in the products table"),
        // memory
        PatternRule::new(
            "memory.store_key_value",
            r#"\bstore\s+(?:memory\s+)?key\s*:?\s*"?(?P<key>[\w.-]+)"?\s+value\s*:?\s*(?P<value>.+)$"#,
            MEMORY,
            "store_memory",
            0.95,
        )?
        .capture("key")
        .capture("value")
        .describe("Store information in memory")
        .example("store key: api_key value: abc123"),
        PatternRule::new(
            "memory.store_as",
            r#"\b(?:remember|store|save)\s+"(?P<value>[^"]+)"\s+as\s+"?(?P<key>[\w.-]+)"?"#,
            MEMORY,
            "store_memory",
            0.9,
        )?
        .capture("value")
        .capture("key")
        .describe("Store information in memory")
        .example("Store \"abc123\" as \"api_key\""),
        PatternRule::new(
            "memory.remember_is",
            r#"\b(?:remember|store|save)\s+(?:that\s+)?(?:my\s+)?"?(?P<key>[\w.-]+)"?(?:\s*[=:]\s*|\s+is\s+)(?P<value>.+)$"#,
            MEMORY,
            "store_memory",
            0.85,
        )?
        .capture("key")
        .capture("value")
        .describe("Store information in memory")
        .example("Remember that favorite_color is teal")
        .example("store api_key = abc123"),
        PatternRule::new(
            "memory.what_is_stored",
            r#"\bwhat\s+(?:is|was)\s+(?:stored\s+(?:under|for|as)|the\s+(?:stored\s+)?value\s+(?:of|for))\s+"?(?P<key>[\w.-]+)"?"#,
            MEMORY,
            "retrieve_memory",
            0.9,
        )?
        .capture("key")
        .describe("Retrieve stored information")
        .example("What is stored under api_key?"),
        PatternRule::new(
            "memory.get_memory",
            r#"\bget\s+(?:the\s+)?(?:memory|stored\s+value)\s+(?:for\s+|of\s+)?"?(?P<key>[\w.-]+)"?"#,
            MEMORY,
            "retrieve_memory",
            0.9,
        )?
        .capture("key")
        .describe("Retrieve stored information")
        .example("get memory api_key"),
        PatternRule::new(
            "memory.recall",
            r#"\b(?:recall|retrieve)\s+(?:the\s+)?(?:memory|key|value|stored\s+value)\s+(?:for\s+|of\s+)?"?(?P<key>[\w.-]+)"?\s*\??$"#,
            MEMORY,
            "retrieve_memory",
            0.85,
        )?
        .capture("key")
        .describe("Retrieve stored information")
        .example("recall memory favorite_color")
        .example("Retrieve the memory api_key"),
        PatternRule::new(
            "memory.list_memories",
            r"\b(?:list|show|display)\s+(?:me\s+)?(?:all\s+)?(?:the\s+)?(?:my\s+)?(?:stored\s+)?memor(?:y|ies)\b",
            MEMORY,
            "list_memories",
            0.9,
        )?
        .describe("List all stored memories")
        .example("List all stored memories")
        .example("show memories"),
        PatternRule::new(
            "memory.what_stored",
            r"\bwhat\s+(?:have\s+i|did\s+i|do\s+you\s+have)\s+(?:stored|saved|remembered)\b",
            MEMORY,
            "list_memories",
            0.8,
        )?
        .describe("List all stored memories")
        .example("What have I stored?"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{canonicalize, normalize};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use shared_protocol_objects::ToolInfo;

    fn entry(server: &str, name: &str, schema: serde_json::Value) -> CatalogEntry {
        CatalogEntry {
            server: server.into(),
            tool: ToolInfo {
                name: name.into(),
                description: None,
                input_schema: schema,
            },
        }
    }

    fn read_file_catalog() -> Vec<CatalogEntry> {
        vec![entry(
            "filesystem",
            "read_file",
            json!({
                "type": "object",
                "properties": { "path": { "type": "string" } },
                "required": ["path"]
            }),
        )]
    }

    #[test]
    fn builtin_registry_builds() {
        let registry = PatternRegistry::builtin().unwrap();
        assert!(!registry.is_empty());
        assert!(registry.all_rules().iter().all(|r| !r.examples.is_empty()));
    }

    #[test]
    fn extract_maps_named_groups_to_params() {
        let rule = PatternRule::new("r", r"open (?P<target>\S+)", "filesystem", "read_file", 0.9)
            .unwrap()
            .capture_as("target", "path", true);
        let params = rule.extract("open Notes.TXT").unwrap();
        assert_eq!(params.get("path").map(String::as_str), Some("Notes.TXT"));
    }

    #[test]
    fn missing_required_capture_fails_extraction() {
        let rule = PatternRegistry::builtin()
            .unwrap()
            .all_rules()
            .iter()
            .find(|r| r.id == "fs.read_file")
            .cloned()
            .unwrap();
        let text = normalize("read file ");
        assert!(rule.is_structural_match(&text));
        assert_eq!(
            rule.extract(&canonicalize("read file ")),
            Err(PatternExtractionError::MissingParameter {
                rule_id: "fs.read_file".into(),
                param: "path".into(),
            })
        );
    }

    #[test]
    fn defaults_fill_optional_params() {
        let registry = PatternRegistry::builtin().unwrap();
        let rule = registry
            .all_rules()
            .iter()
            .find(|r| r.id == "fs.list_directory")
            .unwrap();
        assert_eq!(rule.extract("list files").unwrap().get("path").unwrap(), ".");
        assert_eq!(rule.extract("list files in src").unwrap().get("path").unwrap(), "src");
    }

    #[test]
    fn unknown_group_is_rejected() {
        let rule = PatternRule::new("r", r"read (?P<path>\S+)", "filesystem", "read_file", 0.9)
            .unwrap()
            .capture("file");
        assert!(matches!(
            PatternRegistry::new(vec![rule]),
            Err(RegistryError::UnknownGroup { group, .. }) if group == "file"
        ));
    }

    #[test]
    fn duplicate_ids_and_bad_confidence_are_rejected() {
        let a = PatternRule::new("same", "a", "s", "t", 0.5).unwrap();
        let b = PatternRule::new("same", "b", "s", "t", 0.5).unwrap();
        assert!(matches!(
            PatternRegistry::new(vec![a, b]),
            Err(RegistryError::DuplicateRule(id)) if id == "same"
        ));
        let c = PatternRule::new("c", "c", "s", "t", 1.5).unwrap();
        assert!(matches!(
            PatternRegistry::new(vec![c]),
            Err(RegistryError::InvalidConfidence { .. })
        ));
    }

    #[test]
    fn invalid_regex_is_reported_with_rule_id() {
        let err = PatternRule::new("broken", "(unclosed", "s", "t", 0.5).unwrap_err();
        assert!(err.to_string().starts_with("invalid pattern for rule broken"));
    }

    #[test]
    fn validate_rejects_unknown_tools() {
        let rule = PatternRule::new("r", r"tables", "sqlite", "list_tables", 0.9).unwrap();
        let registry = PatternRegistry::new(vec![rule]).unwrap();
        assert!(matches!(
            registry.validate(&read_file_catalog()),
            Err(RegistryError::UnknownTool { tool, .. }) if tool == "list_tables"
        ));
    }

    #[test]
    fn validate_rejects_undeclared_and_unsatisfiable_params() {
        let undeclared = PatternRule::new("r", r"read (?P<path>\S+) (?P<mode>\S+)", "filesystem", "read_file", 0.9)
            .unwrap()
            .capture("path")
            .optional("mode");
        let registry = PatternRegistry::new(vec![undeclared]).unwrap();
        assert!(matches!(
            registry.validate(&read_file_catalog()),
            Err(RegistryError::UndeclaredParameter { param, .. }) if param == "mode"
        ));

        let optional_path = PatternRule::new("r", r"read(?: (?P<path>\S+))?", "filesystem", "read_file", 0.9)
            .unwrap()
            .optional("path");
        let registry = PatternRegistry::new(vec![optional_path]).unwrap();
        assert!(matches!(
            registry.validate(&read_file_catalog()),
            Err(RegistryError::UnsatisfiableParameter { param, .. }) if param == "path"
        ));
    }

    #[test]
    fn commands_group_rules_by_tool() {
        let registry = PatternRegistry::builtin().unwrap();
        let commands = registry.commands();
        let read = commands.iter().find(|c| c.tool == "read_file").unwrap();
        assert_eq!(read.server, "filesystem");
        assert_eq!(read.required_parameters, vec!["path".to_string()]);
        assert!(read.examples.contains(&"Show content of readme.md".to_string()));
        let tools: HashSet<&str> = commands.iter().map(|c| c.tool.as_str()).collect();
        assert_eq!(tools.len(), commands.len());
    }

    #[test]
    fn suggestions_share_a_keyword() {
        let registry = PatternRegistry::builtin().unwrap();
        let hints = registry.suggest("something about my memories please");
        assert_eq!(hints, vec!["Try: List all stored memories".to_string()]);
        let hints = registry.suggest("database");
        assert_eq!(
            hints,
            vec![
                "Try: List database tables".to_string(),
                "Try: Execute SQL queries".to_string(),
            ]
        );
        assert!(registry.suggest("tell me a joke").is_empty());
    }
}
