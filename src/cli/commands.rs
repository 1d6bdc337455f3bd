//! CLI command implementations
//!
//! Each command loads the config, reads one request from stdin, compiles
//! it and writes exactly one response. Compile errors are reported in the
//! response; only config and I/O failures end the process with an error.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compiler::{
    CountQuery, DefaultEncoder, ExplainQuery, QueryCompiler, QueryResult, ReadQuery,
    StaticSchemaRegistry, WriteQuery,
};
use crate::config::CompilerConfig;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response, write_text, Request};

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub compiler: CompilerConfig,

    /// Primary key field per model name
    #[serde(default)]
    pub primary_keys: HashMap<String, String>,
}

impl CliConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: CliConfig = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.compiler.identity_key.is_empty() {
            return Err(CliError::config_error("identity_key must not be empty"));
        }

        if let Some((model, _)) = self.primary_keys.iter().find(|(_, pk)| pk.is_empty()) {
            return Err(CliError::config_error(format!(
                "Empty primary key for model '{}'",
                model
            )));
        }

        Ok(())
    }

    fn registry(&self) -> StaticSchemaRegistry {
        self.primary_keys
            .iter()
            .map(|(model, pk)| (model.clone(), pk.clone()))
            .collect()
    }
}

/// Output of one compiled request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Compiled {
    Read(ReadQuery),
    Count(CountQuery),
    Write(WriteQuery),
}

impl Compiled {
    pub fn explain(&self) -> ExplainQuery {
        match self {
            Compiled::Read(query) => ExplainQuery::from_read(query),
            Compiled::Count(query) => ExplainQuery::from_count(query),
            Compiled::Write(query) => ExplainQuery::from_write(query),
        }
    }
}

/// Run the CLI
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a specific CLI command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Compile { config } => compile(&config),
        Command::Explain { config } => explain(&config),
    }
}

/// Compile a single request and print the descriptor
pub fn compile(config_path: &Path) -> CliResult<()> {
    let config = CliConfig::load(config_path)?;
    let request = read_request()?;

    match execute(&request, &config) {
        Ok(compiled) => write_response(&compiled),
        Err(err) => write_error(err.code().code(), &err.to_string()),
    }
}

/// Compile a single request and print the explain output
pub fn explain(config_path: &Path) -> CliResult<()> {
    let config = CliConfig::load(config_path)?;
    let request = read_request()?;

    let explain = match execute(&request, &config) {
        Ok(compiled) => compiled.explain(),
        Err(err) => ExplainQuery::from_error(&err),
    };
    write_text(&explain.to_string())
}

/// Compiles one request against the configured schema
pub fn execute(request: &Request, config: &CliConfig) -> QueryResult<Compiled> {
    let registry = config.registry();
    let encoder = DefaultEncoder;
    let compiler = QueryCompiler::new(&registry, &encoder, &config.compiler);
    let pk_of = |model: &Option<String>| {
        model
            .as_deref()
            .and_then(|model| config.primary_keys.get(model))
            .map(String::as_str)
    };

    match request {
        Request::All { query, params } => compiler.all(query, params).map(Compiled::Read),
        Request::Count { query, params } => compiler.count(query, params).map(Compiled::Count),
        Request::UpdateAll { query, params } => {
            compiler.update_all(query, params).map(Compiled::Write)
        }
        Request::DeleteAll { query, params } => {
            compiler.delete_all(query, params).map(Compiled::Write)
        }
        Request::Insert {
            coll,
            model,
            document,
        } => compiler
            .insert(coll, document.pairs(), pk_of(model))
            .map(Compiled::Write),
        Request::Update {
            coll,
            model,
            values,
            filter,
        } => compiler
            .update(coll, values.pairs(), filter.pairs(), pk_of(model))
            .map(Compiled::Write),
        Request::Delete {
            coll,
            model,
            filter,
        } => compiler
            .delete(coll, filter.pairs(), pk_of(model))
            .map(Compiled::Write),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::document::Value;
    use crate::observability::Severity;
    use crate::query::{Expr, QueryAst};
    use std::io::Write;

    fn config() -> CliConfig {
        CliConfig {
            primary_keys: HashMap::from([("User".to_string(), "id".to_string())]),
            ..CliConfig::default()
        }
    }

    #[test]
    fn test_load_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"identity_key": "_id", "log_level": "WARN", "primary_keys": {{"User": "id"}}}}"#
        )
        .unwrap();

        let loaded = CliConfig::load(file.path()).unwrap();
        assert_eq!(loaded.compiler.log_level, Severity::Warn);
        assert_eq!(loaded.primary_keys.get("User").map(String::as_str), Some("id"));
    }

    #[test]
    fn test_load_rejects_bad_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"identity_key": ""}}"#).unwrap();
        let err = CliConfig::load(file.path()).unwrap_err();
        assert_eq!(err.code_str(), "DOCWIRE_CLI_CONFIG_ERROR");

        let missing = CliConfig::load(Path::new("/nonexistent/docwire.json")).unwrap_err();
        assert!(missing.message().contains("Failed to read config"));
    }

    #[test]
    fn test_execute_read() {
        let request = Request::All {
            query: QueryAst::new("users")
                .with_model("User")
                .filter(Expr::eq(Expr::field("id"), Expr::param(0))),
            params: vec![Value::from(5)],
        };
        match execute(&request, &config()).unwrap() {
            Compiled::Read(read) => assert_eq!(read.query, doc! { "_id" => 5 }),
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_execute_single_record_uses_model_pk() {
        let request = Request::Delete {
            coll: "users".into(),
            model: Some("User".into()),
            filter: doc! { "id" => 9 },
        };
        match execute(&request, &config()).unwrap() {
            Compiled::Write(write) => {
                assert_eq!(write.query, doc! { "_id" => 9 });
                assert!(write.command.is_none());
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_execute_propagates_query_errors() {
        let request = Request::Count {
            query: QueryAst::new("users").lock("FOR UPDATE"),
            params: vec![],
        };
        let err = execute(&request, &config()).unwrap_err();
        assert_eq!(err.code().code(), "DOCWIRE_UNSUPPORTED_CLAUSE");
    }

    #[test]
    fn test_compiled_explain() {
        let request = Request::Insert {
            coll: "users".into(),
            model: None,
            document: doc! { "name" => "a" },
        };
        let output = execute(&request, &config()).unwrap().explain().to_string();
        assert!(output.contains(r#"Command: {"name":"a"}"#));
    }
}
