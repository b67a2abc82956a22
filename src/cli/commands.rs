//! CLI command implementations
//!
//! Commands run against an in-process cluster built from a JSON description.
//! Results go to stdout as a JSON envelope; logs go through the structured
//! logger.

use std::path::Path;
use std::time::Duration;

use serde_json::{json, Value};

use crate::config::CoordinatorConfig;
use crate::node::{ClusterFile, LocalCluster};
use crate::observability::{log_event, Event, Logger};
use crate::schema::SchemaRequest;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{error_response, response, write_envelope};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command and write its envelope.
///
/// Every outcome, including configuration errors, produces exactly one
/// envelope on stdout. Errors are also returned for a non-zero exit.
pub fn run_command(cmd: Command) -> CliResult<()> {
    let outcome = execute(cmd);
    write_envelope(&envelope(&outcome))?;
    outcome.map(|_| ())
}

/// Run a command and return its payload without writing anything
pub fn execute(cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::Describe {
            cluster,
            node,
            predicates,
            fields,
            timeout_ms,
            config,
        } => {
            let config = load_config(config.as_deref(), timeout_ms)?;
            let request = SchemaRequest::for_predicates(predicates).with_fields(fields);
            describe_value(&cluster, node, request, config)
        }
        Command::Check { cluster } => check_value(&cluster),
    }
}

/// Envelope written for a command outcome
pub fn envelope(outcome: &CliResult<Value>) -> Value {
    match outcome {
        Ok(data) => response(data.clone()),
        Err(err) => error_response(err.code(), &err.message()),
    }
}

/// Load the coordinator configuration, apply CLI overrides and set the
/// process log level
pub fn load_config(path: Option<&Path>, timeout_ms: Option<u64>) -> CliResult<CoordinatorConfig> {
    let mut config = match path {
        Some(path) => {
            let config = CoordinatorConfig::load(path)?;
            let display = path.display().to_string();
            log_event(Event::ConfigLoaded, &[("path", display.as_str())]);
            config
        }
        None => CoordinatorConfig::default(),
    };

    if let Some(ms) = timeout_ms {
        config = config.with_request_timeout(Duration::from_millis(ms));
        config.validate()?;
    }

    Logger::set_min_severity(config.severity());
    Ok(config)
}

/// Resolve and render the `describe` payload without writing it
pub fn describe_value(
    cluster_path: &Path,
    node: u64,
    request: SchemaRequest,
    config: CoordinatorConfig,
) -> CliResult<Value> {
    let cluster_file = ClusterFile::load(cluster_path)?;
    let cluster = LocalCluster::build(&cluster_file, &config)?;
    let origin = cluster.node(node).ok_or(CliError::UnknownNode(node))?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Io(format!("Failed to create tokio runtime: {}", e)))?;
    let schema = rt.block_on(origin.describe(&request))?;

    let metrics = origin.coordinator.metrics().snapshot();
    Ok(json!({
        "node": node,
        "schema": schema,
        "metrics": metrics,
    }))
}

/// Render the `check` payload without writing it
pub fn check_value(cluster_path: &Path) -> CliResult<Value> {
    let cluster_file = ClusterFile::load(cluster_path)?;
    let layout = cluster_file.layout();
    Ok(json!({
        "nodes": cluster_file.nodes.len(),
        "groups": layout,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CLUSTER: &str = r#"{
        "nodes": [
            {"id": 1, "groups": [1]},
            {"id": 2, "groups": [2]}
        ],
        "predicates": {
            "name": {"group": 1, "type": "string", "tokenizers": ["exact", "term"]},
            "age": {"group": 2, "type": "int"},
            "ghost": {"group": 0, "type": "bool"}
        }
    }"#;

    fn cluster_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_describe_across_groups() {
        let file = cluster_file(CLUSTER);
        let request = SchemaRequest::for_predicates(["name", "age"]).with_fields(["type", "index"]);

        let data = describe_value(file.path(), 1, request, CoordinatorConfig::default()).unwrap();

        let schema = data["schema"].as_array().unwrap();
        assert_eq!(schema.len(), 2);
        let names: Vec<&str> = schema
            .iter()
            .map(|n| n["predicate"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"name"));
        assert!(names.contains(&"age"));
        assert_eq!(data["metrics"]["remote_dispatches"], 1);
        assert_eq!(data["metrics"]["local_dispatches"], 1);
    }

    #[test]
    fn test_describe_unowned_predicate_fails() {
        let file = cluster_file(CLUSTER);
        let request = SchemaRequest::for_predicates(["ghost"]);

        let err = describe_value(file.path(), 1, request, CoordinatorConfig::default())
            .unwrap_err();
        assert_eq!(err.code(), "AERO_CLI_RESOLVE_FAILED");
        assert!(err.message().contains("AERO_WORKER_UNSERVED_TABLET"));
    }

    #[test]
    fn test_describe_unknown_node() {
        let file = cluster_file(CLUSTER);
        let err = describe_value(file.path(), 9, SchemaRequest::all(), CoordinatorConfig::default())
            .unwrap_err();
        assert_eq!(err.code(), "AERO_CLI_UNKNOWN_NODE");
    }

    #[test]
    fn test_check_layout() {
        let file = cluster_file(CLUSTER);
        let data = check_value(file.path()).unwrap();

        assert_eq!(data["nodes"], 2);
        let groups = data["groups"].as_array().unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0]["group_id"], 0);
        assert_eq!(groups[0]["predicates"][0], "ghost");
        assert_eq!(groups[2]["leader"], 2);
    }

    #[test]
    fn test_check_rejects_invalid_cluster() {
        let file = cluster_file(r#"{"nodes": [{"id": 0}]}"#);
        let err = check_value(file.path()).unwrap_err();
        assert_eq!(err.code(), "AERO_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_timeout_override() {
        let config = load_config(None, Some(250)).unwrap();
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(250)));
        assert!(load_config(None, Some(0)).is_err());
    }

    fn describe_command(cluster: &Path, timeout_ms: Option<u64>, config: Option<&Path>) -> Command {
        Command::Describe {
            cluster: cluster.to_path_buf(),
            node: 1,
            predicates: vec!["name".to_string()],
            fields: Vec::new(),
            timeout_ms,
            config: config.map(Path::to_path_buf),
        }
    }

    #[test]
    fn test_describe_envelope_on_success() {
        let file = cluster_file(CLUSTER);
        let outcome = execute(describe_command(file.path(), None, None));

        let written = envelope(&outcome);
        assert_eq!(written["status"], "ok");
        assert_eq!(written["data"]["schema"][0]["predicate"], "name");
    }

    #[test]
    fn test_describe_envelope_on_unreadable_config() {
        let file = cluster_file(CLUSTER);
        let config = cluster_file("{ not json");
        let outcome = execute(describe_command(file.path(), None, Some(config.path())));

        let written = envelope(&outcome);
        assert_eq!(written["status"], "error");
        assert_eq!(written["code"], "AERO_CLI_CONFIG_ERROR");
        assert!(written["message"]
            .as_str()
            .unwrap()
            .starts_with("AERO_CONFIG_PARSE"));
    }

    #[test]
    fn test_describe_envelope_on_zero_timeout() {
        let file = cluster_file(CLUSTER);
        let outcome = execute(describe_command(file.path(), Some(0), None));

        assert!(outcome.is_err());
        let written = envelope(&outcome);
        assert_eq!(written["status"], "error");
        assert_eq!(written["code"], "AERO_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_check_envelope_on_invalid_cluster() {
        let file = cluster_file(r#"{"nodes": [{"id": 1, "groups": [0]}]}"#);
        let outcome = execute(Command::Check {
            cluster: file.path().to_path_buf(),
        });

        let written = envelope(&outcome);
        assert_eq!(written["status"], "error");
        assert_eq!(written["code"], "AERO_CLI_CONFIG_ERROR");
        assert!(written["message"]
            .as_str()
            .unwrap()
            .starts_with("AERO_CONFIG_INVALID"));
    }
}
