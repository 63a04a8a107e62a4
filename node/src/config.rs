//! Node configuration: the hardcoded application defaults, the
//! command-line overrides, and the merge between them.
//!
//! Grounded on `config/config.go`. Two configs are always in play: a
//! hardcoded one the node binary ships with (`GetDefaultNode`-equivalent)
//! and one built from CLI flags / a YAML file. [`NodeConfig::merge`]
//! reproduces `MergeNodeConfigs`'s asymmetric rule exactly: the merged
//! orchestration's `Presence` and `Synchronization` come from the
//! hardcoded config, while its `Channels` come from the CLI config, and
//! port lists merge under the `Configure` extend/modify gate.

use crate::error::{NodeError, NodeResult};
use crate::message::Representation;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Whether the orchestrator drives this node synchronously (waits for
/// explicit `receive-and-process`/`send-results` triggers) or
/// asynchronously (the node reacts to its own input/output timing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Synchronization {
    Async,
    Sync,
}

impl std::fmt::Display for Synchronization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Synchronization::Async => write!(f, "async"),
            Synchronization::Sync => write!(f, "sync"),
        }
    }
}

/// Whether a CLI/file config may add ports the hardcoded config doesn't
/// already declare (`extend`), or change the type/channel/representation
/// of ports the hardcoded config already declares (`modify`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configure {
    #[serde(default)]
    pub extend: bool,
    #[serde(default)]
    pub modify: bool,
}

/// The broker channel names the orchestrator protocol runs on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channels {
    pub status_request: String,
    pub status_report: String,
    pub send_results: String,
    pub sending_completed: String,
    pub receive_and_process: String,
    pub processing_completed: String,
}

impl Default for Channels {
    fn default() -> Self {
        Self {
            status_request: "status-request".to_string(),
            status_report: "status-report".to_string(),
            send_results: "send-results".to_string(),
            sending_completed: "sending-completed".to_string(),
            receive_and_process: "receive-and-process".to_string(),
            processing_completed: "processing-completed".to_string(),
        }
    }
}

/// Whether the node participates in the orchestrator protocol at all
/// (`Presence`), how it is driven (`Synchronization`), and what channel
/// names that protocol uses (`Channels`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orchestration {
    #[serde(default)]
    pub presence: bool,
    #[serde(default = "default_synchronization")]
    pub synchronization: Synchronization,
    #[serde(default)]
    pub channels: Channels,
}

fn default_synchronization() -> Synchronization {
    Synchronization::Async
}

impl Default for Orchestration {
    fn default() -> Self {
        Self {
            presence: false,
            synchronization: Synchronization::Async,
            channels: Channels::default(),
        }
    }
}

/// One port's configuration: its name, the broker channel it binds to,
/// its message type, its wire representation, and — for input ports
/// only — an optional default value literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortSpec {
    pub name: String,
    pub channel: String,
    pub message_type: String,
    pub representation: Representation,
    #[serde(default)]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ports {
    #[serde(default)]
    pub inputs: Vec<PortSpec>,
    #[serde(default)]
    pub outputs: Vec<PortSpec>,
}

/// The node's full configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node: String,
    /// The node's kind, as advertised to the orchestrator in status
    /// reports (e.g. `"inverter"`, `"aggregator"`). Distinct from `node`,
    /// which is this instance's name.
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default)]
    pub ports: Ports,
    #[serde(default)]
    pub configure: Configure,
    #[serde(default)]
    pub orchestration: Orchestration,
    /// URL the orchestrator can fetch this node's message-type/port specs
    /// from. Carried through status reports, otherwise opaque to the node.
    #[serde(default)]
    pub specs_url: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl NodeConfig {
    /// The application's built-in defaults: no ports, orchestration
    /// absent, async, extend/modify both closed. Mirrors
    /// `GetDefaultNode()`.
    pub fn default_node(name: impl Into<String>) -> Self {
        Self {
            node: name.into(),
            node_type: String::new(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            ports: Ports::default(),
            configure: Configure::default(),
            orchestration: Orchestration::default(),
            specs_url: String::new(),
        }
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> NodeResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn add_input_port(&mut self, port: PortSpec) {
        self.ports.inputs.push(port);
    }

    pub fn add_output_port(&mut self, port: PortSpec) {
        self.ports.outputs.push(port);
    }

    /// Merge `hard_coded` (the application's built-in config) with `cli`
    /// (flags / a config file), following `MergeNodeConfigs` exactly: the
    /// result starts from `hard_coded` in full, and only `node`,
    /// `log_level`, and `log_format` are overwritten by `cli`; the merged
    /// orchestration's `presence`/`synchronization` are taken back from
    /// `hard_coded` even though `cli`'s `channels` are kept. Port lists are
    /// merged under `hard_coded`'s extend/modify gate (never the overlay's
    /// own) with `hard_coded`'s ports as the base. `configure` itself is
    /// never overwritten from `cli` — an untrusted overlay config cannot
    /// grant itself permission to extend or modify ports. `node_type` and
    /// `specs_url` likewise stay `hard_coded`'s own; they describe what
    /// this node binary is, not something a CLI overlay chooses.
    pub fn merge(hard_coded: &NodeConfig, cli: &NodeConfig) -> NodeResult<NodeConfig> {
        let mut orchestration = cli.orchestration.clone();
        orchestration.presence = hard_coded.orchestration.presence;
        orchestration.synchronization = hard_coded.orchestration.synchronization;

        let inputs = merge_port_list(&hard_coded.ports.inputs, &cli.ports.inputs, &hard_coded.configure)?;
        let outputs = merge_port_list(&hard_coded.ports.outputs, &cli.ports.outputs, &hard_coded.configure)?;

        Ok(NodeConfig {
            node: cli.node.clone(),
            node_type: hard_coded.node_type.clone(),
            log_level: cli.log_level.clone(),
            log_format: cli.log_format.clone(),
            ports: Ports { inputs, outputs },
            configure: hard_coded.configure.clone(),
            orchestration,
            specs_url: hard_coded.specs_url.clone(),
        })
    }
}

fn merge_port_list(base: &[PortSpec], overlay: &[PortSpec], configure: &Configure) -> NodeResult<Vec<PortSpec>> {
    let mut result = base.to_vec();
    for port in overlay {
        if let Some(existing) = result.iter_mut().find(|p| p.name == port.name) {
            if !configure.modify {
                return Err(NodeError::Config("port modification is disabled".to_string()));
            }
            *existing = port.clone();
        } else {
            if !configure.extend {
                return Err(NodeError::Config("port extension is disabled".to_string()));
            }
            result.push(port.clone());
        }
    }
    Ok(result)
}

/// Parse one `name|channel|type|representation|default` input port spec
/// from the CLI. The trailing default-value field is optional; every
/// other field is required and must be non-empty.
pub fn parse_input_port_spec(spec: &str) -> NodeResult<PortSpec> {
    let fields: Vec<&str> = spec.split('|').collect();
    if fields.len() != 4 && fields.len() != 5 {
        return Err(NodeError::Config(format!(
            "invalid input port spec '{spec}': expected 4 or 5 '|'-separated fields, got {}",
            fields.len()
        )));
    }
    build_port_spec(spec, &fields, fields.get(4).map(|s| s.to_string()))
}

/// Parse one `name|channel|type|representation` output port spec from the
/// CLI. Output ports carry no default value.
pub fn parse_output_port_spec(spec: &str) -> NodeResult<PortSpec> {
    let fields: Vec<&str> = spec.split('|').collect();
    if fields.len() != 4 {
        return Err(NodeError::Config(format!(
            "invalid output port spec '{spec}': expected 4 '|'-separated fields, got {}",
            fields.len()
        )));
    }
    build_port_spec(spec, &fields, None)
}

fn build_port_spec(spec: &str, fields: &[&str], default_value: Option<String>) -> NodeResult<PortSpec> {
    let [name, channel, message_type, representation] = [fields[0], fields[1], fields[2], fields[3]];
    if name.is_empty() {
        return Err(NodeError::Config(format!("invalid port spec '{spec}': name is empty")));
    }
    if channel.is_empty() {
        return Err(NodeError::Config(format!("invalid port spec '{spec}': channel is empty")));
    }
    if message_type.is_empty() {
        return Err(NodeError::Config(format!("invalid port spec '{spec}': type is empty")));
    }
    Ok(PortSpec {
        name: name.to_string(),
        channel: channel.to_string(),
        message_type: message_type.to_string(),
        representation: Representation::from_str(representation)?,
        default_value,
    })
}
