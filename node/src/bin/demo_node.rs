//! A thin demonstration binary: wires up one node from CLI flags and runs
//! it against the in-process broker until interrupted.
//!
//! Grounded on `producer/src/main.rs`: `clap`-derived args, tracing setup,
//! a `tokio::signal::ctrl_c()` task wired to the node's shutdown, and a
//! plain `run-to-completion-or-signal` main.

use async_trait::async_trait;
use clap::Parser;
use node::config::{parse_input_port_spec, parse_output_port_spec, Configure, NodeConfig, Orchestration, Synchronization};
use node::{Broker, Context, InProcessBroker, Message, Node, NodeResult, Processor};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "demo_node", about = "Run a single EPN actor node against an in-process broker")]
struct Args {
    /// Name this node reports to the orchestrator and in its logs.
    #[arg(long, default_value = "demo-node")]
    node: String,

    /// Node type reported in status reports, e.g. "pass-through".
    #[arg(long, default_value = "pass-through")]
    node_type: String,

    /// URL of this node's published specs, reported in status reports.
    #[arg(long, default_value = "")]
    specs_url: String,

    /// `tracing` log level: trace, debug, info, warn, error.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format: text or json.
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Repeatable `name|channel|type|representation|default` input port spec.
    #[arg(long = "input", value_name = "SPEC")]
    inputs: Vec<String>,

    /// Repeatable `name|channel|type|representation` output port spec.
    #[arg(long = "output", value_name = "SPEC")]
    outputs: Vec<String>,

    /// Report status to, and accept lifecycle triggers from, an orchestrator.
    #[arg(long)]
    presence: bool,

    /// Run in synchronous mode (requires --presence).
    #[arg(long)]
    sync: bool,

    /// Allow the CLI port specs to add ports beyond the built-in ones.
    #[arg(long)]
    extend: bool,

    /// Allow the CLI port specs to redefine built-in ports.
    #[arg(long)]
    modify: bool,
}

/// Copies every input port whose name starts with `in` to the
/// identically-suffixed output port whose name starts with `out`, e.g.
/// `in1` -> `out1`. Purely illustrative; a real node's `Processor` would
/// hold domain logic instead.
struct PassThrough {
    pairs: Vec<(String, String)>,
}

#[async_trait]
impl Processor for PassThrough {
    async fn process(&self, ctx: &Context<'_>) -> NodeResult<()> {
        for (input_port, output_port) in &self.pairs {
            if let Some(input) = ctx.input(input_port) {
                let bytes = input.encode(node::Representation::Json)?;
                let mut output = node::message::default_message(input.type_name())?;
                output.decode(node::Representation::Json, &bytes)?;
                ctx.set_output(output_port, output).await?;
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> NodeResult<()> {
    let args = Args::parse();
    shared::logging::init_tracing(&args.log_level, &args.log_format)
        .map_err(|e| node::NodeError::Config(e.to_string()))?;

    let mut config = NodeConfig::default_node(args.node.clone());
    config.node_type = args.node_type.clone();
    config.specs_url = args.specs_url.clone();
    config.configure = Configure {
        extend: args.extend,
        modify: args.modify,
    };
    config.orchestration = Orchestration {
        presence: args.presence,
        synchronization: if args.sync { Synchronization::Sync } else { Synchronization::Async },
        ..Orchestration::default()
    };
    for spec in &args.inputs {
        config.add_input_port(parse_input_port_spec(spec)?);
    }
    for spec in &args.outputs {
        config.add_output_port(parse_output_port_spec(spec)?);
    }

    let pairs = config
        .ports
        .inputs
        .iter()
        .filter_map(|input| {
            let suffix = input.name.strip_prefix("in")?;
            let output_name = format!("out{suffix}");
            config
                .ports
                .outputs
                .iter()
                .any(|o| o.name == output_name)
                .then(|| (input.name.clone(), output_name))
        })
        .collect();

    shared::node_info!(args.node, "starting node with {} input(s), {} output(s)", config.ports.inputs.len(), config.ports.outputs.len());

    let broker: Arc<dyn Broker> = Arc::new(InProcessBroker::new());
    let node = Node::start(config, broker, Arc::new(PassThrough { pairs })).await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| node::NodeError::Config(format!("failed to listen for ctrl-c: {e}")))?;
    shared::node_info!(args.node, "received shutdown signal");

    node.shutdown().await
}
