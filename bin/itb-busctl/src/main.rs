//! ---
//! itb_section: "05-cli-tooling"
//! itb_subsection: "binary"
//! itb_type: "source"
//! itb_scope: "code"
//! itb_description: "Diagnostic CLI for the ITB catalogue and dispatcher."
//! itb_version: "v0.0.0-prealpha"
//! itb_owner: "tbd"
//! ---
use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use itb_msg::{Envelope, FieldMap, MessageKind};
use itb_routing::{
    log_dispatch, DispatchMetricsExporter, DispatchOutcome, InMemoryTransport, MessageRegistry,
    RawDelivery, Transport,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "ITB bus diagnostic utility", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Resolve a routing key against the built-in catalogue")]
    Resolve {
        #[arg(help = "Concrete dotted routing key, e.g. fromAgent.agent1.packet.raw")]
        routing_key: String,
    },
    #[command(about = "Decode a raw JSON body into a typed envelope")]
    Decode {
        #[arg(long, help = "Routing key the body arrived under")]
        routing_key: String,
        #[arg(long, default_value = "{}", help = "JSON body to rehydrate")]
        body: String,
    },
    #[command(about = "Run a request/reply round trip over the in-memory transport")]
    Demo,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();
    let registry = MessageRegistry::with_catalogue();
    match cli.command {
        Commands::Resolve { routing_key } => resolve(&registry, &routing_key),
        Commands::Decode { routing_key, body } => decode(&registry, &routing_key, &body),
        Commands::Demo => demo(&registry),
    }
}

fn resolve(registry: &MessageRegistry, routing_key: &str) -> Result<()> {
    let descriptor = registry
        .resolve(routing_key)
        .with_context(|| format!("resolving {routing_key}"))?;
    println!(
        "{} -> {} (pattern {})",
        routing_key,
        descriptor.kind.as_str(),
        descriptor.routing_key
    );
    Ok(())
}

fn decode(registry: &MessageRegistry, routing_key: &str, body: &str) -> Result<()> {
    let envelope = registry
        .load(body, routing_key, None)
        .with_context(|| format!("decoding body for {routing_key}"))?;
    println!("{}", envelope.to_json()?);
    Ok(())
}

/// Publish a sniffing-start request, consume it, answer it, and consume the
/// reply, all over the in-memory transport. Prints the dispatch metrics at
/// the end so the exporter output can be eyeballed.
fn demo(registry: &MessageRegistry) -> Result<()> {
    let prom_registry = prometheus::Registry::new();
    let metrics = DispatchMetricsExporter::register(&prom_registry)?;
    let transport = InMemoryTransport::new();

    let request = registry
        .resolve("sniffing.start.request")
        .context("catalogue carries the demo request")?
        .instantiate(FieldMap::new());
    info!(
        routing_key = request.routing_key(),
        message_id = %request.properties().message_id,
        "publishing request"
    );
    transport.publish(RawDelivery::from_envelope(&request)?)?;

    let delivery = transport.recv().context("request delivery pending")?;
    let received = registry.load_from_transport(&delivery)?;
    log_dispatch(DispatchOutcome::Resolved, received.routing_key());
    metrics.observe(DispatchOutcome::Resolved);

    let reply = Envelope::reply_to_request(&received, FieldMap::new());
    transport.publish(RawDelivery::from_envelope(&reply)?)?;

    let delivery = transport.recv().context("reply delivery pending")?;
    let received_reply = registry.load_from_transport(&delivery)?;
    log_dispatch(DispatchOutcome::Resolved, received_reply.routing_key());
    metrics.observe(DispatchOutcome::Resolved);

    ensure!(
        received_reply.properties().correlation_id == request.properties().correlation_id,
        "reply must correlate to the request"
    );
    println!(
        "request {} answered by {} (kind {}, correlation {})",
        request.routing_key(),
        received_reply.routing_key(),
        registry
            .resolve(received_reply.routing_key())
            .map(|d| d.kind)
            .unwrap_or(MessageKind::SniffingStartReply)
            .as_str(),
        received_reply
            .properties()
            .correlation_id
            .as_deref()
            .unwrap_or("<unset>")
    );

    let encoder = prometheus::TextEncoder::new();
    println!("{}", encoder.encode_to_string(&prom_registry.gather())?);
    Ok(())
}
