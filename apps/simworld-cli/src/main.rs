mod script;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::DVec3;
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use simworld_common::{ObjectKind, Rgb};
use simworld_control::{ClientConfig, ControllerConfig, WorldController};
use simworld_kernel::{CounterPolicy, SimWorld};
use simworld_transport::{MemoryNetwork, Network, TcpNetwork, shared};

use script::Script;

#[derive(Parser)]
#[command(name = "simworld-cli", about = "Control objects in a simulator world")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default configuration
    Info,
    /// Create, move and clear a few objects in an in-process simulator
    Demo {
        /// Simulator keeps its per-kind ids across `world del all`
        #[arg(long)]
        monotonic: bool,
    },
    /// Serve an in-process simulator world over TCP
    Serve {
        #[arg(short, long, default_value = "127.0.0.1:10000")]
        listen: SocketAddr,
        /// Simulator keeps its per-kind ids across `world del all`
        #[arg(long)]
        monotonic: bool,
    },
    /// Run a YAML script of world operations
    Run {
        script: PathBuf,
        /// Client configuration (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Address of the world port, overriding the config name table
        #[arg(long)]
        connect: Option<SocketAddr>,
        /// Run against an in-process simulator instead of TCP
        #[arg(long, conflicts_with = "connect")]
        in_process: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let config = ClientConfig::default();
            println!("simworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("remote port: {}", config.controller.remote);
            println!("local prefix: {}", config.controller.local_prefix);
            println!("delete on close: {}", config.controller.delete_on_close);
            println!(
                "object kinds: {}",
                ObjectKind::ALL
                    .iter()
                    .map(|k| {
                        let fixed = if k.is_static() { ", static" } else { "" };
                        format!("{k}({}{fixed})", k.size_arity())
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            );
        }
        Commands::Demo { monotonic } => demo(policy(monotonic))?,
        Commands::Serve { listen, monotonic } => {
            let listener =
                TcpListener::bind(listen).with_context(|| format!("binding {listen}"))?;
            tracing::info!(%listen, ?monotonic, "serving simulator world");
            let world = SimWorld::with_policy(policy(monotonic)).without_event_log();
            simworld_transport::serve(listener, shared(world))?;
        }
        Commands::Run {
            script,
            config,
            connect,
            in_process,
        } => {
            let script = Script::load(&script)
                .with_context(|| format!("loading script {}", script.display()))?;
            let mut config = match config {
                Some(path) => ClientConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => ClientConfig::default(),
            };

            if in_process {
                let mut network = MemoryNetwork::new();
                network.register(
                    config.controller.remote_port_name()?,
                    shared(SimWorld::new()),
                );
                run_script(&mut network, &config.controller, &script)?;
            } else {
                if let Some(addr) = connect {
                    let remote = config.controller.remote_port_name()?;
                    config.tcp.names.insert(remote, addr);
                }
                let mut network = TcpNetwork::new(config.tcp.clone());
                run_script(&mut network, &config.controller, &script)?;
            }
        }
    }

    Ok(())
}

fn policy(monotonic: bool) -> CounterPolicy {
    if monotonic {
        CounterPolicy::Monotonic
    } else {
        CounterPolicy::ResetOnClear
    }
}

fn run_script<N: Network>(
    network: &mut N,
    config: &ControllerConfig,
    script: &Script,
) -> anyhow::Result<()> {
    let mut ctl = WorldController::open(network, config)?;
    tracing::info!(steps = script.steps.len(), remote = %ctl.remote(), "running script");
    for (i, step) in script.steps.iter().enumerate() {
        println!("[{i}] {step}: {}", step.run(&mut ctl));
    }
    println!("{}", ctl.registry().summary());
    ctl.close();
    Ok(())
}

fn demo(policy: CounterPolicy) -> anyhow::Result<()> {
    println!("World control demo: counter policy {policy:?}");

    let config = ControllerConfig::default();
    let mut network = MemoryNetwork::new();
    network.register(
        config.remote_port_name()?,
        shared(SimWorld::with_policy(policy)),
    );
    let mut ctl = WorldController::open(&mut network, &config)?;

    let table = ctl.create(
        ObjectKind::StaticBox,
        &[1.0, 1.0, 1.0],
        DVec3::new(0.0, 0.0, 1.0),
        Rgb::RED,
    )?;
    let ball = ctl.create(
        ObjectKind::Sphere,
        &[0.1],
        DVec3::new(0.0, 0.0, 0.5),
        Rgb::GREEN,
    )?;
    for handle in [table, ball] {
        let entry = ctl.lookup(handle)?;
        println!("Created {handle}: {} id={}", entry.kind, entry.sim_id);
    }

    let moved = ctl.move_object(ball, DVec3::new(0.2, 0.0, 0.5))?;
    println!("Move {ball}: {}", if moved { "OK" } else { "REJECTED" });
    let rotated = ctl.rotate_object(table, DVec3::new(0.0, 0.0, 45.0))?;
    println!("Rotate {table}: {}", if rotated { "OK" } else { "REJECTED" });
    let p = ctl.location(ball)?;
    println!("Location {ball}: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
    println!("{}", ctl.registry().summary());

    let cleared = ctl.delete_all()?;
    println!("Delete all: {}", if cleared { "OK" } else { "REJECTED" });

    // After a clear the registry expects ids to restart at 1.
    let again = ctl.create(ObjectKind::Sphere, &[0.1], DVec3::ZERO, Rgb::BLUE)?;
    let entry = ctl.lookup(again)?;
    let in_sync = ctl.move_object(again, DVec3::new(0.0, 0.0, 0.3))?;
    println!(
        "Recreated {again}: {} id={} in sync: {}",
        entry.kind,
        entry.sim_id,
        if in_sync { "YES" } else { "NO" }
    );

    ctl.close();
    Ok(())
}
