use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use glam::Vec3;

use s2net::SchemaRegistry;
use s2net::net::DEFAULT_PORT;
use s2net::session::{
    ClientConfig, ClientEvent, GameClient, MapDirectoryLoader, SessionState,
};

#[derive(Parser)]
#[command(name = "s2client")]
#[command(about = "Headless game client")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value_t = 0)]
    account: u32,

    #[arg(long, default_value = "")]
    password: String,

    #[arg(short, long, help = "Client config (TOML)")]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "schemas/types.toml", help = "Entity type table (TOML)")]
    schema: PathBuf,

    #[arg(long, default_value_t = 100, help = "Update rate in Hz")]
    tick_rate: u32,

    #[arg(long, help = "Chat message to send once in game")]
    say: Option<String>,

    #[arg(long, value_parser = parse_vec3, help = "Walk towards x,y,z once playing")]
    walk_to: Option<Vec3>,
}

fn parse_vec3(text: &str) -> Result<Vec3, String> {
    let parts: Vec<f32> = text
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| e.to_string()))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err("expected x,y,z".to_string()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ClientConfig::default(),
    };
    let schemas = SchemaRegistry::load(&args.schema)
        .with_context(|| format!("loading entity types {}", args.schema.display()))?;
    log::info!("Loaded {} entity types", schemas.len());

    let loader = MapDirectoryLoader::new(&config.maps_dir);
    let mut client: GameClient = GameClient::new(config, Arc::new(schemas), loader, args.account);

    let server = format!("{}:{}", args.host, args.port);
    if !client.connect_udp(server.as_str(), &args.password)? {
        bail!("no answer from {}", server);
    }

    let tick = Duration::from_secs(1) / args.tick_rate.max(1);
    let mut said = false;

    loop {
        client.update()?;

        for event in client.drain_events() {
            match event {
                ClientEvent::StateChanged { to, .. } => log::info!("State: {}", to),
                ClientEvent::Disconnected { reason, message } => {
                    log::warn!("Disconnected ({}): {}", reason.as_str(), message);
                }
                ClientEvent::WorldDownloadProgress { received, total } => {
                    log::debug!("World download {}/{}", received, total);
                }
                other => log::debug!("{:?}", other),
            }
        }

        if client.state() == SessionState::Disconnected {
            break;
        }

        if !said && client.is_in_game() {
            if let Some(message) = &args.say {
                client.chat_all(message)?;
            }
            said = true;
        }

        if client.state() == SessionState::Playing {
            if let Some(target) = args.walk_to {
                client.move_towards(target);
            }
        }

        std::thread::sleep(tick);
    }

    if let Some(stats) = client.net_stats() {
        log::info!(
            "Sent {} snapshots, received {} ({} packets in, {} out)",
            client.sent_snapshots(),
            client.received_snapshots(),
            stats.packets_received,
            stats.packets_sent
        );
    }
    Ok(())
}
