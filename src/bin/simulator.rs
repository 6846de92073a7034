use apcusim::agent::{AgentStats, ApcuAgent, FrameKind, TickFrames};
use apcusim::config::{ComponentId, SimulationMode, SimulatorConfig, TransportKind};
use apcusim::health::HealthStatus;
use apcusim::protocol::FrameCodec;
use apcusim::state::ControllerState;
use apcusim::subsystems::{CheckResult, Subsystem, CHANNELS_PER_QUADRANT};
use clap::{App, Arg, ArgMatches};
use colored::*;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::time;
use tracing::{error, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(5);
const RECONNECT_BACKOFF_TICKS: u64 = 1;

enum Link {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

impl Link {
    async fn connect(config: &SimulatorConfig) -> std::io::Result<Self> {
        let address = config.address();
        match config.transport {
            TransportKind::Tcp => {
                let stream = time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&address))
                    .await
                    .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"))??;
                stream.set_nodelay(true)?;
                Ok(Link::Tcp(stream))
            }
            TransportKind::Udp => {
                let socket = UdpSocket::bind("0.0.0.0:0").await?;
                socket.connect(&address).await?;
                Ok(Link::Udp(socket))
            }
        }
    }

    async fn send(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self {
            Link::Tcp(stream) => stream.write_all(bytes).await,
            Link::Udp(socket) => socket.send(bytes).await.map(|_| ()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let matches = build_cli().get_matches();
    let config = config_from_matches(&matches)?;

    print_banner(&config);

    let mut agent = ApcuAgent::from_config(&config);
    let codec = *agent.codec();

    let mut link = match Link::connect(&config).await {
        Ok(link) => Some(link),
        Err(e) => {
            warn!("Connection to {} failed: {}. Retrying in {:?}", config.address(), e, INITIAL_RETRY_DELAY);
            time::sleep(INITIAL_RETRY_DELAY).await;
            match Link::connect(&config).await {
                Ok(link) => Some(link),
                Err(e) => {
                    error!("Could not connect to {}: {}", config.address(), e);
                    return Err(e.into());
                }
            }
        }
    };
    info!("Connected to {} over {:?}", config.address(), config.transport);

    agent.start();

    let mut interval = time::interval(Duration::from_millis(config.interval_ms));
    let mut last_reconnect_tick = 0u64;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                println!("\n  Shutting down APCU simulator...");
                agent.stop();
            }
        }

        if !agent.is_running() {
            break;
        }

        let frames = match agent.update() {
            Ok(Some(frames)) => frames,
            Ok(None) => continue,
            Err(e) => {
                error!("Agent error: {}", e);
                break;
            }
        };

        let tick = agent.stats().ticks;
        if link.is_none() && tick.saturating_sub(last_reconnect_tick) >= RECONNECT_BACKOFF_TICKS {
            last_reconnect_tick = tick;
            match Link::connect(&config).await {
                Ok(new_link) => {
                    info!("Reconnected to {}", config.address());
                    link = Some(new_link);
                }
                Err(e) => warn!("Reconnect to {} failed: {}", config.address(), e),
            }
        }

        if let Some(active) = link.as_mut() {
            if let Err(e) = transmit(active, &codec, &frames).await {
                warn!("Send failed, dropping link: {}", e);
                link = None;
            }
        }

        if config.verbose {
            print_status(agent.state(), agent.stats(), link.is_some());
        }
    }

    println!("  APCU simulator stopped after {} ticks", agent.stats().ticks);
    Ok(())
}

/// Send one tick's frames in order; the first failure abandons the rest.
async fn transmit(link: &mut Link, codec: &FrameCodec, frames: &TickFrames) -> std::io::Result<()> {
    for frame in frames.iter() {
        link.send(&codec.frame(&frame.payload)).await.map_err(|e| {
            let label = match frame.kind {
                FrameKind::Health => "Health".to_string(),
                FrameKind::Subsystem(id) => format!("Subsystem[{}]", id.display_name()),
                FrameKind::FullTelemetry => "Full Telemetry".to_string(),
            };
            std::io::Error::new(e.kind(), format!("{}: {}", label, e))
        })?;
    }
    Ok(())
}

fn build_cli() -> App<'static, 'static> {
    App::new("apcu-simulator")
        .version("0.1.0")
        .author("Space Systems Engineering Team")
        .about("📡 APCU antenna system simulator - streams component health and telemetry")
        .arg(
            Arg::with_name("component_id")
                .help("Component ID (must match the canvas ID, e.g. component_1)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("host")
                .long("host")
                .value_name("HOST")
                .help("Server host")
                .takes_value(true)
                .default_value("localhost"),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .takes_value(true)
                .default_value("12345"),
        )
        .arg(
            Arg::with_name("interval")
                .short("i")
                .long("interval")
                .value_name("SECONDS")
                .help("Update interval in seconds")
                .takes_value(true)
                .default_value("2.0"),
        )
        .arg(
            Arg::with_name("mode")
                .short("m")
                .long("mode")
                .value_name("MODE")
                .help("Simulation mode")
                .takes_value(true)
                .possible_values(&["nominal", "degraded", "critical"])
                .default_value("nominal"),
        )
        .arg(
            Arg::with_name("transport")
                .short("t")
                .long("transport")
                .value_name("TRANSPORT")
                .help("Transport: newline-delimited TCP stream or one datagram per message")
                .takes_value(true)
                .possible_values(&["tcp", "udp"])
                .default_value("tcp"),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .value_name("SEED")
                .help("Seed the random source for a reproducible run")
                .takes_value(true)
                .validator(|v| match v.parse::<u64>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Seed must be an unsigned integer".into()),
                }),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .help("Suppress the per-tick status board"),
        )
        .arg(
            Arg::with_name("no-telemetry")
                .long("no-telemetry")
                .help("Disable full telemetry, send basic and subsystem health only"),
        )
}

fn config_from_matches(matches: &ArgMatches<'_>) -> Result<SimulatorConfig, Box<dyn std::error::Error>> {
    let component_id = ComponentId::new(matches.value_of("component_id").unwrap_or_default())?;
    let mut config = SimulatorConfig::new(component_id);

    if let Some(host) = matches.value_of("host") {
        config.host = host.to_string();
    }
    if let Some(port) = matches.value_of("port") {
        config.port = port.parse()?;
    }
    if let Some(interval) = matches.value_of("interval") {
        config.set_interval_secs(interval.parse()?)?;
    }
    if let Some(mode) = matches.value_of("mode") {
        config.mode = mode.parse::<SimulationMode>()?;
    }
    if let Some(transport) = matches.value_of("transport") {
        config.transport = transport.parse::<TransportKind>()?;
    }
    if let Some(seed) = matches.value_of("seed") {
        config.seed = Some(seed.parse()?);
    }
    config.verbose = !matches.is_present("quiet");
    config.full_telemetry = !matches.is_present("no-telemetry");

    config.validate()?;
    Ok(config)
}

fn print_banner(config: &SimulatorConfig) {
    let rule = "=".repeat(60);
    println!("\n{}", rule);
    println!("  {}", "APCU ANTENNA SYSTEM SIMULATOR".bold());
    println!("{}", rule);
    println!("  Component ID : {}", config.component_id);
    println!("  Target       : {} ({:?})", config.address(), config.transport);
    println!("  Mode         : {}", config.mode.as_str());
    println!("  Interval     : {:.1}s", config.interval_ms as f64 / 1000.0);
    println!("  Telemetry    : {}", if config.full_telemetry { "Full" } else { "Basic" });
    if let Some(seed) = config.seed {
        println!("  Seed         : {}", seed);
    }
    println!("{}\n", rule);
}

fn paint_status(status: HealthStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        HealthStatus::Operational => label.bright_green(),
        HealthStatus::Warning => label.bright_yellow(),
        HealthStatus::Degraded => label.yellow(),
        HealthStatus::Critical => label.bright_red(),
        HealthStatus::Offline => label.dimmed(),
    }
}

fn up_down(up: bool) -> ColoredString {
    if up {
        "UP".green()
    } else {
        "DN".red()
    }
}

fn pass_fail(result: CheckResult) -> ColoredString {
    match result {
        CheckResult::Pass => "Pass".green(),
        CheckResult::Fail => "Fail".red(),
    }
}

fn print_status(state: &ControllerState, stats: &AgentStats, connected: bool) {
    let controller = state.controller();
    let thermal = state.thermal().get_state();
    let board = state.board_status().get_state();
    let mode = state.mode_status();
    let links = controller.link_status();

    println!("\n{}", "=".repeat(72));
    println!(
        "  APCU 4 Left [V1.0.0]   Component: {}   Tick: {}   Link: {}",
        state.component_id(),
        stats.ticks,
        if connected { "connected".green() } else { "disconnected".red() }
    );
    println!("{}", "=".repeat(72));
    println!(
        "  Array Voltage: {:6.2} V   Array Current: {:5.2} A   Overall Health: {:5.1}% [{}]",
        controller.array_voltage(),
        controller.array_current(),
        stats.overall_health,
        paint_status(stats.last_status)
    );
    println!(
        "  Links: Q0={}  Q1={}  Q2={}  Q3={}  Seq: {}",
        up_down(links[0]),
        up_down(links[1]),
        up_down(links[2]),
        up_down(links[3]),
        if controller.sequence_on() { "ON" } else { "OFF" }
    );
    println!(
        "\n  Temperature:  A={:.1}°C  B={:.1}°C  C={:.1}°C  [{:?}]",
        thermal.sensor_a_c, thermal.sensor_b_c, thermal.sensor_c_c, thermal.status
    );
    println!(
        "  Board Data:   Vin={:.2}V  Iin={:.2}A",
        state.board_data().input_voltage(),
        state.board_data().input_current()
    );
    println!(
        "  Board Status: CRC_UF={}  CRC_FF={}  CRC_PF={}  CBIT={}  PBIT={}  BSC={}",
        pass_fail(board.crc_user_flash),
        pass_fail(board.crc_factory_flash),
        pass_fail(board.crc_program_flash),
        pass_fail(board.cbit),
        pass_fail(board.pbit),
        pass_fail(board.board_setting_check)
    );
    println!(
        "  Mode: {:?}  InputV: {:?}  Reset: {:?}  Degradation: {:.3}",
        mode.operating,
        mode.loss_of_input_voltage,
        mode.reset_source,
        state.degradation()
    );

    for quadrant in state.quadrants() {
        println!(
            "\n  {}  Active: {}/{}  Tripped: {}  Faulted: {}  Health: {:.1}%",
            quadrant.name().bold(),
            quadrant.active_count(),
            CHANNELS_PER_QUADRANT,
            quadrant.tripped_count(),
            quadrant.faulted_count(),
            quadrant.health_score()
        );
    }

    println!(
        "\n  QTRMs Health: {:.1}%  AQC Health: {:.1}%",
        state.qtrm_health(),
        state.aqc_health()
    );
    println!("{}", "─".repeat(72));
}
