use apcusim::health::HealthStatus;
use apcusim::protocol::{
    parse_health_message, read_frame, subsystem_of, HealthMessage, ProtocolError, MAX_DATAGRAM_SIZE,
};
use clap::{App, Arg};
use colored::*;
use std::net::SocketAddr;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let matches = App::new("apcu-monitor")
        .version("0.1.0")
        .author("Space Systems Engineering Team")
        .about("🖥️  Health message receiver - prints validated updates from APCU simulators")
        .arg(
            Arg::with_name("bind")
                .short("b")
                .long("bind")
                .value_name("ADDR")
                .help("Address to listen on (TCP and UDP)")
                .takes_value(true)
                .default_value("127.0.0.1"),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Port to listen on (TCP and UDP)")
                .takes_value(true)
                .default_value("12345"),
        )
        .arg(
            Arg::with_name("raw")
                .long("raw")
                .help("Print accepted payloads as received instead of a summary line"),
        )
        .get_matches();

    let bind = matches.value_of("bind").unwrap_or("127.0.0.1");
    let port: u16 = matches.value_of("port").unwrap_or("12345").parse()?;
    let raw = matches.is_present("raw");
    let address = format!("{}:{}", bind, port);

    let listener = TcpListener::bind(&address).await?;
    let socket = UdpSocket::bind(&address).await?;
    info!("🌐 Listening for health messages on {} (TCP and UDP)", address);
    println!("{}", "📡 Waiting for component health updates (Press Ctrl+C to stop)...".bright_blue().bold());

    let tcp_server = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("🔗 Sender connected: {}", addr);
                    tokio::spawn(async move {
                        if let Err(e) = handle_stream(stream, addr, raw).await {
                            warn!("Sender {} error: {}", addr, e);
                        }
                        info!("🔌 Sender {} disconnected", addr);
                    });
                }
                Err(e) => error!("Failed to accept connection: {}", e),
            }
        }
    });

    let udp_server = tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            match socket.recv_from(&mut buf).await {
                Ok((len, addr)) => handle_payload(&buf[..len], addr, raw),
                Err(e) => error!("UDP receive failed: {}", e),
            }
        }
    });

    tokio::select! {
        _ = tcp_server => warn!("TCP server stopped"),
        _ = udp_server => warn!("UDP server stopped"),
        _ = tokio::signal::ctrl_c() => println!("\n  Shutting down monitor..."),
    }

    Ok(())
}

/// Newline-delimited frames; blank lines are skipped. An over-long frame
/// drops the connection.
async fn handle_stream(stream: TcpStream, addr: SocketAddr, raw: bool) -> Result<(), ProtocolError> {
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();

    while read_frame(&mut reader, &mut line).await? {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        handle_payload(&line, addr, raw);
    }
    Ok(())
}

fn handle_payload(data: &[u8], addr: SocketAddr, raw: bool) {
    match parse_health_message(data) {
        Ok(message) => {
            if raw {
                println!("{}", String::from_utf8_lossy(data).trim_end());
            } else {
                print_update(&message, subsystem_of(data).as_deref());
            }
        }
        Err(e) => warn!("Rejected message from {}: {}", addr, e),
    }
}

fn print_update(message: &HealthMessage, subsystem: Option<&str>) {
    let status = match message.status() {
        Some(HealthStatus::Operational) => "OPERATIONAL".bright_green(),
        Some(HealthStatus::Warning) => "WARNING".bright_yellow(),
        Some(HealthStatus::Degraded) => "DEGRADED".yellow(),
        Some(HealthStatus::Critical) => "CRITICAL".bright_red(),
        Some(HealthStatus::Offline) => "OFFLINE".dimmed(),
        None => message.color.as_str().normal(),
    };

    match subsystem {
        Some(name) => println!(
            "  {} / {:<24} {:>6.1}%  {}",
            message.component_id.bright_white(),
            name,
            message.size,
            status
        ),
        None => println!(
            "{} {:<27} {:>6.1}%  {}",
            "●".bright_cyan(),
            message.component_id.bright_white().bold(),
            message.size,
            status
        ),
    }
}
