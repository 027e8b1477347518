use clap::{App, Arg};
use envmon::clock::{Clock, ManualClock, SystemClock};
use envmon::config::MonitorConfig;
use envmon::protocol::{self, ControlCommand, ControlResponse, ServerMessage};
use envmon::sim::{self, SimLink, SimMonitor};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: &str = "8080";
const LOOP_PERIOD_MS: u64 = 1;
const PUBLISH_BROADCAST_BUFFER_SIZE: usize = 256;
const CONTROL_QUEUE_SIZE: usize = 32;

type ControlRequest = (ControlCommand, oneshot::Sender<ControlResponse>);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("envmon-simulator")
        .version("0.1.0")
        .about("Hosted environmental monitor with simulated sensors, network and broker")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Control and publish stream port")
                .takes_value(true)
                .default_value(DEFAULT_PORT),
        )
        .arg(
            Arg::with_name("scripted")
                .long("scripted")
                .value_name("SECONDS")
                .help("Run on a simulated clock for SECONDS and print every publish, without a server")
                .takes_value(true)
                .validator(|v| match v.parse::<u64>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Duration must be a whole number of seconds".into()),
                }),
        )
        .get_matches();

    let config = match matches.value_of("config") {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(seconds) = matches.value_of("scripted") {
        run_scripted(config, seconds.parse()?);
        return Ok(());
    }

    let port: u16 = matches.value_of("port").unwrap_or(DEFAULT_PORT).parse()?;

    println!("🌡️  Environmental Monitor Simulator");
    println!("===================================");

    let (publish_tx, _) = broadcast::channel(PUBLISH_BROADCAST_BUFFER_SIZE);
    let (control_tx, mut control_rx) = mpsc::channel::<ControlRequest>(CONTROL_QUEUE_SIZE);

    let tcp_publish_tx = publish_tx.clone();
    let tcp_server = tokio::spawn(async move {
        if let Err(e) = start_tcp_server(port, control_tx, tcp_publish_tx).await {
            error!("TCP server error: {}", e);
        }
    });

    // The monitor is single-threaded and stays on this task
    let link = SimLink::connected();
    let mut monitor = sim::build(config, SystemClock::new(), link.clone());

    let mut interval = time::interval(Duration::from_millis(LOOP_PERIOD_MS));
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                monitor.tick();
                forward_publishes(&link, &publish_tx);
            }
            Some((command, reply)) = control_rx.recv() => {
                let response = sim::apply_control(&mut monitor, &link, command);
                let _ = reply.send(response);
            }
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
        }
    }

    tcp_server.abort();
    let stats = monitor.stats();
    println!(
        "🛑 Simulator stopped after {} iterations ({} publishes sent, {} dropped)",
        stats.iterations, stats.publishes_sent, stats.publishes_dropped
    );

    Ok(())
}

fn forward_publishes(link: &SimLink, publish_tx: &broadcast::Sender<String>) {
    for message in link.drain() {
        info!("📡 {}: {}", message.topic, message.payload);
        match protocol::encode(&ServerMessage::Published(message)) {
            // No subscribers is not an error
            Ok(line) => {
                let _ = publish_tx.send(line);
            }
            Err(e) => warn!("Failed to encode publish: {}", e),
        }
    }
}

/// Advance a manual clock one loop period at a time and print what the
/// broker accepted.
fn run_scripted(config: MonitorConfig, seconds: u64) {
    let clock = ManualClock::new();
    let link = SimLink::connected();
    let mut monitor: SimMonitor<ManualClock> = sim::build(config, clock.clone(), link.clone());

    let end = seconds.saturating_mul(1_000);
    while clock.now().as_millis() < end {
        clock.advance_ms(LOOP_PERIOD_MS);
        monitor.tick();
        for message in link.drain() {
            println!("[{:>8} ms] {} {}", clock.now().as_millis(), message.topic, message.payload);
        }
    }

    match serde_json::to_string_pretty(monitor.stats()) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Failed to encode loop statistics: {}", e),
    }
}

async fn start_tcp_server(
    port: u16,
    control_tx: mpsc::Sender<ControlRequest>,
    publish_tx: broadcast::Sender<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    info!("🌐 TCP server listening on port {}", port);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("🔗 New client connected: {}", addr);
                let client_control_tx = control_tx.clone();
                let client_publish_rx = publish_tx.subscribe();

                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, client_control_tx, client_publish_rx).await {
                        warn!("Client {} error: {}", addr, e);
                    }
                    info!("🔌 Client {} disconnected", addr);
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_client(
    stream: TcpStream,
    control_tx: mpsc::Sender<ControlRequest>,
    mut publish_rx: broadcast::Receiver<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (reader, writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);

    // Responses and streamed publishes share the writer
    let (line_tx, mut line_rx) = mpsc::channel::<String>(PUBLISH_BROADCAST_BUFFER_SIZE);

    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(line) = line_rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
            {
                break;
            }
        }
    });

    let stream_tx = line_tx.clone();
    let stream_task = tokio::spawn(async move {
        loop {
            match publish_rx.recv().await {
                Ok(line) => {
                    if stream_tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Client lagging, {} publishes skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut line = String::new();
    loop {
        line.clear();
        if buf_reader.read_line(&mut line).await? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let response = match protocol::parse_command(&line) {
            Ok(command) => {
                let (reply_tx, reply_rx) = oneshot::channel();
                control_tx
                    .send((command, reply_tx))
                    .await
                    .map_err(|_| "monitor stopped")?;
                reply_rx
                    .await
                    .unwrap_or_else(|_| ControlResponse::error("monitor stopped"))
            }
            Err(e) => {
                warn!("Failed to parse command: {}", e);
                ControlResponse::error(format!("Invalid command format: {}", e))
            }
        };

        let encoded = protocol::encode(&ServerMessage::Response(response))?;
        info!("📤 Sent response: {}", encoded);
        if line_tx.send(encoded).await.is_err() {
            break;
        }
    }

    stream_task.abort();
    drop(line_tx);
    let _ = writer_task.await;
    Ok(())
}
