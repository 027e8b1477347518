use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;
use envmon::protocol::{ControlCommand, ControlResponse, PublishedMessage, ServerMessage, StatusSnapshot};
use envmon::services::{ButtonId, SensorId};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "8080";
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult<()> {
    let matches = App::new("envmon")
        .version("0.1.0")
        .about("🌡️  Environmental monitor control client")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("host")
                .short("H")
                .long("host")
                .value_name("HOST")
                .help("Simulator host address")
                .takes_value(true)
                .default_value(DEFAULT_HOST)
                .global(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Simulator port")
                .takes_value(true)
                .default_value(DEFAULT_PORT)
                .global(true),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["json", "table"])
                .default_value("table")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("status")
                .about("📊 Show readings, connectivity, alerts and loop statistics"),
        )
        .subcommand(
            SubCommand::with_name("press")
                .about("🔘 Press a front-panel button")
                .arg(
                    Arg::with_name("button")
                        .help("Button to press")
                        .required(true)
                        .possible_values(&["previous", "next", "reconnect"]),
                ),
        )
        .subcommand(
            SubCommand::with_name("link")
                .about("📶 Force the Wi-Fi link up or down")
                .arg(
                    Arg::with_name("state")
                        .help("Link state")
                        .required(true)
                        .possible_values(&["up", "down"]),
                ),
        )
        .subcommand(
            SubCommand::with_name("broker")
                .about("📡 Make the MQTT broker reachable or unreachable")
                .arg(
                    Arg::with_name("state")
                        .help("Broker state")
                        .required(true)
                        .possible_values(&["up", "down"]),
                ),
        )
        .subcommand(
            SubCommand::with_name("sensor")
                .about("🧪 Fail or restore a simulated sensor")
                .arg(
                    Arg::with_name("sensor")
                        .help("Sensor")
                        .required(true)
                        .possible_values(&["temperature", "humidity", "pressure", "light"]),
                )
                .arg(
                    Arg::with_name("state")
                        .help("Sensor state")
                        .required(true)
                        .possible_values(&["fail", "restore"]),
                ),
        )
        .subcommand(
            SubCommand::with_name("monitor")
                .about("📈 Follow the published data and alert stream")
                .arg(
                    Arg::with_name("duration")
                        .short("d")
                        .long("duration")
                        .value_name("SECONDS")
                        .help("Monitor duration in seconds (default: infinite)")
                        .takes_value(true)
                        .validator(|v| match v.parse::<u64>() {
                            Ok(_) => Ok(()),
                            Err(_) => Err("Duration must be a whole number of seconds".into()),
                        }),
                ),
        )
        .get_matches();

    let host = matches.value_of("host").unwrap_or(DEFAULT_HOST);
    let port: u16 = matches.value_of("port").unwrap_or(DEFAULT_PORT).parse()?;
    let format = matches.value_of("format").unwrap_or("table");

    match matches.subcommand() {
        ("status", Some(_)) => handle_status(host, port, format).await,
        ("press", Some(sub)) => {
            let button = parse_button(sub.value_of("button").unwrap_or_default())?;
            let response = send_command(host, port, &ControlCommand::PressButton { button }).await?;
            print_command_result("Button", &format!("{:?}", button), &response, format);
            Ok(())
        }
        ("link", Some(sub)) => {
            let state = sub.value_of("state").unwrap_or_default();
            let command = ControlCommand::SetLink { up: state == "up" };
            let response = send_command(host, port, &command).await?;
            print_command_result("Wi-Fi link", state, &response, format);
            Ok(())
        }
        ("broker", Some(sub)) => {
            let state = sub.value_of("state").unwrap_or_default();
            let command = ControlCommand::SetBroker { available: state == "up" };
            let response = send_command(host, port, &command).await?;
            print_command_result("Broker", state, &response, format);
            Ok(())
        }
        ("sensor", Some(sub)) => handle_sensor(sub, host, port, format).await,
        ("monitor", Some(sub)) => {
            let duration = sub
                .value_of("duration")
                .map(str::parse::<u64>)
                .transpose()?
                .map(Duration::from_secs);
            handle_monitor(host, port, format, duration).await
        }
        _ => Ok(()),
    }
}

async fn handle_status(host: &str, port: u16, format: &str) -> CliResult<()> {
    let response = send_command(host, port, &ControlCommand::Status).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match &response.status {
        Some(status) => print_status_table(status),
        None => print_command_result("Status", "", &response, format),
    }
    Ok(())
}

async fn handle_sensor(matches: &ArgMatches<'_>, host: &str, port: u16, format: &str) -> CliResult<()> {
    let sensor = parse_sensor(matches.value_of("sensor").unwrap_or_default())?;
    let state = matches.value_of("state").unwrap_or_default();
    let command = ControlCommand::SetSensorFault {
        sensor,
        failed: state == "fail",
    };

    let response = send_command(host, port, &command).await?;
    print_command_result(&format!("{:?} sensor", sensor), state, &response, format);
    Ok(())
}

async fn handle_monitor(host: &str, port: u16, format: &str, duration: Option<Duration>) -> CliResult<()> {
    let follow = monitor_stream(host, port, format);
    match duration {
        Some(limit) => match tokio::time::timeout(limit, follow).await {
            Ok(result) => result,
            Err(_) => Ok(()),
        },
        None => follow.await,
    }
}

async fn monitor_stream(host: &str, port: u16, format: &str) -> CliResult<()> {
    let stream = connect(host, port).await?;
    let mut lines = BufReader::new(stream).lines();

    if format == "table" {
        println!("{}", "┌────────────────────────────────────────────────────────────────────┐".bright_white());
        println!("{}", "│                  🌡️  ENVIRONMENTAL MONITOR STREAM                   │".bright_blue().bold());
        println!("{}", "├────────────────────────────────────────────────────────────────────┤".bright_white());
    }

    while let Some(line) = lines.next_line().await? {
        if format == "json" {
            println!("{}", line);
            continue;
        }

        if let Ok(ServerMessage::Published(message)) = serde_json::from_str::<ServerMessage>(&line) {
            print_published_row(&message);
        }
    }

    Ok(())
}

async fn connect(host: &str, port: u16) -> CliResult<TcpStream> {
    let addr = format!("{}:{}", host, port);
    match TcpStream::connect(&addr).await {
        Ok(stream) => Ok(stream),
        Err(e) => {
            eprintln!("{} Failed to connect to simulator at {}", "❌".red(), addr.bright_white());

            if e.kind() == std::io::ErrorKind::ConnectionRefused {
                eprintln!("{} Simulator is not running. Start it with:", "💡".yellow());
                eprintln!("   {}", "cargo run --bin envmon-simulator".bright_cyan());
            } else {
                eprintln!("{} Network error: {}", "🔌".yellow(), e.to_string().bright_red());
            }

            Err(e.into())
        }
    }
}

/// Send one command and wait for its response, skipping streamed publishes.
async fn send_command(host: &str, port: u16, command: &ControlCommand) -> CliResult<ControlResponse> {
    let stream = connect(host, port).await?;
    let request = serde_json::to_string(command)?;

    match tokio::time::timeout(COMMAND_TIMEOUT, exchange(stream, &request)).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            eprintln!("{} Command timed out after {} seconds", "⏰".yellow(), COMMAND_TIMEOUT.as_secs());
            eprintln!("{} Simulator may be overloaded or unresponsive", "💡".yellow());
            Err("Command timeout".into())
        }
    }
}

async fn exchange(stream: TcpStream, request: &str) -> std::io::Result<ControlResponse> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    writer.write_all(request.as_bytes()).await?;
    writer.write_all(b"\n").await?;

    while let Some(line) = lines.next_line().await? {
        if let Ok(ServerMessage::Response(response)) = serde_json::from_str::<ServerMessage>(&line) {
            return Ok(response);
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "Server closed connection",
    ))
}

fn parse_button(name: &str) -> CliResult<ButtonId> {
    Ok(serde_json::from_value(serde_json::Value::String(name.into()))?)
}

fn parse_sensor(name: &str) -> CliResult<SensorId> {
    Ok(serde_json::from_value(serde_json::Value::String(name.into()))?)
}

fn print_command_result(action: &str, value: &str, response: &ControlResponse, format: &str) {
    if format == "json" {
        match serde_json::to_string(response) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{} {}", "❌".red(), e),
        }
        return;
    }

    if response.ok {
        match &response.message {
            Some(message) => println!("{} {}", "✅".green(), message.bright_cyan()),
            None => println!("{} {} set to {}", "✅".green(), action.bright_white(), value.bright_cyan()),
        }
    } else {
        let message = response.message.as_deref().unwrap_or("Command rejected");
        println!("{} {} failed: {}", "❌".red(), action.bright_white(), message.bright_red());
    }
}

fn print_status_table(status: &StatusSnapshot) {
    let reading = |value: Option<f32>, unit: &str| match value {
        Some(v) => format!("{:.1} {}", v, unit).bright_white(),
        None => "Falha".bright_red(),
    };
    let critical = |flag: bool| if flag { "CRITICO".bright_red() } else { "OK".bright_green() };
    let link = |up: bool| if up { "Conectado".bright_green() } else { "Desconectado".bright_red() };

    println!("{}", "📊 Monitor Status".bright_blue().bold());
    println!("   Uptime:        {} s", status.uptime_ms / 1000);
    println!("   Screen:        {:?}", status.menu);
    println!();
    println!("{}", "🌡️  Readings".bright_blue().bold());
    println!("   Temperature:   {}", reading(status.temperature_c, "°C"));
    println!("   Humidity:      {}", reading(status.humidity_pct, "%RH"));
    println!("   Pressure:      {}", reading(status.pressure_hpa, "hPa"));
    println!("   Light:         {}", reading(status.light_lux, "lux"));
    println!();
    println!("{}", "🚨 Alerts".bright_blue().bold());
    println!("   Temperature:   {}", critical(status.alerts.temperature_critical()));
    println!("   Humidity:      {}", critical(status.alerts.humidity_critical()));
    println!("   Light:         {}", critical(status.alerts.light_critical()));
    println!();
    println!("{}", "📶 Connectivity".bright_blue().bold());
    println!("   Wi-Fi:         {}", link(status.network));
    println!("   Broker:        {}", link(status.broker));
    println!();
    println!("{}", "⏱️  Loop".bright_blue().bold());
    println!("   Iterations:    {}", status.stats.iterations);
    println!("   Sensor faults: {}", status.stats.sensor_failures);
    println!(
        "   Publishes:     {} sent, {} dropped",
        status.stats.publishes_sent, status.stats.publishes_dropped
    );
    println!("   Max lateness:  {} ms", status.stats.max_lateness_ms);

    if !status.screen.is_empty() {
        println!();
        println!("{}", "🖥️  Display".bright_blue().bold());
        for line in &status.screen {
            println!("   │{:<20}│", line);
        }
    }
}

fn print_published_row(message: &PublishedMessage) {
    let topic = if message.topic.ends_with("alerts") {
        message.topic.bright_red()
    } else {
        message.topic.bright_cyan()
    };
    println!("│ {:<24} │ {}", topic, message.payload);
}
