//! LED Matrix Control Tool
//!
//! CLI for controlling the LED matrix daemon and feeding it frames.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ledmatrix_client::{ControlClient, FrameClient};
use ledmatrix_protocol::{Endpoint, DEFAULT_CONTROL_ENDPOINT, DEFAULT_FRAME_ENDPOINT};
use std::io::{ErrorKind, Read};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ledmatrixctl")]
#[command(about = "Control tool for the LED matrix daemon")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Control endpoint of the daemon
    #[arg(long, default_value = DEFAULT_CONTROL_ENDPOINT)]
    control_endpoint: Endpoint,

    /// Frame endpoint of the daemon
    #[arg(long, default_value = DEFAULT_FRAME_ENDPOINT)]
    frame_endpoint: Endpoint,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set or show the brightness
    Brightness {
        /// Brightness percentage (0-100, omit to show current)
        percent: Option<u8>,
    },
    /// Set or show the color temperature
    Temperature {
        /// Color temperature in Kelvin (2000-6500, omit to show current)
        kelvin: Option<u16>,
    },
    /// Show display information
    Info,
    /// Send raw frames read from stdin
    Pipe {
        /// Frame width in pixels (default: queried from the daemon)
        #[arg(long)]
        width: Option<u16>,

        /// Frame height in pixels (default: queried from the daemon)
        #[arg(long)]
        height: Option<u16>,

        /// Bytes per pixel of the daemon's configured pixel format
        #[arg(long, default_value = "4")]
        bytes_per_pixel: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Brightness { percent } => {
            handle_brightness(percent, &mut connect_control(&cli.control_endpoint)?)
        }
        Commands::Temperature { kelvin } => {
            handle_temperature(kelvin, &mut connect_control(&cli.control_endpoint)?)
        }
        Commands::Info => handle_info(&mut connect_control(&cli.control_endpoint)?),
        Commands::Pipe {
            width,
            height,
            bytes_per_pixel,
        } => handle_pipe(
            &cli.control_endpoint,
            &cli.frame_endpoint,
            width,
            height,
            bytes_per_pixel,
        ),
    }
}

fn connect_control(endpoint: &Endpoint) -> Result<ControlClient> {
    ControlClient::connect(endpoint).context("Failed to connect to daemon. Is ledmatrixd running?")
}

fn handle_brightness(percent: Option<u8>, client: &mut ControlClient) -> Result<()> {
    if let Some(percent) = percent {
        if percent > 100 {
            bail!("Brightness must be between 0 and 100");
        }
        client.set_brightness(percent)?;
        println!("Brightness set to: {}%", percent);
    } else {
        let current = client.get_brightness()?;
        println!("Current brightness: {}%", current);
    }
    Ok(())
}

fn handle_temperature(kelvin: Option<u16>, client: &mut ControlClient) -> Result<()> {
    if let Some(kelvin) = kelvin {
        if !(2000..=6500).contains(&kelvin) {
            bail!("Temperature must be between 2000 and 6500 Kelvin");
        }
        client.set_temperature(kelvin)?;
        println!("Temperature set to: {}K", kelvin);
    } else {
        let current = client.get_temperature()?;
        println!("Current temperature: {}K", current);
    }
    Ok(())
}

fn handle_info(client: &mut ControlClient) -> Result<()> {
    let (width, height) = client.get_configuration()?;
    let brightness = client.get_brightness()?;
    let temperature = client.get_temperature()?;
    println!("Display Status:");
    println!("  Size: {}x{}", width, height);
    println!("  Brightness: {}%", brightness);
    println!("  Temperature: {}K", temperature);
    Ok(())
}

fn handle_pipe(
    control: &Endpoint,
    frame: &Endpoint,
    width: Option<u16>,
    height: Option<u16>,
    bytes_per_pixel: usize,
) -> Result<()> {
    let (width, height) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (w, h) => {
            let (dw, dh) = connect_control(control)?.get_configuration()?;
            (w.unwrap_or(dw), h.unwrap_or(dh))
        }
    };
    let frame_len = width as usize * height as usize * bytes_per_pixel;
    if frame_len == 0 {
        bail!("Frame size must be greater than zero");
    }
    debug!("Piping {}x{} frames of {} bytes", width, height, frame_len);

    let mut client = FrameClient::connect(frame)
        .context("Failed to connect to daemon. Is ledmatrixd running?")?;
    let mut stdin = std::io::stdin().lock();
    let mut buf = vec![0u8; frame_len];
    let mut sent: u64 = 0;

    loop {
        let filled = fill(&mut stdin, &mut buf).context("Failed to read stdin")?;
        if filled < frame_len {
            if filled > 0 {
                warn!("Discarding trailing {} bytes of a partial frame", filled);
            }
            break;
        }
        client.send_frame(&buf)?;
        sent += 1;
    }

    println!("Sent {} frames", sent);
    Ok(())
}

/// Reads until `buf` is full or EOF, returning the number of bytes read.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
