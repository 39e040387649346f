/* pointercfgctl CLI: clap-driven client that talks to pointercfgd over DBus to show the pointer
 * configuration, run operation codes and simulate key binding presses. */
mod dbus_client;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use dbus_client::PointerCfgClient;

/// pointercfgctl: tune a pointing device via the pointercfgd DBus daemon.
#[derive(Parser)]
#[command(name = "pointercfgctl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current configuration.
    Show {
        /// Print the raw JSON snapshot instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Run one operation, by name (e.g. cpi-up) or numeric code.
    Op {
        /// Operation name or code.
        op: String,
    },

    /// Simulate a key binding press carrying the given parameter.
    Press {
        /// Binding parameter (operation code).
        code: u32,
    },

    /// Write the current configuration to storage now.
    Save,

    /// Restore the configured defaults.
    Reset,
}

/* Operation names accepted by `op`, in code order starting at 1. */
const OP_NAMES: [&str; 13] = [
    "cpi-up",
    "cpi-down",
    "scroll-up",
    "scroll-down",
    "rotate-up",
    "rotate-down",
    "scaling",
    "reverse-h",
    "reverse-v",
    "layer1-up",
    "layer2-up",
    "reset",
    "save",
];

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = PointerCfgClient::connect()
        .await
        .context("Failed to connect to pointercfgd on org.pointercfg1")?;

    match cli.command {
        Commands::Show { json } => cmd_show(&client, json).await,
        Commands::Op { op } => cmd_op(&client, &op).await,
        Commands::Press { code } => cmd_press(&client, code).await,
        Commands::Save => cmd_save(&client).await,
        Commands::Reset => cmd_reset(&client).await,
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_show(client: &PointerCfgClient, json: bool) -> Result<()> {
    if json {
        println!("{}", client.get_snapshot().await?);
        return Ok(());
    }

    let cpi_index = client.get_cpi_index().await?;
    let cpi = client.get_cpi().await?;
    let sdiv_index = client.get_scroll_divisor_index().await?;
    let sdiv = client.get_scroll_divisor().await?;
    let rot_index = client.get_rotation_index().await?;
    let degrees = client.get_rotation_degrees().await?;
    let angles = client.get_rotation_angles().await.unwrap_or_default();
    let (layer1, layer2) = client.get_scroll_layers().await?;

    println!("CPI:             {} (index {})", cpi, cpi_index);
    println!("Scroll divisor:  {} (index {})", sdiv, sdiv_index);
    println!(
        "Rotation:        {}° (index {} of {})",
        degrees,
        rot_index,
        angles.len()
    );
    println!(
        "Scroll reverse:  h={} v={}",
        on_off(client.get_scroll_h_reverse().await?),
        on_off(client.get_scroll_v_reverse().await?)
    );
    println!(
        "Scaling:         {}",
        on_off(client.get_scaling_enabled().await?)
    );
    println!("Scroll layers:   {} {}", layer1, layer2);
    Ok(())
}

async fn cmd_op(client: &PointerCfgClient, op: &str) -> Result<()> {
    let code = parse_op(op)?;
    client.apply_op(code).await?;
    println!("Operation {} applied.", op);
    Ok(())
}

async fn cmd_press(client: &PointerCfgClient, code: u32) -> Result<()> {
    client.press(code).await?;
    println!("Binding {} pressed.", code);
    Ok(())
}

async fn cmd_save(client: &PointerCfgClient) -> Result<()> {
    client.save().await?;
    println!("Configuration saved.");
    Ok(())
}

async fn cmd_reset(client: &PointerCfgClient) -> Result<()> {
    client.reset().await?;
    println!("Configuration reset to defaults.");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

/* Numeric codes are passed through untouched so the daemon decides
 * whether they are supported. */
fn parse_op(s: &str) -> Result<u8> {
    if let Ok(code) = s.parse::<u8>() {
        return Ok(code);
    }
    let name = s.to_lowercase();
    match OP_NAMES.iter().position(|candidate| *candidate == name) {
        Some(pos) => Ok(pos as u8 + 1),
        None => anyhow::bail!(
            "Unknown operation '{}'. Use a code (0-255) or one of: {}",
            s,
            OP_NAMES.join(", ")
        ),
    }
}
