use crate::advisor::CropAdvisor;
use crate::app_state::AppState;
use crate::config_loader::{load_config, AdvisorConfig};
use crate::errors::AdvisorError;
use crate::features::FeatureField;
use crate::input_validator::raw_input_from_pairs;
use crate::log_sink::init_tracing;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Top-level CLI interface for the crop advisor
#[derive(Parser, Debug)]
#[command(
    name = "crop_advisor",
    version,
    about = "Crop recommendation from soil nutrients and climate readings"
)]
pub struct Cli {
    /// TOML config file (defaults to crop_advisor.toml when present)
    #[arg(long, global = true, env = "CROP_ADVISOR_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Host/IP to bind, overrides server.host
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overrides server.port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Recommend a crop for one set of readings and print the result as JSON
    Recommend {
        /// Nitrogen, ppm
        #[arg(long = "nitrogen", short = 'n')]
        nitrogen: Option<String>,
        /// Phosphorus, ppm
        #[arg(long = "phosphorus", short = 'p')]
        phosphorus: Option<String>,
        /// Potassium, ppm
        #[arg(long = "potassium", short = 'k')]
        potassium: Option<String>,
        /// Air temperature, °C
        #[arg(long)]
        temperature: Option<String>,
        /// Relative humidity, %
        #[arg(long)]
        humidity: Option<String>,
        /// Soil pH
        #[arg(long)]
        ph: Option<String>,
        /// Rainfall, mm
        #[arg(long)]
        rainfall: Option<String>,
    },

    /// List the crops known to the catalog
    Crops,
}

pub fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    init_tracing(&config.logging.level);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(&config)
        }
        Commands::Recommend {
            nitrogen,
            phosphorus,
            potassium,
            temperature,
            humidity,
            ph,
            rainfall,
        } => {
            let values = [
                (FeatureField::Nitrogen, nitrogen),
                (FeatureField::Phosphorus, phosphorus),
                (FeatureField::Potassium, potassium),
                (FeatureField::Temperature, temperature),
                (FeatureField::Humidity, humidity),
                (FeatureField::Ph, ph),
                (FeatureField::Rainfall, rainfall),
            ];
            let pairs: HashMap<String, String> = values
                .into_iter()
                .filter_map(|(field, value)| value.map(|v| (field.key().to_string(), v)))
                .collect();

            let advisor = CropAdvisor::from_config(&config)?;
            let result = advisor.recommend(&raw_input_from_pairs(&pairs))?;
            let output = serde_json::to_string_pretty(&result)
                .map_err(|e| AdvisorError::serialization("recommendation output", e))?;
            println!("{output}");
            Ok(())
        }
        Commands::Crops => {
            let advisor = CropAdvisor::from_config(&config)?;
            for (name, profile) in advisor.catalog().iter() {
                println!(
                    "{name:<10} season={} soil={} ph={}",
                    profile.season, profile.soil_type, profile.ph_range
                );
            }
            Ok(())
        }
    }
}

fn serve(config: &AdvisorConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| AdvisorError::config(format!("invalid bind address {addr}: {e}")))?;

    let advisor = CropAdvisor::from_config(config)?;
    let state = AppState::new(advisor);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;
    rt.block_on(crate::web::serve(socket_addr, state))
}
