use anyhow::Context;
use clap::{Parser, Subcommand};
use citylookup_core::{CityLookup, CityQuery, Config};
use inquire::{Password, PasswordDisplayMode};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "citylookup", version, about = "Look up a city's location, weather and local time")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Validate a city and show its location, weather and local time.
    Show {
        /// City name, e.g. "Springfield".
        city: String,

        /// Print the full report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Print where the config file lives.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure()?,
            Command::Show { city, json } => show(&city, json).await?,
            Command::ConfigPath => println!("{}", Config::config_file_path()?.display()),
        }

        Ok(())
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message("https://home.openweathermap.org/api_keys")
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.set_api_key(api_key.to_string());
    config.save()?;

    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(city: &str, json: bool) -> anyhow::Result<()> {
    let query = CityQuery::new(city)?;
    let config = Config::load()?;
    let lookup = CityLookup::from_config(&config)?;

    let report = lookup.run(&query).await;

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{out}");
    } else {
        print!("{}", render::ReportView(&report));
    }

    Ok(())
}
