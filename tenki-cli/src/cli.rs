use std::fs;

use anyhow::Result;
use clap::Parser;
use tenki_core::{CityTable, Config, WeatherClient, WeatherError};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "tenki",
    version,
    about = "Fetch a city's weather forecast and write it as HTML"
)]
pub struct Cli {
    /// City to get the weather for.
    #[arg(short, long)]
    pub city: String,

    /// Filename of the HTML file to write the forecast to
    /// (".html" is appended if missing).
    #[arg(short, long)]
    pub file: String,

    /// Include the long-form weather description.
    #[arg(short, long)]
    pub detail: bool,

    /// Number of retries if the service is not available.
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Seconds to wait before retrying.
    #[arg(short, long)]
    pub seconds: Option<u64>,

    /// Upper bound for a server-suggested wait; suggestions at or above it
    /// fall back to the fixed wait.
    #[arg(short = 'm', long = "max-seconds")]
    pub max_seconds: Option<u64>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;
        if let Some(retries) = self.retries {
            config.retry_count = retries;
        }
        if let Some(seconds) = self.seconds {
            config.seconds_before_retry = seconds;
        }
        if let Some(max_seconds) = self.max_seconds {
            config.max_seconds_before_retry = max_seconds;
        }

        let client = WeatherClient::new(config.clone())?;

        // Domain failures are a single console line, never a stack trace,
        // and never a written output file.
        if let Err(err) = self.fetch_and_print(&config, &client).await {
            println!("{err}");
        }

        Ok(())
    }

    async fn fetch_and_print(
        &self,
        config: &Config,
        client: &WeatherClient,
    ) -> Result<(), WeatherError> {
        let table = CityTable::load(config, client.http()).await?;
        let city_id = table.resolve(&self.city)?;
        let report = client.get_weather(city_id).await?;
        tracing::debug!(city_id, published = ?report.published_at(), "forecast received");

        println!("{}", report.to_text(self.detail));

        let path = html_path(&self.file);
        if let Err(err) = fs::write(&path, report.to_html(self.detail)) {
            tracing::debug!(error = %err, path = %path, "writing the forecast file failed");
            println!("Could not write to file");
        }

        Ok(())
    }
}

fn html_path(file: &str) -> String {
    if file.ends_with(".html") {
        file.to_string()
    } else {
        format!("{file}.html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_suffix_is_appended_once() {
        assert_eq!(html_path("out"), "out.html");
        assert_eq!(html_path("out.html"), "out.html");
        assert_eq!(html_path("out.txt"), "out.txt.html");
    }

    #[test]
    fn parses_required_and_optional_flags() {
        let cli = Cli::try_parse_from([
            "tenki", "-c", "青森", "-f", "weather", "-d", "-r", "1", "-s", "2", "-m", "3",
        ])
        .expect("full flag set must parse");

        assert_eq!(cli.city, "青森");
        assert_eq!(cli.file, "weather");
        assert!(cli.detail);
        assert_eq!(cli.retries, Some(1));
        assert_eq!(cli.seconds, Some(2));
        assert_eq!(cli.max_seconds, Some(3));
    }

    #[test]
    fn optional_flags_default_to_none() {
        let cli = Cli::try_parse_from(["tenki", "-c", "青森", "-f", "weather"])
            .expect("minimal flag set must parse");

        assert!(!cli.detail);
        assert_eq!(cli.retries, None);
        assert_eq!(cli.seconds, None);
        assert_eq!(cli.max_seconds, None);
    }

    #[test]
    fn missing_required_flags_are_rejected() {
        assert!(Cli::try_parse_from(["tenki", "-c", "青森"]).is_err());
        assert!(Cli::try_parse_from(["tenki", "-f", "weather"]).is_err());
        assert!(Cli::try_parse_from(["tenki", "-c", "青森", "-f", "w", "--bogus"]).is_err());
    }
}
