//! City name → forecast identifier lookup table.
//!
//! The table is an XML document whose `city` elements carry `title` and `id`
//! attributes. The canonical copy lives on the weather service; a bundled
//! local copy is used when the remote fetch fails. Loaded once per run,
//! read-only afterwards.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::{fs, path::Path};

use crate::config::Config;
use crate::error::WeatherError;

#[derive(Debug, Clone)]
struct CityEntry {
    title: String,
    id: String,
}

/// Ordered collection of `(title, id)` pairs; lookups are exact matches on
/// the title, first match wins.
#[derive(Debug, Clone)]
pub struct CityTable {
    entries: Vec<CityEntry>,
}

impl CityTable {
    /// Fetch the table from the configured remote URL, falling back to the
    /// bundled local copy. Both failing is fatal for the run.
    pub async fn load(config: &Config, http: &reqwest::Client) -> Result<Self, WeatherError> {
        match Self::fetch_remote(&config.city_table_url, http).await {
            Ok(table) => Ok(table),
            Err(err) => {
                tracing::warn!(error = %err, "remote city table unavailable, using local copy");
                Self::load_file(&config.city_table_fallback)
                    .map_err(|_| WeatherError::ConfigUnavailable)
            }
        }
    }

    async fn fetch_remote(url: &str, http: &reqwest::Client) -> Result<Self> {
        let response = http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch city table from {url}"))?
            .error_for_status()
            .context("City table request returned an error status")?;

        let xml = response.text().await.context("Failed to read city table body")?;
        Self::from_xml(&xml)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let xml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read city table file: {}", path.display()))?;
        Self::from_xml(&xml)
    }

    /// Parse the XML document, collecting every `city` element in document
    /// order. Entries without a `title` attribute are skipped; a missing `id`
    /// is kept as empty and rejected at lookup time.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut entries = Vec::new();
        loop {
            match reader.read_event().context("Failed to parse city table XML")? {
                Event::Start(e) | Event::Empty(e) => {
                    if e.name().as_ref() == b"city" {
                        if let Some(entry) = Self::read_entry(&e)? {
                            entries.push(entry);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self { entries })
    }

    fn read_entry(e: &BytesStart<'_>) -> Result<Option<CityEntry>> {
        let title = match e.try_get_attribute("title").context("Malformed city attributes")? {
            Some(attr) => attr.unescape_value().context("Malformed title attribute")?.into_owned(),
            None => return Ok(None),
        };
        let id = match e.try_get_attribute("id").context("Malformed city attributes")? {
            Some(attr) => attr.unescape_value().context("Malformed id attribute")?.into_owned(),
            None => String::new(),
        };

        Ok(Some(CityEntry { title, id }))
    }

    /// Resolve a city display name to its forecast identifier. Exact match,
    /// case-sensitive; an entry with an empty identifier counts as absent.
    pub fn resolve(&self, city: &str) -> Result<&str, WeatherError> {
        self.entries
            .iter()
            .find(|entry| entry.title == city)
            .filter(|entry| !entry.id.is_empty())
            .map(|entry| entry.id.as_str())
            .ok_or(WeatherError::CityNotFound)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
