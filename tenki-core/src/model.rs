//! Forecast report model: the JSON shape returned by the weather endpoint,
//! plus its plain-text and HTML renderings.
//!
//! Every payload field is optional in practice. Rendering never fails on an
//! absent field; missing pieces are simply left out of the output.

use chrono::{DateTime, FixedOffset};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::WeatherError;

/// Timestamps come back as `2017-04-04T17:00:00+0900` (no colon in the
/// offset), which is not RFC 3339, so they are carried as opaque strings and
/// parsed on demand.
const PUBLIC_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WeatherReport {
    /// HTTP status of the transport attempt that produced this report. Not
    /// part of the payload; lets callers tell "empty because the server
    /// errored" apart from "empty fields".
    #[serde(skip)]
    pub status: u16,

    pub title: String,
    pub link: String,
    #[serde(rename = "publicTime")]
    pub public_time: String,
    pub description: Description,
    pub location: Location,
    pub forecasts: Vec<Forecast>,
    #[serde(rename = "pinpointLocations")]
    pub pinpoint_locations: Vec<PinpointLocation>,
    pub copyright: Option<Copyright>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Description {
    pub text: String,
    #[serde(rename = "publicTime")]
    pub public_time: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Location {
    pub area: Option<String>,
    pub prefecture: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Forecast {
    pub date: String,
    #[serde(rename = "dateLabel")]
    pub date_label: String,
    pub telop: String,
    pub image: Option<Image>,
    pub temperature: Option<Temperature>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Image {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Temperature {
    pub min: Option<Degree>,
    pub max: Option<Degree>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Degree {
    pub celsius: String,
    pub fahrenheit: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PinpointLocation {
    pub link: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Copyright {
    pub title: String,
    pub link: String,
}

impl WeatherReport {
    /// Turn one transport-level response into a report.
    ///
    /// A 200 body is deserialized; malformed JSON is a hard failure. Any
    /// other status yields an empty payload that still carries the status,
    /// so the caller's retry classification sees the same data either way.
    pub fn from_http(status: StatusCode, body: &str) -> Result<Self, WeatherError> {
        if status == StatusCode::OK {
            let mut report: WeatherReport = serde_json::from_str(body).map_err(|err| {
                tracing::debug!(error = %err, "forecast body did not deserialize");
                WeatherError::RequestFailed("Could not get weather information".to_string())
            })?;
            report.status = status.as_u16();
            Ok(report)
        } else {
            Ok(WeatherReport { status: status.as_u16(), ..Self::default() })
        }
    }

    /// Publication time as a typed timestamp, when the provider string is
    /// well-formed.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_str(&self.public_time, PUBLIC_TIME_FORMAT).ok()
    }

    pub fn to_text(&self, detail: bool) -> String {
        self.render(false, detail)
    }

    pub fn to_html(&self, detail: bool) -> String {
        self.render(true, detail)
    }

    fn render(&self, html: bool, detail: bool) -> String {
        let separator = match (html, detail) {
            (true, true) => "\n<br><br>",
            (false, true) => "\n\n",
            (true, false) => "<br>\n",
            (false, false) => "\n",
        };

        let mut out = String::new();

        if self.title.is_empty() {
            out.push_str(&self.backup_title());
        } else {
            out.push_str(&self.title);
        }
        out.push_str(separator);

        if !self.forecasts.is_empty() {
            if html {
                out.push_str("<table>\n");
            }
            for forecast in &self.forecasts {
                let row = forecast.render(html);
                if !row.is_empty() {
                    out.push_str(&row);
                    if !html {
                        out.push_str(separator);
                    }
                }
            }
            if html {
                out.push_str("</table>");
                out.push_str(separator);
            }
        }

        if detail {
            let description = self.description.render(html);
            if !description.is_empty() {
                out.push_str(&description);
                out.push_str(separator);
            }
        }

        if !self.link.is_empty() {
            if html {
                out.push_str(&format!(
                    "あなたは <a href=\"{}\">ここで</a> ぴったりの 情報を 見つけられるでしょう。",
                    self.link
                ));
            } else {
                out.push_str(&format!(
                    "あなたは {}で ぴったりの 情報を 見つけられるでしょう。",
                    self.link
                ));
            }
        }

        out
    }

    /// Alternative title built from the location when the payload has none.
    fn backup_title(&self) -> String {
        let city = self.location.city.as_deref().unwrap_or("the requested city");

        let mut region = Vec::new();
        if let Some(prefecture) = self.location.prefecture.as_deref() {
            if !prefecture.is_empty() {
                region.push(prefecture);
            }
        }
        if let Some(area) = self.location.area.as_deref() {
            if !area.is_empty() {
                region.push(area);
            }
        }

        if region.is_empty() {
            format!("Weather forecast for {city}:")
        } else {
            format!("Weather forecast for {city} ({}):", region.join(", "))
        }
    }
}

impl Forecast {
    fn render(&self, html: bool) -> String {
        let mut text = String::new();
        if !self.telop.is_empty() {
            text.push_str(&format!("{}の天気: {}。 ", self.date_label, self.telop));
        }
        if let Some(temperature) = &self.temperature {
            text.push_str(&temperature.render());
        }

        if text.is_empty() || !html {
            return text;
        }

        let mut row = String::from("<tr>\n<td>\n");
        row.push_str(&text);
        row.push('\n');
        row.push_str("</td>\n<td>\n");
        if let Some(image) = &self.image {
            if !image.url.is_empty() {
                row.push_str(&format!(
                    "<img src=\"{}\" alt=\"{}\">\n",
                    image.url, image.title
                ));
            }
        }
        row.push_str("</td>\n</tr>");
        row
    }
}

impl Temperature {
    fn render(&self) -> String {
        if self.min.is_none() && self.max.is_none() {
            return String::new();
        }

        let mut out = String::new();
        if let Some(min) = &self.min {
            out.push_str(&format!("最低気温{}°C", min.celsius));
            if self.max.is_some() {
                out.push(',');
            } else {
                out.push_str("です。");
            }
        }
        if let Some(max) = &self.max {
            out.push_str(&format!("最高気温{}°Cです。", max.celsius));
        }
        out
    }
}

impl Description {
    fn render(&self, html: bool) -> String {
        if self.text.is_empty() {
            return String::new();
        }

        if html {
            escape_html(&self.text).replace('\n', "\n<br>")
        } else {
            self.text.clone()
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
