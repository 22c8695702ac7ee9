use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// coarse alert level derived from the environmental readings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Green,
    Yellow,
    Red,
}

impl AlertLevel {
    /// threshold rule, first match wins:
    /// - heat index >= 40 or wind >= 80 -> RED
    /// - heat index >= 32 or rain >= 30 -> YELLOW
    /// - everything else -> GREEN
    pub fn from_readings(heat_index: f64, wind: f64, rain: f64) -> Self {
        if heat_index >= 40.0 || wind >= 80.0 {
            AlertLevel::Red
        } else if heat_index >= 32.0 || rain >= 30.0 {
            AlertLevel::Yellow
        } else {
            AlertLevel::Green
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Green => "GREEN",
            AlertLevel::Yellow => "YELLOW",
            AlertLevel::Red => "RED",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// the single environmental state held by the service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalState {
    /// ambient temperature in celsius
    pub temperature: f64,
    /// wind speed in km/h
    pub wind: f64,
    /// rainfall, 0-100 scale
    pub rain: f64,
    /// reported heat index in celsius
    pub heat_index: f64,

    /// only ever written by `apply`
    pub alert_level: AlertLevel,

    /// language code used by listeners to pick the cue ("en", "es", ...)
    pub language: String,

    /// None until the first update
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for EnvironmentalState {
    fn default() -> Self {
        Self {
            temperature: 22.0,
            wind: 10.0,
            rain: 0.0,
            heat_index: 22.0,
            alert_level: AlertLevel::Green,
            language: "en".to_string(),
            last_updated: None,
        }
    }
}

impl EnvironmentalState {
    /// merge a partial update, then re-derive the level and stamp the time.
    /// fields absent from the update keep their current value.
    pub fn apply(&mut self, update: StateUpdate, now: DateTime<Utc>) {
        if let Some(t) = update.temperature {
            self.temperature = t;
        }
        if let Some(w) = update.wind {
            self.wind = w;
        }
        if let Some(r) = update.rain {
            self.rain = r;
        }
        if let Some(h) = update.heat_index {
            self.heat_index = h;
        }
        if let Some(lang) = update.language {
            self.language = lang;
        }

        self.alert_level = AlertLevel::from_readings(self.heat_index, self.wind, self.rain);
        self.last_updated = Some(now);
    }

    pub fn snapshot(&self) -> AlertSnapshot {
        AlertSnapshot {
            level: self.alert_level,
            language: self.language.clone(),
            last_updated: self.last_updated,
        }
    }
}

/// body of POST /simulate
/// every field is optional; null is the same as absent
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StateUpdate {
    pub temperature: Option<f64>,
    pub wind: Option<f64>,
    pub rain: Option<f64>,
    pub heat_index: Option<f64>,
    pub language: Option<String>,
}

/// body of GET /alert
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlertSnapshot {
    pub level: AlertLevel,
    pub language: String,
    pub last_updated: Option<DateTime<Utc>>,
}
