//! Soil-humidity sensor client and spoken report templates

use std::time::Duration;

use crate::{Error, Result};

/// Reading returned by the sensor's humidity endpoint
#[derive(Debug, serde::Deserialize)]
struct HumidityReading {
    humidity: i64,
}

/// Polls a network soil-humidity sensor
pub struct SensorClient {
    client: reqwest::Client,
    url: String,
}

impl SensorClient {
    /// Create a sensor client with a bounded request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    /// Read the current humidity percentage
    ///
    /// # Errors
    ///
    /// Returns error on timeout, a non-success status, or a malformed body
    pub async fn read_humidity(&self) -> Result<i64> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            tracing::error!(error = %e, url = %self.url, "sensor request failed");
            Error::Sensor(format!("no se pudo conectar al sensor: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "sensor returned non-success status");
            return Err(Error::Sensor(format!("sensor respondió con estado {status}")));
        }

        let reading: HumidityReading = response
            .json()
            .await
            .map_err(|e| Error::Sensor(format!("lectura de humedad inválida: {e}")))?;

        tracing::info!(humidity = reading.humidity, "humidity read");
        Ok(reading.humidity)
    }
}

/// Severity band for a humidity percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumidityLevel {
    /// Below 20%: emergency, irrigate immediately
    SevereDry,
    /// Below 50%: irrigation needed soon
    NeedsWater,
    /// Below 80%: optimal range
    Optimal,
    /// 80% and above: oversaturated
    Saturated,
}

impl HumidityLevel {
    /// Classify a humidity percentage into its severity band
    #[must_use]
    pub const fn classify(humidity: i64) -> Self {
        if humidity < 20 {
            Self::SevereDry
        } else if humidity < 50 {
            Self::NeedsWater
        } else if humidity < 80 {
            Self::Optimal
        } else {
            Self::Saturated
        }
    }

    /// Spoken report for a humidity percentage in this band
    #[must_use]
    pub fn message(self, humidity: i64) -> String {
        match self {
            Self::SevereDry => format!(
                "¡Emergencia! Humedad {humidity}%. Suelo extremadamente seco. Riega inmediatamente."
            ),
            Self::NeedsWater => format!("Humedad {humidity}%. El suelo necesita riego pronto."),
            Self::Optimal => format!("Humedad {humidity}%. Nivel óptimo de humedad."),
            Self::Saturated => format!("¡Alerta! Humedad {humidity}%. Suelo sobresaturado."),
        }
    }
}

/// Spoken report for a humidity percentage
#[must_use]
pub fn humidity_message(humidity: i64) -> String {
    HumidityLevel::classify(humidity).message(humidity)
}
