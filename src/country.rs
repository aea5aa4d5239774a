use crate::models::country::{ Country, FormattedCountry };
use log::{ debug, error };
use reqwest::header::{ HeaderValue, CONTENT_TYPE };
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CountryError {
    #[error("Failed to fetch countries: {0}")]
    Status(String),
    #[error("Failed to fetch countries: {0}")]
    Request(#[from] reqwest::Error),
}

pub struct CountryClient {
    client: reqwest::Client,
    url: String,
}

impl CountryClient {
    pub fn new(url: String) -> Self {
        CountryClient {
            client: reqwest::Client::new(),
            url,
        }
    }

    pub async fn get_countries(&self) -> Result<Vec<FormattedCountry>, CountryError> {
        debug!("Fetching country list from {}", self.url);
        let resp = self.client
            .get(&self.url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("");
            error!("Country API responded with {}", status);
            return Err(CountryError::Status(format!("{} {}", status.as_u16(), reason).trim().to_string()));
        }

        let countries: Vec<Country> = resp.json().await?;
        Ok(format_countries(countries))
    }
}

/// Keeps only countries with a dial code, sorted by common name.
pub fn format_countries(countries: Vec<Country>) -> Vec<FormattedCountry> {
    let mut formatted: Vec<FormattedCountry> = countries
        .into_iter()
        .map(|c| {
            let idd = c.idd.unwrap_or_default();
            let root = idd.root.unwrap_or_default();
            let suffix = idd.suffixes
                .and_then(|s| s.into_iter().next())
                .unwrap_or_default();
            FormattedCountry {
                name: c.name.common,
                code: c.cca2,
                dial_code: format!("{}{}", root, suffix),
            }
        })
        .filter(|c| !c.dial_code.is_empty())
        .collect();

    formatted.sort_by(|a, b| a.name.cmp(&b.name));
    formatted
}
