use serde::{ Serialize, Deserialize };

#[derive(Clone, Debug, Deserialize)]
pub struct CountryName {
    pub common: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DialInfo {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub suffixes: Option<Vec<String>>,
}

/// A country as returned by the upstream country-data API.
#[derive(Clone, Debug, Deserialize)]
pub struct Country {
    pub name: CountryName,
    pub cca2: String,
    #[serde(default)]
    pub idd: Option<DialInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedCountry {
    pub name: String,
    pub code: String,
    pub dial_code: String,
}
