use crate::error::GeoSearchError;
use crate::store::memory::InMemoryAddressStore;
use crate::store::record::AddressRecord;
use crate::util::coord::Coordinate;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Column mapping for loading address records from CSV.
#[derive(Debug, Clone)]
pub struct CsvStoreConfig {
    pub id_column: String,
    pub owner_type_column: String,
    pub owner_id_column: String,
    pub latitude_column: String,
    pub longitude_column: String,
    pub label_column: Option<String>,
    pub street_column: Option<String>,
    pub city_column: Option<String>,
    pub postal_code_column: Option<String>,
    pub country_code_column: Option<String>,
    pub delimiter: u8,
}

impl Default for CsvStoreConfig {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            owner_type_column: "owner_type".to_string(),
            owner_id_column: "owner_id".to_string(),
            latitude_column: "latitude".to_string(),
            longitude_column: "longitude".to_string(),
            label_column: Some("label".to_string()),
            street_column: Some("street".to_string()),
            city_column: Some("city".to_string()),
            postal_code_column: Some("postal_code".to_string()),
            country_code_column: Some("country_code".to_string()),
            delimiter: b',',
        }
    }
}

impl CsvStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use different latitude/longitude column names.
    ///
    /// # Example
    /// ```
    /// use geo_radius::CsvStoreConfig;
    ///
    /// let config = CsvStoreConfig::new().coords("lat", "lng");
    /// assert_eq!(config.latitude_column, "lat");
    /// ```
    pub fn coords(mut self, latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        self.latitude_column = latitude.into();
        self.longitude_column = longitude.into();
        self
    }

    pub fn owner_columns(
        mut self,
        owner_type: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        self.owner_type_column = owner_type.into();
        self.owner_id_column = owner_id.into();
        self
    }

    /// Column names for street, city, postal code and country code. `None` skips a column.
    pub fn address_columns(
        mut self,
        street: Option<&str>,
        city: Option<&str>,
        postal_code: Option<&str>,
        country_code: Option<&str>,
    ) -> Self {
        self.street_column = street.map(str::to_string);
        self.city_column = city.map(str::to_string);
        self.postal_code_column = postal_code.map(str::to_string);
        self.country_code_column = country_code.map(str::to_string);
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

struct Columns {
    id: usize,
    owner_type: usize,
    owner_id: usize,
    latitude: usize,
    longitude: usize,
    label: Option<usize>,
    street: Option<usize>,
    city: Option<usize>,
    postal_code: Option<usize>,
    country_code: Option<usize>,
}

fn resolve_columns(
    headers: &csv::StringRecord,
    config: &CsvStoreConfig,
) -> Result<Columns, GeoSearchError> {
    let positions: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim(), i))
        .collect();

    let required = |name: &str| {
        positions
            .get(name)
            .copied()
            .ok_or_else(|| GeoSearchError::Csv(format!("Column '{}' not found", name)))
    };
    let optional =
        |name: &Option<String>| name.as_deref().and_then(|n| positions.get(n).copied());

    Ok(Columns {
        id: required(&config.id_column)?,
        owner_type: required(&config.owner_type_column)?,
        owner_id: required(&config.owner_id_column)?,
        latitude: required(&config.latitude_column)?,
        longitude: required(&config.longitude_column)?,
        label: optional(&config.label_column),
        street: optional(&config.street_column),
        city: optional(&config.city_column),
        postal_code: optional(&config.postal_code_column),
        country_code: optional(&config.country_code_column),
    })
}

fn parse_optional_f64(value: Option<&str>, line: u64) -> Result<Option<f64>, GeoSearchError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|e| {
                GeoSearchError::Csv(format!("line {}: bad number '{}': {}", line, raw, e))
            }),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Loads address records from any CSV reader into a new in-memory store.
///
/// Empty latitude/longitude cells mean "no coordinates". A row with only one of
/// the two set is rejected.
pub fn load_csv<R: Read>(
    reader: R,
    config: &CsvStoreConfig,
) -> Result<InMemoryAddressStore, GeoSearchError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = resolve_columns(&headers, config)?;
    let store = InMemoryAddressStore::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let line = record.position().map_or(row as u64 + 2, |p| p.line());

        let id_raw = record.get(columns.id).unwrap_or("").trim();
        let id = id_raw
            .parse::<u64>()
            .map_err(|_| GeoSearchError::Csv(format!("line {}: bad id '{}'", line, id_raw)))?;

        let latitude = parse_optional_f64(record.get(columns.latitude), line)?;
        let longitude = parse_optional_f64(record.get(columns.longitude), line)?;
        let coordinate = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)?),
            (None, None) => None,
            _ => {
                return Err(GeoSearchError::Csv(format!(
                    "line {}: latitude and longitude must both be set or both be empty",
                    line
                )));
            }
        };

        let mut address = AddressRecord::new(
            id,
            record.get(columns.owner_type).unwrap_or("").trim(),
            record.get(columns.owner_id).unwrap_or("").trim(),
        );
        address.coordinate = coordinate;
        let text = |column: Option<usize>| column.and_then(|i| non_empty(record.get(i)));
        address.label = text(columns.label);
        address.street = text(columns.street);
        address.city = text(columns.city);
        address.postal_code = text(columns.postal_code);
        address.country_code = text(columns.country_code).map(|c| c.to_ascii_uppercase());

        store.insert(address);
    }

    tracing::info!(records = store.len(), "Loaded address records from CSV");
    Ok(store)
}

/// Loads address records from a CSV file.
pub fn load_csv_path(
    path: impl AsRef<Path>,
    config: &CsvStoreConfig,
) -> Result<InMemoryAddressStore, GeoSearchError> {
    let file = File::open(path.as_ref())
        .map_err(|e| GeoSearchError::Csv(format!("{}: {}", path.as_ref().display(), e)))?;
    load_csv(file, config)
}
