use crate::core::units::{DistanceAlgorithm, DistanceUnit};
use crate::util::coord::Coordinate;
use serde::{Deserialize, Serialize};

/// A stored address.
///
/// Latitude and longitude live together in one `Option<Coordinate>`, so a record
/// either has both or neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub id: u64,
    /// Kind of parent entity owning the address (e.g. "user", "company").
    pub owner_type: String,
    pub owner_id: String,
    pub coordinate: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

impl AddressRecord {
    pub fn new(id: u64, owner_type: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            id,
            owner_type: owner_type.into(),
            owner_id: owner_id.into(),
            coordinate: None,
            label: None,
            street: None,
            city: None,
            postal_code: None,
            country_code: None,
        }
    }

    pub fn at(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn street(mut self, street: impl Into<String>) -> Self {
        self.street = Some(street.into());
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    /// ISO 3166-1 alpha-2 code, stored upper-case.
    pub fn country_code(mut self, country_code: impl AsRef<str>) -> Self {
        self.country_code = Some(country_code.as_ref().to_ascii_uppercase());
        self
    }

    pub fn has_coordinates(&self) -> bool {
        self.coordinate.is_some()
    }

    /// Haversine distance to another record, or `None` if either lacks coordinates.
    pub fn distance_to(&self, other: &AddressRecord, unit: DistanceUnit) -> Option<f64> {
        let (a, b) = (self.coordinate?, other.coordinate?);
        Some(DistanceAlgorithm::Haversine.distance(&a, &b, unit))
    }

    /// Whether `other` lies within `radius` of this record.
    ///
    /// `false` when either side lacks coordinates.
    pub fn is_within_radius(&self, other: &AddressRecord, radius: f64, unit: DistanceUnit) -> bool {
        self.distance_to(other, unit)
            .is_some_and(|distance| distance <= radius)
    }
}

/// Equality filters on the owning entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerFilter {
    pub owner_type: Option<String>,
    pub owner_id: Option<String>,
}

impl OwnerFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of_type(owner_type: impl Into<String>) -> Self {
        Self {
            owner_type: Some(owner_type.into()),
            owner_id: None,
        }
    }

    pub fn owner(owner_type: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            owner_type: Some(owner_type.into()),
            owner_id: Some(owner_id.into()),
        }
    }

    pub fn matches(&self, record: &AddressRecord) -> bool {
        self.owner_type
            .as_deref()
            .is_none_or(|t| t == record.owner_type)
            && self.owner_id.as_deref().is_none_or(|id| id == record.owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoSearchError;

    #[test]
    fn test_distance_to_requires_both_coordinates() -> Result<(), GeoSearchError> {
        let nyc = AddressRecord::new(1, "user", "1").at(Coordinate::new(40.7128, -74.0060)?);
        let brooklyn = AddressRecord::new(2, "user", "1").at(Coordinate::new(40.6782, -73.9442)?);
        let unknown = AddressRecord::new(3, "user", "2");

        let d = nyc.distance_to(&brooklyn, DistanceUnit::Kilometers);
        assert!(d.is_some_and(|d| d > 5.0 && d < 7.0));
        assert!(nyc.distance_to(&unknown, DistanceUnit::Kilometers).is_none());
        assert!(!unknown.has_coordinates());
        Ok(())
    }

    #[test]
    fn test_is_within_radius() -> Result<(), GeoSearchError> {
        let a = AddressRecord::new(1, "user", "1").at(Coordinate::new(0.0, 0.0)?);
        let b = AddressRecord::new(2, "user", "1").at(Coordinate::new(0.0, 1.0)?);
        assert!(a.is_within_radius(&b, 112.0, DistanceUnit::Kilometers));
        assert!(!a.is_within_radius(&b, 110.0, DistanceUnit::Kilometers));
        assert!(!a.is_within_radius(&AddressRecord::new(3, "x", "y"), 1e9, DistanceUnit::Meters));
        Ok(())
    }

    #[test]
    fn test_address_fields_builder() {
        let record = AddressRecord::new(1, "user", "1")
            .street("1600 Pennsylvania Ave NW")
            .city("Washington")
            .postal_code("20500")
            .country_code("us");
        assert_eq!(record.street.as_deref(), Some("1600 Pennsylvania Ave NW"));
        assert_eq!(record.postal_code.as_deref(), Some("20500"));
        assert_eq!(record.country_code.as_deref(), Some("US"));
        assert_eq!(record.label, None);
    }

    #[test]
    fn test_owner_filter() {
        let record = AddressRecord::new(1, "company", "42");
        assert!(OwnerFilter::any().matches(&record));
        assert!(OwnerFilter::of_type("company").matches(&record));
        assert!(OwnerFilter::owner("company", "42").matches(&record));
        assert!(!OwnerFilter::owner("company", "43").matches(&record));
        assert!(!OwnerFilter::of_type("user").matches(&record));
    }
}
