//! Read-only facility catalog and the lookups behind the selection cascade.
//!
//! The catalog is loaded once at startup and shared by every request. None of
//! the lookups fail: a selection that matches nothing yields an empty result,
//! since the cascade can briefly hold a county, district and facility that do
//! not belong together.

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::models::FacilityRecord;
use crate::services::catalog_api::CatalogApi;

/// District choices for the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistrictOptions {
    pub districts: Vec<String>,
    /// First district in catalog order, empty when there is none.
    pub default: String,
}

/// A `(name, official_id)` pair for labeling the facility selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacilityOption {
    pub name: String,
    pub official_id: String,
}

/// The detail panel for the selected facility. Every field is blank when the
/// selection does not resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacilityPanel {
    pub name: String,
    pub official_id: String,
    pub address: String,
    pub spaces: String,
    pub description: String,
}

impl FacilityPanel {
    pub fn from_lookup(facility: Option<&FacilityRecord>) -> Self {
        let Some(f) = facility else {
            return Self::default();
        };

        FacilityPanel {
            name: f.name.clone(),
            official_id: f.official_id.clone(),
            address: format!("地址:{}", f.address),
            spaces: format!(
                "小客車:{}\n摩托車:{}\n充電樁:{}",
                f.total_parking_spaces, f.total_motorcycle_spaces, f.total_charging_stations
            ),
            description: f.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    facilities: Vec<FacilityRecord>,
}

impl Catalog {
    pub fn from_records(facilities: Vec<FacilityRecord>) -> Self {
        Self { facilities }
    }

    /// Takes a complete snapshot from the catalog source.
    #[tracing::instrument(skip(source))]
    pub async fn load<S: CatalogApi + ?Sized>(source: &S) -> Result<Self> {
        let facilities = source.list_facilities().await?;
        info!(facilities = facilities.len(), "Facility catalog loaded");
        Ok(Self::from_records(facilities))
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    pub fn facilities(&self) -> &[FacilityRecord] {
        &self.facilities
    }

    /// Distinct non-empty counties in catalog order. The first one is the
    /// initial county selection.
    pub fn counties(&self) -> Vec<String> {
        let mut counties: Vec<String> = Vec::new();
        for f in &self.facilities {
            if !f.county.is_empty() && !counties.contains(&f.county) {
                counties.push(f.county.clone());
            }
        }
        counties
    }

    /// Distinct non-empty districts of `county`, narrowed to one facility when
    /// `official_id` is given.
    pub fn districts_for(&self, county: &str, official_id: Option<&str>) -> DistrictOptions {
        let official_id = official_id.filter(|id| !id.is_empty());
        let mut districts: Vec<String> = Vec::new();

        for f in self.facilities.iter().filter(|f| {
            f.county == county && official_id.is_none_or(|id| f.official_id == id)
        }) {
            if !f.district.is_empty() && !districts.contains(&f.district) {
                districts.push(f.district.clone());
            }
        }

        let default = districts.first().cloned().unwrap_or_default();
        DistrictOptions { districts, default }
    }

    /// Facilities of `county`, narrowed to `district` when one is given.
    pub fn facilities_for(&self, county: &str, district: Option<&str>) -> Vec<FacilityOption> {
        let district = district.filter(|d| !d.is_empty());

        self.facilities
            .iter()
            .filter(|f| f.county == county && district.is_none_or(|d| f.district == d))
            .map(|f| FacilityOption {
                name: f.name.clone(),
                official_id: f.official_id.clone(),
            })
            .collect()
    }

    /// Exact match on all three keys.
    pub fn facility_detail(
        &self,
        county: &str,
        district: &str,
        official_id: &str,
    ) -> Option<&FacilityRecord> {
        self.facilities.iter().find(|f| {
            f.county == county && f.district == district && f.official_id == official_id
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counties_are_distinct_in_catalog_order() {
        let catalog = sample_catalog();
        assert_eq!(catalog.counties(), vec!["Taipei", "Taichung"]);
    }

    #[test]
    fn test_districts_for_county() {
        let catalog = sample_catalog();
        let options = catalog.districts_for("Taipei", None);

        assert_eq!(options.districts, vec!["Xinyi", "Da'an"]);
        assert_eq!(options.default, "Xinyi");
    }

    #[test]
    fn test_districts_for_selected_facility() {
        let catalog = sample_catalog();
        let options = catalog.districts_for("Taipei", Some("TP-003"));

        assert_eq!(options.districts, vec!["Da'an"]);
        assert_eq!(options.default, "Da'an");
    }

    #[test]
    fn test_districts_skip_empty_values() {
        let catalog = sample_catalog();
        let options = catalog.districts_for("Taichung", None);

        assert!(options.districts.is_empty());
        assert_eq!(options.default, "");
    }

    #[test]
    fn test_districts_for_unknown_county_is_empty() {
        let catalog = sample_catalog();
        assert_eq!(catalog.districts_for("Nowhere", None), DistrictOptions::default());
    }

    #[test]
    fn test_facilities_for_county_and_district() {
        let catalog = sample_catalog();

        let all = catalog.facilities_for("Taipei", None);
        assert_eq!(all.len(), 3);

        let xinyi = catalog.facilities_for("Taipei", Some("Xinyi"));
        let ids: Vec<_> = xinyi.iter().map(|f| f.official_id.as_str()).collect();
        assert_eq!(ids, vec!["TP-001", "TP-002"]);
        assert_eq!(xinyi[0].name, "Xinyi Plaza");

        // an empty district selection does not narrow the list
        assert_eq!(catalog.facilities_for("Taichung", Some("")).len(), 1);
    }

    #[test]
    fn test_facility_detail_exact_match() {
        let catalog = sample_catalog();
        let found = catalog.facility_detail("Taipei", "Da'an", "TP-003").unwrap();
        assert_eq!(found.name, "Da'an Park");

        let no_district = catalog.facility_detail("Taichung", "", "TC-001");
        assert!(no_district.is_some());
    }

    #[test]
    fn test_facility_detail_miss_is_none() {
        let catalog = sample_catalog();
        // facility exists, but not in the selected district
        assert!(catalog.facility_detail("Taipei", "Xinyi", "TP-003").is_none());
        assert!(catalog.facility_detail("Taichung", "Xinyi", "TP-001").is_none());
    }

    #[test]
    fn test_panel_blank_on_miss() {
        assert_eq!(FacilityPanel::from_lookup(None), FacilityPanel::default());
    }

    #[test]
    fn test_panel_fields() {
        let mut facility = FacilityRecord::new("TP-001", "Xinyi Plaza", "Taipei", "Xinyi");
        facility.address = "No. 1 Songshou Rd".to_string();
        facility.total_parking_spaces = 120;
        facility.total_motorcycle_spaces = 40;

        let panel = FacilityPanel::from_lookup(Some(&facility));

        assert_eq!(panel.address, "地址:No. 1 Songshou Rd");
        assert_eq!(panel.spaces, "小客車:120\n摩托車:40\n充電樁:-9");
        assert_eq!(panel.official_id, "TP-001");
    }

    // Helper functions for tests
    fn sample_catalog() -> Catalog {
        Catalog::from_records(vec![
            FacilityRecord::new("TP-001", "Xinyi Plaza", "Taipei", "Xinyi"),
            FacilityRecord::new("TP-002", "City Hall", "Taipei", "Xinyi"),
            FacilityRecord::new("TP-003", "Da'an Park", "Taipei", "Da'an"),
            FacilityRecord::new("TC-001", "Station Front", "Taichung", ""),
        ])
    }
}
