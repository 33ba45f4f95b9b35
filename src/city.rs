//! Typed view of city database records
//!
//! Column names follow the published city database layouts. Columns a
//! given file does not declare are left empty.

use serde::{Deserialize, Serialize};

/// One city-level record, as returned by [`Database::lookup_info`](crate::Database::lookup_info)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct CityInfo {
    pub country_name: String,
    pub region_name: String,
    pub city_name: String,
    pub district_name: String,
    pub owner_domain: String,
    pub isp_domain: String,
    pub latitude: String,
    pub longitude: String,
    pub timezone: String,
    pub utc_offset: String,
    pub china_region_code: String,
    pub china_city_code: String,
    pub china_district_code: String,
    pub idd_code: String,
    pub country_code: String,
    pub continent_code: String,
    pub idc: String,
    pub base_station: String,
    pub country_code3: String,
    pub european_union: String,
    pub currency_code: String,
    pub currency_name: String,
    pub anycast: String,
}
