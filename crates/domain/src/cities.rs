//! City Registry (C2): ten cities with timezone, forecast grid coordinates,
//! settlement-station identifier, and correlation cluster. Entries are
//! immutable once constructed — see §3 / SPEC_FULL.md §10.7 for the
//! cluster-assignment decision.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Cluster {
    Ne,
    Se,
    Midwest,
    Mountain,
    West,
}

/// NOAA gridpoint coordinates identifying a forecast office cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastGrid {
    pub office: String,
    pub grid_x: u32,
    pub grid_y: u32,
}

/// Immutable registry entry. Constructed at boot from [`default_cities`]
/// (or a config override); never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CityConfig {
    /// Three-letter code, e.g. "NYC".
    pub code: String,
    pub display_name: String,
    /// IANA timezone, e.g. "America/New_York".
    pub timezone: String,
    pub cluster: Cluster,
    pub forecast_grid: ForecastGrid,
    /// NWS observation station identifier used for latest-observation reads.
    pub settlement_station: String,
}

pub fn default_cities() -> Vec<CityConfig> {
    vec![
        city("NYC", "New York City", "America/New_York", Cluster::Ne, "OKX", 33, 37, "KNYC"),
        city("BOS", "Boston", "America/New_York", Cluster::Ne, "BOX", 71, 90, "KBOS"),
        city("MIA", "Miami", "America/New_York", Cluster::Se, "MFL", 109, 51, "KMIA"),
        city("ATL", "Atlanta", "America/New_York", Cluster::Se, "FFC", 50, 86, "KATL"),
        city("CHI", "Chicago", "America/Chicago", Cluster::Midwest, "LOT", 76, 73, "KORD"),
        city("MIN", "Minneapolis", "America/Chicago", Cluster::Midwest, "MPX", 107, 70, "KMSP"),
        city("DEN", "Denver", "America/Denver", Cluster::Mountain, "BOU", 62, 85, "KDEN"),
        city("PHX", "Phoenix", "America/Phoenix", Cluster::Mountain, "PSR", 159, 58, "KPHX"),
        city("SEA", "Seattle", "America/Los_Angeles", Cluster::West, "SEW", 124, 67, "KSEA"),
        city("LAX", "Los Angeles", "America/Los_Angeles", Cluster::West, "LOX", 154, 44, "KLAX"),
    ]
}

#[allow(clippy::too_many_arguments)]
fn city(
    code: &str,
    display_name: &str,
    timezone: &str,
    cluster: Cluster,
    office: &str,
    grid_x: u32,
    grid_y: u32,
    settlement_station: &str,
) -> CityConfig {
    CityConfig {
        code: code.to_string(),
        display_name: display_name.to_string(),
        timezone: timezone.to_string(),
        cluster,
        forecast_grid: ForecastGrid {
            office: office.to_string(),
            grid_x,
            grid_y,
        },
        settlement_station: settlement_station.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_cities_exhaustively_clustered() {
        let cities = default_cities();
        assert_eq!(cities.len(), 10);
        for cluster in [
            Cluster::Ne,
            Cluster::Se,
            Cluster::Midwest,
            Cluster::Mountain,
            Cluster::West,
        ] {
            assert!(
                cities.iter().any(|c| c.cluster == cluster),
                "cluster {cluster:?} has no member city"
            );
        }
    }

    #[test]
    fn codes_are_unique() {
        let cities = default_cities();
        let mut codes: Vec<&str> = cities.iter().map(|c| c.code.as_str()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), cities.len());
    }
}
