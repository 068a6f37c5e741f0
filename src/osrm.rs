//! OSRM HTTP adapter for distance matrices.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result, UpstreamError};
use crate::matrix::DistanceMatrix;
use crate::traits::RoutingBackend;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
        }
    }
}

impl OsrmConfig {
    /// Defaults overridden by `OSRM_BASE_URL`, `OSRM_PROFILE` and
    /// `OSRM_TIMEOUT_SECS` when set. An unparsable timeout keeps the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("OSRM_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(profile) = std::env::var("OSRM_PROFILE") {
            config.profile = profile;
        }
        if let Ok(raw) = std::env::var("OSRM_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => config.timeout_secs = secs,
                Err(_) => warn!(value = %raw, "ignoring invalid OSRM_TIMEOUT_SECS"),
            }
        }
        config
    }

    fn table_url(&self, locations: &[(f64, f64)]) -> String {
        let coords = locations
            .iter()
            .map(|(lat, lng)| format!("{:.6},{:.6}", lng, lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/{}/{}?annotations=distance,duration",
            self.base_url.trim_end_matches('/'),
            self.profile,
            coords
        )
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(UpstreamError::from)?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }
}

impl RoutingBackend for OsrmClient {
    fn table(&self, locations: &[(f64, f64)]) -> Result<DistanceMatrix> {
        if locations.is_empty() {
            return Err(Error::invalid_input("no coordinates to route"));
        }

        let url = self.config.table_url(locations);
        debug!(points = locations.len(), "querying OSRM table");

        let response = self.client.get(url).send().map_err(UpstreamError::from)?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()).into());
        }

        let body = response
            .json::<OsrmTableResponse>()
            .map_err(UpstreamError::from)?;
        body.into_matrix(locations.len())
    }
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: Option<String>,
    distances: Option<Vec<Vec<Option<f64>>>>,
    durations: Option<Vec<Vec<Option<f64>>>>,
}

impl OsrmTableResponse {
    /// Null cells become `+inf`. A missing durations table is treated as all
    /// unknown; a missing distances table is an error.
    fn into_matrix(self, n: usize) -> Result<DistanceMatrix> {
        if let Some(code) = self.code {
            if code != "Ok" {
                return Err(UpstreamError::Rejected { code }.into());
            }
        }

        let distances = self
            .distances
            .ok_or(UpstreamError::MissingTable("distances"))?;
        if distances.len() != n {
            return Err(UpstreamError::ShapeMismatch {
                expected: n,
                found: distances.len(),
            }
            .into());
        }

        let durations = match self.durations {
            Some(rows) => fill_unknown(rows),
            None => vec![vec![f64::INFINITY; n]; n],
        };

        DistanceMatrix::new(fill_unknown(distances), durations)
    }
}

fn fill_unknown(rows: Vec<Vec<Option<f64>>>) -> Vec<Vec<f64>> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| cell.unwrap_or(f64::INFINITY))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str, n: usize) -> Result<DistanceMatrix> {
        let response: OsrmTableResponse = serde_json::from_str(body).unwrap();
        response.into_matrix(n)
    }

    #[test]
    fn test_table_url_uses_lng_lat_order() {
        let config = OsrmConfig {
            base_url: "http://localhost:5000/".to_string(),
            profile: "car".to_string(),
            timeout_secs: 5,
        };
        let url = config.table_url(&[(36.1, -115.2), (36.3, -115.4)]);
        assert_eq!(
            url,
            "http://localhost:5000/table/v1/car/-115.200000,36.100000;-115.400000,36.300000?annotations=distance,duration"
        );
    }

    #[test]
    fn test_parses_distances_and_durations() {
        let body = r#"{
            "code": "Ok",
            "distances": [[0, 1500.5], [1490.0, 0]],
            "durations": [[0, 120.0], [118.2, 0]]
        }"#;
        let matrix = parse(body, 2).unwrap();
        assert_eq!(matrix.distance(0, 1), 1500.5);
        assert_eq!(matrix.duration(1, 0), 118.2);
    }

    #[test]
    fn test_null_cells_become_infinite() {
        let body = r#"{
            "code": "Ok",
            "distances": [[0, null], [10, 0]],
            "durations": [[0, 5], [null, 0]]
        }"#;
        let matrix = parse(body, 2).unwrap();
        assert!(matrix.distance(0, 1).is_infinite());
        assert!(matrix.duration(1, 0).is_infinite());
        assert_eq!(matrix.distance(1, 0), 10.0);
    }

    #[test]
    fn test_missing_durations_are_infinite() {
        let body = r#"{"code": "Ok", "distances": [[0, 1], [1, 0]]}"#;
        let matrix = parse(body, 2).unwrap();
        assert!(matrix.duration(0, 1).is_infinite());
    }

    #[test]
    fn test_missing_distances_is_error() {
        let body = r#"{"code": "Ok", "durations": [[0]]}"#;
        let err = parse(body, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::UpstreamRouting(UpstreamError::MissingTable("distances"))
        ));
    }

    #[test]
    fn test_row_count_mismatch_is_error() {
        let body = r#"{"code": "Ok", "distances": [[0, 1], [1, 0]], "durations": [[0, 1], [1, 0]]}"#;
        let err = parse(body, 3).unwrap_err();
        assert!(matches!(
            err,
            Error::UpstreamRouting(UpstreamError::ShapeMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn test_rejected_code_is_error() {
        let body = r#"{"code": "InvalidQuery", "message": "bad coords"}"#;
        let err = parse(body, 2).unwrap_err();
        assert!(matches!(err, Error::UpstreamRouting(UpstreamError::Rejected { .. })));
    }

    #[test]
    fn test_unreachable_backend_is_transport_error() {
        let client = OsrmClient::new(OsrmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 1,
        })
        .unwrap();
        let err = client.table(&[(0.0, 0.0), (0.0, 1.0)]).unwrap_err();
        assert!(matches!(err, Error::UpstreamRouting(UpstreamError::Transport(_))));
    }
}
