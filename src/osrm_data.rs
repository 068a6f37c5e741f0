//! Test tooling: local OSRM dataset preparation (Geofabrik download + docker
//! preprocessing).
//!
//! Not part of the planning API. It exists so the container-backed
//! integration tests can start a self-hosted router; planning itself talks to
//! any OSRM endpoint through [`crate::osrm::OsrmClient`].

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

/// A Geofabrik extract, e.g. `"north-america/us/nevada"`.
#[derive(Debug, Clone)]
pub struct Region {
    pub path: String,
}

impl Region {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Last path segment, used for file names.
    pub fn name(&self) -> &str {
        self.path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("region")
    }

    pub fn download_url(&self) -> String {
        format!("https://download.geofabrik.de/{}-latest.osm.pbf", self.path)
    }
}

#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub region: Region,
    pub data_root: PathBuf,
    /// Lua profile inside the OSRM image, e.g. `car`, `foot`, `bicycle`.
    pub profile: String,
    pub image: String,
}

impl DatasetConfig {
    pub fn new(region: Region, data_root: impl Into<PathBuf>) -> Self {
        Self {
            region,
            data_root: data_root.into(),
            profile: "car".to_string(),
            image: "osrm/osrm-backend".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),
    #[error("preprocessing failed: {0}")]
    Process(String),
}

/// Files of a prepared (MLD) OSRM dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub data_dir: PathBuf,
    pub osrm_base: PathBuf,
    pub pbf_path: PathBuf,
}

impl Dataset {
    /// Downloads and preprocesses whatever is missing; finished steps are skipped.
    pub fn ensure(config: &DatasetConfig) -> Result<Self, DatasetError> {
        let data_root = if config.data_root.is_absolute() {
            config.data_root.clone()
        } else {
            std::env::current_dir()?.join(&config.data_root)
        };
        let name = config.region.name();
        let data_dir = data_root.join(name);
        fs::create_dir_all(&data_dir)?;

        let pbf_path = data_dir.join(format!("{name}-latest.osm.pbf"));
        if !pbf_path.exists() {
            info!(url = %config.region.download_url(), "downloading OSM extract");
            download(&config.region.download_url(), &pbf_path)?;
        }

        let osrm_base = data_dir.join(format!("{name}-latest.osrm"));
        if !osrm_base.exists() {
            let profile = format!("/opt/{}.lua", config.profile);
            run_in_container(
                &config.image,
                &["osrm-extract", "-p", &profile, &container_path(&pbf_path)],
                &data_dir,
            )?;
        }

        if !mld_ready(&osrm_base) {
            let base = container_path(&osrm_base);
            run_in_container(&config.image, &["osrm-partition", &base], &data_dir)?;
            run_in_container(&config.image, &["osrm-customize", &base], &data_dir)?;
        }

        Ok(Self {
            data_dir,
            osrm_base,
            pbf_path,
        })
    }

    /// Path of the `.osrm` base as seen inside a container mounting `data_dir` at `/data`.
    pub fn container_base(&self) -> String {
        container_path(&self.osrm_base)
    }
}

fn download(url: &str, dest: &Path) -> Result<(), DatasetError> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let tmp_path = dest.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    writer.write_all(&response.bytes()?)?;
    writer.flush()?;
    fs::rename(tmp_path, dest)?;
    Ok(())
}

fn mld_ready(osrm_base: &Path) -> bool {
    ["osrm.partition", "osrm.mldgr", "osrm.cells"]
        .iter()
        .all(|ext| osrm_base.with_extension(ext).exists())
        && osrm_base.exists()
}

fn run_in_container(image: &str, args: &[&str], data_dir: &Path) -> Result<(), DatasetError> {
    info!(step = args.first().copied().unwrap_or_default(), "running OSRM preprocessing");
    let status = Command::new("docker")
        .args(["run", "--rm", "-t", "-v"])
        .arg(format!("{}:/data", data_dir.display()))
        .arg(image)
        .args(args)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(DatasetError::Process(format!(
            "{} exited with status {status}",
            args.first().copied().unwrap_or("docker")
        )))
    }
}

fn container_path(path: &Path) -> String {
    let file = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    format!("/data/{file}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_name_and_url() {
        let region = Region::new("north-america/us/nevada");
        assert_eq!(region.name(), "nevada");
        assert_eq!(
            region.download_url(),
            "https://download.geofabrik.de/north-america/us/nevada-latest.osm.pbf"
        );
    }

    #[test]
    fn test_container_path() {
        let path = Path::new("/tmp/osrm/nevada/nevada-latest.osrm");
        assert_eq!(container_path(path), "/data/nevada-latest.osrm");
    }

    #[test]
    fn test_mld_not_ready_without_files() {
        assert!(!mld_ready(Path::new("/nonexistent/region-latest.osrm")));
    }
}
