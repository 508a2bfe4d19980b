//! Downloads Météo-France daily department files from data.gouv.fr into the data
//! directory, named so that [`FileWeatherRepository`](super::file_repository::FileWeatherRepository)
//! picks them up on the next import.

use crate::repository::error::RepositoryError;
use crate::types::station::normalize_department;
use async_compression::tokio::bufread::GzipDecoder;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

/// "Données climatologiques de base - quotidiennes".
const DATASET_ID: &str = "6569b51ae64326786e4e8e1a";
const API_BASE_URL: &str = "https://www.data.gouv.fr/api/1/datasets";
const PARQUET_URL_EXTRA: &str = "analysis:parsing:parquet_url";

/// One downloadable file of the dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetResource {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Direct link to the published file, usually a `.csv.gz`.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub extras: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Dataset {
    resources: Vec<DatasetResource>,
}

impl DatasetResource {
    /// Parquet conversion published by data.gouv.fr alongside the original file.
    pub fn parquet_url(&self) -> Option<&str> {
        self.extras
            .get(PARQUET_URL_EXTRA)
            .and_then(|v| v.as_str())
            .filter(|url| !url.is_empty())
    }

    /// The 1950 to last-year export, as opposed to the recent one.
    pub fn is_historical(&self) -> bool {
        self.description.contains("1950")
    }

    /// Whether this is a rainfall/temperature/wind file of `department` (zero-padded).
    pub fn matches_department(&self, department: &str) -> bool {
        let description = &self.description;
        description.contains(&format!("département {}", department))
            && (description.contains("1950") || description.contains("2022"))
            && !description.contains("autres-parametres")
    }

    /// File name in the data directory, following the Météo-France naming.
    pub fn file_name(&self, department: &str) -> String {
        let period = if self.is_historical() {
            "previous"
        } else {
            "latest"
        };
        let extension = if self.parquet_url().is_some() {
            "parquet"
        } else {
            "csv"
        };
        format!("Q_{}_{}-{}_RR-T-Vent.{}", department, period, self.id, extension)
    }
}

/// Resources of `department`, historical export first.
pub fn department_resources<'a>(
    resources: &'a [DatasetResource],
    department: &str,
) -> Vec<&'a DatasetResource> {
    let department = normalize_department(department);
    let mut matching: Vec<&DatasetResource> = resources
        .iter()
        .filter(|r| r.matches_department(&department))
        .collect();
    matching.sort_by_key(|r| !r.is_historical());
    matching
}

pub struct DataGouvClient {
    client: Client,
    dataset_url: String,
}

impl Default for DataGouvClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DataGouvClient {
    pub fn new() -> Self {
        Self::with_dataset_url(format!("{}/{}/", API_BASE_URL, DATASET_ID))
    }

    /// Client for another dataset endpoint with the same layout (mirrors, test servers).
    pub fn with_dataset_url(dataset_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            dataset_url: dataset_url.into(),
        }
    }

    async fn get(&self, url: &str) -> Result<Response, RepositoryError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RepositoryError::NetworkRequest(url.to_string(), e))?;

        match response.error_for_status() {
            Ok(resp) => Ok(resp),
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                Err(if let Some(status) = e.status() {
                    RepositoryError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    RepositoryError::NetworkRequest(url.to_string(), e)
                })
            }
        }
    }

    /// Every resource of the dataset.
    pub async fn dataset_resources(&self) -> Result<Vec<DatasetResource>, RepositoryError> {
        let bytes = self
            .get(&self.dataset_url)
            .await?
            .bytes()
            .await
            .map_err(|e| RepositoryError::NetworkRequest(self.dataset_url.clone(), e))?;
        let dataset: Dataset = serde_json::from_slice(&bytes)?;
        Ok(dataset.resources)
    }

    /// Downloads the files of `department` into `data_dir` and returns their paths.
    ///
    /// Parquet conversions are preferred; otherwise the gzipped CSV is decompressed on
    /// the fly. Each file is written under a temporary name and renamed once complete.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::NoDatasetResource`] when the dataset lists nothing for the
    /// department.
    pub async fn download_department(
        &self,
        department: &str,
        data_dir: &Path,
    ) -> Result<Vec<PathBuf>, RepositoryError> {
        let department = normalize_department(department);
        let resources = self.dataset_resources().await?;
        let matching = department_resources(&resources, &department);
        if matching.is_empty() {
            return Err(RepositoryError::NoDatasetResource(department));
        }

        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|e| RepositoryError::DataDirRead(data_dir.to_path_buf(), e))?;

        let mut paths = Vec::with_capacity(matching.len());
        for resource in matching {
            let destination = data_dir.join(resource.file_name(&department));
            match resource.parquet_url() {
                Some(url) => self.download_to(url, false, &destination).await?,
                None => {
                    let gzipped = resource.url.ends_with(".gz");
                    self.download_to(&resource.url, gzipped, &destination).await?
                }
            }
            paths.push(destination);
        }
        Ok(paths)
    }

    async fn download_to(
        &self,
        url: &str,
        gzipped: bool,
        destination: &Path,
    ) -> Result<(), RepositoryError> {
        info!("Downloading {} to {}", url, destination.display());
        let response = self.get(url).await?;

        let dir = destination.parent().unwrap_or_else(|| Path::new("."));
        let temp_file = NamedTempFile::new_in(dir)?;
        let mut file = tokio::fs::File::from_std(temp_file.reopen()?);

        let stream = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let mut stream_reader = StreamReader::new(stream);
        let written = if gzipped {
            let mut decoder = GzipDecoder::new(stream_reader);
            tokio::io::copy(&mut decoder, &mut file).await?
        } else {
            tokio::io::copy(&mut stream_reader, &mut file).await?
        };
        file.flush().await?;
        drop(file);

        temp_file
            .persist(destination)
            .map_err(|e| RepositoryError::DownloadIo(e.error))?;
        info!("Wrote {} bytes to {}", written, destination.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET_JSON: &str = r#"{
        "id": "6569b51ae64326786e4e8e1a",
        "resources": [
            {
                "id": "aaa",
                "title": "QUOT_departement_01_periode_1950-2023_RR-T-Vent.csv.gz",
                "description": "Données quotidiennes du département 01 de 1950 à 2023 (RR-T-Vent)",
                "url": "https://object.files.data.gouv.fr/meteofrance/Q_01_previous-1950-2023_RR-T-Vent.csv.gz",
                "extras": {"analysis:parsing:parquet_url": "https://example.org/aaa.parquet", "analysis:content-length": 1234}
            },
            {
                "id": "bbb",
                "description": "Données quotidiennes du département 01 de 1950 à 2023 (autres-parametres)",
                "url": "https://example.org/bbb.csv.gz"
            },
            {
                "id": "ccc",
                "description": "Données quotidiennes du département 01 de 2024 à 2025 (RR-T-Vent), mises à jour depuis 2022",
                "url": "https://example.org/ccc.csv.gz",
                "extras": {}
            },
            {
                "id": "ddd",
                "description": "Données quotidiennes du département 10 de 1950 à 2023 (RR-T-Vent)",
                "url": "https://example.org/ddd.csv.gz"
            }
        ]
    }"#;

    fn resources() -> Vec<DatasetResource> {
        serde_json::from_str::<Dataset>(DATASET_JSON).unwrap().resources
    }

    #[test]
    fn test_department_filter() {
        let resources = resources();
        let ids: Vec<&str> = department_resources(&resources, "1")
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["aaa", "ccc"]);

        let ids: Vec<&str> = department_resources(&resources, "10")
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["ddd"]);
        assert!(department_resources(&resources, "75").is_empty());
    }

    #[test]
    fn test_file_names_follow_import_layout() {
        let resources = resources();
        assert_eq!(
            resources[0].parquet_url(),
            Some("https://example.org/aaa.parquet")
        );
        assert_eq!(
            resources[0].file_name("01"),
            "Q_01_previous-aaa_RR-T-Vent.parquet"
        );
        assert_eq!(resources[2].parquet_url(), None);
        assert_eq!(resources[2].file_name("01"), "Q_01_latest-ccc_RR-T-Vent.csv");
    }
}
