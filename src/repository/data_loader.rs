//! Reads Météo-France daily "RR-T-Vent" department files (CSV or Parquet) into stations
//! and rainfall observations, and maintains the per-department parquet cache.
//!
//! All functions here block; callers run them inside `tokio::task::spawn_blocking`.

use crate::repository::error::RepositoryError;
use crate::types::geo_point::GeoPoint;
use crate::types::observation::ObservationRecord;
use crate::types::station::{normalize_station_id, Station};
use chrono::NaiveDate;
use log::{debug, info, warn};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Layout of the `AAAAMMJJ` date column.
const DATE_FORMAT: &str = "%Y%m%d";
const CACHE_FILE_PREFIX: &str = "rr-";

/// Column names of the Météo-France product.
mod source_columns {
    pub const STATION_ID: &str = "NUM_POSTE";
    pub const NAME: &str = "NOM_USUEL";
    pub const LAT: &str = "LAT";
    pub const LON: &str = "LON";
    pub const ALTITUDE: &str = "ALTI";
    pub const DATE: &str = "AAAAMMJJ";
    pub const RAINFALL: &str = "RR";
}

/// Column names after normalisation, shared with the parquet cache.
mod columns {
    pub const STATION_ID: &str = "station_id";
    pub const NAME: &str = "common_name";
    pub const LAT: &str = "lat";
    pub const LON: &str = "lon";
    pub const ALTITUDE: &str = "alti";
    pub const DATE: &str = "date";
    pub const RAINFALL: &str = "rr";
}

/// Everything read for one department, with the files concatenated in import order.
#[derive(Debug, Clone, Default)]
pub struct DepartmentData {
    pub department: String,
    pub stations: Vec<Station>,
    pub records: Vec<ObservationRecord>,
    pub files: Vec<PathBuf>,
    /// Rows dropped because a date or coordinate could not be parsed.
    pub skipped_rows: usize,
}

/// Lists the rainfall files of `department` in `data_dir`: historical exports first,
/// then the recent ones, so that recent values win on overlapping days.
pub fn department_files(
    data_dir: &Path,
    department: &str,
) -> Result<Vec<PathBuf>, RepositoryError> {
    let prefix = format!("Q_{}_", department);
    let entries = std::fs::read_dir(data_dir)
        .map_err(|e| RepositoryError::DataDirRead(data_dir.to_path_buf(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RepositoryError::DataDirRead(data_dir.to_path_buf(), e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let supported = name.ends_with(".csv") || name.ends_with(".parquet");
        if name.starts_with(&prefix) && name.contains("RR-T-Vent") && supported {
            files.push(entry.path());
        }
    }
    files.sort_by_key(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (name.contains("latest"), name)
    });
    Ok(files)
}

fn scan_source_file(path: &Path) -> Result<LazyFrame, RepositoryError> {
    let is_parquet = path.extension().is_some_and(|ext| ext == "parquet");
    let frame = if is_parquet {
        LazyFrame::scan_parquet(path, Default::default())
            .map_err(|e| RepositoryError::ParquetScan(path.to_path_buf(), e))?
    } else {
        // Everything as text: ids keep their leading zeros, casts below do the rest.
        LazyCsvReader::new(path)
            .with_separator(b';')
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()
            .map_err(|e| RepositoryError::CsvRead(path.to_path_buf(), e))?
    };

    Ok(frame.select([
        col(source_columns::STATION_ID)
            .cast(DataType::String)
            .alias(columns::STATION_ID),
        col(source_columns::NAME)
            .cast(DataType::String)
            .alias(columns::NAME),
        col(source_columns::LAT)
            .cast(DataType::Float64)
            .alias(columns::LAT),
        col(source_columns::LON)
            .cast(DataType::Float64)
            .alias(columns::LON),
        col(source_columns::ALTITUDE)
            .cast(DataType::Float64)
            .alias(columns::ALTITUDE),
        col(source_columns::DATE)
            .cast(DataType::String)
            .alias(columns::DATE),
        col(source_columns::RAINFALL)
            .cast(DataType::Float64)
            .alias(columns::RAINFALL),
    ]))
}

fn str_column<'a>(
    df: &'a DataFrame,
    name: &str,
    path: &Path,
) -> Result<&'a StringChunked, RepositoryError> {
    df.column(name)
        .map_err(|_| RepositoryError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })?
        .str()
        .map_err(|e| RepositoryError::DataFrameProcessing {
            path: path.to_path_buf(),
            source: e,
        })
}

fn f64_column<'a>(
    df: &'a DataFrame,
    name: &str,
    path: &Path,
) -> Result<&'a Float64Chunked, RepositoryError> {
    df.column(name)
        .map_err(|_| RepositoryError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })?
        .f64()
        .map_err(|e| RepositoryError::DataFrameProcessing {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Extracts daily observations from a normalised frame.
///
/// Days without a rainfall value are not observations and are left out; rows with an
/// unreadable date are counted in the returned `usize`.
fn parse_records(
    df: &DataFrame,
    path: &Path,
) -> Result<(Vec<ObservationRecord>, usize), RepositoryError> {
    let ids = str_column(df, columns::STATION_ID, path)?;
    let dates = str_column(df, columns::DATE, path)?;
    let rainfall = f64_column(df, columns::RAINFALL, path)?;

    let mut records = Vec::with_capacity(df.height());
    let mut skipped = 0;
    for idx in 0..df.height() {
        let (Some(id), Some(rr)) = (ids.get(idx), rainfall.get(idx)) else {
            continue;
        };
        let Some(date) = dates
            .get(idx)
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), DATE_FORMAT).ok())
        else {
            skipped += 1;
            continue;
        };
        records.push(ObservationRecord::new(normalize_station_id(id), date, rr));
    }
    Ok((records, skipped))
}

/// Extracts the station attributes, one per id; later rows override earlier ones.
fn parse_stations(
    df: &DataFrame,
    path: &Path,
    stations: &mut BTreeMap<String, Station>,
) -> Result<usize, RepositoryError> {
    let ids = str_column(df, columns::STATION_ID, path)?;
    let names = str_column(df, columns::NAME, path)?;
    let lats = f64_column(df, columns::LAT, path)?;
    let lons = f64_column(df, columns::LON, path)?;
    let altitudes = f64_column(df, columns::ALTITUDE, path)?;

    let mut skipped = 0;
    for idx in 0..df.height() {
        let Some(raw_id) = ids.get(idx) else {
            skipped += 1;
            continue;
        };
        let (Some(lat), Some(lon)) = (lats.get(idx), lons.get(idx)) else {
            skipped += 1;
            continue;
        };
        let id = normalize_station_id(raw_id);
        let station = Station::new(
            id.clone(),
            names.get(idx).unwrap_or_default().trim(),
            GeoPoint::new(lon, lat),
            altitudes.get(idx).unwrap_or_default(),
        );
        match stations.get_mut(&id) {
            Some(existing) if *existing == station => {}
            Some(existing) => *existing = station,
            None => {
                stations.insert(id, station);
            }
        }
    }
    Ok(skipped)
}

/// Reads one source file into `data`.
fn read_source_file(
    path: &Path,
    data: &mut DepartmentData,
    stations: &mut BTreeMap<String, Station>,
) -> Result<(), RepositoryError> {
    let df = scan_source_file(path)?
        .collect()
        .map_err(|e| RepositoryError::DataFrameProcessing {
            path: path.to_path_buf(),
            source: e,
        })?;
    let skipped_stations = parse_stations(&df, path, stations)?;
    let (records, skipped_records) = parse_records(&df, path)?;
    debug!(
        "Read {} rows from {:?}: {} observations, {} unreadable dates, {} rows without station",
        df.height(),
        path,
        records.len(),
        skipped_records,
        skipped_stations
    );
    data.skipped_rows += skipped_records + skipped_stations;
    data.records.extend(records);
    data.files.push(path.to_path_buf());
    Ok(())
}

/// Reads every rainfall file of `department` in `data_dir`, concatenating their
/// observations before any aggregation happens.
///
/// # Errors
///
/// [`RepositoryError::NoDepartmentData`] when no file matches.
pub fn read_department(
    data_dir: &Path,
    department: &str,
) -> Result<DepartmentData, RepositoryError> {
    let files = department_files(data_dir, department)?;
    if files.is_empty() {
        warn!("No rainfall file for department {} in {:?}", department, data_dir);
        return Err(RepositoryError::NoDepartmentData {
            department: department.to_string(),
            data_dir: data_dir.to_path_buf(),
        });
    }

    let mut data = DepartmentData {
        department: department.to_string(),
        ..Default::default()
    };
    let mut stations = BTreeMap::new();
    for path in &files {
        read_source_file(path, &mut data, &mut stations)?;
    }
    data.stations = stations.into_values().collect();

    if data.skipped_rows > 0 {
        warn!(
            "Skipped {} malformed rows while reading department {}",
            data.skipped_rows, department
        );
    }
    info!(
        "Read department {}: {} stations, {} observations from {} files",
        department,
        data.stations.len(),
        data.records.len(),
        data.files.len()
    );
    Ok(data)
}

/// Path of the parquet cache holding the observations of `department`.
pub fn cache_file(cache_dir: &Path, department: &str) -> PathBuf {
    cache_dir.join(format!("{}{}.parquet", CACHE_FILE_PREFIX, department))
}

/// Writes `records` to the department parquet cache.
///
/// The file is written next to its destination and renamed into place, so readers
/// never see a half-written cache.
pub fn write_records_cache(
    records: &[ObservationRecord],
    path: &Path,
) -> Result<(), RepositoryError> {
    let ids: Vec<&str> = records.iter().map(|r| r.station_id.as_str()).collect();
    let dates: Vec<String> = records
        .iter()
        .map(|r| r.date.format(DATE_FORMAT).to_string())
        .collect();
    let rainfall: Vec<f64> = records.iter().map(|r| r.rainfall_mm).collect();

    let mut df = df!(
        columns::STATION_ID => ids,
        columns::DATE => dates,
        columns::RAINFALL => rainfall
    )
    .map_err(|e| RepositoryError::ParquetWrite(path.to_path_buf(), e))?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp_file = NamedTempFile::new_in(dir)
        .map_err(|e| RepositoryError::CacheWrite(path.to_path_buf(), e))?;
    ParquetWriter::new(temp_file.as_file_mut())
        .with_compression(ParquetCompression::Snappy)
        .finish(&mut df)
        .map_err(|e| RepositoryError::ParquetWrite(path.to_path_buf(), e))?;
    temp_file
        .persist(path)
        .map_err(|e| RepositoryError::CacheWrite(path.to_path_buf(), e.error))?;
    Ok(())
}

/// Lazily scans a department parquet cache written by [`write_records_cache`].
pub fn scan_records_cache(path: &Path) -> Result<LazyFrame, RepositoryError> {
    LazyFrame::scan_parquet(path, Default::default())
        .map_err(|e| RepositoryError::ParquetScan(path.to_path_buf(), e))
}

/// Collects the observations of one station out of a cache frame, ordered by date.
pub fn station_records(
    frame: LazyFrame,
    station_id: &str,
    path: &Path,
) -> Result<Vec<ObservationRecord>, RepositoryError> {
    let df = frame
        .filter(col(columns::STATION_ID).eq(lit(station_id)))
        .collect()
        .map_err(|e| RepositoryError::DataFrameProcessing {
            path: path.to_path_buf(),
            source: e,
        })?;
    let (mut records, _) = parse_records(&df, path)?;
    records.sort_by_key(|r| r.date);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "NUM_POSTE;NOM_USUEL;LAT;LON;ALTI;AAAAMMJJ;RR;QRR;TN;QTN";

    fn write_department_csv(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut content = String::from(HEADER);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        content.push('\n');
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_department_files_order_and_filter() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "Q_13_latest-2025-2026_RR-T-Vent.csv",
            "Q_13_previous-1950-2024_RR-T-Vent.csv",
            "Q_13_previous-1950-2024_autres-parametres.csv",
            "Q_130_previous-1950-2024_RR-T-Vent.csv",
            "Q_75_previous-1950-2024_RR-T-Vent.csv",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let files = department_files(dir.path(), "13").unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "Q_13_previous-1950-2024_RR-T-Vent.csv",
                "Q_13_latest-2025-2026_RR-T-Vent.csv",
            ]
        );
    }

    #[test]
    fn test_read_department_concatenates_files() {
        let dir = tempfile::tempdir().unwrap();
        write_department_csv(
            dir.path(),
            "Q_01_previous-1950-2024_RR-T-Vent.csv",
            &[
                "01014002;ARBENT;46.278167;5.669;534;20241230;2.5;1;;",
                "01014002;ARBENT;46.278167;5.669;534;20241231;;;;",
                "01089001;AMBERIEU;45.9765;5.3291;250;20241231;0.4;1;;",
                "01089001;AMBERIEU;45.9765;5.3291;250;2024-13-45;0.4;1;;",
            ],
        );
        write_department_csv(
            dir.path(),
            "Q_01_latest-2025-2026_RR-T-Vent.csv",
            &["01014002;ARBENT;46.278167;5.669;534;20250101;10.0;1;;"],
        );

        let data = read_department(dir.path(), "01").unwrap();
        assert_eq!(data.files.len(), 2);
        assert_eq!(data.stations.len(), 2);
        assert_eq!(data.stations[0].id, "01014002");
        assert_eq!(data.stations[0].common_name, "ARBENT");
        assert_eq!(data.stations[0].location, GeoPoint::new(5.669, 46.278167));
        assert_eq!(data.stations[0].altitude, 534.0);

        // The missing RR is not an observation, the broken date is skipped.
        assert_eq!(data.records.len(), 3);
        assert_eq!(data.skipped_rows, 1);
        let last = data.records.last().unwrap();
        assert_eq!(last.date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(last.rainfall_mm, 10.0);
    }

    #[test]
    fn test_missing_department() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_department(dir.path(), "2A"),
            Err(RepositoryError::NoDepartmentData { .. })
        ));
    }

    #[test]
    fn test_records_cache_round_trip_per_station() {
        let dir = tempfile::tempdir().unwrap();
        let d = |day| NaiveDate::from_ymd_opt(2020, 3, day).unwrap();
        let records = vec![
            ObservationRecord::new("13054001", d(2), 1.0),
            ObservationRecord::new("13055001", d(1), 7.5),
            ObservationRecord::new("13054001", d(1), 3.25),
        ];
        let path = cache_file(dir.path(), "13");
        write_records_cache(&records, &path).unwrap();

        let frame = scan_records_cache(&path).unwrap();
        let marignane = station_records(frame.clone(), "13054001", &path).unwrap();
        assert_eq!(
            marignane,
            vec![
                ObservationRecord::new("13054001", d(1), 3.25),
                ObservationRecord::new("13054001", d(2), 1.0),
            ]
        );
        assert!(station_records(frame, "99999999", &path).unwrap().is_empty());
    }
}
