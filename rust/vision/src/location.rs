// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Photo-to-place mapping
//!
//! Photos are named after the place they show. A mapping CSV with the
//! columns `파일명` (file name), `숫자` (place id) and `주소` (address with
//! `_` between province, district and road) links each file to its place.

use crate::error::{Error, Result};
use ablemap_core::report::Coordinates;
use ablemap_core::{KakaoMapping, LocationInfo};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct MappingRow {
    #[serde(rename = "파일명")]
    file_name: String,
    #[serde(rename = "숫자")]
    place_id: String,
    #[serde(rename = "주소")]
    address: String,
}

/// Place and location of one photo
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub kakao_mapping: KakaoMapping,
    pub location_info: LocationInfo,
}

/// File name to place lookup
#[derive(Debug, Clone, Default)]
pub struct PlaceMapping {
    entries: HashMap<String, MappingEntry>,
}

impl PlaceMapping {
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        Self::from_reader(std::fs::File::open(path)?)
    }

    /// Parse mapping rows; rows whose address has fewer than two parts are skipped
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut entries = HashMap::new();

        for row in csv.deserialize::<MappingRow>() {
            let row = row?;
            match entry_from_row(&row) {
                Ok(entry) => {
                    entries.insert(row.file_name.clone(), entry);
                }
                Err(e) => tracing::warn!(file = %row.file_name, error = %e, "Skipping mapping row"),
            }
        }

        tracing::info!(entries = entries.len(), "Loaded place mapping");
        Ok(Self { entries })
    }

    pub fn get(&self, file_name: &str) -> Option<&MappingEntry> {
        self.entries.get(file_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn entry_from_row(row: &MappingRow) -> Result<MappingEntry> {
    let mut parts = row.address.split('_');
    let (Some(si_do), Some(cgg)) = (parts.next(), parts.next()) else {
        return Err(Error::InvalidMapping(format!(
            "address '{}' has no district part",
            row.address
        )));
    };
    let road: Vec<&str> = parts.collect();
    let stem = row.file_name.trim_end_matches(".png");

    Ok(MappingEntry {
        kakao_mapping: KakaoMapping {
            place_id: row.place_id.clone(),
            place_name: stem.replace('_', " "),
            coordinates: Coordinates::default(),
        },
        location_info: LocationInfo {
            si_do_nm: Some(si_do.to_string()),
            cgg_nm: Some(cgg.to_string()),
            facl_nm: Some(stem.to_string()),
            road_nm: Some(road.join("_")),
            ..Default::default()
        },
    })
}

/// Location guessed from a `province_district_road` file stem
pub fn location_from_stem(stem: &str) -> LocationInfo {
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() >= 3 {
        LocationInfo {
            si_do_nm: Some(parts[0].to_string()),
            cgg_nm: Some(parts[1].to_string()),
            road_nm: Some(parts[2..].join("_")),
            facl_nm: Some(stem.to_string()),
            ..Default::default()
        }
    } else {
        LocationInfo {
            facl_nm: Some(stem.to_string()),
            ..Default::default()
        }
    }
}
