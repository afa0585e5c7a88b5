// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Public accessibility-facility records and their merge into an analysis
//!
//! Records follow the field names of the public disabled-facility API
//! (`wfcltId`, `faclNm`, `lcMnad`, `faclLat`, `faclLng`, `evalInfo`).
//! Coordinates arrive as strings or numbers.

use crate::error::Result;
use crate::report::LocationInfo;
use serde::{Deserialize, Deserializer, Serialize};

/// Mean earth radius used by the haversine distance, in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Separator between items of `evalInfo`
pub const EVAL_INFO_SEPARATOR: &str = ", ";

pub const ENTRANCE_KEYWORD: &str = "주출입구";
pub const PARKING_KEYWORD: &str = "주차";
pub const RESTROOM_KEYWORD: &str = "화장실";
pub const ELEVATOR_KEYWORD: &str = "엘리베이터";

pub const NOT_FOUND_MESSAGE: &str = "시설 정보를 찾을 수 없습니다.";
pub const NO_LOCATION_MESSAGE: &str = "유효한 위치 정보가 없습니다.";

/// One row of the facility list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    #[serde(rename = "wfcltId", default)]
    pub id: String,
    #[serde(rename = "faclNm", default)]
    pub name: String,
    #[serde(rename = "lcMnad", default)]
    pub address: String,
    #[serde(rename = "faclLat", default, deserialize_with = "coordinate")]
    pub latitude: f64,
    #[serde(rename = "faclLng", default, deserialize_with = "coordinate")]
    pub longitude: f64,
    #[serde(rename = "evalInfo", default, skip_serializing_if = "Option::is_none")]
    pub eval_info: Option<String>,
}

fn coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Missing(()),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(v) => Ok(v),
        Raw::Text(s) if s.trim().is_empty() => Ok(0.0),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Raw::Missing(()) => Ok(0.0),
    }
}

impl FacilityRecord {
    /// Usable for a nearest-record search
    pub fn is_locatable(&self) -> bool {
        !self.id.is_empty() && self.latitude != 0.0 && self.longitude != 0.0
    }

    pub fn eval_items(&self) -> Vec<String> {
        match &self.eval_info {
            Some(info) if !info.is_empty() => info
                .split(EVAL_INFO_SEPARATOR)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Great-circle distance in km
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Closest locatable record and its distance in km
pub fn find_nearest(
    latitude: f64,
    longitude: f64,
    records: &[FacilityRecord],
) -> Option<(&FacilityRecord, f64)> {
    let mut best: Option<(&FacilityRecord, f64)> = None;
    for record in records {
        if !record.is_locatable() {
            if record.id.is_empty() {
                tracing::warn!(name = %record.name, "Facility record without id skipped");
            }
            continue;
        }
        let distance = haversine_km(latitude, longitude, record.latitude, record.longitude);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((record, distance));
        }
    }
    best
}

/// Availability of one feature category and the evaluation items behind it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureGroup {
    pub available: bool,
    pub features: Vec<String>,
}

impl FeatureGroup {
    fn matching(items: &[String], keyword: &str) -> Self {
        let features: Vec<String> = items.iter().filter(|f| f.contains(keyword)).cloned().collect();
        Self {
            available: !features.is_empty(),
            features,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityDetails {
    pub entrance: FeatureGroup,
    pub parking: FeatureGroup,
    pub restroom: FeatureGroup,
    pub elevator: FeatureGroup,
}

/// Facility data merged into a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilityInfo {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_info: Option<FacilityRecord>,
    #[serde(default)]
    pub facility_features: Vec<String>,
    #[serde(default)]
    pub accessibility_details: AccessibilityDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FacilityInfo {
    pub fn from_record(record: &FacilityRecord) -> Self {
        let items = record.eval_items();
        Self {
            available: true,
            accessibility_details: AccessibilityDetails {
                entrance: FeatureGroup::matching(&items, ENTRANCE_KEYWORD),
                parking: FeatureGroup::matching(&items, PARKING_KEYWORD),
                restroom: FeatureGroup::matching(&items, RESTROOM_KEYWORD),
                elevator: FeatureGroup::matching(&items, ELEVATOR_KEYWORD),
            },
            facility_features: items,
            basic_info: Some(record.clone()),
            distance_km: None,
            message: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// How the final score is assembled
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Public facility data combined with the image analysis
    Hybrid,
    ImageOnly,
}

impl AnalysisMode {
    pub fn for_facility(facility: Option<&FacilityInfo>) -> Self {
        match facility {
            Some(f) if f.available => AnalysisMode::Hybrid,
            _ => AnalysisMode::ImageOnly,
        }
    }
}

/// In-memory facility list
#[derive(Debug, Clone, Default)]
pub struct FacilityDirectory {
    records: Vec<FacilityRecord>,
}

impl FacilityDirectory {
    pub fn new(records: Vec<FacilityRecord>) -> Self {
        Self { records }
    }

    /// Parse a JSON array of records
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn records(&self) -> &[FacilityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Facility data for a location.
    ///
    /// Coordinates select the nearest record. Without coordinates the first
    /// record whose address contains every administrative part is used.
    pub fn lookup(&self, location: &LocationInfo) -> FacilityInfo {
        if let (Some(lat), Some(lon)) = (location.latitude, location.longitude) {
            return match find_nearest(lat, lon, &self.records) {
                Some((record, distance)) => {
                    tracing::debug!(facility = %record.name, distance_km = distance, "Nearest facility");
                    FacilityInfo {
                        distance_km: Some(distance),
                        ..FacilityInfo::from_record(record)
                    }
                }
                None => FacilityInfo::unavailable(NOT_FOUND_MESSAGE),
            };
        }

        let parts: Vec<&str> = [&location.si_do_nm, &location.cgg_nm, &location.road_nm]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.is_empty())
            .collect();
        if location.si_do_nm.is_none() || location.cgg_nm.is_none() {
            return FacilityInfo::unavailable(NO_LOCATION_MESSAGE);
        }

        self.records
            .iter()
            .find(|r| parts.iter().all(|p| r.address.contains(p)))
            .map(FacilityInfo::from_record)
            .unwrap_or_else(|| FacilityInfo::unavailable(NOT_FOUND_MESSAGE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, lat: f64, lon: f64) -> FacilityRecord {
        FacilityRecord {
            id: id.into(),
            name: format!("facility {}", id),
            address: "서울특별시 강남구 테헤란로 1".into(),
            latitude: lat,
            longitude: lon,
            eval_info: None,
        }
    }

    #[test]
    fn test_haversine() {
        assert_eq!(haversine_km(37.5, 127.0, 37.5, 127.0), 0.0);
        // One degree of latitude is about 111.2 km
        let d = haversine_km(37.0, 127.0, 38.0, 127.0);
        assert!((d - 111.19).abs() < 0.1, "{}", d);
    }

    #[test]
    fn test_nearest_skips_unusable_records() {
        let records = vec![
            record("", 37.5001, 127.0001),
            record("zero", 0.0, 127.0),
            record("far", 37.6, 127.1),
            record("near", 37.51, 127.01),
        ];
        let (nearest, distance) = find_nearest(37.5, 127.0, &records).unwrap();
        assert_eq!(nearest.id, "near");
        assert!(distance < 2.0);
        assert!(find_nearest(37.5, 127.0, &records[..2]).is_none());
    }

    #[test]
    fn test_eval_info_categories() {
        let mut r = record("a", 37.5, 127.0);
        r.eval_info = Some("주출입구 접근로, 장애인전용주차구역, 주출입구 높이차이 제거, 승강기".into());
        let info = FacilityInfo::from_record(&r);

        assert!(info.available);
        assert_eq!(info.facility_features.len(), 4);
        assert_eq!(info.accessibility_details.entrance.features.len(), 2);
        assert!(info.accessibility_details.parking.available);
        assert!(!info.accessibility_details.restroom.available);
        assert!(!info.accessibility_details.elevator.available);
    }

    #[test]
    fn test_record_from_api_json() {
        let json = r#"[{"wfcltId": "X1", "faclNm": "구청", "lcMnad": "서울특별시 중구",
                        "faclLat": "37.56", "faclLng": 126.97, "evalInfo": "화장실"}]"#;
        let directory = FacilityDirectory::from_json_str(json).unwrap();
        assert_eq!(directory.len(), 1);
        let r = &directory.records()[0];
        assert_eq!(r.latitude, 37.56);
        assert_eq!(r.longitude, 126.97);
        assert!(FacilityInfo::from_record(r).accessibility_details.restroom.available);
    }

    #[test]
    fn test_lookup_by_address_parts() {
        let directory = FacilityDirectory::new(vec![
            FacilityRecord {
                address: "부산광역시 해운대구 센텀로".into(),
                ..record("b", 35.1, 129.1)
            },
            record("s", 37.5, 127.0),
        ]);
        let location = LocationInfo {
            si_do_nm: Some("서울특별시".into()),
            cgg_nm: Some("강남구".into()),
            road_nm: Some("테헤란로".into()),
            ..Default::default()
        };
        let info = directory.lookup(&location);
        assert_eq!(info.basic_info.unwrap().id, "s");

        let info = directory.lookup(&LocationInfo::default());
        assert!(!info.available);
        assert_eq!(info.message.as_deref(), Some(NO_LOCATION_MESSAGE));
    }

    #[test]
    fn test_analysis_mode() {
        assert_eq!(AnalysisMode::for_facility(None), AnalysisMode::ImageOnly);
        let unavailable = FacilityInfo::unavailable(NOT_FOUND_MESSAGE);
        assert_eq!(AnalysisMode::for_facility(Some(&unavailable)), AnalysisMode::ImageOnly);
        let available = FacilityInfo::from_record(&record("a", 37.5, 127.0));
        assert_eq!(AnalysisMode::for_facility(Some(&available)), AnalysisMode::Hybrid);
    }
}
