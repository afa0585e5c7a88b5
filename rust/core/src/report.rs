// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Report documents written per image and exchanged with the storage API

use crate::facility::{AnalysisMode, FacilityInfo};
use crate::llm::LlmAnalysis;
use crate::scoring::{explain_in, Locale};
use crate::types::AccessibilityInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a photo was taken, as far as it is known
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    #[serde(rename = "siDoNm", default, skip_serializing_if = "Option::is_none")]
    pub si_do_nm: Option<String>,
    #[serde(rename = "cggNm", default, skip_serializing_if = "Option::is_none")]
    pub cgg_nm: Option<String>,
    #[serde(rename = "faclNm", default, skip_serializing_if = "Option::is_none")]
    pub facl_nm: Option<String>,
    #[serde(rename = "roadNm", default, skip_serializing_if = "Option::is_none")]
    pub road_nm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_name: Option<String>,
}

impl LocationInfo {
    /// Both latitude and longitude are known
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Map-service place a photo was matched to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KakaoMapping {
    pub place_id: String,
    pub place_name: String,
    #[serde(default)]
    pub coordinates: Coordinates,
}

/// Everything produced for one analyzed image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub image_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kakao_mapping: Option<KakaoMapping>,
    pub location_info: LocationInfo,
    pub accessibility_info: AccessibilityInfo,
    pub explanation: String,
    pub analysis_mode: AnalysisMode,
    pub facility_info: Option<FacilityInfo>,
    pub llm_analysis: Option<LlmAnalysis>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn new(
        image_path: impl Into<String>,
        location_info: LocationInfo,
        accessibility_info: AccessibilityInfo,
        facility_info: Option<FacilityInfo>,
    ) -> Self {
        let facility_info = facility_info.filter(|f| f.available);
        Self {
            image_path: image_path.into(),
            overlay_path: None,
            kakao_mapping: None,
            explanation: explain_in(&accessibility_info, Locale::Korean).to_string(),
            analysis_mode: AnalysisMode::for_facility(facility_info.as_ref()),
            location_info,
            accessibility_info,
            facility_info,
            llm_analysis: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a model answer, stamping it with the analysis mode
    pub fn with_llm_analysis(mut self, mut analysis: LlmAnalysis) -> Self {
        analysis.analysis_mode = Some(self.analysis_mode);
        if analysis.stair_validation_details.is_none() {
            analysis.stair_validation_details = self.accessibility_info.stair_validation.clone();
        }
        self.llm_analysis = Some(analysis);
        self
    }

    /// Payload for the storage API
    pub fn to_record(&self) -> AccessibilityRecord {
        AccessibilityRecord {
            location: self.location_info.clone(),
            accessibility: self.accessibility_info.clone(),
            facility: self.facility_info.as_ref().map(FacilitySummary::from),
            ai_analysis: self.llm_analysis.clone(),
            timestamp: self.timestamp,
            image_path: Some(self.image_path.clone()),
            overlay_path: self.overlay_path.clone(),
        }
    }
}

/// Written instead of a report when processing an image fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: String,
    pub image_path: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorReport {
    pub fn new(image_path: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            error: format!("Processing error: {}", error),
            image_path: image_path.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Flat facility flags stored alongside a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilitySummary {
    pub available: bool,
    pub facility_name: Option<String>,
    pub address: Option<String>,
    pub accessible_entrance: bool,
    pub parking: bool,
    pub disabled_toilet: bool,
    pub elevator: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance: Option<f64>,
    pub message: Option<String>,
}

impl From<&FacilityInfo> for FacilitySummary {
    fn from(info: &FacilityInfo) -> Self {
        let details = &info.accessibility_details;
        let basic = info.basic_info.as_ref();
        Self {
            available: info.available,
            facility_name: basic.map(|b| b.name.clone()),
            address: basic.map(|b| b.address.clone()),
            accessible_entrance: details.entrance.available,
            parking: details.parking.available,
            disabled_toilet: details.restroom.available,
            elevator: details.elevator.available,
            latitude: basic.map(|b| b.latitude),
            longitude: basic.map(|b| b.longitude),
            distance: info.distance_km,
            message: info.message.clone(),
        }
    }
}

/// Document accepted and returned by the storage API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityRecord {
    pub location: LocationInfo,
    pub accessibility: AccessibilityInfo,
    #[serde(default)]
    pub facility: Option<FacilitySummary>,
    #[serde(default)]
    pub ai_analysis: Option<LlmAnalysis>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub overlay_path: Option<String>,
}

impl AccessibilityRecord {
    /// Storage id `{unix_ts}_{lat}_{lon}`, missing coordinates written as 0
    pub fn data_id(&self, unix_ts: i64) -> String {
        format!(
            "{}_{}_{}",
            unix_ts,
            self.location.latitude.unwrap_or(0.0),
            self.location.longitude.unwrap_or(0.0)
        )
    }
}

/// Storage API answer to a store request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreResponse {
    pub status: StoreStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    Success,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility::FacilityRecord;

    #[test]
    fn test_mode_follows_facility() {
        let info = AccessibilityInfo::default();
        let report = AnalysisReport::new("a.jpg", LocationInfo::default(), info.clone(), None);
        assert_eq!(report.analysis_mode, AnalysisMode::ImageOnly);
        assert!(report.explanation.starts_with("매우 높은 접근성"));

        let unavailable = FacilityInfo::unavailable("none");
        let report = AnalysisReport::new("a.jpg", LocationInfo::default(), info.clone(), Some(unavailable));
        assert_eq!(report.analysis_mode, AnalysisMode::ImageOnly);
        assert!(report.facility_info.is_none());

        let record = FacilityRecord {
            id: "1".into(),
            eval_info: Some("장애인전용주차구역".into()),
            ..Default::default()
        };
        let report = AnalysisReport::new(
            "a.jpg",
            LocationInfo::default(),
            info,
            Some(FacilityInfo::from_record(&record)),
        )
        .with_llm_analysis(LlmAnalysis::default());
        assert_eq!(report.analysis_mode, AnalysisMode::Hybrid);
        assert_eq!(
            report.llm_analysis.as_ref().unwrap().analysis_mode,
            Some(AnalysisMode::Hybrid)
        );
        assert!(report.to_record().facility.unwrap().parking);
    }

    #[test]
    fn test_location_field_names() {
        let location = LocationInfo {
            si_do_nm: Some("서울특별시".into()),
            road_nm: Some("세종대로_110".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["siDoNm"], "서울특별시");
        assert_eq!(json["roadNm"], "세종대로_110");
        assert!(json.get("latitude").is_none());
    }

    #[test]
    fn test_coordinates_need_both_axes() {
        let mut location = LocationInfo {
            latitude: Some(37.5),
            ..Default::default()
        };
        assert!(!location.has_coordinates());
        location.longitude = Some(127.0);
        assert!(location.has_coordinates());
    }

    #[test]
    fn test_data_id() {
        let record: AccessibilityRecord = serde_json::from_value(serde_json::json!({
            "location": {"latitude": 37.5, "longitude": 127.25},
            "accessibility": {"has_stairs": true}
        }))
        .unwrap();
        assert_eq!(record.data_id(1700000000), "1700000000_37.5_127.25");
        assert!(record.accessibility.entrance_accessible);
        assert_eq!(record.accessibility.accessibility_score, 10);
    }
}
