// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ablemap_core::{
    min_distance, AccessibilityAnalyzer, AnalyzerConfig, BinaryMask, ClassMap, DoorWidth,
    ObstacleCategory, SegmentationMap, StairSeverity, StairValidator,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const BUILDING: u32 = 1;
const SIDEWALK: u32 = 11;
const DOOR: u32 = 14;
const STAIRS: u32 = 53;
const RAILING: u32 = 95;
const CAR: u32 = 20;
const POLE: u32 = 93;

fn analyzer() -> AccessibilityAnalyzer {
    AccessibilityAnalyzer::new(AnalyzerConfig::default()).expect("default config is valid")
}

fn blank(width: usize, height: usize) -> SegmentationMap {
    SegmentationMap::filled(width, height, 0).unwrap()
}

/// Door with stairs right below it and a railing beside the stairs
fn entrance_with_railing() -> SegmentationMap {
    let mut map = blank(100, 100);
    map.fill_rect(45, 20, 55, 40, DOOR);
    map.fill_rect(40, 40, 60, 50, STAIRS);
    map.fill_rect(62, 40, 64, 50, RAILING);
    map
}

/// Large regions so the distance estimate actually samples
fn busy_street() -> SegmentationMap {
    let mut map = blank(300, 200);
    map.fill_rect(0, 0, 300, 90, BUILDING);
    map.fill_rect(130, 30, 170, 90, DOOR);
    map.fill_rect(100, 90, 200, 140, STAIRS);
    map.fill_rect(0, 160, 300, 200, SIDEWALK);
    map.fill_rect(205, 90, 215, 140, RAILING);
    map
}

#[test]
fn seeded_analysis_is_repeatable() {
    let analyzer = analyzer();
    let map = busy_street();

    let first = analyzer
        .analyze_with_rng(&map, &mut StdRng::seed_from_u64(42))
        .unwrap();
    let second = analyzer
        .analyze_with_rng(&map, &mut StdRng::seed_from_u64(42))
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn score_stays_in_bounds() {
    let analyzer = analyzer();
    let scenes = [blank(20, 20), entrance_with_railing(), busy_street()];
    for (i, scene) in scenes.iter().enumerate() {
        for seed in 0..5 {
            let info = analyzer
                .analyze_with_rng(scene, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            assert!(
                (1..=10).contains(&info.accessibility_score),
                "scene {} seed {} scored {}",
                i,
                seed,
                info.accessibility_score
            );
        }
    }
}

#[test]
fn empty_scene_is_fully_accessible() {
    let analyzer = analyzer();
    let map = blank(64, 48);
    for _ in 0..2 {
        let info = analyzer.analyze(&map).unwrap();
        assert!(!info.has_stairs);
        assert!(info.entrance_accessible);
        assert!(info.obstacles.is_empty());
        assert!(info.obstacle_details.is_empty());
        assert_eq!(info.stair_severity, StairSeverity::None);
        assert_eq!(info.accessibility_score, 10);
    }
}

#[test]
fn empty_mask_distance_is_infinite() {
    let mut rng = StdRng::seed_from_u64(3);
    let empty = BinaryMask::empty(10, 10).unwrap();
    let map = entrance_with_railing();
    assert_eq!(min_distance(&empty, &map.mask(DOOR), 100, &mut rng), f64::INFINITY);
    assert_eq!(min_distance(&map.mask(DOOR), &empty, 100, &mut rng), f64::INFINITY);
}

#[test]
fn severity_grows_with_step_count() {
    let grades: Vec<StairSeverity> = (0..=5).map(|n| StairSeverity::grade(n, 0.0)).collect();
    assert_eq!(
        grades,
        [
            StairSeverity::None,
            StairSeverity::Mild,
            StairSeverity::Mild,
            StairSeverity::Moderate,
            StairSeverity::Moderate,
            StairSeverity::Severe,
        ]
    );
}

#[test]
fn entrance_stairs_penalty_applies_before_railing_bonus() {
    let info = analyzer()
        .analyze_with_rng(&entrance_with_railing(), &mut StdRng::seed_from_u64(9))
        .unwrap();
    assert!(!info.entrance_accessible);
    assert!(info.has_stairs_railing);
    assert_eq!(info.obstacles, vec!["stairs", "stairs_at_entrance"]);
    assert_eq!(info.stair_severity, StairSeverity::Mild);
    assert_eq!(info.accessibility_score, 6);

    let mut without_railing = entrance_with_railing();
    without_railing.fill_rect(62, 40, 64, 50, 0);
    let info = analyzer()
        .analyze_with_rng(&without_railing, &mut StdRng::seed_from_u64(9))
        .unwrap();
    assert_eq!(info.accessibility_score, 5);
}

#[test]
fn door_width_moves_the_score() {
    // 100x100 frame: 50, 200 and 500 door pixels
    let cases = [
        ((0, 0, 10, 5), DoorWidth::Narrow, 7),
        ((0, 0, 10, 20), DoorWidth::Standard, 10),
        ((0, 0, 10, 50), DoorWidth::Wide, 10),
    ];
    for ((x0, y0, x1, y1), width, score) in cases {
        let mut map = blank(100, 100);
        map.fill_rect(x0, y0, x1, y1, DOOR);
        let info = analyzer().analyze(&map).unwrap();
        assert!(info.has_door);
        assert_eq!(info.door_width(), Some(width));
        assert_eq!(info.accessibility_score, score);
    }
}

#[test]
fn catalog_obstacles_follow_stairs() {
    let entries = ClassMap::default()
        .iter()
        .map(|(name, id)| (name.to_string(), id))
        .chain([("car".to_string(), CAR), ("pole".to_string(), POLE)])
        .collect::<Vec<_>>();
    let config = AnalyzerConfig {
        class_map: ClassMap::new(entries).unwrap(),
        ..Default::default()
    };
    let analyzer = AccessibilityAnalyzer::new(config).unwrap();

    let mut map = blank(100, 100);
    map.fill_rect(10, 60, 30, 70, STAIRS);
    map.fill_rect(50, 50, 62, 60, CAR); // 120 px
    map.fill_rect(80, 10, 83, 15, POLE); // 15 px, below threshold

    let info = analyzer.analyze(&map).unwrap();
    assert_eq!(info.obstacles, vec!["stairs", "car"]);
    assert_eq!(info.additional_obstacles, vec!["car"]);
    let car = info.region("car").unwrap();
    assert_eq!(car.pixel_count, 120);
    assert_eq!(car.obstacle_type, Some(ObstacleCategory::Movable));
    assert!(info.region("pole").is_none());
    // Stairs away from any door only cost two points
    assert_eq!(info.accessibility_score, 8);
}

#[test]
fn confidences_are_probabilities() {
    for scene in [blank(30, 30), entrance_with_railing(), busy_street()] {
        let info = analyzer().analyze(&scene).unwrap();
        for (key, value) in &info.confidence_scores.detections {
            assert!((0.0..=1.0).contains(value), "{} = {}", key, value);
        }
        assert!(info.confidence_scores.overall_reliability.is_some());
    }
}

#[test]
fn stair_validation_can_clear_stairs() {
    let analyzer = analyzer();
    let map = entrance_with_railing();
    let mut info = analyzer.analyze(&map).unwrap();
    assert!(info.has_stairs);

    // A 20x10 stairs region is below the validator's minimum area
    let segments = analyzer.stair_segments(&map).unwrap();
    let validation = StairValidator::default().validate(&segments, 100, 100, None);
    info.apply_stair_validation(validation);

    assert!(!info.has_stairs);
    assert_eq!(info.stair_validation.as_ref().unwrap().final_stair_groups, 0);
    // Everything derived from the rejected stairs goes with them
    assert!(info.entrance_accessible);
    assert!(!info.has_stairs_railing);
    assert!(info.obstacles.is_empty());
    assert_eq!(info.stair_severity, StairSeverity::None);
    assert_eq!(info.accessibility_score, 10);
}
