// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-image processing: photo and segmentation map in, report out
//!
//! For each image the pipeline runs the analyzer, renders the overlay,
//! optionally validates stair segments against the photo, merges facility
//! records and the model's answer, writes the report and optionally uploads
//! it. A failing image leaves an error report behind instead.

use crate::error::{Error, Result};
use crate::location::{location_from_stem, PlaceMapping};
use crate::overlay::{render_overlay, ColorMap, DEFAULT_ALPHA};
use crate::segmap_io::load_segmap;
use crate::storage_client::StorageClient;
use ablemap_core::{
    AccessibilityAnalyzer, AnalysisReport, AnalyzerConfig, ErrorReport, FacilityDirectory,
    LlmAnalysis, SegmentationMap, StairValidator, StoreStatus,
};
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Suffix of the segmentation map stored next to a photo
pub const SEGMAP_SUFFIX: &str = "_seg";
/// Suffix of a saved model answer stored next to a photo
pub const LLM_RESPONSE_SUFFIX: &str = "_llm";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
const SEGMAP_EXTENSIONS: &[&str] = &["png", "json"];

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub output_dir: PathBuf,
    /// Base seed; image `i` of a run uses `seed + i`
    pub seed: Option<u64>,
    pub validate_stairs: bool,
    pub overlay_alpha: f32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            seed: None,
            validate_stairs: false,
            overlay_alpha: DEFAULT_ALPHA,
        }
    }
}

/// Input files of one image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageJob {
    pub image: PathBuf,
    pub segmap: PathBuf,
    pub llm_response: Option<PathBuf>,
}

impl ImageJob {
    /// Find the companion files `<stem>_seg.{png,json}` and `<stem>_llm.txt`
    pub fn discover(image: &Path) -> Result<Self> {
        let stem = file_stem(image);
        let dir = image.parent().unwrap_or_else(|| Path::new("."));

        let segmap = SEGMAP_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}{}.{}", stem, SEGMAP_SUFFIX, ext)))
            .find(|p| p.exists())
            .ok_or_else(|| Error::MissingSegmap(image.to_path_buf()))?;

        let llm_response = Some(dir.join(format!("{}{}.txt", stem, LLM_RESPONSE_SUFFIX)))
            .filter(|p| p.exists());

        Ok(Self {
            image: image.to_path_buf(),
            segmap,
            llm_response,
        })
    }
}

/// Where the outputs of one image go
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub reports_dir: PathBuf,
    pub report: PathBuf,
    pub overlay: PathBuf,
}

impl OutputPaths {
    pub fn new(output_dir: &Path, stem: &str) -> Self {
        let reports_dir = output_dir.join("reports");
        Self {
            report: reports_dir.join(format!("{}_report.json", stem)),
            overlay: output_dir.join("overlays").join(format!("{}_overlay.png", stem)),
            reports_dir,
        }
    }

    pub fn error_report(&self, stem: &str) -> PathBuf {
        let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
        self.reports_dir.join(format!("{}_error_{}.json", stem, ts))
    }
}

/// Outcome of a directory run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<AnalysisReport>,
    pub failures: Vec<(PathBuf, String)>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.reports.len() + self.failures.len()
    }
}

pub struct Pipeline {
    analyzer: AccessibilityAnalyzer,
    validator: StairValidator,
    colors: ColorMap,
    mapping: PlaceMapping,
    facilities: Option<FacilityDirectory>,
    storage: Option<StorageClient>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(config: AnalyzerConfig, options: PipelineOptions) -> Result<Self> {
        let colors = ColorMap::for_classes(&config.class_map);
        Ok(Self {
            analyzer: AccessibilityAnalyzer::new(config)?,
            validator: StairValidator::default(),
            colors,
            mapping: PlaceMapping::default(),
            facilities: None,
            storage: None,
            options,
        })
    }

    pub fn with_mapping(mut self, mapping: PlaceMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_facilities(mut self, facilities: FacilityDirectory) -> Self {
        self.facilities = Some(facilities);
        self
    }

    pub fn with_storage(mut self, storage: StorageClient) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_validator(mut self, validator: StairValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Process one image; image `index` of a run picks the seed offset.
    ///
    /// On failure an error report is written before the error is returned.
    pub fn process_image(&self, job: &ImageJob, index: u64) -> Result<AnalysisReport> {
        let stem = file_stem(&job.image);
        let paths = OutputPaths::new(&self.options.output_dir, &stem);

        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index)),
            None => StdRng::from_entropy(),
        };

        match self.run(job, &stem, &paths, &mut rng) {
            Ok(report) => Ok(report),
            Err(e) => {
                tracing::error!(image = %job.image.display(), error = %e, "Processing failed");
                let error_report = ErrorReport::new(job.image.display().to_string(), &e);
                let path = paths.error_report(&stem);
                if let Err(write_err) = write_json(&path, &error_report) {
                    tracing::warn!(path = %path.display(), error = %write_err, "Could not write error report");
                }
                Err(e)
            }
        }
    }

    /// Process every photo of a directory in parallel
    pub fn process_directory(&self, dir: &Path) -> Result<RunSummary> {
        let images = list_images(dir)?;
        tracing::info!(dir = %dir.display(), images = images.len(), "Processing directory");

        let outcomes: Vec<(PathBuf, Result<AnalysisReport>)> = images
            .par_iter()
            .enumerate()
            .map(|(index, image)| {
                let outcome = match ImageJob::discover(image) {
                    Ok(job) => self.process_image(&job, index as u64),
                    Err(e) => {
                        let stem = file_stem(image);
                        let paths = OutputPaths::new(&self.options.output_dir, &stem);
                        let error_report = ErrorReport::new(image.display().to_string(), &e);
                        if let Err(write_err) = write_json(&paths.error_report(&stem), &error_report) {
                            tracing::warn!(error = %write_err, "Could not write error report");
                        }
                        Err(e)
                    }
                };
                (image.clone(), outcome)
            })
            .collect();

        let mut summary = RunSummary::default();
        for (image, outcome) in outcomes {
            match outcome {
                Ok(report) => summary.reports.push(report),
                Err(e) => summary.failures.push((image, e.to_string())),
            }
        }

        tracing::info!(
            total = summary.total(),
            succeeded = summary.reports.len(),
            failed = summary.failures.len(),
            "Directory processed"
        );
        Ok(summary)
    }

    fn run(
        &self,
        job: &ImageJob,
        stem: &str,
        paths: &OutputPaths,
        rng: &mut StdRng,
    ) -> Result<AnalysisReport> {
        if !job.image.exists() {
            return Err(Error::NotFound(job.image.clone()));
        }

        tracing::info!(image = %job.image.display(), "Processing image");
        let photo = image::open(&job.image)?;
        let seg = load_segmap(&job.segmap)?;

        tracing::debug!("Analyzing accessibility");
        let mut info = self.analyzer.analyze_with_rng(&seg, rng)?;

        let overlay = render_overlay(&photo.to_rgb8(), &seg, &self.colors, self.options.overlay_alpha);
        save_image(&overlay, &paths.overlay)?;

        if self.options.validate_stairs && info.has_stairs {
            let segments = self.analyzer.stair_segments(&seg)?;
            let gray = gray_in_frame(&photo.to_luma8(), &seg);
            let validation =
                self.validator
                    .validate(&segments, seg.width() as u32, seg.height() as u32, Some(&gray));
            tracing::info!(
                groups = validation.final_stair_groups,
                confidence = validation.confidence_score,
                "Stair validation"
            );
            info.apply_stair_validation(validation);
        }

        let file_name = job
            .image
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let (kakao_mapping, location) = match self.mapping.get(file_name) {
            Some(entry) => (Some(entry.kakao_mapping.clone()), entry.location_info.clone()),
            None => (None, location_from_stem(stem)),
        };

        let facility = self.facilities.as_ref().map(|d| d.lookup(&location));
        let mut report = AnalysisReport::new(job.image.display().to_string(), location, info, facility);
        report.overlay_path = Some(paths.overlay.display().to_string());
        report.kakao_mapping = kakao_mapping;
        tracing::info!(mode = ?report.analysis_mode, "Facility data merged");

        if let Some(path) = &job.llm_response {
            let text = fs::read_to_string(path)?;
            report = report.with_llm_analysis(LlmAnalysis::from_response_text(&text));
        }

        write_json(&paths.report, &report)?;
        tracing::info!(report = %paths.report.display(), score = report.accessibility_info.accessibility_score, "Report saved");

        if let Some(storage) = &self.storage {
            match storage.send_report(&report.to_record()) {
                Ok(resp) if resp.status == StoreStatus::Success => {
                    tracing::info!(data_id = ?resp.data_id, "Report stored")
                }
                Ok(resp) => tracing::warn!(message = %resp.message, "Storage API rejected report"),
                Err(e) => tracing::warn!(error = %e, "Storage upload failed"),
            }
        }

        Ok(report)
    }
}

/// Photo in grayscale at the segmentation map's resolution
fn gray_in_frame(gray: &GrayImage, seg: &SegmentationMap) -> GrayImage {
    let (width, height) = (seg.width() as u32, seg.height() as u32);
    if gray.dimensions() == (width, height) {
        gray.clone()
    } else {
        imageops::resize(gray, width, height, FilterType::Triangle)
    }
}

/// Photos of a directory in name order, skipping companion files
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(dir.to_path_buf()));
    }
    let mut images: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();
            IMAGE_EXTENSIONS.contains(&ext.as_str()) && !file_stem(path).ends_with(SEGMAP_SUFFIX)
        })
        .collect();
    images.sort();
    Ok(images)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}

fn save_image(image: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    image.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths() {
        let paths = OutputPaths::new(Path::new("/tmp/out"), "door_1");
        assert_eq!(paths.report, Path::new("/tmp/out/reports/door_1_report.json"));
        assert_eq!(paths.overlay, Path::new("/tmp/out/overlays/door_1_overlay.png"));
        let error = paths.error_report("door_1");
        let name = error.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("door_1_error_"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn test_discover_companions() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("shop.jpg");
        fs::write(&image, b"").unwrap();
        assert!(matches!(ImageJob::discover(&image), Err(Error::MissingSegmap(_))));

        fs::write(dir.path().join("shop_seg.json"), b"[[0]]").unwrap();
        fs::write(dir.path().join("shop_llm.txt"), b"{}").unwrap();
        let job = ImageJob::discover(&image).unwrap();
        assert_eq!(job.segmap, dir.path().join("shop_seg.json"));
        assert_eq!(job.llm_response, Some(dir.path().join("shop_llm.txt")));
    }

    #[test]
    fn test_list_images_skips_segmaps() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "a_seg.png", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let images = list_images(dir.path()).unwrap();
        let names: Vec<&str> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png"]);
    }
}
