// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: analyze entrance photos for wheelchair accessibility
//!
//! Each photo needs a segmentation map, either given with `--segmap` or
//! stored next to it as `<stem>_seg.png` / `<stem>_seg.json`.
//!
//! Usage:
//!   ablemap-analyze --image <photo> [options]
//!   ablemap-analyze --dir <photos> [options]
//!   ablemap-analyze --check-server [--api-url <url>] [--api-key <key>]

use ablemap_core::{explain, AnalyzerConfig, FacilityDirectory};
use ablemap_vision::{
    ImageJob, Pipeline, PipelineOptions, PlaceMapping, StorageClient, DEFAULT_API_KEY,
    DEFAULT_API_URL,
};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Args {
    image: Option<PathBuf>,
    segmap: Option<PathBuf>,
    dir: Option<PathBuf>,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    facilities: Option<PathBuf>,
    mapping: Option<PathBuf>,
    llm_response: Option<PathBuf>,
    seed: Option<u64>,
    validate_stairs: bool,
    send_to_api: bool,
    api_url: Option<String>,
    api_key: Option<String>,
    check_server: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = parse_args();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> ablemap_vision::Result<()> {
    let api_url = args
        .api_url
        .clone()
        .or_else(|| env::var("API_SERVER_URL").ok())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let api_key = args
        .api_key
        .clone()
        .or_else(|| env::var("API_SERVER_KEY").ok())
        .unwrap_or_else(|| DEFAULT_API_KEY.to_string());

    if args.check_server {
        let client = StorageClient::new(&api_url, &api_key)?;
        client.ping()?;
        println!("Storage API reachable at {}", client.base_url());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => AnalyzerConfig::from_json_str(&fs::read_to_string(path)?)?,
        None => AnalyzerConfig::default(),
    };

    let options = PipelineOptions {
        output_dir: args.output.clone().unwrap_or_else(|| PathBuf::from("output")),
        seed: args.seed,
        validate_stairs: args.validate_stairs,
        ..Default::default()
    };

    let mut pipeline = Pipeline::new(config, options)?;
    if let Some(path) = &args.mapping {
        pipeline = pipeline.with_mapping(PlaceMapping::from_path(path)?);
    }
    if let Some(path) = &args.facilities {
        let directory = FacilityDirectory::from_json_str(&fs::read_to_string(path)?)?;
        tracing::info!(records = directory.len(), "Loaded facility records");
        pipeline = pipeline.with_facilities(directory);
    }
    if args.send_to_api {
        let client = StorageClient::new(&api_url, &api_key)?;
        if let Err(e) = client.ping() {
            tracing::warn!(error = %e, "Storage API not reachable, reports will only be saved locally");
        } else {
            pipeline = pipeline.with_storage(client);
        }
    }

    if let Some(dir) = &args.dir {
        let summary = pipeline.process_directory(dir)?;
        println!(
            "Processed {} images: {} succeeded, {} failed",
            summary.total(),
            summary.reports.len(),
            summary.failures.len()
        );
        for (image, error) in &summary.failures {
            println!("  {}: {}", image.display(), error);
        }
        if !summary.failures.is_empty() && summary.reports.is_empty() {
            process::exit(1);
        }
        return Ok(());
    }

    let Some(image) = &args.image else {
        print_usage();
        process::exit(1);
    };

    let job = match &args.segmap {
        Some(segmap) => ImageJob {
            image: image.clone(),
            segmap: segmap.clone(),
            llm_response: args.llm_response.clone(),
        },
        None => {
            let mut job = ImageJob::discover(image)?;
            if args.llm_response.is_some() {
                job.llm_response = args.llm_response.clone();
            }
            job
        }
    };

    let report = pipeline.process_image(&job, 0)?;
    let info = &report.accessibility_info;
    println!("Accessibility score: {}/10", info.accessibility_score);
    println!("  {}", explain(info));
    println!("  Obstacles: {}", info.obstacles.join(", "));
    println!("  Analysis mode: {:?}", report.analysis_mode);
    Ok(())
}

fn parse_args() -> Args {
    let argv: Vec<String> = env::args().collect();
    if argv.len() < 2 || argv[1] == "--help" || argv[1] == "-h" {
        print_usage();
        process::exit(0);
    }

    let mut args = Args::default();
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--image" => args.image = Some(PathBuf::from(value(&argv, &mut i))),
            "--segmap" => args.segmap = Some(PathBuf::from(value(&argv, &mut i))),
            "--dir" => args.dir = Some(PathBuf::from(value(&argv, &mut i))),
            "--output" => args.output = Some(PathBuf::from(value(&argv, &mut i))),
            "--config" => args.config = Some(PathBuf::from(value(&argv, &mut i))),
            "--facilities" => args.facilities = Some(PathBuf::from(value(&argv, &mut i))),
            "--mapping" => args.mapping = Some(PathBuf::from(value(&argv, &mut i))),
            "--llm-response" => args.llm_response = Some(PathBuf::from(value(&argv, &mut i))),
            "--seed" => {
                let raw = value(&argv, &mut i);
                args.seed = Some(raw.parse().unwrap_or_else(|_| {
                    eprintln!("Invalid seed value: {}", raw);
                    process::exit(1);
                }));
            }
            "--api-url" => args.api_url = Some(value(&argv, &mut i)),
            "--api-key" => args.api_key = Some(value(&argv, &mut i)),
            "--validate-stairs" => args.validate_stairs = true,
            "--api" => args.send_to_api = true,
            "--check-server" => args.check_server = true,
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }
    args
}

fn value(argv: &[String], i: &mut usize) -> String {
    *i += 1;
    match argv.get(*i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("Missing value for {}", argv[*i - 1]);
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Usage: ablemap-analyze (--image <photo> | --dir <photos> | --check-server) [options]");
    println!();
    println!("Options:");
    println!("  --image <path>         Photo to analyze");
    println!("  --segmap <path>        Segmentation map (default: <stem>_seg.png|json)");
    println!("  --dir <path>           Analyze every photo in a directory");
    println!("  --output <path>        Output directory (default: output)");
    println!("  --config <path>        Analyzer configuration JSON");
    println!("  --facilities <path>    Facility records JSON");
    println!("  --mapping <path>       Photo-to-place mapping CSV");
    println!("  --llm-response <path>  Saved model answer for --image");
    println!("  --seed <n>             Seed for distance sampling");
    println!("  --validate-stairs      Filter stair segments against the photo");
    println!("  --api                  Upload reports to the storage API");
    println!("  --api-url <url>        Storage API URL (env API_SERVER_URL)");
    println!("  --api-key <key>        Storage API key (env API_SERVER_KEY)");
    println!("  --check-server         Ping the storage API and exit");
    println!();
    println!("Set RUST_LOG=debug for verbose logging.");
}
