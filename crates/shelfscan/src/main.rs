//! shelfscan: CLI for locating shelves and book edges in photographs.
//!
//! Decodes a photograph, binarizes it (Otsu or a fixed threshold), runs
//! the geometric segmentation pipeline, and prints a human-readable or
//! JSON report. With `--out-dir` the intermediate images (shelf-line
//! structure, rotated binary, per-shelf regions, edge maps) are written
//! out for inspection; with `--verbose` each detection checkpoint stops
//! for interactive confirmation on stdin.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin shelfscan -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use serde::Serialize;
use shelfscan_pipeline::{
    Checkpoint, Confirm, Confirmation, GrayImage, ShelfAnalysis, ShelfConfig, TransformParams,
};

/// Shelf and book-edge detection for bookshelf photographs.
///
/// Binarizes the input image and runs the segmentation pipeline with
/// configurable parameters, reporting the estimated rotation, shelf
/// bands, and per-shelf edge detections.
#[derive(Parser)]
#[command(name = "shelfscan", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Axis size for the shelf-scale scan (structuring length is
    /// image height divided by this).
    #[arg(long, default_value_t = ShelfConfig::DEFAULT_SHELF_AXIS_SIZE)]
    shelf_axis: u32,

    /// Axis size for the per-region spine-scale scan.
    #[arg(long, default_value_t = ShelfConfig::DEFAULT_SPINE_AXIS_SIZE)]
    spine_axis: u32,

    /// Maximum y-gap in pixels within one shelf band.
    #[arg(long, default_value_t = ShelfConfig::DEFAULT_BAND_GAP)]
    band_gap: f64,

    /// Accumulator angle resolution in degrees.
    #[arg(long, default_value_t = TransformParams::DEFAULT_ANGLE_RESOLUTION)]
    angle_resolution: f64,

    /// Minimum accumulator votes before a candidate line is walked.
    #[arg(long, default_value_t = TransformParams::DEFAULT_VOTE_THRESHOLD)]
    vote_threshold: u32,

    /// Minimum line segment length in pixels.
    #[arg(long, default_value_t = TransformParams::DEFAULT_MIN_LINE_LENGTH)]
    min_line_length: f64,

    /// Maximum in-segment gap in pixels.
    #[arg(long, default_value_t = TransformParams::DEFAULT_MAX_LINE_GAP)]
    max_line_gap: f64,

    /// Binarization threshold (0-255). Omit to use Otsu's method.
    #[arg(long)]
    threshold: Option<u8>,

    /// Invert the binarization (use when the page is bright and the
    /// structure dark).
    #[arg(long)]
    invert: bool,

    /// Directory for intermediate images (created if missing).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Output the report as JSON instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `ShelfConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Confirm each detection checkpoint interactively on stdin.
    #[arg(short, long)]
    verbose: bool,
}

/// Build a [`ShelfConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<ShelfConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(ShelfConfig {
        shelf_axis_size: cli.shelf_axis,
        spine_axis_size: cli.spine_axis,
        band_gap: cli.band_gap,
        transform: TransformParams {
            angle_resolution: cli.angle_resolution,
            vote_threshold: cli.vote_threshold,
            min_line_length: cli.min_line_length,
            max_line_gap: cli.max_line_gap,
        },
    })
}

/// Decode and binarize the input photograph.
///
/// Grayscale conversion, then a fixed or Otsu-derived threshold.
/// `--invert` flips the polarity for dark-structure-on-bright images.
fn binarize(path: &Path, fixed: Option<u8>, invert: bool) -> Result<GrayImage, String> {
    let decoded = image::open(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    let gray = decoded.to_luma8();
    let level = fixed.unwrap_or_else(|| otsu_level(&gray));
    let kind = if invert {
        ThresholdType::BinaryInverted
    } else {
        ThresholdType::Binary
    };
    eprintln!("Binarized at level {level} ({}x{})", gray.width(), gray.height());
    Ok(threshold(&gray, level, kind))
}

/// Interactive stdin confirmation for `--verbose` runs.
///
/// When an output directory is configured the checkpoint image is saved
/// first so the user has something to look at.
struct StdinConfirm {
    out_dir: Option<PathBuf>,
}

impl StdinConfirm {
    fn describe(checkpoint: Checkpoint) -> String {
        match checkpoint {
            Checkpoint::ShelfLines => "shelf-line structure".to_owned(),
            Checkpoint::RegionEdges(index) => format!("edge map for region {index}"),
        }
    }

    fn file_name(checkpoint: Checkpoint) -> String {
        match checkpoint {
            Checkpoint::ShelfLines => "confirm-shelf-lines.png".to_owned(),
            Checkpoint::RegionEdges(index) => format!("confirm-region-{index}.png"),
        }
    }
}

impl Confirm for StdinConfirm {
    fn confirm(&self, checkpoint: Checkpoint, image: &GrayImage, axis_size: u32) -> Confirmation {
        if let Some(ref dir) = self.out_dir {
            let path = dir.join(Self::file_name(checkpoint));
            match image.save(&path) {
                Ok(()) => eprintln!("Checkpoint image written to {}", path.display()),
                Err(e) => eprintln!("Error writing {}: {e}", path.display()),
            }
        }

        eprintln!(
            "Confirm {} (axis size {axis_size})",
            Self::describe(checkpoint),
        );
        eprint!("  [Enter] accept, <number> re-run at that axis size, [n] reject: ");
        let _ = std::io::stderr().flush();

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            eprintln!("Could not read stdin; accepting");
            return Confirmation::Accepted;
        }
        let answer = line.trim();
        if answer.is_empty() || answer.eq_ignore_ascii_case("y") {
            return Confirmation::Accepted;
        }
        if answer.eq_ignore_ascii_case("n") {
            return Confirmation::Rejected;
        }
        match answer.parse::<u32>() {
            Ok(axis) => Confirmation::Adjusted(axis),
            Err(_) => {
                eprintln!("Unrecognized answer {answer:?}; accepting");
                Confirmation::Accepted
            }
        }
    }
}

/// Per-region portion of the run report.
#[derive(Serialize)]
struct RegionReport {
    height: u32,
    horizontal_segments: usize,
    vertical_segments: usize,
}

/// The run report, printed human-readable or as JSON.
#[derive(Serialize)]
struct Report {
    rotation_degrees: Option<f64>,
    bands: Vec<f64>,
    region_count: usize,
    regions: Vec<RegionReport>,
}

impl Report {
    fn from_analysis(analysis: &ShelfAnalysis) -> Self {
        let regions = analysis
            .regions
            .iter()
            .zip(&analysis.scans)
            .map(|(region, scan)| RegionReport {
                height: region.height(),
                horizontal_segments: scan.horizontal.count(),
                vertical_segments: scan.vertical.count(),
            })
            .collect();
        Self {
            rotation_degrees: analysis.rotation_degrees,
            bands: analysis.bands.clone(),
            region_count: analysis.regions.len(),
            regions,
        }
    }

    fn print_human(&self) {
        match self.rotation_degrees {
            Some(angle) => println!("Rotation estimate: {angle:.2} degrees"),
            None => println!("Rotation estimate: none (no shelf lines detected)"),
        }
        if self.bands.is_empty() {
            println!("Shelf bands: none (whole image is one region)");
        } else {
            let rows: Vec<String> = self.bands.iter().map(|b| format!("{b:.1}")).collect();
            println!("Shelf bands: {}", rows.join(", "));
        }
        println!("Regions: {}", self.region_count);
        for (index, region) in self.regions.iter().enumerate() {
            println!(
                "  region {index}: {} rows, {} horizontal / {} vertical edge segments",
                region.height, region.horizontal_segments, region.vertical_segments,
            );
        }
    }
}

/// Write the non-checkpoint intermediate images to `dir`.
fn save_intermediates(dir: &Path, analysis: &ShelfAnalysis) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Error creating {}: {e}", dir.display()))?;

    let save = |image: &GrayImage, name: &str| -> Result<(), String> {
        let path = dir.join(name);
        image
            .save(&path)
            .map_err(|e| format!("Error writing {}: {e}", path.display()))
    };

    save(&analysis.shelf_lines, "shelf-lines.png")?;
    save(&analysis.rotated, "rotated.png")?;
    for (index, region) in analysis.regions.iter().enumerate() {
        save(region, &format!("region-{index}.png"))?;
    }
    for (index, scan) in analysis.scans.iter().enumerate() {
        save(&scan.combined, &format!("edges-{index}.png"))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    // Create the output directory up front so checkpoint images have
    // somewhere to go during confirmation.
    if let Some(ref dir) = cli.out_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("Error creating {}: {e}", dir.display());
        return ExitCode::FAILURE;
    }

    let binary = match binarize(&cli.image_path, cli.threshold, cli.invert) {
        Ok(img) => img,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    if cli.verbose {
        eprintln!("Config: {config:#?}");
    }

    let stdin_confirm = StdinConfirm {
        out_dir: cli.out_dir.clone(),
    };
    let confirm: Option<&dyn Confirm> = cli.verbose.then_some(&stdin_confirm as &dyn Confirm);

    let analysis = match shelfscan_pipeline::analyze(&binary, &config, confirm) {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref dir) = cli.out_dir {
        match save_intermediates(dir, &analysis) {
            Ok(()) => eprintln!("Intermediate images written to {}", dir.display()),
            Err(msg) => {
                eprintln!("{msg}");
                return ExitCode::FAILURE;
            }
        }
    }

    let report = Report::from_analysis(&analysis);
    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        report.print_human();
    }

    ExitCode::SUCCESS
}
