//! Bigshot CLI - image pyramids and cube-face panoramas.
//!
//! Turns large images into tiled pyramids for zoomable viewers, optionally
//! projecting equirectangular or cylindrical panoramas to cube faces first.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use bigshot::archive::{pack, ArchiveReader};
use bigshot::pipeline::{process, Preset, ProcessOptions, ProcessOutcome, Transform};
use bigshot::projection::Orientation;
use bigshot::pyramid::{
    DescriptorFormat, FolderLayout, LevelNumbering, LevelPolicy, OutputFormat, PyramidSummary,
};
use bigshot::raster::ImageFormat;

/// Image pyramid and panorama tool.
#[derive(Parser)]
#[command(name = "bigshot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an image pyramid, a cube-face set of pyramids, or a single view.
    Pyramid {
        /// Input image.
        input: PathBuf,

        /// Output directory, archive file, or image file.
        output: PathBuf,

        /// Transform applied before tiling.
        #[arg(long)]
        transform: Option<TransformArg>,

        /// Parameter preset; explicit options override it.
        #[arg(long)]
        preset: Option<PresetArg>,

        /// Write a single packed archive instead of a folder tree.
        #[arg(long)]
        archive: bool,

        // Pyramid options
        /// Tile size in pixels, excluding overlap.
        #[arg(long)]
        tile_size: Option<u32>,

        /// Pixels of overlap between adjacent tiles.
        #[arg(long)]
        overlap: Option<u32>,

        /// Number of pyramid levels.
        #[arg(long, conflicts_with = "wrap_x")]
        levels: Option<u32>,

        /// Derive the level count from how often the width halves into whole tiles.
        #[arg(long)]
        wrap_x: bool,

        /// Number levels from the smallest (0) up instead of from full resolution.
        #[arg(long)]
        invert_levels: bool,

        /// Descriptor format.
        #[arg(long)]
        descriptor_format: Option<DescriptorArg>,

        /// Folder layout.
        #[arg(long)]
        folder_layout: Option<LayoutArg>,

        /// Tile image format.
        #[arg(long, default_value = "jpg")]
        image_format: ImageFormatArg,

        /// JPEG quality (0-1].
        #[arg(long, default_value = "0.7")]
        jpeg_quality: f32,

        /// Longest side of the poster image.
        #[arg(long, default_value = "512")]
        poster_size: u32,

        // Projection options
        /// Cube face size in pixels, excluding overlap.
        #[arg(long)]
        face_size: Option<u32>,

        /// Samples per output pixel along each axis.
        #[arg(long, default_value = "1")]
        oversampling: u32,

        /// Random sample displacement; 0 disables.
        #[arg(long, default_value = "0")]
        jitter: f64,

        /// Seed for jittered sampling.
        #[arg(long, default_value = "24301")]
        jitter_seed: u64,

        /// Fill the area above the map from its top row.
        #[arg(long)]
        top_cap: bool,

        /// Fill the area below the map from its bottom row.
        #[arg(long)]
        bottom_cap: bool,

        /// Leveling yaw offset in degrees.
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        yaw_offset: f64,

        /// Leveling pitch offset in degrees.
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pitch_offset: f64,

        /// Leveling roll offset in degrees.
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        roll_offset: f64,

        /// Hugin .pto project describing the input map.
        #[arg(long)]
        pto: Option<PathBuf>,

        /// Input vertical field of view in degrees.
        #[arg(long)]
        input_vfov: Option<f64>,

        /// Input horizontal field of view in degrees.
        #[arg(long)]
        input_hfov: Option<f64>,

        /// Pixel row of the horizon in the input map.
        #[arg(long)]
        input_horizon: Option<i64>,

        /// Worker threads for projection (default: all cores).
        #[arg(long)]
        threads: Option<usize>,

        /// Directory for archive staging (default: system temp directory).
        #[arg(long)]
        temp_dir: Option<PathBuf>,

        // Single view options
        /// Vertical field of view of a single view, in degrees.
        #[arg(long, default_value = "60")]
        fov: f64,

        /// View yaw in degrees.
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        yaw: f64,

        /// View pitch in degrees.
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pitch: f64,

        /// View roll in degrees.
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        roll: f64,

        /// Width of a single view.
        #[arg(long, default_value = "640")]
        width: u32,

        /// Height of a single view.
        #[arg(long, default_value = "480")]
        height: u32,
    },

    /// Pack a directory into a single archive file.
    Pack {
        /// Directory to pack.
        source: PathBuf,

        /// Archive file to write.
        output: PathBuf,
    },

    /// List the entries of an archive file.
    Inspect {
        /// Archive file to read.
        archive: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TransformArg {
    /// Tile the input unchanged.
    None,
    /// Equirectangular map to six cube faces.
    Facemap,
    /// Cylindrical map to six cube faces.
    CylinderFacemap,
    /// One rectilinear view.
    Face,
}

#[derive(Clone, Copy, ValueEnum)]
enum PresetArg {
    /// Six Deep Zoom pyramids sized for the input.
    DziCubemap,
}

#[derive(Clone, Copy, ValueEnum)]
enum DescriptorArg {
    Bigshot,
    Dzi,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Bigshot,
    Dzi,
}

#[derive(Clone, Copy, ValueEnum)]
enum ImageFormatArg {
    Jpg,
    Png,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pyramid {
            input,
            output,
            transform,
            preset,
            archive,
            tile_size,
            overlap,
            levels,
            wrap_x,
            invert_levels,
            descriptor_format,
            folder_layout,
            image_format,
            jpeg_quality,
            poster_size,
            face_size,
            oversampling,
            jitter,
            jitter_seed,
            top_cap,
            bottom_cap,
            yaw_offset,
            pitch_offset,
            roll_offset,
            pto,
            input_vfov,
            input_hfov,
            input_horizon,
            threads,
            temp_dir,
            fov,
            yaw,
            pitch,
            roll,
            width,
            height,
        } => {
            let levels = if wrap_x {
                Some(LevelPolicy::WrapX)
            } else {
                levels.map(LevelPolicy::Count)
            };
            let options = ProcessOptions {
                transform: transform.map(|t| match t {
                    TransformArg::None => Transform::None,
                    TransformArg::Facemap => Transform::Facemap,
                    TransformArg::CylinderFacemap => Transform::CylinderFacemap,
                    TransformArg::Face => Transform::Face,
                }),
                preset: preset.map(|p| match p {
                    PresetArg::DziCubemap => Preset::DziCubemap,
                }),
                tile_size,
                overlap,
                levels,
                level_numbering: invert_levels.then_some(LevelNumbering::Inverted),
                descriptor_format: descriptor_format.map(|d| match d {
                    DescriptorArg::Bigshot => DescriptorFormat::Bigshot,
                    DescriptorArg::Dzi => DescriptorFormat::Dzi,
                }),
                folder_layout: folder_layout.map(|l| match l {
                    LayoutArg::Bigshot => FolderLayout::Bigshot,
                    LayoutArg::Dzi => FolderLayout::Dzi,
                }),
                output_format: if archive {
                    OutputFormat::Archive
                } else {
                    OutputFormat::Folders
                },
                poster_size,
                image_format: match image_format {
                    ImageFormatArg::Jpg => ImageFormat::Jpeg,
                    ImageFormatArg::Png => ImageFormat::Png,
                },
                jpeg_quality,
                face_size,
                oversampling,
                jitter,
                jitter_seed,
                top_cap,
                bottom_cap,
                offset: Orientation::new(yaw_offset, pitch_offset, roll_offset),
                pto,
                input_vfov,
                input_hfov,
                input_horizon,
                threads,
                staging_root: temp_dir,
                fov,
                view: Orientation::new(yaw, pitch, roll),
                output_width: width,
                output_height: height,
            };
            run_pyramid(input, output, options);
        }
        Commands::Pack { source, output } => {
            run_pack(source, output);
        }
        Commands::Inspect { archive } => {
            run_inspect(archive);
        }
    }
}

fn run_pyramid(input: PathBuf, output: PathBuf, options: ProcessOptions) {
    println!("Bigshot - Image Pyramid Builder");
    println!("===============================");
    println!("Input:  {}", input.display());
    println!("Output: {}", output.display());
    println!();

    let start = Instant::now();
    let outcome = process(&input, &output, &options).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    match outcome {
        ProcessOutcome::Pyramid(summary) => print_summary(&summary),
        ProcessOutcome::Facemap(pyramids) => {
            for (face, summary) in &pyramids {
                println!("{}:", face.short_name());
                print_summary(summary);
            }
        }
        ProcessOutcome::Face { width, height } => {
            println!("Wrote {}x{} view", width, height);
        }
    }

    println!("\nTotal time: {:.2?}", start.elapsed());
    println!("Done!");
}

fn print_summary(summary: &PyramidSummary) {
    println!(
        "  Poster: {}x{}",
        summary.poster_width, summary.poster_height
    );
    for level in &summary.levels {
        println!(
            "  Level {:>3}: {:>6}x{:<6} {:>4} tiles ({}x{})",
            level.directory,
            level.width,
            level.height,
            level.tile_count(),
            level.columns,
            level.rows
        );
    }
    println!("  Total tiles: {}", summary.tile_count());
}

fn run_pack(source: PathBuf, output: PathBuf) {
    let start = Instant::now();
    let entries = pack(&source, &output).unwrap_or_else(|e| {
        eprintln!("Error packing {}: {}", source.display(), e);
        std::process::exit(1);
    });
    let bytes: u64 = entries.iter().map(|e| e.length).sum();
    println!(
        "Packed {} files ({:.2} MB) into {} in {:.2?}",
        entries.len(),
        bytes as f64 / 1024.0 / 1024.0,
        output.display(),
        start.elapsed()
    );
}

fn run_inspect(archive: PathBuf) {
    let reader = ArchiveReader::open(&archive).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", archive.display(), e);
        std::process::exit(1);
    });

    println!("{}: {} entries", archive.display(), reader.entries().len());
    println!("{:>12} {:>12}  path", "offset", "length");
    for entry in reader.entries() {
        println!("{:>12} {:>12}  {}", entry.offset, entry.length, entry.path);
    }
}
