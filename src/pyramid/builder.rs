//! Level-by-level tile generation.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use super::descriptor::PyramidDescriptor;
use super::params::{DescriptorFormat, FolderLayout, OutputFormat, PyramidParameters};
use super::PyramidError;
use crate::archive;
use crate::raster::{read_image, write_image, ImageCodec, RasterImage};

/// One generated level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidLevel {
    /// Name of the level directory.
    pub directory: String,
    pub width: u32,
    pub height: u32,
    pub columns: u32,
    pub rows: u32,
}

impl PyramidLevel {
    pub fn tile_count(&self) -> u32 {
        self.columns * self.rows
    }
}

/// What a build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidSummary {
    /// Levels from full resolution down.
    pub levels: Vec<PyramidLevel>,
    pub poster_width: u32,
    pub poster_height: u32,
    pub descriptor: PyramidDescriptor,
}

impl PyramidSummary {
    pub fn tile_count(&self) -> u32 {
        self.levels.iter().map(PyramidLevel::tile_count).sum()
    }
}

/// Tile origins along one axis of length `len`.
fn tile_origins(len: u32, step: u32, overlap: u32) -> impl Iterator<Item = u32> {
    (0..len.saturating_sub(overlap)).step_by(step.max(1) as usize)
}

/// Writes the tiles of one level as `<col>_<row><suffix>` into `dir`.
/// Returns the column and row counts.
fn write_tiles(
    image: &RasterImage,
    params: &PyramidParameters,
    codec: &dyn ImageCodec,
    dir: &Path,
) -> Result<(u32, u32), PyramidError> {
    let tile = params.effective_tile_size();
    let mut columns = 0;
    let mut rows = 0;
    for (ty, y) in tile_origins(image.height(), params.tile_size, params.overlap).enumerate() {
        columns = 0;
        for (tx, x) in tile_origins(image.width(), params.tile_size, params.overlap).enumerate() {
            let name = format!("{}_{}{}", tx, ty, codec.suffix());
            let tile_image = image.extract_tile(x, y, tile);
            write_image(&tile_image, &dir.join(name), codec, params.jpeg_quality)?;
            columns += 1;
        }
        rows += 1;
    }
    Ok((columns, rows))
}

/// Creates a scoped staging directory under `root`, or the system temp
/// directory when `root` is `None`. It is removed when dropped.
pub(crate) fn staging_dir(prefix: &str, root: Option<&Path>) -> std::io::Result<TempDir> {
    match root {
        Some(root) => TempDir::with_prefix_in(prefix, root),
        None => TempDir::with_prefix(prefix),
    }
}

/// Builds tiled image pyramids.
#[derive(Debug, Clone, Default)]
pub struct PyramidBuilder {
    params: PyramidParameters,
    staging_root: Option<PathBuf>,
}

impl PyramidBuilder {
    pub fn new(params: PyramidParameters) -> Self {
        Self {
            params,
            staging_root: None,
        }
    }

    /// Stages archive output under `root` instead of the system temp directory.
    pub fn staging_root(mut self, root: Option<PathBuf>) -> Self {
        self.staging_root = root;
        self
    }

    pub fn params(&self) -> &PyramidParameters {
        &self.params
    }

    /// Reads `input` and builds its pyramid at `output`.
    pub fn build_from_file(&self, input: &Path, output: &Path) -> Result<PyramidSummary, PyramidError> {
        let image = read_image(input)?;
        self.build(&image, output)
    }

    /// Builds the pyramid of `image` at `output`.
    ///
    /// With folder output `output` is the pyramid directory. With archive
    /// output the tree is staged in a temporary directory, packed into the
    /// file `output`, and the staging directory removed whether or not the
    /// build succeeds. A failed folder build leaves partial output behind.
    pub fn build(&self, image: &RasterImage, output: &Path) -> Result<PyramidSummary, PyramidError> {
        self.params.validate()?;
        if image.width() == 0 || image.height() == 0 {
            return Err(PyramidError::EmptyImage);
        }

        match self.params.output_format {
            OutputFormat::Folders => self.build_tree(image, output, &pyramid_name(output)),
            OutputFormat::Archive => {
                let staging = staging_dir("bigshot-pyramid", self.staging_root.as_deref())?;
                let name = pyramid_name(output);
                // A sibling descriptor needs its folder one level down so
                // both stay inside the staging root.
                let base = match (self.params.descriptor_format, self.params.folder_layout) {
                    (DescriptorFormat::Dzi, FolderLayout::Bigshot) => staging.path().join(&name),
                    _ => staging.path().to_path_buf(),
                };
                let summary = self.build_tree(image, &base, &name)?;
                archive::pack(staging.path(), output)?;
                Ok(summary)
            }
        }
    }

    fn build_tree(&self, image: &RasterImage, base: &Path, name: &str) -> Result<PyramidSummary, PyramidError> {
        let params = &self.params;
        let codec = params.image_format.codec();

        let folders = match params.folder_layout {
            FolderLayout::Bigshot => base.to_path_buf(),
            FolderLayout::Dzi => base.join(format!("{}_files", name)),
        };
        std::fs::create_dir_all(&folders)?;

        let (width, height) = (image.width(), image.height());
        info!(width, height, "full image size");

        let max_dim = width.max(height);
        let scale = params.poster_size as f64 / max_dim as f64;
        let poster_width = ((width as f64 * scale) as u32).max(1);
        let poster_height = ((height as f64 * scale) as u32).max(1);
        info!(poster_width, poster_height, "creating poster image");
        let poster = image.resize_area_average(poster_width, poster_height);
        write_image(
            &poster,
            &folders.join(format!("poster{}", codec.suffix())),
            codec.as_ref(),
            params.jpeg_quality,
        )?;

        let level_count = params.level_count(width, height)?;
        info!(levels = level_count, "creating pyramid");

        let overlap = params.overlap;
        let mut levels = Vec::with_capacity(level_count as usize);
        let mut reduced: Option<RasterImage> = None;
        for zoom in 0..level_count {
            let current = reduced.as_ref().unwrap_or(image);
            let directory = params.level_dir(zoom, level_count);
            let dir = folders.join(&directory);
            std::fs::create_dir_all(&dir)?;

            let (columns, rows) = write_tiles(current, params, codec.as_ref(), &dir)?;
            debug!(zoom, directory = %directory, columns, rows, "level written");
            levels.push(PyramidLevel {
                directory,
                width: current.width(),
                height: current.height(),
                columns,
                rows,
            });

            if zoom + 1 < level_count {
                let w = (current.width().saturating_sub(overlap) / 2 + overlap).max(1);
                let h = (current.height().saturating_sub(overlap) / 2 + overlap).max(1);
                reduced = Some(current.resize_area_average(w, h));
            }
        }

        let descriptor = PyramidDescriptor {
            suffix: codec.suffix(),
            width,
            height,
            tile_size: params.effective_tile_size(),
            overlap,
            min_zoom: 1 - level_count as i64,
            poster_size: params.poster_size,
            poster_width,
            poster_height,
        };
        let descriptor_path = match (params.descriptor_format, params.folder_layout) {
            (DescriptorFormat::Bigshot, _) => folders.join("descriptor"),
            (DescriptorFormat::Dzi, FolderLayout::Dzi) => base.join(format!("{}.xml", name)),
            (DescriptorFormat::Dzi, FolderLayout::Bigshot) => sibling_xml(base, name),
        };
        descriptor.write(params.descriptor_format, &descriptor_path)?;

        Ok(PyramidSummary {
            levels,
            poster_width,
            poster_height,
            descriptor,
        })
    }
}

/// Base name of a pyramid: the output's file stem.
fn pyramid_name(output: &Path) -> String {
    output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pyramid".to_string())
}

/// `<parent>/<name>.xml` for a pyramid rooted at `base`.
fn sibling_xml(base: &Path, name: &str) -> PathBuf {
    base.parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
        .join(format!("{}.xml", name))
}
