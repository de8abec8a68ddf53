//! Input image to pyramid(s), archive, or single view.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use super::options::{ProcessOptions, Transform};
use crate::archive::{self, ArchiveError};
use crate::geometry::CubeFace;
use crate::projection::{
    CubicProjector, Cylindrical, Equirectangular, MapProjection, ProjectionError,
};
use crate::pyramid::{
    staging_dir, FolderLayout, OutputFormat, PyramidBuilder, PyramidError, PyramidParameters,
    PyramidSummary,
};
use crate::raster::{read_image, write_image, CodecError, RasterImage};

/// Errors that can occur while processing an input image.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error(transparent)]
    Pyramid(#[from] PyramidError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("face size must be positive")]
    InvalidFaceSize,
}

/// What [`process`] wrote.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// One pyramid of the input image.
    Pyramid(PyramidSummary),
    /// One pyramid per cube face, in face order.
    Facemap(Vec<(CubeFace, PyramidSummary)>),
    /// A single rectilinear view of the given size.
    Face { width: u32, height: u32 },
}

/// Runs the full flow for `input`, writing to `output`.
///
/// # Arguments
/// * `input` - Image file to read
/// * `output` - Pyramid directory, archive file, or image file depending on
///   the transform and output format
/// * `options` - Processing options; a preset fills in unset values first
pub fn process(
    input: &Path,
    output: &Path,
    options: &ProcessOptions,
) -> Result<ProcessOutcome, ProcessError> {
    let image = read_image(input)?;
    info!(
        input = %input.display(),
        width = image.width(),
        height = image.height(),
        "read input image"
    );
    process_image(image, output, options)
}

/// Same as [`process`] with an already decoded input image.
pub fn process_image(
    image: RasterImage,
    output: &Path,
    options: &ProcessOptions,
) -> Result<ProcessOutcome, ProcessError> {
    let mut options = options.clone();
    options.apply_preset(image.width());

    match options.transform() {
        Transform::None => {
            let summary = PyramidBuilder::new(options.pyramid_parameters())
                .staging_root(options.staging_root.clone())
                .build(&image, output)?;
            Ok(ProcessOutcome::Pyramid(summary))
        }
        Transform::Facemap => facemap(CubicProjector::new(Equirectangular, image), output, &options),
        Transform::CylinderFacemap => {
            facemap(CubicProjector::new(Cylindrical, image), output, &options)
        }
        Transform::Face => single_face(CubicProjector::new(Equirectangular, image), output, &options),
    }
}

/// Applies the map calibration options shared by every transform.
fn calibrate<P: MapProjection>(
    projector: &mut CubicProjector<P>,
    options: &ProcessOptions,
) -> Result<(), ProcessError> {
    projector
        .oversampling(options.oversampling)
        .jitter(options.jitter)
        .jitter_seed(options.jitter_seed)
        .top_cap(options.top_cap)
        .bottom_cap(options.bottom_cap)
        .threads(options.threads)
        .offset(options.offset.yaw, options.offset.pitch, options.offset.roll);

    if let Some(pto) = &options.pto {
        projector.from_pto(pto)?;
    }
    if let Some(vfov) = options.input_vfov {
        projector.input_vfov(vfov);
    }
    if let Some(hfov) = options.input_hfov {
        projector.input_hfov(hfov);
    }
    if let Some(horizon) = options.input_horizon {
        projector.input_horizon(horizon);
    }
    Ok(())
}

fn facemap<P: MapProjection>(
    mut projector: CubicProjector<P>,
    output: &Path,
    options: &ProcessOptions,
) -> Result<ProcessOutcome, ProcessError> {
    if options.face_size() == 0 {
        return Err(ProcessError::InvalidFaceSize);
    }
    let face_size = options.face_size() + options.overlap();
    calibrate(&mut projector, options)?;
    projector.vfov(90.0).size(face_size, face_size);

    info!(
        projection = projector.projection().name(),
        hfov = projector.resolved_input_hfov(),
        vfov = projector.resolved_input_vfov(),
        face_size,
        "input field of view"
    );

    // Each face is its own folder pyramid; packing applies to the whole set.
    let params = PyramidParameters {
        output_format: OutputFormat::Folders,
        folder_layout: FolderLayout::Bigshot,
        ..options.pyramid_parameters()
    };
    params.validate()?;
    let builder = PyramidBuilder::new(params);

    let staging = match options.output_format {
        OutputFormat::Archive => Some(staging_dir("bigshot-facemap", options.staging_root.as_deref())?),
        OutputFormat::Folders => None,
    };
    let base = staging.as_ref().map(|s| s.path()).unwrap_or(output);

    let mut pyramids = Vec::with_capacity(6);
    for job in projector.faces() {
        info!(face = job.name(), "making pyramid");
        let face = job.render()?;
        let summary = builder.build(&face, &base.join(job.name()))?;
        pyramids.push((job.face(), summary));
    }

    if staging.is_some() {
        archive::pack(base, output)?;
    }
    Ok(ProcessOutcome::Facemap(pyramids))
}

fn single_face<P: MapProjection>(
    mut projector: CubicProjector<P>,
    output: &Path,
    options: &ProcessOptions,
) -> Result<ProcessOutcome, ProcessError> {
    calibrate(&mut projector, options)?;
    projector
        .vfov(options.fov)
        .view(options.view.yaw, options.view.pitch, options.view.roll)
        .size(options.output_width, options.output_height);

    let image = projector.transform()?;
    let codec = options.image_format.codec();
    write_image(&image, output, codec.as_ref(), options.jpeg_quality)?;
    info!(
        output = %output.display(),
        width = image.width(),
        height = image.height(),
        "wrote view"
    );
    Ok(ProcessOutcome::Face {
        width: image.width(),
        height: image.height(),
    })
}
