//! Map-to-rectilinear projection engine.
//!
//! One engine serves every [`MapProjection`]: it aims a pinhole camera with a
//! [`Rotation`], converts each sub-sample ray to yaw/pitch with the fast
//! inverse trig tables, and samples the input map where the projection says
//! the ray lands. Output rows are split into bands rendered in parallel.

use std::f64::consts::FRAC_PI_2;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{DVec2, DVec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

use super::config::{Orientation, ProjectionConfig};
use super::mapping::{Cylindrical, Equirectangular, MapGeometry, MapProjection};
use super::stitcher::StitcherMetadata;
use super::ProjectionError;
use crate::geometry::{CubeFace, Rotation};
use crate::math::{FastAcos, FastAtan};
use crate::raster::{pack_rgb, write_image, ImageCodec, PngCodec, RasterImage, Rgb};

/// Minimum number of output rows per parallel band.
const MIN_BAND_ROWS: usize = 256;

/// Upper bound on samples averaged for one cap pixel.
const MAX_ARC_SAMPLES: i64 = 256;

/// Projects a flat map image to rectilinear views.
///
/// Setters return `&mut Self` so calls chain; the projector is not consumed
/// and may run any number of transforms with parameters changed in between.
#[derive(Debug, Clone)]
pub struct CubicProjector<P: MapProjection> {
    projection: P,
    input: Arc<RasterImage>,
    config: ProjectionConfig,
}

/// Projector for equirectangular maps.
pub type EquirectangularToCubic = CubicProjector<Equirectangular>;

/// Projector for cylindrical maps.
pub type CylindricalToCubic = CubicProjector<Cylindrical>;

impl EquirectangularToCubic {
    pub fn equirectangular(input: impl Into<Arc<RasterImage>>) -> Self {
        Self::new(Equirectangular, input)
    }
}

impl CylindricalToCubic {
    pub fn cylindrical(input: impl Into<Arc<RasterImage>>) -> Self {
        Self::new(Cylindrical, input)
    }
}

impl<P: MapProjection> CubicProjector<P> {
    /// Creates a projector over `input` with the default configuration.
    pub fn new(projection: P, input: impl Into<Arc<RasterImage>>) -> Self {
        Self::with_config(projection, input, ProjectionConfig::default())
    }

    pub fn with_config(
        projection: P,
        input: impl Into<Arc<RasterImage>>,
        config: ProjectionConfig,
    ) -> Self {
        Self {
            projection,
            input: input.into(),
            config,
        }
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    pub fn input(&self) -> &RasterImage {
        &self.input
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ProjectionConfig {
        &mut self.config
    }

    /// Sets the output vertical field of view, in degrees.
    pub fn vfov(&mut self, vfov: f64) -> &mut Self {
        self.config.vfov = vfov;
        self
    }

    pub fn top_cap(&mut self, top_cap: bool) -> &mut Self {
        self.config.top_cap = top_cap;
        self
    }

    pub fn bottom_cap(&mut self, bottom_cap: bool) -> &mut Self {
        self.config.bottom_cap = bottom_cap;
        self
    }

    /// Sets the pixel row of the horizon in the input map.
    pub fn input_horizon(&mut self, row: i64) -> &mut Self {
        self.config.input_horizon = Some(row);
        self
    }

    /// Sets the input vertical field of view, in degrees.
    pub fn input_vfov(&mut self, vfov: f64) -> &mut Self {
        self.config.input_vfov = Some(vfov);
        self
    }

    /// Sets the input horizontal field of view, in degrees. A full circle
    /// also turns on horizontal wrapping.
    pub fn input_hfov(&mut self, hfov: f64) -> &mut Self {
        if hfov >= 360.0 {
            self.config.horizontal_wrap = true;
        }
        self.config.input_hfov = Some(hfov);
        self
    }

    pub fn horizontal_wrap(&mut self, wrap: bool) -> &mut Self {
        self.config.horizontal_wrap = wrap;
        self
    }

    /// Sets the leveling offset, in degrees.
    pub fn offset(&mut self, yaw: f64, pitch: f64, roll: f64) -> &mut Self {
        self.config.offset = Orientation::new(yaw, pitch, roll);
        self
    }

    /// Sets the view direction, in degrees.
    pub fn view(&mut self, yaw: f64, pitch: f64, roll: f64) -> &mut Self {
        self.config.view = Orientation::new(yaw, pitch, roll);
        self
    }

    /// Sets the output size in pixels.
    pub fn size(&mut self, width: u32, height: u32) -> &mut Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Sets the oversampling grid size; values below 1 fail at transform time.
    pub fn oversampling(&mut self, oversampling: u32) -> &mut Self {
        self.config.oversampling = oversampling;
        self
    }

    pub fn jitter(&mut self, jitter: f64) -> &mut Self {
        self.config.jitter = jitter;
        self
    }

    pub fn jitter_seed(&mut self, seed: u64) -> &mut Self {
        self.config.jitter_seed = seed;
        self
    }

    pub fn threads(&mut self, threads: Option<usize>) -> &mut Self {
        self.config.threads = threads;
        self
    }

    /// Effective input vertical field of view, in degrees.
    pub fn resolved_input_vfov(&self) -> f64 {
        self.config
            .input_vfov
            .unwrap_or_else(|| self.projection.default_input_vfov())
    }

    /// Effective input horizontal field of view, in degrees.
    pub fn resolved_input_hfov(&self) -> f64 {
        self.config.input_hfov.unwrap_or(360.0)
    }

    /// Derives input FOV, horizon and wrapping from stitcher metadata
    /// describing how the input map was cropped from a larger panorama.
    pub fn apply_stitcher_metadata(&mut self, meta: &StitcherMetadata) -> &mut Self {
        let hfov = meta.hfov.to_radians();
        let vfov = self.projection.vfov_from_stitcher(
            hfov,
            meta.width as f64,
            self.input.height() as f64,
        );
        self.config.input_horizon = Some(meta.horizon());
        self.config.horizontal_wrap = meta.wraps();
        self.config.input_vfov = Some(vfov.to_degrees());
        self.config.input_hfov = Some(meta.hfov);
        self
    }

    /// Loads projection parameters from a Hugin `.pto` file.
    pub fn from_pto(&mut self, path: &Path) -> Result<&mut Self, ProjectionError> {
        let meta = StitcherMetadata::from_pto_file(path)?;
        Ok(self.apply_stitcher_metadata(&meta))
    }

    fn map_geometry(&self) -> MapGeometry {
        let height = self.input.height() as f64;
        MapGeometry {
            width: self.input.width() as f64,
            height,
            hfov: self.resolved_input_hfov().to_radians(),
            vfov: self.resolved_input_vfov().to_radians(),
            horizon: self
                .config
                .input_horizon
                .map(|h| h as f64)
                .unwrap_or((self.input.height() / 2) as f64),
        }
    }

    /// Renders one rectilinear image with the current configuration.
    ///
    /// Blocks until every band has been rendered. A panicking band
    /// propagates to the caller and no image is returned.
    pub fn transform(&self) -> Result<RasterImage, ProjectionError> {
        self.config.validate()?;
        if self.input.data().is_empty() {
            return Err(ProjectionError::EmptyInput);
        }

        let config = &self.config;
        let map = self.map_geometry();
        let oversampling = config.oversampling as usize;
        let width = config.width as usize;

        let acos = FastAcos::new(self.input.width() as usize * 2 * oversampling);
        let atan = FastAtan::new(self.input.height() as usize * 2 * oversampling);

        let top_phi = self.projection.inverse_phi(&map, 0.0, 0.0);
        let bottom_phi = self
            .projection
            .inverse_phi(&map, 0.0, self.input.height() as f64 - 1.0);

        let threads = config.threads.unwrap_or_else(available_threads);
        let band_rows = (config.height as usize / (2 * threads)).max(MIN_BAND_ROWS);

        debug!(
            projection = self.projection.name(),
            width = config.width,
            height = config.height,
            yaw = config.view.yaw,
            pitch = config.view.pitch,
            threads,
            band_rows,
            "transforming map"
        );

        let sampler = Sampler {
            projection: &self.projection,
            input: &self.input,
            map,
            frame: ViewFrame::new(config),
            acos,
            atan,
            top_phi,
            bottom_phi,
            width,
            oversampling,
            jitter: config.jitter,
            jitter_seed: config.jitter_seed,
            wrap: config.horizontal_wrap,
            top_cap: config.top_cap,
            bottom_cap: config.bottom_cap,
        };

        let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;
        let mut output = RasterImage::new(config.width, config.height);
        pool.install(|| {
            output
                .data_mut()
                .par_chunks_mut(band_rows * width)
                .enumerate()
                .for_each(|(band, rows)| sampler.render_band(band, band * band_rows, rows));
        });

        Ok(output)
    }

    /// Returns the six cube faces as deferred jobs.
    ///
    /// Each job owns a snapshot of this projector with the face's view
    /// direction substituted, so jobs can be rendered in any order or on
    /// different threads.
    pub fn faces(&self) -> Vec<FaceJob<P>> {
        CubeFace::all()
            .into_iter()
            .map(|face| {
                let (yaw, pitch) = face.view_angles();
                let mut projector = self.clone();
                projector.view(yaw, pitch, 0.0);
                FaceJob { face, projector }
            })
            .collect()
    }
}

fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// A cube face waiting to be rendered.
#[derive(Debug, Clone)]
pub struct FaceJob<P: MapProjection> {
    face: CubeFace,
    projector: CubicProjector<P>,
}

impl<P: MapProjection> FaceJob<P> {
    pub fn face(&self) -> CubeFace {
        self.face
    }

    /// File name stem of the face, e.g. "face_f".
    pub fn name(&self) -> &'static str {
        self.face.short_name()
    }

    pub fn render(&self) -> Result<RasterImage, ProjectionError> {
        self.projector.transform()
    }
}

/// Pinhole camera for one transform.
#[derive(Debug, Clone, Copy)]
struct ViewFrame {
    top_left: DVec3,
    /// Camera-space step per sub-sample.
    step: DVec2,
    rotation: Rotation,
}

impl ViewFrame {
    fn new(config: &ProjectionConfig) -> Self {
        let w = config.width as f64;
        let h = config.height as f64;
        let half = (config.vfov.to_radians() / 2.0).tan();
        let top_left = DVec3::new(-half * w / h, -half, 1.0);
        let step = DVec2::new(-2.0 * top_left.x / w, -2.0 * top_left.y / h)
            / config.oversampling as f64;

        let mut rotation = Rotation::identity();
        rotation
            .rotate_z(config.view.roll.to_radians())
            .rotate_x(config.view.pitch.to_radians())
            .rotate_y(config.view.yaw.to_radians())
            .rotate_y(config.offset.yaw.to_radians())
            .rotate_x(config.offset.pitch.to_radians())
            .rotate_z(config.offset.roll.to_radians());

        Self {
            top_left,
            step,
            rotation,
        }
    }

    /// World-space ray through sub-sample position `(x, y)`.
    #[inline]
    fn ray(&self, x: f64, y: f64) -> DVec3 {
        let camera = self.top_left + DVec3::new(x * self.step.x, y * self.step.y, 0.0);
        self.rotation.apply(camera)
    }
}

/// Yaw and pitch of a world-space ray.
///
/// A ray along the vertical axis gets pitch +-90 degrees and yaw 0.
#[inline]
fn ray_angles(ray: DVec3, acos: &FastAcos, atan: &FastAtan) -> (f64, f64) {
    let nxz = (ray.x * ray.x + ray.z * ray.z).sqrt();
    if nxz < f64::MIN_POSITIVE {
        let phi = if ray.y > 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
        return (0.0, phi);
    }
    let phi = atan.f(ray.y / nxz);
    let mut theta = acos.f(ray.z / nxz);
    if ray.x < 0.0 {
        theta = -theta;
    }
    (theta, phi)
}

/// Normalized arc width for a cap pixel, as a fraction of the map width.
///
/// `edge_phi` is the pitch of the map's extreme row and `pole_phi` the pole
/// on that side.
#[inline]
fn cap_arc_width(phi: f64, edge_phi: f64, pole_phi: f64) -> f64 {
    let mut arc = (phi - edge_phi) / (pole_phi - edge_phi);
    if !arc.is_finite() {
        arc = 1.0;
    }
    // Near the singularity the sign can flip from rounding.
    if arc < 0.0 {
        arc = -arc;
    }
    if arc < 0.5 {
        arc / 2.0
    } else {
        arc * arc
    }
}

/// Read-only state shared by all bands of one transform.
struct Sampler<'a, P: MapProjection> {
    projection: &'a P,
    input: &'a RasterImage,
    map: MapGeometry,
    frame: ViewFrame,
    acos: FastAcos,
    atan: FastAtan,
    top_phi: f64,
    bottom_phi: f64,
    width: usize,
    oversampling: usize,
    jitter: f64,
    jitter_seed: u64,
    wrap: bool,
    top_cap: bool,
    bottom_cap: bool,
}

impl<P: MapProjection> Sampler<'_, P> {
    /// Renders the output rows in `rows`, the first being `first_row`.
    fn render_band(&self, band: usize, first_row: usize, rows: &mut [u32]) {
        let os = self.oversampling;
        let mut rng = (self.jitter > 0.0)
            .then(|| ChaCha8Rng::seed_from_u64(self.jitter_seed.wrapping_add(band as u64)));
        let mut acc = vec![0u64; self.width * 3];
        let samples = (os * os) as u64;

        for (r, out_row) in rows.chunks_exact_mut(self.width).enumerate() {
            let dest_y = first_row + r;
            acc.fill(0);
            for sy in dest_y * os..dest_y * os + os {
                for sx in 0..self.width * os {
                    let (jx, jy) = match rng.as_mut() {
                        Some(rng) => (
                            rng.random::<f64>() * self.jitter,
                            rng.random::<f64>() * self.jitter,
                        ),
                        None => (0.0, 0.0),
                    };
                    let ray = self.frame.ray(sx as f64 + jx, sy as f64 + jy);
                    let rgb = self.sample_ray(ray);
                    let o = (sx / os) * 3;
                    for i in 0..3 {
                        acc[o + i] += rgb[i] as u64;
                    }
                }
            }
            for (x, px) in out_row.iter_mut().enumerate() {
                let o = x * 3;
                *px = pack_rgb([
                    (acc[o] / samples) as u32,
                    (acc[o + 1] / samples) as u32,
                    (acc[o + 2] / samples) as u32,
                ]);
            }
        }
    }

    /// Color seen along one world-space ray.
    fn sample_ray(&self, ray: DVec3) -> Rgb {
        let (theta, phi) = ray_angles(ray, &self.acos, &self.atan);
        let p = self.projection.forward(&self.map, theta, phi);
        let (in_x, in_y) = (p.x, p.y);
        let (w, h) = (self.map.width, self.map.height);

        if in_y >= 0.0 && in_y < h && (self.wrap || (in_x >= 0.0 && in_x < w)) {
            if in_y >= h - 1.0 || (!self.wrap && in_x >= w - 1.0) {
                self.input.components(in_x.floor() as i64, in_y.floor() as i64)
            } else {
                self.input.sample(in_x, in_y)
            }
        } else if in_y < 0.0 && self.top_cap {
            let arc = cap_arc_width(phi, self.top_phi, -FRAC_PI_2);
            self.arc_sample(0, arc * w, in_x)
        } else if in_y >= h && self.bottom_cap {
            let arc = cap_arc_width(phi, self.bottom_phi, FRAC_PI_2);
            self.arc_sample(self.input.height() as i64 - 1, arc * w, in_x)
        } else {
            [0, 0, 0]
        }
    }

    /// Averages row `y` over `arc_width` pixels centred on `in_x`.
    fn arc_sample(&self, y: i64, arc_width: f64, in_x: f64) -> Rgb {
        arc_average(self.input, y, arc_columns(arc_width, in_x))
    }
}

/// Columns averaged for a cap arc: `arc_width` pixels centred on `in_x`,
/// strided so that at most `MAX_ARC_SAMPLES` are visited.
fn arc_columns(arc_width: f64, in_x: f64) -> impl Iterator<Item = i64> {
    let arc_min = (in_x - arc_width / 2.0).floor() as i64;
    let arc_max = (in_x + arc_width / 2.0).floor() as i64 + 1;
    let span = (arc_max - arc_min).max(0);
    let step = ((span + MAX_ARC_SAMPLES - 1) / MAX_ARC_SAMPLES).max(1);
    (arc_min..arc_max).step_by(step as usize)
}

/// Mean colour of row `y` over `columns`; columns wrap around the map.
fn arc_average(input: &RasterImage, y: i64, columns: impl Iterator<Item = i64>) -> Rgb {
    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for ax in columns {
        let c = input.components(ax, y);
        for i in 0..3 {
            sum[i] += c[i] as u64;
        }
        count += 1;
    }
    if count == 0 {
        return [0, 0, 0];
    }
    [
        (sum[0] / count) as u32,
        (sum[1] / count) as u32,
        (sum[2] / count) as u32,
    ]
}

/// Renders all six faces at `size x size` with leveling `offset` and writes
/// them as `face_*.png` into `dir`. Returns the written paths in face order.
pub fn write_faces<P: MapProjection>(
    projector: &CubicProjector<P>,
    dir: &Path,
    size: u32,
    offset: Orientation,
) -> Result<Vec<PathBuf>, ProjectionError> {
    std::fs::create_dir_all(dir)?;
    let mut projector = projector.clone();
    projector
        .size(size, size)
        .vfov(90.0)
        .offset(offset.yaw, offset.pitch, offset.roll);

    let codec = PngCodec::default();
    let mut written = Vec::with_capacity(6);
    for job in projector.faces() {
        info!(face = job.name(), size, "rendering face");
        let image = job.render()?;
        let path = dir.join(format!("{}{}", job.name(), codec.suffix()));
        write_image(&image, &path, &codec, 1.0)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::unpack_rgb;
    use std::f64::consts::PI;

    const SKY: Rgb = [900, 900, 1000];
    const GROUND: Rgb = [300, 200, 100];
    const BANDS: [Rgb; 4] = [[1000, 0, 0], [0, 1000, 0], [0, 0, 1000], [1000, 1000, 0]];

    /// Equirectangular map with four longitude bands centred on the face
    /// directions, a sky strip on top and a ground strip at the bottom.
    fn banded_map(w: u32, h: u32) -> RasterImage {
        let mut img = RasterImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let rgb = if y < h / 8 {
                    SKY
                } else if y >= h - h / 8 {
                    GROUND
                } else {
                    BANDS[(((x + w / 8) / (w / 4)) % 4) as usize]
                };
                img.set_components(x, y, rgb);
            }
        }
        img
    }

    fn center(img: &RasterImage) -> Rgb {
        img.components(img.width() as i64 / 2, img.height() as i64 / 2)
    }

    #[test]
    fn test_uniform_map_gives_uniform_output() {
        let color = [123, 456, 789];
        let map = RasterImage::filled(360, 180, color);
        let mut projector = EquirectangularToCubic::equirectangular(map);
        projector.size(40, 30).vfov(75.0).top_cap(true).bottom_cap(true);

        let views = [(0.0, 0.0, 0.0), (33.0, 71.0, 10.0), (-120.0, -89.0, 0.0), (200.0, 12.0, -45.0)];
        for &(yaw, pitch, roll) in &views {
            projector.view(yaw, pitch, roll).offset(5.0, -3.0, 2.0);
            let out = projector.transform().unwrap();
            assert_eq!(out.width(), 40);
            assert_eq!(out.height(), 30);
            for (i, &v) in out.data().iter().enumerate() {
                assert_eq!(unpack_rgb(v), color, "view {:?} pixel {}", (yaw, pitch, roll), i);
            }
        }
    }

    #[test]
    fn test_uniform_map_with_oversampling_and_jitter() {
        let color = [1000, 10, 500];
        let map = RasterImage::filled(200, 100, color);
        let mut projector = EquirectangularToCubic::equirectangular(map);
        projector
            .size(16, 16)
            .oversampling(3)
            .jitter(0.9)
            .top_cap(true)
            .bottom_cap(true);
        let out = projector.transform().unwrap();
        assert!(out.data().iter().all(|&v| unpack_rgb(v) == color));
    }

    #[test]
    fn test_faces_see_expected_directions() {
        let map = banded_map(512, 256);
        let mut projector = EquirectangularToCubic::equirectangular(map);
        projector.size(64, 64).top_cap(true).bottom_cap(true);

        let jobs = projector.faces();
        assert_eq!(jobs.len(), 6);
        let expected = [BANDS[2], BANDS[3], BANDS[0], BANDS[1], SKY, GROUND];
        for (job, want) in jobs.iter().zip(expected) {
            let img = job.render().unwrap();
            assert_eq!(center(&img), want, "face {}", job.name());
        }
    }

    #[test]
    fn test_face_center_angles_on_large_map() {
        let map = RasterImage::new(4096, 2048);
        let mut projector = EquirectangularToCubic::equirectangular(map);
        projector.size(512, 512).vfov(90.0);
        let tolerance = (PI / 2.0) / 512.0;

        let acos = FastAcos::new(4096 * 2);
        let atan = FastAtan::new(2048 * 2);
        let geometry = projector.map_geometry();

        for job in projector.faces() {
            let frame = ViewFrame::new(job.projector.config());
            let (theta, phi) = ray_angles(frame.ray(256.0, 256.0), &acos, &atan);
            let (yaw, pitch) = job.face().view_angles();
            let expected_phi = -pitch.to_radians();
            assert!((phi - expected_phi).abs() < tolerance, "{} phi {}", job.name(), phi);

            if pitch == 0.0 {
                let expected_theta = yaw.to_radians();
                let mut diff = (theta - expected_theta).abs();
                if diff > PI {
                    diff = 2.0 * PI - diff;
                }
                assert!(diff < tolerance, "{} theta {}", job.name(), theta);

                let p = Equirectangular.forward(&geometry, theta, phi);
                let expected_x = (expected_theta / PI) * 2048.0 + 2048.0;
                let mut dx = (p.x - expected_x).abs();
                if dx > 2048.0 {
                    dx = 4096.0 - dx;
                }
                assert!(dx < 4096.0 / 360.0 * tolerance.to_degrees() + 1.0, "{} x {}", job.name(), p.x);
                assert!((p.y - 1024.0).abs() < 1.0, "{} y {}", job.name(), p.y);
            }
        }
    }

    #[test]
    fn test_parallel_bands_match_single_thread() {
        let map = banded_map(256, 128);
        let mut projector = EquirectangularToCubic::equirectangular(map);
        projector.size(48, 600).vfov(100.0).view(20.0, 30.0, 5.0);

        projector.threads(Some(1));
        let single = projector.transform().unwrap();
        projector.threads(Some(4));
        let parallel = projector.transform().unwrap();
        assert_eq!(single, parallel);
    }

    #[test]
    fn test_jitter_is_deterministic_for_a_seed() {
        let map = banded_map(256, 128);
        let mut projector = EquirectangularToCubic::equirectangular(map);
        projector.size(32, 32).oversampling(2).jitter(1.0).jitter_seed(7);
        let a = projector.transform().unwrap();
        let b = projector.transform().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_wrap_outside_map_is_black() {
        let map = RasterImage::filled(180, 180, [500, 500, 500]);
        let mut projector = EquirectangularToCubic::equirectangular(map);
        projector
            .input_hfov(180.0)
            .horizontal_wrap(false)
            .size(20, 20)
            .view(180.0, 0.0, 0.0);
        let out = projector.transform().unwrap();
        assert_eq!(center(&out), [0, 0, 0]);

        projector.view(0.0, 0.0, 0.0);
        let out = projector.transform().unwrap();
        assert_eq!(center(&out), [500, 500, 500]);
    }

    #[test]
    fn test_missing_cap_is_black_and_cap_fills() {
        // A map covering only +-45 degrees of pitch.
        let map = RasterImage::filled(360, 90, [700, 600, 500]);
        let mut projector = EquirectangularToCubic::equirectangular(map);
        projector.input_vfov(90.0).size(16, 16).view(0.0, 90.0, 0.0);

        let out = projector.transform().unwrap();
        assert_eq!(center(&out), [0, 0, 0]);

        projector.top_cap(true);
        let out = projector.transform().unwrap();
        assert_eq!(center(&out), [700, 600, 500]);
    }

    #[test]
    fn test_cylindrical_uniform_band() {
        let map = RasterImage::filled(400, 200, [250, 250, 250]);
        let mut projector = CylindricalToCubic::cylindrical(map);
        projector.size(24, 24).vfov(40.0);
        let out = projector.transform().unwrap();
        assert!(out.data().iter().all(|&v| unpack_rgb(v) == [250, 250, 250]));
    }

    #[test]
    fn test_invalid_oversampling_rejected_before_work() {
        let map = RasterImage::filled(8, 4, [1, 1, 1]);
        let mut projector = EquirectangularToCubic::equirectangular(map);
        projector.oversampling(0);
        assert!(matches!(projector.transform(), Err(ProjectionError::InvalidOversampling(0))));
    }

    #[test]
    fn test_input_hfov_full_circle_forces_wrap() {
        let map = RasterImage::new(8, 4);
        let mut projector = EquirectangularToCubic::equirectangular(map);
        projector.horizontal_wrap(false).input_hfov(360.0);
        assert!(projector.config().horizontal_wrap);
    }

    #[test]
    fn test_stitcher_metadata_equirectangular() {
        let map = RasterImage::new(8477, 10);
        let mut projector = EquirectangularToCubic::equirectangular(map);
        let meta = StitcherMetadata::parse_pto("p w8477 h3453 v360 S0,8477,267,2941").unwrap();
        projector.apply_stitcher_metadata(&meta);

        let config = projector.config();
        assert_eq!(config.input_horizon, Some(3453 / 2 - 267));
        assert!(config.horizontal_wrap);
        let expected_vfov = (10.0 * (2.0 * PI / 8477.0)).to_degrees();
        assert!((projector.resolved_input_vfov() - expected_vfov).abs() < 1e-9);
        assert_eq!(projector.resolved_input_hfov(), 360.0);
    }

    #[test]
    fn test_cap_arc_width_ramps() {
        let edge = -1.0;
        let pole = -FRAC_PI_2;
        assert_eq!(cap_arc_width(edge, edge, pole), 0.0);
        let quarter = edge + (pole - edge) * 0.25;
        assert!((cap_arc_width(quarter, edge, pole) - 0.125).abs() < 1e-12);
        assert!((cap_arc_width(pole, edge, pole) - 1.0).abs() < 1e-12);
        let past = edge - (pole - edge) * 0.1;
        assert!((cap_arc_width(past, edge, pole) - 0.05).abs() < 1e-12);
    }

    /// Map whose top row ramps red from 0 at the left edge to ~1023 at the right.
    fn top_ramp_map(w: u32, h: u32) -> RasterImage {
        let mut img = RasterImage::filled(w, h, [100, 100, 100]);
        for x in 0..w {
            img.set_components(x, 0, [x * 1023 / w, 100, 100]);
        }
        img
    }

    #[test]
    fn test_arc_columns_stride() {
        let narrow: Vec<_> = arc_columns(10.0, 300.0).collect();
        assert_eq!(narrow, (295..=305).collect::<Vec<_>>());

        let wide: Vec<_> = arc_columns(1000.0, 500.0).collect();
        assert!(wide.len() <= MAX_ARC_SAMPLES as usize, "{} samples", wide.len());
        assert!(wide.len() > 200);
        assert_eq!(wide[0], 0);
        assert!(*wide.last().unwrap() >= 990);

        assert_eq!(arc_columns(0.0, 12.5).collect::<Vec<_>>(), [12]);
    }

    #[test]
    fn test_arc_average_on_ramp() {
        let map = top_ramp_map(1000, 4);
        let narrow = arc_average(&map, 0, arc_columns(10.0, 300.0));
        assert!((narrow[0] as i64 - 306).abs() <= 1, "red {}", narrow[0]);
        assert_eq!(&narrow[1..], &[100, 100]);

        let full = arc_average(&map, 0, arc_columns(1000.0, 500.0));
        assert!((full[0] as i64 - 511).abs() < 15, "red {}", full[0]);
    }

    #[test]
    fn test_cap_arc_narrow_near_edge_and_full_at_pole() {
        // Map covers +-45 degrees of pitch; the cap reads only its top row.
        let map = top_ramp_map(360, 90);
        let mut projector = EquirectangularToCubic::equirectangular(map);
        projector.input_vfov(90.0).top_cap(true).size(8, 8).vfov(2.0);

        // Five degrees past the edge the arc is ~20 pixels around x = 270.
        projector.view(90.0, 50.0, 0.0);
        let near = center(&projector.transform().unwrap());
        let expected = 270 * 1023 / 360;
        assert!((near[0] as i64 - expected as i64).abs() < 40, "red {}", near[0]);
        assert_eq!(&near[1..], &[100, 100]);

        // At the pole the whole row is averaged.
        projector.view(90.0, 90.0, 0.0);
        let pole = center(&projector.transform().unwrap());
        assert!((pole[0] as i64 - 511).abs() < 30, "red {}", pole[0]);
    }

    #[test]
    fn test_write_faces_names_files() {
        let dir = tempfile::tempdir().unwrap();
        let map = RasterImage::filled(64, 32, [400, 400, 400]);
        let projector = EquirectangularToCubic::equirectangular(map);
        let written = write_faces(&projector, dir.path(), 8, Orientation::default()).unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            ["face_f.png", "face_r.png", "face_b.png", "face_l.png", "face_u.png", "face_d.png"]
        );
        let face = crate::raster::read_image(&written[0]).unwrap();
        assert_eq!((face.width(), face.height()), (8, 8));
    }

    #[test]
    fn test_vertical_ray_angles() {
        let acos = FastAcos::new(64);
        let atan = FastAtan::new(64);
        assert_eq!(ray_angles(DVec3::new(0.0, 1.0, 0.0), &acos, &atan), (0.0, FRAC_PI_2));
        assert_eq!(ray_angles(DVec3::new(0.0, -1.0, 0.0), &acos, &atan), (0.0, -FRAC_PI_2));
    }
}
