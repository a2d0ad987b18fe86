use log::{info, warn};
use nalgebra::Point3;
use rayon::prelude::*;
use std::fs;
use std::path::Path;

use crate::camera::CalibratedCameraModel;
use crate::config::{DecoderConfig, PipelineConfig};
use crate::decoder::{Axis, DecodeOutput, PatternDecoder, PatternSource};
use crate::error::{ReconError, Result};
use crate::io::parse_correspondences;
use crate::models::{CalibrationData, Match, PointCloud};
use crate::utils::geometry::try_intersect_rays;

/// Stage-level counters for one reconstruction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructionTelemetry {
    /// Matches handed to triangulation
    pub matches_in: usize,
    /// Points appended to the cloud
    pub points_out: usize,
    /// Ray pairs too close to parallel; their origin midpoint was used
    pub degenerate_rays: usize,
    /// Correspondence lines that could not be parsed
    pub rejected_lines: usize,
    /// Pattern pairs skipped while decoding
    pub skipped_pairs: usize,
}

/// Camera and projector models plus the point cloud they build
///
/// Each match becomes one camera ray and one projector ray; their closest
/// point is appended to the cloud.
#[derive(Debug, Clone)]
pub struct ReconstructionPipeline {
    camera: CalibratedCameraModel,
    projector: CalibratedCameraModel,
    config: PipelineConfig,
    cloud: PointCloud,
    telemetry: ReconstructionTelemetry,
}

impl ReconstructionPipeline {
    /// Pipeline over two ready-made models
    ///
    /// The reported basis convention and iteration budget are the camera
    /// model's; the projector pixel offset starts at zero.
    pub fn new(camera: CalibratedCameraModel, projector: CalibratedCameraModel) -> Self {
        if camera.convention() != projector.convention() {
            warn!(
                "camera uses {} but projector uses {}",
                camera.convention(),
                projector.convention()
            );
        }
        let config = PipelineConfig {
            projector_pixel_offset: 0.0,
            basis_convention: camera.convention(),
            undistort_iterations: camera.undistort_iterations(),
        };
        Self {
            camera,
            projector,
            config,
            cloud: PointCloud::new(),
            telemetry: ReconstructionTelemetry::default(),
        }
    }

    /// Build both models from calibration data under `config`
    pub fn from_calibration(
        camera: &CalibrationData,
        projector: &CalibrationData,
        config: PipelineConfig,
    ) -> Result<Self> {
        let build = |calib: &CalibrationData| {
            CalibratedCameraModel::with_options(
                calib,
                config.basis_convention,
                config.undistort_iterations,
            )
        };
        Ok(Self::new(build(camera)?, build(projector)?)
            .with_projector_pixel_offset(config.projector_pixel_offset))
    }

    /// Replace the shift added to projector coordinates
    ///
    /// The basis convention and iteration budget are fixed once the models
    /// exist; rebuild through [`Self::from_calibration`] to change them.
    pub fn with_projector_pixel_offset(mut self, offset: f64) -> Self {
        self.config.projector_pixel_offset = offset;
        self
    }

    /// Active settings
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Observing camera
    pub fn camera(&self) -> &CalibratedCameraModel {
        &self.camera
    }

    /// Projector
    pub fn projector(&self) -> &CalibratedCameraModel {
        &self.projector
    }

    /// Points accumulated so far
    pub fn point_cloud(&self) -> &PointCloud {
        &self.cloud
    }

    /// Mutable access for post-filtering
    pub fn point_cloud_mut(&mut self) -> &mut PointCloud {
        &mut self.cloud
    }

    /// Consume the pipeline, keeping the cloud
    pub fn into_point_cloud(self) -> PointCloud {
        self.cloud
    }

    /// Counters for the run so far
    pub fn telemetry(&self) -> ReconstructionTelemetry {
        self.telemetry
    }

    /// Triangulate one match; the flag is set when the rays were degenerate
    pub fn triangulate(&self, m: &Match) -> (Point3<f64>, bool) {
        let offset = self.config.projector_pixel_offset;
        let cam_origin = self.camera.position();
        let cam_dir = self.camera.pixel_to_ray(m.cam_u, m.cam_v);
        let proj_origin = self.projector.position();
        let proj_dir = self
            .projector
            .pixel_to_ray(m.proj_u + offset, m.proj_v + offset);

        match try_intersect_rays(&cam_origin, &cam_dir, &proj_origin, &proj_dir) {
            Ok(point) => (point, false),
            Err(_) => (nalgebra::center(&cam_origin, &proj_origin), true),
        }
    }

    /// Triangulate every match in parallel and append the points in match order
    ///
    /// Returns the number of points added.
    pub fn process_matches(&mut self, matches: &[Match]) -> usize {
        let results: Vec<(Point3<f64>, bool)> =
            matches.par_iter().map(|m| self.triangulate(m)).collect();

        let degenerate = results.iter().filter(|(_, d)| *d).count();
        if degenerate > 0 {
            warn!("{degenerate} ray pairs were near-parallel; used origin midpoints");
        }

        self.cloud.extend(results.into_iter().map(|(p, _)| p));
        self.telemetry.matches_in += matches.len();
        self.telemetry.points_out += matches.len();
        self.telemetry.degenerate_rays += degenerate;
        matches.len()
    }

    /// Parse `cam_u,cam_v,proj_u,proj_v` lines and triangulate them
    pub fn process_correspondence_text(&mut self, text: &str) -> usize {
        let parsed = parse_correspondences(text);
        self.telemetry.rejected_lines += parsed.rejected_lines;
        self.process_matches(&parsed.matches)
    }

    /// Read a correspondence list from disk and triangulate it
    pub fn process_correspondence_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ReconError::io(path, e))?;
        let added = self.process_correspondence_text(&text);
        info!("{}: triangulated {added} correspondences", path.display());
        Ok(added)
    }

    /// Decoder whose center offsets suit this projector and `source`
    ///
    /// Explicit offsets in `config` win; otherwise they are derived from the
    /// projector resolution and the pair count of each axis. Fails when
    /// neither is available.
    pub fn decoder_for(
        &self,
        config: &DecoderConfig,
        source: &impl PatternSource,
    ) -> Result<PatternDecoder> {
        if let Some(offsets) = config.center_offsets {
            return Ok(PatternDecoder::new(*config, offsets));
        }
        let (width, height) = self.projector.size().ok_or_else(|| {
            ReconError::config(
                "projector calibration has no width/height; center offsets cannot be derived",
            )
        })?;
        PatternDecoder::for_projector(
            *config,
            width,
            height,
            source.pair_count(Axis::Vertical),
            source.pair_count(Axis::Horizontal),
        )
    }

    /// Triangulate the matches of a finished decode
    pub fn process_decoded(&mut self, output: &DecodeOutput) -> usize {
        self.telemetry.skipped_pairs += output.telemetry.skipped_pairs;
        self.process_matches(&output.matches)
    }

    /// Decode `source` and triangulate the result
    pub fn process_sequence(
        &mut self,
        source: &impl PatternSource,
        config: &DecoderConfig,
    ) -> Result<usize> {
        let decoder = self.decoder_for(config, source)?;
        let output = decoder.decode_sequence(source)?;
        Ok(self.process_decoded(&output))
    }

    /// Write the accumulated cloud as ASCII PLY
    pub fn export_point_cloud<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.cloud.write_ply(path)?;
        info!("wrote {} points to {}", self.cloud.len(), path.display());
        Ok(())
    }
}
