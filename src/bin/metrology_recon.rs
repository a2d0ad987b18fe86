use clap::Parser;
use log::{error, info, warn};
use metrology_recon::decoder::{DirectorySource, PatternDecoder};
use metrology_recon::io::load_calibration;
use metrology_recon::{
    BasisConvention, DecoderConfig, PipelineConfig, ReconstructionPipeline, Result, SequenceLayout,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(
    name = "metrology-recon",
    version,
    about = "Structured-light reconstruction to an ASCII PLY point cloud"
)]
struct Cli {
    /// Camera calibration JSON
    camera: PathBuf,
    /// Projector calibration JSON
    projector: PathBuf,
    /// Pattern directory, or a `cam_u,cam_v,proj_u,proj_v` correspondence file
    input: PathBuf,
    /// Output point cloud
    #[arg(default_value = "output.ply")]
    output: PathBuf,
    /// Columns masked out at the left edge
    #[arg(long)]
    crop: Option<usize>,
    /// Shift of the right crop edge (applied twice)
    #[arg(long, allow_hyphen_values = true)]
    crop_offset: Option<i64>,
    /// Minimum white-minus-blank contrast
    #[arg(long)]
    signal_threshold: Option<f32>,
    /// Erosion passes on the validity mask
    #[arg(long)]
    erosion_iterations: Option<usize>,
    /// Added to projector coordinates before ray casting
    #[arg(long, allow_hyphen_values = true)]
    projector_pixel_offset: Option<f64>,
    /// camera-to-world or world-to-camera
    #[arg(long)]
    basis_convention: Option<BasisConvention>,
    /// Pattern file extension
    #[arg(long)]
    extension: Option<String>,
    /// Drop points with z below this value
    #[arg(long, allow_hyphen_values = true)]
    z_min: Option<f64>,
    /// Drop points with z above this value
    #[arg(long, allow_hyphen_values = true)]
    z_max: Option<f64>,
    /// Write mask and code images to this directory
    #[arg(long)]
    debug_maps: Option<PathBuf>,
}

impl Cli {
    fn decoder_config(&self) -> DecoderConfig {
        let mut config = DecoderConfig::from_env();
        if let Some(crop) = self.crop {
            config.crop = crop;
        }
        if let Some(offset) = self.crop_offset {
            config.crop_offset = offset;
        }
        if let Some(threshold) = self.signal_threshold {
            config.signal_threshold = threshold;
        }
        if let Some(iterations) = self.erosion_iterations {
            config.erosion_iterations = iterations;
        }
        config
    }

    fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::from_env();
        if let Some(offset) = self.projector_pixel_offset {
            config.projector_pixel_offset = offset;
        }
        if let Some(convention) = self.basis_convention {
            config.basis_convention = convention;
        }
        config
    }

    fn layout(&self) -> SequenceLayout {
        match &self.extension {
            Some(ext) => SequenceLayout::with_extension(ext.trim_start_matches('.')),
            None => SequenceLayout::default(),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help / --version land here too and are not failures
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let start = Instant::now();
    let camera = load_calibration(&cli.camera)?;
    let projector = load_calibration(&cli.projector)?;
    let mut pipeline =
        ReconstructionPipeline::from_calibration(&camera, &projector, cli.pipeline_config())?;

    if cli.input.is_dir() {
        let source = DirectorySource::new(&cli.input, cli.layout());
        let decoder = pipeline.decoder_for(&cli.decoder_config(), &source)?;
        let maps = decoder.decode_maps(&source)?;
        if let Some(dir) = &cli.debug_maps {
            maps.save_debug_maps(dir)?;
        }
        let output = PatternDecoder::finish(maps);
        pipeline.process_decoded(&output);
    } else {
        if cli.debug_maps.is_some() {
            warn!("--debug-maps ignored for correspondence input");
        }
        pipeline.process_correspondence_file(&cli.input)?;
    }

    let cloud = pipeline.point_cloud_mut();
    let dropped = cloud.retain_finite();
    if dropped > 0 {
        warn!("dropped {dropped} non-finite points");
    }
    if cli.z_min.is_some() || cli.z_max.is_some() {
        let removed = cloud.retain_z_range(
            cli.z_min.unwrap_or(f64::NEG_INFINITY),
            cli.z_max.unwrap_or(f64::INFINITY),
        );
        info!("z filter removed {removed} points");
    }

    pipeline.export_point_cloud(&cli.output)?;
    let t = pipeline.telemetry();
    info!(
        "done in {:.2?}: {} matches, {} points, {} degenerate, {} rejected lines, {} skipped pairs",
        start.elapsed(),
        t.matches_in,
        pipeline.point_cloud().len(),
        t.degenerate_rays,
        t.rejected_lines,
        t.skipped_pairs
    );
    Ok(())
}
