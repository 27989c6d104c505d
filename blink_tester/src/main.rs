use anyhow::Context;
use blink_vision::core_modules::utils::image_helper::image_helper;
use blink_vision::{BlinkPipeline, PipelineResult, Settings};
use std::env;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FPS: f64 = 30.0;

#[derive(Debug, Default)]
struct RunSummary {
    frames: usize,
    blinks: usize,
    suppressed: usize,
    rejected: usize,
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: blink_tester <frames_dir> [settings.json] [mask_out_dir]");
        return Ok(());
    }
    let frames_dir = PathBuf::from(&args[1]);
    let settings = match args.get(2) {
        Some(path) => load_settings(Path::new(path))?,
        None => Settings::default(),
    };
    let mask_dir = args.get(3).map(PathBuf::from);
    if let Some(dir) = &mask_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let fps = env::var("BLINK_FPS")
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| *v > 0.0)
        .unwrap_or(DEFAULT_FPS);
    let frame_interval = Duration::from_secs_f64(1.0 / fps);

    // --- 2. Frame Discovery ---
    let frame_paths = list_frames(&frames_dir)?;
    tracing::info!(count = frame_paths.len(), dir = %frames_dir.display(), fps, "replaying frames");

    // --- 3. Pipeline Initialization ---
    let mut pipeline = BlinkPipeline::new(settings)?;
    let start = Instant::now();
    let mut summary = RunSummary::default();

    // --- 4. Main Processing Loop ---
    for (index, path) in frame_paths.iter().enumerate() {
        let frame = image_helper::load_frame(path).with_context(|| format!("decoding {}", path.display()))?;
        let captured_at = start + frame_interval.mul_f64(index as f64);
        summary.frames += 1;

        match pipeline.process(frame, captured_at) {
            Ok(PipelineResult::Found { left_eye, right_eye }) => {
                summary.blinks += 1;
                tracing::info!(
                    frame = index,
                    file = %path.display(),
                    left = ?left_eye,
                    right = ?right_eye,
                    "BLINK"
                );
            }
            Ok(PipelineResult::Suppressed) => summary.suppressed += 1,
            Ok(PipelineResult::NotFound { kind, detail }) => {
                tracing::debug!(frame = index, ?kind, %detail, "no blink");
            }
            Ok(PipelineResult::Skipped) => {}
            Err(err) => {
                summary.rejected += 1;
                tracing::warn!(frame = index, file = %path.display(), error = %err, "frame rejected");
            }
        }

        // --- 5. Visualization ---
        if let (Some(dir), Some(mask)) = (&mask_dir, pipeline.last_motion_mask()) {
            let out = dir.join(format!("mask_{index:05}.png"));
            image_helper::save_mask(&out, mask).with_context(|| format!("writing {}", out.display()))?;
        }
    }

    tracing::info!(
        frames = summary.frames,
        blinks = summary.blinks,
        suppressed = summary.suppressed,
        rejected = summary.rejected,
        "replay complete"
    );
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);
    // Already-set is fine when embedded in another harness.
    let _ = tracing_subscriber::registry().with(env_filter).with(stdout_layer).try_init();
}

fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    settings.validate()?;
    tracing::info!(?settings, "loaded settings");
    Ok(settings)
}

fn list_frames(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg" | "bmp"))
            .unwrap_or(false);
        if is_image {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
