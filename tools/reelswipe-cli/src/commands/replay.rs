//! Replay recorded frames through the gesture pipeline.

use std::path::{Path, PathBuf};

use clap::Args;
use reelswipe_common::clock::FrameClock;
use reelswipe_common::config::AppConfig;
use reelswipe_gesture::{Action, Axis, ExtractorKind, FrameOutcome, GestureController};
use serde::Serialize;

use super::resolve;
use crate::keys::KeyScheme;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Directory of frames (png, jpg, jpeg, bmp), processed in file-name order
    pub dir: PathBuf,

    /// Frame rate the frames were captured at
    #[arg(long, default_value = "30")]
    pub fps: f64,

    /// Motion backend: foreground|optical-flow
    #[arg(long)]
    pub strategy: Option<ExtractorKind>,

    /// Swipe axis: vertical|horizontal
    #[arg(long)]
    pub axis: Option<Axis>,

    /// Minimum primary-axis displacement (fraction of the frame)
    #[arg(long)]
    pub min_displacement: Option<f64>,

    /// Maximum swipe duration (seconds)
    #[arg(long)]
    pub max_duration: Option<f64>,

    /// Seconds between accepted swipes
    #[arg(long)]
    pub cooldown: Option<f64>,

    /// Number of samples kept for swipe analysis (the foreground backend keeps at least 15)
    #[arg(long)]
    pub history: Option<usize>,

    /// Key scheme to report: arrows|wasd|jk|space
    #[arg(long)]
    pub keys: Option<KeyScheme>,

    /// Print one JSON object per action instead of text
    #[arg(long)]
    pub json: bool,
}

impl ReplayArgs {
    /// Write command-line overrides into `config`.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(kind) = self.strategy {
            config.detector.strategy = kind.as_str().to_string();
        }
        if let Some(axis) = self.axis {
            config.swipe.axis = axis.to_string();
        }
        if let Some(v) = self.min_displacement {
            config.swipe.min_displacement = v;
        }
        if let Some(v) = self.max_duration {
            config.swipe.max_duration = v;
        }
        if let Some(v) = self.cooldown {
            config.swipe.cooldown = v;
        }
        if let Some(v) = self.history {
            config.swipe.history = v;
        }
        if let Some(keys) = self.keys {
            config.keys = keys.as_str().to_string();
        }
    }
}

#[derive(Debug, Serialize)]
struct ActionRecord<'a> {
    frame: usize,
    file: &'a str,
    t: f64,
    action: Action,
    key: Option<&'static str>,
}

#[derive(Debug, Default)]
struct ReplaySummary {
    frames: usize,
    unreadable: usize,
    dropped: usize,
    idle: usize,
    tracked: usize,
    actions: usize,
}

pub fn run(args: ReplayArgs, mut config: AppConfig) -> anyhow::Result<()> {
    args.apply(&mut config);
    let session = resolve(&config)?;

    let frames = list_frames(&args.dir)?;
    if frames.is_empty() {
        anyhow::bail!(
            "No frames ({}) found in {}",
            FRAME_EXTENSIONS.join(", "),
            args.dir.display()
        );
    }

    let clock = FrameClock::new(args.fps);
    let mut controller = GestureController::new(session.swipe, session.kind, &config.detector)?;

    if !args.json {
        println!("Replaying {} frames from {}", frames.len(), args.dir.display());
        println!(
            "  Backend: {}  Axis: {}  Keys: {}  ({:.1} fps)",
            session.kind,
            session.swipe.axis(),
            session.keys,
            1.0 / clock.interval_secs()
        );
    }

    let mut summary = ReplaySummary::default();
    for (index, path) in frames.iter().enumerate() {
        summary.frames += 1;
        let frame = match image::open(path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                tracing::warn!(frame = index, "Skipping unreadable frame {}: {e}", path.display());
                summary.unreadable += 1;
                continue;
            }
        };

        let t = clock.timestamp(index);
        match controller.process_frame_at(&frame, t) {
            FrameOutcome::Gesture(action) => {
                summary.actions += 1;
                let record = ActionRecord {
                    frame: index,
                    file: file_label(path),
                    t,
                    action,
                    key: session.keys.key_for(action),
                };
                report(&record, args.json)?;
            }
            FrameOutcome::Tracked(sample, classification) => {
                summary.tracked += 1;
                tracing::trace!(
                    frame = index,
                    x = sample.x,
                    y = sample.y,
                    confidence = sample.confidence,
                    ?classification,
                    "Tracked"
                );
            }
            FrameOutcome::NoMotion => summary.idle += 1,
            FrameOutcome::Dropped(err) => {
                summary.dropped += 1;
                tracing::debug!(frame = index, error = %err, "Frame dropped");
            }
        }
    }
    controller.close();

    if args.json {
        tracing::info!(
            frames = summary.frames,
            actions = summary.actions,
            dropped = summary.dropped + summary.unreadable,
            "Replay finished"
        );
    } else {
        println!();
        println!("Replay finished:");
        println!("  Frames:     {}", summary.frames);
        println!("  Tracked:    {}", summary.tracked);
        println!("  No motion:  {}", summary.idle);
        println!("  Dropped:    {}", summary.dropped);
        println!("  Unreadable: {}", summary.unreadable);
        println!("  Actions:    {}", summary.actions);
    }

    Ok(())
}

fn report(record: &ActionRecord<'_>, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(record)?);
    } else {
        println!(
            "  [{:>5}] {:>8.3}s  {:<4}  key: {:<11}  ({})",
            record.frame,
            record.t,
            record.action.as_str().to_uppercase(),
            record.key.unwrap_or("-"),
            record.file
        );
    }
    Ok(())
}

fn file_label(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("<non-utf8>")
}

/// Frame files in `dir`, sorted by file name.
fn list_frames(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| anyhow::anyhow!("Cannot read frame directory {}: {e}", dir.display()))?;

    let mut frames = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_frame = path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    FRAME_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                });
        if is_frame {
            frames.push(path);
        }
    }
    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &str) -> ReplayArgs {
        ReplayArgs {
            dir: PathBuf::from(dir),
            fps: 30.0,
            strategy: None,
            axis: None,
            min_displacement: None,
            max_duration: None,
            cooldown: None,
            history: None,
            keys: None,
            json: false,
        }
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = AppConfig::default();
        let replay = ReplayArgs {
            strategy: Some(ExtractorKind::OpticalFlow),
            axis: Some(Axis::Horizontal),
            cooldown: Some(1.2),
            keys: Some(KeyScheme::Jk),
            ..args("frames")
        };
        replay.apply(&mut config);

        let session = resolve(&config).unwrap();
        assert_eq!(session.kind, ExtractorKind::OpticalFlow);
        assert_eq!(session.swipe.axis(), Axis::Horizontal);
        assert_eq!(session.swipe.cooldown(), 1.2);
        assert_eq!(session.keys, KeyScheme::Jk);
        assert_eq!(session.swipe.history(), 5);
    }

    #[test]
    fn invalid_override_fails_resolution() {
        let mut config = AppConfig::default();
        ReplayArgs {
            history: Some(1),
            ..args("frames")
        }
        .apply(&mut config);
        assert!(resolve(&config).is_err());
    }

    #[test]
    fn lists_only_frames_in_name_order() {
        let dir = std::env::temp_dir().join(format!("reelswipe-frames-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["0002.png", "0001.JPG", "notes.txt", "0003.bmp"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let names: Vec<String> = list_frames(&dir)
            .unwrap()
            .iter()
            .map(|p| file_label(p).to_string())
            .collect();
        assert_eq!(names, vec!["0001.JPG", "0002.png", "0003.bmp"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(list_frames(Path::new("/nonexistent/reelswipe/frames")).is_err());
    }
}
