use std::{path::PathBuf, sync::Arc};

use activity_meter::{
    ActivityAnalyzer, AnalysisOptions, FfmpegLogLevel, FrameRate, FrameSource, PixelFormat,
    ProgressCallback, ProgressInfo, RegionOfInterest, SegmentationOptions, VideoSource,
    WorkCriteria,
};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  activity-meter analyze desk.mp4 --roi 200,500,100,300 --threshold 50 --min-duration 60\n  activity-meter analyze desk.mp4 --roi 200,500,100,300 --threshold 50 --min-duration 60 --source-fps --json\n  activity-meter probe desk.mp4\n  activity-meter completions zsh > _activity-meter";

#[derive(Debug, Parser)]
#[command(
    name = "activity-meter",
    version,
    about = "Estimate work duration from motion inside a region of a video",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional diagnostic output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while frames are analyzed.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<FfmpegLogLevel>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze a video and rate the work duration.
    #[command(
        about = "Estimate work duration and performance category",
        after_help = "Examples:\n  activity-meter analyze desk.mp4 --roi 200,500,100,300 --threshold 50 --min-duration 60\n  activity-meter analyze desk.mp4 --roi 0,240,0,320 --threshold 200 --min-duration 10 --fps 25 --gray"
    )]
    Analyze {
        /// Input video path.
        input: PathBuf,
        /// Region of interest as TOP,BOTTOM,LEFT,RIGHT (bottom/right exclusive).
        #[arg(long, value_parser = parse_region)]
        roi: RegionOfInterest,
        /// A frame counts as work when more foreground pixels than this are set.
        #[arg(long)]
        threshold: u64,
        /// Minimum work duration in seconds for a "Good" rating.
        #[arg(long)]
        min_duration: f64,
        /// Frame rate used to scale the work ratio (default 30).
        #[arg(long, conflicts_with = "source_fps")]
        fps: Option<f64>,
        /// Use the frame rate reported by the video, falling back to --fps or 30.
        #[arg(long)]
        source_fps: bool,
        /// Decode frames as grayscale instead of RGB.
        #[arg(long)]
        gray: bool,
        /// Do not label shadows as foreground.
        #[arg(long)]
        no_shadows: bool,
        /// Background model history length in frames.
        #[arg(long)]
        history: Option<u32>,
        /// Output the result as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print stream metadata for a video.
    #[command(about = "Print video metadata", visible_alias = "info")]
    Probe {
        /// Input video path.
        input: PathBuf,
        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_region(value: &str) -> Result<RegionOfInterest, String> {
    value.parse::<RegionOfInterest>().map_err(|error| error.to_string())
}

fn frame_rate_policy(fps: Option<f64>, source_fps: bool) -> FrameRate {
    let rate = fps.unwrap_or(activity_meter::DEFAULT_FRAMES_PER_SECOND);
    if source_fps {
        FrameRate::Source { fallback: rate }
    } else {
        FrameRate::Fixed(rate)
    }
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} frames {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total.max(info.current));
        }
        self.bar.set_position(info.current);
        self.bar.set_message(format!("({} work)", info.work_frames));
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(level) = cli.global.log_level {
        activity_meter::set_ffmpeg_log_level(level);
    }

    match cli.command {
        Commands::Analyze {
            input,
            roi,
            threshold,
            min_duration,
            fps,
            source_fps,
            gray,
            no_shadows,
            history,
            json,
        } => {
            let criteria = WorkCriteria::new(min_duration)?;

            let mut segmentation = SegmentationOptions::new().with_detect_shadows(!no_shadows);
            if let Some(history) = history {
                segmentation = segmentation.with_history(history);
            }

            let pixel_format = if gray {
                PixelFormat::Gray8
            } else {
                PixelFormat::Rgb8
            };

            let mut options = AnalysisOptions::new(roi, threshold, criteria)
                .with_frame_rate(frame_rate_policy(fps, source_fps))
                .with_pixel_format(pixel_format)
                .with_segmentation(segmentation);

            let progress = if cli.global.progress {
                let progress = Arc::new(TerminalProgress::new()?);
                options = options.with_progress(progress.clone()).with_batch_size(10);
                Some(progress)
            } else {
                None
            };

            if cli.global.verbose {
                eprintln!("{} {options:?}", "options".cyan().bold());
            }

            let result = ActivityAnalyzer::new(options).analyze(&input);

            if let Some(progress) = progress {
                progress.bar.finish_and_clear();
            }
            let result = result?;

            if cli.global.verbose {
                eprintln!(
                    "{} {} of {} frame(s) counted as work at {:.2} fps",
                    "frames".cyan().bold(),
                    result.work_frames,
                    result.frame_count,
                    result.frames_per_second,
                );
            }

            if json {
                let payload = json!({
                    "work_duration": result.work_duration,
                    "performance": result.performance.as_str(),
                    "frame_count": result.frame_count,
                    "work_frames": result.work_frames,
                    "frames_per_second": result.frames_per_second,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{result}");
            }
        }
        Commands::Probe { input, json } => {
            let source = VideoSource::open(&input, PixelFormat::Rgb8)?;
            let metadata = source.metadata();
            if json {
                let payload = json!({
                    "format": metadata.format,
                    "codec": metadata.codec,
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "estimated_frame_count": metadata.estimated_frame_count,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!("Duration: {:?}", metadata.duration);
                println!(
                    "Video: {}x{} @ {:.2} fps [{}], ~{} frames",
                    metadata.width,
                    metadata.height,
                    metadata.frames_per_second,
                    metadata.codec,
                    metadata.estimated_frame_count,
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "activity-meter", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use activity_meter::FrameRate;
    use clap::Parser;

    use super::{Cli, Commands, frame_rate_policy, parse_region};

    #[test]
    fn parse_region_accepts_four_bounds() {
        let region = parse_region("200, 500, 100, 300").unwrap();
        assert_eq!(region.top(), 200);
        assert_eq!(region.right(), 300);

        assert!(parse_region("200,500,100").is_err());
        assert!(parse_region("500,200,100,300").is_err());
        assert!(parse_region("a,b,c,d").is_err());
    }

    #[test]
    fn frame_rate_policy_defaults_to_fixed_thirty() {
        assert_eq!(frame_rate_policy(None, false), FrameRate::Fixed(30.0));
        assert_eq!(frame_rate_policy(Some(25.0), false), FrameRate::Fixed(25.0));
        assert_eq!(
            frame_rate_policy(None, true),
            FrameRate::Source { fallback: 30.0 }
        );
    }

    #[test]
    fn analyze_command_parses() {
        let cli = Cli::try_parse_from([
            "activity-meter",
            "analyze",
            "desk.mp4",
            "--roi",
            "200,500,100,300",
            "--threshold",
            "50",
            "--min-duration",
            "60",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze {
                threshold,
                min_duration,
                json,
                source_fps,
                ..
            } => {
                assert_eq!(threshold, 50);
                assert_eq!(min_duration, 60.0);
                assert!(json);
                assert!(!source_fps);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn fps_conflicts_with_source_fps() {
        let result = Cli::try_parse_from([
            "activity-meter",
            "analyze",
            "desk.mp4",
            "--roi",
            "0,10,0,10",
            "--threshold",
            "1",
            "--min-duration",
            "5",
            "--fps",
            "25",
            "--source-fps",
        ]);
        assert!(result.is_err());
    }
}
