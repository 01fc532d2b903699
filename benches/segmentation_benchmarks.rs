//! Benchmarks for background subtraction and full-file analysis.
//!
//! Run with: cargo bench
//!
//! The analysis benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{hint::black_box, path::Path};

use activity_meter::{
    ActivityAnalyzer, AnalysisOptions, BackgroundSubtractor, FfmpegLogLevel,
    ForegroundSegmenter, PixelFormat, RegionOfInterest, SegmentationOptions, WorkCriteria,
};
use criterion::{BenchmarkId, Criterion};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

/// Frames with a bright square sliding across a flat background.
fn moving_square_rgb(width: u32, height: u32, frames: u32) -> Vec<DynamicImage> {
    (0..frames)
        .map(|index| {
            let offset = (index * 4) % width.saturating_sub(16).max(1);
            DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
                if x >= offset && x < offset + 16 && y < 16 {
                    Rgb([240, 240, 240])
                } else {
                    Rgb([60, 70, 80])
                }
            }))
        })
        .collect()
}

fn benchmark_background_subtractor(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("background subtractor");

    for (width, height) in [(160_u32, 120_u32), (320, 240)] {
        let frames = moving_square_rgb(width, height, 30);

        group.bench_with_input(
            BenchmarkId::new("rgb", format!("{width}x{height}")),
            &frames,
            |bencher, frames| {
                bencher.iter(|| {
                    let mut subtractor = BackgroundSubtractor::default();
                    for frame in frames {
                        black_box(subtractor.apply(frame).unwrap().count_nonzero());
                    }
                });
            },
        );
    }

    let gray: Vec<_> = moving_square_rgb(320, 240, 30)
        .into_iter()
        .map(|frame| DynamicImage::ImageLuma8(frame.to_luma8()))
        .collect();
    group.bench_function("gray/320x240", |bencher| {
        bencher.iter(|| {
            let mut subtractor = BackgroundSubtractor::default();
            for frame in &gray {
                black_box(subtractor.apply(frame).unwrap().count_nonzero());
            }
        });
    });

    group.finish();
}

fn benchmark_mode_count(criterion: &mut Criterion) {
    let frame = DynamicImage::ImageLuma8(GrayImage::from_pixel(320, 240, Luma([90])));
    let mut group = criterion.benchmark_group("mixture modes");

    for modes in [1_u8, 3, 5] {
        group.bench_with_input(BenchmarkId::from_parameter(modes), &modes, |bencher, &modes| {
            let options = SegmentationOptions::new().with_max_modes(modes);
            bencher.iter(|| {
                let mut subtractor = BackgroundSubtractor::new(options.clone());
                for _ in 0..10 {
                    black_box(subtractor.apply(&frame).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn benchmark_file_analysis(criterion: &mut Criterion) {
    activity_meter::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let region = RegionOfInterest::new(100, 380, 160, 480).unwrap();
    let criteria = WorkCriteria::new(5.0).unwrap();

    let mut group = criterion.benchmark_group("analyze file");
    group.sample_size(10);

    for format in [PixelFormat::Rgb8, PixelFormat::Gray8] {
        let analyzer = ActivityAnalyzer::new(
            AnalysisOptions::new(region, 50, criteria).with_pixel_format(format),
        );
        group.bench_function(format!("{format:?}"), |bencher| {
            bencher.iter(|| black_box(analyzer.analyze(SAMPLE_VIDEO).unwrap()));
        });
    }

    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_background_subtractor,
    benchmark_mode_count,
    benchmark_file_analysis,
);
criterion::criterion_main!(benches);
