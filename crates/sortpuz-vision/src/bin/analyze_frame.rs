//! CLI tool to check a calibration against a saved puzzle screenshot.
//! Usage: cargo run --features cli --bin analyze_frame -- <screenshot.png> <tubes_top> <tubes_bottom> <slots> [config.toml] [output_dir]

use sortpuz_capture::{load_frame, mark_point, FrameSampler};
use sortpuz_data::ParseConfig;
use sortpuz_state::LayoutDescriptor;
use sortpuz_vision::{extract, generate_grid};
use std::path::PathBuf;

fn parse_count(arg: &str, what: &str) -> usize {
    match arg.parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("Invalid {}: '{}'", what, arg);
            std::process::exit(1);
        }
    }
}

fn main() {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 {
        eprintln!(
            "Usage: {} <screenshot.png> <tubes_top> <tubes_bottom> <slots> [config.toml] [output_dir]",
            args[0]
        );
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let layout = LayoutDescriptor::new(
        [
            parse_count(&args[2], "top row tube count"),
            parse_count(&args[3], "bottom row tube count"),
        ],
        parse_count(&args[4], "slot count"),
    );
    let config = match args.get(5) {
        Some(path) => ParseConfig::load(&PathBuf::from(path)).unwrap_or_else(|e| {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }),
        None => ParseConfig::default(),
    };
    let output_dir = args
        .get(6)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./debug_output"));
    let _ = std::fs::create_dir_all(&output_dir);

    println!("Loading image: {}", input_path.display());
    let frame = load_frame(&input_path).unwrap_or_else(|e| {
        eprintln!("{:#}", e);
        std::process::exit(1);
    });
    println!("Image size: {}x{}", frame.width(), frame.height());

    println!("\n=== Sample Grid ({}) ===", layout);
    let grid = match generate_grid(&layout, &config.coordinates) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("Invalid layout: {}", e);
            std::process::exit(1);
        }
    };

    let state = match extract(&layout, &config, &FrameSampler::new(&frame)) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Extraction failed: {}", e);
            std::process::exit(1);
        }
    };

    let mut annotated = frame.clone();
    for ((pos, point), (_, color)) in grid.iter().zip(state.iter()) {
        let label = if color.is_classified() {
            color.label()
        } else {
            "??"
        };
        println!("  {}: {} rgb={} -> {}", pos, point, color.rgb(), label);

        let marker = if color.is_classified() {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([255, 0, 0, 255])
        };
        mark_point(&mut annotated, *point, 6, marker);
    }

    println!("\n=== Color Counts ===");
    for (label, count) in state.label_counts() {
        println!("  {:<12} {}", label, count);
    }
    let unclassified = state.unclassified();
    println!("  {:<12} {}", "unclassified", unclassified.len());

    let annotated_path = output_dir.join("sample_points.png");
    match annotated.save(&annotated_path) {
        Ok(()) => println!("\nAnnotated frame saved to: {}", annotated_path.display()),
        Err(e) => eprintln!("\nFailed to save {}: {}", annotated_path.display(), e),
    }
}
