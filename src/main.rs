//! digit-recognizer CLI - recognize handwritten digits in images.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use digit_recognizer::image::{self, RawImage, SUPPORTED_EXTENSIONS};
use digit_recognizer::model::{
    ConfidenceScale, ModelLocator, OnnxModel, Prediction, MODEL_FILENAME,
};
use digit_recognizer::pipeline::InputKind;
use digit_recognizer::{Config, Recognizer};

/// Recognize handwritten digits with a trained ONNX classifier.
#[derive(Parser, Debug)]
#[command(name = "digit-recognizer")]
#[command(version, about, long_about = None)]
struct Args {
    /// Model artifact path. Defaults to searching models/, the working directory, and the data directory.
    #[arg(short, long, global = true, value_name = "PATH")]
    model: Option<PathBuf>,

    /// Show confidence as a percentage instead of a probability.
    #[arg(long, global = true)]
    percent: bool,

    /// Confidence at or above this is reported as high (0.0-1.0).
    #[arg(long, global = true, default_value = "0.8", value_name = "FLOAT")]
    threshold: f32,

    /// Confidence below this is reported as low (0.0-1.0). Defaults to 0.5, capped at --threshold.
    #[arg(long, global = true, value_name = "FLOAT")]
    medium_threshold: Option<f32>,

    /// Number of predictions kept for the batch summary.
    #[arg(long, global = true, default_value = "100", value_name = "INT")]
    history_limit: usize,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize the digit in one or more image files.
    Predict {
        /// Input image paths.
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,

        /// Treat images as canvas drawings (black ink on white, no thresholding).
        #[arg(long)]
        drawing: bool,

        /// Directory to write the 28x28 network input of each image to.
        #[arg(long, value_name = "DIR")]
        save_input: Option<PathBuf>,
    },

    /// Recognize every supported image in a directory.
    Batch {
        /// Directory containing images.
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Render a sample "7", save it, and recognize it.
    Demo {
        /// Where to save the rendered digit.
        #[arg(short, long, default_value = "demo_digit.png", value_name = "PATH")]
        output: PathBuf,
    },

    /// Show model location, status, and supported formats.
    Info,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("digit_recognizer={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    let mut config = Config {
        model_path: args.model.clone(),
        confidence_scale: if args.percent {
            ConfidenceScale::Percentage
        } else {
            ConfidenceScale::Probability
        },
        history_limit: args.history_limit,
        ..Config::default()
    }
    .with_confidence_threshold(args.threshold);
    if let Some(medium) = args.medium_threshold {
        config.medium_confidence_threshold = medium;
    }

    match &args.command {
        Command::Predict {
            images,
            drawing,
            save_input,
        } => predict(config, images, *drawing, save_input.as_deref()),
        Command::Batch { dir } => batch(config, dir),
        Command::Demo { output } => demo(config, output),
        Command::Info => {
            info(&config);
            Ok(())
        }
    }
}

fn load_recognizer(config: Config) -> Result<Recognizer<OnnxModel>> {
    Recognizer::new(config).context("Failed to initialize recognizer")
}

fn predict(
    config: Config,
    images: &[PathBuf],
    drawing: bool,
    save_input: Option<&Path>,
) -> Result<()> {
    let mut recognizer = load_recognizer(config)?;

    if let Some(dir) = save_input {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    for path in images {
        let buffer = if drawing {
            let loaded = image::load_grayscale(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            Some(loaded)
        } else {
            None
        };
        let raw = buffer
            .as_ref()
            .map_or(RawImage::File(path), RawImage::Drawing);
        let kind = if drawing {
            InputKind::Drawing
        } else {
            InputKind::File
        };

        let tensor = image::normalize(raw)
            .with_context(|| format!("Failed to normalize {}", path.display()))?;

        if let Some(dir) = save_input {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("input");
            let target = dir.join(format!("{stem}.input.png"));
            image::save_tensor(&tensor, &target, 10)?;
            println!("Saved network input to {}", target.display());
        }

        let prediction = recognizer
            .classify(&tensor, kind)
            .with_context(|| format!("Failed to recognize {}", path.display()))?;

        println!("{}: {}", path.display(), describe(&recognizer, &prediction));
    }

    Ok(())
}

fn batch(config: Config, dir: &Path) -> Result<()> {
    let mut images: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && image::is_supported_path(p))
        .collect();
    images.sort();

    if images.is_empty() {
        anyhow::bail!(
            "No supported images ({}) in {}",
            SUPPORTED_EXTENSIONS.join(", "),
            dir.display()
        );
    }

    let mut recognizer = load_recognizer(config)?;

    let pb = ProgressBar::new(images.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Recognizing [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let mut failures = 0usize;
    for path in &images {
        match recognizer.recognize_file(path) {
            Ok(prediction) => {
                pb.println(format!(
                    "{}: {}",
                    path.display(),
                    describe(&recognizer, &prediction)
                ));
            }
            Err(err) => {
                failures += 1;
                pb.println(format!(
                    "{}: failed ({:?} error): {err}",
                    path.display(),
                    err.category()
                ));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let threshold = recognizer.config().confidence_threshold;
    let summary = recognizer.history().summary(threshold);
    println!();
    println!(
        "Recognized {} of {} images",
        images.len() - failures,
        images.len()
    );
    if let Some(mean) = summary.mean_confidence {
        println!(
            "Mean confidence: {}",
            format_confidence(recognizer.config().confidence_scale, mean)
        );
    }
    println!("High confidence (>= {threshold:.2}): {}", summary.high_confidence);
    for (digit, count) in summary.digit_counts.iter().enumerate().filter(|&(_, &c)| c > 0) {
        println!("  {digit}: {count}");
    }

    if failures > 0 {
        anyhow::bail!("{failures} image(s) could not be recognized");
    }
    Ok(())
}

fn demo(config: Config, output: &Path) -> Result<()> {
    println!("Creating sample handwritten digit...");
    image::sample_seven()
        .save(output)
        .with_context(|| format!("Failed to save {}", output.display()))?;
    println!("Sample digit saved as {}", output.display());

    let mut recognizer = load_recognizer(config)?;
    let prediction = recognizer
        .recognize_file(output)
        .context("Failed to recognize sample digit")?;

    println!("Prediction: {}", describe(&recognizer, &prediction));
    Ok(())
}

fn info(config: &Config) {
    println!("digit-recognizer {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Model candidates:");
    let locator: ModelLocator = config.locator();
    for status in locator.status() {
        match status.size {
            #[allow(clippy::cast_precision_loss)]
            Some(bytes) => println!(
                "  [found]   {} ({:.1} MB)",
                status.path.display(),
                bytes as f64 / (1024.0 * 1024.0)
            ),
            None => println!("  [missing] {}", status.path.display()),
        }
    }
    if locator.resolve().is_err() {
        println!("No model artifact found; place {MODEL_FILENAME} at one of the paths above.");
    }
    println!();
    println!("Supported formats: {}", SUPPORTED_EXTENSIONS.join(", "));
    println!(
        "Network input: {0}x{0} grayscale, drawing canvas {1}x{1}",
        image::DIGIT_SIZE,
        image::CANVAS_SIZE
    );
}

fn describe(recognizer: &Recognizer<OnnxModel>, prediction: &Prediction) -> String {
    format!(
        "{} (confidence {}, {})",
        prediction.digit(),
        format_confidence(recognizer.config().confidence_scale, prediction.confidence()),
        recognizer.confidence_level(prediction)
    )
}

fn format_confidence(scale: ConfidenceScale, probability: f32) -> String {
    match scale {
        ConfidenceScale::Probability => format!("{probability:.3}"),
        ConfidenceScale::Percentage => format!("{:.1}%", probability * 100.0),
    }
}
