//! Command-line interface for the telemetry pipeline.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Instant;

use crate::core::loaders::{load_artifact_csv, load_capture_csv};
use crate::core::schema::{self, ChannelSelection};
use crate::core::writers::{write_artifact_csv, write_capture_csv, write_joined_csv};
use crate::processors::filter::WindowKind;
use crate::processors::resample::{DecimationPolicy, RateConversionSpec};
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "telemetry-pipeline")]
#[command(about = "Batch signal conditioning for manipulator telemetry", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove rows from the edges of an artifact CSV
    Trim {
        /// Input artifact CSV (headerless, timestamp first)
        input: PathBuf,
        /// Output artifact CSV
        output: PathBuf,
        /// Rows to remove from the front
        #[arg(long)]
        start_rows: Option<usize>,
        /// Rows to remove from the back
        #[arg(long)]
        end_rows: Option<usize>,
        /// Remove the last N seconds instead of a row count
        #[arg(long, conflicts_with = "end_rows")]
        seconds: Option<f64>,
        /// Sample rate used to convert --seconds to rows
        #[arg(long)]
        frequency: Option<f64>,
    },

    /// Design a low-pass FIR filter and apply it without phase shift
    Filter {
        /// Input artifact CSV
        input: PathBuf,
        /// Output artifact CSV
        output: PathBuf,
        /// Window family: kaiser, chebyshev, or hamming
        #[arg(short, long)]
        window: Option<WindowKind>,
        /// Filter order (taps = order + 1)
        #[arg(long)]
        order: Option<usize>,
        /// Cutoff frequency in Hz
        #[arg(long)]
        cutoff: Option<f64>,
        /// Sample rate of the input in Hz
        #[arg(long)]
        sample_rate: Option<f64>,
        /// Channel indices to filter (defaults to the torque block)
        #[arg(long, num_args = 1..)]
        channels: Option<Vec<usize>>,
    },

    /// Reduce the sample rate by an integer factor
    Downsample {
        /// Input artifact CSV
        input: PathBuf,
        /// Output artifact CSV
        output: PathBuf,
        /// Source sample rate in Hz
        #[arg(long)]
        original_rate: Option<f64>,
        /// Target sample rate in Hz
        #[arg(long)]
        target_rate: Option<f64>,
        /// Policy: stride, moving_average, or grouped_mean
        #[arg(long)]
        policy: Option<DecimationPolicy>,
    },

    /// Resample onto an exactly uniform clock by linear interpolation
    Interpolate {
        /// Input artifact CSV
        input: PathBuf,
        /// Output artifact CSV
        output: PathBuf,
        /// Target sample rate in Hz
        #[arg(short, long)]
        rate: f64,
    },

    /// Inner-join two artifacts on exact timestamp match
    Join {
        /// First input artifact CSV
        input_a: PathBuf,
        /// Second input artifact CSV
        input_b: PathBuf,
        /// Output CSV with prefixed column headers
        output: PathBuf,
        /// Channel indices taken from the first input (defaults to all)
        #[arg(long, num_args = 1..)]
        channels_a: Option<Vec<usize>>,
        /// Channel indices taken from the second input (defaults to all)
        #[arg(long, num_args = 1..)]
        channels_b: Option<Vec<usize>>,
        /// Label prefix for the first input's columns
        #[arg(long, default_value = "filtered_")]
        prefix_a: String,
        /// Label prefix for the second input's columns
        #[arg(long, default_value = "unfiltered_")]
        prefix_b: String,
    },

    /// Project a headered capture CSV onto named columns, headerless output
    Select {
        /// Input capture CSV with a header row
        input: PathBuf,
        /// Output artifact CSV
        output: PathBuf,
        /// Column names to keep, in order (defaults to the 18 joint
        /// feedback columns)
        #[arg(long, num_args = 1..)]
        columns: Option<Vec<String>>,
    },

    /// Rewrite encoder positions from the potentiometer channels
    PotRemap {
        /// Input capture CSV with a header row
        input: PathBuf,
        /// Output capture CSV
        output: PathBuf,
        /// Do not recompute ENCODER_VEL_1/2/3 from the remapped positions
        #[arg(long)]
        keep_original_vel: bool,
        /// Smoothing span for the velocity recomputation
        #[arg(long)]
        vel_smooth_span: Option<usize>,
    },

    /// Split an artifact into ordered validation and test segments
    Split {
        /// Input artifact CSV
        input: PathBuf,
        /// Output path for the validation segment
        #[arg(long, default_value = "val.csv")]
        val_output: PathBuf,
        /// Output path for the test segment (timestamps re-zeroed)
        #[arg(long, default_value = "test.csv")]
        test_output: PathBuf,
        /// Fraction of rows in the validation segment
        #[arg(long, default_value_t = 0.5)]
        ratio: f64,
    },

    /// Plot one channel of an artifact, optionally over a second artifact
    Visualize {
        /// Input artifact CSV
        input: PathBuf,
        /// Second artifact drawn underneath (e.g. the unfiltered input)
        #[arg(long)]
        baseline: Option<PathBuf>,
        /// Output PNG file path (defaults to the input name with .png)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Channel index to plot
        #[arg(long, default_value_t = 0)]
        channel: usize,
        /// Maximum points per trace (subsamples if exceeded)
        #[arg(long, default_value_t = 1_000_000)]
        max_points: usize,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.len() > 39 {
            format!("{}...", &value[..36])
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}, using defaults",
                    path.display(),
                    e
                );
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::Trim { input, output, start_rows, end_rows, seconds, frequency } => {
            cmd_trim(&input, &output, start_rows, end_rows, seconds, frequency, &config);
        }
        Commands::Filter { input, output, window, order, cutoff, sample_rate, channels } => {
            cmd_filter(&input, &output, window, order, cutoff, sample_rate, channels, &config);
        }
        Commands::Downsample { input, output, original_rate, target_rate, policy } => {
            cmd_downsample(&input, &output, original_rate, target_rate, policy, &config);
        }
        Commands::Interpolate { input, output, rate } => {
            cmd_interpolate(&input, &output, rate);
        }
        Commands::Join { input_a, input_b, output, channels_a, channels_b, prefix_a, prefix_b } => {
            cmd_join(&input_a, &input_b, &output, channels_a, channels_b, &prefix_a, &prefix_b);
        }
        Commands::Select { input, output, columns } => {
            cmd_select(&input, &output, columns);
        }
        Commands::PotRemap { input, output, keep_original_vel, vel_smooth_span } => {
            cmd_pot_remap(&input, &output, keep_original_vel, vel_smooth_span, &config);
        }
        Commands::Split { input, val_output, test_output, ratio } => {
            cmd_split(&input, &val_output, &test_output, ratio);
        }
        Commands::Visualize { input, baseline, output, channel, max_points } => {
            cmd_visualize(&input, baseline, output, channel, max_points);
        }
    }
}

fn load_artifact_or_exit(path: &PathBuf) -> crate::core::series::TimeSeries {
    match load_artifact_csv(path) {
        Ok(series) => series,
        Err(e) => {
            error!("Failed to load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn load_capture_or_exit(path: &PathBuf) -> crate::core::series::TimeSeries {
    match load_capture_csv(path) {
        Ok(series) => series,
        Err(e) => {
            error!("Failed to load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn write_artifact_or_exit(path: &PathBuf, series: &crate::core::series::TimeSeries) {
    if let Err(e) = write_artifact_csv(path, series) {
        error!("Failed to write {}: {}", path.display(), e);
        std::process::exit(1);
    }
}

fn cmd_trim(
    input: &PathBuf,
    output: &PathBuf,
    start_rows: Option<usize>,
    end_rows: Option<usize>,
    seconds: Option<f64>,
    frequency: Option<f64>,
    config: &PipelineConfig,
) {
    use crate::processors::trim;

    let start = Instant::now();
    let series = load_artifact_or_exit(input);

    let start_count = start_rows.unwrap_or(config.trim.start_rows);
    let end_count = match seconds {
        Some(s) => {
            let freq = frequency.unwrap_or(config.filter.sample_rate_hz);
            trim::rows_for_duration(s, freq)
        }
        None => end_rows.unwrap_or(config.trim.end_rows),
    };

    match trim::trim(&series, start_count, end_count) {
        Ok(trimmed) => {
            write_artifact_or_exit(output, &trimmed);

            print_summary(
                "Trim Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Output file", output.display().to_string()),
                    ("Rows in", series.len().to_string()),
                    ("Rows out", trimmed.len().to_string()),
                    ("Start rows", start_count.to_string()),
                    ("End rows", end_count.to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            error!("Trim failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_filter(
    input: &PathBuf,
    output: &PathBuf,
    window: Option<WindowKind>,
    order: Option<usize>,
    cutoff: Option<f64>,
    sample_rate: Option<f64>,
    channels: Option<Vec<usize>>,
    config: &PipelineConfig,
) {
    use crate::processors::filter;

    let start = Instant::now();

    let window = window.unwrap_or(config.filter.window);
    let order = order.unwrap_or(config.filter.order);
    let cutoff = cutoff.unwrap_or(config.filter.cutoff_hz);
    let sample_rate = sample_rate.unwrap_or(config.filter.sample_rate_hz);

    let selection = match channels {
        Some(indices) => ChannelSelection::Indices(indices),
        None => ChannelSelection::torque(),
    };

    let series = load_artifact_or_exit(input);

    let coeffs = match filter::design_fir(window, sample_rate, cutoff, order) {
        Ok(c) => c,
        Err(e) => {
            error!("Filter design failed: {}", e);
            std::process::exit(1);
        }
    };

    let spinner = create_spinner("Applying zero-phase filter...");

    match filter::apply_zero_phase(&series, &coeffs, &selection) {
        Ok(filtered) => {
            spinner.finish_and_clear();
            write_artifact_or_exit(output, &filtered);

            print_summary(
                "Filter Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Output file", output.display().to_string()),
                    ("Window", window.to_string()),
                    ("Order", order.to_string()),
                    ("Cutoff (Hz)", cutoff.to_string()),
                    ("Sample rate (Hz)", sample_rate.to_string()),
                    ("Rows", filtered.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Filtering failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_downsample(
    input: &PathBuf,
    output: &PathBuf,
    original_rate: Option<f64>,
    target_rate: Option<f64>,
    policy: Option<DecimationPolicy>,
    config: &PipelineConfig,
) {
    use crate::processors::resample;

    let start = Instant::now();

    let spec = RateConversionSpec {
        original_rate: original_rate.unwrap_or(config.resample.original_rate_hz),
        target_rate: target_rate.unwrap_or(config.resample.target_rate_hz),
        policy: policy.unwrap_or(config.resample.policy),
    };

    let series = load_artifact_or_exit(input);

    match resample::decimate(&series, &spec) {
        Ok(reduced) => {
            write_artifact_or_exit(output, &reduced);

            print_summary(
                "Downsample Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Output file", output.display().to_string()),
                    ("Policy", spec.policy.to_string()),
                    ("Original rate (Hz)", spec.original_rate.to_string()),
                    ("Target rate (Hz)", spec.target_rate.to_string()),
                    ("Rows in", series.len().to_string()),
                    ("Rows out", reduced.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            error!("Downsampling failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_interpolate(input: &PathBuf, output: &PathBuf, rate: f64) {
    use crate::processors::resample;

    let start = Instant::now();
    let series = load_artifact_or_exit(input);

    let spinner = create_spinner("Interpolating to uniform rate...");

    match resample::interpolate_to_rate(&series, rate) {
        Ok(uniform) => {
            spinner.finish_and_clear();
            write_artifact_or_exit(output, &uniform);

            print_summary(
                "Interpolation Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Output file", output.display().to_string()),
                    ("Target rate (Hz)", rate.to_string()),
                    ("Rows in", series.len().to_string()),
                    ("Rows out", uniform.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Interpolation failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_join(
    input_a: &PathBuf,
    input_b: &PathBuf,
    output: &PathBuf,
    channels_a: Option<Vec<usize>>,
    channels_b: Option<Vec<usize>>,
    prefix_a: &str,
    prefix_b: &str,
) {
    use crate::processors::join;

    let start = Instant::now();

    let a = load_artifact_or_exit(input_a);
    let b = load_artifact_or_exit(input_b);

    let channels_a = channels_a.unwrap_or_else(|| (0..a.num_channels()).collect());
    let channels_b = channels_b.unwrap_or_else(|| (0..b.num_channels()).collect());

    match join::join(&a, &b, &channels_a, &channels_b, prefix_a, prefix_b) {
        Ok(table) => {
            if table.is_empty() {
                warn!("Join produced no rows; inputs share no exact timestamps");
            }
            if let Err(e) = write_joined_csv(output, &table) {
                error!("Failed to write {}: {}", output.display(), e);
                std::process::exit(1);
            }

            print_summary(
                "Join Complete",
                &[
                    ("Input A", input_a.display().to_string()),
                    ("Input B", input_b.display().to_string()),
                    ("Output file", output.display().to_string()),
                    ("Rows matched", table.len().to_string()),
                    ("Columns", table.labels.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            error!("Join failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_select(input: &PathBuf, output: &PathBuf, columns: Option<Vec<String>>) {
    let start = Instant::now();
    let series = load_capture_or_exit(input);

    let columns = columns.unwrap_or_else(schema::joints_capture_columns);

    match schema::project(&series, &columns) {
        Ok(projected) => {
            write_artifact_or_exit(output, &projected);

            print_summary(
                "Select Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Output file", output.display().to_string()),
                    ("Columns kept", columns.len().to_string()),
                    ("Rows", projected.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            error!("Column selection failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_pot_remap(
    input: &PathBuf,
    output: &PathBuf,
    keep_original_vel: bool,
    vel_smooth_span: Option<usize>,
    config: &PipelineConfig,
) {
    use crate::processors::remap;

    let start = Instant::now();
    let series = load_capture_or_exit(input);

    let update_velocity = if keep_original_vel {
        false
    } else {
        config.remap.update_velocity
    };
    let span = vel_smooth_span.unwrap_or(config.remap.vel_smooth_span);

    match remap::replace_encoder_from_pots(&series, update_velocity, span) {
        Ok(remapped) => {
            if let Err(e) = write_capture_csv(output, &remapped) {
                error!("Failed to write {}: {}", output.display(), e);
                std::process::exit(1);
            }

            print_summary(
                "Pot Remap Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Output file", output.display().to_string()),
                    ("Velocity updated", update_velocity.to_string()),
                    ("Smooth span", span.to_string()),
                    ("Rows", remapped.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            error!("Pot remap failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_split(input: &PathBuf, val_output: &PathBuf, test_output: &PathBuf, ratio: f64) {
    use crate::processors::split;

    let start = Instant::now();
    let series = load_artifact_or_exit(input);

    match split::split_ordered(&series, ratio) {
        Ok((val, test)) => {
            write_artifact_or_exit(val_output, &val);
            write_artifact_or_exit(test_output, &test);

            print_summary(
                "Split Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Validation file", val_output.display().to_string()),
                    ("Test file", test_output.display().to_string()),
                    ("Ratio", ratio.to_string()),
                    ("Validation rows", val.len().to_string()),
                    ("Test rows", test.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            error!("Split failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_visualize(
    input: &PathBuf,
    baseline: Option<PathBuf>,
    output: Option<PathBuf>,
    channel: usize,
    max_points: usize,
) {
    use crate::visualization;

    let start = Instant::now();

    // Default output to the input name with a .png extension
    let output_path = output.unwrap_or_else(|| {
        let mut path = input.clone();
        path.set_extension("png");
        path
    });

    let series = load_artifact_or_exit(input);

    let result = match &baseline {
        Some(baseline_path) => {
            let before = load_artifact_or_exit(baseline_path);
            visualization::plot_channel_overlay(&output_path, &before, &series, channel, max_points)
        }
        None => visualization::plot_channels(&output_path, &series, &[channel], max_points),
    };

    match result {
        Ok(()) => {
            print_summary(
                "Visualization Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Output PNG", output_path.display().to_string()),
                    ("Channel", channel.to_string()),
                    ("Rows", series.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            error!("Visualization failed: {}", e);
            std::process::exit(1);
        }
    }
}
