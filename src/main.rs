use clap::{Parser, Subcommand};
use focuspoint::focus::FocusPoint;
use focuspoint::imaging::{
    self, Dimensions, FillMode, RustBackend, apply_upscale_policy, plan_crop,
};
use focuspoint::{config, output, process};
use std::path::PathBuf;

/// Shared flags for commands that render variants.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the output cache and re-render every variant
    #[arg(long)]
    no_cache: bool,
}

#[derive(Parser)]
#[command(name = "focuspoint")]
#[command(about = "Focus-point aware image cropping")]
#[command(long_about = "\
Focus-point aware image cropping

Resize an image to cover a target frame and crop the overflow so that a
chosen focus point stays in view, as close to the frame center as the
image edges allow.

Focus points are written x,y with both coordinates in [-1, 1]:

  -1,1 ─────── 0,1 ─────── 1,1      x: -1 left   .. 1 right
    │                       │       y: -1 bottom .. 1 top
  -1,0        0,0         1,0
    │                       │
  -1,-1 ────── 0,-1 ────── 1,-1

Run 'focuspoint gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute a crop plan without touching any image
    Plan {
        /// Original size, WIDTHxHEIGHT
        #[arg(long, value_parser = parse_dimensions)]
        original: Dimensions,
        /// Target size, WIDTHxHEIGHT (fractions allowed)
        #[arg(long, value_parser = parse_target)]
        target: (f64, f64),
        /// Focus point as x,y
        #[arg(long, default_value = "0,0", allow_hyphen_values = true)]
        focus: FocusPoint,
        /// Never enlarge the original
        #[arg(long)]
        no_upscale: bool,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show percentages and focus area for a focus point
    Describe {
        /// Focus point as x,y
        #[arg(long, allow_hyphen_values = true)]
        focus: FocusPoint,
    },
    /// Produce one focus-preserving variant of an image
    ///
    /// With both --width and --height the image fills that frame. With only
    /// one of them the image is cropped down on that axis if it is larger.
    Fill {
        source: PathBuf,
        output: PathBuf,
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        /// Focus point as x,y
        #[arg(long, default_value = "0,0", allow_hyphen_values = true)]
        focus: FocusPoint,
        /// Never enlarge the original (only with both --width and --height)
        #[arg(long)]
        max: bool,
        /// Encoding quality, overrides config
        #[arg(long)]
        quality: Option<u32>,
    },
    /// Render every variant listed in a job manifest
    Process {
        /// JSON job manifest
        jobs: PathBuf,
        /// Output directory
        #[arg(long, default_value = "out")]
        output: PathBuf,
        #[command(flatten)]
        cache: CacheArgs,
    },
    /// Print a job manifest for every image under a directory
    Init {
        dir: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let load_config = || config::load_config(&cli.config_dir);

    match cli.command {
        Command::Plan {
            original,
            target,
            focus,
            no_upscale,
            json,
        } => {
            let config = load_config()?;
            let allow_upscale = config.crop.upscale && !no_upscale;
            let target = apply_upscale_policy(original, target, allow_upscale);
            let plan = plan_crop(original, target, focus);
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                output::print_plan(original, &focus, plan.as_ref());
            }
        }
        Command::Describe { focus } => {
            output::print_description(&focus);
        }
        Command::Fill {
            source,
            output: output_path,
            width,
            height,
            focus,
            max,
            quality,
        } => {
            let config = load_config()?;
            let mode = fill_mode(width, height, max)?;
            if !mode.is_valid() {
                return Err(format!("{mode} needs positive dimensions").into());
            }
            let quality = quality
                .map(imaging::Quality::new)
                .unwrap_or_else(|| config.output.quality());
            let backend = RustBackend::new();
            let result =
                imaging::focus_fill(&backend, &source, &output_path, focus, mode, quality)?;
            output::print_fill_result(&output_path, &result);
        }
        Command::Process {
            jobs,
            output: output_dir,
            cache,
        } => {
            let config = load_config()?;
            init_thread_pool(&config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process(&jobs, &output_dir, &config, !cache.no_cache, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer panicked")?;
            let result = result?;
            println!(
                "Wrote {}",
                output_dir.join(process::OUTPUT_MANIFEST).display()
            );
            println!("Cache: {}", result.cache_stats);
        }
        Command::Init { dir } => {
            let config = load_config()?;
            let jobs = process::init_jobs(&dir, &config.crop.default_variants)?;
            println!("{}", serde_json::to_string_pretty(&jobs)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Pick the fill mode from which target sides were given.
fn fill_mode(width: Option<f64>, height: Option<f64>, max: bool) -> Result<FillMode, String> {
    match (width, height) {
        (Some(width), Some(height)) if max => Ok(FillMode::FillMax { width, height }),
        (Some(width), Some(height)) => Ok(FillMode::Fill { width, height }),
        (Some(_), None) | (None, Some(_)) if max => {
            Err("--max needs both --width and --height".to_string())
        }
        (Some(width), None) => Ok(FillMode::CropWidth { width }),
        (None, Some(height)) => Ok(FillMode::CropHeight { height }),
        (None, None) => Err("give --width, --height or both".to_string()),
    }
}

fn parse_size(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .ok_or_else(|| format!("invalid size component {v:?}"))
    };
    Ok((parse(w)?, parse(h)?))
}

fn parse_target(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = parse_size(s)?;
    if w.round() < 1.0 || h.round() < 1.0 {
        return Err(format!("target {s:?} rounds to an empty frame"));
    }
    Ok((w, h))
}

fn parse_dimensions(s: &str) -> Result<Dimensions, String> {
    let (w, h) = parse_size(s)?;
    if w.fract() != 0.0 || h.fract() != 0.0 || w > u32::MAX as f64 || h > u32::MAX as f64 {
        return Err(format!("original size {s:?} must be whole pixels"));
    }
    Ok(Dimensions::new(w as u32, h as u32))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
