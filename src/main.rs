mod cli;

use mediashrink::config::{self, Config};
use mediashrink_av::{
    FfmpegEngine, MediaInput, MediaKind, ToolRegistry, TranscodeOptions, TranscodeResult,
    Transcoder,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, OutputArgs};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediashrink=debug,mediashrink_av=trace".to_string()
        } else {
            "mediashrink=info,mediashrink_av=info".to_string()
        }
    });

    // Logs go to stderr so stdout stays usable for reports and JSON.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e
                .downcast_ref::<mediashrink_av::Error>()
                .map(|err| err.exit_code())
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Audio {
            file,
            bitrate,
            output,
        } => {
            let config = config::load_config_or_default(config_path)?;
            let options = TranscodeOptions::Audio {
                bitrate: bitrate.unwrap_or(config.defaults.audio_bitrate),
            };
            compress_file(&config, &file, MediaKind::Audio, options, &output)
        }
        Commands::Image {
            file,
            quality,
            output,
        } => {
            let config = config::load_config_or_default(config_path)?;
            let options = TranscodeOptions::Image {
                quality: quality.unwrap_or(config.defaults.image_quality),
            };
            compress_file(&config, &file, MediaKind::Image, options, &output)
        }
        Commands::Video {
            file,
            resolution,
            bitrate,
            output,
        } => {
            let config = config::load_config_or_default(config_path)?;
            let options = TranscodeOptions::Video {
                resolution: resolution.unwrap_or(config.defaults.video_resolution),
                bitrate: bitrate.unwrap_or(config.defaults.video_bitrate),
            };
            compress_file(&config, &file, MediaKind::Video, options, &output)
        }
        Commands::CheckTools { json } => {
            let config = config::load_config_or_default(config_path)?;
            check_tools(&config, json)
        }
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or(cli.config);
            validate_config(path.as_deref())
        }
    }
}

fn build_transcoder(config: &Config) -> Transcoder {
    let tools = ToolRegistry::discover(&config.tools.overrides());
    let engine = FfmpegEngine::new(tools, config.engine_settings());
    Transcoder::new(Arc::new(engine), config.workspace())
}

#[derive(Debug, Serialize)]
struct Report {
    input: PathBuf,
    input_size: usize,
    output: PathBuf,
    output_size: usize,
    mime_type: &'static str,
    ratio: Option<f64>,
}

fn compress_file(
    config: &Config,
    file: &Path,
    kind: MediaKind,
    options: TranscodeOptions,
    output: &OutputArgs,
) -> Result<()> {
    if !file.is_file() {
        anyhow::bail!("Input file does not exist: {:?}", file);
    }

    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Input path has no file name: {:?}", file))?;

    if !kind.accepts(&file_name) {
        return Err(mediashrink_av::Error::InvalidOption(format!(
            "{} is not a supported {} file (accepted: {})",
            file_name,
            kind,
            kind.accepted_extensions().join(", ")
        ))
        .into());
    }

    let data = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
    let input = MediaInput::new(data, file_name, kind);

    if !output.json {
        println!("File: {}", input.file_name());
        println!("Type: {}", input.source_mime());
        println!("Size: {}", format_size(input.len()));
    }

    let transcoder = build_transcoder(config);
    let result = transcoder.transcode(&input, options)?;

    let output_dir = match &output.output_dir {
        Some(dir) => dir.clone(),
        None => file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let output_path = write_result(&output_dir, &result)?;

    let report = Report {
        input: file.to_path_buf(),
        input_size: input.len(),
        output: output_path,
        output_size: result.bytes.len(),
        mime_type: result.mime_type,
        ratio: result.reduction_ratio(input.len()),
    };

    if output.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\nOutput: {}", report.output.display());
        print!("Size: {}", format_size(report.output_size));
        if let Some(ratio) = report.ratio {
            print!(" ({:.1}% of original)", ratio * 100.0);
        }
        println!();
    }

    Ok(())
}

fn write_result(dir: &Path, result: &TranscodeResult) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {:?}", dir))?;
    let path = dir.join(&result.suggested_file_name);
    std::fs::write(&path, &result.bytes)
        .with_context(|| format!("Failed to write output file {:?}", path))?;
    tracing::debug!("Wrote {} bytes to {:?}", result.bytes.len(), path);
    Ok(path)
}

fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {} ({} bytes)", value, UNITS[unit], bytes)
    }
}

fn check_tools(config: &Config, json: bool) -> Result<()> {
    let tools = ToolRegistry::discover(&config.tools.overrides()).check_all();

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    println!("Checking external tools...\n");

    let mut all_ok = true;
    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Audio and video compression need ffmpeg and ffprobe.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let workspace = config.workspace();
    println!("  Temp dir: {}", workspace.root().display());
    println!("  Temp prefix: {}", workspace.prefix());
    println!(
        "  Video encoder: {} / {} (preset {})",
        config.video.codec,
        config.video.audio_codec,
        if config.video.preset.is_empty() {
            "none"
        } else {
            config.video.preset.as_str()
        }
    );
    println!(
        "  Defaults: audio {}, image quality {}, video {} @ {}",
        config.defaults.audio_bitrate,
        config.defaults.image_quality,
        config.defaults.video_resolution,
        config.defaults.video_bitrate
    );

    Ok(())
}
