use clap::{Parser, Subcommand};
use mediashrink_av::{AudioBitrate, ImageQuality, VideoBitrate, VideoResolution};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediashrink")]
#[command(author, version, about = "Shrink audio, image and video uploads by re-encoding them")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Re-encode an audio file to mono 44.1 kHz MP3
    Audio {
        /// Audio file (mp3, wav)
        #[arg(required = true)]
        file: PathBuf,

        /// MP3 bitrate: 64k, 128k, 192k, 256k or 320k
        #[arg(short, long)]
        bitrate: Option<AudioBitrate>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Re-encode an image to JPEG
    Image {
        /// Image file (jpg, jpeg, png)
        #[arg(required = true)]
        file: PathBuf,

        /// JPEG quality, 1-100
        #[arg(short, long)]
        quality: Option<ImageQuality>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Resize and re-encode a video to MP4
    Video {
        /// Video file (mp4, mov, avi)
        #[arg(required = true)]
        file: PathBuf,

        /// Target resolution: 480p, 720p or 1080p
        #[arg(short, long)]
        resolution: Option<VideoResolution>,

        /// Video bitrate: 500k, 1000k, 1500k or 2000k
        #[arg(short, long)]
        bitrate: Option<VideoBitrate>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Check that required external tools are available
    CheckTools {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
pub struct OutputArgs {
    /// Directory for the compressed file (defaults to the input's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Print the result report as JSON
    #[arg(long)]
    pub json: bool,
}
