use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::ArtifactKind;
use crate::form::ModelSize;

#[derive(Parser)]
#[command(
    name = "vidnotes",
    about = "Video Notes - Turn YouTube videos into transcripts, AI notes and PDFs",
    version,
    long_about = "A terminal client for the video notes backend. Submit a YouTube URL, pick a model size and a target language, then download the transcript, notes and PDF the backend generates."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = "VIDNOTES_BACKEND_URL", value_name = "URL")]
    pub backend_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Walk through the cover, form, processing and results screens (default)
    Interactive,

    /// Process one video without prompts
    Process {
        /// YouTube video URL
        #[arg(value_name = "URL")]
        url: String,

        /// Model size used by the backend
        #[arg(short, long, value_enum)]
        model_size: Option<ModelSize>,

        /// Target language code (en, es, fr, de, zh, ja, ru, ar)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Print the backend response as JSON
        #[arg(long)]
        json: bool,

        /// Download all artifacts into this directory when done
        #[arg(short, long, value_name = "DIR")]
        download: Option<PathBuf>,
    },

    /// Show the backend's progress record for a job
    Progress {
        /// Job (video) id returned by the backend
        #[arg(value_name = "ID")]
        video_id: String,
    },

    /// Download one artifact of a finished job
    Download {
        /// Job (video) id returned by the backend
        #[arg(value_name = "ID")]
        video_id: String,

        /// Which artifact to fetch
        #[arg(value_enum)]
        kind: ArtifactKind,

        /// Output directory (config download_dir or current directory if not specified)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// List supported target languages and model sizes
    Languages,

    /// Show or create the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write the current settings to the config file
        #[arg(long, conflicts_with = "show")]
        init: bool,
    },
}
