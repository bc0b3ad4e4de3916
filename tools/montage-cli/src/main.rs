//! Montage CLI: compose and maintain editor timelines from the command line.
//!
//! Usage:
//!   montage init <NAME>                  Create a new project
//!   montage info <PATH>                  Show the timeline
//!   montage import <PATH> <FILES>...     Add files to the media pool
//!   montage build <PATH> <FILES>...      Import files and compose one scene each
//!   montage compose <PATH> <REQUEST>     Run a composition request (JSON file)
//!   montage replace <PATH> --scene <N>   Swap one scene's (or --clip's) media
//!   montage relink <PATH> <MEDIA> <FILE> Point a pool clip at another file
//!   montage undo|redo <PATH>             Walk the editor's undo history
//!   montage history <PATH>               Show the undo position
//!   montage checkpoint <ACTION> <PATH>   Save, restore, or list checkpoints
//!   montage call <PATH> <JSON>           Run one raw tool request
//!   montage tools                        Describe the available tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use montage_cli::facade::BuildTimelineArgs;

mod commands;

#[derive(Parser)]
#[command(
    name = "montage",
    about = "Scene-level timeline composition for non-linear editors",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project
    Init {
        /// Project name
        name: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Timeline frame rate (defaults to the configured rate)
        #[arg(long)]
        fps: Option<f64>,
    },

    /// Show project information
    Info {
        /// Path to the project directory
        path: PathBuf,

        /// Print the full project state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import files into the media pool
    Import {
        /// Path to the project directory
        path: PathBuf,

        /// Files to import
        #[arg(required = true)]
        files: Vec<String>,

        /// Duration in frames, for sources the editor cannot probe
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Import files and compose them into the timeline, one scene each
    Build {
        /// Path to the project directory
        path: PathBuf,

        /// Scene files, in order
        #[arg(required_unless_present = "dir", conflicts_with = "dir")]
        files: Vec<String>,

        /// Take the scene files from this directory, in file-name order
        #[arg(long)]
        dir: Option<String>,

        /// File-name pattern for --dir (default *.mp4)
        #[arg(long, requires = "dir")]
        pattern: Option<String>,

        /// Cross-dissolve length in frames (0 = hard cuts; defaults to config)
        #[arg(long)]
        transition: Option<u64>,

        /// Cross-dissolve length in seconds
        #[arg(long, conflicts_with = "transition")]
        transition_secs: Option<f64>,

        /// Audio file to lay under the whole timeline
        #[arg(long)]
        audio: Option<String>,

        /// Skip scene markers
        #[arg(long)]
        no_markers: bool,

        /// Gap in frames between scenes joined by a cut
        #[arg(long)]
        gap: Option<u64>,
    },

    /// Run a composition request read from a JSON file
    Compose {
        /// Path to the project directory
        path: PathBuf,

        /// Composition request file
        request: PathBuf,

        /// Print the plan without touching the project
        #[arg(long)]
        dry_run: bool,
    },

    /// Replace the media of one scene or one clip in place
    Replace {
        /// Path to the project directory
        path: PathBuf,

        /// Scene number
        #[arg(long, required_unless_present = "clip", conflicts_with = "clip")]
        scene: Option<u32>,

        /// Timeline clip id (e.g. clip-7)
        #[arg(long)]
        clip: Option<String>,

        /// File to import and use
        #[arg(long, conflicts_with = "media")]
        file: Option<String>,

        /// Media id already in the pool (e.g. bin-3)
        #[arg(long)]
        media: Option<String>,

        /// Source frames to skip
        #[arg(long, default_value = "0")]
        source_in: u64,
    },

    /// Point a media pool clip at another file
    Relink {
        /// Path to the project directory
        path: PathBuf,

        /// Media id (e.g. bin-3)
        media: String,

        /// Replacement file
        file: String,
    },

    /// Undo editor commands
    Undo {
        /// Path to the project directory
        path: PathBuf,

        #[arg(short = 'n', long, default_value = "1")]
        steps: usize,
    },

    /// Redo undone editor commands
    Redo {
        /// Path to the project directory
        path: PathBuf,

        #[arg(short = 'n', long, default_value = "1")]
        steps: usize,
    },

    /// Show the undo history position
    History {
        /// Path to the project directory
        path: PathBuf,
    },

    /// Manage checkpoints
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },

    /// Run one raw tool request and print the JSON response
    Call {
        /// Path to the project directory
        path: PathBuf,

        /// Request JSON, or "-" to read it from stdin
        request: String,
    },

    /// Describe the available tools
    Tools,
}

#[derive(Subcommand)]
enum CheckpointAction {
    /// Snapshot the project
    Save {
        /// Path to the project directory
        path: PathBuf,

        /// Checkpoint label
        #[arg(short, long, default_value = "")]
        label: String,
    },

    /// Restore a checkpoint (the latest when neither id nor label is given)
    Restore {
        /// Path to the project directory
        path: PathBuf,

        /// Checkpoint id (e.g. cp-0003)
        #[arg(long, conflicts_with = "label")]
        id: Option<String>,

        /// Restore the newest checkpoint with this label
        #[arg(short, long)]
        label: Option<String>,
    },

    /// List checkpoints
    List {
        /// Path to the project directory
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = montage_common::config::AppConfig::load();

    // Initialize logging
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    montage_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Init { name, output, fps } => commands::init::run(name, output, fps, &config),
        Commands::Info { path, json } => commands::info::run(path, json, &config),
        Commands::Import {
            path,
            files,
            duration,
        } => commands::import::run(path, files, duration, &config),
        Commands::Build {
            path,
            files,
            dir,
            pattern,
            transition,
            transition_secs,
            audio,
            no_markers,
            gap,
        } => {
            let args = BuildTimelineArgs {
                files,
                directory: dir,
                pattern,
                transition_frames: transition,
                audio_file: audio,
                scene_markers: if no_markers { Some(false) } else { None },
                gap_frames: gap,
                ..Default::default()
            };
            commands::build::run(path, args, transition_secs, &config)
        }
        Commands::Compose {
            path,
            request,
            dry_run,
        } => commands::compose::run(path, request, dry_run, &config),
        Commands::Replace {
            path,
            scene,
            clip,
            file,
            media,
            source_in,
        } => commands::replace::run(path, scene, clip, file, media, source_in, &config),
        Commands::Relink { path, media, file } => {
            commands::relink::run(path, media, file, &config)
        }
        Commands::Undo { path, steps } => commands::history::undo(path, steps, &config),
        Commands::Redo { path, steps } => commands::history::redo(path, steps, &config),
        Commands::History { path } => commands::history::status(path, &config),
        Commands::Checkpoint { action } => match action {
            CheckpointAction::Save { path, label } => {
                commands::checkpoint::save(path, label, &config)
            }
            CheckpointAction::Restore { path, id, label } => {
                commands::checkpoint::restore(path, id, label, &config)
            }
            CheckpointAction::List { path } => commands::checkpoint::list(path, &config),
        },
        Commands::Call { path, request } => commands::call::run(path, request, &config),
        Commands::Tools => commands::tools::run(),
    }
}
