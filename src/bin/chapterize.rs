use std::{fs, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use chapterize::{
    CaptureOptions, ChapterRecord, ChapterizeError, FfmpegLogLevel, FileElement, MediaElement,
    Thumbnail, attach_hints, from_records, generate, generate_equal, records_from_json,
    set_ffmpeg_log_level,
};

const CLI_AFTER_HELP: &str = "Examples:\n  chapterize chapters input.mp4 --json\n  chapterize thumbnails input.mp4 --out thumbs --count 8 --width 320\n  chapterize thumbnails input.mp4 --out thumbs --chapters-json chapters.json\n  chapterize completions zsh > _chapterize";

#[derive(Debug, Parser)]
#[command(
    name = "chapterize",
    version,
    about = "Generate chapter lists and chapter thumbnails for a video",
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
    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the chapter list for a media file.
    #[command(
        about = "Print chapter boundaries",
        visible_alias = "list",
        after_help = "Examples:\n  chapterize chapters input.mp4\n  chapterize chapters input.mp4 --count 10 --json"
    )]
    Chapters {
        /// Input media path or URL.
        input: String,

        /// Chapter count when dividing equally (used when the container has
        /// no embedded chapters and no sidecar is given).
        #[arg(long, default_value_t = 5)]
        count: usize,

        /// Sidecar JSON file with external chapter records.
        #[arg(long)]
        chapters_json: Option<PathBuf>,

        /// Output chapters as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Capture one thumbnail per chapter into a directory.
    #[command(
        about = "Generate chapter thumbnails",
        after_help = "Examples:\n  chapterize thumbnails input.mp4 --out thumbs\n  chapterize thumbnails input.mp4 --out thumbs --count 8 --width 480 --height 270"
    )]
    Thumbnails {
        /// Input media path or URL.
        input: String,

        /// Output directory for thumbnail images and the chapter manifest.
        #[arg(long)]
        out: PathBuf,

        /// Chapter count when dividing equally.
        #[arg(long, default_value_t = 5)]
        count: usize,

        /// Sidecar JSON file with external chapter records.
        #[arg(long)]
        chapters_json: Option<PathBuf>,

        /// Thumbnail width in pixels.
        #[arg(long, default_value_t = 320)]
        width: u32,

        /// Thumbnail height in pixels.
        #[arg(long, default_value_t = 180)]
        height: u32,

        /// JPEG quality (1-100).
        #[arg(long, default_value_t = 80)]
        quality: u8,

        /// Print the manifest to stdout as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    #[command(about = "Generate shell completions")]
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.global.log_level.as_deref() {
        Some(level) => match level.parse::<FfmpegLogLevel>() {
            Ok(level) => set_ffmpeg_log_level(level),
            Err(error) => {
                eprintln!("{} {error}", "error:".red().bold());
                std::process::exit(2);
            }
        },
        // Edge-of-stream probing makes FFmpeg chatty; errors only by default.
        None => set_ffmpeg_log_level(FfmpegLogLevel::Error),
    }

    if let Err(error) = run(cli.command).await {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<(), ChapterizeError> {
    match command {
        Commands::Chapters {
            input,
            count,
            chapters_json,
            json,
        } => {
            let element = FileElement::open(&input);
            element.load_metadata().await?;
            let (records, synthesized) = resolve_records(&element, chapters_json, count)?;

            if json {
                let payload: Vec<_> = records
                    .iter()
                    .map(|record| {
                        json!({
                            "title": record.title,
                            "startTime": record.start_time,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json!(payload))?);
            } else {
                let origin = if synthesized { "equal division" } else { "source" };
                println!(
                    "{} {} chapters ({origin})",
                    "Found".green().bold(),
                    records.len()
                );
                for (index, record) in records.iter().enumerate() {
                    println!(
                        "  {:>2}. [{}] {}",
                        index + 1,
                        format_timestamp(record.start_time).cyan(),
                        record.title
                    );
                }
            }
            Ok(())
        }

        Commands::Thumbnails {
            input,
            out,
            count,
            chapters_json,
            width,
            height,
            quality,
            json,
        } => {
            let element = FileElement::open(&input);
            element.load_metadata().await?;
            let (records, _) = resolve_records(&element, chapters_json, count)?;
            let definitions = from_records(&records);

            fs::create_dir_all(&out)?;

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message(format!(
                "Capturing {} chapter thumbnails...",
                definitions.len()
            ));
            spinner.enable_steady_tick(std::time::Duration::from_millis(100));

            let options = CaptureOptions::new().with_jpeg_quality(quality);
            let mut chapters = generate(&element, &definitions, width, height, &options).await?;
            attach_hints(&mut chapters, &records);

            spinner.finish_and_clear();

            let mut manifest = Vec::with_capacity(chapters.len());
            for (index, chapter) in chapters.iter().enumerate() {
                let file_name = match &chapter.thumbnail {
                    Some(Thumbnail::Captured(bytes)) => {
                        let name = format!("chapter_{:02}.jpg", index + 1);
                        fs::write(out.join(&name), bytes)?;
                        Some(name)
                    }
                    Some(Thumbnail::Remote(_)) | None => None,
                };

                if !json {
                    match &file_name {
                        Some(name) => println!(
                            "  {} [{}] {} -> {name}",
                            "ok".green(),
                            format_timestamp(chapter.start_time).cyan(),
                            chapter.title
                        ),
                        None => println!(
                            "  {} [{}] {} (no thumbnail)",
                            "--".yellow(),
                            format_timestamp(chapter.start_time).cyan(),
                            chapter.title
                        ),
                    }
                }

                manifest.push(json!({
                    "title": chapter.title,
                    "startTime": chapter.start_time,
                    "thumbnail": file_name,
                    "fallbackThumbnail": chapter.fallback_thumbnail,
                }));
            }

            let manifest = json!(manifest);
            fs::write(
                out.join("chapters.json"),
                serde_json::to_string_pretty(&manifest)?,
            )?;

            if json {
                println!("{}", serde_json::to_string_pretty(&manifest)?);
            } else {
                let captured = chapters.iter().filter(|c| c.thumbnail.is_some()).count();
                println!(
                    "{} {captured}/{} thumbnails written to {}",
                    "Done:".green().bold(),
                    chapters.len(),
                    out.display()
                );
            }
            Ok(())
        }

        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Decide where chapter boundaries come from: a sidecar file, markers
/// embedded in the container, or synthetic equal division (in that order).
/// Returns the records and whether they were synthesized.
fn resolve_records(
    element: &FileElement,
    chapters_json: Option<PathBuf>,
    count: usize,
) -> Result<(Vec<ChapterRecord>, bool), ChapterizeError> {
    if let Some(path) = chapters_json {
        let text = fs::read_to_string(path)?;
        return Ok((records_from_json(&text)?, false));
    }

    if let Some(info) = element.source_info() {
        if !info.chapters.is_empty() {
            return Ok((info.chapters, false));
        }
    }

    let duration = element.duration().ok_or(ChapterizeError::MetadataUnavailable)?;
    let records = generate_equal(duration, count, "Chapter")?
        .into_iter()
        .map(|definition| ChapterRecord {
            title: definition.title,
            start_time: definition.start_time,
            thumbnail_hint: None,
        })
        .collect();
    Ok((records, true))
}

fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
