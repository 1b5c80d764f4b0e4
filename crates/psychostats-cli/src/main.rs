//! PsychoStats CLI
//!
//! Terminal client for the PsychoStats spreadsheet tutor.

mod study;

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use psychostats_core::{
    curriculum, lessons_in, search_glossary, ConceptVideo, Config, FileBackend, LessonStatus,
    ModuleLevel, Platform, ProgressStore, TutorChat, VIDEO_SUGGESTIONS,
};
use psychostats_genai::{GeminiClient, GenerationService};
use psychostats_markup::{render, JsonExporter, TerminalRenderer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// PsychoStats - Excel for psychology students
///
/// Generated, platform-specific spreadsheet lessons with progress tracking,
/// a patient tutor, a function glossary and short concept videos.
#[derive(Parser, Debug)]
#[command(name = "psychostats")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: psychostats.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Directory for saved progress (overrides stateDir)
    #[arg(long, value_name = "DIR", global = true)]
    state_dir: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the curriculum with your progress
    Lessons,

    /// Study a lesson interactively
    Study {
        /// Lesson identifier, e.g. 3.2 (default: first lesson)
        #[arg(value_name = "LESSON")]
        lesson: Option<String>,
    },

    /// Show or choose the spreadsheet platform lessons are tailored to
    Platform {
        /// windows, mac, tablet or web
        #[arg(value_name = "NAME")]
        name: Option<String>,
    },

    /// Search the function glossary
    Glossary {
        /// Text to look for in names, descriptions and examples
        #[arg(value_name = "TERM")]
        term: Option<String>,
    },

    /// Chat with the tutor
    Tutor,

    /// Generate a short video explaining a concept
    Video {
        /// Concept to animate (omit to see suggestions)
        #[arg(value_name = "CONCEPT", num_args = 0..)]
        concept: Vec<String>,

        /// Download the finished video to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render a lesson markup file without contacting the service
    Render {
        /// Markup file to render
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the render blocks as JSON
        #[arg(long)]
        json: bool,

        /// Single-line JSON instead of indented
        #[arg(long, requires = "json")]
        compact: bool,

        /// Write the JSON to this file instead of stdout
        #[arg(short, long, value_name = "FILE", requires = "json")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");
    tracing::debug!(state_dir = ?args.state_dir, "State directory");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref state_dir) = args.state_dir {
        config.state_dir.clone_from(state_dir);
    }

    // Re-validate after overrides
    config.validate()?;

    match args.command {
        Command::Lessons => {
            print_lessons(&open_store(&config));
            Ok(())
        }
        Command::Study { lesson } => study::run(&config, lesson.as_deref()).await,
        Command::Platform { name } => choose_platform(&config, name.as_deref()),
        Command::Glossary { term } => {
            print_glossary(term.as_deref().unwrap_or_default());
            Ok(())
        }
        Command::Tutor => run_tutor(&config).await,
        Command::Video { concept, output } => {
            run_video(&config, &concept.join(" "), output.as_deref()).await
        }
        Command::Render {
            file,
            json,
            compact,
            output,
        } => {
            let format = json.then_some(JsonFormat {
                compact,
                output: output.as_deref(),
            });
            render_file(&config, &file, format)
        }
    }
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Opens the progress store in the configured state directory.
fn open_store(config: &Config) -> ProgressStore {
    ProgressStore::open(FileBackend::new(&config.state_dir))
}

/// Builds the generation service from configuration.
fn build_service(config: &Config) -> Arc<dyn GenerationService> {
    let gemini = config.gemini_config();
    if gemini.api_key.is_none() {
        tracing::warn!(env_var = %gemini.api_key_env, "API key not set; generation requests will fail");
    }
    Arc::new(GeminiClient::new(gemini))
}

/// Returns a line-oriented reader over standard input.
fn stdin_lines() -> tokio::io::Lines<BufReader<tokio::io::Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Prints a prompt without a trailing newline.
fn prompt(text: &str) {
    print!("{text}");
    // A prompt that fails to flush still shows up with the next newline.
    std::io::stdout().flush().ok();
}

/// Single-character progress mark for the lesson list.
const fn status_mark(status: Option<LessonStatus>) -> &'static str {
    match status {
        Some(LessonStatus::Completed) => "✓",
        Some(LessonStatus::NeedsReinforcement) => "!",
        Some(LessonStatus::ReviewLater) => "↺",
        None => " ",
    }
}

/// Prints the curriculum grouped by module with progress marks.
fn print_lessons(store: &ProgressStore) {
    for level in ModuleLevel::ALL {
        println!();
        println!("{}", level.label().to_uppercase());
        for topic in lessons_in(level) {
            println!(
                "  [{}] {:<4} {}",
                status_mark(store.status(topic.id)),
                topic.id,
                topic.title
            );
            println!("            {}", topic.description);
        }
    }

    println!();
    println!(
        "Progreso: {}/{} lecciones completadas",
        store.completed_count(),
        curriculum().len()
    );
    if let Some(platform) = store.platform() {
        println!("Plataforma: {}", platform.label());
    }
}

/// Shows the platform options or stores a new choice.
fn choose_platform(config: &Config, name: Option<&str>) -> anyhow::Result<()> {
    let mut store = open_store(config);

    let Some(name) = name else {
        print_platform_options(store.platform());
        return Ok(());
    };

    let platform: Platform = name.parse()?;
    store.set_platform(platform)?;
    println!("Plataforma guardada: {}", platform.label());
    tracing::info!(%platform, "Platform preference saved");
    Ok(())
}

/// Prints the four platform options, marking the current one.
fn print_platform_options(current: Option<Platform>) {
    for (index, platform) in Platform::ALL.iter().enumerate() {
        let marker = if current == Some(*platform) { "*" } else { " " };
        println!(
            "{marker} {}. {:<13} {}",
            index + 1,
            platform.label(),
            platform.description()
        );
    }
}

/// Prints glossary entries matching `term`.
fn print_glossary(term: &str) {
    let results = search_glossary(term);
    if results.is_empty() {
        println!("No se encontraron funciones para '{term}'.");
        return;
    }

    for function in results {
        println!();
        println!("{} [{}]", function.name, function.category);
        println!("  {}", function.syntax);
        println!("  {}", function.description);
        println!("  Ejemplo en Psicología: {}", function.psych_example);
    }
}

/// Runs the tutor chat until EOF or `salir`.
async fn run_tutor(config: &Config) -> anyhow::Result<()> {
    let mut chat = TutorChat::new(build_service(config));
    if let Some(greeting) = chat.history().first() {
        println!("Tutor: {}", greeting.text);
    }
    println!("(Escribe 'salir' para terminar)");

    let mut lines = stdin_lines();
    loop {
        println!();
        prompt("Tú: ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim().to_lowercase().as_str(), "salir" | "exit" | "quit") {
            break;
        }
        if let Some(reply) = chat.ask(&line).await {
            println!();
            println!("Tutor: {reply}");
        }
    }

    tracing::debug!(turns = chat.history().len(), "Tutor chat finished");
    Ok(())
}

/// Generates a concept video and optionally downloads it.
async fn run_video(config: &Config, concept: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let concept = concept.trim();
    if concept.is_empty() {
        println!("Ideas para tu video:");
        for suggestion in VIDEO_SUGGESTIONS {
            println!("  - {suggestion}");
        }
        return Ok(());
    }

    let generator = ConceptVideo::new(build_service(config), &config.video);
    println!("Generando video sobre \"{concept}\" (puede tardar unos minutos)...");

    let uri = generator
        .generate(concept)
        .await
        .map_err(|failure| anyhow::anyhow!("{failure}"))?;
    println!("Video listo: {uri}");

    if let Some(path) = output {
        let bytes = generator
            .download(&uri)
            .await
            .map_err(|failure| anyhow::anyhow!("{failure}"))?;
        std::fs::write(path, &bytes).map_err(|e| {
            anyhow::anyhow!("Failed to write video: {e}\n\nPath: {}", path.display())
        })?;
        println!("Video guardado en {}", path.display());
    }
    Ok(())
}

/// How `render --json` writes its output.
struct JsonFormat<'a> {
    compact: bool,
    output: Option<&'a Path>,
}

/// Renders a markup file to the terminal or as JSON.
fn render_file(config: &Config, file: &Path, json: Option<JsonFormat<'_>>) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read '{}': {e}\n\nSuggestion: Check that the file exists and is UTF-8 text",
            file.display()
        )
    })?;
    let blocks = render(&text);
    tracing::debug!(blocks = blocks.len(), "Rendered markup");

    let Some(format) = json else {
        print!("{}", TerminalRenderer::new(config.color.enabled()).render(&blocks));
        return Ok(());
    };

    let exporter = JsonExporter::new(&blocks);
    match format.output {
        Some(path) => {
            exporter.write_to_file(path, !format.compact)?;
            tracing::info!(path = %path.display(), "Blocks exported");
        }
        None if format.compact => println!("{}", exporter.generate()?),
        None => println!("{}", exporter.generate_pretty()?),
    }
    Ok(())
}
