//! Adaptive compression CLI binary.
//!
//! # Commands
//!
//! - `compress` - Compress a file into a JSON chunk
//! - `decompress` - Restore the original bytes from a chunk
//! - `analyze` - Rank strategies for a file without compressing it
//! - `profiles` - List built-in profiles

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use adaptive::{
    CompressedChunk, CompressionEngine, CompressionProfile, Config, FileMetadata, VERSION,
};
use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "adaptive")]
#[command(version = VERSION)]
#[command(about = "Adaptive per-file compression", long_about = None)]
struct Cli {
    /// Profile preset (development, production, ci)
    #[arg(long, global = true)]
    profile: Option<String>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a JSON chunk
    Compress {
        /// Input file
        file: PathBuf,

        /// MIME type (default: guessed from extension)
        #[arg(short, long)]
        mime: Option<String>,

        /// Access frequency in [0, 1]
        #[arg(short = 'f', long)]
        access_frequency: Option<f64>,

        /// Mark the file as hot
        #[arg(long)]
        hot: bool,

        /// Chunk output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show compression statistics
        #[arg(short, long)]
        stats: bool,
    },

    /// Decompress a JSON chunk
    Decompress {
        /// Chunk file produced by `compress`
        chunk: PathBuf,

        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rank strategies for a file
    Analyze {
        /// Input file
        file: PathBuf,

        /// MIME type (default: guessed from extension)
        #[arg(short, long)]
        mime: Option<String>,
    },

    /// List built-in profiles
    Profiles,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    let config = load_config(cli.config.as_deref(), cli.profile)?;

    match cli.command {
        Commands::Compress {
            file,
            mime,
            access_frequency,
            hot,
            output,
            stats,
        } => cmd_compress(&config, &file, mime, access_frequency, hot, output, stats),

        Commands::Decompress { chunk, output } => cmd_decompress(&config, &chunk, output),

        Commands::Analyze { file, mime } => cmd_analyze(&config, &file, mime),

        Commands::Profiles => cmd_profiles(),
    }
}

fn init_logging(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// File config, then environment, then `--profile`
fn load_config(path: Option<&Path>, profile: Option<String>) -> anyhow::Result<Config> {
    let file = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let mut config = file.merge(Config::from_env());
    if profile.is_some() {
        config.profile.preset = profile;
    }
    Ok(config)
}

fn cmd_compress(
    config: &Config,
    file: &Path,
    mime: Option<String>,
    access_frequency: Option<f64>,
    hot: bool,
    output: Option<PathBuf>,
    stats: bool,
) -> anyhow::Result<()> {
    let engine = config.build_engine()?;
    let data = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let mime = mime.unwrap_or_else(|| guess_mime(file).to_string());

    let mut meta = FileMetadata::new().with_path(file.to_string_lossy());
    if let Some(frequency) = access_frequency {
        meta = meta.with_access_frequency(frequency);
    }
    if hot {
        meta = meta.with_hot(true);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(engine.compress(data, &mime, meta));

    let Some(chunk) = result.chunk.as_ref() else {
        anyhow::bail!(
            "compression failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    };
    write_output(output, serde_json::to_string_pretty(chunk)?.as_bytes())?;

    if stats {
        eprintln!();
        eprintln!("Compression Statistics:");
        eprintln!("  Profile:      {}", engine.profile().name);
        eprintln!("  Algorithm:    {}", result.algorithm);
        eprintln!("  MIME type:    {mime}");
        eprintln!("  Original:     {} bytes", result.original_size);
        eprintln!("  Compressed:   {} bytes", result.compressed_size);
        eprintln!("  Ratio:        {:.3}", result.compression_ratio);
        eprintln!("  Time:         {:?}", result.compression_time);
        if let Some(dictionary) = &chunk.dictionary {
            eprintln!("  Dictionary:   {dictionary}");
        }
        let saved = result.bytes_saved();
        if saved >= 0 {
            let pct = saved as f64 / result.original_size.max(1) as f64 * 100.0;
            eprintln!("  Saved:        {saved} bytes ({pct:.1}%)");
        } else {
            eprintln!("  Expanded:     {} bytes", -saved);
        }
        if let Some(usage) = engine.get_statistics().strategy_usage.get(&result.algorithm) {
            eprintln!("  Algo ratio:   {:.3}", usage.compression_ratio());
        }
    }
    Ok(())
}

fn cmd_decompress(config: &Config, chunk: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    let engine = config.build_engine()?;
    let content =
        std::fs::read_to_string(chunk).with_context(|| format!("reading {}", chunk.display()))?;
    let chunk: CompressedChunk = serde_json::from_str(&content).context("parsing chunk JSON")?;

    let runtime = tokio::runtime::Runtime::new()?;
    let data = runtime.block_on(engine.decompress(&chunk))?;
    write_output(output, &data)
}

fn cmd_analyze(config: &Config, file: &Path, mime: Option<String>) -> anyhow::Result<()> {
    let engine = config.build_engine()?;
    let data = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let mime = mime.unwrap_or_else(|| guess_mime(file).to_string());
    let meta = FileMetadata::new().with_path(file.to_string_lossy());

    let hints = engine.build_hints(data.len(), &mime, &meta);
    let analysis = engine.analyze_optimal_strategy(&data, &mime, &meta);

    println!("Content Analysis:");
    println!("  Size:             {} bytes", data.len());
    println!("  MIME type:        {mime}");
    println!("  Hot:              {}", hints.is_hot);
    println!("  Ecosystem:        {}", hints.ecosystem);
    println!("  Access frequency: {:.2}", hints.access_frequency);
    println!();
    println!("Recommended Strategy: {}", analysis.recommended_strategy);
    println!();
    println!("{:<10} {:<10} {:<10} {:<10}", "Strategy", "Estimate", "Priority", "Streaming");
    println!("{}", "-".repeat(44));
    for estimation in &analysis.estimations {
        println!(
            "{:<10} {:<10.2} {:<10} {:<10}",
            estimation.name,
            estimation.estimated_ratio,
            estimation.priority.name(),
            if estimation.supports_streaming { "yes" } else { "no" }
        );
    }
    if analysis.estimations.is_empty() {
        println!("(no eligible strategy, fallback applies)");
    }
    Ok(())
}

fn cmd_profiles() -> anyhow::Result<()> {
    println!(
        "{:<12} {:<12} {:<8} {:<11} {}",
        "Profile", "Max memory", "Speed", "Dictionary", "Strategies"
    );
    println!("{}", "-".repeat(64));
    for name in CompressionProfile::preset_names() {
        let Some(profile) = CompressionProfile::preset(name) else {
            continue;
        };
        let engine = CompressionEngine::new(profile);
        let profile = engine.profile();
        println!(
            "{:<12} {:<12} {:<8} {:<11} {}",
            profile.name,
            format!("{} MiB", profile.max_memory_usage / (1024 * 1024)),
            profile.prioritize_speed,
            profile.enable_dictionary,
            engine.registry().names().join(", ")
        );
    }
    Ok(())
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "json" | "map" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "toml" => "application/toml",
        "xml" => "application/xml",
        "js" | "mjs" | "cjs" => "application/javascript",
        "ts" => "application/typescript",
        "jsx" | "tsx" => "text/jsx",
        "vue" => "text/x-vue",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "svg" => "image/svg+xml",
        "txt" | "log" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gz" => "application/gzip",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

fn write_output(output: Option<PathBuf>, content: &[u8]) -> anyhow::Result<()> {
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(content)?;
        stdout.flush()?;
    }
    Ok(())
}
