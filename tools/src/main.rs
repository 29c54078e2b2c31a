mod import;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use softkey_core::{load_layout_file, Composer, Dictionary, HitTester, SharedStore};
use softkey_latin::{LatinComposer, LatinConfig};
use softkey_pinyin::{PinyinComposer, PinyinConfig};
use softkey_zhuyin::{ZhuyinComposer, ZhuyinConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "softkey")]
#[command(about = "Dictionary and layout helpers for the softkey input engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import tab-separated rows into a dictionary (.redb, .json or bincode)
    Import {
        /// Input TSV files
        #[arg(short, long, num_args = 1..)]
        inputs: Vec<PathBuf>,
        /// Output dictionary path
        #[arg(short, long)]
        output: PathBuf,
        /// Put every row in this table; otherwise the first column names it
        #[arg(long)]
        table: Option<String>,
    },
    /// Print candidates for composing text
    Compose {
        #[arg(long, value_enum, default_value_t = ScriptArg::Pinyin)]
        script: ScriptArg,
        /// Word dictionary
        #[arg(long)]
        dict: Option<PathBuf>,
        /// Phrase dictionary (zhuyin only)
        #[arg(long)]
        phrases: Option<PathBuf>,
        /// Script config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// Composing texts, one lookup each
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Hit-test a layout at a point
    Tap {
        /// JSON layout file
        #[arg(short, long)]
        layout: PathBuf,
        #[arg(long, default_value_t = 1080)]
        width: i32,
        #[arg(long, default_value_t = 720)]
        height: i32,
        /// Keyboard mode used to filter rows
        #[arg(long, default_value_t = 0)]
        mode: i32,
        /// Resolve to nearby keys and report alternates
        #[arg(long)]
        proximity: bool,
        x: i32,
        y: i32,
    },
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum ScriptArg {
    Latin,
    Pinyin,
    Zhuyin,
}

fn open_store(path: Option<&Path>) -> Result<Option<SharedStore>> {
    match path {
        Some(path) => {
            let dict = Dictionary::open(path)?;
            Ok(Some(Arc::new(dict)))
        }
        None => Ok(None),
    }
}

fn build_composer(
    script: ScriptArg,
    dict: Option<&Path>,
    phrases: Option<&Path>,
    config: Option<&Path>,
) -> Result<Box<dyn Composer>> {
    let store = open_store(dict)?;
    let composer: Box<dyn Composer> = match script {
        ScriptArg::Latin => {
            let cfg = config.map(LatinConfig::load_toml).transpose()?.unwrap_or_default();
            Box::new(LatinComposer::with_config(store, &cfg))
        }
        ScriptArg::Pinyin => {
            let cfg = config.map(PinyinConfig::load_toml).transpose()?.unwrap_or_default();
            Box::new(PinyinComposer::with_config(store, &cfg))
        }
        ScriptArg::Zhuyin => {
            let cfg = config.map(ZhuyinConfig::load_toml).transpose()?.unwrap_or_default();
            Box::new(ZhuyinComposer::with_config(store, open_store(phrases)?, &cfg))
        }
    };
    Ok(composer)
}

fn handle_compose(composer: &mut dyn Composer, inputs: &[String], json: bool) -> Result<()> {
    for input in inputs {
        let Some(result) = composer.candidates(input) else {
            println!("{input:?}: no candidates");
            continue;
        };
        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            continue;
        }
        println!("{input:?} -> {:?} ({:?})", result.composing, result.action);
        for (i, word) in result.words.iter().enumerate() {
            println!("  {i:>2}. {}  [{}] x{}", word.value, word.code, word.syllables);
        }
    }
    Ok(())
}

fn handle_tap(
    layout: &Path,
    width: i32,
    height: i32,
    mode: i32,
    proximity: bool,
    x: i32,
    y: i32,
) -> Result<()> {
    let keyboard = load_layout_file(layout, width, height, mode)?;
    if let Some(err) = keyboard.load_error() {
        tracing::warn!("layout loaded partially: {err}");
    }
    let tester = HitTester::for_keyboard(&keyboard, proximity);
    let hit = tester.key_indices(&keyboard, x, y, true);
    match hit.primary {
        Some(index) => {
            let key = &keyboard.keys()[index];
            let label = keyboard.display_label(index).unwrap_or_default();
            println!(
                "key {index}: {:?} code {} at ({}, {}) {}x{}",
                label,
                key.primary_code(),
                key.x,
                key.y,
                key.width,
                key.height
            );
        }
        None => println!("no key at ({x}, {y})"),
    }
    let alternates: Vec<String> = hit
        .alternates
        .iter()
        .map(|code| match char::from_u32(*code as u32) {
            Some(ch) => ch.to_string(),
            None => code.to_string(),
        })
        .collect();
    println!("alternates: [{}]", alternates.join(", "));
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Import {
            inputs,
            output,
            table,
        } => {
            let dict = import::read_inputs(&inputs, table.as_deref())?;
            let written = import::write_dictionary(&dict, &output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("wrote {written} rows to {}", output.display());
        }
        Commands::Compose {
            script,
            dict,
            phrases,
            config,
            json,
            inputs,
        } => {
            let mut composer = build_composer(
                script,
                dict.as_deref(),
                phrases.as_deref(),
                config.as_deref(),
            )?;
            handle_compose(composer.as_mut(), &inputs, json)?;
        }
        Commands::Tap {
            layout,
            width,
            height,
            mode,
            proximity,
            x,
            y,
        } => handle_tap(&layout, width, height, mode, proximity, x, y)?,
    }
    Ok(())
}
