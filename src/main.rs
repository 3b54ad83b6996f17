//! ebook-reader command-line entry point.

use clap::Parser;
use ebook_reader::{
    config::{Cli, Command, Config, ContentKind, ProgressCommand},
    db::{self, Database},
    formats::{ContentPayload, ExtractorSet},
    reader::{
        LoadState, ProgressStore, ReaderDeps, ScrollLayout, open_reader, progress_key,
        stored_fraction,
    },
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ebook_reader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    match cli.command {
        Command::Open {
            path,
            title,
            offset,
            extent,
            summary,
        } => {
            let scroll = offset.zip(extent);
            cmd_open(&config, path, title, scroll, summary).await
        }
        Command::Progress { action } => cmd_progress(action, &config),
        Command::List => cmd_list(&config),
        Command::Init { force } => cmd_init(force),
    }
}

/// Open a book, print it and optionally record a scroll position.
async fn cmd_open(
    config: &Config,
    path: PathBuf,
    title: Option<String>,
    scroll: Option<(u32, u32)>,
    summary: bool,
) -> anyhow::Result<()> {
    let db = Database::open(&config.database.path)?;
    let title = title.unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string()
    });

    let deps = ReaderDeps {
        extractors: ExtractorSet::new(&config.reader),
        progress: Arc::new(db),
        display: config.display,
    };

    let mut session = open_reader(title, path, deps);
    let snapshot = session.wait_loaded().await;

    if let LoadState::Failed(failure) = &snapshot.state {
        eprintln!("{}", failure.message);
        let path = session.path().to_path_buf();
        session.close();
        anyhow::bail!("Could not open {}", path.display());
    }

    println!("# {}", session.title());
    match snapshot.content.as_ref() {
        ContentPayload::Text(text) if summary => {
            let words = text.split_whitespace().count();
            println!("{} characters, {} words", text.chars().count(), words);
        }
        ContentPayload::Text(text) => println!("{}", text),
        ContentPayload::Pages(pages) => {
            println!("{} pages", pages.len());
            if !summary {
                for page in pages {
                    println!(
                        "  page {:>4}: {}x{} px ({:.0}x{:.0} pt)",
                        page.page_index + 1,
                        page.width(),
                        page.height(),
                        page.source_width,
                        page.source_height
                    );
                }
            }
        }
        ContentPayload::None => println!("Nothing to display"),
    }

    if let Some((offset, extent)) = scroll {
        if let Some(target) = session.on_layout(ScrollLayout::Measured { offset: 0, max: extent }) {
            println!("Restored position: {} / {} px", target, extent);
        }
        session.on_scroll_settled(offset, extent);
    }

    println!("{}% read", session.progress_percent());
    session.close();
    Ok(())
}

/// Progress management commands.
fn cmd_progress(action: ProgressCommand, config: &Config) -> anyhow::Result<()> {
    let db = Database::open(&config.database.path)?;

    match action {
        ProgressCommand::Show { path } => {
            let key = progress_key(&path);
            match db.get_progress(&key)? {
                Some(progress) => println!(
                    "{}: {:.0}% (updated {})",
                    path.display(),
                    progress.fraction * 100.0,
                    db::timestamp_to_datetime(progress.updated_at).format("%Y-%m-%d %H:%M")
                ),
                None => println!("{}: no progress saved", path.display()),
            }
        }

        ProgressCommand::Set { path, fraction } => {
            if !(0.0..=1.0).contains(&fraction) {
                anyhow::bail!("Fraction must be between 0.0 and 1.0, got {}", fraction);
            }
            // Saved positions stay below 1.0, like the ones written while reading
            let stored = stored_fraction(fraction);
            db.set_fraction(&progress_key(&path), &path, stored)?;
            println!("Saved {:.0}% for {}", stored * 100.0, path.display());
        }

        ProgressCommand::Clear { path } => {
            if db.clear(&progress_key(&path))? {
                println!("Cleared progress for {}", path.display());
            } else {
                println!("No progress saved for {}", path.display());
            }
        }
    }

    Ok(())
}

/// List downloaded books with their saved progress.
fn cmd_list(config: &Config) -> anyhow::Result<()> {
    let root = &config.library.books_dir;
    if !root.exists() {
        println!("Library directory does not exist: {}", root.display());
        return Ok(());
    }

    let db = Database::open(&config.database.path)?;

    let books: Vec<(PathBuf, ContentKind)> = walkdir::WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| {
            let path = e.path().to_path_buf();
            let kind = ContentKind::detect(&path);
            (path, kind)
        })
        .filter(|(_, kind)| *kind != ContentKind::Unsupported)
        .collect();

    if books.is_empty() {
        println!("No books found.");
        return Ok(());
    }

    println!("{:<6} {:<5} PATH", "KIND", "READ");
    println!("{}", "-".repeat(80));
    for (path, kind) in books {
        let read = saved_percent(&db, &path)?;
        println!("{:<6} {:<5} {}", kind_label(kind), read, path.display());
    }

    Ok(())
}

fn saved_percent(db: &Database, path: &Path) -> anyhow::Result<String> {
    Ok(db
        .get_fraction(&progress_key(path))?
        .map(|f| format!("{:.0}%", f * 100.0))
        .unwrap_or_else(|| "-".to_string()))
}

fn kind_label(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::PlainText => "txt",
        ContentKind::Pdf => "pdf",
        ContentKind::Epub => "epub",
        ContentKind::Unsupported => "?",
    }
}

/// Write a default config file and create the progress database.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());

    let config = Config::default();
    let _db = Database::open(&config.database.path)?;
    println!("Initialized database: {}", config.database.path.display());

    println!("\nRun: ebook-reader open /path/to/book.epub");

    Ok(())
}
