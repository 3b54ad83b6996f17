use crate::reader::DisplayPreferences;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// E-book reader for plain text, PDF and EPUB files.
#[derive(Parser, Debug, Clone)]
#[command(name = "ebook-reader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "EBOOK_READER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Open a local book and print its content.
    Open {
        /// Path to the local book file.
        path: PathBuf,

        /// Title shown in the header (defaults to the file stem).
        #[arg(short, long)]
        title: Option<String>,

        /// Record a settled scroll offset, in pixels.
        #[arg(long, requires = "extent")]
        offset: Option<u32>,

        /// Maximum scroll extent matching `--offset`, in pixels.
        #[arg(long, requires = "offset")]
        extent: Option<u32>,

        /// Print only a summary instead of the full text.
        #[arg(short, long)]
        summary: bool,
    },

    /// Reading progress commands.
    Progress {
        /// Progress subcommand action.
        #[command(subcommand)]
        action: ProgressCommand,
    },

    /// List downloaded books in the library directory.
    List,

    /// Create a default config file and progress database.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

/// Reading progress subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ProgressCommand {
    /// Show the stored fraction for a book.
    Show {
        /// Path to the local book file.
        path: PathBuf,
    },

    /// Overwrite the stored fraction for a book.
    Set {
        /// Path to the local book file.
        path: PathBuf,
        /// Fraction in [0.0, 1.0].
        fraction: f32,
    },

    /// Forget the stored fraction for a book.
    Clear {
        /// Path to the local book file.
        path: PathBuf,
    },
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Content extraction configuration.
    #[serde(default)]
    pub reader: ReaderConfig,

    /// Initial display preferences for new sessions.
    #[serde(default)]
    pub display: DisplayPreferences,

    /// Local library configuration.
    #[serde(default)]
    pub library: LibraryConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite progress database.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("ebook-reader").join("progress.db"))
        .unwrap_or_else(|| PathBuf::from("data/progress.db"))
}

/// Content extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Width in pixels PDF pages are rasterized to.
    #[serde(default = "default_render_width")]
    pub render_width: u32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            render_width: default_render_width(),
        }
    }
}

fn default_render_width() -> u32 {
    1080
}

/// Local library configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Directory downloaded books are stored under, one folder per user.
    #[serde(default = "default_books_dir")]
    pub books_dir: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            books_dir: default_books_dir(),
        }
    }
}

fn default_books_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::data_dir)
        .map(|p| p.join("ebook-reader"))
        .unwrap_or_else(|| PathBuf::from("data/books"))
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::ReaderError::Config(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content).map_err(|e| {
            crate::error::ReaderError::Config(format!("Failed to parse config file: {}", e))
        })
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("config.toml"),
            PathBuf::from("ebook-reader.toml"),
            dirs::config_dir()
                .map(|p| p.join("ebook-reader").join("config.toml"))
                .unwrap_or_default(),
        ];

        candidates.into_iter().find(|p| p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# ebook-reader configuration

[database]
# path = "/home/me/.local/share/ebook-reader/progress.db"

[reader]
# Width in pixels PDF pages are rasterized to
render_width = 1080

[display]
# font_size: "small", "medium", "large"
font_size = "medium"
# line_spacing: "compact", "normal", "relaxed"
line_spacing = "normal"
# theme: "light", "dark", "sepia"
theme = "light"

[library]
# books_dir = "/home/me/Downloads/ebook-reader"
"#
        .to_string()
    }
}

/// Content kind of a local book file, decided by extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Plain UTF-8 text.
    PlainText,
    /// PDF rendered page by page.
    Pdf,
    /// EPUB with text extracted from its markup.
    Epub,
    /// No extractor available.
    Unsupported,
}

impl ContentKind {
    /// Map an extension (without the dot) to a kind, ignoring case.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "txt" => ContentKind::PlainText,
            "pdf" => ContentKind::Pdf,
            "epub" => ContentKind::Epub,
            _ => ContentKind::Unsupported,
        }
    }

    /// Detect the kind from the text after the last `.` of a path.
    pub fn detect(path: impl AsRef<Path>) -> Self {
        Self::from_extension(&extension_of(path.as_ref()))
    }
}

/// Lowercased text after the last `.` of a path's file name, or an empty string.
pub fn extension_of(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_else(|| path.to_string_lossy());

    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}
