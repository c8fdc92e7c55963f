//! Sealnote CLI - Command line interface for the encrypted notes core.
//!
//! This tool seals and opens note records locally and walks through the
//! account lifecycle against in-memory collaborators.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

use sealnote_common::{EncryptedNote, FolderId, NewNote, NoteQuery, TagId};
use sealnote_crypto::{derive_key, DerivedKey, Salt};
use sealnote_notes::{
    open_note, seal_note, AccountManager, KeySession, MarkerStore, MemoryMarker, NoteOperations,
    NotesConfig, OpenedNote,
};
use sealnote_storage::{MemoryAuth, MemoryNoteStore, NoteStore};

#[derive(Parser)]
#[command(name = "sealnote")]
#[command(about = "Sealnote - End-to-end encrypted notes")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Notes configuration file (JSON).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh registration salt.
    Salt,

    /// Encrypt a note and print the creation request.
    Seal {
        /// Account salt (32 hex characters).
        #[arg(short, long)]
        salt: String,

        /// Note title.
        #[arg(short, long)]
        title: String,

        /// Note content.
        #[arg(short = 'b', long)]
        content: String,

        /// Folder to file the note under.
        #[arg(short, long)]
        folder: Option<String>,

        /// Tag to attach; may be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Decrypt a stored note or creation request.
    Open {
        /// Account salt (32 hex characters).
        #[arg(short, long)]
        salt: String,

        /// JSON file holding the record.
        #[arg(short, long)]
        record: PathBuf,
    },

    /// Run register, write, reload, login and read against in-memory services.
    Demo {
        /// Account email.
        #[arg(short, long, default_value = "demo@example.com")]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Salt => cmd_salt(),

        Commands::Seal {
            salt,
            title,
            content,
            folder,
            tags,
        } => cmd_seal(&salt, &title, &content, folder, tags).await,

        Commands::Open { salt, record } => cmd_open(&salt, &record, &config).await,

        Commands::Demo { email } => cmd_demo(&email, config).await,
    }
}

/// Load the notes configuration, or the defaults when no file is given.
async fn load_config(path: Option<&Path>) -> Result<NotesConfig> {
    let Some(path) = path else {
        return Ok(NotesConfig::default());
    };

    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = NotesConfig::from_json(&json).context("Invalid config file")?;

    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Prompt for password securely.
fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }
    Ok(Zeroizing::new(password))
}

/// Prompt for the password and derive the key for `salt`.
async fn unlock_key(salt: &str) -> Result<DerivedKey> {
    let salt = Salt::from_hex(salt).context("Invalid salt")?;
    let password = prompt_password("Enter password: ")?;

    tokio::task::spawn_blocking(move || derive_key(&password, &salt))
        .await
        .context("Key derivation task failed")?
        .context("Failed to derive key")
}

/// Print a fresh salt.
fn cmd_salt() -> Result<()> {
    println!("{}", Salt::generate());
    Ok(())
}

/// Seal a note and print the creation request.
async fn cmd_seal(
    salt: &str,
    title: &str,
    content: &str,
    folder: Option<String>,
    tags: Vec<String>,
) -> Result<()> {
    let folder_id = folder
        .map(FolderId::new)
        .transpose()
        .context("Invalid folder id")?;
    let tag_ids = tags
        .into_iter()
        .map(TagId::new)
        .collect::<sealnote_common::Result<Vec<_>>>()
        .context("Invalid tag id")?;

    let key = unlock_key(salt).await?;
    let request = seal_note(title, content, &key)
        .context("Failed to seal note")?
        .into_new_note(folder_id, tag_ids);

    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

/// A record file holds either a stored note or a creation request.
enum RecordFile {
    Stored(EncryptedNote),
    Request(NewNote),
}

fn parse_record(json: &str) -> Result<RecordFile> {
    if let Ok(note) = serde_json::from_str::<EncryptedNote>(json) {
        return Ok(RecordFile::Stored(note));
    }
    let request: NewNote = serde_json::from_str(json)
        .context("File is neither a stored note nor a creation request")?;
    Ok(RecordFile::Request(request))
}

/// Open a record file and print its title and content.
async fn cmd_open(salt: &str, path: &Path, config: &NotesConfig) -> Result<()> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read record file {}", path.display()))?;
    let record = parse_record(&json)?;

    let key = unlock_key(salt).await?;
    let opened = match &record {
        RecordFile::Stored(note) => {
            println!("Note {}", note.id);
            open_note(note, &key)
        }
        RecordFile::Request(request) => open_note(request, &key),
    };

    match opened {
        Ok(OpenedNote { title, content }) => {
            println!("Title:   {}", title);
            println!("Content: {}", content);
        }
        Err(e) => {
            println!("Title:   {}", config.unreadable_placeholder);
            println!("Content: {}", config.unreadable_placeholder);
            eprintln!("Record could not be verified: {}", e);
        }
    }

    Ok(())
}

/// Walk through the full key lifecycle with in-memory services.
async fn cmd_demo(email: &str, config: NotesConfig) -> Result<()> {
    let password = prompt_password("Choose a password: ")?;

    let store = Arc::new(MemoryNoteStore::new());
    let manager = AccountManager::new(Arc::new(MemoryAuth::new()));
    let marker: Arc<dyn MarkerStore> = Arc::new(MemoryMarker::new());

    let mut session = KeySession::new(marker.clone());
    let grant = manager
        .register(email, &password, &mut session)
        .await
        .context("Registration failed")?;

    println!("Registered {}", email);
    println!("  User: {}", grant.user_id);
    println!("  Salt: {}", grant.salt);

    let note = NoteOperations::with_config(
        &session,
        store.clone(),
        grant.user_id.clone(),
        config.clone(),
    )
    .create_note("Hello", "World", None, Vec::new())
    .await
    .context("Failed to create note")?;

    let stored = store
        .get_note(&grant.user_id, &note.id)
        .await
        .context("Failed to fetch stored note")?;
    println!("\nWhat the server stores:");
    println!("{}", serde_json::to_string_pretty(&stored)?);

    // Simulated reload: the key is lost, the marker survives.
    drop(session);
    let mut session = KeySession::new(marker);
    println!("\nAfter reload, sign-in required: {}", session.needs_reauth());

    manager
        .login(email, &password, &mut session)
        .await
        .context("Login failed")?;

    let notes = NoteOperations::with_config(
        &session,
        store.clone(),
        grant.user_id.clone(),
        config.clone(),
    )
    .list_notes(&NoteQuery::active())
    .await
    .context("Failed to list notes")?;

    println!("\nNotes after signing back in:");
    for note in &notes {
        println!(
            "  [{}] {}: {}",
            note.id,
            note.title(&config.unreadable_placeholder),
            note.content(&config.unreadable_placeholder)
        );
    }

    manager
        .logout(&grant.user_id, &mut session)
        .await
        .context("Logout failed")?;
    println!("\nSigned out, key present: {}", session.is_present());

    Ok(())
}
