//! REPL – Read-Eval-Print Loop for the Tuklascope shell.
//!
//! Supported slash-commands:
//!   /scan <image>     – photograph an object (read from an image file)
//!   /journal          – list saved discoveries, newest first
//!   /open <n>         – show the learning card of journal entry n
//!   /bakit            – ask "why?" about the open card's Understand section
//!   /close            – close the open card and its conversation
//!   /delete <n>       – remove journal entry n
//!   /level [name]     – show or change the explanation level
//!   /profile          – points, level and discovery count
//!   /quest            – today's discovery quest
//!   /career [filter]  – career insight and the career catalog
//!   /settings         – interactively edit `~/.tuklascope/config.toml`
//!   /help             – show this list
//!   /quit | /exit     – exit the CLI

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use rustyline::history::History;
use tracing::{debug, info};

use tuklas_hal::{FileCamera, LogHaptics};
use tuklas_memory::{DiscoveryStore, SqliteKvStore};
use tuklas_runtime::prompts::CAREER_INSIGHT_SAMPLE;
use tuklas_runtime::{
    CardConversation, ExpandError, GeminiGateway, InferenceGateway, ScanOutcome, ScanPipeline,
};
use tuklas_types::careers::careers;
use tuklas_types::{CareerFilter, Discovery, ProfileState, SectionKind, UserLevel};

use crate::config::{self, Config, LogFormat};

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// A parsed REPL line. Journal indices are 1-based, as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan(PathBuf),
    Journal,
    Open(usize),
    Bakit,
    Close,
    Delete(usize),
    Level(Option<UserLevel>),
    Profile,
    Quest,
    Career(CareerFilter),
    Settings,
    Help,
    Quit,
}

/// Parse one non-empty input line.
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let cmd = match name {
        "/scan" if arg.is_empty() => return Err("Usage: /scan <image file>".to_string()),
        "/scan" => Command::Scan(PathBuf::from(arg)),
        "/journal" => Command::Journal,
        "/open" => Command::Open(parse_index(arg, "/open")?),
        "/bakit" | "/why" => Command::Bakit,
        "/close" => Command::Close,
        "/delete" => Command::Delete(parse_index(arg, "/delete")?),
        "/level" if arg.is_empty() => Command::Level(None),
        "/level" => Command::Level(Some(arg.parse::<UserLevel>().map_err(|e| {
            format!("{e}. Choose one of: {}", level_names())
        })?)),
        "/profile" => Command::Profile,
        "/quest" => Command::Quest,
        "/career" if arg.is_empty() => Command::Career(CareerFilter::All),
        "/career" => Command::Career(arg.parse::<CareerFilter>().map_err(|e| {
            format!("{e}. Choose one of: {}", filter_names())
        })?),
        "/settings" => Command::Settings,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => {
            return Err(format!(
                "{} '{}'. Type {} for available commands.",
                "Unknown command:".red(),
                other.yellow(),
                "/help".bold()
            ));
        }
    };
    Ok(cmd)
}

fn parse_index(arg: &str, cmd: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Usage: {cmd} <n>  (n is the number shown by /journal)")),
    }
}

fn level_names() -> String {
    UserLevel::ALL.map(UserLevel::label).join(", ")
}

fn filter_names() -> String {
    CareerFilter::ALL.map(CareerFilter::label).join(", ")
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// A card on screen, with its "Bakit?" thread once one is started.
struct OpenCard {
    discovery: Discovery,
    thread: Option<CardConversation>,
}

/// Everything the shell holds between commands.
pub struct Session {
    runtime: tokio::runtime::Runtime,
    store: DiscoveryStore,
    gateway: Arc<dyn InferenceGateway>,
    pipeline: ScanPipeline<FileCamera>,
    profile: ProfileState,
    /// Journal as last listed; `/open` and `/delete` index into it.
    journal: Vec<Discovery>,
    open: Option<OpenCard>,
}

impl Session {
    /// Open the journal and build the gateway described by `cfg`.
    pub fn new(cfg: &Config) -> Result<Self, String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to start async runtime: {}", e))?;

        let path = cfg.journal_path();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
        let kv = SqliteKvStore::open(&path.to_string_lossy())
            .map_err(|e| format!("Failed to open journal at {}: {}", path.display(), e))?;
        let store = DiscoveryStore::new(Box::new(kv));
        info!(path = %path.display(), "journal opened");

        let gateway: Arc<dyn InferenceGateway> = Arc::new(
            GeminiGateway::new(cfg.gemini_api_key.clone(), cfg.model.clone())
                .with_base_url(cfg.api_base_url.clone()),
        );
        let pipeline = ScanPipeline::new(
            FileCamera::new("file"),
            Box::new(LogHaptics),
            gateway.clone(),
        );

        let profile = store.profile();
        let journal = store.load_discoveries();
        Ok(Self {
            runtime,
            store,
            gateway,
            pipeline,
            profile,
            journal,
            open: None,
        })
    }

    pub fn execute(&mut self, cmd: Command) {
        match cmd {
            Command::Scan(path) => self.cmd_scan(path),
            Command::Journal => self.cmd_journal(),
            Command::Open(n) => self.cmd_open(n),
            Command::Bakit => self.cmd_bakit(),
            Command::Close => self.cmd_close(),
            Command::Delete(n) => self.cmd_delete(n),
            Command::Level(level) => self.cmd_level(level),
            Command::Profile => self.cmd_profile(),
            Command::Quest => self.cmd_quest(),
            Command::Career(filter) => self.cmd_career(filter),
            Command::Settings => cmd_settings(),
            Command::Help => cmd_help(),
            Command::Quit => {}
        }
    }

    // ── Scan ───────────────────────────────────────────────────────────────

    fn cmd_scan(&mut self, path: PathBuf) {
        print!("  Scanning {} … ", path.display().to_string().dimmed());
        io::stdout().flush().ok();
        self.pipeline.camera_mut().aim(path);

        let outcome = self
            .runtime
            .block_on(self.pipeline.scan(&self.store, &mut self.profile));

        match outcome {
            Err(e) => {
                println!("{}", "failed".red());
                println!("  {}", e.to_string().red());
            }
            Ok(ScanOutcome::Discovered {
                discovery,
                points_awarded,
                total_points,
            }) => {
                println!("{}", "new discovery!".green().bold());
                if points_awarded > 0 {
                    println!(
                        "  {} +{} Tuklas Points ({} total)",
                        "★".yellow(),
                        points_awarded,
                        total_points.to_string().bold()
                    );
                }
                self.journal = self.store.load_discoveries();
                self.show(discovery);
            }
            Ok(ScanOutcome::Rediscovered { discovery }) => {
                println!("{}", "already in your journal".yellow());
                self.show(discovery);
            }
            Ok(other) => {
                println!("{}", "no card".red());
                if let Some(msg) = other.message() {
                    println!("  {}", msg.red());
                }
            }
        }
    }

    // ── Journal ────────────────────────────────────────────────────────────

    fn cmd_journal(&mut self) {
        self.journal = self.store.load_discoveries();
        println!("{}", "Discovery Journal".bold().underline());
        if self.journal.is_empty() {
            println!("  Your journal is empty. Try {}.", "/scan <image>".bold());
            return;
        }
        for (i, d) in self.journal.iter().enumerate() {
            println!(
                "  {:>3}. {}  {}",
                i + 1,
                d.object_name.bold(),
                format_date(&d.date).dimmed()
            );
        }
    }

    fn cmd_open(&mut self, n: usize) {
        if self.journal.is_empty() {
            self.journal = self.store.load_discoveries();
        }
        match self.journal.get(n - 1).cloned() {
            Some(d) => self.show(d),
            None => println!("{} {}", "No journal entry".red(), n.to_string().yellow()),
        }
    }

    fn cmd_delete(&mut self, n: usize) {
        if self.journal.is_empty() {
            self.journal = self.store.load_discoveries();
        }
        let Some(target) = self.journal.get(n - 1).cloned() else {
            println!("{} {}", "No journal entry".red(), n.to_string().yellow());
            return;
        };
        if let Err(e) = self.store.delete_discovery(&target.date) {
            println!("{}: {}", "Error deleting entry".red(), e);
            return;
        }
        if self
            .open
            .as_ref()
            .is_some_and(|o| o.discovery.date == target.date)
        {
            self.open = None;
        }
        self.journal = self.store.load_discoveries();
        println!("{} {}", "✓ Removed".green(), target.object_name.bold());
    }

    // ── Card & conversation ────────────────────────────────────────────────

    fn show(&mut self, discovery: Discovery) {
        print_card(&discovery);
        self.open = Some(OpenCard {
            discovery,
            thread: None,
        });
    }

    fn cmd_bakit(&mut self) {
        let Some(open) = self.open.as_mut() else {
            println!(
                "  Open a card first with {} or {}.",
                "/scan <image>".bold(),
                "/open <n>".bold()
            );
            return;
        };

        let thread = open.thread.get_or_insert_with(|| {
            CardConversation::open(open.discovery.learning_data.section(SectionKind::Understand))
        });

        print!("  {} ", "Bakit?".bold().magenta());
        io::stdout().flush().ok();
        match self.runtime.block_on(thread.expand(self.gateway.as_ref())) {
            Ok(entry) => {
                println!();
                print_entry(entry.title.as_deref(), &entry.text);
            }
            Err(ExpandError::Fallback) => {
                println!();
                if let Some(entry) = thread.entries().last() {
                    print_entry(entry.title.as_deref(), &entry.text);
                }
                println!("  {}", "(The AI could not go deeper right now.)".dimmed());
            }
        }
    }

    fn cmd_close(&mut self) {
        match self.open.take() {
            Some(open) => println!("  Closed {}.", open.discovery.object_name.bold()),
            None => println!("  No card is open."),
        }
    }

    // ── Profile ────────────────────────────────────────────────────────────

    fn cmd_level(&mut self, level: Option<UserLevel>) {
        let Some(level) = level else {
            println!("{}", "Explanation Level".bold().underline());
            for l in UserLevel::ALL {
                let marker = if l == self.profile.level { "▶" } else { " " };
                println!("    {} {}", marker.green(), l.label().bold());
            }
            println!("  Change it with {}.", "/level <name>".bold());
            return;
        };
        match self.store.set_level(level) {
            Ok(()) => {
                self.store.refresh_profile(&mut self.profile);
                println!("{} {}", "✓ Level set to".green(), level.label().bold());
            }
            Err(e) => println!("{}: {}", "Error saving level".red(), e),
        }
    }

    fn cmd_profile(&mut self) {
        self.store.refresh_profile(&mut self.profile);
        println!("{}", "Profile".bold().underline());
        println!("  Tuklas Points : {}", self.profile.points.to_string().yellow().bold());
        println!("  Level        : {}", self.profile.level.label().cyan());
        println!("  Discoveries  : {}", self.store.discovery_count());
    }

    fn cmd_quest(&mut self) {
        let quest = self.runtime.block_on(self.gateway.daily_quest());
        println!("  {} {}", "🧭".yellow(), quest.text().bold());
    }

    fn cmd_career(&mut self, filter: CareerFilter) {
        let names = self.store.recent_object_names(CAREER_INSIGHT_SAMPLE);
        print!("  Thinking about your discoveries … ");
        io::stdout().flush().ok();
        let insight = self.runtime.block_on(self.gateway.career_insight(&names));
        println!();
        println!("{}", "Tuklas-Connect".bold().underline());
        println!("  {}", insight.text());
        println!();
        println!("  {} {}", "Careers:".bold(), filter.label().cyan());
        for career in careers(filter) {
            println!("    • {}  {}", career.name.bold(), career.tags.join(", ").dimmed());
            println!("      {}", career.description);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loop
// ─────────────────────────────────────────────────────────────────────────────

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled before each prompt; when set the REPL exits cleanly.
pub fn run(mut session: Session, shutdown: Arc<AtomicBool>) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("{}: {}", "Terminal error".red(), e);
            return;
        }
    };
    let prompt = format!("{} ", "tuklas>".bold().cyan());

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        };

        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }
        remember(editor.history_mut(), cmd);

        match parse(cmd) {
            Ok(Command::Quit) => {
                println!("{}", "Paalam! Keep discovering.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Ok(command) => session.execute(command),
            Err(msg) => println!("{}", msg),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stateless handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Tuklascope Commands".bold().underline());
    println!("  {}     – scan an object from an image file", "/scan <image>".bold().cyan());
    println!("  {}          – list your discoveries", "/journal".bold().cyan());
    println!("  {}         – show the card of entry n", "/open <n>".bold().cyan());
    println!("  {}            – ask why, one level deeper", "/bakit".bold().cyan());
    println!("  {}            – close the open card", "/close".bold().cyan());
    println!("  {}       – remove entry n", "/delete <n>".bold().cyan());
    println!("  {}   – show or change your level", "/level [name]".bold().cyan());
    println!("  {}          – points, level, discoveries", "/profile".bold().cyan());
    println!("  {}            – today's discovery quest", "/quest".bold().cyan());
    println!("  {} – career paths from your discoveries", "/career [filter]".bold().cyan());
    println!("  {}         – edit ~/.tuklascope/config.toml", "/settings".bold().cyan());
    println!("  {}     – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
}

/// Add `line` to the editor history. Errors are logged at debug and dropped.
fn remember<H: History>(history: &mut H, line: &str) -> bool {
    match history.add(line) {
        Ok(added) => added,
        Err(e) => {
            debug!(error = %e, "history entry not recorded");
            false
        }
    }
}

fn cmd_settings() {
    let mut cfg = match config::load() {
        Ok(Some(c)) => c,
        Ok(None) => Config::default(),
        Err(e) => {
            println!("{}: {}", "Error loading config".red(), e);
            return;
        }
    };

    println!("{}", "Settings Editor".bold().underline());
    println!("  (press Enter to keep the current value)");

    let key_state = if cfg.has_api_key() { "<set>" } else { "<not set>" };
    let key = prompt_str(&format!("  Gemini API key [{}]: ", key_state), "");
    if !key.is_empty() {
        cfg.gemini_api_key = key;
    }

    cfg.model = prompt_str(&format!("  Model          [{}]: ", cfg.model), &cfg.model);
    cfg.api_base_url = prompt_str(
        &format!("  API base URL   [{}]: ", cfg.api_base_url),
        &cfg.api_base_url,
    );

    let journal = cfg.journal_path().display().to_string();
    let db = prompt_str(&format!("  Journal file   [{}]: ", journal), &journal);
    if db != journal {
        cfg.database_path = Some(db);
    }

    let format = prompt_str(
        &format!("  Log format     [{}] (compact / json): ", cfg.log_format),
        &cfg.log_format.to_string(),
    );
    cfg.log_format = match format.to_lowercase().as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Compact,
    };

    match config::save(&cfg) {
        Ok(()) => {
            println!(
                "{} {}",
                "✓ Settings saved to".green(),
                config::config_path().display().to_string().bold()
            );
            println!("  Restart tuklas to apply them.");
        }
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn print_card(discovery: &Discovery) {
    println!();
    println!(
        "  {}  {}",
        discovery.object_name.bold().underline(),
        format_date(&discovery.date).dimmed()
    );
    for section in discovery.learning_data.sections() {
        println!();
        println!(
            "  {} {}",
            format!("[{}]", section.kind.label()).cyan().bold(),
            section.title.bold()
        );
        println!("  {}", section.text);
        if section.kind == SectionKind::Understand {
            println!("  {}", "↳ /bakit to ask why".dimmed());
        }
    }
    println!();
}

fn print_entry(title: Option<&str>, text: &str) {
    if let Some(title) = title {
        println!("  {}", title.magenta().bold());
    }
    println!("  {}", text);
}

/// `"Oct 19, 2026"` for an ISO timestamp, or the raw text if it is not one.
fn format_date(iso: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(iso)
        .map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|_| iso.to_string())
}

/// Prompt for a string value.  Returns `default` when the user presses Enter.
pub(crate) fn prompt_str(msg: &str, default: &str) -> String {
    print!("{}", msg);
    io::stdout().flush().ok();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed
            }
        }
        Err(_) => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::DefaultHistory;

    #[test]
    fn entered_commands_are_kept_in_history() {
        let mut history = DefaultHistory::new();
        assert!(remember(&mut history, "/journal"));
        assert!(remember(&mut history, "/open 1"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn parses_scan_with_path() {
        assert_eq!(
            parse("/scan  photos/mouse.jpg ").unwrap(),
            Command::Scan(PathBuf::from("photos/mouse.jpg"))
        );
        assert!(parse("/scan").is_err());
    }

    #[test]
    fn parses_indices_one_based() {
        assert_eq!(parse("/open 2").unwrap(), Command::Open(2));
        assert_eq!(parse("/delete 1").unwrap(), Command::Delete(1));
        assert!(parse("/open 0").is_err());
        assert!(parse("/delete x").is_err());
        assert!(parse("/open").is_err());
    }

    #[test]
    fn parses_level_case_insensitively() {
        assert_eq!(parse("/level").unwrap(), Command::Level(None));
        assert_eq!(
            parse("/level college innovator").unwrap(),
            Command::Level(Some(UserLevel::CollegeInnovator))
        );
        let err = parse("/level wizard").unwrap_err();
        assert!(err.contains("Batang Kuryoso"));
    }

    #[test]
    fn parses_career_filter() {
        assert_eq!(parse("/career").unwrap(), Command::Career(CareerFilter::All));
        assert_eq!(parse("/career stem").unwrap(), Command::Career(CareerFilter::Stem));
        assert!(parse("/career astrology").is_err());
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse("/journal").unwrap(), Command::Journal);
        assert_eq!(parse("/bakit").unwrap(), Command::Bakit);
        assert_eq!(parse("/quest").unwrap(), Command::Quest);
        assert_eq!(parse("/exit").unwrap(), Command::Quit);
        assert!(parse("/launch").is_err());
    }

    #[test]
    fn dates_render_for_display() {
        assert_eq!(format_date("2026-10-19T08:30:00.000Z"), "Oct 19, 2026");
        assert_eq!(format_date("yesterday"), "yesterday");
    }

    #[test]
    fn session_opens_journal_at_configured_path() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut cfg = Config::default();
        cfg.database_path = Some(
            dir.path()
                .join("nested")
                .join("journal.sqlite")
                .to_string_lossy()
                .to_string(),
        );
        let session = Session::new(&cfg).expect("session");
        assert!(session.journal.is_empty());
        assert_eq!(session.profile, ProfileState::default());
        assert!(dir.path().join("nested").join("journal.sqlite").exists());
    }
}
