//! `tuklas-cli` – Tuklascope Command Line Interface
//!
//! The `tuklas` binary is a terminal front end for the Tuklascope core. It:
//!
//! 1. Checks for `~/.tuklascope/config.toml`; runs a **First-Run Wizard** when
//!    the file is absent.
//! 2. Probes the Gemini endpoint with the configured key and lists usable
//!    models.
//! 3. Opens the discovery journal and drops the user into an **interactive
//!    REPL** (`/scan`, `/journal`, `/bakit`, `/career`, …).
//! 4. Intercepts **Ctrl-C**: a scan in progress is allowed to finish, then
//!    the shell exits.

mod config;
mod probe;
mod repl;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

use tuklas_runtime::telemetry::{TelemetryConfig, init_tracing};

use crate::config::LogFormat;

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG filters (default "info"); TUKLAS_LOG_FORMAT=json or
    // `log_format = "json"` in the config switches to JSON lines. User-facing
    // output still goes through println!.
    let loaded = config::load();
    let json_logs = matches!(&loaded, Ok(Some(c)) if c.log_format == LogFormat::Json);
    let _telemetry = init_tracing(&TelemetryConfig::from_env("tuklascope").with_json(json_logs));

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!(
            "{}",
            "⚠  Ctrl-C received – finishing the current step, then exiting …"
                .yellow()
                .bold()
        );
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    // ── First-Run Wizard ──────────────────────────────────────────────────
    match loaded {
        Ok(None) => run_first_run_wizard(),
        Ok(Some(_)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
        }
    }

    let cfg = config::load_or_default().unwrap_or_default();

    // ── Endpoint probe ────────────────────────────────────────────────────
    if cfg.has_api_key() {
        print!("\n  Probing Gemini at {} … ", cfg.api_base_url.dimmed());
        std::io::Write::flush(&mut std::io::stdout()).ok();
        match probe::fetch_models(&cfg.api_base_url, &cfg.gemini_api_key) {
            Ok(models) => {
                println!("{} ({} model(s) available)", "online".green(), models.len());
                let active = models.iter().any(|m| m.short_name() == cfg.model);
                if !active && !models.is_empty() {
                    println!(
                        "  {} '{}' is not in the list; change it with {}.",
                        "Warning:".yellow(),
                        cfg.model,
                        "/settings".bold()
                    );
                }
            }
            Err(e) => {
                println!("{}", "offline".yellow());
                println!("  {}", e.dimmed());
                println!("  Scans will show a friendly error until the service is reachable.");
            }
        }
    } else {
        println!(
            "\n  {} Set one with {} or the {} variable.",
            "No Gemini API key configured.".yellow(),
            "/settings".bold(),
            "TUKLAS_API_KEY".bold()
        );
    }

    // ── Session ───────────────────────────────────────────────────────────
    let session = match repl::Session::new(&cfg) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}: {}", "Startup error".red(), e);
            std::process::exit(1);
        }
    };
    drop(cfg);

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(session, shutdown);
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║     Tuklascope First-Run Wizard      ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's set up Tuklascope.\n");

    let mut cfg = config::Config::default();
    config::apply_env_overrides(&mut cfg);

    println!("  Tuklascope uses Google's Gemini API to recognise objects.");
    println!("  Get a key at https://aistudio.google.com/app/apikey");
    let shown = if cfg.has_api_key() { "<from TUKLAS_API_KEY>" } else { "<none>" };
    let key = repl::prompt_str(&format!("  Gemini API key [{}]: ", shown), "");
    if !key.is_empty() {
        cfg.gemini_api_key = key;
    }

    cfg.model = repl::prompt_str(&format!("  Model [{}]: ", cfg.model), &cfg.model);

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"  ______      __   __                              "#.bold().cyan());
    println!("{}", r#" /_  __/_ __/ /__/ /__ ____ ___ ____ ___  ___  ___ "#.bold().cyan());
    println!("{}", r#"  / / / // /  '_/ / _ `(_-<(_-</ __/ _ \/ _ \/ -_)"#.bold().cyan());
    println!("{}", r#" /_/  \_,_/_/\_\/_/\_,_/___/___/\__/\___/ .__/\__/ "#.bold().cyan());
    println!("{}", r#"                                       /_/        "#.bold().cyan());
    println!();
    println!("  {} {}",
        "Tuklascope".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Scan the everyday. Discover the science.");
    println!();
}
