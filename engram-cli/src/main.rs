//! Engram CLI
//!
//! Thin driver over the engine API. Exit codes: 0 success, 1 user error,
//! 2 storage error, 3 cancelled.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use engram::{
    staleness_report, DisclosureLevel, Engram, EngramConfig, EngramError, EngramResult, EventType,
    NewEvent, PackRequest, SearchOptions,
};

/// Engram - persistent agent memory engine
#[derive(Parser)]
#[command(name = "engram")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Journal agent events, curate memories, serve context packs")]
struct Cli {
    /// Memory root directory (holds engram.db)
    #[arg(long, global = true, default_value = ".", env = "ENGRAM_ROOT")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage sessions
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Append one event to the journal
    Ingest {
        /// Event content (reads stdin when omitted)
        content: Option<String>,
        /// Session to append to
        #[arg(long)]
        session: String,
        /// Event type (turn, tool_call, tool_output, error, diff, test_summary)
        #[arg(long = "type", default_value = "turn")]
        event_type: String,
        /// Tool that produced the event
        #[arg(long)]
        tool: Option<String>,
        /// File the event concerns
        #[arg(long)]
        file: Option<String>,
        /// Process exit code
        #[arg(long)]
        exit_code: Option<i32>,
        /// Skip embedding for objects created by an auto-checkpoint
        #[arg(long)]
        skip_embedding: bool,
    },

    /// Run a manual checkpoint
    Checkpoint {
        #[arg(long)]
        session: String,
        /// Why this checkpoint ran
        #[arg(long, default_value = "manual")]
        reason: String,
    },

    /// Search memory objects
    Search {
        query: String,
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Do not reinforce returned objects
        #[arg(long)]
        no_reinforce: bool,
    },

    /// Assemble a context pack
    Pack {
        /// Disclosure level: minimal, task, deep
        #[arg(long, default_value = "minimal")]
        level: String,
        /// Output format: text or json
        #[arg(short = 'f', long, default_value = "text")]
        format: String,
        #[arg(long)]
        session: Option<String>,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        budget: Option<usize>,
    },

    /// Evaluate disclosure escalation signals
    Disclose {
        /// Run the check (the only mode)
        #[arg(long)]
        check: bool,
        #[arg(long)]
        session: String,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        file: Option<String>,
    },

    /// Staleness report
    Check {
        #[arg(long)]
        json: bool,
    },

    /// Mark an object verified
    Verify { id: String },

    /// Retire an object
    Retire { id: String },

    /// Engine statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Start a session
    Start {
        /// Working directory recorded on the session
        #[arg(long, default_value = ".")]
        dir: String,
    },
    /// End a session
    End { id: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: Cli) -> EngramResult<()> {
    let engine = Engram::open(&cli.root, EngramConfig::from_env())?;

    match cli.command {
        Commands::Session { command } => run_session(&engine, command),
        Commands::Ingest {
            content,
            session,
            event_type,
            tool,
            file,
            exit_code,
            skip_embedding: _,
        } => run_ingest(&engine, content, session, event_type, tool, file, exit_code),
        Commands::Checkpoint { session, reason } => run_checkpoint(&engine, &session, &reason),
        Commands::Search {
            query,
            limit,
            no_reinforce,
        } => run_search(&engine, &query, limit, no_reinforce),
        Commands::Pack {
            level,
            format,
            session,
            query,
            file,
            budget,
        } => run_pack(&engine, &level, &format, session, query, file, budget),
        Commands::Disclose {
            check: _,
            session,
            query,
            file,
        } => run_disclose(&engine, &session, query, file),
        Commands::Check { json } => run_check(&engine, json),
        Commands::Verify { id } => {
            let object = engine.verify(&id)?;
            println!("verified {} (tier {})", object.id, object.confidence_tier());
            Ok(())
        }
        Commands::Retire { id } => {
            let object = engine.retire(&id)?;
            println!("retired {}", object.id);
            Ok(())
        }
        Commands::Stats { json } => run_stats(&engine, json),
    }
}

fn run_session(engine: &Engram, command: SessionCommands) -> EngramResult<()> {
    match command {
        SessionCommands::Start { dir } => {
            let session = engine.session_start(&dir)?;
            println!("{}", session.id);
        }
        SessionCommands::End { id } => {
            let session = engine.session_end(&id)?;
            println!(
                "ended {} ({} events, {} objects created)",
                session.id, session.events_count, session.objects_created
            );
        }
    }
    Ok(())
}

fn run_ingest(
    engine: &Engram,
    content: Option<String>,
    session: String,
    event_type: String,
    tool: Option<String>,
    file: Option<String>,
    exit_code: Option<i32>,
) -> EngramResult<()> {
    let content = match content {
        Some(c) => c,
        None => {
            use std::io::Read;
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| EngramError::InvalidInput(format!("reading stdin: {e}")))?;
            buf
        }
    };

    let receipt = engine.ingest(NewEvent {
        session_id: session,
        event_type: parse_event_type(&event_type)?,
        content,
        tool_name: tool,
        file_path: file,
        exit_code,
        ..Default::default()
    })?;

    println!("{}", receipt.event_id);
    if let Some(checkpoint) = receipt.checkpoint {
        eprintln!(
            "checkpoint ({}) created {} memories from {} events",
            checkpoint.trigger.as_deref().unwrap_or("auto"),
            checkpoint.memories_created,
            checkpoint.episode_event_count
        );
    }
    Ok(())
}

fn run_checkpoint(engine: &Engram, session: &str, reason: &str) -> EngramResult<()> {
    let outcome = engine.checkpoint(session, reason)?;
    println!(
        "{} events, {} candidates, {} memories created",
        outcome.episode_event_count, outcome.candidates_extracted, outcome.memories_created
    );
    for held in &outcome.held_for_review {
        println!("held for review: {held}");
    }
    Ok(())
}

fn run_search(engine: &Engram, query: &str, limit: usize, no_reinforce: bool) -> EngramResult<()> {
    let results = engine.search(
        query,
        &SearchOptions {
            limit,
            skip_reinforcement: no_reinforce,
            ..Default::default()
        },
    )?;

    if results.is_empty() {
        println!("no results");
        return Ok(());
    }
    for (object, score) in results {
        println!(
            "{:.3}  [{}] {}  ({})",
            score,
            object.object_type,
            object.content,
            object.id
        );
    }
    Ok(())
}

fn run_pack(
    engine: &Engram,
    level: &str,
    format: &str,
    session: Option<String>,
    query: Option<String>,
    file: Option<String>,
    budget: Option<usize>,
) -> EngramResult<()> {
    let level = DisclosureLevel::parse_name(level)
        .ok_or_else(|| EngramError::InvalidInput(format!("unknown level '{level}'")))?;

    let pack = engine.pack(
        session.as_deref(),
        &PackRequest {
            level,
            query,
            file,
            budget_tokens: budget,
        },
    )?;

    match format {
        "json" => {
            let rendered = serde_json::to_string_pretty(&pack)
                .map_err(|e| EngramError::Storage(e.to_string()))?;
            println!("{rendered}");
        }
        "text" => {
            println!("# context pack ({}, {} tokens)", pack.level, pack.tokens_used);
            for object in &pack.objects {
                println!("- [{}] {}", object.object_type, object.content);
                if pack.level == DisclosureLevel::Deep {
                    if let Some(excerpt) = &object.evidence_excerpt {
                        println!("    evidence: {excerpt}");
                    }
                }
            }
        }
        other => {
            return Err(EngramError::InvalidInput(format!(
                "unknown format '{other}'"
            )));
        }
    }
    Ok(())
}

fn run_disclose(
    engine: &Engram,
    session: &str,
    query: Option<String>,
    file: Option<String>,
) -> EngramResult<()> {
    let check = engine.disclose_check(session, query.as_deref(), file.as_deref())?;
    let rendered =
        serde_json::to_string(&check).map_err(|e| EngramError::Storage(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}

fn run_check(engine: &Engram, json: bool) -> EngramResult<()> {
    let report = staleness_report(engine)?;
    if json {
        let rendered =
            serde_json::to_string_pretty(&report).map_err(|e| EngramError::Storage(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    println!("{} objects need verification", report.needs_verification.len());
    for stale in &report.needs_verification {
        let age = stale
            .days_since_verified
            .map(|d| format!("{d}d ago"))
            .unwrap_or_else(|| "never".to_string());
        println!("  {}  verified {}  {}", stale.id, age, stale.content);
    }
    println!("{} objects archivable", report.archivable.len());
    for stale in &report.archivable {
        println!("  {}  strength {:.2}  {}", stale.id, stale.strength, stale.content);
    }
    Ok(())
}

fn run_stats(engine: &Engram, json: bool) -> EngramResult<()> {
    let stats = engine.stats()?;
    if json {
        let rendered =
            serde_json::to_string_pretty(&stats).map_err(|e| EngramError::Storage(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    println!("events:   {}", stats.store.events);
    println!(
        "objects:  {} active / {} superseded / {} retired",
        stats.store.objects_active, stats.store.objects_superseded, stats.store.objects_retired
    );
    println!("sessions: {}", stats.store.sessions);
    println!("vectors:  {}", stats.store.vectors);
    println!("tokens:   {}", stats.store.tokens);
    println!("db size:  {} bytes", stats.store.db_bytes);
    Ok(())
}

fn parse_event_type(s: &str) -> EngramResult<EventType> {
    match s {
        "turn" | "tool_call" | "tool_output" | "error" | "diff" | "test_summary" => {
            Ok(EventType::parse_name(s))
        }
        other => Err(EngramError::InvalidInput(format!(
            "unknown event type '{other}'"
        ))),
    }
}
