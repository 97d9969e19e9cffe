use std::io::{self, stdout, Stdout};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, TryRecvError};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::{backend::CrosstermBackend, Terminal};

use newsdesk::app::LogicThread;
use newsdesk::config::{self, Config};
use newsdesk::engine::CrewRequest;
use newsdesk::pipeline::{MergedResult, Pipeline};
use newsdesk::render::RenderState;
use newsdesk::{engine, persist, ui, nlog, nlog_warn, Result};

const FRAME_DURATION: Duration = Duration::from_micros(16_666); // 60fps

/// Newsdesk - multi-agent news portal for one topic and its sub-topics
#[derive(Parser, Debug)]
#[command(name = "newsdesk")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    NEWSDESK_DEBUG=1   Enable debug logging (alternative to --debug)\n    NEWSDESK_LOG       Log level: error, warn, info, debug or trace\n    SERPER_API_KEY     News search provider key (read by the engine)\n    OPENAI_API_KEY     Model provider key (read by the engine)"
)]
pub struct Cli {
    /// Enable debug logging (writes to ~/.newsdesk/newsdesk.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Config file (default: ./newsdesk.toml, then ~/.newsdesk/newsdesk.toml)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the crew once without the dashboard
    Run {
        /// Print the merged result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Open the dashboard on a saved result
    Show {
        /// Result file (default: the configured topic's output file)
        path: Option<PathBuf>,
    },
    /// Print the crew request sent to the engine
    Manifest,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    newsdesk::log::init_with_debug(cli.debug);
    if cli.debug {
        nlog!("Newsdesk starting (debug mode enabled)");
    } else {
        nlog!("Newsdesk starting");
    }

    config::load_dotenv();
    let config = Config::load(cli.config.as_deref())?;
    config.ensure_dirs()?;

    let missing = config::missing_provider_keys();
    if !missing.is_empty() {
        nlog_warn!("Missing provider keys: {}", missing.join(", "));
    }

    match cli.command {
        Some(Command::Run { json }) => run_headless(config, json),
        Some(Command::Show { path }) => {
            let path = path
                .unwrap_or_else(|| persist::result_path(&config.output_dir(), &config.topic));
            let result = persist::load_result(&path)?;
            run_dashboard(config, Some(result))
        }
        Some(Command::Manifest) => print_manifest(config),
        None => run_dashboard(config, None),
    }
}

fn run_headless(config: Config, json: bool) -> Result<()> {
    let engine = engine::from_config(&config.engine)?;
    let pipeline = Pipeline::new(config, Arc::from(engine));
    if !json {
        println!("Running crew for \"{}\"...", pipeline.config().topic);
    }

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(pipeline.run())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result, &pipeline.output_path());
    }
    Ok(())
}

fn print_summary(result: &MergedResult, path: &Path) {
    let view = result.view();
    println!();
    println!("  Topic:        {}", result.topic);
    println!(
        "  Steps:        {} ({} parsed)",
        result.steps.len(),
        result.parsed_steps()
    );
    println!("  Sub-topics:   {}", view.subtopics.len());
    println!("  Top news:     {}", view.home.best_articles.len());
    println!(
        "  Editorial:    {}",
        if view.home.main_editorial.is_some() {
            "yes"
        } else {
            "none"
        }
    );
    match &result.file_write_error {
        Some(err) => println!("  Not saved:    {}", err),
        None => println!("  Saved to:     {}", path.display()),
    }
}

fn print_manifest(config: Config) -> Result<()> {
    match engine::from_config(&config.engine) {
        Ok(engine) => println!("# engine: {}", engine.describe()),
        Err(e) => println!("# engine: {}", e),
    }
    let request = CrewRequest::for_config(&config);
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

fn run_dashboard(config: Config, initial: Option<MergedResult>) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let (state_tx, state_rx) = crossbeam_channel::bounded::<RenderState>(1);

    let shutdown_clone = shutdown.clone();
    let logic_handle =
        thread::spawn(move || LogicThread::run(config, state_tx, shutdown_clone, initial));

    let mut terminal = setup_terminal()?;
    let result = render_loop(&mut terminal, state_rx, &shutdown);

    shutdown.store(true, Ordering::SeqCst);
    let logic_result = logic_handle.join();
    restore_terminal(&mut terminal)?;
    if let Ok(Err(e)) = logic_result {
        return Err(e);
    }
    result
}

fn render_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state_rx: Receiver<RenderState>,
    shutdown: &AtomicBool,
) -> Result<()> {
    let mut state = RenderState::default();
    let mut last_version: u64 = 0;
    let mut last_frame = Instant::now();
    let mut dirty = true;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match state_rx.try_recv() {
            Ok(s) => {
                dirty = dirty || s.version != last_version;
                state = s;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }

        if last_frame.elapsed() < FRAME_DURATION {
            thread::sleep(Duration::from_micros(500));
            continue;
        }
        last_frame = Instant::now();

        if dirty {
            terminal.draw(|f| ui::draw(f, &state))?;
            last_version = state.version;
            dirty = false;
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.hide_cursor()?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(disable_raw_mode()?)
}
