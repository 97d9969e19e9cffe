use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use crossterm::event::{self, Event, KeyEventKind};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::engine;
use crate::pipeline::{MergedResult, Pipeline};
use crate::render::RenderState;
use crate::tea::{update, Command, Message, Model};
use crate::{nlog, nlog_debug, nlog_error, Result};

const MAX_BG_MESSAGES: usize = 50;

pub struct LogicThread;

impl LogicThread {
    pub fn run(
        config: Config,
        state_tx: Sender<RenderState>,
        shutdown: Arc<AtomicBool>,
        initial: Option<MergedResult>,
    ) -> Result<()> {
        Runtime::new()?.block_on(Self::run_async(config, state_tx, shutdown, initial))
    }

    async fn run_async(
        config: Config,
        state_tx: Sender<RenderState>,
        shutdown: Arc<AtomicBool>,
        initial: Option<MergedResult>,
    ) -> Result<()> {
        nlog_debug!(
            "LogicThread::run_async topic={} engine={}",
            config.topic,
            config.engine.effective_command()
        );
        let mut model = Model::new(config);
        if let Some(results) = initial {
            model = model.with_results(results);
        }

        let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<Message>();

        send_state(&state_tx, &model);

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            // Terminal input (priority)
            while event::poll(Duration::ZERO)? {
                let msg = match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => Message::Key(key),
                    Event::Resize(w, h) => Message::Resize(w, h),
                    _ => continue,
                };

                for cmd in update(&mut model, msg) {
                    if execute_command(cmd, &msg_tx) {
                        shutdown.store(true, Ordering::Relaxed);
                        return Ok(());
                    }
                }

                if model.dirty {
                    send_state(&state_tx, &model);
                    model.dirty = false;
                }
            }

            // Background messages (bounded)
            for _ in 0..MAX_BG_MESSAGES {
                let Ok(msg) = msg_rx.try_recv() else { break };
                for cmd in update(&mut model, msg) {
                    if execute_command(cmd, &msg_tx) {
                        shutdown.store(true, Ordering::Relaxed);
                        return Ok(());
                    }
                }
            }

            if model.dirty {
                send_state(&state_tx, &model);
                model.dirty = false;
            }

            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        Ok(())
    }
}

/// Returns true when the app should quit.
fn execute_command(cmd: Command, msg_tx: &mpsc::UnboundedSender<Message>) -> bool {
    match cmd {
        Command::RunPipeline { config } => {
            nlog!("Command::RunPipeline topic={}", config.topic);
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let msg = match run_pipeline(*config).await {
                    Ok(result) => Message::RunFinished(Box::new(result)),
                    Err(e) => {
                        nlog_error!("Crew run failed: {}", e);
                        Message::RunFailed {
                            message: e.to_string(),
                            trace: e.trace(),
                        }
                    }
                };
                let _ = tx.send(msg);
            });
            false
        }

        Command::Quit => {
            nlog_debug!("Command::Quit");
            true
        }
    }
}

async fn run_pipeline(config: Config) -> Result<MergedResult> {
    let engine = engine::from_config(&config.engine)?;
    Pipeline::new(config, Arc::from(engine)).run().await
}

fn send_state(state_tx: &Sender<RenderState>, model: &Model) {
    let _ = state_tx.try_send(model.snapshot());
}
