//! Update function: Model + Message -> Commands. No I/O happens here.

use crossterm::event::{KeyCode, KeyEvent};

use crate::persist;
use crate::{nlog, nlog_debug, nlog_warn};

use super::command::Command;
use super::message::Message;
use super::model::{Model, Notification, NotificationLevel};

/// Lines moved per scroll key press.
const SCROLL_STEP: u16 = 5;

fn set_error(model: &mut Model, message: String) {
    nlog_warn!("UI Error: {}", message);
    model.notification = Some(Notification {
        level: NotificationLevel::Error,
        message,
    });
    model.dirty = true;
}

fn set_info(model: &mut Model, message: String) {
    model.notification = Some(Notification {
        level: NotificationLevel::Info,
        message,
    });
    model.dirty = true;
}

pub fn update(model: &mut Model, msg: Message) -> Vec<Command> {
    let mut cmds = Vec::new();

    match msg {
        Message::Key(key) => {
            model.notification = None;
            model.error_trace = None;
            model.dirty = true;
            handle_key(model, key, &mut cmds);
        }

        Message::Resize(_, _) => {
            model.dirty = true;
        }

        Message::RunFinished(result) => {
            nlog!(
                "Message::RunFinished topic={} steps={}",
                result.topic,
                result.steps.len()
            );
            model.running = false;
            model.error_trace = None;
            let notice = match &result.file_write_error {
                Some(err) => Err(format!("Could not save result: {}", err)),
                None => Ok(format!(
                    "Saved to {}",
                    persist::result_path(&model.config.output_dir(), &result.topic).display()
                )),
            };
            model.set_results(*result);
            match notice {
                Ok(info) => set_info(model, info),
                Err(err) => set_error(model, err),
            }
        }

        Message::RunFailed { message, trace } => {
            model.running = false;
            model.error_trace = Some(trace);
            set_error(model, message);
        }
    }

    cmds
}

fn handle_key(model: &mut Model, key: KeyEvent, cmds: &mut Vec<Command>) {
    let section_count = model.sections().len();

    match key.code {
        KeyCode::Char('r') => {
            if model.running {
                set_info(model, "A run is already in progress".to_string());
            } else {
                let config = model.run_config();
                nlog_debug!("Run requested topic={}", config.topic);
                model.running = true;
                cmds.push(Command::RunPipeline {
                    config: Box::new(config),
                });
            }
        }

        KeyCode::Char('t') => {
            if model.running {
                set_info(model, "Topic is locked while the crew runs".to_string());
            } else if model.topics.len() > 1 {
                model.topic_index = (model.topic_index + 1) % model.topics.len();
            }
        }

        KeyCode::Char('j') | KeyCode::Down => {
            model.selected = (model.selected + 1) % section_count;
            model.scroll = 0;
        }

        KeyCode::Char('k') | KeyCode::Up => {
            model.selected = model
                .selected
                .checked_sub(1)
                .unwrap_or(section_count - 1);
            model.scroll = 0;
        }

        KeyCode::Char('g') | KeyCode::Home => {
            model.selected = 0;
            model.scroll = 0;
        }

        KeyCode::Char('J') | KeyCode::PageDown => {
            model.scroll = model.scroll.saturating_add(SCROLL_STEP);
        }

        KeyCode::Char('K') | KeyCode::PageUp => {
            model.scroll = model.scroll.saturating_sub(SCROLL_STEP);
        }

        KeyCode::Char('?') => {
            model.show_keymap = !model.show_keymap;
        }

        KeyCode::Char('q') | KeyCode::Esc => {
            cmds.push(Command::Quit);
        }

        _ => {}
    }
}
