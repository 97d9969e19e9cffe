//! Terminal UI rendering for the newsdesk dashboard.
//!
//! Layout: a header line (title and topic selector), a separator, a
//! two-pane body (sections on the left, the selected page on the right,
//! split 1:3) and a one-line status bar.
//!
//! This module renders from RenderState (immutable snapshot) and never
//! mutates application state.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};

use crate::assemble::{ArticleView, HomeView, SubtopicView};
use crate::render::{Page, RenderState};
use crate::tea::{Notification, NotificationLevel};
use crate::util::truncate;

// Color tokens (selection uses REVERSED modifier to adapt to terminal theme)
const COLOR_TEXT_DIMMED: Color = Color::Gray;
const COLOR_TEXT_MUTED: Color = Color::DarkGray;
const COLOR_SEPARATOR: Color = Color::White;
const COLOR_HEADING: Color = Color::Cyan;
const COLOR_LINK: Color = Color::Blue;
const COLOR_RUNNING: Color = Color::Yellow;
const COLOR_TRACE: Color = Color::Red;

const TITLE: &str = "AI News Portal";

// -----------------------------------------------------------------------------
// Context-sensitive keymap
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeymapContext {
    /// A crew run is in flight: navigation only.
    Running,
    Idle { has_results: bool, can_switch_topic: bool },
}

impl KeymapContext {
    pub fn from_render_state(state: &RenderState) -> Self {
        if state.running {
            KeymapContext::Running
        } else {
            KeymapContext::Idle {
                has_results: state.page != Page::Empty,
                can_switch_topic: state.topic_count > 1,
            }
        }
    }
}

struct Keybinding(&'static str, &'static str);

/// Keybindings shown together, groups separated by │.
struct KeybindingGroup(Vec<Keybinding>);

fn keybindings_for_context(ctx: KeymapContext) -> Vec<KeybindingGroup> {
    let navigation = KeybindingGroup(vec![
        Keybinding("j/k", "section"),
        Keybinding("J/K", "scroll"),
    ]);
    let quit = KeybindingGroup(vec![Keybinding("q", "quit")]);

    match ctx {
        KeymapContext::Running => vec![navigation, quit],
        KeymapContext::Idle {
            has_results,
            can_switch_topic,
        } => {
            let mut actions = vec![Keybinding("r", "run")];
            if can_switch_topic {
                actions.push(Keybinding("t", "topic"));
            }
            let mut groups = vec![KeybindingGroup(actions)];
            if has_results {
                groups.push(navigation);
            }
            groups.push(quit);
            groups
        }
    }
}

/// Entry point for all drawing.
pub fn draw(frame: &mut Frame, state: &RenderState) {
    let area = frame.area();

    if area.height < 4 {
        render_header(frame, state, area);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    render_header(frame, state, chunks[0]);
    render_separator(frame, chunks[1]);
    render_body(frame, state, chunks[2]);
    render_statusbar(frame, state, chunks[3]);

    if let Some(ref notification) = state.notification {
        render_notification(frame, notification, area);
    }
}

fn render_header(frame: &mut Frame, state: &RenderState, area: Rect) {
    let mut spans = vec![
        Span::styled(TITLE, Style::default().add_modifier(Modifier::BOLD)),
        Span::styled("  │  ", Style::default().fg(COLOR_TEXT_MUTED)),
        Span::styled("Topic: ", Style::default().fg(COLOR_TEXT_DIMMED)),
        Span::raw(state.topic.clone()),
    ];
    if state.topic_count > 1 {
        spans.push(Span::styled(
            format!("  ({} topics, t to switch)", state.topic_count),
            Style::default().fg(COLOR_TEXT_MUTED),
        ));
    }
    if state.running {
        spans.push(Span::styled(
            "  Running crew agents...",
            Style::default().fg(COLOR_RUNNING),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_separator(frame: &mut Frame, area: Rect) {
    let solid = "─".repeat(area.width as usize);
    let line = Line::from(Span::styled(solid, Style::default().fg(COLOR_SEPARATOR)));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_body(frame: &mut Frame, state: &RenderState, area: Rect) {
    let panes = Layout::horizontal([Constraint::Ratio(1, 4), Constraint::Ratio(3, 4)]).split(area);
    render_sections(frame, state, panes[0]);

    let content = Rect {
        x: panes[1].x.saturating_add(1),
        width: panes[1].width.saturating_sub(1),
        ..panes[1]
    };
    let lines = content_lines(state);
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((state.scroll, 0));
    frame.render_widget(paragraph, content);
}

/// Left pane: Home plus one entry per subtopic.
fn render_sections(frame: &mut Frame, state: &RenderState, area: Rect) {
    let width = area.width.saturating_sub(1) as usize;
    let mut lines = vec![Line::from(Span::styled(
        "Sections",
        Style::default()
            .fg(COLOR_TEXT_DIMMED)
            .add_modifier(Modifier::BOLD),
    ))];

    lines.extend(state.sections.iter().enumerate().map(|(idx, label)| {
        let style = if idx == state.selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        Line::from(Span::styled(
            format!("{:<width$}", truncate(label, width), width = width),
            style,
        ))
    }));

    lines.push(Line::raw(""));
    let caption = if state.write_error.is_some() {
        "Result not saved."
    } else {
        "Results are saved to the output dir as JSON."
    };
    lines.push(Line::from(Span::styled(
        caption,
        Style::default().fg(COLOR_TEXT_MUTED),
    )));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

/// Right pane content for the current page.
pub fn content_lines(state: &RenderState) -> Vec<Line<'static>> {
    if let Some(trace) = &state.error_trace {
        let mut lines = vec![heading("Run failed")];
        lines.extend(
            trace
                .lines()
                .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(COLOR_TRACE)))),
        );
        lines.push(Line::raw(""));
        lines.push(muted("Previous results are unchanged. Press any key to dismiss."));
        return lines;
    }

    match &state.page {
        Page::Empty if state.running => vec![muted("The crew is working. This can take several minutes.")],
        Page::Empty => vec![muted("Pick a topic and press r to populate the portal.")],
        Page::Home(home) => home_lines(home),
        Page::Subtopic { name, view } => subtopic_lines(name, view),
    }
}

fn home_lines(home: &HomeView) -> Vec<Line<'static>> {
    let mut lines = vec![heading("Home: Best Articles & Editorial"), Line::raw("")];

    lines.push(subheading("Top News (per sub-topic)"));
    if home.best_articles.is_empty() {
        lines.push(muted("No articles were picked."));
    }
    for article in &home.best_articles {
        lines.extend(card(article));
    }

    lines.push(Line::raw(""));
    lines.push(subheading("Best Editorial (overall)"));
    match &home.main_editorial {
        Some(editorial) => lines.extend(card(editorial)),
        None => lines.push(muted("No editorial selected yet.")),
    }
    lines
}

fn subtopic_lines(name: &str, view: &SubtopicView) -> Vec<Line<'static>> {
    let mut lines = vec![heading(name), Line::raw("")];

    lines.push(subheading("Best Article"));
    match &view.best_article {
        Some(article) => lines.extend(card(article)),
        None => lines.push(muted("No best article chosen for this sub-topic.")),
    }

    lines.push(Line::raw(""));
    lines.push(subheading("Candidates"));
    if view.candidates.is_empty() {
        lines.push(muted("No candidates."));
    }
    for article in &view.candidates {
        lines.extend(card(article));
    }

    lines.push(Line::raw(""));
    lines.push(subheading("Editorial Candidate"));
    match &view.editorial {
        Some(editorial) => lines.extend(card(editorial)),
        None => lines.push(muted("No editorial candidate for this sub-topic.")),
    }
    lines
}

/// One article: title, link, "source | date", and the summary if any.
fn card(article: &ArticleView) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(5);

    if article.title.is_some() || article.summary.is_none() {
        let title = article.title.clone().unwrap_or_else(|| "(title)".to_string());
        let mut spans = vec![
            Span::styled("▌ ", Style::default().fg(COLOR_TEXT_MUTED)),
            Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        ];
        if let Some(sub) = &article.subtopic {
            spans.push(Span::styled(
                format!("  [{sub}]"),
                Style::default().fg(COLOR_TEXT_DIMMED),
            ));
        }
        lines.push(Line::from(spans));

        if let Some(url) = &article.url {
            lines.push(Line::from(vec![
                Span::styled("▌ ", Style::default().fg(COLOR_TEXT_MUTED)),
                Span::styled(
                    url.clone(),
                    Style::default()
                        .fg(COLOR_LINK)
                        .add_modifier(Modifier::UNDERLINED),
                ),
            ]));
        }

        let source = article.source.clone().unwrap_or_else(|| "?".to_string());
        let date = article.published_date.clone().unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled("▌ ", Style::default().fg(COLOR_TEXT_MUTED)),
            Span::styled(
                format!("{source}  |  {date}"),
                Style::default()
                    .fg(COLOR_TEXT_DIMMED)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    if let Some(summary) = &article.summary {
        lines.push(Line::from(vec![
            Span::styled("▌ ", Style::default().fg(COLOR_TEXT_MUTED)),
            Span::raw(summary.clone()),
        ]));
    }

    lines.push(Line::raw(""));
    lines
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(COLOR_HEADING)
            .add_modifier(Modifier::BOLD),
    ))
}

fn subheading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn muted(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(COLOR_TEXT_DIMMED),
    ))
}

/// Bottom line: "?" alone, or "? │ <keymap>" when expanded.
fn render_statusbar(frame: &mut Frame, state: &RenderState, area: Rect) {
    let ctx = KeymapContext::from_render_state(state);
    let groups = keybindings_for_context(ctx);

    let key_style = Style::default().fg(COLOR_TEXT_DIMMED);
    let desc_style = Style::default().fg(COLOR_TEXT_MUTED);
    let sep_style = Style::default().fg(COLOR_TEXT_MUTED);

    let help_style = if state.show_keymap {
        Style::default()
    } else {
        Style::default().fg(COLOR_TEXT_MUTED)
    };
    let mut spans: Vec<Span> = vec![Span::styled("?", help_style)];

    if state.show_keymap {
        for group in groups.iter().filter(|g| !g.0.is_empty()) {
            spans.push(Span::styled(" │ ", sep_style));
            for (key_idx, keybinding) in group.0.iter().enumerate() {
                if key_idx > 0 {
                    spans.push(Span::styled(" • ", sep_style));
                }
                spans.push(Span::styled(keybinding.0, key_style));
                spans.push(Span::styled(format!(" {}", keybinding.1), desc_style));
            }
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Single-line notification over the status bar.
fn render_notification(frame: &mut Frame, notification: &Notification, area: Rect) {
    let notification_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    frame.render_widget(Clear, notification_area);

    let line = match notification.level {
        NotificationLevel::Error => Line::from(vec![
            Span::styled(
                "Error: ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                notification.message.clone(),
                Style::default().fg(Color::Red),
            ),
        ]),
        NotificationLevel::Info => Line::from(Span::styled(
            notification.message.clone(),
            Style::default().fg(Color::Green),
        )),
    };

    frame.render_widget(Paragraph::new(line), notification_area);
}
