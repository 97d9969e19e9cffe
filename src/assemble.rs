//! Selection and reconstruction of the portal's display structure.
//!
//! The late-stage tasks are expected to emit `{"final": {...}}`. When
//! none does, a minimal view is rebuilt from the per-subtopic pick and
//! edit records so the dashboard still has something to show.

use serde_json::{json, Map, Value};

use crate::crew::StepLayout;
use crate::normalize::StepRecord;

/// Most articles kept per subtopic, and most entries on the home page.
pub const MAX_ARTICLES: usize = 5;

/// `final` from the first designated late-stage step that carries a
/// non-empty one, else the reconstructed fallback view.
pub fn resolve_final(
    steps: &[StepRecord],
    layout: &StepLayout,
    topic: &str,
    subtopics: &[String],
) -> Value {
    layout
        .final_steps
        .iter()
        .filter_map(|&n| step(steps, n).get("final"))
        .find(|v| is_truthy(v))
        .cloned()
        .unwrap_or_else(|| minimal_final_fallback(steps, layout, topic, subtopics))
}

/// Rebuild a display view by pairing pick and edit records positionally.
pub fn minimal_final_fallback(
    steps: &[StepRecord],
    layout: &StepLayout,
    topic: &str,
    subtopics: &[String],
) -> Value {
    let mut per_subtopic = Map::new();
    let mut best_articles = Vec::new();

    for (i, sub) in subtopics.iter().enumerate() {
        let pick = layout.pick_steps.get(i).map(|&n| step(steps, n));
        let edit = layout.edit_steps.get(i).map(|&n| step(steps, n));

        let summaries: &[Value] = edit
            .and_then(|r| r.get("summaries"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let articles: Vec<Value> = pick
            .and_then(|r| r.get("articles"))
            .and_then(Value::as_array)
            .map(|list| {
                // Summaries pair by position in the picked list, skipped entries included.
                list.iter()
                    .enumerate()
                    .filter_map(|(j, article)| article.as_object().map(|a| (j, a)))
                    .map(|(j, article)| {
                        let mut article = article.clone();
                        let summary = summaries.get(j).cloned().unwrap_or(Value::Null);
                        article.insert("summary".to_string(), summary);
                        Value::Object(article)
                    })
                    .take(MAX_ARTICLES)
                    .collect()
            })
            .unwrap_or_default();

        let editorial = edit
            .and_then(|r| r.get("editorial"))
            .cloned()
            .unwrap_or(Value::Null);

        let best = articles.first().cloned();
        if let Some(Value::Object(mut tagged)) = best.clone() {
            if best_articles.len() < MAX_ARTICLES {
                tagged.insert("subtopic".to_string(), Value::String(sub.clone()));
                best_articles.push(Value::Object(tagged));
            }
        }

        per_subtopic.insert(
            sub.clone(),
            json!({
                "articles": articles,
                "editorial": editorial,
                "best_article": best.unwrap_or(Value::Null),
            }),
        );
    }

    json!({
        "topic": topic,
        "subtopics": subtopics,
        "per_subtopic": per_subtopic,
        "home": {
            "best_articles": best_articles,
            "main_editorial": Value::Null,
        },
    })
}

/// Record at 1-based step `n`; missing steps read as empty.
fn step(steps: &[StepRecord], n: usize) -> &StepRecord {
    const MISSING: &StepRecord = &StepRecord::Empty;
    n.checked_sub(1).and_then(|i| steps.get(i)).unwrap_or(MISSING)
}

/// JSON truthiness: null, false, zero, and empty strings/arrays/objects are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// -----------------------------------------------------------------------------
// Lenient typed view for rendering
// -----------------------------------------------------------------------------

/// An article or editorial card. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleView {
    pub title: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub published_date: Option<String>,
    pub summary: Option<String>,
    pub subtopic: Option<String>,
}

impl ArticleView {
    /// Objects map field by field; a bare string becomes a summary-only card.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(obj) => {
                let text = |key: &str| obj.get(key).and_then(text_of);
                Some(Self {
                    title: text("title"),
                    url: text("url").or_else(|| text("link")),
                    source: text("source"),
                    published_date: text("published_date").or_else(|| text("date")),
                    summary: text("summary"),
                    subtopic: text("subtopic"),
                })
            }
            Value::String(s) if !s.is_empty() => Some(Self {
                summary: Some(s.clone()),
                ..Self::default()
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtopicView {
    pub best_article: Option<ArticleView>,
    pub candidates: Vec<ArticleView>,
    pub editorial: Option<ArticleView>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeView {
    pub best_articles: Vec<ArticleView>,
    pub main_editorial: Option<ArticleView>,
}

/// What the dashboard renders, read leniently out of `final`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalView {
    pub subtopics: Vec<String>,
    pub per_subtopic: Vec<(String, SubtopicView)>,
    pub home: HomeView,
}

impl FinalView {
    pub fn from_value(value: &Value) -> Self {
        let subtopics: Vec<String> = value
            .get("subtopics")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(text_of).collect())
            .unwrap_or_default();

        let per = value.get("per_subtopic").and_then(Value::as_object);
        let per_subtopic = subtopics
            .iter()
            .map(|sub| {
                let view = per
                    .and_then(|p| p.get(sub))
                    .map(SubtopicView::from_value)
                    .unwrap_or_default();
                (sub.clone(), view)
            })
            .collect();

        let home = value.get("home");
        let home = HomeView {
            best_articles: home
                .and_then(|h| h.get("best_articles"))
                .map(article_list)
                .unwrap_or_default(),
            main_editorial: home
                .and_then(|h| first_present(h, &["main_editorial", "best_editorial"]))
                .and_then(ArticleView::from_value),
        };

        Self {
            subtopics,
            per_subtopic,
            home,
        }
    }

    pub fn subtopic(&self, name: &str) -> Option<&SubtopicView> {
        self.per_subtopic
            .iter()
            .find(|(sub, _)| sub == name)
            .map(|(_, view)| view)
    }
}

impl SubtopicView {
    fn from_value(value: &Value) -> Self {
        let candidates = first_present(value, &["candidates", "articles"])
            .map(article_list)
            .unwrap_or_default();

        let editorial = value
            .get("editorial_candidates")
            .and_then(Value::as_array)
            .and_then(|list| list.iter().find_map(ArticleView::from_value))
            .or_else(|| value.get("editorial").and_then(ArticleView::from_value));

        Self {
            best_article: value.get("best_article").and_then(ArticleView::from_value),
            candidates,
            editorial,
        }
    }
}

fn first_present<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .find(|v| is_truthy(v))
}

fn article_list(value: &Value) -> Vec<ArticleView> {
    value
        .as_array()
        .map(|list| list.iter().filter_map(ArticleView::from_value).collect())
        .unwrap_or_default()
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
