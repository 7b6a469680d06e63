// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Result rendering: projects an `AnalysisResult` into category cards and
//! statistics, then formats them as text or HTML.
//!
//! The only state here is which categories are expanded. Toggling it never
//! touches the result or the session.

use chrono::{DateTime, Utc};
use minijinja::{context, Environment};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;

use crate::model::{AnalysisResult, ArticleSummary};
use crate::Result;

/// Visual treatment of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryToken {
    pub icon: &'static str,
    pub color: &'static str,
    /// Hex accent used by the HTML report
    pub accent: &'static str,
}

pub const DEFAULT_TOKEN: CategoryToken = CategoryToken {
    icon: "newspaper",
    color: "brand",
    accent: "#4285f4",
};

const CATEGORY_TOKENS: &[(&str, CategoryToken)] = &[
    ("Politics", CategoryToken { icon: "newspaper", color: "red", accent: "#ef4444" }),
    ("Sports", CategoryToken { icon: "trending-up", color: "emerald", accent: "#10b981" }),
    ("Business", CategoryToken { icon: "briefcase", color: "amber", accent: "#f59e0b" }),
    ("Technology", CategoryToken { icon: "cpu", color: "blue", accent: "#3b82f6" }),
    ("Entertainment", CategoryToken { icon: "film", color: "pink", accent: "#ec4899" }),
    ("Health", CategoryToken { icon: "heart", color: "teal", accent: "#14b8a6" }),
    ("Science", CategoryToken { icon: "microscope", color: "purple", accent: "#a855f7" }),
    ("World News", CategoryToken { icon: "globe", color: "sky", accent: "#0ea5e9" }),
    ("World", CategoryToken { icon: "globe", color: "sky", accent: "#0ea5e9" }),
];

/// Token for a category name; unknown names get [`DEFAULT_TOKEN`]
pub fn token_for(category: &str) -> CategoryToken {
    CATEGORY_TOKENS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, token)| *token)
        .unwrap_or(DEFAULT_TOKEN)
}

fn percent(confidence: f64) -> u8 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleView {
    pub title: Option<String>,
    pub text: Option<String>,
    pub confidence_percent: Option<u8>,
}

impl From<&ArticleSummary> for ArticleView {
    fn from(article: &ArticleSummary) -> Self {
        match article {
            ArticleSummary::Blurb(text) => Self {
                title: None,
                text: Some(text.clone()),
                confidence_percent: None,
            },
            ArticleSummary::Structured(record) => Self {
                title: record.title.clone(),
                text: record.summary.clone(),
                // A zero confidence is not worth a bar
                confidence_percent: record.confidence.filter(|c| *c > 0.0).map(percent),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView {
    pub name: String,
    pub token: CategoryToken,
    pub article_count: usize,
    pub summary: String,
    pub confidence_percent: Option<u8>,
    pub expanded: bool,
    pub articles: Vec<ArticleView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsView {
    pub files: u64,
    pub articles: u64,
    /// e.g. `2.3s`
    pub time: String,
    /// Upper-cased language code
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub category_count: usize,
    pub categories: Vec<CategoryView>,
    pub statistics: StatisticsView,
}

/// Projects results and remembers which category cards are expanded
#[derive(Debug, Default, Clone)]
pub struct ResultRenderer {
    expanded: HashSet<String>,
}

impl ResultRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a category's expanded flag and return the new value
    pub fn toggle(&mut self, category: &str) -> bool {
        if self.expanded.remove(category) {
            false
        } else {
            self.expanded.insert(category.to_string());
            true
        }
    }

    pub fn expand_all(&mut self, result: &AnalysisResult) {
        self.expanded
            .extend(result.categories.iter().map(|c| c.name.clone()));
    }

    pub fn is_expanded(&self, category: &str) -> bool {
        self.expanded.contains(category)
    }

    pub fn project(&self, result: &AnalysisResult) -> ResultView {
        let categories = result
            .categories
            .iter()
            .map(|category| CategoryView {
                name: category.name.clone(),
                token: token_for(&category.name),
                article_count: category.result.articles.len(),
                summary: category.result.summary.clone(),
                confidence_percent: category.result.confidence.map(percent),
                expanded: self.is_expanded(&category.name),
                articles: category.result.articles.iter().map(ArticleView::from).collect(),
            })
            .collect::<Vec<_>>();

        let meta = &result.metadata;
        ResultView {
            category_count: categories.len(),
            categories,
            statistics: StatisticsView {
                files: meta.files_processed,
                articles: meta.total_articles,
                time: format!("{}s", meta.processing_time_seconds),
                language: meta.language_code.to_uppercase(),
            },
        }
    }
}

/// `[##########----------]  50%`
fn bar(percent: u8, width: usize) -> String {
    let filled = (percent as usize * width + 50) / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent
    )
}

/// Plain-text report for the terminal
pub fn render_text(view: &ResultView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Analysis Complete - {} Categories", view.category_count);
    let _ = writeln!(out);

    for card in &view.categories {
        let _ = writeln!(
            out,
            "{} {}  ({} articles) [{}/{}]",
            if card.expanded { "▾" } else { "▸" },
            card.name,
            card.article_count,
            card.token.icon,
            card.token.color
        );
        if let Some(p) = card.confidence_percent {
            let _ = writeln!(out, "  confidence {}", bar(p, 20));
        }
        if !card.summary.is_empty() {
            let _ = writeln!(out, "  {}", card.summary);
        }

        if card.expanded && !card.articles.is_empty() {
            let _ = writeln!(out, "  Articles:");
            for article in &card.articles {
                match (&article.title, &article.text) {
                    (Some(title), Some(text)) => {
                        let _ = writeln!(out, "    - {}: {}", title, text);
                    }
                    (Some(only), None) | (None, Some(only)) => {
                        let _ = writeln!(out, "    - {}", only);
                    }
                    (None, None) => {
                        let _ = writeln!(out, "    -");
                    }
                }
                if let Some(p) = article.confidence_percent {
                    let _ = writeln!(out, "      {}", bar(p, 10));
                }
            }
        }
        let _ = writeln!(out);
    }

    let stats = &view.statistics;
    let _ = writeln!(out, "Processing Statistics");
    let _ = writeln!(
        out,
        "  Files: {}  Articles: {}  Time: {}  Language: {}",
        stats.files, stats.articles, stats.time, stats.language
    );

    out
}

const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>NewsClassify report</title>
<style>
body { font-family: system-ui, sans-serif; background: #0f1115; color: #e6e6e6; max-width: 960px; margin: 2rem auto; }
.card { background: #181b22; border-radius: 8px; padding: 1rem 1.25rem; margin-bottom: 1rem; border-top: 3px solid var(--accent); }
.bar { height: 4px; background: #2a2f3a; border-radius: 2px; }
.bar > div { height: 100%; background: var(--accent); border-radius: 2px; }
.muted { color: #9aa0aa; font-size: 0.85rem; }
.stats { display: grid; grid-template-columns: repeat(4, 1fr); gap: 0.75rem; }
.stats div { background: #181b22; padding: 0.75rem; text-align: center; border-radius: 6px; }
</style>
</head>
<body>
<h1>Analysis Complete <small class="muted">{{ report.category_count }} Categories</small></h1>
{% for card in report.categories %}
<section class="card" style="--accent: {{ card.token.accent }}">
  <h2 data-icon="{{ card.token.icon }}">{{ card.name }} <small class="muted">{{ card.article_count }} articles</small></h2>
  {% if card.confidence_percent is not none %}
  <div class="bar"><div style="width: {{ card.confidence_percent }}%"></div></div>
  <p class="muted">{{ card.confidence_percent }}% confidence</p>
  {% endif %}
  {% if card.summary %}<p>{{ card.summary }}</p>{% endif %}
  {% if card.articles %}
  <details{% if card.expanded %} open{% endif %}>
    <summary>Articles</summary>
    <ul>
    {% for article in card.articles %}
      <li>
        {% if article.title %}<strong>{{ article.title }}</strong><br>{% endif %}
        {% if article.text %}{{ article.text }}{% endif %}
        {% if article.confidence_percent is not none %}<span class="muted">({{ article.confidence_percent }}%)</span>{% endif %}
      </li>
    {% endfor %}
    </ul>
  </details>
  {% endif %}
</section>
{% endfor %}
<h2>Processing Statistics</h2>
<div class="stats">
  <div><div class="muted">Files</div>{{ report.statistics.files }}</div>
  <div><div class="muted">Articles</div>{{ report.statistics.articles }}</div>
  <div><div class="muted">Time</div>{{ report.statistics.time }}</div>
  <div><div class="muted">Language</div>{{ report.statistics.language }}</div>
</div>
<p class="muted">Generated {{ generated_at }}</p>
</body>
</html>
"#;

/// Standalone HTML report
pub fn render_html(view: &ResultView, generated_at: DateTime<Utc>) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("report.html", REPORT_TEMPLATE)?;
    let template = env.get_template("report.html")?;
    let html = template.render(context! {
        report => view,
        generated_at => generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
    })?;
    Ok(html)
}
