// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Data model shared by intake, session, renderer and the HTTP client
//!
//! Payloads coming back from the classification service are resolved into
//! typed variants here, once, so the rest of the crate never re-inspects raw
//! JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::language::LanguageCode;

/// Broad class of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Document,
    Video,
    Audio,
    Text,
}

impl FileKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Document => "PDF",
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::Text => "Text",
        }
    }
}

/// A file accepted by intake
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub kind: FileKind,
    /// MIME type sent with the upload part
    pub mime: String,
}

impl SelectedFile {
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / 1024.0 / 1024.0
    }
}

/// Non-empty, ordered set of files. Only intake builds one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FileBatch {
    files: Vec<SelectedFile>,
}

impl FileBatch {
    pub(crate) fn new(files: Vec<SelectedFile>) -> Option<Self> {
        if files.is_empty() {
            None
        } else {
            Some(Self { files })
        }
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectedFile> {
        self.files.iter()
    }
}

/// Everything needed for one classification call, captured at submit time
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub files: FileBatch,
    pub language: LanguageCode,
    pub auth_token: Option<String>,
}

/// Structured article record
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ArticleRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Keys this client does not know about, such as `url`
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One article inside a category: either a bare blurb or a structured record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArticleSummary {
    Blurb(String),
    Structured(ArticleRecord),
}

impl ArticleSummary {
    /// `None` for entries with no content at all (null, booleans)
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null | Value::Bool(_) => None,
            Value::String(text) => Some(Self::Blurb(text)),
            Value::Object(mut map) => {
                let title = take_if(&mut map, "title", |v| v.as_str().map(String::from));
                let summary = take_if(&mut map, "summary", |v| v.as_str().map(String::from));
                let confidence = take_if(&mut map, "confidence", Value::as_f64);
                map.retain(|_, v| !v.is_null());
                Some(Self::Structured(ArticleRecord {
                    title,
                    summary,
                    confidence,
                    extra: map,
                }))
            }
            // Numbers are kept as their literal text
            other => Some(Self::Blurb(other.to_string())),
        }
    }
}

/// Remove `key` only when `pick` accepts its value; anything else stays put
fn take_if<T>(
    map: &mut serde_json::Map<String, Value>,
    key: &str,
    pick: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let picked = map.get(key).and_then(pick)?;
    map.remove(key);
    Some(picked)
}

impl<'de> Deserialize<'de> for ArticleSummary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::from_value(Value::deserialize(deserializer)?)
            .ok_or_else(|| serde::de::Error::custom("article has no content"))
    }
}

/// Classification output for one category
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient_articles")]
    pub articles: Vec<ArticleSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// A named category, in the order the service returned it
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub result: CategoryResult,
}

/// Statistics attached to an analysis.
///
/// Accepts both `processingTimeSeconds` / `languageCode` and the deployed
/// service's `processingTime` / `language`; when both spellings arrive the
/// former wins and the other is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub files_processed: u64,
    pub total_articles: u64,
    pub processing_time_seconds: f64,
    pub language_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<bool>,
    /// Keys this client does not know about, kept verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Successful response of the classification service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(with = "ordered_categories")]
    pub categories: Vec<Category>,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    pub fn category(&self, name: &str) -> Option<&CategoryResult> {
        self.categories.iter().find(|c| c.name == name).map(|c| &c.result)
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Articles actually present in the payload (metadata may disagree)
    pub fn article_count(&self) -> usize {
        self.categories.iter().map(|c| c.result.articles.len()).sum()
    }
}

/// Body of `POST /api/reviews/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRequest {
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A review as listed by `GET /api/reviews/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedReview {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
}

/// Successful login or signup
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: UserProfile,
}

/// A past analysis as returned by `GET /api/history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub created_at: String,
    pub language: String,
    #[serde(default)]
    pub files_processed: u64,
    #[serde(default)]
    pub total_articles: u64,
    #[serde(default)]
    pub processing_time: Option<f64>,
    #[serde(default, with = "ordered_categories")]
    pub categories: Vec<Category>,
}

/// `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_articles<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<ArticleSummary>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items.into_iter().filter_map(ArticleSummary::from_value).collect()),
        _ => Ok(Vec::new()),
    }
}

impl<'de> Deserialize<'de> for AnalysisMetadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let mut raw = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        let processing_time = raw
            .remove("processingTimeSeconds")
            .or_else(|| raw.remove("processingTime"));
        let language = raw.remove("languageCode").or_else(|| raw.remove("language"));

        Ok(Self {
            files_processed: field(raw.remove("filesProcessed")).map_err(D::Error::custom)?,
            total_articles: field(raw.remove("totalArticles")).map_err(D::Error::custom)?,
            processing_time_seconds: processing_time
                .map(seconds)
                .transpose()
                .map_err(D::Error::custom)?
                .unwrap_or_default(),
            language_code: field(language).map_err(D::Error::custom)?,
            id: field(raw.remove("id")).map_err(D::Error::custom)?,
            saved: field(raw.remove("saved")).map_err(D::Error::custom)?,
            extra: raw,
        })
    }
}

/// Missing and null both mean the default
fn field<T: DeserializeOwned + Default>(value: Option<Value>) -> Result<T, serde_json::Error> {
    match value {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value),
    }
}

/// Processing time arrives either as a number or as a decimal string ("2.3s")
fn seconds(value: Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| "processing time out of range".to_string()),
        Value::String(s) => s
            .trim()
            .trim_end_matches('s')
            .parse()
            .map_err(|_| format!("invalid processing time: {s:?}")),
        Value::Null => Ok(0.0),
        other => Err(format!("invalid processing time: {other}")),
    }
}

/// Categories as a JSON object whose key order is preserved
mod ordered_categories {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    use super::{Category, CategoryResult};

    pub fn serialize<S: Serializer>(categories: &[Category], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(categories.len()))?;
        for category in categories {
            map.serialize_entry(&category.name, &category.result)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Category>, D::Error> {
        deserializer.deserialize_map(CategoriesVisitor)
    }

    struct CategoriesVisitor;

    impl<'de> Visitor<'de> for CategoriesVisitor {
        type Value = Vec<Category>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of category name to category result")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut categories: Vec<Category> = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((name, result)) = access.next_entry::<String, CategoryResult>()? {
                if categories.iter().any(|c| c.name == name) {
                    return Err(serde::de::Error::custom(format!("duplicate category {name:?}")));
                }
                categories.push(Category { name, result });
            }
            Ok(categories)
        }
    }
}
