use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Poster shown when the provider hands back something that is not a URL.
pub const FALLBACK_IMAGE_URL: &str = "https://images.unsplash.com/photo-1485846234645-a62644f84728?q=80&w=1200&auto=format&fit=crop";

const IMAGE_SIZING: &str = "auto=format&fit=crop&w=1200&q=80";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    #[serde(alias = "Movie")]
    Movie,
    #[serde(alias = "Web-Series", alias = "web series", alias = "Web Series")]
    WebSeries,
    #[serde(alias = "Anime")]
    Anime,
}

/// One recommendation card, exactly as the provider returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(rename = "ratingIMDb")]
    pub rating_imdb: String,
    pub rating_rotten_tomatoes: String,
    pub description: String,
    pub image_url: String,
    pub trailer_url: String,
    pub genres: Vec<String>,
    pub release_year: String,
}

impl RecommendationItem {
    /// Image URL to render, with sizing parameters or the fallback poster.
    pub fn display_image_url(&self) -> String {
        if !self.image_url.starts_with("http") {
            return FALLBACK_IMAGE_URL.to_string();
        }
        let separator = if self.image_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.image_url, separator, IMAGE_SIZING)
    }
}

/// Filter state the recommendations view sends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationFilter {
    pub category: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

impl RecommendationFilter {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Model, text)
    }
}
