//! Prompt and schema construction for the three entry points.
//!
//! Everything here is plain string assembly: identical inputs always produce
//! identical prompts, which is what lets the response cache key on the inputs.

use serde_json::{Value, json};

use crate::models::RecommendationFilter;

/// Sentinel the UI uses for "no constraint" on genre and year.
pub const NO_CONSTRAINT: &str = "All";

pub const RECOMMENDATION_COUNT: usize = 6;

pub const TRENDING_QUALIFIER: &str = " that are trending or classic high-rated hits";

const RECOMMENDATION_TAIL: &str = ". For each recommendation, provide a high-resolution Unsplash image URL and a valid YouTube embed URL for its official trailer. Include IMDb, Rotten Tomatoes ratings, and the release year.";

pub const ADVICE_THINKING_BUDGET: u32 = 4000;

pub const CHAT_SYSTEM_INSTRUCTION: &str = r#"You are Escape Zone, an expert career counselor and entertainment critic. You help users find great movies/anime and provide deep technical career guidance and study abroad advice. Be professional, encouraging, and detailed."#;

pub const CHAT_GREETING: &str = "Hello! I am **Escape Zone Assistant**. I'm here to provide precise guidance on your career, study abroad plans, or help you find your next favorite movie or anime. \n\nHow can I assist you today?";

/// Fields every recommendation object must carry.
pub const RECOMMENDATION_FIELDS: [&str; 10] = [
    "id",
    "title",
    "type",
    "ratingIMDb",
    "ratingRottenTomatoes",
    "description",
    "imageUrl",
    "trailerUrl",
    "genres",
    "releaseYear",
];

fn is_constraint(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != NO_CONSTRAINT)
}

/// Constraint clauses in prompt order: genre, year, free-text query.
pub fn recommendation_constraints(filter: &RecommendationFilter) -> Vec<String> {
    let mut constraints = Vec::new();
    if let Some(genre) = is_constraint(filter.genre.as_deref()) {
        constraints.push(format!("in the {genre} genre"));
    }
    if let Some(year) = is_constraint(filter.year.as_deref()) {
        constraints.push(format!("released in {year}"));
    }
    if let Some(query) = filter.query.as_deref().filter(|q| !q.is_empty()) {
        constraints.push(format!("matching the search: \"{query}\""));
    }
    constraints
}

pub fn recommendation_prompt(filter: &RecommendationFilter) -> String {
    let mut prompt = format!(
        "Recommend {RECOMMENDATION_COUNT} top-rated {}",
        filter.category
    );

    let constraints = recommendation_constraints(filter);
    if constraints.is_empty() {
        prompt.push_str(TRENDING_QUALIFIER);
    } else {
        prompt.push(' ');
        prompt.push_str(&constraints.join(", "));
    }

    prompt.push_str(RECOMMENDATION_TAIL);
    prompt
}

/// Structured-output schema for the recommendation list (OpenAPI subset, as
/// Gemini's `responseSchema` expects it).
pub fn recommendation_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "title": { "type": "STRING" },
                "type": { "type": "STRING", "description": "movie, web-series, or anime" },
                "ratingIMDb": { "type": "STRING" },
                "ratingRottenTomatoes": { "type": "STRING" },
                "description": { "type": "STRING" },
                "imageUrl": { "type": "STRING", "description": "A high-resolution Unsplash image URL." },
                "trailerUrl": {
                    "type": "STRING",
                    "description": "A valid YouTube embed URL (e.g., https://www.youtube.com/embed/...) for the official trailer."
                },
                "genres": { "type": "ARRAY", "items": { "type": "STRING" } },
                "releaseYear": { "type": "STRING" }
            },
            "required": RECOMMENDATION_FIELDS,
        }
    })
}

pub fn advice_prompt(topic: &str) -> String {
    format!(
        "Provide expert advice and a step-by-step roadmap for: {topic}. Focus on technical fields, learning resources, and study abroad process where applicable. Format in Markdown with clear headings and bullet points."
    )
}
