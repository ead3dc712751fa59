use serde::{Deserialize, Serialize};

/// Poster-card summary of a title, as shown in lists and search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Not guaranteed unique: may be a generated ULID when upstream has no id.
    pub id: String,
    pub title: String,
    pub poster: String,
    pub rating: Option<String>,
    pub year: Option<String>,
    pub kind: Option<String>,
    pub genre: Option<String>,
    /// Opaque key for a later detail fetch. Either a backend-relative path or a full URL.
    pub detail_ref: String,
    /// Id of the backend that produced this item.
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub id: Option<String>,
    pub title: String,
    pub stream_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDetail {
    pub title: String,
    pub poster: String,
    pub description: String,
    pub rating: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub duration: Option<String>,
    pub cast: Option<String>,
    pub director: Option<String>,
    pub primary_stream_ref: Option<String>,
    pub episodes: Vec<EpisodeRef>,
}

impl ContentDetail {
    pub fn is_series(&self) -> bool {
        !self.episodes.is_empty()
    }

    /// The stream to play when no episode has been picked.
    pub fn default_stream(&self) -> Option<&str> {
        self.primary_stream_ref
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.episodes
                    .first()
                    .map(|e| e.stream_ref.as_str())
                    .filter(|s| !s.is_empty())
            })
    }

    /// Stream for a 1-based episode number, falling back to the default stream
    /// when `episode` is `None`.
    pub fn stream_for(&self, episode: Option<usize>) -> Option<&str> {
        match episode {
            None => self.default_stream(),
            Some(n) => self
                .episodes
                .get(n.checked_sub(1)?)
                .map(|e| e.stream_ref.as_str())
                .filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult {
    pub succeeded: bool,
    pub items: Vec<CatalogItem>,
    pub page_number: u32,
    /// Heuristic: true whenever the page had items, since upstream reports no total.
    pub has_more_pages: bool,
}

impl ListResult {
    /// Shape returned for any list or search failure.
    pub fn failed() -> Self {
        ListResult {
            succeeded: false,
            items: Vec::new(),
            page_number: 1,
            has_more_pages: false,
        }
    }

    /// Successful result with nothing in it, e.g. an empty search query.
    pub fn empty() -> Self {
        ListResult {
            succeeded: true,
            ..ListResult::failed()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailResult {
    pub succeeded: bool,
    pub detail: Option<ContentDetail>,
}

impl DetailResult {
    pub fn found(detail: ContentDetail) -> Self {
        DetailResult {
            succeeded: true,
            detail: Some(detail),
        }
    }

    pub fn not_found() -> Self {
        DetailResult {
            succeeded: false,
            detail: None,
        }
    }
}

/// Categories the catalog is known to serve, with their display labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Trending,
    IndonesianMovies,
    IndonesianDrama,
    KDrama,
    ShortTv,
    Anime,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Trending,
        Category::IndonesianMovies,
        Category::IndonesianDrama,
        Category::KDrama,
        Category::Anime,
        Category::ShortTv,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Category::Trending => "trending",
            Category::IndonesianMovies => "indonesian-movies",
            Category::IndonesianDrama => "indonesian-drama",
            Category::KDrama => "kdrama",
            Category::ShortTv => "short-tv",
            Category::Anime => "anime",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Trending => "Trending",
            Category::IndonesianMovies => "Indonesian Movies",
            Category::IndonesianDrama => "Indonesian Drama",
            Category::KDrama => "K-Drama",
            Category::ShortTv => "Short TV",
            Category::Anime => "Anime",
        }
    }

    pub fn from_id(id: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.id() == id)
    }
}

/// Display label for an arbitrary category id; unknown ids are shown as-is.
pub fn category_label(id: &str) -> String {
    Category::from_id(id)
        .map(|c| c.label().to_string())
        .unwrap_or_else(|| id.to_string())
}

/// One row of the home feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeSection {
    pub category: String,
    pub label: String,
    pub items: Vec<CatalogItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(n: usize, stream: &str) -> EpisodeRef {
        EpisodeRef {
            id: None,
            title: format!("Episode {}", n),
            stream_ref: stream.to_string(),
        }
    }

    fn detail(primary: Option<&str>, episodes: Vec<EpisodeRef>) -> ContentDetail {
        ContentDetail {
            title: "A".into(),
            poster: String::new(),
            description: String::new(),
            rating: None,
            genre: None,
            year: None,
            duration: None,
            cast: None,
            director: None,
            primary_stream_ref: primary.map(str::to_string),
            episodes,
        }
    }

    #[test]
    fn default_stream_prefers_primary() {
        let d = detail(Some("main"), vec![episode(1, "u1")]);
        assert!(d.is_series());
        assert_eq!(d.default_stream(), Some("main"));
    }

    #[test]
    fn default_stream_falls_back_to_first_episode() {
        let d = detail(None, vec![episode(1, "u1"), episode(2, "u2")]);
        assert_eq!(d.default_stream(), Some("u1"));
        assert_eq!(d.stream_for(Some(2)), Some("u2"));
        assert_eq!(d.stream_for(Some(0)), None);
        assert_eq!(d.stream_for(Some(3)), None);
    }

    #[test]
    fn category_ids_round_trip() {
        for c in Category::ALL {
            assert_eq!(Category::from_id(c.id()), Some(c));
        }
        assert_eq!(category_label("kdrama"), "K-Drama");
        assert_eq!(category_label("latest"), "latest");
    }
}
