//! Maps upstream JSON onto [`CatalogItem`] and [`ContentDetail`].
//!
//! Upstream field names drift between releases, so every target field is an
//! ordered list of candidate keys; the first one carrying usable text wins.
//! Nothing here fails: missing or odd-shaped data degrades to fallbacks.

use chrono::Datelike;
use serde_json::{Map, Value};
use ulid::Ulid;

use crate::config::{Fallbacks, YearFallback};
use crate::sources::SourceKind;
use crate::types::{CatalogItem, ContentDetail, DetailResult, EpisodeRef, ListResult};

const LIST_CONTAINERS: &[&str] = &["items", "data", "results"];
const DETAIL_CONTAINERS: &[&str] = &["data", "result", "detail"];

/// Usable text for a JSON value: trimmed non-empty strings, numbers, and
/// arrays of strings joined with ", ".
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Array(values) => {
            let parts: Vec<String> = values.iter().filter_map(text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

/// First key in `keys` whose value coerces to text.
fn pick(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(text))
}

fn list_container<'a>(raw: &'a Value, kind: SourceKind) -> &'a [Value] {
    let found = match (raw, kind) {
        (Value::Array(items), SourceKind::Primary) => Some(items),
        (_, SourceKind::Legacy) => raw.get("items").and_then(Value::as_array),
        (_, SourceKind::Primary) => LIST_CONTAINERS
            .iter()
            .find_map(|k| raw.get(*k).and_then(Value::as_array)),
    };
    found.map(Vec::as_slice).unwrap_or(&[])
}

fn fallback_year(fallbacks: &Fallbacks) -> Option<String> {
    match fallbacks.year {
        YearFallback::Empty => None,
        YearFallback::Current => Some(chrono::Local::now().year().to_string()),
    }
}

fn item(obj: &Map<String, Value>, kind: SourceKind, source: &str, fallbacks: &Fallbacks) -> CatalogItem {
    let item_kind = pick(obj, &["type", "kind"]);
    let detail_keys: &[&str] = match kind {
        SourceKind::Legacy => &["detailPath", "link", "url"],
        SourceKind::Primary => &["link", "url", "detailPath"],
    };
    let (rating, year) = match kind {
        SourceKind::Legacy => (pick(obj, &["rating", "score"]), pick(obj, &["year"])),
        SourceKind::Primary => (
            pick(obj, &["rating", "score"]).or_else(|| fallbacks.rating_label(item_kind.as_deref())),
            pick(obj, &["year"]).or_else(|| fallback_year(fallbacks)),
        ),
    };

    let title = pick(obj, &["title", "name"]);

    CatalogItem {
        id: pick(obj, &["id"])
            .or_else(|| title.clone())
            .unwrap_or_else(|| Ulid::new().to_string()),
        title: title.unwrap_or_default(),
        poster: pick(obj, &["poster", "image", "thumb"]).unwrap_or_default(),
        rating,
        year,
        kind: item_kind,
        genre: pick(obj, &["genre", "genres"]),
        detail_ref: pick(obj, detail_keys).unwrap_or_default(),
        source: Some(source.to_string()),
    }
}

pub fn normalize_list(raw: &Value, kind: SourceKind, source: &str, page: u32, fallbacks: &Fallbacks) -> ListResult {
    let items: Vec<CatalogItem> = list_container(raw, kind)
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| item(obj, kind, source, fallbacks))
        .collect();

    let page_number = match kind {
        SourceKind::Legacy => raw
            .get("page")
            .and_then(|p| p.as_u64().or_else(|| p.as_str().and_then(|s| s.trim().parse().ok())))
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(page),
        SourceKind::Primary => page,
    };

    // No upstream reports a total, so any non-empty page may have a successor.
    // A legacy `hasMore` flag is ignored.
    let has_more_pages = !items.is_empty();

    ListResult {
        succeeded: true,
        items,
        page_number,
        has_more_pages,
    }
}

fn detail_container(raw: &Value, kind: SourceKind) -> Option<&Map<String, Value>> {
    if kind == SourceKind::Legacy && raw.get("success").and_then(Value::as_bool) == Some(false) {
        return None;
    }
    DETAIL_CONTAINERS
        .iter()
        .find_map(|k| raw.get(*k).and_then(Value::as_object))
        .or_else(|| raw.as_object())
}

fn episodes(obj: &Map<String, Value>, kind: SourceKind, fallbacks: &Fallbacks) -> Vec<EpisodeRef> {
    let list = ["episodes", "list_episode"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_array));
    let Some(list) = list else {
        return Vec::new();
    };
    let stream_keys: &[&str] = match kind {
        SourceKind::Legacy => &["url", "link"],
        SourceKind::Primary => &["link", "url"],
    };

    list.iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let numbered = || format!("{} {}", fallbacks.episode_title_prefix, i + 1);
            match entry {
                Value::Object(ep) => Some(EpisodeRef {
                    id: pick(ep, &["id", "episode_id"]),
                    title: pick(ep, &["title", "name"]).unwrap_or_else(numbered),
                    stream_ref: pick(ep, stream_keys).unwrap_or_default(),
                }),
                // Some releases send bare stream URLs.
                Value::String(_) => Some(EpisodeRef {
                    id: None,
                    title: numbered(),
                    stream_ref: text(entry).unwrap_or_default(),
                }),
                _ => None,
            }
        })
        .collect()
}

pub fn normalize_detail(raw: &Value, kind: SourceKind, fallbacks: &Fallbacks) -> DetailResult {
    let Some(obj) = detail_container(raw, kind) else {
        return DetailResult::not_found();
    };

    let episodes = episodes(obj, kind, fallbacks);
    let stream_keys: &[&str] = match kind {
        SourceKind::Legacy => &["playerUrl", "streamUrl", "videoUrl", "url", "link"],
        SourceKind::Primary => &["streamUrl", "videoUrl", "url", "link"],
    };
    let primary_stream_ref = pick(obj, stream_keys).or_else(|| {
        episodes
            .iter()
            .map(|e| e.stream_ref.clone())
            .find(|s| !s.is_empty())
    });
    let title = pick(obj, &["title", "name"]);

    if title.is_none() && primary_stream_ref.is_none() && episodes.is_empty() {
        return DetailResult::not_found();
    }

    DetailResult::found(ContentDetail {
        title: title.unwrap_or_default(),
        poster: pick(obj, &["poster", "image", "thumb"]).unwrap_or_default(),
        description: pick(obj, &["synopsis", "description", "plot"]).unwrap_or_else(|| fallbacks.description.clone()),
        rating: pick(obj, &["rating", "score"]),
        genre: pick(obj, &["genre", "genres"]),
        year: pick(obj, &["year"]),
        duration: pick(obj, &["duration", "runtime"]),
        cast: pick(obj, &["cast", "actors"]),
        director: pick(obj, &["director"]),
        primary_stream_ref,
        episodes,
    })
}
