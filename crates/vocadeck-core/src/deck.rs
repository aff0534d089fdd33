//! Card building and deck output

use crate::error::{Result, VocadeckError};
use crate::fetch::{FetchResult, ImageFetcher};
use crate::input::Row;
use crate::query::{clean_text, normalize_query};
use crate::session::{FetchSession, FetchStats};
use crate::synonyms::{SynonymLookup, SynonymStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fields that hold the card front, in priority order
const FRONT_FIELDS: [&str; 2] = ["WORD", "Front"];

/// Field used as the image search seed
const SEARCH_FIELD: &str = "MEANING";

/// One finished flashcard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub front: String,
    pub back: String,
    pub image_url: Option<String>,
    pub credit: Option<String>,
}

/// Row counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_rows: usize,
    pub cards: usize,
    pub with_image: usize,
    /// Cards emitted without an image
    pub degraded: usize,
    /// Rows dropped for lack of front text
    pub skipped: usize,
    pub fetch: FetchStats,
}

/// Exact match first, then case-insensitive
fn field<'a>(row: &'a Row, name: &str) -> Option<&'a str> {
    row.get(name).or_else(|| {
        row.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

/// Card front: first non-empty of `WORD`, `Front`
pub fn front_text(row: &Row) -> Option<String> {
    FRONT_FIELDS
        .iter()
        .filter_map(|name| field(row, name))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Card back: every other non-empty field, then the image credit
pub fn back_text(row: &Row, credit: Option<&str>) -> String {
    let mut parts: Vec<String> = row
        .iter()
        .filter(|(k, _)| !FRONT_FIELDS.iter().any(|f| k.eq_ignore_ascii_case(f)))
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| format!("<b>{}:</b> {}", k, v.trim()))
        .collect();

    if let Some(credit) = credit.filter(|c| !c.is_empty()) {
        parts.push(format!("<b>Image Credit:</b> {}", credit));
    }

    parts.join("<br>")
}

/// Deck name with punctuation removed; must not end up empty
pub fn sanitize_deck_name(name: &str) -> Result<String> {
    let cleaned = clean_text(name);
    if cleaned.is_empty() {
        return Err(VocadeckError::InvalidInput(format!(
            "Deck name {:?} has no usable characters",
            name
        )));
    }
    Ok(cleaned)
}

/// Path of the deck file for a sanitized deck name
pub fn deck_path(output_dir: &Path, deck_name: &str) -> PathBuf {
    output_dir.join(format!("{}.csv", deck_name))
}

/// Write cards as `Front,Back,ImageURL,Credit`, creating the directory if needed
pub fn write_deck_csv(path: &Path, cards: &[Card]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Front", "Back", "ImageURL", "Credit"])?;
    for card in cards {
        writer.write_record([
            card.front.as_str(),
            card.back.as_str(),
            card.image_url.as_deref().unwrap_or(""),
            card.credit.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;

    tracing::debug!("Wrote {} cards to {:?}", cards.len(), path);
    Ok(())
}

/// Turns rows into cards, fetching one image per row
///
/// Owns the per-run session, so images are never reused within one builder.
pub struct DeckBuilder {
    fetcher: Option<ImageFetcher>,
    synonyms: SynonymStore,
    lookup: Option<Arc<dyn SynonymLookup>>,
    session: FetchSession,
}

impl DeckBuilder {
    /// Builder without image lookup
    pub fn text_only() -> Self {
        Self {
            fetcher: None,
            synonyms: SynonymStore::in_memory(Default::default()),
            lookup: None,
            session: FetchSession::new(),
        }
    }

    pub fn new(fetcher: ImageFetcher, synonyms: SynonymStore) -> Self {
        Self {
            fetcher: Some(fetcher),
            synonyms,
            lookup: None,
            session: FetchSession::new(),
        }
    }

    /// Resolve unknown words through an online thesaurus
    pub fn with_lookup(mut self, lookup: Arc<dyn SynonymLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn with_session(mut self, session: FetchSession) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> &FetchSession {
        &self.session
    }

    pub fn synonyms(&self) -> &SynonymStore {
        &self.synonyms
    }

    pub async fn process(&mut self, rows: &[Row]) -> (Vec<Card>, RunSummary) {
        self.process_with_progress(rows, |_, _| {}).await
    }

    /// Process rows in order; `on_row` receives the row index and front text
    pub async fn process_with_progress(
        &mut self,
        rows: &[Row],
        mut on_row: impl FnMut(usize, &str),
    ) -> (Vec<Card>, RunSummary) {
        let mut summary = RunSummary {
            total_rows: rows.len(),
            ..Default::default()
        };
        let mut cards = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            let Some(front) = front_text(row) else {
                tracing::warn!("Row {} has no WORD or Front field, skipping", idx + 1);
                summary.skipped += 1;
                continue;
            };
            on_row(idx, &front);

            let image = self.image_for(row, &front).await;
            if image.is_found() {
                summary.with_image += 1;
            } else if self.fetcher.is_some() {
                summary.degraded += 1;
            }

            cards.push(Card {
                back: back_text(row, image.credit.as_deref()),
                front,
                image_url: image.image_url,
                credit: image.credit,
            });
        }

        summary.cards = cards.len();
        summary.fetch = self.session.stats.clone();
        (cards, summary)
    }

    async fn image_for(&mut self, row: &Row, front: &str) -> FetchResult {
        let Some(fetcher) = &self.fetcher else {
            return FetchResult::none();
        };

        let seed = field(row, SEARCH_FIELD).unwrap_or("");
        let query = normalize_query(seed);
        if query.is_empty() {
            tracing::warn!("No {} for '{}', card will have no image", SEARCH_FIELD, front);
            return FetchResult::none();
        }

        if fetcher.config().use_synonyms {
            if let Some(lookup) = &self.lookup {
                if !self.session.is_aborted() {
                    self.synonyms.resolve(&query, lookup.as_ref()).await;
                }
            }
        }

        let result = fetcher
            .fetch_image(seed, self.synonyms.dictionary(), &mut self.session)
            .await;
        if !result.is_found() {
            tracing::warn!("No image found for '{}'", front);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_front_text_priority() {
        assert_eq!(
            front_text(&row(&[("Front", "B"), ("WORD", "A")])),
            Some("A".to_string())
        );
        assert_eq!(
            front_text(&row(&[("WORD", " "), ("Front", "B")])),
            Some("B".to_string())
        );
        assert_eq!(front_text(&row(&[("Word", "c")])), Some("c".to_string()));
        assert_eq!(front_text(&row(&[("MEANING", "x")])), None);
    }

    #[test]
    fn test_back_text() {
        let r = row(&[("WORD", "Apfel"), ("MEANING", "a red fruit"), ("NOTES", "")]);
        assert_eq!(back_text(&r, None), "<b>MEANING:</b> a red fruit");
        assert_eq!(
            back_text(&r, Some("Image by anna from Pixabay")),
            "<b>MEANING:</b> a red fruit<br><b>Image Credit:</b> Image by anna from Pixabay"
        );
    }

    #[test]
    fn test_sanitize_deck_name() {
        assert_eq!(sanitize_deck_name("German: A1 (part 2)!").unwrap(), "German A1 part 2");
        assert!(sanitize_deck_name("?!").is_err());
    }

    #[test]
    fn test_write_deck_csv() {
        let dir = TempDir::new().unwrap();
        let path = deck_path(&dir.path().join("ANKI"), "Deck");
        let cards = vec![
            Card {
                front: "Apfel".to_string(),
                back: "<b>MEANING:</b> a, red fruit".to_string(),
                image_url: Some("https://cdn/a.jpg".to_string()),
                credit: Some("Image by anna from Pixabay".to_string()),
            },
            Card {
                front: "Haus".to_string(),
                back: String::new(),
                image_url: None,
                credit: None,
            },
        ];
        write_deck_csv(&path, &cards).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            reader.headers().unwrap(),
            vec!["Front", "Back", "ImageURL", "Credit"]
        );
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&records[0][1], "<b>MEANING:</b> a, red fruit");
        assert_eq!(&records[1][2], "");
    }

    #[tokio::test]
    async fn test_text_only_builder() {
        let rows = vec![
            row(&[("WORD", "Apfel"), ("MEANING", "a red fruit")]),
            row(&[("MEANING", "orphan")]),
        ];
        let mut builder = DeckBuilder::text_only();
        let (cards, summary) = builder.process(&rows).await;
        assert_eq!(cards.len(), 1);
        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.degraded, 0);
        assert!(cards[0].image_url.is_none());
    }
}
