//! Normalized card record.

use serde::{Deserialize, Serialize};

use crate::models::ListingRecord;
use crate::services::ParsedTitle;

/// One output row. Extraction misses are empty strings, never absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardRecord {
    pub year: u32,
    pub title: String,
    pub player: String,
    pub grade: String,
    pub card_no: String,
    pub item_url: String,
    pub gallery_url: String,

    /// Upstream id, kept for image naming only.
    #[serde(skip)]
    pub item_id: String,
}

impl CardRecord {
    /// Fixed CSV column order.
    pub const HEADERS: [&'static str; 7] = [
        "year",
        "title",
        "player",
        "grade",
        "card_no",
        "item_url",
        "gallery_url",
    ];

    /// Combine a raw listing with its parsed title fields.
    pub fn from_listing(year: u32, listing: ListingRecord, parsed: ParsedTitle) -> Self {
        Self {
            year,
            title: listing.title,
            player: parsed.player,
            grade: parsed.grade,
            card_no: parsed.card_no,
            item_url: listing.item_url,
            gallery_url: listing.gallery_url,
            item_id: listing.item_id,
        }
    }

    /// Row values in `HEADERS` order.
    pub fn to_row(&self) -> [String; 7] {
        [
            self.year.to_string(),
            self.title.clone(),
            self.player.clone(),
            self.grade.clone(),
            self.card_no.clone(),
            self.item_url.clone(),
            self.gallery_url.clone(),
        ]
    }

    /// File stem for the gallery image: `{player}_{card_no}_{grade}_{item_id}`.
    pub fn image_stem(&self) -> String {
        let raw = format!(
            "{}_{}_{}_{}",
            self.player.replace(' ', "_"),
            self.card_no,
            self.grade.replace(' ', "_"),
            self.item_id
        );
        raw.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}
