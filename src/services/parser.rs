// src/services/parser.rs

//! Listing title heuristics.
//!
//! Each field has its own matcher and the first match wins. A number is only
//! read as a grade when it follows a grading service, and only as a card
//! number when it follows `#`, `No.` or `Card #`. Anything else is ignored.

use std::collections::HashSet;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::ParsingConfig;

/// Words that introduce a card number and never belong to a name.
const CARD_MARKERS: [&str; 2] = ["CARD", "NO"];

/// Fields extracted from one title. Empty string means no match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTitle {
    pub player: String,
    pub grade: String,
    pub card_no: String,
}

/// Pure title parser built from configurable word lists.
#[derive(Debug, Clone)]
pub struct TitleParser {
    grade_re: Regex,
    card_no_re: Regex,
    excluded: HashSet<String>,
}

impl TitleParser {
    /// Compile matchers for the configured graders and stopwords.
    pub fn new(config: &ParsingConfig) -> Result<Self> {
        let services: Vec<String> = config
            .grading_services
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(regex::escape)
            .collect();
        if services.is_empty() {
            return Err(AppError::config("no grading services configured"));
        }

        let grade_re = Regex::new(&format!(
            r"(?i)\b({})\s*(\d+(?:\.\d)?)\b",
            services.join("|")
        ))?;
        let card_no_re =
            Regex::new(r"(?i)(?:\bCard\s*#|\bNo\.|#)\s*(\d{1,4}[A-Z]?)\b")?;

        let excluded = config
            .brand_stopwords
            .iter()
            .chain(config.grading_services.iter())
            .map(|w| letters_upper(w))
            .chain(CARD_MARKERS.iter().map(|w| w.to_string()))
            .filter(|w| !w.is_empty())
            .collect();

        Ok(Self {
            grade_re,
            card_no_re,
            excluded,
        })
    }

    /// Parse with the default word lists.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&ParsingConfig::default())
    }

    /// Extract all fields from a title. Never fails.
    pub fn parse(&self, title: &str) -> ParsedTitle {
        ParsedTitle {
            player: self.player(title),
            grade: self.grade(title),
            card_no: self.card_no(title),
        }
    }

    /// `"SERVICE VALUE"` for the first grading-service match.
    pub fn grade(&self, title: &str) -> String {
        self.grade_re
            .captures(title)
            .map(|caps| format!("{} {}", caps[1].to_uppercase(), &caps[2]))
            .unwrap_or_default()
    }

    /// Card number following the first recognized marker.
    pub fn card_no(&self, title: &str) -> String {
        self.card_no_re
            .captures(title)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default()
    }

    /// First run of capitalized tokens that are not brands, graders or noise.
    pub fn player(&self, title: &str) -> String {
        let mut run: Vec<&str> = Vec::new();
        for token in title.split_whitespace() {
            if self.is_name_token(token) {
                run.push(trim_punctuation(token));
            } else if !run.is_empty() {
                break;
            }
        }
        run.join(" ")
    }

    fn is_name_token(&self, token: &str) -> bool {
        let token = trim_punctuation(token);
        let starts_upper = token.chars().next().is_some_and(|c| c.is_uppercase());
        if !starts_upper || token.chars().any(|c| c.is_ascii_digit()) {
            return false;
        }
        let cleaned = letters_upper(token);
        !cleaned.is_empty() && !self.excluded.contains(&cleaned)
    }
}

fn letters_upper(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .collect()
}

fn trim_punctuation(token: &str) -> &str {
    token
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '.' && c != '\'')
        .trim_end_matches('.')
}
