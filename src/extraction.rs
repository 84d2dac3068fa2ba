//! Keyword scraping over generated itinerary text
//!
//! Everything here is a pure function of the input text and the keyword
//! tables: the same text always yields the same sequence, and the returned
//! iterators can be cloned to walk the result again.

use serde::Serialize;
use std::collections::HashSet;

/// Places and services worth looking up contact data for
pub const PLACE_KEYWORDS: &[&str] = &[
    "hotel",
    "restaurante",
    "bodega",
    "actividad",
    "excursión",
    "remis",
    "taxi",
    "auto de alquiler",
    "transfer",
    "museo",
    "café",
    "bar",
    "parque",
    "mercado",
    "zoológico",
    "plaza",
];

/// Itinerary beats used to pick scenes for the map
pub const KEY_POINT_KEYWORDS: &[&str] = &[
    "actividad",
    "almuerzo",
    "cena",
    "tour",
    "visita",
    "excursión",
    "paseo",
];

/// Lower-cased keywords matched as substrings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn places() -> Self {
        Self::new(PLACE_KEYWORDS)
    }

    pub fn key_points() -> Self {
        Self::new(KEY_POINT_KEYWORDS)
    }

    /// Case-insensitive substring membership
    pub fn matches(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

/// Classification of an extracted line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineKind {
    /// Matched the place/service keyword table
    Service,
    /// Only matched the proper-noun heuristic
    ProperNoun,
}

/// A line lifted from the itinerary together with why it was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtractedLine<'a> {
    pub text: &'a str,
    pub kind: LineKind,
}

/// First alphabetic char upper case, every later alphabetic char lower case
pub fn is_title_case(word: &str) -> bool {
    let mut letters = word.chars().filter(|c| c.is_alphabetic());
    match letters.next() {
        Some(first) if first.is_uppercase() => letters.all(char::is_lowercase),
        _ => false,
    }
}

fn classify_line<'a>(line: &'a str, keywords: &KeywordSet) -> Option<ExtractedLine<'a>> {
    let text = line.trim();
    if text.is_empty() {
        return None;
    }
    if keywords.matches(text) {
        Some(ExtractedLine {
            text,
            kind: LineKind::Service,
        })
    } else if text.split_whitespace().any(is_title_case) {
        Some(ExtractedLine {
            text,
            kind: LineKind::ProperNoun,
        })
    } else {
        None
    }
}

/// Lines that name places or services, tagged with the rule that matched.
/// Order and duplicates are preserved.
pub fn classify_places<'a>(
    text: &'a str,
    keywords: &'a KeywordSet,
) -> impl Iterator<Item = ExtractedLine<'a>> + Clone + 'a {
    text.lines().filter_map(move |line| classify_line(line, keywords))
}

/// Trimmed non-blank lines that contain a keyword or a title-cased word.
/// Order and duplicates are preserved; wrap in [`UniqueLines`] to drop
/// repeats.
pub fn extract_places<'a>(
    text: &'a str,
    keywords: &'a KeywordSet,
) -> impl Iterator<Item = &'a str> + Clone + 'a {
    classify_places(text, keywords).map(|line| line.text)
}

/// Trimmed lines containing an itinerary-beat keyword, exact repeats
/// dropped, truncated to `limit` when given
pub fn extract_key_points<'a>(
    text: &'a str,
    keywords: &'a KeywordSet,
    limit: Option<usize>,
) -> impl Iterator<Item = &'a str> + Clone + 'a {
    let matching = text
        .lines()
        .map(str::trim)
        .filter(move |line| !line.is_empty() && keywords.matches(line));
    UniqueLines::new(matching).take(limit.unwrap_or(usize::MAX))
}

/// Iterator adapter that yields each distinct line once, first occurrence wins
#[derive(Debug, Clone)]
pub struct UniqueLines<'a, I> {
    inner: I,
    seen: HashSet<&'a str>,
}

impl<'a, I: Iterator<Item = &'a str>> UniqueLines<'a, I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            seen: HashSet::new(),
        }
    }
}

impl<'a, I: Iterator<Item = &'a str>> Iterator for UniqueLines<'a, I> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.find(|line| self.seen.insert(*line))
    }
}

/// Icon shown next to an audit alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconCategory {
    Children,
    TransitTime,
    Budget,
    Seasonal,
    Generic,
}

impl IconCategory {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Children => "👶",
            Self::TransitTime => "🕒",
            Self::Budget => "💸",
            Self::Seasonal => "📅",
            Self::Generic => "⚠️",
        }
    }
}

/// Keywords that put an alert into a category
#[derive(Debug, Clone, Copy)]
pub struct AlertRule {
    pub category: IconCategory,
    pub keywords: &'static [&'static str],
}

/// Checked top to bottom, first match wins
pub const ALERT_RULES: &[AlertRule] = &[
    AlertRule {
        category: IconCategory::Children,
        keywords: &["niños", "children"],
    },
    AlertRule {
        category: IconCategory::TransitTime,
        keywords: &["traslado", "transit"],
    },
    AlertRule {
        category: IconCategory::Budget,
        keywords: &["presupuesto", "budget"],
    },
    AlertRule {
        category: IconCategory::Seasonal,
        keywords: &["reserva", "reservation", "estacionalidad", "seasonal"],
    },
];

/// Category of the first rule with a keyword contained in `alert`,
/// `Generic` when none matches
pub fn classify_alert(alert: &str, rules: &[AlertRule]) -> IconCategory {
    let lower = alert.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map_or(IconCategory::Generic, |rule| rule.category)
}

pub fn extract_alert_icon(alert: &str) -> IconCategory {
    classify_alert(alert, ALERT_RULES)
}
