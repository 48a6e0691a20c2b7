use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use pathwise_common::{CollegeRecord, Ownership, PathwiseError, UNKNOWN_CATEGORY};

/// Turns one listing page into college records.
///
/// Markup drift upstream shows up as an empty result, never an error: the
/// pipeline treats zero records as the end of the listing.
pub trait DirectoryParser: Send + Sync {
    fn parse(&self, html: &str) -> Vec<CollegeRecord>;

    fn name(&self) -> &str {
        "unknown"
    }
}

/// CSS selectors for a card-per-college listing layout.
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    pub card: String,
    pub name: String,
    pub city: String,
    pub state: String,
    /// Combined "City, State" text, used when city or state is missing.
    pub location: String,
    pub category: String,
    pub ownership: String,
    pub website: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            card: ".college-card".to_string(),
            name: ".college-name".to_string(),
            city: ".college-city".to_string(),
            state: ".college-state".to_string(),
            location: ".college-location".to_string(),
            category: ".college-category".to_string(),
            ownership: ".college-ownership".to_string(),
            website: "a.college-website".to_string(),
        }
    }
}

struct Compiled {
    card: Selector,
    name: Selector,
    city: Selector,
    state: Selector,
    location: Selector,
    category: Selector,
    ownership: Selector,
    website: Selector,
}

pub struct CardListingParser {
    selectors: Compiled,
}

impl CardListingParser {
    pub fn new(selectors: &ListingSelectors) -> Result<Self, PathwiseError> {
        Ok(Self {
            selectors: Compiled {
                card: compile(&selectors.card)?,
                name: compile(&selectors.name)?,
                city: compile(&selectors.city)?,
                state: compile(&selectors.state)?,
                location: compile(&selectors.location)?,
                category: compile(&selectors.category)?,
                ownership: compile(&selectors.ownership)?,
                website: compile(&selectors.website)?,
            },
        })
    }

    fn parse_card(&self, card: ElementRef<'_>) -> Option<CollegeRecord> {
        let s = &self.selectors;

        let name = first_text(card, &s.name)?;
        let mut city = first_text(card, &s.city);
        let mut state = first_text(card, &s.state);

        if city.is_none() || state.is_none() {
            if let Some((loc_city, loc_state)) =
                first_text(card, &s.location).and_then(|loc| split_location(&loc))
            {
                city = city.or(Some(loc_city));
                state = state.or(Some(loc_state));
            }
        }

        let mut record = CollegeRecord::new(name, city?, state?);
        if !record.is_complete() {
            return None;
        }

        record.category = first_text(card, &s.category).unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());
        record.ownership = first_text(card, &s.ownership)
            .map(|text| Ownership::classify(&text))
            .unwrap_or_default();
        record.website = card
            .select(&s.website)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| href.starts_with("http://") || href.starts_with("https://"))
            .map(String::from);

        Some(record)
    }
}

impl Default for CardListingParser {
    fn default() -> Self {
        Self::new(&ListingSelectors::default()).expect("default listing selectors are valid")
    }
}

impl DirectoryParser for CardListingParser {
    fn parse(&self, html: &str) -> Vec<CollegeRecord> {
        let document = Html::parse_document(html);
        let mut rejected = 0usize;

        let records: Vec<CollegeRecord> = document
            .select(&self.selectors.card)
            .filter_map(|card| {
                let record = self.parse_card(card);
                if record.is_none() {
                    rejected += 1;
                }
                record
            })
            .collect();

        if rejected > 0 {
            debug!(rejected, "Skipped listing cards missing name, city or state");
        }

        records
    }

    fn name(&self) -> &str {
        "card-listing"
    }
}

fn compile(selector: &str) -> Result<Selector, PathwiseError> {
    Selector::parse(selector).map_err(|e| {
        warn!(selector, "Invalid listing selector");
        PathwiseError::Parse(format!("invalid selector '{selector}': {e:?}"))
    })
}

/// Collapsed, trimmed text of the first element matching `selector`.
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let el = scope.select(selector).next()?;
    let text = el.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// "Pune, Maharashtra" → ("Pune", "Maharashtra"). Uses the last comma so
/// "Andheri West, Mumbai, Maharashtra" keeps the locality in the city.
fn split_location(location: &str) -> Option<(String, String)> {
    let (city, state) = location.rsplit_once(',')?;
    let (city, state) = (city.trim(), state.trim());
    if city.is_empty() || state.is_empty() {
        return None;
    }
    Some((city.to_string(), state.to_string()))
}
