//! # Menu Segmentation Module
//!
//! Splits raw OCR menu text into categorized menu items.
//!
//! ## Line classification
//!
//! Every non-blank line is classified exactly once, left to right:
//!
//! - **Category header**: the trimmed line equals its own uppercase form and
//!   contains no `$` (e.g. `APPETIZERS`, `MAIN COURSES`)
//! - **Item line**: `<name> - $<digits>.<digits>` (e.g. `Garlic Bread - $5.99`)
//! - **Description line**: anything else, appended to the open item
//!
//! Lines that arrive before any item is open and are not headers cannot be
//! attributed to anything and are dropped.

use crate::errors::{AppError, AppResult};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

lazy_static! {
    /// `<name> - $<digits>.<digits>`; the name is greedy so inner hyphens stay in it
    static ref ITEM_LINE_REGEX: Regex = Regex::new(r"(?P<name>.+)\s-\s\$(?P<price>\d+\.\d+)")
        .expect("Item line pattern should be valid");
}

/// A menu item recovered from OCR text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMenuItem {
    /// Item name, trimmed text before the price separator
    pub name: String,
    /// Space-joined description lines; each line contributes a trailing space
    pub description: String,
    /// Parsed price, absent if the captured digits failed to parse
    pub price: Option<f64>,
    /// Active category header, empty when no header preceded the item
    pub category: String,
}

impl ParsedMenuItem {
    fn open(name: String, price: Option<f64>, category: String) -> Self {
        Self {
            name,
            description: String::new(),
            price,
            category,
        }
    }
}

/// Items listed under one category header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuSection {
    pub category: String,
    pub items: Vec<ParsedMenuItem>,
}

/// Kind of a single menu line
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind<'a> {
    CategoryHeader(&'a str),
    Item { name: &'a str, price: Option<f64> },
    Text(&'a str),
}

/// Configuration options for menu segmentation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Optional cap in bytes; once reached, further description lines are
    /// dropped. Unset means descriptions grow without bound.
    pub max_description_length: Option<usize>,
}

impl SegmenterConfig {
    /// Validate segmentation configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.max_description_length == Some(0) {
            return Err(AppError::Config(
                "max_description_length must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Scanner state between two lines
#[derive(Debug)]
enum ScanState {
    /// Nothing seen yet that text could attach to
    NoItemOpen,
    /// A header was seen and no item has been opened under it
    CategorySeen { category: String },
    /// An item is collecting description lines
    ItemOpen { item: ParsedMenuItem },
}

#[derive(Debug, Default)]
struct ScanOutput {
    items: Vec<ParsedMenuItem>,
    headers: Vec<String>,
    discarded_lines: usize,
}

/// Line-oriented menu segmenter
#[derive(Debug, Clone, Default)]
pub struct MenuSegmenter {
    config: SegmenterConfig,
}

impl MenuSegmenter {
    /// Create a segmenter with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a segmenter with custom configuration
    ///
    /// ```rust
    /// use menu_allergens::menu_segmenter::{MenuSegmenter, SegmenterConfig};
    ///
    /// let config = SegmenterConfig {
    ///     max_description_length: Some(200),
    /// };
    /// let segmenter = MenuSegmenter::with_config(config)?;
    /// # Ok::<(), menu_allergens::errors::AppError>(())
    /// ```
    pub fn with_config(config: SegmenterConfig) -> AppResult<Self> {
        config.validate()?;
        debug!(
            max_description_length = ?config.max_description_length,
            "Creating MenuSegmenter with custom config"
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Classify a single line
    ///
    /// Headers are checked first; an item line always carries a `$` so the
    /// two never overlap.
    pub fn classify_line<'a>(&self, line: &'a str) -> Option<LineKind<'a>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        if is_category_header(trimmed) {
            return Some(LineKind::CategoryHeader(trimmed));
        }

        if let Some(caps) = ITEM_LINE_REGEX.captures(trimmed) {
            let name = caps.name("name").map(|m| m.as_str().trim()).unwrap_or("");
            let price = caps
                .name("price")
                .and_then(|m| m.as_str().parse::<f64>().ok());
            return Some(LineKind::Item { name, price });
        }

        Some(LineKind::Text(trimmed))
    }

    /// Split raw menu text into menu items, in input order
    ///
    /// ```rust
    /// use menu_allergens::menu_segmenter::MenuSegmenter;
    ///
    /// let items = MenuSegmenter::new().segment("APPETIZERS\nSoup - $5.00\nMAINS\nSteak - $20.00");
    /// assert_eq!(items.len(), 2);
    /// assert_eq!(items[0].category, "APPETIZERS");
    /// assert_eq!(items[1].name, "Steak");
    /// assert_eq!(items[1].price, Some(20.0));
    /// ```
    pub fn segment(&self, raw_text: &str) -> Vec<ParsedMenuItem> {
        self.scan(raw_text).items
    }

    /// Group menu items under their category headers
    ///
    /// Sections follow first header appearance; a repeated header merges into
    /// its first section. Items seen before any header go to a leading section
    /// with an empty category.
    pub fn group_by_category(&self, raw_text: &str) -> Vec<MenuSection> {
        let output = self.scan(raw_text);
        let mut sections: Vec<MenuSection> = Vec::new();

        if output.items.iter().any(|item| item.category.is_empty()) {
            sections.push(MenuSection {
                category: String::new(),
                items: Vec::new(),
            });
        }
        for header in output.headers {
            if !sections.iter().any(|section| section.category == header) {
                sections.push(MenuSection {
                    category: header,
                    items: Vec::new(),
                });
            }
        }

        for item in output.items {
            if let Some(section) = sections
                .iter_mut()
                .find(|section| section.category == item.category)
            {
                section.items.push(item);
            }
        }

        sections
    }

    fn scan(&self, raw_text: &str) -> ScanOutput {
        let start_time = std::time::Instant::now();
        let mut output = ScanOutput::default();
        let mut state = ScanState::NoItemOpen;
        let mut line_count = 0;

        for (line_number, line) in raw_text.lines().enumerate() {
            line_count += 1;
            let Some(kind) = self.classify_line(line) else {
                continue;
            };
            trace!("Line {} classified as {:?}", line_number, kind);
            state = self.step(state, kind, line_number, &mut output);
        }

        if let ScanState::ItemOpen { item } = state {
            flush(item, &mut output.items);
        }

        let duration = start_time.elapsed();
        crate::observability::record_segmentation_metrics(
            duration,
            raw_text.len(),
            line_count,
            output.items.len(),
            output.headers.len(),
        );

        info!(
            items = output.items.len(),
            categories = output.headers.len(),
            discarded_lines = output.discarded_lines,
            "Segmented menu text"
        );
        output
    }

    fn step(
        &self,
        state: ScanState,
        kind: LineKind<'_>,
        line_number: usize,
        output: &mut ScanOutput,
    ) -> ScanState {
        match kind {
            LineKind::CategoryHeader(header) => {
                if let ScanState::ItemOpen { item } = state {
                    flush(item, &mut output.items);
                }
                debug!("Category header at line {}: '{}'", line_number, header);
                output.headers.push(header.to_string());
                ScanState::CategorySeen {
                    category: header.to_string(),
                }
            }
            LineKind::Item { name, price } => {
                let category = match state {
                    ScanState::NoItemOpen => String::new(),
                    ScanState::CategorySeen { category } => category,
                    ScanState::ItemOpen { item } => {
                        let category = item.category.clone();
                        flush(item, &mut output.items);
                        category
                    }
                };
                debug!(
                    "Item line at line {}: name='{}', price={:?}",
                    line_number, name, price
                );
                ScanState::ItemOpen {
                    item: ParsedMenuItem::open(name.to_string(), price, category),
                }
            }
            LineKind::Text(text) => match state {
                ScanState::ItemOpen { mut item } => {
                    match self.config.max_description_length {
                        Some(cap) if item.description.len() >= cap => {
                            warn!(
                                "Description of '{}' reached {} bytes, dropping line {}",
                                item.name, cap, line_number
                            );
                        }
                        _ => {
                            item.description.push_str(text);
                            item.description.push(' ');
                        }
                    }
                    ScanState::ItemOpen { item }
                }
                other => {
                    debug!(
                        "Discarding unattributed line {}: '{}'",
                        line_number, text
                    );
                    output.discarded_lines += 1;
                    other
                }
            },
        }
    }
}

/// Segment menu text with the default segmenter
pub fn segment_menu(raw_text: &str) -> Vec<ParsedMenuItem> {
    MenuSegmenter::new().segment(raw_text)
}

/// A header is all-uppercase (caseless characters count as uppercase) and carries no price
pub fn is_category_header(trimmed: &str) -> bool {
    !trimmed.is_empty() && !trimmed.contains('$') && trimmed.to_uppercase() == trimmed
}

fn flush(item: ParsedMenuItem, items: &mut Vec<ParsedMenuItem>) {
    if item.name.is_empty() {
        trace!("Dropping item with empty name");
        return;
    }
    items.push(item);
}
