//! Parsing of the `smartctl --all` attribute table.
//!
//! Only rows of the vendor attribute table are of interest:
//!
//! ```text
//! ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
//!   5 Reallocated_Sector_Ct   0x0033   100   100   010    Pre-fail  Always       -       0
//! ```
//!
//! Everything else in the report (banner, identity block, self-test log) is
//! skipped. Lines break on every Unicode line terminator, not just `\n`.

use std::sync::LazyLock;

use regex::Regex;

/// A data row: an id, anything, then VALUE WORST THRESH as three-digit fields.
static DATA_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+.*\s+\d{3}\s+\d{3}\s+\d{3}\s+").expect("data row pattern is valid")
});

/// Line terminators recognised when splitting a report.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// One row of the attribute table, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartAttribute {
    pub id: String,
    pub name: String,
    pub flag: String,
    pub value: String,
    pub worst: String,
    pub thresh: String,
    /// `Pre-fail` or `Old_age`.
    pub kind: String,
    pub updated: String,
    pub when_failed: String,
    /// First token of RAW_VALUE; trailing annotations such as
    /// `(Min/Max 20/45)` are not part of it.
    pub raw: String,
}

impl SmartAttribute {
    /// Split a data row into its ten fields.
    ///
    /// Returns `None` if the row has fewer than ten tokens.
    fn from_row(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace().map(str::to_owned);
        Some(Self {
            id: tokens.next()?,
            name: tokens.next()?,
            flag: tokens.next()?,
            value: tokens.next()?,
            worst: tokens.next()?,
            thresh: tokens.next()?,
            kind: tokens.next()?,
            updated: tokens.next()?,
            when_failed: tokens.next()?,
            raw: tokens.next()?,
        })
    }
}

/// Attributes reported for one device, in the order `smartctl` printed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTable {
    attributes: Vec<SmartAttribute>,
}

impl AttributeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text output of `smartctl --all`.
    ///
    /// The first row seen for an id wins.
    pub fn parse(output: &str) -> Self {
        let mut table = Self::new();
        for line in output.split(is_line_break) {
            if !DATA_ROW.is_match(line) {
                continue;
            }
            let Some(attribute) = SmartAttribute::from_row(line) else {
                tracing::debug!(line, "skipping truncated attribute row");
                continue;
            };
            if table.get(&attribute.id).is_none() {
                table.attributes.push(attribute);
            }
        }
        table
    }

    /// Look up an attribute by id.
    pub fn get(&self, id: &str) -> Option<&SmartAttribute> {
        self.attributes.iter().find(|attribute| attribute.id == id)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SmartAttribute> {
        self.attributes.iter()
    }

    /// All id to name pairs in the table.
    pub fn names(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.attributes
            .iter()
            .map(|attribute| (attribute.id.clone(), attribute.name.clone()))
    }
}
