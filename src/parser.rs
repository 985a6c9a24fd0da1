use crate::ir::{GoalNode, Sheet};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::Path;
use thiserror::Error;

static LEADING_INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([+-]?\d+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Tab => '\t',
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Some(Self::Comma),
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => Some(Self::Tab),
            _ => None,
        }
    }

    /// Guess from the header line; used for stdin and unknown extensions.
    pub fn sniff(text: &str) -> Self {
        let header = text.trim_start().lines().next().unwrap_or("");
        let tabs = header.matches('\t').count();
        let commas = header.matches(',').count();
        if tabs > commas { Self::Tab } else { Self::Comma }
    }
}

/// The six columns every data file must declare, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    ParentId,
    Name,
    Description,
    IconUrl,
    Url,
}

impl Field {
    pub const REQUIRED: [Field; 6] = [
        Field::Id,
        Field::ParentId,
        Field::Name,
        Field::Description,
        Field::IconUrl,
        Field::Url,
    ];

    const MATCH_ORDER: [Field; 6] = [
        Field::ParentId,
        Field::IconUrl,
        Field::Id,
        Field::Name,
        Field::Description,
        Field::Url,
    ];

    /// Header fragments accepted for this column, matched case-insensitively
    /// anywhere inside a header cell.
    fn header_keys(self) -> &'static [&'static str] {
        match self {
            Field::Id => &["目標id", "id"],
            Field::ParentId => &["親目標id", "parent"],
            Field::Name => &["目標名", "name", "title"],
            Field::Description => &["説明", "description", "desc"],
            Field::IconUrl => &["アイコン", "icon"],
            Field::Url => &["url", "link"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Id => "目標ID (id)",
            Field::ParentId => "親目標ID (parent id)",
            Field::Name => "目標名 (name)",
            Field::Description => "説明 (description)",
            Field::IconUrl => "アイコンURL (icon url)",
            Field::Url => "URL (url)",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no header row (a data file needs a header line and at least one data line)")]
    MissingHeaderRow,
    #[error("invalid header, missing columns: {}", join_fields(.missing))]
    MissingHeaders { missing: Vec<Field> },
    #[error("not a CSV/TSV file: {0}")]
    UnsupportedFile(String),
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn is_data_file(path: &Path) -> bool {
    Delimiter::from_path(path).is_some()
}

/// File name without its `.csv`/`.tsv` extension.
pub fn sheet_name_from_path(path: &Path) -> String {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("sheet");
    if is_data_file(path) {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            return stem.to_string();
        }
    }
    file_name.to_string()
}

pub fn parse_sheet(name: &str, text: &str, delimiter: Delimiter) -> Result<Sheet, ParseError> {
    Ok(Sheet::new(name, parse_nodes(text, delimiter)?))
}

pub fn parse_nodes(text: &str, delimiter: Delimiter) -> Result<Vec<GoalNode>, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();
    if lines.len() < 2 {
        return Err(ParseError::MissingHeaderRow);
    }
    let headers = split_record(lines[0].1, delimiter);
    validate_headers(&headers)?;

    let mut nodes = Vec::new();
    for &(line_no, line) in &lines[1..] {
        let values = split_record(line, delimiter);
        if values.len() < Field::REQUIRED.len() {
            log::debug!(
                "dropping line {}: {} fields, need {}",
                line_no + 1,
                values.len(),
                Field::REQUIRED.len()
            );
            continue;
        }
        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        nodes.push(GoalNode {
            id: next(),
            parent_id: next(),
            name: next(),
            description: next(),
            icon_url: next(),
            url: next(),
            x: parse_coord(&next()),
            y: parse_coord(&next()),
        });
    }
    Ok(nodes)
}

/// Each header cell counts for at most one field. Fields whose keys contain
/// another field's key (`parent id` vs `id`, `icon url` vs `url`) claim cells
/// first.
pub fn validate_headers(headers: &[String]) -> Result<(), ParseError> {
    let mut found = Vec::with_capacity(Field::REQUIRED.len());
    for header in headers {
        let lowered = header.to_lowercase();
        let claimed = Field::MATCH_ORDER.into_iter().find(|field| {
            field
                .header_keys()
                .iter()
                .any(|key| lowered.contains(key))
        });
        if let Some(field) = claimed {
            found.push(field);
        }
    }
    let missing: Vec<Field> = Field::REQUIRED
        .into_iter()
        .filter(|field| !found.contains(field))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ParseError::MissingHeaders { missing })
    }
}

/// Splits one line on `delimiter`. Double quotes toggle quoting, `""` inside
/// quotes is a literal quote, and every field is trimmed.
pub fn split_record(line: &str, delimiter: Delimiter) -> Vec<String> {
    let delim = delimiter.as_char();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if ch == delim && !in_quotes {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Leading-integer parse: `"12px"` is 12, `"3.9"` is 3, anything without a
/// leading number is 0.
pub fn parse_coord(value: &str) -> i32 {
    LEADING_INT_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .map(|v| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
        .unwrap_or(0)
}
