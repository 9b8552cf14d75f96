use crate::domain::model::{ExportArtifacts, Record, RenderedExport};
use crate::domain::ports::Storage;
use crate::utils::error::{Result, TedError};
use chrono::{DateTime, Local};
use regex::Regex;
use rust_xlsxwriter::{Format, Workbook};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

pub const SHEET_NAME: &str = "notices";
pub const FALLBACK_BASE_NAME: &str = "ted_results";

/// Excel refuses longer strings in a single cell.
pub const MAX_CELL_CHARS: usize = 32_767;
const MAX_COLUMNS: usize = 16_384;
const MAX_BASE_NAME_CHARS: usize = 50;

// 2^53: larger integers lose precision as spreadsheet numbers
const MAX_EXACT_INTEGER: u64 = 9_007_199_254_740_992;

static QUOTED_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("quoted term pattern"));
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("unsafe chars pattern"));

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => {
                let exact = match (n.as_i64(), n.as_u64()) {
                    (Some(i), _) => i.unsigned_abs() <= MAX_EXACT_INTEGER,
                    (None, Some(u)) => u <= MAX_EXACT_INTEGER,
                    (None, None) => true,
                };
                match n.as_f64() {
                    Some(f) if exact => Cell::Number(f),
                    _ => Cell::Text(n.to_string()),
                }
            }
            Value::String(s) => Cell::Text(s.clone()),
            // 巢狀結構轉成 JSON 字串
            Value::Array(_) | Value::Object(_) => Cell::Text(value.to_string()),
        }
    }
}

/// Records laid out as rows under the union of their keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Flattens records into a table. Columns appear in first-seen order and a
/// key missing from a record becomes an empty cell.
pub fn flatten(records: &[Record]) -> SheetTable {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns = Vec::new();
    for record in records {
        for key in record.data.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| record.get(column).map(Cell::from).unwrap_or(Cell::Empty))
                .collect()
        })
        .collect();

    SheetTable { columns, rows }
}

/// Renders the table as an `.xlsx` workbook with a single sheet.
pub fn render_spreadsheet(table: &SheetTable) -> Result<Vec<u8>> {
    if table.columns.len() > MAX_COLUMNS {
        return Err(TedError::ProcessingError {
            message: format!(
                "{} distinct fields exceed the spreadsheet limit of {} columns",
                table.columns.len(),
                MAX_COLUMNS
            ),
        });
    }

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, clip(name), &header)?;
    }
    if !table.columns.is_empty() {
        worksheet.set_freeze_panes(1, 0)?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(index + 1).map_err(|_| TedError::ProcessingError {
            message: format!("{} rows exceed the spreadsheet row limit", table.rows.len()),
        })?;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(text) => {
                    worksheet.write_string(row_num, col, clip(text))?;
                }
                Cell::Number(number) => {
                    worksheet.write_number(row_num, col, *number)?;
                }
                Cell::Bool(flag) => {
                    worksheet.write_boolean(row_num, col, *flag)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Pretty JSON array of the records exactly as received.
pub fn render_json(records: &[Record]) -> Result<Vec<u8>> {
    let mut json = serde_json::to_vec_pretty(records)?;
    json.push(b'\n');
    Ok(json)
}

fn clip(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

/// File base name for a query: its quoted terms (`FT="kassel"` → `kassel`),
/// otherwise the sanitized query itself.
pub fn default_base_name(query: &str) -> String {
    let terms: Vec<String> = QUOTED_TERM
        .captures_iter(query)
        .map(|caps| sanitize(&caps[1].to_lowercase()))
        .filter(|term| !term.is_empty())
        .collect();

    let name = if terms.is_empty() {
        sanitize(query)
    } else {
        terms.join("_")
    };

    let name: String = name.chars().take(MAX_BASE_NAME_CHARS).collect();
    let name = name.trim_matches('_');
    if name.is_empty() {
        FALLBACK_BASE_NAME.to_string()
    } else {
        name.to_string()
    }
}

pub fn timestamped(base_name: &str, now: DateTime<Local>) -> String {
    format!("{}_{}", base_name, now.format("%Y%m%d_%H%M%S"))
}

fn sanitize(text: &str) -> String {
    UNSAFE_CHARS
        .replace_all(text, "_")
        .trim_matches('_')
        .to_string()
}

/// Writes `<base>.xlsx` and `<base>.json` through a storage backend.
pub struct Exporter<S: Storage> {
    storage: S,
}

impl<S: Storage> Exporter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn render(&self, records: &[Record], base_name: &str) -> Result<RenderedExport> {
        let table = flatten(records);
        tracing::debug!(
            "Flattened {} records into {} columns",
            table.rows.len(),
            table.columns.len()
        );

        Ok(RenderedExport {
            base_name: base_name.to_string(),
            record_count: records.len(),
            spreadsheet: render_spreadsheet(&table)?,
            json: render_json(records)?,
        })
    }

    pub async fn write(&self, rendered: RenderedExport) -> Result<ExportArtifacts> {
        let spreadsheet_file = format!("{}.xlsx", rendered.base_name);
        let json_file = format!("{}.json", rendered.base_name);

        tracing::debug!(
            "Writing {} ({} bytes) and {} ({} bytes)",
            spreadsheet_file,
            rendered.spreadsheet.len(),
            json_file,
            rendered.json.len()
        );
        self.storage
            .write_file(&spreadsheet_file, &rendered.spreadsheet)
            .await?;
        self.storage.write_file(&json_file, &rendered.json).await?;

        Ok(ExportArtifacts {
            spreadsheet_path: self.storage.display_path(&spreadsheet_file),
            json_path: self.storage.display_path(&json_file),
            record_count: rendered.record_count,
        })
    }

    pub async fn export(&self, records: &[Record], base_name: &str) -> Result<ExportArtifacts> {
        let rendered = self.render(records, base_name)?;
        self.write(rendered).await
    }
}
