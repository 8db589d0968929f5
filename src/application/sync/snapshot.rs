//! Tabular snapshot parsing.
//!
//! A snapshot is the whole external sheet, row by row. The column a row starts
//! in decides what it describes:
//!
//! | first non-empty column | row                                              |
//! |------------------------|--------------------------------------------------|
//! | 0                      | menu `id, title, description`                    |
//! | 1                      | submenu `_, id, title, description`              |
//! | 2                      | dish `_, _, id, title, description, price[, %]`  |
//!
//! Submenus attach to the closest menu above them and dishes to the closest
//! submenu. Parsing threads that `(menu, submenu)` cursor through a fold.

use std::collections::HashSet;

use thiserror::Error;
use uuid::Uuid;

/// One cell; `None` for an empty cell.
pub type Cell = Option<String>;

/// One full read of the external sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    rows: Vec<Vec<Cell>>,
}

impl Snapshot {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Build from plain strings, treating blank strings as empty cells.
    pub fn from_text_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|value| {
                        let value: String = value.into();
                        (!value.trim().is_empty()).then_some(value)
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Menu,
    Submenu,
    Dish,
}

/// Column holding the dish discount percentage.
pub const DISCOUNT_COLUMN: usize = 6;

/// Kind of a row by the index of its first non-empty cell.
pub fn classify(row: &[Cell]) -> Option<RowKind> {
    match row.iter().position(|value| !is_blank(value)) {
        Some(0) => Some(RowKind::Menu),
        Some(1) => Some(RowKind::Submenu),
        Some(2) => Some(RowKind::Dish),
        _ => None,
    }
}

/// Trimmed, non-empty text of a cell.
pub fn cell(row: &[Cell], index: usize) -> Option<&str> {
    row.get(index)
        .and_then(|value| value.as_deref())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn is_blank(value: &Cell) -> bool {
    value.as_deref().is_none_or(|text| text.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMenu {
    pub id: Uuid,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSubmenu {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDish {
    pub id: Uuid,
    pub submenu_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: String,
}

/// Why a row was left out of reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowDefect {
    #[error("missing `{0}`")]
    MissingColumn(&'static str),
    #[error("`{0}` is not a valid id")]
    InvalidId(String),
    #[error("submenu row has no menu row above it")]
    OrphanSubmenu,
    #[error("dish row has no submenu row above it")]
    OrphanDish,
}

/// A malformed row, with its 1-based position in the sheet and its own id
/// when that cell still parses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {row}: {defect}")]
pub struct SkippedRow {
    pub row: usize,
    pub id: Option<Uuid>,
    pub defect: RowDefect,
}

/// Snapshot rows grouped by kind, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSnapshot {
    pub menus: Vec<SourceMenu>,
    pub submenus: Vec<SourceSubmenu>,
    pub dishes: Vec<SourceDish>,
    pub skipped: Vec<SkippedRow>,
}

impl ParsedSnapshot {
    /// Ids named by skipped rows. The store copies of these entities are
    /// left untouched until their rows are fixed.
    pub fn held_ids(&self) -> HashSet<Uuid> {
        self.skipped.iter().filter_map(|skipped| skipped.id).collect()
    }
}

/// Parent tracking state carried from row to row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub menu: Option<Uuid>,
    pub submenu: Option<Uuid>,
}

pub fn parse(snapshot: &Snapshot) -> ParsedSnapshot {
    let (_, parsed) = snapshot.rows().iter().enumerate().fold(
        (Cursor::default(), ParsedSnapshot::default()),
        |(cursor, mut parsed), (index, row)| {
            let cursor = step(cursor, index + 1, row, &mut parsed);
            (cursor, parsed)
        },
    );
    parsed
}

/// Consume one row and return the cursor for the next one.
///
/// A rejected menu or submenu row clears its slot in the cursor so that the
/// rows beneath it are rejected as orphans instead of attaching to the
/// previous parent.
fn step(cursor: Cursor, row_number: usize, row: &[Cell], parsed: &mut ParsedSnapshot) -> Cursor {
    let skip = |parsed: &mut ParsedSnapshot, defect| {
        parsed.skipped.push(SkippedRow {
            row: row_number,
            id: own_id(row),
            defect,
        })
    };

    match classify(row) {
        None => cursor,
        Some(RowKind::Menu) => match menu_row(row) {
            Ok(menu) => {
                let next = Cursor {
                    menu: Some(menu.id),
                    submenu: None,
                };
                parsed.menus.push(menu);
                next
            }
            Err(defect) => {
                skip(parsed, defect);
                Cursor::default()
            }
        },
        Some(RowKind::Submenu) => {
            let Some(menu_id) = cursor.menu else {
                skip(parsed, RowDefect::OrphanSubmenu);
                return Cursor {
                    submenu: None,
                    ..cursor
                };
            };
            match submenu_row(row, menu_id) {
                Ok(submenu) => {
                    let next = Cursor {
                        submenu: Some(submenu.id),
                        ..cursor
                    };
                    parsed.submenus.push(submenu);
                    next
                }
                Err(defect) => {
                    skip(parsed, defect);
                    Cursor {
                        submenu: None,
                        ..cursor
                    }
                }
            }
        }
        Some(RowKind::Dish) => {
            let Some(submenu_id) = cursor.submenu else {
                skip(parsed, RowDefect::OrphanDish);
                return cursor;
            };
            match dish_row(row, submenu_id) {
                Ok(dish) => parsed.dishes.push(dish),
                Err(defect) => skip(parsed, defect),
            }
            cursor
        }
    }
}

fn menu_row(row: &[Cell]) -> Result<SourceMenu, RowDefect> {
    Ok(SourceMenu {
        id: id_cell(row, 0)?,
        title: required(row, 1, "title")?,
        description: optional(row, 2),
    })
}

fn submenu_row(row: &[Cell], menu_id: Uuid) -> Result<SourceSubmenu, RowDefect> {
    Ok(SourceSubmenu {
        id: id_cell(row, 1)?,
        menu_id,
        title: required(row, 2, "title")?,
        description: optional(row, 3),
    })
}

fn dish_row(row: &[Cell], submenu_id: Uuid) -> Result<SourceDish, RowDefect> {
    Ok(SourceDish {
        id: id_cell(row, 2)?,
        submenu_id,
        title: required(row, 3, "title")?,
        description: optional(row, 4),
        price: required(row, 5, "price")?,
    })
}

/// Id in the column the row's kind keeps it in, if it parses.
fn own_id(row: &[Cell]) -> Option<Uuid> {
    let column = match classify(row)? {
        RowKind::Menu => 0,
        RowKind::Submenu => 1,
        RowKind::Dish => 2,
    };
    id_cell(row, column).ok()
}

/// Id of a dish row, for consumers that read the sheet independently of
/// the parent cursor.
pub fn dish_id(row: &[Cell]) -> Option<Uuid> {
    id_cell(row, 2).ok()
}

fn id_cell(row: &[Cell], index: usize) -> Result<Uuid, RowDefect> {
    let raw = cell(row, index).ok_or(RowDefect::MissingColumn("id"))?;
    Uuid::parse_str(raw).map_err(|_| RowDefect::InvalidId(raw.to_string()))
}

fn required(row: &[Cell], index: usize, column: &'static str) -> Result<String, RowDefect> {
    cell(row, index)
        .map(str::to_string)
        .ok_or(RowDefect::MissingColumn(column))
}

fn optional(row: &[Cell], index: usize) -> String {
    cell(row, index).unwrap_or_default().to_string()
}
