//! Reading recipes from an uploaded spreadsheet for bulk import.
//!
//! The first worksheet is used. Its first row is a header naming the
//! columns; column order does not matter and header matching ignores case.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use crate::error::SpreadsheetError;
use crate::submission::check_length;

const TITLE: &str = "title";
const DESCRIPTION: &str = "description";
const INSTRUCTIONS: &str = "instructions";
const PREP_DURATION: &str = "prep_duration";
const COOK_DURATION: &str = "cook_duration";

/// One recipe row from a bulk import sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRecipe {
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub prep_duration: i32,
    pub cook_duration: i32,
}

struct Columns {
    title: usize,
    description: usize,
    instructions: usize,
    prep_duration: usize,
    cook_duration: usize,
}

/// Parse a workbook (xlsx, xls, xlsb or ods) into recipe rows.
///
/// Every row is parsed before returning, so one bad row fails the whole
/// sheet.
pub fn parse_workbook(data: Vec<u8>) -> Result<Vec<SheetRecipe>, SpreadsheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SpreadsheetError::NoWorksheet)??;
    parse_range(&range)
}

pub fn parse_range(range: &Range<Data>) -> Result<Vec<SheetRecipe>, SpreadsheetError> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let columns = Columns::from_header(header)?;

    let mut recipes = Vec::new();
    // Row numbers are 1-based and count the header, matching spreadsheet UIs
    for (index, row) in rows.enumerate() {
        let row_number = index + 2;
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }

        let title = text_cell(row, columns.title);
        if title.trim().is_empty() {
            return Err(SpreadsheetError::InvalidCell {
                row: row_number,
                column: TITLE,
                reason: "title is required".to_string(),
            });
        }
        if let Some(reason) = check_length(title.trim()) {
            return Err(SpreadsheetError::InvalidCell {
                row: row_number,
                column: TITLE,
                reason,
            });
        }

        recipes.push(SheetRecipe {
            title: title.trim().to_string(),
            description: text_cell(row, columns.description),
            instructions: text_cell(row, columns.instructions),
            prep_duration: int_cell(row, columns.prep_duration, row_number, PREP_DURATION)?,
            cook_duration: int_cell(row, columns.cook_duration, row_number, COOK_DURATION)?,
        });
    }

    Ok(recipes)
}

impl Columns {
    fn from_header(header: &[Data]) -> Result<Self, SpreadsheetError> {
        let find = |name: &'static str| {
            header
                .iter()
                .position(|cell| match cell {
                    Data::String(s) => s.trim().eq_ignore_ascii_case(name),
                    _ => false,
                })
                .ok_or(SpreadsheetError::MissingColumn(name))
        };

        Ok(Self {
            title: find(TITLE)?,
            description: find(DESCRIPTION)?,
            instructions: find(INSTRUCTIONS)?,
            prep_duration: find(PREP_DURATION)?,
            cook_duration: find(COOK_DURATION)?,
        })
    }
}

fn text_cell(row: &[Data], column: usize) -> String {
    match row.get(column) {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.clone(),
        Some(Data::Float(f)) if f.fract() == 0.0 => format!("{}", *f as i64),
        Some(other) => other.to_string(),
    }
}

fn int_cell(
    row: &[Data],
    column: usize,
    row_number: usize,
    name: &'static str,
) -> Result<i32, SpreadsheetError> {
    let invalid = |reason: String| SpreadsheetError::InvalidCell {
        row: row_number,
        column: name,
        reason,
    };

    match row.get(column) {
        Some(Data::Int(i)) => i32::try_from(*i).map_err(|_| invalid(format!("{} is out of range", i))),
        Some(Data::Float(f)) if f.fract() == 0.0 && *f >= i32::MIN as f64 && *f <= i32::MAX as f64 => {
            Ok(*f as i32)
        }
        Some(Data::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| invalid(format!("`{}` is not a whole number", s))),
        None | Some(Data::Empty) => Err(invalid("value is required".to_string())),
        Some(other) => Err(invalid(format!("`{}` is not a whole number", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[Data]]) -> Range<Data> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(value: &str) -> Data {
        Data::String(value.to_string())
    }

    fn header() -> Vec<Data> {
        vec![
            s("title"),
            s("description"),
            s("instructions"),
            s("prep_duration"),
            s("cook_duration"),
        ]
    }

    #[test]
    fn test_parses_rows() {
        let range = sheet(&[
            &header()[..],
            &[s("Soup"), s("Hot"), s("Boil"), Data::Float(10.0), Data::Int(20)],
            &[s("Salad"), s("Cold"), s("Toss"), s("5"), Data::Float(0.0)],
        ]);

        let recipes = parse_range(&range).unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(
            recipes[0],
            SheetRecipe {
                title: "Soup".to_string(),
                description: "Hot".to_string(),
                instructions: "Boil".to_string(),
                prep_duration: 10,
                cook_duration: 20,
            }
        );
        assert_eq!(recipes[1].prep_duration, 5);
    }

    #[test]
    fn test_columns_in_any_order() {
        let range = sheet(&[
            &[
                s("Cook_Duration"),
                s("TITLE"),
                s("prep_duration"),
                s("instructions"),
                s("description"),
            ],
            &[Data::Int(3), s("Eggs"), Data::Int(1), s("Boil"), s("")],
        ]);

        let recipes = parse_range(&range).unwrap();
        assert_eq!(recipes[0].title, "Eggs");
        assert_eq!(recipes[0].prep_duration, 1);
        assert_eq!(recipes[0].cook_duration, 3);
    }

    #[test]
    fn test_missing_column() {
        let range = sheet(&[&[s("title"), s("description")]]);
        assert!(matches!(
            parse_range(&range),
            Err(SpreadsheetError::MissingColumn("instructions"))
        ));
    }

    #[test]
    fn test_bad_duration_names_row() {
        let range = sheet(&[
            &header()[..],
            &[s("Soup"), s(""), s(""), Data::Int(1), Data::Int(2)],
            &[s("Stew"), s(""), s(""), s("soon"), Data::Int(2)],
        ]);

        match parse_range(&range) {
            Err(SpreadsheetError::InvalidCell { row, column, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "prep_duration");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let range = sheet(&[
            &header()[..],
            &[Data::Empty, Data::Empty, Data::Empty, Data::Empty, Data::Empty],
            &[s("Tea"), s(""), s(""), Data::Int(0), Data::Int(5)],
        ]);
        assert_eq!(parse_range(&range).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_title_fails() {
        let range = sheet(&[
            &header()[..],
            &[s(" "), s("x"), s("y"), Data::Int(0), Data::Int(0)],
        ]);
        assert!(matches!(
            parse_range(&range),
            Err(SpreadsheetError::InvalidCell { row: 2, column: "title", .. })
        ));
    }

    #[test]
    fn test_over_long_title_fails() {
        let long = "t".repeat(256);
        let range = sheet(&[
            &header()[..],
            &[s("Fine"), s(""), s(""), Data::Int(0), Data::Int(0)],
            &[s(&long), s(""), s(""), Data::Int(0), Data::Int(0)],
        ]);
        assert!(matches!(
            parse_range(&range),
            Err(SpreadsheetError::InvalidCell { row: 3, column: "title", .. })
        ));
    }

    #[test]
    fn test_garbage_bytes_are_a_workbook_error() {
        assert!(matches!(
            parse_workbook(b"not a spreadsheet".to_vec()),
            Err(SpreadsheetError::Workbook(_))
        ));
    }
}
