//! Loading, merging and saving delimited trade-flow tables.

use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord, Writer};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Names of the columns holding the reporter, partner and trade value of each row.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnSelection {
    pub reporter: String,
    pub partner: String,
    pub weight: String,
    /// Read into [`TradeRecord::year`] when present.
    pub year: Option<String>,
}

impl Default for ColumnSelection {
    /// The column names of FAOSTAT detailed trade matrix exports.
    fn default() -> Self {
        Self {
            reporter: "Reporter Countries".to_owned(),
            partner: "Partner Countries".to_owned(),
            weight: "Value".to_owned(),
            year: None,
        }
    }
}

impl ColumnSelection {
    pub fn new(
        reporter: impl Into<String>,
        partner: impl Into<String>,
        weight: impl Into<String>,
    ) -> Self {
        Self {
            reporter: reporter.into(),
            partner: partner.into(),
            weight: weight.into(),
            year: None,
        }
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }
}

/// A single trade flow.
#[derive(Clone, Debug, PartialEq)]
pub struct TradeRecord {
    pub reporter: String,
    pub partner: String,
    pub value: f64,
    pub year: Option<i32>,
}

impl TradeRecord {
    pub fn new(reporter: impl Into<String>, partner: impl Into<String>, value: f64) -> Self {
        Self {
            reporter: reporter.into(),
            partner: partner.into(),
            value,
            year: None,
        }
    }
}

/// A table of string fields with a header row, as read from a CSV file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TradeTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl TradeTable {
    /// Creates an empty table with the given column names.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            headers: headers.into_iter().collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row, fields in header order.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::table::TradeTable;
    ///
    /// let mut table = TradeTable::new(["Reporter Countries", "Partner Countries", "Value"]);
    /// table.push_row(["A", "X", "10"]);
    ///
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn push_row<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rows.push(fields.into_iter().collect());
    }

    /// Reads a table from CSV data with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = reader.headers()?.clone();
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { headers, rows })
    }

    /// Reads a table from a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let table = Self::from_reader(File::open(path.as_ref())?)?;

        tracing::debug!(path = %path.as_ref().display(), rows = table.len(), "loaded table");

        Ok(table)
    }

    /// Loads several CSV files and concatenates their rows.
    ///
    /// Every file must carry the same set of columns, later files are re-ordered to the header of
    /// the first one.
    pub fn load_and_merge_csv<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut merged: Option<Self> = None;

        for path in paths {
            let table = Self::from_path(&path)?;

            match merged.as_mut() {
                None => merged = Some(table),
                Some(merged) => merged.append(table, path.as_ref())?,
            }
        }

        Ok(merged.unwrap_or_default())
    }

    /// Loads several CSV files and keeps only the rows of one year.
    pub fn load_year<I, P>(paths: I, year_column: &str, year: i32) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::load_and_merge_csv(paths)?.filter_year(year_column, year)
    }

    /// Returns a table with only the rows of one year, fields being compared as numbers.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::table::TradeTable;
    ///
    /// let mut table = TradeTable::new(["Year", "Value"]);
    /// table.push_row(["2022.0", "10"]);
    /// table.push_row(["2023", "20"]);
    ///
    /// assert_eq!(table.filter_year("Year", 2022)?.len(), 1);
    /// # Ok::<(), faonet::Error>(())
    /// ```
    pub fn filter_year(&self, column: &str, year: i32) -> Result<Self> {
        let i = self.column(column)?;

        let mut indices = Vec::new();
        for row in 0..self.len() {
            if parse_year(column, row, self.field(row, i))? == year {
                indices.push(row);
            }
        }

        Ok(self.select_rows(&indices))
    }

    /// Returns a table with only the rows whose `column` field equals `value`.
    pub fn filter_eq(&self, column: &str, value: &str) -> Result<Self> {
        let i = self.column(column)?;

        Ok(Self {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| row.get(i).map(str::trim) == Some(value))
                .cloned()
                .collect(),
        })
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the position of a column.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| Error::MissingColumn(name.to_owned()))
    }

    /// Returns the field at `(row, column)`, empty if the row is short.
    pub fn field(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|record| record.get(column))
            .unwrap_or_default()
    }

    /// Parses a column as finite, non-negative numbers.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::table::TradeTable;
    ///
    /// let mut table = TradeTable::new(["Value"]);
    /// table.push_row(["10"]);
    /// table.push_row(["abc"]);
    ///
    /// assert!(table.numbers("Value").is_err());
    /// ```
    pub fn numbers(&self, column: &str) -> Result<Vec<f64>> {
        let i = self.column(column)?;

        (0..self.len())
            .map(|row| parse_value(column, row, self.field(row, i)))
            .collect()
    }

    /// Extracts the trade records selected by `columns`.
    ///
    /// Fails on an empty table, a missing column, a blank identifier or an invalid value.
    pub fn records(&self, columns: &ColumnSelection) -> Result<Vec<TradeRecord>> {
        if self.is_empty() {
            return Err(Error::EmptyTable);
        }

        let reporter = self.column(&columns.reporter)?;
        let partner = self.column(&columns.partner)?;
        let weight = self.column(&columns.weight)?;
        let year = columns
            .year
            .as_deref()
            .map(|name| self.column(name).map(|i| (name, i)))
            .transpose()?;

        (0..self.len())
            .map(|row| {
                let year = match year {
                    Some((name, i)) => Some(parse_year(name, row, self.field(row, i))?),
                    None => None,
                };

                Ok(TradeRecord {
                    reporter: parse_identifier(&columns.reporter, row, self.field(row, reporter))?,
                    partner: parse_identifier(&columns.partner, row, self.field(row, partner))?,
                    value: parse_value(&columns.weight, row, self.field(row, weight))?,
                    year,
                })
            })
            .collect()
    }

    /// Returns a copy of the table with an extra column.
    pub(crate) fn with_column<I>(&self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut headers = self.headers.clone();
        headers.push_field(name);

        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut row = row.clone();
                row.push_field(&value);
                row
            })
            .collect();

        Self { headers, rows }
    }

    /// Returns a table holding the given rows, in that order.
    pub(crate) fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// Writes the table as CSV, header first.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Saves the table to a CSV file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_csv(File::create(path)?)
    }

    //
    // Private
    //

    fn append(&mut self, other: Self, path: &Path) -> Result<()> {
        let mismatch = || Error::HeaderMismatch {
            path: PathBuf::from(path),
        };

        if other.headers.len() != self.headers.len() {
            return Err(mismatch());
        }

        // Position in `other` of each of our columns.
        let order = self
            .headers
            .iter()
            .map(|name| other.column(name).map_err(|_| mismatch()))
            .collect::<Result<Vec<usize>>>()?;

        self.rows.extend(
            other
                .rows
                .iter()
                .map(|row| order.iter().map(|&i| row.get(i).unwrap_or_default()).collect()),
        );

        Ok(())
    }
}

//
// Helpers
//

fn parse_value(column: &str, row: usize, field: &str) -> Result<f64> {
    let invalid = || Error::InvalidNumber {
        column: column.to_owned(),
        row,
        value: field.to_owned(),
    };

    let value: f64 = field.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }

    Ok(value)
}

/// Accepts integral floats too, as written by tools that store years as reals (`2022.0`).
fn parse_year(column: &str, row: usize, field: &str) -> Result<i32> {
    let invalid = || Error::InvalidNumber {
        column: column.to_owned(),
        row,
        value: field.to_owned(),
    };

    let field = field.trim();
    if let Ok(year) = field.parse::<i32>() {
        return Ok(year);
    }

    let year: f64 = field.parse().map_err(|_| invalid())?;
    if year.fract() != 0.0 || year < f64::from(i32::MIN) || year > f64::from(i32::MAX) {
        return Err(invalid());
    }

    Ok(year as i32)
}

fn parse_identifier(column: &str, row: usize, field: &str) -> Result<String> {
    let field = field.trim();
    if field.is_empty() {
        return Err(Error::MissingIdentifier {
            column: column.to_owned(),
            row,
        });
    }

    Ok(field.to_owned())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    const HEADER: &str = "Reporter Countries,Partner Countries,Year,Value\n";

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn sample() -> TradeTable {
        let data = format!("{HEADER}A,X,2023,10\nA,Y,2023,20\nB,Y,2022,30\n");
        TradeTable::from_reader(data.as_bytes()).unwrap()
    }

    #[test]
    fn from_reader() {
        let table = sample();

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.headers().collect::<Vec<_>>(),
            vec!["Reporter Countries", "Partner Countries", "Year", "Value"]
        );
        assert_eq!(table.field(2, 0), "B");
        assert_eq!(table.field(9, 0), "");
    }

    #[test]
    fn load_and_merge_csv() {
        let dir = TempDir::new().unwrap();
        let first = write_file(&dir, "first.csv", &format!("{HEADER}A,X,2023,10\nA,Y,2023,20\n"));
        // Same columns in a different order.
        let second = write_file(
            &dir,
            "second.csv",
            "Value,Year,Partner Countries,Reporter Countries\n30,2023,Y,B\n40,2022,Z,C\n",
        );

        let merged = TradeTable::load_and_merge_csv([&first, &second]).unwrap();

        assert_eq!(merged.len(), 4);
        assert_eq!(merged.rows()[2].iter().collect::<Vec<_>>(), vec!["B", "Y", "2023", "30"]);
    }

    #[test]
    fn load_and_merge_csv_header_mismatch() {
        let dir = TempDir::new().unwrap();
        let first = write_file(&dir, "first.csv", &format!("{HEADER}A,X,2023,10\n"));
        let second = write_file(&dir, "second.csv", "A\n1\n");

        let result = TradeTable::load_and_merge_csv([&first, &second]);

        assert!(matches!(result, Err(Error::HeaderMismatch { path }) if path == second));
    }

    #[test]
    fn load_and_merge_csv_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = TradeTable::load_and_merge_csv([dir.path().join("missing.csv")]);

        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn load_year() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "flows.csv",
            &format!("{HEADER}A,X,2023,10\nA,Y,2022,20\nB,Y,2023,30\n"),
        );

        let table = TradeTable::load_year([path], "Year", 2023).unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.rows().iter().all(|row| &row[2] == "2023"));
    }

    #[test]
    fn filter_eq() {
        let filtered = sample().filter_eq("Reporter Countries", "A").unwrap();

        assert_eq!(filtered.len(), 2);
        assert!(matches!(
            sample().filter_eq("Exporter", "A"),
            Err(Error::MissingColumn(_))
        ));
    }

    #[test]
    fn filter_year_compares_numbers() {
        let data = format!("{HEADER}A,X,2022.0,10\nA,Y, 2022 ,20\nB,Y,2023,30\n");
        let table = TradeTable::from_reader(data.as_bytes()).unwrap();

        let filtered = table.filter_year("Year", 2022).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.field(0, 1), "X");
        assert!(matches!(
            table.filter_year("Year", 1999).map(|t| t.len()),
            Ok(0)
        ));
    }

    #[test]
    fn filter_year_rejects_fractional_years() {
        let data = format!("{HEADER}A,X,2022.5,10\n");
        let table = TradeTable::from_reader(data.as_bytes()).unwrap();

        assert!(matches!(
            table.filter_year("Year", 2022),
            Err(Error::InvalidNumber { row: 0, .. })
        ));
    }

    #[test]
    fn records() {
        let columns = ColumnSelection::default().with_year("Year");
        let records = sample().records(&columns).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0],
            TradeRecord {
                reporter: "A".to_owned(),
                partner: "X".to_owned(),
                value: 10.0,
                year: Some(2023),
            }
        );
        assert_eq!(records[2].year, Some(2022));
    }

    #[test]
    fn records_missing_column() {
        let columns = ColumnSelection::new("Reporter Countries", "Partner Countries", "Amount");

        assert!(
            matches!(sample().records(&columns), Err(Error::MissingColumn(name)) if name == "Amount")
        );
    }

    #[test]
    fn records_empty_table() {
        let table = TradeTable::new(["Reporter Countries", "Partner Countries", "Value"]);

        assert!(matches!(
            table.records(&ColumnSelection::default()),
            Err(Error::EmptyTable)
        ));
    }

    #[test]
    fn records_invalid_values() {
        for value in ["ten", "NaN", "-1", ""] {
            let mut table = TradeTable::new(["Reporter Countries", "Partner Countries", "Value"]);
            table.push_row(["A", "X", "1"]);
            table.push_row(["A", "Y", value]);

            let result = table.records(&ColumnSelection::default());

            assert!(
                matches!(result, Err(Error::InvalidNumber { row: 1, .. })),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn records_blank_identifier() {
        let mut table = TradeTable::new(["Reporter Countries", "Partner Countries", "Value"]);
        table.push_row(["A", " ", "1"]);

        assert!(matches!(
            table.records(&ColumnSelection::default()),
            Err(Error::MissingIdentifier { row: 0, .. })
        ));
    }

    #[test]
    fn save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let table = sample();

        table.save(&path).unwrap();

        assert_eq!(TradeTable::from_path(&path).unwrap(), table);
    }
}
