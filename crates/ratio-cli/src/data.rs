//! Tabular parcel data loaded from CSV
//!
//! The first row names the columns. Cells are kept as text and parsed on
//! demand, so a table can carry identifiers and categories next to the
//! numeric columns the statistics read.

use std::{collections::HashMap, fs::File, io, path::Path};

use anyhow::{Context, bail};
use ratio_study::parcel::{AttributeSource, Parcel};

#[derive(Debug, Clone)]
pub struct ParcelTable {
    headers: csv::StringRecord,
    columns: HashMap<String, usize>,
    records: Vec<csv::StringRecord>,
}

/// Columns that make up a [`Parcel`].
#[derive(Debug, Clone, Copy)]
pub struct ParcelColumns<'a> {
    pub predicted: &'a str,
    pub sale_price: &'a str,
    pub group_by: Option<&'a str>,
}

impl ParcelTable {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open parcels file: {}", path.display()))?;
        let table = Self::from_reader(io::BufReader::new(file))
            .with_context(|| format!("Failed to read parcels CSV file: {}", path.display()))?;
        log::info!(
            "loaded {} parcel row(s) from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_reader<R>(reader: R) -> anyhow::Result<Self>
    where
        R: io::Read,
    {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = reader.headers().context("Failed to read CSV header")?.clone();
        let mut columns = HashMap::new();
        for (index, name) in headers.iter().enumerate() {
            if columns.insert(name.to_owned(), index).is_some() {
                bail!("Duplicate column: {name}");
            }
        }
        let records = reader
            .records()
            .enumerate()
            .map(|(i, record)| record.with_context(|| format!("Failed to read CSV row {}", i + 1)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            headers,
            columns,
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    pub fn column_index(&self, name: &str) -> anyhow::Result<usize> {
        self.columns
            .get(name)
            .copied()
            .with_context(|| format!("Column not found: {name}"))
    }

    pub fn rows(&self) -> impl Iterator<Item = TableRow<'_>> {
        self.records.iter().map(|record| TableRow {
            table: self,
            record,
        })
    }

    /// Builds parcels from the predicted, sale-price and grouping columns.
    ///
    /// Every predicted value and sale price must parse as a number.
    pub fn to_parcels(&self, columns: ParcelColumns<'_>) -> anyhow::Result<Vec<Parcel>> {
        let predicted = self.column_index(columns.predicted)?;
        let sale_price = self.column_index(columns.sale_price)?;
        let group = columns
            .group_by
            .map(|name| self.column_index(name))
            .transpose()?;

        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| -> anyhow::Result<Parcel> {
                let row = i + 1;
                let parse = |index: usize, name: &str| {
                    parse_number(&record[index])
                        .with_context(|| format!("Invalid {name} in row {row}"))
                };
                let mut parcel = Parcel::new(
                    parse(predicted, columns.predicted)?,
                    parse(sale_price, columns.sale_price)?,
                );
                if let Some(group) = group {
                    parcel = parcel.with_group(&record[group]);
                }
                Ok(parcel)
            })
            .collect()
    }

    /// Writes the table as CSV with an extra column appended.
    pub fn write_with_column<W>(&self, writer: W, name: &str, values: &[f64]) -> anyhow::Result<()>
    where
        W: io::Write,
    {
        if values.len() != self.records.len() {
            bail!(
                "{} value(s) for {} row(s)",
                values.len(),
                self.records.len()
            );
        }
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(self.headers.iter().chain([name]))?;
        for (record, value) in self.records.iter().zip(values) {
            let value = value.to_string();
            writer.write_record(record.iter().chain([value.as_str()]))?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn parse_number(cell: &str) -> anyhow::Result<f64> {
    if cell.is_empty() {
        bail!("value is missing");
    }
    cell.parse()
        .with_context(|| format!("'{cell}' is not a number"))
}

/// One row of a [`ParcelTable`], readable by valuation models.
#[derive(Debug, Clone, Copy)]
pub struct TableRow<'a> {
    table: &'a ParcelTable,
    record: &'a csv::StringRecord,
}

impl AttributeSource for TableRow<'_> {
    fn attribute(&self, name: &str) -> Option<f64> {
        let index = *self.table.columns.get(name)?;
        parse_number(self.record.get(index)?).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
ParcelId,Nbhd,ESP,SalesPrice,SqFt
A-1,North,100000,125000,1500
A-2,South, 90000,100000,
A-3,North,150000,160000,2100
";

    fn columns(group_by: Option<&str>) -> ParcelColumns<'_> {
        ParcelColumns {
            predicted: "ESP",
            sale_price: "SalesPrice",
            group_by,
        }
    }

    #[test]
    fn test_to_parcels() {
        let table = ParcelTable::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);

        let parcels = table.to_parcels(columns(Some("Nbhd"))).unwrap();
        assert_eq!(parcels[1].predicted_value, 90_000.0);
        assert_eq!(parcels[1].group.as_deref(), Some("South"));
        assert_eq!(parcels[2].sale_price, 160_000.0);
    }

    #[test]
    fn test_unknown_column() {
        let table = ParcelTable::from_reader(CSV.as_bytes()).unwrap();
        let err = table.to_parcels(columns(Some("Class"))).unwrap_err();
        assert_eq!(err.to_string(), "Column not found: Class");
    }

    #[test]
    fn test_invalid_number_names_row() {
        let csv = "ESP,SalesPrice\n100,abc\n";
        let table = ParcelTable::from_reader(csv.as_bytes()).unwrap();
        let err = table.to_parcels(columns(None)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid SalesPrice in row 1");
    }

    #[test]
    fn test_row_attributes() {
        let table = ParcelTable::from_reader(CSV.as_bytes()).unwrap();
        let rows = table.rows().collect::<Vec<_>>();
        assert_eq!(rows[0].attribute("SqFt"), Some(1500.0));
        assert_eq!(rows[1].attribute("SqFt"), None);
        assert_eq!(rows[0].attribute("Nbhd"), None);
        assert_eq!(rows[0].attribute("Baths"), None);
    }

    #[test]
    fn test_write_with_column() {
        let table = ParcelTable::from_reader("a,b\n1,x\n2,y\n".as_bytes()).unwrap();
        let mut out = vec![];
        table.write_with_column(&mut out, "ESP", &[10.5, 20.0]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a,b,ESP\n1,x,10.5\n2,y,20\n");
    }

    #[test]
    fn test_duplicate_column() {
        assert!(ParcelTable::from_reader("a,a\n1,2\n".as_bytes()).is_err());
    }
}
