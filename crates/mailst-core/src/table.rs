//! Recipient tables in CSV form.

use crate::column::Column;
use crate::error::{Error, Result};
use crate::recipient::Recipient;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const TRUTHY: [&str; 7] = ["x", "1", "yes", "true", "y", "si", "sí"];

/// How to read a recipient table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Whether the first row holds column titles.
    pub has_headers: bool,
    /// Key of the field that marks a recipient as manually excluded.
    pub exclude_column: Option<String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            exclude_column: None,
        }
    }
}

/// Loads the recipients in the table at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a record cannot be bound.
pub fn load_recipients(
    path: &Path,
    columns: &[Column],
    options: &TableOptions,
) -> Result<Vec<Recipient>> {
    debug!("Reading recipients from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_recipients(file, columns, options)
}

/// Binds every record of a CSV table to `columns` positionally.
///
/// # Errors
///
/// Returns [`Error::Record`] with the 1-based record number when a value
/// cannot be bound, or [`Error::Csv`] for unreadable input.
pub fn read_recipients<R: Read>(
    reader: R,
    columns: &[Column],
    options: &TableOptions,
) -> Result<Vec<Recipient>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut recipients = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let values: Vec<&str> = record.iter().collect();
        let mut recipient = Recipient::build(columns, &values).map_err(|source| Error::Record {
            record: index as u64 + 1,
            source,
        })?;
        if let Some(key) = &options.exclude_column {
            let flag = recipient
                .field(key)
                .is_some_and(|value| is_truthy(&value.to_string()));
            recipient.set_excluded(flag);
        }
        recipients.push(recipient);
    }

    debug!("Loaded {} recipients", recipients.len());
    Ok(recipients)
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    TRUTHY.contains(&value.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::column::{ColumnError, GradeSpec};
    use rust_decimal::Decimal;

    fn columns() -> Vec<Column> {
        vec![
            Column::email("email"),
            Column::full_name("name"),
            Column::grade("exam", GradeSpec::out_of(Decimal::from(10))),
            Column::text("skip"),
        ]
    }

    #[test]
    fn test_read_with_headers() {
        let table = "email,name,exam,skip\n\
                     ana@example.com, ANA NÚÑEZ ,\"7,5\",\n\
                     luis@example.com,LUIS,,X\n";
        let options = TableOptions {
            exclude_column: Some("skip".into()),
            ..TableOptions::default()
        };
        let recipients = read_recipients(table.as_bytes(), &columns(), &options).unwrap();

        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[0].address().full_name(), Some("Ana Núñez"));
        assert_eq!(recipients[0].field("exam").unwrap().to_string(), "7.5");
        assert!(!recipients[0].exclude());
        assert_eq!(recipients[1].field("exam").unwrap().to_string(), "-");
        assert!(recipients[1].exclude());
    }

    #[test]
    fn test_semicolon_without_headers() {
        let table = "ana@example.com;ANA\nluis@example.com;LUIS;9\n";
        let options = TableOptions {
            delimiter: b';',
            has_headers: false,
            exclude_column: None,
        };
        let recipients = read_recipients(table.as_bytes(), &columns(), &options).unwrap();
        assert_eq!(recipients.len(), 2);
        assert!(recipients[0].field("exam").is_none());
        assert_eq!(recipients[1].field("exam").unwrap().to_string(), "9");
    }

    #[test]
    fn test_record_number_in_error() {
        let table = "email,name,exam\n\
                     ana@example.com,ANA,5\n\
                     luis@example.com,LUIS,12\n";
        let err = read_recipients(table.as_bytes(), &columns(), &TableOptions::default())
            .unwrap_err();
        match err {
            Error::Record { record, source } => {
                assert_eq!(record, 2);
                assert!(matches!(source, ColumnError::GradeOutOfRange { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truthy() {
        for value in ["x", "X", "1", "yes", "True", "y", "si", "Sí", " SÍ "] {
            assert!(is_truthy(value), "{value}");
        }
        for value in ["", "0", "no", "false", "n"] {
            assert!(!is_truthy(value), "{value}");
        }
    }
}
