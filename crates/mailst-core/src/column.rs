//! Columns: typed rules turning one raw cell into recipient fields.
//!
//! A [`Column`] is bound positionally to one cell of the recipient table and
//! produces one or more `(key, value)` pairs:
//!
//! | kind | fields |
//! |------|--------|
//! | text | `key` |
//! | name, full name | `key`, `key_uncapitalized` |
//! | grade | `key`, plus `key_max` when a maximum is configured |
//! | file | `key` (an [`AttachmentFile`]) |

use crate::attachment::AttachmentFile;
use crate::value::{FieldValue, Grade};
use mailst_mime::ContentType;
use rust_decimal::Decimal;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Errors raised while declaring or binding columns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColumnError {
    /// A column was declared with incompatible roles.
    #[error("Invalid configuration for column {key}: {reason}")]
    InvalidColumnConfiguration {
        /// Column key.
        key: String,
        /// What is wrong.
        reason: String,
    },

    /// A grade cell is not a decimal number.
    #[error("Wrong decimal format for {key}: {value:?}")]
    InvalidGradeFormat {
        /// Column key.
        key: String,
        /// Offending raw cell.
        value: String,
    },

    /// A grade lies outside its configured bounds.
    #[error("Grade {value} for {key} {bound}")]
    GradeOutOfRange {
        /// Column key.
        key: String,
        /// The grade, with a decimal comma read as a point.
        value: String,
        /// The bound that was crossed.
        bound: Bound,
    },

    /// A content type is not of the form `type/subtype`.
    #[error("Invalid content type {0:?}")]
    InvalidContentType(String),

    /// A filename template has an unsupported placeholder or unbalanced braces.
    #[error("Invalid filename template {template:?}: {reason}")]
    InvalidFilenameTemplate {
        /// The template.
        template: String,
        /// What is wrong.
        reason: String,
    },
}

/// Grade bound crossed by a [`ColumnError::GradeOutOfRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Above the maximum.
    Max(Decimal),
    /// Below the minimum.
    Min(Decimal),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Max(max) => write!(f, "greater than its maximum value {max}"),
            Self::Min(min) => write!(f, "lower than its minimum value {min}"),
        }
    }
}

/// Formats a name written in arbitrary case, usually all caps.
///
/// Every space separated word has its case swapped and is then capitalized;
/// every hyphen separated part after the first is capitalized too. The result
/// is trimmed. `"JOSÉ GARCIA-LOPEZ"` becomes `"José Garcia-Lopez"` and
/// `"MUÑOZ"` becomes `"Muñoz"`.
#[must_use]
pub fn uncapitalize(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let word = capitalize(&swap_case(word));
            let mut parts = word.split('-');
            let first = parts.next().unwrap_or_default().to_string();
            parts.fold(first, |mut acc, part| {
                acc.push('-');
                acc.push_str(&capitalize(part));
                acc
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn swap_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_uppercase() {
            out.extend(c.to_lowercase());
        } else if c.is_lowercase() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        let mut out = titlecase(first);
        out.push_str(&chars.as_str().to_lowercase());
        out
    })
}

/// Title case of one character.
///
/// Differs from upper case for the Latin digraphs, the Greek letters with
/// iota subscript and characters whose upper case is several letters
/// (`ß` gives `Ss`).
fn titlecase(c: char) -> String {
    let title = match c {
        '\u{1C4}'..='\u{1C6}' => '\u{1C5}',
        '\u{1C7}'..='\u{1C9}' => '\u{1C8}',
        '\u{1CA}'..='\u{1CC}' => '\u{1CB}',
        '\u{1F1}'..='\u{1F3}' => '\u{1F2}',
        '\u{1F80}'..='\u{1FAF}' => char::from_u32(u32::from(c) | 0x8).unwrap_or(c),
        '\u{1FB3}' | '\u{1FBC}' => '\u{1FBC}',
        '\u{1FC3}' | '\u{1FCC}' => '\u{1FCC}',
        '\u{1FF3}' | '\u{1FFC}' => '\u{1FFC}',
        _ => {
            let mut upper = c.to_uppercase();
            let mut out: String = upper.next().into_iter().collect();
            out.extend(upper.flat_map(char::to_lowercase));
            return out;
        }
    };
    title.to_string()
}

/// Grade validation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeSpec {
    /// Maximum grade; also emitted as the `key_max` field.
    pub max: Option<Decimal>,
    /// Minimum grade, `None` to disable the check.
    pub min: Option<Decimal>,
    /// Reject grades above `max`.
    pub check_max: bool,
}

impl Default for GradeSpec {
    fn default() -> Self {
        Self {
            max: None,
            min: Some(Decimal::ZERO),
            check_max: true,
        }
    }
}

impl GradeSpec {
    /// Grades out of `max`, with the default minimum of zero.
    #[must_use]
    pub fn out_of(max: Decimal) -> Self {
        Self {
            max: Some(max),
            ..Self::default()
        }
    }

    /// Parses and validates one grade cell.
    ///
    /// An empty cell is [`Grade::Ungraded`]. A comma is accepted as the
    /// decimal separator, surrounding whitespace is ignored and scientific
    /// notation is allowed.
    ///
    /// Grades are held as [`Decimal`], so at most 28 decimal places are kept
    /// and magnitudes are capped near 7.9e28. A number too large to hold is
    /// reported against the bound it crosses, or as a format error when that
    /// bound is not checked.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::InvalidGradeFormat`] for non-numeric input and
    /// [`ColumnError::GradeOutOfRange`] for a grade outside the bounds.
    pub fn grade(&self, key: &str, raw: &str) -> Result<Grade, ColumnError> {
        if raw.is_empty() {
            return Ok(Grade::Ungraded);
        }

        let normalized = raw.trim().replace(',', ".");
        let out_of_range = |bound| ColumnError::GradeOutOfRange {
            key: key.to_string(),
            value: normalized.clone(),
            bound,
        };

        let Ok(value) =
            Decimal::from_str(&normalized).or_else(|_| Decimal::from_scientific(&normalized))
        else {
            return Err(self.overflow_bound(&normalized).map_or_else(
                || ColumnError::InvalidGradeFormat {
                    key: key.to_string(),
                    value: raw.to_string(),
                },
                out_of_range,
            ));
        };

        if let Some(max) = self.max.filter(|max| self.check_max && value > *max) {
            return Err(out_of_range(Bound::Max(max)));
        }
        if let Some(min) = self.min.filter(|min| value < *min) {
            return Err(out_of_range(Bound::Min(min)));
        }

        Ok(Grade::Value(value))
    }

    /// The checked bound crossed by a number too large for [`Decimal`].
    fn overflow_bound(&self, normalized: &str) -> Option<Bound> {
        let number = normalized.parse::<f64>().ok().filter(|n| n.abs() >= 1.0)?;
        if number > 0.0 {
            self.max.filter(|_| self.check_max).map(Bound::Max)
        } else {
            self.min.map(Bound::Min)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Value,
}

/// How a file column turns a cell into a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSpec {
    base_path: Option<PathBuf>,
    template: Option<Vec<Segment>>,
    content_type: Option<ContentType>,
}

impl FileSpec {
    /// Uses the cell verbatim as the path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins every filename to `base_path`. Absolute filenames are kept.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Sets a filename template where `{}` or `{0}` stands for the cell.
    /// `{{` and `}}` are literal braces.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::InvalidFilenameTemplate`] for other
    /// placeholders or unbalanced braces.
    pub fn with_filename_template(mut self, template: &str) -> Result<Self, ColumnError> {
        self.template = Some(parse_filename_template(template)?);
        Ok(self)
    }

    /// Sets the attachment content type, e.g. `application/pdf`.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::InvalidContentType`] unless it is `type/subtype`.
    pub fn with_content_type(mut self, content_type: &str) -> Result<Self, ColumnError> {
        let parsed = ContentType::parse(content_type)
            .map_err(|_| ColumnError::InvalidContentType(content_type.to_string()))?;
        self.content_type = Some(parsed);
        Ok(self)
    }

    /// Resolves the path for one cell. The file is not checked.
    #[must_use]
    pub fn filename(&self, raw: &str) -> PathBuf {
        let filename = self.template.as_ref().map_or_else(
            || raw.to_string(),
            |segments| {
                segments
                    .iter()
                    .map(|segment| match segment {
                        Segment::Literal(text) => text.as_str(),
                        Segment::Value => raw,
                    })
                    .collect()
            },
        );
        match &self.base_path {
            Some(base) => base.join(filename),
            None => PathBuf::from(filename),
        }
    }

    fn attachment(&self, raw: &str) -> AttachmentFile {
        AttachmentFile::new(self.filename(raw), self.content_type.clone())
    }
}

fn parse_filename_template(template: &str) -> Result<Vec<Segment>, ColumnError> {
    let invalid = |reason: &str| ColumnError::InvalidFilenameTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => field.push(c),
                        None => return Err(invalid("unterminated placeholder")),
                    }
                }
                if !matches!(field.as_str(), "" | "0") {
                    return Err(invalid("only {} or {0} is supported"));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Value);
            }
            '}' => return Err(invalid("single '}'")),
            c => literal.push(c),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// The kind of a column, deciding how cells are bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// Cell copied verbatim.
    Text,
    /// Person name, plus its uncapitalized form.
    Name,
    /// Name column whose uncapitalized form becomes the display name.
    FullName,
    /// Grade.
    Grade(GradeSpec),
    /// Attachment path.
    File(FileSpec),
}

/// Roles a column plays for the recipient address and attachments.
///
/// At most one may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Roles {
    /// The cell is the recipient email.
    pub email: bool,
    /// The cell names a file to attach.
    pub file: bool,
    /// The cell is the recipient display name.
    pub full_name: bool,
}

impl Roles {
    fn count(self) -> u8 {
        u8::from(self.email) + u8::from(self.file) + u8::from(self.full_name)
    }
}

/// A typed column of the recipient table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    key: String,
    kind: ColumnKind,
    roles: Roles,
}

impl Column {
    /// Plain text column.
    #[must_use]
    pub fn text(key: impl Into<String>) -> Self {
        Self::unchecked(key, ColumnKind::Text, Roles::default())
    }

    /// Text column holding the recipient email.
    #[must_use]
    pub fn email(key: impl Into<String>) -> Self {
        let roles = Roles {
            email: true,
            ..Roles::default()
        };
        Self::unchecked(key, ColumnKind::Text, roles)
    }

    /// Name column.
    #[must_use]
    pub fn name(key: impl Into<String>) -> Self {
        Self::unchecked(key, ColumnKind::Name, Roles::default())
    }

    /// Name column providing the recipient display name.
    #[must_use]
    pub fn full_name(key: impl Into<String>) -> Self {
        let roles = Roles {
            full_name: true,
            ..Roles::default()
        };
        Self::unchecked(key, ColumnKind::FullName, roles)
    }

    /// Grade column.
    #[must_use]
    pub fn grade(key: impl Into<String>, spec: GradeSpec) -> Self {
        Self::unchecked(key, ColumnKind::Grade(spec), Roles::default())
    }

    /// File column.
    #[must_use]
    pub fn file(key: impl Into<String>, spec: FileSpec) -> Self {
        let roles = Roles {
            file: true,
            ..Roles::default()
        };
        Self::unchecked(key, ColumnKind::File(spec), roles)
    }

    /// Declares a column from a kind plus explicit roles.
    ///
    /// File and full name kinds imply their role; a name column with the
    /// full name role becomes a full name column.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::InvalidColumnConfiguration`] if more than one
    /// role is set, or a file role is given to a column that is not a file
    /// column.
    pub fn from_roles(
        key: impl Into<String>,
        kind: ColumnKind,
        roles: Roles,
    ) -> Result<Self, ColumnError> {
        let key = key.into();
        let invalid = |reason: &str| ColumnError::InvalidColumnConfiguration {
            key: key.clone(),
            reason: reason.to_string(),
        };

        let kind = match kind {
            ColumnKind::Name if roles.full_name => ColumnKind::FullName,
            kind => kind,
        };
        let roles = Roles {
            email: roles.email,
            file: roles.file || matches!(kind, ColumnKind::File(_)),
            full_name: roles.full_name || matches!(kind, ColumnKind::FullName),
        };

        if roles.count() > 1 {
            return Err(invalid("email, file and full name roles are incompatible"));
        }
        if roles.file && !matches!(kind, ColumnKind::File(_)) {
            return Err(invalid("only file columns can hold attachments"));
        }

        Ok(Self { key, kind, roles })
    }

    fn unchecked(key: impl Into<String>, kind: ColumnKind, roles: Roles) -> Self {
        Self {
            key: key.into(),
            kind,
            roles,
        }
    }

    /// Column key, the base name of its fields.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Column kind.
    #[must_use]
    pub const fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    /// The column holds the recipient email.
    #[must_use]
    pub const fn is_email(&self) -> bool {
        self.roles.email
    }

    /// The column holds an attachment.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        self.roles.file
    }

    /// The column holds the recipient display name.
    #[must_use]
    pub const fn is_full_name(&self) -> bool {
        self.roles.full_name
    }

    /// Binds one raw cell to its fields, in emission order.
    ///
    /// # Errors
    ///
    /// Returns grade errors for grade columns; other kinds never fail.
    pub fn bind(&self, raw: &str) -> Result<Vec<(String, FieldValue)>, ColumnError> {
        let key = self.key.clone();
        Ok(match &self.kind {
            ColumnKind::Text => vec![(key, FieldValue::from(raw))],
            ColumnKind::Name | ColumnKind::FullName => vec![
                (key.clone(), FieldValue::from(raw)),
                (format!("{key}_uncapitalized"), FieldValue::Text(uncapitalize(raw))),
            ],
            ColumnKind::Grade(spec) => {
                let mut fields = vec![(key.clone(), spec.grade(&key, raw)?.into())];
                if let Some(max) = spec.max {
                    fields.push((format!("{key}_max"), Grade::Value(max).into()));
                }
                fields
            }
            ColumnKind::File(spec) => vec![(key, FieldValue::Attachment(spec.attachment(raw)))],
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::Path;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_uncapitalize() {
        assert_eq!(uncapitalize("JOSÉ GARCIA-LOPEZ"), "José Garcia-Lopez");
        assert_eq!(uncapitalize("MUÑOZ ÑÚÑEZ"), "Muñoz Ñúñez");
        assert_eq!(uncapitalize("maría del mar"), "María Del Mar");
        assert_eq!(uncapitalize("  ANA "), "Ana");
        assert_eq!(uncapitalize("pEDRO"), "Pedro");
        assert_eq!(uncapitalize("ANA-MARÍA-LUISA"), "Ana-María-Luisa");
        assert_eq!(uncapitalize(""), "");
    }

    #[test]
    fn test_capitalize_uses_title_case() {
        assert_eq!(uncapitalize("\u{1C6}AVID"), "\u{1C5}avid");
        assert_eq!(uncapitalize("\u{1C9}UBICA"), "\u{1C8}ubica");
        assert_eq!(capitalize("\u{1C4}ORE"), "\u{1C5}ore");
        assert_eq!(capitalize("ßa"), "Ssa");
        assert_eq!(capitalize("\u{FB01}n"), "Fin");
        assert_eq!(capitalize("\u{1FB3}"), "\u{1FBC}");
        assert_eq!(capitalize("\u{1F80}X"), "\u{1F88}x");
        assert_eq!(uncapitalize("DE LA PEÑA-ÑÚÑEZ"), "De La Peña-Ñúñez");
    }

    #[test]
    fn test_grade_blank_is_ungraded() {
        let spec = GradeSpec::out_of(dec("10"));
        assert_eq!(spec.grade("exam", "").unwrap(), Grade::Ungraded);
    }

    #[test]
    fn test_grade_separators_and_scale() {
        let spec = GradeSpec::default();
        assert_eq!(spec.grade("exam", "7,5").unwrap(), Grade::Value(dec("7.5")));
        assert_eq!(spec.grade("exam", " 7.50 ").unwrap().to_string(), "7.50");
        assert_eq!(spec.grade("exam", "1e1").unwrap(), Grade::Value(dec("10")));
    }

    #[test]
    fn test_grade_invalid_format() {
        let err = GradeSpec::default().grade("exam", "siete").unwrap_err();
        assert_eq!(
            err,
            ColumnError::InvalidGradeFormat {
                key: "exam".into(),
                value: "siete".into()
            }
        );
        assert_eq!(err.to_string(), "Wrong decimal format for exam: \"siete\"");
        assert!(GradeSpec::default().grade("exam", "7,5,1").is_err());
        assert!(GradeSpec::default().grade("exam", "   ").is_err());
    }

    #[test]
    fn test_grade_bounds() {
        let spec = GradeSpec::out_of(dec("10"));
        assert!(spec.grade("exam", "10").is_ok());
        assert!(spec.grade("exam", "0").is_ok());

        let err = spec.grade("exam", "10.5").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Grade 10.5 for exam greater than its maximum value 10"
        );
        let err = spec.grade("exam", "-1").unwrap_err();
        assert!(matches!(
            err,
            ColumnError::GradeOutOfRange {
                bound: Bound::Min(_),
                ..
            }
        ));
    }

    #[test]
    fn test_grade_too_large_for_decimal() {
        let spec = GradeSpec::out_of(dec("10"));
        let err = spec.grade("exam", "1e100").unwrap_err();
        assert_eq!(
            err,
            ColumnError::GradeOutOfRange {
                key: "exam".to_string(),
                value: "1e100".to_string(),
                bound: Bound::Max(dec("10")),
            }
        );
        let err = spec.grade("exam", "-1e100").unwrap_err();
        assert!(matches!(
            err,
            ColumnError::GradeOutOfRange {
                bound: Bound::Min(_),
                ..
            }
        ));

        let unchecked = GradeSpec {
            max: Some(dec("10")),
            min: None,
            check_max: false,
        };
        assert!(matches!(
            unchecked.grade("exam", "1e100"),
            Err(ColumnError::InvalidGradeFormat { .. })
        ));
        assert!(matches!(
            spec.grade("exam", "ten"),
            Err(ColumnError::InvalidGradeFormat { .. })
        ));
    }

    #[test]
    fn test_grade_checks_can_be_disabled() {
        let spec = GradeSpec {
            max: Some(dec("10")),
            min: None,
            check_max: false,
        };
        assert!(spec.grade("exam", "12").is_ok());
        assert!(spec.grade("exam", "-3").is_ok());
    }

    #[test]
    fn test_file_spec() {
        let spec = FileSpec::new()
            .with_base_path("reports")
            .with_filename_template("grade-{}.pdf")
            .unwrap();
        assert_eq!(spec.filename("ana"), Path::new("reports/grade-ana.pdf"));

        let spec = FileSpec::new().with_filename_template("{{{0}}}.txt").unwrap();
        assert_eq!(spec.filename("x"), Path::new("{x}.txt"));

        assert_eq!(FileSpec::new().filename("a.pdf"), Path::new("a.pdf"));
        let spec = FileSpec::new().with_base_path("reports");
        assert_eq!(spec.filename("/tmp/a.pdf"), Path::new("/tmp/a.pdf"));
    }

    #[test]
    fn test_file_spec_rejects_bad_input() {
        assert!(FileSpec::new().with_filename_template("{1}.pdf").is_err());
        assert!(FileSpec::new().with_filename_template("{name}.pdf").is_err());
        assert!(FileSpec::new().with_filename_template("{.pdf").is_err());
        assert!(FileSpec::new().with_filename_template("}.pdf").is_err());
        assert_eq!(
            FileSpec::new().with_content_type("pdf").unwrap_err(),
            ColumnError::InvalidContentType("pdf".into())
        );
    }

    #[test]
    fn test_from_roles() {
        let both = Roles {
            email: true,
            full_name: true,
            ..Roles::default()
        };
        assert!(matches!(
            Column::from_roles("x", ColumnKind::Text, both),
            Err(ColumnError::InvalidColumnConfiguration { .. })
        ));

        let email = Roles {
            email: true,
            ..Roles::default()
        };
        assert!(Column::from_roles("x", ColumnKind::File(FileSpec::new()), email).is_err());
        assert!(Column::from_roles("x", ColumnKind::FullName, email).is_err());

        let file = Roles {
            file: true,
            ..Roles::default()
        };
        assert!(Column::from_roles("x", ColumnKind::Text, file).is_err());

        let full_name = Roles {
            full_name: true,
            ..Roles::default()
        };
        let column = Column::from_roles("name", ColumnKind::Name, full_name).unwrap();
        assert_eq!(column.kind(), &ColumnKind::FullName);
        assert!(column.is_full_name());

        let column = Column::from_roles("mail", ColumnKind::Text, email).unwrap();
        assert_eq!(column, Column::email("mail"));
    }

    #[test]
    fn test_bind_name() {
        let fields = Column::full_name("name").bind("ANA NÚÑEZ").unwrap();
        assert_eq!(
            fields,
            vec![
                ("name".to_string(), FieldValue::from("ANA NÚÑEZ")),
                ("name_uncapitalized".to_string(), FieldValue::from("Ana Núñez")),
            ]
        );
    }

    #[test]
    fn test_bind_grade_emits_max_even_when_blank() {
        let column = Column::grade("exam", GradeSpec::out_of(dec("10")));
        let fields = column.bind("").unwrap();
        assert_eq!(fields[0].1, FieldValue::Grade(Grade::Ungraded));
        assert_eq!(fields[1].0, "exam_max");
        assert_eq!(fields[1].1.to_string(), "10");

        let fields = Column::grade("exam", GradeSpec::default()).bind("5").unwrap();
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_bind_file() {
        let spec = FileSpec::new()
            .with_base_path("out")
            .with_content_type("application/pdf")
            .unwrap();
        let fields = Column::file("report", spec).bind("ana.pdf").unwrap();
        let file = fields[0].1.as_attachment().unwrap();
        assert_eq!(file.path(), Path::new("out/ana.pdf"));
        assert_eq!(file.sub_type(), "pdf");
    }

    proptest! {
        #[test]
        fn prop_comma_and_dot_agree(int in 0u32..1000, frac in 0u32..1000) {
            let spec = GradeSpec { max: None, min: None, check_max: false };
            let dot = spec.grade("g", &format!("{int}.{frac}")).unwrap();
            let comma = spec.grade("g", &format!("{int},{frac}")).unwrap();
            prop_assert_eq!(dot, comma);
        }

        #[test]
        fn prop_grade_bounds(tenths in -200i64..200) {
            let spec = GradeSpec::out_of(Decimal::from(10));
            let value = Decimal::new(tenths, 1);
            let result = spec.grade("g", &value.to_string());
            if value < Decimal::ZERO || value > Decimal::from(10) {
                let out_of_range = matches!(result, Err(ColumnError::GradeOutOfRange { .. }));
                prop_assert!(out_of_range);
            } else {
                prop_assert_eq!(result.unwrap(), Grade::Value(value));
            }
        }

        #[test]
        fn prop_uncapitalize_idempotent(
            name in "[A-ZÁÉÍÓÚÑa-záéíóúñ]{1,8}([ -][A-ZÁÉÍÓÚÑa-záéíóúñ]{1,8}){0,3}"
        ) {
            let once = uncapitalize(&name);
            prop_assert_eq!(uncapitalize(&once), once);
        }
    }
}
