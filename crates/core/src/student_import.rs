//! Student + parent input validation and the CSV bulk-import pipeline.
//!
//! The pipeline is split in three pure stages so the database layer only has
//! to supply a snapshot of conflicting values:
//!
//! 1. [`parse_upload`] reads the CSV, skipping malformed rows.
//! 2. [`validate_batch`] converts and validates every row, checks uniqueness
//!    against earlier rows and against [`ExistingRecords`].
//! 3. The caller inserts the returned rows in a single transaction.
//!
//! Any error in stage 2 rejects the whole batch. Row numbers are file lines,
//! so the header is row 1 and the first data row is row 2.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::error::CoreError;
use crate::gender::Gender;
use crate::parent_match::normalize_name;
use crate::phone::validate_telephone;

/// Fixed column order of the upload format.
pub const CSV_HEADERS: [&str; 9] = [
    "name",
    "grade",
    "grade_label",
    "gender",
    "telephone",
    "parent_name",
    "parent_gender",
    "parent_telephone",
    "parent_email",
];

/// Optional trailing column carrying the national student number.
pub const NSN_HEADER: &str = "nsn";

/// Upper bound on rows accepted in one upload.
pub const MAX_IMPORT_ROWS: usize = 2000;

/// Rendered download template: header plus one example row.
pub fn csv_template() -> String {
    let mut out = CSV_HEADERS.join(",");
    out.push(',');
    out.push_str(NSN_HEADER);
    out.push('\n');
    out.push_str(concat!(
        "Andi Saputra,7,A,male,081234567890,",
        "Siti Aminah,female,081298765432,siti@example.com,0012345678\n",
    ));
    out
}

// ---------------------------------------------------------------------------
// Typed input
// ---------------------------------------------------------------------------

/// Parent half of a student + parent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewParentInput {
    pub name: String,
    pub gender: Gender,
    pub telephone: String,
    pub email: Option<String>,
}

/// A fully typed student + parent record, from JSON or from a CSV row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentParentInput {
    pub nsn: Option<String>,
    pub name: String,
    pub grade: i32,
    pub grade_label: String,
    pub gender: Gender,
    pub telephone: String,
    pub parent: NewParentInput,
}

impl StudentParentInput {
    /// Trim every string and turn empty optionals into `None`.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.grade_label = self.grade_label.trim().to_uppercase();
        self.telephone = self.telephone.trim().to_string();
        self.nsn = non_empty(self.nsn.as_deref());
        self.parent.name = self.parent.name.trim().to_string();
        self.parent.telephone = self.parent.telephone.trim().to_string();
        self.parent.email = non_empty(self.parent.email.as_deref()).map(|e| e.to_lowercase());
        self
    }

    /// Field-format checks. Returns every problem found, unprefixed.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push("student name is required".to_string());
        }
        if self.grade < 1 {
            errors.push(format!("grade must be a positive number, got {}", self.grade));
        }
        if let Err(e) = validate_grade_label(&self.grade_label) {
            errors.push(e);
        }
        if let Some(nsn) = &self.nsn {
            if !nsn.bytes().all(|b| b.is_ascii_digit()) {
                errors.push(format!("nsn '{nsn}' must contain only digits"));
            }
        }
        if let Err(e) = validate_telephone(&self.telephone) {
            errors.push(format!("student {e}"));
        }
        if self.parent.name.is_empty() {
            errors.push("parent name is required".to_string());
        }
        if let Err(e) = validate_telephone(&self.parent.telephone) {
            errors.push(format!("parent {e}"));
        }
        if !self.telephone.is_empty() && self.telephone == self.parent.telephone {
            errors.push(format!(
                "student telephone '{}' must differ from the parent telephone",
                self.telephone
            ));
        }
        if let Some(email) = &self.parent.email {
            if !email.validate_email() {
                errors.push(format!("parent email '{email}' is not a valid address"));
            }
        }

        errors
    }
}

/// A class label is one or more ASCII letters ("A", "IPA").
pub fn validate_grade_label(label: &str) -> Result<(), String> {
    if label.is_empty() || !label.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(format!("grade label '{label}' must contain letters only"));
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Existing-state snapshot
// ---------------------------------------------------------------------------

/// Values already present in the database that an incoming row may collide
/// with. The repository only needs to fill in values that appear in the batch.
#[derive(Debug, Clone, Default)]
pub struct ExistingRecords {
    /// Normalised (see [`normalize_name`]) student names.
    pub student_names: HashSet<String>,
    pub student_telephones: HashSet<String>,
    pub parent_telephones: HashSet<String>,
    pub nsns: HashSet<String>,
}

/// Uniqueness checks of a single input against existing rows, unprefixed.
pub fn existing_conflicts(input: &StudentParentInput, existing: &ExistingRecords) -> Vec<String> {
    let mut errors = Vec::new();

    if existing.student_names.contains(&normalize_name(&input.name)) {
        errors.push(format!("student name '{}' already exists", input.name));
    }
    if existing.student_telephones.contains(&input.telephone) {
        errors.push(format!(
            "student telephone '{}' is already registered to another student",
            input.telephone
        ));
    }
    if existing.parent_telephones.contains(&input.telephone) {
        errors.push(format!(
            "student telephone '{}' is already registered to a parent",
            input.telephone
        ));
    }
    if existing.student_telephones.contains(&input.parent.telephone) {
        errors.push(format!(
            "parent telephone '{}' is already registered to a student",
            input.parent.telephone
        ));
    }
    if let Some(nsn) = &input.nsn {
        if existing.nsns.contains(nsn) {
            errors.push(format!("nsn '{nsn}' already exists"));
        }
    }

    errors
}

/// Full validation of a single record (used by direct creation).
pub fn validate_single(
    input: StudentParentInput,
    existing: &ExistingRecords,
) -> Result<StudentParentInput, CoreError> {
    let input = input.normalized();
    let mut errors = input.validate();
    errors.extend(existing_conflicts(&input, existing));
    if errors.is_empty() {
        Ok(input)
    } else {
        Err(CoreError::InvalidRows(errors))
    }
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// Raw string fields of one data row, in upload column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub row_number: usize,
    pub name: String,
    pub grade: String,
    pub grade_label: String,
    pub gender: String,
    pub telephone: String,
    pub parent_name: String,
    pub parent_gender: String,
    pub parent_telephone: String,
    pub parent_email: String,
    pub nsn: String,
}

impl RawRow {
    /// Parse numeric and enum columns, then run [`StudentParentInput::validate`].
    pub fn into_input(self) -> Result<StudentParentInput, Vec<String>> {
        let mut errors = Vec::new();

        let grade = match self.grade.parse::<i32>() {
            Ok(g) => g,
            Err(_) => {
                errors.push(format!("grade '{}' must be numeric", self.grade));
                0
            }
        };
        let gender = self
            .gender
            .parse::<Gender>()
            .map_err(|e| errors.push(format!("student {e}")))
            .ok();
        let parent_gender = self
            .parent_gender
            .parse::<Gender>()
            .map_err(|e| errors.push(format!("parent {e}")))
            .ok();

        let (Some(gender), Some(parent_gender)) = (gender, parent_gender) else {
            return Err(errors);
        };

        let input = StudentParentInput {
            nsn: Some(self.nsn),
            name: self.name,
            grade,
            grade_label: self.grade_label,
            gender,
            telephone: self.telephone,
            parent: NewParentInput {
                name: self.parent_name,
                gender: parent_gender,
                telephone: self.parent_telephone,
                email: Some(self.parent_email),
            },
        }
        .normalized();

        if errors.is_empty() {
            // Grade was parsed; only now is the positive-number check meaningful.
            errors.extend(input.validate());
        } else {
            errors.extend(
                input
                    .validate()
                    .into_iter()
                    .filter(|e| !e.starts_with("grade must")),
            );
        }

        if errors.is_empty() {
            Ok(input)
        } else {
            Err(errors)
        }
    }
}

/// A data row dropped before validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub row_number: usize,
    pub reason: String,
}

/// Output of [`parse_upload`].
#[derive(Debug, Clone, Default)]
pub struct ParsedUpload {
    pub rows: Vec<RawRow>,
    pub skipped: Vec<SkippedRow>,
}

/// Parse an uploaded CSV document.
///
/// Fails only when the header row is missing or does not match
/// [`CSV_HEADERS`]. Rows with a wrong column count, unreadable bytes, or only
/// empty cells are skipped and reported.
pub fn parse_upload(data: &[u8]) -> Result<ParsedUpload, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| CoreError::Validation(format!("CSV header could not be read: {e}")))?
        .clone();
    check_headers(&headers)?;

    let mut parsed = ParsedUpload::default();

    for (index, result) in reader.records().enumerate() {
        // Fallback when the reader cannot report a position: header + index.
        let fallback_line = index + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let row_number = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                parsed.skipped.push(SkippedRow {
                    row_number,
                    reason: format!("unreadable row: {e}"),
                });
                continue;
            }
        };

        let row_number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        if record.iter().all(str::is_empty) {
            parsed.skipped.push(SkippedRow {
                row_number,
                reason: "empty row".to_string(),
            });
            continue;
        }

        let len = record.len();
        if len != CSV_HEADERS.len() && len != CSV_HEADERS.len() + 1 {
            parsed.skipped.push(SkippedRow {
                row_number,
                reason: format!(
                    "expected {} or {} columns, found {len}",
                    CSV_HEADERS.len(),
                    CSV_HEADERS.len() + 1
                ),
            });
            continue;
        }

        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        parsed.rows.push(RawRow {
            row_number,
            name: field(0),
            grade: field(1),
            grade_label: field(2),
            gender: field(3),
            telephone: field(4),
            parent_name: field(5),
            parent_gender: field(6),
            parent_telephone: field(7),
            parent_email: field(8),
            nsn: field(9),
        });
    }

    if parsed.rows.len() > MAX_IMPORT_ROWS {
        return Err(CoreError::Validation(format!(
            "CSV contains {} rows; at most {MAX_IMPORT_ROWS} are accepted per upload",
            parsed.rows.len()
        )));
    }

    Ok(parsed)
}

fn check_headers(headers: &csv::StringRecord) -> Result<(), CoreError> {
    let found: Vec<String> = headers.iter().map(|h| h.to_ascii_lowercase()).collect();
    let matches_fixed = found.len() >= CSV_HEADERS.len()
        && CSV_HEADERS
            .iter()
            .zip(found.iter())
            .all(|(expected, got)| expected == got);
    let extra_ok = match found.get(CSV_HEADERS.len()) {
        None => true,
        Some(h) => h == NSN_HEADER,
    };

    if matches_fixed && extra_ok && found.len() <= CSV_HEADERS.len() + 1 {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "CSV header must be: {},{NSN_HEADER} (the {NSN_HEADER} column is optional)",
            CSV_HEADERS.join(",")
        )))
    }
}

// ---------------------------------------------------------------------------
// Batch validation
// ---------------------------------------------------------------------------

/// A row that passed every check, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRow {
    pub row_number: usize,
    pub input: StudentParentInput,
}

/// First row each value was seen in, per key.
#[derive(Default)]
struct SeenValues {
    names: HashMap<String, usize>,
    student_telephones: HashMap<String, usize>,
    parent_telephones: HashMap<String, usize>,
    nsns: HashMap<String, usize>,
}

/// Validate every row of a batch. All-or-nothing: either every row is valid
/// and returned, or every message from every row is returned.
pub fn validate_batch(
    rows: &[RawRow],
    existing: &ExistingRecords,
) -> Result<Vec<ValidatedRow>, Vec<String>> {
    let mut errors = Vec::new();
    let mut valid = Vec::with_capacity(rows.len());
    let mut seen = SeenValues::default();

    for raw in rows {
        let row = raw.row_number;
        let mut row_errors = duplicate_errors(raw, &mut seen);

        match raw.clone().into_input() {
            Ok(input) => {
                row_errors.extend(existing_conflicts(&input, existing));
                if row_errors.is_empty() {
                    valid.push(ValidatedRow {
                        row_number: row,
                        input,
                    });
                }
            }
            Err(field_errors) => row_errors.extend(field_errors),
        }

        errors.extend(row_errors.into_iter().map(|e| format!("row {row}: {e}")));
    }

    if errors.is_empty() {
        Ok(valid)
    } else {
        Err(errors)
    }
}

/// Cross-row uniqueness checks; records this row's values for later rows.
fn duplicate_errors(raw: &RawRow, seen: &mut SeenValues) -> Vec<String> {
    let row = raw.row_number;
    let mut errors = Vec::new();

    let name = normalize_name(&raw.name);
    if !name.is_empty() {
        if let Some(first) = seen.names.get(&name) {
            errors.push(format!(
                "student name '{}' duplicates row {first}",
                raw.name
            ));
        } else {
            seen.names.insert(name, row);
        }
    }

    let telephone = raw.telephone.as_str();
    if !telephone.is_empty() {
        if let Some(first) = seen.student_telephones.get(telephone) {
            errors.push(format!(
                "student telephone '{telephone}' duplicates row {first}"
            ));
        }
        if let Some(first) = seen.parent_telephones.get(telephone) {
            errors.push(format!(
                "student telephone '{telephone}' is the parent telephone of row {first}"
            ));
        }
        seen.student_telephones
            .entry(telephone.to_string())
            .or_insert(row);
    }

    let parent_telephone = raw.parent_telephone.as_str();
    if !parent_telephone.is_empty() {
        if let Some(first) = seen.student_telephones.get(parent_telephone) {
            if *first != row {
                errors.push(format!(
                    "parent telephone '{parent_telephone}' is the student telephone of row {first}"
                ));
            }
        }
        // Siblings legitimately share a parent telephone.
        seen.parent_telephones
            .entry(parent_telephone.to_string())
            .or_insert(row);
    }

    let nsn = raw.nsn.as_str();
    if !nsn.is_empty() {
        if let Some(first) = seen.nsns.get(nsn) {
            errors.push(format!("nsn '{nsn}' duplicates row {first}"));
        } else {
            seen.nsns.insert(nsn.to_string(), row);
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const HEADER: &str = concat!(
        "name,grade,grade_label,gender,telephone,",
        "parent_name,parent_gender,parent_telephone,parent_email"
    );

    fn upload(lines: &[&str]) -> Vec<u8> {
        let mut text = String::from(HEADER);
        for line in lines {
            text.push('\n');
            text.push_str(line);
        }
        text.push('\n');
        text.into_bytes()
    }

    fn raw(row_number: usize, name: &str, telephone: &str, parent_telephone: &str) -> RawRow {
        RawRow {
            row_number,
            name: name.to_string(),
            grade: "7".to_string(),
            grade_label: "A".to_string(),
            gender: "male".to_string(),
            telephone: telephone.to_string(),
            parent_name: format!("Parent of {name}"),
            parent_gender: "female".to_string(),
            parent_telephone: parent_telephone.to_string(),
            parent_email: String::new(),
            nsn: String::new(),
        }
    }

    // -- parse_upload -------------------------------------------------------

    #[test]
    fn parses_rows_with_file_line_numbers() {
        let data = upload(&[
            "Andi,7,A,male,081200000001,Siti,female,081200000002,siti@mail.com",
            "Budi,8,B,male,081200000003,Rina,female,081200000004,",
        ]);
        let parsed = parse_upload(&data).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.rows[0].row_number, 2);
        assert_eq!(parsed.rows[1].row_number, 3);
        assert_eq!(parsed.rows[0].parent_email, "siti@mail.com");
        assert_eq!(parsed.rows[1].nsn, "");
    }

    #[test]
    fn optional_nsn_column_is_read() {
        let mut text = format!("{HEADER},nsn\n");
        text.push_str("Andi,7,A,male,081200000001,Siti,female,081200000002,,0099887766\n");
        let parsed = parse_upload(text.as_bytes()).unwrap();
        assert_eq!(parsed.rows[0].nsn, "0099887766");
    }

    #[test]
    fn malformed_rows_are_skipped_and_reported() {
        let data = upload(&[
            "Andi,7,A,male,081200000001,Siti,female,081200000002,",
            "too,few,columns",
            ",,,,,,,,",
        ]);
        let parsed = parse_upload(&data).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.skipped.len(), 2);
        assert_eq!(parsed.skipped[0].row_number, 3);
        assert!(parsed.skipped[0].reason.contains("found 3"));
        assert_eq!(parsed.skipped[1].reason, "empty row");
    }

    #[test]
    fn wrong_header_is_rejected() {
        let data = b"nama,kelas\nAndi,7\n";
        assert_matches!(parse_upload(data), Err(CoreError::Validation(_)));
    }

    #[test]
    fn template_parses_cleanly() {
        let template = csv_template();
        let parsed = parse_upload(template.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        let rows = validate_batch(&parsed.rows, &ExistingRecords::default()).unwrap();
        assert_eq!(rows[0].input.nsn.as_deref(), Some("0012345678"));
    }

    // -- field validation ---------------------------------------------------

    #[test]
    fn non_numeric_grade_is_reported_once() {
        let mut row = raw(2, "Andi", "081200000001", "081200000002");
        row.grade = "seven".to_string();
        let errors = row.into_input().unwrap_err();
        assert_eq!(errors, vec!["grade 'seven' must be numeric".to_string()]);
    }

    #[test]
    fn grade_label_must_be_letters() {
        let mut row = raw(2, "Andi", "081200000001", "081200000002");
        row.grade_label = "7A".to_string();
        let errors = row.into_input().unwrap_err();
        assert!(errors[0].contains("letters only"));
    }

    #[test]
    fn grade_label_accepts_ascii_letters_only() {
        assert!(validate_grade_label("IPA").is_ok());
        assert!(validate_grade_label("").is_err());
        assert!(validate_grade_label("Ä").is_err());
        assert!(validate_grade_label("A 1").is_err());
    }

    #[test]
    fn oversized_upload_is_rejected() {
        let line = "Andi,7,A,male,081200000001,Siti,female,081200000002,";
        let lines = vec![line; MAX_IMPORT_ROWS + 1];
        let err = parse_upload(&upload(&lines)).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) => {
            assert!(msg.contains("at most 2000"));
        });
    }

    #[test]
    fn invalid_genders_are_both_reported() {
        let mut row = raw(2, "Andi", "081200000001", "081200000002");
        row.gender = "boy".to_string();
        row.parent_gender = "".to_string();
        let errors = row.into_input().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("student Invalid gender"));
        assert!(errors[1].starts_with("parent Invalid gender"));
    }

    #[test]
    fn student_and_parent_telephone_must_differ() {
        let row = raw(2, "Andi", "081200000001", "081200000001");
        let errors = row.into_input().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("must differ")));
    }

    #[test]
    fn overlong_telephone_is_rejected() {
        let row = raw(2, "Andi", "08120000000123", "081200000002");
        let errors = row.into_input().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("exceeds 13")));
    }

    #[test]
    fn invalid_email_is_rejected() {
        let mut row = raw(2, "Andi", "081200000001", "081200000002");
        row.parent_email = "not-an-email".to_string();
        let errors = row.into_input().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("not a valid address")));
    }

    #[test]
    fn valid_row_is_normalised() {
        let mut row = raw(2, "Andi", "081200000001", "081200000002");
        row.grade_label = "b".to_string();
        row.parent_email = "Siti@Mail.COM".to_string();
        let input = row.into_input().unwrap();
        assert_eq!(input.grade_label, "B");
        assert_eq!(input.parent.email.as_deref(), Some("siti@mail.com"));
        assert_eq!(input.nsn, None);
    }

    // -- batch validation ---------------------------------------------------

    #[test]
    fn duplicate_student_telephone_cites_both_rows() {
        let rows = vec![
            raw(2, "Andi", "081200000001", "081200000002"),
            raw(3, "Budi", "081200000001", "081200000004"),
        ];
        let errors = validate_batch(&rows, &ExistingRecords::default()).unwrap_err();
        assert_eq!(
            errors,
            vec!["row 3: student telephone '081200000001' duplicates row 2".to_string()]
        );
    }

    #[test]
    fn one_bad_row_rejects_the_whole_batch() {
        let mut bad = raw(3, "Budi", "081200000003", "081200000004");
        bad.grade = "x".to_string();
        let rows = vec![raw(2, "Andi", "081200000001", "081200000002"), bad];
        let result = validate_batch(&rows, &ExistingRecords::default());
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("row 3:"));
    }

    #[test]
    fn siblings_may_share_a_parent_telephone() {
        let rows = vec![
            raw(2, "Andi", "081200000001", "081200000009"),
            raw(3, "Budi", "081200000003", "081200000009"),
        ];
        let valid = validate_batch(&rows, &ExistingRecords::default()).unwrap();
        assert_eq!(valid.len(), 2);
    }

    #[test]
    fn student_telephone_may_not_be_another_rows_parent_telephone() {
        let rows = vec![
            raw(2, "Andi", "081200000001", "081200000002"),
            raw(3, "Budi", "081200000002", "081200000004"),
        ];
        let errors = validate_batch(&rows, &ExistingRecords::default()).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "row 3: student telephone '081200000002' is the parent telephone of row 2"
                    .to_string()
            ]
        );
    }

    #[test]
    fn parent_telephone_may_not_be_an_earlier_student_telephone() {
        let rows = vec![
            raw(2, "Andi", "081200000001", "081200000002"),
            raw(3, "Budi", "081200000003", "081200000001"),
        ];
        let errors = validate_batch(&rows, &ExistingRecords::default()).unwrap_err();
        assert!(errors[0].contains("is the student telephone of row 2"));
    }

    #[test]
    fn duplicate_names_and_nsns_are_reported() {
        let mut a = raw(2, "Andi", "081200000001", "081200000002");
        a.nsn = "111".to_string();
        let mut b = raw(3, "andi", "081200000003", "081200000004");
        b.nsn = "111".to_string();
        let errors = validate_batch(&[a, b], &ExistingRecords::default()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("student name 'andi' duplicates row 2"));
        assert!(errors[1].contains("nsn '111' duplicates row 2"));
    }

    #[test]
    fn existing_database_values_are_rejected() {
        let mut existing = ExistingRecords::default();
        existing.student_names.insert("andi".to_string());
        existing.parent_telephones.insert("081200000001".to_string());
        existing.student_telephones.insert("081200000002".to_string());

        let rows = vec![raw(2, "Andi", "081200000001", "081200000002")];
        let errors = validate_batch(&rows, &existing).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("student name 'Andi' already exists"));
        assert!(errors[1].contains("already registered to a parent"));
        assert!(errors[2].contains("parent telephone '081200000002' is already registered"));
    }

    #[test]
    fn existing_parent_telephone_alone_is_a_merge_not_an_error() {
        let mut existing = ExistingRecords::default();
        existing.parent_telephones.insert("081200000002".to_string());
        let rows = vec![raw(2, "Andi", "081200000001", "081200000002")];
        assert!(validate_batch(&rows, &existing).is_ok());
    }

    // -- single record ------------------------------------------------------

    #[test]
    fn validate_single_collects_all_problems() {
        let input = StudentParentInput {
            nsn: Some(" ".to_string()),
            name: " ".to_string(),
            grade: 0,
            grade_label: "A".to_string(),
            gender: Gender::Female,
            telephone: "081200000001".to_string(),
            parent: NewParentInput {
                name: "Rina".to_string(),
                gender: Gender::Female,
                telephone: "081200000001".to_string(),
                email: None,
            },
        };
        let err = validate_single(input, &ExistingRecords::default()).unwrap_err();
        let CoreError::InvalidRows(errors) = err else {
            panic!("expected InvalidRows");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("student name is required"));
        assert!(errors[1].contains("grade must be a positive number"));
        assert!(errors[2].contains("must differ"));
    }
}
