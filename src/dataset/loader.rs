use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::types::Course;
use crate::scoring::{Catalog, Model};

pub const COUNTRY: &str = "Country";
pub const UNIVERSITY: &str = "University";
pub const REGION: &str = "City/Region";
pub const ARCHETYPE: &str = "Course Archetype";
pub const NOTES: &str = "Notes";

/// Older datasets label the archetype column this way.
const ARCHETYPE_ALIAS: &str = "STEM Courses (Archetypes)";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("expected a JSON array of course records")]
    NotAnArray,
    #[error("record {index} is not a JSON object")]
    NotAnObject { index: usize },
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("record {record}: missing required field '{field}'")]
    MissingField { record: usize, field: &'static str },
    #[error("line {line}: expected {expected} fields, found {found}")]
    RowLength {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("no {model} model criterion columns found (expected columns such as '{example}')")]
    NoCriteria { model: Model, example: &'static str },
    #[error("could not load {} as JSON ({json}) or as CSV ({csv})", path.display())]
    Unrecognized {
        path: PathBuf,
        json: Box<DatasetError>,
        csv: Box<DatasetError>,
    },
}

/// Load a dataset file. `.json` and `.csv` are parsed directly; any other
/// extension is tried as JSON first, then as CSV.
pub fn load_dataset(path: &Path, catalog: &Catalog) -> Result<Vec<Course>, DatasetError> {
    let text = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let courses = match extension.as_deref() {
        Some("json") => parse_json(&text, catalog)?,
        Some("csv") => parse_csv(&text, catalog)?,
        _ => match parse_json(&text, catalog) {
            Ok(courses) => courses,
            Err(json_err) => {
                warn!("{} is not valid JSON ({}), trying CSV", path.display(), json_err);
                parse_csv(&text, catalog).map_err(|csv_err| DatasetError::Unrecognized {
                    path: path.to_path_buf(),
                    json: Box::new(json_err),
                    csv: Box::new(csv_err),
                })?
            }
        },
    };

    info!("Loaded {} courses from {}", courses.len(), path.display());
    Ok(courses)
}

/// Parse CSV text with a header row.
pub fn parse_csv(text: &str, catalog: &Catalog) -> Result<Vec<Course>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let layout = ColumnLayout::from_headers(&headers, catalog)?;

    let mut courses = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(DatasetError::RowLength {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: headers.len(),
                found: record.len(),
            });
        }
        let cells: Vec<&str> = record.iter().collect();
        courses.push(layout.build(&headers, &cells, catalog));
    }

    if courses.is_empty() {
        warn!("CSV dataset has a header but no data rows");
    }
    Ok(courses)
}

/// Parse a JSON array of objects keyed by column name.
pub fn parse_json(text: &str, catalog: &Catalog) -> Result<Vec<Course>, DatasetError> {
    let value: Value = serde_json::from_str(text)?;
    let records = value.as_array().ok_or(DatasetError::NotAnArray)?;

    let mut saw_criterion = records.is_empty();
    let mut courses = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let object = record
            .as_object()
            .ok_or(DatasetError::NotAnObject { index })?;

        let text_field = |names: &[&'static str]| -> Result<String, DatasetError> {
            names
                .iter()
                .find_map(|n| object.get(*n))
                .map(json_to_text)
                .ok_or(DatasetError::MissingField {
                    record: index,
                    field: names[0],
                })
        };

        let country = text_field(&[COUNTRY])?;
        let university = text_field(&[UNIVERSITY])?;
        let region = text_field(&[REGION])?;
        let archetype = text_field(&[ARCHETYPE, ARCHETYPE_ALIAS])?;
        let notes = object.get(NOTES).map(json_to_text).unwrap_or_default();

        let mut values = vec![None; catalog.len()];
        let mut extra = BTreeMap::new();
        for (key, value) in object {
            if is_identity_column(key) {
                continue;
            }
            match catalog.index_of(key) {
                Some(i) => {
                    saw_criterion = true;
                    values[i] = match value {
                        Value::Null => None,
                        Value::Number(n) => n.as_f64(),
                        other => Some(parse_number(&json_to_text(other), key)),
                    };
                }
                None => {
                    extra.insert(key.clone(), json_to_text(value));
                }
            }
        }

        let course = Course {
            country,
            university,
            region,
            archetype,
            notes,
            values,
            extra,
        };
        warn_out_of_range(&course, catalog);
        courses.push(course);
    }

    if !saw_criterion {
        return Err(no_criteria(catalog));
    }
    Ok(courses)
}

/// Where each required column sits in a CSV header.
struct ColumnLayout {
    country: usize,
    university: usize,
    region: usize,
    archetype: usize,
    notes: Option<usize>,
    criteria: Vec<Option<usize>>, // header index per catalog criterion
}

impl ColumnLayout {
    fn from_headers(headers: &[String], catalog: &Catalog) -> Result<Self, DatasetError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &'static str| find(name).ok_or(DatasetError::MissingColumn(name));

        let archetype = find(ARCHETYPE)
            .or_else(|| find(ARCHETYPE_ALIAS))
            .ok_or(DatasetError::MissingColumn(ARCHETYPE))?;

        let criteria: Vec<Option<usize>> = catalog
            .criteria
            .iter()
            .map(|c| {
                headers
                    .iter()
                    .position(|h| h == c.column || h.eq_ignore_ascii_case(c.key))
            })
            .collect();

        if criteria.iter().all(Option::is_none) {
            return Err(no_criteria(catalog));
        }
        for (criterion, column) in catalog.criteria.iter().zip(&criteria) {
            if column.is_none() {
                warn!("Dataset has no '{}' column; scoring it as 0", criterion.column);
            }
        }

        Ok(Self {
            country: require(COUNTRY)?,
            university: require(UNIVERSITY)?,
            region: require(REGION)?,
            archetype,
            notes: find(NOTES),
            criteria,
        })
    }

    fn build(&self, headers: &[String], cells: &[&str], catalog: &Catalog) -> Course {
        let values = self
            .criteria
            .iter()
            .zip(catalog.criteria)
            .map(|(column, criterion)| {
                column
                    .map(|i| cells[i])
                    .filter(|cell| !cell.is_empty())
                    .map(|cell| parse_number(cell, criterion.column))
            })
            .collect();

        let known: Vec<usize> = [self.country, self.university, self.region, self.archetype]
            .into_iter()
            .chain(self.notes)
            .chain(self.criteria.iter().flatten().copied())
            .collect();
        let extra = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !known.contains(i))
            .map(|(i, h)| (h.clone(), cells[i].to_string()))
            .collect();

        let course = Course {
            country: cells[self.country].to_string(),
            university: cells[self.university].to_string(),
            region: cells[self.region].to_string(),
            archetype: cells[self.archetype].to_string(),
            notes: self.notes.map(|i| cells[i].to_string()).unwrap_or_default(),
            values,
            extra,
        };
        warn_out_of_range(&course, catalog);
        course
    }
}

fn is_identity_column(name: &str) -> bool {
    [COUNTRY, UNIVERSITY, REGION, ARCHETYPE, ARCHETYPE_ALIAS, NOTES].contains(&name)
}

fn parse_number(cell: &str, column: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or_else(|_| {
        debug!("Non-numeric value '{}' in column '{}', using 0", cell, column);
        0.0
    })
}

fn json_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn warn_out_of_range(course: &Course, catalog: &Catalog) {
    for (i, criterion) in catalog.criteria.iter().enumerate() {
        let value = course.value(i);
        if value < 0.0 || value > criterion.max {
            warn!(
                "{} ({}): {} = {} is outside 0-{}",
                course.university, course.archetype, criterion.column, value, criterion.max
            );
        }
    }
}

fn no_criteria(catalog: &Catalog) -> DatasetError {
    DatasetError::NoCriteria {
        model: catalog.model,
        example: catalog.criteria.first().map(|c| c.column).unwrap_or(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn simple() -> &'static Catalog {
        Catalog::for_model(Model::Simple)
    }

    const SIMPLE_CSV: &str = "\
Country,University,City/Region,Course Archetype,Notes,Quality_0_3,Scale_0_3,Employability_0_3,GeoFit_0_2,Source: Ranking
Brazil,USP,Sao Paulo,Computer Science,\"Top program, very selective\",3,3,3,2,QS 2024
Mexico,UNAM,Mexico City,Statistics,,2,abc,,1,
";

    #[test]
    fn test_parse_csv_basic() {
        let courses = parse_csv(SIMPLE_CSV, simple()).unwrap();
        assert_eq!(courses.len(), 2);

        let usp = &courses[0];
        assert_eq!(usp.country, "Brazil");
        assert_eq!(usp.region, "Sao Paulo");
        assert_eq!(usp.notes, "Top program, very selective");
        assert_eq!(usp.values, vec![Some(3.0), Some(3.0), Some(3.0), Some(2.0)]);
        assert_eq!(usp.extra.get("Source: Ranking").map(String::as_str), Some("QS 2024"));
    }

    #[test]
    fn test_parse_csv_bad_numbers_default_to_zero() {
        let courses = parse_csv(SIMPLE_CSV, simple()).unwrap();
        let unam = &courses[1];
        assert_eq!(unam.values, vec![Some(2.0), Some(0.0), None, Some(1.0)]);
        assert_eq!(unam.value(2), 0.0);
    }

    #[test]
    fn test_parse_csv_missing_required_column() {
        let text = "Country,University,Course Archetype,Quality_0_3\nBrazil,USP,CS,3\n";
        let err = parse_csv(text, simple()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn("City/Region")));
    }

    #[test]
    fn test_parse_csv_archetype_alias() {
        let text = "Country,University,City/Region,STEM Courses (Archetypes),Quality_0_3\nBrazil,USP,SP,CS,3\n";
        let courses = parse_csv(text, simple()).unwrap();
        assert_eq!(courses[0].archetype, "CS");
        assert_eq!(courses[0].notes, "");
    }

    #[test]
    fn test_parse_csv_row_length_mismatch() {
        let text = "Country,University,City/Region,Course Archetype,Quality_0_3\nBrazil,USP,SP,CS\n";
        let err = parse_csv(text, simple()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::RowLength {
                expected: 5,
                found: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_csv_wrong_model() {
        let err = parse_csv(SIMPLE_CSV, Catalog::for_model(Model::Full)).unwrap_err();
        assert!(matches!(err, DatasetError::NoCriteria { model: Model::Full, .. }));
    }

    #[test]
    fn test_parse_csv_header_only_is_empty() {
        let text = "Country,University,City/Region,Course Archetype,Quality_0_3\n";
        let courses = parse_csv(text, simple()).unwrap();
        assert!(courses.is_empty());
    }

    #[test]
    fn test_parse_json_basic() {
        let text = r#"[
            {"Country": "Colombia", "University": "UniAndes", "City/Region": "Bogota",
             "Course Archetype": "Data Science", "Notes": "n",
             "Quality_0_3": 3, "Scale_0_3": "2", "Employability_0_3": null, "GeoFit_0_2": 1.5,
             "Website": "https://example.edu"}
        ]"#;
        let courses = parse_json(text, simple()).unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].values, vec![Some(3.0), Some(2.0), None, Some(1.5)]);
        assert_eq!(
            courses[0].extra.get("Website").map(String::as_str),
            Some("https://example.edu")
        );
    }

    #[test]
    fn test_parse_json_missing_field() {
        let text = r#"[{"Country": "Brazil", "City/Region": "SP", "Course Archetype": "CS", "Quality_0_3": 1}]"#;
        let err = parse_json(text, simple()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::MissingField {
                record: 0,
                field: "University"
            }
        ));
    }

    #[test]
    fn test_parse_json_not_array() {
        let err = parse_json("{}", simple()).unwrap_err();
        assert!(matches!(err, DatasetError::NotAnArray));
    }

    #[test]
    fn test_parse_json_empty_array() {
        assert!(parse_json("[]", simple()).unwrap().is_empty());
    }

    #[test]
    fn test_load_dataset_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.csv");
        fs::write(&path, SIMPLE_CSV).unwrap();
        let courses = load_dataset(&path, simple()).unwrap();
        assert_eq!(courses.len(), 2);
    }

    #[test]
    fn test_load_dataset_falls_back_to_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SIMPLE_CSV.as_bytes()).unwrap();
        let courses = load_dataset(file.path(), simple()).unwrap();
        assert_eq!(courses.len(), 2);
    }

    #[test]
    fn test_load_dataset_reports_both_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"just some text\n").unwrap();
        let err = load_dataset(file.path(), simple()).unwrap_err();
        assert!(matches!(err, DatasetError::Unrecognized { .. }));
    }

    #[test]
    fn test_load_dataset_missing_file() {
        let err = load_dataset(Path::new("/nonexistent/courses.csv"), simple()).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
