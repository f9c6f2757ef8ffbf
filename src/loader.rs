// CSV loading for the two source tables.
//
// Column names are normalized before deserialization (trim, lowercase,
// non-word characters to `_`) so the rest of the code can address columns by
// one canonical spelling regardless of which tool produced the export.
use crate::error::{ReportError, Result};
use crate::mappings::{project_for_file, PROJECT_MANAGERS};
use crate::types::{
    AggTable, AggregatedRecord, PidTable, RawAggRow, RawPidRow, ReferenceRecord,
};
use crate::util::{parse_date_safe, parse_f64_safe};
use csv::{Reader, ReaderBuilder, StringRecord};
use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub parse_errors: usize,
    /// Rows without a usable `datetouse` value; they render as "Unplanned".
    pub unplanned_rows: usize,
    /// Rows whose blank (project, shire) keys were backfilled from the
    /// project-manager or source-file dictionaries.
    pub imputed_keys: usize,
}

/// Canonical column spelling: trimmed, lowercased, anything that is not a
/// letter, digit or underscore becomes `_` (so "PID OHL Nr" -> "pid_ohl_nr").
pub fn normalize_column(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn open_normalized(path: &str) -> Result<(Reader<File>, Vec<String>)> {
    if !Path::new(path).exists() {
        return Err(ReportError::FileNotFound(path.to_string()));
    }
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let columns: Vec<String> = rdr.headers()?.iter().map(normalize_column).collect();
    rdr.set_headers(StringRecord::from(columns.clone()));
    Ok((rdr, columns))
}

fn clean_opt(s: Option<String>) -> Option<String> {
    let t = s?.trim().to_string();
    if t.is_empty() {
        None
    } else {
        Some(t)
    }
}

fn clean(s: Option<String>) -> String {
    clean_opt(s).unwrap_or_default()
}

/// Load the aggregated field-work ledger.
///
/// Rows that fail to deserialize are skipped and counted; a row is never
/// dropped for having empty business fields, those simply pass through blank.
pub fn load_aggregated(path: &str) -> Result<(AggTable, LoadReport)> {
    let (mut rdr, columns) = open_normalized(path)?;
    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut unplanned_rows = 0usize;
    let mut records: Vec<AggregatedRecord> = Vec::new();

    for result in rdr.deserialize::<RawAggRow>() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping aggregated row {}: {}", total_rows, e);
                parse_errors += 1;
                continue;
            }
        };

        let date_to_use = parse_date_safe(row.datetouse.as_deref());
        if date_to_use.is_none() {
            unplanned_rows += 1;
        }

        records.push(AggregatedRecord {
            project: clean(row.project),
            shire: clean(row.shire),
            segment_description: clean_opt(row.segmentdesc),
            segment_code: clean(row.segmentcode),
            project_manager: clean(row.projectmanager),
            team_name: clean(row.team_name),
            item: clean(row.item),
            mapped: clean(row.mapped),
            quantity: parse_f64_safe(row.qsub.as_deref()),
            total: parse_f64_safe(row.total.as_deref()),
            orig: parse_f64_safe(row.orig.as_deref()),
            date_to_use,
            source_file: clean(row.sourcefile),
        });
    }

    // Backfill blank keys from the static dictionaries: the project-manager
    // table first, then keywords in the source file name. Rows still missing
    // a key after this simply never find a reference partition.
    let mut imputed_keys = 0usize;
    for r in &mut records {
        if !r.project.is_empty() && !r.shire.is_empty() {
            continue;
        }
        let fill = PROJECT_MANAGERS
            .get(r.project_manager.as_str())
            .copied()
            .or_else(|| project_for_file(&r.source_file));
        if let Some((shire, project)) = fill {
            if r.shire.is_empty() {
                r.shire = shire.to_string();
            }
            if r.project.is_empty() && !project.is_empty() {
                r.project = project.to_string();
            }
            imputed_keys += 1;
        }
    }

    let report = LoadReport {
        total_rows,
        kept_rows: records.len(),
        parse_errors,
        unplanned_rows,
        imputed_keys,
    };
    Ok((AggTable { columns, records }, report))
}

/// Load the PID reference table. Treated as a lookup table, never mutated.
pub fn load_reference(path: &str) -> Result<(PidTable, LoadReport)> {
    let (mut rdr, columns) = open_normalized(path)?;
    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut records: Vec<ReferenceRecord> = Vec::new();

    for result in rdr.deserialize::<RawPidRow>() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping PID row {}: {}", total_rows, e);
                parse_errors += 1;
                continue;
            }
        };
        records.push(ReferenceRecord {
            project: clean(row.project),
            shire: clean(row.shire),
            project_description: clean_opt(row.project_description),
            pid_ohl_nr: clean_opt(row.pid_ohl_nr),
        });
    }

    let report = LoadReport {
        total_rows,
        kept_rows: records.len(),
        parse_errors,
        unplanned_rows: 0,
        imputed_keys: 0,
    };
    Ok((PidTable { columns, records }, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        f.write_all(contents.as_bytes()).expect("write");
        f
    }

    #[test]
    fn normalizes_column_names() {
        assert_eq!(normalize_column(" PID OHL Nr "), "pid_ohl_nr");
        assert_eq!(normalize_column("SegmentDesc"), "segmentdesc");
        assert_eq!(normalize_column("Team-Name"), "team_name");
        assert_eq!(normalize_column("%Complete"), "_complete");
    }

    #[test]
    fn loads_aggregated_with_messy_headers() {
        let f = write_temp(
            "Project,Shire,SegmentDesc,SegmentCode,ProjectManager,Qsub,Total,Orig,DateToUse\n\
             PCB 2022,Ayrshire,Erect pole near substation A,SEG-01,Gary MacDonald,\"2,5\",\"1 200,50\",\"1 000,00\",2023-04-17\n\
             PCB 2022,Ayrshire,,SEG-02,Gary MacDonald,,,,\n",
        );
        let (table, report) = load_aggregated(f.path().to_str().unwrap()).expect("load");
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.kept_rows, 2);
        assert_eq!(report.parse_errors, 0);
        assert_eq!(report.unplanned_rows, 1);
        assert!(table.columns.contains(&"segmentdesc".to_string()));

        let first = &table.records[0];
        assert_eq!(first.project, "PCB 2022");
        assert_eq!(first.quantity, Some(2.5));
        assert_eq!(first.total, Some(1200.50));
        assert_eq!(first.orig, Some(1000.0));
        assert_eq!(first.date_display(), "17/04/2023");

        let second = &table.records[1];
        assert_eq!(second.segment_description, None);
        assert_eq!(second.date_display(), "Unplanned");
    }

    #[test]
    fn loads_reference_with_spaced_headers() {
        let f = write_temp(
            "Project,Shire,Project Description,PID OHL Nr\n\
             PCB 2022,Ayrshire,Erect pole substation A,OHL-001\n\
             PCB 2022,Ayrshire,,\n",
        );
        let (table, report) = load_reference(f.path().to_str().unwrap()).expect("load");
        assert_eq!(report.kept_rows, 2);
        assert_eq!(
            table.columns,
            vec!["project", "shire", "project_description", "pid_ohl_nr"]
        );
        assert_eq!(table.records[0].pid_ohl_nr.as_deref(), Some("OHL-001"));
        assert_eq!(table.records[1].project_description, None);
    }

    #[test]
    fn backfills_blank_keys_from_dictionaries() {
        let f = write_temp(
            "Project,Shire,SegmentDesc,ProjectManager,SourceFile\n\
             ,,Erect pole,Gary MacDonald,whatever.xlsx\n\
             ,,String conductor,,CF PCB 2022 week 3.xlsx\n\
             ,,No clues at all,,\n",
        );
        let (table, report) = load_aggregated(f.path().to_str().unwrap()).expect("load");
        assert_eq!(report.imputed_keys, 2);

        assert_eq!(table.records[0].shire, "Ayrshire");
        assert_eq!(table.records[0].project, "LV");
        assert_eq!(table.records[1].shire, "Ayrshire");
        assert_eq!(table.records[1].project, "PCB");
        assert_eq!(table.records[2].project, "");
        assert_eq!(table.records[2].shire, "");
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_aggregated("definitely_not_here.csv").unwrap_err();
        assert!(matches!(err, ReportError::FileNotFound(_)));
    }
}
