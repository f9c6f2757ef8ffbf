use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Sentinel description for rows with no acceptable reference candidate.
pub const NO_MATCH: &str = "No Match";
/// Sentinel PID identifier for rows without a propagated reference id.
pub const NOT_AVAILABLE: &str = "Not Available";

/// Raw aggregated ledger row.
///
/// Field names correspond to the normalized column names produced by the
/// loader (lowercase, non-word characters mapped to `_`), so no serde renames
/// are needed. Every field is optional: the exports routinely omit columns,
/// and `#[serde(default)]` turns an absent column into `None` instead of a
/// deserialize error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawAggRow {
    pub project: Option<String>,
    pub shire: Option<String>,
    pub segmentdesc: Option<String>,
    pub segmentcode: Option<String>,
    pub projectmanager: Option<String>,
    pub team_name: Option<String>,
    pub item: Option<String>,
    pub mapped: Option<String>,
    pub qsub: Option<String>,
    pub total: Option<String>,
    pub orig: Option<String>,
    pub datetouse: Option<String>,
    pub sourcefile: Option<String>,
}

/// Raw PID reference row.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPidRow {
    pub project: Option<String>,
    pub shire: Option<String>,
    pub project_description: Option<String>,
    pub pid_ohl_nr: Option<String>,
}

/// One unit of completed field work from the aggregated ledger.
///
/// `project` and `shire` are the exact-match keys for reconciliation;
/// everything else passes through to the reports untouched.
#[derive(Debug, Clone)]
pub struct AggregatedRecord {
    pub project: String,
    pub shire: String,
    pub segment_description: Option<String>,
    pub segment_code: String,
    pub project_manager: String,
    pub team_name: String,
    pub item: String,
    pub mapped: String,
    pub quantity: Option<f64>,
    pub total: Option<f64>,
    pub orig: Option<f64>,
    pub date_to_use: Option<NaiveDate>,
    pub source_file: String,
}

impl AggregatedRecord {
    /// Display form of the work date; rows without a usable date show as
    /// `Unplanned`.
    pub fn date_display(&self) -> String {
        match self.date_to_use {
            Some(d) => d.format("%d/%m/%Y").to_string(),
            None => "Unplanned".to_string(),
        }
    }
}

/// One canonical project/segment definition from the PID reference table.
#[derive(Debug, Clone)]
pub struct ReferenceRecord {
    pub project: String,
    pub shire: String,
    pub project_description: Option<String>,
    pub pid_ohl_nr: Option<String>,
}

/// Aggregated records together with the normalized column names they were
/// read from. The column list is what the reconciler validates required
/// columns against.
#[derive(Debug, Clone)]
pub struct AggTable {
    pub columns: Vec<String>,
    pub records: Vec<AggregatedRecord>,
}

/// Reference records plus their normalized column names.
#[derive(Debug, Clone)]
pub struct PidTable {
    pub columns: Vec<String>,
    pub records: Vec<ReferenceRecord>,
}

/// Outcome of reconciling one aggregated record against the PID table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub matched_description: String,
    pub match_score: u8,
    pub pid_ohl_nr: String,
}

impl MatchResult {
    /// The "no match" sentinel, carrying whatever best score was computed
    /// (0 when no candidate was considered at all).
    pub fn no_match(score: u8) -> Self {
        MatchResult {
            matched_description: NO_MATCH.to_string(),
            match_score: score,
            pid_ohl_nr: NOT_AVAILABLE.to_string(),
        }
    }

    pub fn accepted(&self) -> bool {
        self.matched_description != NO_MATCH
    }
}

/// An aggregated record with its reconciliation result attached.
#[derive(Debug, Clone)]
pub struct EnrichedRecord {
    pub record: AggregatedRecord,
    pub result: MatchResult,
}

impl EnrichedRecord {
    pub fn to_row(&self) -> EnrichedRow {
        EnrichedRow {
            project: self.record.project.clone(),
            shire: self.record.shire.clone(),
            segment_code: self.record.segment_code.clone(),
            segment_desc: self.record.segment_description.clone().unwrap_or_default(),
            project_manager: self.record.project_manager.clone(),
            item: self.record.item.clone(),
            mapped: self.record.mapped.clone(),
            qsub: self
                .record
                .quantity
                .map(|q| format!("{:.2}", q))
                .unwrap_or_default(),
            total: self
                .record
                .total
                .map(|t| format!("{:.2}", t))
                .unwrap_or_default(),
            orig: self
                .record
                .orig
                .map(|o| format!("{:.2}", o))
                .unwrap_or_default(),
            date_to_use: self.record.date_display(),
            team_name: self.record.team_name.clone(),
            source_file: self.record.source_file.clone(),
            matched_description: self.result.matched_description.clone(),
            match_score: self.result.match_score,
            pid_ohl_nr: self.result.pid_ohl_nr.clone(),
        }
    }
}

/// Flat, display-ready form of an enriched record for CSV export and
/// console previews.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct EnrichedRow {
    #[serde(rename = "Project")]
    #[tabled(rename = "Project")]
    pub project: String,
    #[serde(rename = "Shire")]
    #[tabled(rename = "Shire")]
    pub shire: String,
    #[serde(rename = "SegmentCode")]
    #[tabled(rename = "SegmentCode")]
    pub segment_code: String,
    #[serde(rename = "SegmentDesc")]
    #[tabled(rename = "SegmentDesc")]
    pub segment_desc: String,
    #[serde(rename = "ProjectManager")]
    #[tabled(rename = "ProjectManager")]
    pub project_manager: String,
    #[serde(rename = "Item")]
    #[tabled(rename = "Item")]
    pub item: String,
    #[serde(rename = "Mapped")]
    #[tabled(rename = "Mapped")]
    pub mapped: String,
    #[serde(rename = "Qsub")]
    #[tabled(rename = "Qsub")]
    pub qsub: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: String,
    #[serde(rename = "Orig")]
    #[tabled(rename = "Orig")]
    pub orig: String,
    #[serde(rename = "DateToUse")]
    #[tabled(rename = "DateToUse")]
    pub date_to_use: String,
    #[serde(rename = "TeamName")]
    #[tabled(rename = "TeamName")]
    pub team_name: String,
    #[serde(rename = "SourceFile")]
    #[tabled(rename = "SourceFile")]
    pub source_file: String,
    #[serde(rename = "MatchedProjectDescription")]
    #[tabled(rename = "MatchedProjectDescription")]
    pub matched_description: String,
    #[serde(rename = "MatchScore")]
    #[tabled(rename = "MatchScore")]
    pub match_score: u8,
    #[serde(rename = "PidOhlNr")]
    #[tabled(rename = "PidOhlNr")]
    pub pid_ohl_nr: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FinancialSummaryRow {
    #[serde(rename = "Shire")]
    #[tabled(rename = "Shire")]
    pub shire: String,
    #[serde(rename = "Project")]
    #[tabled(rename = "Project")]
    pub project: String,
    #[serde(rename = "Rows")]
    #[tabled(rename = "Rows")]
    pub rows: usize,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: String,
    #[serde(rename = "Variation")]
    #[tabled(rename = "Variation")]
    pub variation: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MaterialSummaryRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Mapped")]
    #[tabled(rename = "Mapped")]
    pub label: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: String,
    #[serde(rename = "Unit")]
    #[tabled(rename = "Unit")]
    pub unit: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MatchSummaryRow {
    #[serde(rename = "Project")]
    #[tabled(rename = "Project")]
    pub project: String,
    #[serde(rename = "Shire")]
    #[tabled(rename = "Shire")]
    pub shire: String,
    #[serde(rename = "Rows")]
    #[tabled(rename = "Rows")]
    pub rows: usize,
    #[serde(rename = "Matched")]
    #[tabled(rename = "Matched")]
    pub matched: usize,
    #[serde(rename = "MatchRate")]
    #[tabled(rename = "MatchRate")]
    pub match_rate: String,
    #[serde(rename = "AvgScore")]
    #[tabled(rename = "AvgScore")]
    pub avg_score: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_rows: usize,
    pub matched_rows: usize,
    pub match_rate_pct: f64,
    pub total_revenue: f64,
    pub total_variation: f64,
    pub distinct_projects: usize,
    pub distinct_shires: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_row_carries_all_source_columns() {
        let enriched = EnrichedRecord {
            record: AggregatedRecord {
                project: "PCB 2022".to_string(),
                shire: "Ayrshire".to_string(),
                segment_description: Some("Erect pole near substation A".to_string()),
                segment_code: "SEG-01".to_string(),
                project_manager: "Gary MacDonald".to_string(),
                team_name: "Team 4".to_string(),
                item: "9x220 BIOCIDE LV POLE".to_string(),
                mapped: "9m B".to_string(),
                quantity: Some(2.5),
                total: Some(1200.5),
                orig: Some(1000.0),
                date_to_use: NaiveDate::from_ymd_opt(2023, 4, 17),
                source_file: "CF PCB 2022 week 3.xlsx".to_string(),
            },
            result: MatchResult {
                matched_description: "Erect pole substation A".to_string(),
                match_score: 82,
                pid_ohl_nr: "OHL-001".to_string(),
            },
        };
        let row = enriched.to_row();
        assert_eq!(row.mapped, "9m B");
        assert_eq!(row.orig, "1000.00");
        assert_eq!(row.total, "1200.50");
        assert_eq!(row.qsub, "2.50");
        assert_eq!(row.team_name, "Team 4");
        assert_eq!(row.source_file, "CF PCB 2022 week 3.xlsx");
        assert_eq!(row.date_to_use, "17/04/2023");
        assert_eq!(row.pid_ohl_nr, "OHL-001");
    }

    #[test]
    fn export_row_blanks_absent_values() {
        let enriched = EnrichedRecord {
            record: AggregatedRecord {
                project: "PCB 2022".to_string(),
                shire: "Ayrshire".to_string(),
                segment_description: None,
                segment_code: String::new(),
                project_manager: String::new(),
                team_name: String::new(),
                item: String::new(),
                mapped: String::new(),
                quantity: None,
                total: None,
                orig: None,
                date_to_use: None,
                source_file: String::new(),
            },
            result: MatchResult::no_match(0),
        };
        let row = enriched.to_row();
        assert_eq!(row.orig, "");
        assert_eq!(row.mapped, "");
        assert_eq!(row.date_to_use, "Unplanned");
        assert_eq!(row.matched_description, NO_MATCH);
        assert_eq!(row.pid_ohl_nr, NOT_AVAILABLE);
    }
}
