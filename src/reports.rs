use crate::mappings::{map_item, MATERIAL_CATEGORIES};
use crate::types::{
    EnrichedRecord, FinancialSummaryRow, MatchSummaryRow, MaterialSummaryRow, SummaryStats,
};
use crate::util::{average, format_number};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

pub const MILES_PER_KM: f64 = 0.621371;

/// Overall revenue figures for the selected rows: the sum of `total` and the
/// sum of `total - orig`. Variation only counts rows carrying both values.
pub fn financial_totals(rows: &[&EnrichedRecord]) -> (f64, f64) {
    let mut total_sum = 0.0;
    let mut variation_sum = 0.0;
    for row in rows {
        if let Some(total) = row.record.total {
            total_sum += total;
            if let Some(orig) = row.record.orig {
                variation_sum += total - orig;
            }
        }
    }
    (total_sum, variation_sum)
}

/// Revenue broken down per (shire, project), largest total first.
pub fn financial_summary(rows: &[&EnrichedRecord]) -> Vec<FinancialSummaryRow> {
    #[derive(Default)]
    struct Acc {
        rows: usize,
        total: f64,
        variation: f64,
    }
    let mut map: HashMap<(String, String), Acc> = HashMap::new();
    for row in rows {
        let key = (row.record.shire.clone(), row.record.project.clone());
        let e = map.entry(key).or_default();
        e.rows += 1;
        if let Some(total) = row.record.total {
            e.total += total;
            if let Some(orig) = row.record.orig {
                e.variation += total - orig;
            }
        }
    }

    let mut scored: Vec<(f64, FinancialSummaryRow)> = map
        .into_iter()
        .map(|((shire, project), acc)| {
            let row = FinancialSummaryRow {
                shire,
                project,
                rows: acc.rows,
                total: format_number(acc.total, 2),
                variation: format_number(acc.variation, 2),
            };
            (acc.total, row)
        })
        .collect();
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.shire.cmp(&b.1.shire))
            .then_with(|| a.1.project.cmp(&b.1.project))
    });
    scored.into_iter().map(|(_, row)| row).collect()
}

/// Material quantities per category, grouped by short label.
///
/// A row belongs to a category when its `item` contains one of the
/// category's dictionary keys; quantities are the summed `qsub` values.
/// Conductor lengths are kept in km unless `convert_to_miles` is set.
pub fn materials_summary(
    rows: &[&EnrichedRecord],
    convert_to_miles: bool,
) -> Vec<MaterialSummaryRow> {
    let mut out = Vec::new();
    for category in MATERIAL_CATEGORIES {
        let mut totals: HashMap<String, f64> = HashMap::new();
        for row in rows {
            // Membership comes from the item name; the display label prefers
            // the sheet's own `mapped` value over the dictionary label.
            let Some(dict_label) = map_item(category.labels, &row.record.item) else {
                continue;
            };
            let label = if row.record.mapped.is_empty() {
                dict_label.to_string()
            } else {
                row.record.mapped.clone()
            };
            *totals.entry(label).or_insert(0.0) += row.record.quantity.unwrap_or(0.0);
        }
        if totals.is_empty() {
            continue;
        }

        let is_length = category.unit.starts_with("Length");
        let (scale, unit) = if is_length && convert_to_miles {
            (MILES_PER_KM, "Length (Miles)")
        } else {
            (1.0, category.unit)
        };

        let mut labels: Vec<&String> = totals.keys().collect();
        labels.sort_unstable();
        for label in labels {
            out.push(MaterialSummaryRow {
                category: category.name.to_string(),
                label: label.clone(),
                total: format_number(totals[label.as_str()] * scale, 2),
                unit: unit.to_string(),
            });
        }
    }
    out
}

/// Match quality per (project, shire) partition.
pub fn match_summary(rows: &[&EnrichedRecord]) -> Vec<MatchSummaryRow> {
    #[derive(Default)]
    struct Acc {
        rows: usize,
        matched: usize,
        scores: Vec<f64>,
    }
    let mut map: HashMap<(String, String), Acc> = HashMap::new();
    for row in rows {
        let key = (row.record.project.clone(), row.record.shire.clone());
        let e = map.entry(key).or_default();
        e.rows += 1;
        if row.result.accepted() {
            e.matched += 1;
            e.scores.push(row.result.match_score as f64);
        }
    }

    let mut out: Vec<MatchSummaryRow> = map
        .into_iter()
        .map(|((project, shire), acc)| {
            let rate = if acc.rows == 0 {
                0.0
            } else {
                acc.matched as f64 / acc.rows as f64 * 100.0
            };
            MatchSummaryRow {
                project,
                shire,
                rows: acc.rows,
                matched: acc.matched,
                match_rate: format!("{:.1}%", rate),
                avg_score: format_number(average(&acc.scores), 2),
            }
        })
        .collect();
    out.sort_by(|a, b| {
        a.project
            .cmp(&b.project)
            .then_with(|| a.shire.cmp(&b.shire))
    });
    out
}

pub fn generate_summary(rows: &[&EnrichedRecord]) -> SummaryStats {
    let total_rows = rows.len();
    let matched_rows = rows.iter().filter(|r| r.result.accepted()).count();
    let match_rate_pct = if total_rows == 0 {
        0.0
    } else {
        matched_rows as f64 / total_rows as f64 * 100.0
    };
    let (total_revenue, total_variation) = financial_totals(rows);
    let projects: BTreeSet<&str> = rows
        .iter()
        .map(|r| r.record.project.as_str())
        .filter(|p| !p.is_empty())
        .collect();
    let shires: BTreeSet<&str> = rows
        .iter()
        .map(|r| r.record.shire.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    SummaryStats {
        total_rows,
        matched_rows,
        match_rate_pct,
        total_revenue,
        total_variation,
        distinct_projects: projects.len(),
        distinct_shires: shires.len(),
    }
}
