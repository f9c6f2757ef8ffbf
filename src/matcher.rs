// Fuzzy reconciliation of the aggregated ledger against the PID reference
// table.
//
// Matching policy: exact (project, shire) key, then the best fuzzy match
// among that partition's reference descriptions. Rows that cannot be matched
// degrade to sentinel values; they are never dropped.
use crate::error::{ReportError, Result};
use crate::types::{AggTable, EnrichedRecord, MatchResult, PidTable, ReferenceRecord, NOT_AVAILABLE};
use std::collections::{HashMap, HashSet};

/// Acceptance threshold used when the caller does not override it.
pub const DEFAULT_THRESHOLD: u8 = 75;

const REQUIRED_AGG_COLUMNS: &[&str] = &["project", "shire", "segmentdesc"];
const REQUIRED_PID_COLUMNS: &[&str] = &["project", "shire", "project_description", "pid_ohl_nr"];

/// Normalize free text for comparison: case-fold, drop characters that are
/// neither alphanumeric nor whitespace, collapse runs of whitespace to a
/// single space, trim. Both sides of every comparison go through this.
pub fn normalize_match_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            out.push(c);
            pending_space = false;
        } else if c.is_whitespace() {
            pending_space = true;
        }
        // punctuation and symbols are dropped entirely
    }
    out
}

/// Substring-tolerant similarity on a 0-100 scale.
///
/// The score is the best normalized Levenshtein similarity between the
/// shorter string and either the whole longer string or any of its
/// equal-length character windows. One string being a padded or suffixed
/// variant of the other therefore still scores high, which is the common
/// shape of these descriptions.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    if a == b {
        return 100;
    }
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let long_chars: Vec<char> = long.chars().collect();
    let n = short.chars().count();

    let mut best = strsim::normalized_levenshtein(short, long);
    for window in long_chars.windows(n) {
        if best >= 1.0 {
            break;
        }
        let w: String = window.iter().collect();
        let sim = strsim::normalized_levenshtein(short, &w);
        if sim > best {
            best = sim;
        }
    }
    (best * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Score `target` against every candidate and keep the strictly highest;
/// ties keep the first candidate in iteration order. Returns `None` when the
/// normalized target is empty or there are no candidates.
fn best_candidate<'a>(target: &str, candidates: &[&'a str]) -> Option<(&'a str, u8)> {
    let target_norm = normalize_match_text(target);
    if target_norm.is_empty() {
        return None;
    }
    let mut best: Option<(&'a str, u8)> = None;
    for cand in candidates {
        let score = partial_ratio(&target_norm, &normalize_match_text(cand));
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((cand, score)),
        }
    }
    best
}

/// Distinct non-empty descriptions of a reference partition, in
/// first-encounter order.
fn distinct_descriptions<'a>(group: &[&'a ReferenceRecord]) -> Vec<&'a str> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for r in group {
        if let Some(desc) = r.project_description.as_deref() {
            if seen.insert(desc) {
                out.push(desc);
            }
        }
    }
    out
}

fn check_columns(table: &'static str, columns: &[String], required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !columns.iter().any(|h| h == *c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReportError::MissingColumns {
            table,
            columns: missing,
        })
    }
}

/// Reconcile the aggregated ledger against the PID reference table.
///
/// Output has the same length and order as the input ledger: every row gets
/// exactly one `MatchResult`, sentinel-valued where nothing acceptable was
/// found. Missing required columns abort with `MissingColumns` before any
/// row is processed. Pure: same inputs, same output.
pub fn reconcile(agg: &AggTable, pid: &PidTable, threshold: u8) -> Result<Vec<EnrichedRecord>> {
    check_columns("aggregated", &agg.columns, REQUIRED_AGG_COLUMNS)?;
    check_columns("PID", &pid.columns, REQUIRED_PID_COLUMNS)?;
    let threshold = threshold.min(100);

    // Reference rows grouped by exact key; Vec push keeps file order so
    // "first encountered" stays well defined within a partition.
    let mut pid_groups: HashMap<(&str, &str), Vec<&ReferenceRecord>> = HashMap::new();
    for r in &pid.records {
        pid_groups
            .entry((r.project.as_str(), r.shire.as_str()))
            .or_default()
            .push(r);
    }

    let combinations: HashSet<(&str, &str)> = agg
        .records
        .iter()
        .map(|r| (r.project.as_str(), r.shire.as_str()))
        .collect();
    log::info!(
        "fuzzy matching {} project/shire combinations against {} reference rows",
        combinations.len(),
        pid.records.len()
    );

    // Candidate lists are derived per partition on first use.
    let mut candidates: HashMap<(&str, &str), Vec<&str>> = HashMap::new();

    let mut enriched: Vec<EnrichedRecord> = Vec::with_capacity(agg.records.len());
    for record in &agg.records {
        let result = match record.segment_description.as_deref() {
            _ if record.project.is_empty() || record.shire.is_empty() => MatchResult::no_match(0),
            None => MatchResult::no_match(0),
            Some(desc) => {
                let key = (record.project.as_str(), record.shire.as_str());
                match pid_groups.get(&key) {
                    // No reference partition for this key: never search
                    // outside it.
                    None => MatchResult::no_match(0),
                    Some(group) => {
                        let cands = candidates
                            .entry(key)
                            .or_insert_with(|| distinct_descriptions(group));
                        match best_candidate(desc, cands) {
                            None => MatchResult::no_match(0),
                            Some((best, score)) if score >= threshold => {
                                // First reference row carrying the chosen
                                // description wins when duplicates exist.
                                let source = group
                                    .iter()
                                    .find(|r| r.project_description.as_deref() == Some(best));
                                let pid_ohl_nr = source
                                    .and_then(|r| r.pid_ohl_nr.clone())
                                    .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                                MatchResult {
                                    matched_description: best.to_string(),
                                    match_score: score,
                                    pid_ohl_nr,
                                }
                            }
                            // Rejected: the sentinel still carries the best
                            // score that was computed.
                            Some((_, score)) => MatchResult::no_match(score),
                        }
                    }
                }
            }
        };
        enriched.push(EnrichedRecord {
            record: record.clone(),
            result,
        });
    }

    let stats = match_stats(&enriched);
    log::info!(
        "fuzzy matching complete: {}/{} rows matched (>= {}%)",
        stats.matched,
        stats.total,
        threshold
    );
    Ok(enriched)
}

/// All-sentinel enrichment for when the reference table is unavailable. The
/// report pipeline always renders; it just shows the rows unenriched.
pub fn enrich_unmatched(agg: &AggTable) -> Vec<EnrichedRecord> {
    agg.records
        .iter()
        .map(|record| EnrichedRecord {
            record: record.clone(),
            result: MatchResult::no_match(0),
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct MatchStats {
    pub total: usize,
    pub matched: usize,
}

impl MatchStats {
    pub fn rate_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64 * 100.0
        }
    }
}

pub fn match_stats(rows: &[EnrichedRecord]) -> MatchStats {
    MatchStats {
        total: rows.len(),
        matched: rows.iter().filter(|r| r.result.accepted()).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AggregatedRecord, NO_MATCH};

    fn agg_rec(project: &str, shire: &str, desc: Option<&str>) -> AggregatedRecord {
        AggregatedRecord {
            project: project.to_string(),
            shire: shire.to_string(),
            segment_description: desc.map(|d| d.to_string()),
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
        }
    }

    fn agg_table(rows: Vec<AggregatedRecord>) -> AggTable {
        AggTable {
            columns: vec![
                "project".to_string(),
                "shire".to_string(),
                "segmentdesc".to_string(),
            ],
            records: rows,
        }
    }

    fn pid_rec(project: &str, shire: &str, desc: &str, nr: &str) -> ReferenceRecord {
        ReferenceRecord {
            project: project.to_string(),
            shire: shire.to_string(),
            project_description: if desc.is_empty() {
                None
            } else {
                Some(desc.to_string())
            },
            pid_ohl_nr: if nr.is_empty() {
                None
            } else {
                Some(nr.to_string())
            },
        }
    }

    fn pid_table(rows: Vec<ReferenceRecord>) -> PidTable {
        PidTable {
            columns: vec![
                "project".to_string(),
                "shire".to_string(),
                "project_description".to_string(),
                "pid_ohl_nr".to_string(),
            ],
            records: rows,
        }
    }

    #[test]
    fn normalizes_text_for_matching() {
        assert_eq!(
            normalize_match_text("  Erect   POLE, near sub-station A!! "),
            "erect pole near substation a"
        );
        assert_eq!(normalize_match_text("!!!"), "");
        assert_eq!(normalize_match_text(""), "");
    }

    #[test]
    fn partial_ratio_basics() {
        assert_eq!(partial_ratio("erect pole a", "erect pole a"), 100);
        // exact substring scores 100
        assert_eq!(partial_ratio("pole", "erect pole a"), 100);
        assert_eq!(partial_ratio("", "anything"), 0);
        let padded = partial_ratio("erect pole substation a", "erect pole near substation a");
        assert!(padded >= 75, "padded variant scored {}", padded);
        let unrelated = partial_ratio("erect pole a", "replace transformer b");
        assert!(unrelated < 60, "unrelated pair scored {}", unrelated);
    }

    #[test]
    fn accepts_match_within_same_key() {
        let agg = agg_table(vec![agg_rec(
            "PCB 2022",
            "Ayrshire",
            Some("Erect pole near substation A"),
        )]);
        let pid = pid_table(vec![pid_rec(
            "PCB 2022",
            "Ayrshire",
            "Erect pole substation A",
            "OHL-001",
        )]);
        let out = reconcile(&agg, &pid, 75).expect("reconcile");
        assert_eq!(out.len(), 1);
        let r = &out[0].result;
        assert!(r.accepted());
        assert_eq!(r.pid_ohl_nr, "OHL-001");
        assert_eq!(r.matched_description, "Erect pole substation A");
        assert!(r.match_score >= 75);
    }

    #[test]
    fn key_mismatch_excludes_similar_text() {
        let agg = agg_table(vec![agg_rec(
            "PCB 2022",
            "Ayrshire",
            Some("Erect pole near substation A"),
        )]);
        // Near-identical description but a different shire: not a candidate.
        let pid = pid_table(vec![pid_rec(
            "PCB 2022",
            "Lanark",
            "Erect pole substation A",
            "OHL-001",
        )]);
        let out = reconcile(&agg, &pid, 75).expect("reconcile");
        let r = &out[0].result;
        assert!(!r.accepted());
        assert_eq!(r.matched_description, NO_MATCH);
        assert_eq!(r.match_score, 0);
        assert_eq!(r.pid_ohl_nr, NOT_AVAILABLE);
    }

    #[test]
    fn empty_description_is_sentinel() {
        let agg = agg_table(vec![
            agg_rec("PCB 2022", "Ayrshire", None),
            agg_rec("PCB 2022", "Ayrshire", Some("   ")),
        ]);
        let pid = pid_table(vec![pid_rec(
            "PCB 2022",
            "Ayrshire",
            "Erect pole substation A",
            "OHL-001",
        )]);
        // Blank descriptions are cleaned to None by the loader, but reconcile
        // also tolerates whitespace-only text arriving directly.
        let out = reconcile(&agg, &pid, 75).expect("reconcile");
        for row in &out {
            assert!(!row.result.accepted());
            assert_eq!(row.result.match_score, 0);
        }
    }

    #[test]
    fn picks_most_similar_candidate() {
        let agg = agg_table(vec![agg_rec(
            "PCB 2022",
            "Ayrshire",
            Some("Erect poles near A"),
        )]);
        let pid = pid_table(vec![
            pid_rec("PCB 2022", "Ayrshire", "Erect pole A", "OHL-001"),
            pid_rec("PCB 2022", "Ayrshire", "Replace transformer B", "OHL-002"),
        ]);
        let out = reconcile(&agg, &pid, 75).expect("reconcile");
        let r = &out[0].result;
        assert!(r.accepted());
        assert_eq!(r.matched_description, "Erect pole A");
        assert_eq!(r.pid_ohl_nr, "OHL-001");
        assert!(r.match_score >= 75 && r.match_score < 100);

        // Candidate order must not change the winner when scores differ.
        let pid_rev = pid_table(vec![
            pid_rec("PCB 2022", "Ayrshire", "Replace transformer B", "OHL-002"),
            pid_rec("PCB 2022", "Ayrshire", "Erect pole A", "OHL-001"),
        ]);
        let out_rev = reconcile(&agg, &pid_rev, 75).expect("reconcile");
        assert_eq!(out_rev[0].result.matched_description, "Erect pole A");
    }

    #[test]
    fn tie_keeps_first_candidate() {
        let agg = agg_table(vec![agg_rec("P", "S", Some("ab"))]);
        // "ax" and "xb" both score 50 against "ab".
        let pid = pid_table(vec![
            pid_rec("P", "S", "ax", "ID-1"),
            pid_rec("P", "S", "xb", "ID-2"),
        ]);
        let out = reconcile(&agg, &pid, 50).expect("reconcile");
        let r = &out[0].result;
        assert!(r.accepted());
        assert_eq!(r.matched_description, "ax");
        assert_eq!(r.pid_ohl_nr, "ID-1");
    }

    #[test]
    fn duplicate_reference_rows_first_id_wins() {
        let agg = agg_table(vec![agg_rec("P", "S", Some("Erect pole A"))]);
        let pid = pid_table(vec![
            pid_rec("P", "S", "Erect pole A", "FIRST"),
            pid_rec("P", "S", "Erect pole A", "SECOND"),
        ]);
        let out = reconcile(&agg, &pid, 75).expect("reconcile");
        assert_eq!(out[0].result.pid_ohl_nr, "FIRST");
    }

    #[test]
    fn rejected_best_score_is_reported() {
        let agg = agg_table(vec![agg_rec(
            "PCB 2022",
            "Ayrshire",
            Some("Erect pole near substation A"),
        )]);
        let pid = pid_table(vec![pid_rec(
            "PCB 2022",
            "Ayrshire",
            "Erect pole substation A",
            "OHL-001",
        )]);
        let accepted = reconcile(&agg, &pid, 75).expect("reconcile");
        let score = accepted[0].result.match_score;
        assert!(score >= 75 && score < 95);

        // Raising the threshold past the score flips the row to the
        // sentinel, but the computed score is still carried.
        let rejected = reconcile(&agg, &pid, 95).expect("reconcile");
        let r = &rejected[0].result;
        assert!(!r.accepted());
        assert_eq!(r.match_score, score);
        assert_eq!(r.pid_ohl_nr, NOT_AVAILABLE);
    }

    #[test]
    fn threshold_monotonicity() {
        let agg = agg_table(vec![
            agg_rec("P", "S", Some("Erect pole near substation A")),
            agg_rec("P", "S", Some("Replace transformer B")),
            agg_rec("P", "S", Some("unrelated text entirely")),
        ]);
        let pid = pid_table(vec![
            pid_rec("P", "S", "Erect pole substation A", "ID-1"),
            pid_rec("P", "S", "Replace transformer B unit 4", "ID-2"),
        ]);
        let mut last = usize::MAX;
        for threshold in [0u8, 50, 75, 90, 100] {
            let out = reconcile(&agg, &pid, threshold).expect("reconcile");
            let matched = match_stats(&out).matched;
            assert!(
                matched <= last,
                "raising threshold to {} increased matches",
                threshold
            );
            last = matched;
        }
    }

    #[test]
    fn cardinality_and_order_preserved() {
        let agg = agg_table(vec![
            agg_rec("A", "S1", Some("pole one")),
            agg_rec("B", "S2", Some("pole two")),
            agg_rec("A", "S1", Some("pole three")),
            agg_rec("C", "S3", None),
        ]);
        let pid = pid_table(vec![pid_rec("A", "S1", "pole one", "ID-1")]);
        let out = reconcile(&agg, &pid, 75).expect("reconcile");
        assert_eq!(out.len(), 4);
        let projects: Vec<&str> = out.iter().map(|r| r.record.project.as_str()).collect();
        assert_eq!(projects, vec!["A", "B", "A", "C"]);
    }

    #[test]
    fn deterministic_across_runs() {
        let agg = agg_table(vec![
            agg_rec("P", "S", Some("Erect pole near substation A")),
            agg_rec("P", "S", Some("Replace transformer B")),
            agg_rec("Q", "S", Some("String conductor span 4")),
        ]);
        let pid = pid_table(vec![
            pid_rec("P", "S", "Erect pole substation A", "ID-1"),
            pid_rec("P", "S", "Transformer B replacement", "ID-2"),
            pid_rec("Q", "S", "String conductor span 4", "ID-3"),
        ]);
        let a = reconcile(&agg, &pid, 75).expect("reconcile");
        let b = reconcile(&agg, &pid, 75).expect("reconcile");
        let shape = |rows: &[EnrichedRecord]| {
            rows.iter()
                .map(|r| r.result.clone())
                .collect::<Vec<MatchResult>>()
        };
        assert_eq!(shape(&a), shape(&b));
    }

    #[test]
    fn missing_columns_abort_reconciliation() {
        let mut agg = agg_table(vec![agg_rec("P", "S", Some("pole"))]);
        agg.columns.retain(|c| c != "segmentdesc");
        let pid = pid_table(vec![]);
        match reconcile(&agg, &pid, 75) {
            Err(ReportError::MissingColumns { table, columns }) => {
                assert_eq!(table, "aggregated");
                assert_eq!(columns, vec!["segmentdesc".to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other.map(|v| v.len())),
        }

        let agg = agg_table(vec![agg_rec("P", "S", Some("pole"))]);
        let mut pid = pid_table(vec![]);
        pid.columns.retain(|c| c == "project" || c == "shire");
        match reconcile(&agg, &pid, 75) {
            Err(ReportError::MissingColumns { table, columns }) => {
                assert_eq!(table, "PID");
                assert_eq!(
                    columns,
                    vec!["project_description".to_string(), "pid_ohl_nr".to_string()]
                );
            }
            other => panic!("expected MissingColumns, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn missing_reference_id_degrades_to_sentinel_id() {
        let agg = agg_table(vec![agg_rec("P", "S", Some("Erect pole A"))]);
        let pid = pid_table(vec![pid_rec("P", "S", "Erect pole A", "")]);
        let out = reconcile(&agg, &pid, 75).expect("reconcile");
        let r = &out[0].result;
        assert!(r.accepted());
        assert_eq!(r.pid_ohl_nr, NOT_AVAILABLE);
    }

    #[test]
    fn enrich_unmatched_is_all_sentinels() {
        let agg = agg_table(vec![
            agg_rec("P", "S", Some("anything")),
            agg_rec("Q", "S", None),
        ]);
        let out = enrich_unmatched(&agg);
        assert_eq!(out.len(), 2);
        for row in &out {
            assert_eq!(row.result, MatchResult::no_match(0));
        }
        let stats = match_stats(&out);
        assert_eq!(stats.matched, 0);
        assert_eq!(stats.rate_pct(), 0.0);
    }
}
