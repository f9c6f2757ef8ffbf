// Entry point and high-level CLI flow.
//
// - Option [1] loads the aggregated ledger and the PID reference table,
//   printing diagnostics.
// - Option [2] reconciles the ledger against the PID data, prompting for the
//   acceptance threshold.
// - Option [3] applies filters and generates the reports, the enriched CSV
//   and a JSON summary. Afterwards the user can go back to the menu or exit.
mod error;
mod filters;
mod loader;
mod mappings;
mod matcher;
mod output;
mod reports;
mod types;
mod util;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use types::{AggTable, EnrichedRecord, PidTable};

// Simple in-memory app state so data is loaded and reconciled once but
// reports can be generated repeatedly with different filters in one run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    agg: Option<AggTable>,
    pid: Option<PidTable>,
    enriched: Option<Vec<EnrichedRecord>>,
}

const AGGREGATED_PATH: &str = "CF_aggregated.csv";
const PID_PATH: &str = "Resume_PID.csv";

/// Print a prompt and read a single trimmed line of input.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask a Y/N question; empty input takes the default.
fn prompt_yes_no(prompt: &str, default: bool) -> bool {
    loop {
        let resp = read_line(prompt).to_uppercase();
        match resp.as_str() {
            "" => return default,
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Parse a comma-separated selection; blank means "All" (`None`).
fn parse_selection(input: &str) -> Option<Vec<String>> {
    let values: Vec<String> = input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn parse_date_input(input: &str) -> Option<NaiveDate> {
    util::parse_date_safe(Some(input))
}

/// Handle option [1]: load both source tables.
///
/// A missing or unreadable PID file is not fatal; reconciliation then
/// degrades to the all-sentinel enrichment.
fn handle_load() {
    match loader::load_aggregated(AGGREGATED_PATH) {
        Ok((table, report)) => {
            println!(
                "Aggregated data: {} rows read, {} kept, {} parse errors skipped.",
                util::format_int(report.total_rows as i64),
                util::format_int(report.kept_rows as i64),
                util::format_int(report.parse_errors as i64)
            );
            if report.unplanned_rows > 0 {
                println!(
                    "Note: {} rows have no usable date (shown as Unplanned).",
                    util::format_int(report.unplanned_rows as i64)
                );
            }
            if report.imputed_keys > 0 {
                println!(
                    "Info: backfilled project/shire keys for {} rows.",
                    util::format_int(report.imputed_keys as i64)
                );
            }
            let mut state = APP_STATE.lock().unwrap();
            state.agg = Some(table);
            state.enriched = None;
        }
        Err(e) => {
            eprintln!("Failed to load aggregated data: {}\n", e);
            return;
        }
    }

    match loader::load_reference(PID_PATH) {
        Ok((table, report)) => {
            println!(
                "PID data: {} rows loaded, {} parse errors skipped.\n",
                util::format_int(report.kept_rows as i64),
                util::format_int(report.parse_errors as i64)
            );
            let mut state = APP_STATE.lock().unwrap();
            state.pid = Some(table);
        }
        Err(e) => {
            log::warn!("PID reference table unavailable: {}", e);
            println!("PID data not available for fuzzy matching ({}).\n", e);
            let mut state = APP_STATE.lock().unwrap();
            state.pid = None;
        }
    }
}

/// Handle option [2]: reconcile the ledger against the PID table.
fn handle_reconcile() {
    let (agg, pid) = {
        let state = APP_STATE.lock().unwrap();
        (state.agg.clone(), state.pid.clone())
    };
    let Some(agg) = agg else {
        println!("Error: No data loaded. Please load the data files first (option 1).\n");
        return;
    };

    let threshold = {
        let input = read_line(&format!(
            "Match threshold 0-100 [{}]: ",
            matcher::DEFAULT_THRESHOLD
        ));
        if input.is_empty() {
            matcher::DEFAULT_THRESHOLD
        } else {
            match input.parse::<u8>() {
                Ok(t) if t <= 100 => t,
                _ => {
                    println!(
                        "Invalid threshold, using default {}.",
                        matcher::DEFAULT_THRESHOLD
                    );
                    matcher::DEFAULT_THRESHOLD
                }
            }
        }
    };

    let enriched = match pid {
        Some(pid) => match matcher::reconcile(&agg, &pid, threshold) {
            Ok(enriched) => enriched,
            Err(e) => {
                // Configuration error: report it and fall back to the
                // unenriched rows so the reports still render.
                eprintln!("Reconciliation skipped: {}", e);
                matcher::enrich_unmatched(&agg)
            }
        },
        None => {
            println!("PID data not loaded; rows will be shown unenriched.");
            matcher::enrich_unmatched(&agg)
        }
    };

    let stats = matcher::match_stats(&enriched);
    println!(
        "Fuzzy matching complete: {}/{} rows matched ({:.1}%).\n",
        util::format_int(stats.matched as i64),
        util::format_int(stats.total as i64),
        stats.rate_pct()
    );

    let mut state = APP_STATE.lock().unwrap();
    state.enriched = Some(enriched);
}

/// Prompt for a filter request, showing the selectable values first.
fn prompt_filters(enriched: &[EnrichedRecord]) -> filters::FilterState {
    let opts = filters::options(enriched, &filters::FilterState::default());
    println!("Shires: {}", opts.shires.join(", "));
    println!("Projects: {}", opts.projects.join(", "));

    let mut state = filters::FilterState {
        shires: parse_selection(&read_line("Shire filter (comma-separated, blank for all): ")),
        ..Default::default()
    };
    // Recompute the remaining options within the chosen shires before asking.
    let opts = filters::options(enriched, &state);
    println!(
        "Ward coverage: {} electoral wards.",
        util::format_int(opts.wards.len() as i64)
    );
    println!("Projects in selection: {}", opts.projects.join(", "));
    state.projects = parse_selection(&read_line(
        "Project filter (comma-separated, blank for all): ",
    ));
    println!(
        "Project managers in selection: {}",
        opts.project_managers.join(", ")
    );
    state.project_managers = parse_selection(&read_line(
        "Project manager filter (comma-separated, blank for all): ",
    ));
    println!("PID OHL Nrs in selection: {}", opts.pid_ohl_nrs.join(", "));
    state.pid_ohl_nrs = parse_selection(&read_line(
        "PID OHL Nr filter (comma-separated, blank for all): ",
    ));
    state.date_from = parse_date_input(&read_line("From date (YYYY-MM-DD, blank for all): "));
    state.date_to = parse_date_input(&read_line("To date (YYYY-MM-DD, blank for all): "));
    state
}

/// Handle option [3]: filter the enriched rows and generate every report.
fn handle_reports() {
    let enriched = {
        let state = APP_STATE.lock().unwrap();
        match (&state.enriched, &state.agg) {
            (Some(enriched), _) => enriched.clone(),
            // Best effort: reports render unenriched when reconciliation
            // has not been run.
            (None, Some(agg)) => matcher::enrich_unmatched(agg),
            (None, None) => {
                println!("Error: No data loaded. Please load the data files first (option 1).\n");
                return;
            }
        }
    };

    let filter_state = prompt_filters(&enriched);
    let rows = filters::apply(&enriched, &filter_state);
    println!(
        "\n{} of {} rows selected.\n",
        util::format_int(rows.len() as i64),
        util::format_int(enriched.len() as i64)
    );

    println!("Generating reports...");
    println!("Outputs saved to individual files...\n");

    let enriched_rows: Vec<types::EnrichedRow> = rows.iter().map(|r| r.to_row()).collect();
    let enriched_file = "enriched_data.csv";
    if let Err(e) = output::write_csv(enriched_file, &enriched_rows) {
        eprintln!("Write error: {}", e);
    }
    println!("Enriched data exported to {}\n", enriched_file);

    let (total, variation) = reports::financial_totals(&rows);
    println!("Financial");
    println!(
        "Total: {}  Variation: {}\n",
        util::format_number(total, 2),
        util::format_number(variation, 2)
    );

    let r1 = reports::financial_summary(&rows);
    let file1 = "report1_financial_summary.csv";
    if let Err(e) = output::write_csv(file1, &r1) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 1: Financial Summary by Shire and Project\n");
    output::preview_table(&r1, 5);
    println!("(Full table exported to {})\n", file1);

    let to_miles = prompt_yes_no("Convert conductor lengths to miles (y/N): ", false);
    let r2 = reports::materials_summary(&rows, to_miles);
    let file2 = "report2_materials_summary.csv";
    if let Err(e) = output::write_csv(file2, &r2) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 2: Materials Summary\n");
    output::preview_table(&r2, 8);
    println!("(Full table exported to {})\n", file2);

    let r3 = reports::match_summary(&rows);
    let file3 = "report3_match_summary.csv";
    if let Err(e) = output::write_csv(file3, &r3) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 3: PID Match Quality by Project and Shire\n");
    output::preview_table(&r3, 5);
    println!("(Full table exported to {})\n", file3);

    let summary = reports::generate_summary(&rows);
    if let Err(e) = output::write_json("summary.json", &summary) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary Stats (summary.json):");
    println!(
        "{{\"match_rate_pct\": {:.1}, \"total_revenue\": {}}}\n",
        summary.match_rate_pct,
        util::format_number(summary.total_revenue, 2)
    );
}

fn main() {
    env_logger::init();
    loop {
        println!("Gaeltec Field-Work Reports");
        println!("[1] Load the data files");
        println!("[2] Reconcile with PID data");
        println!("[3] Generate reports\n");
        match read_line("Enter choice: ").as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                handle_reconcile();
            }
            "3" => {
                println!();
                handle_reports();
                if !prompt_yes_no("Back to Report Selection (Y/N): ", true) {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
            }
        }
    }
}
