// Explicit filter model for the report views.
//
// The original dashboard kept selections in ambient widget state and reran
// everything on each interaction; here a `FilterState` value is passed in and
// the derived views are pure functions of (records, state).
use crate::mappings::wards_for_regions;
use crate::types::EnrichedRecord;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// One filter request. `None` for a selection means "All".
#[derive(Debug, Default, Clone)]
pub struct FilterState {
    pub shires: Option<Vec<String>>,
    pub projects: Option<Vec<String>>,
    pub project_managers: Option<Vec<String>>,
    pub pid_ohl_nrs: Option<Vec<String>>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl FilterState {
    fn selected(selection: &Option<Vec<String>>, value: &str) -> bool {
        match selection {
            None => true,
            Some(values) => values.iter().any(|v| v == value),
        }
    }

    pub fn matches(&self, row: &EnrichedRecord) -> bool {
        if !Self::selected(&self.shires, &row.record.shire)
            || !Self::selected(&self.projects, &row.record.project)
            || !Self::selected(&self.project_managers, &row.record.project_manager)
            || !Self::selected(&self.pid_ohl_nrs, &row.result.pid_ohl_nr)
        {
            return false;
        }
        if self.date_from.is_some() || self.date_to.is_some() {
            // Date-bounded views only show rows with a usable date.
            let Some(date) = row.record.date_to_use else {
                return false;
            };
            if let Some(from) = self.date_from {
                if date < from {
                    return false;
                }
            }
            if let Some(to) = self.date_to {
                if date > to {
                    return false;
                }
            }
        }
        true
    }
}

/// Selectable values for the next request. Shire options are global;
/// project, manager and PID options cascade within the selected shires.
/// `wards` is the electoral-ward coverage of those shires, for display.
#[derive(Debug, Default)]
pub struct FilterOptions {
    pub shires: Vec<String>,
    pub projects: Vec<String>,
    pub project_managers: Vec<String>,
    pub pid_ohl_nrs: Vec<String>,
    pub wards: Vec<String>,
}

fn distinct_sorted<'a, I>(values: I) -> Vec<String>
where
    I: Iterator<Item = &'a str>,
{
    let set: BTreeSet<&str> = values.filter(|v| !v.is_empty()).collect();
    set.into_iter().map(|v| v.to_string()).collect()
}

pub fn options(records: &[EnrichedRecord], state: &FilterState) -> FilterOptions {
    let in_shires: Vec<&EnrichedRecord> = records
        .iter()
        .filter(|r| FilterState::selected(&state.shires, &r.record.shire))
        .collect();
    FilterOptions {
        shires: distinct_sorted(records.iter().map(|r| r.record.shire.as_str())),
        projects: distinct_sorted(in_shires.iter().map(|r| r.record.project.as_str())),
        project_managers: distinct_sorted(
            in_shires.iter().map(|r| r.record.project_manager.as_str()),
        ),
        pid_ohl_nrs: distinct_sorted(in_shires.iter().map(|r| r.result.pid_ohl_nr.as_str())),
        wards: wards_for_regions(in_shires.iter().map(|r| r.record.shire.as_str())),
    }
}

/// Rows passing the filter, in input order.
pub fn apply<'a>(records: &'a [EnrichedRecord], state: &FilterState) -> Vec<&'a EnrichedRecord> {
    records.iter().filter(|r| state.matches(r)).collect()
}
