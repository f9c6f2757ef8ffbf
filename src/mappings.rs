// Static code -> label dictionaries.
//
// Plain lookup tables, no behavior. The material tables are ordered slices
// because category membership is "item contains key, first key wins", and
// that order must be stable from run to run. The exact-key tables are lazy
// maps.
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};

/// A material category shown in the materials report. `labels` maps the full
/// catalogue item name to the short display label the chart groups by.
pub struct MaterialCategory {
    pub name: &'static str,
    pub unit: &'static str,
    pub labels: &'static [(&'static str, &'static str)],
}

pub const POLE_LABELS: &[(&str, &str)] = &[
    ("9x220 BIOCIDE LV POLE", "9m B"),
    ("9x275 BIOCIDE LV POLE", "9s B"),
    ("9x220 CREOSOTE LV POLE", "9m"),
    ("9x275 CREOSOTE LV POLE", "9s"),
    ("9x220 HV SINGLE POLE", "9m"),
    ("9x275 HV SINGLE POLE", "9s"),
    ("9x295 HV SINGLE POLE", "9es"),
    ("9x315 HV SINGLE POLE", "9esp"),
    ("10x230 BIOCIDE LV POLE", "10m B"),
    ("10x230 HV SINGLE POLE", "10m"),
    ("10x285 BIOCIDE LV POLE", "10s B"),
    ("10x285 HV SINGLE POLE", "10s"),
    ("11x295 HV SINGLE POLE", "11s"),
    ("12x250 CREOSOTE LV POLE", "12m"),
    ("12x305 CREOSOTE LV POLE", "12s"),
    ("12x305 HV SINGLE POLE", "12s"),
    ("13x260 HV SINGLE POLE", "13m"),
    ("13x320 HV SINGLE POLE", "13s"),
    ("14x275 HV SINGLE POLE", "14m"),
    ("14x335 HV SINGLE POLE", "14s"),
];

pub const TRANSFORMER_LABELS: &[(&str, &str)] = &[
    ("Transformer 1ph 25kVA", "TX 1ph (25kVA)"),
    ("Transformer 1ph 50kVA", "TX 1ph (50kVA)"),
    ("Transformer 1ph 100kVA", "TX 1ph (100kVA)"),
    ("Transformer 3ph 50kVA", "TX 3ph (50kVA)"),
    ("Transformer 3ph 100kVA", "TX 3ph (100kVA)"),
    ("Transformer 3ph 200kVA", "TX 3ph (200kVA)"),
];

pub const CONDUCTOR_LABELS: &[(&str, &str)] = &[
    ("Hazel - 50mm² AAAC bare (1000m drums)", "Hazel 50mm²"),
    ("Oak - 100mm² AAAC bare (1000m drums)", "Oak 100mm²"),
    ("Ash - 150mm² AAAC bare (1000m drums)", "Ash 150mm²"),
    ("Poplar - 200mm² AAAC bare (1000m drums)", "Poplar 200mm²"),
    ("Upas - 300mm² AAAC bare (1000m drums)", "Upas 300mm²"),
    ("Gopher - 25mm² ACSR bare (1000m drums)", "Gopher 25mm²"),
    ("Rabbit - 50mm² ACSR bare (1000m drums)", "Rabbit 50mm²"),
    ("Horse - 70mm² ACSR bare", "Horse 70mm²"),
    ("Dog - 100mm² ACSR bare (1000m drums)", "Dog 100mm²"),
    ("Wolf - 150mm² ACSR bare (1000m drums)", "Wolf 150mm²"),
    ("Hard Drawn Copper 16mm²", "Copper 16mm²"),
    ("Hard Drawn Copper 32mm²", "Copper 32mm²"),
    ("Hard Drawn Copper 70mm²", "Copper 70mm²"),
    ("Hard Drawn Copper 100mm²", "Copper 100mm²"),
];

pub const EQUIPMENT_LABELS: &[(&str, &str)] = &[
    ("LV Cable 1ph 4mm Concentric (250m drums)", "LV 1ph 4mm Concentric"),
    ("LV Cable 1ph 25mm CNE (250m drums)", "LV 1ph 25mm CNE"),
    ("LV Cable 1ph 35mm CNE (250m drums)", "LV 1ph 35mm CNE"),
    ("LV Cable 3ph 35mm CNE (250m drums)", "LV 3ph 35mm CNE"),
    ("LV Cable 3c 95mm W/F (250m drums)", "LV 3c 95mm W/F"),
    ("LV Cable 3c 185mm W/F (250m drums)", "LV 3c 185mm W/F"),
    ("LV Cable 4c 95mm W/F (250m drums)", "LV 4c 95mm W/F"),
    ("LV Cable 4c 185mm W/F (250m drums)", "LV 4c 185mm W/F"),
    ("LV Marker Tape (365m roll)", "LV Marker Tape"),
    ("11kv Cable 95mm 3c Poly (250m drums)", "11kV 3c 95mm Poly"),
    ("11kv Cable 185mm 3c Poly (250m drums)", "11kV 3c 185mm Poly"),
    ("11kv Cable 300mm 3c Poly (250m drums)", "11kV 3c 300mm Poly"),
    ("11kV Marker Tape (40m roll)", "11kV Marker Tape"),
];

pub const MATERIAL_CATEGORIES: &[MaterialCategory] = &[
    MaterialCategory {
        name: "Poles",
        unit: "Quantity",
        labels: POLE_LABELS,
    },
    MaterialCategory {
        name: "Transformers",
        unit: "Quantity",
        labels: TRANSFORMER_LABELS,
    },
    MaterialCategory {
        name: "Conductors",
        unit: "Length (Km)",
        labels: CONDUCTOR_LABELS,
    },
    MaterialCategory {
        name: "Equipment",
        unit: "Quantity",
        labels: EQUIPMENT_LABELS,
    },
];

/// Project manager -> (shire, project), including the known misspellings
/// that appear in the source files.
pub static PROJECT_MANAGERS: Lazy<HashMap<&'static str, (&'static str, &'static str)>> =
    Lazy::new(|| {
        HashMap::from([
            ("Jonathon Mcclung", ("Ayrshire", "PCB")),
            ("Gary MacDonald", ("Ayrshire", "LV")),
            ("Jim Gaffney", ("Lanark", "PCB")),
            ("Calum Thomson", ("Ayrshire", "Connections")),
            ("Calum Thomsom", ("Ayrshire", "Connections")),
            ("Calum Thompson", ("Ayrshire", "Connections")),
            ("Jonathan Douglas", ("Ayrshire", "11 kV")),
            ("Jonathon Douglas", ("Ayrshire", "11 kV")),
            ("Lee Fraser", ("Ayrshire", "Connections")),
            ("Lee Frazer", ("Ayrshire", "Connections")),
            ("Mark Nicholls", ("Ayrshire", "Connections")),
            ("Cameron Fleming", ("Lanark", "Connections")),
            ("Ronnie Goodwin", ("Lanark", "Connections")),
            ("Ian Young", ("Ayrshire", "Connections")),
            ("Matthew Watson", ("Lanark", "Connections")),
            ("Mark McGoldrick", ("Lanark", "Connections")),
        ])
    });

/// Source-file keyword -> (shire, project), used to backfill rows whose key
/// columns are blank. Keys are matched case-insensitively as substrings of
/// the source file name; listed longest-first so the most specific wins.
pub const FILE_PROJECTS: &[(&str, (&str, &str))] = &[
    ("33kv rebuilt", ("Lanark", "33kV Rebuilt")),
    ("11kv rebuilt", ("Lanark", "11kV Rebuilt")),
    ("33kv refurb", ("Ayrshire", "33kv Refurb")),
    ("11kv refurb", ("Ayrshire", "11kv Refurb")),
    ("spen labour", ("Ayrshire", "SPEN Labour")),
    ("connections", ("Ayrshire", "Connections")),
    ("lv & esqcr", ("Lanark", "LV")),
    ("aurs road", ("Ayrshire", "Aurs Road")),
    ("pcb 2022", ("Ayrshire", "PCB")),
    ("storms", ("Ayrshire", "Storms")),
    ("lanark", ("Lanark", "")),
    ("lvhi5", ("Ayrshire", "LV")),
    ("pcb", ("Ayrshire", "PCB")),
];

/// Region -> electoral wards it covers. Small towns map to their own ward;
/// the two shire-level keys expand to every ward in the council area. Ward
/// names are carried exactly as the boundary data spells them.
pub const REGION_WARDS: &[(&str, &[&str])] = &[
    ("Newmilns", &["Irvine Valley"]),
    ("New Cumnock", &["New Cumnock"]),
    ("Kilwinning", &["Kilwinning"]),
    ("Stewarton", &["Irvine Valley"]),
    ("Kilbirnie", &["Kilbirnie and Beith"]),
    ("Coylton", &["Ayr East"]),
    ("Irvine", &["Irvine Valley", "Irvine East", "Irvine West"]),
    ("TROON", &["Troon"]),
    ("Ayr", &["Ayr East", "Ayr North", "Ayr West"]),
    ("Maybole", &["Maybole, North Carrick and Coylton"]),
    ("Clerkland", &["Irvine Valley"]),
    ("Glengarnock", &["Kilbirnie and Beith"]),
    (
        "Ayrshire",
        &[
            "North Coast and Cumbraes",
            "Prestwick",
            "Saltcoats and Stevenston",
            "Troon",
            "Ayr East",
            "Ayr North",
            "Ayr West",
            "Annick",
            "Ardrossan and Arran",
            "Dalry and West Kilbride",
            "Girvan and South Carrick",
            "Irvine East",
            "Irvine Valley",
            "Irvine West",
            "Kilbirnie and Beith",
            "Kilmarnock East and Hurlford",
            "Kilmarnock North",
            "Kilmarnock South",
            "Kilmarnock West and Crosshouse",
            "Kilwinning",
            "Kyle",
            "Maybole, North Carrick and Coylton",
            "Ayr, Carrick and Cumnock",
            "East_Ayrshire",
            "North_Ayrshre",
            "South_Ayrshre",
            "Doon Valley",
        ],
    ),
    (
        "Lanark",
        &[
            "Abronhill, Kildrum and the Village",
            "Airdrie Central",
            "Airdrie North",
            "Airdrie South",
            "Avondale and Stonehouse",
            "Ballochmyle",
            "Bellshill",
            "Blantyre",
            "Bothwell and Uddingston",
            "Cambuslang East",
            "Cambuslang West",
            "Clydesdale East",
            "Clydesdale North",
            "Clydesdale South",
            "Clydesdale West",
            "Coatbridge North and Glenboig",
            "Coatbridge South",
            "Coatbridge West",
            "Cumbernauld North",
            "Cumbernauld South",
            "East Kilbride Central North",
            "East Kilbride Central South",
            "East Kilbride East",
            "East Kilbride South",
            "East Kilbride West",
            "Fortissat",
            "Hamilton North and East",
            "Hamilton South",
            "Hamilton West and Earnock",
            "Mossend and Holytown",
            "Motherwell North",
            "Motherwell South East and Ravenscraig",
            "Motherwell West",
            "Rutherglen Central and North",
            "Rutherglen South",
            "Strathkelvin",
            "Thorniewood",
            "Wishaw",
            "Larkhall",
            "Airdrie and Shotts",
            "Cumbernauld, Kilsyth and Kirkintilloch East",
            "East Kilbride, Strathaven and Lesmahagow",
            "Lanark and Hamilton East",
            "Motherwell and Wishaw",
            "North_Lanarkshire",
            "South_Lanarkshire",
        ],
    ),
];

/// Map a catalogue item to its short label within one category. Membership
/// is a case-insensitive substring test; the first key that matches wins.
pub fn map_item(labels: &[(&str, &'static str)], item: &str) -> Option<&'static str> {
    if item.is_empty() {
        return None;
    }
    let item_lower = item.to_lowercase();
    labels
        .iter()
        .find(|(key, _)| item_lower.contains(&key.to_lowercase()))
        .map(|(_, label)| *label)
}

/// Expand region names to the distinct electoral wards they cover, sorted.
/// A region absent from the table passes through as its own ward name.
pub fn wards_for_regions<'a, I>(regions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut wards: BTreeSet<&str> = BTreeSet::new();
    for region in regions {
        if region.is_empty() {
            continue;
        }
        match REGION_WARDS.iter().find(|(key, _)| *key == region) {
            Some((_, covered)) => wards.extend(covered.iter().copied()),
            None => {
                wards.insert(region);
            }
        }
    }
    wards.into_iter().map(|w| w.to_string()).collect()
}

/// Backfill (shire, project) from the source file name.
pub fn project_for_file(source_file: &str) -> Option<(&'static str, &'static str)> {
    if source_file.is_empty() {
        return None;
    }
    let lower = source_file.to_lowercase();
    FILE_PROJECTS
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, v)| *v)
}
