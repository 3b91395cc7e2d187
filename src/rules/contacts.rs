use serde::{Deserialize, Serialize};

/// Region-resolved emergency numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContacts {
    pub emergency: String,
    pub crisis: Option<String>,
    pub poison: Option<String>,
}

struct RegionEntry {
    codes: &'static [&'static str],
    emergency: &'static str,
    crisis: Option<&'static str>,
    poison: Option<&'static str>,
}

/// Region used when the caller's code is unknown.
pub const FALLBACK_REGION: &str = "US";

static DIRECTORY: &[RegionEntry] = &[
    RegionEntry {
        codes: &["US"],
        emergency: "911",
        crisis: Some("988"),
        poison: Some("1-800-222-1222"),
    },
    RegionEntry {
        codes: &["CA"],
        emergency: "911",
        crisis: Some("988"),
        poison: Some("1-844-764-7669"),
    },
    RegionEntry {
        codes: &["UK", "GB"],
        emergency: "999",
        crisis: Some("116 123"),
        poison: Some("111"),
    },
    RegionEntry {
        codes: &["IE"],
        emergency: "112",
        crisis: Some("116 123"),
        poison: Some("01 809 2166"),
    },
    RegionEntry {
        codes: &["AU"],
        emergency: "000",
        crisis: Some("13 11 14"),
        poison: Some("13 11 26"),
    },
    RegionEntry {
        codes: &["NZ"],
        emergency: "111",
        crisis: Some("1737"),
        poison: Some("0800 764 766"),
    },
    RegionEntry {
        codes: &["DE"],
        emergency: "112",
        crisis: Some("0800 111 0 111"),
        poison: None,
    },
    RegionEntry {
        codes: &["FR"],
        emergency: "112",
        crisis: Some("3114"),
        poison: None,
    },
    RegionEntry {
        codes: &["IN"],
        emergency: "112",
        crisis: Some("14416"),
        poison: None,
    },
];

impl RegionEntry {
    fn contacts(&self) -> EmergencyContacts {
        EmergencyContacts {
            emergency: self.emergency.to_string(),
            crisis: self.crisis.map(str::to_string),
            poison: self.poison.map(str::to_string),
        }
    }
}

/// Resolve contacts for a region code (case-insensitive). Unknown codes
/// fall back to the US entry.
pub fn resolve_contacts(region: &str) -> EmergencyContacts {
    let code = region.trim().to_ascii_uppercase();
    DIRECTORY
        .iter()
        .find(|e| e.codes.contains(&code.as_str()))
        .or_else(|| DIRECTORY.iter().find(|e| e.codes.contains(&FALLBACK_REGION)))
        .map(RegionEntry::contacts)
        .unwrap_or_else(|| EmergencyContacts {
            emergency: "911".into(),
            crisis: Some("988".into()),
            poison: None,
        })
}

/// Whether the directory knows this region code.
pub fn is_known_region(region: &str) -> bool {
    let code = region.trim().to_ascii_uppercase();
    DIRECTORY.iter().any(|e| e.codes.contains(&code.as_str()))
}
