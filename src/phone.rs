use std::fmt;
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use serde_json::Value;

static STRIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s\(\)\-]").unwrap());
static NON_DIGIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D").unwrap());
static BARE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{10}$").unwrap());
static PREFIXED_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"^\+7\d{10}$").unwrap(),
        Regex::new(r"^8\d{10}$").unwrap(),
        Regex::new(r"^7\d{10}$").unwrap(),
    ]
});

const MIN_TRIMMED_LEN: usize = 10;
const MIN_DIGITS: usize = 7;

/// A raw phone-shaped string harvested from markup, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhoneCandidate(String);

/// A candidate that passed [`is_valid_phone`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValidatedPhone(String);

impl PhoneCandidate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Consumes the candidate; a rejected one is handed back unchanged.
    pub fn classify(self) -> Result<ValidatedPhone, PhoneCandidate> {
        if is_valid_phone(&self.0) {
            Ok(ValidatedPhone(self.0))
        } else {
            Err(self)
        }
    }
}

impl ValidatedPhone {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ValidatedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Domestic numbers only: `+7`/`8`/`7` followed by ten digits, or a bare
/// ten-digit number. Spaces, parentheses and hyphens are ignored for the
/// match, but the trimmed original must still be at least ten characters.
pub fn is_valid_phone(phone: &str) -> bool {
    if phone.is_empty() {
        return false;
    }

    let compact = STRIP_RE.replace_all(phone, "");
    let long_enough = phone.trim().chars().count() >= MIN_TRIMMED_LEN;

    if PREFIXED_RES.iter().any(|re| re.is_match(&compact)) && long_enough {
        return true;
    }
    if BARE_RE.is_match(&compact) && long_enough {
        return true;
    }

    // Short numeric fragments are never phones, whatever the formatting.
    if NON_DIGIT_RE.replace_all(phone, "").chars().count() < MIN_DIGITS {
        return false;
    }
    false
}

/// JSON-level entry point: anything that is not a string is rejected.
pub fn is_valid_phone_value(value: &Value) -> bool {
    value.as_str().is_some_and(is_valid_phone)
}

/// What the cleanup pass removed from one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordCleanup {
    pub company: String,
    pub removed: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupSummary {
    pub processed_companies: usize,
    pub removed_numbers: usize,
    /// One entry per processed record, in collection order.
    pub records: Vec<RecordCleanup>,
}

/// Drops every entry of each record's `phones` array that fails the
/// classifier, keeping the survivors in their original order. Records without
/// a `phones` array are left alone and not counted.
pub fn clean_records(records: &mut [Value]) -> CleanupSummary {
    let records: Vec<RecordCleanup> = records.par_iter_mut().filter_map(clean_record).collect();
    CleanupSummary {
        processed_companies: records.len(),
        removed_numbers: records.iter().map(|r| r.removed.len()).sum(),
        records,
    }
}

fn clean_record(record: &mut Value) -> Option<RecordCleanup> {
    let company = record
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();
    let phones = record.get_mut("phones")?.as_array_mut()?;

    let (kept, removed): (Vec<Value>, Vec<Value>) =
        phones.drain(..).partition(is_valid_phone_value);
    *phones = kept;

    Some(RecordCleanup { company, removed })
}
