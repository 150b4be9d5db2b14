//! Local solar time extraction and label indexing.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use survey_common::LocalSolarTime;
use walkdir::WalkDir;

use crate::{LabelResult, Pds4Label};

const LST_TAGS: &[&str] = &[
    "local_true_solar_time",
    "start_local_true_solar_time",
    "stop_local_true_solar_time",
    "local_solar_time",
];

static CLOCK_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}:\d{2}:\d{2}(?:\.\d+)?)\b").expect("valid clock regex"));

static CLOCK_EXACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,2}):(\d{2}):(\d{2}(?:\.\d+)?)\s*$").expect("valid clock regex")
});

/// Zero-pad the hour of an `H:MM:SS[.fff]` string. Text that is not a
/// clock time is returned trimmed but otherwise untouched.
pub fn normalize_lst(text: &str) -> String {
    match CLOCK_EXACT.captures(text) {
        Some(caps) => {
            let hour: u32 = caps[1].parse().unwrap_or(0);
            format!("{:02}:{}:{}", hour, &caps[2], &caps[3])
        }
        None => text.trim().to_string(),
    }
}

/// Find the local solar time in a PDS4 label.
///
/// Known LST elements are tried first. If the XML does not parse or none
/// of them is present, the first clock-like token anywhere in the text is
/// used.
pub fn extract_lst(label_text: &str) -> Option<String> {
    let from_tags = Pds4Label::parse(label_text)
        .ok()
        .and_then(|label| label.first_text(LST_TAGS).map(str::to_string));

    let raw = from_tags.or_else(|| {
        CLOCK_ANYWHERE
            .captures(label_text)
            .map(|caps| caps[1].to_string())
    })?;

    Some(normalize_lst(&raw))
}

/// One row of the LST index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LstIndexEntry {
    /// File stem of the label
    pub file_id: String,
    /// Normalized LST string, if one was found
    #[serde(rename = "LST")]
    pub lst: Option<String>,
    pub file_path: PathBuf,
}

impl LstIndexEntry {
    /// Parsed clock time, if the LST string is a valid time.
    pub fn lst_time(&self) -> Option<LocalSolarTime> {
        self.lst
            .as_deref()
            .and_then(|s| LocalSolarTime::parse(s).ok())
    }
}

/// Index every `*.xml` label directly inside `dir` by local solar time.
///
/// Entries are sorted by LST then file id; labels without an LST come last.
/// Unreadable files are logged and indexed with no LST.
pub fn build_lst_index(dir: impl AsRef<Path>) -> LabelResult<Vec<LstIndexEntry>> {
    let dir = dir.as_ref();
    let mut entries = Vec::new();

    for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        let is_xml = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("xml"));
        if !entry.file_type().is_file() || !is_xml {
            continue;
        }

        let file_id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let lst = match std::fs::read(path) {
            Ok(bytes) => extract_lst(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                tracing::warn!(label = %path.display(), error = %e, "Cannot read label");
                None
            }
        };

        entries.push(LstIndexEntry {
            file_id,
            lst,
            file_path: path.to_path_buf(),
        });
    }

    entries.sort_by(|a, b| match (&a.lst, &b.lst) {
        (Some(x), Some(y)) => x.cmp(y).then_with(|| a.file_id.cmp(&b.file_id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.file_id.cmp(&b.file_id),
    });

    tracing::info!(
        dir = %dir.display(),
        labels = entries.len(),
        with_lst = entries.iter().filter(|e| e.lst.is_some()).count(),
        "Built LST index"
    );

    Ok(entries)
}
