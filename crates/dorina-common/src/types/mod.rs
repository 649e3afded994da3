//! Common types used across doRiNA
//!
//! [`ResultRow`] is the single internal representation of an analysis hit.
//! The analysis engine may also emit tab-delimited lines (a GFF record
//! joined with the overlapping regulator BED record); those are adapted with
//! [`ResultRow::from_tab_line`] and never stored in their raw form.

use serde::{Deserialize, Serialize};

use crate::error::{DorinaError, Result};

/// Score carried by both sentinel rows.
pub const SENTINEL_SCORE: f64 = -1.0;

/// Prefix of the `data_source` field of a failed-job row.
pub const JOB_FAILED_PREFIX: &str = "Job failed";

/// Minimum number of columns in a line-oriented engine record.
const MIN_LINE_COLUMNS: usize = 14;

/// Column layout of the line-oriented engine output.
const COL_ANNOTATIONS: usize = 8;
const COL_REGULATOR_CHROM: usize = 9;
const COL_REGULATOR_START: usize = 10;
const COL_REGULATOR_END: usize = 11;
const COL_REGULATOR_NAME: usize = 12;
const COL_REGULATOR_SCORE: usize = 13;
const COL_REGULATOR_STRAND: usize = 14;
const COL_GENE_STRAND: usize = 6;

/// One analysis hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub data_source: String,
    pub score: f64,
    pub track: String,
    pub gene: String,
    pub site: String,
    pub strand: String,
    pub location: String,
}

impl ResultRow {
    /// Placeholder stored instead of an empty result list
    pub fn no_results() -> Self {
        Self {
            data_source: String::new(),
            score: SENTINEL_SCORE,
            track: String::new(),
            gene: String::new(),
            site: String::new(),
            strand: String::new(),
            location: String::new(),
        }
    }

    /// Placeholder stored when the analysis engine failed.
    ///
    /// Line breaks and tabs are flattened so the message survives any
    /// line-oriented export of the result list.
    pub fn job_failed(message: &str) -> Self {
        let message = message.replace(['\n', '\t'], " ");
        Self {
            data_source: format!("{}: {}", JOB_FAILED_PREFIX, message),
            ..Self::no_results()
        }
    }

    pub fn is_no_results(&self) -> bool {
        *self == Self::no_results()
    }

    pub fn is_job_failure(&self) -> bool {
        self.score == SENTINEL_SCORE && self.data_source.starts_with(JOB_FAILED_PREFIX)
    }

    /// Parse one line of the engine's tab-delimited output.
    ///
    /// The gene comes from the `ID=` entry of the `;`-separated annotation
    /// column, the score from the regulator score column (`-1` when it does
    /// not parse), and the regulator name is expected as
    /// `data_source#track*site`.
    pub fn from_tab_line(line: &str) -> Result<Self> {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < MIN_LINE_COLUMNS {
            return Err(DorinaError::MalformedLine(format!(
                "expected at least {} columns, got {}",
                MIN_LINE_COLUMNS,
                cols.len()
            )));
        }

        let gene = gene_from_annotations(cols[COL_ANNOTATIONS])
            .unwrap_or_default()
            .to_string();
        let score = cols
            .get(COL_REGULATOR_SCORE)
            .and_then(|s| s.trim().parse::<f64>().ok())
            // JSON has no NaN or infinity, so the row could not be stored
            .filter(|score| score.is_finite())
            .unwrap_or(SENTINEL_SCORE);
        let strand = cols
            .get(COL_REGULATOR_STRAND)
            .copied()
            .unwrap_or(cols[COL_GENE_STRAND])
            .to_string();

        let name = cols[COL_REGULATOR_NAME];
        let (data_source, rest) = name.split_once('#').unwrap_or((name, ""));
        let (track, site) = rest.split_once('*').unwrap_or((rest, ""));

        Ok(Self {
            data_source: data_source.to_string(),
            score,
            track: track.to_string(),
            gene,
            site: site.to_string(),
            strand,
            location: format!(
                "{}:{}-{}",
                cols[COL_REGULATOR_CHROM], cols[COL_REGULATOR_START], cols[COL_REGULATOR_END]
            ),
        })
    }

    /// Render as a six-column BED line
    pub fn to_bed_line(&self) -> Result<String> {
        let (chrom, coords) = self
            .location
            .split_once(':')
            .ok_or_else(|| DorinaError::MalformedLine(self.location.clone()))?;
        let (start, end) = coords
            .split_once('-')
            .ok_or_else(|| DorinaError::MalformedLine(self.location.clone()))?;

        Ok(format!(
            "{}\t{}\t{}\t{}#{}*{}\t{}\t{}",
            chrom, start, end, self.data_source, self.track, self.site, self.score, self.strand
        ))
    }
}

/// Extract the gene identifier from a GFF annotation column
pub fn gene_from_annotations(annotations: &str) -> Option<&str> {
    annotations
        .split(';')
        .filter_map(|field| field.split_once('='))
        .find(|(key, _)| key.trim() == "ID")
        .map(|(_, value)| value.trim())
}

/// Stable sort by descending score; equal scores keep insertion order.
pub fn sort_by_score_desc(rows: &mut [ResultRow]) {
    rows.sort_by(|a, b| b.score.total_cmp(&a.score));
}
