//! Search queries and their canonical cache keys
//!
//! A submitted search form becomes a typed [`Query`]. Two submissions that
//! mean the same search must land on the same cache entry, so the key is
//! derived from a canonical serialization: fields sorted by name, compact
//! JSON, unset optional windows omitted and an empty second regulator set
//! written as `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, str::FromStr};
use thiserror::Error;

use crate::store::keys;

/// Gene list entry meaning "no gene filter"
pub const ALL_GENES: &str = "all";

/// Reasons a search form is rejected
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Assembly is required")]
    MissingAssembly,

    #[error("At least one regulator must be selected in set_a")]
    EmptySetA,

    #[error("Invalid match mode '{0}' (expected any or all)")]
    InvalidMatch(String),

    #[error("Invalid combinatorial operation '{0}' (expected or, and, xor or not)")]
    InvalidCombine(String),

    #[error("Invalid window '{0}' (expected an integer)")]
    InvalidWindow(String),
}

/// Whether a gene must carry any or all regulators of a set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Any,
    All,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::All => "all",
        }
    }
}

impl FromStr for MatchMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Self::Any),
            "all" => Ok(Self::All),
            other => Err(QueryError::InvalidMatch(other.to_string())),
        }
    }
}

/// How the hits of set A and set B are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    #[default]
    Or,
    And,
    Xor,
    Not,
}

impl Combine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Xor => "xor",
            Self::Not => "not",
        }
    }
}

impl FromStr for Combine {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "or" => Ok(Self::Or),
            "and" => Ok(Self::And),
            "xor" => Ok(Self::Xor),
            "not" => Ok(Self::Not),
            other => Err(QueryError::InvalidCombine(other.to_string())),
        }
    }
}

/// Restriction of a search to a set of genes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum GeneSelection {
    All,
    Only(Vec<String>),
}

impl GeneSelection {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::All => vec![ALL_GENES.to_string()],
            Self::Only(genes) => genes.clone(),
        }
    }
}

impl From<Vec<String>> for GeneSelection {
    fn from(genes: Vec<String>) -> Self {
        if genes.is_empty() || genes.first().is_some_and(|g| g == ALL_GENES) {
            Self::All
        } else {
            Self::Only(genes)
        }
    }
}

impl From<GeneSelection> for Vec<String> {
    fn from(selection: GeneSelection) -> Self {
        selection.to_vec()
    }
}

/// Fields of the search form, before validation
///
/// List fields arrive as repeated keys, with or without the `[]` suffix.
#[derive(Debug, Clone, Default)]
pub struct SearchForm {
    pub assembly: Option<String>,
    pub genes: Vec<String>,
    pub match_a: Option<String>,
    pub region_a: Option<String>,
    pub set_a: Vec<String>,
    pub match_b: Option<String>,
    pub region_b: Option<String>,
    pub set_b: Vec<String>,
    pub combinatorial_op: Option<String>,
    pub window_a: Option<String>,
    pub window_b: Option<String>,
    pub tissue: Option<String>,
    pub uuid: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl SearchForm {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut form = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            let key = key.as_ref();
            let name = key.strip_suffix("[]").unwrap_or(key);
            match name {
                "assembly" => form.assembly = non_empty(value),
                "genes" => form.genes.extend(non_empty(value)),
                "match_a" => form.match_a = non_empty(value),
                "region_a" => form.region_a = non_empty(value),
                "set_a" => form.set_a.extend(non_empty(value)),
                "match_b" => form.match_b = non_empty(value),
                "region_b" => form.region_b = non_empty(value),
                "set_b" => form.set_b.extend(non_empty(value)),
                "combinatorial_op" => form.combinatorial_op = non_empty(value),
                "window_a" => form.window_a = non_empty(value),
                "window_b" => form.window_b = non_empty(value),
                "tissue" => form.tissue = non_empty(value),
                "uuid" => form.uuid = non_empty(value),
                _ => {},
            }
        }
        form
    }

    /// Parse an `application/x-www-form-urlencoded` body
    pub fn from_urlencoded(body: &[u8]) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(body))
    }
}

/// A validated search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub genome: String,
    pub genes: GeneSelection,
    pub match_a: MatchMode,
    pub region_a: String,
    pub set_a: Vec<String>,
    pub match_b: MatchMode,
    pub region_b: String,
    pub set_b: Option<Vec<String>>,
    pub combine: Combine,
    pub window_a: Option<i64>,
    pub window_b: Option<i64>,
    pub tissue: Option<String>,
}

fn parse_window(raw: Option<&str>) -> Result<Option<i64>, QueryError> {
    match raw {
        None => Ok(None),
        Some(raw) => {
            let window: i64 = raw
                .parse()
                .map_err(|_| QueryError::InvalidWindow(raw.to_string()))?;
            // Negative windows mean "unset"
            Ok((window >= 0).then_some(window))
        },
    }
}

impl Query {
    /// Build a query from form fields, applying defaults
    pub fn from_form(form: &SearchForm) -> Result<Self, QueryError> {
        let genome = form.assembly.clone().ok_or(QueryError::MissingAssembly)?;
        if form.set_a.is_empty() {
            return Err(QueryError::EmptySetA);
        }

        let mode = |raw: &Option<String>| -> Result<MatchMode, QueryError> {
            raw.as_deref().map(str::parse).transpose().map(Option::unwrap_or_default)
        };

        Ok(Self {
            genome,
            genes: GeneSelection::from(form.genes.clone()),
            match_a: mode(&form.match_a)?,
            region_a: form.region_a.clone().unwrap_or_else(|| "any".to_string()),
            set_a: form.set_a.clone(),
            match_b: mode(&form.match_b)?,
            region_b: form.region_b.clone().unwrap_or_else(|| "any".to_string()),
            set_b: (!form.set_b.is_empty()).then(|| form.set_b.clone()),
            combine: form
                .combinatorial_op
                .as_deref()
                .map(str::parse)
                .transpose()?
                .unwrap_or_default(),
            window_a: parse_window(form.window_a.as_deref())?,
            window_b: parse_window(form.window_b.as_deref())?,
            tissue: form.tissue.clone(),
        })
    }

    /// The same search without a gene filter
    pub fn unfiltered(&self) -> Self {
        Self {
            genes: GeneSelection::All,
            ..self.clone()
        }
    }

    /// Replace a session id inside either regulator set with the path of
    /// that session's uploaded regulator file
    pub fn with_custom_regulator(&self, session_id: &str, path: &str) -> Self {
        let resolve = |set: &[String]| -> Vec<String> {
            set.iter()
                .map(|r| if r == session_id { path.to_string() } else { r.clone() })
                .collect()
        };
        Self {
            set_a: resolve(&self.set_a),
            set_b: self.set_b.as_deref().map(resolve),
            ..self.clone()
        }
    }

    /// Sorted-key, compact JSON rendering used for cache keys
    pub fn canonical_json(&self) -> String {
        let strings = |items: &[String]| Value::from(items.to_vec());

        let mut fields: BTreeMap<&str, Value> = BTreeMap::new();
        fields.insert("combine", Value::from(self.combine.as_str()));
        fields.insert("genes", strings(&self.genes.to_vec()));
        fields.insert("genome", Value::from(self.genome.as_str()));
        fields.insert("match_a", Value::from(self.match_a.as_str()));
        fields.insert("match_b", Value::from(self.match_b.as_str()));
        fields.insert("region_a", Value::from(self.region_a.as_str()));
        fields.insert("region_b", Value::from(self.region_b.as_str()));
        fields.insert("set_a", strings(&self.set_a));
        fields.insert(
            "set_b",
            self.set_b.as_deref().map(strings).unwrap_or(Value::Null),
        );
        fields.insert(
            "tissue",
            self.tissue.as_deref().map(Value::from).unwrap_or(Value::Null),
        );
        if let Some(window) = self.window_a {
            fields.insert("window_a", Value::from(window));
        }
        if let Some(window) = self.window_b {
            fields.insert("window_b", Value::from(window));
        }

        let body: Vec<String> = fields
            .iter()
            .map(|(name, value)| format!("{}:{}", Value::from(*name), value))
            .collect();
        format!("{{{}}}", body.join(","))
    }
}

/// A query together with the store keys derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalQuery {
    pub query: Query,
    pub cache_key: String,
    pub pending_key: String,
}

impl CanonicalQuery {
    pub fn new(query: Query) -> Self {
        let cache_key = format!("{}{}", keys::RESULTS_PREFIX, query.canonical_json());
        let pending_key = keys::pending(&cache_key);
        Self {
            query,
            cache_key,
            pending_key,
        }
    }

    /// Keys of the same search without a gene filter
    pub fn full(&self) -> Self {
        Self::new(self.query.unfiltered())
    }
}

impl fmt::Display for CanonicalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key)
    }
}

/// Validate a form and derive its cache keys
pub fn canonicalize(form: &SearchForm) -> Result<CanonicalQuery, QueryError> {
    Query::from_form(form).map(CanonicalQuery::new)
}
