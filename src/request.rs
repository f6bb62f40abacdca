//! Fetch request records handed to the datastore update tool.
//!
//! A request is a set of dataset sources plus optional year and state
//! filters. The tool owns the meaning of each token; this module only keeps
//! the tokens well-formed and renders them in the tool's flag grammar.
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Dataset identifiers understood by the update tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Source {
    /// FERC Form 1
    Ferc1,
    /// EIA Form 860
    Eia860,
    /// EIA Form 923
    Eia923,
    /// EPA continuous emissions monitoring
    Epacems,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::Ferc1,
        Source::Eia860,
        Source::Eia923,
        Source::Epacems,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Source::Ferc1 => "ferc1",
            Source::Eia860 => "eia860",
            Source::Eia923 => "eia923",
            Source::Epacems => "epacems",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let token = raw.trim();
        Source::ALL
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| {
                anyhow!(
                    "unknown source {token:?} (expected one of: {})",
                    Source::ALL.map(Source::as_str).join(", ")
                )
            })
    }
}

impl TryFrom<String> for Source {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Source> for String {
    fn from(value: Source) -> Self {
        value.as_str().to_string()
    }
}

// USPS abbreviations: 50 states, DC, and inhabited territories.
const US_STATE_CODES: [&str; 56] = [
    "AK", "AL", "AR", "AS", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "GU", "HI", "IA", "ID",
    "IL", "IN", "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MP", "MS", "MT", "NC", "ND",
    "NE", "NH", "NJ", "NM", "NV", "NY", "OH", "OK", "OR", "PA", "PR", "RI", "SC", "SD", "TN", "TX",
    "UT", "VA", "VI", "VT", "WA", "WI", "WV", "WY",
];

/// Two-letter jurisdiction code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateCode(String);

impl StateCode {
    /// Build a code from a table entry known at compile time.
    pub(crate) fn known(code: &'static str) -> Self {
        debug_assert!(US_STATE_CODES.contains(&code));
        StateCode(code.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for StateCode {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() != 2 || !code.chars().all(|ch| ch.is_ascii_uppercase()) {
            return Err(anyhow!("state code must be two letters (got {raw:?})"));
        }
        if !US_STATE_CODES.contains(&code.as_str()) {
            return Err(anyhow!("unknown state code {code:?}"));
        }
        Ok(StateCode(code))
    }
}

impl TryFrom<String> for StateCode {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<StateCode> for String {
    fn from(value: StateCode) -> Self {
        value.0
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One invocation's worth of datasets and filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<StateCode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub years: Vec<u16>,
}

impl FetchRequest {
    pub fn new(sources: impl IntoIterator<Item = Source>) -> Self {
        FetchRequest {
            sources: sources.into_iter().collect(),
            states: Vec::new(),
            years: Vec::new(),
        }
    }

    pub fn with_years(mut self, years: impl IntoIterator<Item = u16>) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    pub fn with_states(mut self, states: impl IntoIterator<Item = StateCode>) -> Self {
        self.states = states.into_iter().collect();
        self
    }

    /// Check the invariants the tool relies on.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(anyhow!("request must name at least one source"));
        }
        if let Some(dup) = first_duplicate(&self.sources) {
            return Err(anyhow!("duplicate source {dup}"));
        }
        if let Some(dup) = first_duplicate(&self.states) {
            return Err(anyhow!("duplicate state {dup}"));
        }
        if let Some(dup) = first_duplicate(&self.years) {
            return Err(anyhow!("duplicate year {dup}"));
        }
        if let Some(year) = self.years.iter().find(|year| !(1000u16..=9999).contains(*year)) {
            return Err(anyhow!("year must have four digits (got {year})"));
        }
        Ok(())
    }

    /// Render the tool arguments: sources, then states, then years.
    pub fn args(&self) -> Vec<String> {
        let capacity = 3 + self.sources.len() + self.states.len() + self.years.len();
        let mut args = Vec::with_capacity(capacity);
        args.push("--source".to_string());
        args.extend(self.sources.iter().map(|source| source.to_string()));
        if !self.states.is_empty() {
            args.push("--states".to_string());
            args.extend(self.states.iter().map(|state| state.to_string()));
        }
        if !self.years.is_empty() {
            args.push("--years".to_string());
            args.extend(self.years.iter().map(|year| year.to_string()));
        }
        args
    }
}

fn first_duplicate<T: Ord>(items: &[T]) -> Option<&T> {
    let mut seen = BTreeSet::new();
    items.iter().find(|item| !seen.insert(*item))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn co() -> StateCode {
        "CO".parse().expect("valid state")
    }

    #[test]
    fn renders_sources_then_states_then_years() {
        let request = FetchRequest::new([Source::Epacems])
            .with_states([co()])
            .with_years([2016]);
        assert_eq!(
            request.args(),
            ["--source", "epacems", "--states", "CO", "--years", "2016"]
        );
    }

    #[test]
    fn omits_empty_filters() {
        let request = FetchRequest::new([Source::Ferc1, Source::Eia860]);
        assert_eq!(request.args(), ["--source", "ferc1", "eia860"]);
    }

    #[test]
    fn source_tokens_parse_case_insensitively() {
        assert_eq!("EIA923".parse::<Source>().unwrap(), Source::Eia923);
        let err = "eia999".parse::<Source>().unwrap_err();
        assert!(err.to_string().contains("unknown source"));
    }

    #[test]
    fn state_codes_normalize_and_reject_unknown() {
        assert_eq!("co".parse::<StateCode>().unwrap().as_str(), "CO");
        assert!("ZZ".parse::<StateCode>().is_err());
        assert!("COL".parse::<StateCode>().is_err());
    }

    #[test]
    fn validate_rejects_malformed_requests() {
        assert!(FetchRequest::new(Vec::<Source>::new()).validate().is_err());
        assert!(FetchRequest::new([Source::Ferc1, Source::Ferc1])
            .validate()
            .is_err());
        assert!(FetchRequest::new([Source::Eia923])
            .with_years([16])
            .validate()
            .is_err());
        assert!(FetchRequest::new([Source::Eia923])
            .with_years([2016, 2016])
            .validate()
            .is_err());
        let err = FetchRequest::new([Source::Epacems])
            .with_states([co(), co()])
            .validate()
            .expect_err("duplicate state rejected");
        assert!(err.to_string().contains("duplicate state CO"));
        assert!(FetchRequest::new([Source::Eia923])
            .with_years([2016])
            .validate()
            .is_ok());
    }

    #[test]
    fn deserializes_lowercase_tokens() {
        let request: FetchRequest =
            serde_json::from_str(r#"{"sources":["epacems"],"states":["co"],"years":[2016]}"#)
                .expect("parse request");
        assert_eq!(request.states, vec![co()]);
        let unknown_state = r#"{"sources":["epacems"],"states":["XX"]}"#;
        assert!(serde_json::from_str::<FetchRequest>(unknown_state).is_err());
    }

    #[test]
    fn deserializes_source_tokens_in_any_case() {
        let request: FetchRequest =
            serde_json::from_str(r#"{"sources":["FERC1","Eia860"]}"#).expect("parse request");
        assert_eq!(request.sources, vec![Source::Ferc1, Source::Eia860]);
        assert_eq!(request.args(), ["--source", "ferc1", "eia860"]);

        let json = serde_json::to_string(&request).expect("serialize request");
        assert_eq!(json, r#"{"sources":["ferc1","eia860"]}"#);
        assert!(serde_json::from_str::<FetchRequest>(r#"{"sources":["ferc2"]}"#).is_err());
    }

    #[test]
    fn states_differing_only_in_case_are_duplicates() {
        let request: FetchRequest =
            serde_json::from_str(r#"{"sources":["epacems"],"states":["CO","co"]}"#)
                .expect("parse request");
        assert_eq!(request.states, vec![co(), co()]);
        assert!(request.validate().is_err());
    }
}
