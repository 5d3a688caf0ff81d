use serde::{Deserialize, Serialize};

/// One host that passed the eligibility filter: up, SSH port open, and with
/// at least one name resolved by the scanner.
///
/// `addr` is the first address record found in the report. A well-formed
/// report always carries one, but a missing address is tolerated rather than
/// failing the whole parse.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EligibleHost {
    pub name: String,
    pub addr: Option<String>,
}
