use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::EligibleHost;

/// Ansible dynamic-inventory document: per-host variables under `_meta`, a
/// flat `ungrouped` bucket holding every discovered host, and a top-level
/// `all` group declaring that bucket as its only child.
///
/// Built fresh on every invocation; never cached or persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    #[serde(rename = "_meta")]
    pub meta: Meta,
    pub all: ParentGroup,
    pub ungrouped: HostGroup,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub hostvars: BTreeMap<String, HostVars>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HostVars {
    pub ip: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ParentGroup {
    pub children: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HostGroup {
    pub hosts: Vec<String>,
}

/// Fold parser output into the inventory document.
///
/// The parser emits one record per host block and the same hostname can
/// legitimately appear more than once (multiple PTR records resolving to
/// different addresses). Duplicates fold into a single host entry whose `ip`
/// list accumulates each distinct address in first-seen order. Group
/// membership preserves first-seen order; a host with no address keeps an
/// empty `ip` list.
pub fn build_inventory(hosts: &[EligibleHost]) -> Inventory {
    let mut hostvars: BTreeMap<String, HostVars> = BTreeMap::new();
    let mut members: Vec<String> = Vec::new();

    for host in hosts {
        let vars = hostvars.entry(host.name.clone()).or_insert_with(|| {
            members.push(host.name.clone());
            HostVars { ip: Vec::new() }
        });
        if let Some(addr) = &host.addr {
            if !vars.ip.iter().any(|known| known == addr) {
                vars.ip.push(addr.clone());
            }
        }
    }

    Inventory {
        meta: Meta { hostvars },
        all: ParentGroup {
            children: vec!["ungrouped".to_string()],
        },
        ungrouped: HostGroup { hosts: members },
    }
}

/// Variable set returned by a per-host lookup. Always empty: every variable
/// is delivered through `_meta` in the full inventory document, so consumers
/// never need a per-host query.
pub fn empty_host_vars() -> serde_json::Value {
    serde_json::json!({})
}
