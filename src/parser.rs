use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::ScanError;
use crate::types::EligibleHost;

/// Port that must report "open" for a host to be eligible. Compared against
/// the report's `portid` attribute, which is a string in the document.
const SSH_PORT: &str = "22";

#[derive(Debug, Deserialize)]
struct NmapRun {
    #[serde(rename = "host", default)]
    hosts: Vec<Host>,
}

#[derive(Debug, Deserialize)]
struct Host {
    #[serde(default)]
    status: Vec<Status>,
    #[serde(rename = "address", default)]
    addresses: Vec<Address>,
    #[serde(default)]
    hostnames: Vec<Hostnames>,
    #[serde(default)]
    ports: Vec<Ports>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(rename = "@state")]
    state: String,
}

#[derive(Debug, Deserialize)]
struct Address {
    #[serde(rename = "@addr")]
    addr: String,
}

#[derive(Debug, Deserialize)]
struct Hostnames {
    #[serde(rename = "hostname", default)]
    names: Vec<Hostname>,
}

#[derive(Debug, Deserialize)]
struct Hostname {
    #[serde(rename = "@name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Ports {
    #[serde(rename = "port", default)]
    ports: Vec<Port>,
}

#[derive(Debug, Deserialize)]
struct Port {
    #[serde(rename = "@portid")]
    portid: String,
    #[serde(default)]
    state: Vec<PortState>,
}

#[derive(Debug, Deserialize)]
struct PortState {
    #[serde(rename = "@state")]
    state: String,
}

/// Extract the eligible hosts from one XML report.
///
/// A host is emitted only when all of the following hold:
/// - no status record declares state "down" (any down means down);
/// - at least one hostname was resolved (the first in document order wins);
/// - port 22 reports state "open" — "filtered"/"closed" or an absent port
///   entry both disqualify, since up is not the same as SSH-reachable.
///
/// The address is the first address record in document order, regardless of
/// address family; a host that somehow has none is emitted with `addr: None`
/// rather than failing the parse.
///
/// Pure function of the input text: never touches the network, and parsing
/// the same document twice yields identical, order-stable output. Records are
/// returned in document order with no de-duplication; folding duplicate names
/// is the inventory builder's job.
pub fn eligible_hosts(xml: &str) -> Result<Vec<EligibleHost>, ScanError> {
    let report: NmapRun = from_str(xml)?;

    let mut out = Vec::new();
    for host in report.hosts {
        if host.status.iter().any(|s| s.state == "down") {
            continue;
        }
        let Some(name) = host.hostnames.iter().flat_map(|h| h.names.iter()).next() else {
            continue;
        };
        let ssh_open = host
            .ports
            .iter()
            .flat_map(|p| p.ports.iter())
            .filter(|p| p.portid == SSH_PORT)
            .any(|p| p.state.iter().any(|s| s.state == "open"));
        if !ssh_open {
            continue;
        }
        let addr = host.addresses.first().map(|a| a.addr.clone());
        out.push(EligibleHost {
            name: name.name.clone(),
            addr,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_block(status: &str, name: Option<&str>, port22_state: Option<&str>, addr: &str) -> String {
        let hostnames = match name {
            Some(n) => format!(r#"<hostnames><hostname name="{n}" type="PTR"/></hostnames>"#),
            None => "<hostnames></hostnames>".to_string(),
        };
        let ports = match port22_state {
            Some(s) => format!(
                r#"<ports><port protocol="tcp" portid="22"><state state="{s}" reason="syn-ack"/><service name="ssh"/></port></ports>"#
            ),
            None => String::new(),
        };
        format!(
            r#"<host><status state="{status}" reason="echo-reply"/><address addr="{addr}" addrtype="ipv4"/>{hostnames}{ports}</host>"#
        )
    }

    fn report(hosts: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><nmaprun scanner="nmap">{}</nmaprun>"#,
            hosts.join("")
        )
    }

    #[test]
    fn up_named_open_host_is_emitted() {
        let xml = report(&[host_block("up", Some("dmaf5.home"), Some("open"), "192.168.1.26")]);
        let hosts = eligible_hosts(&xml).unwrap();
        assert_eq!(
            hosts,
            vec![EligibleHost {
                name: "dmaf5.home".to_string(),
                addr: Some("192.168.1.26".to_string()),
            }]
        );
    }

    #[test]
    fn down_host_is_skipped_regardless_of_ports() {
        let xml = report(&[host_block("down", Some("gone.home"), Some("open"), "192.168.1.9")]);
        assert!(eligible_hosts(&xml).unwrap().is_empty());
    }

    #[test]
    fn any_down_status_record_wins() {
        let xml = report(&[
            r#"<host><status state="up"/><status state="down"/><address addr="10.0.0.5"/><hostnames><hostname name="flappy.home"/></hostnames><ports><port portid="22"><state state="open"/></port></ports></host>"#.to_string(),
        ]);
        assert!(eligible_hosts(&xml).unwrap().is_empty());
    }

    #[test]
    fn filtered_port_is_not_open() {
        let xml = report(&[host_block("up", Some("fw.home"), Some("filtered"), "192.168.1.1")]);
        assert!(eligible_hosts(&xml).unwrap().is_empty());
    }

    #[test]
    fn absent_port_entry_is_skipped() {
        let xml = report(&[host_block("up", Some("quiet.home"), None, "192.168.1.7")]);
        assert!(eligible_hosts(&xml).unwrap().is_empty());
    }

    #[test]
    fn non_ssh_open_port_does_not_qualify() {
        let xml = report(&[
            r#"<host><status state="up"/><address addr="10.0.0.8"/><hostnames><hostname name="web.home"/></hostnames><ports><port portid="80"><state state="open"/></port><port portid="22"><state state="closed"/></port></ports></host>"#.to_string(),
        ]);
        assert!(eligible_hosts(&xml).unwrap().is_empty());
    }

    #[test]
    fn nameless_host_is_skipped() {
        let xml = report(&[host_block("up", None, Some("open"), "192.168.1.30")]);
        assert!(eligible_hosts(&xml).unwrap().is_empty());
    }

    #[test]
    fn first_hostname_in_document_order_wins() {
        let xml = report(&[
            r#"<host><status state="up"/><address addr="10.0.0.2"/><hostnames><hostname name="first.home"/><hostname name="second.home"/></hostnames><ports><port portid="22"><state state="open"/></port></ports></host>"#.to_string(),
        ]);
        let hosts = eligible_hosts(&xml).unwrap();
        assert_eq!(hosts[0].name, "first.home");
    }

    #[test]
    fn first_address_wins_when_both_families_present() {
        let xml = report(&[
            r#"<host><status state="up"/><address addr="192.168.1.26" addrtype="ipv4"/><address addr="fd22:4e39:e630:1::1" addrtype="ipv6"/><hostnames><hostname name="dual.home"/></hostnames><ports><port portid="22"><state state="open"/></port></ports></host>"#.to_string(),
        ]);
        let hosts = eligible_hosts(&xml).unwrap();
        assert_eq!(hosts[0].addr.as_deref(), Some("192.168.1.26"));
    }

    #[test]
    fn missing_address_is_tolerated() {
        let xml = report(&[
            r#"<host><status state="up"/><hostnames><hostname name="ghost.home"/></hostnames><ports><port portid="22"><state state="open"/></port></ports></host>"#.to_string(),
        ]);
        let hosts = eligible_hosts(&xml).unwrap();
        assert_eq!(hosts[0].addr, None);
    }

    #[test]
    fn parse_is_idempotent_and_order_stable() {
        let xml = report(&[
            host_block("up", Some("a.home"), Some("open"), "10.0.0.1"),
            host_block("up", Some("b.home"), Some("open"), "10.0.0.2"),
        ]);
        let first = eligible_hosts(&xml).unwrap();
        let second = eligible_hosts(&xml).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].name, "a.home");
        assert_eq!(first[1].name, "b.home");
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = eligible_hosts("<nmaprun><host>").unwrap_err();
        assert!(matches!(err, ScanError::Parse(_)));
    }

    #[test]
    fn empty_report_yields_no_hosts() {
        assert!(eligible_hosts("<nmaprun></nmaprun>").unwrap().is_empty());
    }
}
