//! Runs nmap and parses its XML report.
use std::process::Stdio;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use tokio::process::Command;

use crate::error::{Error, Result};

/// One `<port>` element. Missing attributes stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NmapPort {
    /// `portid`
    pub port: Option<String>,
    /// `tcp` or `udp`
    pub protocol: Option<String>,
    /// `open`, `closed`, `filtered`...
    pub state: Option<String>,
    /// Service name guessed by nmap.
    pub service: Option<String>,
}

/// One scanned host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NmapHost {
    /// First `<address>` of the host.
    pub addr: Option<String>,
    /// Every reported port.
    pub ports: Vec<NmapPort>,
}

/// Scans `target` with `nmap <extra_args> -p <ports> -oX - <target>`.
pub async fn run_nmap(target: &str, ports: &str, extra_args: &[String]) -> Result<Vec<NmapHost>> {
    let mut command = Command::new("nmap");
    command
        .args(extra_args)
        .args(["-p", ports, "-oX", "-", target])
        .stdin(Stdio::null())
        .stderr(Stdio::piped());
    debug!("running {:?}", command);

    let output = command
        .output()
        .await
        .map_err(|e| Error::Nmap(format!("could not start nmap: {}", e)))?;

    if !output.status.success() {
        return Err(Error::Nmap(format!(
            "{}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_nmap_xml(&String::from_utf8_lossy(&output.stdout))
}

fn attr(element: &BytesStart<'_>, key: &str) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key.as_bytes())
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// Hosts in an nmap `-oX` report: first address and every port of each.
pub fn parse_nmap_xml(xml: &str) -> Result<Vec<NmapHost>> {
    let mut reader = Reader::from_str(xml);
    let mut hosts = Vec::new();
    let mut host: Option<NmapHost> = None;
    let mut port: Option<NmapPort> = None;

    loop {
        let event = reader.read_event()?;
        let self_closing = matches!(event, Event::Empty(_));

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                b"host" => {
                    host = Some(NmapHost::default());
                    if self_closing {
                        hosts.extend(host.take());
                    }
                }
                b"address" => {
                    if let Some(h) = host.as_mut() {
                        if h.addr.is_none() {
                            h.addr = attr(e, "addr");
                        }
                    }
                }
                b"port" => {
                    let p = NmapPort {
                        port: attr(e, "portid"),
                        protocol: attr(e, "protocol"),
                        ..Default::default()
                    };
                    if self_closing {
                        if let Some(h) = host.as_mut() {
                            h.ports.push(p);
                        }
                    } else {
                        port = Some(p);
                    }
                }
                b"state" => {
                    if let Some(p) = port.as_mut() {
                        p.state = attr(e, "state");
                    }
                }
                b"service" => {
                    if let Some(p) = port.as_mut() {
                        p.service = attr(e, "name");
                    }
                }
                _ => {}
            },
            Event::End(ref e) => match e.name().as_ref() {
                b"port" => {
                    if let (Some(h), Some(p)) = (host.as_mut(), port.take()) {
                        h.ports.push(p);
                    }
                }
                b"host" => hosts.extend(host.take()),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<nmaprun scanner="nmap" args="nmap -sV -p 1-1000 -oX - scanme.example" version="7.94">
<host starttime="1" endtime="2"><status state="up" reason="echo-reply"/>
<address addr="45.33.32.156" addrtype="ipv4"/>
<address addr="00:11:22:33:44:55" addrtype="mac"/>
<hostnames><hostname name="scanme.example" type="user"/></hostnames>
<ports><extraports state="closed" count="996"/>
<port protocol="tcp" portid="22"><state state="open" reason="syn-ack"/><service name="ssh" product="OpenSSH"/></port>
<port protocol="tcp" portid="80"><state state="open" reason="syn-ack"/><service name="http"/></port>
<port protocol="tcp" portid="9929"><state state="filtered" reason="no-response"/></port>
</ports>
</host>
<host><status state="up"/><address addr="10.0.0.7" addrtype="ipv4"/><ports></ports></host>
<runstats><finished time="3"/></runstats>
</nmaprun>
"#;

    #[test]
    fn parses_hosts_and_ports() {
        let hosts = parse_nmap_xml(REPORT).unwrap();
        assert_eq!(hosts.len(), 2);

        let first = &hosts[0];
        assert_eq!(first.addr.as_deref(), Some("45.33.32.156"));
        assert_eq!(first.ports.len(), 3);
        assert_eq!(
            first.ports[0],
            NmapPort {
                port: Some("22".into()),
                protocol: Some("tcp".into()),
                state: Some("open".into()),
                service: Some("ssh".into()),
            }
        );
        assert_eq!(first.ports[2].state.as_deref(), Some("filtered"));
        assert_eq!(first.ports[2].service, None);

        assert_eq!(hosts[1].addr.as_deref(), Some("10.0.0.7"));
        assert!(hosts[1].ports.is_empty());
    }

    #[test]
    fn empty_report_has_no_hosts() {
        let hosts = parse_nmap_xml("<nmaprun></nmaprun>").unwrap();
        assert!(hosts.is_empty());
    }

    #[test]
    fn truncated_report_is_an_error() {
        assert!(parse_nmap_xml("<nmaprun><host><port portid=\"1\"></host>").is_err());
    }
}
