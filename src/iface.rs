use std::net::{IpAddr, Ipv4Addr};

use pnet::datalink::{self, NetworkInterface};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum IfaceError {
    #[error("no interface named '{0}'")]
    NotFound(String),
    #[error("interface '{0}' has no IPv4 network")]
    NoIpv4(String),
}

/// Subnet broadcast address of the first IPv4 network on `name`.
pub fn interface_broadcast(name: &str) -> Result<Ipv4Addr, IfaceError> {
    broadcast_for(&datalink::interfaces(), name)
}

fn broadcast_for(interfaces: &[NetworkInterface], name: &str) -> Result<Ipv4Addr, IfaceError> {
    let iface = interfaces
        .iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| IfaceError::NotFound(name.to_string()))?;

    if iface.is_loopback() || !iface.is_up() {
        log::warn!("interface '{}' is down or loopback", iface.name);
    }

    let addr = iface
        .ips
        .iter()
        .find_map(|net| match (net.ip(), net.mask()) {
            (IpAddr::V4(ip), IpAddr::V4(mask)) => Some(Ipv4Addr::from(u32::from(ip) | !u32::from(mask))),
            _ => None,
        })
        .ok_or_else(|| IfaceError::NoIpv4(name.to_string()))?;

    log::debug!("using broadcast {} of interface '{}'", addr, iface.name);
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(name: &str, nets: &[&str]) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            description: String::new(),
            index: 1,
            mac: None,
            ips: nets.iter().map(|n| n.parse().unwrap()).collect(),
            flags: 0,
        }
    }

    #[test]
    fn subnet_broadcast() {
        let ifaces = vec![
            iface("lo", &["127.0.0.1/8"]),
            iface("eth0", &["fe80::1/64", "192.168.1.10/24"]),
        ];
        assert_eq!(broadcast_for(&ifaces, "eth0"), Ok(Ipv4Addr::new(192, 168, 1, 255)));
    }

    #[test]
    fn unknown_interface() {
        let ifaces = vec![iface("eth0", &["10.0.0.2/16"])];
        assert_eq!(broadcast_for(&ifaces, "wlan0"), Err(IfaceError::NotFound("wlan0".into())));
    }

    #[test]
    fn ipv6_only_interface() {
        let ifaces = vec![iface("eth1", &["fd00::2/64"])];
        assert_eq!(broadcast_for(&ifaces, "eth1"), Err(IfaceError::NoIpv4("eth1".into())));
    }
}
