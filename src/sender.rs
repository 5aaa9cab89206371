use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};

use crate::common::DEFAULT_PORT;
use crate::error::{TransmitStage, WolError};
use crate::mac::MacAddress;
use crate::packet::MagicPacket;

/// Port from user input; anything that is not a valid u16 falls back to 9.
pub fn parse_port(input: Option<&str>) -> u16 {
    input
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Broadcast or unicast host plus UDP port. Resolved only at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    host: String,
    port: u16,
}

impl Destination {
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Result<Self, WolError> {
        let host = host.into();
        if host.is_empty() {
            return Err(WolError::EmptyDestination);
        }

        Ok(Self { host, port: port.unwrap_or(DEFAULT_PORT) })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Blocking resolution. IPv4 results win over IPv6 ones.
    pub fn resolve(&self) -> Result<SocketAddr, WolError> {
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| self.resolution_failed(Some(e)))?;
        pick_addr(addrs).ok_or_else(|| self.resolution_failed(None))
    }

    pub async fn resolve_async(&self) -> Result<SocketAddr, WolError> {
        let addrs = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| self.resolution_failed(Some(e)))?;
        pick_addr(addrs).ok_or_else(|| self.resolution_failed(None))
    }

    fn resolution_failed(&self, source: Option<std::io::Error>) -> WolError {
        WolError::AddressResolutionFailed { destination: self.host.clone(), source }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

fn pick_addr(addrs: impl Iterator<Item = SocketAddr>) -> Option<SocketAddr> {
    let addrs: Vec<SocketAddr> = addrs.collect();
    addrs.iter().find(|a| a.is_ipv4()).or(addrs.first()).copied()
}

fn unspecified_for(target: &SocketAddr) -> SocketAddr {
    let ip = match target.ip() {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    SocketAddr::new(ip, 0)
}

fn check_sent(sent: usize, packet: &MagicPacket) -> Result<(), WolError> {
    if sent != packet.len() {
        return Err(WolError::TransmissionFailed {
            stage: TransmitStage::ShortWrite,
            source: std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("sent {} of {} bytes", sent, packet.len()),
            ),
        });
    }
    Ok(())
}

/// Sends `packet` as one datagram. The socket lives only for this call.
pub fn send_magic_packet(packet: &MagicPacket, dest: &Destination) -> Result<SocketAddr, WolError> {
    let target = dest.resolve()?;

    let socket = std::net::UdpSocket::bind(unspecified_for(&target))
        .map_err(WolError::transmit(TransmitStage::Bind))?;
    socket
        .set_broadcast(true)
        .map_err(WolError::transmit(TransmitStage::EnableBroadcast))?;
    let sent = socket
        .send_to(packet.as_bytes(), target)
        .map_err(WolError::transmit(TransmitStage::Send))?;

    check_sent(sent, packet)?;
    Ok(target)
}

pub async fn send_magic_packet_async(
    packet: &MagicPacket,
    dest: &Destination,
) -> Result<SocketAddr, WolError> {
    let target = dest.resolve_async().await?;

    let socket = tokio::net::UdpSocket::bind(unspecified_for(&target))
        .await
        .map_err(WolError::transmit(TransmitStage::Bind))?;
    socket
        .set_broadcast(true)
        .map_err(WolError::transmit(TransmitStage::EnableBroadcast))?;
    let sent = socket
        .send_to(packet.as_bytes(), target)
        .await
        .map_err(WolError::transmit(TransmitStage::Send))?;

    check_sent(sent, packet)?;
    Ok(target)
}

fn prepare(mac: &str, destination: &str, port: Option<u16>) -> Result<(MagicPacket, Destination), WolError> {
    let mac: MacAddress = mac.parse()?;
    let dest = Destination::new(destination, port)?;
    Ok((MagicPacket::new(&mac), dest))
}

/// Validates `mac`, builds the magic packet and sends it to `destination:port`
/// (port 9 when `None`). Blocks on name resolution and the send.
pub fn send_wake_on_lan(mac: &str, destination: &str, port: Option<u16>) -> Result<(), WolError> {
    let (packet, dest) = prepare(mac, destination, port)?;
    send_magic_packet(&packet, &dest).map(|_| ())
}

/// Same as [`send_wake_on_lan`] on the tokio runtime.
pub async fn send_wake_on_lan_async(
    mac: &str,
    destination: &str,
    port: Option<u16>,
) -> Result<(), WolError> {
    let (packet, dest) = prepare(mac, destination, port)?;
    send_magic_packet_async(&packet, &dest).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults() {
        assert_eq!(parse_port(None), 9);
        assert_eq!(parse_port(Some("")), 9);
        assert_eq!(parse_port(Some("abc")), 9);
        assert_eq!(parse_port(Some("-1")), 9);
        assert_eq!(parse_port(Some("70000")), 9);
        assert_eq!(parse_port(Some("7")), 7);
        assert_eq!(parse_port(Some("0")), 0);
    }

    #[test]
    fn destination_defaults_port() {
        let dest = Destination::new("192.168.1.255", None).unwrap();
        assert_eq!(dest.port(), 9);
        assert_eq!(dest.to_string(), "192.168.1.255:9");
    }

    #[test]
    fn ipv6_destination_display() {
        let dest = Destination::new("ff02::1", Some(7)).unwrap();
        assert_eq!(dest.to_string(), "[ff02::1]:7");
    }

    #[test]
    fn empty_destination() {
        assert!(matches!(Destination::new("", None), Err(WolError::EmptyDestination)));
    }

    #[test]
    fn resolve_literal() {
        let dest = Destination::new("192.168.1.255", Some(9)).unwrap();
        assert_eq!(dest.resolve().unwrap(), "192.168.1.255:9".parse().unwrap());
    }

    #[test]
    fn unresolvable_host() {
        let dest = Destination::new("not.a.real.host.invalid", None).unwrap();
        assert!(matches!(
            dest.resolve(),
            Err(WolError::AddressResolutionFailed { .. })
        ));
    }

    #[test]
    fn ipv4_preferred() {
        let addrs = vec![
            "[::1]:9".parse::<SocketAddr>().unwrap(),
            "127.0.0.1:9".parse::<SocketAddr>().unwrap(),
        ];
        assert_eq!(pick_addr(addrs.into_iter()), Some("127.0.0.1:9".parse().unwrap()));
        assert_eq!(pick_addr(std::iter::empty()), None);
    }

    #[test]
    fn invalid_mac_fails_before_destination_check() {
        assert!(matches!(
            send_wake_on_lan("invalid-mac", "", None),
            Err(WolError::InvalidMacFormat(_))
        ));
    }

    #[test]
    fn empty_destination_rejected() {
        assert!(matches!(
            send_wake_on_lan("AA:BB:CC:DD:EE:FF", "", Some(9)),
            Err(WolError::EmptyDestination)
        ));
    }

    #[tokio::test]
    async fn unresolvable_host_async() {
        let res = send_wake_on_lan_async("AA:BB:CC:DD:EE:FF", "not.a.real.host.invalid", None).await;
        assert!(matches!(res, Err(WolError::AddressResolutionFailed { .. })));
    }
}
