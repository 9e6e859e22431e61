//! Default network interface detection.
//!
//! The interface carrying the default route is found without sending any
//! traffic: a UDP socket is "connected" to a public address, which makes the
//! OS pick the outbound source address, and that address is then looked up in
//! the interface list. All functions are stateless.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, UdpSocket};

use thiserror::Error;

/// Address used to select the outbound route. Nothing is sent to it.
pub const DEFAULT_PROBE: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(8, 8, 8, 8), 80));

/// Failures of interface detection, naming the step that failed.
#[derive(Debug, Error)]
pub enum DetectError {
    /// No outbound source address could be chosen for the probe address.
    #[error("failed to determine the outbound address towards {probe}: {source}")]
    Probe {
        /// Probe address used to select the route.
        probe: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The interface list could not be read.
    #[error("failed to enumerate network interfaces: {0}")]
    Enumerate(#[source] io::Error),
    /// No interface carries the address.
    #[error("no network interface carries address {0}")]
    NotFound(IpAddr),
    /// Interface enumeration is not implemented for this platform.
    #[error("network interface enumeration is not supported on this platform")]
    Unsupported,
}

/// One address assigned to a network interface.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InterfaceAddr {
    /// Interface name, such as `eth0`.
    pub name: String,
    /// Address assigned to the interface.
    pub address: IpAddr,
}

/// The interface carrying the default route and its outbound address.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DefaultInterface {
    /// Interface name.
    pub name: String,
    /// Source address the OS chose for outbound traffic.
    pub address: IpAddr,
}

/// Finds the interface used for traffic towards [`DEFAULT_PROBE`].
pub fn default_interface() -> Result<DefaultInterface, DetectError> {
    default_interface_via(DEFAULT_PROBE)
}

/// Finds the interface used for traffic towards `probe`.
pub fn default_interface_via(probe: SocketAddr) -> Result<DefaultInterface, DetectError> {
    let address =
        outbound_address(probe).map_err(|source| DetectError::Probe { probe, source })?;
    let name = interface_for_ip(address)?;
    Ok(DefaultInterface { name, address })
}

/// Returns the name of the interface carrying `ip`.
pub fn interface_for_ip(ip: IpAddr) -> Result<String, DetectError> {
    let addrs = interface_addresses()?;
    match_interface(ip, &addrs)
        .map(str::to_owned)
        .ok_or(DetectError::NotFound(ip))
}

/// Returns the first interface in `addrs` carrying `ip`.
///
/// IPv4-mapped IPv6 addresses compare equal to their IPv4 form.
pub fn match_interface(ip: IpAddr, addrs: &[InterfaceAddr]) -> Option<&str> {
    let ip = ip.to_canonical();
    addrs
        .iter()
        .find(|candidate| candidate.address.to_canonical() == ip)
        .map(|candidate| candidate.name.as_str())
}

fn outbound_address(probe: SocketAddr) -> io::Result<IpAddr> {
    let bind: SocketAddr = match probe {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(bind)?;
    socket.connect(probe)?;
    Ok(socket.local_addr()?.ip())
}

/// Lists every IPv4 and IPv6 address assigned to a local interface.
#[cfg(unix)]
pub fn interface_addresses() -> Result<Vec<InterfaceAddr>, DetectError> {
    use std::net::SocketAddrV6;

    let addrs = nix::ifaddrs::getifaddrs()
        .map_err(|errno| DetectError::Enumerate(io::Error::from(errno)))?;
    Ok(addrs
        .filter_map(|ifaddr| {
            let storage = ifaddr.address?;
            let address = if let Some(sin) = storage.as_sockaddr_in() {
                IpAddr::V4(*SocketAddrV4::from(*sin).ip())
            } else if let Some(sin6) = storage.as_sockaddr_in6() {
                IpAddr::V6(*SocketAddrV6::from(*sin6).ip())
            } else {
                return None;
            };
            Some(InterfaceAddr {
                name: ifaddr.interface_name,
                address,
            })
        })
        .collect())
}

/// Lists every IPv4 and IPv6 address assigned to a local interface.
#[cfg(not(unix))]
pub fn interface_addresses() -> Result<Vec<InterfaceAddr>, DetectError> {
    Err(DetectError::Unsupported)
}
