use crate::common::error::{InvalidValue, LurkError};
use anyhow::Result;
use bytes::BufMut;
use std::{
    fmt::Display,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6},
};
use tokio::{io::AsyncReadExt, net::lookup_host};

macro_rules! ipv4_socket_address {
    ($ipv4:expr, $port:expr) => {
        Address::SocketAddress(SocketAddr::V4(SocketAddrV4::new($ipv4, $port)))
    };
}

macro_rules! ipv6_socket_address {
    ($ipv6:expr, $port:expr) => {
        Address::SocketAddress(SocketAddr::V6(SocketAddrV6::new($ipv6, $port, 0, 0)))
    };
}

pub(crate) use ipv4_socket_address;
pub(crate) use ipv6_socket_address;

/// A SOCKS5 destination address: either a concrete socket address or an
/// unresolved domain name + port, as carried by the relay request.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Address {
    SocketAddress(SocketAddr),
    DomainName(String, u16),
}

impl Address {
    /// Resolves this address to the list of candidate socket addresses to
    /// attempt a connection against, in the order they should be tried.
    /// For a concrete socket address this is always a single-element list;
    /// for a domain name it is whatever the OS resolver returns, in order.
    pub async fn resolve(&self) -> Result<Vec<SocketAddr>> {
        match self {
            Address::SocketAddress(sock_addr) => Ok(vec![*sock_addr]),
            Address::DomainName(hostname, port) => {
                let resolved = lookup_host((hostname.as_str(), *port)).await?;
                Ok(resolved.collect())
            }
        }
    }

    pub async fn read_ipv4<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<Address> {
        let ipv4 = Ipv4Addr::from(stream.read_u32().await?);
        let port = stream.read_u16().await?;

        Ok(ipv4_socket_address!(ipv4, port))
    }

    pub async fn read_ipv6<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<Address> {
        let ipv6 = Ipv6Addr::from(stream.read_u128().await?);
        let port = stream.read_u16().await?;

        Ok(ipv6_socket_address!(ipv6, port))
    }

    pub async fn read_domain_name<T: AsyncReadExt + Unpin>(stream: &mut T, len: u8) -> Result<Address> {
        if len == 0 {
            return Err(LurkError::DataError(InvalidValue::DomainNameLength(len)).into());
        }

        let mut buf = vec![0u8; len as usize];
        stream.read_exact(&mut buf).await?;

        let name = String::from_utf8(buf).map_err(LurkError::DomainNameDecodingFailed)?;
        let port = stream.read_u16().await?;

        Ok(Address::DomainName(name, port))
    }

    pub fn write_ipv4<T: BufMut>(bytes: &mut T, ipv4_addr: &SocketAddrV4) {
        bytes.put_slice(&ipv4_addr.ip().octets());
        bytes.put_u16(ipv4_addr.port());
    }

    pub fn write_ipv6<T: BufMut>(bytes: &mut T, ipv6_addr: &SocketAddrV6) {
        bytes.put_slice(&ipv6_addr.ip().octets());
        bytes.put_u16(ipv6_addr.port());
    }

    pub fn write_domain_name<T: BufMut>(bytes: &mut T, name: &str, port: u16) {
        bytes.put_u8(name.len() as u8);
        bytes.put_slice(name.as_bytes());
        bytes.put_u16(port);
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::SocketAddress(sock) => write!(f, "{sock:}"),
            Address::DomainName(name, port) => write!(f, "{name:}:{port:}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::assertions::assert_lurk_err;
    use pretty_assertions::assert_eq;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn domain_to_socket_addr() {
        let resolved = Address::DomainName("localhost".to_owned(), 80);
        assert_ok!(resolved.resolve().await);

        let unresolved = Address::DomainName("this-domain-should-not-resolve.invalid".to_owned(), 666);
        assert_err!(unresolved.resolve().await);
    }

    #[tokio::test]
    async fn read_address_from_stream() {
        let domain_name = "www.example.com".to_string();
        let domain_name_len = domain_name.len() as u8;
        let mut mock = tokio_test::io::Builder::new()
            .read(&[127, 0, 0, 1, 10, 10]) // ipv4
            .read(&[0, 0, 0, 0, 0, 0xff, 0xff, 0xc0, 0x0a, 0x02, 0xff, 0xca, 0x1, 0x0, 0x11, 0xff, 10, 10]) // ipv6
            .read([domain_name.as_bytes(), &[10, 10]].concat().as_slice()) // domain
            .build();

        assert_eq!(
            ipv4_socket_address!(Ipv4Addr::new(127, 0, 0, 1), 2570),
            Address::read_ipv4(&mut mock).await.unwrap()
        );

        assert_eq!(
            ipv6_socket_address!(Ipv6Addr::new(0, 0, 0xff, 0xffc0, 0xa02, 0xffca, 0x100, 0x11ff), 2570),
            Address::read_ipv6(&mut mock).await.unwrap()
        );

        assert_eq!(
            Address::DomainName(domain_name, 2570),
            Address::read_domain_name(&mut mock, domain_name_len).await.unwrap()
        )
    }

    #[tokio::test]
    async fn zero_length_domain_is_rejected() {
        let mut mock = tokio_test::io::Builder::new().build();
        let result = Address::read_domain_name(&mut mock, 0).await;
        assert_lurk_err!(LurkError::DataError(InvalidValue::DomainNameLength(0)), result.unwrap_err());
    }
}
