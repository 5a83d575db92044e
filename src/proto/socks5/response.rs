use super::{consts, Address, ReplyStatus};
use crate::{auth::LurkAuthMethod, io::LurkResponse};
use anyhow::Result;
use bytes::{BufMut, BytesMut};
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;

// The server selects from one of the methods given in METHODS, and
// sends a METHOD selection message:
// +----+--------+
// |VER | METHOD |
// +----+--------+
// | 1  |   1    |
// +----+--------+

#[derive(Debug, PartialEq)]
pub struct HandshakeResponse {
    selected_method: Option<LurkAuthMethod>,
}

impl HandshakeResponse {
    pub fn builder() -> HandshakeResponseBuilder {
        HandshakeResponseBuilder { selected_method: None }
    }
}

impl LurkResponse for HandshakeResponse {
    async fn write_to<T: AsyncWriteExt + Unpin>(&self, stream: &mut T) -> Result<()> {
        let method = self
            .selected_method
            .map_or(consts::auth::SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE, LurkAuthMethod::as_socks5_const);
        let response: [u8; 2] = [consts::SOCKS5_VERSION, method];
        stream.write_all(&response).await?;
        Ok(())
    }
}

pub struct HandshakeResponseBuilder {
    selected_method: Option<LurkAuthMethod>,
}

impl HandshakeResponseBuilder {
    pub fn with_auth_method(&mut self, method: LurkAuthMethod) -> &mut HandshakeResponseBuilder {
        self.selected_method = Some(method);
        self
    }

    pub fn with_no_acceptable_method(&mut self) -> &mut HandshakeResponseBuilder {
        self.selected_method = None;
        self
    }

    pub fn build(&self) -> HandshakeResponse {
        HandshakeResponse {
            selected_method: self.selected_method,
        }
    }
}

// Username/Password sub-negotiation response (RFC 1929):
// +----+--------+
// |VER | STATUS |
// +----+--------+
// | 1  |   1    |
// +----+--------+

#[derive(Debug, PartialEq)]
pub struct UserPassResponse {
    success: bool,
}

impl UserPassResponse {
    pub fn new(success: bool) -> UserPassResponse {
        UserPassResponse { success }
    }
}

impl LurkResponse for UserPassResponse {
    async fn write_to<T: AsyncWriteExt + Unpin>(&self, stream: &mut T) -> Result<()> {
        let status = if self.success {
            consts::userpass::USERPASS_STATUS_SUCCESS
        } else {
            consts::userpass::USERPASS_STATUS_FAILURE
        };
        stream.write_all(&[consts::userpass::USERPASS_VERSION, status]).await?;
        Ok(())
    }
}

// The server evaluates the relay request, and returns a reply formed as follows:
// +----+-----+-------+------+----------+----------+
// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
// +----+-----+-------+------+----------+----------+
// | 1  |  1  | X'00' |  1   | Variable |    2     |
// +----+-----+-------+------+----------+----------+

#[derive(Debug)]
pub struct RelayResponse {
    bound_addr: Address,
    status: ReplyStatus,
}

impl RelayResponse {
    pub fn builder() -> RelayResponseBuilder {
        RelayResponseBuilder {
            bound_addr: None,
            status: None,
        }
    }
}

impl LurkResponse for RelayResponse {
    async fn write_to<T: AsyncWriteExt + Unpin>(&self, stream: &mut T) -> Result<()> {
        let mut bytes = BytesMut::new();
        bytes.put_slice(&[consts::SOCKS5_VERSION, self.status.as_u8(), 0x00]);
        self.bound_addr.write_to(&mut bytes);
        stream.write_all(&bytes).await?;
        Ok(())
    }
}

pub struct RelayResponseBuilder {
    bound_addr: Option<Address>,
    status: Option<ReplyStatus>,
}

impl RelayResponseBuilder {
    pub fn with_success(&mut self) -> &mut RelayResponseBuilder {
        self.status = Some(ReplyStatus::Succeeded);
        self
    }

    pub fn with_err(&mut self, err: anyhow::Error) -> &mut RelayResponseBuilder {
        self.status = Some(ReplyStatus::from(err));
        self
    }

    pub fn with_bound_address(&mut self, bound_addr: SocketAddr) -> &mut RelayResponseBuilder {
        self.bound_addr = Some(Address::SocketAddress(bound_addr));
        self
    }

    /// Used when a relay request fails before a bound address exists
    /// (e.g. DNS resolution failure); RFC 1928 leaves BND.ADDR unspecified
    /// on error, so the unspecified address is reported.
    pub fn with_unspecified_address(&mut self) -> &mut RelayResponseBuilder {
        self.bound_addr = Some(Address::SocketAddress(SocketAddr::new(std::net::Ipv4Addr::UNSPECIFIED.into(), 0)));
        self
    }

    pub fn build(&self) -> RelayResponse {
        RelayResponse {
            bound_addr: self.bound_addr.clone().expect("Bound address expected"),
            status: self.status.expect("Reply status expected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn writes_handshake_response() {
        let mut mock = tokio_test::io::Builder::new().write(&[0x05, 0x02]).build();
        let response = HandshakeResponse::builder().with_auth_method(LurkAuthMethod::Password).build();
        response.write_to(&mut mock).await.unwrap();
    }

    #[tokio::test]
    async fn writes_no_acceptable_method() {
        let mut mock = tokio_test::io::Builder::new().write(&[0x05, 0xff]).build();
        let response = HandshakeResponse::builder().with_no_acceptable_method().build();
        response.write_to(&mut mock).await.unwrap();
    }

    #[tokio::test]
    async fn writes_userpass_response() {
        let mut mock = tokio_test::io::Builder::new().write(&[0x01, 0x00]).build();
        UserPassResponse::new(true).write_to(&mut mock).await.unwrap();

        let mut mock = tokio_test::io::Builder::new().write(&[0x01, 0x01]).build();
        UserPassResponse::new(false).write_to(&mut mock).await.unwrap();
    }
}
