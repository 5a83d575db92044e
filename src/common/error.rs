use crate::proto::socks5::Command;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LurkError {
    #[error("data has incorrect / corrupted field: {0}")]
    DataError(InvalidValue),
    #[error("failed UTF-8 decoding of domain name: {0}")]
    DomainNameDecodingFailed(std::string::FromUtf8Error),
    #[error("{0} is not supported")]
    Unsupported(Unsupported),
    #[error("unable to resolve domain name {0}")]
    UnresolvedDomainName(String),
    #[error("unable to agree on an authentication method")]
    NoAcceptableAuthMethod,
    #[error("invalid username/password credentials")]
    InvalidCredentials,
    #[error("management line exceeds the maximum allowed length")]
    LineTooLong,
    #[error("user {0} already exists")]
    UserAlreadyExists(String),
    #[error("user {0} does not exist")]
    UserNotFound(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum InvalidValue {
    #[error("invalid 'reserved' value {0:#02x}")]
    ReservedValue(u8),
    #[error("invalid type of network address {0:#02x}")]
    AddressType(u8),
    #[error("invalid version of protocol {0:#02x}")]
    ProtocolVersion(u8),
    #[error("invalid authentication method {0:#02x}")]
    AuthMethod(u8),
    #[error("invalid SOCKS command {0:#02x}")]
    SocksCommand(u8),
    #[error("domain name length must be in 1..=255, got {0}")]
    DomainNameLength(u8),
}

#[derive(Error, Debug, PartialEq)]
pub enum Unsupported {
    #[error("{0:?} SOCKS5 command")]
    Socks5Command(Command),
}
