// TCP listener lifecycle

macro_rules! log_tcp_acception_error {
    ($err:expr) => {
        warn!("TCP connection was NOT ACCEPTED: reason: '{}'", $err)
    };
}

macro_rules! log_tcp_established_conn {
    ($conn_addr:expr, $conn_label:expr) => {
        info!("{} connection OPENED: peer '{}'", $conn_label, $conn_addr)
    };
}

macro_rules! log_tcp_closed_conn {
    ($conn_addr:expr, $conn_label:expr) => {
        info!("{} connection CLOSED: peer '{}'", $conn_label, $conn_addr)
    };
}

macro_rules! log_tcp_closed_conn_with_error {
    ($conn_addr:expr, $conn_label:expr, $err:expr) => {
        error!("{} connection CLOSED with ERROR: peer '{}', reason: '{}'", $conn_label, $conn_addr, $err)
    };
}

macro_rules! log_tcp_canceled_conn {
    ($conn_addr:expr, $conn_label:expr) => {
        warn!("{} connection CANCELED: peer '{}'", $conn_label, $conn_addr)
    };
}

pub(crate) use log_tcp_acception_error;
pub(crate) use log_tcp_canceled_conn;
pub(crate) use log_tcp_closed_conn;
pub(crate) use log_tcp_closed_conn_with_error;
pub(crate) use log_tcp_established_conn;

// Tunnel (SOCKS5 copy phase)

macro_rules! log_tunnel_created {
    ($peer:expr, $proxy:expr, $endpoint:expr) => {
        info!(
            "Tunnel CREATED: source [{}] <--L--> lurk [{}] <--R--> destination [{}]",
            $peer, $proxy, $endpoint
        );
    };
}

macro_rules! log_tunnel_closed {
    ($peer:expr, $proxy:expr, $endpoint:expr, $l2r:expr, $r2l:expr) => {
        info!(
            "Tunnel CLOSED: source [{}] <--L--> lurk [{}] <--R--> destination [{}], transmitted: L->R {}, R->L {}",
            $peer,
            $proxy,
            $endpoint,
            human_bytes($l2r as f64),
            human_bytes($r2l as f64)
        );
    };
}

macro_rules! log_tunnel_closed_with_error {
    ($peer:expr, $proxy:expr, $endpoint:expr, $err:expr) => {
        error!(
            "Tunnel CLOSED with ERROR: source [{}] <--L--> lurk [{}] <--R--> destination [{}], error: '{}'",
            $peer, $proxy, $endpoint, $err
        );
    };
}

pub(crate) use log_tunnel_closed;
pub(crate) use log_tunnel_closed_with_error;
pub(crate) use log_tunnel_created;

// Request/reply handling errors

macro_rules! log_request_handling_error {
    ($peer:expr, $err:expr) => {
        error!("Error occurred during request handling: peer '{}', reason: '{}'", $peer, $err)
    };
}

pub(crate) use log_request_handling_error;

// Management protocol session lifecycle

macro_rules! log_mng_auth_success {
    ($peer:expr, $user:expr) => {
        info!("Management session {} authenticated as '{}'", $peer, $user)
    };
}

macro_rules! log_mng_auth_failure {
    ($peer:expr, $user:expr) => {
        warn!("Management session {} failed to authenticate as '{}'", $peer, $user)
    };
}

pub(crate) use log_mng_auth_failure;
pub(crate) use log_mng_auth_success;
