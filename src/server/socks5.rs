use crate::{
    auth::{LurkAuthMethod, LurkAuthenticator},
    common::{
        error::{LurkError, Unsupported},
        logging::{log_mng_auth_failure, log_mng_auth_success, log_tunnel_closed, log_tunnel_closed_with_error, log_tunnel_created},
    },
    io::{tunnel::LurkTunnel, LurkRequest, LurkResponse},
    net::tcp::establish_tcp_connection,
    proto::socks5::{
        request::{HandshakeRequest, RelayRequest, UserPassRequest},
        response::{HandshakeResponse, RelayResponse, UserPassResponse},
        Command,
    },
    state::SharedState,
};
use anyhow::{bail, Result};
use human_bytes::human_bytes;
use log::{error, info, warn};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpStream;

/// Drives one SOCKS5 client connection from greeting through the copy
/// phase, sharing `state` (user table, metrics, access log, chunk cap)
/// with every other session and with the management endpoint.
pub async fn handle_connection(mut client: TcpStream, peer_addr: SocketAddr, local_addr: SocketAddr, require_auth: bool, state: Arc<SharedState>) -> Result<()> {
    state.metrics.on_connection_started();
    let result = run_session(&mut client, peer_addr, local_addr, require_auth, &state).await;
    state.metrics.on_connection_ended();
    result
}

async fn run_session(client: &mut TcpStream, peer_addr: SocketAddr, local_addr: SocketAddr, require_auth: bool, state: &Arc<SharedState>) -> Result<()> {
    let handshake = HandshakeRequest::read_from(client).await?;

    let mut authenticator = LurkAuthenticator::new(require_auth);
    let chosen_method = authenticator.select_auth_method(handshake.auth_methods());

    let mut response_builder = HandshakeResponse::builder();
    match chosen_method {
        Some(method) => response_builder.with_auth_method(method),
        None => response_builder.with_no_acceptable_method(),
    };
    response_builder.build().write_to(client).await?;

    let Some(chosen_method) = chosen_method else {
        record_access(state, "unknown", &peer_addr.to_string(), "-", "NO_ACCEPTABLE_METHOD");
        bail!(LurkError::NoAcceptableAuthMethod);
    };

    let username = match chosen_method {
        LurkAuthMethod::Password => {
            let userpass = UserPassRequest::read_from(client).await?;
            let success = state.users.check_credentials(userpass.username(), userpass.password());

            UserPassResponse::new(success).write_to(client).await?;

            if success {
                log_mng_auth_success!(peer_addr, userpass.username());
            } else {
                log_mng_auth_failure!(peer_addr, userpass.username());
                record_access(state, userpass.username(), &peer_addr.to_string(), "-", "AUTH_FAILED");
                bail!(LurkError::InvalidCredentials);
            }

            userpass.username().to_owned()
        }
        _ => "anonymous".to_owned(),
    };

    let relay_request = match RelayRequest::read_from(client).await {
        Ok(relay_request) => relay_request,
        Err(err) => {
            // Malformed request (illegal ATYP, zero-length domain, bad
            // reserved byte, ...): the client still gets a well-formed
            // reply, per spec, even though we can't know its intended
            // target address.
            let err_display = err.to_string();
            let response = RelayResponse::builder().with_err(err).with_unspecified_address().build();
            response.write_to(client).await?;
            record_access(state, &username, &peer_addr.to_string(), "-", "MALFORMED_REQUEST");
            bail!(err_display);
        }
    };

    if relay_request.command() != Command::Connect {
        let err = anyhow::Error::from(LurkError::Unsupported(Unsupported::Socks5Command(relay_request.command())));
        let response = RelayResponse::builder().with_err(err).with_unspecified_address().build();
        response.write_to(client).await?;
        record_access(state, &username, &peer_addr.to_string(), &relay_request.target_addr().to_string(), "COMMAND_NOT_SUPPORTED");
        bail!(LurkError::Unsupported(Unsupported::Socks5Command(relay_request.command())));
    }

    let target_addr = relay_request.target_addr();
    let candidates = match target_addr.resolve().await {
        Ok(candidates) if !candidates.is_empty() => candidates,
        _ => {
            let err = anyhow::Error::from(LurkError::UnresolvedDomainName(target_addr.to_string()));
            let response = RelayResponse::builder().with_err(err).with_unspecified_address().build();
            response.write_to(client).await?;
            record_access(state, &username, &peer_addr.to_string(), &target_addr.to_string(), "DNS_FAILED");
            bail!(LurkError::UnresolvedDomainName(target_addr.to_string()));
        }
    };

    let mut origin = None;
    let mut last_err = None;
    for candidate in &candidates {
        match establish_tcp_connection(*candidate).await {
            Ok(stream) => {
                origin = Some(stream);
                break;
            }
            Err(err) => last_err = Some(err),
        }
    }

    let mut origin = match origin {
        Some(origin) => origin,
        None => {
            let err = last_err.unwrap_or_else(|| anyhow::anyhow!("no candidate addresses to connect to"));
            let err_display = err.to_string();
            let response = RelayResponse::builder().with_err(err).with_unspecified_address().build();
            response.write_to(client).await?;
            record_access(state, &username, &peer_addr.to_string(), &target_addr.to_string(), "CONNECT_FAILED");
            bail!(err_display);
        }
    };

    let origin_local_addr = origin.local_addr().unwrap_or(local_addr);
    let response = RelayResponse::builder().with_success().with_bound_address(origin_local_addr).build();
    response.write_to(client).await?;

    record_access(state, &username, &peer_addr.to_string(), &target_addr.to_string(), "CONNECT");

    log_tunnel_created!(peer_addr, local_addr, target_addr);
    let mut tunnel = LurkTunnel::new(client, &mut origin)
        .with_chunk_cap(Arc::clone(&state.copy_chunk_cap))
        .with_metrics(Arc::clone(&state.metrics));

    match tunnel.run().await {
        Ok(stats) => {
            log_tunnel_closed!(peer_addr, local_addr, target_addr, stats.l2r_bytes, stats.r2l_bytes);
            Ok(())
        }
        Err(err) => {
            log_tunnel_closed_with_error!(peer_addr, local_addr, target_addr, err);
            Err(err)
        }
    }
}

fn record_access(state: &Arc<SharedState>, user: &str, src: &str, dst: &str, status: &str) {
    state.access_log.record(user, src, dst, status);
}
