use crate::{
    common::logging::{log_mng_auth_failure, log_mng_auth_success},
    proto::mgmt::{parse_credentials, Command},
    state::SharedState,
};
use anyhow::Result;
use log::{debug, info, warn};
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
};

/// Management write buffer capacity in the original daemon; overlong lines
/// are rejected the same way `mng_cmd_read` rejects them.
const MAX_LINE_LEN: usize = 4096;
const MIN_CHUNK_CAP: usize = 1;
const MAX_CHUNK_CAP: usize = 65535;

/// Drives one management connection: an `AUTH user:pass` gate, then a
/// `read line -> dispatch -> write reply` loop until `QUIT`, EOF, or error.
pub async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, state: Arc<SharedState>) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half);

    if !authenticate(&mut lines, &mut write_half, peer_addr, &state).await? {
        return Ok(());
    }

    loop {
        let line = match read_line(&mut lines, &mut write_half).await? {
            Some(line) => line,
            None => return Ok(()), // EOF
        };

        match Command::parse(&line) {
            Command::Quit => return Ok(()),
            command => {
                let reply = dispatch(command, &state);
                write_half.write_all(reply.as_bytes()).await?;
            }
        }
    }
}

/// Reads lines until a successful `AUTH user:pass`, replying `-ERR unknown
/// command` to any other pre-auth command and `-ERR invalid credentials`
/// to a failed login (both keep the session in the auth phase, allowing
/// retry). Returns `Ok(false)` on EOF before authentication succeeds.
async fn authenticate(
    lines: &mut BufReader<OwnedReadHalf>,
    write_half: &mut OwnedWriteHalf,
    peer_addr: SocketAddr,
    state: &Arc<SharedState>,
) -> Result<bool> {
    loop {
        let line = match read_line(lines, write_half).await? {
            Some(line) => line,
            None => return Ok(false),
        };

        match Command::parse(&line) {
            Command::Auth(arg) => match parse_credentials(&arg) {
                Some((username, password)) if state.users.check_credentials(&username, &password) => {
                    log_mng_auth_success!(peer_addr, username);
                    write_half.write_all(b"+OK authentication successful\r\n").await?;
                    return Ok(true);
                }
                Some((username, _)) => {
                    log_mng_auth_failure!(peer_addr, username);
                    write_half.write_all(b"-ERR invalid credentials\r\n").await?;
                }
                None => {
                    write_half.write_all(b"-ERR invalid AUTH format, expected: AUTH user:password\r\n").await?;
                }
            },
            _ => {
                write_half.write_all(b"-ERR unknown command\r\n").await?;
            }
        }
    }
}

fn dispatch(command: Command, state: &Arc<SharedState>) -> String {
    match command {
        Command::Auth(_) => "-ERR already authenticated\r\n".to_owned(),
        Command::Metrics => state.metrics.render(),
        Command::AddUser(arg) => match parse_credentials(&arg) {
            None => "-ERR invalid format, expected format USER:PASSWORD\r\n".to_owned(),
            Some((username, password)) => match state.users.add_user(&username, &password) {
                Ok(()) => format!("+OK user {username} added correctly\r\n"),
                Err(()) => format!("-ERR user {username} already exist\r\n"),
            },
        },
        Command::DelUser(username) => match state.users.del_user(&username) {
            Ok(()) => format!("+OK user {username} deleted\r\n"),
            Err(()) => format!("-ERR user {username} does not exist\r\n"),
        },
        // Matches the original wire behavior: the bare list, no +OK/-ERR header.
        Command::ListUsers => state.users.list_users(),
        Command::ShowLogs => state.access_log.render(),
        Command::SetBuffer(arg) => match arg.trim().parse::<usize>() {
            Ok(size) if (MIN_CHUNK_CAP..=MAX_CHUNK_CAP).contains(&size) => {
                state.copy_chunk_cap.store(size, std::sync::atomic::Ordering::Relaxed);
                format!("+OK buffer size changed to {size}\r\n")
            }
            _ => "-ERR invalid size (accepted sizes: 1-65535)\r\n".to_owned(),
        },
        Command::Quit => unreachable!("QUIT is handled by the caller before dispatch"),
        Command::Unknown => "-ERR unknown command\r\n".to_owned(),
    }
}

/// Reads one LF-terminated line (a preceding CR is stripped), enforcing
/// `MAX_LINE_LEN` as the line is accumulated rather than after the fact:
/// an unauthenticated client streaming unterminated bytes is cut off as
/// soon as `MAX_LINE_LEN` is crossed, instead of being allowed to grow
/// `buf` without bound while we wait for a `\n` that may never arrive.
/// Works directly against the `BufReader`'s internal buffer via
/// `fill_buf`/`consume` so no more than one fill's worth of bytes is ever
/// copied into `buf` past the point where the line is already too long.
/// Replies `-ERR line too long` and keeps the connection open when a line
/// exceeds the bound, matching the original's "reset the read buffer,
/// keep reading" behavior. Returns `Ok(None)` on clean EOF.
async fn read_line(lines: &mut BufReader<OwnedReadHalf>, write_half: &mut OwnedWriteHalf) -> Result<Option<String>> {
    loop {
        let mut buf = Vec::new();
        let mut too_long = false;
        let mut saw_newline = false;

        loop {
            let available = lines.fill_buf().await?;
            if available.is_empty() {
                break; // EOF
            }

            match available.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    let chunk = &available[..=pos];
                    if !too_long {
                        if buf.len() + chunk.len() > MAX_LINE_LEN {
                            too_long = true;
                            buf.clear();
                        } else {
                            buf.extend_from_slice(chunk);
                        }
                    }
                    lines.consume(pos + 1);
                    saw_newline = true;
                    break;
                }
                None => {
                    let chunk_len = available.len();
                    if !too_long {
                        if buf.len() + chunk_len > MAX_LINE_LEN {
                            too_long = true;
                            buf.clear();
                        } else {
                            buf.extend_from_slice(available);
                        }
                    }
                    lines.consume(chunk_len);
                }
            }
        }

        if !saw_newline && buf.is_empty() && !too_long {
            return Ok(None);
        }

        if too_long {
            warn!("management line exceeded {MAX_LINE_LEN} bytes, discarding");
            write_half.write_all(b"-ERR line too long\r\n").await?;
            continue;
        }

        while buf.last() == Some(&b'\n') || buf.last() == Some(&b'\r') {
            buf.pop();
        }

        debug!("management command: {}", String::from_utf8_lossy(&buf));
        return Ok(Some(String::from_utf8_lossy(&buf).into_owned()));
    }
}
