///
/// Wire format for the out-of-band management protocol: ASCII lines
/// terminated by LF (an immediately preceding CR is ignored), each of the
/// form `COMMAND [ARG]` where ARG, when present, is the remainder of the
/// line rather than a single whitespace-delimited token.
///
use crate::state::users::parse_user;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Auth(String),
    Metrics,
    AddUser(String),
    DelUser(String),
    ListUsers,
    ShowLogs,
    SetBuffer(String),
    Quit,
    Unknown,
}

impl Command {
    /// Parses one already-delimited line (CR/LF already stripped by the
    /// caller's line accumulator). Unknown commands, and known commands
    /// missing a required argument, both map to `Unknown`.
    pub fn parse(line: &str) -> Command {
        let line = line.trim_end_matches(['\r', '\n']);
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim_start()),
            None => (line, ""),
        };

        match cmd.to_ascii_uppercase().as_str() {
            "AUTH" if !rest.is_empty() => Command::Auth(rest.to_owned()),
            "METRICS" => Command::Metrics,
            "ADD_USER" if !rest.is_empty() => Command::AddUser(rest.to_owned()),
            "DEL_USER" if !rest.is_empty() => Command::DelUser(rest.to_owned()),
            "LIST_USERS" => Command::ListUsers,
            "SHOW_LOGS" => Command::ShowLogs,
            "SET_BUFFER" if !rest.is_empty() => Command::SetBuffer(rest.to_owned()),
            "QUIT" => Command::Quit,
            _ => Command::Unknown,
        }
    }
}

/// `user:pass` → `(user, pass)`, used by both `AUTH` and `ADD_USER`.
pub fn parse_credentials(arg: &str) -> Option<(String, String)> {
    parse_user(arg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_known_commands() {
        assert_eq!(Command::Auth("admin:1234".to_owned()), Command::parse("AUTH admin:1234"));
        assert_eq!(Command::Metrics, Command::parse("METRICS"));
        assert_eq!(Command::AddUser("bob:pw".to_owned()), Command::parse("ADD_USER bob:pw"));
        assert_eq!(Command::DelUser("bob".to_owned()), Command::parse("DEL_USER bob"));
        assert_eq!(Command::ListUsers, Command::parse("LIST_USERS"));
        assert_eq!(Command::ShowLogs, Command::parse("SHOW_LOGS"));
        assert_eq!(Command::SetBuffer("1024".to_owned()), Command::parse("SET_BUFFER 1024"));
        assert_eq!(Command::Quit, Command::parse("QUIT"));
    }

    #[test]
    fn command_matching_is_case_insensitive() {
        assert_eq!(Command::Metrics, Command::parse("metrics"));
        assert_eq!(Command::Auth("admin:1234".to_owned()), Command::parse("auth admin:1234"));
    }

    #[test]
    fn strips_trailing_cr_lf() {
        assert_eq!(Command::Metrics, Command::parse("METRICS\r\n"));
        assert_eq!(Command::Metrics, Command::parse("METRICS\n"));
    }

    #[test]
    fn argument_is_remainder_of_line_not_first_token() {
        // ADD_USER's argument may itself contain a password with a space.
        assert_eq!(Command::AddUser("bob:pw with space".to_owned()), Command::parse("ADD_USER bob:pw with space"));
    }

    #[test]
    fn commands_missing_a_required_argument_are_unknown() {
        assert_eq!(Command::Unknown, Command::parse("AUTH"));
        assert_eq!(Command::Unknown, Command::parse("ADD_USER"));
        assert_eq!(Command::Unknown, Command::parse("DEL_USER"));
        assert_eq!(Command::Unknown, Command::parse("SET_BUFFER"));
    }

    #[test]
    fn unrecognized_command_is_unknown() {
        assert_eq!(Command::Unknown, Command::parse("FROBNICATE"));
        assert_eq!(Command::Unknown, Command::parse(""));
    }
}
