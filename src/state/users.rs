use std::{collections::HashMap, env, sync::RwLock};

/// In-memory username/password table backing SOCKS5 RFC 1929 auth and the
/// management protocol's `ADD_USER` / `DEL_USER` / `LIST_USERS` commands.
///
/// Seeded from the `ADMIN` environment variable (`user:password`) at
/// startup, the same as the original daemon's `init_users`.
pub struct UserTable {
    users: RwLock<HashMap<String, String>>,
}

impl UserTable {
    pub fn new() -> UserTable {
        let table = UserTable {
            users: RwLock::new(HashMap::new()),
        };

        if let Ok(admin) = env::var("ADMIN") {
            if let Some((username, password)) = parse_user(&admin) {
                table.add_user(&username, &password).ok();
            }
        }

        table
    }

    /// Returns `false` if `username` is already present, matching the
    /// original's refusal to clobber an existing (active) user.
    pub fn add_user(&self, username: &str, password: &str) -> Result<(), ()> {
        let mut users = self.users.write().expect("user table lock poisoned");
        if users.contains_key(username) {
            return Err(());
        }
        users.insert(username.to_owned(), password.to_owned());
        Ok(())
    }

    pub fn del_user(&self, username: &str) -> Result<(), ()> {
        let mut users = self.users.write().expect("user table lock poisoned");
        users.remove(username).map(|_| ()).ok_or(())
    }

    /// Newline-separated usernames, in insertion-independent (hash map)
    /// order, one per line.
    pub fn list_users(&self) -> String {
        let users = self.users.read().expect("user table lock poisoned");
        users.keys().map(|u| format!("{u} \n")).collect()
    }

    pub fn check_credentials(&self, username: &str, password: &str) -> bool {
        let users = self.users.read().expect("user table lock poisoned");
        users.get(username).is_some_and(|p| p == password)
    }
}

impl Default for UserTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits `user:password` on the first `:`. Returns `None` when there is no
/// `:` separator, mirroring the original C `parse_user`.
pub fn parse_user(user: &str) -> Option<(String, String)> {
    let (username, password) = user.split_once(':')?;
    Some((username.to_owned(), password.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_password_pair() {
        assert_eq!(Some(("alice".to_owned(), "secret".to_owned())), parse_user("alice:secret"));
        assert_eq!(Some(("alice".to_owned(), "with:colon".to_owned())), parse_user("alice:with:colon"));
        assert_eq!(None, parse_user("no-separator"));
    }

    #[test]
    fn add_duplicate_user_fails() {
        let table = UserTable::new();
        assert!(table.add_user("alice", "secret").is_ok());
        assert!(table.add_user("alice", "other").is_err());
    }

    #[test]
    fn del_unknown_user_fails() {
        let table = UserTable::new();
        assert!(table.del_user("ghost").is_err());
    }

    #[test]
    fn checks_credentials() {
        let table = UserTable::new();
        table.add_user("alice", "secret").unwrap();

        assert!(table.check_credentials("alice", "secret"));
        assert!(!table.check_credentials("alice", "wrong"));
        assert!(!table.check_credentials("bob", "secret"));
    }

    #[test]
    fn deleted_user_can_be_recreated() {
        let table = UserTable::new();
        table.add_user("alice", "secret").unwrap();
        table.del_user("alice").unwrap();
        assert!(table.add_user("alice", "new-secret").is_ok());
        assert!(table.check_credentials("alice", "new-secret"));
    }
}
