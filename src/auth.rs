use std::collections::HashSet;

#[repr(u8)]
#[rustfmt::skip]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum LurkAuthMethod {
    None,
    GssAPI,
    Password,
}

/// Negotiates the SOCKS5 authentication method (RFC 1928 §3) between the set
/// of methods the server is configured to accept and the set the client
/// advertised in its greeting.
pub struct LurkAuthenticator {
    available_methods: HashSet<LurkAuthMethod>,
    selected_method: Option<LurkAuthMethod>,
}

impl LurkAuthenticator {
    pub fn new(require_auth: bool) -> LurkAuthenticator {
        let available_methods = if require_auth {
            HashSet::from([LurkAuthMethod::Password])
        } else {
            HashSet::from([LurkAuthMethod::None, LurkAuthMethod::Password])
        };

        LurkAuthenticator {
            available_methods,
            selected_method: None,
        }
    }

    /// Picks a method from the intersection of `available_methods` and
    /// `peer_methods`. When both `Password` and `None` are available,
    /// `Password` is preferred, since a server willing to authenticate
    /// clients shouldn't silently let an unauthenticated one through just
    /// because it also offered `None`.
    pub fn select_auth_method(&mut self, peer_methods: &HashSet<LurkAuthMethod>) -> Option<LurkAuthMethod> {
        let common_methods: HashSet<&LurkAuthMethod> = self.available_methods.intersection(peer_methods).collect();

        self.selected_method = if common_methods.contains(&LurkAuthMethod::Password) {
            Some(LurkAuthMethod::Password)
        } else if common_methods.contains(&LurkAuthMethod::None) {
            Some(LurkAuthMethod::None)
        } else {
            None
        };

        self.selected_method
    }

    pub fn current_method(&self) -> Option<LurkAuthMethod> {
        self.selected_method
    }
}
