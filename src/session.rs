use crate::{models::User, storage::Storage};

/// The key the bearer token is saved under.
pub const TOKEN_KEY: &str = "access_token";
/// The key the serialized [`User`] is saved under.
pub const USER_KEY: &str = "user";

/// An authenticated user and the token the backend issued them.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn new(token: String, user: User) -> Self { Session { token, user } }
}

/// Reads and writes a [`Session`] through some [`Storage`].
///
/// Storage is only ever left holding a complete session or nothing at all.
#[derive(Copy, Clone)]
pub struct SessionStore<'a> {
    storage: &'a dyn Storage,
}

impl<'a> SessionStore<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self { SessionStore { storage } }

    pub fn save(&self, session: &Session) {
        match serde_json::to_string(&session.user) {
            Ok(user) => {
                self.storage.save(TOKEN_KEY, &session.token);
                self.storage.save(USER_KEY, &user);
            },
            Err(e) => {
                log::warn!("Unable to serialize the user, not saving: {}", e);
                self.clear();
            },
        }
    }

    pub fn token(&self) -> Option<String> {
        self.storage.read(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Load the saved session, erasing anything incomplete.
    pub fn load(&self) -> Option<Session> {
        let token = self.token();
        let user = self.storage.read(USER_KEY);

        match (token, user) {
            (Some(token), Some(raw)) => match serde_json::from_str(&raw) {
                Ok(user) => Some(Session { token, user }),
                Err(e) => {
                    log::warn!("Discarding an unreadable saved user: {}", e);
                    self.clear();
                    None
                },
            },
            (None, None) => None,
            _ => {
                log::warn!("Discarding an incomplete saved session");
                self.clear();
                None
            },
        }
    }

    pub fn clear(&self) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(USER_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{storage::MemoryStorage, Id};

    fn jane() -> User {
        User {
            id: Id::from("2"),
            first_name: String::from("Jane"),
            last_name: String::from("Smith"),
            email: String::from("jane@example.com"),
            role: String::from("USER"),
            is_admin: false,
        }
    }

    #[test]
    fn save_then_load() {
        let storage = MemoryStorage::default();
        let store = SessionStore::new(&storage);
        let session = Session::new(String::from("token"), jane());

        store.save(&session);

        assert_eq!(store.load(), Some(session));
        assert_eq!(store.token().as_deref(), Some("token"));
    }

    #[test]
    fn user_without_a_token_is_erased() {
        let storage = MemoryStorage::default();
        storage.save(USER_KEY, &serde_json::to_string(&jane()).unwrap());
        let store = SessionStore::new(&storage);

        assert_eq!(store.load(), None);
        assert_eq!(storage.read(USER_KEY), None);
    }

    #[test]
    fn token_without_a_user_is_erased() {
        let storage = MemoryStorage::default();
        storage.save(TOKEN_KEY, "orphan");
        let store = SessionStore::new(&storage);

        assert_eq!(store.load(), None);
        assert_eq!(storage.read(TOKEN_KEY), None);
    }

    #[test]
    fn corrupt_user_is_erased() {
        let storage = MemoryStorage::default();
        storage.save(TOKEN_KEY, "token");
        storage.save(USER_KEY, "{ not json");
        let store = SessionStore::new(&storage);

        assert_eq!(store.load(), None);
        assert_eq!(store.token(), None);
    }
}
