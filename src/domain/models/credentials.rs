use std::collections::HashMap;

/// Accepted logins, username to plaintext password.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    entries: HashMap<String, String>,
}

impl Credentials {
    pub fn new(entries: HashMap<String, String>) -> Credentials {
        return Credentials { entries };
    }

    pub fn password_for(&self, username: &str) -> Option<&str> {
        return self.entries.get(username).map(|e| return e.as_str());
    }

    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }
}

impl FromIterator<(String, String)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Credentials {
        return Credentials::new(iter.into_iter().collect());
    }
}
