//! Presence roster: the ordered list of participants currently connected.
//!
//! Order is arrival order. Joins are de-duplicated and quits for unknown ids
//! are ignored, because the server may deliver them twice or out of order
//! around a reconnect.

/// One connected participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub client_id: String,
    pub username: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct Roster {
    members: Vec<Member>,
    seeded: bool,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed membership from a document snapshot.
    ///
    /// Only the first snapshot of an epoch is applied; later ones return
    /// `false` and leave the roster untouched. Duplicates in `ids` collapse.
    pub fn apply_initial_roster<I, S>(&mut self, ids: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.seeded {
            return false;
        }
        self.seeded = true;
        for id in ids {
            self.apply_join(id);
        }
        true
    }

    /// Append `client_id` unless already present. Returns whether it was added.
    pub fn apply_join(&mut self, client_id: impl Into<String>) -> bool {
        let client_id = client_id.into();
        if self.contains(&client_id) {
            return false;
        }
        self.members.push(Member {
            client_id,
            username: None,
        });
        true
    }

    /// Remove the first occurrence of `client_id`. Returns whether it was present.
    pub fn apply_quit(&mut self, client_id: &str) -> bool {
        match self.members.iter().position(|m| m.client_id == client_id) {
            Some(i) => {
                self.members.remove(i);
                true
            }
            None => false,
        }
    }

    /// Attach a display name to a known member. Unknown ids are ignored.
    pub fn set_name(&mut self, client_id: &str, username: impl Into<String>) -> bool {
        match self.members.iter_mut().find(|m| m.client_id == client_id) {
            Some(m) => {
                m.username = Some(username.into());
                true
            }
            None => false,
        }
    }

    /// Client ids in roster order.
    pub fn current_members(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.client_id.as_str()).collect()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn contains(&self, client_id: &str) -> bool {
        self.members.iter().any(|m| m.client_id == client_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether a snapshot has been applied in the current epoch.
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Forget all members and accept the next snapshot as a fresh seed.
    pub fn reset(&mut self) {
        self.members.clear();
        self.seeded = false;
    }
}
