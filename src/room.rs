use tokio::sync::mpsc;

pub type ConnId = u64;

/// One registered client: identity plus the queue its handler drains.
pub struct Member {
    id: ConnId,
    name: String,
    tx: mpsc::UnboundedSender<String>,
}

impl Member {
    pub fn new(id: ConnId, name: String, tx: mpsc::UnboundedSender<String>) -> Self {
        Self { id, name, tx }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queues a message for delivery. False means the handler is gone.
    pub fn send(&self, msg: &str) -> bool {
        self.tx.send(msg.to_string()).is_ok()
    }
}

#[derive(Default)]
pub struct Room {
    members: Vec<Member>,
}

impl Room {
    pub fn add(&mut self, member: Member) {
        self.members.push(member);
    }

    pub fn remove(&mut self, id: ConnId) -> Option<Member> {
        let i = self.members.iter().position(|m| m.id == id)?;

        Some(self.members.remove(i))
    }

    /// Removes the first member with this name, if any.
    pub fn remove_by_name(&mut self, name: &str) -> Option<Member> {
        let i = self.members.iter().position(|m| m.name == name)?;

        Some(self.members.remove(i))
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }

    /// Queues `msg` for every member except `skip`, dropping members whose
    /// queue is closed.
    pub fn deliver(&mut self, msg: &str, skip: Option<ConnId>) {
        self.members
            .retain(|m| Some(m.id) == skip || m.send(msg));
    }
}
