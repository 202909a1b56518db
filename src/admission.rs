use std::sync::atomic::{AtomicU8, Ordering};

/// Gate consulted at accept time and on every relayed message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Admission {
    /// New clients and messages are accepted.
    Active = 0,
    /// No new clients; existing members keep chatting.
    Standby = 1,
    /// No new clients and message relay is suppressed.
    Stopped = 2,
}

/// Lock-free holder for the shared [`Admission`] value. Readers may observe
/// a transition one message late; they must never block.
pub struct AdmissionFlag(AtomicU8);

impl AdmissionFlag {
    pub fn get(&self) -> Admission {
        match self.0.load(Ordering::Relaxed) {
            0 => Admission::Active,
            1 => Admission::Standby,
            _ => Admission::Stopped,
        }
    }

    pub fn set(&self, state: Admission) {
        self.0.store(state as u8, Ordering::Relaxed);
    }
}

impl Default for AdmissionFlag {
    fn default() -> Self {
        Self(AtomicU8::new(Admission::Standby as u8))
    }
}
