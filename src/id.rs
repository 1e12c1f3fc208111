/// Stable handle for a person in the population arena.
///
/// Spouses, descendants, parents and matched buyers all refer to people through
/// this id, never by owning them.
pub type PersonId = u64;

/// Issues person ids for one game. An id is never handed out twice, so a
/// reference to a purged person can't come to mean somebody new.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: PersonId,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> PersonId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Ids handed out so far, including those of people since purged.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
