use super::UserId;

/// Tracks which identity async work is being done for.
///
/// Work captures a [`Ticket`] before suspending and applies its result only
/// while the ticket is still current. Rebinding to another identity or
/// advancing the generation makes every outstanding ticket stale.
#[derive(Debug, Default)]
pub struct IdentityEpoch {
    user: Option<UserId>,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub user: UserId,
    generation: u64,
}

impl IdentityEpoch {
    /// Switch to `user`. Returns true if the identity actually changed.
    pub fn rebind(&mut self, user: Option<UserId>) -> bool {
        if self.user == user {
            return false;
        }
        self.user = user;
        self.generation += 1;
        true
    }

    /// Ticket for the current generation, if an identity is bound
    pub fn ticket(&self) -> Option<Ticket> {
        self.user.map(|user| Ticket {
            user,
            generation: self.generation,
        })
    }

    /// Start a new generation for the same identity; older tickets go stale
    pub fn advance(&mut self) -> Option<Ticket> {
        self.generation += 1;
        self.ticket()
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.user == Some(ticket.user) && self.generation == ticket.generation
    }
}
