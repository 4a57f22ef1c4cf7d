//! Authorization gate
//!
//! Pure decision function over (actor, action, resource). Admins may do
//! anything; customers are limited to their own bookings and profile.

use super::user::UserRole;
use super::DomainResult;
use crate::shared::DomainError;

/// The authenticated party invoking an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: i32, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn admin(id: i32) -> Self {
        Self::new(id, UserRole::Admin)
    }

    pub fn customer(id: i32) -> Self {
        Self::new(id, UserRole::Customer)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Cancel,
    Return,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Booking { owner_id: i32 },
    Vehicle,
    User { id: i32 },
    /// The user list as a whole
    UserDirectory,
    /// The `role` field of any user record
    UserRole,
}

pub fn authorize(actor: &Actor, action: Action, resource: Resource) -> DomainResult<()> {
    let allowed = match actor.role {
        UserRole::Admin => true,
        UserRole::Customer => match (action, resource) {
            (Action::Create | Action::Read | Action::Cancel, Resource::Booking { owner_id }) => {
                owner_id == actor.id
            }
            (Action::Update | Action::Return | Action::Delete, Resource::Booking { .. }) => false,
            (Action::Read, Resource::Vehicle) => true,
            (_, Resource::Vehicle) => false,
            (Action::Read | Action::Update, Resource::User { id }) => id == actor.id,
            (_, Resource::User { .. }) => false,
            (_, Resource::UserDirectory) => false,
            (_, Resource::UserRole) => false,
        },
    };

    if allowed {
        Ok(())
    } else {
        Err(DomainError::Forbidden(denial_message(action, resource)))
    }
}

fn denial_message(action: Action, resource: Resource) -> String {
    match (action, resource) {
        (Action::Return, Resource::Booking { .. }) => "Only admin can mark as returned".into(),
        (Action::Create, Resource::Booking { .. }) => {
            "You can only create bookings for yourself".into()
        }
        (_, Resource::UserRole) => "Only admins can update roles".into(),
        _ => "Access denied".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [Action; 6] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Cancel,
        Action::Return,
        Action::Delete,
    ];

    #[test]
    fn admin_is_allowed_everything() {
        let admin = Actor::admin(1);
        for action in ALL_ACTIONS {
            for resource in [
                Resource::Booking { owner_id: 99 },
                Resource::Vehicle,
                Resource::User { id: 42 },
                Resource::UserDirectory,
                Resource::UserRole,
            ] {
                assert!(authorize(&admin, action, resource).is_ok());
            }
        }
    }

    #[test]
    fn customer_owns_their_bookings() {
        let me = Actor::customer(5);
        let mine = Resource::Booking { owner_id: 5 };
        assert!(authorize(&me, Action::Create, mine).is_ok());
        assert!(authorize(&me, Action::Read, mine).is_ok());
        assert!(authorize(&me, Action::Cancel, mine).is_ok());
    }

    #[test]
    fn customer_cannot_touch_other_bookings() {
        let me = Actor::customer(5);
        let theirs = Resource::Booking { owner_id: 6 };
        for action in ALL_ACTIONS {
            assert!(matches!(
                authorize(&me, action, theirs),
                Err(DomainError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn customer_can_never_return() {
        let me = Actor::customer(5);
        let err = authorize(&me, Action::Return, Resource::Booking { owner_id: 5 }).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(ref m) if m == "Only admin can mark as returned"));
    }

    #[test]
    fn customer_vehicle_access_is_read_only() {
        let me = Actor::customer(5);
        assert!(authorize(&me, Action::Read, Resource::Vehicle).is_ok());
        for action in [Action::Create, Action::Update, Action::Delete] {
            assert!(authorize(&me, action, Resource::Vehicle).is_err());
        }
    }

    #[test]
    fn customer_profile_rules() {
        let me = Actor::customer(5);
        assert!(authorize(&me, Action::Read, Resource::User { id: 5 }).is_ok());
        assert!(authorize(&me, Action::Update, Resource::User { id: 5 }).is_ok());
        assert!(authorize(&me, Action::Update, Resource::User { id: 6 }).is_err());
        assert!(authorize(&me, Action::Delete, Resource::User { id: 5 }).is_err());
        assert!(authorize(&me, Action::Update, Resource::UserRole).is_err());
    }
}
