//! Registration lookup built once per run

use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::warn;

use crate::types::{Registration, UserId, VisitId};

/// Registrations keyed by visit, plus the earliest registration of each user
///
/// Order user identities are resolved against this index: a visit with a registration
/// orders as the registered user, any other visit falls back to its own visit-level
/// identity.
#[derive(Debug, Clone, Default)]
pub struct RegistrationIndex {
    by_visit: HashMap<VisitId, Registration>,
    registered_at_by_user: HashMap<UserId, NaiveDateTime>,
}

impl RegistrationIndex {
    /// Index registrations; a second registration for the same visit is ignored
    pub fn build(registrations: &[Registration]) -> Self {
        let mut index = Self::default();
        for registration in registrations {
            if index.by_visit.contains_key(&registration.visit_id) {
                warn!(
                    visit_id = %registration.visit_id,
                    "Duplicate registration for visit, keeping the first one"
                );
                continue;
            }
            index
                .registered_at_by_user
                .entry(registration.user_id.clone())
                .and_modify(|at| *at = (*at).min(registration.registered_at))
                .or_insert(registration.registered_at);
            index.by_visit.insert(registration.visit_id.clone(), registration.clone());
        }
        index
    }

    /// Registration made during `visit_id`, if any
    pub fn for_visit(&self, visit_id: &VisitId) -> Option<&Registration> {
        self.by_visit.get(visit_id)
    }

    /// Earliest registration instant of `user_id`, if the user registered at all
    pub fn registered_at(&self, user_id: &UserId) -> Option<NaiveDateTime> {
        self.registered_at_by_user.get(user_id).copied()
    }

    /// Number of indexed registrations
    pub fn len(&self) -> usize {
        self.by_visit.len()
    }

    /// Whether the index holds no registrations
    pub fn is_empty(&self) -> bool {
        self.by_visit.is_empty()
    }
}
