//! Connection checks between movies: do they share a person?

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::engine::models::{Movie, Person, PersonId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonRole {
    Cast,
    Crew,
}

/// One shared person between two movies and the part they had on each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub person: Person,
    pub from_role: PersonRole,
    pub to_role: PersonRole,
}

impl Link {
    /// Human readable reason, e.g. `Actor: Al Pacino`.
    pub fn describe(&self) -> String {
        match self.from_role {
            PersonRole::Cast => format!("Actor: {}", self.person.name),
            PersonRole::Crew => format!("Crew: {}", self.person.name),
        }
    }
}

/// True iff `a` and `b` share at least one person (cast or crew) by id.
///
/// Linear in the combined credit count and symmetric in its arguments.
pub fn are_connected(a: &Movie, b: &Movie) -> bool {
    let (small, large) = if a.cast.len() + a.crew.len() <= b.cast.len() + b.crew.len() {
        (a, b)
    } else {
        (b, a)
    };
    let ids: HashSet<PersonId> = small.people().map(|p| p.id).collect();
    if ids.is_empty() {
        return false;
    }
    large.people().any(|p| ids.contains(&p.id))
}

/// Every person shared by `from` and `to`, in `from`'s credit order.
///
/// A person credited in both cast and crew of one movie is reported once,
/// with cast taking precedence.
pub fn shared_people(from: &Movie, to: &Movie) -> Vec<Link> {
    let mut to_roles: HashMap<PersonId, PersonRole> = HashMap::new();
    for p in &to.crew {
        to_roles.insert(p.id, PersonRole::Crew);
    }
    for p in &to.cast {
        to_roles.insert(p.id, PersonRole::Cast);
    }

    let from_credits = from
        .cast
        .iter()
        .map(|p| (p, PersonRole::Cast))
        .chain(from.crew.iter().map(|p| (p, PersonRole::Crew)));

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for (person, from_role) in from_credits {
        let Some(&to_role) = to_roles.get(&person.id) else {
            continue;
        };
        if seen.insert(person.id) {
            links.push(Link {
                person: person.clone(),
                from_role,
                to_role,
            });
        }
    }
    links
}
