use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// A rider heading to `destination`. Identity is the random id alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub id: Uuid,
    pub destination: i32,
}

impl Passenger {
    pub fn new(destination: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            destination,
        }
    }

    pub fn destination(&self) -> i32 {
        self.destination
    }
}

impl PartialEq for Passenger {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Passenger {}

impl Hash for Passenger {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Passenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Passenger {}", self.id)
    }
}
