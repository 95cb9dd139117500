use std::fmt;

use serde::{Deserialize, Serialize};
use ustr::Ustr;

macro_rules! feed_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Ustr);

        impl $name {
            pub fn new(id: &str) -> Self {
                $name(Ustr::from(id.trim()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                $name::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                $name::new(&id)
            }
        }
    };
}

feed_id!(RouteId);
feed_id!(StopId);
feed_id!(TripId);
feed_id!(ShapeId);
feed_id!(ServiceId);
