//! Integration with the external user-profile system.

pub mod sync {
    pub use crate::sync::*;
}

pub mod webhook_models {
    pub use crate::webhook_models::*;
}
