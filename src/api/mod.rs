// Thin namespace wrapper over the HTTP-facing handler modules
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod webhook_handler {
    pub use crate::webhook_handler::*;
}
