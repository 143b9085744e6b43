// Domain layer: routing policy, wire mapping, models, shared errors
pub mod dispatch {
    pub use crate::dispatch::*;
}

pub mod mapper {
    pub use crate::mapper::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
