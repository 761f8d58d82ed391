pub mod capture;
pub mod error;
pub mod extract;
pub mod gate;
pub mod handlers;
pub mod server;

pub use gate::AccessGate;
pub use server::{AdminState, build_admin_router, instrument};
