mod actor;
mod handle;
pub mod models;

pub use handle::ConfirmationHandle;
pub use models::ConfirmationEntry;
