pub mod activation;
pub mod identity;
pub mod registrar;

pub use activation::{ActivatedContext, ActivationManager, ActivationState};
pub use identity::IdentityResolver;
pub use registrar::ComponentRegistrar;
