//! Resource operations shared by every entity family, and request validation.

mod resource;
mod validation;
pub use resource::ResourceService;
pub use validation::RequestValidator;
