//! `${name}` placeholder resolution over layered variable scopes plus
//! per-invocation runtime values.
mod resolve;
mod runtime;
mod scope;


pub use resolve::{has_unterminated_reference, resolve};
pub use runtime::RuntimeContext;
pub use scope::VariableScope;
