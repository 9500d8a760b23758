//! Auth-domain identifiers, scope lists, token material, and persisted login records.

pub mod id;
pub mod login;
pub mod scope;
pub mod token;

pub use id::*;
pub use login::*;
pub use scope::*;
pub use token::{material::*, secret::*};
