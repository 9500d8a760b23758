//! Token secrets and the material issued by the token endpoint.

pub mod material;
pub mod secret;
