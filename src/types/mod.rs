// ABOUTME: Validated identity types for monitored workloads.
// ABOUTME: Names, namespaces, and kinds are checked once at the boundary.

mod kind;
mod namespace;
mod resource_id;
mod resource_name;

pub use kind::{ParseResourceKindError, ResourceKind};
pub use namespace::{Namespace, NamespaceError};
pub use resource_id::{ParseResourceIdError, ResourceId};
pub use resource_name::{ResourceName, ResourceNameError};
