mod acl;

pub use acl::{bearer_token, AclMiddlewareFactory, AclMiddlewareService};
