/// Router Module Index
///
/// Routing is split by access level. Protection is applied with layers when the
/// routers are assembled in `create_router`, so an endpoint's access level can be
/// read off the module it lives in.

/// Routes open to anonymous clients: reads and the sign-up/sign-in gateway.
pub mod public;

/// Routes behind the `protect` layer. Role-restricted groups inside add an
/// `authorize` layer of their own.
pub mod authenticated;

/// Account management, restricted to the 'admin' role.
pub mod admin;
