/// Router Module Index
///
/// Organizes routing into security-segregated modules so access control is
/// applied explicitly at the module level (via axum layers), never by
/// accident of handler placement.

/// Routes accessible to all clients (anonymous, read-only, plus login).
/// Sensitive fields are masked at the handler level before data leaves.
pub mod public;

/// Routes protected by the session middleware: all mutating endpoints.
/// Role requirements beyond "has a session" are enforced in the handlers.
pub mod authenticated;

/// Routes restricted to the ADMIN role (audit review, dashboard counters).
pub mod admin;
