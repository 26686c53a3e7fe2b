//! Bearer-token validation.
//!
//! Tokens are issued elsewhere; this server only verifies them.

pub mod jwt;
