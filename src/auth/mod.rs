// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless token authentication for the back-office API.
//!
//! ## Auth Flow
//!
//! 1. Client signs in at `POST /users/sign_in` with email and password
//! 2. Server returns `{"access_token": <JWT>}` (HS256, valid 4 hours)
//! 3. Client sends the raw token in the `ACCESS-TOKEN` header
//! 4. The gate verifies the token, looks up the user by the `email` claim and
//!    attaches a [`CurrentUser`] to the request
//! 5. Handlers require identity with [`Auth`] or [`AdminOnly`]
//!
//! ## Security
//!
//! - Every authentication failure returns the same 401 body
//! - Zero clock-skew leeway on expiry
//! - No server-side sessions and no revocation

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod roles;
pub mod token;

pub use claims::{Claims, CurrentUser};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use middleware::{authenticate, ACCESS_TOKEN_HEADER};
pub use password::{PasswordError, PasswordHasher, DEFAULT_PASSWORD};
pub use roles::Role;
pub use token::{TokenError, TokenService};
