// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Loan Admin Server - Loan Application Back-Office API
//!
//! Back-office API for loan applications, with stateless access tokens and
//! the applicant SSN encrypted at rest.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Access tokens, the authentication gate, roles and passwords
//! - `bootstrap` - Seed admin and SSN migration run at startup
//! - `crypto` - Field-level encryption
//! - `providers` - Decision engine and location service clients
//! - `storage` - Embedded database (redb) and repositories

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod providers;
pub mod state;
pub mod storage;
pub mod telemetry;
