//! User profiles.
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/users/me` | Get profile, created from token claims on first access |
//! | PUT | `/api/users/me` | Update name, email, neighborhood and notification preferences |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
