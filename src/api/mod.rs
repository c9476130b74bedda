// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// HTTP surface: chat page, static assets, chat and health endpoints
pub mod errors;
pub mod handlers;
pub mod server;

pub use errors::{ApiError, ErrorResponse};
pub use handlers::{chat_handler, health_handler, index_handler, HealthResponse};
pub use server::{create_app, serve, AppState};
