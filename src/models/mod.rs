// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod event;
pub mod profile;

pub use event::{Event, EventInput};
pub use profile::{Role, UserProfile};
