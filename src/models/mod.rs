// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod athlete;
pub mod summit;
pub mod webhook;

pub use activity::{Activity, ActivityUpdate, Coordinates, Discipline};
pub use athlete::{Athlete, StoredToken};
pub use summit::{Summit, SummitDiscipline, SummitTotal};
pub use webhook::WebhookEvent;
