// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod notification;
pub mod password;
pub mod sweeper;
pub mod tasks;
pub mod users;

pub use notification::{EmailNotification, EmailNotifier};
pub use tasks::TasksService;
pub use users::LookupError;
