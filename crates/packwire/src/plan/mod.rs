// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field classification and layout planning.

pub mod classifier;
pub mod layout;

pub use classifier::{classify, FieldKind};
pub use layout::{EncodingPlan, PlanMode, Run};
