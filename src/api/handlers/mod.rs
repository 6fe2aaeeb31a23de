// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod engagement;
pub mod feed;
pub mod health;
pub mod metrics;
pub mod posts;
