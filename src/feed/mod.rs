// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod aggregator;
pub mod engine;
pub mod ordering;
pub mod trending_cache;

pub use aggregator::Aggregator;
pub use engine::FeedQueryEngine;
pub use ordering::{Page, PostFilter, PostOrder, PostQuery};
pub use trending_cache::{trending_key, MemoryTrendingCache, TrendingCache};
