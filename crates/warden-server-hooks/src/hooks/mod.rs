// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Standard hooks, listed in the order a chain should run them.

pub mod shutdown;
pub mod soft_delete;
pub mod system_owned;
pub mod tenant;
pub mod usage;

pub use shutdown::ShutdownCheck;
pub use soft_delete::SoftDelete;
pub use system_owned::SystemOwned;
pub use tenant::TenantStamp;
pub use usage::UsageCount;
