// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod bootstrap;
mod feature_gate;
mod memberships;
mod mutations;
mod properties;
mod reads;
mod shutdown;
mod support;
