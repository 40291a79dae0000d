// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// Usage errors: calls that break an invariant the caller was responsible for.
///
/// Unknown or already-unregistered view handles are *not* errors; updates and
/// unregistrations for them are silently ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewabilityError {
    /// A [`ViewTracker`](crate::ViewTracker) was used before `mount` or after `unmount`.
    NotMounted,
    /// A tracker or measurement ticket was handed to a coordinator other than
    /// the one it belongs to.
    ForeignCoordinator,
}

impl fmt::Display for ViewabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotMounted => f.write_str("view tracker is not mounted in a coordinator"),
            Self::ForeignCoordinator => {
                f.write_str("handle belongs to a different viewability coordinator")
            }
        }
    }
}

impl core::error::Error for ViewabilityError {}
