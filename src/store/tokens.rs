// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Request tokens for discarding superseded responses

use std::sync::atomic::{AtomicU64, Ordering};

/// Kind of network-backed store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestKind {
    Initialize,
    Select,
    Page,
    Background,
}

impl RequestKind {
    fn index(self) -> usize {
        match self {
            Self::Initialize => 0,
            Self::Select => 1,
            Self::Page => 2,
            Self::Background => 3,
        }
    }
}

/// Token handed out when a request starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RequestToken {
    kind: RequestKind,
    value: u64,
}

/// Monotonic counters, one per request kind
#[derive(Debug, Default)]
pub(crate) struct RequestTokens {
    counters: [AtomicU64; 4],
}

impl RequestTokens {
    pub(crate) fn issue(&self, kind: RequestKind) -> RequestToken {
        let value = self.counters[kind.index()].fetch_add(1, Ordering::SeqCst) + 1;
        RequestToken { kind, value }
    }

    /// True while no newer token of the same kind has been issued
    pub(crate) fn is_latest(&self, token: RequestToken) -> bool {
        self.counters[token.kind.index()].load(Ordering::SeqCst) == token.value
    }
}
