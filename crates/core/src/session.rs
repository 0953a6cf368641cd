// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier for a PTY session (C2).

use crate::define_id;

define_id!(PtySessionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_id_round_trips_through_display() {
        let id = PtySessionId::new("11111111-1111-1111-1111-111111111111");
        assert_eq!(id.to_string(), "11111111-1111-1111-1111-111111111111");
    }
}
