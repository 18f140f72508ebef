// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable durations for console lines and failure messages.

use std::time::Duration;

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Render a duration with at most its two most significant units:
/// `"250ms"`, `"45s"`, `"1m10s"`, `"2h"`, `"1d3h"`.
///
/// Below one second the milliseconds are shown, since report intervals and
/// test timeouts are often fractions of a second.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs == 0 {
        return format!("{}ms", d.as_millis());
    }
    let mut out = String::new();
    let mut rest = secs;
    let mut shown = 0;
    for (size, suffix) in UNITS {
        let n = rest / size;
        rest %= size;
        if n > 0 {
            out.push_str(&format!("{}{}", n, suffix));
            shown += 1;
        } else if shown > 0 {
            // a gap ends the rendering: "1h" rather than "1h0m"
            break;
        }
        if shown == 2 {
            break;
        }
    }
    out
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
