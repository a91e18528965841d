//! Feeds newline-delimited JSON room events into a [`Room`]
//!
//! Whatever transport carries the events is expected to hand them over as
//! one JSON object per line. Blank lines and `#` comments are skipped. A line
//! that fails to decode, or an event the room refuses, is logged and counted;
//! only an I/O error stops the replay.

use crate::room::Room;
use log::{debug, warn};
use shared::decode_event;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Tally of a finished replay
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
    pub malformed: usize,
}

pub async fn replay_events<R>(room: &mut Room, mut reader: R) -> std::io::Result<ReplaySummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = ReplaySummary::default();
    let mut buf = Vec::new();
    let mut line_number = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        line_number += 1;

        // Bytes that are not UTF-8 spoil only their own line
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!("Line {}: malformed event: {}", line_number, e);
                summary.malformed += 1;
                continue;
            }
        };
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event = match decode_event(line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Line {}: malformed event: {}", line_number, e);
                summary.malformed += 1;
                continue;
            }
        };

        match room.apply(event) {
            Ok(outcome) => {
                debug!("Line {}: {:?}", line_number, outcome);
                summary.applied += 1;
            }
            Err(e) => {
                warn!("Line {}: event rejected: {}", line_number, e);
                summary.rejected += 1;
            }
        }
    }

    Ok(summary)
}
