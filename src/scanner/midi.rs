//! Standard MIDI File header probing.
//!
//! Only the header and meta events are looked at; note content never
//! influences where a roll is filed.

use std::path::Path;

use midly::{Format, MetaMessage, Smf, Timing, TrackEventKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MidiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid MIDI data: {0}")]
    Parse(#[from] midly::Error),
}

/// Header facts about one file.
#[derive(Debug, Clone, PartialEq)]
pub struct MidiHeader {
    pub format: &'static str,
    pub timing: String,
    pub track_count: usize,
}

/// Per-track summary for `inspect`.
#[derive(Debug, Clone)]
pub struct TrackSummary {
    pub name: Option<String>,
    pub events: usize,
    pub meta: Vec<String>,
}

fn format_name(format: Format) -> &'static str {
    match format {
        Format::SingleTrack => "single-track",
        Format::Parallel => "parallel",
        Format::Sequential => "sequential",
    }
}

fn timing_text(timing: Timing) -> String {
    match timing {
        Timing::Metrical(tpb) => format!("{} ticks/beat", tpb.as_int()),
        Timing::Timecode(fps, sub) => format!("{} fps, {} subframes", fps.as_f32(), sub),
    }
}

/// Parse just enough of a file to confirm it's a Standard MIDI File.
pub fn probe(path: &Path) -> std::result::Result<MidiHeader, MidiError> {
    let data = std::fs::read(path)?;
    let (header, tracks) = midly::parse(&data)?;
    Ok(MidiHeader {
        format: format_name(header.format),
        timing: timing_text(header.timing),
        track_count: tracks.count(),
    })
}

/// Full header plus meta messages of every track.
pub fn inspect(path: &Path) -> std::result::Result<(MidiHeader, Vec<TrackSummary>), MidiError> {
    let data = std::fs::read(path)?;
    let smf = Smf::parse(&data)?;

    let header = MidiHeader {
        format: format_name(smf.header.format),
        timing: timing_text(smf.header.timing),
        track_count: smf.tracks.len(),
    };

    let tracks = smf
        .tracks
        .iter()
        .map(|track| {
            let mut name = None;
            let mut meta = Vec::new();
            for event in track {
                if let TrackEventKind::Meta(msg) = event.kind {
                    if let MetaMessage::TrackName(raw) = msg {
                        name.get_or_insert_with(|| String::from_utf8_lossy(raw).into_owned());
                    }
                    meta.push(format!("{:?} @ +{}", msg, event.delta.as_int()));
                }
            }
            TrackSummary {
                name,
                events: track.len(),
                meta,
            }
        })
        .collect();

    Ok((header, tracks))
}
