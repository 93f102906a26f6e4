//! Clipboard change detection and the single-slot parse cache.
//!
//! The watcher is stateless between polls except for its last-seen content
//! hash and the memoized result of the last parse. It never touches the
//! clipboard itself; each tick the owner hands it whatever the clipboard
//! read produced.

use tracing::{debug, trace};

use crate::clip::{ClipRecord, ClipboardSnapshot};
use crate::parser::{ClipParser, ParseError};

/// Outcome of a single poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Input was absent, unreadable or unrelated clipboard content.
    ///
    /// No cached state was touched; the caller changes nothing.
    Ignored,

    /// Content hash matches the previous tick; the parser was not re-invoked.
    Unchanged {
        /// The memoized clips from the last successful parse, if any.
        /// `Some` but empty means the last parse found no valid region.
        cached_clips: Option<Vec<ClipRecord>>,
    },

    /// New clip-list content with at least one valid region.
    Detected {
        /// The extracted clips in document order.
        clips: Vec<ClipRecord>,

        /// The raw clipboard text, kept for verbatim restoration.
        raw: String,
    },

    /// New content that failed structural parsing or yielded no valid region.
    ///
    /// The caller resets its display to ready.
    Invalid,
}

/// Single-slot memo of the last parse, keyed by content hash.
#[derive(Debug, Default)]
struct ParseCache {
    last_hash: Option<String>,
    last_raw: Option<String>,
    last_clips: Option<Vec<ClipRecord>>,
}

/// Watches clipboard content for clip-list changes.
#[derive(Debug)]
pub struct ClipboardWatcher {
    parser: ClipParser,
    cache: ParseCache,
}

impl ClipboardWatcher {
    /// Create a new watcher with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parser: ClipParser::new(),
            cache: ParseCache::default(),
        }
    }

    /// The raw text of the last detected clip list, for restoration.
    #[must_use]
    pub fn captured_raw(&self) -> Option<&str> {
        self.cache.last_raw.as_deref()
    }

    /// Process one clipboard observation.
    ///
    /// `None` input means the clipboard was unreadable this tick; that must
    /// not evict the cache, so it reports [`PollOutcome::Ignored`].
    pub fn poll(&mut self, raw: Option<String>) -> PollOutcome {
        let Some(raw) = raw else {
            trace!("clipboard unreadable this tick, cache retained");
            return PollOutcome::Ignored;
        };

        // Quick-reject before hashing so unrelated copies (plain text,
        // files) never disturb state.
        if !ClipParser::looks_like_clip_xml(&raw) {
            trace!("clipboard content is not a clip list, ignoring");
            return PollOutcome::Ignored;
        }

        let snapshot = ClipboardSnapshot::new(raw);
        if self
            .cache
            .last_hash
            .as_deref()
            .is_some_and(|h| snapshot.matches_hash(h))
        {
            trace!("clipboard content unchanged, memo hit");
            return PollOutcome::Unchanged {
                cached_clips: self.cache.last_clips.clone(),
            };
        }

        debug!(
            hash = %snapshot.content_hash,
            len = snapshot.content_len(),
            "new clip-list content detected"
        );
        self.cache.last_hash = Some(snapshot.content_hash.clone());

        match self.parser.parse(&snapshot.raw_content) {
            Ok(parsed) if !parsed.clips.is_empty() => {
                if parsed.skipped > 0 {
                    debug!(skipped = parsed.skipped, "dropped invalid regions");
                }
                self.cache.last_raw = Some(snapshot.raw_content.clone());
                self.cache.last_clips = Some(parsed.clips.clone());
                PollOutcome::Detected {
                    clips: parsed.clips,
                    raw: snapshot.raw_content,
                }
            }
            Ok(parsed) => {
                debug!(skipped = parsed.skipped, "clip list parsed but no region survived");
                self.cache.last_raw = Some(snapshot.raw_content);
                self.cache.last_clips = Some(Vec::new());
                PollOutcome::Invalid
            }
            // The preliminary filter already passed, so this arm is only
            // reachable if the markers sit inside non-XML noise.
            Err(ParseError::NotClipXml) => PollOutcome::Ignored,
            Err(err @ ParseError::Malformed(_)) => {
                debug!(error = %err, "clipboard XML failed structural parsing");
                self.cache.last_raw = None;
                self.cache.last_clips = None;
                PollOutcome::Invalid
            }
        }
    }
}

impl Default for ClipboardWatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_xml(start: u64, end: u64) -> String {
        format!(
            r#"<?xml version="1.0"?><vst-xml><region><filename>/pool/a.wav</filename><start>{start}</start><end>{end}</end></region></vst-xml>"#
        )
    }

    #[test]
    fn test_poll_none_is_ignored() {
        let mut watcher = ClipboardWatcher::new();
        assert_eq!(watcher.poll(None), PollOutcome::Ignored);
    }

    #[test]
    fn test_poll_plain_text_is_ignored() {
        let mut watcher = ClipboardWatcher::new();
        assert_eq!(
            watcher.poll(Some("some unrelated copy".to_string())),
            PollOutcome::Ignored
        );
    }

    #[test]
    fn test_poll_detects_new_content() {
        let mut watcher = ClipboardWatcher::new();
        let xml = clip_xml(0, 48000);

        match watcher.poll(Some(xml.clone())) {
            PollOutcome::Detected { clips, raw } => {
                assert_eq!(clips.len(), 1);
                assert_eq!(clips[0].duration_samples, 48000);
                assert_eq!(raw, xml);
            }
            other => panic!("expected Detected, got {other:?}"),
        }
    }

    #[test]
    fn test_repoll_identical_content_is_memo_hit() {
        let mut watcher = ClipboardWatcher::new();
        let xml = clip_xml(0, 48000);

        assert!(matches!(
            watcher.poll(Some(xml.clone())),
            PollOutcome::Detected { .. }
        ));

        match watcher.poll(Some(xml)) {
            PollOutcome::Unchanged { cached_clips } => {
                let clips = cached_clips.expect("cache should hold the last parse");
                assert_eq!(clips.len(), 1);
            }
            other => panic!("expected Unchanged, got {other:?}"),
        }
    }

    #[test]
    fn test_changed_content_reparses() {
        let mut watcher = ClipboardWatcher::new();
        assert!(matches!(
            watcher.poll(Some(clip_xml(0, 48000))),
            PollOutcome::Detected { .. }
        ));

        match watcher.poll(Some(clip_xml(0, 96000))) {
            PollOutcome::Detected { clips, .. } => {
                assert_eq!(clips[0].duration_samples, 96000);
            }
            other => panic!("expected Detected, got {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_tick_retains_cache() {
        let mut watcher = ClipboardWatcher::new();
        let xml = clip_xml(0, 48000);
        assert!(matches!(
            watcher.poll(Some(xml.clone())),
            PollOutcome::Detected { .. }
        ));

        // A transient read failure...
        assert_eq!(watcher.poll(None), PollOutcome::Ignored);

        // ...must not evict the hash or the memoized clips.
        match watcher.poll(Some(xml)) {
            PollOutcome::Unchanged { cached_clips } => {
                assert!(cached_clips.is_some());
            }
            other => panic!("expected Unchanged, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_content_is_invalid_and_clears_cache() {
        let mut watcher = ClipboardWatcher::new();
        assert!(matches!(
            watcher.poll(Some(clip_xml(0, 48000))),
            PollOutcome::Detected { .. }
        ));

        let truncated = r#"<?xml version="1.0"?><vst-xml><region><filena"#.to_string();
        assert_eq!(watcher.poll(Some(truncated.clone())), PollOutcome::Invalid);
        assert!(watcher.captured_raw().is_none());

        // Re-polling the same bad payload is a memo hit with no clips.
        match watcher.poll(Some(truncated)) {
            PollOutcome::Unchanged { cached_clips } => assert!(cached_clips.is_none()),
            other => panic!("expected Unchanged, got {other:?}"),
        }
    }

    #[test]
    fn test_all_regions_invalid_is_invalid() {
        let mut watcher = ClipboardWatcher::new();
        let xml = clip_xml(1000, 1000);
        assert_eq!(watcher.poll(Some(xml)), PollOutcome::Invalid);
    }

    #[test]
    fn test_captured_raw_follows_last_detection() {
        let mut watcher = ClipboardWatcher::new();
        assert!(watcher.captured_raw().is_none());

        let xml = clip_xml(0, 48000);
        watcher.poll(Some(xml.clone()));
        assert_eq!(watcher.captured_raw(), Some(xml.as_str()));
    }
}
