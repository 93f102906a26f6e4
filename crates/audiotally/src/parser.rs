//! Tolerant parser for the Cubase/Nuendo clip-list XML placed on the
//! clipboard by a DAW "copy" action.
//!
//! The DAW is known to emit control bytes that are invalid in XML, so the
//! parser strips them before the structural pass. Per-region problems
//! (missing fields, unparseable or inverted boundaries) skip that region and
//! are counted; only document-level failures surface as [`ParseError`].

use std::borrow::Cow;

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use thiserror::Error;
use tracing::trace;

use crate::clip::ClipRecord;

/// Marker every clip-list document carries.
const XML_DECLARATION_MARKER: &str = "<?xml";

/// Element name holding one audio region.
const REGION_ELEMENT: &str = "region";

/// Vendor marker seen in clip lists that carry no region element name
/// in truncated clipboard reads.
const VST_XML_MARKER: &str = "vst-xml";

/// Placeholder when a region carries no usable filename text.
const UNKNOWN_FILENAME: &str = "Unknown";

/// Control characters invalid in XML; tab (0x09), LF (0x0A) and CR (0x0D)
/// are kept.
const CONTROL_BYTES: &str = r"[\x00-\x08\x0B\x0C\x0E-\x1F]";

/// Errors a parse can end in.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Content does not look like a clip-list document at all.
    ///
    /// Unrelated clipboard content (plain text, file lists) lands here and
    /// must cause no state change in the caller.
    #[error("clipboard content is not a clip-list document")]
    NotClipXml,

    /// Content passed the preliminary filter but is not well-formed XML.
    #[error("malformed clip-list XML: {0}")]
    Malformed(String),
}

/// Result type for parse operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Outcome of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClips {
    /// Regions that survived validation, in document order.
    pub clips: Vec<ClipRecord>,

    /// Number of regions dropped for missing fields, unparseable boundaries
    /// or non-positive length.
    pub skipped: usize,
}

/// Which region child the parser is currently reading text for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionField {
    Filename,
    Start,
    End,
}

impl RegionField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"filename" => Some(Self::Filename),
            b"start" => Some(Self::Start),
            b"end" => Some(Self::End),
            _ => None,
        }
    }
}

/// Accumulates the direct children of one open `region` element.
///
/// A field is `Some` once the child element was seen, even if it carried no
/// text; all three must be present for the region to count.
#[derive(Debug)]
struct RegionScope {
    depth: usize,
    filename: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

impl RegionScope {
    fn at(depth: usize) -> Self {
        Self {
            depth,
            filename: None,
            start: None,
            end: None,
        }
    }

    fn open(&mut self, field: RegionField) {
        let slot = self.slot(field);
        if slot.is_none() {
            *slot = Some(String::new());
        }
    }

    fn append_text(&mut self, field: RegionField, text: &str) {
        let slot = self.slot(field);
        match slot {
            Some(existing) => existing.push_str(text),
            None => *slot = Some(text.to_string()),
        }
    }

    fn slot(&mut self, field: RegionField) -> &mut Option<String> {
        match field {
            RegionField::Filename => &mut self.filename,
            RegionField::Start => &mut self.start,
            RegionField::End => &mut self.end,
        }
    }

    /// Validate the collected fields into a record.
    ///
    /// `None` means the region is skipped: a child element was missing, a
    /// boundary did not parse as a base-10 integer, or `end <= start`.
    fn into_record(self) -> Option<ClipRecord> {
        let filename_text = self.filename?;
        let start = self.start?.trim().parse::<u64>().ok()?;
        let end = self.end?.trim().parse::<u64>().ok()?;

        let filename = if filename_text.is_empty() {
            UNKNOWN_FILENAME.to_string()
        } else {
            // The DAW writes a full path; only the basename is of interest.
            match filename_text.rsplit('/').next() {
                Some(base) => base.to_string(),
                None => filename_text,
            }
        };

        ClipRecord::new(filename, start, end)
    }
}

/// Tolerant extractor of [`ClipRecord`]s from clip-list XML.
#[derive(Debug)]
pub struct ClipParser {
    control_bytes: Regex,
}

impl ClipParser {
    /// Create a new parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            control_bytes: Regex::new(CONTROL_BYTES).expect("control byte class is valid"),
        }
    }

    /// Quick string-level check that avoids structural parsing of unrelated
    /// clipboard content (plain text, images-as-text, file lists).
    ///
    /// Lenient on purpose: truncated clipboard reads may lack the region
    /// element name but still carry the vendor marker.
    #[must_use]
    pub fn looks_like_clip_xml(raw: &str) -> bool {
        raw.contains(XML_DECLARATION_MARKER)
            && (raw.contains(REGION_ELEMENT) || raw.contains(VST_XML_MARKER))
    }

    /// Strip control bytes that are invalid in XML, preserving tab, LF and CR.
    #[must_use]
    pub fn sanitize<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        self.control_bytes.replace_all(raw, "")
    }

    /// Parse clipboard text into clip records.
    ///
    /// Locates every element named `region` at any depth and collects its
    /// direct `filename`/`start`/`end` children. Unknown siblings, attributes
    /// and namespaces are ignored. Invalid regions are skipped, not errors.
    ///
    /// # Errors
    ///
    /// [`ParseError::NotClipXml`] if the content fails the preliminary
    /// filter, [`ParseError::Malformed`] if it is not well-formed XML.
    pub fn parse(&self, raw: &str) -> Result<ParsedClips> {
        if !Self::looks_like_clip_xml(raw) {
            return Err(ParseError::NotClipXml);
        }

        let sanitized = self.sanitize(raw);
        self.extract_regions(&sanitized)
    }

    fn extract_regions(&self, xml: &str) -> Result<ParsedClips> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut clips = Vec::new();
        let mut skipped = 0usize;
        let mut scopes: Vec<RegionScope> = Vec::new();
        let mut target: Option<RegionField> = None;
        let mut depth = 0usize;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    depth += 1;
                    target = None;
                    let name = e.local_name();
                    if name.as_ref() == REGION_ELEMENT.as_bytes() {
                        scopes.push(RegionScope::at(depth));
                    } else if let Some(scope) = scopes.last_mut() {
                        if depth == scope.depth + 1 {
                            if let Some(field) = RegionField::from_name(name.as_ref()) {
                                scope.open(field);
                                target = Some(field);
                            }
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let name = e.local_name();
                    if name.as_ref() == REGION_ELEMENT.as_bytes() {
                        // A childless region can never satisfy the contract.
                        trace!("skipping empty region");
                        skipped += 1;
                    } else if let Some(scope) = scopes.last_mut() {
                        // Self-closing child: element present, no text.
                        if depth == scope.depth {
                            if let Some(field) = RegionField::from_name(name.as_ref()) {
                                scope.open(field);
                            }
                        }
                    }
                }
                Ok(Event::Text(t)) => {
                    if let (Some(field), Some(scope)) = (target, scopes.last_mut()) {
                        let text = t
                            .unescape()
                            .map_err(|e| ParseError::Malformed(e.to_string()))?;
                        scope.append_text(field, &text);
                    }
                }
                Ok(Event::CData(t)) => {
                    if let (Some(field), Some(scope)) = (target, scopes.last_mut()) {
                        let bytes = t.into_inner();
                        scope.append_text(field, &String::from_utf8_lossy(&bytes));
                    }
                }
                Ok(Event::End(_)) => {
                    target = None;
                    if scopes.last().is_some_and(|s| s.depth == depth) {
                        if let Some(scope) = scopes.pop() {
                            match scope.into_record() {
                                Some(clip) => clips.push(clip),
                                None => {
                                    trace!("skipping invalid region");
                                    skipped += 1;
                                }
                            }
                        }
                    }
                    depth = depth.saturating_sub(1);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(ParseError::Malformed(e.to_string())),
            }
        }

        Ok(ParsedClips { clips, skipped })
    }
}

impl Default for ClipParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_list(regions: &str) -> String {
        format!(r#"<?xml version="1.0" encoding="utf-8"?><vst-xml><events>{regions}</events></vst-xml>"#)
    }

    fn region(filename: &str, start: &str, end: &str) -> String {
        format!(
            "<region><filename>{filename}</filename><start>{start}</start><end>{end}</end></region>"
        )
    }

    #[test]
    fn test_parse_extracts_regions() {
        let xml = clip_list(&format!(
            "{}{}",
            region("/audio/pool/kick.wav", "1000", "49000"),
            region("/audio/pool/snare.wav", "0", "24000"),
        ));
        let parsed = ClipParser::new().parse(&xml).unwrap();

        assert_eq!(parsed.clips.len(), 2);
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.clips[0].filename, "kick.wav");
        assert_eq!(parsed.clips[0].duration_samples, 48000);
        assert_eq!(parsed.clips[1].filename, "snare.wav");
        assert_eq!(parsed.clips[1].duration_samples, 24000);
    }

    #[test]
    fn test_plain_text_is_not_clip_xml() {
        let result = ClipParser::new().parse("just some copied text");
        assert!(matches!(result, Err(ParseError::NotClipXml)));
    }

    #[test]
    fn test_region_word_without_declaration_is_not_clip_xml() {
        let result = ClipParser::new().parse("a note about the chorus region");
        assert!(matches!(result, Err(ParseError::NotClipXml)));
    }

    #[test]
    fn test_truncated_document_is_malformed() {
        let xml = r#"<?xml version="1.0"?><vst-xml><region><filename>a.wav</filename><start>0</start><en"#;
        let result = ClipParser::new().parse(xml);
        assert!(matches!(result, Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_zero_length_region_dropped() {
        let xml = clip_list(&region("/a.wav", "1000", "1000"));
        let parsed = ClipParser::new().parse(&xml).unwrap();
        assert!(parsed.clips.is_empty());
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_inverted_region_dropped() {
        let xml = clip_list(&region("/a.wav", "2000", "1000"));
        let parsed = ClipParser::new().parse(&xml).unwrap();
        assert!(parsed.clips.is_empty());
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_region_missing_end_skipped() {
        let xml = clip_list("<region><filename>/a.wav</filename><start>0</start></region>");
        let parsed = ClipParser::new().parse(&xml).unwrap();
        assert!(parsed.clips.is_empty());
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_non_numeric_boundary_skips_only_that_region() {
        let xml = clip_list(&format!(
            "{}{}",
            region("/a.wav", "zero", "100"),
            region("/b.wav", "0", "100"),
        ));
        let parsed = ClipParser::new().parse(&xml).unwrap();
        assert_eq!(parsed.clips.len(), 1);
        assert_eq!(parsed.clips[0].filename, "b.wav");
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_empty_filename_uses_placeholder() {
        let xml = clip_list("<region><filename/><start>0</start><end>100</end></region>");
        let parsed = ClipParser::new().parse(&xml).unwrap();
        assert_eq!(parsed.clips.len(), 1);
        assert_eq!(parsed.clips[0].filename, "Unknown");
    }

    #[test]
    fn test_filename_without_path_kept_whole() {
        let xml = clip_list(&region("loop.wav", "0", "100"));
        let parsed = ClipParser::new().parse(&xml).unwrap();
        assert_eq!(parsed.clips[0].filename, "loop.wav");
    }

    #[test]
    fn test_control_byte_in_filename_stripped() {
        let xml = clip_list(&region("/pool/ki\u{2}ck.wav", "0", "100"));
        let parsed = ClipParser::new().parse(&xml).unwrap();
        assert_eq!(parsed.clips[0].filename, "kick.wav");
    }

    #[test]
    fn test_sanitize_preserves_tab_lf_cr() {
        let parser = ClipParser::new();
        let input = "a\tb\nc\rd\u{1}e";
        assert_eq!(parser.sanitize(input), "a\tb\nc\rde");
    }

    #[test]
    fn test_unknown_siblings_ignored() {
        let xml = clip_list(
            "<region><color>red</color><filename>/a.wav</filename><muted>0</muted>\
             <start>0</start><end>100</end></region>",
        );
        let parsed = ClipParser::new().parse(&xml).unwrap();
        assert_eq!(parsed.clips.len(), 1);
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn test_regions_found_at_any_depth() {
        let xml = format!(
            r#"<?xml version="1.0"?><vst-xml><track><lane>{}</lane></track>{}</vst-xml>"#,
            region("/deep.wav", "0", "10"),
            region("/shallow.wav", "0", "20"),
        );
        let parsed = ClipParser::new().parse(&xml).unwrap();
        assert_eq!(parsed.clips.len(), 2);
        assert_eq!(parsed.clips[0].filename, "deep.wav");
        assert_eq!(parsed.clips[1].filename, "shallow.wav");
    }

    #[test]
    fn test_grandchild_text_not_taken_as_boundary() {
        // A nested element inside `start` means its text is not a direct value.
        let xml = clip_list(
            "<region><filename>/a.wav</filename><start><offset>5</offset></start>\
             <end>100</end></region>",
        );
        let parsed = ClipParser::new().parse(&xml).unwrap();
        assert!(parsed.clips.is_empty());
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_looks_like_clip_xml() {
        assert!(ClipParser::looks_like_clip_xml(
            r#"<?xml version="1.0"?><region/>"#
        ));
        assert!(ClipParser::looks_like_clip_xml(
            r#"<?xml version="1.0"?><vst-xml/>"#
        ));
        assert!(!ClipParser::looks_like_clip_xml(
            r#"<?xml version="1.0"?><html/>"#
        ));
        assert!(!ClipParser::looks_like_clip_xml("region vst-xml"));
    }
}
