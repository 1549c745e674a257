//! Logical offset arithmetic over segment buffers
//!
//! All caret and selection math in the composer runs against logical
//! offsets over the segment list, never against a raw character array.
//! Offsets count grapheme clusters; a mention segment contributes its
//! display name length plus one for the leading `@` and is indivisible:
//! range operations either keep a token whole or remove it whole.

use unicode_segmentation::UnicodeSegmentation;

use crate::markup::Segment;

/// Grapheme-cluster length of a string.
pub fn grapheme_len(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Substring by grapheme indices, clamped to the string bounds.
pub fn slice_graphemes(s: &str, start: usize, end: usize) -> String {
    s.graphemes(true)
        .skip(start)
        .take(end.saturating_sub(start))
        .collect()
}

/// Logical (display) width of one segment.
pub fn seg_len(segment: &Segment) -> usize {
    match segment {
        Segment::Text(value) => grapheme_len(value),
        // +1 for the leading '@' in the display form
        Segment::Mention(token) => grapheme_len(&token.display_name) + 1,
    }
}

/// Total logical length of a buffer.
pub fn logical_len(segments: &[Segment]) -> usize {
    segments.iter().map(seg_len).sum()
}

/// Display text of a buffer: plain text verbatim, mentions as `@Name`.
pub fn display_text(segments: &[Segment]) -> String {
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Text(value) => out.push_str(value),
            Segment::Mention(token) => {
                out.push('@');
                out.push_str(&token.display_name);
            }
        }
    }
    out
}

/// Clamp a caret offset to the buffer bounds.
pub fn clamp_offset(segments: &[Segment], offset: usize) -> usize {
    offset.min(logical_len(segments))
}

/// Logical `[start, end)` spans of every mention segment, in order.
pub fn mention_spans(segments: &[Segment]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut pos = 0;
    for seg in segments {
        let len = seg_len(seg);
        if seg.is_mention() {
            spans.push((pos, pos + len));
        }
        pos += len;
    }
    spans
}

/// Span of the mention whose logical end equals `offset`, if any.
pub fn mention_ending_at(segments: &[Segment], offset: usize) -> Option<(usize, usize)> {
    mention_spans(segments)
        .into_iter()
        .find(|&(_, end)| end == offset)
}

/// Span of the mention whose logical start equals `offset`, if any.
pub fn mention_starting_at(segments: &[Segment], offset: usize) -> Option<(usize, usize)> {
    mention_spans(segments)
        .into_iter()
        .find(|&(start, _)| start == offset)
}

/// Remove the logical range `[start, end)` from a buffer.
///
/// Text segments are trimmed at grapheme granularity; a mention segment
/// overlapping the range at all is removed whole. Out-of-range bounds
/// clamp instead of erroring.
pub fn remove_range(segments: &[Segment], start: usize, end: usize) -> Vec<Segment> {
    let total = logical_len(segments);
    let start = start.min(total);
    let end = end.clamp(start, total);
    if start == end {
        return segments.to_vec();
    }

    let mut out = Vec::new();
    let mut pos = 0;
    for seg in segments {
        let len = seg_len(seg);
        let seg_start = pos;
        let seg_end = pos + len;
        pos = seg_end;

        if seg_end <= start || seg_start >= end {
            out.push(seg.clone());
            continue;
        }

        match seg {
            // Atomicity: any overlap removes the whole token.
            Segment::Mention(_) => {}
            Segment::Text(value) => {
                let cut_start = start.saturating_sub(seg_start);
                let cut_end = (end - seg_start).min(len);
                let mut kept = slice_graphemes(value, 0, cut_start);
                kept.push_str(&slice_graphemes(value, cut_end, len));
                if !kept.is_empty() {
                    out.push(Segment::Text(kept));
                }
            }
        }
    }
    out
}

/// Insert segments at a logical offset, splitting a text segment when the
/// offset falls inside one. An offset inside a mention token cannot split
/// it; the insertion lands after the token.
pub fn insert_at(segments: &[Segment], offset: usize, inserted: Vec<Segment>) -> Vec<Segment> {
    let offset = clamp_offset(segments, offset);
    let mut out = Vec::new();
    let mut pos = 0;
    let mut placed = false;

    for seg in segments {
        let len = seg_len(seg);

        if !placed && offset == pos {
            out.extend(inserted.iter().cloned());
            placed = true;
        }

        if !placed && offset > pos && offset < pos + len {
            match seg {
                Segment::Text(value) => {
                    let head = slice_graphemes(value, 0, offset - pos);
                    let tail = slice_graphemes(value, offset - pos, len);
                    if !head.is_empty() {
                        out.push(Segment::Text(head));
                    }
                    out.extend(inserted.iter().cloned());
                    if !tail.is_empty() {
                        out.push(Segment::Text(tail));
                    }
                }
                Segment::Mention(_) => {
                    out.push(seg.clone());
                    out.extend(inserted.iter().cloned());
                }
            }
            placed = true;
            pos += len;
            continue;
        }

        out.push(seg.clone());
        pos += len;
    }

    if !placed {
        out.extend(inserted);
    }
    out
}

/// Drop empty text segments and merge adjacent text segments.
pub fn normalize(segments: Vec<Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    for seg in segments {
        match seg {
            Segment::Text(value) if value.is_empty() => {}
            Segment::Text(value) => {
                if let Some(Segment::Text(prev)) = out.last_mut() {
                    prev.push_str(&value);
                } else {
                    out.push(Segment::Text(value));
                }
            }
            mention => out.push(mention),
        }
    }
    out
}

// ==================== TESTS ====================
