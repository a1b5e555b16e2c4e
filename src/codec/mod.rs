//! JSON persistence for styled notes.
//!
//! A note is stored as one flat object: the plain text plus one array per
//! span category. Decoding is lenient: a category that is missing or
//! malformed is skipped on its own, and an image whose source cannot be
//! opened is dropped while its placeholder stays in the text.

mod wire;

pub use wire::{
    ALIGNMENT_SPANS, BACKGROUND_SPANS, BOLD_SPANS, FOREGROUND_SPANS, IMAGE_SPANS, ITALIC_SPANS,
    TEXT, UNDERLINE_SPANS,
};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::image::{DisplayTarget, ImageHandle, ImageLoader};
use crate::styled::{Alignment, Color, Span, SpanKind, StyledText, Utf16Text};
use wire::{AlignmentEntry, ColorEntry, ImageEntry, RangeEntry, WireRange};

/// Why a note could not be decoded at all.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("note is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error("note JSON is not an object")]
    NotAnObject,
    #[error("note JSON has no \"text\" string")]
    MissingText,
}

/// An image span that resolved, with the size to draw it at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedImage {
    /// UTF-16 offset of the placeholder
    pub start: usize,
    pub source: String,
    /// Intrinsic size reported by the loader
    pub handle: ImageHandle,
    /// Display size on the requested target, `(width, height)`
    pub bounds: (u32, u32),
}

/// Result of [`decode_with_images`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedNote {
    pub text: StyledText,
    /// Kept image spans, in the order they were stored.
    pub images: Vec<PlacedImage>,
}

/// Serialize a styled text to its persisted JSON form.
pub fn encode(styled: &StyledText) -> String {
    to_value(styled).to_string()
}

/// Like [`encode`], indented for humans.
pub fn encode_pretty(styled: &StyledText) -> String {
    format!("{:#}", to_value(styled))
}

/// Build the persisted JSON object.
///
/// Keys come out in wire order. `underlineSpans` is only written when the
/// text has underlines, so older readers see the shape they expect.
pub fn to_value(styled: &StyledText) -> Value {
    let mut foreground = Vec::new();
    let mut background = Vec::new();
    let mut alignment = Vec::new();
    let mut images = Vec::new();
    let mut bold = Vec::new();
    let mut italic = Vec::new();
    let mut underline = Vec::new();

    for span in styled.spans() {
        let (start, end) = (span.start, span.end);
        match &span.kind {
            SpanKind::Foreground(color) => {
                foreground.push(json!({ "color": color.to_wire(), "start": start, "end": end }));
            }
            SpanKind::Background(color) => {
                background.push(json!({ "color": color.to_wire(), "start": start, "end": end }));
            }
            SpanKind::Alignment(value) => {
                alignment
                    .push(json!({ "alignment": value.gravity(), "start": start, "end": end }));
            }
            SpanKind::Image { source } => {
                images.push(json!({ "uri": source, "start": start, "end": end }));
            }
            SpanKind::Bold => bold.push(json!({ "start": start, "end": end })),
            SpanKind::Italic => italic.push(json!({ "start": start, "end": end })),
            SpanKind::Underline => underline.push(json!({ "start": start, "end": end })),
        }
    }

    let mut doc = Map::new();
    doc.insert(TEXT.to_string(), Value::from(styled.text()));
    doc.insert(FOREGROUND_SPANS.to_string(), Value::Array(foreground));
    doc.insert(BACKGROUND_SPANS.to_string(), Value::Array(background));
    doc.insert(ALIGNMENT_SPANS.to_string(), Value::Array(alignment));
    doc.insert(IMAGE_SPANS.to_string(), Value::Array(images));
    doc.insert(BOLD_SPANS.to_string(), Value::Array(bold));
    doc.insert(ITALIC_SPANS.to_string(), Value::Array(italic));
    if !underline.is_empty() {
        doc.insert(UNDERLINE_SPANS.to_string(), Value::Array(underline));
    }
    Value::Object(doc)
}

/// Parse a persisted note.
///
/// # Errors
/// Fails only if the input is not a JSON object with a string `text` key.
/// Problems inside span arrays are logged and the affected spans dropped.
pub fn decode<L>(json: &str, loader: &L) -> Result<StyledText, DecodeError>
where
    L: ImageLoader + ?Sized,
{
    decode_with_images(json, loader, DisplayTarget::Editor).map(|note| note.text)
}

/// Parse a persisted note and report where each kept image goes.
///
/// # Errors
/// Same as [`decode`].
pub fn decode_with_images<L>(
    json: &str,
    loader: &L,
    target: DisplayTarget,
) -> Result<DecodedNote, DecodeError>
where
    L: ImageLoader + ?Sized,
{
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(doc) = value else {
        return Err(DecodeError::NotAnObject);
    };
    let Some(Value::String(text)) = doc.get(TEXT) else {
        return Err(DecodeError::MissingText);
    };
    let offsets = Utf16Text::new(text);
    let mut spans = Vec::new();

    let colors = |entry: ColorEntry| Color::from_wire(entry.color);
    if let Some(found) = read_category(&doc, FOREGROUND_SPANS, &offsets, |entry: ColorEntry| {
        colors(entry).map(SpanKind::Foreground)
    }) {
        spans.extend(found);
    }
    if let Some(found) = read_category(&doc, BACKGROUND_SPANS, &offsets, |entry: ColorEntry| {
        colors(entry).map(SpanKind::Background)
    }) {
        spans.extend(found);
    }
    if let Some(found) = read_category(&doc, ALIGNMENT_SPANS, &offsets, |entry: AlignmentEntry| {
        Some(SpanKind::Alignment(Alignment::from_gravity(entry.alignment)))
    }) {
        spans.extend(found);
    }

    let mut images = Vec::new();
    if let Some(found) = read_category(&doc, IMAGE_SPANS, &offsets, |entry: ImageEntry| {
        Some(SpanKind::Image { source: entry.uri })
    }) {
        for span in found {
            if let Some(image) = place_image(&span, &offsets, loader, target) {
                images.push(image);
                spans.push(span);
            }
        }
    }

    for (key, kind) in [
        (BOLD_SPANS, SpanKind::Bold),
        (ITALIC_SPANS, SpanKind::Italic),
        (UNDERLINE_SPANS, SpanKind::Underline),
    ] {
        if let Some(found) =
            read_category(&doc, key, &offsets, |_: RangeEntry| Some(kind.clone()))
        {
            spans.extend(found);
        }
    }

    debug!(
        len = offsets.len(),
        spans = spans.len(),
        images = images.len(),
        "decoded note"
    );
    Ok(DecodedNote {
        text: StyledText::from_parts(text.clone(), spans),
        images,
    })
}

/// Read one span array. `None` means the whole category is skipped.
fn read_category<T, F>(
    doc: &Map<String, Value>,
    key: &str,
    offsets: &Utf16Text,
    convert: F,
) -> Option<Vec<Span>>
where
    T: DeserializeOwned + WireRange,
    F: Fn(T) -> Option<SpanKind>,
{
    let Some(value) = doc.get(key) else {
        // underline is optional on the wire
        if key != UNDERLINE_SPANS {
            debug!(key, "span category missing");
        }
        return None;
    };
    let entries = match Vec::<T>::deserialize(value) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(key, %err, "skipping malformed span category");
            return None;
        }
    };

    let mut spans = Vec::with_capacity(entries.len());
    for entry in entries {
        let (start, end) = entry.bounds();
        if let Err(err) = offsets.check_range(start, end) {
            debug!(key, %err, "skipping span category with bad bounds");
            return None;
        }
        let Some(kind) = convert(entry) else {
            debug!(key, start, end, "skipping span category with bad value");
            return None;
        };
        spans.push(Span::new(start, end, kind));
    }
    Some(spans)
}

fn place_image<L>(
    span: &Span,
    offsets: &Utf16Text,
    loader: &L,
    target: DisplayTarget,
) -> Option<PlacedImage>
where
    L: ImageLoader + ?Sized,
{
    let SpanKind::Image { source } = &span.kind else {
        return None;
    };
    if !offsets.is_placeholder_at(span.start, span.end) {
        debug!(source = %source, start = span.start, "image span is not on a placeholder");
        return None;
    }
    match loader.load(source) {
        Ok(handle) => Some(PlacedImage {
            start: span.start,
            source: source.clone(),
            handle,
            bounds: target.bounds(handle),
        }),
        Err(err) => {
            warn!(source = %source, %err, "dropping unresolvable image");
            None
        }
    }
}

impl StyledText {
    /// Shorthand for [`encode`].
    pub fn to_json(&self) -> String {
        encode(self)
    }

    /// Shorthand for [`decode`].
    ///
    /// # Errors
    /// See [`decode`].
    pub fn from_json<L>(json: &str, loader: &L) -> Result<Self, DecodeError>
    where
        L: ImageLoader + ?Sized,
    {
        decode(json, loader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ImageLoadError, RejectAllImages};
    use crate::styled::{PLACEHOLDER, SpanCategory};

    fn any_image(_: &str) -> Result<ImageHandle, ImageLoadError> {
        Ok(ImageHandle::new(300, 150))
    }

    fn sample() -> StyledText {
        let mut styled = StyledText::from_plain_text(format!("Hi {PLACEHOLDER} there"));
        styled
            .push_span(Span::new(0, 2, SpanKind::Foreground(Color(0xFFFF_0000))))
            .unwrap();
        styled
            .push_span(Span::new(0, 8, SpanKind::Background(Color::TRANSPARENT)))
            .unwrap();
        styled
            .push_span(Span::new(0, 9, SpanKind::Alignment(Alignment::Center)))
            .unwrap();
        styled
            .push_span(Span::new(
                3,
                4,
                SpanKind::Image {
                    source: "file:///a.png".to_string(),
                },
            ))
            .unwrap();
        styled.push_span(Span::new(0, 2, SpanKind::Bold)).unwrap();
        styled.push_span(Span::new(5, 9, SpanKind::Italic)).unwrap();
        styled
    }

    #[test]
    fn test_encode_key_order() {
        let json = encode(&StyledText::from_plain_text("hi"));
        assert_eq!(
            json,
            r#"{"text":"hi","foregroundSpans":[],"backgroundSpans":[],"alignmentSpans":[],"imageSpans":[],"boldSpans":[],"italicSpans":[]}"#
        );
    }

    #[test]
    fn test_encode_span_fields() {
        let value = to_value(&sample());
        assert_eq!(
            value[FOREGROUND_SPANS],
            json!([{ "color": -65536, "start": 0, "end": 2 }])
        );
        assert_eq!(
            value[ALIGNMENT_SPANS],
            json!([{ "alignment": 0x11, "start": 0, "end": 9 }])
        );
        assert_eq!(
            value[IMAGE_SPANS],
            json!([{ "uri": "file:///a.png", "start": 3, "end": 4 }])
        );
        assert!(value.get(UNDERLINE_SPANS).is_none());
    }

    #[test]
    fn test_encode_underline_only_when_present() {
        let mut styled = StyledText::from_plain_text("abc");
        styled.push_span(Span::new(1, 2, SpanKind::Underline)).unwrap();
        let value = to_value(&styled);
        assert_eq!(value[UNDERLINE_SPANS], json!([{ "start": 1, "end": 2 }]));
    }

    #[test]
    fn test_round_trip() {
        let styled = sample();
        let decoded = decode(&encode(&styled), &any_image).unwrap();
        assert!(decoded.is_equivalent(&styled));
    }

    #[test]
    fn test_round_trip_pretty() {
        let styled = sample();
        let decoded = decode(&encode_pretty(&styled), &any_image).unwrap();
        assert!(decoded.is_equivalent(&styled));
    }

    #[test]
    fn test_decode_text_only() {
        let decoded = decode(r#"{"text":"hi"}"#, &RejectAllImages).unwrap();
        assert_eq!(decoded.text(), "hi");
        assert!(decoded.spans().is_empty());
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(matches!(
            decode("not json", &RejectAllImages),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            decode("[1,2]", &RejectAllImages),
            Err(DecodeError::NotAnObject)
        ));
        assert!(matches!(
            decode(r#"{"boldSpans":[]}"#, &RejectAllImages),
            Err(DecodeError::MissingText)
        ));
        assert!(matches!(
            decode(r#"{"text":5}"#, &RejectAllImages),
            Err(DecodeError::MissingText)
        ));
    }

    #[test]
    fn test_decode_drops_unresolvable_image() {
        let styled = sample();
        let decoded = decode(&encode(&styled), &RejectAllImages).unwrap();
        assert_eq!(decoded.text(), styled.text());
        assert!(decoded.text().contains(PLACEHOLDER));
        assert_eq!(decoded.count_of(SpanCategory::Image), 0);
        assert_eq!(decoded.count_of(SpanCategory::Bold), 1);
        assert_eq!(decoded.count_of(SpanCategory::Italic), 1);
        assert_eq!(decoded.count_of(SpanCategory::Foreground), 1);
    }

    #[test]
    fn test_decode_skips_image_off_placeholder() {
        let json = r#"{"text":"abc","imageSpans":[{"uri":"x","start":0,"end":1}]}"#;
        let decoded = decode(json, &any_image).unwrap();
        assert_eq!(decoded.count_of(SpanCategory::Image), 0);
    }

    #[test]
    fn test_decode_skips_malformed_category_only() {
        let json = r#"{
            "text": "hello",
            "boldSpans": [{"start": 0, "end": 2}, {"start": "x", "end": 3}],
            "italicSpans": [{"start": 1, "end": 4}],
            "foregroundSpans": {"color": -1, "start": 0, "end": 1}
        }"#;
        let decoded = decode(json, &RejectAllImages).unwrap();
        assert_eq!(decoded.count_of(SpanCategory::Bold), 0);
        assert_eq!(decoded.count_of(SpanCategory::Foreground), 0);
        assert_eq!(
            decoded.spans_of(SpanCategory::Italic).collect::<Vec<_>>(),
            vec![&Span::new(1, 4, SpanKind::Italic)]
        );
    }

    #[test]
    fn test_decode_skips_out_of_bounds_category() {
        let json = r#"{"text":"hi","boldSpans":[{"start":0,"end":1},{"start":1,"end":7}]}"#;
        let decoded = decode(json, &RejectAllImages).unwrap();
        assert_eq!(decoded.count_of(SpanCategory::Bold), 0);
    }

    #[test]
    fn test_decode_skips_category_splitting_surrogate_pair() {
        let json = r#"{"text":"a😀","italicSpans":[{"start":0,"end":2}]}"#;
        let decoded = decode(json, &RejectAllImages).unwrap();
        assert_eq!(decoded.count_of(SpanCategory::Italic), 0);
    }

    #[test]
    fn test_decode_legacy_field_names() {
        let json = r#"{
            "text": "hello",
            "foregroundSpans": [{"foregroundColor": -1, "foregroundStart": 0, "foregroundEnd": 5}],
            "backgroundSpans": [{"backgroundColor": 0, "backgroundStart": 1, "backgroundEnd": 2}],
            "alignmentSpans": [{"alignment": 8388613, "alignmentStart": 0, "alignmentEnd": 5}],
            "boldSpans": [{"boldStart": 0, "boldEnd": 2}],
            "italicSpans": [{"italicStart": 2, "italicEnd": 4}],
            "underlineSpans": [{"underlineStart": 3, "underlineEnd": 5}]
        }"#;
        let decoded = decode(json, &RejectAllImages).unwrap();
        assert_eq!(
            decoded.spans(),
            &[
                Span::new(0, 5, SpanKind::Foreground(Color::WHITE)),
                Span::new(1, 2, SpanKind::Background(Color::TRANSPARENT)),
                Span::new(0, 5, SpanKind::Alignment(Alignment::End)),
                Span::new(0, 2, SpanKind::Bold),
                Span::new(2, 4, SpanKind::Italic),
                Span::new(3, 5, SpanKind::Underline),
            ]
        );
    }

    #[test]
    fn test_decode_unknown_gravity_is_start() {
        let json = r#"{"text":"hi","alignmentSpans":[{"alignment":48,"start":0,"end":2}]}"#;
        let decoded = decode(json, &RejectAllImages).unwrap();
        assert_eq!(
            decoded.spans(),
            &[Span::new(0, 2, SpanKind::Alignment(Alignment::Start))]
        );
    }

    #[test]
    fn test_decode_unsigned_color() {
        let json = r#"{"text":"hi","foregroundSpans":[{"color":4294901760,"start":0,"end":2}]}"#;
        let decoded = decode(json, &RejectAllImages).unwrap();
        assert_eq!(
            decoded.spans(),
            &[Span::new(0, 2, SpanKind::Foreground(Color(0xFFFF_0000)))]
        );
    }

    #[test]
    fn test_decode_color_out_of_range_skips_category() {
        let json = r#"{"text":"hi","foregroundSpans":[{"color":4294967296,"start":0,"end":2}]}"#;
        let decoded = decode(json, &RejectAllImages).unwrap();
        assert_eq!(decoded.count_of(SpanCategory::Foreground), 0);
    }

    #[test]
    fn test_decode_with_images_preview_bounds() {
        let note = decode_with_images(&encode(&sample()), &any_image, DisplayTarget::preview())
            .unwrap();
        assert_eq!(
            note.images,
            vec![PlacedImage {
                start: 3,
                source: "file:///a.png".to_string(),
                handle: ImageHandle::new(300, 150),
                bounds: (75, 37),
            }]
        );
    }

    #[test]
    fn test_decode_utf16_offsets() {
        let mut styled = StyledText::from_plain_text("😀 ok");
        styled.push_span(Span::new(3, 5, SpanKind::Bold)).unwrap();
        let decoded = StyledText::from_json(&styled.to_json(), &RejectAllImages).unwrap();
        assert_eq!(decoded, styled);
    }
}
