//! Coder stage: style plan + photo descriptions → HTML document.
//!
//! Everything after the model call is deterministic:
//!
//! 1. strip code-fence markup;
//! 2. normalise photo markers to exactly `0..N-1` in document order: stray or
//!    out-of-order markers are dropped and hidden placeholders fill the gaps;
//! 3. inject the bootstrap script that sets `window.PROJECT_ID`.
//!
//! A failed call is replaced by [`ERROR_DOCUMENT`]. Step 3 runs in every case,
//! so the bootstrap script is always present.

use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{
    CompletionRequest, LlmProvider, PhotoMetadata, PipelineError, PipelineState, RequestId,
    Stage, Step, VisualStyle,
};
use tracing::{info, warn};

use crate::prompts;

/// Substituted when generation fails.
pub const ERROR_DOCUMENT: &str = "<html><body><h1>Error generating template</h1></body></html>";

/// Attribute that tags an image placeholder with its photo index.
pub const PHOTO_INDEX_ATTR: &str = "data-photo-index";

/// Turns the style plan into the finished document.
pub struct Coder {
    llm: Arc<dyn LlmProvider>,
}

impl Coder {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Produces the finished document. Never fails.
    pub async fn code(
        &self,
        request_id: &RequestId,
        style: &VisualStyle,
        photos: &[PhotoMetadata],
        wants_music: bool,
    ) -> String {
        let request = CompletionRequest::text(
            prompts::coder_system(style, photos.len(), wants_music),
            prompts::coder_user(style, photos),
        );
        let body = match self.llm.complete(request).await {
            Ok(reply) => ensure_photo_placeholders(&strip_code_fences(&reply), photos.len()),
            Err(e) => {
                warn!(%request_id, error = %e, "code generation failed; using error document");
                ERROR_DOCUMENT.to_string()
            }
        };
        inject_bootstrap(&body, request_id)
    }
}

#[async_trait]
impl Stage for Coder {
    fn step(&self) -> Step {
        Step::Coding
    }

    async fn run(&self, state: PipelineState) -> Result<PipelineState, PipelineError> {
        info!(request_id = %state.request_id(), "coder is working");
        let plan = state.brand_plan().ok_or(PipelineError::MissingStageInput {
            stage: Step::Coding,
            field: "brand_plan",
        })?;
        let html = self
            .code(
                state.request_id(),
                &plan.visual_style,
                &state.assets().photos,
                state.preferences().wants_background_music(),
            )
            .await;
        state.with_html_content(html)
    }
}

/// Removes Markdown code-fence markers and surrounding whitespace.
pub fn strip_code_fences(reply: &str) -> String {
    reply.replace("```html", "").replace("```", "").trim().to_string()
}

/// The snippet binding the request id into the page.
pub fn bootstrap_script(request_id: &RequestId) -> String {
    format!(
        "<script>window.PROJECT_ID = '{}';</script>",
        escape_js_string(request_id.as_str())
    )
}

/// Inserts the bootstrap script just inside the first `<head>` tag, or
/// prepends it when the document has no head.
pub fn inject_bootstrap(html: &str, request_id: &RequestId) -> String {
    let script = bootstrap_script(request_id);
    match head_open_end(html) {
        Some(at) => format!("{}\n    {}{}", &html[..at], script, &html[at..]),
        None => format!("{script}\n{html}"),
    }
}

/// Byte offset just past the `>` of the first `<head ...>` tag.
fn head_open_end(html: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = lower[from..].find("<head") {
        let tag = from + pos;
        let after = tag + "<head".len();
        match lower.as_bytes().get(after) {
            Some(b'>') => return Some(after + 1),
            Some(b) if b.is_ascii_whitespace() || *b == b'/' => {
                return lower[after..].find('>').map(|gt| after + gt + 1);
            }
            // `<header>` and friends.
            _ => from = after,
        }
    }
    None
}

/// A `data-photo-index` attribute found in a document.
#[derive(Debug)]
struct PhotoMarker {
    /// Offset of the `<` opening the tag carrying the attribute.
    tag_start: usize,
    /// The attribute and its value, quotes included.
    span: Range<usize>,
    index: usize,
}

fn photo_markers(html: &str) -> Vec<PhotoMarker> {
    let lower = html.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(pos) = lower[from..].find(PHOTO_INDEX_ATTR) {
        let start = from + pos;
        from = start + PHOTO_INDEX_ATTR.len();

        let mut at = skip_whitespace(bytes, from);
        if bytes.get(at) != Some(&b'=') {
            continue;
        }
        at = skip_whitespace(bytes, at + 1);
        let quote = match bytes.get(at) {
            Some(&q) if q == b'"' || q == b'\'' => {
                at += 1;
                Some(q)
            }
            _ => None,
        };
        let digits_end = at + bytes[at..].iter().take_while(|b| b.is_ascii_digit()).count();
        let Ok(index) = lower[at..digits_end].parse::<usize>() else {
            continue;
        };
        let mut end = digits_end;
        if quote.is_some() && bytes.get(end) == quote.as_ref() {
            end += 1;
        }

        found.push(PhotoMarker {
            tag_start: lower[..start].rfind('<').unwrap_or(start),
            span: start..end,
            index,
        });
        from = end;
    }
    found
}

fn skip_whitespace(bytes: &[u8], mut at: usize) -> usize {
    while bytes.get(at).is_some_and(u8::is_ascii_whitespace) {
        at += 1;
    }
    at
}

/// Photo indices tagged in the document, in order of appearance.
pub fn photo_indices(html: &str) -> Vec<usize> {
    photo_markers(html).into_iter().map(|m| m.index).collect()
}

fn placeholders(indices: Range<usize>) -> String {
    indices
        .map(|i| format!("<img {PHOTO_INDEX_ATTR}=\"{i}\" src=\"\" alt=\"\" style=\"display:none\">\n"))
        .collect()
}

enum Edit {
    Insert(String),
    /// Drop everything up to the given offset.
    Remove(usize),
}

/// Rewrites the document so its photo markers are exactly `0..count`, in
/// document order.
///
/// Markers are kept while their index is in range and increasing; any other
/// marker attribute is removed. Each missing index gets a hidden placeholder
/// just before the tag of the next kept marker, or before `</body>` (or at
/// the end of the document) when no later marker exists.
pub fn ensure_photo_placeholders(html: &str, count: usize) -> String {
    let mut edits: Vec<(usize, Edit)> = Vec::new();
    let mut next = 0;
    let mut last_kept_end = 0;
    for marker in photo_markers(html) {
        if marker.index < count && marker.index >= next {
            if marker.index > next {
                edits.push((marker.tag_start, Edit::Insert(placeholders(next..marker.index))));
            }
            next = marker.index + 1;
            last_kept_end = marker.span.end;
        } else {
            edits.push((marker.span.start, Edit::Remove(marker.span.end)));
        }
    }
    if next < count {
        let tail = placeholders(next..count);
        match html
            .to_ascii_lowercase()
            .rfind("</body>")
            .filter(|&at| at >= last_kept_end)
        {
            Some(at) => edits.push((at, Edit::Insert(tail))),
            None => edits.push((html.len(), Edit::Insert(format!("\n{}", tail.trim_end())))),
        }
    }
    if edits.is_empty() {
        return html.to_string();
    }

    edits.sort_by_key(|(at, _)| *at);
    let mut out = String::with_capacity(html.len() + 64 * count);
    let mut cursor = 0;
    for (at, edit) in edits {
        out.push_str(&html[cursor..at]);
        cursor = at;
        match edit {
            Edit::Insert(text) => out.push_str(&text),
            Edit::Remove(end) => cursor = end,
        }
    }
    out.push_str(&html[cursor..]);
    out
}

fn escape_js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '<' => out.push_str("\\u003c"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}
