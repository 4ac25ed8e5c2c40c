//! HTML assembly and accessible image placeholders.
//!
//! The simplified text is already a markup fragment: it can carry heading
//! tags, MathML and the math normaliser's `<code class="latex-raw">`
//! fallback. Those known tags and existing character references pass through
//! untouched; everything else is escaped, so a stray `a < b` in prose can't
//! break the document.
//!
//! Each manifest image becomes a `<figure>` carrying exactly one
//! `aria-label="Image Description Placeholder: …"`. The reporter counts that
//! marker, so [`ALT_MARKER`] is the contract between the two modules.

use crate::output::ImageEntry;
use crate::pipeline::paragraphs;
use once_cell::sync::Lazy;
use regex::Regex;

/// Attribute prefix every injected image description carries.
pub const ALT_MARKER: &str = "aria-label=\"Image Description Placeholder:";

/// Label used when the extraction step produced no description.
pub const DEFAULT_IMAGE_DESCRIPTION: &str =
    "A Diagram was found here. Content requires manual description for full accessibility.";

static RE_KNOWN_MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"</?(?:h[1-6]|math|mrow|mi|mn|mo|mfrac|msqrt|mroot|msub|msup|msubsup|mtext|code)(?:\s[^<>]*)?>|&(?:[a-zA-Z][a-zA-Z0-9]*|#[0-9]+|#x[0-9a-fA-F]+);",
    )
    .unwrap()
});

static RE_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").unwrap());

/// Escape text for use in HTML content or a double-quoted attribute.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape prose while keeping the markup the pipeline itself emits.
pub fn escape_prose(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for m in RE_KNOWN_MARKUP.find_iter(s) {
        out.push_str(&escape_html(&s[last..m.start()]));
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&escape_html(&s[last..]));
    out
}

/// Accessible placeholder markup for one extracted image.
pub fn image_placeholder(entry: &ImageEntry) -> String {
    let description = match entry.alt_text.trim() {
        "" => DEFAULT_IMAGE_DESCRIPTION,
        alt => alt,
    };
    let caption = match entry.filename.trim() {
        "" => "IMAGE".to_string(),
        name => name.to_uppercase(),
    };
    let description = escape_html(description);
    format!(
        "<figure class=\"image-placeholder\" {ALT_MARKER} {description}\">\n\
         <figcaption>{} PLACEHOLDER</figcaption>\n\
         <p>{description}</p>\n\
         </figure>",
        escape_html(&caption),
    )
}

/// Assemble a complete HTML document from the simplified text.
///
/// Every paragraph becomes a `<p>`; heading elements inside a paragraph are
/// lifted out as standalone blocks in their original position. One figure
/// per manifest entry follows the text.
pub fn render_html(simplified_text: &str, manifest: &[ImageEntry], heading_tag: &str) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let heading = Regex::new(&format!(
        r"(?s)<{tag}>(.*?)</{tag}>",
        tag = regex::escape(heading_tag)
    ))
    .ok();

    for para in paragraphs(simplified_text) {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }
        let Some(heading) = heading.as_ref() else {
            push_paragraph(&mut blocks, para);
            continue;
        };

        let mut last = 0;
        for caps in heading.captures_iter(para) {
            let Some(whole) = caps.get(0) else { continue };
            push_paragraph(&mut blocks, &para[last..whole.start()]);
            blocks.push(format!(
                "<{heading_tag}>{}</{heading_tag}>",
                escape_prose(caps[1].trim())
            ));
            last = whole.end();
        }
        push_paragraph(&mut blocks, &para[last..]);
    }

    blocks.extend(manifest.iter().map(image_placeholder));

    let mut html = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Accessible Document</title>\n</head>\n<body>\n",
    );
    for block in &blocks {
        html.push_str(block);
        html.push('\n');
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn push_paragraph(blocks: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        blocks.push(format!("<p>{}</p>", escape_prose(text)));
    }
}

/// Inner content of `<body>`, or the whole input if there is none.
pub fn extract_body(html: &str) -> &str {
    RE_BODY
        .captures(html)
        .and_then(|c| c.get(1))
        .map_or(html, |m| m.as_str())
        .trim()
}
