use std::fmt::Write;

use crate::TranslationLanguageEntry;

const LINE_HEIGHT: u32 = 32;
const BAR_HEIGHT: u32 = 16;
const SVG_WIDTH: u32 = 500;
const LABEL_WIDTH: u32 = 200;
const PROGRESS_WIDTH: u32 = 160;
const INSET: u32 = 12;

const STYLESHEET: &str = r#"
@import url(https://fonts.googleapis.com/css?family=Open+Sans);
.svg-font {
    font-family: "Open Sans";
    font-size: 12px;
    fill: #999;
}
"#;

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// The width of a progress bar for a percentage, in integer pixels so that the
/// output stays byte-reproducible.
fn bar_width(progress: u8) -> u32 {
    PROGRESS_WIDTH * u32::from(progress) / 100
}

/// Renders the translation-completion chart for a sorted list of language
/// entries as a standalone SVG document.
///
/// One row per entry: a right-aligned `Name (id)` label, a full-width
/// background track, a translation bar and an approval bar drawn over the same
/// origin, and a trailing percentage label. Canvas height grows with the entry
/// count. Pure function of its input: identical entries in identical order
/// produce identical bytes.
pub fn render_language_graph(entries: &[TranslationLanguageEntry]) -> String {
    let height = LINE_HEIGHT * entries.len() as u32;
    let bar_x = LABEL_WIDTH + INSET;
    let mut document = String::new();

    let _ = writeln!(document, r#"<?xml version="1.0" encoding="utf-8" ?>"#);
    let _ = writeln!(
        document,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{SVG_WIDTH}" height="{height}">"#
    );
    let _ = writeln!(
        document,
        r#"<defs><style type="text/css"><![CDATA[{STYLESHEET}]]></style></defs>"#
    );

    for (row, entry) in entries.iter().enumerate() {
        let label = escape_xml(&format!(
            "{} ({})",
            entry.language_name, entry.language_id
        ));
        let _ = writeln!(
            document,
            r#"<g class="svg-font" transform="translate(0,{})">"#,
            row as u32 * LINE_HEIGHT
        );
        let _ = writeln!(
            document,
            r#"<text x="{LABEL_WIDTH}" y="18" style="text-anchor:end;">{label}</text>"#
        );
        if entry.translation_progress < 100 {
            let _ = writeln!(
                document,
                r##"<rect x="{bar_x}" y="6" width="{PROGRESS_WIDTH}" height="{BAR_HEIGHT}" fill="#999" style="filter:opacity(30%);"/>"##
            );
        }
        if entry.translation_progress > 0 && entry.approval_progress < 100 {
            let _ = writeln!(
                document,
                r##"<rect x="{bar_x}" y="6" width="{}" height="{BAR_HEIGHT}" fill="#5D89C3"/>"##,
                bar_width(entry.translation_progress)
            );
        }
        if entry.approval_progress > 0 {
            let _ = writeln!(
                document,
                r##"<rect x="{bar_x}" y="6" width="{}" height="{BAR_HEIGHT}" fill="#71C277"/>"##,
                bar_width(entry.approval_progress)
            );
        }
        let _ = writeln!(
            document,
            r#"<text x="{}" y="{BAR_HEIGHT}">{}%</text>"#,
            bar_x + PROGRESS_WIDTH + INSET,
            entry.translation_progress
        );
        let _ = writeln!(document, "</g>");
    }
    let _ = writeln!(document, "</svg>");

    document
}
