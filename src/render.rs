//! Output renderers.
//!
//! A [`Renderer`] turns tokenized batches into a document. Three are built in:
//!
//! - [`JsonRenderer`]: the batches as a JSON array, compact or pretty.
//! - [`MarkdownRenderer`]: one paragraph per line, speaker in bold.
//! - [`HtmlRenderer`]: a standalone page, one `<p>` per line, one CSS class per token type.
//!
//! Lines without tokens are skipped by the Markdown and HTML renderers.
//! Residual text is not rendered; rule sets that want every word on the page
//! end with a catch-all rule, as the built-in `narration` rule does.

use crate::{Error, LineBatch, Token};

pub trait Renderer {
    fn render(&self, batches: &[LineBatch]) -> Result<String, Error>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer {
    pub pretty: bool,
}

impl JsonRenderer {
    pub fn pretty() -> Self {
        JsonRenderer { pretty: true }
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, batches: &[LineBatch]) -> Result<String, Error> {
        let out = if self.pretty { serde_json::to_string_pretty(batches) } else { serde_json::to_string(batches) };
        out.map_err(Error::Render)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    fn token(token: &Token) -> String {
        let text = escape_markdown(token.content());
        match token.kind() {
            "speech" => format!("“{text}”"),
            "action" => format!("*{text}*"),
            "thought" => format!("_{text}_"),
            "ooc" => format!("({text})"),
            "dice_order" => format!("`.{}`", token.content().replace('`', "'")),
            "dice_roll" => format!("`{}`", token.content().replace('`', "'")),
            "narration" => text,
            other => format!("[{other}] {text}"),
        }
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, batches: &[LineBatch]) -> Result<String, Error> {
        let mut out = String::new();
        for batch in batches.iter().filter(|b| !b.is_empty()) {
            let mut line = String::new();
            if let Some(speaker) = batch.speaker() {
                line.push_str(&format!("**{}**", escape_markdown(speaker)));
                if let Some(time) = batch.time() {
                    line.push_str(&format!(" <sub>{}</sub>", escape_markdown(time)));
                }
                line.push_str(": ");
            }
            let tokens: Vec<String> = batch.tokens.iter().map(MarkdownRenderer::token).collect();
            line.push_str(&tokens.join(" "));

            out.push_str(&line);
            out.push_str("\n\n");
        }
        Ok(out)
    }
}

fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '[' | ']' | '<' | '>') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Standalone HTML page. `title` goes into `<title>` and the page heading.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    pub title: String,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        HtmlRenderer { title: "Session log".to_string() }
    }
}

const STYLE: &str = "\
body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; line-height: 1.5; }
.speaker { font-weight: bold; }
time { color: #888; font-size: 0.8em; margin: 0 0.4em; }
.speech { color: #1a1a1a; }
.action { font-style: italic; color: #2a6f2a; }
.ooc { color: #999; }
.thought { font-style: italic; color: #5a4a8a; }
.dice_order, .dice_roll { font-family: monospace; color: #a0522d; }
.narration { color: #444; }
";

impl Renderer for HtmlRenderer {
    fn render(&self, batches: &[LineBatch]) -> Result<String, Error> {
        let title = escape_html(&self.title);
        let mut out = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n"
        );

        for batch in batches.iter().filter(|b| !b.is_empty()) {
            out.push_str(&format!("<p class=\"line\" data-line=\"{}\">", batch.line_number));
            if let Some(speaker) = batch.speaker() {
                out.push_str(&format!("<span class=\"speaker\">{}</span>", escape_html(speaker)));
            }
            if let Some(time) = batch.time() {
                out.push_str(&format!("<time>{}</time>", escape_html(time)));
            }
            for token in &batch.tokens {
                out.push_str(&format!(
                    "<span class=\"token {}\">{}</span>",
                    css_class(token.kind()),
                    escape_html(token.content())
                ));
            }
            out.push_str("</p>\n");
        }

        out.push_str("</body>\n</html>\n");
        Ok(out)
    }
}

/// Rule types are free-form; keep one class name per token.
fn css_class(kind: &str) -> String {
    kind.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '-' }).collect()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Metadata, Span, tokenize_log};
    use pretty_assertions::assert_eq;

    const LOG: &str = "Aria(2) 2025-01-27 19:58:15 \"Who's there?\" (brb)\n\
                       \n\
                       #draws a <sword>\n\
                       .ra listen";

    #[test]
    fn json_output_is_an_array_of_batches() {
        let batches = tokenize_log("#waves");
        let json = JsonRenderer::default().render(&batches).unwrap();
        assert_eq!(
            json,
            r#"[{"line_number":1,"metadata":{},"tokens":[{"type":"action","content":"waves","start":0,"end":6,"metadata":{}}]}]"#
        );

        let value: serde_json::Value = serde_json::from_str(&JsonRenderer::pretty().render(&batches).unwrap()).unwrap();
        assert_eq!(value[0]["tokens"][0]["type"], "action");
    }

    #[test]
    fn json_includes_residual_when_present() {
        let batches = tokenize_log(r#""hi" ("#);
        let value: serde_json::Value = serde_json::from_str(&JsonRenderer::default().render(&batches).unwrap()).unwrap();
        assert_eq!(value[0]["residual"][0]["text"], " (");
        assert_eq!(value[0]["residual"][0]["start"], 4);
    }

    #[test]
    fn markdown_styles_each_token_type() {
        let md = MarkdownRenderer.render(&tokenize_log(LOG)).unwrap();
        assert_eq!(
            md,
            "**Aria** <sub>2025-01-27 19:58:15</sub>: “Who's there?” (brb)\n\n\
             *draws a \\<sword\\>*\n\n\
             `.ra listen`\n\n"
        );
    }

    #[test]
    fn markdown_keeps_narration_around_speech() {
        let md = MarkdownRenderer
            .render(&tokenize_log(r#"Aria(2) 2025-01-27 19:58:15 she draws her blade "Halt!" and steps forward"#))
            .unwrap();
        assert_eq!(md, "**Aria** <sub>2025-01-27 19:58:15</sub>: she draws her blade “Halt!” and steps forward\n\n");
    }

    fn batch_with(metadata: &[(&str, &str)], token: Token) -> LineBatch {
        let mut fields = Metadata::new();
        for (key, value) in metadata {
            fields.insert(*key, *value);
        }
        LineBatch { line_number: 1, metadata: fields, tokens: vec![token], residual: Vec::new() }
    }

    #[test]
    fn markdown_escapes_the_time() {
        let token = Token::new("speech", "hi", Span::new(0, 4), Metadata::new());
        let batch = batch_with(&[("user_name", "Aria"), ("time", "<script>x</script>")], token);
        let md = MarkdownRenderer.render(&[batch]).unwrap();
        assert_eq!(md, "**Aria** <sub>\\<script\\>x\\</script\\></sub>: “hi”\n\n");
    }

    #[test]
    fn html_class_names_are_sanitized() {
        let batch = batch_with(&[], Token::new("side note\"x", "psst", Span::new(0, 4), Metadata::new()));
        let html = HtmlRenderer::default().render(&[batch]).unwrap();
        assert!(html.contains("<span class=\"token side-note-x\">psst</span>"));
    }

    #[test]
    fn html_escapes_content() {
        let html = HtmlRenderer::default().render(&tokenize_log(LOG)).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<span class=\"speaker\">Aria</span><time>2025-01-27 19:58:15</time>"));
        assert!(html.contains("<span class=\"token speech\">Who&#39;s there?</span>"));
        assert!(html.contains("<span class=\"token action\">draws a &lt;sword&gt;</span>"));
        assert!(!html.contains("<sword>"));
        assert_eq!(html.matches("<p class=\"line\"").count(), 3);
    }
}
