//! HTML for the single-page UI. Every user- or model-supplied string goes
//! through `html_escape` before it reaches the page.

use html_escape::{encode_double_quoted_attribute, encode_text};

use docqa_core::types::{Answer, Chunk};

pub const KEY_WARNING: &str = "Please enter your OpenAI API key!";

/// Characters of each cited chunk shown under the answer.
pub const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Default)]
pub struct PageView<'a> {
    /// False when the server already holds a key.
    pub show_key_field: bool,
    pub api_key: &'a str,
    pub question: &'a str,
    pub warning: Option<&'a str>,
    pub answer: Option<&'a Answer>,
    pub error: Option<String>,
}

/// `- <first 200 characters>...`
pub fn snippet_line(chunk: &Chunk) -> String {
    format!("- {}...", chunk.snippet(SNIPPET_CHARS))
}

pub fn page(view: &PageView<'_>) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Document Q&amp;A</title>\n</head>\n<body>\n<h1>Document Q&amp;A</h1>\n<form method=\"post\" action=\"/\">\n",
    );

    if view.show_key_field {
        html.push_str(&format!(
            "<label>OpenAI API key: <input type=\"password\" name=\"api_key\" value=\"{}\" autocomplete=\"off\"></label><br>\n",
            encode_double_quoted_attribute(view.api_key)
        ));
    }
    html.push_str(&format!(
        "<label>Question: <input type=\"text\" name=\"question\" value=\"{}\"></label>\n<button type=\"submit\">Ask</button>\n</form>\n",
        encode_double_quoted_attribute(view.question)
    ));

    if let Some(warning) = view.warning {
        html.push_str(&format!("<p class=\"warning\">⚠️ {}</p>\n", encode_text(warning)));
    }
    if let Some(error) = &view.error {
        html.push_str(&format!("<p class=\"error\">{}</p>\n", encode_text(error)));
    }
    if let Some(answer) = view.answer {
        html.push_str(&format!("<p class=\"answer\">🤖 Answer: {}</p>\n", encode_text(&answer.answer)));
        html.push_str("<p>📚 Sources:</p>\n<ul class=\"sources\">\n");
        for citation in &answer.sources {
            html.push_str(&format!(
                "<li title=\"{}\">{}</li>\n",
                encode_double_quoted_attribute(&citation.chunk.source),
                encode_text(&snippet_line(&citation.chunk))
            ));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}
