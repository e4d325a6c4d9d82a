//! Markdown to HTML conversion. Only the portable CommonMark core is enabled:
//! no tables, footnotes, strikethrough or smart punctuation.

use pulldown_cmark::{html, Options, Parser};

/// Converts `markdown` to an HTML fragment.
pub fn to_html(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, Options::empty()));
    out
}

/// The page a draft preview is wrapped in.
const DRAFT_PAGE_HEAD: &str = r#"
<!DOCTYPE html>
<html>
  <head>
    <style>
      body {
          font-family: serif;
          font-size: 24px;
          margin: 0px 128px;
      }

      p {
          line-height: 2.5;
          margin: 32px 0;
      }

      p code {
          font-size: 20px;
      }

      pre {
          font-size: 16px;
          line-height: initial;
          margin: 32px 0;
          border-left: 4px solid #333333;
          padding-left: 16px;
      }

      h1, h2, h3, h4, h5, h6 {
          font-weight: normal;
          margin: 64px 0 32px 0;
      }

    </style>
  </head>
  <body>
"#;

const DRAFT_PAGE_TAIL: &str = r#"
  </body>
</html>
"#;

/// Wraps an HTML fragment in the fixed draft preview stylesheet.
pub fn draft_page(body: &str) -> String {
    let mut out = String::with_capacity(DRAFT_PAGE_HEAD.len() + body.len() + DRAFT_PAGE_TAIL.len());
    out.push_str(DRAFT_PAGE_HEAD);
    out.push_str(body);
    out.push_str(DRAFT_PAGE_TAIL);
    out
}
